use serde_json::Value;

use crate::expr::{AliasId, Token};

/// One node of an expression: either literal SQL text or a reference that is
/// only turned into text once the whole statement is assembled.
#[derive(Debug, Clone)]
pub enum Segment {
    /// Raw SQL text, emitted as is.
    Lit(String),
    /// Another expression, rendered through whatever it is redirected to.
    Token(Token),
    /// `<alias>.<name>` for a source that has not been given a name yet.
    Column { alias: AliasId, name: String },
    /// A bound parameter.
    Param(Value),
    Nested(Fragment),
}

/// An SQL expression as a flat list of literal and reference segments.
#[derive(Debug, Clone, Default)]
pub struct Fragment(Vec<Segment>);

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lit(text: impl Into<String>) -> Self {
        Self(vec![Segment::Lit(text.into())])
    }

    pub fn param(value: impl Into<Value>) -> Self {
        Self(vec![Segment::Param(value.into())])
    }

    pub fn column(alias: AliasId, name: impl Into<String>) -> Self {
        Self(vec![Segment::Column { alias, name: name.into() }])
    }

    /// `name(arg, arg, ...)`
    pub fn call(name: &str, args: impl IntoIterator<Item = Fragment>) -> Self {
        Fragment::lit(format!("{name}("))
            .append(Fragment::join(", ", args))
            .append(Fragment::lit(")"))
    }

    pub fn join(separator: &str, parts: impl IntoIterator<Item = Fragment>) -> Self {
        let mut out = Fragment::new();
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                out.push(Segment::Lit(separator.to_string()));
            }
            out.0.extend(part.0);
        }
        out
    }

    pub fn push(&mut self, segment: impl Into<Segment>) {
        self.0.push(segment.into());
    }

    pub fn append(mut self, other: Fragment) -> Self {
        self.0.extend(other.0);
        self
    }

    /// Wraps the fragment in parentheses.
    pub fn paren(self) -> Self {
        Fragment::lit("(").append(self).append(Fragment::lit(")"))
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every token referenced by this fragment, nested fragments included,
    /// in order of appearance.
    pub fn tokens(&self) -> Vec<Token> {
        let mut out = Vec::new();
        self.collect_tokens(&mut out);
        out
    }

    fn collect_tokens(&self, out: &mut Vec<Token>) {
        for s in &self.0 {
            match s {
                Segment::Token(t) => out.push(t.clone()),
                Segment::Nested(f) => f.collect_tokens(out),
                Segment::Lit(_) | Segment::Column { .. } | Segment::Param(_) => {}
            }
        }
    }

    pub(crate) fn reads_source(&self) -> bool {
        self.0.iter().any(|s| match s {
            Segment::Column { .. } => true,
            Segment::Nested(f) => f.reads_source(),
            _ => false,
        })
    }
}

impl From<&str> for Fragment {
    fn from(text: &str) -> Self {
        Fragment::lit(text)
    }
}

impl From<String> for Fragment {
    fn from(text: String) -> Self {
        Fragment::lit(text)
    }
}

impl From<Token> for Fragment {
    fn from(token: Token) -> Self {
        Self(vec![Segment::Token(token)])
    }
}

impl From<Segment> for Fragment {
    fn from(segment: Segment) -> Self {
        Self(vec![segment])
    }
}

impl From<Fragment> for Segment {
    fn from(fragment: Fragment) -> Self {
        Segment::Nested(fragment)
    }
}

impl FromIterator<Segment> for Fragment {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

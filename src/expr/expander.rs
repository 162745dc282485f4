use std::collections::HashMap;

use serde_json::Value;

use crate::{
    compiler::Adapter,
    expr::{AliasId, Fragment, Segment, Token, TokenId},
};

/// First pass: replaces tokens by what they currently stand for.
///
/// A token that has been redirected (because the body defining it was turned
/// into a subquery) renders as its redirect; any other token renders as its
/// own definition. The result holds no `Segment::Token`.
#[derive(Debug, Default)]
pub struct Expander {
    redirects: HashMap<TokenId, Fragment>,
}

impl Expander {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redirect(&mut self, token: &Token, to: Fragment) {
        self.redirects.insert(token.id(), to);
    }

    pub fn redirect_of(&self, token: &Token) -> Option<&Fragment> {
        self.redirects.get(&token.id())
    }

    pub fn expand(&self, fragment: &Fragment) -> Fragment {
        let mut out = Fragment::new();
        self.expand_into(fragment, &mut out);
        out
    }

    pub fn expand_token(&self, token: &Token) -> Fragment {
        let mut out = Fragment::new();
        self.expand_token_into(token, &mut out);
        out
    }

    fn expand_into(&self, fragment: &Fragment, out: &mut Fragment) {
        for s in fragment.segments() {
            match s {
                Segment::Token(t) => self.expand_token_into(t, out),
                Segment::Nested(f) => self.expand_into(f, out),
                other => out.push(other.clone()),
            }
        }
    }

    fn expand_token_into(&self, token: &Token, out: &mut Fragment) {
        match self.redirects.get(&token.id()) {
            Some(to) => self.expand_into(to, out),
            None => self.expand_into(token.fragment(), out),
        }
    }
}

/// Second pass: turns expanded fragments into text.
///
/// Aliases are named in order of first appearance and parameters are numbered
/// in the order they are rendered, which is the order they appear in the text.
pub struct Renderer<'a> {
    adapter: &'a dyn Adapter,
    alias_prefix: &'a str,
    aliases: HashMap<AliasId, String>,
    params: Vec<Value>,
}

impl<'a> Renderer<'a> {
    pub fn new(adapter: &'a dyn Adapter, alias_prefix: &'a str) -> Self {
        Self { adapter, alias_prefix, aliases: HashMap::new(), params: Vec::new() }
    }

    pub fn adapter(&self) -> &'a dyn Adapter {
        self.adapter
    }

    pub fn alias_name(&mut self, alias: AliasId) -> String {
        let next = self.aliases.len();
        let prefix = self.alias_prefix;
        self.aliases
            .entry(alias)
            .or_insert_with(|| format!("{prefix}{next}"))
            .clone()
    }

    pub fn render(&mut self, fragment: &Fragment) -> String {
        let mut sql = String::new();
        for s in fragment.segments() {
            match s {
                Segment::Lit(text) => sql.push_str(text),
                Segment::Column { alias, name } => {
                    let table = self.alias_name(*alias);
                    sql.push_str(&self.adapter.column_ref(&table, name));
                }
                Segment::Param(value) => {
                    let index = self.params.len();
                    self.params.push(value.clone());
                    sql.push_str(&self.adapter.param_holder(index));
                }
                Segment::Nested(f) => sql.push_str(&self.render(f)),
                // expanded fragments carry no tokens; fall back to the definition
                Segment::Token(t) => sql.push_str(&self.render(t.fragment())),
            }
        }
        sql
    }

    pub fn into_params(self) -> Vec<Value> {
        self.params
    }
}

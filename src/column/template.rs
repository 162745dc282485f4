use std::{collections::BTreeSet, ops::Index};

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::{
    column::Column,
    expr::{Fragment, Segment, Token, TokenId, TokenSet},
};

/// Shape of one result row: a column, an ordered list, or a keyed map of
/// nested templates. Decoded rows come back in exactly this shape.
#[derive(Debug, Clone)]
pub enum Template {
    Column(Column),
    List(Vec<Template>),
    Map(IndexMap<String, Template>),
}

impl Template {
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Template)>,
    {
        Template::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn list(items: impl IntoIterator<Item = Template>) -> Self {
        Template::List(items.into_iter().collect())
    }

    /// Non-panicking counterpart of `template["key"]`.
    pub fn get(&self, key: &str) -> Option<&Template> {
        match self {
            Template::Map(m) => m.get(key),
            _ => None,
        }
    }

    /// Non-panicking counterpart of `template[index]`.
    pub fn at(&self, index: usize) -> Option<&Template> {
        match self {
            Template::List(l) => l.get(index),
            _ => None,
        }
    }

    pub fn as_column(&self) -> Option<&Column> {
        match self {
            Template::Column(c) => Some(c),
            _ => None,
        }
    }

    /// Visits every column depth first, in declaration order.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Column)) {
        match self {
            Template::Column(c) => f(c),
            Template::List(l) => {
                for t in l {
                    t.walk(&mut *f);
                }
            }
            Template::Map(m) => {
                for t in m.values() {
                    t.walk(&mut *f);
                }
            }
        }
    }

    pub fn columns(&self) -> Vec<&Column> {
        let mut out = Vec::new();
        self.walk(&mut |c| out.push(c));
        out
    }

    /// Distinct tokens, in walk order of first appearance.
    pub fn tokens(&self) -> Vec<Token> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        self.walk(&mut |c| {
            if seen.insert(c.token().id()) {
                out.push(c.token().clone());
            }
        });
        out
    }

    pub fn token_ids(&self) -> BTreeSet<TokenId> {
        let mut out = BTreeSet::new();
        self.walk(&mut |c| {
            out.insert(c.token().id());
        });
        out
    }

    pub fn token_set(&self) -> TokenSet {
        self.tokens().into_iter().collect()
    }

    pub fn map_columns(&self, f: &mut impl FnMut(&Column) -> Column) -> Template {
        match self {
            Template::Column(c) => Template::Column(f(c)),
            Template::List(l) => {
                let mut out = Vec::with_capacity(l.len());
                for t in l {
                    out.push(t.map_columns(&mut *f));
                }
                Template::List(out)
            }
            Template::Map(m) => {
                let mut out = IndexMap::with_capacity(m.len());
                for (k, t) in m {
                    out.insert(k.clone(), t.map_columns(&mut *f));
                }
                Template::Map(out)
            }
        }
    }

    pub fn widen_nullability(&self, nullable: bool) -> Template {
        self.map_columns(&mut |c| c.widen(nullable))
    }

    /// All columns as one comma separated expression list.
    pub fn to_fragment(&self) -> Fragment {
        Fragment::join(", ", self.columns().into_iter().map(Fragment::from))
    }

    /// Rebuilds the template shape from decoded values given in walk order.
    pub(crate) fn assemble(&self, values: &mut impl Iterator<Item = Value>) -> Value {
        match self {
            Template::Column(_) => values.next().unwrap_or(Value::Null),
            Template::List(l) => Value::Array(l.iter().map(|t| t.assemble(values)).collect()),
            Template::Map(m) => {
                let mut out = Map::new();
                for (k, t) in m {
                    out.insert(k.clone(), t.assemble(values));
                }
                Value::Object(out)
            }
        }
    }
}

impl From<Column> for Template {
    fn from(column: Column) -> Self {
        Template::Column(column)
    }
}

impl From<&Template> for Segment {
    fn from(template: &Template) -> Self {
        match template {
            Template::Column(c) => Segment::from(c),
            other => Segment::Nested(other.to_fragment()),
        }
    }
}

impl From<&Template> for Fragment {
    fn from(template: &Template) -> Self {
        Fragment::from(Segment::from(template))
    }
}

/// Field access for builder closures (`row["id"]`).
///
/// # Panics
///
/// Panics when the template is not a map or has no such field. Use
/// [`Template::get`] where the field may be absent.
impl Index<&str> for Template {
    type Output = Template;

    fn index(&self, key: &str) -> &Template {
        match self.get(key) {
            Some(t) => t,
            None => panic!("template has no field `{key}`"),
        }
    }
}

/// Positional access for builder closures.
///
/// # Panics
///
/// Panics when the template is not a list or is too short. Use
/// [`Template::at`] where the item may be absent.
impl Index<usize> for Template {
    type Output = Template;

    fn index(&self, index: usize) -> &Template {
        match self.at(index) {
            Some(t) => t,
            None => panic!("template has no item {index}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> (Column, Column, Template) {
        let id = Column::expr(false, "id");
        let name = Column::expr(true, "name");
        let t = Template::map([
            ("id", Template::from(id.clone())),
            ("pair", Template::list([Template::from(name.clone()), Template::from(id.clone())])),
        ]);
        (id, name, t)
    }

    #[test]
    fn tokens_are_distinct_in_walk_order() {
        let (id, name, t) = sample();
        assert_eq!(t.columns().len(), 3);
        assert_eq!(t.tokens(), vec![id.token().clone(), name.token().clone()]);
    }

    #[test]
    fn assemble_rebuilds_shape() {
        let (_, _, t) = sample();
        let mut values = vec![json!(1), json!("a"), json!(1)].into_iter();
        assert_eq!(t.assemble(&mut values), json!({ "id": 1, "pair": ["a", 1] }));
    }

    #[test]
    fn widen_touches_every_column() {
        let (_, _, t) = sample();
        assert!(t.widen_nullability(true).columns().iter().all(|c| c.is_nullable()));
        assert_eq!(t.widen_nullability(false).columns().iter().filter(|c| c.is_nullable()).count(), 1);
    }

    #[test]
    fn index_by_key_and_position() {
        let (_, name, t) = sample();
        assert_eq!(t["pair"][0].as_column().map(|c| c.token().clone()), Some(name.token().clone()));
        assert!(t.get("missing").is_none());
    }

    #[test]
    fn get_and_at_report_missing_entries() {
        let (_, _, t) = sample();
        assert!(t.get("nope").is_none());
        assert!(t["pair"].at(5).is_none());
        assert!(t["id"].get("id").is_none());
    }

    #[test]
    #[should_panic(expected = "template has no field `nope`")]
    fn indexing_a_missing_field_panics() {
        let (_, _, t) = sample();
        let _ = &t["nope"];
    }
}

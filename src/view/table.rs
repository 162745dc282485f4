use std::{cell::RefCell, collections::HashMap};

use crate::{
    column::{Column, Template},
    expr::{AliasId, Fragment, Token},
    view::{Op, View},
};

/// Column declaration surface handed to the [`View::table`] callback.
pub struct TableDef {
    alias: AliasId,
    tokens: RefCell<HashMap<String, Token>>,
}

impl TableDef {
    fn new() -> Self {
        Self { alias: AliasId::mint(), tokens: RefCell::new(HashMap::new()) }
    }

    pub fn alias(&self) -> AliasId {
        self.alias
    }

    /// Declares a non-nullable column. Declaring the same name twice yields
    /// columns sharing one token.
    pub fn column(&self, name: &str) -> Column {
        Column::new(self.token(name), false)
    }

    pub fn nullable(&self, name: &str) -> Column {
        Column::new(self.token(name), true)
    }

    fn token(&self, name: &str) -> Token {
        self.tokens
            .borrow_mut()
            .entry(name.to_string())
            .or_insert_with(|| Token::new(Fragment::column(self.alias, name)))
            .clone()
    }
}

impl View {
    /// A view over a raw FROM expression (usually a table name).
    ///
    /// ```ignore
    /// let users = View::table("users", |t| Template::map([
    ///     ("id", t.column("id").into()),
    ///     ("name", t.nullable("name").into()),
    /// ]));
    /// ```
    pub fn table<F>(from: impl Into<Fragment>, build: F) -> View
    where
        F: FnOnce(&TableDef) -> Template,
    {
        let def = TableDef::new();
        let template = build(&def);
        let alias = def.alias;
        View::from_op(template, [alias].into_iter().collect(), Op::Table { from: from.into(), alias })
    }
}

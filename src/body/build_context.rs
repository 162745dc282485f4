use std::collections::BTreeSet;

use tracing::debug;

use crate::{
    body::{BodyState, SelectItem, SelectStatement, Source, SourceKind, SqlBody},
    compiler::CompilerConfig,
    expr::{AliasId, Expander, Fragment, Token, TokenId, TokenSet},
};

/// Mutable state of one compilation: where each token currently points and
/// how output columns are named.
pub struct BuildContext<'a> {
    config: &'a CompilerConfig,
    expander: Expander,
}

impl<'a> BuildContext<'a> {
    pub fn new(config: &'a CompilerConfig) -> Self {
        Self { config, expander: Expander::new() }
    }

    pub fn config(&self) -> &'a CompilerConfig {
        self.config
    }

    pub fn expander(&self) -> &Expander {
        &self.expander
    }

    /// Renders `body` with `targets` as its select list. Repeated tokens
    /// collapse into one item; the returned names are in select list order.
    pub fn select<'t>(
        &self,
        body: &SqlBody,
        targets: impl IntoIterator<Item = &'t Token>,
    ) -> (SelectStatement, Vec<(TokenId, String)>) {
        let mut seen = BTreeSet::new();
        let mut items = Vec::new();
        let mut names = Vec::new();
        for t in targets {
            if !seen.insert(t.id()) {
                continue;
            }
            let alias = self.config.column_alias(items.len());
            items.push(SelectItem { expr: self.expander.expand_token(t), alias: alias.clone() });
            names.push((t.id(), alias));
        }
        let stmt = SelectStatement { targets: items, body: body.expanded(&self.expander) };
        (stmt, names)
    }

    /// Turns `body` into the FROM source of a new, empty body.
    ///
    /// Each token in `used` is selected by the subquery and from now on
    /// renders as the subquery's output column, for every fragment expanded
    /// after this call.
    pub fn bracket(&mut self, body: SqlBody, used: &TokenSet) -> SqlBody {
        let alias = AliasId::mint();
        let (stmt, names) = self.select(&body, used.iter());
        debug!(state = ?body.state(), columns = names.len(), "bracketing body as subquery");
        for (t, (_, name)) in used.iter().zip(names) {
            self.expander.redirect(t, Fragment::column(alias, name));
        }
        SqlBody::new(Source { kind: SourceKind::Subquery(Box::new(stmt)), alias })
    }

    pub fn bracket_when(&mut self, body: SqlBody, used: &TokenSet, blockers: BodyState) -> SqlBody {
        if body.state().intersects(blockers) {
            self.bracket(body, used)
        } else {
            body
        }
    }
}

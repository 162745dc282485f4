use serde_json::Value;
use tracing::debug;

use crate::{
    body::{BodyState, BuildContext, SelectStatement},
    column::{Column, Formats, Template},
    compiler::{Adapter, CompiledQuery, CompilerConfig, RowDecoder},
    expr::{Renderer, TokenSet},
    view::{CompileOptions, View},
};

/// Compiles views into SQL for one dialect.
pub struct Compiler<A: Adapter> {
    adapter: A,
    config: CompilerConfig,
}

impl<A: Adapter> Compiler<A> {
    pub fn new(adapter: A) -> Self {
        Self::with_config(adapter, CompilerConfig::default())
    }

    pub fn with_config(adapter: A, config: CompilerConfig) -> Self {
        Self { adapter, config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Rows query: one output column per distinct token of the template.
    pub fn compile(&self, view: &View) -> CompiledQuery {
        let mut ctx = BuildContext::new(&self.config);
        let targets = view.template().tokens();
        let used: TokenSet = targets.iter().cloned().collect();

        let body = view.compile(&used, CompileOptions::default(), &mut ctx);
        let (stmt, names) = ctx.select(&body, targets.iter());
        let (sql, params) = self.render(&stmt);
        debug!(sql = %sql, params = params.len(), "compiled view");

        CompiledQuery { sql, params, decoder: RowDecoder::new(view.template().clone(), names) }
    }

    /// `select count(*)` over the rows of `view`. Nothing of the view is
    /// selected, so lazy joins drop out and ORDER BY is not rendered.
    /// Decode with [`CompiledQuery::decode_one`].
    pub fn compile_total(&self, view: &View) -> CompiledQuery {
        let mut ctx = BuildContext::new(&self.config);
        let none = TokenSet::new();

        let body = view.compile(&none, CompileOptions { ordered: false }, &mut ctx);
        let blockers = BodyState::GROUP_BY | BodyState::HAVING | BodyState::SKIP | BodyState::TAKE;
        let body = ctx.bracket_when(body, &none, blockers);

        let template = Template::from(Column::expr(false, "count(*)").format(Formats::integer));
        let (stmt, names) = ctx.select(&body, template.tokens().iter());
        let (sql, params) = self.render(&stmt);
        debug!(sql = %sql, params = params.len(), "compiled total");

        CompiledQuery { sql, params, decoder: RowDecoder::new(template, names) }
    }

    fn render(&self, stmt: &SelectStatement) -> (String, Vec<Value>) {
        let mut r = Renderer::new(&self.adapter, &self.config.table_alias_prefix);
        let sql = stmt.render(&mut r);
        (sql, r.into_params())
    }
}

use tracing::debug;

use crate::{
    body::{BodyState, BuildContext, JoinClause, JoinKind, SqlBody},
    column::Template,
    compiler::InnerJoinPolicy,
    expr::{Fragment, TokenSet},
    view::{CompileOptions, Op, Usage, View, ViewError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMode {
    Left,
    Inner,
    /// A left join that is only rendered when something downstream reads
    /// the extra side.
    Lazy,
}

impl JoinMode {
    pub fn kind(self) -> JoinKind {
        match self {
            JoinMode::Left | JoinMode::Lazy => JoinKind::Left,
            JoinMode::Inner => JoinKind::Inner,
        }
    }

    /// States that force the base side into a subquery. ORDER BY is carried
    /// over to the joined body instead.
    pub fn base_blockers() -> BodyState {
        BodyState::GROUP_BY | BodyState::HAVING | BodyState::SKIP | BodyState::TAKE
    }

    /// States that force the extra side into a subquery.
    pub fn extra_blockers(self, policy: InnerJoinPolicy) -> BodyState {
        let aggregated = BodyState::GROUP_BY | BodyState::HAVING | BodyState::ORDER | BodyState::SKIP | BodyState::TAKE;
        match (self, policy) {
            // filters and joins of a nullable side must stay on that side
            (JoinMode::Left | JoinMode::Lazy, _) => BodyState::all(),
            (JoinMode::Inner, InnerJoinPolicy::Strict) => BodyState::all(),
            (JoinMode::Inner, InnerJoinPolicy::Relaxed) => aggregated,
        }
    }
}

pub(crate) struct JoinStep {
    pub(crate) base: View,
    pub(crate) extra: View,
    pub(crate) mode: JoinMode,
    pub(crate) with_null: bool,
    pub(crate) on: Fragment,
}

impl View {
    /// Joins `extra` onto `self`. The result row is `{ base, extra }`; with
    /// `with_null` every extra column becomes nullable.
    ///
    /// `on` receives the base template and the (widened) extra template.
    pub fn join<F>(&self, extra: &View, mode: JoinMode, with_null: bool, on: F) -> Result<View, ViewError>
    where
        F: FnOnce(&Template, &Template) -> Fragment,
    {
        if !self.sources().is_disjoint(extra.sources()) {
            return Err(ViewError::SharedSource);
        }
        // one token can only be redirected through one side
        if let Some(id) = self.scope().intersection(extra.scope()).next() {
            return Err(ViewError::SharedColumn { token: format!("{id:?}") });
        }
        let extra_template = extra.template().widen_nullability(with_null);
        let on = on(self.template(), &extra_template);

        let scope = self.scope().union(extra.scope()).copied().collect();
        Usage::check_fragment(&on, &scope, "join condition")?;

        let template = Template::map([("base", self.template().clone()), ("extra", extra_template)]);
        let sources = self.sources().union(extra.sources()).copied().collect();
        let step = JoinStep { base: self.clone(), extra: extra.clone(), mode, with_null, on };
        Ok(View::from_op(template, sources, Op::Join(step)))
    }
}

impl JoinStep {
    pub(crate) fn compile(&self, used: &TokenSet, opts: CompileOptions, ctx: &mut BuildContext) -> SqlBody {
        let downstream_base = Usage::narrow(used, self.base.scope());
        let downstream_extra = Usage::narrow(used, self.extra.scope());

        if self.mode == JoinMode::Lazy {
            if downstream_extra.is_empty() {
                debug!("lazy join not referenced downstream, keeping the base only");
                return self.base.compile(&downstream_base, opts, ctx);
            }
            if !self.with_null && !opts.ordered && downstream_base.is_empty() {
                debug!("lazy join base not referenced downstream, keeping the extra side only");
                return self.extra.compile(&downstream_extra, opts, ctx);
            }
        }

        let condition: TokenSet = self.on.tokens().into_iter().collect();
        let used_base = downstream_base.union(&Usage::narrow(&condition, self.base.scope()));
        let used_extra = downstream_extra.union(&Usage::narrow(&condition, self.extra.scope()));

        let base = self.base.compile(&used_base, opts, ctx);
        let extra = self.extra.compile(&used_extra, CompileOptions { ordered: false }, ctx);

        let mut body = ctx.bracket_when(base, &used_base, JoinMode::base_blockers());
        let policy = ctx.config().inner_join_policy;
        let extra = ctx.bracket_when(extra, &used_extra, self.mode.extra_blockers(policy));

        body.joins.push(JoinClause { kind: self.mode.kind(), source: extra.from, on: self.on.clone() });
        body.joins.extend(extra.joins);
        body.filters.extend(extra.filters);
        body.group_by.clear();
        body.having.clear();
        body.grouped = false;
        body
    }
}

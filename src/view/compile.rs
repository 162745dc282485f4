use tracing::trace;

use crate::{
    body::{BuildContext, Clause, SqlBody},
    expr::TokenSet,
    view::{Op, Usage, View},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Whether row order is observable. ORDER BY is dropped when it is not,
    /// e.g. under a count or on the extra side of a join.
    pub ordered: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self { ordered: true }
    }
}

impl View {
    /// Builds a fresh body for this view.
    ///
    /// `used` holds the tokens (of this view's scope) that the caller will
    /// read from the body; everything else may be pruned.
    pub(crate) fn compile(&self, used: &TokenSet, opts: CompileOptions, ctx: &mut BuildContext) -> SqlBody {
        trace!(op = ?self, used = used.len(), "compiling view");
        match self.op() {
            Op::Table { from, alias } => SqlBody::table(ctx.expander().expand(from), *alias),

            Op::Filter { input, condition } => {
                let mut needs = used.clone();
                needs.extend(condition.tokens());
                let needs = Usage::narrow(&needs, input.scope());
                let body = input.compile(&needs, opts, ctx);
                let mut body = ctx.bracket_when(body, &needs, Clause::Filter.blockers());
                body.add_filter(condition.clone());
                body
            }

            Op::Join(step) => step.compile(used, opts, ctx),

            Op::GroupBy(step) => step.compile(used, opts, ctx),

            Op::Project { input } => input.compile(&Usage::narrow(used, input.scope()), opts, ctx),

            Op::Order { input, items } => {
                if !opts.ordered {
                    return input.compile(&Usage::narrow(used, input.scope()), opts, ctx);
                }
                let mut needs = used.clone();
                for item in items {
                    needs.extend(item.expr.tokens());
                }
                let needs = Usage::narrow(&needs, input.scope());
                let body = input.compile(&needs, opts, ctx);
                let mut body = ctx.bracket_when(body, &needs, Clause::Order.blockers());
                body.prepend_order(items.clone());
                body
            }

            // the window depends on the order of the rows below it
            Op::Take { input, count } => {
                let mut body = input.compile(&Usage::narrow(used, input.scope()), CompileOptions { ordered: true }, ctx);
                body.apply_take(*count);
                body
            }

            Op::Skip { input, count } => {
                let mut body = input.compile(&Usage::narrow(used, input.scope()), CompileOptions { ordered: true }, ctx);
                body.apply_skip(*count);
                body
            }

            Op::Bracket { input, predicate } => {
                let needs = Usage::narrow(used, input.scope());
                let body = input.compile(&needs, opts, ctx);
                if predicate(body.state()) {
                    ctx.bracket(body, &needs)
                } else {
                    body
                }
            }
        }
    }
}

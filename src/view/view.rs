use std::{collections::BTreeSet, fmt, sync::Arc};

use crate::{
    body::{BodyState, Direction, OrderItem},
    column::Template,
    expr::{AliasId, Fragment, TokenId},
    view::{GroupByStep, JoinStep, Usage, ViewError},
};

pub type BracketPredicate = Arc<dyn Fn(BodyState) -> bool + Send + Sync>;

/// One step of a view. Every step but `Table` wraps the view it was built on.
pub(crate) enum Op {
    Table { from: Fragment, alias: AliasId },
    Filter { input: View, condition: Fragment },
    Join(JoinStep),
    GroupBy(GroupByStep),
    /// Reshapes the template only; the body is the input's.
    Project { input: View },
    Order { input: View, items: Vec<OrderItem> },
    Take { input: View, count: u64 },
    Skip { input: View, count: u64 },
    Bracket { input: View, predicate: BracketPredicate },
}

impl Op {
    fn name(&self) -> &'static str {
        match self {
            Op::Table { .. } => "Table",
            Op::Filter { .. } => "Filter",
            Op::Join(_) => "Join",
            Op::GroupBy(_) => "GroupBy",
            Op::Project { .. } => "Project",
            Op::Order { .. } => "Order",
            Op::Take { .. } => "Take",
            Op::Skip { .. } => "Skip",
            Op::Bracket { .. } => "Bracket",
        }
    }
}

pub(crate) struct ViewNode {
    pub(crate) template: Template,
    /// Tokens of `template`; anything a builder on this view may reference.
    pub(crate) scope: BTreeSet<TokenId>,
    /// Table definitions read anywhere below this node.
    pub(crate) sources: BTreeSet<AliasId>,
    pub(crate) op: Op,
}

/// An immutable description of a query. Combinators return new views and
/// leave the receiver untouched; nothing is rendered until a
/// [`Compiler`](crate::compiler::Compiler) compiles the view.
#[derive(Clone)]
pub struct View(pub(crate) Arc<ViewNode>);

impl View {
    pub(crate) fn from_op(template: Template, sources: BTreeSet<AliasId>, op: Op) -> View {
        let scope = template.token_ids();
        View(Arc::new(ViewNode { template, scope, sources, op }))
    }

    /// Same template and sources as `self`, new step on top.
    fn wrap(&self, op: Op) -> View {
        View::from_op(self.0.template.clone(), self.0.sources.clone(), op)
    }

    pub fn template(&self) -> &Template {
        &self.0.template
    }

    pub fn sources(&self) -> &BTreeSet<AliasId> {
        &self.0.sources
    }

    pub(crate) fn scope(&self) -> &BTreeSet<TokenId> {
        &self.0.scope
    }

    pub(crate) fn op(&self) -> &Op {
        &self.0.op
    }

    /// Adds a predicate, AND-ed with the existing ones. It lands in HAVING
    /// when the view is aggregated.
    pub fn and_where<F>(&self, build: F) -> Result<View, ViewError>
    where
        F: FnOnce(&Template) -> Fragment,
    {
        let condition = build(self.template());
        Usage::check_fragment(&condition, self.scope(), "and_where")?;
        Ok(self.wrap(Op::Filter { input: self.clone(), condition }))
    }

    /// Reshapes the row. New columns may combine existing ones.
    pub fn map_to<F>(&self, build: F) -> Result<View, ViewError>
    where
        F: FnOnce(&Template) -> Template,
    {
        let template = build(self.template());
        Usage::check_template(&template, self.scope(), "map_to")?;
        Ok(View::from_op(template, self.0.sources.clone(), Op::Project { input: self.clone() }))
    }

    pub fn order<F>(&self, direction: Direction, build: F) -> Result<View, ViewError>
    where
        F: FnOnce(&Template) -> Fragment,
    {
        let expr = build(self.template());
        self.order_by(|_| vec![OrderItem { expr, direction, nulls: None }])
    }

    /// Several order items at once; together they take precedence over
    /// any ordering applied before.
    pub fn order_by<F>(&self, build: F) -> Result<View, ViewError>
    where
        F: FnOnce(&Template) -> Vec<OrderItem>,
    {
        let items = build(self.template());
        for item in &items {
            Usage::check_fragment(&item.expr, self.scope(), "order")?;
        }
        Ok(self.wrap(Op::Order { input: self.clone(), items }))
    }

    pub fn take(&self, count: u64) -> View {
        self.wrap(Op::Take { input: self.clone(), count })
    }

    pub fn skip(&self, count: u64) -> View {
        self.wrap(Op::Skip { input: self.clone(), count })
    }

    /// Forces the view into a subquery at this point.
    pub fn bracket(&self) -> View {
        self.bracket_if(|_| true)
    }

    /// Wraps the body into a subquery when `predicate` holds for its state
    /// at compile time.
    pub fn bracket_if<F>(&self, predicate: F) -> View
    where
        F: Fn(BodyState) -> bool + Send + Sync + 'static,
    {
        self.wrap(Op::Bracket { input: self.clone(), predicate: Arc::new(predicate) })
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("op", &self.0.op.name())
            .field("template", &self.0.template)
            .finish()
    }
}

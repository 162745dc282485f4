use crate::{
    body::{BuildContext, Clause, SqlBody},
    column::Template,
    expr::{Fragment, TokenSet},
    view::{CompileOptions, Op, Usage, View, ViewError},
};

pub(crate) struct GroupByStep {
    pub(crate) input: View,
    pub(crate) keys: Template,
}

impl View {
    /// Aggregates the view. `keys` picks the grouping columns out of the
    /// input row; `aggregates` builds new columns (`count(*)`, `sum(..)`)
    /// over the pre-aggregation row. The result row is `{ keys, content }`.
    ///
    /// An empty key template aggregates the whole view into one row.
    pub fn group_by<K, A>(&self, keys: K, aggregates: A) -> Result<View, ViewError>
    where
        K: FnOnce(&Template) -> Template,
        A: FnOnce(&Template) -> Template,
    {
        let keys = keys(self.template());
        Usage::check_template(&keys, self.scope(), "group_by keys")?;
        let content = aggregates(self.template());
        Usage::check_template(&content, self.scope(), "group_by aggregates")?;

        let template = Template::map([("keys", keys.clone()), ("content", content)]);
        let step = GroupByStep { input: self.clone(), keys };
        Ok(View::from_op(template, self.sources().clone(), Op::GroupBy(step)))
    }
}

impl GroupByStep {
    pub(crate) fn compile(&self, used: &TokenSet, opts: CompileOptions, ctx: &mut BuildContext) -> SqlBody {
        // every key takes part in the grouping, selected or not
        let keys = self.keys.tokens();
        let mut needs = used.clone();
        needs.extend(keys.iter().cloned());
        let needs = Usage::narrow(&needs, self.input.scope());

        let body = self.input.compile(&needs, opts, ctx);
        let mut body = ctx.bracket_when(body, &needs, Clause::GroupBy.blockers());
        body.set_group_by(keys.into_iter().map(Fragment::from).collect());
        body
    }
}

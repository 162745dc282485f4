use crate::{
    body::BodyState,
    compiler::RenderedOrder,
    expr::{AliasId, Expander, Fragment, Renderer},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Left,
    Inner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nulls {
    First,
    Last,
}

#[derive(Debug, Clone)]
pub struct OrderItem {
    pub expr: Fragment,
    pub direction: Direction,
    pub nulls: Option<Nulls>,
}

impl OrderItem {
    pub fn asc(expr: impl Into<Fragment>) -> Self {
        Self { expr: expr.into(), direction: Direction::Asc, nulls: None }
    }

    pub fn desc(expr: impl Into<Fragment>) -> Self {
        Self { expr: expr.into(), direction: Direction::Desc, nulls: None }
    }

    pub fn nulls(self, nulls: Nulls) -> Self {
        Self { nulls: Some(nulls), ..self }
    }
}

#[derive(Debug, Clone)]
pub enum SourceKind {
    /// Raw FROM expression, usually a table name.
    Table(Fragment),
    /// A previous body, already expanded.
    Subquery(Box<SelectStatement>),
}

#[derive(Debug, Clone)]
pub struct Source {
    pub kind: SourceKind,
    pub alias: AliasId,
}

#[derive(Debug, Clone)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub source: Source,
    pub on: Fragment,
}

/// One SELECT body. Predicates and order items keep their token references
/// until the body is bracketed or rendered.
#[derive(Debug, Clone)]
pub struct SqlBody {
    pub from: Source,
    pub joins: Vec<JoinClause>,
    pub filters: Vec<Fragment>,
    pub group_by: Vec<Fragment>,
    /// Set by an aggregation even when it has no keys.
    pub grouped: bool,
    pub having: Vec<Fragment>,
    pub order: Vec<OrderItem>,
    pub take: Option<u64>,
    pub skip: u64,
}

impl SqlBody {
    pub fn new(from: Source) -> Self {
        Self {
            from,
            joins: Vec::new(),
            filters: Vec::new(),
            group_by: Vec::new(),
            grouped: false,
            having: Vec::new(),
            order: Vec::new(),
            take: None,
            skip: 0,
        }
    }

    pub fn table(from: Fragment, alias: AliasId) -> Self {
        Self::new(Source { kind: SourceKind::Table(from), alias })
    }

    pub fn state(&self) -> BodyState {
        let mut s = BodyState::empty();
        for j in &self.joins {
            s |= match j.kind {
                JoinKind::Left => BodyState::LEFT_JOIN,
                JoinKind::Inner => BodyState::INNER_JOIN,
            };
        }
        if !self.filters.is_empty() {
            s |= BodyState::WHERE;
        }
        if self.grouped || !self.group_by.is_empty() {
            s |= BodyState::GROUP_BY;
        }
        if !self.having.is_empty() {
            s |= BodyState::HAVING;
        }
        if !self.order.is_empty() {
            s |= BodyState::ORDER;
        }
        if self.skip > 0 {
            s |= BodyState::SKIP;
        }
        if self.take.is_some() {
            s |= BodyState::TAKE;
        }
        s
    }

    /// WHERE for row-level bodies, HAVING once grouped.
    pub fn add_filter(&mut self, condition: Fragment) {
        if self.grouped {
            self.having.push(condition);
        } else {
            self.filters.push(condition);
        }
    }

    /// The newest order call takes primary precedence.
    pub fn prepend_order(&mut self, mut items: Vec<OrderItem>) {
        items.append(&mut self.order);
        self.order = items;
    }

    pub fn apply_take(&mut self, count: u64) {
        self.take = Some(self.take.map_or(count, |t| t.min(count)));
    }

    pub fn apply_skip(&mut self, count: u64) {
        self.skip += count;
        self.take = self.take.map(|t| t.saturating_sub(count));
    }

    pub fn set_group_by(&mut self, keys: Vec<Fragment>) {
        self.group_by = keys;
        self.grouped = true;
    }

    /// Copy with every token replaced by what it currently renders as.
    pub fn expanded(&self, ex: &Expander) -> SqlBody {
        let expand_all = |v: &[Fragment]| v.iter().map(|f| ex.expand(f)).collect::<Vec<_>>();
        SqlBody {
            from: Self::expand_source(&self.from, ex),
            joins: self
                .joins
                .iter()
                .map(|j| JoinClause { kind: j.kind, source: Self::expand_source(&j.source, ex), on: ex.expand(&j.on) })
                .collect(),
            filters: expand_all(&self.filters),
            group_by: expand_all(&self.group_by),
            grouped: self.grouped,
            having: expand_all(&self.having),
            order: self
                .order
                .iter()
                .map(|o| OrderItem { expr: ex.expand(&o.expr), ..o.clone() })
                .collect(),
            take: self.take,
            skip: self.skip,
        }
    }

    fn expand_source(source: &Source, ex: &Expander) -> Source {
        let kind = match &source.kind {
            SourceKind::Table(f) => SourceKind::Table(ex.expand(f)),
            SourceKind::Subquery(s) => SourceKind::Subquery(s.clone()),
        };
        Source { kind, alias: source.alias }
    }
}

#[derive(Debug, Clone)]
pub struct SelectItem {
    pub expr: Fragment,
    pub alias: String,
}

/// An expanded body together with its select list; ready to render.
#[derive(Debug, Clone)]
pub struct SelectStatement {
    pub targets: Vec<SelectItem>,
    pub body: SqlBody,
}

impl SelectStatement {
    pub fn render(&self, r: &mut Renderer) -> String {
        let adapter = r.adapter();
        let mut sql = String::from("select ");
        if self.targets.is_empty() {
            sql.push('1');
        } else {
            let items: Vec<String> = self
                .targets
                .iter()
                .map(|t| {
                    let expr = r.render(&t.expr);
                    adapter.select_and_alias(&expr, &t.alias)
                })
                .collect();
            sql.push_str(&items.join(", "));
        }

        let body = &self.body;
        sql.push_str(" from ");
        sql.push_str(&Self::render_source(&body.from, r));

        for j in &body.joins {
            sql.push_str(match j.kind {
                JoinKind::Left => " left join ",
                JoinKind::Inner => " inner join ",
            });
            sql.push_str(&Self::render_source(&j.source, r));
            sql.push_str(" on ");
            sql.push_str(&r.render(&j.on));
        }

        if !body.filters.is_empty() {
            sql.push_str(" where ");
            sql.push_str(&Self::render_conjunction(&body.filters, r));
        }
        if !body.group_by.is_empty() {
            let keys: Vec<String> = body.group_by.iter().map(|k| r.render(k)).collect();
            sql.push_str(" group by ");
            sql.push_str(&keys.join(", "));
        }
        if !body.having.is_empty() {
            sql.push_str(" having ");
            sql.push_str(&Self::render_conjunction(&body.having, r));
        }
        if !body.order.is_empty() {
            let items: Vec<RenderedOrder> = body
                .order
                .iter()
                .map(|o| RenderedOrder { expr: r.render(&o.expr), direction: o.direction, nulls: o.nulls })
                .collect();
            sql.push(' ');
            sql.push_str(&adapter.order(&items));
        }
        if body.skip > 0 || body.take.is_some() {
            sql.push(' ');
            sql.push_str(&adapter.pagination(body.skip, body.take));
        }
        sql
    }

    fn render_source(source: &Source, r: &mut Renderer) -> String {
        let from = match &source.kind {
            SourceKind::Table(f) => r.render(f),
            SourceKind::Subquery(s) => format!("({})", s.render(r)),
        };
        let alias = r.alias_name(source.alias);
        format!("{} as {}", from, r.adapter().table_alias(&alias))
    }

    fn render_conjunction(parts: &[Fragment], r: &mut Renderer) -> String {
        if parts.len() == 1 {
            return r.render(&parts[0]);
        }
        parts
            .iter()
            .map(|p| format!("({})", r.render(p)))
            .collect::<Vec<_>>()
            .join(" and ")
    }
}

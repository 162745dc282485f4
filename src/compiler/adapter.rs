use crate::body::{Direction, Nulls};

/// One ORDER BY item after its expression was rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedOrder {
    pub expr: String,
    pub direction: Direction,
    pub nulls: Option<Nulls>,
}

/// Dialect specific pieces of SQL text. The compiler calls these while
/// rendering and never looks at what they return.
pub trait Adapter: Send + Sync {
    /// Alias of a FROM/JOIN source, as written after `as`.
    fn table_alias(&self, alias: &str) -> String;
    fn column_ref(&self, table_alias: &str, column: &str) -> String;
    fn select_and_alias(&self, expr: &str, alias: &str) -> String;
    /// Called only when `skip > 0` or `take` is set.
    fn pagination(&self, skip: u64, take: Option<u64>) -> String;
    /// Called only with a non-empty list; returns the whole clause.
    fn order(&self, items: &[RenderedOrder]) -> String;
    /// Marker for the parameter at `index` (zero based, text order).
    fn param_holder(&self, index: usize) -> String;
}

fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn direction(d: Direction) -> &'static str {
    match d {
        Direction::Asc => "asc",
        Direction::Desc => "desc",
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresAdapter;

impl Adapter for PostgresAdapter {
    fn table_alias(&self, alias: &str) -> String {
        quote(alias)
    }

    fn column_ref(&self, table_alias: &str, column: &str) -> String {
        format!("{}.{}", quote(table_alias), quote(column))
    }

    fn select_and_alias(&self, expr: &str, alias: &str) -> String {
        format!("{} as {}", expr, quote(alias))
    }

    fn pagination(&self, skip: u64, take: Option<u64>) -> String {
        let mut parts = Vec::new();
        if let Some(t) = take {
            parts.push(format!("limit {t}"));
        }
        if skip > 0 {
            parts.push(format!("offset {skip}"));
        }
        parts.join(" ")
    }

    fn order(&self, items: &[RenderedOrder]) -> String {
        let items: Vec<String> = items
            .iter()
            .map(|o| {
                let nulls = match o.nulls {
                    Some(Nulls::First) => " nulls first",
                    Some(Nulls::Last) => " nulls last",
                    None => "",
                };
                format!("{} {}{}", o.expr, direction(o.direction), nulls)
            })
            .collect();
        format!("order by {}", items.join(", "))
    }

    fn param_holder(&self, index: usize) -> String {
        format!("${}", index + 1)
    }
}

/// SQLite: positional `?` parameters, `limit -1` when only skipping, and
/// NULL placement spelled out with `is null` sort keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteAdapter;

impl Adapter for SqliteAdapter {
    fn table_alias(&self, alias: &str) -> String {
        quote(alias)
    }

    fn column_ref(&self, table_alias: &str, column: &str) -> String {
        format!("{}.{}", quote(table_alias), quote(column))
    }

    fn select_and_alias(&self, expr: &str, alias: &str) -> String {
        format!("{} as {}", expr, quote(alias))
    }

    fn pagination(&self, skip: u64, take: Option<u64>) -> String {
        let limit = take.map_or_else(|| "-1".to_string(), |t| t.to_string());
        if skip > 0 {
            format!("limit {limit} offset {skip}")
        } else {
            format!("limit {limit}")
        }
    }

    fn order(&self, items: &[RenderedOrder]) -> String {
        let mut keys = Vec::new();
        for o in items {
            match o.nulls {
                Some(Nulls::First) => keys.push(format!("{} is null desc", o.expr)),
                Some(Nulls::Last) => keys.push(format!("{} is null asc", o.expr)),
                None => {}
            }
            keys.push(format!("{} {}", o.expr, direction(o.direction)));
        }
        format!("order by {}", keys.join(", "))
    }

    fn param_holder(&self, _index: usize) -> String {
        "?".to_string()
    }
}

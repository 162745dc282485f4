use serde::{Deserialize, Serialize};

/// When the extra side of an inner join has to become a subquery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InnerJoinPolicy {
    /// Any join, filter or post-aggregation clause on the extra side.
    #[default]
    Strict,
    /// Only GROUP BY, HAVING, ORDER BY, LIMIT or OFFSET on the extra side.
    Relaxed,
}

/// Compiler configuration.
///
/// - `inner_join_policy` picks the bracketing rule for inner joins.
/// - `table_alias_prefix` names sources `t0`, `t1`, ...
/// - `column_alias_prefix` names output columns `value_0`, `value_1`, ...
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub inner_join_policy: InnerJoinPolicy,
    pub table_alias_prefix: String,
    pub column_alias_prefix: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            inner_join_policy: InnerJoinPolicy::default(),
            table_alias_prefix: "t".to_string(),
            column_alias_prefix: "value_".to_string(),
        }
    }
}

impl CompilerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(inner_join_policy: InnerJoinPolicy, table_alias_prefix: &str, column_alias_prefix: &str) -> Self {
        Self {
            inner_join_policy,
            table_alias_prefix: table_alias_prefix.to_string(),
            column_alias_prefix: column_alias_prefix.to_string(),
        }
    }

    /// Default naming with the relaxed inner join rule.
    pub fn relaxed() -> Self {
        Self { inner_join_policy: InnerJoinPolicy::Relaxed, ..Self::default() }
    }

    pub fn column_alias(&self, index: usize) -> String {
        format!("{}{}", self.column_alias_prefix, index)
    }
}

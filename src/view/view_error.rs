use thiserror::Error;

/// Construction-time failures. They are raised while a view is built, never
/// while it is compiled.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewError {
    #[error("column is tagged {found:?} but `{expected}` was required")]
    TagMismatch { expected: String, found: Option<String> },

    #[error("{context} references {token}, which is not reachable from the views it was given")]
    DanglingReference { context: &'static str, token: String },

    #[error("both sides of a join read the same table definition; declare the table twice for a self join")]
    SharedSource,

    #[error("{token} appears on both sides of a join; build a separate column for each side")]
    SharedColumn { token: String },
}

pub mod body_state;
pub use body_state::*;

pub mod sql_body;
pub use sql_body::*;

pub mod build_context;
pub use build_context::*;

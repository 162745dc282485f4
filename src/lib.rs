pub mod expr;
pub use expr::{Fragment, Token};

pub mod column;
pub use column::{Column, DecodeError, Formats, Template};

pub mod body;
pub use body::{BodyState, Direction, Nulls, OrderItem};

pub mod view;
pub use view::{JoinMode, View, ViewError};

pub mod compiler;
pub use compiler::{CompiledQuery, Compiler, CompilerConfig, InnerJoinPolicy, PostgresAdapter, RawRow, SqliteAdapter};

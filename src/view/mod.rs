pub mod view_error;
pub use view_error::*;

pub mod usage;
pub use usage::*;

pub mod view;
pub use view::*;

pub mod table;
pub use table::*;

pub mod join;
pub use join::*;

pub mod group_by;
pub(crate) use group_by::*;

pub mod compile;
pub use compile::*;

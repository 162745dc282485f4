pub mod token;
pub use token::*;

pub mod fragment;
pub use fragment::*;

pub mod resolver;
pub use resolver::*;

pub mod expander;
pub use expander::*;

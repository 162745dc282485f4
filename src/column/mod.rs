pub mod decode_error;
pub use decode_error::*;

pub mod decoder;
pub use decoder::*;

pub mod formats;
pub use formats::*;

pub mod column;
pub use column::*;

pub mod template;
pub use template::*;

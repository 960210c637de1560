pub use error::*;
pub use param_group::*;

pub mod error;
pub mod param_group;

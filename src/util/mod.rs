pub use optimize::*;

pub mod optimize;

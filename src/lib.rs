pub mod core;
pub mod optim;
pub mod util;

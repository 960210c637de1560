pub use decay::*;
pub use equinox::*;
pub use scheduler::*;
pub use section::*;
pub use waveform::*;

pub mod decay;
pub mod equinox;
pub mod scheduler;
pub mod section;
pub mod waveform;

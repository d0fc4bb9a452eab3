//! Numeric primitives, random sources and array I/O
pub mod io;
pub mod math;
pub mod rng;

// Re-export commonly used utilities
pub use io::*;
pub use math::*;
pub use rng::*;

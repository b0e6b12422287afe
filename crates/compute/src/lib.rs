pub mod blend;
pub mod cluster;

pub use blend::*;
pub use cluster::*;

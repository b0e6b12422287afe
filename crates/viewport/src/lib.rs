pub mod policy;
pub mod transform;

pub use policy::*;
pub use transform::*;

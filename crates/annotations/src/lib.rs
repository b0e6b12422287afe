pub mod feature;
pub mod store;
pub mod visibility;

pub use feature::*;
pub use store::*;
pub use visibility::*;

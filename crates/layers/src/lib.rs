pub mod draw;
pub mod surface;

pub use draw::*;
pub use surface::*;

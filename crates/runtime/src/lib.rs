pub mod events;
pub mod frame;
pub mod session;

pub use events::*;
pub use frame::*;
pub use session::*;

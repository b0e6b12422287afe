pub mod client;
pub mod protocol;
pub mod request;

pub use client::*;
pub use protocol::*;
pub use request::*;

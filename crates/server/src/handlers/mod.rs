//! Request handlers.

pub mod avatar;
pub mod gateway;
pub mod verify;

pub use gateway::gateway_entry;
pub use verify::verify_entry;

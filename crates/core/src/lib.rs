//! Core domain types for the Locker gateway.
//!
//! This crate defines the model shared by the server and storage layers:
//! - Capability grants and the closed set of operations they name
//! - The AEAD envelope codec that seals and opens grants
//! - The application configuration model
//! - The shared error type

pub mod config;
pub mod envelope;
pub mod error;
pub mod grant;

pub use config::AppConfig;
pub use envelope::GatewaySecret;
pub use error::{Error, Result};
pub use grant::{Grant, Method};

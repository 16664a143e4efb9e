//! HTTP gateway for the Locker capability-token object store.
//!
//! Two endpoints, both POST-only with CORS preflight:
//! - `/v1/gateway` accepts a multipart form carrying an encrypted
//!   capability grant and (for writes) a file, and executes the single
//!   storage operation the grant names.
//! - `/v1/verify` proxies CAPTCHA verification and returns the
//!   verifier's payload sealed in the same envelope format.

pub mod cors;
pub mod handlers;
pub mod reply;
pub mod routes;
pub mod state;

pub use reply::Denial;
pub use routes::create_router;
pub use state::AppState;

//! dog-presign-axum: Axum adapter for dog-presign.
//!
//! Exposes grant issuance and presigned transfers over HTTP. Files arrive
//! as multipart forms, download completions as JSON, and every failure
//! renders as `{ name, message, code, className }`.

pub mod app;
pub mod config;
pub mod multipart;
pub mod routes;
pub mod state;
mod error;
pub use error::{PresignAxumError, RequestError};
pub use state::PresignState;

pub use app::{presign, PresignApp};
pub use config::{Backend, HttpConfig};

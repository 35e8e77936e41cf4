//! Firecache API Library
//!
//! HTTP surface of the caching proxy: handlers, error responses and
//! application setup.

mod api_doc;
mod handlers;
mod telemetry;

pub mod error;
pub mod setup;
pub mod state;

pub use error::ErrorResponse;

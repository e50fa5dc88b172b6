//! TYT Edge Gateway - CORS negotiation, auth verification and rate limiting
//! for the TakeYourToken external-data proxy endpoints.
//!
//! Every handler follows the same pipeline: CORS preflight short-circuit,
//! per-tier rate-limit check, optional bearer verification against the
//! backend session service, endpoint-specific upstream fetches, and response
//! assembly with CORS headers on every branch.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod backend;
pub mod config;
pub mod cors;
pub mod error;
pub mod handlers;
pub mod observability;
pub mod providers;
pub mod rate_limiter;
pub mod shutdown;

pub use config::Config;
pub use cors::CorsPolicy;
pub use error::EdgeError;
pub use rate_limiter::{RateLimitConfig, RateLimitDecision, RateLimiter};

//! Unit Tests Module
//!
//! Organized by domain following the test pyramid.
//!
//! Structure:
//! - auth: bearer verification ladder and the admin gate
//! - config: configuration validation
//! - cors: origin allow-list negotiation
//! - error: error codes, statuses and wire bodies
//! - rate_limiter: fixed-window counting, tiers and sweep
//! - swap: static price table and rate computation

pub mod config;

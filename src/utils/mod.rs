//! Utility functions shared by the client and the views
//!
//! # Modules
//!
//! - [`retry_utils`]: Fixed-delay retry returning `None` on exhaustion
//! - [`rate_limit_utils`]: Per-second request limiter used by the RPC client

/// Fixed-delay retry utilities
pub mod retry_utils;

/// Request rate limiting utilities
pub mod rate_limit_utils;

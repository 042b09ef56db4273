//! API Middleware Module
//!
//! The access gate in front of protected routes, plus helpers for bearer
//! extraction and quota headers.

pub mod auth;
pub mod quota;
pub mod service;

pub use auth::{extract_bearer, IdentityExt};
pub use quota::{add_quota_headers, QUOTA_LIMIT, QUOTA_REMAINING, QUOTA_RESET, QUOTA_USED};
pub use service::{AccessGateMiddleware, GateMode};

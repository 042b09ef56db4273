//! HTTP request handlers

pub mod health;
pub mod auth;
pub mod usage;
pub mod workout;
pub mod speech;

// Tier 1: endpoints that do not require authentication
pub mod auth;

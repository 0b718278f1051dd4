pub mod auth;
pub mod pricing;

//! Backend wire types and the HTTP client that speaks them.

pub mod api;
pub mod types;

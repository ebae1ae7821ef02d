//! Network layer: wire types and the backend API client.

pub mod api;
pub mod types;

pub use api::{AuthApi, HttpAuthApi};
pub use types::ApiError;

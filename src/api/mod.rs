mod client;

pub use client::{error_from_response, ApiClient};

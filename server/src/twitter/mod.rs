//! Twitter access: raw API backend, pagination and the domain-level service.

pub mod backend;
pub mod client;
pub mod error;
#[cfg(test)]
pub mod mock;
pub mod oauth;
pub mod paging;
pub mod service;
pub mod types;

pub use backend::TwitterBackend;
pub use client::HttpBackend;
pub use error::{TwitterError, TwitterResult};
pub use service::TwitterService;

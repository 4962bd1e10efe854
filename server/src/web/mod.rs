pub mod api;
pub mod app_state;
pub mod error;
pub mod router;
pub mod session;

#![forbid(unsafe_code)]

pub mod http;
pub mod provider;

pub use http::{HttpPortal, PortalConfig};
pub use provider::{ApiError, InMemoryPortal, Portal, ReviewSink, SessionCloser, WordProvider};

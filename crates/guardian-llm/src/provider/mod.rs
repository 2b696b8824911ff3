//! Model providers

pub mod google;
pub mod sse;

pub use google::GoogleProvider;

pub mod client;
pub mod sse;

pub use client::{BridgeClient, EventStream};
pub use sse::SseDecoder;

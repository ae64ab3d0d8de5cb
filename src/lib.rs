//! # headerpeek
//!
//! Concurrent, append-only byte stream with a seekable header window.
//!
//! A producer pushes bytes as they arrive from a live source while a consumer
//! pulls them with blocking or async reads. The first few bytes stay buffered
//! so the consumer can sniff the container format before the rest of the
//! payload exists.

pub mod stream;
pub use stream::*;

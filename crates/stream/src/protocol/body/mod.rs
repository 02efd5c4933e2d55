//! Body production and consumption.
//!
//! This module provides the components a stream handler drives to produce a
//! response body:
//!
//! - [`generate`] / [`RepeatBody`]: the body generator, a lazy and restartable
//!   sequence of chunks equal to a fragment repeated a number of times
//! - [`EchoCollector`]: consumes the request body in order, either relaying each
//!   chunk to the response as soon as it arrives or assembling it first
//! - [`ChunkBuffer`]: the bounded accumulator used when assembling a body
//!
//! # Design Goals
//!
//! 1. **Memory Efficiency**
//!    - Generated bodies cost one chunk of memory whatever their total size
//!    - Relayed bodies are forwarded chunk by chunk, never buffered whole
//!
//! 2. **Ordering**
//!    - Every chunk carries its offset, chunks of one stream are produced and
//!      written in strictly increasing offset order
//!
//! 3. **Isolation**
//!    - Nothing here is shared between streams: each handler owns its
//!      generator, collector and buffer

mod chunk_buffer;
mod echo;
mod generator;

pub use chunk_buffer::ChunkBuffer;
pub use echo::EchoCollector;
pub use generator::RepeatBody;
pub use generator::RepeatChunks;
pub use generator::generate;

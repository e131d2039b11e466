//! A transparent streaming zstd compression adapter for async byte-stream
//! transports.
//!
//! [`Adapter<T>`] wraps any bidirectional transport `T` — typically a
//! `tokio::net::TcpStream` — and exposes the same async byte-stream surface,
//! silently zstd-compressing bytes accepted by [`Adapter::write_some`] and
//! decompressing bytes delivered by [`Adapter::read_some`]. Upper-layer code
//! reads and writes plain bytes; whatever sits below the adapter sees only
//! the codec's own streaming frames. The adapter is the middle layer in a
//! protocol stack, not the protocol itself.
//!
//! ```no_run
//! # async fn example() -> zstd_stream_adapter::Result<()> {
//! use zstd_stream_adapter::Adapter;
//! use tokio::net::TcpStream;
//! use std::io::{IoSlice, IoSliceMut};
//!
//! let stream = TcpStream::connect("127.0.0.1:9999").await?;
//! let adapter = Adapter::new_wrapping(stream, zstd::DEFAULT_COMPRESSION_LEVEL)?;
//!
//! adapter.write_some(&[IoSlice::new(b"hello")]).await?;
//!
//! let mut buf = [0u8; 64];
//! let n = adapter.read_some(&mut [IoSliceMut::new(&mut buf)]).await?;
//! # let _ = n;
//! # Ok(())
//! # }
//! ```
//!
//! # Scope
//!
//! This crate adds no message framing, dictionary negotiation, or
//! end-of-stream signaling beyond what the transport itself provides — it
//! delivers a byte stream, not messages. Two peers interoperate by
//! configuring matching compression parameters and mapping directions
//! consistently: A's encoder talks to B's decoder and vice versa.
//!
//! # Concurrency
//!
//! Reads and writes are independently serialized: at most one `read_some`
//! and one `write_some` may be in flight on a given adapter at a time, but a
//! read and a write always progress concurrently (full duplex — the core
//! models each direction as its own mutex rather than one mutex for both).
//! Many tasks may share an
//! `Arc<Adapter<T>>` and call either method; calls on the same direction
//! queue behind the corresponding internal mutex in roughly FIFO order.
//!
//! # Unbounded staging buffers
//!
//! Compressed bytes awaiting decode, and compressed bytes awaiting
//! transmission, are staged in buffers with no upper bound. A peer that
//! persistently outruns its counterpart — sending faster than this side
//! calls `read_some`, or writing faster than the transport drains — grows
//! these buffers without bound. This adapter applies no backpressure cap;
//! see DESIGN.md for the tradeoff.
//!
//! # Recovering from a codec error
//!
//! A codec error from either pump leaves that direction's codec state
//! potentially inconsistent. Continuing to call `read_some`/`write_some`
//! afterwards is unsupported; call [`Adapter::reset`] first.

mod adapter;
mod codec;
mod core;
mod error;
mod params;
mod stats;

pub use adapter::Adapter;
pub use error::{Category, Error, Result};
pub use params::{DecoderParameter, EncoderParameter};
pub use stats::StatisticsSnapshot;

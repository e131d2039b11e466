//! The public facade: a transport plus a [`crate::core::CompressionCore`],
//! exposing the same async byte-stream shape as the wrapped transport
//! itself.

use std::io;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::core::CompressionCore;
use crate::error::Result;
use crate::params::{DecoderParameter, EncoderParameter};
use crate::stats::StatisticsSnapshot;

/// Wraps a bidirectional async transport `T`, transparently zstd-compressing
/// bytes accepted by [`Adapter::write_some`] and decompressing bytes
/// delivered by [`Adapter::read_some`].
///
/// The read/write methods require `for<'a> &'a T: AsyncRead + AsyncWrite +
/// Unpin` — the same capability tokio itself grants `&TcpStream` — so they
/// take `&self` rather than `&mut self`, and many tasks may hold a shared
/// `Arc<Adapter<T>>` and call both concurrently (see the crate root docs on
/// concurrency). Everything else (`next_layer`, `statistics`, `reset`,
/// parameter setters) has no bound on `T` at all.
pub struct Adapter<T> {
    transport: T,
    core: CompressionCore,
}

impl<T> Adapter<T> {
    /// Wraps an already-connected transport at the given compression level.
    ///
    /// Fails with [`crate::Category::Codec`] / `parameter_out_of_bound` if
    /// `level` is outside the range the codec accepts.
    pub fn new_wrapping(transport: T, level: i32) -> Result<Self> {
        Ok(Adapter {
            transport,
            core: CompressionCore::new(level)?,
        })
    }

    /// Shared access to the wrapped transport.
    pub fn next_layer(&self) -> &T {
        &self.transport
    }

    /// Exclusive access to the wrapped transport.
    ///
    /// Requires `&mut self`, which the borrow checker can only grant once no
    /// concurrent [`read_some`](Self::read_some)/[`write_some`](Self::write_some)
    /// call — both of which only need `&self` — is outstanding.
    pub fn next_layer_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// A non-destructive read of the four byte counters.
    pub fn statistics(&self) -> StatisticsSnapshot {
        self.core.statistics()
    }

    /// Reads and zeroes the four byte counters, returning their values as
    /// they stood immediately before the reset.
    pub fn statistics_and_clear(&self) -> StatisticsSnapshot {
        self.core.statistics_and_clear()
    }

    /// Returns the codec contexts, staging buffers, and statistics to a
    /// state equivalent to a fresh construction at the original level.
    ///
    /// Waits for any in-flight `read_some`/`write_some` to release its gate
    /// before touching shared state, rather than racing it.
    pub async fn reset(&self) {
        self.core.reset().await;
    }

    /// Forwards an encoder-side parameter to the codec.
    pub async fn set_encoder_param(&self, param: EncoderParameter) -> Result<()> {
        self.core.set_encoder_param(param).await
    }

    /// Forwards a decoder-side parameter to the codec.
    pub async fn set_decoder_param(&self, param: DecoderParameter) -> Result<()> {
        self.core.set_decoder_param(param).await
    }
}

impl<T> Adapter<T>
where
    for<'a> &'a T: AsyncRead + AsyncWrite + Unpin,
{
    /// Pulls decompressed plaintext into `bufs`, pulling and decoding
    /// compressed bytes from the transport as needed. At most one call per
    /// adapter is ever mid-flight; concurrent callers queue FIFO behind the
    /// read gate, independently of any concurrent `write_some`.
    ///
    /// Returns `Ok(0)` both for an empty `bufs` (no transport read is
    /// issued) and once the transport reaches EOF with nothing further to
    /// decode.
    pub async fn read_some(&self, bufs: &mut [io::IoSliceMut<'_>]) -> Result<usize> {
        self.core.read_some(&self.transport, bufs).await
    }

    /// Compresses `bufs` and writes the resulting frame bytes to the
    /// transport.
    ///
    /// On success, always reports exactly the sum of `bufs`' lengths — never
    /// a partial count. On error, reports `0` regardless of how many bytes
    /// were already compressed and buffered; partial writes cannot be
    /// mapped across a streaming compressor's boundary, so the adapter
    /// guarantees all-or-nothing from the caller's perspective. A codec
    /// error here leaves codec state for this direction undefined; callers
    /// should [`Adapter::reset`] before trusting the stream further.
    pub async fn write_some(&self, bufs: &[io::IoSlice<'_>]) -> Result<usize> {
        self.core.write_some(&self.transport, bufs).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn construct_default_level_reports_zero_statistics() {
        let (io, _peer) = tokio::io::duplex(64);
        let adapter = Adapter::new_wrapping(io, zstd::DEFAULT_COMPRESSION_LEVEL).unwrap();
        assert_eq!(adapter.statistics(), StatisticsSnapshot::default());
    }

    #[tokio::test]
    async fn invalid_level_fails_synchronously() {
        let (io, _peer) = tokio::io::duplex(64);
        let err = Adapter::new_wrapping(io, i32::MAX).unwrap_err();
        assert_eq!(err.category(), crate::error::Category::Codec);
    }

    #[tokio::test]
    async fn next_layer_mut_requires_no_outstanding_operation() {
        let (io, _peer) = tokio::io::duplex(64);
        let mut adapter = Adapter::new_wrapping(io, 3).unwrap();
        // Compiles only because no read_some/write_some borrow of `adapter`
        // is alive at this point.
        let _ = adapter.next_layer_mut();
    }
}

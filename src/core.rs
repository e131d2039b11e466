//! The compression core: codec contexts, per-direction gates, staging
//! buffers, and statistics — the single source of truth for codec state,
//! shared by every `read_some`/`write_some` call on an [`crate::Adapter`].
//!
//! Each direction is a `tokio::sync::Mutex` that *owns* the state it
//! serializes (`Mutex<ReadState>`, `Mutex<WriteState>`) rather than a bare
//! lock guarding data held elsewhere: holding the guard for the duration of
//! an operation is what makes "only touched under the gate" (the upstream
//! invariants I1–I3) a property the borrow checker enforces rather than one
//! that has to be remembered at every call site. Dropping the guard — on
//! any return, including an early `?` — releases the gate, which is how I5
//! ("release the gate before surfacing an error") falls out for free instead
//! of needing an explicit release at each error site.

use std::io;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use zstd::zstd_safe::zstd_sys::ZSTD_EndDirective;
use zstd::zstd_safe::{CCtx, DCtx, InBuffer, OutBuffer};

use crate::codec;
use crate::error::{from_zstd_code, Result};
use crate::params::{DecoderParameter, EncoderParameter};
use crate::stats::{Statistics, StatisticsSnapshot};

/// Per-read reservation cap into `input_buf`, taken verbatim from the
/// upstream adapter's `read_data_from_next_layer` literal. Unrelated to the
/// zstd-recommended I/O sizes used for `output_buf` chunk sizing below.
const READ_CHUNK_CAP: usize = 65_535;

pub(crate) struct ReadState {
    decoder_ctx: DCtx<'static>,
    input_buf: BytesMut,
}

pub(crate) struct WriteState {
    encoder_ctx: CCtx<'static>,
    output_buf: BytesMut,
}

pub(crate) struct CompressionCore {
    configured_level: i32,
    read: Mutex<ReadState>,
    write: Mutex<WriteState>,
    stats: Statistics,
}

impl CompressionCore {
    pub(crate) fn new(level: i32) -> Result<Self> {
        let encoder_ctx = codec::new_encoder_ctx(level)?;
        let decoder_ctx = codec::new_decoder_ctx();
        Ok(CompressionCore {
            configured_level: level,
            read: Mutex::new(ReadState {
                decoder_ctx,
                input_buf: BytesMut::new(),
            }),
            write: Mutex::new(WriteState {
                encoder_ctx,
                output_buf: BytesMut::new(),
            }),
            stats: Statistics::default(),
        })
    }

    pub(crate) fn statistics(&self) -> StatisticsSnapshot {
        self.stats.snapshot()
    }

    pub(crate) fn statistics_and_clear(&self) -> StatisticsSnapshot {
        self.stats.reset()
    }

    /// Drives one read end-to-end: acquire `read_gate`, pull compressed
    /// bytes from `transport` and decode them into `bufs` until something is
    /// produced or the transport reaches EOF, release.
    ///
    /// An empty `bufs` short-circuits before the gate is even acquired — the
    /// upstream state machine permits this ("implementations MAY
    /// short-circuit"); no transport read is issued.
    pub(crate) async fn read_some<T>(&self, transport: &T, bufs: &mut [io::IoSliceMut<'_>]) -> Result<usize>
    where
        for<'a> &'a T: AsyncRead + Unpin,
    {
        if bufs.iter().all(|b| b.is_empty()) {
            return Ok(0);
        }

        let mut guard = self.read.lock().await;
        loop {
            let produced = decode_pump(&mut guard, bufs)?;
            if produced > 0 {
                self.stats.add_rx_total(produced as u64);
                return Ok(produced);
            }
            let n = read_into_input_buf(&mut guard, transport).await?;
            if n > 0 {
                self.stats.add_rx_compressed(n as u64);
            } else {
                return Ok(0);
            }
        }
    }

    /// Drives one write end-to-end: acquire `write_gate`, encode `bufs` into
    /// `output_buf`, flush until the encoder reports nothing buffered,
    /// transmit the whole of `output_buf` to `transport`, release.
    ///
    /// Unlike reads, an empty `bufs` does NOT short-circuit: the flush step
    /// runs regardless, since a zero-length write is a legitimate way to
    /// force the encoder to emit any buffered frame bytes without supplying
    /// more plaintext (see the boundary behavior in the crate's test suite).
    pub(crate) async fn write_some<T>(&self, transport: &T, bufs: &[io::IoSlice<'_>]) -> Result<usize>
    where
        for<'a> &'a T: AsyncWrite + Unpin,
    {
        let mut guard = self.write.lock().await;
        let input_length = encode_pump(&mut guard, bufs)?;
        let sent = write_all_from_output_buf(&mut guard, transport).await?;
        self.stats.add_tx_total(input_length as u64);
        self.stats.add_tx_compressed(sent as u64);
        guard.output_buf.clear();
        Ok(input_length)
    }

    /// Returns both codec contexts, staging buffers, and statistics to a
    /// state equivalent to a fresh construction at `configured_level`.
    ///
    /// Acquires both gates (read, then write — a fixed order, chosen so no
    /// future code path that needs both can deadlock against this one)
    /// before touching anything. This resolves the upstream "undefined if
    /// any op is in flight" clause into "blocks until in-flight operations
    /// release their gates" rather than racing them.
    pub(crate) async fn reset(&self) {
        debug!("resetting compression core");
        let mut read = self.read.lock().await;
        let mut write = self.write.lock().await;

        write
            .encoder_ctx
            .reset(zstd::zstd_safe::ResetDirective::SessionAndParameters);
        read.decoder_ctx
            .reset(zstd::zstd_safe::ResetDirective::SessionAndParameters);
        if let Err(code) = write
            .encoder_ctx
            .set_parameter(zstd::zstd_safe::CParameter::CompressionLevel(self.configured_level))
        {
            warn!(error = %from_zstd_code(code), "failed to reapply compression level on reset");
        }
        read.input_buf.clear();
        write.output_buf.clear();
        self.stats.reset();
    }

    pub(crate) async fn set_encoder_param(&self, param: EncoderParameter) -> Result<()> {
        let mut guard = self.write.lock().await;
        param.apply(&mut guard.encoder_ctx)
    }

    pub(crate) async fn set_decoder_param(&self, param: DecoderParameter) -> Result<()> {
        let mut guard = self.read.lock().await;
        param.apply(&mut guard.decoder_ctx)
    }
}

/// Reserves up to [`READ_CHUNK_CAP`] bytes in `state.input_buf` and issues a
/// single `read_some`-style transport read into that region.
async fn read_into_input_buf<T>(state: &mut ReadState, transport: &T) -> Result<usize>
where
    for<'a> &'a T: AsyncRead + Unpin,
{
    state.input_buf.reserve(READ_CHUNK_CAP);
    let mut reader = transport;
    let n = reader.read_buf(&mut state.input_buf).await?;
    Ok(n)
}

/// Walks the caller's output regions in order, repeatedly feeding the
/// decoder from the head of `state.input_buf` (an empty input is still a
/// legitimate call — it can flush buffered plaintext) until a region is
/// full, input is exhausted with nothing produced (hungry), or the codec
/// errors.
///
/// Returns the total bytes written across all regions this call. A nonzero
/// return is "produced output, hand it to the caller"; a zero return with no
/// error is "hungry, go read more from the transport" — both outcomes the
/// upstream state machine's `decode_data` state distinguishes explicitly,
/// collapsed here into one return value the caller's loop switches on.
fn decode_pump(state: &mut ReadState, bufs: &mut [io::IoSliceMut<'_>]) -> Result<usize> {
    let mut total_produced = 0usize;
    for region in bufs.iter_mut() {
        let region: &mut [u8] = region;
        let mut pos = 0usize;
        while pos < region.len() {
            let in_slice: &[u8] = &state.input_buf[..];
            let mut in_buffer = InBuffer::around(in_slice);
            let mut out_buffer = OutBuffer::around(&mut region[pos..]);

            let result = state.decoder_ctx.decompress_stream(&mut out_buffer, &mut in_buffer);
            let consumed = in_buffer.pos();
            let produced_this_call = out_buffer.pos();
            state.input_buf.advance(consumed);

            if let Err(code) = result {
                let err = from_zstd_code(code);
                warn!(error = %err, "decode pump: codec error, direction left in an undefined state");
                return Err(err);
            }

            pos += produced_this_call;
            total_produced += produced_this_call;

            if produced_this_call == 0 && consumed == 0 {
                // Hungry: the decoder drained input_buf to empty without
                // producing anything. Stop entirely rather than moving on
                // to the next region, which would be just as hungry.
                return Ok(total_produced);
            }
        }
    }
    Ok(total_produced)
}

/// Feeds each input region into the encoder in `Continue` mode, committing
/// every produced chunk into `state.output_buf`, then flushes until the
/// encoder reports nothing buffered — the contract boundary that lets a
/// peer decoder make progress without waiting for more input. Returns the
/// total plaintext byte count consumed.
fn encode_pump(state: &mut WriteState, bufs: &[io::IoSlice<'_>]) -> Result<usize> {
    let chunk_size = codec::recommended_output_chunk();
    let mut input_length = 0usize;

    for region in bufs.iter() {
        let region: &[u8] = region;
        let mut in_buffer = InBuffer::around(region);
        while in_buffer.pos() < region.len() {
            let mut chunk = vec![0u8; chunk_size];
            let mut out_buffer = OutBuffer::around(&mut chunk);
            let result = state
                .encoder_ctx
                .compress_stream2(&mut out_buffer, &mut in_buffer, ZSTD_EndDirective::ZSTD_e_continue);
            let produced = out_buffer.pos();
            // Check the error before committing anything this call produced
            // — the upstream source commits flush output unconditionally on
            // one branch before checking the result; this crate does not.
            if let Err(code) = result {
                let err = from_zstd_code(code);
                warn!(error = %err, "encode pump: codec error, direction left in an undefined state");
                return Err(err);
            }
            if produced > 0 {
                state.output_buf.extend_from_slice(&chunk[..produced]);
            }
        }
        input_length += region.len();
    }

    loop {
        let mut chunk = vec![0u8; chunk_size];
        let mut out_buffer = OutBuffer::around(&mut chunk);
        let mut in_buffer = InBuffer::around(&[][..]);
        let result = state
            .encoder_ctx
            .compress_stream2(&mut out_buffer, &mut in_buffer, ZSTD_EndDirective::ZSTD_e_flush);
        let produced = out_buffer.pos();
        let remaining = match result {
            Err(code) => {
                let err = from_zstd_code(code);
                warn!(error = %err, "encode pump flush: codec error, direction left in an undefined state");
                return Err(err);
            }
            Ok(remaining) => remaining,
        };
        if produced > 0 {
            state.output_buf.extend_from_slice(&chunk[..produced]);
        }
        if remaining == 0 {
            break;
        }
    }

    Ok(input_length)
}

async fn write_all_from_output_buf<T>(state: &mut WriteState, transport: &T) -> Result<usize>
where
    for<'a> &'a T: AsyncWrite + Unpin,
{
    let mut writer = transport;
    writer.write_all(&state.output_buf).await?;
    Ok(state.output_buf.len())
}

#[cfg(test)]
mod tests {
    use tokio::net::{TcpListener, TcpStream};

    use super::*;

    /// A loopback TCP pair, not `tokio::io::duplex` — `CompressionCore`'s
    /// pumps are bounded on `for<'a> &'a T: AsyncRead + AsyncWrite`, the
    /// capability tokio grants `&TcpStream` specifically (DuplexStream does
    /// not implement the traits through a shared reference).
    async fn loopback_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (accepted, connected) = tokio::join!(listener.accept(), TcpStream::connect(addr));
        (accepted.unwrap().0, connected.unwrap())
    }

    #[tokio::test]
    async fn invalid_compression_level_fails_at_construction() {
        let err = CompressionCore::new(i32::MAX).unwrap_err();
        assert_eq!(err.category(), crate::error::Category::Codec);
    }

    #[tokio::test]
    async fn roundtrip_over_loopback_tcp() {
        let (a_sock, b_sock) = loopback_pair().await;
        let a = CompressionCore::new(3).unwrap();
        let b = CompressionCore::new(3).unwrap();

        let plaintext = b"hello, compressed world".to_vec();
        let written = a
            .write_some(&a_sock, &[io::IoSlice::new(&plaintext)])
            .await
            .unwrap();
        assert_eq!(written, plaintext.len());

        let mut out = vec![0u8; plaintext.len()];
        let mut total = 0;
        while total < out.len() {
            let mut bufs = [io::IoSliceMut::new(&mut out[total..])];
            let n = b.read_some(&b_sock, &mut bufs).await.unwrap();
            assert!(n > 0);
            total += n;
        }
        assert_eq!(out, plaintext);
        assert_eq!(a.statistics().tx_bytes_total, plaintext.len() as u64);
        assert_eq!(b.statistics().rx_bytes_total, plaintext.len() as u64);
    }

    #[tokio::test]
    async fn empty_read_buffer_does_not_touch_the_transport() {
        let (a_sock, _b_sock) = loopback_pair().await;
        let a = CompressionCore::new(3).unwrap();
        let mut bufs: [io::IoSliceMut<'_>; 0] = [];
        let n = tokio::time::timeout(std::time::Duration::from_millis(200), a.read_some(&a_sock, &mut bufs))
            .await
            .expect("empty read must not block on the transport")
            .unwrap();
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn empty_write_buffer_succeeds_and_reports_zero() {
        let (a_sock, _b_sock) = loopback_pair().await;
        let a = CompressionCore::new(3).unwrap();
        let n = a.write_some(&a_sock, &[]).await.unwrap();
        assert_eq!(n, 0);
        assert_eq!(a.statistics().tx_bytes_total, 0);
    }

    #[tokio::test]
    async fn reset_clears_staging_buffers_and_statistics() {
        let (a_sock, b_sock) = loopback_pair().await;
        let a = CompressionCore::new(3).unwrap();
        let b = CompressionCore::new(3).unwrap();

        let plaintext = b"state before reset".to_vec();
        a.write_some(&a_sock, &[io::IoSlice::new(&plaintext)]).await.unwrap();
        let mut out = vec![0u8; plaintext.len()];
        let mut total = 0;
        while total < out.len() {
            let mut bufs = [io::IoSliceMut::new(&mut out[total..])];
            total += b.read_some(&b_sock, &mut bufs).await.unwrap();
        }

        a.reset().await;
        b.reset().await;
        assert_eq!(a.statistics(), StatisticsSnapshot::default());
        assert_eq!(b.statistics(), StatisticsSnapshot::default());
    }
}

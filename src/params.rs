//! Typed subsets of zstd's encoder/decoder parameter space exposed through
//! [`crate::Adapter::set_encoder_param`]/[`crate::Adapter::set_decoder_param`].
//!
//! The upstream adapter takes an open `(name: i32, value: i32)` pair and
//! forwards it to the codec unchecked. Idiomatic Rust prefers a typed
//! alternative when the valid set is small and known, so this crate closes
//! over the handful of parameters this adapter actually needs — the same
//! spirit as `zstd::zstd_safe` itself exposing `CParameter`/`DParameter` as
//! enums rather than raw ints. Values within a variant that the codec still
//! rejects (e.g. an out-of-range compression level) surface as
//! [`crate::Error`] with [`crate::Category::Codec`].

use zstd::zstd_safe::{CCtx, CParameter, DCtx, DParameter};

use crate::codec::strategy_from_i32;
use crate::error::{from_zstd_code, Result};

/// Compression-side parameters this crate exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderParameter {
    /// Overrides the level set at construction for the remainder of the
    /// current session.
    CompressionLevel(i32),
    /// Log2 of the maximum back-reference distance the encoder may use.
    WindowLog(i32),
    /// Whether to append a content checksum to each frame.
    ChecksumFlag(bool),
    /// Number of worker threads (requires the codec's multithreading
    /// support; `0` keeps encoding single-threaded).
    NbWorkers(i32),
    /// Selects the compression strategy, as zstd's `ZSTD_strategy` enum.
    Strategy(i32),
}

impl EncoderParameter {
    pub(crate) fn apply(self, ctx: &mut CCtx<'static>) -> Result<()> {
        match self {
            EncoderParameter::CompressionLevel(v) => ctx
                .set_parameter(CParameter::CompressionLevel(v))
                .map(|_| ())
                .map_err(from_zstd_code),
            EncoderParameter::WindowLog(v) => ctx
                .set_parameter(CParameter::WindowLog(v as u32))
                .map(|_| ())
                .map_err(from_zstd_code),
            EncoderParameter::ChecksumFlag(v) => ctx
                .set_parameter(CParameter::ChecksumFlag(v))
                .map(|_| ())
                .map_err(from_zstd_code),
            EncoderParameter::NbWorkers(v) => ctx
                .set_parameter(CParameter::NbWorkers(v as u32))
                .map(|_| ())
                .map_err(from_zstd_code),
            EncoderParameter::Strategy(v) => {
                let strategy = strategy_from_i32(v)?;
                ctx.set_parameter(CParameter::Strategy(strategy))
                    .map(|_| ())
                    .map_err(from_zstd_code)
            }
        }
    }
}

/// Decompression-side parameters this crate exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderParameter {
    /// Rejects frames whose window log exceeds this bound, capping the
    /// memory the decoder is willing to commit to a single stream.
    WindowLogMax(i32),
}

impl DecoderParameter {
    pub(crate) fn apply(self, ctx: &mut DCtx<'static>) -> Result<()> {
        match self {
            DecoderParameter::WindowLogMax(v) => ctx
                .set_parameter(DParameter::WindowLogMax(v as u32))
                .map(|_| ())
                .map_err(from_zstd_code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Category;

    #[test]
    fn invalid_strategy_is_rejected_before_reaching_the_codec() {
        let mut ctx = CCtx::create();
        let err = EncoderParameter::Strategy(99).apply(&mut ctx).unwrap_err();
        assert_eq!(err.category(), Category::Codec);
    }

    #[test]
    fn valid_strategy_is_accepted() {
        let mut ctx = CCtx::create();
        EncoderParameter::Strategy(4).apply(&mut ctx).unwrap();
    }

    #[test]
    fn out_of_bound_compression_level_is_a_codec_error() {
        let mut ctx = CCtx::create();
        let err = EncoderParameter::CompressionLevel(i32::MAX)
            .apply(&mut ctx)
            .unwrap_err();
        assert_eq!(err.category(), Category::Codec);
    }
}

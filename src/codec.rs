//! Thin seam between this crate's error taxonomy and `zstd`'s low-level,
//! non-allocating streaming API (`zstd::zstd_safe`).
//!
//! The high-level `zstd::stream::raw` wrappers implement `std::io::Read`/
//! `Write` and collapse the codec's own numeric result codes behind an
//! opaque `io::Error`; this crate needs those raw codes for [`crate::error`],
//! so it talks to `CCtx`/`DCtx` directly instead.

use zstd::zstd_safe::{CCtx, DCtx};

use crate::error::{from_zstd_code, Error, Result};

/// Recommended output chunk size for the encode pump, mirroring
/// `ZSTD_CStreamOutSize()` — sized so a single `compress_stream2` call can
/// usually drain everything the encoder is willing to produce at once.
pub(crate) fn recommended_output_chunk() -> usize {
    zstd::zstd_safe::cstream_out_size()
}

pub(crate) fn new_encoder_ctx(level: i32) -> Result<CCtx<'static>> {
    let mut ctx = CCtx::create();
    ctx.set_parameter(zstd::zstd_safe::CParameter::CompressionLevel(level))
        .map_err(from_zstd_code)?;
    Ok(ctx)
}

pub(crate) fn new_decoder_ctx() -> DCtx<'static> {
    DCtx::create()
}

/// Converts the typed `Strategy(i32)` parameter into zstd's own enum,
/// rejecting values outside its known range the way the C API's
/// `ZSTD_c_strategy` bounds check would.
pub(crate) fn strategy_from_i32(v: i32) -> std::result::Result<zstd::zstd_safe::Strategy, Error> {
    use zstd::zstd_safe::Strategy::*;
    Ok(match v {
        1 => Fast,
        2 => Dfast,
        3 => Greedy,
        4 => Lazy,
        5 => Lazy2,
        6 => BtLazy2,
        7 => BtOpt,
        8 => BtUltra,
        9 => BtUltra2,
        _ => return Err(Error::parameter_out_of_bound()),
    })
}

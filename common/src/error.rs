//! Structured error type for the effect engine.
//!
//! Fatal construction-time failures ([`RenderError::BackendUnavailable`],
//! [`RenderError::ProgramCompile`]) are not retryable: a caller that hits
//! one must not use the renderer. Per-call failures leave the pool intact
//! but the library never retries internally; recovery policy (reconstruct
//! or abort) belongs to the caller.

use thiserror::Error;

use crate::EffectKind;

#[derive(Error, Debug)]
pub enum RenderError {
    /// No compute backend: no suitable adapter, or device creation failed.
    #[error("compute backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A compute program failed to compile or link. Fatal for the pool.
    #[error("failed to compile {effect} program: {reason}")]
    ProgramCompile { effect: EffectKind, reason: String },

    /// The device context was lost; the pool must be torn down and rebuilt.
    #[error("GPU device lost; dispose the renderer and reconstruct")]
    DeviceLost,

    /// No compiled program variant exists for the requested xBRZ scale.
    #[error("no compiled xBRZ program variant for scale {0}")]
    UnsupportedScale(u32),

    /// Input bytes do not match the declared dimensions.
    #[error(
        "pixel buffer size mismatch for {width}x{height}: expected {expected} bytes, got {actual}"
    )]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    /// GPU-to-CPU readback failed (buffer mapping error).
    #[error("readback failed: {0}")]
    Readback(String),
}

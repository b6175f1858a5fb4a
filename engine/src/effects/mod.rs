//! CPU reference implementations of the pixel-art effects.
//!
//! Each submodule exposes `output_dimensions` and `render`; the GPU
//! kernels under [`crate::gpu`] implement the same per-pixel procedures.

pub mod crt;
pub mod hex;
pub mod xbrz;

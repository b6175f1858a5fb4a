//! CPU rendering backend.
//!
//! Mirrors the call contract of the GPU renderers so callers can switch
//! backends without touching their render loop. The CPU path needs no
//! device and cannot lose one, but it reports errors through the same
//! type.

use common::{CrtOptions, HexOptions, PixelBuffer, RenderError, XbrzOptions};

use crate::effects::{crt, hex, xbrz};

/// Stateless software renderer for all three effects.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuRenderer;

impl CpuRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn crt_output_dimensions(&self, src_w: u32, src_h: u32, scale: u32) -> (u32, u32) {
        crt::output_dimensions(src_w, src_h, scale)
    }

    pub fn hex_output_dimensions(&self, src_w: u32, src_h: u32, opts: &HexOptions) -> (u32, u32) {
        let opts = opts.clamped();
        hex::output_dimensions(src_w, src_h, opts.scale, opts.orientation)
    }

    pub fn xbrz_output_dimensions(&self, src_w: u32, src_h: u32, scale: u32) -> (u32, u32) {
        xbrz::output_dimensions(src_w, src_h, scale)
    }

    pub fn render_crt(
        &self,
        input: &PixelBuffer,
        opts: &CrtOptions,
    ) -> Result<PixelBuffer, RenderError> {
        Ok(crt::render(input, opts))
    }

    pub fn render_hex(
        &self,
        input: &PixelBuffer,
        opts: &HexOptions,
    ) -> Result<PixelBuffer, RenderError> {
        Ok(hex::render(input, opts))
    }

    pub fn render_xbrz(
        &self,
        input: &PixelBuffer,
        opts: &XbrzOptions,
    ) -> Result<PixelBuffer, RenderError> {
        Ok(xbrz::render(input, opts))
    }

    // Default-option conveniences.

    pub fn render_crt_default(&self, input: &PixelBuffer) -> Result<PixelBuffer, RenderError> {
        self.render_crt(input, &CrtOptions::default())
    }

    pub fn render_hex_default(&self, input: &PixelBuffer) -> Result<PixelBuffer, RenderError> {
        self.render_hex(input, &HexOptions::default())
    }

    pub fn render_xbrz_default(&self, input: &PixelBuffer) -> Result<PixelBuffer, RenderError> {
        self.render_xbrz(input, &XbrzOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_contract_matches_dimension_queries() {
        let renderer = CpuRenderer::new();
        let input = PixelBuffer::filled(5, 3, [120, 60, 30, 255]);

        let out = renderer.render_crt(&input, &CrtOptions::default()).unwrap();
        assert_eq!(
            (out.width, out.height),
            renderer.crt_output_dimensions(5, 3, CrtOptions::default().scale)
        );

        let out = renderer.render_hex(&input, &HexOptions::default()).unwrap();
        assert_eq!(
            (out.width, out.height),
            renderer.hex_output_dimensions(5, 3, &HexOptions::default())
        );

        let out = renderer
            .render_xbrz(&input, &XbrzOptions::default())
            .unwrap();
        assert_eq!(
            (out.width, out.height),
            renderer.xbrz_output_dimensions(5, 3, XbrzOptions::default().scale)
        );
    }
}

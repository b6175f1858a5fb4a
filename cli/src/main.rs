use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use common::{CrtOptions, HexOptions, HexOrientation, PixelBuffer, Rgba, XbrzOptions};
use engine::gpu;
use engine::{CpuRenderer, CrtRenderer, DeviceResourcePool, GpuContext, HexRenderer, XbrzRenderer};

#[derive(Parser)]
#[command(name = "retrofx")]
#[command(about = "Pixel-art effect renderer (CRT, hexagon, xBRZ)", long_about = None)]
#[command(version)]
struct Cli {
    /// Force the software backend even when a GPU is available
    #[arg(long, global = true)]
    cpu: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply the CRT emulation effect
    Crt {
        /// Input image path
        input: PathBuf,

        /// Output image path
        output: PathBuf,

        /// Options as a JSON record; missing fields use defaults
        #[arg(long)]
        params: Option<String>,

        /// Integer upscale factor (2-32)
        #[arg(short, long)]
        scale: Option<u32>,

        /// Horizontal barrel distortion strength
        #[arg(long)]
        warp_x: Option<f32>,

        /// Vertical barrel distortion strength
        #[arg(long)]
        warp_y: Option<f32>,

        /// Scanline falloff exponent coefficient (negative)
        #[arg(long)]
        scan_hardness: Option<f32>,

        /// Scanline darkening opacity (0-1)
        #[arg(long)]
        scan_opacity: Option<f32>,

        /// Shadow mask opacity (0-1)
        #[arg(long)]
        mask_opacity: Option<f32>,

        /// Disable the barrel distortion stage
        #[arg(long)]
        no_warp: bool,

        /// Disable the scanline stage
        #[arg(long)]
        no_scanlines: bool,

        /// Disable the shadow mask stage
        #[arg(long)]
        no_mask: bool,
    },

    /// Remap onto a hexagonal cell grid
    Hex {
        /// Input image path
        input: PathBuf,

        /// Output image path
        output: PathBuf,

        /// Options as a JSON record; missing fields use defaults
        #[arg(long)]
        params: Option<String>,

        /// Hexagon radius in output pixels (2-32)
        #[arg(short, long)]
        scale: Option<u32>,

        /// Cell orientation (flat-top or pointy-top)
        #[arg(short, long)]
        orientation: Option<HexOrientation>,

        /// Draw borders between cells
        #[arg(short, long)]
        borders: bool,

        /// Border color (#RRGGBB, #RRGGBBAA or 'transparent')
        #[arg(long)]
        border_color: Option<String>,

        /// Canvas color outside the source grid
        #[arg(long)]
        background_color: Option<String>,

        /// Border probe radius in output pixels
        #[arg(long)]
        border_thickness: Option<u32>,
    },

    /// Upscale with the edge-directed xBRZ filter
    Xbrz {
        /// Input image path
        input: PathBuf,

        /// Output image path
        output: PathBuf,

        /// Options as a JSON record; missing fields use defaults
        #[arg(long)]
        params: Option<String>,

        /// Integer upscale factor (2-6)
        #[arg(short, long)]
        scale: Option<u32>,

        /// Color distance below which pixels count as equal (0-255)
        #[arg(long)]
        tolerance: Option<f64>,

        /// Steep direction threshold
        #[arg(long)]
        steep: Option<f64>,

        /// Dominant direction threshold
        #[arg(long)]
        dominant: Option<f64>,

        /// Center direction bias
        #[arg(long)]
        bias: Option<f64>,
    },

    /// Print the hex output canvas size without rendering
    HexDims {
        /// Source width in pixels
        width: u32,

        /// Source height in pixels
        height: u32,

        /// Hexagon radius in output pixels (2-32)
        #[arg(short, long, default_value = "16")]
        scale: u32,

        /// Cell orientation (flat-top or pointy-top)
        #[arg(short, long, default_value = "flat-top")]
        orientation: HexOrientation,
    },
}

/// Rendering backend chosen at startup.
enum Backend {
    Cpu(CpuRenderer),
    Gpu(Arc<DeviceResourcePool>),
}

impl Backend {
    fn select(force_cpu: bool) -> Self {
        if force_cpu {
            log::info!("using software backend (--cpu)");
            return Backend::Cpu(CpuRenderer::new());
        }
        if !gpu::is_available() {
            log::warn!("no GPU adapter found, falling back to software backend");
            return Backend::Cpu(CpuRenderer::new());
        }
        match GpuContext::new_blocking() {
            Ok(context) => Backend::Gpu(Arc::new(DeviceResourcePool::new(Arc::new(context)))),
            Err(e) => {
                log::warn!("GPU initialization failed ({e}), falling back to software backend");
                Backend::Cpu(CpuRenderer::new())
            }
        }
    }

    fn render_crt(&self, input: &PixelBuffer, opts: &CrtOptions) -> Result<PixelBuffer> {
        match self {
            Backend::Cpu(r) => Ok(r.render_crt(input, opts)?),
            Backend::Gpu(pool) => {
                let renderer = CrtRenderer::new(pool.clone())?;
                Ok(renderer.render(input, opts)?)
            }
        }
    }

    fn render_hex(&self, input: &PixelBuffer, opts: &HexOptions) -> Result<PixelBuffer> {
        match self {
            Backend::Cpu(r) => Ok(r.render_hex(input, opts)?),
            Backend::Gpu(pool) => {
                let renderer = HexRenderer::new(pool.clone())?;
                Ok(renderer.render(input, opts)?)
            }
        }
    }

    fn render_xbrz(&self, input: &PixelBuffer, opts: &XbrzOptions) -> Result<PixelBuffer> {
        match self {
            Backend::Cpu(r) => Ok(r.render_xbrz(input, opts)?),
            Backend::Gpu(pool) => {
                let renderer = XbrzRenderer::new(pool.clone())?;
                Ok(renderer.render(input, opts)?)
            }
        }
    }
}

fn load_image(path: &Path) -> Result<PixelBuffer> {
    let image = image::open(path)
        .with_context(|| format!("failed to open image {}", path.display()))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    Ok(PixelBuffer::new(image.into_raw(), width, height)?)
}

fn save_image(path: &Path, buffer: PixelBuffer) -> Result<()> {
    let image = image::RgbaImage::from_raw(buffer.width, buffer.height, buffer.data)
        .context("render produced a malformed buffer")?;
    image
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    log::info!(
        "wrote {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(())
}

/// Parse a JSON option record, or start from defaults when absent.
fn parse_params<T: serde::de::DeserializeOwned + Default>(params: Option<&str>) -> Result<T> {
    match params {
        Some(json) => serde_json::from_str(json).context("invalid --params JSON"),
        None => Ok(T::default()),
    }
}

fn run(cli: Cli) -> Result<()> {
    let backend = Backend::select(cli.cpu);

    match cli.command {
        Commands::Crt {
            input,
            output,
            params,
            scale,
            warp_x,
            warp_y,
            scan_hardness,
            scan_opacity,
            mask_opacity,
            no_warp,
            no_scanlines,
            no_mask,
        } => {
            let mut opts: CrtOptions = parse_params(params.as_deref())?;
            if let Some(v) = scale {
                opts.scale = v;
            }
            if let Some(v) = warp_x {
                opts.warp_x = v;
            }
            if let Some(v) = warp_y {
                opts.warp_y = v;
            }
            if let Some(v) = scan_hardness {
                opts.scan_hardness = v;
            }
            if let Some(v) = scan_opacity {
                opts.scan_opacity = v;
            }
            if let Some(v) = mask_opacity {
                opts.mask_opacity = v;
            }
            opts.enable_warp &= !no_warp;
            opts.enable_scanlines &= !no_scanlines;
            opts.enable_mask &= !no_mask;

            let image = load_image(&input)?;
            save_image(&output, backend.render_crt(&image, &opts)?)
        }

        Commands::Hex {
            input,
            output,
            params,
            scale,
            orientation,
            borders,
            border_color,
            background_color,
            border_thickness,
        } => {
            let mut opts: HexOptions = parse_params(params.as_deref())?;
            if let Some(v) = scale {
                opts.scale = v;
            }
            if let Some(v) = orientation {
                opts.orientation = v;
            }
            opts.draw_borders |= borders;
            if let Some(s) = border_color {
                opts.border_color = Rgba::parse_or(&s, opts.border_color);
            }
            if let Some(s) = background_color {
                opts.background_color = Rgba::parse_or(&s, opts.background_color);
            }
            if let Some(v) = border_thickness {
                opts.border_thickness = v;
            }

            let image = load_image(&input)?;
            save_image(&output, backend.render_hex(&image, &opts)?)
        }

        Commands::Xbrz {
            input,
            output,
            params,
            scale,
            tolerance,
            steep,
            dominant,
            bias,
        } => {
            let mut opts: XbrzOptions = parse_params(params.as_deref())?;
            if let Some(v) = scale {
                opts.scale = v;
            }
            if let Some(v) = tolerance {
                opts.equal_color_tolerance = v;
            }
            if let Some(v) = steep {
                opts.steep_direction_threshold = v;
            }
            if let Some(v) = dominant {
                opts.dominant_direction_threshold = v;
            }
            if let Some(v) = bias {
                opts.center_direction_bias = v;
            }

            let image = load_image(&input)?;
            save_image(&output, backend.render_xbrz(&image, &opts)?)
        }

        Commands::HexDims {
            width,
            height,
            scale,
            orientation,
        } => {
            let opts = HexOptions {
                scale,
                orientation,
                ..Default::default()
            }
            .clamped();
            let (w, h) =
                engine::effects::hex::output_dimensions(width, height, opts.scale, opts.orientation);
            println!("{w}x{h}");
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    run(Cli::parse())
}

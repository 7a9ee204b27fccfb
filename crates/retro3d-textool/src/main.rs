use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use clap::{Parser, ValueEnum};
use image::imageops::FilterType;
use image::DynamicImage;
use retro3d_engine::driver::PixelFormat;
use retro3d_engine::logging::{init_logging, LoggingConfig};
use retro3d_tex::{mip_sizes, MipRecord, TexFile, TexHeader};

/// Converts an image into a `.tex` RGB565 mip chain.
#[derive(Debug, Parser)]
#[command(name = "retro3d-textool", version)]
struct Args {
    /// Source image (PNG, BMP, JPEG).
    input: PathBuf,

    /// Output file. Defaults to the input path with a `.tex` extension.
    output: Option<PathBuf>,

    /// Resampling filter used for the smaller levels.
    #[arg(long, value_enum, default_value_t = Filter::Triangle)]
    filter: Filter,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum Filter {
    Nearest,
    Triangle,
    Lanczos3,
}

impl From<Filter> for FilterType {
    fn from(f: Filter) -> Self {
        match f {
            Filter::Nearest => FilterType::Nearest,
            Filter::Triangle => FilterType::Triangle,
            Filter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());
    let args = Args::parse();

    let image = image::open(&args.input)
        .with_context(|| format!("failed to decode {}", args.input.display()))?;
    log::info!(
        "input texture: {}x{}, {:?}",
        image.width(),
        image.height(),
        image.color()
    );

    let tex = convert(&image, args.filter.into())?;

    let output = args.output.unwrap_or_else(|| args.input.with_extension("tex"));
    write(&tex, &output)?;
    log::info!("wrote {} ({} mips)", output.display(), tex.mips.len());
    Ok(())
}

/// Builds the full chain down to 1×1. Only square, even-sized images are accepted.
fn convert(image: &DynamicImage, filter: FilterType) -> Result<TexFile> {
    let (width, height) = (image.width(), image.height());
    ensure!(width > 0 && height > 0, "image has no pixels");
    ensure!(
        width % 2 == 0 && height % 2 == 0,
        "odd-sized textures are not supported ({width}x{height})"
    );
    ensure!(
        width == height,
        "non-square textures are not supported ({width}x{height})"
    );
    ensure!(width <= u16::MAX as u32, "texture too large ({width}x{height})");

    let mips: Vec<MipRecord> = mip_sizes(width)
        .enumerate()
        .map(|(level, size)| {
            log::info!("writing mip {level} ({size}x{size})");
            let scaled = if size == width {
                image.clone()
            } else {
                image.resize_exact(size, size, filter)
            };
            MipRecord {
                width: size as u16,
                height: size as u16,
                pixels: encode_rgb565(&scaled),
            }
        })
        .collect();

    Ok(TexFile {
        header: TexHeader::rgb565(width, height, mips.len() as u32),
        mips,
    })
}

/// Tightly packed little-endian RGB565 pixels.
fn encode_rgb565(image: &DynamicImage) -> Vec<u8> {
    let format = PixelFormat::RGB565;
    let rgba = image.to_rgba8();
    let mut out = vec![0u8; rgba.width() as usize * rgba.height() as usize * 2];
    for (px, dst) in rgba.pixels().zip(out.chunks_exact_mut(2)) {
        let [r, g, b, _] = px.0;
        format.write_pixel(dst, format.pack_rgba(r, g, b, 0));
    }
    out
}

fn write(tex: &TexFile, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    tex.write(&mut out)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn solid(width: u32, height: u32, px: [u8; 4]) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(px)))
    }

    #[test]
    fn chain_goes_down_to_one() {
        let tex = convert(&solid(16, 16, [255, 0, 0, 255]), FilterType::Nearest).unwrap();
        let sizes: Vec<u16> = tex.mips.iter().map(|m| m.width).collect();
        assert_eq!(sizes, [16, 8, 4, 2, 1]);
        assert_eq!(tex.header.mip_count, 5);
        for mip in &tex.mips {
            assert_eq!(mip.pixels.len(), mip.width as usize * mip.height as usize * 2);
        }
    }

    #[test]
    fn pure_colors_encode_to_rgb565() {
        let red = encode_rgb565(&solid(2, 2, [255, 0, 0, 255]));
        assert_eq!(&red[..2], &0xF800u16.to_le_bytes());
        let green = encode_rgb565(&solid(2, 2, [0, 255, 0, 255]));
        assert_eq!(&green[..2], &0x07E0u16.to_le_bytes());
        let blue = encode_rgb565(&solid(2, 2, [0, 0, 255, 255]));
        assert_eq!(&blue[..2], &0x001Fu16.to_le_bytes());
    }

    #[test]
    fn rejects_non_square() {
        assert!(convert(&solid(16, 8, [0; 4]), FilterType::Nearest).is_err());
    }

    #[test]
    fn rejects_odd_sizes() {
        assert!(convert(&solid(15, 15, [0; 4]), FilterType::Nearest).is_err());
    }
}

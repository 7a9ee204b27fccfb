use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use retro3d_tex::{MipRecord, TexError, TexFormat, TexHeader};

use crate::device::{InputError, Result};
use crate::driver::PixelFormat;
use crate::provider::SurfaceProvider;

use super::Texture;

/// Smallest edge accepted by the loader.
pub const MIN_TEXTURE_SIZE: i32 = 8;
/// Largest edge accepted by the loader.
pub const MAX_TEXTURE_SIZE: i32 = 1024;

impl<'p> Texture<'p> {
    /// Loads a `.tex` container from `reader`.
    ///
    /// The texture gets the header's size and mip count; every record is then
    /// uploaded into the level of matching size. Payloads are copied verbatim,
    /// so the provider's texture format should be RGB565.
    pub fn load_tex(provider: &'p dyn SurfaceProvider, name: &str, reader: &mut impl Read) -> Result<Self> {
        let header = TexHeader::read(reader)?;

        let size_ok = |edge: i32| (MIN_TEXTURE_SIZE..=MAX_TEXTURE_SIZE).contains(&edge);
        if !size_ok(header.width) || !size_ok(header.height) {
            log::warn!("{name}: {}x{} can't be used as a texture", header.width, header.height);
            return Err(InputError::TextureSize {
                width: header.width as u32,
                height: header.height as u32,
            }
            .into());
        }

        if header.format == TexFormat::Rgb565 && provider.formats().texture != PixelFormat::RGB565 {
            log::warn!("{name}: RGB565 payload uploaded into {}", provider.formats().texture);
        }

        let mut texture = Texture::new(
            provider,
            header.width as u32,
            header.height as u32,
            header.mip_count as u32,
        )?;

        for index in 0..header.mip_count as usize {
            let mip = MipRecord::read(reader, header.format, index)?;
            log::debug!("{name}: reading mip {index} ({}x{})", mip.width, mip.height);
            texture.from_pixel_array(&mip.pixels, mip.width as u32, mip.height as u32, index as u32)?;
        }

        Ok(texture)
    }

    /// Opens `path` and loads it with [`load_tex`](Self::load_tex).
    pub fn load_tex_file(provider: &'p dyn SurfaceProvider, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(TexError::from)?;
        let name = path.display().to_string();
        Self::load_tex(provider, &name, &mut BufReader::new(file))
    }
}

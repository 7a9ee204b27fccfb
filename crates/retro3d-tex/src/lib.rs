//! Reader and writer for the `.tex` mip-chain container.
//!
//! This crate is intentionally dependency-free so the offline converter and the
//! engine's texture loader share one definition of the format without pulling
//! in any image or driver code.
//!
//! # Layout
//!
//! All integers are little-endian.
//!
//! | Field | Type |
//! |-------|------|
//! | width, height | `i32` |
//! | format | `u8` (0 = RGB565) |
//! | compressed | `u8` (carried, payloads are raw) |
//! | mip_count | `i32` |
//!
//! followed by `mip_count` records of `width: u16, height: u16,
//! linear_size: u32, pixels[linear_size]`, largest level first.
//!
//! # Quick start
//!
//! ```rust
//! use retro3d_tex::{MipRecord, TexFile, TexHeader};
//!
//! let file = TexFile {
//!     header: TexHeader::rgb565(2, 2, 2),
//!     mips: vec![
//!         MipRecord { width: 2, height: 2, pixels: vec![0; 8] },
//!         MipRecord { width: 1, height: 1, pixels: vec![0; 2] },
//!     ],
//! };
//!
//! let mut bytes = Vec::new();
//! file.write(&mut bytes).unwrap();
//! assert_eq!(TexFile::read(&mut bytes.as_slice()).unwrap(), file);
//! ```

pub mod codec;
pub mod error;
pub mod format;

pub use codec::TexFile;
pub use error::TexError;
pub use format::{mip_level_count, mip_sizes, MipRecord, TexFormat, TexHeader};

#[cfg(test)]
mod codec_tests {
    use super::*;

    fn sample() -> TexFile {
        TexFile {
            header: TexHeader::rgb565(4, 4, 3),
            mips: vec![
                MipRecord { width: 4, height: 4, pixels: (0..32).collect() },
                MipRecord { width: 2, height: 2, pixels: vec![0xAB; 8] },
                MipRecord { width: 1, height: 1, pixels: vec![0x12, 0x34] },
            ],
        }
    }

    fn encode(file: &TexFile) -> Vec<u8> {
        let mut out = Vec::new();
        file.write(&mut out).unwrap();
        out
    }

    #[test]
    fn header_layout_is_little_endian() {
        let bytes = encode(&sample());
        assert_eq!(&bytes[0..4], &4i32.to_le_bytes());
        assert_eq!(&bytes[4..8], &4i32.to_le_bytes());
        assert_eq!(bytes[8], 0);
        assert_eq!(bytes[9], 0);
        assert_eq!(&bytes[10..14], &3i32.to_le_bytes());
        // first record prefix
        assert_eq!(&bytes[14..16], &4u16.to_le_bytes());
        assert_eq!(&bytes[18..22], &32u32.to_le_bytes());
        assert_eq!(bytes.len(), TexHeader::SIZE + 3 * MipRecord::PREFIX_SIZE + 32 + 8 + 2);
    }

    #[test]
    fn decodes_what_it_encodes() {
        let file = sample();
        assert_eq!(TexFile::read(&mut encode(&file).as_slice()).unwrap(), file);
    }

    #[test]
    fn compressed_flag_is_carried() {
        let mut file = sample();
        file.header.compressed = true;
        let back = TexFile::read(&mut encode(&file).as_slice()).unwrap();
        assert!(back.header.compressed);
        assert_eq!(back.mips, file.mips);
    }

    #[test]
    fn truncated_payload() {
        let bytes = encode(&sample());
        let cut = &bytes[..bytes.len() - 1];
        let err = TexFile::read(&mut &cut[..]).unwrap_err();
        assert!(matches!(err, TexError::Truncated { what: "mip pixels" }), "{err}");
    }

    #[test]
    fn truncated_header() {
        let err = TexHeader::read(&mut &[1u8, 0, 0][..]).unwrap_err();
        assert!(matches!(err, TexError::Truncated { what: "header width" }));
    }

    #[test]
    fn unknown_format_code() {
        let mut bytes = encode(&sample());
        bytes[8] = 7;
        let err = TexFile::read(&mut bytes.as_slice()).unwrap_err();
        assert!(matches!(err, TexError::UnsupportedFormat(7)));
    }

    #[test]
    fn oversized_record_rejected() {
        let mut bytes = encode(&sample());
        // first record: 4x4 RGB565 holds at most 32 bytes
        bytes[18..22].copy_from_slice(&33u32.to_le_bytes());
        let err = TexFile::read(&mut bytes.as_slice()).unwrap_err();
        assert!(matches!(err, TexError::InvalidRecord { index: 0, linear_size: 33, .. }));
    }

    #[test]
    fn write_checks_mip_count() {
        let mut file = sample();
        file.mips.pop();
        let err = file.write(&mut Vec::new()).unwrap_err();
        assert!(matches!(err, TexError::MipCountMismatch { declared: 3, actual: 2 }));
    }
}

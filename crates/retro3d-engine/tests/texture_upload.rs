use retro3d_engine::driver::{PixelFormat, SoftDriver, Status};
use retro3d_engine::provider::{OffscreenConfig, OffscreenProvider};
use retro3d_engine::{Error, InputError, Texture};

fn provider() -> OffscreenProvider {
    OffscreenProvider::new(OffscreenConfig { width: 64, height: 64 }).unwrap()
}

fn checksum(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .enumerate()
        .fold(0u64, |acc, (i, b)| acc.wrapping_mul(31).wrapping_add(*b as u64 ^ i as u64))
}

fn level_checksums(p: &OffscreenProvider, tex: &Texture<'_>) -> Vec<u64> {
    tex.levels()
        .unwrap()
        .iter()
        .map(|l| checksum(&p.backend().surface_bytes(l.surface).unwrap()))
        .collect()
}

// ── chain shape ───────────────────────────────────────────────────────────

#[test]
fn chain_has_mip_count_halving_levels() {
    let p = provider();
    for (w, h, mips) in [(64, 64, 7), (32, 8, 6), (16, 16, 3), (5, 3, 3), (1, 1, 1), (8, 2, 2)] {
        let tex = Texture::new(&p, w, h, mips).unwrap();
        let levels = tex.levels().unwrap();
        assert_eq!(levels.len() as u32, mips, "{w}x{h}/{mips}");
        assert_eq!((levels[0].width, levels[0].height), (w, h));
        for pair in levels.windows(2) {
            assert_eq!(pair[1].width, (pair[0].width / 2).max(1));
            assert_eq!(pair[1].height, (pair[0].height / 2).max(1));
        }
        assert_eq!(levels.iter().map(|l| l.index).collect::<Vec<_>>(), (0..mips).collect::<Vec<_>>());
    }
}

// ── upload ────────────────────────────────────────────────────────────────

#[test]
fn upload_touches_only_the_matching_level() {
    let p = provider();
    let mut tex = Texture::new(&p, 16, 16, 5).unwrap();
    let before = level_checksums(&p, &tex);

    let pixels: Vec<u8> = (0..8 * 8 * 2).map(|i| (i * 7 % 251) as u8).collect();
    tex.from_pixel_array(&pixels, 8, 8, 1).unwrap();

    let after = level_checksums(&p, &tex);
    for (i, (b, a)) in before.iter().zip(&after).enumerate() {
        if i == 1 {
            assert_ne!(b, a);
        } else {
            assert_eq!(b, a, "level {i} changed");
        }
    }
    let level1 = tex.levels().unwrap()[1].surface;
    assert_eq!(p.backend().surface_bytes(level1).unwrap(), pixels);
}

#[test]
fn short_buffer_copies_its_length_and_zeroes_the_rest() {
    let p = provider();
    let mut tex = Texture::new(&p, 4, 4, 2).unwrap();
    tex.from_pixel_array(&[0xAA; 10], 4, 4, 0).unwrap();

    let bytes = p.backend().surface_bytes(tex.surface()).unwrap();
    assert_eq!(bytes.len(), 32);
    assert!(bytes[..10].iter().all(|b| *b == 0xAA));
    assert!(bytes[10..].iter().all(|b| *b == 0));
}

#[test]
fn oversized_buffer_is_rejected_without_writing() {
    let p = provider();
    let mut tex = Texture::new(&p, 4, 4, 1).unwrap();
    let live = p.backend().live_objects();
    p.backend().clear_call_log();

    let err = tex.from_pixel_array(&[1; 33], 4, 4, 0).unwrap_err();
    assert!(matches!(
        err,
        Error::Input(InputError::PixelOverflow { len: 33, capacity: 32 })
    ));
    assert!(p.backend().call_log().is_empty(), "{:?}", p.backend().call_log());
    assert!(p.backend().surface_bytes(tex.surface()).unwrap().iter().all(|b| *b == 0));
    assert_eq!(p.backend().live_objects(), live, "staging surface leaked");
}

#[test]
fn level_hint_is_advisory() {
    let p = provider();
    let mut tex = Texture::new(&p, 8, 8, 4).unwrap();
    // Hint says level 0; size says level 2.
    tex.from_pixel_array(&[0x5A; 8], 2, 2, 0).unwrap();
    let level2 = tex.levels().unwrap()[2].surface;
    assert_eq!(p.backend().surface_bytes(level2).unwrap(), vec![0x5A; 8]);
}

#[test]
fn missing_level_fails_without_mutation_or_leak() {
    let p = provider();
    let mut tex = Texture::new(&p, 16, 16, 3).unwrap();
    let before = level_checksums(&p, &tex);
    let live = p.backend().live_objects();

    let err = tex.from_pixel_array(&[0xFF; 8], 2, 2, 4).unwrap_err();
    assert!(matches!(
        err,
        Error::Input(InputError::LevelNotFound { width: 2, height: 2 })
    ));
    assert_eq!(level_checksums(&p, &tex), before);
    assert_eq!(p.backend().live_objects(), live);
}

#[test]
fn empty_pixels_fail_before_any_driver_call() {
    let p = provider();
    let mut tex = Texture::new(&p, 4, 4, 1).unwrap();
    p.backend().clear_call_log();
    let err = tex.from_pixel_array(&[], 4, 4, 0).unwrap_err();
    assert!(matches!(err, Error::Input(InputError::EmptyPixels)));
    assert!(p.backend().call_log().is_empty());
}

#[test]
fn failed_blit_still_releases_staging() {
    let p = provider();
    let mut tex = Texture::new(&p, 4, 4, 1).unwrap();
    let live = p.backend().live_objects();
    p.backend().fail_on("blit", Status::SURFACE_BUSY);

    let err = tex.from_pixel_array(&[1; 32], 4, 4, 0).unwrap_err();
    assert_eq!(err.status(), Some(Status::SURFACE_BUSY));
    assert_eq!(p.backend().live_objects(), live);
}

#[test]
fn staging_matches_the_target_format() {
    let driver = SoftDriver::with_formats(vec![PixelFormat::XRGB1555], vec![PixelFormat::Z16]);
    let p = OffscreenProvider::with_driver(driver, OffscreenConfig::default()).unwrap();
    let mut tex = Texture::new(&p, 4, 4, 1).unwrap();
    assert_eq!(tex.format(), PixelFormat::XRGB1555);
    // Blit requires identical formats; success shows the staging surface used the target's.
    tex.from_pixel_array(&[3; 32], 4, 4, 0).unwrap();
}

// ── lifetime ──────────────────────────────────────────────────────────────

#[test]
fn dropping_a_texture_releases_its_chain() {
    let p = provider();
    let live = p.backend().live_objects();
    let root = {
        let tex = Texture::new(&p, 32, 32, 6).unwrap();
        tex.surface()
    };
    assert!(!p.backend().is_live_surface(root));
    assert_eq!(p.backend().live_objects(), live);
}

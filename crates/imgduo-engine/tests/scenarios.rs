//! End-to-end session scenarios.

use imgduo_core::{ImageBuffer, PixelType};
use imgduo_engine::{
    reconcile, to_displayable, EngineError, Missing, Operator, Session, Slot,
};
use imgduo_io::write;
use imgduo_ops::StitchStatus;
use tempfile::TempDir;

fn solid(width: u32, height: u32, bgr: [u8; 3]) -> ImageBuffer {
    ImageBuffer::filled(width, height, PixelType::Bgr8, &bgr).unwrap()
}

/// Corner-rich scene: 8x8 blocks with hashed colors.
fn scene(width: u32, height: u32) -> ImageBuffer {
    let mut img = ImageBuffer::new(width, height, PixelType::Bgr8).unwrap();
    for y in 0..height {
        for x in 0..width {
            let cell = (y / 8) * 1000 + x / 8;
            let h = cell.wrapping_mul(2_654_435_761).rotate_left(13) ^ 0x5bd1_e995;
            img.set_pixel(x, y, &[h as u8, (h >> 8) as u8, (h >> 16) as u8]);
        }
    }
    img
}

fn crop(src: &ImageBuffer, x0: u32, width: u32) -> ImageBuffer {
    let mut out = ImageBuffer::new(width, src.height(), src.pixel_type()).unwrap();
    for y in 0..src.height() {
        for x in 0..width {
            out.set_pixel(x, y, src.pixel(x0 + x, y));
        }
    }
    out
}

fn session_with(primary: &ImageBuffer, secondary: Option<&ImageBuffer>) -> Session {
    let mut session = Session::new();
    session.load_decoded(Slot::Primary, Ok(primary.clone())).unwrap();
    if let Some(s) = secondary {
        session.load_decoded(Slot::Secondary, Ok(s.clone())).unwrap();
    }
    session
}

#[test]
fn blend_with_mismatched_secondary() {
    let mut session = session_with(&solid(300, 200, [10, 20, 30]), Some(&solid(150, 100, [30, 40, 50])));
    session.apply(Operator::Blend).unwrap();

    assert_eq!(session.image(Slot::Primary).dimensions(), (300, 200));
    assert_eq!(session.image(Slot::Primary).pixel(150, 100), &[20, 30, 40]);
    assert!(session.image(Slot::Secondary).is_empty());
    let enabled = session.enablement();
    assert!(Operator::ALL.iter().filter(|op| op.is_dual()).all(|&op| !enabled.is_enabled(op)));
    assert_eq!(enabled.len(), 5);
}

#[test]
fn stitch_without_secondary_is_rejected() {
    let primary = solid(40, 30, [1, 2, 3]);
    let mut session = session_with(&primary, None);
    let before = session.enablement();

    let err = session.apply(Operator::Stitch).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Rejected {
            operator: Operator::Stitch,
            missing: Missing::Secondary
        }
    ));
    assert_eq!(session.image(Slot::Primary), &primary);
    assert_eq!(session.enablement(), before);
}

#[test]
fn sharpen_flat_gray_keeps_interior() {
    let mut session = session_with(&ImageBuffer::filled(10, 10, PixelType::Gray8, &[100]).unwrap(), None);
    session.apply(Operator::Sharpen).unwrap();
    let out = session.image(Slot::Primary);
    for y in 1..9 {
        assert!(out.row(y)[1..9].iter().all(|&v| v == 100));
    }
}

#[test]
fn grayscale_is_idempotent_on_gray() {
    let mut gray = ImageBuffer::new(7, 5, PixelType::Gray8).unwrap();
    for y in 0..5 {
        for x in 0..7 {
            gray.set_pixel(x, y, &[(x * 30 + y) as u8]);
        }
    }
    let mut session = session_with(&gray, None);
    session.apply(Operator::Grayscale).unwrap();
    assert_eq!(session.image(Slot::Primary), &gray);
}

#[test]
fn blend_identical_returns_input() {
    let img = scene(40, 24);
    let mut session = session_with(&img, Some(&img));
    session.apply(Operator::Blend).unwrap();
    assert_eq!(session.image(Slot::Primary), &img);
}

#[test]
fn swap_twice_restores_pair() {
    let (a, b) = (solid(8, 6, [1, 1, 1]), solid(5, 9, [2, 2, 2]));
    let mut session = session_with(&a, Some(&b));
    session.apply(Operator::Swap).unwrap();
    assert_eq!(session.image(Slot::Primary), &b);
    session.apply(Operator::Swap).unwrap();
    assert_eq!(session.image(Slot::Primary), &a);
    assert_eq!(session.image(Slot::Secondary), &b);
}

#[test]
fn reconcile_is_idempotent() {
    let reference = solid(20, 10, [0, 0, 0]);
    let once = reconcile(&reference, &scene(13, 17)).unwrap().image;
    let twice = reconcile(&reference, &once).unwrap();
    assert!(twice.steps.is_noop());
    assert_eq!(twice.image, once);
}

#[test]
fn display_of_every_layout() {
    assert!(to_displayable(&ImageBuffer::empty()).is_none());
    for pt in [PixelType::Gray8, PixelType::Bgr8, PixelType::Bgra8] {
        let bmp = to_displayable(&ImageBuffer::new(9, 4, pt).unwrap()).unwrap();
        assert_eq!((bmp.width, bmp.height), (9, 4));
    }
}

#[test]
fn stitch_overlapping_halves() {
    let full = scene(200, 120);
    let (left, right) = (crop(&full, 0, 120), crop(&full, 60, 120));
    let mut session = session_with(&left, Some(&right));
    session.apply(Operator::Stitch).unwrap();

    let pano = session.image(Slot::Primary);
    assert!((180..=181).contains(&pano.width()), "{:?}", pano.dimensions());
    assert!(session.image(Slot::Secondary).is_empty());
    assert_eq!(session.enablement().len(), 5);
}

#[test]
fn stitch_failure_keeps_slots() {
    let (a, b) = (solid(80, 80, [5, 5, 5]), solid(80, 80, [9, 9, 9]));
    let mut session = session_with(&a, Some(&b));
    let err = session.apply(Operator::Stitch).unwrap_err();
    assert_eq!(err.stitch_status(), Some(StitchStatus::NeedMoreImages));
    assert_eq!(err.stitch_status().map(StitchStatus::code), Some(1));
    assert_eq!(session.image(Slot::Primary), &a);
    assert_eq!(session.image(Slot::Secondary), &b);
    assert_eq!(session.enablement().len(), 9);
}

#[test]
fn texture_transfer_releases_secondary() {
    let mut session = session_with(&scene(48, 32), Some(&scene(20, 20)));
    session.apply(Operator::TextureTransfer).unwrap();
    assert_eq!(session.image(Slot::Primary).dimensions(), (48, 32));
    assert!(session.image(Slot::Secondary).is_empty());
}

#[test]
fn load_from_disk_and_failed_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("première.png");
    let img = scene(16, 16);
    write(&path, &img).unwrap();

    let mut session = Session::new();
    session.load_path(Slot::Primary, &path).unwrap();
    session.load_path(Slot::Secondary, &path).unwrap();
    assert_eq!(session.image(Slot::Primary), &img);
    assert_eq!(session.enablement().len(), 9);

    let missing = dir.path().join("missing.png");
    let err = session.load_path(Slot::Secondary, &missing).unwrap_err();
    assert!(matches!(err, EngineError::Decode { slot: Slot::Secondary, .. }));
    assert!(session.image(Slot::Secondary).is_empty());
    assert_eq!(session.image(Slot::Primary), &img);
    assert_eq!(session.enablement().len(), 5);
}

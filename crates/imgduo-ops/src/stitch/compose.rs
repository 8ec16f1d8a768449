//! Canvas layout and feathered blending.

use super::homography::Homography;
use super::StitchStatus;
use imgduo_core::ImageBuffer;
use rayon::prelude::*;
use tracing::debug;

/// Largest canvas side accepted.
pub const MAX_CANVAS_SIDE: f64 = 32767.0;

/// Rounds values within rounding noise of an integer.
fn snap(v: f64) -> f64 {
    let r = v.round();
    if (v - r).abs() < 1e-6 { r } else { v }
}

/// Feather weight: distance to the nearest border, at least 1 inside.
#[inline]
fn feather(x: f64, y: f64, width: usize, height: usize) -> f64 {
    (x + 1.0)
        .min(width as f64 - x)
        .min(y + 1.0)
        .min(height as f64 - y)
}

/// Bilinear sample of all channels at `(x, y)`, which must lie inside.
fn sample(img: &ImageBuffer, x: f64, y: f64, out: &mut [f64]) {
    let (w, h) = (img.width() as usize, img.height() as usize);
    let (x0, y0) = (x.floor() as usize, y.floor() as usize);
    let (x1, y1) = ((x0 + 1).min(w - 1), (y0 + 1).min(h - 1));
    let (fx, fy) = (x - x0 as f64, y - y0 as f64);
    let ch = out.len();
    let (r0, r1) = (img.row(y0 as u32), img.row(y1 as u32));
    for (c, o) in out.iter_mut().enumerate() {
        let top = r0[x0 * ch + c] as f64 * (1.0 - fx) + r0[x1 * ch + c] as f64 * fx;
        let bottom = r1[x0 * ch + c] as f64 * (1.0 - fx) + r1[x1 * ch + c] as f64 * fx;
        *o = top * (1.0 - fy) + bottom * fy;
    }
}

/// Places `primary` and `secondary` on one canvas.
///
/// `h` maps secondary pixel coordinates into the primary frame. The canvas
/// is the union of both footprints; where both cover a pixel, each is
/// weighted by its distance to its own border. Uncovered pixels are black.
///
/// # Errors
///
/// [`StitchStatus::CameraParamsAdjustFailed`] when the warped footprint is
/// not finite, `h` is not invertible, or the canvas exceeds
/// `max_canvas_scale` times the summed input areas.
pub fn compose(
    primary: &ImageBuffer,
    secondary: &ImageBuffer,
    h: &Homography,
    max_canvas_scale: f64,
) -> Result<ImageBuffer, StitchStatus> {
    let (wp, hp) = (primary.width() as usize, primary.height() as usize);
    let (ws, hs) = (secondary.width() as usize, secondary.height() as usize);
    if primary.is_empty() || secondary.is_empty() || primary.pixel_type() != secondary.pixel_type() {
        return Err(StitchStatus::NeedMoreImages);
    }
    let inv = h.inverse().ok_or(StitchStatus::CameraParamsAdjustFailed)?;

    let corners = [
        (0.0, 0.0),
        ((ws - 1) as f64, 0.0),
        ((ws - 1) as f64, (hs - 1) as f64),
        (0.0, (hs - 1) as f64),
    ];
    let (mut min_x, mut min_y) = (0.0f64, 0.0f64);
    let (mut max_x, mut max_y) = ((wp - 1) as f64, (hp - 1) as f64);
    for c in corners {
        let (x, y) = h.project(c).ok_or(StitchStatus::CameraParamsAdjustFailed)?;
        let (x, y) = (snap(x), snap(y));
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    let (min_x, min_y) = (min_x.floor(), min_y.floor());
    let canvas_w = max_x.ceil() - min_x + 1.0;
    let canvas_h = max_y.ceil() - min_y + 1.0;
    let limit = max_canvas_scale * ((wp * hp) as f64 + (ws * hs) as f64);
    if !(canvas_w.is_finite() && canvas_h.is_finite())
        || canvas_w > MAX_CANVAS_SIDE
        || canvas_h > MAX_CANVAS_SIDE
        || canvas_w * canvas_h > limit
    {
        debug!(canvas_w, canvas_h, "compose: canvas rejected");
        return Err(StitchStatus::CameraParamsAdjustFailed);
    }
    let (cw, chh) = (canvas_w as usize, canvas_h as usize);
    let (ox, oy) = (min_x as i64, min_y as i64);
    let channels = primary.channels();
    debug!(width = cw, height = chh, ox, oy, "compose: canvas");

    let mut data = vec![0u8; cw * chh * channels];
    data.par_chunks_mut(cw * channels)
        .enumerate()
        .for_each(|(cy, row)| {
            let py = cy as i64 + oy;
            let mut acc = vec![0.0f64; channels];
            let mut px_s = vec![0.0f64; channels];
            for cx in 0..cw {
                let px = cx as i64 + ox;
                acc.iter_mut().for_each(|a| *a = 0.0);
                let mut total = 0.0;

                if (0..wp as i64).contains(&px) && (0..hp as i64).contains(&py) {
                    let w = feather(px as f64, py as f64, wp, hp);
                    let src = primary.pixel(px as u32, py as u32);
                    acc.iter_mut().zip(src).for_each(|(a, &v)| *a += w * v as f64);
                    total += w;
                }

                if let Some((sx, sy)) = inv.project((px as f64, py as f64)) {
                    let (sx, sy) = (snap(sx), snap(sy));
                    if sx >= 0.0 && sy >= 0.0 && sx <= (ws - 1) as f64 && sy <= (hs - 1) as f64 {
                        let w = feather(sx, sy, ws, hs);
                        sample(secondary, sx, sy, &mut px_s);
                        acc.iter_mut().zip(&px_s).for_each(|(a, &v)| *a += w * v);
                        total += w;
                    }
                }

                if total > 0.0 {
                    let out = &mut row[cx * channels..][..channels];
                    for (o, a) in out.iter_mut().zip(&acc) {
                        *o = crate::saturate_u8(a / total);
                    }
                }
            }
        });

    ImageBuffer::from_raw(cw as u32, chh as u32, primary.pixel_type(), data)
        .map_err(|_| StitchStatus::CameraParamsAdjustFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgduo_core::PixelType;

    fn ramp(width: u32, height: u32) -> ImageBuffer {
        let mut img = ImageBuffer::new(width, height, PixelType::Bgr8).unwrap();
        for y in 0..height {
            for x in 0..width {
                img.set_pixel(x, y, &[(x * 7 % 256) as u8, (y * 11 % 256) as u8, 9]);
            }
        }
        img
    }

    #[test]
    fn test_identity_reproduces_input() {
        let img = ramp(30, 20);
        let out = compose(&img, &img, &Homography::identity(), 8.0).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn test_sample_bilinear() {
        let img = ImageBuffer::from_raw(2, 2, PixelType::Gray8, vec![0, 100, 100, 200]).unwrap();
        let mut out = [0.0f64; 1];
        sample(&img, 0.5, 0.5, &mut out);
        approx::assert_relative_eq!(out[0], 100.0);
        sample(&img, 1.0, 0.0, &mut out);
        approx::assert_relative_eq!(out[0], 100.0);
        sample(&img, 1.0, 1.0, &mut out);
        approx::assert_relative_eq!(out[0], 200.0);
        sample(&img, 0.25, 0.0, &mut out);
        approx::assert_relative_eq!(out[0], 25.0);
    }

    #[test]
    fn test_translation_extends_canvas() {
        let a = ImageBuffer::filled(10, 6, PixelType::Gray8, &[100]).unwrap();
        let b = ImageBuffer::filled(10, 6, PixelType::Gray8, &[200]).unwrap();
        let out = compose(&a, &b, &Homography::translation(8.0, 3.0), 8.0).unwrap();
        assert_eq!(out.dimensions(), (18, 9));
        assert_eq!(out.pixel(0, 0), &[100]);
        assert_eq!(out.pixel(17, 8), &[200]);
        // Covered by neither
        assert_eq!(out.pixel(17, 0), &[0]);
        assert_eq!(out.pixel(0, 8), &[0]);
        // Overlap lies between both values
        let v = out.pixel(9, 4)[0];
        assert!((100..=200).contains(&v));
    }

    #[test]
    fn test_negative_offset() {
        let a = ImageBuffer::filled(10, 10, PixelType::Gray8, &[50]).unwrap();
        let b = ImageBuffer::filled(10, 10, PixelType::Gray8, &[150]).unwrap();
        let out = compose(&a, &b, &Homography::translation(-5.0, 0.0), 8.0).unwrap();
        assert_eq!(out.dimensions(), (15, 10));
        assert_eq!(out.pixel(0, 5), &[150]);
        assert_eq!(out.pixel(14, 5), &[50]);
    }

    #[test]
    fn test_oversized_canvas_rejected() {
        let a = ImageBuffer::filled(10, 10, PixelType::Gray8, &[50]).unwrap();
        let far = Homography::translation(5000.0, 5000.0);
        assert_eq!(compose(&a, &a, &far, 8.0), Err(StitchStatus::CameraParamsAdjustFailed));
    }
}

//! Anti-aliasing aware perceptual pixel diff.
//!
//! Colour distance is measured in YIQ space and compared against
//! `35215 · threshold²`, the largest possible YIQ delta scaled by the
//! threshold. A differing pixel is treated as anti-aliasing when its
//! neighbourhood holds both a darker and a brighter neighbour and one of
//! those extremes sits in a flat region of both images.

use image::{ImageBuffer, Rgba, RgbaImage};

use crate::errors::VisualError;
use crate::models::DiffOptions;

const MAX_YIQ_DELTA: f64 = 35215.0;
const DIFF_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);
const AA_COLOR: Rgba<u8> = Rgba([255, 255, 0, 255]);
/// Opacity of unchanged pixels in the diff image.
const FADE_ALPHA: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct DiffOutcome {
    pub diff_pixels: u64,
    pub aa_pixels: u64,
    pub width: u32,
    pub height: u32,
    pub diff_image: RgbaImage,
}

impl DiffOutcome {
    pub fn total_pixels(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    pub fn percentage(&self) -> f64 {
        let total = self.total_pixels();
        if total == 0 {
            0.0
        } else {
            self.diff_pixels as f64 / total as f64 * 100.0
        }
    }
}

/// Decode two PNGs and compare them.
pub fn compare_png(baseline: &[u8], current: &[u8], options: DiffOptions) -> Result<DiffOutcome, VisualError> {
    let baseline = image::load_from_memory(baseline)?.to_rgba8();
    let current = image::load_from_memory(current)?.to_rgba8();
    compare(&baseline, &current, options)
}

pub fn compare(baseline: &RgbaImage, current: &RgbaImage, options: DiffOptions) -> Result<DiffOutcome, VisualError> {
    if baseline.dimensions() != current.dimensions() {
        return Err(VisualError::DimensionMismatch {
            baseline_width: baseline.width(),
            baseline_height: baseline.height(),
            current_width: current.width(),
            current_height: current.height(),
        });
    }
    let (width, height) = baseline.dimensions();
    let max_delta = MAX_YIQ_DELTA * options.threshold * options.threshold;

    let mut diff_image: RgbaImage = ImageBuffer::new(width, height);
    let mut diff_pixels = 0u64;
    let mut aa_pixels = 0u64;

    if baseline.as_raw() == current.as_raw() {
        for (x, y, pixel) in baseline.enumerate_pixels() {
            diff_image.put_pixel(x, y, faded(pixel));
        }
        return Ok(DiffOutcome {
            diff_pixels,
            aa_pixels,
            width,
            height,
            diff_image,
        });
    }

    for y in 0..height {
        for x in 0..width {
            let a = baseline.get_pixel(x, y);
            let b = current.get_pixel(x, y);
            let delta = color_delta(a, b, false);
            if delta.abs() > max_delta {
                let anti_aliased = !options.include_aa
                    && (antialiased(baseline, current, x, y) || antialiased(current, baseline, x, y));
                if anti_aliased {
                    aa_pixels += 1;
                    diff_image.put_pixel(x, y, AA_COLOR);
                } else {
                    diff_pixels += 1;
                    diff_image.put_pixel(x, y, DIFF_COLOR);
                }
            } else {
                diff_image.put_pixel(x, y, faded(a));
            }
        }
    }

    Ok(DiffOutcome {
        diff_pixels,
        aa_pixels,
        width,
        height,
        diff_image,
    })
}

fn blend(channel: f64, alpha: f64) -> f64 {
    255.0 + (channel - 255.0) * alpha
}

fn rgb_to_y(r: f64, g: f64, b: f64) -> f64 {
    r * 0.298_895_31 + g * 0.586_622_47 + b * 0.114_482_23
}

fn rgb_to_i(r: f64, g: f64, b: f64) -> f64 {
    r * 0.595_977_99 - g * 0.274_176_10 - b * 0.321_801_89
}

fn rgb_to_q(r: f64, g: f64, b: f64) -> f64 {
    r * 0.211_470_17 - g * 0.522_617_11 + b * 0.311_146_94
}

fn blended(pixel: &Rgba<u8>) -> (f64, f64, f64) {
    let [r, g, b, a] = pixel.0;
    let (r, g, b) = (f64::from(r), f64::from(g), f64::from(b));
    if a == 255 {
        return (r, g, b);
    }
    let alpha = f64::from(a) / 255.0;
    (blend(r, alpha), blend(g, alpha), blend(b, alpha))
}

/// Signed YIQ distance; negative when `b` is brighter. With `y_only` the
/// brightness difference alone is returned.
fn color_delta(a: &Rgba<u8>, b: &Rgba<u8>, y_only: bool) -> f64 {
    if a == b {
        return 0.0;
    }
    let (r1, g1, b1) = blended(a);
    let (r2, g2, b2) = blended(b);
    let y = rgb_to_y(r1, g1, b1) - rgb_to_y(r2, g2, b2);
    if y_only {
        return y;
    }
    let i = rgb_to_i(r1, g1, b1) - rgb_to_i(r2, g2, b2);
    let q = rgb_to_q(r1, g1, b1) - rgb_to_q(r2, g2, b2);
    let delta = 0.5053 * y * y + 0.299 * i * i + 0.1957 * q * q;
    if y > 0.0 {
        -delta
    } else {
        delta
    }
}

fn faded(pixel: &Rgba<u8>) -> Rgba<u8> {
    let (r, g, b) = blended(pixel);
    let alpha = FADE_ALPHA * f64::from(pixel.0[3]) / 255.0;
    let value = blend(rgb_to_y(r, g, b), alpha).round().clamp(0.0, 255.0) as u8;
    Rgba([value, value, value, 255])
}

fn neighbourhood(image: &RgbaImage, x: u32, y: u32) -> (u32, u32, u32, u32, u32) {
    let x0 = x.saturating_sub(1);
    let y0 = y.saturating_sub(1);
    let x2 = (x + 1).min(image.width() - 1);
    let y2 = (y + 1).min(image.height() - 1);
    let on_edge = u32::from(x == x0 || x == x2 || y == y0 || y == y2);
    (x0, y0, x2, y2, on_edge)
}

/// Whether `(x, y)` in `image` looks like an anti-aliased edge pixel.
fn antialiased(image: &RgbaImage, other: &RgbaImage, x: u32, y: u32) -> bool {
    let (x0, y0, x2, y2, mut zeroes) = neighbourhood(image, x, y);
    let center = image.get_pixel(x, y);
    let mut min = 0.0;
    let mut max = 0.0;
    let mut min_at = (x, y);
    let mut max_at = (x, y);

    for nx in x0..=x2 {
        for ny in y0..=y2 {
            if nx == x && ny == y {
                continue;
            }
            let delta = color_delta(center, image.get_pixel(nx, ny), true);
            if delta == 0.0 {
                zeroes += 1;
                if zeroes > 2 {
                    return false;
                }
            } else if delta < min {
                min = delta;
                min_at = (nx, ny);
            } else if delta > max {
                max = delta;
                max_at = (nx, ny);
            }
        }
    }

    if min == 0.0 || max == 0.0 {
        return false;
    }
    (has_many_siblings(image, min_at.0, min_at.1) && has_many_siblings(other, min_at.0, min_at.1))
        || (has_many_siblings(image, max_at.0, max_at.1) && has_many_siblings(other, max_at.0, max_at.1))
}

/// More than two neighbours share the exact colour of `(x, y)`.
fn has_many_siblings(image: &RgbaImage, x: u32, y: u32) -> bool {
    let (x0, y0, x2, y2, mut zeroes) = neighbourhood(image, x, y);
    let center = image.get_pixel(x, y);
    for nx in x0..=x2 {
        for ny in y0..=y2 {
            if nx == x && ny == y {
                continue;
            }
            if image.get_pixel(nx, ny) == center {
                zeroes += 1;
                if zeroes > 2 {
                    return true;
                }
            }
        }
    }
    false
}

/// Encode an image as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, VisualError> {
    let mut buf = Vec::new();
    image.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageOutputFormat::Png)?;
    Ok(buf)
}

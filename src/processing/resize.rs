//! Target-size math and resampling

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageBuffer, Pixel};

use crate::config::Interpolation;
use crate::error::JobError;

/// Scale `width`x`height` so the long side becomes `longside`
///
/// Landscape images (ratio > 1) get `longside` as width; portrait and square
/// images get it as height. The other side keeps the aspect ratio and is
/// truncated toward zero, so it may come out as 0 for extreme ratios.
pub fn target_dimensions(width: u32, height: u32, longside: u32) -> (u32, u32) {
    let ratio = f64::from(width) / f64::from(height);
    let longside = f64::from(longside);

    let (new_width, new_height) = if ratio > 1.0 {
        (longside, longside / ratio)
    } else {
        (longside * ratio, longside)
    };

    (new_width as u32, new_height as u32)
}

/// Resample `image` to exactly `width`x`height` using `method`
///
/// [`Interpolation::Max`] does not resample and returns the image unchanged.
pub fn resample(
    image: &DynamicImage,
    width: u32,
    height: u32,
    method: Interpolation,
) -> Result<DynamicImage, JobError> {
    let filter = match method {
        Interpolation::Max => return Ok(image.clone()),
        Interpolation::Area => return resample_area(image, width, height),
        Interpolation::Nearest => FilterType::Nearest,
        Interpolation::Linear => FilterType::Triangle,
        Interpolation::Cubic => FilterType::CatmullRom,
        Interpolation::Lanczos4 => FilterType::Lanczos3,
    };

    Ok(image.resize_exact(width, height, filter))
}

fn resample_area(image: &DynamicImage, width: u32, height: u32) -> Result<DynamicImage, JobError> {
    Ok(match image {
        DynamicImage::ImageLuma8(buf) => DynamicImage::ImageLuma8(area(buf, width, height)?),
        DynamicImage::ImageRgb8(buf) => DynamicImage::ImageRgb8(area(buf, width, height)?),
        other => DynamicImage::ImageRgb8(area(&other.to_rgb8(), width, height)?),
    })
}

/// Pixel-area-relation resampling
///
/// Shrinking averages every source pixel an output pixel covers, weighted by
/// the covered fraction. Enlarging either axis falls back to nearest neighbour.
pub fn area<P>(
    src: &ImageBuffer<P, Vec<u8>>,
    dst_width: u32,
    dst_height: u32,
) -> Result<ImageBuffer<P, Vec<u8>>, JobError>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let (src_width, src_height) = src.dimensions();
    if dst_width > src_width || dst_height > src_height {
        return Ok(imageops::resize(src, dst_width, dst_height, FilterType::Nearest));
    }

    let channels = usize::from(P::CHANNEL_COUNT);
    let columns = coverage(src_width, dst_width);
    let rows = coverage(src_height, dst_height);
    let raw = src.as_raw();
    let stride = src_width as usize * channels;

    let mut out = Vec::with_capacity(dst_width as usize * dst_height as usize * channels);
    let mut acc = vec![0f64; channels];

    for row in &rows {
        for column in &columns {
            acc.iter_mut().for_each(|a| *a = 0.0);
            let mut total = 0.0;

            for &(sy, wy) in row {
                for &(sx, wx) in column {
                    let weight = wy * wx;
                    let base = sy * stride + sx * channels;
                    for (c, a) in acc.iter_mut().enumerate() {
                        *a += f64::from(raw[base + c]) * weight;
                    }
                    total += weight;
                }
            }

            out.extend(acc.iter().map(|a| (a / total).round().clamp(0.0, 255.0) as u8));
        }
    }

    ImageBuffer::from_raw(dst_width, dst_height, out)
        .ok_or_else(|| JobError::unknown("area resample produced a short buffer"))
}

/// For each destination index, the source indices it spans and their weights
fn coverage(src_len: u32, dst_len: u32) -> Vec<Vec<(usize, f64)>> {
    let scale = f64::from(src_len) / f64::from(dst_len);

    (0..dst_len)
        .map(|d| {
            let start = f64::from(d) * scale;
            let end = (f64::from(d) + 1.0) * scale;
            let first = start.floor() as u32;
            let last = (end.ceil() as u32).min(src_len);

            (first..last)
                .filter_map(|s| {
                    let weight = end.min(f64::from(s) + 1.0) - start.max(f64::from(s));
                    (weight > 1e-9).then_some((s as usize, weight))
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    fn create_test_image(width: u32, height: u32) -> DynamicImage {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            let intensity = ((x + y) % 255) as u8;
            Rgb([intensity, intensity, intensity])
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_target_dimensions_landscape_and_portrait() {
        assert_eq!(target_dimensions(4000, 2000, 1000), (1000, 500));
        assert_eq!(target_dimensions(2000, 4000, 1000), (500, 1000));
    }

    #[test]
    fn test_target_dimensions_square_uses_height_branch() {
        assert_eq!(target_dimensions(10, 10, 4000), (4000, 4000));
    }

    #[test]
    fn test_target_dimensions_truncates() {
        // 3:2 at 1000 gives 666.66..
        assert_eq!(target_dimensions(3000, 2000, 1000), (1000, 666));
        assert_eq!(target_dimensions(2000, 3000, 1000), (666, 1000));
        assert_eq!(target_dimensions(1000, 1, 100), (100, 0));
    }

    #[test]
    fn test_resample_all_methods() {
        let image = create_test_image(120, 60);

        for method in Interpolation::ALL {
            let out = resample(&image, 40, 20, method).unwrap();
            if method == Interpolation::Max {
                assert_eq!((out.width(), out.height()), (120, 60));
            } else {
                assert_eq!((out.width(), out.height()), (40, 20), "{method}");
            }
        }
    }

    #[test]
    fn test_area_averages_blocks() {
        // 4x2 gray with two 2x2 blocks: 0 and 200
        let src = ImageBuffer::from_fn(4, 2, |x, _| Luma([if x < 2 { 0u8 } else { 200 }]));
        let out = area(&src, 2, 1).unwrap();
        assert_eq!(out.get_pixel(0, 0).0, [0]);
        assert_eq!(out.get_pixel(1, 0).0, [200]);
    }

    #[test]
    fn test_area_fractional_coverage() {
        // 3 pixels into 2: each output takes 1.5 source pixels
        let src = ImageBuffer::from_fn(3, 1, |x, _| Luma([[0u8, 90, 180][x as usize]]));
        let out = area(&src, 2, 1).unwrap();
        // (0 * 1 + 90 * 0.5) / 1.5 = 30, (90 * 0.5 + 180 * 1) / 1.5 = 150
        assert_eq!(out.get_pixel(0, 0).0, [30]);
        assert_eq!(out.get_pixel(1, 0).0, [150]);
    }

    #[test]
    fn test_area_enlarging_falls_back_to_nearest() {
        let src = ImageBuffer::from_fn(2, 2, |x, y| Rgb([(x * 100) as u8, (y * 100) as u8, 7]));
        let out = area(&src, 4, 4).unwrap();
        assert_eq!(out.dimensions(), (4, 4));
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 7]);
        assert_eq!(out.get_pixel(3, 3).0, [100, 100, 7]);
    }

    #[test]
    fn test_coverage_weights_sum_to_scale() {
        for (src, dst) in [(10u32, 3u32), (7, 7), (4000, 1000)] {
            let spans = coverage(src, dst);
            assert_eq!(spans.len(), dst as usize);
            let scale = f64::from(src) / f64::from(dst);
            for span in spans {
                let total: f64 = span.iter().map(|(_, w)| w).sum();
                assert!((total - scale).abs() < 1e-6);
            }
        }
    }
}

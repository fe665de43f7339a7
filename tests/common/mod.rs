//! Fixtures shared by the integration tests

use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageBuffer, Rgb};

/// Encode a gradient JPEG of the given size
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x * 20 % 256) as u8, (y * 20 % 256) as u8, 128])
    });
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_with_encoder(JpegEncoder::new_with_quality(&mut buf, 90))
        .unwrap();
    buf
}

/// Write `data` to `root/relative`, creating parent directories
pub fn write(root: &Path, relative: &str, data: &[u8]) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, data).unwrap();
}

/// Decoded dimensions of a JPEG on disk
pub fn dimensions(path: &Path) -> (u32, u32) {
    let img = image::load_from_memory(&std::fs::read(path).unwrap()).unwrap();
    (img.width(), img.height())
}

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{DynamicImage, ImageBuffer, Rgb};

use batchresize::processing::resize::area;
use batchresize::{processing::resample, Interpolation};

fn test_image(width: u32, height: u32) -> DynamicImage {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x ^ y) % 256) as u8])
    });
    DynamicImage::ImageRgb8(img)
}

fn benchmark_methods(c: &mut Criterion) {
    let image = test_image(1600, 1200);
    let mut group = c.benchmark_group("resample_1600x1200_to_400x300");
    group.sample_size(20);

    for method in Interpolation::ALL {
        if method == Interpolation::Max {
            continue;
        }
        group.bench_with_input(BenchmarkId::from_parameter(method.name()), &method, |b, &method| {
            b.iter(|| resample(black_box(&image), 400, 300, method).unwrap());
        });
    }

    group.finish();
}

fn benchmark_area_ratios(c: &mut Criterion) {
    let source = test_image(1200, 900).to_rgb8();
    let mut group = c.benchmark_group("area");

    for divisor in [2u32, 3, 7] {
        let (width, height) = (1200 / divisor, 900 / divisor);
        group.bench_with_input(BenchmarkId::new("shrink", divisor), &divisor, |b, _| {
            b.iter(|| area(black_box(&source), width, height).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_methods, benchmark_area_ratios);
criterion_main!(benches);

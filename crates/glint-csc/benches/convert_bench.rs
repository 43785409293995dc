//! Benchmarks for the conversion hot path.
//!
//! Run with: cargo bench -p glint-csc

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glint_buffer::PixelBuffer;
use glint_core::PixelFormat;
use glint_csc::Converter;

fn gradient_frame(width: u32, height: u32) -> PixelBuffer {
    let mut buf = PixelBuffer::allocate(width, height, PixelFormat::Bgrx).unwrap();
    let stride = buf.plane_stride(0).unwrap();
    let plane = buf.plane_mut(0).unwrap();
    for y in 0..height as usize {
        for x in 0..width as usize {
            let i = y * stride + x * 4;
            plane[i] = (x & 0xFF) as u8;
            plane[i + 1] = (y & 0xFF) as u8;
            plane[i + 2] = ((x + y) & 0xFF) as u8;
        }
    }
    buf
}

fn bench_bgrx_to_yuv420(c: &mut Criterion) {
    let src = gradient_frame(1920, 1080);
    let mut conv =
        Converter::new(1920, 1080, PixelFormat::Bgrx, 1920, 1080, PixelFormat::Yuv420p, 50)
            .unwrap();

    c.bench_function("bgrx_to_yuv420_1080p", |bencher| {
        bencher.iter(|| conv.convert(black_box(&src)).unwrap());
    });
}

fn bench_bgrx_to_nv12(c: &mut Criterion) {
    let src = gradient_frame(1280, 720);
    let mut conv =
        Converter::new(1280, 720, PixelFormat::Bgrx, 1280, 720, PixelFormat::Nv12, 50).unwrap();

    c.bench_function("bgrx_to_nv12_720p", |bencher| {
        bencher.iter(|| conv.convert(black_box(&src)).unwrap());
    });
}

fn bench_scaled_conversion(c: &mut Criterion) {
    let src = gradient_frame(1920, 1080);
    for (name, speed) in [("nearest", 100u32), ("bilinear", 50), ("box", 0)] {
        let mut conv =
            Converter::new(1920, 1080, PixelFormat::Bgrx, 1280, 720, PixelFormat::Yuv420p, speed)
                .unwrap();
        c.bench_function(&format!("bgrx_to_yuv420_scaled_{name}"), |bencher| {
            bencher.iter(|| conv.convert(black_box(&src)).unwrap());
        });
    }
}

criterion_group!(
    benches,
    bench_bgrx_to_yuv420,
    bench_bgrx_to_nv12,
    bench_scaled_conversion,
);
criterion_main!(benches);

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use fastarm::{blit, copy};
use std::time::Duration;

#[derive(Clone)]
struct BlitCase {
    label: String,
    width: usize,
    height: usize,
    src_stride: usize,
    dest_stride: usize,
    src_off: usize,
    dst_off: usize,
}

fn configure_group_for_len(
    group: &mut criterion::BenchmarkGroup<'_, criterion::measurement::WallTime>,
    len: usize,
) {
    if len >= 1 << 20 {
        group.sample_size(20);
        group.warm_up_time(Duration::from_millis(300));
        group.measurement_time(Duration::from_millis(900));
    } else {
        group.sample_size(40);
        group.warm_up_time(Duration::from_millis(200));
        group.measurement_time(Duration::from_millis(500));
    }
}

fn blit_benches(c: &mut Criterion) {
    let mut cases = Vec::new();

    // Framebuffer-like rectangles: 16 bpp rows of 320 and 800 pixels.
    for (width, height, stride) in [(640usize, 240usize, 640usize), (1600, 480, 1600), (64, 64, 1600)]
    {
        // Equal word-aligned, equal unaligned, and differing rotations.
        for (src_off, dst_off) in [(0usize, 0usize), (6, 6), (2, 7)] {
            cases.push(BlitCase {
                label: format!("{width}x{height}_s{src_off}_d{dst_off}"),
                width,
                height,
                src_stride: stride,
                dest_stride: stride,
                src_off,
                dst_off,
            });
        }
    }
    // Odd stride: rotation changes row to row.
    cases.push(BlitCase {
        label: "640x240_odd_stride".to_string(),
        width: 640,
        height: 240,
        src_stride: 643,
        dest_stride: 640,
        src_off: 0,
        dst_off: 0,
    });

    let mut group = c.benchmark_group("blit");

    for case in &cases {
        let src_len = case.src_off + case.src_stride * case.height + 32;
        let dst_len = case.dst_off + case.dest_stride * case.height + 32;
        let src: Vec<u8> = (0..src_len).map(|i| (i % 251) as u8).collect();
        let mut dst = vec![0u8; dst_len];
        let src_base = src.as_ptr().align_offset(32).min(31);
        let dst_base = dst.as_ptr().align_offset(32).min(31);
        let src_ptr = src.as_ptr().wrapping_add(src_base + case.src_off);
        let dst_ptr = dst.as_mut_ptr().wrapping_add(dst_base + case.dst_off);
        let (w, h) = (case.width, case.height);
        let (ss, ds) = (case.src_stride, case.dest_stride);

        let bytes = w * h;
        configure_group_for_len(&mut group, bytes);
        group.throughput(Throughput::Bytes(bytes as u64));

        group.bench_with_input(BenchmarkId::new("blit", &case.label), &w, |b, &w| {
            b.iter(|| unsafe {
                blit(
                    black_box(src_ptr),
                    black_box(dst_ptr),
                    ss as isize,
                    ds as isize,
                    w as isize,
                    h as isize,
                );
                black_box(core::ptr::read_volatile(dst_ptr));
            });
        });

        group.bench_with_input(BenchmarkId::new("row_copy", &case.label), &w, |b, &w| {
            b.iter(|| unsafe {
                for row in 0..h {
                    copy(
                        black_box(dst_ptr.add(row * ds)),
                        black_box(src_ptr.add(row * ss)),
                        w as isize,
                    );
                }
                black_box(core::ptr::read_volatile(dst_ptr));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, blit_benches);
criterion_main!(benches);

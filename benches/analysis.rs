use criterion::{black_box, criterion_group, criterion_main, Criterion, BenchmarkId};
use viewfinder_rs::viewfinder::{
    AnalysisConfig, FrameAnalyzer, HistogramAnalyzer, LumaFrame, RgbaImageData, ToneMapper, merge,
};

fn generate_luma_plane(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let value = if (x / 16 + y / 16) % 2 == 0 { ((x + y) % 256) as u8 } else { 255 };
            data.push(value);
        }
    }
    data
}

fn generate_rgba(width: u32, height: u32, seed: u8) -> RgbaImageData {
    let data = (0..width * height)
        .flat_map(|i| {
            let v = (i as u8).wrapping_add(seed);
            [v, v.wrapping_mul(3), 255 - v, 255]
        })
        .collect();
    RgbaImageData {
        width,
        height,
        data,
    }
}

fn benchmark_frame_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_analysis");

    let sizes = vec![
        (640, 480, "640x480"),
        (1280, 720, "1280x720"),
        (1920, 1080, "1920x1080"),
    ];

    for (width, height, label) in sizes {
        let plane = generate_luma_plane(width, height);

        group.bench_with_input(BenchmarkId::new("histogram", label), &plane, |b, data| {
            let frame = LumaFrame::packed(width as u32, height as u32, data).unwrap();
            b.iter(|| HistogramAnalyzer.compute(black_box(&frame)));
        });

        group.bench_with_input(BenchmarkId::new("full", label), &plane, |b, data| {
            let frame = LumaFrame::packed(width as u32, height as u32, data).unwrap();
            let analyzer = FrameAnalyzer::new(AnalysisConfig::default());
            let mut analysis = analyzer.new_analysis();
            b.iter(|| analyzer.analyze_into(black_box(&frame), &mut analysis));
        });
    }

    group.finish();
}

fn benchmark_merge_and_tone_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("hdr");
    group.sample_size(20);

    let bracket: Vec<RgbaImageData> = (0..3).map(|i| generate_rgba(1920, 1080, i * 60)).collect();
    let mapper = ToneMapper::new();

    group.bench_function("merge_3x1080p", |b| {
        b.iter(|| merge(black_box(&bracket)).unwrap());
    });

    group.bench_function("tone_map_1080p", |b| {
        let mut image = bracket[0].clone();
        b.iter(|| mapper.apply(black_box(&mut image)));
    });

    group.finish();
}

criterion_group!(benches, benchmark_frame_analysis, benchmark_merge_and_tone_map);
criterion_main!(benches);

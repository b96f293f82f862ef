//! Benchmarks for stroke evaluation and compositing

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use stroke_sdf::compose::ALL_COMPOSITION_TYPES;
use stroke_sdf::prelude::*;

struct Batch {
    x: Tensor,
    radius: Tensor,
    viewdir: Tensor,
}

impl Batch {
    fn new(rays: usize, samples: usize) -> Self {
        let mut x = Vec::with_capacity(rays * samples * 3);
        let mut viewdir = Vec::with_capacity(rays * 3);
        for r in 0..rays {
            let y = -0.5 + (r as f32 + 0.5) / rays as f32;
            for s in 0..samples {
                let t = -0.7 + 1.4 * (s as f32 + 0.5) / samples as f32;
                x.extend([t, y, 0.05]);
            }
            viewdir.extend([1.0, 0.0, 0.0]);
        }
        Self {
            x: Tensor::new([rays, samples, 3], x).unwrap(),
            radius: Tensor::new([rays, samples], vec![0.005; rays * samples]).unwrap(),
            viewdir: Tensor::new([rays, 3], viewdir).unwrap(),
        }
    }

    fn view(&self) -> SampleBatch<'_> {
        SampleBatch {
            x: &self.x,
            radius: &self.radius,
            viewdir: &self.viewdir,
        }
    }
}

fn stroke_set(shape: &str, color: &str, strokes: usize) -> StrokeSet {
    let config = StrokeConfig {
        shape_type: shape.into(),
        color_type: color.into(),
        seed: 42,
        ..StrokeConfig::default()
    };
    let mut set = StrokeSet::from_config(&config).unwrap();
    for step in 0..strokes {
        set.push_sampled(step as u32, None);
    }
    set
}

fn bench_forward(c: &mut Criterion) {
    let mut group = c.benchmark_group("stroke_forward");
    let batch = Batch::new(64, 32);
    group.throughput(Throughput::Elements((64 * 32) as u64));

    for (shape, color) in [
        ("sphere", "constant_rgb"),
        ("obb", "constant_rgb"),
        ("cappedtorus", "gradient_rgb"),
        ("cubic_bezier", "constant_sh3"),
    ] {
        let set = stroke_set(shape, color, 16);
        let op = set.kind().stroke_fn();
        let shape_params = set.shape_params().unwrap();
        let color_params = set.color_params().unwrap();
        group.bench_function(format!("{shape}/{color}"), |b| {
            b.iter(|| {
                op.forward(
                    black_box(batch.view()),
                    black_box(&shape_params),
                    black_box(&color_params),
                    &StrokeOptions::default(),
                    GradRequest::NONE,
                )
                .unwrap()
                .0
            })
        });
    }

    group.finish();
}

fn bench_backward(c: &mut Criterion) {
    let mut group = c.benchmark_group("stroke_backward");
    let batch = Batch::new(32, 32);

    for strokes in [4, 16, 64] {
        let set = stroke_set("obb", "gradient_rgb", strokes);
        let op = set.kind().stroke_fn();
        let shape_params = set.shape_params().unwrap();
        let color_params = set.color_params().unwrap();
        let opts = StrokeOptions {
            use_laplace_transform: true,
            ..StrokeOptions::default()
        };
        group.throughput(Throughput::Elements((32 * 32 * strokes) as u64));
        group.bench_with_input(BenchmarkId::new("params", strokes), &strokes, |b, _| {
            b.iter(|| {
                let (out, tape) = op
                    .forward(batch.view(), &shape_params, &color_params, &opts, GradRequest::PARAMS)
                    .unwrap();
                let grad_alpha = Tensor::new(out.alpha.shape(), vec![1.0; out.alpha.numel()]).unwrap();
                let grad_color = Tensor::new(out.color.shape(), vec![1.0; out.color.numel()]).unwrap();
                tape.backward(black_box(&grad_alpha), black_box(&grad_color), None).unwrap()
            })
        });
    }

    group.finish();
}

fn bench_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose");
    let batch = Batch::new(64, 64);
    let set = stroke_set("cube", "constant_rgb", 32);
    let (out, _) = set
        .kind()
        .stroke_fn()
        .forward(
            batch.view(),
            &set.shape_params().unwrap(),
            &set.color_params().unwrap(),
            &StrokeOptions::default(),
            GradRequest::NONE,
        )
        .unwrap();
    let density = set.density_params();
    group.throughput(Throughput::Elements((64 * 64) as u64));

    for strategy in ALL_COMPOSITION_TYPES {
        let compositor = Compositor::new(strategy);
        group.bench_function(BenchmarkId::new("forward", strategy.name()), |b| {
            b.iter(|| {
                compositor
                    .compose(black_box(&out.alpha), black_box(&out.color), black_box(&density))
                    .unwrap()
            })
        });

        let grad_density = Tensor::new(&out.alpha.shape()[..2], vec![1.0; 64 * 64]).unwrap();
        let grad_color = Tensor::new([64, 64, 3], vec![1.0; 64 * 64 * 3]).unwrap();
        group.bench_function(BenchmarkId::new("backward", strategy.name()), |b| {
            b.iter(|| {
                let (_, tape) = compositor.compose_with_grad(&out.alpha, &out.color, &density).unwrap();
                tape.backward(black_box(&grad_density), black_box(&grad_color)).unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_forward, bench_backward, bench_compose);
criterion_main!(benches);

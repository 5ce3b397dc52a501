use super::*;
use crate::core::CpuCaps;
use crate::domain::GrainParams;

/// Runs batches inline but reports a fixed worker count, so frames get
/// split into several bands without threads.
struct Bands(usize);

impl TaskDispatcher for Bands {
    fn thread_count(&self) -> usize {
        self.0
    }

    fn run_all<'a>(&self, jobs: Vec<Job<'a>>) {
        // reverse order: results must not depend on band scheduling
        for job in jobs.into_iter().rev() {
            job();
        }
    }
}

fn kernel(params: &GrainParams) -> Arc<ReconstructionKernel> {
    Arc::new(ReconstructionKernel::from_params(params))
}

fn gradient(w: usize, h: usize) -> Vec<f32> {
    (0..w * h)
        .map(|i| {
            let (x, y) = (i % w, i / w);
            (x + y) as f32 / (w + h - 2) as f32
        })
        .collect()
}

fn render_with(
    src: &[f32],
    w: usize,
    h: usize,
    params: &GrainParams,
    level: SimdLevel,
    dispatcher: &dyn TaskDispatcher,
) -> (Vec<f32>, FrameStats) {
    let mut out = vec![-1.0f32; w * h];
    let mut synth = GrainSynthesizer::new(level);
    let stats = synth.render(
        &mut PlaneMut::packed(&mut out, w, h),
        PlaneRef::packed(src, w, h),
        &kernel(params),
        params.picture_seed(0, 0),
        params.draft,
        dispatcher,
    );
    (out, stats)
}

fn small_params() -> GrainParams {
    GrainParams { res: 64, rad: 0.1, ..GrainParams::default() }
}

fn mean(v: &[f32]) -> f32 {
    v.iter().sum::<f32>() / v.len() as f32
}

#[test]
fn gray_4x4_reference_frame() {
    let params = GrainParams { res: 1000, ..GrainParams::default() };
    assert_eq!((params.seed, params.rad, params.dev, params.sigma), (12345, 0.025, 0.0, 0.35));

    let src = vec![0.5f32; 16];
    let (a, stats) = render_with(&src, 4, 4, &params, SimdLevel::Scalar, &SyncDispatcher);
    assert!(a.iter().all(|v| (0.0..=1.0).contains(v)), "{:?}", a);
    assert!(stats.load_total > 0);
    assert_eq!(stats.band_rows, vec![[0, 4]]);

    let (b, _) = render_with(&src, 4, 4, &params, SimdLevel::Scalar, &SyncDispatcher);
    assert_eq!(a, b);
}

#[test]
fn output_is_a_multiple_of_the_point_weight() {
    let params = small_params();
    let src = gradient(12, 9);
    let (out, _) = render_with(&src, 12, 9, &params, SimdLevel::Scalar, &SyncDispatcher);
    for v in out {
        let hits = v * 64.0;
        assert!((hits - hits.round()).abs() < 1e-3, "{}", v);
    }
}

#[test]
fn band_count_does_not_change_the_picture() {
    let params = small_params();
    let src = gradient(16, 13);
    let (one, s1) = render_with(&src, 16, 13, &params, SimdLevel::Scalar, &Bands(1));
    let (four, s4) = render_with(&src, 16, 13, &params, SimdLevel::Scalar, &Bands(4));

    assert_eq!(s1.threads, 1);
    assert_eq!(s4.threads, 4);
    assert_eq!(s4.band_loads.iter().sum::<i64>(), s4.load_total);
    for (a, b) in one.iter().zip(&four) {
        assert!((a - b).abs() <= 1e-6);
    }
}

#[test]
fn workers_are_capped_by_rows() {
    let params = small_params();
    let src = vec![0.4f32; 3 * 10];
    let (_, stats) = render_with(&src, 10, 3, &params, SimdLevel::Scalar, &Bands(8));
    assert_eq!(stats.threads, 3);
    assert!(stats.band_rows.iter().all(|r| r[0] < r[1]));
}

#[test]
fn vector_paths_match_scalar() {
    let params = GrainParams { dev: 0.3, ..small_params() };
    let src = gradient(11, 7);
    let (scalar, _) = render_with(&src, 11, 7, &params, SimdLevel::Scalar, &SyncDispatcher);
    for level in [SimdLevel::Vector4, SimdLevel::Vector8] {
        let (out, stats) = render_with(&src, 11, 7, &params, level, &SyncDispatcher);
        assert_eq!(stats.simd, level.name());
        for (a, b) in scalar.iter().zip(&out) {
            assert!((a - b).abs() <= 1e-6, "{:?}: {} vs {}", level, a, b);
        }
    }
}

#[test]
fn brighter_input_gives_more_grain() {
    let params = small_params();
    let means: Vec<f32> = [0.0f32, 0.2, 0.5, 0.8]
        .iter()
        .map(|&lum| {
            let src = vec![lum; 16 * 16];
            mean(&render_with(&src, 16, 16, &params, SimdLevel::Scalar, &SyncDispatcher).0)
        })
        .collect();
    assert_eq!(means[0], 0.0);
    assert!(means.windows(2).all(|w| w[0] < w[1]), "{:?}", means);
}

#[test]
fn draft_frames_skip_pass_two() {
    let params = GrainParams { draft: true, ..small_params() };
    let src = gradient(9, 9);
    let (out, stats) = render_with(&src, 9, 9, &params, SimdLevel::Vector4, &Bands(3));

    assert!(stats.draft);
    assert!(stats.band_loads.is_empty());
    assert_eq!(stats.cache.cells_built, 0);
    assert_eq!(stats.pass2_ms, 0.0);
    // every sample was written by pass 1
    assert!(out.iter().all(|v| (0.0..=1.0).contains(v)));
    assert_eq!(out[0], 0.0);
}

#[test]
fn full_frames_use_the_cell_cache() {
    let params = small_params();
    let src = vec![0.6f32; 64];
    let (_, stats) = render_with(&src, 8, 8, &params, SimdLevel::Scalar, &Bands(2));
    assert!(stats.cache.cells_built > 0);
    assert!(stats.cache.hits > stats.cache.cells_built);
}

#[test]
fn manual_stepping_matches_render() {
    let params = small_params();
    let k = kernel(&params);
    let src = gradient(10, 6);
    let src_plane = PlaneRef::packed(&src, 10, 6);

    let mut manual = vec![0.0f32; 60];
    let mut dst = PlaneMut::packed(&mut manual, 10, 6);
    let mut synth = GrainSynthesizer::new(SimdLevel::Scalar);
    let threads = synth.begin(10, 6, Arc::clone(&k), 99, false, 2);
    for idx in 0..threads {
        synth.run_pass1(idx, src_plane, &mut dst);
    }
    synth.prepare_rebalance();
    for idx in (0..threads).rev() {
        synth.run_pass2(idx, &mut dst);
    }
    synth.finish();

    let mut rendered = vec![0.0f32; 60];
    synthesize(
        &mut PlaneMut::packed(&mut rendered, 10, 6),
        src_plane,
        &k,
        99,
        false,
        CpuCaps::none(),
    );
    assert_eq!(manual, rendered);
}

#[test]
fn synthesizer_is_reusable_across_sizes() {
    let params = small_params();
    let mut synth = GrainSynthesizer::new(SimdLevel::Scalar);
    for (w, h) in [(8usize, 8usize), (3, 5), (12, 2)] {
        let src = vec![0.5f32; w * h];
        let mut out = vec![0.0f32; w * h];
        let stats = synth.render(
            &mut PlaneMut::packed(&mut out, w, h),
            PlaneRef::packed(&src, w, h),
            &kernel(&params),
            1,
            false,
            &Bands(2),
        );
        assert_eq!(stats.band_rows.last().map(|r| r[1]), Some(h));
    }
}

#[test]
#[should_panic(expected = "pass 1 incomplete")]
fn rebalance_requires_every_pass1_item() {
    let params = small_params();
    let src = vec![0.5f32; 32];
    let mut out = vec![0.0f32; 32];
    let mut dst = PlaneMut::packed(&mut out, 8, 4);
    let mut synth = GrainSynthesizer::new(SimdLevel::Scalar);
    synth.begin(8, 4, kernel(&params), 0, false, 2);
    synth.run_pass1(0, PlaneRef::packed(&src, 8, 4), &mut dst);
    synth.prepare_rebalance();
}

#[test]
#[should_panic(expected = "pass 1 band 0 already processed")]
fn pass1_band_cannot_run_twice() {
    let params = small_params();
    let src = vec![0.9f32; 32];
    let mut out = vec![0.0f32; 32];
    let mut dst = PlaneMut::packed(&mut out, 8, 4);
    let mut synth = GrainSynthesizer::new(SimdLevel::Scalar);
    synth.begin(8, 4, kernel(&params), 0, false, 2);
    synth.run_pass1(0, PlaneRef::packed(&src, 8, 4), &mut dst);
    // would otherwise count as the second band
    synth.run_pass1(0, PlaneRef::packed(&src, 8, 4), &mut dst);
}

#[test]
#[should_panic(expected = "pass 2 band 1 already processed")]
fn pass2_band_cannot_run_twice() {
    let params = small_params();
    let src = vec![0.5f32; 32];
    let mut out = vec![0.0f32; 32];
    let mut dst = PlaneMut::packed(&mut out, 8, 4);
    let mut synth = GrainSynthesizer::new(SimdLevel::Scalar);
    synth.begin(8, 4, kernel(&params), 0, false, 2);
    synth.run_pass1(0, PlaneRef::packed(&src, 8, 4), &mut dst);
    synth.run_pass1(1, PlaneRef::packed(&src, 8, 4), &mut dst);
    synth.prepare_rebalance();
    synth.run_pass2(1, &mut dst);
    synth.run_pass2(1, &mut dst);
}

#[test]
#[should_panic(expected = "pass 2 incomplete")]
fn full_frame_cannot_finish_without_pass2() {
    let params = small_params();
    let src = vec![0.5f32; 4];
    let mut out = vec![-1.0f32; 4];
    let mut dst = PlaneMut::packed(&mut out, 4, 1);
    let mut synth = GrainSynthesizer::new(SimdLevel::Scalar);
    synth.begin(4, 1, kernel(&params), 0, false, 1);
    synth.run_pass1(0, PlaneRef::packed(&src, 4, 1), &mut dst);
    synth.prepare_rebalance();
    synth.finish();
}

#[test]
#[should_panic(expected = "pass 2 incomplete")]
fn full_frame_cannot_finish_with_a_band_missing() {
    let params = small_params();
    let src = vec![0.5f32; 32];
    let mut out = vec![0.0f32; 32];
    let mut dst = PlaneMut::packed(&mut out, 8, 4);
    let mut synth = GrainSynthesizer::new(SimdLevel::Scalar);
    synth.begin(8, 4, kernel(&params), 0, false, 2);
    synth.run_pass1(0, PlaneRef::packed(&src, 8, 4), &mut dst);
    synth.run_pass1(1, PlaneRef::packed(&src, 8, 4), &mut dst);
    synth.prepare_rebalance();
    synth.run_pass2(0, &mut dst);
    synth.finish();
}

#[test]
#[should_panic(expected = "pass 1 incomplete")]
fn draft_frame_cannot_finish_with_a_band_missing() {
    let params = small_params();
    let src = vec![0.5f32; 32];
    let mut out = vec![0.0f32; 32];
    let mut dst = PlaneMut::packed(&mut out, 8, 4);
    let mut synth = GrainSynthesizer::new(SimdLevel::Scalar);
    synth.begin(8, 4, kernel(&params), 0, true, 2);
    synth.run_pass1(1, PlaneRef::packed(&src, 8, 4), &mut dst);
    synth.finish();
}

#[test]
fn band_flags_reset_on_each_frame() {
    let params = small_params();
    let src = vec![0.5f32; 32];
    let mut out = vec![0.0f32; 32];
    let mut synth = GrainSynthesizer::new(SimdLevel::Scalar);
    for _ in 0..2 {
        let mut dst = PlaneMut::packed(&mut out, 8, 4);
        synth.begin(8, 4, kernel(&params), 0, false, 2);
        for idx in 0..2 {
            synth.run_pass1(idx, PlaneRef::packed(&src, 8, 4), &mut dst);
        }
        synth.prepare_rebalance();
        for idx in 0..2 {
            synth.run_pass2(idx, &mut dst);
        }
        synth.finish();
    }
}

#[test]
#[should_panic(expected = "pass 2 requested before rebalancing")]
fn pass2_requires_rebalancing() {
    let params = small_params();
    let mut out = vec![0.0f32; 16];
    let mut dst = PlaneMut::packed(&mut out, 4, 4);
    let mut synth = GrainSynthesizer::new(SimdLevel::Scalar);
    synth.begin(4, 4, kernel(&params), 0, false, 1);
    synth.run_pass2(0, &mut dst);
}

#[test]
#[should_panic(expected = "finish called in phase")]
fn full_frame_cannot_finish_after_pass1() {
    let params = small_params();
    let mut synth = GrainSynthesizer::new(SimdLevel::Scalar);
    synth.begin(4, 4, kernel(&params), 0, false, 1);
    synth.finish();
}

#[test]
#[should_panic(expected = "destination plane size mismatch")]
fn plane_sizes_must_match_the_frame() {
    let params = small_params();
    let src = vec![0.5f32; 16];
    let mut out = vec![0.0f32; 20];
    let mut synth = GrainSynthesizer::new(SimdLevel::Scalar);
    synth.begin(4, 4, kernel(&params), 0, false, 1);
    synth.run_pass1(0, PlaneRef::packed(&src, 4, 4), &mut PlaneMut::packed(&mut out, 5, 4));
}

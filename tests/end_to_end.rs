//! End-to-end reduction scenarios over synthetic star fields.

use std::sync::Arc;
use std::time::Duration;

use approx::assert_relative_eq;
use ndarray::Array2;

use destar::test_patterns::{add_disk, synthetic_star_field};
use destar::{
    run_classical, run_separation, DetectionError, FrameMeta, PlateSolveClient, RawFrame,
    ReductionParams, RemoteDetector, SeparationPair, SolvedSource, StarDetector,
    StatisticalDetector,
};

fn noisy_field_with_one_star() -> RawFrame {
    // ~4 pixel FWHM corresponds to a Gaussian sigma of about 1.7
    let image = synthetic_star_field(100, 100, &[(50.0, 50.0, 0.8)], 1.7, 0.05, 1234);
    RawFrame::mono(image)
}

#[test]
fn single_injected_star_is_found_and_reduced() {
    let frame = noisy_field_with_one_star();
    let gray = frame.data.normalized().to_grayscale();

    let params = ReductionParams::default();
    let result = run_classical(&frame, &params, &StatisticalDetector::new()).unwrap();

    assert_eq!(result.star_count, 1);
    // the star core is dimmed, the far background untouched
    assert!(result.composite[[50, 50]] < gray[[50, 50]]);
    assert_relative_eq!(result.composite[[5, 5]], gray[[5, 5]], epsilon = 1e-6);
}

#[test]
fn injected_star_centroid_is_within_one_pixel() {
    let frame = noisy_field_with_one_star();
    let gray = frame.data.normalized().to_grayscale();

    let stars = StatisticalDetector::new()
        .detect(&gray.view(), &frame.meta, &ReductionParams::default())
        .unwrap();

    assert_eq!(stars.len(), 1);
    assert!((stars[0].x - 50.0).abs() < 1.0);
    assert!((stars[0].y - 50.0).abs() < 1.0);
}

#[test]
fn unreachable_threshold_yields_zero_stars_and_an_unchanged_composite() {
    let frame = noisy_field_with_one_star();
    let gray = frame.data.normalized().to_grayscale();

    let params = ReductionParams {
        detection_threshold: 1.0e5,
        ..ReductionParams::default()
    };
    let result = run_classical(&frame, &params, &StatisticalDetector::new()).unwrap();

    assert_eq!(result.star_count, 0);
    assert_eq!(result.composite, gray);
}

#[test]
fn separation_with_full_attenuation_removes_the_disk_everywhere() {
    let starless = Array2::<f32>::zeros((80, 80));
    let mut staronly = Array2::<f32>::zeros((80, 80));
    add_disk(&mut staronly, 40, 40, 5, 0.9);
    let pair = SeparationPair::new(starless, staronly).unwrap();

    let params = ReductionParams {
        attenuation_alpha: 1.0,
        staronly_threshold: 0.02,
        ..ReductionParams::default()
    };
    let result = run_separation(&pair, &params).unwrap();

    // disk pixels are zeroed, everything else was already zero
    assert!(result.composite.iter().all(|&v| v.abs() < 1e-5));
}

#[test]
fn comparison_difference_is_non_negative_and_localized() {
    let mut starless = Array2::<f32>::zeros((60, 60));
    starless.fill(0.1);
    let mut staronly = Array2::<f32>::zeros((60, 60));
    staronly[[30, 30]] = 0.8;
    let pair = SeparationPair::new(starless, staronly).unwrap();

    let params = ReductionParams {
        attenuation_alpha: 0.7,
        ..ReductionParams::default()
    };
    let result = run_separation(&pair, &params).unwrap();

    let diff = &result.comparison.difference;
    assert!(diff.iter().all(|&v| v >= 0.0));
    // the background far from the star is untouched
    assert_eq!(diff[[5, 5]], 0.0);
    // the star itself was reduced
    assert!(diff[[30, 30]] > 0.0);
}

#[test]
fn maximum_blur_kernel_handles_a_tiny_frame() {
    // Largest validated kernel against a frame much smaller than its span
    let frame = RawFrame::mono(synthetic_star_field(8, 8, &[(4.0, 4.0, 0.8)], 1.5, 0.02, 21));
    let params = ReductionParams {
        gaussian_kernel: 31,
        ..ReductionParams::default()
    };
    let result = run_classical(&frame, &params, &StatisticalDetector::new()).unwrap();
    assert_eq!(result.composite.dim(), (8, 8));

    let starless = Array2::<f32>::zeros((8, 8));
    let mut staronly = Array2::<f32>::zeros((8, 8));
    add_disk(&mut staronly, 4, 4, 2, 0.9);
    let pair = SeparationPair::new(starless, staronly).unwrap();
    let result = run_separation(&pair, &params).unwrap();
    assert_eq!(result.composite.dim(), (8, 8));
}

#[test]
fn maximum_fwhm_handles_a_small_frame() {
    // fwhm 50 builds a matched kernel far wider than a 16x16 frame
    let frame = RawFrame::mono(synthetic_star_field(16, 16, &[(8.0, 8.0, 0.8)], 1.5, 0.02, 22));
    let params = ReductionParams {
        fwhm: 50.0,
        ..ReductionParams::default()
    };
    let result = run_classical(&frame, &params, &StatisticalDetector::new()).unwrap();
    assert_eq!(result.composite.dim(), (16, 16));
}

struct ScriptedSolver {
    sources: Vec<SolvedSource>,
}

impl PlateSolveClient for ScriptedSolver {
    fn solve(
        &self,
        _image: &Array2<f32>,
        _hints: &FrameMeta,
    ) -> Result<Vec<SolvedSource>, DetectionError> {
        Ok(self.sources.clone())
    }
}

#[test]
fn classical_pipeline_accepts_a_remote_catalog() {
    let frame = noisy_field_with_one_star();
    let gray = frame.data.normalized().to_grayscale();

    let solver = Arc::new(ScriptedSolver {
        sources: vec![SolvedSource {
            x: 50.0,
            y: 50.0,
            flux: 1.0,
        }],
    });
    let detector = RemoteDetector::new(solver, Duration::from_secs(1));

    let result = run_classical(&frame, &ReductionParams::default(), &detector).unwrap();
    assert_eq!(result.star_count, 1);
    assert!(result.composite[[50, 50]] < gray[[50, 50]]);
}

#[test]
fn detectors_agree_on_the_star_count_of_a_clean_field() {
    let field = [(20.0, 20.0, 0.8), (20.0, 70.0, 0.7), (70.0, 45.0, 0.9)];
    let frame = RawFrame::mono(synthetic_star_field(100, 100, &field, 1.7, 0.02, 77));
    let gray = frame.data.normalized().to_grayscale();
    let params = ReductionParams::default();

    let local = StatisticalDetector::new()
        .detect(&gray.view(), &frame.meta, &params)
        .unwrap();
    assert_eq!(local.len(), 3);

    let result = run_classical(&frame, &params, &StatisticalDetector::new()).unwrap();
    assert_eq!(result.star_count, local.len());
}

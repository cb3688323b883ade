use std::collections::BTreeMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use surveyforge_core::{CorrelationMatrix, Error};
use surveyforge_generate::{
    CategoricalSampler, LatentSampler, RegressionModel, likert_item, uniform_correlation_matrix,
};
use surveyforge_plan::{CategoricalVarSpec, LikertScale, RegressionSpec};

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let (mx, my) = (mean(x), mean(y));
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx) * (a - mx);
        syy += (b - my) * (b - my);
    }
    sxy / (sxx.sqrt() * syy.sqrt())
}

#[test]
fn empirical_inter_item_correlation_tracks_target() {
    for (seed, r) in [(7_u64, 0.0), (11, 0.3), (13, 0.5), (17, 0.8)] {
        let matrix = uniform_correlation_matrix(4, r).expect("valid matrix");
        let sampler = LatentSampler::new(&matrix);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let latent = sampler.sample(50_000, &mut rng);

        for i in 0..4 {
            for j in (i + 1)..4 {
                let observed = pearson(&latent.column(i), &latent.column(j));
                assert!(
                    (observed - r).abs() < 0.05,
                    "pair ({i}, {j}) at r = {r}: observed {observed}"
                );
            }
        }
    }
}

#[test]
fn sampler_honors_mean_vector() {
    let matrix = CorrelationMatrix::identity(2);
    let sampler = LatentSampler::with_mean(vec![2.0, -1.0], &matrix).expect("mean fits");
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let latent = sampler.sample(20_000, &mut rng);

    assert!((mean(&latent.column(0)) - 2.0).abs() < 0.05);
    assert!((mean(&latent.column(1)) + 1.0).abs() < 0.05);
}

#[test]
fn sampler_rejects_mean_of_wrong_length() {
    let matrix = CorrelationMatrix::identity(3);
    let err = LatentSampler::with_mean(vec![0.0; 2], &matrix).expect_err("length mismatch");
    assert!(matches!(
        err,
        Error::MismatchedLength {
            expected: 3,
            found: 2,
            ..
        }
    ));
}

#[test]
fn likert_cells_stay_in_range_for_both_scales() {
    let latent = vec![
        -1e6,
        -8.0,
        -3.0,
        -0.5,
        0.0,
        0.5,
        3.0,
        8.0,
        1e6,
        f64::INFINITY,
        f64::NEG_INFINITY,
    ];
    for scale in [LikertScale::FIVE, LikertScale::SEVEN] {
        let points = i64::from(scale.points());
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let responses = likert_item(&latent, 0.3, scale, &mut rng).expect("valid jitter");

        assert_eq!(responses.len(), latent.len());
        assert!(responses.iter().all(|value| (1..=points).contains(value)));
        assert_eq!(responses[0], 1);
        assert_eq!(responses[8], points);
    }
}

#[test]
fn zero_noise_regression_is_the_exact_linear_combination() {
    let matrix = CorrelationMatrix::from_rows(
        "/latent/matrix",
        &[
            vec![1.0, 0.2, 0.0],
            vec![0.2, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ],
    )
    .expect("valid matrix");
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let latent = LatentSampler::new(&matrix).sample(1_000, &mut rng);

    let spec = RegressionSpec {
        dependent_variable: "Y".to_string(),
        coefficients: BTreeMap::from([("X1".to_string(), 0.5), ("X2".to_string(), -0.25)]),
        noise_std: 0.0,
        intercept: 1.0,
    };
    let model = RegressionModel::resolve(&["X1", "X2", "Y"], &spec).expect("valid regression");
    let derived = model.apply(&latent, &mut rng).expect("apply");

    for row in 0..derived.rows() {
        let expected = 1.0 + 0.5 * latent.get(row, 0) - 0.25 * latent.get(row, 1);
        assert!((derived.get(row, 2) - expected).abs() < 1e-12);
        assert_eq!(derived.get(row, 0), latent.get(row, 0));
        assert_eq!(derived.get(row, 1), latent.get(row, 1));
    }
}

#[test]
fn regression_dominates_the_latent_covariance() {
    let matrix = CorrelationMatrix::from_rows(
        "/latent/matrix",
        &[vec![1.0, 0.1], vec![0.1, 1.0]],
    )
    .expect("valid matrix");
    let mut rng = ChaCha8Rng::seed_from_u64(21);
    let latent = LatentSampler::new(&matrix).sample(5_000, &mut rng);

    let spec = RegressionSpec {
        dependent_variable: "Y".to_string(),
        coefficients: BTreeMap::from([("X".to_string(), 0.9)]),
        noise_std: 0.1,
        intercept: 0.0,
    };
    let model = RegressionModel::resolve(&["X", "Y"], &spec).expect("valid regression");
    let derived = model.apply(&latent, &mut rng).expect("apply");

    let raw = pearson(&latent.column(0), &latent.column(1));
    let explained = pearson(&derived.column(0), &derived.column(1));
    assert!(raw < 0.2, "raw latent correlation {raw}");
    assert!(explained > 0.95, "regression correlation {explained}");
}

#[test]
fn categorical_frequencies_match_probabilities() {
    let spec = CategoricalVarSpec::new("Level", &["low", "mid", "high"], &[0.2, 0.5, 0.3]);
    let sampler = CategoricalSampler::new(&spec, "/categorical/0").expect("valid spec");
    let mut rng = ChaCha8Rng::seed_from_u64(1234);
    let labels = sampler.sample(100_000, &mut rng);

    for (label, expected) in [("low", 0.2), ("mid", 0.5), ("high", 0.3)] {
        let observed =
            labels.iter().filter(|value| value.as_str() == label).count() as f64 / 100_000.0;
        assert!(
            (observed - expected).abs() < 0.02,
            "{label}: observed {observed}, expected {expected}"
        );
    }
}

#[test]
fn categorical_sampler_rejects_probabilities_that_do_not_sum_to_one() {
    let spec = CategoricalVarSpec::new("Group", &["A", "B"], &[0.5, 0.6]);
    let err = CategoricalSampler::new(&spec, "/categorical/0").expect_err("must fail");
    assert!(matches!(err, Error::InvalidProbability { .. }));
    assert_eq!(err.parameter(), Some("/categorical/0/probabilities"));
}

#[test]
fn categorical_sampler_rejects_length_mismatch() {
    let spec = CategoricalVarSpec::new("Group", &["A", "B", "C"], &[0.5, 0.5]);
    let err = CategoricalSampler::new(&spec, "/categorical/0").expect_err("must fail");
    assert!(matches!(
        err,
        Error::MismatchedLength {
            expected: 3,
            found: 2,
            ..
        }
    ));
}

//! One reconstruction, start to finish: model lookup, normalization, solve,
//! de-normalization and rendering

use std::time::{Duration, Instant, SystemTime};

use ndarray::ArrayView1;
use log::info;

#[cfg(not(feature = "serial"))]
use rayon::prelude::*;

use crate::error::{ReconstructionError, Result};
use crate::image::Grid;
use crate::model::ModelStore;
use crate::normalize::{denormalize, normalize};
use crate::resources::{ResourceSampler, ResourceUsage, UsageSource};
use crate::solver::{Algorithm, Solution, Stop, System};
use crate::types::{Intensity, Vector};

#[derive(Debug, Clone)]
pub struct ReconstructionResult {
    pub algorithm : Algorithm,
    pub iterations: usize,
    pub stop      : Stop,
    pub image     : Grid,
    pub started   : SystemTime,
    pub finished  : SystemTime,
    pub elapsed   : Duration,
    /// Filled in by the caller, never by `reconstruct`
    pub resources : Option<ResourceUsage>,
}

impl ReconstructionResult {

    pub fn side(&self) -> usize { self.image.side() }

    /// `"{side}x{side}"`
    pub fn pixel_size(&self) -> String { self.image.size_label() }

    pub fn seconds(&self) -> f64 { self.elapsed.as_secs_f64() }

    pub fn with_resources(self, usage: ResourceUsage) -> Self {
        Self { resources: Some(usage), ..self }
    }
}

/// Reconstruct the image measured as `signal` by the model stored under `model_key`.
pub fn reconstruct(
    store     : &ModelStore,
    model_key : &str,
    signal    : ArrayView1<Intensity>,
    algorithm : &str,
) -> Result<ReconstructionResult> {
    let started = SystemTime::now();
    let timer = Instant::now();

    let model = store.get(model_key)?;
    if signal.len() != model.rows() {
        return Err(ReconstructionError::DimensionMismatch {
            model: model_key.into(), expected: model.rows(), actual: signal.len(),
        })
    }
    let algorithm: Algorithm = algorithm.parse()?;

    let (g, g_stats) = normalize(&signal.to_owned());
    let Solution { f, iterations, stop } = algorithm.solve(System::from(model), g.view());
    let f = denormalize(f, model.stats, g_stats);
    let image = Grid::render(f.view())?;

    let elapsed = timer.elapsed();
    let finished = SystemTime::now();
    info!("{algorithm} on `{model_key}`: {iterations} iterations ({stop:?}) in {} ms",
          elapsed.as_millis());

    Ok(ReconstructionResult {
        algorithm, iterations, stop, image, started, finished, elapsed, resources: None,
    })
}

/// One entry in a batch of reconstructions
#[derive(Debug, Clone)]
pub struct Request {
    pub model    : String,
    pub signal   : Vector,
    pub algorithm: String,
}

/// Run all `requests` against the same store, concurrently unless the `serial`
/// feature is enabled. Results are returned in the order of the requests.
pub fn reconstruct_batch(store: &ModelStore, requests: &[Request]) -> Vec<Result<ReconstructionResult>> {
    #[cfg    (feature = "serial") ] let iter = requests.    iter();
    #[cfg(not(feature = "serial"))] let iter = requests.par_iter();
    iter
        .map(|Request { model, signal, algorithm }| reconstruct(store, model, signal.view(), algorithm))
        .collect()
}

/// As `reconstruct_batch`, with the load measured over the whole batch by
/// one sample of `sampler`, attached to every successful result.
pub fn reconstruct_batch_sampled<S: UsageSource>(
    store   : &ModelStore,
    requests: &[Request],
    sampler : &ResourceSampler<S>,
) -> Vec<Result<ReconstructionResult>> {
    let results = reconstruct_batch(store, requests);
    let usage = sampler.sample();
    results.into_iter()
        .map(|result| result.map(|r| r.with_resources(usage)))
        .collect()
}


#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};
    use rstest::rstest;
    use crate::normalize::Stats;

    fn store() -> ModelStore {
        ModelStore::from_raw(vec![
            ("4x4".into(), array![[4.0, 1.0, 0.0, 0.0],
                                  [1.0, 3.0, 1.0, 0.0],
                                  [0.0, 1.0, 2.0, 1.0],
                                  [0.0, 0.0, 1.0, 5.0],
                                  [2.0, 0.0, 0.0, 1.0]]),
            ("2x2".into(), array![[2.0, 0.0], [0.0, 2.0]]),
        ])
    }

    fn signal() -> Vector { array![6.0, 10.0, 12.0, 23.0, 6.0] }

    #[test]
    fn pipeline_composes_its_stages() {
        let store = store();
        let result = reconstruct(&store, "4x4", signal().view(), "cgnr").unwrap();

        let model = store.get("4x4").unwrap();
        let (g, g_stats) = normalize(&signal());
        let solution = Algorithm::Cgnr.solve(System::from(model), g.view());
        let f = denormalize(solution.f, model.stats, g_stats);
        let expected = Grid::render(f.view()).unwrap();

        assert_eq!(result.algorithm, Algorithm::Cgnr);
        assert_eq!(result.iterations, solution.iterations);
        assert_eq!(result.image, expected);
        assert_eq!(result.side(), 2);
        assert_eq!(result.pixel_size(), "2x2");
        assert!(result.finished >= result.started);
        assert!(result.resources.is_none());
    }

    #[rstest(algorithm, case("CGNE"), case("cgne"), case("Cgnr"))]
    fn any_case_is_accepted(algorithm: &str) {
        let result = reconstruct(&store(), "4x4", signal().view(), algorithm).unwrap();
        assert!((1..=crate::types::MAX_ITERATIONS).contains(&result.iterations));
        assert_eq!(result.image.data.iter().copied().max(), Some(255));
    }

    // A constant signal has no information once normalized: black image
    #[test]
    fn constant_signal() {
        let result = reconstruct(&store(), "2x2", array![4.0, 4.0].view(), "CGNE").unwrap();
        assert_eq!(result.iterations, 1);
        assert_eq!(result.stop, Stop::Degenerate);
        assert_eq!(result.side(), 1);
        assert_eq!(result.image.data, Array2::<u8>::zeros((1, 1)));
    }

    #[test]
    fn model_not_found() {
        let err = reconstruct(&store(), "60x60", signal().view(), "cgne").unwrap_err();
        assert_eq!(err, ReconstructionError::ModelNotFound { key: "60x60".into() });
    }

    #[test]
    fn unknown_algorithm() {
        let err = reconstruct(&store(), "4x4", signal().view(), "sirt").unwrap_err();
        assert_eq!(err, ReconstructionError::UnknownAlgorithm { name: "sirt".into() });
    }

    #[rstest(len, case(0), case(4), case(6))]
    fn dimension_mismatch(len: usize) {
        let err = reconstruct(&store(), "4x4", Vector::ones(len).view(), "cgne").unwrap_err();
        assert_eq!(err, ReconstructionError::DimensionMismatch { model: "4x4".into(), expected: 5, actual: len });
    }

    #[test]
    fn missing_model_reported_before_other_problems() {
        let err = reconstruct(&store(), "nope", Vector::ones(1).view(), "nope").unwrap_err();
        assert!(matches!(err, ReconstructionError::ModelNotFound { .. }));
        let err = reconstruct(&store(), "4x4", Vector::ones(1).view(), "nope").unwrap_err();
        assert!(matches!(err, ReconstructionError::DimensionMismatch { .. }));
    }

    #[test]
    fn resources_are_attached_by_caller() {
        let usage = ResourceUsage { cpu_percent: 12.5, memory_percent: 40.0 };
        let result = reconstruct(&store(), "4x4", signal().view(), "cgne").unwrap()
            .with_resources(usage);
        assert_eq!(result.resources, Some(usage));
    }

    #[test]
    fn model_statistics_are_not_modified() {
        let store = store();
        let before: Stats = store.get("4x4").unwrap().stats;
        let h_before = store.get("4x4").unwrap().h.clone();
        let _ = reconstruct_batch(&store, &vec![
            Request { model: "4x4".into(), signal: signal(), algorithm: "cgne".into() }; 8
        ]);
        assert_eq!(store.get("4x4").unwrap().stats, before);
        assert_eq!(store.get("4x4").unwrap().h, h_before);
    }

    /// Reports one more percent of CPU on every refresh
    struct Counting(f64);

    impl UsageSource for Counting {
        fn cpu_percent   (&mut self) -> f64 { self.0 += 1.0; self.0 }
        fn memory_percent(&mut self) -> f64 { 30.0 }
    }

    #[test]
    fn one_sample_covers_the_whole_batch() {
        let sampler = ResourceSampler::new(Counting(0.0));
        let requests = vec![
            Request { model: "4x4".into(), signal: signal(), algorithm: "cgne".into() },
            Request { model: "xx" .into(), signal: signal(), algorithm: "cgne".into() },
            Request { model: "4x4".into(), signal: signal(), algorithm: "cgnr".into() },
            Request { model: "4x4".into(), signal: signal(), algorithm: "cgnr".into() },
        ];
        let results = reconstruct_batch_sampled(&store(), &requests, &sampler);
        // Refresh 1 is the baseline taken at construction, refresh 2 follows the batch
        let expected = Some(ResourceUsage { cpu_percent: 2.0, memory_percent: 30.0 });
        for i in [0, 2, 3] {
            assert_eq!(results[i].as_ref().unwrap().resources, expected);
        }
        assert!(results[1].is_err());
        assert_eq!(sampler.sample().cpu_percent, 3.0);
    }

    #[test]
    fn batch_preserves_order() {
        let requests = vec![
            Request { model: "4x4".into(), signal: signal()     , algorithm: "cgne".into() },
            Request { model: "2x2".into(), signal: signal()     , algorithm: "cgne".into() },
            Request { model: "4x4".into(), signal: signal()     , algorithm: "cgnr".into() },
            Request { model: "xx" .into(), signal: signal()     , algorithm: "cgnr".into() },
        ];
        let results = reconstruct_batch(&store(), &requests);
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].as_ref().unwrap().algorithm, Algorithm::Cgne);
        assert!(matches!(results[1], Err(ReconstructionError::DimensionMismatch { .. })));
        assert_eq!(results[2].as_ref().unwrap().algorithm, Algorithm::Cgnr);
        assert!(matches!(results[3], Err(ReconstructionError::ModelNotFound { .. })));
    }
}

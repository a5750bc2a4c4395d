//! Synthetic "predicted yield" series.
//!
//! Each predicted value is the bar midpoint `(high + low) / 2` plus a uniform
//! draw from the series' noise bound. Randomness comes through [`NoiseSource`]
//! so production runs stay unseeded while tests can pin the draws.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Uniform;
use tracing::debug;

use crate::domain::{Dataset, NamedSeries, NoiseBound};
use crate::error::AppError;

/// Source of per-record noise samples.
pub trait NoiseSource {
    /// One draw from `dist`, built once per bound by [`synthesize`].
    fn sample(&mut self, dist: &Uniform<f64>) -> f64;
}

/// Uniform draws from a `rand` generator.
#[derive(Debug, Clone)]
pub struct UniformNoise<R> {
    rng: R,
}

impl<R: Rng> UniformNoise<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl UniformNoise<StdRng> {
    /// Fresh OS entropy: every run draws different noise.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_seed_option(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }
}

impl<R: Rng> NoiseSource for UniformNoise<R> {
    fn sample(&mut self, dist: &Uniform<f64>) -> f64 {
        dist.sample(&mut self.rng)
    }
}

/// Always returns the same value, regardless of bound.
#[derive(Debug, Clone, Copy)]
pub struct FixedNoise(pub f64);

impl NoiseSource for FixedNoise {
    fn sample(&mut self, _dist: &Uniform<f64>) -> f64 {
        self.0
    }
}

/// Build one predicted series per bound, in bound order.
///
/// All draws for the first bound are taken before any for the second, so a
/// seeded run is reproducible as long as the bound list is unchanged.
pub fn synthesize<N: NoiseSource + ?Sized>(
    dataset: &Dataset,
    bounds: &[NoiseBound],
    noise: &mut N,
) -> Result<Vec<NamedSeries>, AppError> {
    for bound in bounds {
        bound.validate()?;
    }

    let out: Vec<NamedSeries> = bounds
        .iter()
        .map(|bound| {
            let dist = Uniform::new_inclusive(bound.low, bound.high);
            let values = dataset
                .records
                .iter()
                .map(|r| r.midpoint() + noise.sample(&dist))
                .collect();
            debug!(series = %bound.label, low = bound.low, high = bound.high, "synthesized");
            NamedSeries::new(bound.label.clone(), values)
        })
        .collect();

    Ok(out)
}

//! Seeded randomness for a simulation run.
//!
//! Every draw in a run comes from one `SmallRng` held by the context, so a run is reproducible
//! from its seed as long as the draws happen in the same order. The generator lives in a
//! `RefCell`, which lets feature code sample through a shared `&Context`.
use std::cell::{RefCell, RefMut};

use log::trace;
use rand::distr::uniform::{SampleRange, SampleUniform};
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::Poisson;

use crate::context::Context;
use crate::define_data_plugin;

/// A source of uniformly distributed indices.
///
/// Genotype mutation only needs this, so it can be driven by any generator.
pub trait RandomSource {
    /// Returns a uniform integer in `[0, bound)`. Panics if `bound` is zero.
    fn random_uniform(&mut self, bound: usize) -> usize;
}

impl<R: Rng + ?Sized> RandomSource for R {
    fn random_uniform(&mut self, bound: usize) -> usize {
        self.random_range(0..bound)
    }
}

struct RngData {
    seed: u64,
    rng: RefCell<Option<SmallRng>>,
}

define_data_plugin!(
    RngPlugin,
    RngData,
    RngData {
        seed: 0,
        rng: RefCell::new(None),
    }
);

fn get_rng(context: &Context) -> RefMut<SmallRng> {
    let data = context
        .get_data(RngPlugin)
        .expect("You must initialize the random number generator with a base seed");
    RefMut::map(data.rng.borrow_mut(), |rng| {
        rng.as_mut()
            .expect("You must initialize the random number generator with a base seed")
    })
}

pub trait ContextRandomExt {
    /// Seeds the generator. Calling it again restarts the stream.
    fn init_random(&mut self, seed: u64);

    /// The seed passed to `init_random`.
    fn get_random_seed(&self) -> u64;

    /// Applies `sampler` to the generator and returns its result.
    fn sample<T>(&self, sampler: impl FnOnce(&mut SmallRng) -> T) -> T;

    fn sample_distr<T>(&self, distribution: impl Distribution<T>) -> T;

    fn sample_range<S, T>(&self, range: S) -> T
    where
        S: SampleRange<T>,
        T: SampleUniform;

    fn sample_bool(&self, p: f64) -> bool;

    /// Uniform integer in `[0, bound)`.
    fn random_uniform(&self, bound: usize) -> usize;

    /// Uniform float in `[from, to)`.
    fn random_flat(&self, from: f64, to: f64) -> f64;

    /// Poisson draw with mean `lambda`. Non-positive means yield 0.
    fn random_poisson(&self, lambda: f64) -> u64;

    /// Index drawn with probability proportional to `weights`, or `None` if no weight is
    /// positive.
    fn sample_weighted(&self, weights: &[f64]) -> Option<usize>;

    fn shuffle<T>(&self, items: &mut [T]);
}

impl ContextRandomExt for Context {
    fn init_random(&mut self, seed: u64) {
        trace!("initializing random module with seed {seed}");
        let data = self.get_data_mut(RngPlugin);
        data.seed = seed;
        *data.rng.get_mut() = Some(SmallRng::seed_from_u64(seed));
    }

    fn get_random_seed(&self) -> u64 {
        self.get_data(RngPlugin).map_or(0, |data| data.seed)
    }

    fn sample<T>(&self, sampler: impl FnOnce(&mut SmallRng) -> T) -> T {
        let mut rng = get_rng(self);
        sampler(&mut rng)
    }

    fn sample_distr<T>(&self, distribution: impl Distribution<T>) -> T {
        let mut rng = get_rng(self);
        distribution.sample(&mut *rng)
    }

    fn sample_range<S, T>(&self, range: S) -> T
    where
        S: SampleRange<T>,
        T: SampleUniform,
    {
        self.sample(|rng| rng.random_range(range))
    }

    fn sample_bool(&self, p: f64) -> bool {
        self.sample(|rng| rng.random_bool(p))
    }

    fn random_uniform(&self, bound: usize) -> usize {
        self.sample(|rng| RandomSource::random_uniform(rng, bound))
    }

    fn random_flat(&self, from: f64, to: f64) -> f64 {
        self.sample(|rng| rng.random_range(from..to))
    }

    fn random_poisson(&self, lambda: f64) -> u64 {
        if lambda <= 0.0 {
            return 0;
        }
        let poisson = Poisson::new(lambda).expect("Poisson mean must be finite");
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let draw = self.sample_distr(poisson) as u64;
        draw
    }

    fn sample_weighted(&self, weights: &[f64]) -> Option<usize> {
        let index = WeightedIndex::new(weights).ok()?;
        Some(self.sample_distr(index))
    }

    fn shuffle<T>(&self, items: &mut [T]) {
        self.sample(|rng| items.shuffle(rng));
    }
}

//! Weight vector operators for the genetic algorithm.
//!
//! - **Initialization**: [`random`] draws every weight uniformly from `[-1, 1)`
//! - **Crossover**: [`uniform_crossover`] copies each weight from either parent
//!   with equal probability
//! - **Mutation**: [`Mutation::apply`] perturbs each weight independently with
//!   probability `rate` by a uniform delta in `[-range, range]`
//!
//! Crossover never interpolates: every child weight is bit-identical to one of
//! the parents' weights before mutation.

use rand::Rng;
use rand_distr::{Bernoulli, Distribution as _, Uniform};

/// Range of freshly drawn weights.
pub const INITIAL_RANGE: std::ops::Range<f32> = -1.0..1.0;

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum MutationParamError {
    #[display("mutation rate {rate} is not a probability")]
    Rate { rate: f64 },
    #[display("mutation range {range} must be finite and non-negative")]
    Range { range: f32 },
}

/// Creates a weight vector with every weight drawn from [`INITIAL_RANGE`].
///
/// # Examples
///
/// ```
/// use evotris_training::weights;
/// use rand::SeedableRng as _;
/// use rand_pcg::Pcg32;
///
/// let mut rng = Pcg32::seed_from_u64(0);
/// let weights = weights::random(&mut rng, 4);
/// assert_eq!(weights.len(), 4);
/// assert!(weights.iter().all(|w| (-1.0..1.0).contains(w)));
/// ```
pub fn random<R>(rng: &mut R, len: usize) -> Vec<f32>
where
    R: Rng + ?Sized,
{
    (0..len).map(|_| rng.random_range(INITIAL_RANGE)).collect()
}

/// Picks each weight from `p1` or `p2` with equal probability.
///
/// # Panics
///
/// Panics if the parents have different lengths.
pub fn uniform_crossover<R>(p1: &[f32], p2: &[f32], rng: &mut R) -> Vec<f32>
where
    R: Rng + ?Sized,
{
    assert_eq!(p1.len(), p2.len());
    p1.iter()
        .zip(p2)
        .map(|(&a, &b)| if rng.random_bool(0.5) { a } else { b })
        .collect()
}

/// Per-weight mutation operator.
#[derive(Debug, Clone, Copy)]
pub struct Mutation {
    rate: Bernoulli,
    delta: Uniform<f32>,
}

impl Mutation {
    /// # Arguments
    ///
    /// * `rate` - Probability of perturbing each weight
    /// * `range` - Largest absolute perturbation
    pub fn new(rate: f64, range: f32) -> Result<Self, MutationParamError> {
        let rate_dist = Bernoulli::new(rate).map_err(|_| MutationParamError::Rate { rate })?;
        if !range.is_finite() || range < 0.0 {
            return Err(MutationParamError::Range { range });
        }
        let delta = Uniform::new_inclusive(-range, range)
            .map_err(|_| MutationParamError::Range { range })?;
        Ok(Self {
            rate: rate_dist,
            delta,
        })
    }

    pub fn apply<R>(&self, weights: &mut [f32], rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        for w in weights {
            if self.rate.sample(rng) {
                *w += self.delta.sample(rng);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_crossover_never_interpolates() {
        let mut rng = Pcg32::seed_from_u64(1);
        let p1 = [1.0, 1.0, 1.0, 1.0];
        let p2 = [-1.0, -1.0, -1.0, -1.0];
        let mut seen = [false; 2];
        for _ in 0..50 {
            for w in uniform_crossover(&p1, &p2, &mut rng) {
                assert!(w.to_bits() == 1.0_f32.to_bits() || w.to_bits() == (-1.0_f32).to_bits());
                seen[usize::from(w > 0.0)] = true;
            }
        }
        assert_eq!(seen, [true, true]);
    }

    #[test]
    fn test_zero_rate_never_mutates() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mutation = Mutation::new(0.0, 0.1).unwrap();
        let original = [0.25_f32, -0.5, 0.75, -1.0];
        let mut weights = original;
        for _ in 0..100 {
            mutation.apply(&mut weights, &mut rng);
        }
        assert_eq!(weights.map(f32::to_bits), original.map(f32::to_bits));
    }

    #[test]
    fn test_mutation_stays_in_range() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mutation = Mutation::new(1.0, 0.1).unwrap();
        for _ in 0..100 {
            let mut weights = [0.0; 4];
            mutation.apply(&mut weights, &mut rng);
            assert!(weights.iter().all(|w| w.abs() <= 0.1));
        }
    }

    #[test]
    fn test_invalid_params() {
        assert_eq!(
            Mutation::new(1.5, 0.1).unwrap_err(),
            MutationParamError::Rate { rate: 1.5 }
        );
        assert_eq!(
            Mutation::new(0.5, -0.1).unwrap_err(),
            MutationParamError::Range { range: -0.1 }
        );
        assert!(Mutation::new(0.05, 0.0).is_ok());
    }
}

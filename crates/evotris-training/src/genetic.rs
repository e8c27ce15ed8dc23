//! Generational genetic algorithm over board evaluator weights.
//!
//! # Algorithm Overview
//!
//! A [`Population`] hands out its genomes one by one through
//! [`Population::next`]. Each genome plays exactly one game and the game's
//! final score is written back with [`Population::record_fitness`]. Once every
//! genome of a generation has been handed out, the next call to `next`
//! replaces the whole generation:
//!
//! 1. **Telemetry** - the mean fitness of the evaluated genomes becomes the
//!    last population score
//! 2. **Ranking** - genomes are sorted by fitness, best first (unevaluated
//!    genomes rank last)
//! 3. **Selection** - each parent index is `floor(u² · size)` for a uniform
//!    `u ∈ [0, 1)`, so parents come mostly from the top of the ranking
//! 4. **Crossover** - uniform pick per weight
//! 5. **Mutation** - per-weight uniform perturbation
//!
//! There is no elitism; the new generation consists of children only and has
//! the same size as the old one.
//!
//! # Example
//!
//! ```
//! use evotris_training::genetic::{GeneticParams, Population};
//! use rand::SeedableRng as _;
//! use rand_pcg::Pcg32;
//!
//! let mut rng = Pcg32::seed_from_u64(0);
//! let params = GeneticParams { population_size: 3, ..GeneticParams::default() };
//! let mut population = Population::random(params, &mut rng).unwrap();
//!
//! for score in [4.0, 1.0, 9.0] {
//!     let (id, _weights) = population.next(&mut rng);
//!     population.record_fitness(id, score).unwrap();
//! }
//! let (id, _weights) = population.next(&mut rng);
//! assert_eq!(id.generation, 1);
//! assert_eq!(population.telemetry().last_score, Some(14.0 / 3.0));
//! ```

use std::fmt;

use evotris_ai::Weights;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::weights::{self, Mutation, MutationParamError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticParams {
    /// Number of genomes per generation
    pub population_size: usize,
    /// Probability of perturbing each weight of a child
    pub mutation_rate: f64,
    /// Largest absolute perturbation of a mutated weight
    pub mutation_range: f32,
}

impl Default for GeneticParams {
    fn default() -> Self {
        Self {
            population_size: 50,
            mutation_rate: 0.05,
            mutation_range: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum GeneticParamsError {
    #[display("population must hold at least one genome")]
    EmptyPopulation,
    #[display("invalid mutation parameters")]
    Mutation(MutationParamError),
}

/// Identifies a dispensed genome within its generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenomeId {
    pub generation: usize,
    pub index: usize,
}

impl fmt::Display for GenomeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.generation, self.index)
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum FitnessError {
    #[display("genome {id} belongs to a retired generation (current {current})")]
    StaleGeneration { id: GenomeId, current: usize },
    #[display("genome {id} has not been dispensed")]
    NotDispensed { id: GenomeId },
    #[display("fitness of genome {id} is already recorded")]
    AlreadyRecorded { id: GenomeId },
    #[display("fitness {fitness} of genome {id} is not finite")]
    NotFinite { id: GenomeId, fitness: f32 },
}

/// A weight vector and its fitness, unset until its game ends.
#[derive(Debug, Clone, PartialEq)]
pub struct Genome {
    weights: Weights,
    fitness: Option<f32>,
}

impl Genome {
    #[must_use]
    pub fn new(weights: Weights) -> Self {
        Self {
            weights,
            fitness: None,
        }
    }

    pub fn random<R>(rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let mut array = [0.0; Weights::LEN];
        array.copy_from_slice(&weights::random(rng, Weights::LEN));
        Self::new(Weights::from_array(array))
    }

    /// Produces a child by uniform crossover followed by mutation.
    pub fn breed<R>(&self, other: &Self, mutation: &Mutation, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let mut child = [0.0; Weights::LEN];
        child.copy_from_slice(&weights::uniform_crossover(
            &self.weights.to_array(),
            &other.weights.to_array(),
            rng,
        ));
        mutation.apply(&mut child, rng);
        Self::new(Weights::from_array(child))
    }

    #[must_use]
    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    #[must_use]
    pub fn fitness(&self) -> Option<f32> {
        self.fitness
    }

    fn rank_key(&self) -> f32 {
        self.fitness.unwrap_or(f32::NEG_INFINITY)
    }
}

/// Read-only view of the population state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopulationTelemetry {
    pub generation: usize,
    /// Genomes handed out in the current generation
    pub dispensed: usize,
    pub evaluated: usize,
    pub size: usize,
    /// Mean fitness of the previous generation
    pub last_score: Option<f32>,
    /// Best fitness recorded in the current generation
    pub best_fitness: Option<f32>,
}

/// Fixed-size set of genomes evolved one generation at a time.
#[derive(Debug, Clone)]
pub struct Population {
    genomes: Vec<Genome>,
    mutation: Mutation,
    generation: usize,
    cursor: usize,
    last_score: Option<f32>,
}

impl Population {
    /// Creates a population with every weight drawn uniformly from `[-1, 1)`.
    pub fn random<R>(params: GeneticParams, rng: &mut R) -> Result<Self, GeneticParamsError>
    where
        R: Rng + ?Sized,
    {
        let genomes = (0..params.population_size)
            .map(|_| Genome::random(rng))
            .collect();
        Self::from_genomes(genomes, params)
    }

    /// Creates a population from explicit weight vectors; its size is the
    /// number of vectors.
    pub fn from_weights<I>(weights: I, params: GeneticParams) -> Result<Self, GeneticParamsError>
    where
        I: IntoIterator<Item = Weights>,
    {
        Self::from_genomes(weights.into_iter().map(Genome::new).collect(), params)
    }

    fn from_genomes(
        genomes: Vec<Genome>,
        params: GeneticParams,
    ) -> Result<Self, GeneticParamsError> {
        if genomes.is_empty() {
            return Err(GeneticParamsError::EmptyPopulation);
        }
        let mutation = Mutation::new(params.mutation_rate, params.mutation_range)
            .map_err(GeneticParamsError::Mutation)?;
        Ok(Self {
            genomes,
            mutation,
            generation: 0,
            cursor: 0,
            last_score: None,
        })
    }

    #[must_use]
    pub fn genomes(&self) -> &[Genome] {
        &self.genomes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.genomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.genomes.is_empty()
    }

    #[must_use]
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Returns `true` when every genome of the current generation has been
    /// handed out.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.cursor == self.genomes.len()
    }

    /// Hands out the next unused genome, replacing the generation first when
    /// it is exhausted.
    pub fn next<R>(&mut self, rng: &mut R) -> (GenomeId, Weights)
    where
        R: Rng + ?Sized,
    {
        if self.is_exhausted() {
            self.advance_generation(rng);
        }
        let id = GenomeId {
            generation: self.generation,
            index: self.cursor,
        };
        self.cursor += 1;
        (id, self.genomes[id.index].weights)
    }

    /// Writes the final score of a dispensed genome. Each genome accepts
    /// exactly one write.
    pub fn record_fitness(&mut self, id: GenomeId, fitness: f32) -> Result<(), FitnessError> {
        if id.generation != self.generation {
            return Err(FitnessError::StaleGeneration {
                id,
                current: self.generation,
            });
        }
        if id.index >= self.cursor {
            return Err(FitnessError::NotDispensed { id });
        }
        if !fitness.is_finite() {
            return Err(FitnessError::NotFinite { id, fitness });
        }
        let genome = &mut self.genomes[id.index];
        if genome.fitness.is_some() {
            return Err(FitnessError::AlreadyRecorded { id });
        }
        genome.fitness = Some(fitness);
        Ok(())
    }

    #[must_use]
    pub fn telemetry(&self) -> PopulationTelemetry {
        PopulationTelemetry {
            generation: self.generation,
            dispensed: self.cursor,
            evaluated: self.evaluated().count(),
            size: self.genomes.len(),
            last_score: self.last_score,
            best_fitness: self.evaluated().max_by(f32::total_cmp),
        }
    }

    fn evaluated(&self) -> impl Iterator<Item = f32> + '_ {
        self.genomes.iter().filter_map(Genome::fitness)
    }

    #[expect(clippy::cast_precision_loss)]
    fn mean_fitness(&self) -> f32 {
        let (total, count) = self
            .evaluated()
            .fold((0.0, 0_usize), |(total, count), f| (total + f, count + 1));
        if count == 0 {
            return 0.0;
        }
        total / count as f32
    }

    fn advance_generation<R>(&mut self, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        let mean = self.mean_fitness();
        let unevaluated = self.genomes.len() - self.evaluated().count();
        if unevaluated > 0 {
            log::debug!("{unevaluated} genomes of generation {} were never scored", self.generation);
        }
        log::info!("generation {} mean score {mean:.2}", self.generation);
        self.last_score = Some(mean);

        self.genomes
            .sort_by(|a, b| b.rank_key().total_cmp(&a.rank_key()));
        let next = (0..self.genomes.len())
            .map(|_| {
                let p1 = select_parent(&self.genomes, rng);
                let p2 = select_parent(&self.genomes, rng);
                p1.breed(p2, &self.mutation, rng)
            })
            .collect();
        self.genomes = next;
        self.generation += 1;
        self.cursor = 0;
    }
}

/// Picks `genomes[floor(u² · len)]`; `genomes` must be sorted best first.
fn select_parent<'a, R>(genomes: &'a [Genome], rng: &mut R) -> &'a Genome
where
    R: Rng + ?Sized,
{
    let u: f64 = rng.random();
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let index = (u * u * genomes.len() as f64) as usize;
    &genomes[index.min(genomes.len() - 1)]
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn params(population_size: usize) -> GeneticParams {
        GeneticParams {
            population_size,
            ..GeneticParams::default()
        }
    }

    fn play_generation(population: &mut Population, rng: &mut Pcg32) -> Vec<GenomeId> {
        (0..population.len())
            .map(|i| {
                let (id, _) = population.next(rng);
                #[expect(clippy::cast_precision_loss)]
                population.record_fitness(id, i as f32).unwrap();
                id
            })
            .collect()
    }

    #[test]
    fn test_breed_without_mutation_copies_parent_weights() {
        let mut rng = Pcg32::seed_from_u64(0);
        let mutation = Mutation::new(0.0, 0.1).unwrap();
        let a = Genome::new(Weights::splat(1.0));
        let b = Genome::new(Weights::splat(-1.0));
        for _ in 0..20 {
            let child = a.breed(&b, &mutation, &mut rng);
            for w in child.weights().to_array() {
                assert!(w.to_bits() == 1.0_f32.to_bits() || w.to_bits() == (-1.0_f32).to_bits());
            }
            assert_eq!(child.fitness(), None);
        }
    }

    #[test]
    fn test_random_genomes_in_initial_range() {
        let mut rng = Pcg32::seed_from_u64(1);
        let population = Population::random(params(20), &mut rng).unwrap();
        assert_eq!(population.len(), 20);
        for genome in population.genomes() {
            assert!(
                genome
                    .weights()
                    .to_array()
                    .iter()
                    .all(|w| weights::INITIAL_RANGE.contains(w))
            );
        }
    }

    #[test]
    fn test_dispenses_in_order_then_advances() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut population = Population::random(params(4), &mut rng).unwrap();
        let first = population.genomes().to_vec();
        for (i, genome) in first.iter().enumerate() {
            let (id, weights) = population.next(&mut rng);
            assert_eq!(id, GenomeId { generation: 0, index: i });
            assert_eq!(&weights, genome.weights());
        }
        assert!(population.is_exhausted());
        let (id, _) = population.next(&mut rng);
        assert_eq!(id, GenomeId { generation: 1, index: 0 });
        assert_eq!(population.len(), 4);
    }

    #[test]
    fn test_size_constant_across_generations() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut population = Population::random(params(7), &mut rng).unwrap();
        for generation in 0..5 {
            let ids = play_generation(&mut population, &mut rng);
            assert!(ids.iter().all(|id| id.generation == generation));
            assert_eq!(population.len(), 7);
        }
    }

    #[test]
    fn test_new_generation_starts_unevaluated() {
        let mut rng = Pcg32::seed_from_u64(4);
        let mut population = Population::random(params(5), &mut rng).unwrap();
        play_generation(&mut population, &mut rng);
        let (id, _) = population.next(&mut rng);
        assert_eq!(id.generation, 1);
        assert!(population.genomes().iter().all(|g| g.fitness().is_none()));
        assert_eq!(population.telemetry().last_score, Some(2.0));
    }

    #[test]
    fn test_fitness_written_exactly_once() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut population = Population::random(params(3), &mut rng).unwrap();
        let (id, _) = population.next(&mut rng);
        population.record_fitness(id, 3.0).unwrap();
        assert_eq!(
            population.record_fitness(id, 4.0),
            Err(FitnessError::AlreadyRecorded { id })
        );
        assert_eq!(population.genomes()[0].fitness(), Some(3.0));

        let pending = GenomeId { generation: 0, index: 2 };
        assert_eq!(
            population.record_fitness(pending, 1.0),
            Err(FitnessError::NotDispensed { id: pending })
        );
    }

    #[test]
    fn test_stale_generation_rejected() {
        let mut rng = Pcg32::seed_from_u64(6);
        let mut population = Population::random(params(2), &mut rng).unwrap();
        let (old, _) = population.next(&mut rng);
        population.next(&mut rng);
        population.next(&mut rng);
        assert_eq!(
            population.record_fitness(old, 1.0),
            Err(FitnessError::StaleGeneration { id: old, current: 1 })
        );
    }

    #[test]
    fn test_mean_ignores_unevaluated_genomes() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut population = Population::random(params(3), &mut rng).unwrap();
        let (a, _) = population.next(&mut rng);
        population.next(&mut rng);
        let (c, _) = population.next(&mut rng);
        population.record_fitness(a, 2.0).unwrap();
        population.record_fitness(c, 6.0).unwrap();
        let telemetry = population.telemetry();
        assert_eq!(telemetry.evaluated, 2);
        assert_eq!(telemetry.best_fitness, Some(6.0));
        population.next(&mut rng);
        assert_eq!(population.telemetry().last_score, Some(4.0));
    }

    #[test]
    fn test_selection_prefers_fitter_genomes() {
        let mut rng = Pcg32::seed_from_u64(8);
        let genomes = (0..10)
            .map(|i| {
                #[expect(clippy::cast_precision_loss)]
                let mut genome = Genome::new(Weights::splat(i as f32));
                genome.fitness = Some(0.0);
                genome
            })
            .collect::<Vec<_>>();
        let mut counts = [0_usize; 10];
        for _ in 0..10_000 {
            #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let index = select_parent(&genomes, &mut rng).weights().line as usize;
            counts[index] += 1;
        }
        // P(index 0) = P(u < sqrt(0.1)) ≈ 0.32
        assert!(counts[0] > counts[9] * 3);
        assert!(counts[0] > counts[1] * 2);
    }

    #[test]
    fn test_invalid_params() {
        let mut rng = Pcg32::seed_from_u64(9);
        assert_eq!(
            Population::random(params(0), &mut rng).unwrap_err(),
            GeneticParamsError::EmptyPopulation
        );
        let bad = GeneticParams {
            mutation_rate: -0.1,
            ..GeneticParams::default()
        };
        assert!(matches!(
            Population::random(bad, &mut rng),
            Err(GeneticParamsError::Mutation(_))
        ));
    }

    #[test]
    fn test_params_from_partial_json() {
        let params: GeneticParams = serde_json::from_str(r#"{"population_size": 8}"#).unwrap();
        assert_eq!(params.population_size, 8);
        assert!((params.mutation_rate - 0.05).abs() < f64::EPSILON);
    }
}

//! Evolution runner: plays one game per dispensed genome.
//!
//! The runner owns the [`Population`], the random stream used for breeding
//! and the [`SeedScheme`] that labels each game's piece sequence. Everything
//! is derived from [`EvolutionConfig::rng_seed`], so a run is reproducible
//! end to end.

use std::{fmt, str::FromStr, time::Instant};

use evotris_ai::{GameDriver, GameEnd, InvariantViolation, Weights};
use evotris_engine::PieceSeed;
use rand::SeedableRng as _;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::genetic::{
    FitnessError, GeneticParams, GeneticParamsError, GenomeId, Population, PopulationTelemetry,
};

/// How games are labelled for piece generation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeedScheme {
    /// Every game of a generation uses the generation index as its label, so
    /// all genomes of a generation face the same piece sequence.
    #[default]
    PerGeneration,
    /// Each genome gets its own label, `"<generation>-<index>"`.
    PerGenome,
}

impl SeedScheme {
    #[must_use]
    pub fn label(self, id: GenomeId) -> String {
        match self {
            Self::PerGeneration => id.generation.to_string(),
            Self::PerGenome => format!("{}-{}", id.generation, id.index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown seed scheme `{input}`, expected `per-generation` or `per-genome`")]
pub struct ParseSeedSchemeError {
    input: String,
}

impl FromStr for SeedScheme {
    type Err = ParseSeedSchemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "per-generation" => Ok(Self::PerGeneration),
            "per-genome" => Ok(Self::PerGenome),
            _ => Err(ParseSeedSchemeError {
                input: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for SeedScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PerGeneration => f.write_str("per-generation"),
            Self::PerGenome => f.write_str("per-genome"),
        }
    }
}

/// Settings of an evolution run. Missing JSON fields take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    #[serde(flatten)]
    pub genetic: GeneticParams,
    /// Number of generations to play; `None` runs until interrupted
    pub generations: Option<usize>,
    /// Games end after this many locked pieces
    pub piece_limit: Option<usize>,
    /// Seed of the random stream used for initialization and breeding
    pub rng_seed: u64,
    pub seed_scheme: SeedScheme,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            genetic: GeneticParams::default(),
            generations: Some(10),
            piece_limit: Some(500),
            rng_seed: 0,
            seed_scheme: SeedScheme::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum EvolutionError {
    #[display("game of genome {id} aborted")]
    Invariant {
        id: GenomeId,
        #[error(source)]
        violation: InvariantViolation,
    },
    #[display("failed to record fitness")]
    Fitness(FitnessError),
}

/// Result of a single game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameReport {
    pub id: GenomeId,
    pub weights: Weights,
    pub seed: String,
    pub score: usize,
    pub pieces: usize,
    pub end: GameEnd,
}

/// Summary of a fully evaluated generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub generation: usize,
    pub games: Vec<GameReport>,
    pub mean_score: f32,
    pub telemetry: PopulationTelemetry,
}

impl GenerationReport {
    /// The game with the highest score; the earliest one on ties.
    #[must_use]
    pub fn best(&self) -> Option<&GameReport> {
        self.games
            .iter()
            .rev()
            .max_by_key(|game| game.score)
    }
}

#[derive(Debug, Clone)]
pub struct Evolution {
    config: EvolutionConfig,
    population: Population,
    rng: Pcg32,
}

impl Evolution {
    pub fn new(config: EvolutionConfig) -> Result<Self, GeneticParamsError> {
        let mut rng = Pcg32::seed_from_u64(config.rng_seed);
        let population = Population::random(config.genetic, &mut rng)?;
        Ok(Self {
            config,
            population,
            rng,
        })
    }

    /// Starts from the given weight vectors instead of random ones.
    pub fn with_weights<I>(config: EvolutionConfig, weights: I) -> Result<Self, GeneticParamsError>
    where
        I: IntoIterator<Item = Weights>,
    {
        let population = Population::from_weights(weights, config.genetic)?;
        Ok(Self {
            config,
            population,
            rng: Pcg32::seed_from_u64(config.rng_seed),
        })
    }

    /// Plays one game with the next genome and records its fitness.
    pub fn play_next(&mut self) -> Result<GameReport, EvolutionError> {
        let (id, weights) = self.population.next(&mut self.rng);
        let seed = self.config.seed_scheme.label(id);
        let started = Instant::now();

        let mut driver = GameDriver::new(weights, PieceSeed::from_label(&seed));
        let outcome = driver
            .run(self.config.piece_limit)
            .map_err(|violation| EvolutionError::Invariant { id, violation })?;
        #[expect(clippy::cast_precision_loss)]
        let fitness = outcome.score() as f32;
        self.population
            .record_fitness(id, fitness)
            .map_err(EvolutionError::Fitness)?;

        log::debug!(
            "genome {id} scored {} in {} pieces ({:?}, {:?})",
            outcome.score(),
            outcome.stats.completed_pieces(),
            outcome.end,
            started.elapsed()
        );
        Ok(GameReport {
            id,
            weights,
            seed,
            score: outcome.score(),
            pieces: outcome.stats.completed_pieces(),
            end: outcome.end,
        })
    }

    /// Plays the remaining genomes of the current generation.
    ///
    /// Called right after a generation completed, this first breeds the next
    /// one.
    pub fn play_generation(&mut self) -> Result<GenerationReport, EvolutionError> {
        let mut games = Vec::with_capacity(self.population.len());
        loop {
            games.push(self.play_next()?);
            if self.population.is_exhausted() {
                break;
            }
        }

        let generation = games[0].id.generation;
        #[expect(clippy::cast_precision_loss)]
        let mean_score =
            games.iter().map(|game| game.score as f32).sum::<f32>() / games.len() as f32;
        let report = GenerationReport {
            generation,
            games,
            mean_score,
            telemetry: self.population.telemetry(),
        };
        if let Some(best) = report.best() {
            log::info!(
                "generation {generation}: mean {mean_score:.2}, best {} by genome {}",
                best.score,
                best.id
            );
        }
        Ok(report)
    }

    /// Plays `config.generations` generations, calling `on_report` after each.
    pub fn run<F>(&mut self, mut on_report: F) -> Result<(), EvolutionError>
    where
        F: FnMut(&GenerationReport),
    {
        let mut played = 0;
        while self.config.generations.is_none_or(|limit| played < limit) {
            let report = self.play_generation()?;
            on_report(&report);
            played += 1;
        }
        Ok(())
    }
}

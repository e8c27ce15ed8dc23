//! Training system that evolves board evaluator weights with a genetic
//! algorithm.
//!
//! # How Training Works
//!
//! 1. **Population** - a fixed number of genomes, each a random weight vector
//! 2. **Evaluation** - every genome plays one seeded game; its final score
//!    (total cleared lines) is its fitness
//! 3. **Reproduction** - once all genomes have played, fitness-biased selection,
//!    uniform crossover and mutation produce the next generation
//! 4. **Repeat** - for as many generations as configured
//!
//! # Architecture
//!
//! ```text
//! Evolution (runner)
//!     ↓ dispenses genomes from
//! Population (genetic)
//!     ↓ weights drive
//! GameDriver (evotris-ai)
//!     ↓ final score
//! Population::record_fitness
//! ```
//!
//! See the [`genetic`] module for the operators and [`evolution`] for the
//! runner and its configuration.

pub mod evolution;
pub mod genetic;
pub mod weights;

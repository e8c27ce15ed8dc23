use std::{io, path::PathBuf};

use anyhow::Context as _;
use evotris_training::evolution::{
    Evolution, EvolutionConfig, EvolutionError, GenerationReport, SeedScheme,
};

use crate::{render, util};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct EvolveArg {
    /// JSON file with evolution settings; flags below override its fields
    #[clap(long)]
    config: Option<PathBuf>,
    /// Number of genomes per generation [default: 50]
    #[clap(long)]
    population_size: Option<usize>,
    /// Number of generations to play [default: 10]
    #[clap(long)]
    generations: Option<usize>,
    /// End each game after this many locked pieces [default: 500]
    #[clap(long)]
    piece_limit: Option<usize>,
    /// Seed of the breeding random stream [default: 0]
    #[clap(long)]
    rng_seed: Option<u64>,
    /// Piece sequence labelling: `per-generation` or `per-genome`
    #[clap(long)]
    seed_scheme: Option<SeedScheme>,
    /// Print one JSON report per generation to stdout
    #[clap(long, default_value_t = false)]
    json: bool,
}

impl EvolveArg {
    fn load_config(&self) -> anyhow::Result<EvolutionConfig> {
        let mut config = match &self.config {
            Some(path) => util::read_json_file("evolution config", path)?,
            None => EvolutionConfig::default(),
        };
        if let Some(population_size) = self.population_size {
            config.genetic.population_size = population_size;
        }
        if let Some(generations) = self.generations {
            config.generations = Some(generations);
        }
        if let Some(piece_limit) = self.piece_limit {
            config.piece_limit = Some(piece_limit);
        }
        if let Some(rng_seed) = self.rng_seed {
            config.rng_seed = rng_seed;
        }
        if let Some(seed_scheme) = self.seed_scheme {
            config.seed_scheme = seed_scheme;
        }
        Ok(config)
    }
}

pub(crate) fn run(arg: &EvolveArg) -> anyhow::Result<()> {
    let config = arg.load_config()?;
    eprintln!(
        "Evolving {} genomes for {} generations (piece limit {}, seed scheme {}, rng seed {})",
        config.genetic.population_size,
        config
            .generations
            .map_or_else(|| "unlimited".to_owned(), |n| n.to_string()),
        config
            .piece_limit
            .map_or_else(|| "none".to_owned(), |n| n.to_string()),
        config.seed_scheme,
        config.rng_seed,
    );

    let mut evolution = Evolution::new(config).context("Invalid evolution config")?;
    let mut stdout = io::stdout().lock();
    let mut write_result = Ok(());
    let run_result = evolution.run(|report| {
        print_report(report);
        if arg.json && write_result.is_ok() {
            write_result = util::write_json_line(&mut stdout, report);
        }
    });
    if let Err(EvolutionError::Invariant { violation, .. }) = &run_result {
        eprintln!("{}", render::violation(violation));
    }
    run_result.context("Evolution aborted")?;
    write_result
}

fn print_report(report: &GenerationReport) {
    eprintln!("Generation #{}:", report.generation);
    eprintln!("  mean score: {:.2}", report.mean_score);
    if let Some(best) = report.best() {
        let w = best.weights;
        eprintln!(
            "  best score: {} (genome {}, {} pieces, {:?})",
            best.score, best.id, best.pieces, best.end
        );
        eprintln!(
            "  best weights: line={:.4} height={:.4} hole={:.4} bump={:.4}",
            w.line, w.height, w.hole, w.bump
        );
    }
    let topped_out = report.games.iter().filter(|g| g.end.is_topped_out()).count();
    eprintln!("  topped out: {topped_out}/{}", report.games.len());
}

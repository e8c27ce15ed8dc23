use std::path::PathBuf;

use anyhow::Context as _;
use evotris_ai::{GameDriver, GameEnd, Weights};
use evotris_engine::PieceSeed;

use crate::{render, util};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct PlayArg {
    /// Label of the piece sequence
    #[clap(long, default_value = "0")]
    seed: String,
    /// JSON file with the weights (`line`, `height`, `hole`, `bump`)
    #[clap(long, conflicts_with_all = ["line", "height", "hole", "bump"])]
    weights: Option<PathBuf>,
    /// Weight of cleared lines
    #[clap(long, allow_negative_numbers = true)]
    line: Option<f32>,
    /// Weight of aggregate column height
    #[clap(long, allow_negative_numbers = true)]
    height: Option<f32>,
    /// Weight of holes
    #[clap(long, allow_negative_numbers = true)]
    hole: Option<f32>,
    /// Weight of bumpiness
    #[clap(long, allow_negative_numbers = true)]
    bump: Option<f32>,
    /// End the game after this many locked pieces
    #[clap(long)]
    piece_limit: Option<usize>,
    /// Print the board after every locked piece
    #[clap(long, default_value_t = false)]
    trace: bool,
}

impl PlayArg {
    fn load_weights(&self) -> anyhow::Result<Weights> {
        let mut weights = match &self.weights {
            Some(path) => util::read_json_file("weights", path)?,
            None => Weights::default(),
        };
        let overrides = [
            (&mut weights.line, self.line),
            (&mut weights.height, self.height),
            (&mut weights.hole, self.hole),
            (&mut weights.bump, self.bump),
        ];
        for (weight, value) in overrides {
            if let Some(value) = value {
                *weight = value;
            }
        }
        Ok(weights)
    }
}

pub(crate) fn run(arg: &PlayArg) -> anyhow::Result<()> {
    let weights = arg.load_weights()?;
    eprintln!(
        "Playing seed {:?} with line={} height={} hole={} bump={}",
        arg.seed, weights.line, weights.height, weights.hole, weights.bump
    );

    let mut driver = GameDriver::new(weights, PieceSeed::from_label(&arg.seed));
    let end = loop {
        if driver.state().is_game_over() {
            break GameEnd::ToppedOut;
        }
        if arg
            .piece_limit
            .is_some_and(|limit| driver.stats().completed_pieces() >= limit)
        {
            break GameEnd::PieceLimit;
        }
        let outcome = match driver.tick() {
            Ok(outcome) => outcome,
            Err(violation) => {
                eprintln!("{}", render::violation(&violation));
                return Err(violation).context("Game aborted");
            }
        };
        if arg.trace && outcome.is_locked() {
            eprintln!("{}", render::snapshot(&driver.snapshot()));
        }
    };

    let stats = driver.stats();
    eprintln!(
        "Game ended ({end:?}) after {} pieces",
        stats.completed_pieces()
    );
    for (lines, count) in stats.line_cleared_counter().iter().enumerate().skip(1) {
        eprintln!("  {lines}-line clears: {count}");
    }
    println!("{}", driver.score());
    Ok(())
}

//! Markov fusion binary
//!
//! Trains grapheme and phoneme chains from pronunciation dictionaries and
//! generates new strings from a saved model.
//! Usage: cargo run --bin markov -- train --corpus pokemon=data/pokemon.tsv

use clap::{Parser, Subcommand};
use graphoneme::cli::Display;
use graphoneme::config::AppConfig;
use graphoneme::corpus::{self, Pronunciation};
use graphoneme::markov::{FusionWeights, MarkovFusion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const GRAPHEMES_FILE: &str = "markov_graphemes.json";
const PHONEMES_FILE: &str = "markov_phonemes.json";

#[derive(Parser, Debug)]
#[command(name = "markov")]
#[command(about = "Train and sample weighted multi-corpus Markov chains")]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train grapheme and phoneme models from TSV dictionaries
    Train {
        /// Named corpus as NAME=PATH (repeatable)
        #[arg(short, long = "corpus", value_parser = parse_pair::<PathBuf>, required = true)]
        corpora: Vec<(String, PathBuf)>,

        /// Context length in symbols
        #[arg(short, long, default_value = "2")]
        order: usize,

        /// Default blending weight as NAME=WEIGHT (repeatable)
        #[arg(short, long = "weight", value_parser = parse_pair::<f64>)]
        weights: Vec<(String, f64)>,

        /// Output directory for the JSON models
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Print generated strings
    Generate {
        /// Saved model file
        #[arg(short, long, default_value = GRAPHEMES_FILE)]
        model: PathBuf,

        /// Blending weight as NAME=WEIGHT; the model's defaults apply if none
        #[arg(short, long = "weight", value_parser = parse_pair::<f64>)]
        weights: Vec<(String, f64)>,

        /// How many strings to generate
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,

        #[arg(long)]
        min_length: Option<usize>,

        #[arg(long)]
        max_length: Option<usize>,

        /// RNG seed for reproducible output
        #[arg(short, long)]
        seed: Option<u64>,

        /// JSON config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Parse `NAME=VALUE`.
fn parse_pair<T>(s: &str) -> Result<(String, T), String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {:?}", s))?;
    if name.is_empty() {
        return Err(format!("empty name in {:?}", s));
    }
    let value = value.parse().map_err(|e| format!("{}: {}", value, e))?;
    Ok((name.to_string(), value))
}

fn init_tracing(debug: bool) {
    let default = if debug {
        "graphoneme=debug,markov=debug"
    } else {
        "graphoneme=info,markov=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn default_weights(weights: Vec<(String, f64)>) -> FusionWeights {
    if weights.is_empty() {
        FusionWeights::new().with("pokemon", 0.85).with("english", 0.15)
    } else {
        weights.into_iter().collect()
    }
}

fn train(
    corpora: Vec<(String, PathBuf)>,
    order: usize,
    weights: FusionWeights,
    output_dir: &Path,
) -> Result<(), Box<dyn Error>> {
    let mut graphemes = MarkovFusion::with_default_weights(order, weights.clone());
    let mut phonemes = MarkovFusion::with_default_weights(order, weights);

    for (name, path) in corpora {
        let pairs: Vec<Pronunciation> = match corpus::load_pronunciations(&path) {
            Ok(pairs) => pairs,
            Err(e) => {
                tracing::warn!(corpus = %name, ?path, error = %e, "skipping corpus");
                continue;
            }
        };
        let (words, ipas) = corpus::split(&pairs);
        graphemes.train(&name, &words);
        phonemes.train(&name, &ipas);
    }

    let graphemes_path = output_dir.join(GRAPHEMES_FILE);
    let phonemes_path = output_dir.join(PHONEMES_FILE);
    graphemes.save(&graphemes_path)?;
    phonemes.save(&phonemes_path)?;

    let mut display = Display::simple();
    display.notice(&format!("Grapheme model: {}", graphemes_path.display()))?;
    display.notice(&format!("Phoneme model: {}", phonemes_path.display()))?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.debug);

    match args.command {
        Command::Train {
            corpora,
            order,
            weights,
            output_dir,
        } => train(corpora, order, default_weights(weights), &output_dir),
        Command::Generate {
            model,
            weights,
            count,
            min_length,
            max_length,
            seed,
            config,
        } => {
            let mut bounds = AppConfig::load_or_default(config.as_deref()).generator;
            if let Some(min_length) = min_length {
                bounds.min_length = min_length;
            }
            if let Some(max_length) = max_length {
                bounds.max_length = max_length;
            }

            let fusion = MarkovFusion::load(&model)?;
            let weights: FusionWeights = weights.into_iter().collect();
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };

            let mut display = Display::simple();
            display.header(&format!("Generated from {}", model.display()))?;
            for index in 0..count {
                let generated = fusion.generate_with(Some(&weights), &bounds, &mut rng)?;
                display.generated(index, &generated)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair() {
        assert_eq!(
            parse_pair::<f64>("pokemon=0.85").unwrap(),
            ("pokemon".to_string(), 0.85)
        );
        assert!(parse_pair::<f64>("pokemon").is_err());
        assert!(parse_pair::<f64>("=1").is_err());
        assert!(parse_pair::<f64>("a=x").is_err());
    }

    #[test]
    fn test_train_writes_both_models() {
        let dir = tempfile::tempdir().unwrap();
        let tsv = dir.path().join("pokemon.tsv");
        std::fs::write(&tsv, "Pikachu\t/ˈpiːkətʃuː/\nEevee\t/ˈiːviː/\n").unwrap();

        let corpora = vec![
            ("pokemon".to_string(), tsv),
            ("english".to_string(), dir.path().join("missing.tsv")),
        ];
        train(corpora, 2, default_weights(Vec::new()), dir.path()).unwrap();

        let graphemes = MarkovFusion::load(&dir.path().join(GRAPHEMES_FILE)).unwrap();
        let phonemes = MarkovFusion::load(&dir.path().join(PHONEMES_FILE)).unwrap();
        assert!(graphemes.table("pokemon").is_some());
        assert!(graphemes.table("english").is_none());
        assert_eq!(graphemes.default_weights().get("pokemon"), Some(0.85));
        assert_eq!(phonemes.order(), 2);
    }
}

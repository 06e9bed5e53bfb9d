//! Graphoneme - grapheme/phoneme transliteration
//!
//! Loads a trained model and vocabulary, then decodes each word with beam
//! search (or greedily) and prints a `WORD | /IPA/` table.

use clap::Parser;
use graphoneme::cli::Display;
use graphoneme::config::AppConfig;
use graphoneme::llm::{BeamDecoder, Direction, Model, Vocab};
use std::error::Error;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEMO_WORDS: [&str; 8] = [
    "Pikachu",
    "Bulbasaur",
    "Charizard",
    "Mewtwo",
    "Gyarados",
    "Rayquaza",
    "Sudowoodo",
    "Gardevoir",
];

#[derive(Parser, Debug)]
#[command(name = "graphoneme")]
#[command(about = "Transliterate words between spelling and IPA")]
struct Args {
    /// Words to decode (defaults to a demo list)
    words: Vec<String>,

    /// Path to model weights
    #[arg(short, long, default_value = "models/model_weights.bin")]
    model: PathBuf,

    /// Path to vocabulary file
    #[arg(short, long, default_value = "models/vocab.json")]
    vocab: PathBuf,

    /// Decoding direction
    #[arg(long, value_enum, default_value = "g2p")]
    direction: Direction,

    /// Beam width (overrides the config file)
    #[arg(short, long)]
    beam_width: Option<usize>,

    /// Pick the single most likely token at every step
    #[arg(long)]
    greedy: bool,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn init_tracing(debug: bool) {
    let default = if debug { "graphoneme=debug" } else { "graphoneme=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.debug);

    let mut config = AppConfig::load_or_default(args.config.as_deref());
    if let Some(beam_width) = args.beam_width {
        config.decoder.beam_width = beam_width;
    }

    let vocab = Vocab::load(&args.vocab)?;
    let model = Model::load(&args.model)?;
    if model.config().vocab_size != vocab.size() {
        return Err(format!(
            "model expects {} tokens but vocabulary has {}",
            model.config().vocab_size,
            vocab.size()
        )
        .into());
    }
    tracing::debug!(
        vocab = vocab.size(),
        parameters = model.parameter_count(),
        beam_width = config.decoder.beam_width,
        greedy = args.greedy,
        "ready"
    );

    let decoder = BeamDecoder::with_config(&model, &vocab, &config.decoder);
    let words: Vec<String> = if args.words.is_empty() {
        DEMO_WORDS.iter().map(|w| w.to_string()).collect()
    } else {
        args.words
    };

    let mut display = Display::simple();
    let title = match args.direction {
        Direction::GraphemeToPhoneme => format!("{:<15} | IPA PRONUNCIATION", "WORD"),
        Direction::PhonemeToGrapheme => format!("{:<15} | SPELLING", "IPA"),
    };
    display.header(&title)?;

    for word in &words {
        let result = if args.greedy {
            decoder.decode_greedy(word, args.direction)
        } else {
            decoder.decode(word, args.direction, config.decoder.beam_width)
        };
        match result {
            Ok(decoded) => {
                if !decoded.terminated {
                    tracing::warn!(word = %word, "decode hit the length limit without STOP");
                }
                display.decoded_row(word, &decoded)?;
            }
            Err(e) => {
                tracing::error!(word = %word, error = %e, "decode failed");
                display.failed_row(word, &e)?;
            }
        }
    }

    Ok(())
}

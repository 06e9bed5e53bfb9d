//! LLM Module: vocabulary, model inference and sequence decoding
//!
//! # Components
//! - `vocab.rs`: Tokenizer (char-level, shared by both directions)
//! - `oracle.rs`: the scoring interface the decoder runs against
//! - `model.rs`: Candle model loading and inference
//! - `scoring.rs`: log-softmax, length penalty, stable top-k
//! - `beam.rs`: beam search and greedy decoding

pub mod beam;
pub mod model;
pub mod oracle;
pub mod scoring;
pub mod vocab;

pub use beam::{BeamDecoder, Decoded};
pub use model::Model;
pub use oracle::{Logits, ScoringOracle};
pub use vocab::{Direction, Vocab};

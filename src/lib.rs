//! Grapheme/IPA conversion with a beam-searched sequence model, plus a
//! multi-corpus Markov generator for novel words and pronunciations.

pub mod cli;
pub mod config;
pub mod corpus;
pub mod error;
pub mod llm;
pub mod markov;

pub use error::{Error, Result};

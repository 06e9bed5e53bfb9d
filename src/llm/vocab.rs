//! Tokenizer: character-level vocabulary shared by both translation directions
//!
//! Handles:
//! - Character to token ID mapping (unknown characters map to PAD)
//! - Token ID to symbol reverse mapping
//! - Task-direction prefixes and fixed-length encoder inputs
//! - Reading and writing the `vocab.json` symbol table

use crate::error::{Error, Result};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Padding symbol, always id 0
pub const PAD_SYMBOL: &str = "[PAD]";
/// Sequence start
pub const START_SYMBOL: char = '[';
/// Sequence end
pub const STOP_SYMBOL: char = ']';

const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ' -/";
const IPA_SYMBOLS: &str = "ɪæəɑɔʊuːiːeɪaɪɔɪoʊaʊpbt dkfɡvθðszʃʒhtʃdʒmlrjŋ";
const SPECIAL: &str = "<>[] ";

/// Translation direction, announced to the model by a one-character prefix
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Direction {
    /// Orthographic word to IPA
    #[value(name = "g2p")]
    GraphemeToPhoneme,
    /// IPA to orthographic word
    #[value(name = "p2g")]
    PhonemeToGrapheme,
}

impl Direction {
    pub fn marker(self) -> char {
        match self {
            Direction::GraphemeToPhoneme => '<',
            Direction::PhonemeToGrapheme => '>',
        }
    }
}

/// Bidirectional symbol/id table
#[derive(Clone, Debug)]
pub struct Vocab {
    /// Character → Token ID
    char_to_id: FxHashMap<char, u32>,
    /// Token ID → symbol (dense, index is the id)
    symbols: Vec<String>,
    start_token: u32,
    stop_token: u32,
}

impl Vocab {
    /// The vocabulary the model is trained with: sorted unique characters
    /// of the alphabet, the IPA inventory and the control markers, numbered
    /// from 1 with `[PAD]` at 0.
    pub fn standard() -> Self {
        let mut chars: Vec<char> = ALPHABET
            .chars()
            .chain(IPA_SYMBOLS.chars())
            .chain(SPECIAL.chars())
            .collect();
        chars.sort_unstable();
        chars.dedup();

        let mut symbols = Vec::with_capacity(chars.len() + 1);
        symbols.push(PAD_SYMBOL.to_string());
        let mut char_to_id = FxHashMap::default();
        for (idx, c) in chars.into_iter().enumerate() {
            char_to_id.insert(c, idx as u32 + 1);
            symbols.push(c.to_string());
        }

        // SPECIAL carries every reserved marker.
        debug_assert!(SPECIAL.contains(START_SYMBOL) && SPECIAL.contains(STOP_SYMBOL));
        let start_token = char_to_id.get(&START_SYMBOL).copied().unwrap_or_default();
        let stop_token = char_to_id.get(&STOP_SYMBOL).copied().unwrap_or_default();

        Vocab {
            char_to_id,
            symbols,
            start_token,
            stop_token,
        }
    }

    /// Build from a `symbol -> id` table, checking that ids are dense and
    /// that the reserved symbols are present.
    pub fn from_mapping(mapping: BTreeMap<String, u32>) -> Result<Self> {
        let size = mapping.len();
        let mut slots: Vec<Option<String>> = vec![None; size];
        let mut char_to_id = FxHashMap::default();

        for (symbol, id) in mapping {
            let slot = slots.get_mut(id as usize).ok_or_else(|| {
                Error::Vocab(format!("id {} for {:?} is outside 0..{}", id, symbol, size))
            })?;
            if let Some(existing) = slot.as_ref() {
                return Err(Error::Vocab(format!(
                    "id {} assigned to both {:?} and {:?}",
                    id, existing, symbol
                )));
            }

            if symbol != PAD_SYMBOL {
                let mut chars = symbol.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => {
                        char_to_id.insert(c, id);
                    }
                    _ => {
                        return Err(Error::Vocab(format!(
                            "symbol {:?} is not a single character",
                            symbol
                        )))
                    }
                }
            } else if id != 0 {
                return Err(Error::Vocab(format!("{} must map to 0, found {}", PAD_SYMBOL, id)));
            }
            *slot = Some(symbol);
        }

        // Dense by construction: `size` distinct ids all below `size`.
        let symbols: Vec<String> = slots.into_iter().flatten().collect();
        if symbols.first().map(String::as_str) != Some(PAD_SYMBOL) {
            return Err(Error::Vocab(format!("missing {}", PAD_SYMBOL)));
        }

        let reserved = |c: char| {
            char_to_id
                .get(&c)
                .copied()
                .ok_or_else(|| Error::Vocab(format!("missing reserved symbol {:?}", c)))
        };
        let start_token = reserved(START_SYMBOL)?;
        let stop_token = reserved(STOP_SYMBOL)?;
        reserved(Direction::GraphemeToPhoneme.marker())?;
        reserved(Direction::PhonemeToGrapheme.marker())?;

        Ok(Vocab {
            char_to_id,
            symbols,
            start_token,
            stop_token,
        })
    }

    /// Load vocabulary from a JSON `{symbol: id}` object
    pub fn load(vocab_path: &Path) -> Result<Self> {
        let content = fs::read_to_string(vocab_path)?;
        let mapping: BTreeMap<String, u32> = serde_json::from_str(&content)?;
        let vocab = Self::from_mapping(mapping)?;
        tracing::debug!(path = ?vocab_path, size = vocab.size(), "vocabulary loaded");
        Ok(vocab)
    }

    /// Save vocabulary as a JSON `{symbol: id}` object
    pub fn save(&self, path: &Path) -> Result<()> {
        let mapping: BTreeMap<&str, u32> = self
            .symbols
            .iter()
            .enumerate()
            .map(|(id, symbol)| (symbol.as_str(), id as u32))
            .collect();
        fs::write(path, serde_json::to_string_pretty(&mapping)?)?;
        Ok(())
    }

    pub fn pad(&self) -> u32 {
        0
    }

    pub fn start(&self) -> u32 {
        self.start_token
    }

    pub fn stop(&self) -> u32 {
        self.stop_token
    }

    /// Get vocabulary size
    pub fn size(&self) -> usize {
        self.symbols.len()
    }

    /// Convert character to token ID
    pub fn char_to_token(&self, c: char) -> Option<u32> {
        self.char_to_id.get(&c).copied()
    }

    /// Convert token ID to its symbol
    pub fn token_to_symbol(&self, token_id: u32) -> Option<&str> {
        self.symbols.get(token_id as usize).map(String::as_str)
    }

    /// Encoder input: direction marker + lowercased text, unknown characters
    /// as PAD, truncated to `context_len` and right-padded with PAD.
    pub fn encode_input(&self, text: &str, direction: Direction, context_len: usize) -> Vec<u32> {
        let prefixed = format!("{}{}", direction.marker(), text).to_lowercase();
        let mut ids: Vec<u32> = prefixed
            .chars()
            .map(|c| self.char_to_token(c).unwrap_or(self.pad()))
            .take(context_len)
            .collect();
        ids.resize(context_len, self.pad());
        ids
    }

    /// Decode token IDs to a string: a leading START is skipped, decoding
    /// stops at STOP, PAD and unknown ids produce nothing.
    pub fn decode(&self, tokens: &[u32]) -> String {
        let body = match tokens.first() {
            Some(&first) if first == self.start_token => &tokens[1..],
            _ => tokens,
        };

        let mut text = String::new();
        for &token_id in body {
            if token_id == self.stop_token {
                break;
            }
            if token_id == self.pad() {
                continue;
            }
            if let Some(symbol) = self.token_to_symbol(token_id) {
                text.push_str(symbol);
            }
        }
        text
    }
}

impl Default for Vocab {
    fn default() -> Self {
        Self::standard()
    }
}

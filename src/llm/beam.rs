//! Autoregressive beam search over a scoring oracle
//!
//! Every step sends the whole beam to the oracle as one batch, expands each
//! live hypothesis by every vocabulary token and keeps the global top
//! `beam_width` expansions. Hypotheses that choose STOP are set aside as
//! finished; the winner is the finished sequence with the best
//! length-normalized score.

use crate::config::DecoderConfig;
use crate::error::{Error, Result};
use crate::llm::oracle::ScoringOracle;
use crate::llm::scoring::{self, Candidate};
use crate::llm::vocab::{Direction, Vocab};

/// Best active scores below this mean the beam has collapsed.
const DEAD_SCORE_FLOOR: f32 = -1e8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HypothesisState {
    Active,
    /// Chose STOP; the token list does not include it
    Finished,
    /// Placeholder slot that is never expanded
    Dead,
}

#[derive(Clone, Debug)]
pub struct Hypothesis {
    /// Token ids, starting with START
    pub tokens: Vec<u32>,
    /// Cumulative log-probability
    pub score: f32,
    pub state: HypothesisState,
}

impl Hypothesis {
    fn initial(start: u32, state: HypothesisState) -> Self {
        Hypothesis {
            tokens: vec![start],
            score: 0.0,
            state,
        }
    }

    fn is_active(&self) -> bool {
        self.state == HypothesisState::Active
    }
}

/// Outcome of one decode call
#[derive(Clone, Debug, PartialEq)]
pub struct Decoded {
    pub text: String,
    /// Emitted tokens, without START or STOP
    pub tokens: Vec<u32>,
    /// Cumulative log-probability of the chosen sequence
    pub score: f32,
    /// `false` when no hypothesis ever chose STOP and the best unfinished
    /// one was returned instead
    pub terminated: bool,
}

/// Beam decoder bound to one oracle and vocabulary
pub struct BeamDecoder<'a, O: ScoringOracle> {
    oracle: &'a O,
    vocab: &'a Vocab,
    length_penalty: f32,
}

impl<'a, O: ScoringOracle> BeamDecoder<'a, O> {
    pub fn new(oracle: &'a O, vocab: &'a Vocab) -> Self {
        BeamDecoder {
            oracle,
            vocab,
            length_penalty: DecoderConfig::default().length_penalty,
        }
    }

    pub fn with_config(oracle: &'a O, vocab: &'a Vocab, config: &DecoderConfig) -> Self {
        BeamDecoder {
            oracle,
            vocab,
            length_penalty: config.length_penalty,
        }
    }

    fn encode(&self, input: &str, direction: Direction, rows: usize) -> Vec<Vec<u32>> {
        let encoded = self
            .vocab
            .encode_input(input, direction, self.oracle.context_len());
        vec![encoded; rows]
    }

    fn decoder_row(&self, tokens: &[u32], width: usize) -> Vec<u32> {
        let mut row: Vec<u32> = tokens.iter().copied().take(width).collect();
        row.resize(width, self.vocab.pad());
        row
    }

    fn finish(&self, hypothesis: &Hypothesis, terminated: bool) -> Decoded {
        let tokens = hypothesis.tokens[1..].to_vec();
        Decoded {
            text: self.vocab.decode(&hypothesis.tokens),
            tokens,
            score: hypothesis.score,
            terminated,
        }
    }

    /// Beam search for the best output of `input` in `direction`.
    pub fn decode(&self, input: &str, direction: Direction, beam_width: usize) -> Result<Decoded> {
        if beam_width == 0 {
            return Err(Error::InvalidBeamWidth);
        }

        let context_len = self.oracle.context_len();
        let width = context_len.saturating_sub(1);
        let vocab_size = self.oracle.vocab_size();
        let start = self.vocab.start();
        let stop = self.vocab.stop();

        let encoder = self.encode(input, direction, beam_width);

        // Only slot 0 is live so the first expansion counts the START state once.
        let mut beam: Vec<Hypothesis> = (0..beam_width)
            .map(|slot| {
                let state = if slot == 0 {
                    HypothesisState::Active
                } else {
                    HypothesisState::Dead
                };
                Hypothesis::initial(start, state)
            })
            .collect();
        let mut finished: Vec<Hypothesis> = Vec::new();

        for step in 0..width {
            let decoder: Vec<Vec<u32>> = beam
                .iter()
                .map(|h| self.decoder_row(&h.tokens, width))
                .collect();

            let logits = self.oracle.score(&encoder, &decoder)?;
            logits.expect_shape(beam_width, width, vocab_size)?;

            let mut candidates = Vec::with_capacity(beam_width * vocab_size);
            for (slot, hypothesis) in beam.iter().enumerate() {
                if !hypothesis.is_active() {
                    continue;
                }
                let position = hypothesis.tokens.len() - 1;
                let log_probs = scoring::log_softmax(logits.at(slot, position)?);
                candidates.extend(log_probs.iter().enumerate().map(|(token, &lp)| Candidate {
                    index: slot * vocab_size + token,
                    score: hypothesis.score + lp,
                }));
            }

            let selected = scoring::top_k(candidates, beam_width);
            let mut next_beam = Vec::with_capacity(beam_width);
            for candidate in selected {
                let parent = &beam[candidate.index / vocab_size];
                let token = (candidate.index % vocab_size) as u32;

                if token == stop {
                    finished.push(Hypothesis {
                        tokens: parent.tokens.clone(),
                        score: candidate.score,
                        state: HypothesisState::Finished,
                    });
                    next_beam.push(Hypothesis {
                        tokens: parent.tokens.clone(),
                        score: candidate.score,
                        state: HypothesisState::Dead,
                    });
                } else {
                    let mut tokens = parent.tokens.clone();
                    tokens.push(token);
                    next_beam.push(Hypothesis {
                        tokens,
                        score: candidate.score,
                        state: HypothesisState::Active,
                    });
                }
            }
            while next_beam.len() < beam_width {
                next_beam.push(Hypothesis::initial(start, HypothesisState::Dead));
            }
            beam = next_beam;

            let best_active = beam
                .iter()
                .filter(|h| h.is_active())
                .map(|h| h.score)
                .fold(f32::NEG_INFINITY, f32::max);
            if best_active < DEAD_SCORE_FLOOR {
                tracing::trace!(step, finished = finished.len(), "beam exhausted");
                break;
            }
        }

        let mut best_finished: Option<(&Hypothesis, f32)> = None;
        for hypothesis in &finished {
            let normalized = scoring::length_normalized(
                hypothesis.score,
                hypothesis.tokens.len(),
                self.length_penalty,
            );
            match best_finished {
                Some((_, best)) if normalized <= best => {}
                _ => best_finished = Some((hypothesis, normalized)),
            }
        }

        if let Some((hypothesis, _)) = best_finished {
            return Ok(self.finish(hypothesis, true));
        }

        tracing::debug!(input, ?direction, "no hypothesis reached STOP");
        let mut best_active: Option<&Hypothesis> = None;
        for hypothesis in beam.iter().filter(|h| h.is_active()) {
            match best_active {
                Some(best) if hypothesis.score <= best.score => {}
                _ => best_active = Some(hypothesis),
            }
        }
        Ok(match best_active {
            Some(hypothesis) => self.finish(hypothesis, false),
            None => Decoded {
                text: String::new(),
                tokens: Vec::new(),
                score: f32::NEG_INFINITY,
                terminated: false,
            },
        })
    }

    /// Argmax decoding, one hypothesis, stops at the first STOP.
    pub fn decode_greedy(&self, input: &str, direction: Direction) -> Result<Decoded> {
        let context_len = self.oracle.context_len();
        let width = context_len.saturating_sub(1);
        let vocab_size = self.oracle.vocab_size();
        let encoder = self.encode(input, direction, 1);

        let mut current = Hypothesis::initial(self.vocab.start(), HypothesisState::Active);

        for step in 0..width {
            let decoder = vec![self.decoder_row(&current.tokens, width)];
            let logits = self.oracle.score(&encoder, &decoder)?;
            logits.expect_shape(1, width, vocab_size)?;

            let log_probs = scoring::log_softmax(logits.at(0, step)?);
            let Some(next) = scoring::argmax(&log_probs) else {
                break;
            };
            current.score += log_probs[next];

            if next as u32 == self.vocab.stop() {
                current.state = HypothesisState::Finished;
                break;
            }
            current.tokens.push(next as u32);
        }

        let terminated = current.state == HypothesisState::Finished;
        Ok(self.finish(&current, terminated))
    }
}

//! Weighted blending of several corpus chains
//!
//! At every step only the corpora that have seen the current context take
//! part, and their weights are renormalized among themselves. A context no
//! weighted corpus has seen is a dead end.

use crate::config::GeneratorConfig;
use crate::error::{Error, Result};
use crate::markov::symbol::{Context, Symbol};
use crate::markov::table::{Successors, TransitionTable};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Corpus name → non-negative blending weight
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FusionWeights(BTreeMap<String, f64>);

impl FusionWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, corpus: impl Into<String>, weight: f64) -> Self {
        self.insert(corpus, weight);
        self
    }

    pub fn insert(&mut self, corpus: impl Into<String>, weight: f64) {
        self.0.insert(corpus.into(), weight);
    }

    pub fn get(&self, corpus: &str) -> Option<f64> {
        self.0.get(corpus).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, &weight)| (name.as_str(), weight))
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for FusionWeights {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        FusionWeights(iter.into_iter().map(|(name, w)| (name.into(), w)).collect())
    }
}

/// Blended next-symbol distribution; empty means no corpus can continue.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FusedDistribution {
    population: Vec<Symbol>,
    probabilities: Vec<f64>,
}

impl FusedDistribution {
    pub fn is_empty(&self) -> bool {
        self.population.is_empty()
    }

    pub fn len(&self) -> usize {
        self.population.len()
    }

    pub fn population(&self) -> &[Symbol] {
        &self.population
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    pub fn probability(&self, symbol: Symbol) -> f64 {
        self.population
            .iter()
            .position(|&s| s == symbol)
            .map_or(0.0, |idx| self.probabilities[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Symbol, f64)> + '_ {
        self.population
            .iter()
            .copied()
            .zip(self.probabilities.iter().copied())
    }

    /// Draw one symbol proportionally to its probability.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Symbol> {
        let index = WeightedIndex::new(&self.probabilities)
            .map_err(|e| Error::Sampling(e.to_string()))?;
        Ok(self.population[index.sample(rng)])
    }
}

/// A set of named order-`k` chains sharing one alphabet
#[derive(Clone, Debug, PartialEq)]
pub struct MarkovFusion {
    order: usize,
    default_weights: FusionWeights,
    tables: BTreeMap<String, TransitionTable>,
}

impl MarkovFusion {
    pub fn new(order: usize) -> Self {
        MarkovFusion {
            order,
            default_weights: FusionWeights::default(),
            tables: BTreeMap::new(),
        }
    }

    pub fn with_default_weights(order: usize, default_weights: FusionWeights) -> Self {
        MarkovFusion {
            default_weights,
            ..Self::new(order)
        }
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn default_weights(&self) -> &FusionWeights {
        &self.default_weights
    }

    pub fn set_default_weights(&mut self, weights: FusionWeights) {
        self.default_weights = weights;
    }

    pub fn table(&self, corpus: &str) -> Option<&TransitionTable> {
        self.tables.get(corpus)
    }

    pub fn corpora(&self) -> impl Iterator<Item = (&str, &TransitionTable)> {
        self.tables.iter().map(|(name, table)| (name.as_str(), table))
    }

    /// Table for `corpus`, created empty on first use
    pub(crate) fn table_mut(&mut self, corpus: &str) -> &mut TransitionTable {
        let order = self.order;
        self.tables
            .entry(corpus.to_string())
            .or_insert_with(|| TransitionTable::new(order))
    }

    /// Count the transitions of `items` into `corpus`. Training the same
    /// name again accumulates.
    pub fn train<I, S>(&mut self, corpus: &str, items: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let table = self.table_mut(corpus);
        let mut trained = 0usize;
        for item in items {
            table.train_item(item.as_ref());
            trained += 1;
        }
        tracing::info!(corpus, items = trained, contexts = table.len(), "trained chain");
    }

    /// Blend the successor distributions of every weighted corpus that has
    /// seen `context`.
    pub fn fused_probabilities(
        &self,
        context: &[Symbol],
        weights: &FusionWeights,
    ) -> FusedDistribution {
        let active: Vec<(f64, &Successors)> = weights
            .iter()
            .filter(|&(_, weight)| weight > 0.0)
            .filter_map(|(name, weight)| {
                self.tables
                    .get(name)?
                    .successors(context)
                    .filter(|successors| successors.total() > 0)
                    .map(|successors| (weight, successors))
            })
            .collect();

        if active.is_empty() {
            return FusedDistribution::default();
        }

        let total_weight: f64 = active.iter().map(|(weight, _)| weight).sum();
        let population: BTreeSet<Symbol> = active
            .iter()
            .flat_map(|(_, successors)| successors.symbols())
            .collect();

        let mut fused = FusedDistribution {
            population: Vec::with_capacity(population.len()),
            probabilities: Vec::with_capacity(population.len()),
        };
        for symbol in population {
            let p: f64 = active
                .iter()
                .map(|(weight, successors)| {
                    (weight / total_weight) * successors.probability(symbol)
                })
                .sum();
            fused.population.push(symbol);
            fused.probabilities.push(p);
        }
        fused
    }

    /// Generate one string with the thread-local RNG.
    pub fn generate(
        &self,
        weights: Option<&FusionWeights>,
        bounds: &GeneratorConfig,
    ) -> Result<String> {
        self.generate_with(weights, bounds, &mut rand::thread_rng())
    }

    /// Generate one string. Empty or missing `weights` fall back to the
    /// model's default weights. An END drawn before `min_length` symbols
    /// discards the attempt; after `max_attempts` discarded attempts this
    /// fails with [`Error::MinLengthUnsatisfied`].
    pub fn generate_with<R: Rng + ?Sized>(
        &self,
        weights: Option<&FusionWeights>,
        bounds: &GeneratorConfig,
        rng: &mut R,
    ) -> Result<String> {
        let weights = match weights {
            Some(weights) if !weights.is_empty() => weights,
            _ if !self.default_weights.is_empty() => &self.default_weights,
            _ => return Err(Error::NoWeights),
        };

        // At least one attempt, so `min_length = 0` always succeeds.
        let max_attempts = bounds.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            if let Some(generated) = self.attempt(weights, bounds, rng)? {
                return Ok(generated);
            }
            tracing::trace!(attempt, "ended below minimum length, restarting");
        }

        Err(Error::MinLengthUnsatisfied {
            min_length: bounds.min_length,
            attempts: max_attempts,
        })
    }

    /// `None` when END came too early.
    fn attempt<R: Rng + ?Sized>(
        &self,
        weights: &FusionWeights,
        bounds: &GeneratorConfig,
        rng: &mut R,
    ) -> Result<Option<String>> {
        let mut context = Context::initial(self.order);
        let mut generated = String::new();
        let mut length = 0usize;

        while length < bounds.max_length {
            let fused = self.fused_probabilities(context.as_slice(), weights);
            if fused.is_empty() {
                tracing::trace!(length, "dead end");
                break;
            }

            let symbol = fused.draw(rng)?;
            match symbol {
                Symbol::End if length >= bounds.min_length => break,
                Symbol::End => return Ok(None),
                Symbol::Char(c) => generated.push(c),
                // Training and loading both keep START out of successors.
                Symbol::Start => break,
            }
            length += 1;
            context = context.advance(symbol);
        }

        Ok(Some(generated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn chars(s: &str) -> Vec<Symbol> {
        s.chars().map(Symbol::Char).collect()
    }

    fn bounds(min_length: usize, max_length: usize) -> GeneratorConfig {
        GeneratorConfig {
            min_length,
            max_length,
            max_attempts: 50,
        }
    }

    #[test]
    fn test_pika_scenario() {
        let mut model = MarkovFusion::new(2);
        model.train("pokemon", ["pika"]);
        let weights = FusionWeights::new().with("pokemon", 1.0);

        let start = model.fused_probabilities(&[Symbol::Start, Symbol::Start], &weights);
        assert_eq!(start.population(), &[Symbol::Char('p')]);
        assert_eq!(start.probabilities(), &[1.0]);

        let pi = model.fused_probabilities(&chars("pi"), &weights);
        assert_eq!(pi.probability(Symbol::Char('k')), 1.0);

        let ka = model.fused_probabilities(&chars("ka"), &weights);
        assert_eq!(ka.population(), &[Symbol::End]);
        assert_eq!(ka.probability(Symbol::End), 1.0);
    }

    #[test]
    fn test_blend_renormalizes_over_contributors() {
        let mut model = MarkovFusion::new(1);
        model.train("a", ["xy"]);
        model.train("b", ["xz", "q"]);
        let weights = FusionWeights::new().with("a", 3.0).with("b", 1.0);

        let after_x = model.fused_probabilities(&chars("x"), &weights);
        assert!((after_x.probability(Symbol::Char('y')) - 0.75).abs() < 1e-12);
        assert!((after_x.probability(Symbol::Char('z')) - 0.25).abs() < 1e-12);

        // Only "b" has seen 'q'; it gets the whole mass.
        let after_q = model.fused_probabilities(&chars("q"), &weights);
        assert_eq!(after_q.probability(Symbol::End), 1.0);
    }

    #[test]
    fn test_unseen_context_is_dead_end() {
        let mut model = MarkovFusion::new(2);
        model.train("a", ["abc"]);
        let weights = FusionWeights::new().with("a", 1.0).with("missing", 2.0);
        assert!(model.fused_probabilities(&chars("zz"), &weights).is_empty());
    }

    #[test]
    fn test_zero_weight_matches_single_corpus() {
        let mut model = MarkovFusion::new(2);
        model.train("a", ["pikachu", "raichu", "pichu"]);
        model.train("b", ["bulbasaur", "ivysaur"]);
        let fused = FusionWeights::new().with("a", 1.0).with("b", 0.0);
        let single = FusionWeights::new().with("a", 1.0);

        let table = model.table("a").unwrap();
        for (context, _) in table.contexts() {
            assert_eq!(
                model.fused_probabilities(context.as_slice(), &fused),
                model.fused_probabilities(context.as_slice(), &single)
            );
        }

        let config = bounds(2, 10);
        let mut rng_a = StdRng::seed_from_u64(7);
        let mut rng_b = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            assert_eq!(
                model.generate_with(Some(&fused), &config, &mut rng_a).unwrap(),
                model.generate_with(Some(&single), &config, &mut rng_b).unwrap()
            );
        }
    }

    #[test]
    fn test_generate_respects_bounds() {
        let mut model = MarkovFusion::new(2);
        model.train("a", ["pikachu", "pichu", "raichu", "pi"]);
        let weights = FusionWeights::new().with("a", 1.0);
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..50 {
            let word = model
                .generate_with(Some(&weights), &bounds(3, 6), &mut rng)
                .unwrap();
            let length = word.chars().count();
            assert!((3..=6).contains(&length), "{word}");
        }
    }

    #[test]
    fn test_min_length_unsatisfiable() {
        let mut model = MarkovFusion::new(2);
        model.train("a", ["ab"]);
        let weights = FusionWeights::new().with("a", 1.0);
        let mut rng = StdRng::seed_from_u64(1);

        let result = model.generate_with(Some(&weights), &bounds(5, 10), &mut rng);
        assert!(matches!(
            result,
            Err(Error::MinLengthUnsatisfied {
                min_length: 5,
                attempts: 50
            })
        ));
    }

    #[test]
    fn test_zero_attempt_budget_still_tries_once() {
        let mut model = MarkovFusion::new(1);
        model.train("a", ["ab"]);
        let weights = FusionWeights::new().with("a", 1.0);
        let mut rng = StdRng::seed_from_u64(5);

        let config = GeneratorConfig {
            min_length: 0,
            max_length: 5,
            max_attempts: 0,
        };
        assert_eq!(
            model.generate_with(Some(&weights), &config, &mut rng).unwrap(),
            "ab"
        );

        let config = GeneratorConfig {
            min_length: 9,
            ..config
        };
        assert!(matches!(
            model.generate_with(Some(&weights), &config, &mut rng),
            Err(Error::MinLengthUnsatisfied { attempts: 1, .. })
        ));
    }

    #[test]
    fn test_default_weights_fallback() {
        let mut model =
            MarkovFusion::with_default_weights(1, FusionWeights::new().with("a", 1.0));
        model.train("a", ["aaaa"]);
        let mut rng = StdRng::seed_from_u64(3);

        let word = model
            .generate_with(Some(&FusionWeights::new()), &bounds(0, 3), &mut rng)
            .unwrap();
        assert!(word.chars().all(|c| c == 'a'));

        let bare = MarkovFusion::new(1);
        assert!(matches!(
            bare.generate_with(None, &bounds(0, 3), &mut rng),
            Err(Error::NoWeights)
        ));
    }

    #[test]
    fn test_dead_end_returns_partial() {
        let mut model = MarkovFusion::new(1);
        model.train("a", ["ab"]);
        // Weighting a corpus that never saw START yields nothing at all.
        let weights = FusionWeights::new().with("b", 1.0);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            model.generate_with(Some(&weights), &bounds(4, 8), &mut rng).unwrap(),
            ""
        );
    }
}

//! Per-corpus transition counts

use crate::markov::symbol::{Context, Symbol};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Counts of the symbols observed after one context
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Successors {
    counts: BTreeMap<Symbol, u64>,
    total: u64,
}

impl Successors {
    pub fn add(&mut self, symbol: Symbol, count: u64) {
        *self.counts.entry(symbol).or_insert(0) += count;
        self.total += count;
    }

    pub fn count(&self, symbol: Symbol) -> u64 {
        self.counts.get(&symbol).copied().unwrap_or(0)
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Empirical P(symbol | context); 0 when the context was never seen
    pub fn probability(&self, symbol: Symbol) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.count(symbol) as f64 / self.total as f64
    }

    pub fn symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.counts.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Symbol, u64)> + '_ {
        self.counts.iter().map(|(&symbol, &count)| (symbol, count))
    }
}

/// Order-`k` transition table for one named corpus
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionTable {
    order: usize,
    contexts: FxHashMap<Context, Successors>,
}

impl TransitionTable {
    pub fn new(order: usize) -> Self {
        TransitionTable {
            order,
            contexts: FxHashMap::default(),
        }
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Count every `order + 1` window of `item` padded with START markers
    /// on the left and one END marker on the right.
    pub fn train_item(&mut self, item: &str) {
        let padded: Vec<Symbol> = std::iter::repeat(Symbol::Start)
            .take(self.order)
            .chain(item.chars().map(Symbol::Char))
            .chain(std::iter::once(Symbol::End))
            .collect();

        for window in padded.windows(self.order + 1) {
            let (context, next) = window.split_at(self.order);
            self.add(context, next[0], 1);
        }
    }

    /// Add `count` observations of `context -> next`.
    pub fn add(&mut self, context: &[Symbol], next: Symbol, count: u64) {
        match self.contexts.get_mut(context) {
            Some(successors) => successors.add(next, count),
            None => {
                let mut successors = Successors::default();
                successors.add(next, count);
                self.contexts.insert(Context::from_symbols(context), successors);
            }
        }
    }

    pub fn successors(&self, context: &[Symbol]) -> Option<&Successors> {
        self.contexts.get(context)
    }

    /// Number of distinct contexts
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn contexts(&self) -> impl Iterator<Item = (&Context, &Successors)> {
        self.contexts.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pika_windows() {
        let mut table = TransitionTable::new(2);
        table.train_item("pika");

        let start = table
            .successors(&[Symbol::Start, Symbol::Start])
            .unwrap();
        assert_eq!(start.probability(Symbol::Char('p')), 1.0);

        let pi = table
            .successors(&[Symbol::Char('p'), Symbol::Char('i')])
            .unwrap();
        assert_eq!(pi.probability(Symbol::Char('k')), 1.0);

        let ka = table
            .successors(&[Symbol::Char('k'), Symbol::Char('a')])
            .unwrap();
        assert_eq!(ka.probability(Symbol::End), 1.0);
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn test_empty_item_counts_end() {
        let mut table = TransitionTable::new(1);
        table.train_item("");
        let start = table.successors(&[Symbol::Start]).unwrap();
        assert_eq!(start.count(Symbol::End), 1);
    }

    #[test]
    fn test_order_zero_is_unigram() {
        let mut table = TransitionTable::new(0);
        table.train_item("aab");
        let all = table.successors(&[]).unwrap();
        assert_eq!(all.total(), 4);
        assert_eq!(all.count(Symbol::Char('a')), 2);
    }
}

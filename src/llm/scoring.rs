//! Scoring primitives for sequence decoding
//!
//! Combines:
//! - Logit normalization (softmax / log-softmax)
//! - Length-normalized hypothesis scores
//! - Stable top-k selection over flattened (hypothesis, token) candidates

use std::cmp::Ordering;

/// Normalize logits to probabilities using softmax
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    if logits.is_empty() {
        return vec![];
    }

    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();

    exps.iter().map(|&x| x / sum).collect()
}

/// Log-probabilities from logits, shifted by the max for stability
pub fn log_softmax(logits: &[f32]) -> Vec<f32> {
    if logits.is_empty() {
        return vec![];
    }

    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return vec![f32::NEG_INFINITY; logits.len()];
    }
    let log_sum = logits.iter().map(|&x| (x - max).exp()).sum::<f32>().ln();

    logits.iter().map(|&x| x - max - log_sum).collect()
}

/// Index of the largest value; the first one wins on ties
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &value) in values.iter().enumerate() {
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ if value.is_nan() => {}
            _ => best = Some((idx, value)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// `score / length^alpha`
pub fn length_normalized(score: f32, length: usize, alpha: f32) -> f32 {
    score / (length.max(1) as f32).powf(alpha)
}

/// A scored expansion of hypothesis `index / vocab_size` by token
/// `index % vocab_size`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub index: usize,
    pub score: f32,
}

/// Keep the `k` best finite candidates, highest score first, lowest index
/// first among equal scores.
pub fn top_k(mut candidates: Vec<Candidate>, k: usize) -> Vec<Candidate> {
    candidates.retain(|c| c.score.is_finite());
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.index.cmp(&b.index))
    });
    candidates.truncate(k);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax() {
        let logits = vec![1.0, 2.0, 3.0];
        let probs = softmax(&logits);
        assert_eq!(probs.len(), 3);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_log_softmax_matches_softmax() {
        let logits = vec![0.5, -1.0, 2.0, 2.0];
        let probs = softmax(&logits);
        let log_probs = log_softmax(&logits);
        for (p, lp) in probs.iter().zip(log_probs.iter()) {
            assert!((p.ln() - lp).abs() < 1e-5);
        }
    }

    #[test]
    fn test_log_softmax_large_logits() {
        let log_probs = log_softmax(&[1000.0, 0.0]);
        assert!(log_probs[0].abs() < 1e-6);
        assert!(log_probs[1] < -900.0);
    }

    #[test]
    fn test_argmax_first_wins() {
        assert_eq!(argmax(&[0.1, 0.7, 0.7, 0.2]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_length_normalized() {
        assert_eq!(length_normalized(-2.0, 1, 0.7), -2.0);
        let longer = length_normalized(-2.0, 8, 0.7);
        assert!(longer > -2.0 && longer < 0.0);
    }

    #[test]
    fn test_top_k_stable() {
        let candidates = vec![
            Candidate { index: 3, score: -1.0 },
            Candidate { index: 0, score: -2.0 },
            Candidate { index: 1, score: -1.0 },
            Candidate { index: 2, score: f32::NEG_INFINITY },
        ];
        let best = top_k(candidates, 3);
        let order: Vec<usize> = best.iter().map(|c| c.index).collect();
        assert_eq!(order, vec![1, 3, 0]);
    }
}

use graphoneme::markov::{FusionWeights, MarkovFusion};
use proptest::prelude::*;

fn word() -> impl Strategy<Value = String> {
    "[a-e]{0,6}"
}

fn corpus() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(word(), 1..8)
}

proptest! {
    #[test]
    fn prop_fused_distribution_sums_to_one(
        a in corpus(),
        b in corpus(),
        wa in 0.0f64..5.0,
        wb in 0.01f64..5.0,
        order in 1usize..3,
    ) {
        let mut model = MarkovFusion::new(order);
        model.train("a", &a);
        model.train("b", &b);
        let weights = FusionWeights::new().with("a", wa).with("b", wb);

        for (_, table) in model.corpora() {
            for (context, _) in table.contexts() {
                let fused = model.fused_probabilities(context.as_slice(), &weights);
                if fused.is_empty() {
                    continue;
                }
                let total: f64 = fused.probabilities().iter().sum();
                prop_assert!((total - 1.0).abs() < 1e-9, "sum {}", total);
                prop_assert!(fused.probabilities().iter().all(|&p| p > 0.0));
            }
        }
    }

    #[test]
    fn prop_training_accumulates(first in corpus(), second in corpus()) {
        let mut split = MarkovFusion::new(2);
        split.train("c", &first);
        split.train("c", &second);

        let mut joined = MarkovFusion::new(2);
        joined.train("c", first.iter().chain(second.iter()));

        prop_assert_eq!(split, joined);
    }

    #[test]
    fn prop_json_preserves_probabilities(
        a in corpus(),
        b in corpus(),
        wa in 0.0f64..3.0,
        wb in 1e-6f64..3.0,
    ) {
        let mut model = MarkovFusion::with_default_weights(
            2,
            FusionWeights::new().with("a", wa).with("b", wb),
        );
        model.train("a", &a);
        model.train("b", &b);

        let restored = MarkovFusion::from_json(&model.to_json().unwrap()).unwrap();
        prop_assert_eq!(restored.default_weights(), model.default_weights());
        let weights = model.default_weights().clone();
        for (_, table) in model.corpora() {
            for (context, _) in table.contexts() {
                prop_assert_eq!(
                    model.fused_probabilities(context.as_slice(), &weights),
                    restored.fused_probabilities(context.as_slice(), &weights)
                );
            }
        }
    }
}

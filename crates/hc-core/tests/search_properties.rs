//! Property tests for scoring, training and the complexity search.

use hc_config::SearchConfig;
use hc_core::witness::check_witness;
use hc_core::words::{all_words, competitors, unique_words, Word};
use hc_core::{compute_complexity, ComplexityRule, HiddenMarkovLayer, HiddenMarkovModel};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn quick(seed: u64) -> SearchConfig {
    SearchConfig {
        hmm_searches: 30,
        epochs: 40,
        epoch_searches: 5,
        seed: Some(seed),
        ..SearchConfig::default()
    }
}

#[test]
fn empty_word_scores_one() {
    let mut rng = StdRng::seed_from_u64(0);
    for states in 1..4 {
        let layer = HiddenMarkovLayer::initialize(states, 2, &mut rng).unwrap();
        assert_eq!(layer.score(&[]).unwrap(), 1.0);
    }
}

#[test]
fn em_is_monotone_on_01() {
    let mut rng = StdRng::seed_from_u64(2024);
    let layer = HiddenMarkovLayer::initialize(2, 2, &mut rng).unwrap();
    let mut model = HiddenMarkovModel::new(layer);
    let word = [0, 1];
    let mut last = model.layer().score(&word).unwrap();
    for _ in 0..50 {
        let summary = model.train(&word, 1).unwrap();
        assert!(summary.score >= last - 1e-12, "{} < {}", summary.score, last);
        last = summary.score;
    }
}

#[test]
fn word_0101_complexity_in_range() {
    let report = compute_complexity("0101", &quick(17)).unwrap();
    assert!((2..=5).contains(&report.complexity), "{}", report.complexity);
    assert_eq!(report.rule, ComplexityRule::Search);
}

#[test]
fn unique_words_drop_swapped_pairs() {
    let words: Vec<String> = unique_words(2, 2).iter().map(|w| w.to_string()).collect();
    assert!(!(words.contains(&"01".to_string()) && words.contains(&"10".to_string())));
    assert!(!(words.contains(&"00".to_string()) && words.contains(&"11".to_string())));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn constant_words_have_complexity_one(
        (size, symbol) in (1usize..=10).prop_flat_map(|size| (Just(size), 0..size)),
        len in 1usize..6,
    ) {
        let text: String = std::iter::repeat(char::from(b'0' + symbol as u8)).take(len).collect();
        let config = quick(1).with_size(size);
        let report = compute_complexity(&text, &config).unwrap();
        prop_assert_eq!(report.complexity, 1);
        prop_assert!(report.levels.is_empty());
    }

    #[test]
    fn witness_check_ignores_competitor_order(seed in any::<u64>(), states in 1usize..4, rotate in 0usize..7) {
        let mut rng = StdRng::seed_from_u64(seed);
        let layer = HiddenMarkovLayer::initialize(states, 2, &mut rng).unwrap();
        let word = Word::parse("010", 2).unwrap();
        let others = competitors(&word, 2);
        let mut shuffled = others.clone();
        shuffled.rotate_left(rotate);
        shuffled.reverse();
        let a = check_witness(&layer, &word, &others, 0.0).unwrap();
        let b = check_witness(&layer, &word, &shuffled, 0.0).unwrap();
        prop_assert_eq!(a.witnessed, b.witnessed);
        prop_assert_eq!(a.best_competitor, b.best_competitor);
    }

    #[test]
    fn scores_form_a_distribution(seed in any::<u64>(), states in 1usize..4, len in 1usize..5, size in 2usize..4) {
        let mut rng = StdRng::seed_from_u64(seed);
        let layer = HiddenMarkovLayer::initialize(states, size, &mut rng).unwrap();
        let total: f64 = all_words(len, size)
            .iter()
            .map(|w| layer.score_word(w).unwrap())
            .sum();
        prop_assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn reestimation_keeps_rows_stochastic(seed in any::<u64>(), states in 1usize..5, word in "[01]{1,6}") {
        let mut rng = StdRng::seed_from_u64(seed);
        let layer = HiddenMarkovLayer::initialize(states, 2, &mut rng).unwrap();
        let mut model = HiddenMarkovModel::new(layer);
        let word = Word::parse(&word, 2).unwrap();
        model.train(word.symbols(), 5).unwrap();
        let layer = model.layer();
        for row in layer.transition().rows().iter().chain(layer.emission().rows()) {
            prop_assert!((row.sum() - 1.0).abs() < 1e-9);
            prop_assert!(row.values().iter().all(|v| (0.0..=1.0 + 1e-9).contains(v)));
        }
        prop_assert!((layer.initial().sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unique_words_are_canonical_representatives(len in 0usize..5, size in 1usize..4) {
        let unique = unique_words(len, size);
        for word in &unique {
            prop_assert!(word.is_canonical());
        }
        // No two kept words are relabellings of each other.
        for (i, a) in unique.iter().enumerate() {
            for b in &unique[i + 1..] {
                let same_shape = a.symbols().iter().zip(b.symbols()).all(|(x, y)| {
                    a.symbols().iter().zip(b.symbols()).all(|(x2, y2)| (x == x2) == (y == y2))
                });
                prop_assert!(!same_shape, "{} ~ {}", a, b);
            }
        }
    }
}

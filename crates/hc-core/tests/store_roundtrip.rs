//! Record stores written by one search level and read back for verification.

use hc_config::RecordFormat;
use hc_core::store::{HmmRecord, RecordStore, StoreError};
use hc_core::words::Word;
use hc_core::HiddenMarkovLayer;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

fn assert_close(a: &HiddenMarkovLayer, b: &HiddenMarkovLayer) {
    let (ra, rb) = (HmmRecord::from_layer(a), HmmRecord::from_layer(b));
    assert_eq!(ra.states, rb.states);
    assert_eq!(ra.symbols, rb.symbols);
    let pairs = ra
        .transition
        .iter()
        .flatten()
        .zip(rb.transition.iter().flatten())
        .chain(ra.emission.iter().flatten().zip(rb.emission.iter().flatten()))
        .chain(ra.initial.iter().zip(&rb.initial));
    for (x, y) in pairs {
        assert!((x - y).abs() < 1e-6, "{x} vs {y}");
    }
}

fn roundtrip(format: RecordFormat, states: usize, size: usize) {
    let dir = TempDir::new().expect("temp dir");
    let store = RecordStore::new(dir.path(), format);
    let word = Word::parse("0120", size.max(3)).expect("word");
    let mut rng = StdRng::seed_from_u64(states as u64 * 31 + size as u64);

    let layers: Vec<HiddenMarkovLayer> = (0..5)
        .map(|_| HiddenMarkovLayer::initialize(states, size, &mut rng).expect("layer"))
        .collect();
    let mut writer = store.create(&word, states, size).expect("create");
    for layer in &layers {
        writer.append(layer).expect("append");
    }
    assert_eq!(writer.finish().expect("finish"), layers.len());

    let records = store.read(&word, states, size).expect("read");
    assert_eq!(records.len(), layers.len());
    for (record, layer) in records.iter().zip(&layers) {
        assert_close(&record.to_layer().expect("valid layer"), layer);
    }
}

#[test]
fn jsonl_roundtrip_more_states_than_symbols() {
    roundtrip(RecordFormat::Jsonl, 4, 3);
}

#[test]
fn jsonl_roundtrip_more_symbols_than_states() {
    roundtrip(RecordFormat::Jsonl, 2, 5);
}

#[test]
fn padded_roundtrip_more_states_than_symbols() {
    roundtrip(RecordFormat::Padded, 4, 3);
}

#[test]
fn padded_roundtrip_more_symbols_than_states() {
    roundtrip(RecordFormat::Padded, 2, 5);
}

#[test]
fn padded_roundtrip_square() {
    roundtrip(RecordFormat::Padded, 3, 3);
}

#[test]
fn stores_for_different_levels_are_separate() {
    let dir = TempDir::new().expect("temp dir");
    let store = RecordStore::new(dir.path(), RecordFormat::Padded);
    let word = Word::parse("0110", 2).expect("word");
    let mut rng = StdRng::seed_from_u64(8);

    for states in 2..=3 {
        let mut writer = store.create(&word, states, 2).expect("create");
        for _ in 0..states {
            writer
                .append(&HiddenMarkovLayer::initialize(states, 2, &mut rng).expect("layer"))
                .expect("append");
        }
        writer.finish().expect("finish");
    }

    assert_eq!(store.read(&word, 2, 2).expect("read").len(), 2);
    assert_eq!(store.read(&word, 3, 2).expect("read").len(), 3);
}

#[test]
fn jsonl_store_of_wrong_level_is_malformed() {
    let dir = TempDir::new().expect("temp dir");
    let store = RecordStore::new(dir.path(), RecordFormat::Jsonl);
    let word = Word::parse("0110", 2).expect("word");
    let mut rng = StdRng::seed_from_u64(12);

    let mut writer = store.create(&word, 2, 2).expect("create");
    writer
        .append(&HiddenMarkovLayer::initialize(2, 2, &mut rng).expect("layer"))
        .expect("append");
    writer.finish().expect("finish");
    std::fs::copy(store.path_for(&word, 2, 2), store.path_for(&word, 3, 2)).expect("copy");

    match store.read(&word, 3, 2) {
        Err(StoreError::Malformed { line, .. }) => assert_eq!(line, 1),
        other => panic!("expected a malformed store, got {other:?}"),
    }
}

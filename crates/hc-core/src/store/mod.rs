//! Record stores of non-witnessing layers.
//!
//! One file per `(word, complexity, size)`, truncated when a search level
//! begins and appended to for every layer that failed the witness test.
//! Two codecs are supported:
//! - [`jsonl`]: one self-describing JSON object per layer
//! - [`padded`]: the legacy flat-text blocks padded with `-1`

pub mod jsonl;
pub mod padded;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use hc_config::{RecordFormat, SearchConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hmm::{HiddenMarkovLayer, HmmError};
use crate::words::Word;

/// Errors from reading or writing record stores.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("record store not found: {path}")]
    NotFound { path: PathBuf },

    #[error("{path}:{line}: invalid JSON record: {source}")]
    Json {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path}:{line}: {message}")]
    Malformed {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("record {index} in {path} is not a valid layer: {source}")]
    InvalidLayer {
        path: PathBuf,
        index: usize,
        #[source]
        source: HmmError,
    },
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Plain parameter arrays of one stored layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HmmRecord {
    pub states: usize,
    pub symbols: usize,
    pub transition: Vec<Vec<f64>>,
    pub emission: Vec<Vec<f64>>,
    pub initial: Vec<f64>,
}

impl HmmRecord {
    pub fn from_layer(layer: &HiddenMarkovLayer) -> Self {
        Self {
            states: layer.n_states(),
            symbols: layer.n_symbols(),
            transition: layer.transition().to_values(),
            emission: layer.emission().to_values(),
            initial: layer.initial().values().to_vec(),
        }
    }

    /// Rebuild the layer, checking the declared shape against the arrays.
    pub fn to_layer(&self) -> std::result::Result<HiddenMarkovLayer, HmmError> {
        if self.transition.len() != self.states {
            return Err(HmmError::DimensionMismatch {
                what: "transition rows",
                expected: self.states,
                actual: self.transition.len(),
            });
        }
        if let Some(row) = self.emission.iter().find(|r| r.len() != self.symbols) {
            return Err(HmmError::DimensionMismatch {
                what: "emission columns",
                expected: self.symbols,
                actual: row.len(),
            });
        }
        HiddenMarkovLayer::from_values(
            self.transition.clone(),
            self.emission.clone(),
            self.initial.clone(),
        )
    }
}

/// Location and codec for record stores.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordStore {
    dir: PathBuf,
    format: RecordFormat,
}

impl RecordStore {
    pub fn new(dir: impl Into<PathBuf>, format: RecordFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(config.record_dir.clone(), config.record_format)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn format(&self) -> RecordFormat {
        self.format
    }

    /// `{word}_verification_complexity_{c}_size_{size}.{ext}`
    pub fn file_name(&self, word: &Word, complexity: usize, size: usize) -> String {
        format!(
            "{}_verification_complexity_{}_size_{}.{}",
            word,
            complexity,
            size,
            self.format.extension()
        )
    }

    pub fn path_for(&self, word: &Word, complexity: usize, size: usize) -> PathBuf {
        self.dir.join(self.file_name(word, complexity, size))
    }

    /// Open the store for one level, truncating anything already there.
    pub fn create(&self, word: &Word, complexity: usize, size: usize) -> Result<RecordWriter> {
        fs::create_dir_all(&self.dir).map_err(io_error(&self.dir))?;
        let path = self.path_for(word, complexity, size);
        let file = File::create(&path).map_err(io_error(&path))?;
        Ok(RecordWriter {
            out: BufWriter::new(file),
            path,
            format: self.format,
            written: 0,
        })
    }

    /// Read every record stored for one level.
    pub fn read(&self, word: &Word, complexity: usize, size: usize) -> Result<Vec<HmmRecord>> {
        let path = self.path_for(word, complexity, size);
        if !path.exists() {
            return Err(StoreError::NotFound { path });
        }
        let text = fs::read_to_string(&path).map_err(io_error(&path))?;
        match self.format {
            RecordFormat::Jsonl => jsonl::decode(&text, complexity, size, &path),
            RecordFormat::Padded => padded::decode(&text, complexity, size, &path),
        }
    }
}

/// Appends layers to one open store file.
#[derive(Debug)]
pub struct RecordWriter {
    out: BufWriter<File>,
    path: PathBuf,
    format: RecordFormat,
    written: usize,
}

impl RecordWriter {
    pub fn append(&mut self, layer: &HiddenMarkovLayer) -> Result<()> {
        let record = HmmRecord::from_layer(layer);
        let text = match self.format {
            RecordFormat::Jsonl => jsonl::encode(&record, self.written + 1, &self.path)?,
            RecordFormat::Padded => padded::encode(&record),
        };
        self.out
            .write_all(text.as_bytes())
            .map_err(io_error(&self.path))?;
        self.written += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records appended so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush and close; returns the record count.
    pub fn finish(mut self) -> Result<usize> {
        self.out.flush().map_err(io_error(&self.path))?;
        Ok(self.written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    #[test]
    fn file_name_follows_convention() {
        let word = Word::parse("0101", 2).unwrap();
        let jsonl = RecordStore::new("/tmp", RecordFormat::Jsonl);
        let padded = RecordStore::new("/tmp", RecordFormat::Padded);
        assert_eq!(
            jsonl.file_name(&word, 3, 2),
            "0101_verification_complexity_3_size_2.jsonl"
        );
        assert_eq!(
            padded.file_name(&word, 3, 2),
            "0101_verification_complexity_3_size_2.txt"
        );
    }

    #[test]
    fn create_truncates_previous_contents() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::new(dir.path(), RecordFormat::Jsonl);
        let word = Word::parse("011", 2).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        let mut writer = store.create(&word, 2, 2).unwrap();
        for _ in 0..3 {
            writer
                .append(&HiddenMarkovLayer::initialize(2, 2, &mut rng).unwrap())
                .unwrap();
        }
        assert_eq!(writer.finish().unwrap(), 3);

        let mut writer = store.create(&word, 2, 2).unwrap();
        writer
            .append(&HiddenMarkovLayer::initialize(2, 2, &mut rng).unwrap())
            .unwrap();
        writer.finish().unwrap();

        assert_eq!(store.read(&word, 2, 2).unwrap().len(), 1);
    }

    #[test]
    fn missing_store_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::new(dir.path(), RecordFormat::Padded);
        let word = Word::parse("01", 2).unwrap();
        assert!(matches!(
            store.read(&word, 2, 2),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn record_shape_is_checked() {
        let record = HmmRecord {
            states: 2,
            symbols: 2,
            transition: vec![vec![1.0]],
            emission: vec![vec![0.5, 0.5]],
            initial: vec![1.0],
        };
        assert!(matches!(
            record.to_layer(),
            Err(HmmError::DimensionMismatch { .. })
        ));
    }
}

//! One JSON object per line.

use std::path::Path;

use super::{HmmRecord, Result, StoreError};

pub fn encode(record: &HmmRecord, line: usize, path: &Path) -> Result<String> {
    let mut text = serde_json::to_string(record).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        line,
        source,
    })?;
    text.push('\n');
    Ok(text)
}

/// Parse every non-blank line as a record of a `states`-state layer over
/// `symbols` symbols.
pub fn decode(text: &str, states: usize, symbols: usize, path: &Path) -> Result<Vec<HmmRecord>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            let record: HmmRecord = serde_json::from_str(line).map_err(|source| StoreError::Json {
                path: path.to_path_buf(),
                line: i + 1,
                source,
            })?;
            if record.states != states || record.symbols != symbols {
                return Err(StoreError::Malformed {
                    path: path.to_path_buf(),
                    line: i + 1,
                    message: format!(
                        "record has {} states over {} symbols, store holds {} over {}",
                        record.states, record.symbols, states, symbols
                    ),
                });
            }
            Ok(record)
        })
        .collect()
}

//! Legacy flat-text layout.
//!
//! Each record is `2·states + 4` whitespace-separated rows, every row padded
//! with `-1` to `max(states, symbols) + 1` columns:
//!
//! ```text
//! -1 0 1 ..        transition header (sentinel -1 marks a record start)
//!  i T[i][..]      one row per state
//!  0 0 1 ..        emission header
//!  i E[i][..]      one row per state
//!  0 0 1 ..        initial header
//!  0 π[..]         initial values
//! ```

use std::path::Path;

use super::{HmmRecord, Result, StoreError};

const PAD: f64 = -1.0;

fn push_row(out: &mut String, first: f64, values: impl IntoIterator<Item = f64>, width: usize) {
    let mut row = vec![first];
    row.extend(values);
    row.resize(width, PAD);
    let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
    out.push_str(&cells.join(" "));
    out.push('\n');
}

pub fn encode(record: &HmmRecord) -> String {
    let width = record.states.max(record.symbols) + 1;
    let state_header = || (0..record.states).map(|i| i as f64);
    let mut out = String::new();

    push_row(&mut out, PAD, state_header(), width);
    for (i, row) in record.transition.iter().enumerate() {
        push_row(&mut out, i as f64, row.iter().copied(), width);
    }
    push_row(&mut out, 0.0, (0..record.symbols).map(|j| j as f64), width);
    for (i, row) in record.emission.iter().enumerate() {
        push_row(&mut out, i as f64, row.iter().copied(), width);
    }
    push_row(&mut out, 0.0, state_header(), width);
    push_row(&mut out, 0.0, record.initial.iter().copied(), width);
    out
}

struct Row {
    line: usize,
    cells: Vec<f64>,
}

fn malformed(path: &Path, line: usize, message: impl Into<String>) -> StoreError {
    StoreError::Malformed {
        path: path.to_path_buf(),
        line,
        message: message.into(),
    }
}

fn parse_rows(text: &str, path: &Path) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let cells = line
            .split_whitespace()
            .map(str::parse::<f64>)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| malformed(path, i + 1, format!("not a number: {e}")))?;
        rows.push(Row {
            line: i + 1,
            cells,
        });
    }
    Ok(rows)
}

fn take(row: &Row, count: usize, path: &Path) -> Result<Vec<f64>> {
    row.cells
        .get(1..=count)
        .map(<[f64]>::to_vec)
        .ok_or_else(|| {
            malformed(
                path,
                row.line,
                format!("expected at least {} columns, found {}", count + 1, row.cells.len()),
            )
        })
}

/// Read every record of a store holding `states`-state layers over `symbols` symbols.
pub fn decode(text: &str, states: usize, symbols: usize, path: &Path) -> Result<Vec<HmmRecord>> {
    let rows = parse_rows(text, path)?;
    let span = 2 * states + 4;
    let starts: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row.cells.first() == Some(&PAD))
        .map(|(i, _)| i)
        .collect();

    let mut records = Vec::with_capacity(starts.len());
    for start in starts {
        let block = rows.get(start..start + span).ok_or_else(|| {
            malformed(path, rows[start].line, "record truncated")
        })?;
        let emission_header = &block[states + 1];
        if emission_header.cells.first() != Some(&0.0) {
            return Err(malformed(
                path,
                emission_header.line,
                "expected emission header",
            ));
        }
        let transition = block[1..=states]
            .iter()
            .map(|row| take(row, states, path))
            .collect::<Result<Vec<_>>>()?;
        let emission = block[states + 2..2 * states + 2]
            .iter()
            .map(|row| take(row, symbols, path))
            .collect::<Result<Vec<_>>>()?;
        let initial = take(&block[2 * states + 3], states, path)?;
        records.push(HmmRecord {
            states,
            symbols,
            transition,
            emission,
            initial,
        });
    }
    Ok(records)
}

//! Words over a digit alphabet and their enumeration.

use std::fmt;

use hc_config::MAX_ALPHABET_SIZE;
use serde::{Serialize, Serializer};

use crate::hmm::HmmError;

/// A sequence of symbol indices over an alphabet of `size` digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Word {
    symbols: Vec<usize>,
}

/// Reject alphabet sizes whose symbols are not single digits.
pub fn check_alphabet(size: usize) -> Result<(), HmmError> {
    if size == 0 || size > MAX_ALPHABET_SIZE {
        return Err(HmmError::InvalidAlphabet {
            size,
            max: MAX_ALPHABET_SIZE,
        });
    }
    Ok(())
}

impl Word {
    /// Parse a digit string, rejecting symbols outside `0..size`.
    pub fn parse(text: &str, size: usize) -> Result<Self, HmmError> {
        check_alphabet(size)?;
        let symbols = text
            .chars()
            .enumerate()
            .map(|(position, c)| match c.to_digit(10) {
                Some(d) if (d as usize) < size => Ok(d as usize),
                _ => Err(HmmError::InvalidSymbol {
                    symbol: c,
                    position,
                    size,
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { symbols })
    }

    pub fn from_symbols(symbols: Vec<usize>) -> Self {
        Self { symbols }
    }

    pub fn empty() -> Self {
        Self { symbols: Vec::new() }
    }

    pub fn symbols(&self) -> &[usize] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Number of different symbols that occur in the word.
    pub fn distinct_symbols(&self) -> usize {
        let mut seen = [false; MAX_ALPHABET_SIZE];
        let mut count = 0;
        for &s in &self.symbols {
            if let Some(slot) = seen.get_mut(s) {
                if !*slot {
                    *slot = true;
                    count += 1;
                }
            }
        }
        count
    }

    /// True when symbols first appear in the order 0, 1, 2, ...
    ///
    /// Every class of words related by relabelling symbols has exactly one
    /// such member, and it is the first of its class in lexicographic order.
    pub fn is_canonical(&self) -> bool {
        let mut next = 0;
        for &s in &self.symbols {
            if s == next {
                next += 1;
            } else if s > next {
                return false;
            }
        }
        true
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &s in &self.symbols {
            write!(f, "{}", s)?;
        }
        Ok(())
    }
}

impl Serialize for Word {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Every word of `length` over `size` symbols, in lexicographic order.
pub fn all_words(length: usize, size: usize) -> Vec<Word> {
    if size == 0 {
        return if length == 0 { vec![Word::empty()] } else { Vec::new() };
    }
    let total = size.checked_pow(length as u32).unwrap_or(usize::MAX);
    let mut words = Vec::with_capacity(total.min(1 << 20));
    let mut current = vec![0usize; length];
    loop {
        words.push(Word::from_symbols(current.clone()));
        // odometer increment from the last position
        let mut pos = length;
        loop {
            if pos == 0 {
                return words;
            }
            pos -= 1;
            current[pos] += 1;
            if current[pos] < size {
                break;
            }
            current[pos] = 0;
        }
    }
}

/// One word per class under symbol-pair swaps, keeping the first seen.
///
/// Repeated swaps generate every relabelling of the alphabet, so the kept
/// words are exactly the canonical ones (see [`Word::is_canonical`]).
pub fn unique_words(length: usize, size: usize) -> Vec<Word> {
    all_words(length, size)
        .into_iter()
        .filter(Word::is_canonical)
        .collect()
}

/// All words of the target's length except the target itself.
pub fn competitors(word: &Word, size: usize) -> Vec<Word> {
    all_words(word.len(), size)
        .into_iter()
        .filter(|w| w != word)
        .collect()
}

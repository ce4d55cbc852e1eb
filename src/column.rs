//! Excel-style column letter resolution.
//!
//! Column letters are base-26 with no zero digit: A=1, Z=26, AA=27, AB=28
//! and so on. Rules reference columns by letter in the configuration file;
//! they are resolved to numeric indices once, at load time.

use std::fmt;
use thiserror::Error;

/// Raised when a configured column letter is not `[A-Za-z]+`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid column letters {0:?}: expected one or more ASCII letters (A, B, ..., Z, AA, ...)")]
pub struct InvalidColumnError(pub String);

/// A resolved, 1-indexed spreadsheet column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColumnRef(u32);

impl ColumnRef {
    /// Resolve a column letter string (case-insensitive) to a column index.
    pub fn resolve(letters: &str) -> Result<Self, InvalidColumnError> {
        if letters.is_empty() || !letters.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(InvalidColumnError(letters.to_string()));
        }

        let mut index: u32 = 0;
        for byte in letters.bytes() {
            let digit = u32::from(byte.to_ascii_uppercase() - b'A') + 1;
            index = index
                .checked_mul(26)
                .and_then(|i| i.checked_add(digit))
                .ok_or_else(|| InvalidColumnError(letters.to_string()))?;
        }

        Ok(Self(index))
    }

    /// The 1-indexed column number (A=1).
    pub fn index(self) -> u32 {
        self.0
    }

    /// The uppercase letter form, used for diagnostics and logging.
    pub fn to_letters(self) -> String {
        let mut letters = String::new();
        let mut n = self.0;
        while n > 0 {
            n -= 1;
            letters.insert(0, char::from(b'A' + (n % 26) as u8));
            n /= 26;
        }
        letters
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_letters())
    }
}

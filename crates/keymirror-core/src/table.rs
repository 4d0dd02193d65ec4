// Keymirror Key Code Table
// Left-hand row to mirrored right-hand row lookup

use indexmap::IndexMap;

use crate::key::key_from_name;
use crate::Key;

/// Row pairs mirrored by default: each left row maps onto the reversed right row,
/// so `q` becomes `p`, `a` becomes `;` and `z` becomes `/`.
pub const DEFAULT_ROWS: [(&str, &str); 3] = [
    ("qwert", "yuiop"),
    ("asdfg", "hjkl;"),
    ("zxcvb", "nm,./"),
];

/// Errors raised while building a key table
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TableError {
    #[error("Unknown key symbol: {0:?}")]
    UnknownKey(String),

    #[error("Row length mismatch: {left:?} has {left_len} keys, {right:?} has {right_len}")]
    RowLengthMismatch {
        left: String,
        left_len: usize,
        right: String,
        right_len: usize,
    },
}

/// Resolve a single key symbol as it appears in a row string.
pub fn key_from_symbol(symbol: char) -> Option<Key> {
    let name = match symbol {
        ';' => "SEMICOLON".to_string(),
        ',' => "COMMA".to_string(),
        '.' => "DOT".to_string(),
        '/' => "SLASH".to_string(),
        c if c.is_ascii_alphanumeric() => c.to_ascii_uppercase().to_string(),
        _ => return None,
    };
    key_from_name(&name)
}

/// Immutable mapping from a left-hand key to its mirrored right-hand key.
///
/// Lookups only go one way; the right-hand keys are not in the domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyTable {
    mappings: IndexMap<Key, Key>,
}

impl KeyTable {
    /// Table for [`DEFAULT_ROWS`].
    pub fn mirrored() -> Result<Self, TableError> {
        Self::from_rows(DEFAULT_ROWS)
    }

    /// Build a table from `(left, right)` row pairs, consuming each right row in reverse.
    pub fn from_rows<'a, I>(rows: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut mappings = IndexMap::new();

        for (left, right) in rows {
            let left_keys = resolve_row(left)?;
            let right_keys = resolve_row(right)?;

            if left_keys.len() != right_keys.len() {
                return Err(TableError::RowLengthMismatch {
                    left: left.to_string(),
                    left_len: left_keys.len(),
                    right: right.to_string(),
                    right_len: right_keys.len(),
                });
            }

            for (from, to) in left_keys.into_iter().zip(right_keys.into_iter().rev()) {
                mappings.insert(from, to);
            }
        }

        log::debug!("Key table built with {} mirrored keys", mappings.len());
        Ok(Self { mappings })
    }

    /// Mirrored counterpart of `key`, if it is in the table's domain.
    pub fn get(&self, key: Key) -> Option<Key> {
        self.mappings.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Pairs in row order.
    pub fn iter(&self) -> impl Iterator<Item = (Key, Key)> + '_ {
        self.mappings.iter().map(|(from, to)| (*from, *to))
    }

    /// Keys the table can produce; the output device must advertise them.
    pub fn mirrored_keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.mappings.values().copied()
    }
}

fn resolve_row(row: &str) -> Result<Vec<Key>, TableError> {
    row.chars()
        .map(|symbol| key_from_symbol(symbol).ok_or_else(|| TableError::UnknownKey(symbol.to_string())))
        .collect()
}

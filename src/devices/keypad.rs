// MIT License - Copyright (c) 2026 Peter Wright

use std::fmt;

use serde::Serialize;
use tracing::trace;

use crate::constants::{BACKSPACE_KEY, CONFIRM_KEY, KEYMAP, KEYPAD_COLS, KEYPAD_ROWS};
use crate::error::Result;
use crate::hal::{ColumnMask, KeypadMatrix};

/// A logical key on the 16-key pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Key {
    Digit(u8),
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Key {
    /// Parse a printed key character (case-insensitive for letters).
    pub fn from_char(ch: char) -> Option<Self> {
        match ch.to_ascii_uppercase() {
            d @ '0'..='9' => Some(Self::Digit(d as u8 - b'0')),
            'A' => Some(Self::A),
            'B' => Some(Self::B),
            'C' => Some(Self::C),
            'D' => Some(Self::D),
            'E' => Some(Self::E),
            'F' => Some(Self::F),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Self::Digit(d) => (b'0' + d) as char,
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
            Self::E => 'E',
            Self::F => 'F',
        }
    }

    pub fn is_digit(&self) -> bool {
        matches!(self, Self::Digit(_))
    }

    pub fn is_confirm(&self) -> bool {
        self.as_char() == CONFIRM_KEY
    }

    pub fn is_backspace(&self) -> bool {
        self.as_char() == BACKSPACE_KEY
    }

    /// Key printed at a matrix cell.
    pub fn at(row: u8, col: u8) -> Option<Self> {
        if row >= KEYPAD_ROWS || col >= KEYPAD_COLS {
            return None;
        }
        Self::from_char(KEYMAP[(row * KEYPAD_COLS + col) as usize])
    }

    /// Matrix cell (row, column) carrying this key.
    pub fn position(&self) -> (u8, u8) {
        let ch = self.as_char();
        let idx = KEYMAP.iter().position(|&k| k == ch).unwrap_or(0) as u8;
        (idx / KEYPAD_COLS, idx % KEYPAD_COLS)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Sweeps the key matrix and resolves it to at most one key.
///
/// Rows are driven 0..=3 and, within each row, columns are checked 0..=3.
/// When several cells read pressed in one sweep the last cell visited wins:
/// a later row overrides an earlier one, and a later column overrides an
/// earlier column in the same row. Callers rely on this to get a single
/// deterministic key per call; it is not a multi-key debounce.
///
/// Contact bounce is handled by the caller, which waits a settle delay after
/// each scan before acting on the result.
#[derive(Debug)]
pub struct KeypadScanner<M> {
    matrix: M,
}

impl<M: KeypadMatrix> KeypadScanner<M> {
    pub fn new(matrix: M) -> Self {
        Self { matrix }
    }

    pub fn scan(&mut self) -> Result<Option<Key>> {
        let mut key = None;
        for row in 0..KEYPAD_ROWS {
            self.matrix.select_row(row)?;
            let cols = self.matrix.read_columns()?;
            for col in 0..KEYPAD_COLS {
                if cols.contains(ColumnMask::column(col)) {
                    key = Key::at(row, col);
                }
            }
        }
        if let Some(k) = key {
            trace!("Keypad scan resolved key {k}");
        }
        Ok(key)
    }

    pub fn matrix(&self) -> &M {
        &self.matrix
    }

    pub fn matrix_mut(&mut self) -> &mut M {
        &mut self.matrix
    }
}

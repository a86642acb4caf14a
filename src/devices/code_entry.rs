// MIT License - Copyright (c) 2026 Peter Wright

use std::fmt;

use crate::constants::{CODE_LEN, PROMPT_CONFIRM, PROMPT_EMPTY_SLOT, PROMPT_FILLED_SLOT, PROMPT_PREFIX};
use crate::devices::keypad::Key;
use crate::error::{PanelError, Result};

/// The reference code digits are compared against.
///
/// Fixed for the lifetime of a panel. `Debug` and `Display` never reveal the digits.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessCode([Key; CODE_LEN]);

impl AccessCode {
    /// Parse a code made of exactly four digit keys.
    pub fn parse(code: &str) -> Result<Self> {
        let invalid = |reason: &str| PanelError::InvalidAccessCode {
            length: code.chars().count(),
            reason: reason.to_string(),
        };

        let keys: Vec<Key> = code
            .chars()
            .map(|ch| Key::from_char(ch).filter(Key::is_digit))
            .collect::<Option<_>>()
            .ok_or_else(|| invalid("only digit keys are allowed"))?;

        let keys: [Key; CODE_LEN] = keys
            .try_into()
            .map_err(|_| invalid(&format!("must be exactly {CODE_LEN} digits")))?;
        Ok(Self(keys))
    }

    pub fn keys(&self) -> &[Key] {
        &self.0
    }
}

impl fmt::Debug for AccessCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessCode(****)")
    }
}

/// Outcome of feeding one scan result into the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryEvent {
    /// Key had no effect on the buffer.
    Ignored,
    /// A digit was appended and the buffer still has room.
    Appended,
    /// The last digit was removed.
    BackspaceApplied,
    /// A digit was appended and filled the buffer; the confirm key now triggers a check.
    ReadyToConfirm,
}

/// Digits typed so far, in entry order. Never longer than [`CODE_LEN`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeBuffer {
    keys: Vec<Key>,
}

impl CodeBuffer {
    pub fn new() -> Self {
        Self {
            keys: Vec::with_capacity(CODE_LEN),
        }
    }

    /// Apply one scan result.
    ///
    /// A full buffer ignores everything; the controller alone decides what a
    /// confirm key means at that point. Letter keys other than backspace and
    /// "no key" are ignored.
    pub fn feed(&mut self, key: Option<Key>) -> EntryEvent {
        if self.is_full() {
            return EntryEvent::Ignored;
        }
        let Some(key) = key else {
            return EntryEvent::Ignored;
        };
        match key {
            Key::C => {
                if self.keys.pop().is_some() {
                    EntryEvent::BackspaceApplied
                } else {
                    EntryEvent::Ignored
                }
            }
            Key::A | Key::B | Key::D | Key::E | Key::F => EntryEvent::Ignored,
            Key::Digit(_) => {
                self.keys.push(key);
                if self.is_full() {
                    EntryEvent::ReadyToConfirm
                } else {
                    EntryEvent::Appended
                }
            }
        }
    }

    /// Compare the buffer with `stored`. Clears the buffer only on a match.
    pub fn check_and_clear(&mut self, stored: &AccessCode) -> bool {
        if self.keys.as_slice() == stored.keys() {
            self.clear();
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.keys.len() >= CODE_LEN
    }

    /// Second display line for code entry: `Code:**__`, or the confirm prompt when full.
    pub fn prompt(&self) -> String {
        if self.is_full() {
            return PROMPT_CONFIRM.to_string();
        }
        let mut line = String::from(PROMPT_PREFIX);
        line.extend(std::iter::repeat_n(PROMPT_FILLED_SLOT, self.len()));
        line.extend(std::iter::repeat_n(PROMPT_EMPTY_SLOT, CODE_LEN - self.len()));
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_str(buf: &mut CodeBuffer, keys: &str) -> Vec<EntryEvent> {
        keys.chars().map(|c| buf.feed(Key::from_char(c))).collect()
    }

    #[test]
    fn test_append_until_full() {
        let mut buf = CodeBuffer::new();
        let events = feed_str(&mut buf, "1234");
        assert_eq!(
            events,
            vec![
                EntryEvent::Appended,
                EntryEvent::Appended,
                EntryEvent::Appended,
                EntryEvent::ReadyToConfirm
            ]
        );
        assert!(buf.is_full());
        // Full buffer ignores further digits and backspace
        assert_eq!(buf.feed(Some(Key::Digit(5))), EntryEvent::Ignored);
        assert_eq!(buf.feed(Some(Key::C)), EntryEvent::Ignored);
        assert_eq!(buf.len(), 4);
    }

    #[test]
    fn test_backspace_removes_last() {
        let mut buf = CodeBuffer::new();
        feed_str(&mut buf, "123");
        assert_eq!(buf.feed(Some(Key::C)), EntryEvent::BackspaceApplied);
        assert_eq!(buf.len(), 2);
        feed_str(&mut buf, "94");
        assert!(buf.check_and_clear(&AccessCode::parse("1294").unwrap()));
    }

    #[test]
    fn test_backspace_on_empty_is_ignored() {
        let mut buf = CodeBuffer::new();
        assert_eq!(buf.feed(Some(Key::C)), EntryEvent::Ignored);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_reserved_keys_and_no_key_ignored() {
        let mut buf = CodeBuffer::new();
        for key in [Key::A, Key::B, Key::D, Key::E, Key::F] {
            assert_eq!(buf.feed(Some(key)), EntryEvent::Ignored);
        }
        assert_eq!(buf.feed(None), EntryEvent::Ignored);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_check_and_clear() {
        let code = AccessCode::parse("1234").unwrap();
        let mut buf = CodeBuffer::new();
        feed_str(&mut buf, "1243");
        assert!(!buf.check_and_clear(&code));
        // Mismatch leaves clearing to the caller
        assert_eq!(buf.len(), 4);
        buf.clear();
        feed_str(&mut buf, "1234");
        assert!(buf.check_and_clear(&code));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_partial_buffer_never_matches() {
        let code = AccessCode::parse("1234").unwrap();
        let mut buf = CodeBuffer::new();
        feed_str(&mut buf, "123");
        assert!(!buf.check_and_clear(&code));
    }

    #[test]
    fn test_prompt() {
        let mut buf = CodeBuffer::new();
        assert_eq!(buf.prompt(), "Code:____");
        feed_str(&mut buf, "7");
        assert_eq!(buf.prompt(), "Code:*___");
        feed_str(&mut buf, "88");
        assert_eq!(buf.prompt(), "Code:***_");
        feed_str(&mut buf, "9");
        assert_eq!(buf.prompt(), "Press B to set");
    }

    #[test]
    fn test_access_code_parse() {
        assert!(AccessCode::parse("0000").is_ok());
        assert!(AccessCode::parse("123").is_err());
        assert!(AccessCode::parse("12345").is_err());
        assert!(AccessCode::parse("12B4").is_err());
        assert!(AccessCode::parse("12 4").is_err());
        assert_eq!(
            format!("{:?}", AccessCode::parse("1234").unwrap()),
            "AccessCode(****)"
        );
    }
}

// MIT License - Copyright (c) 2026 Peter Wright

use std::time::Duration;

/// Number of digits in an access code.
pub const CODE_LEN: usize = 4;

/// Keypad matrix dimensions.
pub const KEYPAD_ROWS: u8 = 4;
pub const KEYPAD_COLS: u8 = 4;

/// Characters printed on the keypad, row-major (row 0..3, column 0..3).
pub const KEYMAP: [char; 16] = [
    'F', 'E', 'D', 'C', //
    '3', '6', '9', 'B', //
    '2', '5', '8', '0', //
    '1', '4', '7', 'A', //
];

/// Key that submits a full code buffer for checking.
pub const CONFIRM_KEY: char = 'B';
/// Key that deletes the last entered digit, and acknowledges a report.
pub const BACKSPACE_KEY: char = 'C';

/// Display geometry (two lines of sixteen characters).
pub const DISPLAY_COLUMNS: u8 = 16;
pub const DISPLAY_ROWS: u8 = 2;

/// Code prompt glyphs.
pub const PROMPT_PREFIX: &str = "Code:";
pub const PROMPT_EMPTY_SLOT: char = '_';
pub const PROMPT_FILLED_SLOT: char = '*';
pub const PROMPT_CONFIRM: &str = "Press B to set";
pub const REPORT_CLEAR_HINT: &str = "C key to clear";

/// Alarm cause strings shown in the report state.
pub const CAUSE_WRONG_KEY: &str = "WRONG KEY";
pub const CAUSE_FULLSET_PREFIX: &str = "FULLSET";
pub const CAUSE_ENTRY_TIMEOUT: &str = "EXIT/ENTRY SET";

/// Default timings.
pub const DEFAULT_EXIT_DELAY: Duration = Duration::from_secs(60);
pub const DEFAULT_ENTRY_DELAY: Duration = Duration::from_secs(120);
pub const DEFAULT_ALARM_LIGHT_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_BLINK_HALF_PERIOD: Duration = Duration::from_millis(500);
pub const DEFAULT_KEY_SETTLE: Duration = Duration::from_millis(100);

pub const DEFAULT_ACCESS_CODE: &str = "1234";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keymap_has_every_hex_digit_once() {
        let mut seen: Vec<char> = KEYMAP.to_vec();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 16);
        assert!(KEYMAP.iter().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_display_strings_fit() {
        assert!(PROMPT_CONFIRM.len() <= DISPLAY_COLUMNS as usize);
        assert!(REPORT_CLEAR_HINT.len() <= DISPLAY_COLUMNS as usize);
        assert!(CAUSE_ENTRY_TIMEOUT.len() <= DISPLAY_COLUMNS as usize);
    }
}

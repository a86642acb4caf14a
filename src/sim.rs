// MIT License - Copyright (c) 2026 Peter Wright

//! In-memory hardware for the console simulator and for tests.
//!
//! Every type here is a cheap handle around shared state: clone one, give
//! the clone to [`AlarmPanel`](crate::panel::AlarmPanel), and keep the
//! first handle to press keys, trip sensors and inspect the display.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::constants::{DISPLAY_COLUMNS, DISPLAY_ROWS};
use crate::devices::keypad::Key;
use crate::error::{PanelError, Result};
use crate::hal::{ColumnMask, Display, IndicatorLine, KeypadMatrix, SensorBus, SensorGroup};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct KeypadState {
    /// Keys held during each upcoming sweep.
    sweeps: VecDeque<Vec<Key>>,
    /// Keys held during the sweep in progress.
    held: Vec<Key>,
    row: u8,
}

/// Simulated key matrix.
///
/// Each queued press is held for exactly one scan sweep, which starts when
/// row 0 is driven. With nothing queued every sweep reads no key.
#[derive(Debug, Clone, Default)]
pub struct SimKeypad {
    state: Arc<Mutex<KeypadState>>,
}

impl SimKeypad {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a single key for the next free sweep.
    pub fn press(&self, key: Key) {
        lock(&self.state).sweeps.push_back(vec![key]);
    }

    /// Queue several keys held down together during one sweep.
    pub fn press_chord(&self, keys: &[Key]) {
        lock(&self.state).sweeps.push_back(keys.to_vec());
    }

    /// Queue one sweep per character.
    pub fn type_keys(&self, keys: &str) -> Result<()> {
        let parsed = parse_keys(keys)?;
        let mut state = lock(&self.state);
        state.sweeps.extend(parsed.into_iter().map(|k| vec![k]));
        Ok(())
    }

    /// Queue an idle sweep (nothing pressed).
    pub fn release(&self) {
        lock(&self.state).sweeps.push_back(Vec::new());
    }

    /// Sweeps still waiting to be scanned.
    pub fn pending(&self) -> usize {
        lock(&self.state).sweeps.len()
    }
}

/// Parse printed key characters, e.g. `"1234B"`.
pub fn parse_keys(keys: &str) -> Result<Vec<Key>> {
    keys.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| {
            Key::from_char(c).ok_or_else(|| PanelError::Hardware {
                details: format!("no key labelled {c:?}"),
            })
        })
        .collect()
}

impl KeypadMatrix for SimKeypad {
    fn select_row(&mut self, row: u8) -> Result<()> {
        let mut state = lock(&self.state);
        if row == 0 {
            state.held = state.sweeps.pop_front().unwrap_or_default();
        }
        state.row = row;
        Ok(())
    }

    fn read_columns(&mut self) -> Result<ColumnMask> {
        let state = lock(&self.state);
        Ok(state
            .held
            .iter()
            .map(Key::position)
            .filter(|(row, _)| *row == state.row)
            .fold(ColumnMask::empty(), |mask, (_, col)| {
                mask | ColumnMask::column(col)
            }))
    }
}

/// Simulated sensor bus holding one raw 8-bit reading.
#[derive(Debug, Clone, Default)]
pub struct SimSensors {
    raw: Arc<AtomicU8>,
    selected: Option<SensorGroup>,
}

impl SimSensors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the combined reading (`group_a * 16 + group_b`).
    pub fn set_raw(&self, raw: u8) {
        self.raw.store(raw, Ordering::SeqCst);
    }

    /// Close every sensor line.
    pub fn clear(&self) {
        self.set_raw(0);
    }

    pub fn raw(&self) -> u8 {
        self.raw.load(Ordering::SeqCst)
    }
}

impl SensorBus for SimSensors {
    fn select_group(&mut self, group: SensorGroup) -> Result<()> {
        self.selected = Some(group);
        Ok(())
    }

    fn read_group(&mut self) -> Result<u8> {
        let raw = self.raw();
        match self.selected {
            Some(SensorGroup::A) => Ok(raw >> 4),
            Some(SensorGroup::B) => Ok(raw & 0x0F),
            None => Err(PanelError::Hardware {
                details: "sensor group read before select".to_string(),
            }),
        }
    }
}

#[derive(Debug)]
struct Screen {
    cells: Vec<Vec<char>>,
    column: usize,
    row: usize,
}

impl Default for Screen {
    fn default() -> Self {
        Self {
            cells: vec![vec![' '; DISPLAY_COLUMNS as usize]; DISPLAY_ROWS as usize],
            column: 0,
            row: 0,
        }
    }
}

/// Simulated 2x16 character display. Text past the right edge is dropped.
#[derive(Debug, Clone, Default)]
pub struct SimDisplay {
    screen: Arc<Mutex<Screen>>,
    revision: Arc<AtomicU64>,
}

impl SimDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// One display line with trailing blanks removed.
    pub fn line(&self, row: u8) -> String {
        lock(&self.screen)
            .cells
            .get(row as usize)
            .map(|cells| cells.iter().collect::<String>().trim_end().to_string())
            .unwrap_or_default()
    }

    pub fn lines(&self) -> Vec<String> {
        (0..DISPLAY_ROWS).map(|row| self.line(row)).collect()
    }

    /// Bumped on every write or clear.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }
}

impl Display for SimDisplay {
    fn move_cursor(&mut self, column: u8, row: u8) {
        let mut screen = lock(&self.screen);
        screen.column = column as usize;
        screen.row = row as usize;
    }

    fn write_text(&mut self, text: &str) {
        let mut screen = lock(&self.screen);
        let row = screen.row;
        let mut column = screen.column;
        if let Some(cells) = screen.cells.get_mut(row) {
            for ch in text.chars() {
                let Some(cell) = cells.get_mut(column) else {
                    break;
                };
                *cell = ch;
                column += 1;
            }
        }
        screen.column = column;
        self.revision.fetch_add(1, Ordering::SeqCst);
    }

    fn clear(&mut self) {
        *lock(&self.screen) = Screen::default();
        self.revision.fetch_add(1, Ordering::SeqCst);
    }
}

/// Simulated indicator light.
#[derive(Debug, Default)]
pub struct SimIndicator {
    on: AtomicBool,
    toggles: AtomicU64,
}

impl SimIndicator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of level changes seen so far.
    pub fn toggles(&self) -> u64 {
        self.toggles.load(Ordering::SeqCst)
    }
}

impl IndicatorLine for SimIndicator {
    fn write(&self, on: bool) {
        if self.on.swap(on, Ordering::SeqCst) != on {
            self.toggles.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn level(&self) -> bool {
        self.on.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::keypad::KeypadScanner;
    use crate::devices::sensor::SensorClassifier;

    #[test]
    fn test_keypad_one_press_per_sweep() {
        let keypad = SimKeypad::new();
        keypad.type_keys("12").unwrap();
        let mut scanner = KeypadScanner::new(keypad.clone());
        assert_eq!(scanner.scan().unwrap(), Some(Key::Digit(1)));
        assert_eq!(scanner.scan().unwrap(), Some(Key::Digit(2)));
        assert_eq!(scanner.scan().unwrap(), None);
        assert_eq!(keypad.pending(), 0);

        // An idle sweep separates two presses of the same key
        keypad.press(Key::B);
        keypad.release();
        keypad.press(Key::B);
        assert_eq!(keypad.pending(), 3);
        assert_eq!(scanner.scan().unwrap(), Some(Key::B));
        assert_eq!(scanner.scan().unwrap(), None);
        assert_eq!(scanner.scan().unwrap(), Some(Key::B));
    }

    #[test]
    fn test_keypad_chord_last_wins() {
        let keypad = SimKeypad::new();
        // '2' sits at (2, 0), '4' at (3, 1)
        keypad.press_chord(&[Key::Digit(4), Key::Digit(2)]);
        let mut scanner = KeypadScanner::new(keypad);
        assert_eq!(scanner.scan().unwrap(), Some(Key::Digit(4)));
    }

    #[test]
    fn test_parse_keys_rejects_unknown() {
        assert_eq!(parse_keys("1 2").unwrap(), vec![Key::Digit(1), Key::Digit(2)]);
        assert!(parse_keys("1x").is_err());
    }

    #[test]
    fn test_sensors_split_into_groups() {
        let sensors = SimSensors::new();
        sensors.set_raw(0xA7);
        let mut classifier = SensorClassifier::new(sensors.clone());
        assert_eq!(classifier.read().unwrap().raw(), 0xA7);
        sensors.clear();
        assert_eq!(classifier.read().unwrap().raw(), 0);
    }

    #[test]
    fn test_sensor_read_without_select_fails() {
        let mut sensors = SimSensors::new();
        assert!(sensors.read_group().is_err());
    }

    #[test]
    fn test_display_writes_and_clips() {
        let mut display = SimDisplay::new();
        display.move_cursor(0, 1);
        display.write_text("Code:*___");
        assert_eq!(display.line(1), "Code:*___");
        display.move_cursor(14, 0);
        display.write_text("ABCDEF");
        assert_eq!(display.line(0), format!("{}AB", " ".repeat(14)));
        let rev = display.revision();
        display.clear();
        assert_eq!(display.lines(), vec![String::new(), String::new()]);
        assert!(display.revision() > rev);
    }

    #[test]
    fn test_indicator_counts_changes() {
        let led = SimIndicator::new();
        led.write(true);
        led.write(true);
        led.write(false);
        assert!(!led.level());
        assert_eq!(led.toggles(), 2);
    }
}

// MIT License - Copyright (c) 2026 Peter Wright

pub mod code_entry;
pub mod indicator;
pub mod keypad;
pub mod sensor;

pub use code_entry::{AccessCode, CodeBuffer, EntryEvent};
pub use indicator::{Indicator, IndicatorMode};
pub use keypad::{Key, KeypadScanner};
pub use sensor::{SensorClassifier, SensorSnapshot, ZoneSignals};

// MIT License - Copyright (c) 2026 Peter Wright

//! Hardware collaborator traits.
//!
//! The control logic never touches pins directly. A board support layer (or
//! the [`sim`](crate::sim) module) implements these traits and hands them to
//! [`AlarmPanel`](crate::panel::AlarmPanel).

use bitflags::bitflags;

use crate::error::Result;

bitflags! {
    /// Keypad column lines asserted during a row scan.
    ///
    /// Bit `n` set means column `n` reads pressed while the selected row is driven.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ColumnMask: u8 {
        const COL0 = 0b0001;
        const COL1 = 0b0010;
        const COL2 = 0b0100;
        const COL3 = 0b1000;
    }
}

impl ColumnMask {
    /// Mask for a single column index (0..=3). Only the low two bits of
    /// `index` are used.
    pub fn column(index: u8) -> Self {
        Self::from_bits_truncate(1 << (index & 0b11))
    }

    /// Convert a raw nibble read from active-low column lines.
    ///
    /// The physical columns idle high and are pulled low by a pressed key.
    pub fn from_active_low(raw: u8) -> Self {
        Self::from_bits_truncate(!raw)
    }
}

/// Which half of the sensor bus to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorGroup {
    /// High nibble of the combined reading.
    A,
    /// Low nibble of the combined reading.
    B,
}

/// Row-driven 4x4 key matrix.
pub trait KeypadMatrix {
    /// Drive exactly one row line active (0..=3).
    fn select_row(&mut self, row: u8) -> Result<()>;

    /// Read the columns asserted for the currently driven row.
    fn read_columns(&mut self) -> Result<ColumnMask>;
}

/// Two 4-bit sensor groups behind a shared selector.
pub trait SensorBus {
    fn select_group(&mut self, group: SensorGroup) -> Result<()>;

    /// Read the selected group. Only the low four bits are meaningful.
    fn read_group(&mut self) -> Result<u8>;
}

/// Two-line fixed-width text surface. Writes are fire-and-forget.
pub trait Display {
    fn move_cursor(&mut self, column: u8, row: u8);

    fn write_text(&mut self, text: &str);

    fn clear(&mut self);
}

/// Single binary indicator output.
///
/// Shared between the polling loop and the blink task, so writes go through
/// `&self` and must be atomic.
pub trait IndicatorLine: Send + Sync + 'static {
    fn write(&self, on: bool);

    fn level(&self) -> bool;
}

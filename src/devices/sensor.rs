// MIT License - Copyright (c) 2026 Peter Wright

use serde::Serialize;
use tracing::trace;

use crate::error::Result;
use crate::hal::{SensorBus, SensorGroup};

/// One reading of the sensor bus, `group_a * 16 + group_b`.
///
/// The bus is split into two zones by decimal arithmetic rather than a bit
/// mask: the exit/entry zone is `raw % 10` and the fully-armed zone is the
/// rest. This decides which physical lines start an entry sequence and
/// which raise an alarm, so the arithmetic must stay exactly as it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SensorSnapshot {
    raw: u8,
}

impl SensorSnapshot {
    pub fn from_raw(raw: u8) -> Self {
        Self { raw }
    }

    /// Combine the two 4-bit groups. Bits above the nibble are dropped.
    pub fn from_groups(group_a: u8, group_b: u8) -> Self {
        Self {
            raw: ((group_a & 0x0F) << 4) | (group_b & 0x0F),
        }
    }

    pub fn raw(&self) -> u8 {
        self.raw
    }

    /// Exit/entry zone signal.
    pub fn exit_entry(&self) -> u8 {
        self.raw % 10
    }

    /// Fully-armed zone signal.
    pub fn full_set(&self) -> u8 {
        self.raw - self.exit_entry()
    }

    /// The two zone signals the controller acts on.
    pub fn zones(&self) -> ZoneSignals {
        ZoneSignals {
            exit_entry: self.exit_entry(),
            full_set: self.full_set(),
        }
    }
}

/// Classified sensor signals for one poll pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ZoneSignals {
    /// Non-zero when an exit/entry line is open.
    pub exit_entry: u8,
    /// Non-zero when a fully-armed line is open.
    pub full_set: u8,
}

impl ZoneSignals {
    /// Index of the tripped fully-armed line, `floor(log2(full_set))`.
    ///
    /// Assumes a single line; with several set, the highest one is reported.
    pub fn tripped_line(&self) -> Option<u32> {
        match self.full_set {
            0 => None,
            bits => Some(bits.ilog2()),
        }
    }
}

/// Reads and partitions the sensor bus.
#[derive(Debug)]
pub struct SensorClassifier<B> {
    bus: B,
}

impl<B: SensorBus> SensorClassifier<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Read group A then group B. Never cached: every call hits the bus.
    pub fn read(&mut self) -> Result<SensorSnapshot> {
        self.bus.select_group(SensorGroup::A)?;
        let group_a = self.bus.read_group()?;
        self.bus.select_group(SensorGroup::B)?;
        let group_b = self.bus.read_group()?;
        let snapshot = SensorSnapshot::from_groups(group_a, group_b);
        trace!(
            raw = snapshot.raw(),
            exit_entry = snapshot.exit_entry(),
            full_set = snapshot.full_set(),
            "Sensor bus read"
        );
        Ok(snapshot)
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }
}

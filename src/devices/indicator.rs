// MIT License - Copyright (c) 2026 Peter Wright

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::time::Duration;
use tracing::debug;

use crate::hal::IndicatorLine;
use crate::timer::BlinkScheduler;

/// What the indicator light should be doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IndicatorMode {
    Off,
    On,
    Blinking,
}

/// Drives the indicator line steady or blinking.
///
/// Blinking sets the line on, then toggles it every half period from a
/// background task. That task only ever writes the line.
///
/// Every write goes through `gate`, which also holds whether toggling is
/// allowed. Aborting the blink task cannot stop a toggle already running on
/// another worker, so a steady write first takes the gate and clears the
/// flag; a toggle that gets the gate afterwards does nothing.
pub struct Indicator<L> {
    line: Arc<L>,
    gate: Arc<Mutex<bool>>,
    blink: BlinkScheduler,
    mode: IndicatorMode,
}

fn lock(gate: &Mutex<bool>) -> MutexGuard<'_, bool> {
    gate.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<L: IndicatorLine> Indicator<L> {
    pub fn new(line: Arc<L>) -> Self {
        line.write(false);
        Self {
            line,
            gate: Arc::new(Mutex::new(false)),
            blink: BlinkScheduler::new(),
            mode: IndicatorMode::Off,
        }
    }

    pub fn set_off(&mut self) {
        self.write_steady(false);
        self.mode = IndicatorMode::Off;
    }

    pub fn set_on(&mut self) {
        self.write_steady(true);
        self.mode = IndicatorMode::On;
    }

    /// Start blinking with the given half period. Requires a tokio runtime.
    pub fn set_blinking(&mut self, half_period: Duration) {
        self.blink.stop();
        {
            let mut blinking = lock(&self.gate);
            *blinking = true;
            self.line.write(true);
        }
        let line = Arc::clone(&self.line);
        let gate = Arc::clone(&self.gate);
        self.blink.start(half_period, move || {
            if *lock(&gate) {
                line.write(!line.level());
            }
        });
        self.mode = IndicatorMode::Blinking;
    }

    /// Stop the blink task, leaving the line at its last level.
    pub fn stop_blinking(&mut self) {
        self.blink.stop();
        *lock(&self.gate) = false;
    }

    fn write_steady(&mut self, on: bool) {
        self.blink.stop();
        let mut blinking = lock(&self.gate);
        *blinking = false;
        self.line.write(on);
    }

    pub fn apply(&mut self, mode: IndicatorMode, half_period: Duration) {
        debug!("Indicator -> {mode:?}");
        match mode {
            IndicatorMode::Off => self.set_off(),
            IndicatorMode::On => self.set_on(),
            IndicatorMode::Blinking => self.set_blinking(half_period),
        }
    }

    pub fn mode(&self) -> IndicatorMode {
        self.mode
    }

    pub fn level(&self) -> bool {
        self.line.level()
    }
}

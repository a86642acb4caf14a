// MIT License - Copyright (c) 2026 Peter Wright

use std::future::Future;
use std::sync::Arc;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::PanelConfig;
use crate::controller::{AlarmCause, Effect, Outcome, PanelController, PanelState, PollInputs};
use crate::devices::indicator::{Indicator, IndicatorMode};
use crate::devices::keypad::KeypadScanner;
use crate::devices::sensor::{SensorClassifier, ZoneSignals};
use crate::error::Result;
use crate::event::{event_channel, EventReceiver, EventSender};
use crate::hal::{Display, IndicatorLine, KeypadMatrix, SensorBus};

/// The hardware collaborators a panel is wired to.
pub struct PanelHardware<K, S, D, L> {
    pub keypad: K,
    pub sensors: S,
    pub display: D,
    pub indicator: Arc<L>,
}

/// A running alarm panel: polls the hardware and drives the state machine.
///
/// # Example
///
/// ```no_run
/// use keypad_alarm::sim::{SimDisplay, SimIndicator, SimKeypad, SimSensors};
/// use keypad_alarm::{AlarmPanel, PanelConfig, PanelHardware};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let keypad = SimKeypad::new();
///     let hardware = PanelHardware {
///         keypad: keypad.clone(),
///         sensors: SimSensors::new(),
///         display: SimDisplay::new(),
///         indicator: SimIndicator::new(),
///     };
///     let mut panel = AlarmPanel::new(PanelConfig::default(), hardware)?;
///
///     let mut events = panel.subscribe();
///     tokio::spawn(async move {
///         while let Ok(event) = events.recv().await {
///             println!("Event: {:?}", event);
///         }
///     });
///
///     keypad.type_keys("1234B")?;
///     panel.run_until(tokio::signal::ctrl_c()).await?;
///     Ok(())
/// }
/// ```
pub struct AlarmPanel<K, S, D, L> {
    config: PanelConfig,
    controller: PanelController,
    keypad: KeypadScanner<K>,
    sensors: SensorClassifier<S>,
    display: D,
    indicator: Indicator<L>,
    event_tx: EventSender,
}

impl<K, S, D, L> AlarmPanel<K, S, D, L>
where
    K: KeypadMatrix,
    S: SensorBus,
    D: Display,
    L: IndicatorLine,
{
    /// Validate the config, wire up the hardware and show the Unset screen.
    pub fn new(config: PanelConfig, hardware: PanelHardware<K, S, D, L>) -> Result<Self> {
        let controller = PanelController::new(&config, Instant::now())?;
        let (event_tx, _event_rx) = event_channel(config.event_capacity);

        let mut panel = Self {
            keypad: KeypadScanner::new(hardware.keypad),
            sensors: SensorClassifier::new(hardware.sensors),
            display: hardware.display,
            indicator: Indicator::new(hardware.indicator),
            controller,
            config,
            event_tx,
        };

        let outcome = panel.controller.start(Instant::now());
        panel.apply(outcome);
        info!("Alarm panel initialized in {}", panel.state());
        Ok(panel)
    }

    /// Subscribe to panel events.
    pub fn subscribe(&self) -> EventReceiver {
        self.event_tx.subscribe()
    }

    /// One polling pass.
    ///
    /// Scans the keypad when the state uses it, waits the settle delay, reads
    /// the sensor bus when the state monitors it, then runs the controller and
    /// applies its effects. The settle delay also paces passes in states that
    /// skip the keypad.
    pub async fn poll_once(&mut self) -> Result<()> {
        let state = self.controller.state();

        let key = if state.uses_keypad() {
            self.keypad.scan()?
        } else {
            None
        };
        sleep(self.config.key_settle).await;

        let zones = if state.monitors_sensors() {
            self.sensors.read()?.zones()
        } else {
            ZoneSignals::default()
        };

        if let Some(k) = key {
            debug!("Key {k} in {state}");
        }

        let inputs = PollInputs {
            now: Instant::now(),
            key,
            zones,
        };
        let outcome = self.controller.step(&inputs);
        self.apply(outcome);
        Ok(())
    }

    /// Poll until `shutdown` resolves or an unrecoverable error occurs.
    ///
    /// Shutdown is only observed while a pass is waiting on the settle delay,
    /// never in the middle of a decision.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future,
    {
        tokio::pin!(shutdown);
        let result = loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break Ok(());
                }
                res = self.poll_once() => match res {
                    Ok(()) => {}
                    Err(e) if e.is_recoverable() => {
                        warn!("Poll pass skipped: {e}");
                        sleep(self.config.key_settle).await;
                    }
                    Err(e) => break Err(e),
                },
            }
        };
        self.shutdown();
        result
    }

    /// Stop the blink task and turn the indicator off.
    pub fn shutdown(&mut self) {
        debug!("Stopping indicator");
        self.indicator.set_off();
    }

    fn apply(&mut self, outcome: Outcome) {
        for effect in outcome.effects {
            match effect {
                Effect::ClearDisplay => self.display.clear(),
                Effect::ShowText { column, row, text } => {
                    self.display.move_cursor(column, row);
                    self.display.write_text(&text);
                }
                Effect::SetIndicator(mode) => {
                    self.indicator.apply(mode, self.config.blink_half_period)
                }
            }
        }
        for event in outcome.events {
            let _ = self.event_tx.send(event);
        }
    }

    // --- Accessors ---

    pub fn state(&self) -> PanelState {
        self.controller.state()
    }

    pub fn cause(&self) -> Option<AlarmCause> {
        self.controller.cause()
    }

    pub fn attempts(&self) -> u32 {
        self.controller.attempts()
    }

    pub fn buffer_len(&self) -> usize {
        self.controller.buffer().len()
    }

    pub fn indicator_mode(&self) -> IndicatorMode {
        self.indicator.mode()
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn display(&self) -> &D {
        &self.display
    }
}

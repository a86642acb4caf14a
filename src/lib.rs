// MIT License - Copyright (c) 2026 Peter Wright
//
//! # keypad-alarm
//!
//! Control logic for a premises alarm panel driven from a 4x4 keypad.
//!
//! The panel arms and disarms on a four-digit access code, watches a bank
//! of sensor lines split into an exit/entry zone and a fully-armed zone,
//! and drives a two-line text display and an indicator light. The state
//! machine lives in [`controller`] and performs no I/O; [`panel`] wraps it
//! in a polling loop over the hardware traits in [`hal`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use keypad_alarm::sim::{SimDisplay, SimIndicator, SimKeypad, SimSensors};
//! use keypad_alarm::{AlarmPanel, PanelConfig, PanelEvent, PanelHardware};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = PanelConfig::builder().access_code("4321").build();
//!
//!     let keypad = SimKeypad::new();
//!     let sensors = SimSensors::new();
//!     let mut panel = AlarmPanel::new(
//!         config,
//!         PanelHardware {
//!             keypad: keypad.clone(),
//!             sensors: sensors.clone(),
//!             display: SimDisplay::new(),
//!             indicator: SimIndicator::new(),
//!         },
//!     )?;
//!
//!     let mut events = panel.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             if let PanelEvent::AlarmRaised { cause } = event {
//!                 println!("Alarm: {cause}");
//!             }
//!         }
//!     });
//!
//!     keypad.type_keys("4321B")?;
//!     panel.run_until(tokio::signal::ctrl_c()).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod constants;
pub mod controller;
pub mod devices;
pub mod error;
pub mod event;
pub mod hal;
pub mod panel;
pub mod sim;
pub mod timer;

// Re-exports for convenience
pub use config::{PanelConfig, PanelConfigBuilder};
pub use controller::{AlarmCause, Effect, Outcome, PanelController, PanelState, PollInputs};
pub use devices::{
    AccessCode, CodeBuffer, EntryEvent, Indicator, IndicatorMode, Key, KeypadScanner,
    SensorClassifier, SensorSnapshot, ZoneSignals,
};
pub use error::{PanelError, Result};
pub use event::{EventReceiver, PanelEvent};
pub use panel::{AlarmPanel, PanelHardware};
pub use timer::{BlinkScheduler, StateTimer};

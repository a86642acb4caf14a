// MIT License - Copyright (c) 2026 Peter Wright

//! The panel state machine.
//!
//! ```text
//!  UNSET ──[valid code]──▶ EXIT ──[exit delay]──▶ SET
//!    ▲                      │                      │
//!    │◀────[valid code]─────┘            [exit/entry line]
//!    │                                             ▼
//!    │◀─────────────────[valid code]────────── ENTRY
//!    │
//!    │   UNSET/EXIT ──[3 wrong codes]──────┐
//!    │   EXIT/SET/ENTRY ──[full-set line]──┼──▶ ALARM ──[valid code]──▶ REPORT
//!    │   ENTRY ──[entry delay]─────────────┘                             │
//!    └──────────────────────────────[C key]────────────────────────────────┘
//! ```
//!
//! [`PanelController`] does no I/O. Each call to [`PanelController::step`]
//! takes one pass worth of inputs and returns the display and indicator
//! effects to apply plus the events raised, so the whole machine can be
//! driven deterministically without hardware or real time.

use std::fmt;

use serde::Serialize;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::PanelConfig;
use crate::constants::{
    CAUSE_ENTRY_TIMEOUT, CAUSE_FULLSET_PREFIX, CAUSE_WRONG_KEY, DISPLAY_COLUMNS,
    REPORT_CLEAR_HINT,
};
use crate::devices::code_entry::{AccessCode, CodeBuffer, EntryEvent};
use crate::devices::indicator::IndicatorMode;
use crate::devices::keypad::Key;
use crate::devices::sensor::ZoneSignals;
use crate::error::Result;
use crate::event::PanelEvent;
use crate::timer::StateTimer;

/// Arming state of the panel. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PanelState {
    Unset,
    Exit,
    Set,
    Entry,
    Alarm,
    Report,
}

impl PanelState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unset => "UNSET",
            Self::Exit => "EXIT",
            Self::Set => "SET",
            Self::Entry => "ENTRY",
            Self::Alarm => "ALARM",
            Self::Report => "REPORT",
        }
    }

    /// Whether the keypad is scanned in this state. Set ignores the keypad.
    pub fn uses_keypad(&self) -> bool {
        !matches!(self, Self::Set)
    }

    /// Whether the sensor bus is read in this state.
    pub fn monitors_sensors(&self) -> bool {
        matches!(self, Self::Exit | Self::Set | Self::Entry)
    }

    /// Whether the second display line shows the code prompt.
    pub fn shows_code_prompt(&self) -> bool {
        matches!(self, Self::Unset | Self::Exit | Self::Entry | Self::Alarm)
    }

    /// Wrong codes count towards lockout only while disarmed or leaving.
    pub fn counts_attempts(&self) -> bool {
        matches!(self, Self::Unset | Self::Exit)
    }

    /// Indicator behaviour on entering the state.
    pub fn indicator(&self) -> IndicatorMode {
        match self {
            Self::Exit | Self::Entry => IndicatorMode::Blinking,
            Self::Alarm => IndicatorMode::On,
            Self::Unset | Self::Set | Self::Report => IndicatorMode::Off,
        }
    }
}

impl fmt::Display for PanelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why the panel went into Alarm. Shown verbatim in Report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlarmCause {
    /// Too many wrong codes in Unset or Exit
    WrongKey,
    /// A fully-armed line tripped; carries the line index
    FullSet(u32),
    /// The entry delay ran out without a valid code
    EntryTimeout,
}

impl fmt::Display for AlarmCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongKey => f.write_str(CAUSE_WRONG_KEY),
            Self::FullSet(line) => write!(f, "{CAUSE_FULLSET_PREFIX} {line}"),
            Self::EntryTimeout => f.write_str(CAUSE_ENTRY_TIMEOUT),
        }
    }
}

/// Inputs sampled for one polling pass.
#[derive(Debug, Clone, Copy)]
pub struct PollInputs {
    pub now: Instant,
    /// Scan result; `None` when nothing is pressed or the keypad was not scanned.
    pub key: Option<Key>,
    /// Classified sensors; all zero when the bus was not read.
    pub zones: ZoneSignals,
}

impl PollInputs {
    pub fn idle(now: Instant) -> Self {
        Self {
            now,
            key: None,
            zones: ZoneSignals::default(),
        }
    }

    pub fn with_key(mut self, key: Key) -> Self {
        self.key = Some(key);
        self
    }

    pub fn with_zones(mut self, zones: ZoneSignals) -> Self {
        self.zones = zones;
        self
    }
}

/// A side effect for the runtime to carry out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ClearDisplay,
    /// Write a full display line, padded to the display width.
    ShowText { column: u8, row: u8, text: String },
    SetIndicator(IndicatorMode),
}

/// Everything one pass produced, in the order it must be applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub effects: Vec<Effect>,
    pub events: Vec<PanelEvent>,
}

impl Outcome {
    /// The state change made in this pass, if any.
    pub fn transition(&self) -> Option<(PanelState, PanelState)> {
        self.events.iter().find_map(|e| match e {
            PanelEvent::StateChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty() && self.events.is_empty()
    }
}

fn line(row: u8, text: impl fmt::Display) -> Effect {
    Effect::ShowText {
        column: 0,
        row,
        text: format!("{text:<width$}", width = DISPLAY_COLUMNS as usize),
    }
}

/// Result of looking at the confirm key in one pass.
enum Verdict {
    Accepted,
    Rejected,
}

/// Owns the panel state and decides transitions.
#[derive(Debug)]
pub struct PanelController {
    code: AccessCode,
    max_attempts: u32,
    exit_delay: Duration,
    entry_delay: Duration,
    alarm_light_timeout: Duration,
    state: PanelState,
    buffer: CodeBuffer,
    attempts: u32,
    timer: StateTimer,
    cause: Option<AlarmCause>,
    alarm_light_on: bool,
}

impl PanelController {
    /// Build a controller in Unset. Call [`start`](Self::start) to get the initial screen.
    pub fn new(config: &PanelConfig, now: Instant) -> Result<Self> {
        let code = config.validate()?;
        Ok(Self {
            code,
            max_attempts: config.max_attempts,
            exit_delay: config.exit_delay,
            entry_delay: config.entry_delay,
            alarm_light_timeout: config.alarm_light_timeout,
            state: PanelState::Unset,
            buffer: CodeBuffer::new(),
            attempts: 0,
            timer: StateTimer::start(now),
            cause: None,
            alarm_light_on: false,
        })
    }

    /// Run the entry actions of the initial state.
    pub fn start(&mut self, now: Instant) -> Outcome {
        let mut out = Outcome::default();
        self.enter(self.state, now, &mut out);
        out.events.clear();
        out
    }

    /// One polling pass. Checks run in the state's priority order and the
    /// first one that changes state ends the pass.
    pub fn step(&mut self, inputs: &PollInputs) -> Outcome {
        let mut out = Outcome::default();
        let now = inputs.now;
        match self.state {
            PanelState::Unset => {
                match self.code_entry(inputs.key, &mut out) {
                    Some(Verdict::Accepted) => self.enter(PanelState::Exit, now, &mut out),
                    Some(Verdict::Rejected) => self.count_wrong_code(now, &mut out),
                    None => {}
                }
            }
            PanelState::Exit => {
                if self.timer.has_elapsed(now, self.exit_delay) {
                    self.enter(PanelState::Set, now, &mut out);
                } else if let Some(line) = inputs.zones.tripped_line() {
                    self.raise(AlarmCause::FullSet(line), now, &mut out);
                } else {
                    match self.code_entry(inputs.key, &mut out) {
                        Some(Verdict::Accepted) => self.enter(PanelState::Unset, now, &mut out),
                        Some(Verdict::Rejected) => self.count_wrong_code(now, &mut out),
                        None => {}
                    }
                }
            }
            PanelState::Set => {
                if let Some(line) = inputs.zones.tripped_line() {
                    self.raise(AlarmCause::FullSet(line), now, &mut out);
                } else if inputs.zones.exit_entry != 0 {
                    self.enter(PanelState::Entry, now, &mut out);
                }
            }
            PanelState::Entry => {
                if self.timer.has_elapsed(now, self.entry_delay) {
                    self.raise(AlarmCause::EntryTimeout, now, &mut out);
                } else if let Some(line) = inputs.zones.tripped_line() {
                    self.raise(AlarmCause::FullSet(line), now, &mut out);
                } else if let Some(Verdict::Accepted) = self.code_entry(inputs.key, &mut out) {
                    self.enter(PanelState::Unset, now, &mut out);
                }
            }
            PanelState::Alarm => {
                if self.alarm_light_on && self.timer.has_elapsed(now, self.alarm_light_timeout) {
                    self.alarm_light_on = false;
                    info!("Alarm light timed out");
                    out.effects.push(Effect::SetIndicator(IndicatorMode::Off));
                    out.events.push(PanelEvent::AlarmLightExpired);
                }
                if let Some(Verdict::Accepted) = self.code_entry(inputs.key, &mut out) {
                    self.enter(PanelState::Report, now, &mut out);
                }
            }
            PanelState::Report => {
                if inputs.key.is_some_and(|k| k.is_backspace()) {
                    self.cause = None;
                    out.events.push(PanelEvent::CauseCleared);
                    self.enter(PanelState::Unset, now, &mut out);
                }
            }
        }
        out
    }

    /// Feed the key into the buffer, or check the code when a confirm key
    /// arrives with the buffer full. A rejected code leaves the buffer empty.
    fn code_entry(&mut self, key: Option<Key>, out: &mut Outcome) -> Option<Verdict> {
        if self.buffer.is_full() && key.is_some_and(|k| k.is_confirm()) {
            let verdict = if self.buffer.check_and_clear(&self.code) {
                info!("Access code accepted in {}", self.state);
                out.events.push(PanelEvent::CodeAccepted { state: self.state });
                Verdict::Accepted
            } else {
                self.buffer.clear();
                if self.state.counts_attempts() {
                    self.attempts += 1;
                }
                warn!(
                    "Wrong access code in {} (attempt {}/{})",
                    self.state, self.attempts, self.max_attempts
                );
                out.events.push(PanelEvent::CodeRejected {
                    state: self.state,
                    attempts: self.attempts,
                });
                Verdict::Rejected
            };
            out.effects.push(line(1, self.buffer.prompt()));
            return Some(verdict);
        }

        match self.buffer.feed(key) {
            EntryEvent::Ignored => {}
            event => {
                debug!("Code entry: {event:?} ({} digits)", self.buffer.len());
                out.effects.push(line(1, self.buffer.prompt()));
            }
        }
        None
    }

    fn count_wrong_code(&mut self, now: Instant, out: &mut Outcome) {
        if self.attempts >= self.max_attempts {
            self.raise(AlarmCause::WrongKey, now, out);
        }
    }

    fn raise(&mut self, cause: AlarmCause, now: Instant, out: &mut Outcome) {
        warn!("Alarm raised in {}: {cause}", self.state);
        self.cause = Some(cause);
        out.events.push(PanelEvent::AlarmRaised { cause });
        self.enter(PanelState::Alarm, now, out);
    }

    /// Entry actions shared by every state: empty buffer, zero attempts,
    /// fresh timer, cleared display, indicator per state.
    fn enter(&mut self, next: PanelState, now: Instant, out: &mut Outcome) {
        let from = self.state;
        self.state = next;
        self.buffer.clear();
        self.attempts = 0;
        self.timer.reset(now);
        self.alarm_light_on = next == PanelState::Alarm;

        out.effects.push(Effect::ClearDisplay);
        out.effects.push(Effect::SetIndicator(next.indicator()));
        out.effects.extend(self.screen());
        out.events.push(PanelEvent::StateChanged { from, to: next });
        if from != next {
            info!("Panel state {from} -> {next}");
        }
    }

    /// Both display lines for the current state.
    pub fn screen(&self) -> Vec<Effect> {
        if self.state == PanelState::Report {
            let cause = self.cause.map(|c| c.to_string()).unwrap_or_default();
            return vec![line(0, cause), line(1, REPORT_CLEAR_HINT)];
        }
        let mut lines = vec![line(0, format!("STATE:{}", self.state))];
        if self.state.shows_code_prompt() {
            lines.push(line(1, self.buffer.prompt()));
        }
        lines
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn cause(&self) -> Option<AlarmCause> {
        self.cause
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn buffer(&self) -> &CodeBuffer {
        &self.buffer
    }

    /// Time spent in the current state as of `now`.
    pub fn elapsed(&self, now: Instant) -> Duration {
        self.timer.elapsed(now)
    }

    pub fn alarm_light_on(&self) -> bool {
        self.alarm_light_on
    }
}

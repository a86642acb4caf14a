// MIT License - Copyright (c) 2026 Peter Wright
// Console simulator

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::oneshot;
use tracing::{error, info, warn};

use keypad_alarm::constants::{
    DEFAULT_ACCESS_CODE, DEFAULT_ALARM_LIGHT_TIMEOUT, DEFAULT_BLINK_HALF_PERIOD,
    DEFAULT_ENTRY_DELAY, DEFAULT_EVENT_CAPACITY, DEFAULT_EXIT_DELAY, DEFAULT_KEY_SETTLE,
    DEFAULT_MAX_ATTEMPTS,
};
use keypad_alarm::hal::IndicatorLine;
use keypad_alarm::sim::{parse_keys, SimDisplay, SimIndicator, SimKeypad, SimSensors};
use keypad_alarm::{AlarmPanel, PanelConfig, PanelEvent, PanelHardware};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "keypad-alarm")]
#[command(about = "Run the alarm panel against simulated hardware driven from stdin")]
struct Cli {
    /// Path to an optional TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print panel events as JSON lines instead of log lines
    #[arg(long)]
    json: bool,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct Config {
    #[serde(default)]
    panel: PanelToml,
}

#[derive(Debug, Deserialize)]
struct PanelToml {
    #[serde(default = "default_access_code")]
    access_code: String,
    #[serde(default = "default_max_attempts")]
    max_attempts: u32,
    #[serde(default = "default_exit_delay")]
    exit_delay_secs: u64,
    #[serde(default = "default_entry_delay")]
    entry_delay_secs: u64,
    #[serde(default = "default_alarm_light_timeout")]
    alarm_light_timeout_secs: u64,
    #[serde(default = "default_blink_half_period")]
    blink_half_period_ms: u64,
    #[serde(default = "default_key_settle")]
    key_settle_ms: u64,
    #[serde(default = "default_event_capacity")]
    event_capacity: usize,
}

impl Default for PanelToml {
    fn default() -> Self {
        Self {
            access_code: default_access_code(),
            max_attempts: default_max_attempts(),
            exit_delay_secs: default_exit_delay(),
            entry_delay_secs: default_entry_delay(),
            alarm_light_timeout_secs: default_alarm_light_timeout(),
            blink_half_period_ms: default_blink_half_period(),
            key_settle_ms: default_key_settle(),
            event_capacity: default_event_capacity(),
        }
    }
}

fn default_access_code() -> String {
    DEFAULT_ACCESS_CODE.to_string()
}
fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}
fn default_exit_delay() -> u64 {
    DEFAULT_EXIT_DELAY.as_secs()
}
fn default_entry_delay() -> u64 {
    DEFAULT_ENTRY_DELAY.as_secs()
}
fn default_alarm_light_timeout() -> u64 {
    DEFAULT_ALARM_LIGHT_TIMEOUT.as_secs()
}
fn default_blink_half_period() -> u64 {
    DEFAULT_BLINK_HALF_PERIOD.as_millis() as u64
}
fn default_key_settle() -> u64 {
    DEFAULT_KEY_SETTLE.as_millis() as u64
}
fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}

fn build_panel_config(toml: &PanelToml) -> PanelConfig {
    PanelConfig::builder()
        .access_code(&toml.access_code)
        .max_attempts(toml.max_attempts)
        .exit_delay(Duration::from_secs(toml.exit_delay_secs))
        .entry_delay(Duration::from_secs(toml.entry_delay_secs))
        .alarm_light_timeout(Duration::from_secs(toml.alarm_light_timeout_secs))
        .blink_half_period(Duration::from_millis(toml.blink_half_period_ms))
        .key_settle(Duration::from_millis(toml.key_settle_ms))
        .event_capacity(toml.event_capacity)
        .build()
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let Some(path) = path else {
        info!("No config file given; using defaults");
        return Ok(Config::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    toml::from_str(&text).context("Failed to parse config file")
}

// ---------------------------------------------------------------------------
// Simulator commands
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq)]
enum Command {
    /// One sweep per key
    Keys(String),
    /// All keys held in one sweep
    Chord(String),
    Sensor(u8),
    Clear,
    Show,
    Quit,
}

fn parse_command(line: &str) -> Result<Option<Command>> {
    let mut parts = line.split_whitespace();
    let Some(op) = parts.next() else {
        return Ok(None);
    };
    let arg = parts.collect::<Vec<_>>().join("");
    let cmd = match op.to_lowercase().as_str() {
        "keys" | "k" => Command::Keys(arg),
        "chord" => Command::Chord(arg),
        "sensor" | "s" => {
            let raw = arg
                .parse::<u8>()
                .with_context(|| format!("sensor reading must be 0-255, got {arg:?}"))?;
            Command::Sensor(raw)
        }
        "clear" => Command::Clear,
        "show" => Command::Show,
        "quit" | "exit" => Command::Quit,
        other => anyhow::bail!("Unknown command: {other}"),
    };
    Ok(Some(cmd))
}

struct SimControls {
    keypad: SimKeypad,
    sensors: SimSensors,
    display: SimDisplay,
    indicator: Arc<SimIndicator>,
}

impl SimControls {
    /// Returns false when the simulator should stop.
    fn execute(&self, cmd: Command) -> Result<bool> {
        match cmd {
            Command::Keys(keys) => self.keypad.type_keys(&keys)?,
            Command::Chord(keys) => self.keypad.press_chord(&parse_keys(&keys)?),
            Command::Sensor(raw) => self.sensors.set_raw(raw),
            Command::Clear => self.sensors.clear(),
            Command::Show => self.show(),
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }

    fn show(&self) {
        let rule = "-".repeat(18);
        println!("{rule}");
        for line in self.display.lines() {
            println!("|{line:<16}|");
        }
        println!("{rule}");
        println!(
            "indicator: {}  sensors: {}",
            if self.indicator.level() { "ON" } else { "off" },
            self.sensors.raw()
        );
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG controls verbosity (e.g. RUST_LOG=debug or RUST_LOG=keypad_alarm=trace).
    // Default: info.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // systemd journal already adds timestamps, so omit them when running under systemd
    if std::env::var_os("JOURNAL_STREAM").is_some() {
        tracing_subscriber::fmt().without_time().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    let panel_config = build_panel_config(&config.panel);

    let controls = SimControls {
        keypad: SimKeypad::new(),
        sensors: SimSensors::new(),
        display: SimDisplay::new(),
        indicator: SimIndicator::new(),
    };
    let mut panel = AlarmPanel::new(
        panel_config,
        PanelHardware {
            keypad: controls.keypad.clone(),
            sensors: controls.sensors.clone(),
            display: controls.display.clone(),
            indicator: Arc::clone(&controls.indicator),
        },
    )
    .context("Failed to initialize panel")?;

    // Task 1: event printer
    let mut events = panel.subscribe();
    let json = cli.json;
    let event_handle = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) if json => match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => error!("Failed to serialize event: {e}"),
                },
                Ok(PanelEvent::StateChanged { from, to }) => info!("State {from} -> {to}"),
                Ok(PanelEvent::AlarmRaised { cause }) => warn!("ALARM: {cause}"),
                Ok(event) => info!("Event: {event:?}"),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Event receiver lagged, missed {n} events");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // Task 2: stdin command reader
    let (quit_tx, quit_rx) = oneshot::channel::<()>();
    let input_handle = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match parse_command(&line) {
                    Ok(Some(cmd)) => match controls.execute(cmd) {
                        Ok(true) => {}
                        Ok(false) => break,
                        Err(e) => warn!("{e}"),
                    },
                    Ok(None) => {}
                    Err(e) => warn!("{e:#}"),
                },
                Ok(None) => {
                    info!("Input closed");
                    break;
                }
                Err(e) => {
                    error!("Failed to read input: {e}");
                    break;
                }
            }
        }
        let _ = quit_tx.send(());
    });

    let mut sigterm = signal(SignalKind::terminate())?;
    let shutdown = async move {
        tokio::select! {
            _ = quit_rx => {}
            _ = tokio::signal::ctrl_c() => info!("Received Ctrl-C"),
            _ = sigterm.recv() => info!("Received SIGTERM"),
        }
    };

    info!("Commands: keys <chars> | chord <chars> | sensor <0-255> | clear | show | quit");
    panel.run_until(shutdown).await?;

    input_handle.abort();
    drop(panel);
    let _ = event_handle.await;
    info!("Panel stopped");
    Ok(())
}

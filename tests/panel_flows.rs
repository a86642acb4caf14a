// End-to-end flows through AlarmPanel on simulated hardware.
//
// Time is paused, so every settle delay and timeout advances virtually.

use std::sync::Arc;

use tokio::time::{advance, Duration};

use keypad_alarm::hal::IndicatorLine;
use keypad_alarm::sim::{SimDisplay, SimIndicator, SimKeypad, SimSensors};
use keypad_alarm::{
    AlarmCause, AlarmPanel, EventReceiver, IndicatorMode, Key, PanelConfig, PanelEvent,
    PanelHardware, PanelState,
};

type SimPanel = AlarmPanel<SimKeypad, SimSensors, SimDisplay, SimIndicator>;

struct Rig {
    panel: SimPanel,
    keypad: SimKeypad,
    sensors: SimSensors,
    led: Arc<SimIndicator>,
    events: EventReceiver,
}

impl Rig {
    fn new() -> Self {
        Self::with_config(PanelConfig::builder().access_code("1234").build())
    }

    fn with_config(config: PanelConfig) -> Self {
        let keypad = SimKeypad::new();
        let sensors = SimSensors::new();
        let led = SimIndicator::new();
        let panel = AlarmPanel::new(
            config,
            PanelHardware {
                keypad: keypad.clone(),
                sensors: sensors.clone(),
                display: SimDisplay::new(),
                indicator: Arc::clone(&led),
            },
        )
        .expect("panel should build");
        let events = panel.subscribe();
        Self {
            panel,
            keypad,
            sensors,
            led,
            events,
        }
    }

    /// Type keys and poll until every queued sweep has been scanned.
    async fn type_keys(&mut self, keys: &str) {
        self.keypad.type_keys(keys).unwrap();
        while self.keypad.pending() > 0 {
            self.panel.poll_once().await.unwrap();
        }
    }

    async fn poll(&mut self) {
        self.panel.poll_once().await.unwrap();
    }

    fn line(&self, row: u8) -> String {
        self.panel.display().line(row)
    }

    fn drain_events(&mut self) -> Vec<PanelEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }

    /// Arm and wait out the exit delay.
    async fn arm_fully(&mut self) {
        self.type_keys("1234B").await;
        assert_eq!(self.panel.state(), PanelState::Exit);
        advance(Duration::from_secs(60)).await;
        self.poll().await;
        assert_eq!(self.panel.state(), PanelState::Set);
    }
}

#[tokio::test(start_paused = true)]
async fn correct_code_in_unset_starts_exit() {
    let mut rig = Rig::new();
    rig.type_keys("1234").await;
    assert_eq!(rig.line(1), "Press B to set");

    rig.type_keys("B").await;
    assert_eq!(rig.panel.state(), PanelState::Exit);
    assert_eq!(rig.panel.buffer_len(), 0);
    assert_eq!(rig.panel.attempts(), 0);
    assert_eq!(rig.line(0), "STATE:EXIT");
    assert_eq!(rig.line(1), "Code:____");
    assert_eq!(rig.panel.indicator_mode(), IndicatorMode::Blinking);
}

#[tokio::test(start_paused = true)]
async fn three_wrong_codes_in_unset_raise_wrong_key() {
    let mut rig = Rig::new();
    for attempt in 1..=2 {
        rig.type_keys("9999B").await;
        assert_eq!(rig.panel.state(), PanelState::Unset);
        assert_eq!(rig.panel.attempts(), attempt);
    }
    rig.type_keys("9999B").await;
    assert_eq!(rig.panel.state(), PanelState::Alarm);
    assert_eq!(rig.panel.cause(), Some(AlarmCause::WrongKey));
    assert!(rig.led.level());

    let events = rig.drain_events();
    assert!(events.contains(&PanelEvent::AlarmRaised {
        cause: AlarmCause::WrongKey
    }));
    let rejected = events
        .iter()
        .filter(|e| matches!(e, PanelEvent::CodeRejected { .. }))
        .count();
    assert_eq!(rejected, 3);
}

#[tokio::test(start_paused = true)]
async fn exit_delay_elapses_into_set() {
    let mut rig = Rig::new();
    rig.type_keys("1234B").await;
    advance(Duration::from_secs(59)).await;
    rig.poll().await;
    assert_eq!(rig.panel.state(), PanelState::Exit);

    advance(Duration::from_secs(1)).await;
    rig.poll().await;
    assert_eq!(rig.panel.state(), PanelState::Set);
    assert_eq!(rig.line(0), "STATE:SET");
    assert!(!rig.led.level());
}

#[tokio::test(start_paused = true)]
async fn exit_blinks_the_indicator() {
    let mut rig = Rig::new();
    rig.type_keys("1234B").await;
    assert!(rig.led.level());
    let toggles = rig.led.toggles();

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(!rig.led.level());
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(rig.led.level());
    assert_eq!(rig.led.toggles(), toggles + 2);
}

#[tokio::test(start_paused = true)]
async fn fullset_trip_in_set_alarms_then_report_clears() {
    let mut rig = Rig::new();
    rig.arm_fully().await;

    // 0b0100_0000 = 64: 4 stays in the exit/entry zone, 60 trips line 5
    rig.sensors.set_raw(64);
    rig.poll().await;
    assert_eq!(rig.panel.state(), PanelState::Alarm);
    assert_eq!(rig.panel.cause(), Some(AlarmCause::FullSet(5)));
    assert_eq!(rig.line(0), "STATE:ALARM");

    // Alarm ignores sensors and takes the code
    rig.type_keys("1234B").await;
    assert_eq!(rig.panel.state(), PanelState::Report);
    assert_eq!(rig.line(0), "FULLSET 5");
    assert_eq!(rig.line(1), "C key to clear");

    rig.type_keys("C").await;
    assert_eq!(rig.panel.state(), PanelState::Unset);
    assert_eq!(rig.panel.cause(), None);
    assert_eq!(rig.line(0), "STATE:UNSET");
}

#[tokio::test(start_paused = true)]
async fn exit_entry_line_starts_entry_and_code_disarms() {
    let mut rig = Rig::new();
    rig.arm_fully().await;

    rig.sensors.set_raw(3);
    rig.poll().await;
    assert_eq!(rig.panel.state(), PanelState::Entry);
    assert_eq!(rig.panel.indicator_mode(), IndicatorMode::Blinking);

    // Door left open: exit/entry lines are not checked in Entry
    rig.type_keys("5555B5555B5555B5555B").await;
    assert_eq!(rig.panel.state(), PanelState::Entry);

    rig.type_keys("1234B").await;
    assert_eq!(rig.panel.state(), PanelState::Unset);
    assert_eq!(rig.panel.indicator_mode(), IndicatorMode::Off);
}

#[tokio::test(start_paused = true)]
async fn entry_delay_runs_out() {
    let mut rig = Rig::new();
    rig.arm_fully().await;
    rig.sensors.set_raw(1);
    rig.poll().await;
    rig.sensors.clear();

    advance(Duration::from_secs(120)).await;
    rig.poll().await;
    assert_eq!(rig.panel.state(), PanelState::Alarm);
    assert_eq!(rig.panel.cause(), Some(AlarmCause::EntryTimeout));
}

#[tokio::test(start_paused = true)]
async fn alarm_light_goes_out_but_alarm_stays() {
    let mut rig = Rig::new();
    rig.type_keys("0000B0000B0000B").await;
    assert_eq!(rig.panel.state(), PanelState::Alarm);
    assert_eq!(rig.panel.indicator_mode(), IndicatorMode::On);

    advance(Duration::from_secs(120)).await;
    rig.poll().await;
    assert_eq!(rig.panel.state(), PanelState::Alarm);
    assert_eq!(rig.panel.indicator_mode(), IndicatorMode::Off);
    assert!(!rig.led.level());
    assert!(rig.drain_events().contains(&PanelEvent::AlarmLightExpired));
}

#[tokio::test(start_paused = true)]
async fn simultaneous_keys_resolve_to_last_scanned() {
    let mut rig = Rig::new();
    // (1, 0) is '3' and (2, 3) is '0'
    assert_eq!(Key::at(1, 0), Some(Key::Digit(3)));
    assert_eq!(Key::at(2, 3), Some(Key::Digit(0)));
    rig.keypad.press_chord(&[Key::Digit(0), Key::Digit(3)]);
    rig.poll().await;
    assert_eq!(rig.panel.buffer_len(), 1);

    // Finish "0" + "000" and confirm: matches a stored 0000
    let mut rig = Rig::with_config(PanelConfig::builder().access_code("0000").build());
    rig.keypad.press_chord(&[Key::Digit(3), Key::Digit(0)]);
    rig.type_keys("000B").await;
    assert_eq!(rig.panel.state(), PanelState::Exit);
}

#[tokio::test(start_paused = true)]
async fn backspace_corrects_a_typo() {
    let mut rig = Rig::new();
    rig.type_keys("1235").await;
    // Buffer full: backspace is ignored, only B is meaningful
    rig.type_keys("C").await;
    assert_eq!(rig.panel.buffer_len(), 4);

    let mut rig = Rig::new();
    rig.type_keys("125").await;
    rig.type_keys("C").await;
    assert_eq!(rig.line(1), "Code:**__");
    rig.type_keys("34B").await;
    assert_eq!(rig.panel.state(), PanelState::Exit);
}

#[tokio::test(start_paused = true)]
async fn invalid_code_config_is_rejected() {
    let keypad = SimKeypad::new();
    let result = AlarmPanel::new(
        PanelConfig::builder().access_code("12345").build(),
        PanelHardware {
            keypad,
            sensors: SimSensors::new(),
            display: SimDisplay::new(),
            indicator: SimIndicator::new(),
        },
    );
    assert!(result.is_err());
}

#[tokio::test(start_paused = true)]
async fn run_until_drives_a_full_cycle() {
    let mut rig = Rig::with_config(
        PanelConfig::builder()
            .exit_delay(Duration::from_secs(5))
            .build(),
    );
    rig.keypad.type_keys("1234B").unwrap();
    rig.panel
        .run_until(tokio::time::sleep(Duration::from_secs(10)))
        .await
        .unwrap();
    assert_eq!(rig.panel.state(), PanelState::Set);
    assert!(!rig.led.level());

    let transitions: Vec<_> = rig
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            PanelEvent::StateChanged { from, to } => Some((from, to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        transitions,
        vec![
            (PanelState::Unset, PanelState::Exit),
            (PanelState::Exit, PanelState::Set)
        ]
    );
}

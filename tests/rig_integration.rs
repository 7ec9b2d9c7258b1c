// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for a running rig, on tokio's paused clock.

use std::sync::Arc;
use std::time::Duration;

use dmx_fader::config::Config;
use dmx_fader::event::FixtureEvent;
use dmx_fader::fixture::FixtureTypeDef;
use dmx_fader::transport::MemoryTransport;
use dmx_fader::{ColorState, Error, Rig, TurnOn, encode, normalize};
use tokio::sync::broadcast;
use tokio::time::sleep;

const CONFIG: &str = r#"{
    "universe": 2,
    "intended_fade_fps": 60,
    "check_fps": 240,
    "resend_universe_every_secs": -1,
    "home_assistant_state_update_frequency_secs": 0.5,
    "default_color_temp_kelvin": 3000,
    "default_transition_secs": 0,
    "types": [
        {
            "name": "hsct",
            "min_color_temp_kelvin": 2000,
            "max_color_temp_kelvin": 10000,
            "channels": [
                {"type": "brightness"},
                {"type": "hue"},
                {"type": "saturation"},
                {"type": "color_temp_kelvin"},
                {"type": "constant", "value": 7}
            ]
        },
        {
            "name": "dimmer",
            "min_color_temp_kelvin": 2700,
            "max_color_temp_kelvin": 6500,
            "channels": [{"type": "brightness", "bytes": 2, "endianness": "big"}]
        }
    ],
    "entities": [
        {"name": "Desk", "channel": 1, "type": "hsct"},
        {"name": "Shelf", "channel": 6, "type": "hsct"}
    ]
}"#;

fn config() -> Config {
    Config::from_json_str(CONFIG).unwrap()
}

fn hsct() -> FixtureTypeDef {
    FixtureTypeDef::try_from(&config().types[0]).unwrap()
}

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn drain(rx: &mut broadcast::Receiver<FixtureEvent>) -> Vec<FixtureEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// ============================================================================
// Startup
// ============================================================================

mod startup {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fixtures_start_dark() {
        let transport = Arc::new(MemoryTransport::new());
        let rig = Rig::start(&config(), Arc::clone(&transport)).unwrap();
        assert_eq!(rig.len(), 2);

        sleep(ms(10)).await;

        assert_eq!(transport.frame_count(), 2);
        // 3000 K is an eighth of the 2000-10000 K range
        assert_eq!(transport.channels(2, 1, 10), vec![0, 0, 0, 32, 7, 0, 0, 0, 32, 7]);
        let desk = rig.fixture("Desk").unwrap();
        assert_eq!(desk.state(), ColorState::off(3000));
        rig.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_type_is_rejected() {
        let mut config = config();
        config.types[1].max_color_temp_kelvin = 2700;

        let err = Rig::start(&config, MemoryTransport::new()).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(dmx_fader::ConfigError::InvalidColorTempRange { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_fixture() {
        let rig = Rig::start(&config(), MemoryTransport::new()).unwrap();
        assert!(matches!(rig.fixture("Attic"), Err(Error::FixtureNotFound(name)) if name == "Attic"));
        rig.shutdown().await;
    }
}

// ============================================================================
// Requests
// ============================================================================

mod requests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn snap_writes_exact_bytes() {
        let transport = Arc::new(MemoryTransport::new());
        let rig = Rig::start(&config(), Arc::clone(&transport)).unwrap();
        let mut events = rig.subscribe();

        let target = ColorState::on(0.5, 40.0, 0.79, 4000);
        rig.fixture("Desk").unwrap().set(target, None).await.unwrap();
        sleep(ms(10)).await;

        assert_eq!(transport.channels(2, 1, 5), vec![128, 28, 201, 64, 7]);
        // the other fixture is untouched
        assert_eq!(transport.channels(2, 6, 5), vec![0, 0, 0, 32, 7]);

        let events = drain(&mut events);
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0],
            FixtureEvent::state_updated(Arc::from("Desk"), target)
        );
        rig.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn fade_reaches_target_through_midpoint() {
        let transport = Arc::new(MemoryTransport::new());
        let rig = Rig::start(&config(), Arc::clone(&transport)).unwrap();
        let desk = rig.fixture("Desk").unwrap();
        let mut events = rig.subscribe();

        desk.turn_on(TurnOn::new().brightness(1.0).hs_color(200.0, 0.6).transition(2.0))
            .await
            .unwrap();

        sleep(ms(1000)).await;
        let mid = desk.state();
        assert!(mid.is_on());
        assert!((0.45..=0.55).contains(&mid.brightness()), "{mid}");
        // off to on: color is already at the target
        assert_eq!(mid.hue(), 200.0);
        assert_eq!(mid.saturation(), 0.6);

        sleep(ms(1500)).await;
        let target = ColorState::on(1.0, 200.0, 0.6, 3000);
        assert_eq!(desk.state(), target);
        assert_eq!(
            transport.channels(2, 1, 5),
            encode(&normalize(&target).unwrap(), &hsct())
        );

        let events = drain(&mut events);
        assert!(matches!(
            events.first(),
            Some(FixtureEvent::FadeStarted { duration, .. }) if *duration == Duration::from_secs(2)
        ));
        assert!(matches!(events.last(), Some(FixtureEvent::FadeCompleted { .. })));
        let updates = events.iter().filter(|e| e.is_state_update()).count();
        assert!((4..=6).contains(&updates), "{updates} state updates");
        rig.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn turn_off_supersedes_and_turn_on_resumes() {
        let transport = Arc::new(MemoryTransport::new());
        let rig = Rig::start(&config(), Arc::clone(&transport)).unwrap();
        let shelf = rig.fixture("Shelf").unwrap();
        let mut events = rig.subscribe();

        shelf
            .turn_on(TurnOn::new().brightness(1.0).hs_color(120.0, 1.0).transition(10.0))
            .await
            .unwrap();
        sleep(ms(1000)).await;

        shelf.turn_off(Some(0.0)).await.unwrap();
        sleep(ms(10)).await;

        let off = shelf.state();
        assert!(!off.is_on());
        assert_eq!(transport.channels(2, 6, 1), vec![0]);
        // the long fade never completed
        assert!(!drain(&mut events).iter().any(|e| matches!(e, FixtureEvent::FadeCompleted { .. })));

        shelf.turn_on(TurnOn::new()).await.unwrap();
        sleep(ms(10)).await;

        let resumed = shelf.state();
        assert!(resumed.is_on());
        assert_eq!(resumed.brightness(), off.brightness());
        assert!((0.05..=0.15).contains(&resumed.brightness()), "{resumed}");
        assert_eq!(resumed.hue(), 120.0);
        rig.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_range_request_is_clamped() {
        let transport = Arc::new(MemoryTransport::new());
        let rig = Rig::start(&config(), Arc::clone(&transport)).unwrap();

        rig.fixture("Desk")
            .unwrap()
            .set(ColorState::on(3.0, 0.0, 2.0, 50_000), Some(0.0))
            .await
            .unwrap();
        sleep(ms(10)).await;

        assert_eq!(transport.channels(2, 1, 5), vec![255, 0, 255, 255, 7]);
        rig.shutdown().await;
    }
}

// ============================================================================
// Refresh and shutdown
// ============================================================================

mod lifecycle {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn resend_refreshes_idle_fixtures() {
        let mut config = config();
        config.tunables = config.tunables.with_resend_every_secs(1.0);
        config.fixtures.truncate(1);

        let transport = Arc::new(MemoryTransport::new());
        let rig = Rig::start(&config, Arc::clone(&transport)).unwrap();

        sleep(ms(3500)).await;
        // start plus three refreshes
        assert_eq!(transport.frame_count(), 4);
        rig.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_resend_stays_quiet() {
        let mut config = config();
        config.fixtures.truncate(1);

        let transport = Arc::new(MemoryTransport::new());
        let rig = Rig::start(&config, Arc::clone(&transport)).unwrap();

        sleep(Duration::from_secs(5)).await;
        assert_eq!(transport.frame_count(), 1);
        rig.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn handles_fail_after_shutdown() {
        let rig = Rig::start(&config(), MemoryTransport::new()).unwrap();
        let desk = rig.fixture("Desk").unwrap().clone();

        rig.shutdown().await;

        let err = desk.turn_on(TurnOn::new()).await.unwrap_err();
        assert!(matches!(err, Error::ControllerClosed(name) if name == "Desk"));
    }
}

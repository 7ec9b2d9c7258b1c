// SPDX-License-Identifier: MPL-2.0

//! Demo program: run a fade against a queued transport and print every frame.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example fade_trace -- [config.json]
//! ```
//!
//! Without an argument a single three channel fixture is used. With debug
//! logging on, the fade completion line reports the intended and the
//! achieved emission rate.

use std::env;
use std::time::Duration;

use dmx_fader::config::Config;
use dmx_fader::transport::ChannelTransport;
use dmx_fader::{Rig, TurnOn};

const DEMO_CONFIG: &str = r#"{
    "universe": 0,
    "intended_fade_fps": 60,
    "check_fps": 240,
    "resend_universe_every_secs": 1,
    "home_assistant_state_update_frequency_secs": 0.5,
    "default_color_temp_kelvin": 3000,
    "types": [{
        "name": "hs",
        "min_color_temp_kelvin": 2000,
        "max_color_temp_kelvin": 6500,
        "channels": [
            {"type": "brightness", "bytes": 2, "endianness": "big"},
            {"type": "hue"},
            {"type": "saturation", "correction_polynomial": [0, 0.5, 0.5]}
        ]
    }],
    "fixtures": [{"name": "Demo", "channel": 1, "type": "hs"}]
}"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let config = match env::args().nth(1) {
        Some(path) => Config::from_json_str(&std::fs::read_to_string(path)?)?,
        None => Config::from_json_str(DEMO_CONFIG)?,
    };
    let Some(first) = config.fixtures.first().map(|f| f.name.clone()) else {
        eprintln!("The configuration has no fixtures");
        std::process::exit(1);
    };

    let (transport, mut frames) = ChannelTransport::unbounded();
    let printer = tokio::spawn(async move {
        while let Some(frame) = frames.recv().await {
            println!(
                "universe {} @{:>3}: {:?}",
                frame.universe, frame.start_channel, frame.payload
            );
        }
    });

    let rig = Rig::start(&config, transport)?;
    let mut events = rig.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            println!("event: {event:?}");
        }
    });

    let fixture = rig.fixture(&first)?;
    println!("Fading {first} up over 2 s...");
    fixture
        .turn_on(TurnOn::new().brightness(1.0).hs_color(30.0, 0.8).transition(2.0))
        .await?;
    tokio::time::sleep(Duration::from_millis(2500)).await;

    println!("Fading {first} to blue over 1 s...");
    fixture
        .turn_on(TurnOn::new().hs_color(220.0, 1.0).transition(1.0))
        .await?;
    tokio::time::sleep(Duration::from_millis(1500)).await;

    println!("Turning {first} off...");
    fixture.turn_off(Some(1.0)).await?;
    tokio::time::sleep(Duration::from_millis(1500)).await;

    println!("Final state: {}", fixture.state());
    rig.shutdown().await;
    printer.abort();
    Ok(())
}

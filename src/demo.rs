//! Scripted session without any MIDI hardware
//!
//! Feeds a fixed performance through a loopback cable into the router, with
//! a console output standing in for the synth, and exercises the channel
//! commands along the way.

use colored::Colorize;
use tracing::info;

use crate::backend::{cable, ConsoleOutput, LoopbackOutput};
use crate::keys::{KeyMap, LogInjector};
use crate::midi::Message;
use crate::router::{Router, RoutingSettings};

fn step(router: &mut Router, title: &str) {
    let routed = router.tick();
    println!("{} {} ({} routed)", "▶".cyan(), title, routed);
}

fn play(source: &LoopbackOutput, raw: &[&[u8]]) {
    for bytes in raw {
        source.send_raw(bytes);
    }
}

/// Run the script and hand back the router for inspection
pub fn run() -> Router {
    let (input, source) = cable("demo");
    let settings = RoutingSettings {
        listen_channel: 0,
        remap_channel: Some(9),
        ..Default::default()
    };
    let keymap: KeyMap = [(60, "A"), (62, "S"), (64, "D")]
        .into_iter()
        .map(|(note, key)| (note, key.to_string()))
        .collect();

    let mut router = Router::with_ports(
        settings,
        keymap,
        Box::new(LogInjector),
        Box::new(input),
        Box::new(ConsoleOutput::new("demo-out")),
    );
    info!("Demo session started");

    play(&source, &[&[0x90, 60, 100], &[0x90, 64, 90], &[0x80, 60, 0]]);
    step(&mut router, "listen channel chord, remapped to ch 10, keys A/D");

    router.set_hold(1, true);
    play(&source, &[&[0x91, 48, 80], &[0x81, 48, 0], &[0x91, 52, 0]]);
    step(&mut router, "hold on ch 2: releases suppressed");

    play(
        &source,
        &[&[0xE2, 0x00, 0x60], &[0xB2, 1, 64], &[0xB2, 64, 127], &[0xC2, 5]],
    );
    source.send_ump(0x2093_4550);
    source.send_raw(&[0xF0, 0x7E, 0x7F, 0x06, 0x01, 0xF7]);
    step(&mut router, "controllers on ch 3, UMP note on ch 4, SysEx");

    router.set_solo(2, true);
    play(&source, &[&[0x90, 62, 100], &[0x92, 67, 100]]);
    step(&mut router, "solo ch 3: others muted, ch 1 keys still fire");

    router.set_solo(2, false);
    router.set_hold(1, false);
    router.step_program(1);
    router.route(Message::None);
    step(&mut router, "solo and hold released, program stepped");

    router
}

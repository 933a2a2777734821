//! End-to-end: raw bytes into a loopback cable, through the router, out of another cable

use std::cell::RefCell;
use std::rc::Rc;

use midikeys::backend::{cable, InputPort, LoopbackInput, LoopbackOutput, OutputPort};
use midikeys::keys::{KeyMap, KeystrokeInjector};
use midikeys::midi::Message;
use midikeys::router::{Router, RoutingSettings};

#[derive(Clone, Default)]
struct Keys(Rc<RefCell<Vec<(String, bool)>>>);

impl KeystrokeInjector for Keys {
    fn inject(&self, key: &str, pressed: bool) {
        self.0.borrow_mut().push((key.to_string(), pressed));
    }
}

fn setup(settings: RoutingSettings) -> (Router, LoopbackOutput, LoopbackInput, Keys) {
    let (input, source) = cable("keyboard");
    let (sink, output) = cable("synth");
    let keys = Keys::default();

    let mut keymap = KeyMap::new();
    keymap.bind(60, "A");

    let router = Router::with_ports(
        settings,
        keymap,
        Box::new(keys.clone()),
        Box::new(input),
        Box::new(output),
    );
    (router, source, sink, keys)
}

fn drain(sink: &LoopbackInput) -> Vec<Message> {
    std::iter::from_fn(|| sink.poll(false)).collect()
}

#[test]
fn test_bytes_in_bytes_out() {
    let (mut router, source, sink, keys) = setup(RoutingSettings {
        listen_channel: 0,
        remap_channel: Some(3),
        ..Default::default()
    });

    source.send_raw(&[0x90, 60, 100]);
    source.send_raw(&[0xB1, 64, 127]);
    source.send_raw(&[0xF8]); // clock, dropped
    source.send_raw(&[0x80, 60, 0]);
    router.tick();

    let out: Vec<Vec<u8>> = drain(&sink).iter().map(Message::to_bytes).collect();
    assert_eq!(
        out,
        vec![vec![0x93, 60, 100], vec![0xB1, 64, 127], vec![0x83, 60, 0]]
    );
    assert_eq!(
        *keys.0.borrow(),
        vec![("A".to_string(), true), ("A".to_string(), false)]
    );
    assert_eq!(router.channels().get(1).pedal, 127);
}

#[test]
fn test_commands_between_ticks() {
    let (mut router, source, sink, _keys) = setup(RoutingSettings::default());

    source.send_raw(&[0x92, 50, 90]);
    router.tick();
    drain(&sink);

    router.set_mute(2, true);
    source.send_raw(&[0x92, 51, 90]);
    router.tick();

    // Only the mute release reaches the synth
    assert_eq!(
        drain(&sink),
        vec![Message::NoteOff {
            channel: 2,
            note: 50,
            velocity: 0
        }]
    );
}

#[test]
fn test_ump_source() {
    let (mut router, source, sink, _keys) = setup(RoutingSettings::default());

    source.send_ump(0x25E0_7F7F); // group 5, pitch bend max on ch 1
    source.send_ump(0x4090_3C00); // MIDI 2.0 voice, not downgraded
    assert_eq!(router.tick(), 2);

    assert_eq!(
        drain(&sink),
        vec![Message::PitchBend {
            channel: 0,
            level: 16383
        }]
    );
}

#[test]
fn test_closed_sink_drops_silently() {
    let (mut router, source, sink, _keys) = setup(RoutingSettings::default());
    drop(sink);

    source.send_raw(&[0x90, 60, 100]);
    assert_eq!(router.tick(), 1);
    assert!(!router.output().status());
    assert_eq!(router.channels().get(0).held[60], 100);
}

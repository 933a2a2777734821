//! Terminal rendering of the channel table and device lists

use colored::Colorize;
use std::fmt::Write;

use crate::backend::{DeviceInfo, InputPort, OutputPort};
use crate::chord;
use crate::midi::{note_name, PITCH_BEND_CENTER};
use crate::router::Router;

fn flag(on: bool, letter: &str) -> String {
    if on {
        letter.yellow().bold().to_string()
    } else {
        "-".dimmed().to_string()
    }
}

fn port_line(label: &str, connected: bool, name: Option<&DeviceInfo>, error: &str) -> String {
    let state = if connected {
        "connected".green()
    } else {
        "disconnected".red()
    };
    let name = name.map(|d| d.name.as_str()).unwrap_or("-");
    if error.is_empty() {
        format!("{} {} ({})", label.bold(), name, state)
    } else {
        format!("{} {} ({}: {})", label.bold(), name, state, error)
    }
}

fn bound_device(devices: &[DeviceInfo], index: usize, connected: bool) -> Option<&DeviceInfo> {
    if connected {
        devices.get(index)
    } else {
        None
    }
}

/// The status view: ports, routing, the listen channel's chord and one line per channel
pub fn render_status(router: &Router) -> String {
    let mut out = String::new();
    let settings = router.settings();
    let input = router.input();
    let output = router.output();

    let in_devices = input.devices();
    let out_devices = output.devices();
    let _ = writeln!(
        out,
        "{}",
        port_line(
            "in: ",
            input.status(),
            bound_device(&in_devices, input.index(), input.status()),
            &input.last_error()
        )
    );
    let _ = writeln!(
        out,
        "{}",
        port_line(
            "out:",
            output.status(),
            bound_device(&out_devices, output.index(), output.status()),
            &output.last_error()
        )
    );

    let remap = settings
        .remap_channel
        .map(|ch| (ch + 1).to_string())
        .unwrap_or_else(|| "off".to_string());
    let _ = writeln!(
        out,
        "listen {}  remap {}  output {}{}  keys {}",
        (settings.listen_channel + 1).to_string().cyan(),
        remap.cyan(),
        (settings.effective_output_channel() + 1).to_string().cyan(),
        if settings.sync_output_channel { " (sync)" } else { "" },
        router.keymap().len()
    );

    let listen_notes: Vec<u8> = router
        .channels()
        .get(settings.listen_channel)
        .held_notes()
        .map(|(note, _)| note)
        .collect();
    let _ = writeln!(
        out,
        "chord  {}",
        chord::name(&listen_notes)
            .map(|name| name.bold().to_string())
            .unwrap_or_else(|| "-".dimmed().to_string())
    );

    let _ = writeln!(
        out,
        "{}",
        "      ch  M S H  prog   bend  mod  ped  held".dimmed()
    );

    for (channel, state) in router.channels().iter() {
        let activity = if router.activity().is_active(channel) {
            "●".green().to_string()
        } else {
            "·".dimmed().to_string()
        };
        let marker = if channel == settings.listen_channel {
            "L".cyan().bold().to_string()
        } else {
            " ".to_string()
        };

        let bend = state.pitch_bend as i32 - PITCH_BEND_CENTER as i32;
        let held: Vec<String> = state.held_notes().map(|(note, _)| note_name(note)).collect();

        let _ = writeln!(
            out,
            "  {} {} {:>2}  {} {} {}  {:>4}  {:>+5}  {:>3}  {:>3}  {}",
            activity,
            marker,
            channel + 1,
            flag(state.muted, "M"),
            flag(state.solo, "S"),
            flag(state.hold, "H"),
            state.program,
            bend,
            state.modulation,
            state.pedal,
            held.join(" ")
        );
    }

    out
}

/// Device lists for both sides, marking the bound device
pub fn render_devices(input: &dyn InputPort, output: &dyn OutputPort) -> String {
    let mut out = String::new();
    let sides: [(&str, Vec<DeviceInfo>, usize, bool, String); 2] = [
        (
            "Inputs",
            input.devices(),
            input.index(),
            input.status(),
            input.last_error(),
        ),
        (
            "Outputs",
            output.devices(),
            output.index(),
            output.status(),
            output.last_error(),
        ),
    ];

    for (title, devices, index, connected, error) in sides {
        let _ = writeln!(out, "{}", title.bold());
        if devices.is_empty() {
            let _ = writeln!(out, "  {}", "(none)".dimmed());
        }
        for device in &devices {
            let bound = connected && device.index == index;
            let mark = if bound { "*".green().to_string() } else { " ".to_string() };
            let _ = writeln!(out, " {} {:>2}: {}", mark, device.index, device.name);
        }
        if !error.is_empty() {
            let _ = writeln!(out, "  {} {}", "✗".red(), error);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::cable;
    use crate::keys::{KeyMap, LogInjector};
    use crate::midi::Message;
    use crate::router::RoutingSettings;

    #[test]
    fn test_status_lists_every_channel() {
        colored::control::set_override(false);
        let (input, _source) = cable("in");
        let (_probe, output) = cable("out");
        let mut router = Router::with_ports(
            RoutingSettings::default(),
            KeyMap::new(),
            Box::new(LogInjector),
            Box::new(input),
            Box::new(output),
        );
        router.route(Message::NoteOn {
            channel: 2,
            note: 60,
            velocity: 100,
        });
        router.set_hold(2, true);
        for note in [57, 60, 64] {
            router.route(Message::NoteOn {
                channel: 0,
                note,
                velocity: 90,
            });
        }

        let text = render_status(&router);
        assert!(text.contains("connected"));
        assert!(text.contains("listen 1"));
        assert!(text.contains("chord  Am"));
        // Two ports, routing, chord, header, sixteen channels
        assert_eq!(text.lines().count(), 21);
        let row = text.lines().find(|l| l.contains(" 3  ")).unwrap();
        assert!(row.contains("C5"));
        assert!(row.contains('H'));
    }

    #[test]
    fn test_devices_marks_bound_port() {
        colored::control::set_override(false);
        let (input, _source) = cable("keys");
        let (_probe, output) = cable("synth");

        let text = render_devices(&input, &output);
        assert!(text.contains("*  0: keys"));
        assert!(text.contains("*  0: synth"));
    }
}

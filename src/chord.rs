//! Chord names for a set of held notes
//!
//! The held pitch classes are matched against a small table of triads and
//! seventh chords. Every held pitch class is tried as the root, the bass
//! first, so `C E G` reads as `C` and `E G C` as `C/E`.

use crate::midi::note_name;

const PITCH_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// (suffix, intervals above the root in semitones)
const SHAPES: &[(&str, &[u8])] = &[
    ("", &[0, 4, 7]),
    ("m", &[0, 3, 7]),
    ("dim", &[0, 3, 6]),
    ("aug", &[0, 4, 8]),
    ("sus2", &[0, 2, 7]),
    ("sus4", &[0, 5, 7]),
    ("maj7", &[0, 4, 7, 11]),
    ("m7", &[0, 3, 7, 10]),
    ("7", &[0, 4, 7, 10]),
    ("m7b5", &[0, 3, 6, 10]),
    ("dim7", &[0, 3, 6, 9]),
];

fn mask(intervals: &[u8]) -> u16 {
    intervals.iter().fold(0, |m, &i| m | 1 << (i % 12))
}

/// Rotate a pitch-class mask so `root` lands on bit 0
fn rotate(mask: u16, root: u8) -> u16 {
    let root = u32::from(root % 12);
    ((mask >> root) | (mask << (12 - root))) & 0x0FFF
}

/// Name the chord formed by `notes` (MIDI note numbers, any order)
///
/// Returns `None` when nothing is held. Without a known shape the note
/// names are listed instead.
pub fn name(notes: &[u8]) -> Option<String> {
    let bass = *notes.iter().min()?;
    let held = notes.iter().fold(0u16, |m, &n| m | 1 << (n % 12));

    let roots = std::iter::once(bass % 12)
        .chain((0..12).filter(|&pc| pc != bass % 12 && held & (1 << pc) != 0));

    for root in roots {
        let shape = rotate(held, root);
        if let Some((suffix, _)) = SHAPES.iter().find(|(_, iv)| mask(iv) == shape) {
            let mut chord = format!("{}{}", PITCH_NAMES[root as usize], suffix);
            if root != bass % 12 {
                chord.push('/');
                chord.push_str(PITCH_NAMES[(bass % 12) as usize]);
            }
            return Some(chord);
        }
    }

    let mut sorted = notes.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    Some(
        sorted
            .into_iter()
            .map(note_name)
            .collect::<Vec<_>>()
            .join(" "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_position_triads() {
        assert_eq!(name(&[60, 64, 67]).as_deref(), Some("C"));
        assert_eq!(name(&[57, 60, 64]).as_deref(), Some("Am"));
        assert_eq!(name(&[59, 62, 65]).as_deref(), Some("Bdim"));
        assert_eq!(name(&[62, 67, 69]).as_deref(), Some("Dsus4"));
    }

    #[test]
    fn test_sevenths() {
        assert_eq!(name(&[55, 59, 62, 65]).as_deref(), Some("G7"));
        assert_eq!(name(&[60, 64, 67, 71]).as_deref(), Some("Cmaj7"));
        assert_eq!(name(&[59, 62, 65, 69]).as_deref(), Some("Bm7b5"));
    }

    #[test]
    fn test_inversion_names_bass() {
        assert_eq!(name(&[64, 67, 72]).as_deref(), Some("C/E"));
        // Doubled notes across octaves do not change the chord
        assert_eq!(name(&[43, 60, 64, 67, 72]).as_deref(), Some("C/G"));
    }

    #[test]
    fn test_unknown_shape_lists_notes() {
        assert_eq!(name(&[61, 60]).as_deref(), Some("C5 C#5"));
        assert_eq!(name(&[60]).as_deref(), Some("C5"));
        assert_eq!(name(&[]), None);
    }
}

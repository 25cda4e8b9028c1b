//! Note names: "C4", "Eb2", "F#3" → semitone offset from A4.
//!
//! Scripts see pitches as offsets from concert A (A4 = 0, C4 = -9), which
//! `hz()` turns back into a frequency.

/// Lowest and highest octave registered as script constants.
pub const CONSTANT_OCTAVES: std::ops::RangeInclusive<i32> = 0..=7;

const LETTERS: [(char, i32); 7] = [
    ('C', 0),
    ('D', 2),
    ('E', 4),
    ('F', 5),
    ('G', 7),
    ('A', 9),
    ('B', 11),
];

/// Parse a note name into its semitone offset from A4.
///
/// Format: `<letter><optional accidental><octave>`
/// - Letter: C, D, E, F, G, A, B
/// - Accidental: # (sharp) or b (flat)
/// - Octave: integer, possibly negative
pub fn parse_note_name(name: &str) -> Option<i32> {
    let mut chars = name.chars();
    let letter = chars.next()?;
    let base = LETTERS.iter().find(|(l, _)| *l == letter)?.1;

    let rest = chars.as_str();
    let (accidental, octave_str) = if let Some(r) = rest.strip_prefix('#') {
        (1, r)
    } else if let Some(r) = rest.strip_prefix('b') {
        (-1, r)
    } else {
        (0, rest)
    };

    let octave: i32 = octave_str.parse().ok()?;

    // A4 is MIDI 69; MIDI note = (octave + 1) * 12 + base + accidental.
    Some((octave + 1) * 12 + base + accidental - 69)
}

/// Every note-name constant a script can reference, with its value.
///
/// Covers octaves 0 through 7 and each letter in natural, sharp and flat
/// spelling, including enharmonics such as `Cb4` and `E#4`.
pub fn note_constants() -> Vec<(String, f32)> {
    let mut out = Vec::with_capacity(LETTERS.len() * 3 * CONSTANT_OCTAVES.clone().count());
    for octave in CONSTANT_OCTAVES {
        for (letter, _) in LETTERS {
            for accidental in ["", "#", "b"] {
                let name = format!("{letter}{accidental}{octave}");
                if let Some(value) = parse_note_name(&name) {
                    out.push((name, value as f32));
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_is_zero() {
        assert_eq!(parse_note_name("A4"), Some(0));
    }

    #[test]
    fn middle_c() {
        assert_eq!(parse_note_name("C4"), Some(-9));
    }

    #[test]
    fn a3_octave_below() {
        assert_eq!(parse_note_name("A3"), Some(-12));
    }

    #[test]
    fn accidentals() {
        assert_eq!(parse_note_name("F#3"), Some(-15));
        assert_eq!(parse_note_name("Bb3"), Some(-11));
        assert_eq!(parse_note_name("Cb0"), Some(-58));
        assert_eq!(parse_note_name("B#0"), Some(-45));
    }

    #[test]
    fn invalid_names() {
        assert_eq!(parse_note_name(""), None);
        assert_eq!(parse_note_name("X4"), None);
        assert_eq!(parse_note_name("C"), None);
        assert_eq!(parse_note_name("C#"), None);
    }

    #[test]
    fn constant_table_covers_all_octaves() {
        let constants = note_constants();
        assert_eq!(constants.len(), 7 * 3 * 8);
        assert!(constants.iter().any(|(n, v)| n == "C0" && *v == -57.0));
        assert!(constants.iter().any(|(n, v)| n == "B7" && *v == 38.0));
        assert!(constants.iter().any(|(n, v)| n == "E#4" && *v == -4.0));
    }
}

// Staff-index to pitch resolution, and notation tokens in both directions.
//
// A staff index is a signed diatonic position: 0 is the C line/space of
// register 4 (middle C), +1 is one letter higher, and every 7 steps is one
// octave. Resolving an index in a key gives the letter drawn there, the scale
// degree it plays in that key, the accidental the key signature implies, and
// the sounding MIDI number.
//
// Notation tokens are the pitch part of a note in the score text: an optional
// accidental marker (`^` sharp, `_` flat, `=` natural, doubled for double
// sharps/flats), a letter, and register marks (`'` up, `,` down) relative to
// register 4. Uppercase letters sit in register 4, lowercase in register 5.
// Tokens produced by `resolve` omit the marker unless the note is altered
// away from the key signature, because the printed signature supplies it.
//
// See key.rs for the scale tables this reads.

use crate::error::ScoreError;
use crate::key::{KeySignature, Letter};
use serde::{Deserialize, Serialize};

/// A written accidental.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Accidental {
    DoubleFlat,
    Flat,
    Natural,
    Sharp,
    DoubleSharp,
}

impl Accidental {
    /// Offset from the unaltered letter, in semitones.
    pub fn semitones(self) -> i32 {
        match self {
            Accidental::DoubleFlat => -2,
            Accidental::Flat => -1,
            Accidental::Natural => 0,
            Accidental::Sharp => 1,
            Accidental::DoubleSharp => 2,
        }
    }

    /// Token prefix for this accidental.
    pub fn marker(self) -> &'static str {
        match self {
            Accidental::DoubleFlat => "__",
            Accidental::Flat => "_",
            Accidental::Natural => "=",
            Accidental::Sharp => "^",
            Accidental::DoubleSharp => "^^",
        }
    }

    /// Apply a manual alteration to a key-signature accidental.
    ///
    /// Raising moves one step toward sharp, lowering one step toward flat.
    /// Key signatures only ever imply sharp, flat or natural; anything else
    /// here means the key table is corrupt.
    pub fn altered(self, alteration: Alteration) -> Accidental {
        match (self, alteration) {
            (acc, Alteration::None) => acc,
            (Accidental::Natural, Alteration::Raise) => Accidental::Sharp,
            (Accidental::Sharp, Alteration::Raise) => Accidental::DoubleSharp,
            (Accidental::Flat, Alteration::Raise) => Accidental::Natural,
            (Accidental::Natural, Alteration::Lower) => Accidental::Flat,
            (Accidental::Flat, Alteration::Lower) => Accidental::DoubleFlat,
            (Accidental::Sharp, Alteration::Lower) => Accidental::Natural,
            (acc @ (Accidental::DoubleFlat | Accidental::DoubleSharp), _) => {
                unreachable!("key signature implies {acc:?}; only sharp, flat or natural are valid")
            }
        }
    }
}

/// Manual deviation from the key signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Alteration {
    Lower,
    #[default]
    None,
    Raise,
}

impl Alteration {
    pub fn semitones(self) -> i32 {
        match self {
            Alteration::Lower => -1,
            Alteration::None => 0,
            Alteration::Raise => 1,
        }
    }
}

/// A resolved note. Built once by `resolve` and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pitch {
    /// Name of the key this pitch was resolved in.
    pub key: String,
    pub staff_index: i32,
    /// Octave number; register 4 holds middle C.
    pub register: i32,
    /// 1-7 within the key.
    pub scale_degree: u8,
    pub letter: Letter,
    pub midi: u8,
    /// What the key signature alone makes of this letter.
    pub default_accidental: Accidental,
    pub alteration: Alteration,
    pub notation_token: String,
}

impl Pitch {
    /// The accidental actually sounding (signature plus alteration).
    pub fn accidental(&self) -> Accidental {
        self.default_accidental.altered(self.alteration)
    }
}

/// Resolve a staff index to a concrete pitch in `key`.
pub fn resolve(key: &KeySignature, staff_index: i32, alteration: Alteration) -> Result<Pitch, ScoreError> {
    let position = staff_index.rem_euclid(7);
    let register = 4 + staff_index.div_euclid(7);

    // Distance in staff steps down to the tonic's position, counted from 1.
    let scale_degree = ((position - key.staff_root).rem_euclid(7) + 1) as u8;
    let note = key.degree(scale_degree);
    debug_assert_eq!(note.letter, Letter::from_index(position as usize));

    let default_accidental = key.default_accidental(note.letter);
    let accidental = default_accidental.altered(alteration);

    let midi = checked_midi(note.letter, register, accidental).ok_or_else(|| ScoreError::PitchOutOfRange {
        staff_index,
        midi: midi_number(note.letter, register, accidental),
    })?;
    debug_assert_eq!(
        (midi as i32 - alteration.semitones()).rem_euclid(12),
        note.pitch_class as i32
    );

    let mut notation_token = String::new();
    if alteration != Alteration::None {
        notation_token.push_str(accidental.marker());
    }
    notation_token.push(note.letter.as_char());
    notation_token.push_str(&register_marks(register));

    Ok(Pitch {
        key: key.name.clone(),
        staff_index,
        register,
        scale_degree,
        letter: note.letter,
        midi,
        default_accidental,
        alteration,
        notation_token,
    })
}

/// MIDI number of `letter` in `register`, measured from the letter rather
/// than the pitch class so that Cb and B# land in the register their letter
/// is drawn in. Saturates instead of overflowing for absurd registers.
fn midi_number(letter: Letter, register: i32, accidental: Accidental) -> i32 {
    register
        .saturating_add(1)
        .saturating_mul(12)
        .saturating_add(letter.natural_pitch_class() as i32 + accidental.semitones())
}

/// `midi_number`, if it lies in 0..=127.
fn checked_midi(letter: Letter, register: i32, accidental: Accidental) -> Option<u8> {
    u8::try_from(midi_number(letter, register, accidental))
        .ok()
        .filter(|m| *m <= 127)
}

fn register_marks(register: i32) -> String {
    if register >= 4 {
        "'".repeat((register - 4) as usize)
    } else {
        ",".repeat((4 - register) as usize)
    }
}

/// The parts of a notation token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotationToken {
    /// Explicit marker, if the token carries one.
    pub accidental: Option<Accidental>,
    pub letter: Letter,
    pub register: i32,
}

impl NotationToken {
    pub fn parse(token: &str) -> Result<Self, ScoreError> {
        let malformed = || ScoreError::MalformedToken(token.to_string());
        let mut chars = token.chars().peekable();

        let mut marker = String::new();
        while let Some(&c) = chars.peek() {
            if !matches!(c, '^' | '_' | '=') {
                break;
            }
            marker.push(c);
            chars.next();
        }
        let accidental = match marker.as_str() {
            "" => None,
            "__" => Some(Accidental::DoubleFlat),
            "_" => Some(Accidental::Flat),
            "=" => Some(Accidental::Natural),
            "^" => Some(Accidental::Sharp),
            "^^" => Some(Accidental::DoubleSharp),
            _ => return Err(malformed()),
        };

        let c = chars.next().ok_or_else(malformed)?;
        let letter = Letter::from_char(c).ok_or_else(malformed)?;
        let mut register = if c.is_ascii_lowercase() { 5 } else { 4 };

        for c in chars {
            match c {
                '\'' => register = i32::saturating_add(register, 1),
                ',' => register = i32::saturating_sub(register, 1),
                _ => return Err(malformed()),
            }
        }

        Ok(NotationToken { accidental, letter, register })
    }

    fn midi_with(&self, accidental: Accidental) -> Result<u8, ScoreError> {
        checked_midi(self.letter, self.register, accidental).ok_or_else(|| ScoreError::PitchOutOfRange {
            staff_index: self.staff_index(),
            midi: midi_number(self.letter, self.register, accidental),
        })
    }

    fn staff_index(&self) -> i32 {
        (self.register.saturating_sub(4))
            .saturating_mul(7)
            .saturating_add(self.letter.index() as i32)
    }
}

/// MIDI number of a token read without any key signature.
pub fn resolve_inverse(token: &str) -> Result<u8, ScoreError> {
    let parsed = NotationToken::parse(token)?;
    parsed.midi_with(parsed.accidental.unwrap_or(Accidental::Natural))
}

/// MIDI number of a token read under `key`'s signature.
///
/// A token without a marker takes the signature's accidental for its letter;
/// `=` forces a natural.
pub fn resolve_inverse_in_key(key: &KeySignature, token: &str) -> Result<u8, ScoreError> {
    let parsed = NotationToken::parse(token)?;
    let accidental = parsed
        .accidental
        .unwrap_or_else(|| key.default_accidental(parsed.letter));
    parsed.midi_with(accidental)
}

/// Spell a MIDI number chromatically, with sharps or (if `use_flats`) flats.
pub fn midi_to_token(midi: u8, use_flats: bool) -> String {
    let (marker, letter) = match midi % 12 {
        0 => ("", 'C'),
        1 if use_flats => ("_", 'D'),
        1 => ("^", 'C'),
        2 => ("", 'D'),
        3 if use_flats => ("_", 'E'),
        3 => ("^", 'D'),
        4 => ("", 'E'),
        5 => ("", 'F'),
        6 if use_flats => ("_", 'G'),
        6 => ("^", 'F'),
        7 => ("", 'G'),
        8 if use_flats => ("_", 'A'),
        8 => ("^", 'G'),
        9 => ("", 'A'),
        10 if use_flats => ("_", 'B'),
        10 => ("^", 'A'),
        _ => ("", 'B'),
    };
    let register = (midi / 12) as i32 - 1;
    format!("{marker}{letter}{}", register_marks(register))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeySignatureTable;

    fn key(name: &str) -> &'static KeySignature {
        KeySignatureTable::standard().get(name).unwrap()
    }

    #[test]
    fn middle_c_and_its_octaves() {
        let c = key("C");
        let p = resolve(c, 0, Alteration::None).unwrap();
        assert_eq!((p.midi, p.notation_token.as_str(), p.register, p.scale_degree), (60, "C", 4, 1));

        let up = resolve(c, 7, Alteration::None).unwrap();
        assert_eq!((up.midi, up.notation_token.as_str()), (72, "C'"));

        let down = resolve(c, -7, Alteration::None).unwrap();
        assert_eq!((down.midi, down.notation_token.as_str()), (48, "C,"));

        let low_b = resolve(c, -1, Alteration::None).unwrap();
        assert_eq!((low_b.midi, low_b.notation_token.as_str()), (59, "B,"));
    }

    #[test]
    fn scale_degree_counts_from_the_tonic_position() {
        let g = key("G");
        let f_sharp = resolve(g, 3, Alteration::None).unwrap();
        assert_eq!(f_sharp.scale_degree, 7);
        assert_eq!(f_sharp.midi, 66);
        assert_eq!(f_sharp.notation_token, "F", "signature supplies the sharp");
        assert_eq!(f_sharp.default_accidental, Accidental::Sharp);

        let tonic = resolve(g, 4, Alteration::None).unwrap();
        assert_eq!(tonic.scale_degree, 1);
        assert_eq!(tonic.midi, 67);
    }

    #[test]
    fn cb_and_b_sharp_stay_in_their_drawn_register() {
        let cb = resolve(key("Cb"), 0, Alteration::None).unwrap();
        assert_eq!(cb.midi, 59);
        let b_sharp = resolve(key("C#"), 6, Alteration::None).unwrap();
        assert_eq!(b_sharp.midi, 72);
    }

    #[test]
    fn raising_moves_toward_sharp() {
        let natural = resolve(key("C"), 3, Alteration::Raise).unwrap();
        assert_eq!((natural.midi, natural.notation_token.as_str()), (66, "^F"));

        let sharp = resolve(key("G"), 3, Alteration::Raise).unwrap();
        assert_eq!((sharp.midi, sharp.notation_token.as_str()), (67, "^^F"));

        let flat = resolve(key("F"), 6, Alteration::Raise).unwrap();
        assert_eq!((flat.midi, flat.notation_token.as_str()), (71, "=B"));
    }

    #[test]
    fn lowering_moves_toward_flat() {
        let natural = resolve(key("C"), 6, Alteration::Lower).unwrap();
        assert_eq!((natural.midi, natural.notation_token.as_str()), (70, "_B"));

        let flat = resolve(key("F"), 6, Alteration::Lower).unwrap();
        assert_eq!((flat.midi, flat.notation_token.as_str()), (69, "__B"));

        let sharp = resolve(key("D"), 3, Alteration::Lower).unwrap();
        assert_eq!((sharp.midi, sharp.notation_token.as_str()), (65, "=F"));
        assert_eq!(sharp.accidental(), Accidental::Natural);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let err = resolve(key("C"), 70, Alteration::None).unwrap_err();
        assert!(matches!(err, ScoreError::PitchOutOfRange { staff_index: 70, .. }));
    }

    #[test]
    fn extreme_indices_are_out_of_range_not_overflow() {
        for staff_index in [i32::MAX, i32::MIN, 2_000_000_000, -2_000_000_000] {
            let err = resolve(key("C#"), staff_index, Alteration::Raise).unwrap_err();
            assert!(
                matches!(err, ScoreError::PitchOutOfRange { staff_index: i, .. } if i == staff_index),
                "{staff_index}: {err:?}"
            );
        }
    }

    #[test]
    fn inverse_reads_explicit_markers() {
        for (token, midi) in [
            ("C", 60),
            ("D", 62),
            ("_C", 59),
            ("^C", 61),
            ("^C'", 73),
            ("^C,", 49),
            ("_D,", 49),
            ("c", 72),
            ("c'", 84),
            ("^^F", 67),
            ("__B", 69),
        ] {
            assert_eq!(resolve_inverse(token).unwrap(), midi, "{token}");
        }
    }

    #[test]
    fn inverse_without_letter_is_malformed() {
        for token in ["", "^", "'", "^=C", "C'x", "H"] {
            assert!(
                matches!(resolve_inverse(token), Err(ScoreError::MalformedToken(_))),
                "{token:?} should be malformed"
            );
        }
    }

    #[test]
    fn inverse_in_key_applies_the_signature() {
        let eb = key("Eb");
        assert_eq!(resolve_inverse_in_key(eb, "B").unwrap(), 70);
        assert_eq!(resolve_inverse_in_key(eb, "=B").unwrap(), 71);
        assert_eq!(resolve_inverse_in_key(eb, "C").unwrap(), 60);
    }

    #[test]
    fn resolve_then_inverse_round_trips_everywhere() {
        for key in KeySignatureTable::standard().iter() {
            for staff_index in -21..=21 {
                for alteration in [Alteration::Lower, Alteration::None, Alteration::Raise] {
                    let pitch = resolve(key, staff_index, alteration).unwrap();
                    assert_eq!(
                        resolve_inverse_in_key(key, &pitch.notation_token).unwrap(),
                        pitch.midi,
                        "{} index {} {:?} -> {}",
                        key.name,
                        staff_index,
                        alteration,
                        pitch.notation_token
                    );
                }
            }
        }
    }

    #[test]
    fn chromatic_spelling() {
        assert_eq!(midi_to_token(60, false), "C");
        assert_eq!(midi_to_token(61, false), "^C");
        assert_eq!(midi_to_token(73, false), "^C'");
        assert_eq!(midi_to_token(49, false), "^C,");
        assert_eq!(midi_to_token(49, true), "_D,");
        assert_eq!(midi_to_token(58, true), "_B,");
        assert_eq!(midi_to_token(21, false), "A,,,,");
        for midi in 21..=108 {
            assert_eq!(resolve_inverse(&midi_to_token(midi, true)).unwrap(), midi);
        }
    }
}

// Key signature table: the fixed set of major and minor keys the generator
// can write in.
//
// Each key maps scale degrees 1-7 to a (letter, pitch class) pair. The letter
// is what gets drawn on the staff; the pitch class is what sounds. F# in
// G major is drawn as a plain F (the key signature supplies the sharp) but
// still has pitch class 6.
//
// Scales are built by walking the letters C-D-E-F-G-A-B cyclically from the
// tonic while stepping the pitch class by the major (2,2,1,2,2,2,1) or natural
// minor (2,1,2,2,1,2,2) interval pattern. The key's accidentals are derived
// from the finished scale, so the table cannot disagree with itself.
//
// The table is built once on first use (`KeySignatureTable::standard()`) and
// is read-only afterwards. Lookup by name is the only query callers need.

use crate::error::ScoreError;
use crate::pitch::Accidental;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// A staff letter name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Letter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Letter {
    pub const ALL: [Letter; 7] = [
        Letter::C,
        Letter::D,
        Letter::E,
        Letter::F,
        Letter::G,
        Letter::A,
        Letter::B,
    ];

    /// Diatonic position above C (C = 0, B = 6).
    pub fn index(self) -> usize {
        self as usize
    }

    /// Letter at a diatonic position, wrapping every seven steps.
    pub fn from_index(index: usize) -> Letter {
        Letter::ALL[index % 7]
    }

    /// Pitch class of the unaltered letter.
    pub fn natural_pitch_class(self) -> u8 {
        match self {
            Letter::C => 0,
            Letter::D => 2,
            Letter::E => 4,
            Letter::F => 5,
            Letter::G => 7,
            Letter::A => 9,
            Letter::B => 11,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Letter::C => 'C',
            Letter::D => 'D',
            Letter::E => 'E',
            Letter::F => 'F',
            Letter::G => 'G',
            Letter::A => 'A',
            Letter::B => 'B',
        }
    }

    /// Parse a letter, ignoring case.
    pub fn from_char(c: char) -> Option<Letter> {
        match c.to_ascii_uppercase() {
            'C' => Some(Letter::C),
            'D' => Some(Letter::D),
            'E' => Some(Letter::E),
            'F' => Some(Letter::F),
            'G' => Some(Letter::G),
            'A' => Some(Letter::A),
            'B' => Some(Letter::B),
            _ => None,
        }
    }
}

/// Major or natural minor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tonality {
    Major,
    Minor,
}

impl Tonality {
    /// Semitone steps from each degree to the next, ending back on the tonic.
    pub fn steps(self) -> [u8; 7] {
        match self {
            Tonality::Major => [2, 2, 1, 2, 2, 2, 1],
            Tonality::Minor => [2, 1, 2, 2, 1, 2, 2],
        }
    }
}

/// One scale degree: the letter drawn on the staff and the pitch class heard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleNote {
    pub letter: Letter,
    pub pitch_class: u8,
}

/// Build the seven degrees of a scale starting on `root`.
///
/// `root_pitch_class` is taken modulo 12, so Cb (11) and B# (0) work.
pub fn build_scale(root: Letter, root_pitch_class: u8, tonality: Tonality) -> [ScaleNote; 7] {
    let steps = tonality.steps();
    let mut pitch_class = root_pitch_class % 12;
    let mut scale = [ScaleNote {
        letter: root,
        pitch_class,
    }; 7];
    for (degree, note) in scale.iter_mut().enumerate() {
        *note = ScaleNote {
            letter: Letter::from_index(root.index() + degree),
            pitch_class,
        };
        pitch_class = (pitch_class + steps[degree]) % 12;
    }
    scale
}

/// Sharps are written F C G D A E B; flats in the reverse order.
const SHARP_ORDER: [Letter; 7] = [
    Letter::F,
    Letter::C,
    Letter::G,
    Letter::D,
    Letter::A,
    Letter::E,
    Letter::B,
];

/// The accidentals a key signature applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyAccidentals {
    /// `Sharp`, `Flat`, or `Natural` for keys with an empty signature.
    pub symbol: Accidental,
    /// Affected letters, in the order they appear in the printed signature.
    pub letters: Vec<Letter>,
}

impl KeyAccidentals {
    fn from_scale(scale: &[ScaleNote; 7]) -> Self {
        let mut sharps = Vec::new();
        let mut flats = Vec::new();
        for note in scale {
            match (12 + note.pitch_class - note.letter.natural_pitch_class()) % 12 {
                1 => sharps.push(note.letter),
                11 => flats.push(note.letter),
                _ => {}
            }
        }
        if !sharps.is_empty() {
            let letters = SHARP_ORDER.into_iter().filter(|l| sharps.contains(l)).collect();
            KeyAccidentals { symbol: Accidental::Sharp, letters }
        } else if !flats.is_empty() {
            let letters = SHARP_ORDER.into_iter().rev().filter(|l| flats.contains(l)).collect();
            KeyAccidentals { symbol: Accidental::Flat, letters }
        } else {
            KeyAccidentals { symbol: Accidental::Natural, letters: Vec::new() }
        }
    }

    pub fn count(&self) -> usize {
        self.letters.len()
    }
}

/// A major or minor key: its scale, tonic staff position and signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySignature {
    /// Name as written in the notation header, e.g. "Bb" or "F#m".
    pub name: String,
    pub tonality: Tonality,
    /// Degrees 1-7, stored at indices 0-6.
    pub scale: [ScaleNote; 7],
    /// Diatonic offset of the tonic letter above C (0-6).
    pub staff_root: i32,
    pub accidentals: KeyAccidentals,
}

impl KeySignature {
    pub fn new(name: &str, root: Letter, root_pitch_class: u8, tonality: Tonality) -> Self {
        let scale = build_scale(root, root_pitch_class, tonality);
        KeySignature {
            name: name.to_string(),
            tonality,
            accidentals: KeyAccidentals::from_scale(&scale),
            scale,
            staff_root: root.index() as i32,
        }
    }

    /// Scale note for `degree` (1-7). Degrees outside that range wrap.
    pub fn degree(&self, degree: u8) -> ScaleNote {
        self.scale[(degree as usize + 6) % 7]
    }

    /// Accidental the signature applies to `letter`.
    pub fn default_accidental(&self, letter: Letter) -> Accidental {
        if self.accidentals.letters.contains(&letter) {
            self.accidentals.symbol
        } else {
            Accidental::Natural
        }
    }
}

/// (name, tonic letter, tonic pitch class, tonality) for every supported key.
const KEY_DEFINITIONS: [(&str, Letter, u8, Tonality); 30] = [
    ("C", Letter::C, 0, Tonality::Major),
    ("G", Letter::G, 7, Tonality::Major),
    ("D", Letter::D, 2, Tonality::Major),
    ("A", Letter::A, 9, Tonality::Major),
    ("E", Letter::E, 4, Tonality::Major),
    ("B", Letter::B, 11, Tonality::Major),
    ("F#", Letter::F, 6, Tonality::Major),
    ("C#", Letter::C, 1, Tonality::Major),
    ("F", Letter::F, 5, Tonality::Major),
    ("Bb", Letter::B, 10, Tonality::Major),
    ("Eb", Letter::E, 3, Tonality::Major),
    ("Ab", Letter::A, 8, Tonality::Major),
    ("Db", Letter::D, 1, Tonality::Major),
    ("Gb", Letter::G, 6, Tonality::Major),
    ("Cb", Letter::C, 11, Tonality::Major),
    ("Am", Letter::A, 9, Tonality::Minor),
    ("Em", Letter::E, 4, Tonality::Minor),
    ("Bm", Letter::B, 11, Tonality::Minor),
    ("F#m", Letter::F, 6, Tonality::Minor),
    ("C#m", Letter::C, 1, Tonality::Minor),
    ("G#m", Letter::G, 8, Tonality::Minor),
    ("D#m", Letter::D, 3, Tonality::Minor),
    ("A#m", Letter::A, 10, Tonality::Minor),
    ("Dm", Letter::D, 2, Tonality::Minor),
    ("Gm", Letter::G, 7, Tonality::Minor),
    ("Cm", Letter::C, 0, Tonality::Minor),
    ("Fm", Letter::F, 5, Tonality::Minor),
    ("Bbm", Letter::B, 10, Tonality::Minor),
    ("Ebm", Letter::E, 3, Tonality::Minor),
    ("Abm", Letter::A, 8, Tonality::Minor),
];

static STANDARD_TABLE: Lazy<KeySignatureTable> = Lazy::new(KeySignatureTable::build);

/// All supported keys, in circle-of-fifths order (majors, then minors).
#[derive(Debug, Clone)]
pub struct KeySignatureTable {
    keys: Vec<KeySignature>,
}

impl KeySignatureTable {
    /// The process-wide table, built on first use.
    pub fn standard() -> &'static KeySignatureTable {
        &STANDARD_TABLE
    }

    fn build() -> Self {
        let keys = KEY_DEFINITIONS
            .iter()
            .map(|&(name, root, pc, tonality)| KeySignature::new(name, root, pc, tonality))
            .collect();
        KeySignatureTable { keys }
    }

    /// Look up a key by its exact name ("Eb", "G#m").
    pub fn get(&self, name: &str) -> Result<&KeySignature, ScoreError> {
        self.keys
            .iter()
            .find(|k| k.name == name)
            .ok_or_else(|| ScoreError::UnknownKey(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeySignature> {
        self.keys.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|k| k.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_has_fifteen_majors_and_fifteen_minors() {
        let table = KeySignatureTable::standard();
        assert_eq!(table.len(), 30);
        let majors = table.iter().filter(|k| k.tonality == Tonality::Major).count();
        assert_eq!(majors, 15);
    }

    #[test]
    fn every_scale_covers_each_letter_once() {
        for key in KeySignatureTable::standard().iter() {
            let mut letters: Vec<Letter> = key.scale.iter().map(|n| n.letter).collect();
            letters.sort();
            letters.dedup();
            assert_eq!(letters.len(), 7, "{} repeats a letter: {:?}", key.name, key.scale);
        }
    }

    #[test]
    fn every_scale_follows_its_interval_pattern() {
        for key in KeySignatureTable::standard().iter() {
            let steps = key.tonality.steps();
            for degree in 0..7 {
                let here = key.scale[degree].pitch_class;
                let next = key.scale[(degree + 1) % 7].pitch_class;
                assert_eq!(
                    (12 + next - here) % 12,
                    steps[degree],
                    "{} step from degree {} is wrong",
                    key.name,
                    degree + 1
                );
            }
        }
    }

    #[test]
    fn g_major_draws_f_sharp_as_f() {
        let g = KeySignatureTable::standard().get("G").unwrap();
        assert_eq!(g.degree(7), ScaleNote { letter: Letter::F, pitch_class: 6 });
        assert_eq!(g.accidentals.symbol, Accidental::Sharp);
        assert_eq!(g.accidentals.letters, vec![Letter::F]);
        assert_eq!(g.staff_root, 4);
    }

    #[test]
    fn flat_keys_list_flats_in_signature_order() {
        let eb = KeySignatureTable::standard().get("Eb").unwrap();
        assert_eq!(eb.accidentals.symbol, Accidental::Flat);
        assert_eq!(eb.accidentals.letters, vec![Letter::B, Letter::E, Letter::A]);

        let cb = KeySignatureTable::standard().get("Cb").unwrap();
        assert_eq!(cb.accidentals.count(), 7);
        assert_eq!(cb.default_accidental(Letter::F), Accidental::Flat);
    }

    #[test]
    fn sharp_counts_match_circle_of_fifths() {
        let table = KeySignatureTable::standard();
        for (name, count) in [("C", 0), ("G", 1), ("D", 2), ("B", 5), ("C#", 7), ("F#m", 3)] {
            assert_eq!(table.get(name).unwrap().accidentals.count(), count, "{name}");
        }
    }

    #[test]
    fn e_minor_starts_on_e() {
        let em = KeySignatureTable::standard().get("Em").unwrap();
        assert_eq!(em.degree(1), ScaleNote { letter: Letter::E, pitch_class: 4 });
        assert_eq!(em.accidentals.letters, vec![Letter::F]);
    }

    #[test]
    fn relative_keys_share_a_signature() {
        let table = KeySignatureTable::standard();
        for (major, minor) in [("C", "Am"), ("Eb", "Cm"), ("E", "C#m"), ("Gb", "Ebm")] {
            assert_eq!(
                table.get(major).unwrap().accidentals,
                table.get(minor).unwrap().accidentals,
                "{major} vs {minor}"
            );
        }
    }

    #[test]
    fn names_list_every_key_in_table_order() {
        let names: Vec<&str> = KeySignatureTable::standard().names().collect();
        assert_eq!(names.len(), 30);
        assert_eq!(&names[..3], ["C", "G", "D"]);
        assert_eq!(names.last(), Some(&"Abm"));
        for name in names {
            KeySignatureTable::standard().get(name).unwrap();
        }
    }

    #[test]
    fn unknown_key_is_an_error() {
        let err = KeySignatureTable::standard().get("H").unwrap_err();
        assert!(matches!(err, ScoreError::UnknownKey(ref k) if k == "H"));
    }
}

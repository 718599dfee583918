// Harmonic constraints: which staff indices belong to a roman-numeral
// harmony, and which harmony may follow which.
//
// `harmony_options` turns a harmony into the draw pool for chord building:
// every staff index inside a range whose letter is the root, third or fifth
// of the triad built on that numeral's scale degree. Only the numeral's root
// matters here; quality suffixes ("V7", "vii°", "I6") are accepted and
// ignored.
//
// `ProgressionGrammar` is the transition table that drives the harmony cursor
// in progression.rs. It is plain data (numeral -> allowed successors) and can
// be replaced from the exercise configuration JSON.

use crate::error::ScoreError;
use crate::key::KeySignature;
use serde::{Deserialize, Serialize};
use sightread_prng::ExerciseRng;
use std::collections::BTreeMap;

/// Scale degree (1-7) named by the leading roman numeral of `harmony`.
pub fn harmony_root(harmony: &str) -> Result<u8, ScoreError> {
    let numeral: String = harmony
        .chars()
        .take_while(|c| matches!(c, 'I' | 'i' | 'V' | 'v'))
        .map(|c| c.to_ascii_uppercase())
        .collect();
    match numeral.as_str() {
        "I" => Ok(1),
        "II" => Ok(2),
        "III" => Ok(3),
        "IV" => Ok(4),
        "V" => Ok(5),
        "VI" => Ok(6),
        "VII" => Ok(7),
        _ => Err(ScoreError::UnknownHarmony(harmony.to_string())),
    }
}

/// Root, third and fifth of the triad on `root`, as scale degrees 1-7.
pub fn triad_degrees(root: u8) -> [u8; 3] {
    let wrap = |d: u8| (d - 1) % 7 + 1;
    [wrap(root), wrap(root + 2), wrap(root + 4)]
}

/// Staff indices in `[min, max]` available for a chord, ascending.
///
/// Without a harmony every index in the range is available. With one, only
/// the triad's chord tones are, at every octave that fits.
pub fn harmony_options(
    key: &KeySignature,
    min: i32,
    max: i32,
    harmony: Option<&str>,
) -> Result<Vec<i32>, ScoreError> {
    let Some(harmony) = harmony else {
        return Ok((min..=max).collect());
    };

    let root = harmony_root(harmony)?;
    let mut bases: Vec<i32> = triad_degrees(root)
        .iter()
        .map(|&degree| {
            let position = (degree as i32 - 1 + key.staff_root).rem_euclid(7);
            // Lowest octave transposition at or above `min`.
            min + (position - min).rem_euclid(7)
        })
        .collect();
    bases.sort_unstable();

    let mut options = Vec::new();
    for octave in 0.. {
        let before = options.len();
        for &base in &bases {
            let index = base + 7 * octave;
            if index > max {
                break;
            }
            options.push(index);
        }
        if options.len() - before < bases.len() {
            break;
        }
    }
    Ok(options)
}

/// Which harmonies may follow which.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressionGrammar {
    transitions: BTreeMap<String, Vec<String>>,
}

/// Harmony every progression starts from and resets to.
pub const TONIC: &str = "I";

impl Default for ProgressionGrammar {
    /// Functional diatonic motion: predominants lead to dominants, dominants
    /// resolve to the tonic (or deceptively to vi).
    fn default() -> Self {
        let table: [(&str, &[&str]); 7] = [
            ("I", &["ii", "iii", "IV", "V", "vi", "vii"]),
            ("ii", &["V", "vii"]),
            ("iii", &["IV", "vi"]),
            ("IV", &["I", "ii", "V", "vii"]),
            ("V", &["I", "vi"]),
            ("vi", &["ii", "IV"]),
            ("vii", &["I"]),
        ];
        ProgressionGrammar::new(
            table
                .iter()
                .map(|(from, to)| (from.to_string(), to.iter().map(|s| s.to_string()).collect())),
        )
    }
}

impl ProgressionGrammar {
    pub fn new(transitions: impl IntoIterator<Item = (String, Vec<String>)>) -> Self {
        ProgressionGrammar {
            transitions: transitions.into_iter().collect(),
        }
    }

    pub fn successors(&self, harmony: &str) -> Result<&[String], ScoreError> {
        self.transitions
            .get(harmony)
            .map(Vec::as_slice)
            .ok_or_else(|| ScoreError::UnknownHarmony(harmony.to_string()))
    }

    /// Pick the harmony after `harmony`, uniformly among its successors.
    pub fn next(&self, harmony: &str, rng: &mut ExerciseRng) -> Result<String, ScoreError> {
        let successors = self.successors(harmony)?;
        rng.choose(successors)
            .cloned()
            .ok_or_else(|| ScoreError::InvalidConfig(format!("harmony {harmony:?} has no successors")))
    }

    /// Check the table is closed: it contains the tonic, every entry parses,
    /// has at least one successor, and every successor has an entry.
    pub fn validate(&self) -> Result<(), ScoreError> {
        if !self.transitions.contains_key(TONIC) {
            return Err(ScoreError::InvalidConfig(format!(
                "progression grammar has no {TONIC:?} entry"
            )));
        }
        for (from, to) in &self.transitions {
            harmony_root(from)?;
            if to.is_empty() {
                return Err(ScoreError::InvalidConfig(format!(
                    "harmony {from:?} has no successors"
                )));
            }
            if let Some(missing) = to.iter().find(|h| !self.transitions.contains_key(*h)) {
                return Err(ScoreError::InvalidConfig(format!(
                    "harmony {from:?} leads to {missing:?}, which has no entry"
                )));
            }
        }
        Ok(())
    }
}

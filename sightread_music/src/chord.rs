// Chords, per-staff chord sequences, and random chord construction.
//
// A chord is a set of pitches sounding together for one duration (in base
// time units, see layout.rs). Pitches are kept sorted low to high by staff
// index, so the lowest and highest members are always the ends of the list.
// An empty chord is a rest; the score text writes it as an invisible rest.
//
// `build_chord` draws pitches one at a time from a harmony's option pool
// (harmony.rs). After every draw it trims the pool so that nothing left is
// more than an octave (7 staff steps) away from the chord's current extremes,
// which keeps every generated chord within one hand's reach. If the pool runs
// dry before the requested number of pitches, the chord is returned thinner.

use crate::error::ScoreError;
use crate::harmony::harmony_options;
use crate::key::KeySignature;
use crate::pitch::{Alteration, Pitch, resolve};
use serde::{Deserialize, Serialize};
use sightread_prng::ExerciseRng;
use std::collections::BTreeSet;

/// Widest chord, in staff steps, that one hand is expected to play.
pub const MAX_SPAN: i32 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chord {
    pitches: Vec<Pitch>,
    pub duration: u32,
}

impl Chord {
    /// An empty chord (a rest) lasting `duration` units.
    pub fn rest(duration: u32) -> Self {
        Chord {
            pitches: Vec::new(),
            duration,
        }
    }

    /// Add a pitch, keeping the chord sorted by staff index.
    pub fn insert(&mut self, pitch: Pitch) {
        let at = self
            .pitches
            .partition_point(|p| p.staff_index <= pitch.staff_index);
        self.pitches.insert(at, pitch);
    }

    pub fn pitches(&self) -> &[Pitch] {
        &self.pitches
    }

    pub fn is_rest(&self) -> bool {
        self.pitches.is_empty()
    }

    pub fn lowest_staff_index(&self) -> Option<i32> {
        self.pitches.first().map(|p| p.staff_index)
    }

    pub fn highest_staff_index(&self) -> Option<i32> {
        self.pitches.last().map(|p| p.staff_index)
    }

    /// Distance between the outer pitches in staff steps (0 for rests and
    /// single notes).
    pub fn span(&self) -> i32 {
        match (self.lowest_staff_index(), self.highest_staff_index()) {
            (Some(low), Some(high)) => high - low,
            _ => 0,
        }
    }

    /// Distinct MIDI numbers the player has to hold for this chord.
    pub fn midi_set(&self) -> BTreeSet<u8> {
        self.pitches.iter().map(|p| p.midi).collect()
    }

    /// Score-text token: `x4`, `C4`, or `[CEG]4`.
    pub fn notation(&self) -> String {
        let mut out = String::new();
        match self.pitches.as_slice() {
            [] => out.push('x'),
            [single] => out.push_str(&single.notation_token),
            many => {
                out.push('[');
                for pitch in many {
                    out.push_str(&pitch.notation_token);
                }
                out.push(']');
            }
        }
        out.push_str(&self.duration.to_string());
        out
    }
}

/// The chords of one staff, in time order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    chords: Vec<Chord>,
}

impl Sequence {
    pub fn new() -> Self {
        Sequence::default()
    }

    pub fn push(&mut self, chord: Chord) {
        self.chords.push(chord);
    }

    pub fn chords(&self) -> &[Chord] {
        &self.chords
    }

    pub fn len(&self) -> usize {
        self.chords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }

    pub fn total_duration(&self) -> u32 {
        self.chords.iter().map(|c| c.duration).sum()
    }

    /// Each chord paired with the time unit it starts on.
    pub fn onsets(&self) -> impl Iterator<Item = (u32, &Chord)> {
        self.chords.iter().scan(0, |time, chord| {
            let onset = *time;
            *time += chord.duration;
            Some((onset, chord))
        })
    }
}

impl FromIterator<Chord> for Sequence {
    fn from_iter<I: IntoIterator<Item = Chord>>(iter: I) -> Self {
        Sequence {
            chords: iter.into_iter().collect(),
        }
    }
}

/// Build a chord of up to `num_pitches` pitches from staff indices in
/// `[min, max]`, restricted to `harmony`'s chord tones when given.
pub fn build_chord(
    key: &KeySignature,
    min: i32,
    max: i32,
    num_pitches: usize,
    duration: u32,
    harmony: Option<&str>,
    rng: &mut ExerciseRng,
) -> Result<Chord, ScoreError> {
    let mut pool = harmony_options(key, min, max, harmony)?;
    let mut chord = Chord::rest(duration);

    for drawn in 0..num_pitches {
        if pool.is_empty() {
            log::debug!(
                "option pool for {:?} in [{min}, {max}] ran out after {drawn} of {num_pitches} pitches",
                harmony
            );
            break;
        }
        let staff_index = pool.remove(rng.range_usize(0, pool.len()));
        chord.insert(resolve(key, staff_index, Alteration::None)?);

        if let (Some(low), Some(high)) = (chord.lowest_staff_index(), chord.highest_staff_index()) {
            pool.retain(|&i| i <= low + MAX_SPAN && i >= high - MAX_SPAN);
        }
    }

    Ok(chord)
}

// Two-staff chord progression generation.
//
// The treble and bass staves are generated side by side over the same total
// duration, but each staff has its own chord length (a note value such as
// quarter or half). One shared harmony cursor keeps them in harmonic
// lock-step: time is cut into harmony slots the length of the slower staff's
// chord, and within a slot the faster staff plays as many chords as fit, all
// drawn from the same harmony as the slower staff's single chord. After each
// slot the cursor moves to a successor picked from the `ProgressionGrammar`.
//
// The cursor lives in `ProgressionState`, which is passed in and handed back
// rather than kept anywhere global. Passing the returned state into the next
// call continues the progression across pages; asking for a reset starts
// again from the tonic.
//
// With harmony disabled, every chord draws freely from its staff's range and
// the cursor is left untouched.

use crate::chord::{Sequence, build_chord};
use crate::error::ScoreError;
use crate::harmony::{ProgressionGrammar, TONIC};
use crate::key::KeySignature;
use serde::{Deserialize, Serialize};
use sightread_prng::ExerciseRng;

/// The harmony cursor carried from one generated page to the next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionState {
    pub harmony: String,
}

impl Default for ProgressionState {
    fn default() -> Self {
        ProgressionState {
            harmony: TONIC.to_string(),
        }
    }
}

/// How one staff's chords are drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffSettings {
    /// Lowest staff index a chord may use.
    pub low: i32,
    /// Highest staff index a chord may use.
    pub high: i32,
    /// Pitches per chord (fewer if the harmony cannot supply them).
    pub voicing: usize,
    /// Note value of every chord on this staff: 1 whole, 2 half, 4 quarter...
    pub note_value: u32,
}

impl StaffSettings {
    /// Chord length in base time units. Zero if the note value is zero or
    /// does not divide the base duration; `ExerciseConfig::validate` rejects
    /// both.
    pub fn chord_duration(&self, base_duration: u32) -> u32 {
        match self.note_value {
            0 => 0,
            v if base_duration % v != 0 => 0,
            v => base_duration / v,
        }
    }
}

/// Everything about a progression except the key, grammar and randomness.
#[derive(Debug, Clone, Copy)]
pub struct ProgressionPlan<'a> {
    pub use_harmony: bool,
    /// Length of both staves, in base time units.
    pub total_duration: u32,
    /// Base time units per whole note.
    pub base_duration: u32,
    pub treble: &'a StaffSettings,
    pub bass: &'a StaffSettings,
}

/// A generated pair of staves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progression {
    pub treble: Sequence,
    pub bass: Sequence,
    /// Harmony of each slot, in order. Empty when harmony is disabled.
    pub harmonies: Vec<String>,
    /// Cursor to continue from on the next page.
    pub state: ProgressionState,
}

pub fn generate_progression(
    key: &KeySignature,
    grammar: &ProgressionGrammar,
    plan: &ProgressionPlan,
    state: &ProgressionState,
    reset: bool,
    rng: &mut ExerciseRng,
) -> Result<Progression, ScoreError> {
    let treble_len = plan.treble.chord_duration(plan.base_duration);
    let bass_len = plan.bass.chord_duration(plan.base_duration);
    if treble_len == 0 || bass_len == 0 {
        return Err(ScoreError::InvalidConfig(format!(
            "note values {} and {} must divide the base duration {}",
            plan.treble.note_value, plan.bass.note_value, plan.base_duration
        )));
    }

    // The staff with shorter chords is the fast one and is drawn first.
    let treble_is_fast = treble_len <= bass_len;
    let (fast, slow) = if treble_is_fast {
        (plan.treble, plan.bass)
    } else {
        (plan.bass, plan.treble)
    };
    let fast_len = treble_len.min(bass_len);
    let slot_len = treble_len.max(bass_len);
    if slot_len % fast_len != 0 || plan.total_duration % slot_len != 0 {
        return Err(ScoreError::InvalidConfig(format!(
            "chord lengths {treble_len} and {bass_len} do not tile a duration of {}",
            plan.total_duration
        )));
    }
    let per_slot = slot_len / fast_len;
    let slots = plan.total_duration / slot_len;

    let mut cursor = if reset {
        ProgressionState::default()
    } else {
        state.clone()
    };
    if plan.use_harmony {
        grammar.successors(&cursor.harmony)?;
    }

    let mut fast_seq = Sequence::new();
    let mut slow_seq = Sequence::new();
    let mut harmonies = Vec::new();

    for slot in 0..slots {
        let harmony = plan.use_harmony.then_some(cursor.harmony.as_str());
        for _ in 0..per_slot {
            fast_seq.push(build_chord(key, fast.low, fast.high, fast.voicing, fast_len, harmony, rng)?);
        }
        slow_seq.push(build_chord(key, slow.low, slow.high, slow.voicing, slot_len, harmony, rng)?);

        if plan.use_harmony {
            log::debug!("slot {slot}: {} x{per_slot} over 1", cursor.harmony);
            let next = grammar.next(&cursor.harmony, rng)?;
            harmonies.push(std::mem::replace(&mut cursor.harmony, next));
        }
    }

    let (treble, bass) = if treble_is_fast {
        (fast_seq, slow_seq)
    } else {
        (slow_seq, fast_seq)
    };
    Ok(Progression {
        treble,
        bass,
        harmonies,
        state: cursor,
    })
}

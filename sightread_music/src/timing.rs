// Time-index table: what the player must be holding at each chord onset.
//
// One slot per base time unit across the whole score. A slot is either
// `NoOnset` (nothing starts here) or `Onset` with the set of MIDI numbers
// that start sounding there. An onset with an empty set is a rest: a chord
// starts, but nothing needs to be pressed. Keeping these apart is the whole
// point of the enum; an `Option<Vec<u8>>` would blur them.
//
// The treble staff lays the table out; the bass staff only merges into slots
// that already exist. Both staves must cover the same total duration, which
// is checked up front.

use crate::chord::Sequence;
use crate::error::ScoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeSlot {
    NoOnset,
    Onset(BTreeSet<u8>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeIndexTable {
    slots: Vec<TimeSlot>,
}

/// Fail with `DurationMismatch` unless both staves are equally long.
pub fn check_durations(treble: &Sequence, bass: &Sequence) -> Result<u32, ScoreError> {
    let (t, b) = (treble.total_duration(), bass.total_duration());
    if t != b {
        return Err(ScoreError::DurationMismatch { treble: t, bass: b });
    }
    Ok(t)
}

impl TimeIndexTable {
    pub fn build(treble: &Sequence, bass: &Sequence) -> Result<Self, ScoreError> {
        let total = check_durations(treble, bass)?;
        let mut slots = Vec::with_capacity(total as usize);

        for chord in treble.chords() {
            let start = slots.len();
            slots.extend(std::iter::repeat_n(TimeSlot::NoOnset, chord.duration as usize));
            if let Some(slot) = slots.get_mut(start) {
                *slot = TimeSlot::Onset(chord.midi_set());
            }
        }

        let mut table = TimeIndexTable { slots };
        for (onset, chord) in bass.onsets() {
            if chord.duration > 0 {
                table.merge(onset as usize, chord.midi_set());
            }
        }
        Ok(table)
    }

    fn merge(&mut self, time: usize, pitches: BTreeSet<u8>) {
        match self.slots.get_mut(time) {
            Some(TimeSlot::Onset(existing)) => existing.extend(pitches),
            Some(slot) => *slot = TimeSlot::Onset(pitches),
            None => log::warn!("onset at {time} lies past the end of the time index"),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, time: usize) -> Option<&TimeSlot> {
        self.slots.get(time)
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    /// Onset times with their expected pitch sets, in order.
    pub fn onsets(&self) -> impl Iterator<Item = (usize, &BTreeSet<u8>)> {
        self.slots.iter().enumerate().filter_map(|(time, slot)| match slot {
            TimeSlot::Onset(pitches) => Some((time, pitches)),
            TimeSlot::NoOnset => None,
        })
    }
}

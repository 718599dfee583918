// Attaching renderer handles to generated chords.
//
// The renderer draws the notation text and produces one visual element per
// chord, in score order. To highlight the chord the player is on, the caller
// needs to get from a chord to its element. Rather than writing handles into
// the chords, binding pairs each chord with its handle by position and
// returns a separate structure that borrows the sequence. The sequence
// itself stays immutable.
//
// The handle type is whatever the renderer hands out (an element id, an
// index into a display list...).

use crate::chord::{Chord, Sequence};
use crate::error::ScoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundChord<'a, H> {
    pub chord: &'a Chord,
    /// Time unit the chord starts on, i.e. its slot in the time index.
    pub time_slot: usize,
    pub handle: H,
}

/// One staff's chords with their render handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundSequence<'a, H> {
    chords: Vec<BoundChord<'a, H>>,
}

impl<'a, H> BoundSequence<'a, H> {
    pub fn chords(&self) -> &[BoundChord<'a, H>] {
        &self.chords
    }

    /// The chord starting at `time_slot`, if any.
    pub fn at(&self, time_slot: usize) -> Option<&BoundChord<'a, H>> {
        self.chords
            .binary_search_by_key(&time_slot, |b| b.time_slot)
            .ok()
            .map(|i| &self.chords[i])
    }

    /// The last chord starting at or before `time_slot`: the one sounding then.
    pub fn sounding_at(&self, time_slot: usize) -> Option<&BoundChord<'a, H>> {
        let after = self.chords.partition_point(|b| b.time_slot <= time_slot);
        after.checked_sub(1).map(|i| &self.chords[i])
    }
}

/// Pair every chord of `sequence` with the handle at the same position.
///
/// The renderer must return exactly one handle per chord, rests included.
pub fn bind_render_handles<H>(
    sequence: &Sequence,
    handles: impl IntoIterator<Item = H>,
) -> Result<BoundSequence<'_, H>, ScoreError> {
    let handles: Vec<H> = handles.into_iter().collect();
    if handles.len() != sequence.len() {
        return Err(ScoreError::HandleCountMismatch {
            expected: sequence.len(),
            actual: handles.len(),
        });
    }
    let chords = sequence
        .onsets()
        .zip(handles)
        .map(|((onset, chord), handle)| BoundChord {
            chord,
            time_slot: onset as usize,
            handle,
        })
        .collect();
    Ok(BoundSequence { chords })
}

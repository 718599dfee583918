// Practice cursor: matching live keyboard input against the time index.
//
// The cursor sits on one onset of the time index at a time. The session
// tracks which keys are currently held; every note-on is compared against
// the expected set for the current onset, and once the held set matches it
// exactly the cursor moves on and the held set is cleared, so the next onset
// has to be played afresh. Extra keys simply prevent a match until they are
// released.
//
// Rest onsets (nothing to press) are skipped. Reaching past the final onset
// reports `Finished`, the caller's cue to generate the next page.

use crate::timing::TimeIndexTable;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Held keys do not (yet) match the current onset.
    Pending,
    /// The onset was played; the cursor moved to the next one.
    Matched { time: usize },
    /// The last onset was played.
    Finished,
}

#[derive(Debug, Clone)]
pub struct PracticeSession<'a> {
    onsets: Vec<(usize, &'a BTreeSet<u8>)>,
    position: usize,
    held: BTreeSet<u8>,
}

impl<'a> PracticeSession<'a> {
    pub fn new(table: &'a TimeIndexTable) -> Self {
        let onsets: Vec<_> = table.onsets().filter(|(_, pitches)| !pitches.is_empty()).collect();
        log::debug!("practice session over {} playable onsets", onsets.len());
        PracticeSession {
            onsets,
            position: 0,
            held: BTreeSet::new(),
        }
    }

    /// Time unit of the current onset, or `None` once finished.
    pub fn current_time(&self) -> Option<usize> {
        self.onsets.get(self.position).map(|&(time, _)| time)
    }

    /// What has to be held to clear the current onset.
    pub fn expected(&self) -> Option<&'a BTreeSet<u8>> {
        self.onsets.get(self.position).map(|&(_, pitches)| pitches)
    }

    pub fn held(&self) -> &BTreeSet<u8> {
        &self.held
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.onsets.len()
    }

    pub fn note_on(&mut self, midi: u8) -> MatchOutcome {
        if self.is_finished() {
            return MatchOutcome::Finished;
        }
        self.held.insert(midi);
        match self.expected() {
            Some(expected) if *expected == self.held => {
                let time = self.onsets[self.position].0;
                self.held.clear();
                if self.advance() {
                    MatchOutcome::Matched { time }
                } else {
                    MatchOutcome::Finished
                }
            }
            _ => MatchOutcome::Pending,
        }
    }

    pub fn note_off(&mut self, midi: u8) {
        self.held.remove(&midi);
    }

    /// Move to the next onset. Returns false if there is none.
    pub fn advance(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.position += 1;
        !self.is_finished()
    }

    /// Move back one onset, e.g. to replay a passage. Returns false at the start.
    pub fn retreat(&mut self) -> bool {
        if self.position == 0 {
            return false;
        }
        self.position = self.position.min(self.onsets.len()) - 1;
        self.held.clear();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::{Chord, Sequence};
    use crate::key::KeySignatureTable;
    use crate::pitch::{Alteration, resolve};

    fn chord(indices: &[i32], duration: u32) -> Chord {
        let key = KeySignatureTable::standard().get("C").unwrap();
        let mut chord = Chord::rest(duration);
        for &i in indices {
            chord.insert(resolve(key, i, Alteration::None).unwrap());
        }
        chord
    }

    fn table() -> TimeIndexTable {
        // Onsets: 0 -> {48, 60, 64}, 4 -> rest, 8 -> {67}, 12 -> {55}.
        let treble: Sequence = [chord(&[0, 2], 4), Chord::rest(4), chord(&[4], 8)].into_iter().collect();
        let bass: Sequence = [chord(&[-7], 12), chord(&[-3], 4)].into_iter().collect();
        TimeIndexTable::build(&treble, &bass).unwrap()
    }

    #[test]
    fn chord_matches_once_every_key_is_held() {
        let table = table();
        let mut session = PracticeSession::new(&table);
        assert_eq!(session.current_time(), Some(0));
        assert_eq!(session.note_on(60), MatchOutcome::Pending);
        assert_eq!(session.note_on(48), MatchOutcome::Pending);
        assert_eq!(session.note_on(64), MatchOutcome::Matched { time: 0 });
        assert!(session.held().is_empty());
        // The rest at 4 is skipped.
        assert_eq!(session.current_time(), Some(8));
    }

    #[test]
    fn wrong_key_blocks_until_released() {
        let table = table();
        let mut session = PracticeSession::new(&table);
        session.note_on(48);
        session.note_on(60);
        session.note_on(62);
        assert_eq!(session.note_on(64), MatchOutcome::Pending);
        session.note_off(62);
        session.note_off(64);
        assert_eq!(session.note_on(64), MatchOutcome::Matched { time: 0 });
    }

    #[test]
    fn playing_through_finishes() {
        let table = table();
        let mut session = PracticeSession::new(&table);
        for midi in [48, 60, 64] {
            session.note_on(midi);
        }
        assert_eq!(session.note_on(67), MatchOutcome::Matched { time: 8 });
        assert_eq!(session.note_on(55), MatchOutcome::Finished);
        assert!(session.is_finished());
        assert_eq!(session.expected(), None);
        assert_eq!(session.note_on(60), MatchOutcome::Finished);
    }

    #[test]
    fn manual_cursor_movement() {
        let table = table();
        let mut session = PracticeSession::new(&table);
        assert!(!session.retreat());
        assert!(session.advance());
        assert_eq!(session.expected(), Some(&BTreeSet::from([67])));
        assert!(session.advance());
        assert!(!session.advance());
        assert!(session.is_finished());
        assert!(session.retreat());
        assert_eq!(session.current_time(), Some(12));
    }
}

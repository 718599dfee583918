// Error type shared by every stage of exercise generation.
//
// All fatal conditions surface as `ScoreError` before any notation text is
// produced, so a failed regeneration leaves the caller's previous score
// untouched. Running out of chord options is not an error: the chord builder
// stops early and returns a thinner chord (see chord.rs).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("unknown key signature: {0:?}")]
    UnknownKey(String),

    #[error("malformed notation token: {0:?}")]
    MalformedToken(String),

    #[error("unknown harmony: {0:?}")]
    UnknownHarmony(String),

    #[error("staff index {staff_index} resolves to MIDI {midi}, outside 0..=127")]
    PitchOutOfRange { staff_index: i32, midi: i32 },

    #[error("staves cover different durations: treble {treble}, bass {bass}")]
    DurationMismatch { treble: u32, bass: u32 },

    #[error("expected {expected} render handles, got {actual}")]
    HandleCountMismatch { expected: usize, actual: usize },

    #[error("invalid exercise configuration: {0}")]
    InvalidConfig(String),

    #[error("configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

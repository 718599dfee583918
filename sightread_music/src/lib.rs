// Sight-reading exercise generator
//
// Produces random two-staff (treble + bass) piano exercises in any of the
// standard major and minor keys, optionally following a roman-numeral chord
// progression, and lays them out as notation text for a renderer. Alongside
// the text it builds a time index of the pitches expected at every chord
// onset, which a practice session matches live keyboard input against.
//
// Architecture:
// - key.rs: The 30 standard key signatures, their scales and accidentals
// - pitch.rs: Staff index <-> pitch resolution, notation tokens, MIDI spelling
// - harmony.rs: Chord-tone option pools per harmony + the progression grammar
// - chord.rs: Chords, per-staff sequences, span-limited random chord building
// - progression.rs: Two-staff generation under one shared harmony cursor
// - layout.rs: Measures, lines and the two-staff notation text
// - timing.rs: Time-index table of expected pitches per onset
// - binding.rs: Pairing generated chords with renderer handles
// - practice.rs: Matching cursor over the time index
// - config.rs: JSON exercise configuration and its validation
// - score.rs: One call from configuration to a finished page
// - midi.rs: SMF rendering for audition
// - error.rs: `ScoreError`
//
// All randomness comes from `sightread_prng::ExerciseRng`, so a page is
// fully determined by its configuration, seed and starting progression state.

pub mod binding;
pub mod chord;
pub mod config;
pub mod error;
pub mod harmony;
pub mod key;
pub mod layout;
pub mod midi;
pub mod pitch;
pub mod practice;
pub mod progression;
pub mod score;
pub mod timing;

pub use config::ExerciseConfig;
pub use error::ScoreError;
pub use key::{KeySignature, KeySignatureTable};
pub use progression::ProgressionState;
pub use score::{Score, generate_score};

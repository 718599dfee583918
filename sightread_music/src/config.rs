// Data-driven exercise configuration.
//
// Everything that shapes a generated exercise lives in `ExerciseConfig`,
// loaded from JSON (or defaulted): the key, the meter and time base, how many
// measures make a line and a page, each staff's range and chord density, and
// the harmony grammar. Generation reads nothing else, so a config plus a seed
// fully determines a page.
//
// Durations are expressed two ways. `base_duration` is the time base, the N
// in `L:1/N`: one time unit is a 1/N note. Each staff's `note_value` is the
// note value of its chords (4 = quarter), so a chord lasts
// `base_duration / note_value` units.
//
// Missing fields fall back to their defaults, so a config file only needs to
// name what it changes.
//
// `validate` rejects every combination the generator cannot tile or resolve.
// `score::generate_score` calls it before doing anything else.

use crate::error::ScoreError;
use crate::harmony::ProgressionGrammar;
use crate::key::KeySignatureTable;
use crate::layout::Meter;
use crate::pitch::{Alteration, resolve};
use crate::progression::StaffSettings;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExerciseConfig {
    /// Key signature name, e.g. "Eb" or "F#m".
    pub key: String,
    pub title: String,
    pub meter: Meter,
    /// Time units per whole note.
    pub base_duration: u32,
    pub measures_per_line: usize,
    /// Lines per page.
    pub lines: usize,
    /// Draw chords from a roman-numeral progression instead of freely.
    pub use_harmony: bool,
    /// Break beams at every quarter of a measure.
    pub beam_breaks: bool,
    /// Playback tempo in quarter notes per minute (MIDI export only).
    pub tempo_bpm: u32,
    pub treble: StaffSettings,
    pub bass: StaffSettings,
    pub grammar: ProgressionGrammar,
}

impl Default for ExerciseConfig {
    fn default() -> Self {
        ExerciseConfig {
            key: "C".to_string(),
            title: "Sight Reading".to_string(),
            meter: Meter::default(),
            base_duration: 16,
            measures_per_line: 4,
            lines: 4,
            use_harmony: true,
            beam_breaks: false,
            tempo_bpm: 60,
            treble: StaffSettings {
                low: 0,
                high: 11,
                voicing: 2,
                note_value: 4,
            },
            bass: StaffSettings {
                low: -12,
                high: -1,
                voicing: 1,
                note_value: 2,
            },
            grammar: ProgressionGrammar::default(),
        }
    }
}

impl ExerciseConfig {
    pub fn from_json(json: &str) -> Result<Self, ScoreError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Time units in one measure. Errors if the meter does not fit the
    /// time base.
    pub fn measure_duration(&self) -> Result<u32, ScoreError> {
        self.meter.measure_duration(self.base_duration).ok_or_else(|| {
            ScoreError::InvalidConfig(format!(
                "meter {} is not a whole number of 1/{} notes",
                self.meter, self.base_duration
            ))
        })
    }

    /// Length of a full page in time units.
    pub fn total_duration(&self) -> Result<u32, ScoreError> {
        let measures = self
            .lines
            .checked_mul(self.measures_per_line)
            .and_then(|m| u32::try_from(m).ok())
            .ok_or_else(|| ScoreError::InvalidConfig("too many measures per page".into()))?;
        self.measure_duration()?
            .checked_mul(measures)
            .ok_or_else(|| ScoreError::InvalidConfig("page duration overflows".into()))
    }

    pub fn validate(&self, table: &KeySignatureTable) -> Result<(), ScoreError> {
        let key = table.get(&self.key)?;
        for (name, value) in [
            ("base_duration", self.base_duration as usize),
            ("measures_per_line", self.measures_per_line),
            ("lines", self.lines),
            ("tempo_bpm", self.tempo_bpm as usize),
        ] {
            if value == 0 {
                return Err(ScoreError::InvalidConfig(format!("{name} must be positive")));
            }
        }
        let measure = self.measure_duration()?;
        self.total_duration()?;

        let mut lengths = Vec::with_capacity(2);
        for (name, staff) in [("treble", &self.treble), ("bass", &self.bass)] {
            let length = staff.chord_duration(self.base_duration);
            if length == 0 {
                return Err(ScoreError::InvalidConfig(format!(
                    "{name} note value {} does not divide base duration {}",
                    staff.note_value, self.base_duration
                )));
            }
            if measure % length != 0 {
                return Err(ScoreError::InvalidConfig(format!(
                    "{name} chords of {length} units do not fill a {measure}-unit measure"
                )));
            }
            if staff.low > staff.high {
                return Err(ScoreError::InvalidConfig(format!(
                    "{name} range {}..={} is empty",
                    staff.low, staff.high
                )));
            }
            if staff.voicing == 0 {
                return Err(ScoreError::InvalidConfig(format!("{name} voicing must be at least 1")));
            }
            // MIDI numbers rise with staff index, so the ends bound the range.
            resolve(key, staff.low, Alteration::None)?;
            resolve(key, staff.high, Alteration::None)?;
            lengths.push(length);
        }
        let (short, long) = (lengths[0].min(lengths[1]), lengths[0].max(lengths[1]));
        if long % short != 0 {
            return Err(ScoreError::InvalidConfig(format!(
                "chord lengths {short} and {long} are not multiples of each other"
            )));
        }

        self.grammar.validate()
    }
}

// One-call page generation.
//
// `generate_score` runs the whole pipeline for one page: validate the
// configuration, generate both staves, check they line up, lay out the
// notation text and build the time index. Every check that can fail runs
// before any text is produced, so an error leaves nothing half-built for
// the caller to clean up.
//
// The returned `Score` carries the progression cursor for the next page.
// Feeding it back (with `reset` false) makes consecutive pages read as one
// continuous progression.

use crate::chord::Sequence;
use crate::config::ExerciseConfig;
use crate::error::ScoreError;
use crate::key::KeySignatureTable;
use crate::layout::{LayoutOptions, layout};
use crate::progression::{ProgressionPlan, ProgressionState, generate_progression};
use crate::timing::{TimeIndexTable, check_durations};
use sightread_prng::ExerciseRng;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Score {
    /// Two-staff notation text, ready for a renderer.
    pub notation: String,
    pub treble: Sequence,
    pub bass: Sequence,
    /// Harmony of each progression slot; empty without harmony.
    pub harmonies: Vec<String>,
    pub time_index: TimeIndexTable,
    /// Where the next page's progression starts.
    pub state: ProgressionState,
}

pub fn generate_score(
    config: &ExerciseConfig,
    table: &KeySignatureTable,
    state: &ProgressionState,
    reset: bool,
    rng: &mut ExerciseRng,
) -> Result<Score, ScoreError> {
    config.validate(table)?;
    let key = table.get(&config.key)?;

    let plan = ProgressionPlan {
        use_harmony: config.use_harmony,
        total_duration: config.total_duration()?,
        base_duration: config.base_duration,
        treble: &config.treble,
        bass: &config.bass,
    };
    let progression = generate_progression(key, &config.grammar, &plan, state, reset, rng)?;
    check_durations(&progression.treble, &progression.bass)?;

    let notation = layout(
        &progression.treble,
        &progression.bass,
        key,
        &LayoutOptions {
            title: &config.title,
            meter: config.meter,
            base_duration: config.base_duration,
            measures_per_line: config.measures_per_line,
            beam_breaks: config.beam_breaks,
        },
    )?;
    let time_index = TimeIndexTable::build(&progression.treble, &progression.bass)?;

    log::info!(
        "generated {} in {}: {} treble / {} bass chords, {} onsets, next harmony {}",
        config.title,
        key.name,
        progression.treble.len(),
        progression.bass.len(),
        time_index.onsets().count(),
        progression.state.harmony
    );

    Ok(Score {
        notation,
        treble: progression.treble,
        bass: progression.bass,
        harmonies: progression.harmonies,
        time_index,
        state: progression.state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_produces_a_full_page() {
        let config = ExerciseConfig::default();
        let score = generate_score(
            &config,
            KeySignatureTable::standard(),
            &ProgressionState::default(),
            true,
            &mut ExerciseRng::new(42),
        )
        .unwrap();
        assert_eq!(score.time_index.len(), 256);
        assert_eq!(score.treble.len(), 64);
        assert_eq!(score.bass.len(), 32);
        assert_eq!(score.harmonies.len(), 32);
        assert!(score.notation.starts_with("T:Sight Reading\nM:4/4\nL:1/16\nK:C\n"));
        assert_eq!(score.notation.matches("clef=treble").count(), 4);
    }

    #[test]
    fn invalid_config_fails_before_layout() {
        let config = ExerciseConfig {
            key: "Q".into(),
            ..ExerciseConfig::default()
        };
        let result = generate_score(
            &config,
            KeySignatureTable::standard(),
            &ProgressionState::default(),
            true,
            &mut ExerciseRng::new(1),
        );
        assert!(matches!(result, Err(ScoreError::UnknownKey(_))));
    }
}

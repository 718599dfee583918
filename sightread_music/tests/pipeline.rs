// End-to-end checks of page generation: configuration in, notation text and
// time index out.

use sightread_music::binding::bind_render_handles;
use sightread_music::harmony::{harmony_root, triad_degrees};
use sightread_music::layout::split_measures;
use sightread_music::practice::{MatchOutcome, PracticeSession};
use sightread_music::progression::StaffSettings;
use sightread_music::timing::TimeSlot;
use sightread_music::{ExerciseConfig, KeySignatureTable, ProgressionState, Score, generate_score};
use sightread_prng::ExerciseRng;
use std::collections::BTreeSet;

fn quarter_over_half(use_harmony: bool) -> ExerciseConfig {
    ExerciseConfig {
        key: "C".into(),
        use_harmony,
        measures_per_line: 4,
        lines: 2,
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
        ..ExerciseConfig::default()
    }
}

fn page(config: &ExerciseConfig, state: &ProgressionState, reset: bool, rng: &mut ExerciseRng) -> Score {
    generate_score(config, KeySignatureTable::standard(), state, reset, rng).unwrap()
}

#[test]
fn same_seed_gives_identical_text() {
    let config = quarter_over_half(false);
    let a = page(&config, &ProgressionState::default(), true, &mut ExerciseRng::new(2024));
    let b = page(&config, &ProgressionState::default(), true, &mut ExerciseRng::new(2024));
    assert_eq!(a.notation, b.notation);
    assert_eq!(a.time_index, b.time_index);

    let c = page(&config, &ProgressionState::default(), true, &mut ExerciseRng::new(2025));
    assert_ne!(a.notation, c.notation);
}

#[test]
fn pages_continue_the_progression() {
    let config = quarter_over_half(true);
    let mut rng = ExerciseRng::new(7);
    let first = page(&config, &ProgressionState::default(), true, &mut rng);
    assert_eq!(first.harmonies[0], "I");

    let second = page(&config, &first.state, false, &mut rng);
    assert_eq!(second.harmonies[0], first.state.harmony);
    let successors = config.grammar.successors(first.harmonies.last().unwrap()).unwrap();
    assert!(successors.contains(&second.harmonies[0]));

    let restarted = page(&config, &second.state, true, &mut rng);
    assert_eq!(restarted.harmonies[0], "I");
}

#[test]
fn every_measure_is_full_and_every_line_has_four() {
    let config = quarter_over_half(true);
    let score = page(&config, &ProgressionState::default(), true, &mut ExerciseRng::new(3));
    for sequence in [&score.treble, &score.bass] {
        let measures = split_measures(sequence.chords(), 16);
        assert_eq!(measures.len(), 8);
        assert!(measures.iter().all(|m| m.duration == 16));
    }

    let treble_lines: Vec<&str> = score
        .notation
        .lines()
        .skip_while(|l| !l.starts_with("V:1"))
        .collect::<Vec<_>>()
        .chunks(6)
        .map(|block| block[2])
        .collect();
    assert_eq!(treble_lines.len(), 2);
    assert_eq!(treble_lines[0].matches('|').count(), 4);
    assert!(!treble_lines[0].ends_with("|]"));
    assert!(treble_lines[1].ends_with("|]"));
}

#[test]
fn time_index_covers_the_page() {
    let config = quarter_over_half(false);
    let score = page(&config, &ProgressionState::default(), true, &mut ExerciseRng::new(11));
    assert_eq!(score.time_index.len(), 128);
    assert_eq!(score.time_index.onsets().count(), 32);

    for (time, slot) in score.time_index.slots().iter().enumerate() {
        match slot {
            TimeSlot::Onset(_) => assert_eq!(time % 4, 0, "onset off the quarter grid at {time}"),
            TimeSlot::NoOnset => assert_ne!(time % 4, 0, "missing onset at {time}"),
        }
    }

    // At half-note boundaries both staves contribute.
    let (_, first) = score.time_index.onsets().next().unwrap();
    let expected: BTreeSet<u8> = score.treble.chords()[0]
        .midi_set()
        .union(&score.bass.chords()[0].midi_set())
        .copied()
        .collect();
    assert_eq!(first, &expected);
}

#[test]
fn two_treble_chords_share_each_bass_chords_harmony() {
    let config = quarter_over_half(true);
    let score = page(&config, &ProgressionState::default(), true, &mut ExerciseRng::new(5));
    assert_eq!(score.treble.len(), 2 * score.bass.len());
    assert_eq!(score.harmonies.len(), score.bass.len());

    for (slot, harmony) in score.harmonies.iter().enumerate() {
        let tones = triad_degrees(harmony_root(harmony).unwrap());
        let chords = [
            &score.treble.chords()[2 * slot],
            &score.treble.chords()[2 * slot + 1],
            &score.bass.chords()[slot],
        ];
        for chord in chords {
            assert!(chord.pitches().iter().all(|p| tones.contains(&p.scale_degree)));
        }
    }
}

#[test]
fn a_page_can_be_played_through() {
    let config = quarter_over_half(true);
    let score = page(&config, &ProgressionState::default(), true, &mut ExerciseRng::new(8));
    let mut session = PracticeSession::new(&score.time_index);
    let mut last = MatchOutcome::Pending;
    while let Some(expected) = session.expected() {
        for &midi in expected {
            last = session.note_on(midi);
        }
        for &midi in expected {
            session.note_off(midi);
        }
    }
    assert_eq!(last, MatchOutcome::Finished);
}

#[test]
fn render_handles_bind_to_generated_chords() {
    let config = quarter_over_half(false);
    let score = page(&config, &ProgressionState::default(), true, &mut ExerciseRng::new(1));
    let bound = bind_render_handles(&score.bass, 0..score.bass.len()).unwrap();
    assert_eq!(bound.chords().len(), 16);
    assert_eq!(bound.sounding_at(13).map(|b| b.handle), Some(1));
    assert!(bind_render_handles(&score.bass, 0..3).is_err());
}

// Score text layout: two chord sequences in, two-staff notation text out.
//
// The output is a small ABC-style document: a header (title, meter, base
// note length, key, a two-staff grouping directive) followed by one block per
// printed line. Each block restates both voices with their key and clef,
// because the renderer forgets staff context at every line break.
//
// Time is counted in base units: `L:1/N` makes one unit a 1/N note, so a
// chord of duration 4 with N = 16 is a quarter note and is written `C4`.
// Each staff is cut into measures by accumulating chord durations until a
// measure's worth (from the meter) is reached, then measures are grouped
// `measures_per_line` to a line. Both staves are cut independently, so they
// must cover the same total duration and fill the same number of lines;
// layout fails otherwise. The last measure of each staff closes with `|]`.
//
// Optionally a space is written at every quarter of a measure so that the
// renderer breaks beams there.

use crate::chord::{Chord, Sequence};
use crate::error::ScoreError;
use crate::key::KeySignature;
use crate::timing::check_durations;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};
use std::ops::Range;

/// Time signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meter {
    pub beats: u32,
    pub beat_type: u32,
}

impl Default for Meter {
    fn default() -> Self {
        Meter {
            beats: 4,
            beat_type: 4,
        }
    }
}

impl Meter {
    /// Base units per measure, if the meter fits a whole number of them.
    pub fn measure_duration(&self, base_duration: u32) -> Option<u32> {
        let scaled = self.beats.checked_mul(base_duration)?;
        if self.beat_type == 0 || scaled % self.beat_type != 0 || scaled == 0 {
            return None;
        }
        Some(scaled / self.beat_type)
    }
}

impl fmt::Display for Meter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.beats, self.beat_type)
    }
}

#[derive(Debug, Clone)]
pub struct LayoutOptions<'a> {
    pub title: &'a str,
    pub meter: Meter,
    /// Base units per whole note (the N in `L:1/N`).
    pub base_duration: u32,
    pub measures_per_line: usize,
    pub beam_breaks: bool,
}

/// One measure: which chords it holds and how long they last together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasureSpan {
    pub chords: Range<usize>,
    pub duration: u32,
}

/// Cut `chords` into measures of `measure_duration` units. The last measure
/// may be short.
pub fn split_measures(chords: &[Chord], measure_duration: u32) -> Vec<MeasureSpan> {
    let mut measures = Vec::new();
    let mut start = 0;
    while start < chords.len() {
        let mut end = start;
        let mut duration = 0;
        while duration < measure_duration && end < chords.len() {
            duration += chords[end].duration;
            end += 1;
        }
        measures.push(MeasureSpan {
            chords: start..end,
            duration,
        });
        start = end;
    }
    measures
}

/// Lay out both staves as notation text.
pub fn layout(
    treble: &Sequence,
    bass: &Sequence,
    key: &KeySignature,
    options: &LayoutOptions,
) -> Result<String, ScoreError> {
    check_durations(treble, bass)?;
    let measure_duration = options
        .meter
        .measure_duration(options.base_duration)
        .ok_or_else(|| {
            ScoreError::InvalidConfig(format!(
                "meter {} does not fit base duration {}",
                options.meter, options.base_duration
            ))
        })?;
    if options.measures_per_line == 0 {
        return Err(ScoreError::InvalidConfig("measures_per_line must be positive".into()));
    }

    let treble_measures = split_measures(treble.chords(), measure_duration);
    let bass_measures = split_measures(bass.chords(), measure_duration);
    let treble_lines: Vec<&[MeasureSpan]> = treble_measures.chunks(options.measures_per_line).collect();
    let bass_lines: Vec<&[MeasureSpan]> = bass_measures.chunks(options.measures_per_line).collect();
    if treble_lines.len() != bass_lines.len() {
        return Err(ScoreError::InvalidConfig(format!(
            "treble fills {} lines but bass fills {}; chords must not cross bar lines",
            treble_lines.len(),
            bass_lines.len()
        )));
    }

    let beam_unit = (options.beam_breaks && measure_duration % 4 == 0).then_some(measure_duration / 4);
    let mut out = String::new();
    let _ = writeln!(out, "T:{}", options.title);
    let _ = writeln!(out, "M:{}", options.meter);
    let _ = writeln!(out, "L:1/{}", options.base_duration);
    let _ = writeln!(out, "K:{}", key.name);
    out.push_str("%%staves {1 2}\n");

    for line in 0..treble_lines.len() {
        for (voice, clef, sequence, lines, total) in [
            (1, "treble", treble, &treble_lines, treble_measures.len()),
            (2, "bass", bass, &bass_lines, bass_measures.len()),
        ] {
            let _ = writeln!(out, "V:{voice}");
            let _ = writeln!(out, "[K:{} clef={clef}]", key.name);
            if let Some(measures) = lines.get(line) {
                let first = line * options.measures_per_line;
                for (offset, measure) in measures.iter().enumerate() {
                    write_measure(&mut out, &sequence.chords()[measure.chords.clone()], beam_unit);
                    out.push_str(if first + offset + 1 == total { "|]" } else { "|" });
                }
            }
            out.push('\n');
        }
    }

    Ok(out)
}

fn write_measure(out: &mut String, chords: &[Chord], beam_unit: Option<u32>) {
    let mut elapsed = 0;
    for chord in chords {
        if beam_unit.is_some_and(|unit| elapsed > 0 && elapsed % unit == 0) {
            out.push(' ');
        }
        out.push_str(&chord.notation());
        elapsed += chord.duration;
    }
}

// MIDI rendering of a generated exercise.
//
// Turns the treble and bass sequences into a Standard MIDI File so a page can
// be auditioned. Output is SMF format 1: a tempo track, then one track per
// staff on its own channel. Chord durations are in time units (1/N notes for
// a time base of N) and are converted to ticks from absolute unit positions,
// so rounding never accumulates when N does not divide a whole note's ticks.
//
// Rests produce no events; the gap is carried into the next event's delta.
//
// Uses the `midly` crate. The file is built in memory; writing it anywhere is
// left to the caller.

use crate::chord::Sequence;
use crate::error::ScoreError;
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};

/// Ticks per quarter note in MIDI output.
const TICKS_PER_QUARTER: u16 = 480;

const TICKS_PER_WHOLE: u64 = TICKS_PER_QUARTER as u64 * 4;

/// Acoustic grand piano.
const PIANO: u8 = 0;

const VELOCITY: u8 = 80;

/// Render both staves as an in-memory SMF.
pub fn sequences_to_smf(
    treble: &Sequence,
    bass: &Sequence,
    tempo_bpm: u32,
    base_duration: u32,
) -> Result<Smf<'static>, ScoreError> {
    if tempo_bpm == 0 || base_duration == 0 {
        return Err(ScoreError::InvalidConfig(
            "tempo and base duration must be positive for MIDI output".into(),
        ));
    }
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    let tempo_microseconds = (60_000_000 / tempo_bpm).min(0xFF_FFFF);
    smf.tracks.push(vec![
        meta(0, MetaMessage::Tempo(u24::new(tempo_microseconds))),
        meta(0, MetaMessage::EndOfTrack),
    ]);
    smf.tracks.push(staff_track(b"Treble", u4::new(0), treble, base_duration));
    smf.tracks.push(staff_track(b"Bass", u4::new(1), bass, base_duration));
    Ok(smf)
}

/// Render both staves as SMF bytes.
pub fn to_midi_bytes(
    treble: &Sequence,
    bass: &Sequence,
    tempo_bpm: u32,
    base_duration: u32,
) -> Result<Vec<u8>, ScoreError> {
    let smf = sequences_to_smf(treble, bass, tempo_bpm, base_duration)?;
    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    Ok(buf)
}

fn meta(delta: u32, message: MetaMessage<'static>) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Meta(message),
    }
}

fn note(delta: u32, channel: u4, message: MidiMessage) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Midi { channel, message },
    }
}

fn staff_track(
    name: &'static [u8],
    channel: u4,
    sequence: &Sequence,
    base_duration: u32,
) -> Track<'static> {
    let ticks_at = |units: u32| (units as u64 * TICKS_PER_WHOLE / base_duration as u64) as u32;

    let mut track: Track<'static> = vec![
        meta(0, MetaMessage::TrackName(name)),
        note(
            0,
            channel,
            MidiMessage::ProgramChange {
                program: u7::new(PIANO),
            },
        ),
    ];
    let mut last_tick = 0;

    for (onset, chord) in sequence.onsets() {
        if chord.is_rest() {
            continue;
        }
        let start = ticks_at(onset);
        let end = ticks_at(onset + chord.duration);
        let keys = chord.midi_set();

        for (i, &key) in keys.iter().enumerate() {
            let delta = if i == 0 { start - last_tick } else { 0 };
            track.push(note(
                delta,
                channel,
                MidiMessage::NoteOn {
                    key: u7::new(key),
                    vel: u7::new(VELOCITY),
                },
            ));
        }
        for (i, &key) in keys.iter().enumerate() {
            let delta = if i == 0 { end - start } else { 0 };
            track.push(note(
                delta,
                channel,
                MidiMessage::NoteOff {
                    key: u7::new(key),
                    vel: u7::new(0),
                },
            ));
        }
        last_tick = end;
    }

    let total = ticks_at(sequence.total_duration());
    track.push(meta(total - last_tick, MetaMessage::EndOfTrack));
    track
}

// Sight-reading exercise generator: CLI entry point.
//
// Generates one or more pages of two-staff exercises and writes their
// notation text to stdout or a file. Consecutive pages continue one chord
// progression. Optionally renders all pages to a MIDI file for audition.
//
// Usage:
//   sightread [--config exercise.json] [--key Eb] [--seed N] [--pages N]
//     [--no-harmony] [--output out.abc] [--midi out.mid] [--print-config]

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use sightread_music::chord::Sequence;
use sightread_music::midi::to_midi_bytes;
use sightread_music::{ExerciseConfig, KeySignatureTable, ProgressionState, Score, generate_score};
use sightread_prng::ExerciseRng;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use std::{env, fs, process};

/// Logging is controlled with RUST_LOG; see docs for the env_logger crate.
/// If RUST_LOG is not set, the log level defaults to Info.
#[derive(Parser)]
#[command(version, about, long_about = None, verbatim_doc_comment)]
struct Cli {
    /// Exercise configuration (JSON); fields left out keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,
    /// Key signature, overriding the configuration (e.g. "Eb", "F#m")
    #[arg(long)]
    key: Option<String>,
    /// Random seed; defaults to the current time
    #[arg(long)]
    seed: Option<u64>,
    /// Number of pages to generate
    #[arg(long, default_value_t = 1)]
    pages: usize,
    /// Draw chords freely instead of following a progression
    #[arg(long)]
    no_harmony: bool,
    /// Write notation text here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
    /// Also write the exercise as a MIDI file
    #[arg(long)]
    midi: Option<PathBuf>,
    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

fn load_config(cli: &Cli) -> anyhow::Result<ExerciseConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            ExerciseConfig::from_json(&json).with_context(|| format!("parsing {}", path.display()))?
        }
        None => ExerciseConfig::default(),
    };
    if let Some(key) = &cli.key {
        config.key = key.clone();
    }
    if cli.no_harmony {
        config.use_harmony = false;
    }
    Ok(config)
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut log_builder = env_logger::builder();
    if env::var("RUST_LOG").is_err() {
        log_builder.filter_level(LevelFilter::Info);
    }
    log_builder.init();

    let config = load_config(&cli)?;
    let table = KeySignatureTable::standard();
    if table.get(&config.key).is_err() {
        let valid: Vec<&str> = table.names().collect();
        anyhow::bail!("unknown key {:?}; valid keys are {}", config.key, valid.join(", "));
    }
    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let seed = cli.seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default()
    });
    log::info!("seed {seed}");
    let mut rng = ExerciseRng::new(seed);

    let mut state = ProgressionState::default();
    let mut pages: Vec<Score> = Vec::with_capacity(cli.pages);
    for page in 0..cli.pages {
        let score = generate_score(&config, table, &state, page == 0, &mut rng)
            .with_context(|| format!("generating page {}", page + 1))?;
        state = score.state.clone();
        pages.push(score);
    }

    let mut text = String::new();
    for (i, score) in pages.iter().enumerate() {
        if i > 0 {
            text.push('\n');
        }
        text.push_str(&format!("X:{}\n", i + 1));
        text.push_str(&score.notation);
    }
    match &cli.output {
        Some(path) => fs::write(path, &text).with_context(|| format!("writing {}", path.display()))?,
        None => print!("{text}"),
    }

    if let Some(path) = &cli.midi {
        let treble: Sequence = pages.iter().flat_map(|s| s.treble.chords().iter().cloned()).collect();
        let bass: Sequence = pages.iter().flat_map(|s| s.bass.chords().iter().cloned()).collect();
        let bytes = to_midi_bytes(&treble, &bass, config.tempo_bpm, config.base_duration)?;
        fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
        log::info!("wrote {}", path.display());
    }
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        process::exit(2);
    }
}

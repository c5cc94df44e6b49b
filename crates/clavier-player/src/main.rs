//! Clavier Player - headless auto-player shell
//!
//! Loads a sheet, derives its note events and runs a hotkey-gated
//! playback session against the OS input stream. The graphical shell
//! lives elsewhere; this binary is the minimal wiring of config +
//! store + session, plus a `--dry-run` mode that plays into the
//! synthetic backend for testing sheets without a game running.
//!
//! ## Usage
//!
//! - `clavier-player`: list the sheet library
//! - `clavier-player <file>`: arm a session for the file
//! - `clavier-player --dry-run <file>`: play immediately, no OS input
//! - `clavier-player --set-bpm <bpm> <file>`: retime a sheet and save

use anyhow::{bail, Context, Result};
use clavier_core::config::{self, AppConfig};
use clavier_core::library::scan_library;
use clavier_core::sheet::{derive_notes, group_chords, Chord, SheetStore};
use clavier_input::SyntheticBackend;
use clavier_player::session::{PlaybackSession, SessionBackend, SessionParams};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

struct CliOptions {
    file: Option<PathBuf>,
    dry_run: bool,
    set_bpm: Option<f64>,
}

fn parse_args() -> Result<CliOptions> {
    let mut options = CliOptions { file: None, dry_run: false, set_bpm: None };
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--dry-run" => options.dry_run = true,
            "--set-bpm" => {
                let value = args.next().context("--set-bpm needs a value")?;
                options.set_bpm =
                    Some(value.parse().with_context(|| format!("bad bpm '{value}'"))?);
            }
            "--help" | "-h" => {
                println!("usage: clavier-player [--dry-run] [--set-bpm <bpm>] [sheet file]");
                std::process::exit(0);
            }
            other if other.starts_with('-') => bail!("unknown flag '{other}'"),
            other => options.file = Some(PathBuf::from(other)),
        }
    }
    Ok(options)
}

fn main() -> Result<()> {
    // Initialize logger - set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let options = parse_args()?;
    let config = config::load_config(&config::default_config_path());
    let store = SheetStore::new();

    if let Some(bpm) = options.set_bpm {
        let file = options.file.context("--set-bpm needs a sheet file")?;
        let saved = store.update_bpm(&file, bpm)?;
        println!("Saved {} at {bpm} bpm", saved.display());
        return Ok(());
    }

    let Some(file) = options.file else {
        return list_library(&config, &store);
    };

    let mut sheets = store.load(&file)?;
    derive_notes(&mut sheets[0])?;
    let chords = group_chords(&sheets[0].song_notes, &config.playback.key_mapping);
    if chords.is_empty() {
        bail!("{} has no playable notes under the current key mapping", file.display());
    }
    log::info!(
        "loaded {}: {} note(s), {} chord(s)",
        file.display(),
        sheets[0].song_notes.len(),
        chords.len()
    );

    let params = SessionParams {
        start_key: config.hotkeys.start_key.scan_code,
        stop_key: config.hotkeys.stop_key.scan_code,
        target_window: config.playback.target_window.clone(),
    };

    if options.dry_run {
        run_dry(chords, params, &config)
    } else {
        run_live(chords, params, &config)
    }
}

fn list_library(config: &AppConfig, store: &SheetStore) -> Result<()> {
    let files = scan_library(&config.music_dir, &store.supported_extensions())?;
    if files.is_empty() {
        println!("No sheets in {} yet, drop files there and rerun.", config.music_dir.display());
        return Ok(());
    }
    println!("Sheets in {}:", config.music_dir.display());
    for file in files {
        if let Some(name) = file.file_name().and_then(|n| n.to_str()) {
            println!("  {name}");
        }
    }
    Ok(())
}

/// Play into the synthetic backend, firing the start key ourselves.
fn run_dry(chords: Vec<Chord>, params: SessionParams, config: &AppConfig) -> Result<()> {
    let backend = Arc::new(SyntheticBackend::new());
    backend.set_active_title(&config.playback.target_window);

    let start_key = params.start_key;
    let session = PlaybackSession::spawn(
        chords,
        params,
        SessionBackend {
            sink: backend.clone(),
            hotkeys: backend.clone(),
            window: backend.clone(),
        },
    )?;
    backend.press(start_key);
    poll_until_stopped(session);

    let events = backend.events();
    println!("dry run dispatched {} key event(s)", events.len());
    Ok(())
}

#[cfg(windows)]
fn run_live(chords: Vec<Chord>, params: SessionParams, config: &AppConfig) -> Result<()> {
    use clavier_input::{ForegroundWindow, LowLevelHotkeys, SendInputSink};

    let backend = SessionBackend {
        sink: Arc::new(SendInputSink::new()),
        hotkeys: Arc::new(LowLevelHotkeys::new()?),
        window: Arc::new(ForegroundWindow),
    };
    let session = PlaybackSession::spawn(chords, params, backend)?;

    println!(
        "Armed. Focus {} and press '{}' to play, '{}' to pause.",
        config.playback.target_window, config.hotkeys.start_key.name, config.hotkeys.stop_key.name,
    );
    poll_until_stopped(session);
    Ok(())
}

#[cfg(not(windows))]
fn run_live(_chords: Vec<Chord>, _params: SessionParams, _config: &AppConfig) -> Result<()> {
    bail!("live key injection is only available on Windows; use --dry-run");
}

/// Poll the session at the UI cadence, echoing progress to the console.
fn poll_until_stopped(mut session: PlaybackSession) {
    let progress = session.progress();
    let mut last = f64::NAN;
    while session.is_alive() {
        let fraction = progress.fraction();
        if fraction != last {
            last = fraction;
            print!("\rprogress: {:5.1}%", fraction * 100.0);
            let _ = std::io::stdout().flush();
        }
        std::thread::sleep(Duration::from_secs_f64(1.0 / 60.0));
    }
    println!();
    session.quit();
}

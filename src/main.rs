//! Glitch CLI: play a script live, or render it to WAV.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};

use clap::Parser;
use tracing::{error, info, warn};

use glitch::audio::AudioEngine;
use glitch::config::{default_config_path, GlitchConfig};
use glitch::engine::{Engine, SharedEngine, DEFAULT_SEED};
use glitch::instrument::WavLibrary;
use glitch::midi::MidiInput;
use glitch::osc::OscListener;
use glitch::render;

/// How often the script file is checked for changes in watch mode.
const WATCH_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "glitch", version)]
#[command(about = "Per-sample expression synthesizer", long_about = None)]
struct Cli {
    /// Script file to play
    script: Option<PathBuf>,

    /// Sample rate in Hz
    #[arg(short = 'r', long)]
    rate: Option<u32>,

    /// Audio buffer size in frames
    #[arg(short = 'b', long)]
    buffer: Option<u32>,

    /// Number of output channels
    #[arg(short = 'c', long)]
    channels: Option<u16>,

    /// Recompile the script whenever the file changes
    #[arg(short = 'w', long)]
    watch: bool,

    /// Render to a WAV file instead of playing
    #[arg(long, value_name = "OUT.wav")]
    render: Option<PathBuf>,

    /// Length of the offline render
    #[arg(long, default_value = "10.0")]
    seconds: f32,

    /// Directory of user samples (one subdirectory per sample function)
    #[arg(long, value_name = "DIR")]
    samples: Option<PathBuf>,

    /// Open a MIDI input, optionally matching a device name
    #[arg(long, value_name = "NAME", num_args = 0..=1)]
    midi: Option<Option<String>>,

    /// Listen for OSC commands, optionally on a given port
    #[arg(long, value_name = "PORT", num_args = 0..=1)]
    osc: Option<Option<u16>>,

    /// List audio and MIDI devices and exit
    #[arg(long)]
    list: bool,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Config file (default: ~/.glitch/config.yaml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config = GlitchConfig::load_or_init(&config_path)?;
    apply_overrides(&mut config, &cli);

    if cli.list {
        list_devices();
        return Ok(());
    }

    let script_path = cli
        .script
        .clone()
        .ok_or("no script given (see --help)")?;
    let source = std::fs::read_to_string(&script_path)
        .map_err(|e| format!("{}: {e}", script_path.display()))?;

    let sample_rate = config.audio.sample_rate;
    let mut engine = Engine::with_seed(sample_rate, config.seed.unwrap_or(DEFAULT_SEED));
    if let Some(dir) = &config.samples_dir {
        load_samples(&mut engine, dir, sample_rate)?;
    }
    engine
        .compile(&source)
        .map_err(|e| format!("{}: {e}", script_path.display()))?;

    if let Some(out) = &cli.render {
        render::render_to_file(&mut engine, out, cli.seconds, config.audio.channels)?;
        return Ok(());
    }

    play(engine, &config, &cli, &script_path)
}

fn apply_overrides(config: &mut GlitchConfig, cli: &Cli) {
    if let Some(rate) = cli.rate {
        config.audio.sample_rate = rate;
    }
    if let Some(buffer) = cli.buffer {
        config.audio.buffer_size = buffer;
    }
    if let Some(channels) = cli.channels {
        config.audio.channels = channels;
    }
    if let Some(dir) = &cli.samples {
        config.samples_dir = Some(dir.clone());
    }
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if let Some(Some(name)) = &cli.midi {
        config.midi.device_name = Some(name.clone());
    }
    if let Some(Some(port)) = cli.osc {
        config.osc.listen_port = port;
    }
}

fn list_devices() {
    println!("audio outputs:");
    for name in AudioEngine::list_devices() {
        println!("  {name}");
    }
    println!("MIDI inputs:");
    for name in MidiInput::list_devices() {
        println!("  {name}");
    }
}

/// Register every sample directory as a function and attach the loader.
fn load_samples(engine: &mut Engine, dir: &Path, sample_rate: u32) -> Result<(), Box<dyn Error>> {
    let library = WavLibrary::load(dir, sample_rate)?;
    for name in library.names() {
        match engine.register_sample(name) {
            Ok(_) => info!(name, variants = library.variants(name), "sample registered"),
            Err(e) => warn!("skipping sample: {e}"),
        }
    }
    engine.set_loader(Arc::new(library));
    Ok(())
}

fn play(engine: Engine, config: &GlitchConfig, cli: &Cli, script: &Path) -> Result<(), Box<dyn Error>> {
    let shared = SharedEngine::new(engine);
    let audio = AudioEngine::start(shared.clone(), &config.audio)?;

    let _midi = match cli.midi {
        Some(_) => Some(MidiInput::start(&config.midi, shared.clone())?),
        None => None,
    };
    let _osc = match cli.osc {
        Some(_) => Some(OscListener::start(
            &config.osc,
            shared.clone(),
            Some(audio.control()),
        )?),
        None => None,
    };

    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst))?;

    info!(script = %script.display(), "playing, Ctrl-C to stop");
    let mut last_modified = modified(script);
    while running.load(Ordering::SeqCst) {
        thread::sleep(WATCH_INTERVAL);
        if !cli.watch {
            continue;
        }
        let current = modified(script);
        if current == last_modified {
            continue;
        }
        last_modified = current;
        match std::fs::read_to_string(script) {
            Ok(source) => match shared.compile(&source) {
                Ok(()) => info!("script reloaded"),
                Err(e) => warn!("{}: {e}", script.display()),
            },
            Err(e) => warn!("{}: {e}", script.display()),
        }
    }
    info!("stopped");
    Ok(())
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

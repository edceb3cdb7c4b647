// Tunesmith Music Generator: CLI entry point.
//
// Thin front end over the library: it clamps raw user input to the ranges
// the generator expects, builds a session, and writes MIDI files named with
// a millisecond timestamp unless an output path is given.
//
// Usage:
//   generate [piece] [--measures N] [--time-signature N] [--scale TYPE]
//     [--root PITCH] [--melody X] [--harmony X] [--rhythm X] [--tempo BPM]
//     [--seed N] [--config FILE] [--output FILE] [--json FILE]
//   generate simple [--output FILE]
//   generate demo [--seed N] [--dir DIR]
//   generate info [--seed N]
//
// Scale types: major, minor, pentatonic, blues

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::Level;
use tunesmith_music::instruments::GM_INSTRUMENTS;
use tunesmith_music::midi::{export, write_simple_midi};
use tunesmith_music::{GeneratorConfig, MusicGenerator, Result, ScaleType};

/// C major up and back down; the last note of each run is held twice as long.
const SIMPLE_PITCHES: [u8; 15] = [60, 62, 64, 65, 67, 69, 71, 72, 71, 69, 67, 65, 64, 62, 60];
const SIMPLE_DURATIONS: [u32; 15] = [1, 1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 2];

/// Accepted root pitches, C4 to C6.
const ROOT_RANGE: (i64, i64) = (60, 84);

#[derive(Debug, Parser)]
#[command(
    name = "generate",
    version,
    about = "Random music generator with MIDI export",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    /// Log generation details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    piece: PieceArgs,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a piece and export it (the default)
    Piece(PieceArgs),
    /// Write the fixed C major demonstration melody
    Simple {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate one 4-bar piece per scale type, rooted at C4
    Demo {
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Show the current scale and some available instruments
    Info {
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Debug, Args)]
struct PieceArgs {
    /// Number of bars (clamped to 4-16)
    #[arg(long, default_value_t = 8, allow_negative_numbers = true)]
    measures: i64,

    /// Beats per bar (clamped to 3-6)
    #[arg(long, default_value_t = 4, allow_negative_numbers = true)]
    time_signature: i64,

    /// Scale type; random if omitted
    #[arg(long)]
    scale: Option<ScaleType>,

    /// Root MIDI pitch (clamped to 60-84); random if omitted
    #[arg(long, allow_negative_numbers = true)]
    root: Option<i64>,

    /// Melody complexity, 0.0-1.0
    #[arg(long, allow_negative_numbers = true)]
    melody: Option<f64>,

    /// Harmony complexity, 0.0-1.0
    #[arg(long, allow_negative_numbers = true)]
    harmony: Option<f64>,

    /// Rhythm variety, 0.0-1.0
    #[arg(long, allow_negative_numbers = true)]
    rhythm: Option<f64>,

    /// Tempo in BPM
    #[arg(long)]
    tempo: Option<u16>,

    /// RNG seed (same seed and settings give the same file)
    #[arg(long)]
    seed: Option<u64>,

    /// JSON session config; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output .mid path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also dump the generated piece as JSON
    #[arg(long)]
    json: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let command = cli.command.unwrap_or(Command::Piece(cli.piece));
    if let Err(e) = run(command) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Piece(args) => generate_piece(args),
        Command::Simple { output } => create_simple_melody(output),
        Command::Demo { seed, dir } => demonstrate(seed, &dir),
        Command::Info { seed } => show_info(seed),
    }
}

/// Config file (if any) overridden by flags. The root is clamped after the
/// merge so a root from either source ends up in range.
fn session_config(args: &PieceArgs) -> Result<GeneratorConfig> {
    let mut config = match &args.config {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };
    if args.scale.is_some() {
        config.scale_type = args.scale;
    }
    if let Some(root) = args.root {
        config.root_note = Some(root.clamp(ROOT_RANGE.0, ROOT_RANGE.1) as u8);
    }
    config.root_note = config
        .root_note
        .map(|root| root.clamp(ROOT_RANGE.0 as u8, ROOT_RANGE.1 as u8));
    if let Some(tempo) = args.tempo {
        config.tempo = tempo;
    }
    config.melody_complexity = args.melody.unwrap_or(config.melody_complexity);
    config.harmony_complexity = args.harmony.unwrap_or(config.harmony_complexity);
    config.rhythm_variety = args.rhythm.unwrap_or(config.rhythm_variety);
    Ok(config)
}

fn generate_piece(args: PieceArgs) -> Result<()> {
    let config = session_config(&args)?;
    let measures = args.measures.clamp(4, 16) as u32;
    let time_signature = args.time_signature.clamp(3, 6) as u8;

    let mut generator = build_generator(config, args.seed);

    println!("=== Tunesmith Music Generator ===");
    println!("Current settings: {}", generator.scale_info());
    let c = generator.complexity();
    println!(
        "Complexity: melody {:.2}, harmony {:.2}, rhythm {:.2}",
        c.melody, c.harmony, c.rhythm
    );
    println!("Generating {measures} bars of {time_signature}/4...");

    let piece = generator.generate_piece(measures, time_signature);
    println!();
    print!("{}", piece.statistics());

    let output = args
        .output
        .unwrap_or_else(|| timestamped("generated_music"));
    export(&piece, &output)?;
    println!("MIDI file saved as: {}", output.display());

    if let Some(json_path) = args.json {
        std::fs::write(&json_path, piece.to_json()?)?;
        println!("Piece JSON saved as: {}", json_path.display());
    }
    Ok(())
}

fn create_simple_melody(output: Option<PathBuf>) -> Result<()> {
    let output = output.unwrap_or_else(|| timestamped("simple_melody"));
    write_simple_midi(&output, &SIMPLE_PITCHES, &SIMPLE_DURATIONS)?;
    println!("Simple melody created: {}", output.display());
    println!("Notes: C D E F G A B C B A G F E D C");
    Ok(())
}

fn demonstrate(seed: Option<u64>, dir: &Path) -> Result<()> {
    let mut generator = build_generator(GeneratorConfig::default(), seed);
    for scale_type in ScaleType::ALL {
        generator.set_scale(scale_type, 60);
        let piece = generator.generate_piece(4, 4);
        let path = dir.join(format!("demo_{}.mid", scale_type.name().to_lowercase()));
        match export(&piece, &path) {
            Ok(()) => println!("  {scale_type} music generated: {}", path.display()),
            Err(e) => eprintln!("  Error generating {scale_type} music: {e}"),
        }
    }
    println!("Demo completed!");
    Ok(())
}

fn show_info(seed: Option<u64>) -> Result<()> {
    let generator = build_generator(GeneratorConfig::default(), seed);
    println!("{}", generator.scale_info());
    println!();
    println!("Available MIDI instruments (first 20):");
    for (i, name) in GM_INSTRUMENTS.iter().take(20).enumerate() {
        println!("{}. {}", i + 1, name);
    }
    println!("... {} more", GM_INSTRUMENTS.len() - 20);
    Ok(())
}

fn build_generator(config: GeneratorConfig, seed: Option<u64>) -> MusicGenerator {
    match seed {
        Some(s) => MusicGenerator::seeded(config, s),
        None => MusicGenerator::from_entropy(config),
    }
}

/// `<prefix>_<unix millis>.mid` in the working directory.
fn timestamped(prefix: &str) -> PathBuf {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    PathBuf::from(format!("{prefix}_{millis}.mid"))
}

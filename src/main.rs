use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use log::debug;

use scenegen::config::load_and_validate_config;
use scenegen::error_codes::envelope_for;
use scenegen::scene::{run, RunOptions};
use scenegen::script::SceneKind;

#[derive(Debug, Parser)]
#[command(name = "scenegen")]
#[command(about = "Compiles dialogue, bio and ending scripts into Shotcut/MLT timelines")]
#[command(version, long_version = option_env!("SCENEGEN_LONG_VERSION"))]
struct Cli {
    /// Print failures as a JSON envelope on stderr.
    #[arg(long, global = true)]
    json_errors: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate a dialogue scene
    Dialogue {
        #[command(flatten)]
        scene: SceneArgs,
        #[command(flatten)]
        chapters: ChapterArgs,
    },
    /// Generate a character bio scene
    Bio {
        #[command(flatten)]
        scene: SceneArgs,
        #[command(flatten)]
        chapters: ChapterArgs,
    },
    /// Generate an ending scene
    Ending {
        #[command(flatten)]
        scene: SceneArgs,
    },
}

#[derive(Debug, Args)]
struct SceneArgs {
    /// Components to generate, top layer first. Macros from `componentMacros`,
    /// `group:NAME` and `groups` expand in place.
    #[arg(required = true)]
    components: Vec<String>,

    #[arg(short = 'j', long = "config")]
    config: PathBuf,

    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Defaults to the input path with an `.mlt` extension.
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Fail on the first component error instead of skipping it.
    #[arg(short = 'd', long)]
    debug: bool,

    #[arg(long = "bg-color", default_value = "#000000")]
    bg_color: String,
}

#[derive(Debug, Args)]
struct ChapterArgs {
    /// Only generate these chapters.
    #[arg(short = 'c', long = "chapter")]
    chapters: Vec<String>,
}

fn init_logging(debug_mode: bool) {
    let default_filter = if debug_mode { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json_errors = cli.json_errors;

    match run_command(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if json_errors {
                match serde_json::to_string(&envelope_for(&error)) {
                    Ok(envelope) => eprintln!("{envelope}"),
                    Err(_) => eprintln!("error: {error:#}"),
                }
            } else {
                eprintln!("error: {error:#}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run_command(command: Commands) -> Result<()> {
    let (kind, scene, chapters) = match command {
        Commands::Dialogue { scene, chapters } => (SceneKind::Dialogue, scene, chapters.chapters),
        Commands::Bio { scene, chapters } => (SceneKind::Bio, scene, chapters.chapters),
        Commands::Ending { scene } => (SceneKind::Ending, scene, Vec::new()),
    };

    init_logging(scene.debug);
    debug!(
        "scenegen {} ({})",
        env!("CARGO_PKG_VERSION"),
        option_env!("SCENEGEN_GIT_HASH").unwrap_or("unknown revision")
    );

    let config = load_and_validate_config(&scene.config)?;
    let output = scene
        .output
        .unwrap_or_else(|| scene.input.with_extension("mlt"));
    let options = RunOptions {
        components: scene.components,
        input: scene.input,
        output,
        chapters,
        debug: scene.debug,
        background: scene.bg_color,
    };

    let written = run(kind, &config, &options)?;
    for path in &written {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

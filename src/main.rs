use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use outline_engine::config::EngineConfig;
use outline_engine::documents::{DocumentRegistry, Workspace};
use outline_engine::engine::{EngineOptions, OutlineBinding, OutlineEngine};
use outline_engine::generators::latex::LatexGenerator;
use outline_engine::generators::markdown::MarkdownGenerator;
use outline_engine::generators::{DEFAULT_MAX_DEPTH, GeneratorOptions, OutlineGenerator};
use outline_engine::render::{OutlineModel, OutlineSink};

#[derive(Parser)]
#[command(name = "outline-engine")]
#[command(about = "Document outline tracking engine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the outline of a document and exit
    Print {
        /// Path to the document
        #[arg(short, long)]
        file: PathBuf,

        /// Prefix entries with hierarchical section numbers
        #[arg(long)]
        numbered: bool,

        /// Deepest heading level to include
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: u8,

        /// Emit the outline as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Run a scripted edit burst against a live engine (default behavior)
    Demo {
        /// Path to a JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Quiet interval in milliseconds before the outline recomputes,
        /// overriding the configuration file
        #[arg(long)]
        settle_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Some(Commands::Print {
            file,
            numbered,
            max_depth,
            json,
        }) => run_print(file, numbered, max_depth, json).await,
        Some(Commands::Demo { config, settle_ms }) => run_demo(config, settle_ms).await,
        None => run_demo(None, None).await,
    }
}

/// Pick a bundled generator from the file extension
fn generator_for(file: &Path, options: GeneratorOptions) -> Option<Arc<dyn OutlineGenerator>> {
    let name = file.file_name().and_then(|n| n.to_str()).unwrap_or("");
    if name.ends_with(".md") || name.ends_with(".markdown") {
        Some(Arc::new(MarkdownGenerator::with_options(options)))
    } else if name.ends_with(".tex") || name.ends_with(".latex") {
        Some(Arc::new(LatexGenerator::with_options(options)))
    } else {
        None
    }
}

async fn run_print(file: PathBuf, numbered: bool, max_depth: u8, json: bool) -> ExitCode {
    let content = match tokio::fs::read_to_string(&file).await {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let options = GeneratorOptions { max_depth, numbered };
    let Some(generator) = generator_for(&file, options) else {
        eprintln!("Unsupported file type: {}", file.display());
        return ExitCode::FAILURE;
    };

    let workspace = Workspace::new();
    let document = workspace.open(file.display().to_string(), content);

    let headings = match generator.generate(&document, &generator.options()) {
        Ok(headings) => headings,
        Err(e) => {
            eprintln!("Outline extraction failed: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    if json {
        match serde_json::to_string_pretty(&headings) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                eprintln!("Failed to serialize outline: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{} ({} entries)", file.display(), headings.len());
        for heading in &headings {
            let indent = "  ".repeat(heading.level.saturating_sub(1) as usize);
            println!("{}{}", indent, heading.text);
        }
    }

    ExitCode::SUCCESS
}

/// Sink that prints each render to stdout
struct StdoutSink;

#[async_trait::async_trait]
impl OutlineSink for StdoutSink {
    async fn render(&self, model: OutlineModel) {
        println!("== {} ({} entries)", model.title, model.headings.len());
        for (heading, line) in model.headings.iter().zip(model.rendered_lines()) {
            let indent = "  ".repeat(heading.level.saturating_sub(1) as usize);
            println!("{}{}", indent, line);
        }
    }
}

async fn run_demo(config_file: Option<PathBuf>, settle_ms: Option<u64>) -> ExitCode {
    let init = match config_file {
        Some(path) => match tokio::fs::read_to_string(&path).await {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(value) => Some(value),
                Err(e) => {
                    eprintln!("Invalid config file {}: {}", path.display(), e);
                    return ExitCode::FAILURE;
                }
            },
            Err(e) => {
                eprintln!("Error reading config file {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => None,
    };
    let mut config = EngineConfig::from_init_options(init);
    if let Some(ms) = settle_ms {
        config.throttle.settle_timeout_ms = ms;
    }
    let settle = config.throttle.settle_timeout();

    let workspace = Arc::new(Workspace::new());
    let engine = OutlineEngine::with_options(
        Arc::clone(&workspace) as Arc<dyn DocumentRegistry>,
        Arc::new(StdoutSink),
        EngineOptions::from_config(&config),
    );

    let document = workspace.open("demo.md", "# Demo\n");
    let generator = MarkdownGenerator::with_options(config.generator.clone());
    let binding = OutlineBinding::new(document.clone(), Arc::new(generator));
    if let Err(e) = engine.set_current(Some(binding)).await {
        eprintln!("Bind failed: {}", e);
        return ExitCode::FAILURE;
    }

    eprintln!("Applying an edit burst; one settled render follows...");
    let mut text = String::from("# Demo\n");
    for i in 1..=4 {
        text.push_str(&format!("\n## Section {}\n", i));
        workspace.update(&document, text.clone());
        tokio::time::sleep(Duration::from_millis(120)).await;
    }

    tokio::time::sleep(settle + Duration::from_millis(200)).await;

    eprintln!("Closing the document; the engine unbinds itself...");
    workspace.close(&document);
    tokio::time::sleep(Duration::from_millis(100)).await;

    ExitCode::SUCCESS
}

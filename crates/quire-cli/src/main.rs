use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result, WrapErr};
use quire_editor_core::Document;
use quire_format::{FormatConfig, Formatter, Highlighter, SyntectHighlighter};

#[derive(Parser)]
#[command(version, about = "Quire - canonicalize rich-text document markup", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Formatter config (.toml or .json)
    #[arg(long, global = true, env = "QUIRE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one formatting pass over a markup file
    Format {
        /// Markup file to format
        input: PathBuf,

        /// Write the result here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Leave code blocks unhighlighted
        #[arg(long)]
        no_highlight: bool,
    },
    /// List languages code blocks may name
    Languages,
}

fn main() -> Result<()> {
    init_miette()?;
    init_tracing();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Format {
            input,
            output,
            no_highlight,
        } => {
            if no_highlight {
                config.highlight = false;
            }
            format_file(&input, output.as_deref(), config)
        }
        Commands::Languages => {
            let formatter = Formatter::with_syntect(config);
            let mut stdout = std::io::stdout().lock();
            for language in formatter.languages() {
                writeln!(stdout, "{language}").into_diagnostic()?;
            }
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<FormatConfig> {
    match path {
        Some(path) => Ok(FormatConfig::load(path)?),
        None => Ok(FormatConfig::default()),
    }
}

fn format_file(input: &Path, output: Option<&Path>, config: FormatConfig) -> Result<()> {
    let _span = tracing::info_span!("format_file", path = %input.display()).entered();

    let source = std::fs::read_to_string(input)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {}", input.display()))?;
    let mut doc = Document::from_markup(&source)?;

    let formatter = if config.highlight {
        Formatter::with_syntect(config)
    } else {
        // Skip loading the syntax set when it would never be used.
        Formatter::new(config, SyntectHighlighter::new(Default::default()))
    };
    tracing::debug!(languages = formatter.highlighter().recognized_languages().len(), "formatter ready");

    let summary = formatter.format_tree(&mut doc)?;
    let markup = doc.inner_markup(doc.root())?;

    match output {
        Some(path) => {
            std::fs::write(path, markup)
                .into_diagnostic()
                .wrap_err_with(|| format!("failed to write {}", path.display()))?;
            eprintln!("✓ {} ({summary})", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{markup}").into_diagnostic()?;
        }
    }
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();
}

fn init_miette() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))
    .map_err(|err| miette::miette!("couldn't set the miette hook: {err}"))?;
    miette::set_panic_hook();
    Ok(())
}

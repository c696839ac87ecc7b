//! Fragment Include CLI — entry point.

use std::path::PathBuf;
use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use fragment_include::config::{resolve_attribute, resolve_base_url};
use fragment_include::IncludeConfig;
use fragment_include_cli::{execute, Input, RunOptions};

#[derive(Parser)]
#[command(
    name = "fragment-include",
    about = "Replace data-include placeholders in an HTML document with fetched fragments",
    version
)]
struct Cli {
    /// Document to expand: a file path, an http(s) URL, or `-` for stdin.
    input: Option<String>,

    /// Write the expanded document here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Base URL for relative locators.
    /// Also reads from FRAGMENT_INCLUDE_BASE_URL. Defaults to the input URL.
    #[arg(long)]
    base_url: Option<String>,

    /// Attribute marking placeholder elements.
    /// Also reads from FRAGMENT_INCLUDE_ATTRIBUTE.
    #[arg(long)]
    attribute: Option<String>,

    /// Number of passes. Each extra pass expands one more level of nesting.
    #[arg(long, default_value = "1")]
    passes: usize,

    /// Per-request timeout in milliseconds (none by default).
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Write per-placeholder outcomes as JSON to this path.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   fragment-include completions bash > ~/.local/share/bash-completion/completions/fragment-include
    ///   fragment-include completions zsh > ~/.zfunc/_fragment-include
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "fragment-include", &mut std::io::stdout());
        return Ok(());
    }

    let input = Input::parse(cli.input.as_deref());

    // CLI flag > env var; the input URL fallback is applied by `execute`
    let base_url = resolve_base_url(cli.base_url.as_deref())?;

    let config = IncludeConfig::default()
        .with_attribute(resolve_attribute(cli.attribute.as_deref()))
        .with_base_url(base_url)
        .with_timeout(cli.timeout_ms.map(Duration::from_millis));

    let opts = RunOptions {
        input,
        output: cli.output,
        report: cli.report,
        passes: cli.passes,
        config,
    };
    execute(&opts).await?;

    Ok(())
}

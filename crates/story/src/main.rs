use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use manos_wysiwyg::EditorConfig;
use tracing_subscriber::EnvFilter;

mod story;

#[derive(Parser)]
#[command(version, about = "Run manos editor commands over marked-up HTML", long_about = None)]
struct Cli {
    /// JSON file with editor options, merged over the defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one command and print the result with its selection,
    /// e.g. `run bold '<p>Tex[t to te]xt</p>'`
    Run {
        /// Command id
        command: String,

        /// Marked HTML: `[` and `]` for the range, `|` for a caret. Read from
        /// stdin when omitted
        input: Option<String>,

        /// Command arguments as JSON, e.g. '{"color": "red"}'
        #[arg(long)]
        args: Option<String>,

        /// Print the synchronized source value instead of the marked HTML
        #[arg(long)]
        value: bool,
    },
    /// List the commands of the configured plugins
    List,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            command,
            input,
            args,
            value,
        } => {
            let input = match input {
                Some(input) => input,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("failed to read marked HTML from stdin")?;
                    buf.trim_end().to_string()
                }
            };
            let args: Option<serde_json::Value> = args
                .as_deref()
                .map(serde_json::from_str)
                .transpose()
                .context("--args is not valid JSON")?;

            let outcome = story::run(config, &command, &input, args)?;
            if value {
                println!("{}", outcome.value);
            } else {
                println!("{}", outcome.marked);
            }
        }
        Commands::List => {
            for (id, label) in story::list(config)? {
                println!("{id:<16} {label}");
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EditorConfig> {
    let defaults = EditorConfig::default().with_defaults();
    let Some(path) = path else {
        return Ok(defaults);
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let user: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    let config = defaults
        .merge(user)
        .with_context(|| format!("invalid options in {}", path.display()))?;
    tracing::debug!(plugins = ?config.plugins, "options loaded");
    Ok(config)
}

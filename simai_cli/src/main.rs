use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use simai_decoder::{DecodeOptions, ErrorPolicy};

#[derive(Debug, Parser)]
#[command(name = "simai")]
#[command(about = "simai chart decoder CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Decode a maidata.txt into JSON.
    Decode {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Whether one malformed difficulty fails the whole file or is
        /// replaced by an empty chart.
        #[arg(long, value_enum, default_value_t = Policy::Hard)]
        policy: Policy,
    },
    /// Rebuild maidata.txt content from decoded JSON.
    Encode {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Policy {
    Hard,
    Soft,
}

impl From<Policy> for ErrorPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Hard => ErrorPolicy::Hard,
            Policy::Soft => ErrorPolicy::Soft,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Decode {
            input,
            output,
            policy,
        } => {
            let options = DecodeOptions {
                policy: policy.into(),
            };
            let decoded = simai_decoder::decode_file_with_options(&input, &options)
                .with_context(|| format!("decode failed: {}", input.display()))?;

            for failure in &decoded.failures {
                eprintln!(
                    "warning: difficulty {} skipped: {}",
                    failure.difficulty + 1,
                    failure.error
                );
            }

            let json = serde_json::to_string_pretty(&decoded.file)
                .context("failed to serialize chart")?;
            let out_path = output.unwrap_or_else(|| default_decode_path(&input));
            fs::write(&out_path, json)
                .with_context(|| format!("failed to write: {}", out_path.display()))?;
        }
        Command::Encode { input, output } => {
            let json = fs::read_to_string(&input)
                .with_context(|| format!("failed to read: {}", input.display()))?;
            let file: simai_schema::SimaiFile =
                serde_json::from_str(&json).context("input is not a decoded simai file")?;
            let text = simai_decoder::encode(&file);
            let out_path = output.unwrap_or_else(|| default_encode_path(&input));
            fs::write(&out_path, text)
                .with_context(|| format!("failed to write: {}", out_path.display()))?;
        }
    }

    Ok(())
}

fn default_decode_path(input: &Path) -> PathBuf {
    let mut out = input.to_path_buf();
    out.set_extension("simai.json");
    out
}

fn default_encode_path(input: &Path) -> PathBuf {
    let mut out = input.to_path_buf();
    out.set_extension("maidata.txt");
    out
}

//! Command-line summarizer.
//!
//! Usage:
//! - `insightmap-summarize <path>` summarizes a transcript file
//! - `insightmap-summarize -` reads the transcript from stdin
//! - `insightmap-summarize --url <youtube url>` fetches captions first
//!
//! Add `--json` to print the full report instead of the summary text,
//! `--proofread` to print corrected captions instead of a summary, or
//! `--mindmap` to print a Mermaid mind map of the summary.

use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use tokio::io::AsyncReadExt;

use insightmap::core::config::AppConfig;
use insightmap::start_insightmap::init_tracing;
use insightmap::summarizer::{MindMapGenerator, TranscriptProofreader, TranscriptSummarizer};
use insightmap::youtube::{TimedTextSource, fetch_transcript};

const USAGE: &str = "usage: insightmap-summarize [--json] [--proofread | --mindmap] (<path> | - | --url <youtube url>)";

/// Where the transcript comes from.
enum Input {
    File(String),
    Stdin,
    Url(String),
}

/// What to produce from the transcript.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Summarize,
    Proofread,
    MindMap,
}

struct Args {
    input: Input,
    mode: Mode,
    json: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut input = None;
    let mut json = false;
    let mut mode = Mode::Summarize;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let next = match arg.as_str() {
            "--json" => {
                json = true;
                continue;
            }
            "--proofread" | "--mindmap" => {
                if mode != Mode::Summarize {
                    bail!("--proofread and --mindmap are exclusive\n{USAGE}");
                }
                mode = if arg == "--proofread" { Mode::Proofread } else { Mode::MindMap };
                continue;
            }
            "--url" => Input::Url(args.next().context("--url needs a value")?),
            "-" => Input::Stdin,
            flag if flag.starts_with("--") => bail!("unknown option {flag}\n{USAGE}"),
            path => Input::File(path.to_string()),
        };
        if input.replace(next).is_some() {
            bail!("only one input may be given\n{USAGE}");
        }
    }

    let input = input.context(USAGE)?;
    Ok(Args { input, mode, json })
}

async fn read_transcript(input: &Input, config: &AppConfig) -> Result<String> {
    match input {
        Input::File(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read transcript file {path}")),
        Input::Stdin => {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("failed to read transcript from stdin")?;
            Ok(text)
        }
        Input::Url(url) => {
            let source = TimedTextSource::new(&config.transcript)?;
            let transcript = fetch_transcript(&source, url, &config.transcript.languages)
                .await
                .with_context(|| format!("failed to fetch transcript for {url}"))?;
            Ok(transcript.text)
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    let transcript = read_transcript(&args.input, &config).await?;

    let (text, json) = match args.mode {
        Mode::Summarize => {
            let report = TranscriptSummarizer::from_app_config(&config)?
                .run(&transcript)
                .await?;
            (report.summary.clone(), serde_json::to_string_pretty(&report)?)
        }
        Mode::Proofread => {
            let report = TranscriptProofreader::from_app_config(&config)?
                .proofread(&transcript)
                .await?;
            (report.text.clone(), serde_json::to_string_pretty(&report)?)
        }
        Mode::MindMap => {
            let summary = TranscriptSummarizer::from_app_config(&config)?
                .summarize(&transcript)
                .await?;
            let map = MindMapGenerator::from_app_config(&config)?
                .generate(&summary)
                .await?;
            (map.mermaid.clone(), serde_json::to_string_pretty(&map)?)
        }
    };

    println!("{}", if args.json { json } else { text });
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();

    let result = parse_args(std::env::args().skip(1)).and_then(|args| {
        let rt = tokio::runtime::Runtime::new().context("failed to create runtime")?;
        rt.block_on(run(args))
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

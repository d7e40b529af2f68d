// ABOUTME: CLI binary for the Hermes article extractor.
// ABOUTME: Extracts an HTML file with builtin or user-supplied rules and prints content or JSON.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser as ClapParser;
use hermes_extract::{
    load_registry_from_path, ContentType, ExtractError, Extraction, Parser, ParserBuilder,
};
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(ClapParser, Debug)]
#[command(name = "hermes")]
#[command(about = "Extract article data from an HTML file")]
struct Args {
    /// HTML file to parse
    #[arg(long = "html")]
    html: PathBuf,

    /// URL the HTML was fetched from; selects the extractor and resolves links
    #[arg(long = "url")]
    url: String,

    /// JSON rule file replacing the builtin extractors
    #[arg(short = 'e', long = "extractor")]
    extractor: Option<PathBuf>,

    /// Output format: html (default), markdown/md, text/txt
    #[arg(short = 'f', long = "format", default_value = "html")]
    format: String,

    /// Extract only the content field
    #[arg(long = "content-only")]
    content_only: bool,

    /// Known title, passed to content extraction in --content-only mode
    #[arg(long = "title", requires = "content_only")]
    title: Option<String>,

    /// Do not fall back to generic extraction when rules find nothing
    #[arg(long = "no-fallback")]
    no_fallback: bool,

    /// Output the full result as JSON instead of the content
    #[arg(long = "json")]
    json_output: bool,

    /// Output file path (default: stdout)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Print elapsed time in ms to stderr
    #[arg(long = "timing")]
    timing: bool,
}

/// Format output based on whether JSON output is requested.
fn format_output(extraction: &Extraction, json_output: bool) -> Result<String, ExtractError> {
    if json_output {
        serde_json::to_string_pretty(extraction).map_err(|e| {
            ExtractError::extract("result", "serialize", Some(anyhow::Error::new(e)))
        })
    } else {
        Ok(extraction.content().unwrap_or_default().to_string())
    }
}

fn build_parser(args: &Args) -> Result<Parser, ExtractError> {
    let mut builder = ParserBuilder::new()
        .content_type(ContentType::from(args.format.as_str()))
        .fallback(!args.no_fallback);
    if let Some(path) = &args.extractor {
        builder = builder.registry(load_registry_from_path(path)?);
    }
    Ok(builder.build())
}

fn run(args: &Args) -> Result<String, ExtractError> {
    let parser = build_parser(args)?;
    let html = fs::read_to_string(&args.html)
        .map_err(|e| ExtractError::io(args.html.display().to_string(), "read_html", e))?;
    let url = Url::parse(&args.url).map_err(|e| {
        ExtractError::invalid_url(&args.url, "parse_args", Some(anyhow::Error::new(e)))
    })?;

    let mut opts = parser.extract_options(url);
    if args.content_only {
        opts = opts.content_only(args.title.clone());
    }
    let extraction = parser.parse_html_with(&html, &opts)?;
    format_output(&extraction, args.json_output)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let start = Instant::now();

    let mut had_error = false;
    match run(&args) {
        Ok(output_str) => {
            if let Some(output_path) = &args.output {
                if let Err(e) = fs::write(output_path, &output_str) {
                    eprintln!("error writing to {:?}: {}", output_path, e);
                    had_error = true;
                }
            } else {
                println!("{}", output_str);
            }
        }
        Err(e) => {
            eprintln!("error: {}", e);
            had_error = true;
        }
    }

    if args.timing {
        let _ = writeln!(io::stderr(), "elapsed: {}ms", start.elapsed().as_millis());
    }

    if had_error {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

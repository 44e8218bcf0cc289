//! `morphcount`: count grammatical morphemes in CHILDES transcripts

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use morphcount::{
    Aggregator, Corpus, ExtractOptions, Feature, SpeakerFilter, default_features, parse_features,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Tsv,
    Json,
}

/// Count grammatical morphemes by child age in CHILDES XML transcripts.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Opts {
    /// Transcript files or glob patterns (.xml or .xml.gz)
    #[arg(required_unless_present = "list_features")]
    inputs: Vec<String>,

    /// Feature definition file (defaults to Brown's morphemes)
    #[arg(short, long)]
    features: Option<PathBuf>,

    /// Speaker code of the target child
    #[arg(long, default_value = "CHI")]
    child: String,

    /// Comma-separated adult speaker codes (defaults to everyone but the child)
    #[arg(long)]
    adults: Option<String>,

    /// Keep trailing whitespace in word forms
    #[arg(long)]
    no_strip_space: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Tsv)]
    format: Format,

    /// Write results here instead of standard output
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print the feature definitions in use and exit
    #[arg(long)]
    list_features: bool,
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();

    let level = match opts.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(io::stderr)
        .init();

    let features = load_features(opts.features.as_ref())?;

    if opts.list_features {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        for feature in &features {
            writeln!(out, "{}", feature)?;
        }
        return Ok(());
    }

    let corpus = Corpus::from_inputs(&opts.inputs).context("failed to collect input files")?;
    info!("{} transcripts, {} features", corpus.len(), features.len());

    let mut aggregator = Aggregator::new(features).with_child(&opts.child);
    if let Some(adults) = &opts.adults {
        aggregator = aggregator.with_adults(SpeakerFilter::parse(adults));
    }
    let options = ExtractOptions {
        strip_space: !opts.no_strip_space,
        ..*aggregator.options()
    };
    aggregator = aggregator.with_options(options);

    let summary = aggregator.run(&corpus);
    if summary.processed == 0 {
        bail!("no transcripts could be processed ({} skipped)", summary.skipped);
    }

    let results = aggregator.into_results();
    let out: Box<dyn Write> = match &opts.output {
        Some(path) => Box::new(
            File::create(path)
                .with_context(|| format!("failed to create output file {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut out = BufWriter::new(out);

    match opts.format {
        Format::Tsv => results.write_tsv(&mut out).context("failed to write results")?,
        Format::Json => {
            results.write_json(&mut out).context("failed to write results")?;
            writeln!(out)?;
        }
    }
    out.flush()?;

    Ok(())
}

fn load_features(path: Option<&PathBuf>) -> anyhow::Result<Vec<Feature>> {
    let Some(path) = path else {
        return Ok(default_features());
    };
    let input = fs::read_to_string(path)
        .with_context(|| format!("failed to read feature file {}", path.display()))?;
    let features = parse_features(&input)
        .with_context(|| format!("invalid feature file {}", path.display()))?;
    if features.is_empty() {
        bail!("no features defined in {}", path.display());
    }
    Ok(features)
}

use std::collections::VecDeque;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use fare_app::{artifact, ArtifactLoader, FlightQuery, LoaderConfig, Predictor};

struct Args {
    model_path: Option<PathBuf>,
    as_of: Option<NaiveDate>,
    describe: bool,
    query_path: Option<String>,
}

fn parse_args() -> Result<Args, lexopt::Error> {
    use lexopt::prelude::*;

    let mut values = VecDeque::new();
    let mut model_path = None;
    let mut as_of = None;
    let mut describe = false;
    let mut parser = lexopt::Parser::from_env();

    while let Some(arg) = parser.next()? {
        match arg {
            Value(val) => values.push_back(val.string()?),
            Long("model") => model_path = Some(PathBuf::from(parser.value()?)),
            Long("as-of") => as_of = Some(parser.value()?.parse::<NaiveDate>()?),
            Long("describe") => describe = true,
            Long("help") => {
                println!(
                    "Usage: {bin_name} [--model <artifact>] [--as-of <YYYY-MM-DD>] <query.json>\n       {bin_name} --describe [--model <artifact>]\n\nWithout --model the artifact path comes from MODEL_PATH (default /app/model.pkl).",
                    bin_name = parser.bin_name().unwrap_or("fare_app")
                );
                std::process::exit(0);
            }
            _ => return Err(arg.unexpected()),
        }
    }

    let query_path = values.pop_front();
    if !describe && query_path.is_none() {
        return Err("missing query JSON file path".into());
    }

    Ok(Args {
        model_path,
        as_of,
        describe,
        query_path,
    })
}

fn main() -> Result<()> {
    fare_app::init_tracing();
    let args = parse_args()?;

    let config = match args.model_path {
        Some(path) => LoaderConfig::new(path),
        None => LoaderConfig::from_env(),
    };

    if args.describe {
        let summary = artifact::describe(config.model_path())
            .context("Failed to read model artifact")?;
        println!("{}", summary);
        return Ok(());
    }

    let query_path = args.query_path.context("missing query JSON file path")?;
    let query_json = std::fs::read_to_string(&query_path)
        .with_context(|| format!("Failed to read query file {}", query_path))?;
    let query: FlightQuery = serde_json::from_str(&query_json)
        .with_context(|| format!("Failed to parse flight query in {}", query_path))?;

    let model = ArtifactLoader::new(config)
        .load()
        .context("Failed to load fare model")?;

    let as_of = args.as_of.unwrap_or_else(|| chrono::Local::now().date_naive());
    let fare = model
        .predict(&query, as_of)
        .context("Failed to predict fare")?;

    println!(
        "{} {} -> {} ({}, {}) on {}: ₹{}",
        query.airline,
        query.source_city,
        query.destination_city,
        query.class,
        query.stops,
        query.departure_date,
        fare
    );

    Ok(())
}

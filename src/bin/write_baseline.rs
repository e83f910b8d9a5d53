use std::path::PathBuf;

use anyhow::Result;
use fare_app::{artifact, FareModel, LoaderConfig};

fn main() -> Result<()> {
    fare_app::init_tracing();

    let mut parser = lexopt::Parser::from_env();
    let mut output = None;
    while let Some(arg) = parser.next()? {
        match arg {
            lexopt::Arg::Value(val) if output.is_none() => output = Some(PathBuf::from(val)),
            lexopt::Arg::Long("help") => {
                println!("Usage: write_baseline [OUTPUT]  (default: $MODEL_PATH or /app/model.pkl)");
                return Ok(());
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    let output = output.unwrap_or_else(|| LoaderConfig::from_env().model_path().to_path_buf());
    artifact::write_artifact(&output, &FareModel::baseline())?;
    println!("Wrote baseline fare model to {}", output.display());

    Ok(())
}

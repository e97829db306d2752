//! `sfac build`: generate records from a spec

use std::io::{BufWriter, Write};
use std::path::PathBuf;

use sample_factory_core::{Factory, Overrides, Spec};
use serde_json::Value;
use tracing::debug;

use crate::error::CliError;

/// Arguments for the `build` command
pub struct BuildArgs {
    pub spec: PathBuf,
    /// Records to generate
    pub count: usize,
    /// Seed for a reproducible run
    pub seed: Option<u64>,
    /// `KEY=VALUE` overrides; values parse as JSON, else as strings
    pub set: Vec<String>,
    /// Output file (stdout if not provided)
    pub output: Option<PathBuf>,
}

/// Handle the `build` command
pub fn handle_build(args: &BuildArgs) -> Result<(), CliError> {
    let spec = Spec::from_path(&args.spec)?;
    let overrides = parse_overrides(&args.set)?;
    debug!(overrides = overrides.len(), count = args.count, "Building records");
    let mut factory = match args.seed {
        Some(seed) => Factory::with_seed(spec, seed, overrides)?,
        None => Factory::new(spec, overrides)?,
    };

    match &args.output {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            write_records(&mut factory, args.count, BufWriter::new(file))?;
            eprintln!("Wrote {} records to {}", args.count, path.display());
        }
        None => {
            let stdout = std::io::stdout();
            write_records(&mut factory, args.count, BufWriter::new(stdout.lock()))?;
        }
    }
    Ok(())
}

fn write_records<W: Write>(factory: &mut Factory, count: usize, mut out: W) -> Result<(), CliError> {
    for record in factory.iter().take(count) {
        serde_json::to_writer(&mut out, &record?)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

/// Parse `KEY=VALUE` pairs into literal overrides
pub fn parse_overrides(assignments: &[String]) -> Result<Overrides, CliError> {
    let mut overrides = Overrides::new();
    for assignment in assignments {
        let (key, raw) = assignment
            .split_once('=')
            .filter(|(key, _)| !key.is_empty())
            .ok_or_else(|| CliError::InvalidAssignment(assignment.clone()))?;
        let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        overrides = overrides.set(key, value);
    }
    Ok(overrides)
}

//! `sfac create`: learn a spec from sample records

use std::path::PathBuf;

use sample_factory_core::{AnalysisConfig, JsonSchemaModel, SpecBuilder};

use crate::error::CliError;

/// Arguments for the `create` command
pub struct CreateArgs {
    /// Sample file: a JSON array of records or JSON Lines
    pub input: PathBuf,
    /// Where to write the spec
    pub output: PathBuf,
    /// JSON Schema declaring which objects are open mappings
    pub schema: Option<PathBuf>,
    /// Records to analyze (0 = all)
    pub sample_size: usize,
    pub max_choices: Option<usize>,
}

/// Handle the `create` command
pub fn handle_create(args: &CreateArgs) -> Result<(), CliError> {
    let text = std::fs::read_to_string(&args.input).map_err(|source| CliError::Read {
        path: args.input.clone(),
        source,
    })?;

    let mut config = AnalysisConfig::builder().sample_size(args.sample_size);
    if let Some(max_choices) = args.max_choices {
        config = config.max_choices(max_choices);
    }
    let mut builder = SpecBuilder::with_config(config.build());
    if let Some(schema) = &args.schema {
        builder = builder.with_record_model(JsonSchemaModel::from_path(schema)?);
    }

    eprintln!("Analyzing samples from {}...", args.input.display());
    builder.add_text(&text)?;
    let (spec, stats) = builder.finalize_with_stats()?;

    eprintln!();
    eprintln!("Analysis complete:");
    eprintln!("  Records processed: {}", stats.records_processed);
    eprintln!("  Records skipped: {}", stats.records_skipped);
    eprintln!("  Fields discovered: {}", stats.fields_discovered);
    eprintln!("  Unclassifiable values: {}", stats.unclassifiable);
    if !stats.dynamic_paths.is_empty() {
        eprintln!("  Dynamic-key objects: {}", stats.dynamic_paths.join(", "));
    }
    if !stats.high_cardinality.is_empty() {
        eprintln!(
            "  High-cardinality choice fields: {}",
            stats.high_cardinality.join(", ")
        );
    }

    spec.save(&args.output)?;
    eprintln!();
    eprintln!("Spec written to: {}", args.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sample_factory_core::Spec;

    #[test]
    fn test_create_writes_spec() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("samples.jsonl");
        let output = dir.path().join("spec.json");
        let lines: Vec<String> = (0..12)
            .map(|i| format!(r#"{{"id": {}, "kind": "{}"}}"#, i, if i % 2 == 0 { "a" } else { "b" }))
            .collect();
        std::fs::write(&input, lines.join("\n")).unwrap();

        handle_create(&CreateArgs {
            input,
            output: output.clone(),
            schema: None,
            sample_size: 0,
            max_choices: None,
        })
        .unwrap();

        let spec = Spec::from_path(&output).unwrap();
        assert_eq!(spec.metadata.samples_analyzed, 12);
        assert_eq!(spec.hint("kind").unwrap().kind(), "CHOICE");
    }

    #[test]
    fn test_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let result = handle_create(&CreateArgs {
            input: dir.path().join("absent.json"),
            output: dir.path().join("spec.json"),
            schema: None,
            sample_size: 0,
            max_choices: None,
        });
        assert!(matches!(result, Err(CliError::Read { .. })));
    }
}

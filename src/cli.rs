//! Minimal CLI: load schema → denormalize records → report
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;

use crate::denormalize::{denormalize, DenormalizationContext, DenormalizationResult};
use crate::names::{IdentityNames, NameResolver, SnakeCaseNames};
use crate::registry::Registry;
use crate::schema_file::SchemaFile;
use crate::value::RawRecord;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// denormalize flat records against a declared type and report every
/// property that could not be populated
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// denormalize records and print a per-record report
    Run(RunArgs),
    /// print the derived property descriptors of a registered type
    Describe(DescribeArgs),
}

#[derive(Args, Debug, Clone)]
struct SchemaSettings {
    /// schema file declaring the target types
    #[arg(long, short)]
    schema: PathBuf,

    /// id of the target type within the schema
    #[arg(long = "type", short = 't')]
    type_id: String,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON), one record per line
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct RunArgs {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    #[command(flatten)]
    input_settings: InputSettings,

    /// abort each record at its first failed property instead of collecting
    #[arg(long)]
    fail_fast: bool,

    /// relax string-vs-scalar coercion checks (assignment still re-checks)
    #[arg(long)]
    disable_type_enforcement: bool,

    /// translate camelCase property names to snake_case input keys
    #[arg(long)]
    snake_case_keys: bool,

    /// write the populated objects as a JSON array (stdout report stays)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct DescribeArgs {
    #[command(flatten)]
    schema_settings: SchemaSettings,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SchemaSettings {
    fn load_registry(&self) -> anyhow::Result<Registry> {
        let src = std::fs::read_to_string(&self.schema)
            .with_context(|| format!("failed to read schema file {}", self.schema.display()))?;
        let file = SchemaFile::parse(&src)
            .map_err(|e| anyhow::anyhow!("invalid schema file {}: {e}", self.schema.display()))?;
        let registry = Registry::new();
        file.register_into(&registry)?;
        Ok(registry)
    }
}

impl InputSettings {
    /// Load every record from every matched input file, in file then
    /// document order.
    fn load_records(&self) -> anyhow::Result<Vec<RawRecord>> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        let mut records = Vec::new();
        for source_path in source_paths {
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read input file {}", source_path.display()))?;
            if self.ndjson {
                for (lineno, line) in source.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let value: serde_json::Value = serde_json::from_str(line).with_context(|| {
                        format!("{}:{}: invalid JSON", source_path.display(), lineno + 1)
                    })?;
                    records.push(as_record(value).with_context(|| {
                        format!(
                            "{}:{}: record is not a JSON object",
                            source_path.display(),
                            lineno + 1
                        )
                    })?);
                }
            } else {
                let value: serde_json::Value = serde_json::from_str(&source)
                    .with_context(|| format!("{}: invalid JSON", source_path.display()))?;
                match value {
                    serde_json::Value::Array(items) => {
                        for item in items {
                            records.push(as_record(item).with_context(|| {
                                format!(
                                    "{}: array element is not a JSON object",
                                    source_path.display()
                                )
                            })?);
                        }
                    }
                    other => records.push(as_record(other).with_context(|| {
                        format!("{}: document is not a JSON object", source_path.display())
                    })?),
                }
            }
        }
        Ok(records)
    }
}

fn as_record(value: serde_json::Value) -> anyhow::Result<RawRecord> {
    match value {
        serde_json::Value::Object(map) => Ok(map),
        other => anyhow::bail!("expected an object, got {}", crate::value::raw_kind(&other)),
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Run(target) => run_records(target),
            Command::Describe(target) => {
                let registry = target.schema_settings.load_registry()?;
                let props = registry.describe(&target.schema_settings.type_id)?;
                for p in props.iter() {
                    let mut notes = Vec::new();
                    if p.default.is_some() {
                        notes.push("default");
                    }
                    if p.constructor_arg {
                        notes.push("constructor");
                    }
                    if !p.writable {
                        notes.push("read-only");
                    }
                    let notes = if notes.is_empty() {
                        String::new()
                    } else {
                        format!("  [{}]", notes.join(", "))
                    };
                    println!("{}: {}{notes}", p.name.as_str().bold(), p.spec);
                }
                Ok(())
            }
        }
    }
}

fn run_records(target: &RunArgs) -> anyhow::Result<()> {
    let registry = target.schema_settings.load_registry()?;
    let type_id = &target.schema_settings.type_id;
    let records = target.input_settings.load_records()?;

    let snake = SnakeCaseNames;
    let identity = IdentityNames;
    let resolver: &dyn NameResolver = if target.snake_case_keys { &snake } else { &identity };
    let mut ctx = DenormalizationContext::new().with_resolver(resolver);
    ctx.collect_errors = !target.fail_fast;
    ctx.disable_type_enforcement = target.disable_type_enforcement;

    // records are independent; the registry cache is the only shared state
    let results: Vec<DenormalizationResult> = records
        .par_iter()
        .map(|record| denormalize(&registry, type_id, record, &ctx))
        .collect();

    let mut hard_failures = 0usize;
    let mut partial = 0usize;
    for (index, result) in results.iter().enumerate() {
        match result {
            DenormalizationResult::Success(_) => {
                println!("record {index}: {}", "ok".green());
            }
            DenormalizationResult::PartialFailure(_, errors) => {
                partial += 1;
                println!(
                    "record {index}: {} ({} of its properties failed)",
                    "partial".yellow(),
                    errors.len()
                );
                for e in errors {
                    println!("  {e}");
                }
            }
            DenormalizationResult::HardFailure(e) => {
                hard_failures += 1;
                println!("record {index}: {} → {e}", "failed".red());
            }
        }
    }
    println!(
        "{} records: {} ok, {partial} partial, {hard_failures} failed",
        results.len(),
        results.len() - partial - hard_failures,
    );

    if let Some(out) = target.out.as_ref() {
        let objects: Vec<serde_json::Value> = results
            .iter()
            .map(|r| r.object().map_or(serde_json::Value::Null, |inst| inst.to_json()))
            .collect();
        let rendered = serde_json::to_string_pretty(&objects)?;
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(out, rendered)
            .with_context(|| format!("failed to write {}", out.display()))?;
    }

    if hard_failures > 0 {
        anyhow::bail!("{hard_failures} records could not be denormalized at all");
    }
    Ok(())
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            // Treat as a glob pattern
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                anyhow::bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            // Treat as a literal path
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

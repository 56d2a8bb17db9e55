//! Compile command implementation.
//!
//! Compiles a filter expression against the configured fields and prints the
//! SQL fragment with its bound parameters.

use chrono::{DateTime, Utc};
use filterql_rs::filter::{
    is_valid_prefix, FilterCompiler, Replacements, Value, DEFAULT_PARAM_PREFIX,
};
use filterql_rs::resolver::{FieldResolverExt, PatternResolver, StaticResolver};
use filterql_rs::{CompiledExpression, FieldResolver};
use owo_colors::OwoColorize;

use super::config::{load_config, Config};
use super::{CommandContext, CommandError, Result};

/// Identifier pattern used when neither config nor flags name any field.
const ANY_FIELD_PATTERN: &str = r"[A-Za-z_][\w.]*";

/// Options for the compile command.
#[derive(Debug, Default)]
pub struct CompileOptions {
    /// Filter expression.
    pub filter: String,
    /// Extra exact field names.
    pub fields: Vec<String>,
    /// Extra field regexes.
    pub patterns: Vec<String>,
    /// `KEY=JSON` placeholder values.
    pub params: Vec<String>,
    /// `KEY=RFC3339` placeholder values.
    pub param_times: Vec<String>,
    /// RFC 3339 instant for macros.
    pub now: Option<String>,
    /// Generated parameter name prefix.
    pub prefix: Option<String>,
    /// Print SQL with values substituted.
    pub inline: bool,
}

/// Executes the compile command.
pub fn execute(ctx: &CommandContext, opts: &CompileOptions) -> Result<()> {
    let config = load_config(ctx.config_path.as_deref())?;
    let compiled = compile(&config, opts)?;

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&to_json(&compiled, opts.inline))?);
        return Ok(());
    }

    if ctx.quiet {
        println!("{}", sql_text(&compiled, opts.inline));
        return Ok(());
    }

    print_compiled(ctx, &compiled, opts.inline);
    Ok(())
}

/// Compiles the filter using settings from `config` and `opts`.
fn compile(config: &Config, opts: &CompileOptions) -> Result<CompiledExpression> {
    let resolver = build_resolver(config, opts)?;
    let replacements = build_replacements(opts)?;
    let prefix = opts
        .prefix
        .as_deref()
        .or(config.compile.param_prefix.as_deref())
        .unwrap_or(DEFAULT_PARAM_PREFIX);
    if !is_valid_prefix(prefix) {
        return Err(CommandError::InvalidArgument(format!(
            "parameter prefix '{prefix}' may only contain ASCII letters, digits and '_'"
        )));
    }

    let mut compiler = FilterCompiler::new(resolver.as_ref())
        .replacements(&replacements)
        .param_prefix(prefix);
    if let Some(now) = &opts.now {
        compiler = compiler.now(parse_instant("--now", now)?);
    }

    Ok(compiler.compile(&opts.filter)?)
}

/// Builds the resolver from config fields/patterns plus command-line additions.
fn build_resolver(config: &Config, opts: &CompileOptions) -> Result<Box<dyn FieldResolver>> {
    let names: Vec<&String> = config.resolver.fields.iter().chain(&opts.fields).collect();
    let patterns: Vec<&String> = config
        .resolver
        .patterns
        .iter()
        .chain(&opts.patterns)
        .collect();

    if names.is_empty() && patterns.is_empty() {
        tracing::warn!("No fields configured; accepting any identifier");
        return Ok(Box::new(pattern_resolver([ANY_FIELD_PATTERN])?));
    }

    let names = StaticResolver::new(names.into_iter().cloned());
    Ok(Box::new(names.or(pattern_resolver(patterns)?)))
}

fn pattern_resolver<I, S>(patterns: I) -> Result<PatternResolver>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    PatternResolver::new(patterns)
        .map_err(|e| CommandError::InvalidArgument(format!("invalid field pattern: {e}")))
}

/// Parses `--param` and `--param-time` values into replacements.
fn build_replacements(opts: &CompileOptions) -> Result<Replacements> {
    let mut replacements = Replacements::new();

    for raw in &opts.params {
        let (key, value) = split_assignment("--param", raw)?;
        // Anything that is not valid JSON is taken as plain text.
        let value = serde_json::from_str::<serde_json::Value>(value)
            .map(Value::from)
            .unwrap_or_else(|_| Value::from(value));
        replacements.insert(key.to_string(), value);
    }

    for raw in &opts.param_times {
        let (key, value) = split_assignment("--param-time", raw)?;
        let ts = parse_instant("--param-time", value)?;
        replacements.insert(key.to_string(), Value::Timestamp(ts));
    }

    tracing::debug!(count = replacements.len(), "Built placeholder replacements");
    Ok(replacements)
}

/// Splits `KEY=VALUE`.
fn split_assignment<'a>(flag: &str, raw: &'a str) -> Result<(&'a str, &'a str)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
        _ => Err(CommandError::InvalidArgument(format!(
            "{flag} expects KEY=VALUE, got '{raw}'"
        ))),
    }
}

fn parse_instant(flag: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            CommandError::InvalidArgument(format!("{flag}: invalid RFC 3339 timestamp '{value}': {e}"))
        })
}

fn sql_text(compiled: &CompiledExpression, inline: bool) -> String {
    if inline {
        compiled.render_inline()
    } else {
        compiled.sql.clone()
    }
}

fn to_json(compiled: &CompiledExpression, inline: bool) -> serde_json::Value {
    let fields: Vec<_> = compiled
        .fields
        .iter()
        .map(|f| {
            serde_json::json!({
                "column": f.column,
                "multi_valued": f.multi_valued,
            })
        })
        .collect();

    let mut output = serde_json::json!({
        "sql": compiled.sql,
        "params": compiled.params,
        "fields": fields,
    });
    if inline {
        output["inline"] = serde_json::Value::String(compiled.render_inline());
    }
    output
}

fn print_compiled(ctx: &CommandContext, compiled: &CompiledExpression, inline: bool) {
    let heading = |text: &str| {
        if ctx.use_colors {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    };

    println!("{}", heading("SQL"));
    println!("  {}", sql_text(compiled, inline));

    if !compiled.params.is_empty() {
        println!("\n{}", heading("Params"));
        for (name, value) in &compiled.params {
            if ctx.use_colors {
                println!("  {} = {}", name.cyan(), value.to_sql_literal());
            } else {
                println!("  {} = {}", name, value.to_sql_literal());
            }
        }
    }

    if ctx.verbose && !compiled.fields.is_empty() {
        println!("\n{}", heading("Fields"));
        for field in &compiled.fields {
            let marker = if field.multi_valued { " (multi-valued)" } else { "" };
            println!("  {}{}", field.column, marker);
        }
    }
}

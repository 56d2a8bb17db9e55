use clap::Parser;
use std::process::ExitCode;

mod cli;
mod commands;

use cli::{Cli, Commands, ConfigCommands};
use commands::compile::CompileOptions;
use commands::config::load_config;
use commands::{CommandContext, CommandError};
use filterql_rs::FilterErrorKind;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                let error_json = serde_json::json!({
                    "error": {
                        "code": error_code(&e),
                        "message": e.to_string(),
                    }
                });
                let text = serde_json::to_string_pretty(&error_json)
                    .unwrap_or_else(|_| error_json.to_string());
                eprintln!("{text}");
            } else {
                eprintln!("Error: {e}");
            }
            error_exit_code(&e)
        }
    }
}

/// Installs the stderr log subscriber. `FQL_LOG`, then `RUST_LOG`, override
/// the flag-derived level.
fn init_logging(cli: &Cli) {
    let default_filter = if cli.verbose {
        "warn,filterql_rs=debug,fql=debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    let filter = std::env::var("FQL_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| default_filter.to_string());

    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_ansi(!cli.no_color)
        .compact()
        .with_env_filter(filter)
        .init();
}

fn run(cli: &Cli) -> commands::Result<()> {
    let mut ctx = CommandContext::from_cli(cli);

    match &cli.command {
        Some(Commands::Compile {
            filter,
            field,
            pattern,
            param,
            param_time,
            now,
            prefix,
            inline,
        }) => {
            apply_color_preference(&mut ctx)?;
            let opts = CompileOptions {
                filter: filter.clone(),
                fields: field.clone(),
                patterns: pattern.clone(),
                params: param.clone(),
                param_times: param_time.clone(),
                now: now.clone(),
                prefix: prefix.clone(),
                inline: *inline,
            };
            commands::compile::execute(&ctx, &opts)
        }
        Some(Commands::Parse { filter, tokens }) => commands::parse::execute(&ctx, filter, *tokens),
        Some(Commands::Config { command }) => match command {
            Some(ConfigCommands::Show) | None => {
                apply_color_preference(&mut ctx)?;
                commands::config::execute_show(&ctx)
            }
            Some(ConfigCommands::Path) => commands::config::execute_path(&ctx),
            Some(ConfigCommands::Init { force }) => commands::config::execute_init(&ctx, *force),
        },
        Some(Commands::Completions { shell }) => {
            commands::completions::execute(shell).map_err(CommandError::Io)
        }
        None => {
            if !ctx.quiet {
                println!("fql - filter expression compiler");
                println!("Use --help for usage information");
            }
            Ok(())
        }
    }
}

/// Turns colors off when the config file asks for it.
fn apply_color_preference(ctx: &mut CommandContext) -> commands::Result<()> {
    let config = load_config(ctx.config_path.as_deref())?;
    if config.output.color == Some(false) {
        ctx.use_colors = false;
    }
    Ok(())
}

/// Returns the error code string for JSON output.
fn error_code(e: &CommandError) -> &'static str {
    match e {
        CommandError::Filter(f) => match f.kind() {
            FilterErrorKind::Syntax => "SYNTAX_ERROR",
            FilterErrorKind::UnknownField => "UNKNOWN_FIELD",
            FilterErrorKind::UnsupportedOperator => "UNSUPPORTED_OPERATOR",
        },
        CommandError::InvalidArgument(_) => "INVALID_ARGUMENT",
        CommandError::Config(_) => "CONFIG_ERROR",
        CommandError::Io(_) => "IO_ERROR",
        CommandError::Json(_) => "JSON_ERROR",
    }
}

/// Returns the exit code for an error.
fn error_exit_code(e: &CommandError) -> ExitCode {
    match e {
        CommandError::Filter(_) => ExitCode::from(1),
        CommandError::InvalidArgument(_) => ExitCode::from(2),
        CommandError::Io(_) => ExitCode::from(3),
        CommandError::Config(_) => ExitCode::from(5),
        CommandError::Json(_) => ExitCode::from(1),
    }
}

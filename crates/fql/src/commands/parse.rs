//! Parse command implementation.
//!
//! Prints the syntax tree (or token stream) of a filter expression without
//! resolving any field.

use filterql_rs::filter::{Lexer, Token, TokenKind};
use filterql_rs::FilterParser;

use super::{CommandContext, Result};

/// Executes the parse command.
pub fn execute(ctx: &CommandContext, filter: &str, tokens: bool) -> Result<()> {
    if tokens {
        return print_tokens(ctx, filter);
    }

    let expr = FilterParser::parse(filter)?;

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&expr)?);
    } else {
        println!("{expr:#?}");
    }

    Ok(())
}

fn print_tokens(ctx: &CommandContext, filter: &str) -> Result<()> {
    let tokens = Lexer::new(filter).tokenize()?;

    if ctx.json_output {
        let output: Vec<_> = tokens.iter().map(token_json).collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for token in tokens.iter().filter(|t| t.kind != TokenKind::Eof) {
            println!("{:>4}  {:<13} {}", token.position, format!("{:?}", token.kind), token.text);
        }
    }

    Ok(())
}

fn token_json(token: &Token) -> serde_json::Value {
    serde_json::json!({
        "kind": format!("{:?}", token.kind),
        "text": token.text,
        "position": token.position,
    })
}

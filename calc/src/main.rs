use clap::Parser;
use serde::Serialize;
use std::io::{self, BufRead, Write};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use calc::{CalcError, Value};
use zipcomb::lex::position;

#[derive(Parser)]
#[command(version, about = "Evaluates arithmetic expressions")]
struct CliArgs {
    /// Expressions to evaluate. Lines are read from stdin when none is given.
    expressions: Vec<String>,
    /// Print one JSON record per expression
    #[arg(short, long)]
    json: bool,
    #[arg(short, long)]
    pretty: bool,
}

#[derive(Serialize)]
struct Record<'a> {
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    position: Option<Position>,
}

#[derive(Serialize)]
struct Position {
    line: usize,
    column: usize,
}

impl<'a> Record<'a> {
    fn new(input: &'a str, outcome: Result<Value, CalcError>) -> Self {
        match outcome {
            Ok(value) => Record {
                input,
                value: Some(value),
                error: None,
                position: None,
            },
            Err(e) => Record {
                input,
                value: None,
                position: locate(input, &e),
                error: Some(e.to_string()),
            },
        }
    }
}

fn locate(input: &str, error: &CalcError) -> Option<Position> {
    match error {
        CalcError::Parse(e) => {
            let (line, column) = position(input, e.index());
            Some(Position { line, column })
        }
        CalcError::Eval(_) => None,
    }
}

fn main() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = CliArgs::parse();

    if !args.expressions.is_empty() {
        for expression in &args.expressions {
            report(&args, expression)?;
        }
        return Ok(());
    }

    let interactive = !args.json;
    if interactive {
        println!("Supported operators: + - * / % ^ (binary), + - (unary), ! (factorial)");
        println!("Type \"quit\" to exit.");
    }
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        if interactive {
            print!("> ");
            io::stdout().flush().map_err(|e| e.to_string())?;
        }
        let Some(line) = lines.next() else {
            break;
        };
        let line = line.map_err(|e| e.to_string())?;
        if line.trim() == "quit" {
            break;
        }
        report(&args, &line)?;
    }
    info!("bye");
    Ok(())
}

fn report(args: &CliArgs, input: &str) -> Result<(), String> {
    let outcome = calc::evaluate(input);
    debug!(input, ok = outcome.is_ok(), "evaluated");
    if args.json {
        let record = Record::new(input, outcome);
        let json = if args.pretty {
            serde_json::to_string_pretty(&record)
        } else {
            serde_json::to_string(&record)
        };
        println!("{}", json.map_err(|e| e.to_string())?);
        return Ok(());
    }
    match outcome {
        Ok(value) => println!("{value}"),
        Err(e) => match locate(input, &e) {
            Some(Position { line, column }) => println!("Error ({line}:{column}): {e}"),
            None => println!("Error: {e}"),
        },
    }
    Ok(())
}

use std::{
    io::Read as _,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "mapglue", version)]
struct Cli {
    /// Log filter verbosity (-v: debug, -vv: trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a wire expression and print its canonical JSON.
    Normalize(InputArgs),
    /// Decode a wire expression and print its display string.
    Display(InputArgs),
    /// Decode a wire expression and report whether it is valid.
    Check(InputArgs),
    /// Validate a render-thread config document and print it with defaults filled in.
    Config(InputArgs),
}

#[derive(Parser, Debug)]
struct InputArgs {
    /// Input JSON file, or `-` for stdin.
    input: PathBuf,

    /// Pretty-print JSON output.
    #[arg(long)]
    pretty: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Normalize(args) => cmd_normalize(&args),
        Command::Display(args) => cmd_display(&args),
        Command::Check(args) => cmd_check(&args),
        Command::Config(args) => cmd_config(&args),
    }
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("read '{}'", path.display()))
}

fn read_expression(path: &Path) -> anyhow::Result<mapglue::Expression> {
    let text = read_input(path)?;
    let expr = mapglue::Expression::from_json_str(&text)
        .with_context(|| format!("decode expression '{}'", path.display()))?;
    Ok(expr)
}

fn print_json(value: &serde_json::Value, pretty: bool) -> anyhow::Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}

fn cmd_normalize(args: &InputArgs) -> anyhow::Result<()> {
    let expr = read_expression(&args.input)?;
    print_json(&expr.to_wire(), args.pretty)
}

fn cmd_display(args: &InputArgs) -> anyhow::Result<()> {
    let expr = read_expression(&args.input)?;
    println!("{expr}");
    Ok(())
}

fn cmd_check(args: &InputArgs) -> anyhow::Result<()> {
    let expr = read_expression(&args.input)?;
    let kind = match &expr {
        mapglue::Expression::Operator { op, args } => {
            format!("'{op}' expression with {} operands", args.len())
        }
        mapglue::Expression::Literal(_) => "literal".to_owned(),
        mapglue::Expression::Map(entries) => format!("map with {} keys", entries.len()),
    };
    println!("ok: {kind}");
    Ok(())
}

fn cmd_config(args: &InputArgs) -> anyhow::Result<()> {
    let text = read_input(&args.input)?;
    let cfg = mapglue::RenderThreadConfig::from_json_str(&text)
        .with_context(|| format!("load config '{}'", args.input.display()))?;
    print_json(&serde_json::to_value(&cfg)?, args.pretty)
}

// c2pml - C subset to Promela translator
//
// Translates a C program into a Promela model for the SPIN model checker.
//
// Usage:
//   c2pml input.c -o model.pml
//   c2pml input.c -o -            (model on stdout)
//   c2pml --ast-json tree.json -o model.pml
//
// Log verbosity follows C2PML_LOG (e.g. C2PML_LOG=debug).

use anyhow::{Context, Result};
use c2pml::{frontend, translate, Options};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "c2pml")]
#[command(about = "C subset to Promela translator")]
#[command(version)]
struct Args {
    /// Input C source (or AST JSON with --ast-json)
    input: PathBuf,

    /// Output Promela file, `-` for stdout
    #[arg(short, long, default_value = "output.pml")]
    output: PathBuf,

    /// Read a serialized syntax tree instead of C source
    #[arg(long)]
    ast_json: bool,

    /// Spaces per indentation level
    #[arg(long, default_value_t = 4)]
    indent: usize,

    /// Do not emit the init block
    #[arg(long)]
    no_init: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_env("C2PML_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let options = Options {
        indent_width: args.indent,
        emit_init: !args.no_init,
    };

    // Load input
    tracing::info!(input = %args.input.display(), "loading");
    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    // Build the syntax tree
    let program = if args.ast_json {
        frontend::json::parse(&text).context("Failed to decode AST JSON")?
    } else {
        frontend::c::parse(&text).context("Failed to parse C source")?
    };
    tracing::info!(items = program.items.len(), "parsed");

    // Translate
    let model = translate::build(&program, &options);
    let pml = model.render(options.indent_width);

    if model.unsupported_count() > 0 {
        tracing::warn!(
            count = model.unsupported_count(),
            "model contains unsupported constructs"
        );
    }

    // Write output
    if args.output.as_os_str() == "-" {
        std::io::stdout()
            .write_all(pml.as_bytes())
            .context("Failed to write output")?;
    } else {
        std::fs::write(&args.output, &pml).context("Failed to write output")?;
        tracing::info!(
            output = %args.output.display(),
            bytes = pml.len(),
            processes = model.process_count,
            "wrote model"
        );
    }

    Ok(())
}

//! FanC Compiler - FanC to LLVM IR
//!
//! Usage: fanc [OPTIONS] <input> [-o <output>]

use anyhow::{Context, bail};
use clap::{ArgAction, Parser as ClapParser};
use fanc::common::DiagnosticReporter;
use fanc::frontend::{CompileContext, FanCFrontend, FrontendConfig};
use std::fs;
use std::path::PathBuf;
use std::process;
use tracing::{debug, warn};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

#[derive(ClapParser, Debug)]
#[command(name = "fanc")]
#[command(author = "FanC Team")]
#[command(version)]
#[command(about = "Semantic analyzer and LLVM IR generator for FanC", long_about = None)]
struct Args {
    /// Input source file (.fanc)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (defaults to the input path with a .ll extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Dump tokens (for debugging)
    #[arg(long)]
    dump_tokens: bool,

    /// Dump AST (for debugging)
    #[arg(long)]
    dump_ast: bool,

    /// Dump the declarations of every scope (for debugging)
    #[arg(long)]
    dump_scopes: bool,
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}

/// `RUST_LOG` picks the filter unless `-v` overrides it
fn init_tracing(verbosity: u8) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let level_filter = match verbosity {
        0 => None,
        1 => Some(LevelFilter::DEBUG),
        _ => Some(LevelFilter::TRACE),
    };

    let builder = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    if let Some(level_filter) = level_filter {
        builder.with_max_level(level_filter).init();
    } else {
        builder.init();
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("cannot read {}", args.input.display()))?;
    let filename = args.input.display().to_string();

    let mut reporter = DiagnosticReporter::new();
    let file_id = reporter.add_file(&filename, &source);

    if args.input.extension().and_then(|e| e.to_str()) != Some("fanc") {
        warn!("{} does not have a .fanc extension", filename);
    }

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("ll"));
    debug!(input = %args.input.display(), output = %output_path.display(), "compiling");

    let config = FrontendConfig {
        dump_tokens: args.dump_tokens,
        dump_ast: args.dump_ast,
        dump_scopes: args.dump_scopes,
    };
    let ctx = CompileContext::new(filename.clone(), file_id, &reporter);

    // Diagnostics have already been rendered by the frontend
    let Ok(module) = FanCFrontend::new().compile(&source, &ctx, &config) else {
        bail!("could not compile {}", filename);
    };

    fs::write(&output_path, module.to_string())
        .with_context(|| format!("cannot write {}", output_path.display()))?;
    debug!(output = %output_path.display(), "wrote LLVM IR");

    Ok(())
}

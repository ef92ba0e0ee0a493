use std::{fs, path::PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

use thumbsim::emu::debugger::Debugger;
use thumbsim::{Assembler, Cpu, CpuConfig};

#[derive(Debug, Parser)]
#[command(version, about = "Assemble and run a restricted Thumb subset")]
struct Cli {
    /// Assembly source file.
    input: PathBuf,

    /// Drop into the interactive step debugger instead of running to
    /// completion.
    #[arg(long)]
    debug: bool,

    /// Print the final CPU state as JSON.
    #[arg(long)]
    dump_state: bool,

    /// Memory size in cells.
    #[arg(long, default_value_t = 64)]
    memory_size: usize,

    /// Stack size in cells.
    #[arg(long, default_value_t = 64)]
    stack_size: usize,

    /// Increase log verbosity (-v: debug, -vv: trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    let source = fs::read_to_string(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;
    let program = Assembler
        .assemble(&source)
        .map_err(|diag| anyhow!("{}: {diag}", cli.input.display()))?;
    log::info!("assembled {} instructions", program.len());

    let mut cpu = Cpu::new(CpuConfig {
        memory_size: cli.memory_size,
        stack_size: cli.stack_size,
    });
    cpu.load(program);

    if cli.debug {
        Debugger::new(&mut cpu).repl()?;
    } else {
        cpu.run();
    }

    if cli.dump_state {
        println!("{}", serde_json::to_string_pretty(&cpu.snapshot())?);
    }
    Ok(())
}

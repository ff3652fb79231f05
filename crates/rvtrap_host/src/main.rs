mod replay;
mod scenario;
mod sim;
mod stats;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rvtrap_core::{CsrSelector, TrapCause};
use rvtrap_io::{parser, regview};
use std::path::PathBuf;

#[derive(Parser)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the armed software interrupt scenario on a simulated hart.
    Scenario,
    /// Replay a trap trace on one or more simulated harts.
    Replay {
        #[arg(short, long)]
        trace: PathBuf,
        #[arg(long, default_value_t = 1)]
        harts: usize,
    },
    /// Classify a raw 64-bit mcause value.
    Decode {
        #[arg(value_parser = parse_u64)]
        mcause: u64,
    },
    /// Name the set bits of an mstatus/mie/mip value.
    Bits {
        csr: String,
        #[arg(value_parser = parse_u64)]
        value: u64,
    },
}

fn parse_u64(text: &str) -> Result<u64, String> {
    parser::parse_number(text).map_err(|err| err.to_string())
}

fn decode(mcause: u64) {
    let cause = sim::classify(mcause);
    let interrupt = mcause & sim::INTERRUPT_FLAG != 0;
    let code = mcause & !sim::INTERRUPT_FLAG;
    println!("mcause    {:#018x}", mcause);
    println!("kind      {}", if interrupt { "interrupt" } else { "exception" });
    println!("code      {}", code);
    println!("counter   {}", cause);
    if cause == TrapCause::Unhandled {
        println!("handler   unhandled_exception_handler (halts)");
    }
}

fn bits(csr: &str, value: u64) -> Result<()> {
    let selector = CsrSelector::from_name(csr).with_context(|| format!("unknown CSR `{csr}`"))?;
    let value = u32::try_from(value).context("CSR values are 32 bits wide")?;
    println!("{} = {:#010x}", selector, value);
    println!("bits: {:?}", regview::set_bits(value));
    println!("      {}", regview::describe(selector, value));
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Scenario => scenario::run_scenario()?,
        Commands::Replay { trace, harts } => replay::run_replay(&trace, harts)?,
        Commands::Decode { mcause } => decode(mcause),
        Commands::Bits { csr, value } => bits(&csr, value)?,
    }
    Ok(())
}

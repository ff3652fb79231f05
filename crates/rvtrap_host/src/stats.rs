//! Console reports of trap statistics.

use rvtrap_core::{CsrSelector, TrapCause, TrapStatistics};
use rvtrap_io::regview;

use crate::sim::{HartState, SimHart};

/// Prints one line per counter followed by the total.
pub fn print_report(title: &str, stats: &TrapStatistics) {
    println!("\n{title}");
    for cause in TrapCause::ALL {
        let code = match cause.code() {
            Some(code) => format!("{code:2}"),
            None => " *".to_string(),
        };
        println!("  [{code}] {:<20} {:6}", cause.name(), stats.count(cause));
    }
    println!("  {:<25} {:6}", "total", stats.total());
}

/// Prints a hart's final state, interrupt registers and counters.
pub fn print_hart(hart: &SimHart) {
    let state = match hart.state() {
        HartState::Running => "running".to_string(),
        HartState::Halted(fault) => format!(
            "halted (mcause={:#x} mepc={:#010x} mtval={:#x})",
            fault.mcause, fault.mepc, fault.mtval
        ),
    };
    println!("\nHart {}: {} | traps taken: {}", hart.id(), state, hart.delivered());
    for csr in [CsrSelector::Mstatus, CsrSelector::Mie, CsrSelector::Mip] {
        let value = hart.register(csr);
        println!("  {:<8} {:#010x}  {}", csr.name(), value, regview::describe(csr, value));
    }
    print_report("  Counters", &hart.stats());
}

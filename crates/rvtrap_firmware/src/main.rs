#![no_std]
#![no_main]

use panic_halt as _;
use rvtrap_core::{InterruptSource, TrapStatistics};

mod console;
mod csr;
mod drivers;
mod trap;

use core::arch::global_asm;
use drivers::clint::Clint;
global_asm!(include_str!("entry.S"));

/// Spins allowed for the self-triggered software interrupt to land.
const SELF_TEST_SPINS: u32 = 1_000_000;

/// Timer ticks between statistics reports.
const REPORT_EVERY: u32 = 5;

#[unsafe(no_mangle)]
pub extern "C" fn kmain() -> ! {
    console::init();
    console::println!("[BOOT] Hart 0 Online");

    let installed = trap::with_controller(|ctrl| {
        ctrl.init();
        trap::install(ctrl)
    });
    match installed {
        Ok(base) => console::println!("[BOOT] mtvec = {:#010x}", base),
        Err(err) => {
            console::println!("[BOOT] cannot install trap vector: {}", err);
            halt();
        }
    }

    let passed = software_interrupt_self_test();
    #[cfg(feature = "qemu_exit")]
    finish(passed);
    #[cfg(not(feature = "qemu_exit"))]
    if !passed {
        halt();
    }

    Clint::schedule_in(trap::TICK_PERIOD);
    trap::with_controller(|ctrl| ctrl.enable_source(InterruptSource::MachineTimer));
    console::println!("[TIMER] Armed, period {} ticks", trap::TICK_PERIOD);

    let mut last_report = 0;
    loop {
        // SAFETY: wfi only stalls the hart until the next interrupt.
        unsafe { riscv::asm::wfi() };

        let stats = trap::with_controller(|ctrl| ctrl.stats());
        if stats.machine_timer >= last_report + REPORT_EVERY {
            last_report = stats.machine_timer;
            report(Clint::now(), &stats);
        }
    }
}

/// Arms the machine software source, raises it, and checks that exactly one
/// trap was counted and the pending bit was acknowledged.
fn software_interrupt_self_test() -> bool {
    trap::with_controller(|ctrl| {
        ctrl.enable_source(InterruptSource::MachineSoftware);
        ctrl.trigger_software();
    });
    trap::enable_interrupts();

    let mut spins = 0;
    while spins < SELF_TEST_SPINS
        && trap::with_controller(|ctrl| ctrl.stats().machine_software) == 0
    {
        core::hint::spin_loop();
        spins += 1;
    }

    let (stats, still_pending) = trap::with_controller(|ctrl| {
        (ctrl.stats(), ctrl.pending(InterruptSource::MachineSoftware))
    });
    let passed = stats.machine_software == 1 && stats.total() == 1 && !still_pending;
    console::println!(
        "[SELFTEST] msoft={} total={} pending={} -> {}",
        stats.machine_software,
        stats.total(),
        still_pending,
        if passed { "PASS" } else { "FAIL" }
    );
    passed
}

fn report(now: u64, stats: &TrapStatistics) {
    console::println!(
        "T={:4}s | msoft: {:3} | mtimer: {:5} | mext: {:3} | s*: {}/{}/{} | unhandled: {}",
        now / rvtrap_common::mmio::MTIME_FREQ,
        stats.machine_software,
        stats.machine_timer,
        stats.machine_external,
        stats.supervisor_software,
        stats.supervisor_timer,
        stats.supervisor_external,
        stats.unhandled
    );
}

#[cfg(feature = "qemu_exit")]
fn finish(passed: bool) -> ! {
    use rvtrap_common::mmio::{FINISHER_FAIL, FINISHER_PASS, TEST_FINISHER};
    let code = if passed { FINISHER_PASS } else { FINISHER_FAIL };
    // SAFETY: the SiFive test finisher is mapped on QEMU 'virt'.
    unsafe { (TEST_FINISHER as *mut u32).write_volatile(code) };
    halt();
}

fn halt() -> ! {
    trap::disable_interrupts();
    Clint::disarm();
    loop {
        // SAFETY: wfi only stalls the hart.
        unsafe { riscv::asm::wfi() };
    }
}

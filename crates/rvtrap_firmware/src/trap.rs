//! Machine-mode trap entry points.
//!
//! The vector in `entry.S` saves the interrupted context and calls
//! [`rust_trap_handler`], which classifies `mcause` and calls one of the
//! seven fixed handler entry points below. Each entry point forwards to the
//! matching handler in `rvtrap_core::handlers` with the hart's controller as
//! the trap sink.
//!
//! The controller lives in a static. Trap context reaches it only while
//! `mstatus.MIE` is clear (hardware clears it on entry), and normal context
//! reaches it only through [`with_controller`], which clears it too, so the
//! two never hold it at the same time.

use crate::csr::MachineCsrs;
use crate::drivers::clint::Clint;
use core::cell::UnsafeCell;
use riscv::register::mcause;
use rvtrap_common::mmio::MTIME_FREQ;
use rvtrap_core::{CsrError, CsrSelector, InterruptController, TrapCause, handlers};

/// Machine timer period: one tick per second.
pub const TICK_PERIOD: u64 = MTIME_FREQ;

struct GlobalCell<T>(UnsafeCell<T>);
unsafe impl<T> Sync for GlobalCell<T> {}

impl<T> GlobalCell<T> {
    const fn new(val: T) -> Self {
        Self(UnsafeCell::new(val))
    }

    #[allow(clippy::mut_from_ref)]
    unsafe fn get_mut(&self) -> &mut T {
        unsafe { &mut *self.0.get() }
    }
}

static CONTROLLER: GlobalCell<InterruptController<MachineCsrs>> =
    GlobalCell::new(InterruptController::new(MachineCsrs));

unsafe extern "C" {
    fn trap_vector();
}

/// Controller access from trap context.
///
/// # Safety
///
/// Only valid inside a trap handler, where `mstatus.MIE` is clear.
unsafe fn trap_controller() -> &'static mut InterruptController<MachineCsrs> {
    unsafe { CONTROLLER.get_mut() }
}

/// Runs `f` on the controller with machine interrupts masked.
///
/// The previous global enable state is restored afterwards; `f` must not
/// change it.
pub fn with_controller<R>(f: impl FnOnce(&mut InterruptController<MachineCsrs>) -> R) -> R {
    // SAFETY: interrupts are masked before the controller is used and no
    // handler runs until they are restored.
    let ctrl = unsafe { CONTROLLER.get_mut() };
    let was_enabled = ctrl.global_enabled();
    ctrl.disable_global();
    let result = f(ctrl);
    if was_enabled {
        ctrl.enable_global();
    }
    result
}

/// Sets the global machine interrupt enable. Pending, enabled sources trap
/// immediately.
pub fn enable_interrupts() {
    // SAFETY: a single bit set; no reference outlives this statement.
    unsafe { CONTROLLER.get_mut() }.enable_global();
}

/// Clears the global machine interrupt enable.
pub fn disable_interrupts() {
    // SAFETY: a single bit clear; no reference outlives this statement.
    unsafe { CONTROLLER.get_mut() }.disable_global();
}

/// Points `mtvec` at the assembly vector in direct mode.
///
/// Fails with [`CsrError::Rejected`] when the hardware legalized the base to
/// a different address.
pub fn install(ctrl: &mut InterruptController<MachineCsrs>) -> Result<u32, CsrError> {
    let base = trap_vector as usize as u32;
    ctrl.csrs_mut().try_write_verified(CsrSelector::Mtvec, base)
}

/// Trap handler called from the assembly trap vector.
///
/// Classifies the machine cause register and calls the matching entry point.
/// Synchronous exceptions and unknown interrupt codes go to the catch-all.
#[unsafe(no_mangle)]
pub extern "C" fn rust_trap_handler() {
    match TrapCause::from_mcause(mcause::read().bits()) {
        TrapCause::MachineSoftware => machine_software_interrupt_handler(),
        TrapCause::MachineTimer => {
            machine_timer_interrupt_handler();
            Clint::acknowledge_timer(TICK_PERIOD);
        }
        // No external device is wired to the PLIC yet, so nothing to claim.
        TrapCause::MachineExternal => machine_external_interrupt_handler(),
        TrapCause::SupervisorSoftware => supervisor_software_interrupt_handler(),
        TrapCause::SupervisorTimer => supervisor_timer_interrupt_handler(),
        TrapCause::SupervisorExternal => supervisor_external_interrupt_handler(),
        TrapCause::Unhandled => unhandled_exception_handler(),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn unhandled_exception_handler() -> ! {
    // SAFETY: trap context.
    handlers::unhandled_exception(unsafe { trap_controller() })
}

#[unsafe(no_mangle)]
pub extern "C" fn machine_software_interrupt_handler() {
    // SAFETY: trap context.
    handlers::machine_software(unsafe { trap_controller() });
}

#[unsafe(no_mangle)]
pub extern "C" fn machine_timer_interrupt_handler() {
    // SAFETY: trap context.
    handlers::machine_timer(unsafe { trap_controller() });
}

#[unsafe(no_mangle)]
pub extern "C" fn machine_external_interrupt_handler() {
    // SAFETY: trap context.
    handlers::machine_external(unsafe { trap_controller() });
}

#[unsafe(no_mangle)]
pub extern "C" fn supervisor_software_interrupt_handler() {
    // SAFETY: trap context.
    handlers::supervisor_software(unsafe { trap_controller() });
}

#[unsafe(no_mangle)]
pub extern "C" fn supervisor_timer_interrupt_handler() {
    // SAFETY: trap context.
    handlers::supervisor_timer(unsafe { trap_controller() });
}

#[unsafe(no_mangle)]
pub extern "C" fn supervisor_external_interrupt_handler() {
    // SAFETY: trap context.
    handlers::supervisor_external(unsafe { trap_controller() });
}

//! Trap dispatch handlers.
//!
//! Each handler records exactly one counter and performs its cause-specific
//! side effect through a [`TrapSink`]. Handlers run with machine interrupts
//! disabled by trap entry and must never re-enable them.

use crate::cause::TrapCause;

/// Registers latched by hardware for a trap the dispatcher could not
/// classify.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultRecord {
    pub mcause: u32,
    pub mepc: u32,
    pub mtval: u32,
}

/// What a handler is allowed to do to the controller.
pub trait TrapSink {
    /// Adds one to the counter of `cause`.
    fn record(&mut self, cause: TrapCause);

    /// Lowers the machine software pending bit.
    fn clear_software(&mut self);

    /// Clears the global machine interrupt enable.
    fn disable_global(&mut self);

    /// Reads `mcause`, `mepc` and `mtval` and keeps them for post-mortem
    /// inspection.
    fn capture_fault(&mut self) -> FaultRecord;

    fn wait_for_interrupt(&mut self);
}

/// Recording half of [`unhandled_exception`].
///
/// Counts the trap, captures the diagnostic registers and disables global
/// interrupts. Simulators call this directly and then treat the hart as
/// halted.
pub fn fault_entry<S: TrapSink + ?Sized>(sink: &mut S) -> FaultRecord {
    sink.record(TrapCause::Unhandled);
    let fault = sink.capture_fault();
    sink.disable_global();
    fault
}

/// Catch-all handler. Never returns; only a reset leaves this loop.
pub fn unhandled_exception<S: TrapSink + ?Sized>(sink: &mut S) -> ! {
    fault_entry(sink);
    loop {
        sink.wait_for_interrupt();
    }
}

/// Counts the trap and acknowledges the self-directed software interrupt so
/// it does not fire again on `mret`.
pub fn machine_software<S: TrapSink + ?Sized>(sink: &mut S) {
    sink.record(TrapCause::MachineSoftware);
    sink.clear_software();
}

/// The timer device is acknowledged by its driver, not here.
pub fn machine_timer<S: TrapSink + ?Sized>(sink: &mut S) {
    sink.record(TrapCause::MachineTimer);
}

/// The interrupting device is acknowledged by its driver, not here.
pub fn machine_external<S: TrapSink + ?Sized>(sink: &mut S) {
    sink.record(TrapCause::MachineExternal);
}

pub fn supervisor_software<S: TrapSink + ?Sized>(sink: &mut S) {
    sink.record(TrapCause::SupervisorSoftware);
}

pub fn supervisor_timer<S: TrapSink + ?Sized>(sink: &mut S) {
    sink.record(TrapCause::SupervisorTimer);
}

pub fn supervisor_external<S: TrapSink + ?Sized>(sink: &mut S) {
    sink.record(TrapCause::SupervisorExternal);
}

/// Routes a classified trap to its handler.
///
/// Returns only for recognized causes.
pub fn dispatch<S: TrapSink + ?Sized>(sink: &mut S, cause: TrapCause) {
    match cause {
        TrapCause::MachineSoftware => machine_software(sink),
        TrapCause::MachineTimer => machine_timer(sink),
        TrapCause::MachineExternal => machine_external(sink),
        TrapCause::SupervisorSoftware => supervisor_software(sink),
        TrapCause::SupervisorTimer => supervisor_timer(sink),
        TrapCause::SupervisorExternal => supervisor_external(sink),
        TrapCause::Unhandled => unhandled_exception(sink),
    }
}

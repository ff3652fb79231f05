//! Simulated hart: trap delivery on top of the shadow register file.
//!
//! Models what the hardware and the trap vector stub do around the handlers:
//! a pending, enabled source is taken whenever the global enable is set,
//! trap entry saves and clears `mstatus.MIE`, the handler runs through the
//! same dispatch code the firmware uses, device drivers lower their pending
//! lines, and `mret` restores the enable. An unrecognized cause leaves the
//! hart halted in the catch-all wait loop.

use rvtrap_core::shadow::ShadowCsrFile;
use rvtrap_core::{
    CsrSelector, FaultRecord, InterruptController, InterruptSource, TrapCause, TrapStatistics,
    handlers,
};
use rvtrap_io::parser::{TraceEvent, TraceLine};

/// Interrupt flag of a 64-bit `mcause`.
pub const INTERRUPT_FLAG: u64 = 1 << 63;

/// Address the simulated program counter starts from.
const RESET_PC: u32 = 0x8000_0000;

/// Machine interrupt priority, highest first.
const PRIORITY: [InterruptSource; 3] = [
    InterruptSource::MachineExternal,
    InterruptSource::MachineSoftware,
    InterruptSource::MachineTimer,
];

/// Classifies a 64-bit `mcause` independently of the host word size.
pub fn classify(mcause: u64) -> TrapCause {
    TrapCause::from_parts(mcause & INTERRUPT_FLAG != 0, mcause & !INTERRUPT_FLAG)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HartState {
    Running,
    /// Parked in the catch-all wait loop after an unrecognized trap.
    Halted(FaultRecord),
}

/// One simulated hart with its own controller context.
pub struct SimHart {
    id: usize,
    ctrl: InterruptController<ShadowCsrFile>,
    pc: u32,
    state: HartState,
    delivered: u64,
}

impl SimHart {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            ctrl: InterruptController::new(ShadowCsrFile::new()),
            pc: RESET_PC,
            state: HartState::Running,
            delivered: 0,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn controller(&self) -> &InterruptController<ShadowCsrFile> {
        &self.ctrl
    }

    pub fn state(&self) -> HartState {
        self.state
    }

    pub fn stats(&self) -> TrapStatistics {
        self.ctrl.stats()
    }

    /// Traps taken so far, including the one that halted the hart.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    pub fn register(&self, csr: CsrSelector) -> u32 {
        self.ctrl.csrs().backend().peek(csr)
    }

    /// Replays every line addressed to this hart until it halts.
    pub fn run(&mut self, trace: &[TraceLine]) {
        let id = self.id;
        for line in trace.iter().filter(|line| line.targets(id)) {
            if self.state != HartState::Running {
                break;
            }
            self.apply(line.event);
        }
    }

    /// Executes one event, then takes every interrupt it made deliverable.
    pub fn apply(&mut self, event: TraceEvent) {
        if self.state != HartState::Running {
            return;
        }
        self.pc = self.pc.wrapping_add(4);

        match event {
            TraceEvent::Init => self.ctrl.init(),
            TraceEvent::Global(true) => self.ctrl.enable_global(),
            TraceEvent::Global(false) => self.ctrl.disable_global(),
            TraceEvent::Enable(src) => self.ctrl.enable_source(src),
            TraceEvent::Disable(src) => self.ctrl.disable_source(src),
            TraceEvent::Soft => self.ctrl.trigger_software(),
            TraceEvent::ClearSoft => self.ctrl.clear_software(),
            TraceEvent::Raise(src) => self
                .ctrl
                .csrs_mut()
                .backend_mut()
                .raise_pending(src.pending_mask()),
            TraceEvent::Trap(mcause) => self.take_trap(mcause),
            TraceEvent::ResetStats => self.ctrl.reset_stats(),
        }

        self.deliver_pending();
    }

    fn deliverable(&self) -> Option<InterruptSource> {
        if !self.ctrl.global_enabled() {
            return None;
        }
        PRIORITY
            .into_iter()
            .find(|&src| self.ctrl.source_enabled(src) && self.ctrl.pending(src))
    }

    fn deliver_pending(&mut self) {
        while self.state == HartState::Running {
            let Some(src) = self.deliverable() else {
                return;
            };
            let code = src.cause().code().map_or(0, u64::from);
            self.take_trap(INTERRUPT_FLAG | code);

            // Timer comparator and PLIC are acknowledged by their drivers.
            if src != InterruptSource::MachineSoftware {
                self.ctrl
                    .csrs_mut()
                    .backend_mut()
                    .lower_pending(src.pending_mask());
            }
        }
    }

    /// Enters the trap vector with a raw 64-bit `mcause`.
    fn take_trap(&mut self, mcause: u64) {
        let interrupt = mcause & INTERRUPT_FLAG != 0;
        let code = (mcause & 0x7fff_ffff) as u32;
        let cause = classify(mcause);
        let latched = code | (u32::from(interrupt) << 31);

        self.delivered += 1;
        self.ctrl
            .csrs_mut()
            .backend_mut()
            .enter_trap(latched, self.pc, 0);

        if cause == TrapCause::Unhandled {
            let fault = handlers::fault_entry(&mut self.ctrl);
            self.state = HartState::Halted(fault);
            return;
        }

        handlers::dispatch(&mut self.ctrl, cause);
        self.ctrl.csrs_mut().backend_mut().mret();
    }
}

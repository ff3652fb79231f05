//! Interrupt arming control and controller state.
//!
//! [`InterruptController`] is the per-hart context: it owns the register
//! backend, the initialization flag, the trap statistics and the last fault
//! record. Normal program context arms and disarms sources through it; trap
//! context reaches it only through the [`TrapSink`] capability.
//!
//! On a single hart the two contexts never overlap in time, because trap
//! entry clears `mstatus.MIE` and handlers leave it cleared. That is the only
//! synchronization this type relies on. Multi-hart targets give each hart its
//! own controller and merge statistics for reporting.

use crate::cause::{InterruptSource, TrapCause};
use crate::csr::{CsrAccess, CsrFile, CsrSelector};
use crate::handlers::{FaultRecord, TrapSink};
use crate::stats::TrapStatistics;
use rvtrap_common::bits::{MIP_MSIP, MSTATUS_MIE};

/// Machine-mode interrupt controller for one hart.
#[derive(Debug)]
pub struct InterruptController<A> {
    csrs: CsrFile<A>,
    initialized: bool,
    stats: TrapStatistics,
    last_fault: Option<FaultRecord>,
}

impl<A: CsrAccess> InterruptController<A> {
    /// Wraps a register backend. No register is touched until [`init`].
    ///
    /// [`init`]: InterruptController::init
    pub const fn new(hw: A) -> Self {
        Self {
            csrs: CsrFile::new(hw),
            initialized: false,
            stats: TrapStatistics::new(),
            last_fault: None,
        }
    }

    /// Clears every enable and pending bit and resets statistics.
    ///
    /// Runs once; later calls leave all state untouched.
    pub fn init(&mut self) {
        if self.initialized {
            return;
        }
        self.csrs.write(CsrSelector::Mie, 0);
        self.csrs.write(CsrSelector::Mip, 0);
        self.reset_stats();
        self.initialized = true;
    }

    /// True once [`init`](InterruptController::init) has run.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Sets `mstatus.MIE`. Every other `mstatus` bit is preserved.
    pub fn enable_global(&mut self) {
        self.csrs.set_bits(CsrSelector::Mstatus, MSTATUS_MIE);
    }

    /// Clears `mstatus.MIE`. Every other `mstatus` bit is preserved.
    pub fn disable_global(&mut self) {
        self.csrs.clear_bits(CsrSelector::Mstatus, MSTATUS_MIE);
    }

    pub fn global_enabled(&self) -> bool {
        self.csrs.read(CsrSelector::Mstatus) & MSTATUS_MIE != 0
    }

    /// Arms one machine interrupt source.
    ///
    /// # Arguments
    ///
    /// * `src` - The source whose `mie` bit is set. Other enable bits are
    ///   left as they are.
    pub fn enable_source(&mut self, src: InterruptSource) {
        self.csrs.set_bits(CsrSelector::Mie, src.enable_mask());
    }

    /// Disarms one machine interrupt source, leaving the others armed.
    pub fn disable_source(&mut self, src: InterruptSource) {
        self.csrs.clear_bits(CsrSelector::Mie, src.enable_mask());
    }

    pub fn source_enabled(&self, src: InterruptSource) -> bool {
        self.csrs.read(CsrSelector::Mie) & src.enable_mask() != 0
    }

    /// Reports whether the `mip` line of `src` is raised, armed or not.
    pub fn pending(&self, src: InterruptSource) -> bool {
        self.csrs.read(CsrSelector::Mip) & src.pending_mask() != 0
    }

    /// Raises the machine software interrupt on this hart.
    pub fn trigger_software(&mut self) {
        self.csrs.set_bits(CsrSelector::Mip, MIP_MSIP);
    }

    /// Acknowledges the machine software interrupt by clearing `mip.MSIP`.
    pub fn clear_software(&mut self) {
        self.csrs.clear_bits(CsrSelector::Mip, MIP_MSIP);
    }

    /// Snapshot of the trap counters.
    ///
    /// # Returns
    ///
    /// A copy; later traps do not change it.
    pub fn stats(&self) -> TrapStatistics {
        self.stats
    }

    /// Zeroes all seven counters. Register state is not touched.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// Registers captured by the most recent unrecognized trap.
    pub fn last_fault(&self) -> Option<FaultRecord> {
        self.last_fault
    }

    /// The capability-checked register file behind this controller.
    pub fn csrs(&self) -> &CsrFile<A> {
        &self.csrs
    }

    pub fn csrs_mut(&mut self) -> &mut CsrFile<A> {
        &mut self.csrs
    }
}

impl<A: CsrAccess> TrapSink for InterruptController<A> {
    fn record(&mut self, cause: TrapCause) {
        self.stats.record(cause);
    }

    fn clear_software(&mut self) {
        InterruptController::clear_software(self);
    }

    fn disable_global(&mut self) {
        InterruptController::disable_global(self);
    }

    fn capture_fault(&mut self) -> FaultRecord {
        let fault = FaultRecord {
            mcause: self.csrs.read(CsrSelector::Mcause),
            mepc: self.csrs.read(CsrSelector::Mepc),
            mtval: self.csrs.read(CsrSelector::Mtval),
        };
        self.last_fault = Some(fault);
        fault
    }

    fn wait_for_interrupt(&mut self) {
        self.csrs.wait_for_interrupt();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers;
    use crate::shadow::ShadowCsrFile;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rvtrap_common::bits::{MIE_MTIE, MIP_MEIP};
    use std::panic::{AssertUnwindSafe, catch_unwind};

    type Shadowed = InterruptController<ShadowCsrFile>;

    fn fresh() -> Shadowed {
        let mut ctrl = InterruptController::new(ShadowCsrFile::new());
        ctrl.init();
        ctrl
    }

    fn peek(ctrl: &Shadowed, csr: CsrSelector) -> u32 {
        ctrl.csrs().backend().peek(csr)
    }

    fn poke(ctrl: &mut Shadowed, csr: CsrSelector, value: u32) {
        ctrl.csrs_mut().backend_mut().poke(csr, value);
    }

    fn run_handler(ctrl: &mut Shadowed, cause: TrapCause) {
        handlers::dispatch(ctrl, cause);
    }

    #[test]
    fn init_clears_enable_and_pending() {
        let mut ctrl = InterruptController::new(ShadowCsrFile::new());
        poke(&mut ctrl, CsrSelector::Mie, 0xffff_ffff);
        poke(&mut ctrl, CsrSelector::Mip, MIP_MSIP);
        ctrl.record(TrapCause::MachineTimer);
        assert!(!ctrl.is_initialized());

        ctrl.init();
        assert!(ctrl.is_initialized());
        assert_eq!(peek(&ctrl, CsrSelector::Mie), 0);
        assert_eq!(peek(&ctrl, CsrSelector::Mip), 0);
        assert_eq!(ctrl.stats(), TrapStatistics::default());
    }

    #[test]
    fn second_init_is_a_no_op() {
        let mut ctrl = fresh();
        ctrl.enable_source(InterruptSource::MachineTimer);
        run_handler(&mut ctrl, TrapCause::SupervisorTimer);
        let stats = ctrl.stats();

        ctrl.init();
        assert!(ctrl.is_initialized());
        assert_eq!(ctrl.stats(), stats);
        assert_eq!(peek(&ctrl, CsrSelector::Mie), MIE_MTIE);
    }

    #[test]
    fn global_enable_touches_only_mie_bit() {
        let mut ctrl = fresh();
        poke(&mut ctrl, CsrSelector::Mstatus, 0x0000_1880);
        poke(&mut ctrl, CsrSelector::Mie, 0x0000_0888);

        ctrl.enable_global();
        assert!(ctrl.global_enabled());
        assert_eq!(peek(&ctrl, CsrSelector::Mstatus), 0x0000_1888);
        ctrl.disable_global();
        assert!(!ctrl.global_enabled());
        assert_eq!(peek(&ctrl, CsrSelector::Mstatus), 0x0000_1880);
        assert_eq!(peek(&ctrl, CsrSelector::Mie), 0x0000_0888);
    }

    #[test]
    fn source_arming_preserves_other_bits() {
        let mut rng = StdRng::seed_from_u64(0x7ea9);
        for _ in 0..256 {
            let mut ctrl = fresh();
            let before: u32 = rng.r#gen();
            poke(&mut ctrl, CsrSelector::Mie, before);

            ctrl.enable_source(InterruptSource::MachineTimer);
            assert_eq!(peek(&ctrl, CsrSelector::Mie), before | (1 << 7));
            ctrl.disable_source(InterruptSource::MachineTimer);
            assert_eq!(peek(&ctrl, CsrSelector::Mie), before & !(1 << 7));

            for src in InterruptSource::ALL {
                poke(&mut ctrl, CsrSelector::Mie, before);
                ctrl.enable_source(src);
                assert!(ctrl.source_enabled(src));
                assert_eq!(peek(&ctrl, CsrSelector::Mie) & !src.enable_mask(), before & !src.enable_mask());
                ctrl.disable_source(src);
                assert!(!ctrl.source_enabled(src));
                assert_eq!(peek(&ctrl, CsrSelector::Mie) & !src.enable_mask(), before & !src.enable_mask());
            }
        }
    }

    #[test]
    fn software_signal_leaves_device_lines_alone() {
        let mut ctrl = fresh();
        ctrl.csrs_mut().backend_mut().raise_pending(MIP_MEIP);

        ctrl.trigger_software();
        assert!(ctrl.pending(InterruptSource::MachineSoftware));
        assert!(ctrl.pending(InterruptSource::MachineExternal));
        ctrl.clear_software();
        assert!(!ctrl.pending(InterruptSource::MachineSoftware));
        assert_eq!(peek(&ctrl, CsrSelector::Mip), MIP_MEIP);
    }

    #[test]
    fn each_handler_bumps_exactly_one_counter() {
        let mut rng = StdRng::seed_from_u64(0xc0de);
        let mut ctrl = fresh();
        for _ in 0..500 {
            let cause = TrapCause::ALL[rng.gen_range(0..6)];
            let before = ctrl.stats();
            run_handler(&mut ctrl, cause);
            let after = ctrl.stats();
            for other in TrapCause::ALL {
                let delta = after.count(other) - before.count(other);
                assert_eq!(delta, u32::from(other == cause), "{cause} changed {other}");
            }
        }
    }

    #[test]
    fn reset_after_any_sequence_reads_zero() {
        let mut rng = StdRng::seed_from_u64(0x2e5e7);
        for _ in 0..32 {
            let mut ctrl = fresh();
            ctrl.enable_global();
            for _ in 0..rng.gen_range(0..64) {
                run_handler(&mut ctrl, TrapCause::ALL[rng.gen_range(0..6)]);
            }
            ctrl.reset_stats();
            assert_eq!(ctrl.stats(), TrapStatistics::default());
            assert!(ctrl.global_enabled());
        }
    }

    #[test]
    fn software_interrupt_round_trip() {
        let mut ctrl = fresh();
        run_handler(&mut ctrl, TrapCause::MachineSoftware);
        let before = ctrl.stats().machine_software;

        ctrl.trigger_software();
        assert_eq!(peek(&ctrl, CsrSelector::Mip) & MIP_MSIP, MIP_MSIP);
        run_handler(&mut ctrl, TrapCause::MachineSoftware);

        assert_eq!(peek(&ctrl, CsrSelector::Mip) & MIP_MSIP, 0);
        assert_eq!(ctrl.stats().machine_software, before + 1);
    }

    #[test]
    fn armed_software_interrupt_scenario() {
        let mut ctrl = fresh();
        assert_eq!(ctrl.stats(), TrapStatistics::default());
        assert_eq!(peek(&ctrl, CsrSelector::Mie), 0);
        assert_eq!(peek(&ctrl, CsrSelector::Mip), 0);

        ctrl.enable_source(InterruptSource::MachineSoftware);
        ctrl.enable_global();
        ctrl.trigger_software();
        run_handler(&mut ctrl, TrapCause::MachineSoftware);

        let stats = ctrl.stats();
        assert_eq!(stats.machine_software, 1);
        assert_eq!(stats.total(), 1);
        assert_eq!(peek(&ctrl, CsrSelector::Mip) & (1 << 3), 0);
    }

    #[test]
    fn catch_all_disables_interrupts_and_never_returns() {
        let mut ctrl = InterruptController::new(ShadowCsrFile::new().with_wfi_limit(3));
        ctrl.init();
        ctrl.enable_global();
        ctrl.enable_source(InterruptSource::MachineSoftware);
        ctrl.csrs_mut().backend_mut().latch_trap(2, 0x8000_2000, 0x0000_0073);

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            handlers::unhandled_exception(&mut ctrl);
        }));

        assert!(outcome.is_err());
        assert!(!ctrl.global_enabled());
        assert!(ctrl.source_enabled(InterruptSource::MachineSoftware));
        assert_eq!(ctrl.csrs().backend().wfi_count(), 3);
        assert_eq!(ctrl.stats().unhandled, 1);
        assert_eq!(ctrl.stats().total(), 1);
        assert_eq!(
            ctrl.last_fault(),
            Some(FaultRecord {
                mcause: 2,
                mepc: 0x8000_2000,
                mtval: 0x73,
            })
        );
    }
}

//! In-memory register file standing in for a hart's machine CSRs.
//!
//! Used by the host simulator and by unit tests. Besides the [`CsrAccess`]
//! operations it exposes the hardware side of the registers: trap entry and
//! `mret`, device-driven pending lines, and instrumentation of
//! wait-for-interrupt.

use crate::csr::{CsrAccess, CsrSelector};
use rvtrap_common::bits::{MIP_MEIP, MIP_MTIP, MSTATUS_MIE, MSTATUS_MPIE};

/// Pending bits that only devices may change.
const MIP_HARDWARE_DRIVEN: u32 = MIP_MTIP | MIP_MEIP;

/// Simulated machine CSRs of a single hart.
#[derive(Debug, Clone, Default)]
pub struct ShadowCsrFile {
    regs: [u32; 8],
    wfi_count: u32,
    wfi_limit: Option<u32>,
}

fn slot(csr: CsrSelector) -> usize {
    match csr {
        CsrSelector::Mstatus => 0,
        CsrSelector::Mie => 1,
        CsrSelector::Mtvec => 2,
        CsrSelector::Mscratch => 3,
        CsrSelector::Mepc => 4,
        CsrSelector::Mcause => 5,
        CsrSelector::Mtval => 6,
        CsrSelector::Mip => 7,
    }
}

impl ShadowCsrFile {
    pub const fn new() -> Self {
        Self {
            regs: [0; 8],
            wfi_count: 0,
            wfi_limit: None,
        }
    }

    /// Makes the `limit`-th wait-for-interrupt panic with "hart halted".
    ///
    /// Lets a test observe that a wait loop never returns without hanging.
    pub fn with_wfi_limit(mut self, limit: u32) -> Self {
        self.wfi_limit = Some(limit);
        self
    }

    pub fn wfi_count(&self) -> u32 {
        self.wfi_count
    }

    /// Current value of `csr`, regardless of its capability set.
    pub fn peek(&self, csr: CsrSelector) -> u32 {
        self.regs[slot(csr)]
    }

    /// Overwrites `csr` directly, regardless of its capability set.
    pub fn poke(&mut self, csr: CsrSelector, value: u32) {
        self.regs[slot(csr)] = value;
    }

    /// Writes the trap registers the way hardware does on trap entry.
    pub fn latch_trap(&mut self, mcause: u32, mepc: u32, mtval: u32) {
        self.poke(CsrSelector::Mcause, mcause);
        self.poke(CsrSelector::Mepc, mepc);
        self.poke(CsrSelector::Mtval, mtval);
    }

    /// Trap entry: `MPIE <- MIE`, `MIE <- 0`, then latch the trap registers.
    pub fn enter_trap(&mut self, mcause: u32, mepc: u32, mtval: u32) {
        let status = self.peek(CsrSelector::Mstatus);
        let mpie = if status & MSTATUS_MIE != 0 { MSTATUS_MPIE } else { 0 };
        self.poke(
            CsrSelector::Mstatus,
            (status & !(MSTATUS_MIE | MSTATUS_MPIE)) | mpie,
        );
        self.latch_trap(mcause, mepc, mtval);
    }

    /// `mret`: `MIE <- MPIE`, `MPIE <- 1`.
    pub fn mret(&mut self) {
        let status = self.peek(CsrSelector::Mstatus);
        let mie = if status & MSTATUS_MPIE != 0 { MSTATUS_MIE } else { 0 };
        self.poke(
            CsrSelector::Mstatus,
            (status & !MSTATUS_MIE) | mie | MSTATUS_MPIE,
        );
    }

    /// Device side of a pending line (timer comparator, PLIC).
    pub fn raise_pending(&mut self, mask: u32) {
        self.regs[slot(CsrSelector::Mip)] |= mask;
    }

    pub fn lower_pending(&mut self, mask: u32) {
        self.regs[slot(CsrSelector::Mip)] &= !mask;
    }

    fn software_writable(csr: CsrSelector) -> u32 {
        match csr {
            CsrSelector::Mip => !MIP_HARDWARE_DRIVEN,
            _ => u32::MAX,
        }
    }
}

impl CsrAccess for ShadowCsrFile {
    fn read_raw(&self, csr: CsrSelector) -> u32 {
        self.peek(csr)
    }

    fn write_raw(&mut self, csr: CsrSelector, value: u32) {
        let writable = Self::software_writable(csr);
        let reg = &mut self.regs[slot(csr)];
        *reg = (*reg & !writable) | (value & writable);
    }

    fn set_raw(&mut self, csr: CsrSelector, mask: u32) {
        self.regs[slot(csr)] |= mask & Self::software_writable(csr);
    }

    fn clear_raw(&mut self, csr: CsrSelector, mask: u32) {
        self.regs[slot(csr)] &= !(mask & Self::software_writable(csr));
    }

    fn wait_for_interrupt(&mut self) {
        self.wfi_count = self.wfi_count.saturating_add(1);
        if self.wfi_limit.is_some_and(|limit| self.wfi_count >= limit) {
            panic!("hart halted after {} wait-for-interrupt calls", self.wfi_count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rvtrap_common::bits::MIP_MSIP;

    #[test]
    fn device_pending_bits_ignore_software_writes() {
        let mut shadow = ShadowCsrFile::new();
        shadow.set_raw(CsrSelector::Mip, MIP_MTIP | MIP_MSIP);
        assert_eq!(shadow.peek(CsrSelector::Mip), MIP_MSIP);

        shadow.raise_pending(MIP_MEIP);
        shadow.write_raw(CsrSelector::Mip, 0);
        assert_eq!(shadow.peek(CsrSelector::Mip), MIP_MEIP);

        shadow.lower_pending(MIP_MEIP);
        assert_eq!(shadow.peek(CsrSelector::Mip), 0);
    }

    #[test]
    fn trap_entry_and_mret_swap_interrupt_enable() {
        let mut shadow = ShadowCsrFile::new();
        shadow.poke(CsrSelector::Mstatus, MSTATUS_MIE);

        shadow.enter_trap(0x8000_0003, 0x8000_0100, 0);
        assert_eq!(shadow.peek(CsrSelector::Mstatus), MSTATUS_MPIE);
        assert_eq!(shadow.peek(CsrSelector::Mcause), 0x8000_0003);
        assert_eq!(shadow.peek(CsrSelector::Mepc), 0x8000_0100);

        shadow.mret();
        assert_eq!(shadow.peek(CsrSelector::Mstatus), MSTATUS_MIE | MSTATUS_MPIE);
    }

    #[test]
    #[should_panic(expected = "hart halted")]
    fn wfi_limit_unwinds() {
        let mut shadow = ShadowCsrFile::new().with_wfi_limit(2);
        shadow.wait_for_interrupt();
        shadow.wait_for_interrupt();
    }
}

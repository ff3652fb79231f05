//! Machine CSR backend for the running hart.
//!
//! Implements the raw register operations with single `csrr`/`csrw`/`csrs`/
//! `csrc` instructions, reading through the `riscv` crate where it exposes
//! the register. Values are truncated to the low 32 bits, which hold every
//! bit this layer cares about.
//!
//! On QEMU 'virt' the `mip.MSIP` bit is read-only to CSR instructions and is
//! driven by the CLINT instead, so software-interrupt set/clear on `mip` is
//! routed to the hart's CLINT MSIP register.

use core::arch::asm;
use riscv::register::{mcause, mepc, mie, mip, mscratch, mtval};
use rvtrap_common::bits::MIP_MSIP;
use rvtrap_common::mmio::MSIP_ADDR;
use rvtrap_core::{CsrAccess, CsrSelector};

macro_rules! csr_insn {
    ($insn:literal, $csr:expr, $value:expr) => {{
        let value = $value as usize;
        // SAFETY: machine-mode firmware owns these registers; callers have
        // already checked the selector's capability set.
        unsafe {
            match $csr {
                CsrSelector::Mstatus => asm!(concat!($insn, " mstatus, {0}"), in(reg) value),
                CsrSelector::Mie => asm!(concat!($insn, " mie, {0}"), in(reg) value),
                CsrSelector::Mtvec => asm!(concat!($insn, " mtvec, {0}"), in(reg) value),
                CsrSelector::Mscratch => asm!(concat!($insn, " mscratch, {0}"), in(reg) value),
                CsrSelector::Mepc => asm!(concat!($insn, " mepc, {0}"), in(reg) value),
                CsrSelector::Mcause => asm!(concat!($insn, " mcause, {0}"), in(reg) value),
                CsrSelector::Mtval => asm!(concat!($insn, " mtval, {0}"), in(reg) value),
                CsrSelector::Mip => asm!(concat!($insn, " mip, {0}"), in(reg) value),
            }
        }
    }};
}

/// Writes the hart 0 CLINT software interrupt line.
fn set_msip_line(raised: bool) {
    // SAFETY: MSIP_ADDR is the CLINT MSIP word for hart 0 on QEMU 'virt'.
    unsafe { (MSIP_ADDR as *mut u32).write_volatile(u32::from(raised)) };
}

/// The current hart's machine CSRs.
pub struct MachineCsrs;

impl CsrAccess for MachineCsrs {
    fn read_raw(&self, csr: CsrSelector) -> u32 {
        let value: usize = match csr {
            CsrSelector::Mstatus => {
                let bits: usize;
                // SAFETY: reading mstatus has no side effects.
                unsafe { asm!("csrr {0}, mstatus", out(reg) bits) };
                bits
            }
            CsrSelector::Mtvec => {
                let bits: usize;
                // SAFETY: reading mtvec has no side effects.
                unsafe { asm!("csrr {0}, mtvec", out(reg) bits) };
                bits
            }
            CsrSelector::Mie => mie::read().bits(),
            CsrSelector::Mip => mip::read().bits(),
            CsrSelector::Mscratch => mscratch::read(),
            CsrSelector::Mepc => mepc::read(),
            CsrSelector::Mcause => mcause::read().bits(),
            CsrSelector::Mtval => mtval::read(),
        };
        value as u32
    }

    fn write_raw(&mut self, csr: CsrSelector, value: u32) {
        if csr == CsrSelector::Mip {
            set_msip_line(value & MIP_MSIP != 0);
        }
        csr_insn!("csrw", csr, value);
    }

    fn set_raw(&mut self, csr: CsrSelector, mask: u32) {
        if csr == CsrSelector::Mip && mask & MIP_MSIP != 0 {
            set_msip_line(true);
        }
        csr_insn!("csrs", csr, mask);
    }

    fn clear_raw(&mut self, csr: CsrSelector, mask: u32) {
        if csr == CsrSelector::Mip && mask & MIP_MSIP != 0 {
            set_msip_line(false);
        }
        csr_insn!("csrc", csr, mask);
    }

    fn wait_for_interrupt(&mut self) {
        // SAFETY: wfi only stalls the hart.
        unsafe { riscv::asm::wfi() };
    }
}

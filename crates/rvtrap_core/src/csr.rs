//! Typed access to the machine-level control-and-status registers.
//!
//! The trap layer may only touch the registers named by [`CsrSelector`], and
//! each register declares which of the four primitive operations it accepts.
//! [`CsrFile`] enforces that table on top of a raw [`CsrAccess`] backend: the
//! `try_*` operations report a [`CsrError`], while the plain operations stay
//! silent (read as zero, drop the mutation) for callers that rely on the
//! defensive behavior.

use crate::CsrError;
use bitflags::bitflags;
use rvtrap_common::csr;

bitflags! {
    /// Operations a register accepts through this layer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capabilities: u8 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const SET_BITS = 1 << 2;
        const CLEAR_BITS = 1 << 3;
    }
}

/// One of the four primitive register operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsrOp {
    Read,
    Write,
    SetBits,
    ClearBits,
}

impl CsrOp {
    /// Capability bit an operation requires.
    pub const fn capability(self) -> Capabilities {
        match self {
            CsrOp::Read => Capabilities::READ,
            CsrOp::Write => Capabilities::WRITE,
            CsrOp::SetBits => Capabilities::SET_BITS,
            CsrOp::ClearBits => Capabilities::CLEAR_BITS,
        }
    }
}

/// Closed set of registers the trap layer is permitted to touch.
///
/// The discriminant is the hardware CSR number.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CsrSelector {
    Mstatus = csr::MSTATUS,
    Mie = csr::MIE,
    Mtvec = csr::MTVEC,
    Mscratch = csr::MSCRATCH,
    Mepc = csr::MEPC,
    Mcause = csr::MCAUSE,
    Mtval = csr::MTVAL,
    Mip = csr::MIP,
}

impl CsrSelector {
    /// Every selector, in CSR number order.
    pub const ALL: [CsrSelector; 8] = [
        CsrSelector::Mstatus,
        CsrSelector::Mie,
        CsrSelector::Mtvec,
        CsrSelector::Mscratch,
        CsrSelector::Mepc,
        CsrSelector::Mcause,
        CsrSelector::Mtval,
        CsrSelector::Mip,
    ];

    pub const fn address(self) -> u16 {
        self as u16
    }

    /// Looks up a selector by its CSR number.
    pub fn from_address(address: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|csr| csr.address() == address)
    }

    /// Looks up a selector by its assembler name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|csr| csr.name() == name)
    }

    /// Assembler name of the register.
    pub const fn name(self) -> &'static str {
        match self {
            CsrSelector::Mstatus => "mstatus",
            CsrSelector::Mie => "mie",
            CsrSelector::Mtvec => "mtvec",
            CsrSelector::Mscratch => "mscratch",
            CsrSelector::Mepc => "mepc",
            CsrSelector::Mcause => "mcause",
            CsrSelector::Mtval => "mtval",
            CsrSelector::Mip => "mip",
        }
    }

    /// Declared capability set of the register.
    ///
    /// `mcause` and `mtval` are written by hardware on trap entry and are
    /// read-only here. Only the three interrupt-control registers accept
    /// bit-level set and clear.
    pub const fn capabilities(self) -> Capabilities {
        let rw = Capabilities::READ.union(Capabilities::WRITE);
        match self {
            CsrSelector::Mstatus | CsrSelector::Mie | CsrSelector::Mip => Capabilities::all(),
            CsrSelector::Mepc | CsrSelector::Mtvec | CsrSelector::Mscratch => rw,
            CsrSelector::Mcause | CsrSelector::Mtval => Capabilities::READ,
        }
    }

    pub const fn supports(self, op: CsrOp) -> bool {
        self.capabilities().contains(op.capability())
    }
}

impl core::fmt::Display for CsrSelector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw register backend.
///
/// Implemented by the firmware with `csrr`/`csrw`/`csrs`/`csrc` and by
/// [`ShadowCsrFile`](crate::shadow::ShadowCsrFile) in memory. Callers go
/// through [`CsrFile`], which guarantees that the selector declares the
/// capability before any of the raw methods is reached. Each method must be
/// a single instruction on hardware so no trap observes a half-applied
/// pattern.
pub trait CsrAccess {
    fn read_raw(&self, csr: CsrSelector) -> u32;
    fn write_raw(&mut self, csr: CsrSelector, value: u32);
    fn set_raw(&mut self, csr: CsrSelector, mask: u32);
    fn clear_raw(&mut self, csr: CsrSelector, mask: u32);

    /// Stalls the hart until an interrupt may be pending.
    ///
    /// May return spuriously; callers loop around it.
    fn wait_for_interrupt(&mut self);
}

/// Capability-checked view of a register backend.
#[derive(Debug, Default)]
pub struct CsrFile<A> {
    hw: A,
}

impl<A: CsrAccess> CsrFile<A> {
    pub const fn new(hw: A) -> Self {
        Self { hw }
    }

    /// Verifies that `csr` accepts `op`.
    pub fn check(csr: CsrSelector, op: CsrOp) -> Result<(), CsrError> {
        if csr.supports(op) {
            Ok(())
        } else {
            Err(CsrError::Unsupported { csr, op })
        }
    }

    pub fn try_read(&self, csr: CsrSelector) -> Result<u32, CsrError> {
        Self::check(csr, CsrOp::Read)?;
        Ok(self.hw.read_raw(csr))
    }

    pub fn try_write(&mut self, csr: CsrSelector, value: u32) -> Result<(), CsrError> {
        Self::check(csr, CsrOp::Write)?;
        self.hw.write_raw(csr, value);
        Ok(())
    }

    /// Writes `value` and reads it back.
    ///
    /// # Returns
    ///
    /// The value read back, or [`CsrError::Rejected`] when the register
    /// legalized the write to something else.
    pub fn try_write_verified(&mut self, csr: CsrSelector, value: u32) -> Result<u32, CsrError> {
        self.try_write(csr, value)?;
        let read = self.try_read(csr)?;
        if read != value {
            return Err(CsrError::Rejected {
                csr,
                wrote: value,
                read,
            });
        }
        Ok(read)
    }

    pub fn try_set_bits(&mut self, csr: CsrSelector, mask: u32) -> Result<(), CsrError> {
        Self::check(csr, CsrOp::SetBits)?;
        self.hw.set_raw(csr, mask);
        Ok(())
    }

    pub fn try_clear_bits(&mut self, csr: CsrSelector, mask: u32) -> Result<(), CsrError> {
        Self::check(csr, CsrOp::ClearBits)?;
        self.hw.clear_raw(csr, mask);
        Ok(())
    }

    /// Reads `csr`, or 0 when it is not readable.
    pub fn read(&self, csr: CsrSelector) -> u32 {
        self.try_read(csr).unwrap_or(0)
    }

    /// Replaces `csr`. Dropped when it is not writable.
    pub fn write(&mut self, csr: CsrSelector, value: u32) {
        let _ = self.try_write(csr, value);
    }

    /// ORs `mask` into `csr`. Dropped when unsupported.
    pub fn set_bits(&mut self, csr: CsrSelector, mask: u32) {
        let _ = self.try_set_bits(csr, mask);
    }

    /// Clears the bits of `mask` in `csr`. Dropped when unsupported.
    pub fn clear_bits(&mut self, csr: CsrSelector, mask: u32) {
        let _ = self.try_clear_bits(csr, mask);
    }

    pub fn wait_for_interrupt(&mut self) {
        self.hw.wait_for_interrupt();
    }

    /// The raw backend, for hardware-side hooks that bypass the capability
    /// table.
    pub fn backend(&self) -> &A {
        &self.hw
    }

    pub fn backend_mut(&mut self) -> &mut A {
        &mut self.hw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shadow::ShadowCsrFile;

    #[test]
    fn capability_table_matches_hardware_roles() {
        for csr in [CsrSelector::Mstatus, CsrSelector::Mie, CsrSelector::Mip] {
            assert_eq!(csr.capabilities(), Capabilities::all());
        }
        assert_eq!(CsrSelector::Mcause.capabilities(), Capabilities::READ);
        assert_eq!(CsrSelector::Mtval.capabilities(), Capabilities::READ);
        assert!(CsrSelector::Mepc.supports(CsrOp::Write));
        assert!(!CsrSelector::Mepc.supports(CsrOp::SetBits));
        assert!(!CsrSelector::Mtvec.supports(CsrOp::ClearBits));
    }

    #[test]
    fn selector_addresses_round_trip() {
        for csr in CsrSelector::ALL {
            assert_eq!(CsrSelector::from_address(csr.address()), Some(csr));
        }
        assert_eq!(CsrSelector::Mip.address(), 0x344);
        assert_eq!(CsrSelector::from_address(0x180), None);
        assert_eq!(CsrSelector::from_name("mtval"), Some(CsrSelector::Mtval));
        assert_eq!(CsrSelector::from_name("satp"), None);
    }

    #[test]
    fn unsupported_operations_are_silent() {
        let mut shadow = ShadowCsrFile::new();
        shadow.latch_trap(0x8000_0007, 0x8000_1000, 0xdead);
        let mut csrs = CsrFile::new(shadow);

        csrs.write(CsrSelector::Mcause, 0);
        csrs.set_bits(CsrSelector::Mtval, 0xffff_ffff);
        csrs.clear_bits(CsrSelector::Mepc, 0xffff_ffff);

        assert_eq!(csrs.read(CsrSelector::Mcause), 0x8000_0007);
        assert_eq!(csrs.read(CsrSelector::Mtval), 0xdead);
        assert_eq!(csrs.read(CsrSelector::Mepc), 0x8000_1000);
    }

    #[test]
    fn checked_operations_report_the_missing_capability() {
        let mut csrs = CsrFile::new(ShadowCsrFile::new());
        assert_eq!(
            csrs.try_write(CsrSelector::Mcause, 1),
            Err(CsrError::Unsupported {
                csr: CsrSelector::Mcause,
                op: CsrOp::Write,
            })
        );
        assert_eq!(
            csrs.try_set_bits(CsrSelector::Mscratch, 1),
            Err(CsrError::Unsupported {
                csr: CsrSelector::Mscratch,
                op: CsrOp::SetBits,
            })
        );
        assert_eq!(csrs.try_write(CsrSelector::Mscratch, 0x1234), Ok(()));
        assert_eq!(csrs.try_read(CsrSelector::Mscratch), Ok(0x1234));
    }

    #[test]
    fn verified_write_detects_legalized_values() {
        let mut csrs = CsrFile::new(ShadowCsrFile::new());
        assert_eq!(csrs.try_write_verified(CsrSelector::Mtvec, 0x8000_0100), Ok(0x8000_0100));
        // MTIP is set by the timer comparator, never by software.
        assert_eq!(
            csrs.try_write_verified(CsrSelector::Mip, 1 << 7),
            Err(CsrError::Rejected {
                csr: CsrSelector::Mip,
                wrote: 1 << 7,
                read: 0,
            })
        );
        assert!(matches!(
            csrs.try_write_verified(CsrSelector::Mtval, 1),
            Err(CsrError::Unsupported { .. })
        ));
    }

    #[test]
    fn set_and_clear_preserve_other_bits() {
        let mut csrs = CsrFile::new(ShadowCsrFile::new());
        csrs.write(CsrSelector::Mie, 0b1010_0000);
        csrs.set_bits(CsrSelector::Mie, 0b0000_0101);
        assert_eq!(csrs.read(CsrSelector::Mie), 0b1010_0101);
        csrs.clear_bits(CsrSelector::Mie, 0b1000_0001);
        assert_eq!(csrs.read(CsrSelector::Mie), 0b0010_0100);
    }
}

//! Interrupt sources and trap causes.

use rvtrap_common::{bits, cause};

/// Machine-level interrupt source that can be armed by this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterruptSource {
    MachineSoftware,
    MachineTimer,
    MachineExternal,
}

impl InterruptSource {
    pub const ALL: [InterruptSource; 3] = [
        InterruptSource::MachineSoftware,
        InterruptSource::MachineTimer,
        InterruptSource::MachineExternal,
    ];

    /// Bit of this source in `mie`.
    pub const fn enable_mask(self) -> u32 {
        match self {
            InterruptSource::MachineSoftware => bits::MIE_MSIE,
            InterruptSource::MachineTimer => bits::MIE_MTIE,
            InterruptSource::MachineExternal => bits::MIE_MEIE,
        }
    }

    /// Bit of this source in `mip`.
    pub const fn pending_mask(self) -> u32 {
        match self {
            InterruptSource::MachineSoftware => bits::MIP_MSIP,
            InterruptSource::MachineTimer => bits::MIP_MTIP,
            InterruptSource::MachineExternal => bits::MIP_MEIP,
        }
    }

    /// Cause the hardware reports when this source traps.
    pub const fn cause(self) -> TrapCause {
        match self {
            InterruptSource::MachineSoftware => TrapCause::MachineSoftware,
            InterruptSource::MachineTimer => TrapCause::MachineTimer,
            InterruptSource::MachineExternal => TrapCause::MachineExternal,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            InterruptSource::MachineSoftware => "msoft",
            InterruptSource::MachineTimer => "mtimer",
            InterruptSource::MachineExternal => "mext",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|src| src.name() == name)
    }
}

/// Classification of a trap into one of the statistics counters.
///
/// The six interrupt causes the machine level recognizes, plus `Unhandled`
/// for every other cause code and for all synchronous exceptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrapCause {
    MachineSoftware,
    MachineTimer,
    MachineExternal,
    SupervisorSoftware,
    SupervisorTimer,
    SupervisorExternal,
    Unhandled,
}

impl TrapCause {
    pub const ALL: [TrapCause; 7] = [
        TrapCause::MachineSoftware,
        TrapCause::MachineTimer,
        TrapCause::MachineExternal,
        TrapCause::SupervisorSoftware,
        TrapCause::SupervisorTimer,
        TrapCause::SupervisorExternal,
        TrapCause::Unhandled,
    ];

    /// Classifies an interrupt cause code.
    pub const fn from_code(code: u32) -> Self {
        match code {
            cause::MACHINE_SOFTWARE => TrapCause::MachineSoftware,
            cause::MACHINE_TIMER => TrapCause::MachineTimer,
            cause::MACHINE_EXTERNAL => TrapCause::MachineExternal,
            cause::SUPERVISOR_SOFTWARE => TrapCause::SupervisorSoftware,
            cause::SUPERVISOR_TIMER => TrapCause::SupervisorTimer,
            cause::SUPERVISOR_EXTERNAL => TrapCause::SupervisorExternal,
            _ => TrapCause::Unhandled,
        }
    }

    /// Classifies a raw XLEN-wide `mcause` value.
    ///
    /// The most significant bit flags an interrupt. Exceptions are never
    /// recognized, even when their code collides with an interrupt code.
    pub const fn from_mcause(mcause: usize) -> Self {
        let flag = 1 << (usize::BITS - 1);
        Self::from_parts(mcause & flag != 0, (mcause & !flag) as u64)
    }

    /// Classifies an `mcause` already split into its interrupt flag and
    /// exception code, independently of the word size it was read at.
    pub const fn from_parts(interrupt: bool, code: u64) -> Self {
        if !interrupt || code > u32::MAX as u64 {
            return TrapCause::Unhandled;
        }
        Self::from_code(code as u32)
    }

    /// Hardware cause code, `None` for the catch-all.
    pub const fn code(self) -> Option<u32> {
        match self {
            TrapCause::MachineSoftware => Some(cause::MACHINE_SOFTWARE),
            TrapCause::MachineTimer => Some(cause::MACHINE_TIMER),
            TrapCause::MachineExternal => Some(cause::MACHINE_EXTERNAL),
            TrapCause::SupervisorSoftware => Some(cause::SUPERVISOR_SOFTWARE),
            TrapCause::SupervisorTimer => Some(cause::SUPERVISOR_TIMER),
            TrapCause::SupervisorExternal => Some(cause::SUPERVISOR_EXTERNAL),
            TrapCause::Unhandled => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            TrapCause::MachineSoftware => "machine software",
            TrapCause::MachineTimer => "machine timer",
            TrapCause::MachineExternal => "machine external",
            TrapCause::SupervisorSoftware => "supervisor software",
            TrapCause::SupervisorTimer => "supervisor timer",
            TrapCause::SupervisorExternal => "supervisor external",
            TrapCause::Unhandled => "unhandled",
        }
    }
}

impl core::fmt::Display for TrapCause {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

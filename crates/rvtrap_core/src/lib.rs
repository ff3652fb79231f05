//! Machine-mode interrupt and trap management for bare-metal RISC-V.
//!
//! This crate provides the register access layer, interrupt arming control,
//! trap statistics and dispatch handlers. All modules are `no_std` and are
//! shared by the firmware, which backs them with real CSR instructions, and
//! by the host simulator, which backs them with an in-memory register file.

#![cfg_attr(not(test), no_std)]

/// Interrupt sources and trap cause classification.
///
/// Maps each machine-level source to its enable bit, pending bit and cause
/// code, and classifies raw `mcause` values into the counters the
/// dispatcher keeps.
pub mod cause;

/// Interrupt arming control and per-hart controller state.
///
/// Owns the register backend, the initialization flag, the statistics and
/// the last captured fault. Exposes global and per-source enable control,
/// the software interrupt signal, and the statistics snapshot.
pub mod controller;

/// Capability-checked access to the machine CSRs.
///
/// The closed set of registers the trap layer may touch, the operations each
/// one declares, and the raw backend trait implemented by firmware and by
/// the shadow register file.
pub mod csr;

/// Trap dispatch handlers.
///
/// One handler per recognized cause plus the terminal catch-all, written
/// against the `TrapSink` capability rather than the controller itself.
pub mod handlers;

/// In-memory register file for host simulation and tests.
pub mod shadow;

/// Per-cause monotonic trap counters.
pub mod stats;

pub use cause::{InterruptSource, TrapCause};
pub use controller::InterruptController;
pub use csr::{CsrAccess, CsrFile, CsrOp, CsrSelector};
pub use handlers::{FaultRecord, TrapSink};
pub use stats::TrapStatistics;

/// Error types returned by the register access layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsrError {
    /// The register does not declare the requested operation.
    ///
    /// The unchecked operations swallow this error and act as a no-op (or
    /// read zero); the checked `try_*` operations return it so firmware
    /// mistakes surface during bring-up.
    Unsupported { csr: CsrSelector, op: CsrOp },
    /// A WARL register legalized a write to a different value.
    Rejected {
        csr: CsrSelector,
        wrote: u32,
        read: u32,
    },
}

impl core::fmt::Display for CsrError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CsrError::Unsupported { csr, op } => {
                write!(f, "{csr} does not support {op:?}")
            }
            CsrError::Rejected { csr, wrote, read } => {
                write!(f, "{csr} read back {read:#010x} after writing {wrote:#010x}")
            }
        }
    }
}

impl core::error::Error for CsrError {}

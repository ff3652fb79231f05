//! Fixed hardware numbers shared across the trap management workspace.
//!
//! Holds the RISC-V privileged-architecture CSR addresses, bit positions and
//! interrupt cause codes, plus the QEMU `virt` memory map used by the
//! firmware. Everything here is dictated by hardware convention and must not
//! change.

#![no_std]

/// Machine-level control-and-status register addresses.
///
/// These are the 12-bit CSR numbers encoded into `csrr`/`csrw` instructions
/// by the assembler. Only the registers the trap layer is allowed to touch
/// are listed.
pub mod csr {
    /// Machine status register.
    pub const MSTATUS: u16 = 0x300;

    /// Machine interrupt-enable register.
    pub const MIE: u16 = 0x304;

    /// Machine trap-vector base address register.
    pub const MTVEC: u16 = 0x305;

    /// Machine scratch register.
    pub const MSCRATCH: u16 = 0x340;

    /// Machine exception program counter.
    pub const MEPC: u16 = 0x341;

    /// Machine trap cause register.
    pub const MCAUSE: u16 = 0x342;

    /// Machine trap value register.
    pub const MTVAL: u16 = 0x343;

    /// Machine interrupt-pending register.
    pub const MIP: u16 = 0x344;
}

/// Bit masks inside the machine-level CSRs.
pub mod bits {
    /// Global machine interrupt enable in `mstatus`.
    ///
    /// Cleared by hardware on trap entry and restored from `MSTATUS_MPIE` by
    /// `mret`.
    pub const MSTATUS_MIE: u32 = 1 << 3;

    /// Previous interrupt enable in `mstatus`, saved on trap entry.
    pub const MSTATUS_MPIE: u32 = 1 << 7;

    /// Machine software interrupt enable in `mie`.
    pub const MIE_MSIE: u32 = 1 << 3;

    /// Machine timer interrupt enable in `mie`.
    pub const MIE_MTIE: u32 = 1 << 7;

    /// Machine external interrupt enable in `mie`.
    pub const MIE_MEIE: u32 = 1 << 11;

    /// Machine software interrupt pending in `mip`.
    ///
    /// The only pending bit this layer is allowed to set or clear. Timer and
    /// external pending bits are driven by their devices.
    pub const MIP_MSIP: u32 = 1 << 3;

    /// Machine timer interrupt pending in `mip`.
    pub const MIP_MTIP: u32 = 1 << 7;

    /// Machine external interrupt pending in `mip`.
    pub const MIP_MEIP: u32 = 1 << 11;
}

/// Interrupt cause codes delivered in the low bits of `mcause`.
pub mod cause {
    pub const SUPERVISOR_SOFTWARE: u32 = 1;
    pub const MACHINE_SOFTWARE: u32 = 3;
    pub const SUPERVISOR_TIMER: u32 = 5;
    pub const MACHINE_TIMER: u32 = 7;
    pub const SUPERVISOR_EXTERNAL: u32 = 9;
    pub const MACHINE_EXTERNAL: u32 = 11;
}

// Memory-mapped I/O address space of the QEMU 'virt' machine.
//
// Only the devices the firmware talks to are listed: the 16550 UART used by
// the console, the CLINT used for timer interrupts, and the SiFive test
// finisher used to end a QEMU run.
pub mod mmio {
    /// Base address of the CLINT (Core Local Interruptor) in QEMU 'virt' machine.
    ///
    /// The CLINT provides per-hart machine-mode timer interrupts and software
    /// interrupt generation. This address is standard for QEMU's RISC-V virt
    /// platform and must match the device tree configuration.
    pub const CLINT_BASE: usize = 0x200_0000;

    /// Memory-mapped software interrupt register for hart 0.
    ///
    /// Writing 1 raises `mip.MSIP` on the hart; writing 0 lowers it.
    pub const MSIP_ADDR: usize = CLINT_BASE;

    /// Memory-mapped address for the machine timer compare register.
    ///
    /// When the machine timer (MTIME) reaches this value, a timer interrupt
    /// is generated. Writing to this register schedules the next interrupt.
    /// Offset from CLINT_BASE is 0x4000 for hart 0, with 8-byte increments
    /// per additional hart.
    pub const MTIMECMP_ADDR: usize = CLINT_BASE + 0x4000;

    /// Memory-mapped address for the machine timer counter register.
    ///
    /// This 64-bit read-only register increments at a fixed frequency (10 MHz
    /// in QEMU).
    pub const MTIME_ADDR: usize = CLINT_BASE + 0xBFF8;

    /// Timer ticks per second on QEMU 'virt'.
    pub const MTIME_FREQ: u64 = 10_000_000;

    /// Base address of the 16550-compatible UART.
    pub const UART0_BASE: usize = 0x1000_0000;

    /// Transmit holding register offset.
    pub const UART_THR: usize = 0x00;

    /// Line status register offset.
    pub const UART_LSR: usize = 0x05;

    /// Line status bit set when the transmit holding register is empty.
    pub const UART_LSR_THRE: u8 = 0x20;

    /// SiFive test finisher. Writing `FINISHER_PASS` ends the QEMU run.
    pub const TEST_FINISHER: usize = 0x10_0000;
    pub const FINISHER_PASS: u32 = 0x5555;
    pub const FINISHER_FAIL: u32 = 0x3333;
}

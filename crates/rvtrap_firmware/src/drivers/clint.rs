//! CLINT machine timer driver.
//!
//! The timer interrupt line stays raised while `mtime >= mtimecmp`, so the
//! trap handler alone cannot acknowledge it. This driver owns the comparator:
//! it schedules the first tick and pushes the comparator one period ahead on
//! every timer trap.

use rvtrap_common::mmio::{MTIME_ADDR, MTIMECMP_ADDR};

/// Core Local Interruptor timer for hart 0.
pub struct Clint;

impl Clint {
    /// Current value of the free-running machine timer.
    pub fn now() -> u64 {
        // SAFETY: MTIME_ADDR is the CLINT mtime register on QEMU 'virt'.
        unsafe { (MTIME_ADDR as *const u64).read_volatile() }
    }

    /// Sets the comparator `ticks` past the current time.
    pub fn schedule_in(ticks: u64) {
        let deadline = Self::now().wrapping_add(ticks);
        // SAFETY: MTIMECMP_ADDR is hart 0's comparator on QEMU 'virt'.
        unsafe { (MTIMECMP_ADDR as *mut u64).write_volatile(deadline) };
    }

    /// Lowers the timer line by moving the comparator one period ahead.
    ///
    /// Called from trap context after the timer handler has counted the trap.
    pub fn acknowledge_timer(period: u64) {
        Self::schedule_in(period);
    }

    /// Parks the comparator at the end of time, lowering the line for good.
    pub fn disarm() {
        // SAFETY: as in `schedule_in`.
        unsafe { (MTIMECMP_ADDR as *mut u64).write_volatile(u64::MAX) };
    }
}

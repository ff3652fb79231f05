//! UART console implementation for firmware diagnostic output.
//!
//! Writes to the 16550-compatible UART of the QEMU 'virt' machine, waiting
//! for the transmit holding register to drain before each byte. Output is
//! serialized by a spinlock. Trap handlers never print, so the lock is only
//! taken from normal context.

use core::cell::UnsafeCell;
use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};
use rvtrap_common::mmio::{UART_LSR, UART_LSR_THRE, UART_THR, UART0_BASE};

/// Spinlock for mutual exclusion in no_std environments.
///
/// The lock is released automatically when the guard is dropped.
pub struct SpinLock<T> {
    lock: AtomicBool,
    data: UnsafeCell<T>,
}

unsafe impl<T: Send> Sync for SpinLock<T> {}

impl<T> SpinLock<T> {
    pub const fn new(data: T) -> Self {
        Self {
            lock: AtomicBool::new(false),
            data: UnsafeCell::new(data),
        }
    }

    /// Acquires the lock, returning a guard that releases it on drop.
    pub fn lock(&self) -> SpinLockGuard<'_, T> {
        while self
            .lock
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            core::hint::spin_loop();
        }
        SpinLockGuard { lock: self }
    }
}

pub struct SpinLockGuard<'a, T> {
    lock: &'a SpinLock<T>,
}

impl<'a, T> core::ops::Deref for SpinLockGuard<'a, T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<'a, T> core::ops::DerefMut for SpinLockGuard<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<'a, T> Drop for SpinLockGuard<'a, T> {
    fn drop(&mut self) {
        self.lock.lock.store(false, Ordering::Release);
    }
}

/// UART device interface for formatted output.
///
/// Implements fmt::Write to enable formatted printing via the write! macro.
/// Converts LF to CRLF for serial terminals.
pub struct Uart;

impl Uart {
    fn put_byte(byte: u8) {
        let lsr = (UART0_BASE + UART_LSR) as *const u8;
        let thr = (UART0_BASE + UART_THR) as *mut u8;
        // SAFETY: fixed UART registers of the QEMU 'virt' machine.
        unsafe {
            while lsr.read_volatile() & UART_LSR_THRE == 0 {
                core::hint::spin_loop();
            }
            thr.write_volatile(byte);
        }
    }
}

impl fmt::Write for Uart {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.bytes() {
            if c == b'\n' {
                Self::put_byte(b'\r');
            }
            Self::put_byte(c);
        }
        Ok(())
    }
}

static CONSOLE: SpinLock<Uart> = SpinLock::new(Uart);

/// Initializes the console subsystem.
///
/// QEMU's UART comes out of reset ready to transmit; nothing to program.
pub fn init() {}

#[doc(hidden)]
pub fn _print(args: fmt::Arguments) {
    use fmt::Write;
    let mut uart = CONSOLE.lock();
    let _ = uart.write_fmt(args);
}

/// Prints a line to the console.
///
/// # Example
///
/// ```ignore
/// println!("Value: {}", 42);
/// ```
#[macro_export]
macro_rules! println {
    ($($arg:tt)*) => ({
        $crate::console::_print(format_args!($($arg)*));
        $crate::console::_print(format_args!("\n"));
    });
}
pub use println;

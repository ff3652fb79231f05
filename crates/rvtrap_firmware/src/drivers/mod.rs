//! Hardware driver modules for firmware peripherals.
//!
//! Device drivers acknowledge their own interrupts; the trap dispatch layer
//! only counts them. Each driver module provides a safe interface to its
//! memory-mapped hardware component.

pub mod clint;

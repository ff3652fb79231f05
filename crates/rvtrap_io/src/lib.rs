//! I/O utilities for trap trace files and register dumps.
//!
//! Provides the trace file format consumed by the host simulator, file
//! loading with error context, and bit-level views of CSR values for
//! diagnostic output.

/// File loading for trap traces.
///
/// Reads a trace file from disk and hands its contents to the parser,
/// attaching the file path to any error.
pub mod loader;

/// Parser for the line-oriented trap trace format.
///
/// Each line arms or disarms a source, raises a pending line, or delivers a
/// raw `mcause` value to the trap vector, optionally addressed to one hart.
pub mod parser;

/// Bit-level views of CSR values.
pub mod regview;

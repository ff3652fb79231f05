/// Build script for the firmware crate.
///
/// Passes the linker script to the linker when building for a bare-metal
/// RISC-V target. Host builds (documentation, IDE checks) are left alone.
use std::env;
use std::path::PathBuf;

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let target_arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();

    if target_arch.starts_with("riscv") {
        let script = manifest_dir.join("linker.ld");
        println!("cargo:rustc-link-arg=-T{}", script.display());
    }

    println!("cargo:rerun-if-changed=linker.ld");
    println!("cargo:rerun-if-changed=src/entry.S");
}

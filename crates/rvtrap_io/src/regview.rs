use bitvec::prelude::*;
use rvtrap_core::CsrSelector;

/// Positions of the set bits of `value`, least significant first.
pub fn set_bits(value: u32) -> Vec<usize> {
    value.view_bits::<Lsb0>().iter_ones().collect()
}

/// Architectural name of a bit in one of the interrupt-control registers.
pub fn bit_name(csr: CsrSelector, bit: usize) -> Option<&'static str> {
    let name = match (csr, bit) {
        (CsrSelector::Mstatus, 1) => "SIE",
        (CsrSelector::Mstatus, 3) => "MIE",
        (CsrSelector::Mstatus, 5) => "SPIE",
        (CsrSelector::Mstatus, 7) => "MPIE",
        (CsrSelector::Mstatus, 8) => "SPP",
        (CsrSelector::Mstatus, 11 | 12) => "MPP",
        (CsrSelector::Mie, 1) => "SSIE",
        (CsrSelector::Mie, 3) => "MSIE",
        (CsrSelector::Mie, 5) => "STIE",
        (CsrSelector::Mie, 7) => "MTIE",
        (CsrSelector::Mie, 9) => "SEIE",
        (CsrSelector::Mie, 11) => "MEIE",
        (CsrSelector::Mip, 1) => "SSIP",
        (CsrSelector::Mip, 3) => "MSIP",
        (CsrSelector::Mip, 5) => "STIP",
        (CsrSelector::Mip, 7) => "MTIP",
        (CsrSelector::Mip, 9) => "SEIP",
        (CsrSelector::Mip, 11) => "MEIP",
        _ => return None,
    };
    Some(name)
}

/// Renders the set bits of a register value as `NAME|NAME|bitN`, or `-`
/// when no bit is set.
pub fn describe(csr: CsrSelector, value: u32) -> String {
    let mut parts: Vec<String> = Vec::new();
    for bit in set_bits(value) {
        let part = match bit_name(csr, bit) {
            Some(name) => name.to_string(),
            None => format!("bit{bit}"),
        };
        if !parts.contains(&part) {
            parts.push(part);
        }
    }
    if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join("|")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_set_positions() {
        assert_eq!(set_bits(0), Vec::<usize>::new());
        assert_eq!(set_bits(0x888), vec![3, 7, 11]);
        assert_eq!(set_bits(1 << 31), vec![31]);
    }

    #[test]
    fn names_interrupt_bits() {
        assert_eq!(describe(CsrSelector::Mie, 0x888), "MSIE|MTIE|MEIE");
        assert_eq!(describe(CsrSelector::Mip, 0x8), "MSIP");
        assert_eq!(describe(CsrSelector::Mstatus, 0x1888), "MIE|MPIE|MPP");
        assert_eq!(describe(CsrSelector::Mscratch, 0x3), "bit0|bit1");
        assert_eq!(describe(CsrSelector::Mie, 0), "-");
    }
}

//! Canonical cycle counts for the documented opcodes, used by the timing
//! conformance tests. Undocumented slots hold a zero-cycle entry.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Timing {
    /// Always the same cycle count.
    Fixed(u8),
    /// One extra cycle when the indexed effective address crosses a page.
    PageCross(u8),
    /// Branch: +1 when taken, +1 more when the target crosses a page.
    Branch(u8),
}

const fn f(cycles: u8) -> Timing {
    Timing::Fixed(cycles)
}

const fn p(cycles: u8) -> Timing {
    Timing::PageCross(cycles)
}

const fn b(cycles: u8) -> Timing {
    Timing::Branch(cycles)
}

impl Timing {
    pub(crate) const fn base_cycles(&self) -> u64 {
        match self {
            Timing::Fixed(cycles) | Timing::PageCross(cycles) | Timing::Branch(cycles) => {
                *cycles as u64
            }
        }
    }

    pub(crate) const fn total_cycles(&self, page_crossed: bool, branch_taken: bool) -> u64 {
        let mut total = self.base_cycles();
        if page_crossed && matches!(self, Timing::PageCross(_)) {
            total += 1;
        }
        if branch_taken && matches!(self, Timing::Branch(_)) {
            total += 1;
            if page_crossed {
                total += 1;
            }
        }
        total
    }
}

#[rustfmt::skip]
pub(crate) static CYCLE_TABLE: [Timing; 256] = [
    f(7), f(6), f(0), f(0), f(0), f(3), f(5), f(0), f(3), f(2), f(2), f(0), f(0), f(4), f(6), f(0),
    b(2), p(5), f(0), f(0), f(0), f(4), f(6), f(0), f(2), p(4), f(0), f(0), f(0), p(4), f(7), f(0),
    f(6), f(6), f(0), f(0), f(3), f(3), f(5), f(0), f(4), f(2), f(2), f(0), f(4), f(4), f(6), f(0),
    b(2), p(5), f(0), f(0), f(0), f(4), f(6), f(0), f(2), p(4), f(0), f(0), f(0), p(4), f(7), f(0),
    f(6), f(6), f(0), f(0), f(0), f(3), f(5), f(0), f(3), f(2), f(2), f(0), f(3), f(4), f(6), f(0),
    b(2), p(5), f(0), f(0), f(0), f(4), f(6), f(0), f(2), p(4), f(0), f(0), f(0), p(4), f(7), f(0),
    f(6), f(6), f(0), f(0), f(0), f(3), f(5), f(0), f(4), f(2), f(2), f(0), f(5), f(4), f(6), f(0),
    b(2), p(5), f(0), f(0), f(0), f(4), f(6), f(0), f(2), p(4), f(0), f(0), f(0), p(4), f(7), f(0),
    f(0), f(6), f(0), f(0), f(3), f(3), f(3), f(0), f(2), f(0), f(2), f(0), f(4), f(4), f(4), f(0),
    b(2), f(6), f(0), f(0), f(4), f(4), f(4), f(0), f(2), f(5), f(2), f(0), f(0), f(5), f(0), f(0),
    f(2), f(6), f(2), f(0), f(3), f(3), f(3), f(0), f(2), f(2), f(2), f(0), f(4), f(4), f(4), f(0),
    b(2), p(5), f(0), f(0), f(4), f(4), f(4), f(0), f(2), p(4), f(2), f(0), p(4), p(4), p(4), f(0),
    f(2), f(6), f(0), f(0), f(3), f(3), f(5), f(0), f(2), f(2), f(2), f(0), f(4), f(4), f(6), f(0),
    b(2), p(5), f(0), f(0), f(0), f(4), f(6), f(0), f(2), p(4), f(0), f(0), f(0), p(4), f(7), f(0),
    f(2), f(6), f(0), f(0), f(3), f(3), f(5), f(0), f(2), f(2), f(2), f(0), f(4), f(4), f(6), f(0),
    b(2), p(5), f(0), f(0), f(0), f(4), f(6), f(0), f(2), p(4), f(0), f(0), f(0), p(4), f(7), f(0),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::lookup::LOOKUP_TABLE;

    #[test]
    fn documented_opcodes_have_nonzero_timing() {
        for (idx, slot) in LOOKUP_TABLE.iter().enumerate() {
            match slot {
                Some(_) => assert!(
                    CYCLE_TABLE[idx].base_cycles() >= 2,
                    "opcode {idx:#04X} missing timing"
                ),
                None => assert_eq!(
                    CYCLE_TABLE[idx].base_cycles(),
                    0,
                    "undocumented opcode {idx:#04X} has timing"
                ),
            }
        }
    }
}

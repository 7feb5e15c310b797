use bitflags::bitflags;

bitflags! {
    /// The 8-bit processor status register (P).
    ///
    /// Bit layout:
    /// 7 6 5 4 3 2 1 0
    /// N V U B D I Z C
    ///
    /// Bit 5 (U) has no storage on the 2A03 and reads back as 1 whenever the
    /// register is pushed; bit 4 (B) only exists on the stack copy and tells
    /// BRK/PHP pushes apart from hardware interrupt pushes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status: u8 {
        /// Carry (C): carry out of bit 7 on adds, inverted borrow on
        /// subtracts, and the shifted-out bit of shifts/rotates.
        const CARRY     = 0b0000_0001;

        /// Zero (Z): the last result was zero.
        const ZERO      = 0b0000_0010;

        /// Interrupt disable (I): when set, IRQ is ignored.
        const INTERRUPT = 0b0000_0100;

        /// Decimal (D): storable but without effect; the 2A03 has BCD
        /// arithmetic disabled.
        const DECIMAL   = 0b0000_1000;

        /// Break (B): meaningful only in the stacked copy of the register.
        const BREAK     = 0b0001_0000;

        /// Unused (U): always 1 when the register is pushed.
        const UNUSED    = 0b0010_0000;

        /// Overflow (V): signed arithmetic overflowed.
        const OVERFLOW  = 0b0100_0000;

        /// Negative (N): bit 7 of the last result.
        const NEGATIVE  = 0b1000_0000;
    }
}

impl Status {
    /// Power-up state: interrupts disabled, unused bit high.
    pub fn new() -> Self {
        Status::INTERRUPT | Status::UNUSED
    }

    pub fn c(&self) -> bool {
        self.contains(Status::CARRY)
    }

    pub fn z(&self) -> bool {
        self.contains(Status::ZERO)
    }

    pub fn i(&self) -> bool {
        self.contains(Status::INTERRUPT)
    }

    pub fn v(&self) -> bool {
        self.contains(Status::OVERFLOW)
    }

    pub fn n(&self) -> bool {
        self.contains(Status::NEGATIVE)
    }

    /// Set or clear the Zero flag from a result.
    pub fn update_zero(&mut self, value: u8) {
        self.set(Status::ZERO, value == 0);
    }

    /// Set or clear the Negative flag from bit 7 of a result.
    pub fn update_negative(&mut self, value: u8) {
        self.set(Status::NEGATIVE, value & 0x80 != 0);
    }

    /// The usual pairing after loads, logic, and arithmetic.
    pub fn update_nz(&mut self, value: u8) {
        self.update_zero(value);
        self.update_negative(value);
    }

    /// The byte that lands on the stack: U always set, B per push source
    /// (set for BRK/PHP, clear for NMI/IRQ).
    pub fn pushed(&self, break_flag: bool) -> u8 {
        let mut value = *self | Status::UNUSED;
        value.set(Status::BREAK, break_flag);
        value.bits()
    }

    /// Restore from a stacked byte. Bits 4/5 have no storage in the
    /// register, so PHP followed by PLP is the identity on the other six.
    pub fn from_pulled(byte: u8) -> Self {
        let mut value = Status::from_bits_retain(byte);
        value.remove(Status::BREAK);
        value.insert(Status::UNUSED);
        value
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::new()
    }
}

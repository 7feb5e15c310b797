use crate::cpu::{addressing::Addressing, mnemonic::Mnemonic};

/// Static descriptor for one documented opcode. The 256-entry lookup table
/// holds these by value; the CPU keeps a `&'static` reference to the one it
/// is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub opcode: u8,
    pub mnemonic: Mnemonic,
    pub addressing: Addressing,
}

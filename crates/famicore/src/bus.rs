use crate::memory;

pub mod cpu;
pub(crate) mod open_bus;

#[cfg(test)]
pub(crate) mod mock;

pub use cpu::CpuBus;
pub(crate) use open_bus::OpenBus;

/// Start address of the CPU stack page, for stack helpers.
pub(crate) const STACK_ADDR: u16 = memory::cpu::STACK_PAGE_START;

/// The CPU's view of memory: one byte in, one byte out, one access per bus
/// cycle. Reads never fail; unmapped regions resolve to open bus inside the
/// implementation.
pub trait Bus {
    fn read(&mut self, addr: u16) -> u8;

    fn write(&mut self, addr: u16, data: u8);
}

/// Register-level hook for the PPU/APU collaborators.
///
/// The core routes the CPU-visible register windows here and treats every
/// access as potentially observable: reading `$2002` clears the VBL flag,
/// writing `$4014` starts OAM DMA, and so on. Those side effects live in the
/// collaborator, not in this crate.
pub trait IoPort: std::fmt::Debug {
    fn read(&mut self, addr: u16) -> u8;

    fn write(&mut self, addr: u16, data: u8);
}

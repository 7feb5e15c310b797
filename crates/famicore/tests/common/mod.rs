#![allow(dead_code)]

//! Shared ROM-building helpers for the integration suites.

use famicore::{Nes, load_cartridge};

pub const PRG_START: u16 = 0x8000;

const PRG_BANK: usize = 16 * 1024;

/// Builds NROM images: a NOP-filled PRG window with programs and vectors
/// poked in, wrapped in a minimal iNES header.
pub struct RomBuilder {
    prg: Vec<u8>,
}

impl RomBuilder {
    /// 32 KiB PRG, every byte a NOP, reset vector at `$8000`.
    pub fn new() -> Self {
        let mut builder = Self {
            prg: vec![0xEA; 2 * PRG_BANK],
        };
        builder.poke16(0xFFFC, PRG_START);
        builder
    }

    /// 16 KiB PRG (mirrored into both halves of the window), otherwise
    /// zero-filled so the vectors are the only contents.
    pub fn nrom_128() -> Self {
        Self {
            prg: vec![0x00; PRG_BANK],
        }
    }

    pub fn program(mut self, addr: u16, bytes: &[u8]) -> Self {
        let start = self.offset(addr);
        self.prg[start..start + bytes.len()].copy_from_slice(bytes);
        self
    }

    pub fn reset_vector(mut self, addr: u16) -> Self {
        self.poke16(0xFFFC, addr);
        self
    }

    pub fn nmi_vector(mut self, addr: u16) -> Self {
        self.poke16(0xFFFA, addr);
        self
    }

    pub fn irq_vector(mut self, addr: u16) -> Self {
        self.poke16(0xFFFE, addr);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let banks = (self.prg.len() / PRG_BANK) as u8;
        let mut rom = vec![
            b'N', b'E', b'S', 0x1A, banks, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        ];
        rom.extend(self.prg);
        rom
    }

    /// Loads the image and powers on a console around it.
    pub fn boot(self) -> Nes {
        let cartridge = load_cartridge(&self.build()).expect("test ROM loads");
        let mut nes = Nes::new();
        nes.insert_cartridge(cartridge);
        nes
    }

    fn poke16(&mut self, addr: u16, value: u16) {
        let start = self.offset(addr);
        self.prg[start] = (value & 0xFF) as u8;
        self.prg[start + 1] = (value >> 8) as u8;
    }

    /// CPU address to PRG offset, honoring the 16 KiB mirror.
    fn offset(&self, addr: u16) -> usize {
        (addr as usize - PRG_START as usize) % self.prg.len()
    }
}

pub fn run_cycles(nes: &mut Nes, cycles: u64) {
    for _ in 0..cycles {
        nes.tick().expect("tick");
    }
}

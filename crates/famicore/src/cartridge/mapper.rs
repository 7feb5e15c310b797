use std::borrow::Cow;

use dyn_clone::DynClone;

use crate::cartridge::TRAINER_SIZE;
use crate::cartridge::header::{Header, Mirroring};

pub mod mapper0;

pub use mapper0::Mapper0;

/// Cartridge-side address decoding.
///
/// A mapper answers CPU accesses in `$4020-$FFFF` and PPU pattern-table
/// accesses in `$0000-$1FFF`. `None` from a read means the cartridge does not
/// drive the bus for that address and the caller should substitute open bus.
pub trait Mapper: std::fmt::Debug + DynClone + Send {
    fn cpu_read(&self, addr: u16) -> Option<u8>;

    fn cpu_write(&mut self, addr: u16, data: u8);

    fn ppu_read(&self, addr: u16) -> Option<u8>;

    fn ppu_write(&mut self, addr: u16, data: u8);

    fn mirroring(&self) -> Mirroring;

    fn mapper_id(&self) -> u16;

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("unnamed")
    }

    /// Raw PRG ROM bytes, when the board exposes them linearly.
    fn prg_rom(&self) -> Option<&[u8]> {
        None
    }

    /// Raw CHR bytes (ROM or RAM), when the board exposes them linearly.
    fn chr(&self) -> Option<&[u8]> {
        None
    }
}

dyn_clone::clone_trait_object!(Mapper);

/// Allocates the board's PRG RAM and preloads the trainer when one is
/// present. Trainers load at `$7000`, i.e. offset `$1000` into the 8 KiB
/// work-RAM window.
pub(crate) fn allocate_prg_ram_with_trainer(
    header: &Header,
    trainer: Option<&[u8; TRAINER_SIZE]>,
) -> Box<[u8]> {
    let size = header.prg_ram_size().max(header.prg_nvram_size()) as usize;
    let mut prg_ram = vec![0u8; size].into_boxed_slice();
    if let Some(trainer) = trainer
        && prg_ram.len() >= 0x1000 + TRAINER_SIZE
    {
        prg_ram[0x1000..0x1000 + TRAINER_SIZE].copy_from_slice(trainer);
    }
    prg_ram
}

/// CHR storage: either the ROM from the image or writable RAM sized by the
/// header (8 KiB default when the header stores nothing).
#[derive(Debug, Clone)]
pub(crate) enum ChrStorage {
    Rom(Box<[u8]>),
    Ram(Box<[u8]>),
}

impl ChrStorage {
    pub(crate) fn select(header: &Header, chr_rom: Box<[u8]>) -> Self {
        if chr_rom.is_empty() {
            let size = header.chr_ram_size().max(8 * 1024) as usize;
            Self::Ram(vec![0u8; size].into_boxed_slice())
        } else {
            Self::Rom(chr_rom)
        }
    }

    pub(crate) fn read(&self, addr: u16) -> u8 {
        let bytes = match self {
            Self::Rom(bytes) | Self::Ram(bytes) => bytes,
        };
        if bytes.is_empty() {
            return 0;
        }
        bytes[addr as usize % bytes.len()]
    }

    pub(crate) fn write(&mut self, addr: u16, data: u8) {
        if let Self::Ram(bytes) = self
            && !bytes.is_empty()
        {
            let idx = addr as usize % bytes.len();
            bytes[idx] = data;
        }
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        match self {
            Self::Rom(bytes) | Self::Ram(bytes) => bytes,
        }
    }
}

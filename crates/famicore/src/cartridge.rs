//! Cartridge loading: header decode, section slicing, mapper construction.

use std::{fs, path::Path};

use tracing::debug;

use crate::{
    cartridge::header::{Header, Mirroring, NES_HEADER_LEN},
    error::Error,
};

pub mod header;
pub mod mapper;

pub use mapper::{Mapper, Mapper0};

/// Size of the optional trainer section between the header and PRG ROM.
pub const TRAINER_SIZE: usize = 512;

/// A loaded cartridge: parsed header, the optional trainer block, and the
/// mapper holding the PRG/CHR data. Constructed once from a ROM image and
/// immutable metadata-wise afterwards; owned by the console.
#[derive(Debug, Clone)]
pub struct Cartridge {
    header: Header,
    trainer: Option<Box<[u8; TRAINER_SIZE]>>,
    mapper: Box<dyn Mapper>,
}

impl Cartridge {
    pub fn new(
        header: Header,
        trainer: Option<Box<[u8; TRAINER_SIZE]>>,
        mapper: Box<dyn Mapper>,
    ) -> Self {
        Self {
            header,
            trainer,
            mapper,
        }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The 512-byte trainer section, when the image carried one.
    pub fn trainer(&self) -> Option<&[u8; TRAINER_SIZE]> {
        self.trainer.as_deref()
    }

    pub fn mapper(&self) -> &dyn Mapper {
        self.mapper.as_ref()
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mapper.mirroring()
    }

    /// CPU-side read in `$4020-$FFFF`. `None` means the cartridge does not
    /// drive the bus at this address.
    pub fn cpu_read(&self, addr: u16) -> Option<u8> {
        self.mapper.cpu_read(addr)
    }

    /// CPU-side write in `$4020-$FFFF`. NROM only accepts PRG RAM writes.
    pub fn cpu_write(&mut self, addr: u16, data: u8) {
        self.mapper.cpu_write(addr, data);
    }

    /// PPU-side pattern read in `$0000-$1FFF`.
    pub fn ppu_read(&self, addr: u16) -> Option<u8> {
        self.mapper.ppu_read(addr)
    }

    /// PPU-side pattern write in `$0000-$1FFF` (CHR RAM boards).
    pub fn ppu_write(&mut self, addr: u16, data: u8) {
        self.mapper.ppu_write(addr, data);
    }
}

/// Load a cartridge from an in-memory ROM image.
pub fn load_cartridge(bytes: &[u8]) -> Result<Cartridge, Error> {
    let header_bytes = bytes.get(..NES_HEADER_LEN).ok_or(Error::HeaderTooShort {
        actual: bytes.len(),
    })?;
    let header = Header::parse(header_bytes)?;
    let (trainer, prg_rom, chr_rom) = slice_sections(bytes, &header)?;

    debug!(
        format = ?header.format(),
        mapper = header.mapper(),
        submapper = header.submapper(),
        mirroring = ?header.mirroring(),
        timing = ?header.timing(),
        prg_rom = header.prg_rom_size(),
        chr_rom = header.chr_rom_size(),
        trainer = header.trainer_present(),
        battery = header.battery_backed_ram(),
        "loaded cartridge header"
    );

    let mapper: Box<dyn Mapper> = match header.mapper() {
        0 => Box::new(Mapper0::new(&header, prg_rom, chr_rom, trainer.as_deref())),
        other => return Err(Error::UnsupportedMapper(other)),
    };

    Ok(Cartridge::new(header, trainer, mapper))
}

/// Load a cartridge directly from disk.
pub fn load_cartridge_from_file<P>(path: P) -> Result<Cartridge, Error>
where
    P: AsRef<Path>,
{
    let bytes = fs::read(path)?;
    load_cartridge(&bytes)
}

fn slice_trainer(
    bytes: &[u8],
    cursor: &mut usize,
    header: &Header,
) -> Result<Option<Box<[u8; TRAINER_SIZE]>>, Error> {
    if !header.trainer_present() {
        return Ok(None);
    }

    let end = *cursor + TRAINER_SIZE;
    let slice = bytes.get(*cursor..end).ok_or(Error::SectionTooShort {
        section: "trainer",
        expected: TRAINER_SIZE as u64,
        actual: bytes.len().saturating_sub(*cursor) as u64,
    })?;
    *cursor = end;
    let block: [u8; TRAINER_SIZE] = slice.try_into().expect("trainer length mismatch");
    Ok(Some(Box::new(block)))
}

fn slice_section<'a>(
    bytes: &'a [u8],
    cursor: &mut usize,
    len: u64,
    name: &'static str,
) -> Result<&'a [u8], Error> {
    if len == 0 {
        return Ok(&bytes[0..0]);
    }

    // Comparing in u64 also rejects declared sizes the host cannot address
    // (the NES 2.0 exponent form can exceed usize on 32-bit targets).
    let remaining = bytes.len().saturating_sub(*cursor) as u64;
    if len > remaining {
        return Err(Error::SectionTooShort {
            section: name,
            expected: len,
            actual: remaining,
        });
    }

    let end = *cursor + len as usize;
    let slice = &bytes[*cursor..end];
    *cursor = end;
    Ok(slice)
}

fn slice_sections(
    bytes: &[u8],
    header: &Header,
) -> Result<(Option<Box<[u8; TRAINER_SIZE]>>, Box<[u8]>, Box<[u8]>), Error> {
    let mut cursor = NES_HEADER_LEN;
    let trainer = slice_trainer(bytes, &mut cursor, header)?;

    let prg_rom = slice_section(bytes, &mut cursor, header.prg_rom_size(), "PRG ROM")?;
    let chr_rom = slice_section(bytes, &mut cursor, header.chr_rom_size(), "CHR ROM")?;

    Ok((trainer, prg_rom.into(), chr_rom.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::cpu as cpu_mem;

    fn base_header(prg_banks: u8, chr_banks: u8, flags6: u8) -> [u8; NES_HEADER_LEN] {
        [
            b'N', b'E', b'S', 0x1A, prg_banks, chr_banks, flags6, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        ]
    }

    #[test]
    fn loads_basic_nrom_cartridge() {
        let mut rom = base_header(1, 1, 0).to_vec();
        rom.extend(vec![0xAA; 16 * 1024]);
        rom.extend(vec![0x55; 8 * 1024]);

        let cartridge = load_cartridge(&rom).expect("parse cartridge");

        assert_eq!(cartridge.header().prg_rom_size(), 16 * 1024);
        assert_eq!(cartridge.header().chr_rom_size(), 8 * 1024);
        assert_eq!(cartridge.cpu_read(cpu_mem::PRG_ROM_START), Some(0xAA));
        assert_eq!(cartridge.ppu_read(0x0000), Some(0x55));
    }

    #[test]
    fn loads_cartridge_with_trainer() {
        let mut rom = base_header(1, 0, 0b0000_0100).to_vec();
        rom.extend(vec![0xFE; TRAINER_SIZE]);
        rom.extend(vec![0xAA; 16 * 1024]);

        let cartridge = load_cartridge(&rom).expect("parse cartridge");

        assert!(cartridge.header().trainer_present());
        assert_eq!(cartridge.trainer().map(|t| t[0]), Some(0xFE));
        assert_eq!(cartridge.cpu_read(cpu_mem::PRG_ROM_START), Some(0xAA));
    }

    #[test]
    fn errors_when_prg_section_missing() {
        let mut rom = base_header(1, 0, 0).to_vec();
        rom.extend(vec![0xAA; 1024]); // insufficient PRG data

        let err = load_cartridge(&rom).expect_err("should fail");
        assert!(matches!(
            err,
            Error::SectionTooShort {
                section: "PRG ROM",
                ..
            }
        ));
    }

    #[test]
    fn errors_when_trainer_missing() {
        let rom = base_header(1, 0, 0b0000_0100).to_vec();

        let err = load_cartridge(&rom).expect_err("should fail");
        assert!(matches!(
            err,
            Error::SectionTooShort {
                section: "trainer",
                ..
            }
        ));
    }

    #[test]
    fn errors_when_mapper_not_implemented() {
        // With flags 7 zeroed the high nibble of flags 6 is the mapper
        // number: 0xC0 >> 4 = 12.
        let mut rom = base_header(1, 1, 0xC0).to_vec();
        rom.extend(vec![0xAA; 16 * 1024]);
        rom.extend(vec![0x55; 8 * 1024]);

        let err = load_cartridge(&rom).expect_err("unsupported mapper should fail");
        assert!(matches!(err, Error::UnsupportedMapper(12)));
    }

    #[test]
    fn errors_when_exponent_size_exceeds_file() {
        let mut rom = base_header(0xEE, 0, 0).to_vec();
        rom[7] = 0b0000_1000; // NES 2.0
        rom[9] = 0x0F; // PRG size 2^59 * 5 bytes
        rom.extend(vec![0u8; 1024]);

        let err = load_cartridge(&rom).expect_err("should fail");
        assert!(matches!(
            err,
            Error::SectionTooShort {
                section: "PRG ROM",
                ..
            }
        ));
    }
}

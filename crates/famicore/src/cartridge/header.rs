//! iNES / NES 2.0 header decoding.
//!
//! The first 16 bytes of every `.nes` image describe how much PRG/CHR data
//! the cartridge carries, which mapper it needs, and a handful of
//! compatibility flags. NES 2.0 reuses the iNES layout for bytes 0..=7 and
//! reinterprets bytes 8..=15, so the parser keeps both flavours as separate
//! variants of [`Header`] and preserves every on-disk byte: a parsed header
//! re-serializes byte-identically through [`Header::to_bytes`].
//!
//! All multi-bit fields are decoded with explicit shifts and masks; the
//! on-disk bit order is the only layout this module knows about.

use bitflags::bitflags;

use crate::error::Error;

const NES_MAGIC: &[u8; 4] = b"NES\x1A";

/// Size of the fixed iNES header in bytes.
pub const NES_HEADER_LEN: usize = 16;

/// PRG ROM size unit for the non-exponent encodings (16 KiB).
pub const PRG_ROM_UNIT: u64 = 16 * 1024;
/// CHR ROM size unit for the non-exponent encodings (8 KiB).
pub const CHR_ROM_UNIT: u64 = 8 * 1024;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags6: u8 {
        const MIRRORING        = 0b0000_0001;
        const BATTERY          = 0b0000_0010;
        const TRAINER          = 0b0000_0100;
        const FOUR_SCREEN      = 0b0000_1000;
        const MAPPER_LOW_MASK  = 0b1111_0000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags7: u8 {
        const CONSOLE_TYPE_MASK = 0b0000_0011;
        const NES2_DETECTION    = 0b0000_1100;
        const MAPPER_MID_MASK   = 0b1111_0000;
    }
}

/// Nametable layout requested by the cartridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mirroring {
    /// Two horizontal nametables that mirror vertically.
    Horizontal,
    /// Two vertical nametables that mirror horizontally.
    Vertical,
    /// Cartridge supplies its own four nametables; overrides bit 0.
    FourScreen,
}

/// Identifies the header flavour encountered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RomFormat {
    /// The original iNES specification.
    INes,
    /// NES 2.0 with extended sizing and metadata fields.
    Nes20,
}

/// CPU/PPU timing advertised by the header.
///
/// NES 2.0 stores this directly in byte 12 bits 0..=1; legacy iNES dumps only
/// hint at it through the flags 9/10 TV-system bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timing {
    /// RP2C02, 1.789773 MHz CPU ("NTSC NES").
    Ntsc,
    /// RP2C07, 1.662607 MHz CPU ("Licensed PAL NES").
    Pal,
    /// Region-free: the game runs on either timing.
    Multi,
    /// UA6538 hybrid timing used by Dendy famiclones.
    Dendy,
}

impl Timing {
    fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::Ntsc,
            1 => Self::Pal,
            2 => Self::Multi,
            3 => Self::Dendy,
            _ => unreachable!("masked to 2 bits"),
        }
    }
}

/// Console type advertised by flags 7 bits 0..=1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsoleType {
    /// Standard NES/Famicom cartridge.
    NesFamicom,
    /// Vs. System arcade hardware.
    VsSystem,
    /// PlayChoice-10 hardware.
    PlayChoice10,
    /// NES 2.0 extended console type (see byte 13).
    Extended,
}

impl ConsoleType {
    fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::NesFamicom,
            1 => Self::VsSystem,
            2 => Self::PlayChoice10,
            3 => Self::Extended,
            _ => unreachable!("masked to 2 bits"),
        }
    }
}

/// Vs. System PPU model (NES 2.0 byte 13 low nibble when the console type is
/// Vs. System).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VsPpuType {
    /// $0: Any RP2C03/RC2C03 variant.
    AnyRp2c03OrRc2c03,
    /// $2: RP2C04-0001.
    Rp2c04_0001,
    /// $3: RP2C04-0002.
    Rp2c04_0002,
    /// $4: RP2C04-0003.
    Rp2c04_0003,
    /// $5: RP2C04-0004.
    Rp2c04_0004,
    /// $8: RC2C05-01.
    Rc2c05_01,
    /// $9: RC2C05-02.
    Rc2c05_02,
    /// $A: RC2C05-03.
    Rc2c05_03,
    /// $B: RC2C05-04.
    Rc2c05_04,
    /// Reserved/unknown values.
    Unknown(u8),
}

impl VsPpuType {
    pub fn from_nibble(nibble: u8) -> Self {
        match nibble & 0x0F {
            0x0 => Self::AnyRp2c03OrRc2c03,
            0x2 => Self::Rp2c04_0001,
            0x3 => Self::Rp2c04_0002,
            0x4 => Self::Rp2c04_0003,
            0x5 => Self::Rp2c04_0004,
            0x8 => Self::Rc2c05_01,
            0x9 => Self::Rc2c05_02,
            0xA => Self::Rc2c05_03,
            0xB => Self::Rc2c05_04,
            other => Self::Unknown(other),
        }
    }
}

/// Vs. System hardware/protection type (NES 2.0 byte 13 high nibble when the
/// console type is Vs. System).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VsHardwareType {
    /// $0: Vs. Unisystem (normal).
    UnisystemNormal,
    /// $1: Vs. Unisystem (RBI Baseball protection).
    UnisystemRbiBaseballProtection,
    /// $2: Vs. Unisystem (TKO Boxing protection).
    UnisystemTkoBoxingProtection,
    /// $3: Vs. Unisystem (Super Xevious protection).
    UnisystemSuperXeviousProtection,
    /// $4: Vs. Unisystem (Vs. Ice Climber Japan protection).
    UnisystemIceClimberJapanProtection,
    /// $5: Vs. Dual System (normal).
    DualSystemNormal,
    /// $6: Vs. Dual System (Raid on Bungeling Bay protection).
    DualSystemRaidOnBungelingBayProtection,
    /// Reserved/unknown values.
    Unknown(u8),
}

impl VsHardwareType {
    pub fn from_nibble(nibble: u8) -> Self {
        match nibble & 0x0F {
            0x0 => Self::UnisystemNormal,
            0x1 => Self::UnisystemRbiBaseballProtection,
            0x2 => Self::UnisystemTkoBoxingProtection,
            0x3 => Self::UnisystemSuperXeviousProtection,
            0x4 => Self::UnisystemIceClimberJapanProtection,
            0x5 => Self::DualSystemNormal,
            0x6 => Self::DualSystemRaidOnBungelingBayProtection,
            other => Self::Unknown(other),
        }
    }
}

/// NES 2.0 extended console type (byte 13 low nibble when the console type is
/// Extended).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtendedConsoleType {
    /// $0: Regular NES/Famicom/Dendy.
    Regular,
    /// $1: Nintendo Vs. System.
    VsSystem,
    /// $2: PlayChoice-10.
    PlayChoice10,
    /// $3: Famiclone with a CPU that supports decimal mode.
    FamicloneWithDecimalMode,
    /// $4: NES/Famicom with EPSM module or plug-through cartridge.
    NesFamicomWithEpsm,
    /// $5: V.R. Technology VT01 with red/cyan STN palette.
    Vt01RedCyanStnPalette,
    /// $6: V.R. Technology VT02.
    Vt02,
    /// $7: V.R. Technology VT03.
    Vt03,
    /// $8: V.R. Technology VT09.
    Vt09,
    /// $9: V.R. Technology VT32.
    Vt32,
    /// $A: V.R. Technology VT369.
    Vt369,
    /// $B: UMC UM6578.
    UmcUm6578,
    /// $C: Famicom Network System.
    FamicomNetworkSystem,
    /// Reserved/unknown values.
    Unknown(u8),
}

impl ExtendedConsoleType {
    pub fn from_nibble(nibble: u8) -> Self {
        match nibble & 0x0F {
            0x0 => Self::Regular,
            0x1 => Self::VsSystem,
            0x2 => Self::PlayChoice10,
            0x3 => Self::FamicloneWithDecimalMode,
            0x4 => Self::NesFamicomWithEpsm,
            0x5 => Self::Vt01RedCyanStnPalette,
            0x6 => Self::Vt02,
            0x7 => Self::Vt03,
            0x8 => Self::Vt09,
            0x9 => Self::Vt32,
            0xA => Self::Vt369,
            0xB => Self::UmcUm6578,
            0xC => Self::FamicomNetworkSystem,
            other => Self::Unknown(other),
        }
    }
}

/// NES 2.0: interpretation of header byte 13 depends on [`ConsoleType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsoleTypeData {
    /// Standard NES/Famicom cartridges leave this byte reserved.
    NesFamicom { raw: u8 },
    /// Vs. System: high nibble = hardware type, low nibble = PPU type.
    VsSystem {
        hardware_type: VsHardwareType,
        ppu_type: VsPpuType,
    },
    /// PlayChoice-10: byte 13 is unspecified; keep the raw value.
    PlayChoice10 { raw: u8 },
    /// Extended console selection.
    Extended { console_type: ExtendedConsoleType },
}

/// NES 2.0: number of miscellaneous ROM regions after CHR (byte 14 bits 0..=1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MiscRomCount(pub u8);

/// NES 2.0: default expansion device id (byte 15 bits 0..=5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExpansionDevice(pub u8);

/// iNES-defined fields shared by both header flavours (bytes 4..=7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SharedFields {
    /// PRG ROM size least-significant byte (units of 16 KiB).
    pub prg_rom_lsb: u8,
    /// CHR ROM size least-significant byte (units of 8 KiB).
    pub chr_rom_lsb: u8,
    /// iNES flags 6.
    pub flags6: Flags6,
    /// iNES flags 7.
    pub flags7: Flags7,
}

impl SharedFields {
    fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            prg_rom_lsb: bytes[4],
            chr_rom_lsb: bytes[5],
            flags6: Flags6::from_bits_retain(bytes[6]),
            flags7: Flags7::from_bits_retain(bytes[7]),
        }
    }

    fn mirroring(&self) -> Mirroring {
        if self.flags6.contains(Flags6::FOUR_SCREEN) {
            Mirroring::FourScreen
        } else if self.flags6.contains(Flags6::MIRRORING) {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        }
    }
}

/// iNES-only bytes 8..=15.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct INesExtension {
    /// Byte 8: volatile PRG RAM size in 8 KiB units (0 means "assume 8 KiB").
    pub prg_ram_units: u8,
    /// Byte 9: TV system bit 0.
    pub flags9: u8,
    /// Byte 10: unofficial TV-system / PRG-RAM hints.
    pub flags10: u8,
    /// Bytes 11..=15 are unspecified by iNES; kept for byte-exact
    /// re-serialization.
    pub padding: [u8; 5],
}

/// NES 2.0 extension bytes 8..=15.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nes2Extension {
    /// Byte 8: submapper (high nibble) + mapper bits 8..=11 (low nibble).
    pub mapper_msb_submapper: u8,
    /// Byte 9: CHR ROM MSB nibble (high) + PRG ROM MSB nibble (low).
    pub prg_chr_msb: u8,
    /// Byte 10: PRG NVRAM shift (high nibble) + PRG RAM shift (low nibble).
    pub prg_ram_shifts: u8,
    /// Byte 11: CHR NVRAM shift (high nibble) + CHR RAM shift (low nibble).
    pub chr_ram_shifts: u8,
    /// Byte 12: CPU/PPU timing (bits 0..=1).
    pub timing: u8,
    /// Byte 13: console-type dependent data.
    pub console_type_data: u8,
    /// Byte 14: miscellaneous ROM count (bits 0..=1).
    pub misc_roms: u8,
    /// Byte 15: default expansion device (bits 0..=5).
    pub default_expansion_device: u8,
}

impl Nes2Extension {
    pub fn submapper(&self) -> u8 {
        self.mapper_msb_submapper >> 4
    }

    pub fn mapper_msb(&self) -> u8 {
        self.mapper_msb_submapper & 0x0F
    }

    pub fn prg_rom_msb(&self) -> u8 {
        self.prg_chr_msb & 0x0F
    }

    pub fn chr_rom_msb(&self) -> u8 {
        (self.prg_chr_msb >> 4) & 0x0F
    }

    pub fn prg_ram_shift(&self) -> u8 {
        self.prg_ram_shifts & 0x0F
    }

    pub fn prg_nvram_shift(&self) -> u8 {
        self.prg_ram_shifts >> 4
    }

    pub fn chr_ram_shift(&self) -> u8 {
        self.chr_ram_shifts & 0x0F
    }

    pub fn chr_nvram_shift(&self) -> u8 {
        self.chr_ram_shifts >> 4
    }
}

/// Parsed iNES header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct INesHeader {
    pub base: SharedFields,
    pub ext: INesExtension,
}

/// Parsed NES 2.0 header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nes2Header {
    pub base: SharedFields,
    pub ext: Nes2Extension,
}

/// Parsed cartridge header, distinguishing iNES from NES 2.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Header {
    INes(INesHeader),
    Nes20(Nes2Header),
}

impl Header {
    /// Parse a header from the first 16 bytes of a ROM image.
    ///
    /// A file identifies as NES 2.0 when flags 7 bits 2..=3 equal `10` *and*
    /// byte 12 carries no reserved bits; anything else is read as iNES.
    pub fn parse(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < NES_HEADER_LEN {
            return Err(Error::HeaderTooShort {
                actual: bytes.len(),
            });
        }

        if &bytes[0..4] != NES_MAGIC {
            return Err(Error::InvalidMagic);
        }

        let base = SharedFields::from_bytes(bytes);
        let nes2_id = (base.flags7.bits() >> 2) & 0b11;
        let timing_reserved_clear = bytes[12] & !0b11 == 0;
        if nes2_id == 0b10 && timing_reserved_clear {
            Ok(Self::Nes20(Nes2Header {
                base,
                ext: Nes2Extension {
                    mapper_msb_submapper: bytes[8],
                    prg_chr_msb: bytes[9],
                    prg_ram_shifts: bytes[10],
                    chr_ram_shifts: bytes[11],
                    timing: bytes[12],
                    console_type_data: bytes[13],
                    misc_roms: bytes[14],
                    default_expansion_device: bytes[15],
                },
            }))
        } else {
            Ok(Self::INes(INesHeader {
                base,
                ext: INesExtension {
                    prg_ram_units: bytes[8],
                    flags9: bytes[9],
                    flags10: bytes[10],
                    padding: bytes[11..16]
                        .try_into()
                        .expect("iNES padding length mismatch"),
                },
            }))
        }
    }

    /// Re-serialize the header. The result is byte-identical to the image
    /// the header was parsed from.
    pub fn to_bytes(&self) -> [u8; NES_HEADER_LEN] {
        let mut bytes = [0u8; NES_HEADER_LEN];
        bytes[0..4].copy_from_slice(NES_MAGIC);
        let base = self.base();
        bytes[4] = base.prg_rom_lsb;
        bytes[5] = base.chr_rom_lsb;
        bytes[6] = base.flags6.bits();
        bytes[7] = base.flags7.bits();
        match self {
            Header::INes(header) => {
                bytes[8] = header.ext.prg_ram_units;
                bytes[9] = header.ext.flags9;
                bytes[10] = header.ext.flags10;
                bytes[11..16].copy_from_slice(&header.ext.padding);
            }
            Header::Nes20(header) => {
                bytes[8] = header.ext.mapper_msb_submapper;
                bytes[9] = header.ext.prg_chr_msb;
                bytes[10] = header.ext.prg_ram_shifts;
                bytes[11] = header.ext.chr_ram_shifts;
                bytes[12] = header.ext.timing;
                bytes[13] = header.ext.console_type_data;
                bytes[14] = header.ext.misc_roms;
                bytes[15] = header.ext.default_expansion_device;
            }
        }
        bytes
    }

    /// Detected header flavour.
    pub fn format(&self) -> RomFormat {
        match self {
            Header::INes(_) => RomFormat::INes,
            Header::Nes20(_) => RomFormat::Nes20,
        }
    }

    /// Shared iNES-defined fields (bytes 4..=7).
    pub fn base(&self) -> &SharedFields {
        match self {
            Header::INes(header) => &header.base,
            Header::Nes20(header) => &header.base,
        }
    }

    /// Raw iNES flags 6.
    pub fn flags6(&self) -> Flags6 {
        self.base().flags6
    }

    /// Raw iNES flags 7.
    pub fn flags7(&self) -> Flags7 {
        self.base().flags7
    }

    /// Mapper ID (0 == NROM, 1 == MMC1, ...). 8 bits for iNES, 12 for NES 2.0.
    pub fn mapper(&self) -> u16 {
        let lower = (self.base().flags6.bits() >> 4) as u16;
        let middle = (self.base().flags7.bits() & 0xF0) as u16;
        let upper = match self {
            Header::INes(_) => 0,
            Header::Nes20(header) => (header.ext.mapper_msb() as u16) << 8,
        };
        lower | middle | upper
    }

    /// NES 2.0 submapper value. Always 0 for legacy iNES files.
    pub fn submapper(&self) -> u8 {
        match self {
            Header::INes(_) => 0,
            Header::Nes20(header) => header.ext.submapper(),
        }
    }

    /// How the PPU nametables are mirrored.
    pub fn mirroring(&self) -> Mirroring {
        self.base().mirroring()
    }

    /// Whether the cartridge keeps RAM contents when powered off.
    pub fn battery_backed_ram(&self) -> bool {
        match self {
            Header::INes(header) => header.base.flags6.contains(Flags6::BATTERY),
            Header::Nes20(header) => {
                self.prg_nvram_size() != 0
                    || self.chr_nvram_size() != 0
                    || header.base.flags6.contains(Flags6::BATTERY)
            }
        }
    }

    /// Whether the 512 byte trainer block sits between the header and PRG data.
    pub fn trainer_present(&self) -> bool {
        self.base().flags6.contains(Flags6::TRAINER)
    }

    /// Console type advertised by flags 7 bits 0..=1.
    pub fn console_type(&self) -> ConsoleType {
        ConsoleType::from_bits(self.base().flags7.bits() & 0b11)
    }

    /// NES 2.0: console-type dependent byte 13 information.
    pub fn console_type_data(&self) -> Option<ConsoleTypeData> {
        let Header::Nes20(header) = self else {
            return None;
        };
        let raw = header.ext.console_type_data;
        let data = match self.console_type() {
            ConsoleType::NesFamicom => ConsoleTypeData::NesFamicom { raw },
            ConsoleType::VsSystem => ConsoleTypeData::VsSystem {
                hardware_type: VsHardwareType::from_nibble((raw >> 4) & 0x0F),
                ppu_type: VsPpuType::from_nibble(raw & 0x0F),
            },
            ConsoleType::PlayChoice10 => ConsoleTypeData::PlayChoice10 { raw },
            ConsoleType::Extended => ConsoleTypeData::Extended {
                console_type: ExtendedConsoleType::from_nibble(raw & 0x0F),
            },
        };
        Some(data)
    }

    /// NES 2.0: number of miscellaneous ROM regions (0..=3).
    pub fn misc_rom_count(&self) -> Option<MiscRomCount> {
        match self {
            Header::Nes20(header) => Some(MiscRomCount(header.ext.misc_roms & 0b11)),
            _ => None,
        }
    }

    /// NES 2.0: default expansion device id (0..=63).
    pub fn default_expansion_device(&self) -> Option<ExpansionDevice> {
        match self {
            Header::Nes20(header) => {
                Some(ExpansionDevice(header.ext.default_expansion_device & 0x3F))
            }
            _ => None,
        }
    }

    /// CPU/PPU timing. NES 2.0 byte 12; iNES falls back to the TV-system
    /// hints in flags 9/10.
    pub fn timing(&self) -> Timing {
        match self {
            Header::INes(header) => match header.ext.flags10 & 0b11 {
                0b00 => {
                    if header.ext.flags9 & 0b1 == 0 {
                        Timing::Ntsc
                    } else {
                        Timing::Pal
                    }
                }
                0b10 => Timing::Pal,
                _ => Timing::Multi,
            },
            Header::Nes20(header) => Timing::from_bits(header.ext.timing),
        }
    }

    /// Amount of PRG ROM in bytes.
    pub fn prg_rom_size(&self) -> u64 {
        match self {
            Header::INes(header) => header.base.prg_rom_lsb as u64 * PRG_ROM_UNIT,
            Header::Nes20(header) => {
                decode_nes2_rom_size(header.base.prg_rom_lsb, header.ext.prg_rom_msb(), PRG_ROM_UNIT)
            }
        }
    }

    /// Amount of CHR ROM in bytes. Zero means the board carries CHR RAM.
    pub fn chr_rom_size(&self) -> u64 {
        match self {
            Header::INes(header) => header.base.chr_rom_lsb as u64 * CHR_ROM_UNIT,
            Header::Nes20(header) => {
                decode_nes2_rom_size(header.base.chr_rom_lsb, header.ext.chr_rom_msb(), CHR_ROM_UNIT)
            }
        }
    }

    /// Volatile PRG RAM size. Legacy dumps that store 0 get the 8 KiB default.
    pub fn prg_ram_size(&self) -> u64 {
        match self {
            Header::INes(header) => header.ext.prg_ram_units.max(1) as u64 * 8 * 1024,
            Header::Nes20(header) => decode_nes2_ram_size(header.ext.prg_ram_shift()),
        }
    }

    /// Battery-backed PRG RAM size.
    pub fn prg_nvram_size(&self) -> u64 {
        match self {
            Header::INes(header) => {
                if header.base.flags6.contains(Flags6::BATTERY) {
                    header.ext.prg_ram_units.max(1) as u64 * 8 * 1024
                } else {
                    0
                }
            }
            Header::Nes20(header) => decode_nes2_ram_size(header.ext.prg_nvram_shift()),
        }
    }

    /// Volatile CHR RAM size on the PPU side.
    pub fn chr_ram_size(&self) -> u64 {
        match self {
            Header::INes(header) => {
                if header.base.chr_rom_lsb == 0 {
                    8 * 1024
                } else {
                    0
                }
            }
            Header::Nes20(header) => decode_nes2_ram_size(header.ext.chr_ram_shift()),
        }
    }

    /// Battery-backed CHR RAM size.
    pub fn chr_nvram_size(&self) -> u64 {
        match self {
            Header::INes(_) => 0,
            Header::Nes20(header) => decode_nes2_ram_size(header.ext.chr_nvram_shift()),
        }
    }
}

/// NES 2.0 ROM sizing. A MSB nibble of `$F` switches the LSB byte to the
/// `EEEEEEMM` exponent-multiplier form: `2^E * (2M + 1)` bytes. The value is
/// reported as stored, however large; callers decide whether it fits memory.
fn decode_nes2_rom_size(lower: u8, upper_nibble: u8, unit: u64) -> u64 {
    if upper_nibble != 0x0F {
        (((upper_nibble as u64) << 8) | lower as u64) * unit
    } else {
        let exponent = (lower >> 2) as u32;
        let multiplier = (lower & 0b11) as u64;
        1u64.checked_shl(exponent)
            .map(|base| base.saturating_mul(2 * multiplier + 1))
            .unwrap_or(u64::MAX)
    }
}

/// NES 2.0 RAM sizing: shift count `n` encodes `64 << n` bytes, 0 means none.
fn decode_nes2_ram_size(nibble: u8) -> u64 {
    if nibble == 0 { 0 } else { 64u64 << nibble.min(0x0F) }
}

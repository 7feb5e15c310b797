//! The CPU-visible memory map.
//!
//! Every access resolves into exactly one region: internal RAM (plus its
//! three mirrors), the eight PPU registers (mirrored through `$3FFF`), the
//! APU/IO block, the disabled test window, or cartridge space. The router
//! borrows the hardware from the owning console for the duration of a bus
//! cycle; it owns nothing itself.

use crate::{
    bus::{Bus, IoPort, OpenBus},
    cartridge::Cartridge,
    memory::cpu as cpu_mem,
    ram::cpu as cpu_ram,
};

#[derive(Debug)]
pub struct CpuBus<'a> {
    ram: &'a mut cpu_ram::Ram,
    ppu: Option<&'a mut dyn IoPort>,
    apu: Option<&'a mut dyn IoPort>,
    cartridge: Option<&'a mut Cartridge>,
    oam_dma_request: &'a mut Option<u8>,
    open_bus: &'a mut OpenBus,
}

impl<'a> CpuBus<'a> {
    /// Creates a bus view by borrowing the attached hardware.
    pub(crate) fn new(
        ram: &'a mut cpu_ram::Ram,
        ppu: Option<&'a mut dyn IoPort>,
        apu: Option<&'a mut dyn IoPort>,
        cartridge: Option<&'a mut Cartridge>,
        oam_dma_request: &'a mut Option<u8>,
        open_bus: &'a mut OpenBus,
    ) -> Self {
        Self {
            ram,
            ppu,
            apu,
            cartridge,
            oam_dma_request,
            open_bus,
        }
    }

    fn read_internal_ram(&self, addr: u16) -> u8 {
        let idx = (addr & cpu_mem::INTERNAL_RAM_MASK) as usize;
        self.ram[idx]
    }

    fn write_internal_ram(&mut self, addr: u16, value: u8) {
        let idx = (addr & cpu_mem::INTERNAL_RAM_MASK) as usize;
        self.ram[idx] = value;
    }

    /// Collapses `$2000-$3FFF` onto the eight PPU ports.
    fn ppu_register(addr: u16) -> u16 {
        cpu_mem::PPU_REGISTER_BASE + (addr & cpu_mem::PPU_REGISTER_SELECT_MASK)
    }

    fn read_cartridge(&self, addr: u16) -> Option<u8> {
        self.cartridge.as_ref().and_then(|cart| cart.cpu_read(addr))
    }

    fn write_cartridge(&mut self, addr: u16, value: u8) {
        if let Some(cart) = self.cartridge.as_deref_mut() {
            cart.cpu_write(addr, value);
        }
    }
}

impl Bus for CpuBus<'_> {
    fn read(&mut self, addr: u16) -> u8 {
        let mut driven = true;
        let value = match addr {
            cpu_mem::INTERNAL_RAM_START..=cpu_mem::INTERNAL_RAM_MIRROR_END => {
                self.read_internal_ram(addr)
            }
            cpu_mem::PPU_REGISTER_BASE..=cpu_mem::PPU_REGISTER_END => match self.ppu.as_deref_mut()
            {
                Some(ppu) => ppu.read(Self::ppu_register(addr)),
                None => {
                    driven = false;
                    self.open_bus.sample()
                }
            },
            cpu_mem::APU_IO_REGISTER_BASE..=cpu_mem::APU_IO_REGISTER_END => {
                match self.apu.as_deref_mut() {
                    // $4014 is write-only even with a collaborator attached.
                    Some(apu) if addr != cpu_mem::OAM_DMA => apu.read(addr),
                    _ => {
                        driven = false;
                        self.open_bus.sample()
                    }
                }
            }
            cpu_mem::TEST_MODE_BASE..=cpu_mem::TEST_MODE_END => {
                driven = false;
                self.open_bus.sample()
            }
            cpu_mem::CARTRIDGE_SPACE_BASE..=cpu_mem::CPU_ADDR_END => {
                match self.read_cartridge(addr) {
                    Some(value) => value,
                    None => {
                        driven = false;
                        self.open_bus.sample()
                    }
                }
            }
        };

        if driven {
            self.open_bus.latch(value);
        }

        value
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.open_bus.latch(data);

        match addr {
            cpu_mem::INTERNAL_RAM_START..=cpu_mem::INTERNAL_RAM_MIRROR_END => {
                self.write_internal_ram(addr, data)
            }
            cpu_mem::PPU_REGISTER_BASE..=cpu_mem::PPU_REGISTER_END => {
                if let Some(ppu) = self.ppu.as_deref_mut() {
                    ppu.write(Self::ppu_register(addr), data);
                }
            }
            cpu_mem::OAM_DMA => {
                // The DMA engine itself (513/514 stolen cycles) belongs to
                // the host; the bus only records the requested page.
                *self.oam_dma_request = Some(data);
            }
            cpu_mem::APU_IO_REGISTER_BASE..=cpu_mem::APU_IO_REGISTER_END => {
                if let Some(apu) = self.apu.as_deref_mut() {
                    apu.write(addr, data);
                }
            }
            cpu_mem::TEST_MODE_BASE..=cpu_mem::TEST_MODE_END => {}
            cpu_mem::CARTRIDGE_SPACE_BASE..=cpu_mem::CPU_ADDR_END => {
                self.write_cartridge(addr, data)
            }
        }
    }
}

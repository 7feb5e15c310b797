//! Console wiring.
//!
//! [`Nes`] owns the hardware (RAM, open-bus latch, the optional cartridge,
//! the optional PPU/APU collaborators, and the CPU) and builds the borrowed
//! [`CpuBus`] view for each bus cycle. Ownership runs one way: the console
//! owns everything, the bus borrows it, the CPU sees only the bus.

use crate::{
    bus::{Bus, CpuBus, IoPort, OpenBus},
    cartridge::Cartridge,
    cpu::{Cpu, CpuState},
    error::Error,
    ram::cpu as cpu_ram,
};

/// Re-borrows an `Option<&mut (dyn IoPort + 'static)>` with a shorter
/// lifetime so it can be paired with the other bus borrows, which are tied
/// to a single bus-cycle call and are not `'static`.
fn shorten_io_port<'a>(
    port: Option<&'a mut (dyn IoPort + 'static)>,
) -> Option<&'a mut (dyn IoPort + 'a)> {
    port.map(|p| p as &mut (dyn IoPort + 'a))
}

#[derive(Debug, Default)]
pub struct Nes {
    cpu: Cpu,
    ram: cpu_ram::Ram,
    open_bus: OpenBus,
    cartridge: Option<Cartridge>,
    ppu: Option<Box<dyn IoPort>>,
    apu: Option<Box<dyn IoPort>>,
    oam_dma_request: Option<u8>,
}

impl Nes {
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(),
            ram: cpu_ram::Ram::new(),
            open_bus: OpenBus::new(),
            cartridge: None,
            ppu: None,
            apu: None,
            oam_dma_request: None,
        }
    }

    /// Inserts a cartridge and resets the machine so PC comes from the new
    /// reset vector.
    pub fn insert_cartridge(&mut self, cartridge: Cartridge) {
        self.cartridge = Some(cartridge);
        self.reset();
    }

    pub fn eject_cartridge(&mut self) -> Option<Cartridge> {
        self.cartridge.take()
    }

    pub fn cartridge(&self) -> Option<&Cartridge> {
        self.cartridge.as_ref()
    }

    /// Attaches the PPU collaborator behind the `$2000-$3FFF` window.
    pub fn attach_ppu(&mut self, ppu: Box<dyn IoPort>) {
        self.ppu = Some(ppu);
    }

    /// Attaches the APU/IO collaborator behind `$4000-$4017`.
    pub fn attach_apu(&mut self, apu: Box<dyn IoPort>) {
        self.apu = Some(apu);
    }

    /// Power-on/reset: clears RAM and the bus latch, reloads PC from the
    /// reset vector.
    pub fn reset(&mut self) {
        self.ram = cpu_ram::Ram::new();
        self.open_bus.reset();
        self.oam_dma_request = None;
        let mut bus = CpuBus::new(
            &mut self.ram,
            shorten_io_port(self.ppu.as_deref_mut()),
            shorten_io_port(self.apu.as_deref_mut()),
            self.cartridge.as_mut(),
            &mut self.oam_dma_request,
            &mut self.open_bus,
        );
        self.cpu.reset(&mut bus);
    }

    /// Runs one CPU bus cycle. The host paces calls at the console clock
    /// rate (1.789773 MHz NTSC, 1.662607 MHz PAL) and steps the
    /// collaborators in between.
    pub fn tick(&mut self) -> Result<(), Error> {
        let mut bus = CpuBus::new(
            &mut self.ram,
            shorten_io_port(self.ppu.as_deref_mut()),
            shorten_io_port(self.apu.as_deref_mut()),
            self.cartridge.as_mut(),
            &mut self.oam_dma_request,
            &mut self.open_bus,
        );
        self.cpu.tick(&mut bus)
    }

    /// CPU-visible read at `addr`, with all mirroring applied. Observable
    /// side effects of register reads happen exactly as if the CPU did it.
    pub fn read(&mut self, addr: u16) -> u8 {
        let mut bus = CpuBus::new(
            &mut self.ram,
            shorten_io_port(self.ppu.as_deref_mut()),
            shorten_io_port(self.apu.as_deref_mut()),
            self.cartridge.as_mut(),
            &mut self.oam_dma_request,
            &mut self.open_bus,
        );
        bus.read(addr)
    }

    /// CPU-visible write at `addr`.
    pub fn write(&mut self, addr: u16, data: u8) {
        let mut bus = CpuBus::new(
            &mut self.ram,
            shorten_io_port(self.ppu.as_deref_mut()),
            shorten_io_port(self.apu.as_deref_mut()),
            self.cartridge.as_mut(),
            &mut self.oam_dma_request,
            &mut self.open_bus,
        );
        bus.write(addr, data);
    }

    /// Pulses the CPU's NMI input (the PPU raises this at vblank).
    pub fn nmi(&mut self) {
        self.cpu.nmi();
    }

    /// Drives the CPU's level-triggered IRQ line.
    pub fn set_irq_line(&mut self, level: bool) {
        self.cpu.set_irq_line(level);
    }

    pub fn cpu_state(&self) -> CpuState {
        self.cpu.snapshot()
    }

    /// Drains the OAM DMA page latched by a `$4014` write. The 513/514
    /// cycle CPU stall belongs to the host that services the transfer.
    pub fn take_oam_dma_request(&mut self) -> Option<u8> {
        self.oam_dma_request.take()
    }
}

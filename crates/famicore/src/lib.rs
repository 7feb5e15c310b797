pub mod bus;
pub mod cartridge;
pub mod cpu;
pub mod error;
pub mod memory;
pub mod nes;
pub mod ram;

pub use cartridge::{Cartridge, load_cartridge, load_cartridge_from_file};
pub use cpu::{Cpu, CpuState};
pub use error::Error;
pub use nes::Nes;

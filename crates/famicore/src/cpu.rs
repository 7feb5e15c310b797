//! Cycle-stepped MOS 6502 interpreter.
//!
//! The CPU runs one bus cycle per [`Cpu::tick`]. Each cycle consumes one
//! [`CycleJob`] from a small ring buffer: the address bus is driven, the
//! job's internal operation runs (decode may rewrite the job in flight and
//! refill the queue; a taken branch suppresses the fetch), the single bus
//! access happens, and PC advances when asked. The tail of every sequence
//! fetches the next opcode, so the queue never runs dry and read-shaped
//! instructions retire during the following fetch cycle, exactly one
//! documented cycle count apart.

use tracing::error;

use crate::bus::{Bus, STACK_ADDR};
use crate::cpu::addressing::Addressing;
use crate::cpu::instruction::Instruction;
use crate::cpu::lookup::LOOKUP_TABLE;
use crate::cpu::micro_op::{AddressBusSource, BusOp, CycleJob, Index, InternalOp, JobQueue};
use crate::cpu::mnemonic::{AccessKind, Mnemonic};
use crate::cpu::status::Status;
use crate::error::Error;
use crate::memory::cpu as cpu_mem;

pub mod addressing;
pub mod instruction;
pub(crate) mod lookup;
pub(crate) mod micro_op;
pub mod mnemonic;
pub mod status;
#[cfg(test)]
pub(crate) mod timing;

/// Register file snapshot for hosts, debuggers, and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CpuState {
    pub pc: u16,
    pub s: u8,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub p: u8,
    pub cycles: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cpu {
    // Registers
    a: u8,
    x: u8,
    y: u8,
    s: u8,
    p: Status,
    pc: u16,

    // Per-cycle bus state
    address_bus: u16,
    data_bus: u8,
    /// Opcode latched by the last fetch, decoded on the following cycle.
    data_to_decode: u8,
    /// 16-bit workspace: operand bytes, effective address, or pulled PC.
    operand: u16,

    instruction: Option<&'static Instruction>,
    jobs: JobQueue,
    crossed_page: bool,
    /// Low address of the interrupt vector the current entry sequence reads.
    vector: u16,

    // Interrupt pins
    nmi_line: bool,
    nmi_pending: bool,
    irq_line: bool,

    /// Latched fatal decode fault (opcode, pc). Sticky until reset.
    fault: Option<(u8, u16)>,

    cycles: u64,
}

impl Cpu {
    pub fn new() -> Self {
        let mut jobs = JobQueue::new();
        jobs.push(CycleJob::next_fetch(InternalOp::None));
        Self {
            a: 0,
            x: 0,
            y: 0,
            s: 0xFD,
            p: Status::new(),
            pc: 0,
            address_bus: 0,
            data_bus: 0,
            data_to_decode: 0,
            operand: 0,
            instruction: None,
            jobs,
            crossed_page: false,
            vector: cpu_mem::IRQ_VECTOR,
            nmi_line: false,
            nmi_pending: false,
            irq_line: false,
            fault: None,
            cycles: 0,
        }
    }

    /// Power-on/reset: `s = $FD`, interrupts disabled, PC loaded from the
    /// reset vector, and the first opcode fetch queued.
    pub fn reset<B>(&mut self, bus: &mut B)
    where
        B: Bus,
    {
        self.s = 0xFD;
        self.p = Status::new();
        self.instruction = None;
        self.operand = 0;
        self.crossed_page = false;
        self.vector = cpu_mem::IRQ_VECTOR;
        self.nmi_line = false;
        self.nmi_pending = false;
        self.irq_line = false;
        self.fault = None;
        self.cycles = 0;

        let lo = bus.read(cpu_mem::RESET_VECTOR);
        let hi = bus.read(cpu_mem::RESET_VECTOR.wrapping_add(1));
        self.pc = u16::from_le_bytes([lo, hi]);

        self.jobs.clear();
        self.jobs.push(CycleJob::next_fetch(InternalOp::None));
    }

    /// Pulses the NMI line. The edge is latched and taken at the next
    /// instruction boundary.
    pub fn nmi(&mut self) {
        self.set_nmi_line(true);
        self.set_nmi_line(false);
    }

    /// Drives the NMI pin. Only a rising edge arms the latch.
    pub fn set_nmi_line(&mut self, level: bool) {
        if level && !self.nmi_line {
            self.nmi_pending = true;
        }
        self.nmi_line = level;
    }

    /// Asserts the level-triggered IRQ line; it stays asserted until the
    /// host clears it with [`Cpu::set_irq_line`].
    pub fn irq(&mut self) {
        self.set_irq_line(true);
    }

    /// Drives the IRQ pin. Sampled at instruction boundaries while `I` is
    /// clear.
    pub fn set_irq_line(&mut self, level: bool) {
        self.irq_line = level;
    }

    pub fn snapshot(&self) -> CpuState {
        CpuState {
            pc: self.pc,
            s: self.s,
            a: self.a,
            x: self.x,
            y: self.y,
            p: self.p.bits(),
            cycles: self.cycles,
        }
    }

    /// Runs one bus cycle.
    ///
    /// An undocumented opcode latches a fault: the faulting call and every
    /// later one return [`Error::UnimplementedOpcode`] without touching the
    /// machine, so a debugger can inspect the state at the failed cycle.
    pub fn tick<B>(&mut self, bus: &mut B) -> Result<(), Error>
    where
        B: Bus,
    {
        if let Some((opcode, pc)) = self.fault {
            return Err(Error::UnimplementedOpcode { opcode, pc });
        }

        let mut job = loop {
            match self.jobs.pop() {
                // Page-cross penalty cycles are queued unconditionally and
                // discarded for free when the cross did not happen.
                Some(job) if job.page_cross_only && !self.crossed_page => continue,
                Some(job) => break job,
                None => break CycleJob::next_fetch(InternalOp::None),
            }
        };

        self.cycles += 1;

        // 1. Drive the address bus.
        self.address_bus = match job.source {
            AddressBusSource::Pc => self.pc,
            AddressBusSource::Operand => self.operand,
            AddressBusSource::Stack => STACK_ADDR | self.s as u16,
            AddressBusSource::VectorLow => self.vector,
            AddressBusSource::VectorHigh => self.vector.wrapping_add(1),
        };

        // 2. Internal operation.
        let mut skip_fetch = false;
        match job.internal_op {
            InternalOp::None => {}
            InternalOp::Decode => self.decode(&mut job)?,
            InternalOp::Execute => self.execute(),
            InternalOp::LatchAddressLow => {
                self.operand = (self.operand & 0xFF00) | self.data_bus as u16;
            }
            InternalOp::SetPcFromOperand => self.pc = self.operand,
            InternalOp::EvaluateBranch => skip_fetch = self.evaluate_branch(&mut job),
            InternalOp::SpIncrement => self.s = self.s.wrapping_add(1),
            InternalOp::SpDecrement => self.s = self.s.wrapping_sub(1),
            InternalOp::IndexOperandZeroPage(index) => {
                let low = (self.operand as u8).wrapping_add(self.index_value(index));
                self.operand = low as u16;
            }
            InternalOp::FixOperandHigh => {
                if self.crossed_page {
                    self.operand = self.operand.wrapping_add(0x0100);
                }
            }
            InternalOp::PushStatus {
                break_flag,
                disable_irq,
            } => {
                self.data_bus = self.p.pushed(break_flag);
                self.s = self.s.wrapping_sub(1);
                if disable_irq {
                    self.p.insert(Status::INTERRUPT);
                }
            }
            InternalOp::PullStatus => {
                self.p = Status::from_pulled(self.data_bus);
                self.s = self.s.wrapping_add(1);
            }
        }

        // 3. Bus operation.
        if !skip_fetch {
            match job.bus_op {
                BusOp::FetchOpcode => {
                    self.data_bus = bus.read(self.address_bus);
                    if self.interrupt_pending() {
                        // Hijack the boundary: the fetched byte is discarded,
                        // PC stays on the interrupted instruction, and the
                        // seven-cycle entry sequence starts with this cycle.
                        job.increment_pc = false;
                        self.begin_interrupt();
                    } else {
                        self.data_to_decode = self.data_bus;
                        self.jobs.push(CycleJob::next_fetch(InternalOp::Decode));
                    }
                }
                BusOp::FetchData => self.data_bus = bus.read(self.address_bus),
                BusOp::FetchOperandLow => {
                    self.data_bus = bus.read(self.address_bus);
                    self.operand = (self.operand & 0xFF00) | self.data_bus as u16;
                }
                BusOp::FetchOperandHigh => {
                    self.data_bus = bus.read(self.address_bus);
                    self.operand = (self.operand & 0x00FF) | (self.data_bus as u16) << 8;
                }
                BusOp::FetchOperandHighIndexed(index) => {
                    self.data_bus = bus.read(self.address_bus);
                    let (low, crossed) =
                        (self.operand as u8).overflowing_add(self.index_value(index));
                    self.operand = (self.data_bus as u16) << 8 | low as u16;
                    self.crossed_page = crossed;
                }
                BusOp::FetchDataBumpPointer => {
                    self.data_bus = bus.read(self.address_bus);
                    let low = (self.operand as u8).wrapping_add(1);
                    self.operand = (self.operand & 0xFF00) | low as u16;
                }
                BusOp::WriteData => bus.write(self.address_bus, self.data_bus),
                BusOp::WritePcHigh => {
                    self.data_bus = (self.pc >> 8) as u8;
                    bus.write(self.address_bus, self.data_bus);
                }
                BusOp::WritePcLow => {
                    self.data_bus = (self.pc & 0xFF) as u8;
                    bus.write(self.address_bus, self.data_bus);
                }
            }
        }

        // 4. Advance PC.
        if job.increment_pc {
            self.pc = self.pc.wrapping_add(1);
        }

        Ok(())
    }

    fn index_value(&self, index: Index) -> u8 {
        match index {
            Index::X => self.x,
            Index::Y => self.y,
        }
    }

    fn interrupt_pending(&self) -> bool {
        self.nmi_pending || (self.irq_line && !self.p.i())
    }

    /// Queues the remaining six cycles of the interrupt entry sequence.
    /// NMI wins over IRQ and consumes its latch; the status byte goes onto
    /// the stack with B clear.
    fn begin_interrupt(&mut self) {
        self.vector = if self.nmi_pending {
            self.nmi_pending = false;
            cpu_mem::NMI_VECTOR
        } else {
            cpu_mem::IRQ_VECTOR
        };
        self.instruction = None;
        self.operand = 0;
        self.crossed_page = false;

        self.jobs.push(CycleJob::new(
            AddressBusSource::Pc,
            BusOp::FetchData,
            InternalOp::None,
            false,
        ));
        self.jobs.push(CycleJob::new(
            AddressBusSource::Stack,
            BusOp::WritePcHigh,
            InternalOp::SpDecrement,
            false,
        ));
        self.jobs.push(CycleJob::new(
            AddressBusSource::Stack,
            BusOp::WritePcLow,
            InternalOp::SpDecrement,
            false,
        ));
        self.jobs.push(CycleJob::new(
            AddressBusSource::Stack,
            BusOp::WriteData,
            InternalOp::PushStatus {
                break_flag: false,
                disable_irq: true,
            },
            false,
        ));
        self.jobs.push(CycleJob::new(
            AddressBusSource::VectorLow,
            BusOp::FetchOperandLow,
            InternalOp::None,
            false,
        ));
        self.jobs.push(CycleJob::new(
            AddressBusSource::VectorHigh,
            BusOp::FetchOperandHigh,
            InternalOp::None,
            false,
        ));
        self.jobs
            .push(CycleJob::next_fetch(InternalOp::SetPcFromOperand));
    }

    /// Looks up the latched opcode and queues the cycle sequence for its
    /// `(mnemonic, addressing)` pair. The in-flight job is rewritten into
    /// the sequence's second cycle.
    fn decode(&mut self, job: &mut CycleJob) -> Result<(), Error> {
        let opcode = self.data_to_decode;
        let Some(instruction) = LOOKUP_TABLE[opcode as usize].as_ref() else {
            let pc = self.pc.wrapping_sub(1);
            self.fault = Some((opcode, pc));
            error!(opcode, pc, "undocumented opcode");
            return Err(Error::UnimplementedOpcode { opcode, pc });
        };

        self.instruction = Some(instruction);
        self.operand = 0;
        self.crossed_page = false;

        match (instruction.mnemonic, instruction.addressing) {
            (Mnemonic::BRK, _) => {
                // Padding byte read; the pushed PC points past it.
                job.bus_op = BusOp::FetchData;
                self.vector = cpu_mem::IRQ_VECTOR;
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Stack,
                    BusOp::WritePcHigh,
                    InternalOp::SpDecrement,
                    false,
                ));
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Stack,
                    BusOp::WritePcLow,
                    InternalOp::SpDecrement,
                    false,
                ));
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Stack,
                    BusOp::WriteData,
                    InternalOp::PushStatus {
                        break_flag: true,
                        disable_irq: true,
                    },
                    false,
                ));
                self.jobs.push(CycleJob::new(
                    AddressBusSource::VectorLow,
                    BusOp::FetchOperandLow,
                    InternalOp::None,
                    false,
                ));
                self.jobs.push(CycleJob::new(
                    AddressBusSource::VectorHigh,
                    BusOp::FetchOperandHigh,
                    InternalOp::None,
                    false,
                ));
                self.jobs
                    .push(CycleJob::next_fetch(InternalOp::SetPcFromOperand));
            }
            (Mnemonic::RTI, _) => {
                job.bus_op = BusOp::FetchData;
                job.increment_pc = false;
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Stack,
                    BusOp::FetchData,
                    InternalOp::SpIncrement,
                    false,
                ));
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Stack,
                    BusOp::FetchData,
                    InternalOp::SpIncrement,
                    false,
                ));
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Stack,
                    BusOp::FetchOperandLow,
                    InternalOp::PullStatus,
                    false,
                ));
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Stack,
                    BusOp::FetchOperandHigh,
                    InternalOp::None,
                    false,
                ));
                self.jobs
                    .push(CycleJob::next_fetch(InternalOp::SetPcFromOperand));
            }
            (Mnemonic::RTS, _) => {
                job.bus_op = BusOp::FetchData;
                job.increment_pc = false;
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Stack,
                    BusOp::FetchData,
                    InternalOp::SpIncrement,
                    false,
                ));
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Stack,
                    BusOp::FetchOperandLow,
                    InternalOp::SpIncrement,
                    false,
                ));
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Stack,
                    BusOp::FetchOperandHigh,
                    InternalOp::None,
                    false,
                ));
                // The pulled address points at JSR's last byte; the extra
                // increment lands on the next instruction.
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Operand,
                    BusOp::FetchData,
                    InternalOp::SetPcFromOperand,
                    true,
                ));
                self.jobs.push(CycleJob::next_fetch(InternalOp::None));
            }
            (Mnemonic::PHA, _) | (Mnemonic::PHP, _) => {
                job.bus_op = BusOp::FetchData;
                job.increment_pc = false;
                let internal = if instruction.mnemonic == Mnemonic::PHP {
                    InternalOp::PushStatus {
                        break_flag: true,
                        disable_irq: false,
                    }
                } else {
                    InternalOp::Execute
                };
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Stack,
                    BusOp::WriteData,
                    internal,
                    false,
                ));
                self.jobs.push(CycleJob::next_fetch(InternalOp::None));
            }
            (Mnemonic::PLA, _) | (Mnemonic::PLP, _) => {
                job.bus_op = BusOp::FetchData;
                job.increment_pc = false;
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Stack,
                    BusOp::FetchData,
                    InternalOp::SpIncrement,
                    false,
                ));
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Stack,
                    BusOp::FetchData,
                    InternalOp::None,
                    false,
                ));
                self.jobs.push(CycleJob::next_fetch(InternalOp::Execute));
            }
            (Mnemonic::JSR, _) => {
                job.bus_op = BusOp::FetchOperandLow;
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Stack,
                    BusOp::FetchData,
                    InternalOp::None,
                    false,
                ));
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Stack,
                    BusOp::WritePcHigh,
                    InternalOp::SpDecrement,
                    false,
                ));
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Stack,
                    BusOp::WritePcLow,
                    InternalOp::SpDecrement,
                    false,
                ));
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Pc,
                    BusOp::FetchOperandHigh,
                    InternalOp::None,
                    false,
                ));
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Operand,
                    BusOp::FetchOpcode,
                    InternalOp::Execute,
                    true,
                ));
            }
            (Mnemonic::JMP, Addressing::AbsoluteIndirect) => {
                job.bus_op = BusOp::FetchOperandLow;
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Pc,
                    BusOp::FetchOperandHigh,
                    InternalOp::None,
                    true,
                ));
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Operand,
                    BusOp::FetchDataBumpPointer,
                    InternalOp::None,
                    false,
                ));
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Operand,
                    BusOp::FetchOperandHigh,
                    InternalOp::LatchAddressLow,
                    false,
                ));
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Operand,
                    BusOp::FetchOpcode,
                    InternalOp::Execute,
                    true,
                ));
            }
            (Mnemonic::JMP, _) => {
                job.bus_op = BusOp::FetchOperandLow;
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Pc,
                    BusOp::FetchOperandHigh,
                    InternalOp::None,
                    false,
                ));
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Operand,
                    BusOp::FetchOpcode,
                    InternalOp::Execute,
                    true,
                ));
            }
            (_, Addressing::Implied | Addressing::Accumulator) => {
                job.bus_op = BusOp::FetchData;
                job.increment_pc = false;
                self.jobs.push(CycleJob::next_fetch(InternalOp::Execute));
            }
            (_, Addressing::Immediate) => {
                job.bus_op = BusOp::FetchData;
                self.jobs.push(CycleJob::next_fetch(InternalOp::Execute));
            }
            (_, Addressing::Relative) => {
                job.bus_op = BusOp::FetchOperandLow;
                self.jobs
                    .push(CycleJob::next_fetch(InternalOp::EvaluateBranch));
            }
            (_, Addressing::ZeroPage) => {
                job.bus_op = BusOp::FetchOperandLow;
                self.push_memory_access(instruction);
            }
            (_, Addressing::XIndexedZeroPage) => {
                job.bus_op = BusOp::FetchOperandLow;
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Operand,
                    BusOp::FetchData,
                    InternalOp::IndexOperandZeroPage(Index::X),
                    false,
                ));
                self.push_memory_access(instruction);
            }
            (_, Addressing::YIndexedZeroPage) => {
                job.bus_op = BusOp::FetchOperandLow;
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Operand,
                    BusOp::FetchData,
                    InternalOp::IndexOperandZeroPage(Index::Y),
                    false,
                ));
                self.push_memory_access(instruction);
            }
            (_, Addressing::Absolute) => {
                job.bus_op = BusOp::FetchOperandLow;
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Pc,
                    BusOp::FetchOperandHigh,
                    InternalOp::None,
                    true,
                ));
                self.push_memory_access(instruction);
            }
            (_, Addressing::XIndexedAbsolute) => {
                job.bus_op = BusOp::FetchOperandLow;
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Pc,
                    BusOp::FetchOperandHighIndexed(Index::X),
                    InternalOp::None,
                    true,
                ));
                self.push_indexed_memory_access(instruction);
            }
            (_, Addressing::YIndexedAbsolute) => {
                job.bus_op = BusOp::FetchOperandLow;
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Pc,
                    BusOp::FetchOperandHighIndexed(Index::Y),
                    InternalOp::None,
                    true,
                ));
                self.push_indexed_memory_access(instruction);
            }
            (_, Addressing::XIndexedZeroPageIndirect) => {
                job.bus_op = BusOp::FetchOperandLow;
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Operand,
                    BusOp::FetchData,
                    InternalOp::IndexOperandZeroPage(Index::X),
                    false,
                ));
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Operand,
                    BusOp::FetchDataBumpPointer,
                    InternalOp::None,
                    false,
                ));
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Operand,
                    BusOp::FetchOperandHigh,
                    InternalOp::LatchAddressLow,
                    false,
                ));
                self.push_memory_access(instruction);
            }
            (_, Addressing::ZeroPageIndirectYIndexed) => {
                job.bus_op = BusOp::FetchOperandLow;
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Operand,
                    BusOp::FetchDataBumpPointer,
                    InternalOp::None,
                    false,
                ));
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Operand,
                    BusOp::FetchOperandHighIndexed(Index::Y),
                    InternalOp::LatchAddressLow,
                    false,
                ));
                self.push_indexed_memory_access(instruction);
            }
            (_, Addressing::AbsoluteIndirect) => {
                unreachable!("only JMP uses absolute indirect")
            }
        }

        Ok(())
    }

    /// Tail cycles once the effective address sits in the operand workspace.
    fn push_memory_access(&mut self, instruction: &Instruction) {
        match instruction.mnemonic.access_kind() {
            AccessKind::Read => {
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Operand,
                    BusOp::FetchData,
                    InternalOp::None,
                    false,
                ));
                self.jobs.push(CycleJob::next_fetch(InternalOp::Execute));
            }
            AccessKind::Write => {
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Operand,
                    BusOp::WriteData,
                    InternalOp::Execute,
                    false,
                ));
                self.jobs.push(CycleJob::next_fetch(InternalOp::None));
            }
            AccessKind::Modify => {
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Operand,
                    BusOp::FetchData,
                    InternalOp::None,
                    false,
                ));
                // The unmodified value goes back first; real boards can see
                // both writes.
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Operand,
                    BusOp::WriteData,
                    InternalOp::None,
                    false,
                ));
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Operand,
                    BusOp::WriteData,
                    InternalOp::Execute,
                    false,
                ));
                self.jobs.push(CycleJob::next_fetch(InternalOp::None));
            }
        }
    }

    /// Tail cycles for the index-adding modes. The first access goes to the
    /// partially-indexed address; reads keep it when no page was crossed,
    /// writes and modifies always pay the fix-up cycle.
    fn push_indexed_memory_access(&mut self, instruction: &Instruction) {
        match instruction.mnemonic.access_kind() {
            AccessKind::Read => {
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Operand,
                    BusOp::FetchData,
                    InternalOp::FixOperandHigh,
                    false,
                ));
                self.jobs.push(CycleJob::cross_only(
                    AddressBusSource::Operand,
                    BusOp::FetchData,
                    InternalOp::None,
                ));
                self.jobs.push(CycleJob::next_fetch(InternalOp::Execute));
            }
            AccessKind::Write => {
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Operand,
                    BusOp::FetchData,
                    InternalOp::FixOperandHigh,
                    false,
                ));
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Operand,
                    BusOp::WriteData,
                    InternalOp::Execute,
                    false,
                ));
                self.jobs.push(CycleJob::next_fetch(InternalOp::None));
            }
            AccessKind::Modify => {
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Operand,
                    BusOp::FetchData,
                    InternalOp::FixOperandHigh,
                    false,
                ));
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Operand,
                    BusOp::FetchData,
                    InternalOp::None,
                    false,
                ));
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Operand,
                    BusOp::WriteData,
                    InternalOp::None,
                    false,
                ));
                self.jobs.push(CycleJob::new(
                    AddressBusSource::Operand,
                    BusOp::WriteData,
                    InternalOp::Execute,
                    false,
                ));
                self.jobs.push(CycleJob::next_fetch(InternalOp::None));
            }
        }
    }

    /// Branch resolution on what would be the next opcode fetch. A taken
    /// branch eats this cycle, adjusts PC low, and queues the page fix-up
    /// when the target crosses.
    fn evaluate_branch(&mut self, job: &mut CycleJob) -> bool {
        let Some(instruction) = self.instruction else {
            return false;
        };
        let taken = match instruction.mnemonic {
            Mnemonic::BCC => !self.p.c(),
            Mnemonic::BCS => self.p.c(),
            Mnemonic::BNE => !self.p.z(),
            Mnemonic::BEQ => self.p.z(),
            Mnemonic::BPL => !self.p.n(),
            Mnemonic::BMI => self.p.n(),
            Mnemonic::BVC => !self.p.v(),
            Mnemonic::BVS => self.p.v(),
            _ => unreachable!("branch evaluation outside a branch"),
        };
        if !taken {
            return false;
        }

        job.increment_pc = false;
        let offset = self.operand as u8 as i8;
        let target = self.pc.wrapping_add(offset as u16);
        if target & 0xFF00 == self.pc & 0xFF00 {
            self.pc = target;
            self.jobs.push(CycleJob::next_fetch(InternalOp::None));
        } else {
            // Only the low byte lands this cycle; the fix-up cycle performs
            // the dummy read at the stale page before correcting PC.
            self.operand = target;
            self.pc = (self.pc & 0xFF00) | (target & 0x00FF);
            self.jobs.push(CycleJob::new(
                AddressBusSource::Pc,
                BusOp::FetchData,
                InternalOp::SetPcFromOperand,
                false,
            ));
            self.jobs.push(CycleJob::next_fetch(InternalOp::None));
        }
        true
    }

    /// Register effects of the current instruction. Reads consume the data
    /// bus, writes and modifies leave their result on it for the write that
    /// follows in the same cycle.
    fn execute(&mut self) {
        let Some(instruction) = self.instruction else {
            return;
        };
        match instruction.mnemonic {
            Mnemonic::LDA => {
                self.a = self.data_bus;
                self.p.update_nz(self.a);
            }
            Mnemonic::LDX => {
                self.x = self.data_bus;
                self.p.update_nz(self.x);
            }
            Mnemonic::LDY => {
                self.y = self.data_bus;
                self.p.update_nz(self.y);
            }
            Mnemonic::STA => self.data_bus = self.a,
            Mnemonic::STX => self.data_bus = self.x,
            Mnemonic::STY => self.data_bus = self.y,
            Mnemonic::TAX => {
                self.x = self.a;
                self.p.update_nz(self.x);
            }
            Mnemonic::TAY => {
                self.y = self.a;
                self.p.update_nz(self.y);
            }
            Mnemonic::TSX => {
                self.x = self.s;
                self.p.update_nz(self.x);
            }
            Mnemonic::TXA => {
                self.a = self.x;
                self.p.update_nz(self.a);
            }
            Mnemonic::TXS => self.s = self.x,
            Mnemonic::TYA => {
                self.a = self.y;
                self.p.update_nz(self.a);
            }
            Mnemonic::PHA => {
                self.data_bus = self.a;
                self.s = self.s.wrapping_sub(1);
            }
            Mnemonic::PLA => {
                self.a = self.data_bus;
                self.p.update_nz(self.a);
            }
            Mnemonic::PLP => self.p = Status::from_pulled(self.data_bus),
            Mnemonic::AND => {
                self.a &= self.data_bus;
                self.p.update_nz(self.a);
            }
            Mnemonic::ORA => {
                self.a |= self.data_bus;
                self.p.update_nz(self.a);
            }
            Mnemonic::EOR => {
                self.a ^= self.data_bus;
                self.p.update_nz(self.a);
            }
            Mnemonic::BIT => {
                let m = self.data_bus;
                self.p.set(Status::ZERO, self.a & m == 0);
                self.p.set(Status::NEGATIVE, m & 0x80 != 0);
                self.p.set(Status::OVERFLOW, m & 0x40 != 0);
            }
            Mnemonic::ADC => self.add_with_carry(self.data_bus),
            // The 2A03 has no decimal mode: SBC is ADC of the complement
            // regardless of the D flag.
            Mnemonic::SBC => self.add_with_carry(self.data_bus ^ 0xFF),
            Mnemonic::CMP => self.compare(self.a),
            Mnemonic::CPX => self.compare(self.x),
            Mnemonic::CPY => self.compare(self.y),
            Mnemonic::INC => {
                self.data_bus = self.data_bus.wrapping_add(1);
                self.p.update_nz(self.data_bus);
            }
            Mnemonic::DEC => {
                self.data_bus = self.data_bus.wrapping_sub(1);
                self.p.update_nz(self.data_bus);
            }
            Mnemonic::INX => {
                self.x = self.x.wrapping_add(1);
                self.p.update_nz(self.x);
            }
            Mnemonic::INY => {
                self.y = self.y.wrapping_add(1);
                self.p.update_nz(self.y);
            }
            Mnemonic::DEX => {
                self.x = self.x.wrapping_sub(1);
                self.p.update_nz(self.x);
            }
            Mnemonic::DEY => {
                self.y = self.y.wrapping_sub(1);
                self.p.update_nz(self.y);
            }
            Mnemonic::ASL | Mnemonic::LSR | Mnemonic::ROL | Mnemonic::ROR => {
                let value = if instruction.addressing == Addressing::Accumulator {
                    self.a
                } else {
                    self.data_bus
                };
                let (result, carry) = match instruction.mnemonic {
                    Mnemonic::ASL => (value << 1, value & 0x80 != 0),
                    Mnemonic::LSR => (value >> 1, value & 0x01 != 0),
                    Mnemonic::ROL => (value << 1 | self.p.c() as u8, value & 0x80 != 0),
                    Mnemonic::ROR => (value >> 1 | (self.p.c() as u8) << 7, value & 0x01 != 0),
                    _ => unreachable!("shift arm"),
                };
                self.p.set(Status::CARRY, carry);
                self.p.update_nz(result);
                if instruction.addressing == Addressing::Accumulator {
                    self.a = result;
                } else {
                    self.data_bus = result;
                }
            }
            Mnemonic::JMP | Mnemonic::JSR => self.pc = self.operand,
            Mnemonic::CLC => self.p.remove(Status::CARRY),
            Mnemonic::SEC => self.p.insert(Status::CARRY),
            Mnemonic::CLI => self.p.remove(Status::INTERRUPT),
            Mnemonic::SEI => self.p.insert(Status::INTERRUPT),
            Mnemonic::CLV => self.p.remove(Status::OVERFLOW),
            Mnemonic::CLD => self.p.remove(Status::DECIMAL),
            Mnemonic::SED => self.p.insert(Status::DECIMAL),
            Mnemonic::NOP => {}
            Mnemonic::BRK
            | Mnemonic::RTI
            | Mnemonic::RTS
            | Mnemonic::PHP
            | Mnemonic::BCC
            | Mnemonic::BCS
            | Mnemonic::BEQ
            | Mnemonic::BMI
            | Mnemonic::BNE
            | Mnemonic::BPL
            | Mnemonic::BVC
            | Mnemonic::BVS => unreachable!("handled by the cycle scheduler"),
        }
    }

    fn add_with_carry(&mut self, m: u8) {
        let sum = self.a as u16 + m as u16 + self.p.c() as u16;
        let result = sum as u8;
        self.p.set(Status::CARRY, sum > 0xFF);
        self.p
            .set(Status::OVERFLOW, (self.a ^ result) & (m ^ result) & 0x80 != 0);
        self.a = result;
        self.p.update_nz(result);
    }

    fn compare(&mut self, reg: u8) {
        let m = self.data_bus;
        self.p.set(Status::CARRY, reg >= m);
        self.p.update_nz(reg.wrapping_sub(m));
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::bus::mock::MockBus;
    use crate::cpu::timing::{CYCLE_TABLE, Timing};

    const ORG: u16 = 0x8000;

    /// Resets the CPU and runs the first opcode fetch, leaving the decode
    /// job at the head of the queue.
    fn prime(cpu: &mut Cpu, bus: &mut MockBus) {
        cpu.reset(bus);
        cpu.tick(bus).expect("fetch");
    }

    /// Runs exactly one instruction (after [`prime`]) and returns its cycle
    /// count. The returned count spans decode through the overlapped fetch
    /// of the next opcode, which is the instruction's documented length.
    fn run_instruction(cpu: &mut Cpu, bus: &mut MockBus) -> u64 {
        let start = cpu.cycles;
        loop {
            cpu.tick(bus).expect("tick");
            if cpu.jobs.len() == 1
                && cpu
                    .jobs
                    .front()
                    .is_some_and(|job| job.internal_op == InternalOp::Decode)
            {
                break;
            }
        }
        cpu.cycles - start
    }

    fn setup(program: &[u8]) -> (Cpu, MockBus) {
        let mut bus = MockBus::with_program(ORG, program);
        let mut cpu = Cpu::new();
        prime(&mut cpu, &mut bus);
        (cpu, bus)
    }

    #[test]
    fn reset_loads_vector_and_flags() {
        let mut bus = MockBus::default();
        bus.mem[0xFFFC] = 0x34;
        bus.mem[0xFFFD] = 0x12;
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);

        let state = cpu.snapshot();
        assert_eq!(state.pc, 0x1234);
        assert_eq!(state.s, 0xFD);
        assert_ne!(state.p & Status::INTERRUPT.bits(), 0);
        assert_eq!(state.cycles, 0);
    }

    #[test]
    fn lda_immediate_loads_and_flags() {
        let (mut cpu, mut bus) = setup(&[0xA9, 0x42, 0xEA]);

        let cycles = run_instruction(&mut cpu, &mut bus);

        assert_eq!(cycles, 2);
        assert_eq!(cpu.a, 0x42);
        assert!(!cpu.p.z());
        assert!(!cpu.p.n());
    }

    #[test]
    fn lda_immediate_zero_sets_z() {
        let (mut cpu, mut bus) = setup(&[0xA9, 0x00, 0xEA]);
        run_instruction(&mut cpu, &mut bus);
        assert!(cpu.p.z());
    }

    #[test]
    fn lda_absolute_reads_memory() {
        let (mut cpu, mut bus) = setup(&[0xAD, 0x34, 0x12, 0xEA]);
        bus.mem[0x1234] = 0x99;

        let cycles = run_instruction(&mut cpu, &mut bus);

        assert_eq!(cycles, 4);
        assert_eq!(cpu.a, 0x99);
        assert!(cpu.p.n());
    }

    #[test]
    fn sta_absolute_writes_memory() {
        let (mut cpu, mut bus) = setup(&[0x8D, 0x00, 0x02, 0xEA]);
        cpu.a = 0x5A;

        let cycles = run_instruction(&mut cpu, &mut bus);

        assert_eq!(cycles, 4);
        assert_eq!(bus.mem[0x0200], 0x5A);
    }

    #[test]
    fn lda_absolute_x_page_cross_costs_a_cycle() {
        let (mut cpu, mut bus) = setup(&[0xBD, 0xF0, 0x12, 0xEA]);
        cpu.x = 0x05;
        bus.mem[0x12F5] = 0x11;
        assert_eq!(run_instruction(&mut cpu, &mut bus), 4);
        assert_eq!(cpu.a, 0x11);

        let (mut cpu, mut bus) = setup(&[0xBD, 0xF0, 0x12, 0xEA]);
        cpu.x = 0x20;
        bus.mem[0x1310] = 0x22;
        assert_eq!(run_instruction(&mut cpu, &mut bus), 5);
        assert_eq!(cpu.a, 0x22);
    }

    #[test]
    fn sta_absolute_x_always_pays_the_fix_cycle() {
        let (mut cpu, mut bus) = setup(&[0x9D, 0x00, 0x02, 0xEA]);
        cpu.a = 0x77;
        cpu.x = 0x01;
        assert_eq!(run_instruction(&mut cpu, &mut bus), 5);
        assert_eq!(bus.mem[0x0201], 0x77);
    }

    #[test]
    fn zero_page_indexed_wraps_in_page() {
        let (mut cpu, mut bus) = setup(&[0xB5, 0xF5, 0xEA]);
        cpu.x = 0x10;
        bus.mem[0x0005] = 0xAB; // $F5 + $10 wraps to $05

        let cycles = run_instruction(&mut cpu, &mut bus);

        assert_eq!(cycles, 4);
        assert_eq!(cpu.a, 0xAB);
    }

    #[test]
    fn indirect_x_reads_through_pointer() {
        let (mut cpu, mut bus) = setup(&[0xA1, 0x20, 0xEA]);
        cpu.x = 0x04;
        bus.mem[0x0024] = 0x74;
        bus.mem[0x0025] = 0x20;
        bus.mem[0x2074] = 0xC3;

        let cycles = run_instruction(&mut cpu, &mut bus);

        assert_eq!(cycles, 6);
        assert_eq!(cpu.a, 0xC3);
    }

    #[test]
    fn indirect_x_pointer_wraps_in_zero_page() {
        let (mut cpu, mut bus) = setup(&[0xA1, 0xFB, 0xEA]);
        cpu.x = 0x04; // pointer at $FF, high byte from $00
        bus.mem[0x00FF] = 0x11;
        bus.mem[0x0000] = 0x22;
        bus.mem[0x2211] = 0x33;

        run_instruction(&mut cpu, &mut bus);

        assert_eq!(cpu.a, 0x33);
    }

    #[test]
    fn indirect_y_page_cross_costs_a_cycle() {
        let (mut cpu, mut bus) = setup(&[0xB1, 0x20, 0xEA]);
        cpu.y = 0x05;
        bus.mem[0x0020] = 0x50;
        bus.mem[0x0021] = 0x60;
        bus.mem[0x6055] = 0x44;
        assert_eq!(run_instruction(&mut cpu, &mut bus), 5);
        assert_eq!(cpu.a, 0x44);

        let (mut cpu, mut bus) = setup(&[0xB1, 0x20, 0xEA]);
        cpu.y = 0x20;
        bus.mem[0x0020] = 0xF0;
        bus.mem[0x0021] = 0x60;
        bus.mem[0x6110] = 0x55;
        assert_eq!(run_instruction(&mut cpu, &mut bus), 6);
        assert_eq!(cpu.a, 0x55);
    }

    #[test]
    fn rmw_absolute_double_writes() {
        let (mut cpu, mut bus) = setup(&[0xEE, 0x00, 0x02, 0xEA]);
        bus.mem[0x0200] = 0x7F;

        let cycles = run_instruction(&mut cpu, &mut bus);

        assert_eq!(cycles, 6);
        assert_eq!(bus.mem[0x0200], 0x80);
        assert!(cpu.p.n());
        assert!(!cpu.p.z());
    }

    #[test]
    fn asl_accumulator_shifts_in_place() {
        let (mut cpu, mut bus) = setup(&[0x0A, 0xEA]);
        cpu.a = 0b1100_0001;

        let cycles = run_instruction(&mut cpu, &mut bus);

        assert_eq!(cycles, 2);
        assert_eq!(cpu.a, 0b1000_0010);
        assert!(cpu.p.c());
        assert!(cpu.p.n());
    }

    #[test]
    fn ror_memory_rotates_through_carry() {
        let (mut cpu, mut bus) = setup(&[0x66, 0x10, 0xEA]);
        cpu.p.insert(Status::CARRY);
        bus.mem[0x0010] = 0b0000_0011;

        let cycles = run_instruction(&mut cpu, &mut bus);

        assert_eq!(cycles, 5);
        assert_eq!(bus.mem[0x0010], 0b1000_0001);
        assert!(cpu.p.c());
    }

    #[test]
    fn jmp_absolute_sets_pc() {
        let (mut cpu, mut bus) = setup(&[0x4C, 0x00, 0x90]);
        bus.mem[0x9000] = 0xEA;

        let cycles = run_instruction(&mut cpu, &mut bus);

        assert_eq!(cycles, 3);
        // The overlapped fetch already advanced PC past the target.
        assert_eq!(cpu.pc, 0x9001);
    }

    #[test]
    fn jmp_indirect_honors_page_wrap_quirk() {
        let (mut cpu, mut bus) = setup(&[0x6C, 0xFF, 0x02]);
        bus.mem[0x02FF] = 0x00;
        bus.mem[0x0300] = 0x40; // the correct high byte, never read
        bus.mem[0x0200] = 0x90; // the quirk reads the wrapped address
        bus.mem[0x9000] = 0xEA;

        let cycles = run_instruction(&mut cpu, &mut bus);

        assert_eq!(cycles, 5);
        assert_eq!(cpu.pc, 0x9001);
    }

    #[test]
    fn jsr_pushes_return_address_and_rts_comes_back() {
        // JSR $8010 at $8000; the subroutine is a lone RTS.
        let mut program = vec![0x20, 0x10, 0x80, 0xEA];
        program.resize(0x10, 0xEA);
        program.push(0x60); // $8010: RTS
        let (mut cpu, mut bus) = setup(&program);

        let jsr_cycles = run_instruction(&mut cpu, &mut bus);
        assert_eq!(jsr_cycles, 6);
        // The pushed address is the last byte of the JSR operand.
        assert_eq!(bus.mem[0x01FD], 0x80);
        assert_eq!(bus.mem[0x01FC], 0x02);
        assert_eq!(cpu.s, 0xFB);
        assert_eq!(cpu.pc, 0x8011); // past the fetched RTS opcode

        let rts_cycles = run_instruction(&mut cpu, &mut bus);
        assert_eq!(rts_cycles, 6);
        assert_eq!(cpu.pc, 0x8004); // past the NOP after JSR
        assert_eq!(cpu.s, 0xFD);
    }

    #[test]
    fn branch_not_taken_is_two_cycles() {
        let (mut cpu, mut bus) = setup(&[0xD0, 0x02, 0xEA, 0xEA, 0xEA]);
        cpu.p.insert(Status::ZERO); // BNE falls through

        let cycles = run_instruction(&mut cpu, &mut bus);

        assert_eq!(cycles, 2);
        assert_eq!(cpu.pc, ORG + 3); // past the fetched next opcode
    }

    #[test]
    fn branch_taken_same_page_is_three_cycles() {
        let (mut cpu, mut bus) = setup(&[0xD0, 0x02, 0xEA, 0xEA, 0xEA]);
        cpu.p.remove(Status::ZERO);

        let cycles = run_instruction(&mut cpu, &mut bus);

        assert_eq!(cycles, 3);
        assert_eq!(cpu.pc, ORG + 5);
    }

    #[test]
    fn branch_page_cross_is_four_cycles() {
        // BNE +2 at $80FD: target $8101 crosses a page.
        let mut bus = MockBus::default();
        bus.mem[0x80FD] = 0xD0;
        bus.mem[0x80FE] = 0x02;
        bus.mem[0x8101] = 0xEA;
        bus.mem[0xFFFC] = 0xFD;
        bus.mem[0xFFFD] = 0x80;
        let mut cpu = Cpu::new();
        prime(&mut cpu, &mut bus);
        cpu.p.remove(Status::ZERO);

        let cycles = run_instruction(&mut cpu, &mut bus);

        assert_eq!(cycles, 4);
        assert_eq!(cpu.pc, 0x8102);
    }

    #[test]
    fn backward_branch_works() {
        // NOP; BNE -3 lands back on the NOP.
        let (mut cpu, mut bus) = setup(&[0xEA, 0xD0, 0xFD, 0xEA]);
        run_instruction(&mut cpu, &mut bus); // NOP

        let cycles = run_instruction(&mut cpu, &mut bus);

        assert_eq!(cycles, 3);
        assert_eq!(cpu.pc, ORG + 1); // past the re-fetched NOP
    }

    #[test]
    fn brk_enters_the_irq_vector_with_b_set() {
        let (mut cpu, mut bus) = setup(&[0x00, 0xFF, 0xEA]);
        bus.mem[0xFFFE] = 0x00;
        bus.mem[0xFFFF] = 0x90;
        bus.mem[0x9000] = 0xEA;

        let cycles = run_instruction(&mut cpu, &mut bus);

        assert_eq!(cycles, 7);
        assert_eq!(cpu.pc, 0x9001);
        assert!(cpu.p.i());
        // Pushed PC skips the padding byte; pushed status has B and U set.
        assert_eq!(bus.mem[0x01FD], 0x80);
        assert_eq!(bus.mem[0x01FC], 0x02);
        assert_ne!(bus.mem[0x01FB] & Status::BREAK.bits(), 0);
        assert_ne!(bus.mem[0x01FB] & Status::UNUSED.bits(), 0);
    }

    #[test]
    fn rti_restores_status_and_pc() {
        let (mut cpu, mut bus) = setup(&[0x00, 0xFF, 0xEA, 0xEA]);
        bus.mem[0xFFFE] = 0x00;
        bus.mem[0xFFFF] = 0x90;
        bus.mem[0x9000] = 0x40; // RTI
        cpu.p.insert(Status::CARRY);

        run_instruction(&mut cpu, &mut bus); // BRK
        let rti_cycles = run_instruction(&mut cpu, &mut bus);

        assert_eq!(rti_cycles, 6);
        assert_eq!(cpu.pc, 0x8003); // resumed past the BRK padding byte
        assert!(cpu.p.c());
        assert_eq!(cpu.s, 0xFD);
    }

    #[test]
    fn nmi_dispatches_at_instruction_boundary() {
        let (mut cpu, mut bus) = setup(&[0xEA, 0xEA, 0xEA]);
        bus.mem[0xFFFA] = 0x00;
        bus.mem[0xFFFB] = 0x90;
        bus.mem[0x9000] = 0xEA;

        cpu.nmi();
        let start = cpu.cycles;
        // NOP (2 cycles, its tail hijacked) + 7-cycle entry; run until the
        // handler's first instruction is decoded.
        loop {
            cpu.tick(&mut bus).expect("tick");
            if cpu.jobs.len() == 1
                && cpu
                    .jobs
                    .front()
                    .is_some_and(|job| job.internal_op == InternalOp::Decode)
            {
                break;
            }
        }

        assert_eq!(cpu.cycles - start, 2 + 7);
        assert_eq!(cpu.pc, 0x9001);
        assert!(cpu.p.i());
        // Return address is the instruction after the NOP; B stays clear.
        assert_eq!(bus.mem[0x01FD], 0x80);
        assert_eq!(bus.mem[0x01FC], 0x01);
        assert_eq!(bus.mem[0x01FB] & Status::BREAK.bits(), 0);
    }

    #[test]
    fn nmi_is_edge_triggered() {
        let (mut cpu, _bus) = setup(&[0xEA, 0xEA]);
        cpu.set_nmi_line(true);
        cpu.set_nmi_line(true); // held level must not re-arm
        assert!(cpu.nmi_pending);
        cpu.nmi_pending = false;
        cpu.set_nmi_line(true);
        assert!(!cpu.nmi_pending);
        cpu.set_nmi_line(false);
        cpu.set_nmi_line(true);
        assert!(cpu.nmi_pending);
    }

    #[test]
    fn irq_respects_interrupt_disable() {
        let (mut cpu, mut bus) = setup(&[0xEA, 0xEA, 0xEA, 0xEA]);
        bus.mem[0xFFFE] = 0x00;
        bus.mem[0xFFFF] = 0x90;
        bus.mem[0x9000] = 0xEA;

        cpu.irq();
        // Reset leaves I set: the IRQ must be held off.
        run_instruction(&mut cpu, &mut bus);
        assert_eq!(cpu.pc, ORG + 2);

        cpu.p.remove(Status::INTERRUPT);
        let start = cpu.cycles;
        loop {
            cpu.tick(&mut bus).expect("tick");
            if cpu.jobs.len() == 1
                && cpu
                    .jobs
                    .front()
                    .is_some_and(|job| job.internal_op == InternalOp::Decode)
            {
                break;
            }
        }
        assert_eq!(cpu.cycles - start, 2 + 7);
        assert_eq!(cpu.pc, 0x9001);
    }

    #[test]
    fn undocumented_opcode_faults_and_stays_faulted() {
        let (mut cpu, mut bus) = setup(&[0x02]);

        let err = cpu.tick(&mut bus).expect_err("fault");
        assert!(matches!(
            err,
            Error::UnimplementedOpcode {
                opcode: 0x02,
                pc: ORG,
            }
        ));

        let state = cpu.snapshot();
        let err = cpu.tick(&mut bus).expect_err("still faulted");
        assert!(matches!(err, Error::UnimplementedOpcode { .. }));
        assert_eq!(cpu.snapshot(), state);
    }

    #[test]
    fn stack_page_is_fixed_at_0100() {
        let (mut cpu, mut bus) = setup(&[0x48, 0xEA]); // PHA
        cpu.a = 0xD7;
        cpu.s = 0x00; // push at the bottom wraps the pointer, not the page

        let cycles = run_instruction(&mut cpu, &mut bus);

        assert_eq!(cycles, 3);
        assert_eq!(bus.mem[0x0100], 0xD7);
        assert_eq!(cpu.s, 0xFF);
    }

    #[test]
    fn php_plp_round_trip_preserves_flags() {
        let (mut cpu, mut bus) = setup(&[0x08, 0x28, 0xEA]);
        cpu.p = Status::from_bits_retain(0b1100_0011);
        let before = cpu.p;

        run_instruction(&mut cpu, &mut bus); // PHP
        run_instruction(&mut cpu, &mut bus); // PLP

        let mask = !(Status::BREAK | Status::UNUSED).bits();
        assert_eq!(cpu.p.bits() & mask, before.bits() & mask);
    }

    #[test]
    fn decimal_flag_is_storable_but_ignored() {
        // SED; LDA #$09; ADC #$01 — binary result, not BCD.
        let (mut cpu, mut bus) = setup(&[0xF8, 0xA9, 0x09, 0x69, 0x01, 0xEA]);

        run_instruction(&mut cpu, &mut bus);
        run_instruction(&mut cpu, &mut bus);
        run_instruction(&mut cpu, &mut bus);

        assert!(cpu.p.contains(Status::DECIMAL));
        assert_eq!(cpu.a, 0x0A);
    }

    /// Per-opcode conformance against the canonical cycle table, without a
    /// page cross.
    #[test]
    fn documented_opcodes_match_cycle_table() {
        for slot in LOOKUP_TABLE.iter().flatten() {
            // Branches depend on flag state and are timed separately.
            if slot.addressing == Addressing::Relative {
                continue;
            }
            let cycles = run_opcode(slot, 0x04);
            let expected = CYCLE_TABLE[slot.opcode as usize].total_cycles(false, false);
            assert_eq!(cycles, expected, "opcode {:#04X}", slot.opcode);
        }
    }

    /// Opcodes with a page-cross penalty, forced to cross.
    #[test]
    fn page_cross_penalties_match_cycle_table() {
        for slot in LOOKUP_TABLE.iter().flatten() {
            if !matches!(CYCLE_TABLE[slot.opcode as usize], Timing::PageCross(_)) {
                continue;
            }
            let cycles = run_opcode(slot, 0x40);
            let expected = CYCLE_TABLE[slot.opcode as usize].total_cycles(true, false);
            assert_eq!(cycles, expected, "opcode {:#04X}", slot.opcode);
        }
    }

    /// All eight branches, taken and not taken.
    #[test]
    fn branch_timing_matches_cycle_table() {
        let branches = [
            (0x90u8, Status::CARRY, false),
            (0xB0, Status::CARRY, true),
            (0xD0, Status::ZERO, false),
            (0xF0, Status::ZERO, true),
            (0x10, Status::NEGATIVE, false),
            (0x30, Status::NEGATIVE, true),
            (0x50, Status::OVERFLOW, false),
            (0x70, Status::OVERFLOW, true),
        ];
        for (opcode, flag, branches_when_set) in branches {
            for flag_set in [false, true] {
                let (mut cpu, mut bus) = setup(&[opcode, 0x02, 0xEA, 0xEA, 0xEA]);
                cpu.p.set(flag, flag_set);
                let taken = flag_set == branches_when_set;
                let cycles = run_instruction(&mut cpu, &mut bus);
                let expected = CYCLE_TABLE[opcode as usize].total_cycles(false, taken);
                assert_eq!(cycles, expected, "opcode {opcode:#04X} taken={taken}");
            }
        }
    }

    /// Builds a plausible operand environment for `instruction` and returns
    /// its measured cycle count. `index` picks how far the indexed modes
    /// reach past the base address (large values force a page cross).
    fn run_opcode(instruction: &Instruction, index: u8) -> u64 {
        let mut program = vec![instruction.opcode];
        match instruction.addressing.operand_len() {
            0 => {}
            1 => program.push(0x20),
            2 => program.extend([0xF0, 0x12]),
            _ => unreachable!("operand length"),
        }
        program.push(0xEA);

        let mut bus = MockBus::with_program(ORG, &program);
        // Zero-page pointer for the indirect modes ($20/$24 with X=4).
        bus.mem[0x0020] = 0xF0;
        bus.mem[0x0021] = 0x12;
        bus.mem[0x0024] = 0xF0;
        bus.mem[0x0025] = 0x12;
        // JMP ($12F0) and RTS/RTI stack pulls land on a NOP.
        bus.mem[0x12F0] = 0xEA;
        bus.mem[0x0000] = 0xEA;
        bus.mem[0x01FE] = 0x00;
        bus.mem[0x01FF] = 0x00;

        let mut cpu = Cpu::new();
        prime(&mut cpu, &mut bus);
        cpu.x = index;
        cpu.y = index;

        run_instruction(&mut cpu, &mut bus)
    }

    proptest! {
        // ADC followed by SBC of the same operand lands on
        // `A + C_in + C_mid - 1`: the accumulator is restored exactly when
        // the ADC's carry-out complements the carry-in, and in that case the
        // final carry equals the original.
        #[test]
        fn adc_then_sbc_obeys_the_carry_algebra(
            a in any::<u8>(),
            m in any::<u8>(),
            carry in any::<bool>(),
        ) {
            let (mut cpu, mut bus) = setup(&[0x69, m, 0xE9, m, 0xEA]);
            cpu.a = a;
            cpu.p.set(Status::CARRY, carry);

            run_instruction(&mut cpu, &mut bus);
            let mid_carry = cpu.p.c();
            run_instruction(&mut cpu, &mut bus);

            let expected = a
                .wrapping_add(carry as u8)
                .wrapping_add(mid_carry as u8)
                .wrapping_sub(1);
            prop_assert_eq!(cpu.a, expected);
            if mid_carry != carry {
                prop_assert_eq!(cpu.a, a);
                prop_assert_eq!(cpu.p.c(), carry);
            }
        }

        // Writing through the stack page with any pointer value stays in
        // $0100-$01FF and pull-after-push restores the byte.
        #[test]
        fn push_pull_round_trips_any_stack_pointer(s in any::<u8>(), value in any::<u8>()) {
            let (mut cpu, mut bus) = setup(&[0x48, 0x68, 0xEA]); // PHA; PLA
            cpu.a = value;
            cpu.s = s;

            run_instruction(&mut cpu, &mut bus);
            prop_assert_eq!(bus.mem[0x0100 | s as usize], value);
            cpu.a = 0;
            run_instruction(&mut cpu, &mut bus);

            prop_assert_eq!(cpu.a, value);
            prop_assert_eq!(cpu.s, s);
        }
    }
}

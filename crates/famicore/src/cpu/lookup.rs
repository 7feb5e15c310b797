use crate::cpu::addressing::Addressing as A;
use crate::cpu::instruction::Instruction;
use crate::cpu::mnemonic::Mnemonic as M;

// Short aliases for addressing modes (to keep the table readable)
const IMP: A = A::Implied;
const ACC: A = A::Accumulator;
const IMM: A = A::Immediate;
const REL: A = A::Relative;
const ZP: A = A::ZeroPage;
const ZPX: A = A::XIndexedZeroPage;
const ZPY: A = A::YIndexedZeroPage;
const ABS: A = A::Absolute;
const ABX: A = A::XIndexedAbsolute;
const ABY: A = A::YIndexedAbsolute;
const IND: A = A::AbsoluteIndirect;
const INX: A = A::XIndexedZeroPageIndirect;
const INY: A = A::ZeroPageIndirectYIndexed;

/// Documented opcodes only. `None` slots are the undocumented bytes; hitting
/// one at decode time is fatal to the emulation session.
pub(crate) static LOOKUP_TABLE: [Option<Instruction>; 256] = build_table();

const fn build_table() -> [Option<Instruction>; 256] {
    let mut table = [None; 256];

    macro_rules! op {
        ($opcode:expr, $mnemonic:ident, $addressing:expr) => {
            table[$opcode] = Some(Instruction {
                opcode: $opcode,
                mnemonic: M::$mnemonic,
                addressing: $addressing,
            });
        };
    }

    op!(0x00, BRK, IMP);
    op!(0x01, ORA, INX);
    op!(0x05, ORA, ZP);
    op!(0x06, ASL, ZP);
    op!(0x08, PHP, IMP);
    op!(0x09, ORA, IMM);
    op!(0x0A, ASL, ACC);
    op!(0x0D, ORA, ABS);
    op!(0x0E, ASL, ABS);

    op!(0x10, BPL, REL);
    op!(0x11, ORA, INY);
    op!(0x15, ORA, ZPX);
    op!(0x16, ASL, ZPX);
    op!(0x18, CLC, IMP);
    op!(0x19, ORA, ABY);
    op!(0x1D, ORA, ABX);
    op!(0x1E, ASL, ABX);

    op!(0x20, JSR, ABS);
    op!(0x21, AND, INX);
    op!(0x24, BIT, ZP);
    op!(0x25, AND, ZP);
    op!(0x26, ROL, ZP);
    op!(0x28, PLP, IMP);
    op!(0x29, AND, IMM);
    op!(0x2A, ROL, ACC);
    op!(0x2C, BIT, ABS);
    op!(0x2D, AND, ABS);
    op!(0x2E, ROL, ABS);

    op!(0x30, BMI, REL);
    op!(0x31, AND, INY);
    op!(0x35, AND, ZPX);
    op!(0x36, ROL, ZPX);
    op!(0x38, SEC, IMP);
    op!(0x39, AND, ABY);
    op!(0x3D, AND, ABX);
    op!(0x3E, ROL, ABX);

    op!(0x40, RTI, IMP);
    op!(0x41, EOR, INX);
    op!(0x45, EOR, ZP);
    op!(0x46, LSR, ZP);
    op!(0x48, PHA, IMP);
    op!(0x49, EOR, IMM);
    op!(0x4A, LSR, ACC);
    op!(0x4C, JMP, ABS);
    op!(0x4D, EOR, ABS);
    op!(0x4E, LSR, ABS);

    op!(0x50, BVC, REL);
    op!(0x51, EOR, INY);
    op!(0x55, EOR, ZPX);
    op!(0x56, LSR, ZPX);
    op!(0x58, CLI, IMP);
    op!(0x59, EOR, ABY);
    op!(0x5D, EOR, ABX);
    op!(0x5E, LSR, ABX);

    op!(0x60, RTS, IMP);
    op!(0x61, ADC, INX);
    op!(0x65, ADC, ZP);
    op!(0x66, ROR, ZP);
    op!(0x68, PLA, IMP);
    op!(0x69, ADC, IMM);
    op!(0x6A, ROR, ACC);
    op!(0x6C, JMP, IND);
    op!(0x6D, ADC, ABS);
    op!(0x6E, ROR, ABS);

    op!(0x70, BVS, REL);
    op!(0x71, ADC, INY);
    op!(0x75, ADC, ZPX);
    op!(0x76, ROR, ZPX);
    op!(0x78, SEI, IMP);
    op!(0x79, ADC, ABY);
    op!(0x7D, ADC, ABX);
    op!(0x7E, ROR, ABX);

    op!(0x81, STA, INX);
    op!(0x84, STY, ZP);
    op!(0x85, STA, ZP);
    op!(0x86, STX, ZP);
    op!(0x88, DEY, IMP);
    op!(0x8A, TXA, IMP);
    op!(0x8C, STY, ABS);
    op!(0x8D, STA, ABS);
    op!(0x8E, STX, ABS);

    op!(0x90, BCC, REL);
    op!(0x91, STA, INY);
    op!(0x94, STY, ZPX);
    op!(0x95, STA, ZPX);
    op!(0x96, STX, ZPY);
    op!(0x98, TYA, IMP);
    op!(0x99, STA, ABY);
    op!(0x9A, TXS, IMP);
    op!(0x9D, STA, ABX);

    op!(0xA0, LDY, IMM);
    op!(0xA1, LDA, INX);
    op!(0xA2, LDX, IMM);
    op!(0xA4, LDY, ZP);
    op!(0xA5, LDA, ZP);
    op!(0xA6, LDX, ZP);
    op!(0xA8, TAY, IMP);
    op!(0xA9, LDA, IMM);
    op!(0xAA, TAX, IMP);
    op!(0xAC, LDY, ABS);
    op!(0xAD, LDA, ABS);
    op!(0xAE, LDX, ABS);

    op!(0xB0, BCS, REL);
    op!(0xB1, LDA, INY);
    op!(0xB4, LDY, ZPX);
    op!(0xB5, LDA, ZPX);
    op!(0xB6, LDX, ZPY);
    op!(0xB8, CLV, IMP);
    op!(0xB9, LDA, ABY);
    op!(0xBA, TSX, IMP);
    op!(0xBC, LDY, ABX);
    op!(0xBD, LDA, ABX);
    op!(0xBE, LDX, ABY);

    op!(0xC0, CPY, IMM);
    op!(0xC1, CMP, INX);
    op!(0xC4, CPY, ZP);
    op!(0xC5, CMP, ZP);
    op!(0xC6, DEC, ZP);
    op!(0xC8, INY, IMP);
    op!(0xC9, CMP, IMM);
    op!(0xCA, DEX, IMP);
    op!(0xCC, CPY, ABS);
    op!(0xCD, CMP, ABS);
    op!(0xCE, DEC, ABS);

    op!(0xD0, BNE, REL);
    op!(0xD1, CMP, INY);
    op!(0xD5, CMP, ZPX);
    op!(0xD6, DEC, ZPX);
    op!(0xD8, CLD, IMP);
    op!(0xD9, CMP, ABY);
    op!(0xDD, CMP, ABX);
    op!(0xDE, DEC, ABX);

    op!(0xE0, CPX, IMM);
    op!(0xE1, SBC, INX);
    op!(0xE4, CPX, ZP);
    op!(0xE5, SBC, ZP);
    op!(0xE6, INC, ZP);
    op!(0xE8, INX, IMP);
    op!(0xE9, SBC, IMM);
    op!(0xEA, NOP, IMP);
    op!(0xEC, CPX, ABS);
    op!(0xED, SBC, ABS);
    op!(0xEE, INC, ABS);

    op!(0xF0, BEQ, REL);
    op!(0xF1, SBC, INY);
    op!(0xF5, SBC, ZPX);
    op!(0xF6, INC, ZPX);
    op!(0xF8, SED, IMP);
    op!(0xF9, SBC, ABY);
    op!(0xFD, SBC, ABX);
    op!(0xFE, INC, ABX);

    table
}

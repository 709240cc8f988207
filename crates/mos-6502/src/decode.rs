//! Opcode decoding: operation, addressing mode and base cycle count.
//!
//! Base counts are the documented NMOS timings. Page-crossing and branch
//! penalties are added at execution time.

/// Addressing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    /// ($nn,X)
    IndexedIndirect,
    /// ($nn),Y
    IndirectIndexed,
    Relative,
    /// JMP ($nnnn)
    Indirect,
}

/// Operations, including the stable undocumented ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Op {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs,
    Clc, Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx,
    Iny, Jmp, Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp,
    Rol, Ror, Rti, Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay,
    Tsx, Txa, Txs, Tya,
    // Undocumented
    Lax, Sax, Dcp, Isc, Slo, Sre, Rla, Rra, Anc, Alr, Arr, Sbx,
}

impl Op {
    /// Read instructions that pay +1 when indexing crosses a page.
    /// Stores and read-modify-write forms have the extra cycle built in.
    pub(crate) const fn pays_page_penalty(self) -> bool {
        matches!(
            self,
            Op::Adc
                | Op::And
                | Op::Cmp
                | Op::Eor
                | Op::Lda
                | Op::Ldx
                | Op::Ldy
                | Op::Ora
                | Op::Sbc
                | Op::Lax
                | Op::Nop
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Instruction {
    pub op: Op,
    pub mode: Mode,
    pub cycles: u8,
}

const fn ins(op: Op, mode: Mode, cycles: u8) -> Option<Instruction> {
    Some(Instruction { op, mode, cycles })
}

/// Decode an opcode byte. `None` for JAM opcodes and the unstable
/// undocumented group (ANE, LXA, SHA, SHX, SHY, TAS, LAS).
#[rustfmt::skip]
pub(crate) const fn decode(opcode: u8) -> Option<Instruction> {
    use Mode::{
        Absolute as Abs, AbsoluteX as Abx, AbsoluteY as Aby, Accumulator as Acc,
        Immediate as Imm, Implied as Imp, IndexedIndirect as Izx,
        IndirectIndexed as Izy, Indirect as Ind, Relative as Rel, ZeroPage as Zp,
        ZeroPageX as Zpx, ZeroPageY as Zpy,
    };
    use Op::*;

    match opcode {
        // $0x
        0x00 => ins(Brk, Imp, 7), 0x01 => ins(Ora, Izx, 6), 0x03 => ins(Slo, Izx, 8),
        0x04 => ins(Nop, Zp, 3),  0x05 => ins(Ora, Zp, 3),  0x06 => ins(Asl, Zp, 5),
        0x07 => ins(Slo, Zp, 5),  0x08 => ins(Php, Imp, 3), 0x09 => ins(Ora, Imm, 2),
        0x0A => ins(Asl, Acc, 2), 0x0B => ins(Anc, Imm, 2), 0x0C => ins(Nop, Abs, 4),
        0x0D => ins(Ora, Abs, 4), 0x0E => ins(Asl, Abs, 6), 0x0F => ins(Slo, Abs, 6),
        // $1x
        0x10 => ins(Bpl, Rel, 2), 0x11 => ins(Ora, Izy, 5), 0x13 => ins(Slo, Izy, 8),
        0x14 => ins(Nop, Zpx, 4), 0x15 => ins(Ora, Zpx, 4), 0x16 => ins(Asl, Zpx, 6),
        0x17 => ins(Slo, Zpx, 6), 0x18 => ins(Clc, Imp, 2), 0x19 => ins(Ora, Aby, 4),
        0x1A => ins(Nop, Imp, 2), 0x1B => ins(Slo, Aby, 7), 0x1C => ins(Nop, Abx, 4),
        0x1D => ins(Ora, Abx, 4), 0x1E => ins(Asl, Abx, 7), 0x1F => ins(Slo, Abx, 7),
        // $2x
        0x20 => ins(Jsr, Abs, 6), 0x21 => ins(And, Izx, 6), 0x23 => ins(Rla, Izx, 8),
        0x24 => ins(Bit, Zp, 3),  0x25 => ins(And, Zp, 3),  0x26 => ins(Rol, Zp, 5),
        0x27 => ins(Rla, Zp, 5),  0x28 => ins(Plp, Imp, 4), 0x29 => ins(And, Imm, 2),
        0x2A => ins(Rol, Acc, 2), 0x2B => ins(Anc, Imm, 2), 0x2C => ins(Bit, Abs, 4),
        0x2D => ins(And, Abs, 4), 0x2E => ins(Rol, Abs, 6), 0x2F => ins(Rla, Abs, 6),
        // $3x
        0x30 => ins(Bmi, Rel, 2), 0x31 => ins(And, Izy, 5), 0x33 => ins(Rla, Izy, 8),
        0x34 => ins(Nop, Zpx, 4), 0x35 => ins(And, Zpx, 4), 0x36 => ins(Rol, Zpx, 6),
        0x37 => ins(Rla, Zpx, 6), 0x38 => ins(Sec, Imp, 2), 0x39 => ins(And, Aby, 4),
        0x3A => ins(Nop, Imp, 2), 0x3B => ins(Rla, Aby, 7), 0x3C => ins(Nop, Abx, 4),
        0x3D => ins(And, Abx, 4), 0x3E => ins(Rol, Abx, 7), 0x3F => ins(Rla, Abx, 7),
        // $4x
        0x40 => ins(Rti, Imp, 6), 0x41 => ins(Eor, Izx, 6), 0x43 => ins(Sre, Izx, 8),
        0x44 => ins(Nop, Zp, 3),  0x45 => ins(Eor, Zp, 3),  0x46 => ins(Lsr, Zp, 5),
        0x47 => ins(Sre, Zp, 5),  0x48 => ins(Pha, Imp, 3), 0x49 => ins(Eor, Imm, 2),
        0x4A => ins(Lsr, Acc, 2), 0x4B => ins(Alr, Imm, 2), 0x4C => ins(Jmp, Abs, 3),
        0x4D => ins(Eor, Abs, 4), 0x4E => ins(Lsr, Abs, 6), 0x4F => ins(Sre, Abs, 6),
        // $5x
        0x50 => ins(Bvc, Rel, 2), 0x51 => ins(Eor, Izy, 5), 0x53 => ins(Sre, Izy, 8),
        0x54 => ins(Nop, Zpx, 4), 0x55 => ins(Eor, Zpx, 4), 0x56 => ins(Lsr, Zpx, 6),
        0x57 => ins(Sre, Zpx, 6), 0x58 => ins(Cli, Imp, 2), 0x59 => ins(Eor, Aby, 4),
        0x5A => ins(Nop, Imp, 2), 0x5B => ins(Sre, Aby, 7), 0x5C => ins(Nop, Abx, 4),
        0x5D => ins(Eor, Abx, 4), 0x5E => ins(Lsr, Abx, 7), 0x5F => ins(Sre, Abx, 7),
        // $6x
        0x60 => ins(Rts, Imp, 6), 0x61 => ins(Adc, Izx, 6), 0x63 => ins(Rra, Izx, 8),
        0x64 => ins(Nop, Zp, 3),  0x65 => ins(Adc, Zp, 3),  0x66 => ins(Ror, Zp, 5),
        0x67 => ins(Rra, Zp, 5),  0x68 => ins(Pla, Imp, 4), 0x69 => ins(Adc, Imm, 2),
        0x6A => ins(Ror, Acc, 2), 0x6B => ins(Arr, Imm, 2), 0x6C => ins(Jmp, Ind, 5),
        0x6D => ins(Adc, Abs, 4), 0x6E => ins(Ror, Abs, 6), 0x6F => ins(Rra, Abs, 6),
        // $7x
        0x70 => ins(Bvs, Rel, 2), 0x71 => ins(Adc, Izy, 5), 0x73 => ins(Rra, Izy, 8),
        0x74 => ins(Nop, Zpx, 4), 0x75 => ins(Adc, Zpx, 4), 0x76 => ins(Ror, Zpx, 6),
        0x77 => ins(Rra, Zpx, 6), 0x78 => ins(Sei, Imp, 2), 0x79 => ins(Adc, Aby, 4),
        0x7A => ins(Nop, Imp, 2), 0x7B => ins(Rra, Aby, 7), 0x7C => ins(Nop, Abx, 4),
        0x7D => ins(Adc, Abx, 4), 0x7E => ins(Ror, Abx, 7), 0x7F => ins(Rra, Abx, 7),
        // $8x
        0x80 => ins(Nop, Imm, 2), 0x81 => ins(Sta, Izx, 6), 0x82 => ins(Nop, Imm, 2),
        0x83 => ins(Sax, Izx, 6), 0x84 => ins(Sty, Zp, 3),  0x85 => ins(Sta, Zp, 3),
        0x86 => ins(Stx, Zp, 3),  0x87 => ins(Sax, Zp, 3),  0x88 => ins(Dey, Imp, 2),
        0x89 => ins(Nop, Imm, 2), 0x8A => ins(Txa, Imp, 2), 0x8C => ins(Sty, Abs, 4),
        0x8D => ins(Sta, Abs, 4), 0x8E => ins(Stx, Abs, 4), 0x8F => ins(Sax, Abs, 4),
        // $9x
        0x90 => ins(Bcc, Rel, 2), 0x91 => ins(Sta, Izy, 6), 0x94 => ins(Sty, Zpx, 4),
        0x95 => ins(Sta, Zpx, 4), 0x96 => ins(Stx, Zpy, 4), 0x97 => ins(Sax, Zpy, 4),
        0x98 => ins(Tya, Imp, 2), 0x99 => ins(Sta, Aby, 5), 0x9A => ins(Txs, Imp, 2),
        0x9D => ins(Sta, Abx, 5),
        // $Ax
        0xA0 => ins(Ldy, Imm, 2), 0xA1 => ins(Lda, Izx, 6), 0xA2 => ins(Ldx, Imm, 2),
        0xA3 => ins(Lax, Izx, 6), 0xA4 => ins(Ldy, Zp, 3),  0xA5 => ins(Lda, Zp, 3),
        0xA6 => ins(Ldx, Zp, 3),  0xA7 => ins(Lax, Zp, 3),  0xA8 => ins(Tay, Imp, 2),
        0xA9 => ins(Lda, Imm, 2), 0xAA => ins(Tax, Imp, 2), 0xAC => ins(Ldy, Abs, 4),
        0xAD => ins(Lda, Abs, 4), 0xAE => ins(Ldx, Abs, 4), 0xAF => ins(Lax, Abs, 4),
        // $Bx
        0xB0 => ins(Bcs, Rel, 2), 0xB1 => ins(Lda, Izy, 5), 0xB3 => ins(Lax, Izy, 5),
        0xB4 => ins(Ldy, Zpx, 4), 0xB5 => ins(Lda, Zpx, 4), 0xB6 => ins(Ldx, Zpy, 4),
        0xB7 => ins(Lax, Zpy, 4), 0xB8 => ins(Clv, Imp, 2), 0xB9 => ins(Lda, Aby, 4),
        0xBA => ins(Tsx, Imp, 2), 0xBC => ins(Ldy, Abx, 4), 0xBD => ins(Lda, Abx, 4),
        0xBE => ins(Ldx, Aby, 4), 0xBF => ins(Lax, Aby, 4),
        // $Cx
        0xC0 => ins(Cpy, Imm, 2), 0xC1 => ins(Cmp, Izx, 6), 0xC2 => ins(Nop, Imm, 2),
        0xC3 => ins(Dcp, Izx, 8), 0xC4 => ins(Cpy, Zp, 3),  0xC5 => ins(Cmp, Zp, 3),
        0xC6 => ins(Dec, Zp, 5),  0xC7 => ins(Dcp, Zp, 5),  0xC8 => ins(Iny, Imp, 2),
        0xC9 => ins(Cmp, Imm, 2), 0xCA => ins(Dex, Imp, 2), 0xCB => ins(Sbx, Imm, 2),
        0xCC => ins(Cpy, Abs, 4), 0xCD => ins(Cmp, Abs, 4), 0xCE => ins(Dec, Abs, 6),
        0xCF => ins(Dcp, Abs, 6),
        // $Dx
        0xD0 => ins(Bne, Rel, 2), 0xD1 => ins(Cmp, Izy, 5), 0xD3 => ins(Dcp, Izy, 8),
        0xD4 => ins(Nop, Zpx, 4), 0xD5 => ins(Cmp, Zpx, 4), 0xD6 => ins(Dec, Zpx, 6),
        0xD7 => ins(Dcp, Zpx, 6), 0xD8 => ins(Cld, Imp, 2), 0xD9 => ins(Cmp, Aby, 4),
        0xDA => ins(Nop, Imp, 2), 0xDB => ins(Dcp, Aby, 7), 0xDC => ins(Nop, Abx, 4),
        0xDD => ins(Cmp, Abx, 4), 0xDE => ins(Dec, Abx, 7), 0xDF => ins(Dcp, Abx, 7),
        // $Ex
        0xE0 => ins(Cpx, Imm, 2), 0xE1 => ins(Sbc, Izx, 6), 0xE2 => ins(Nop, Imm, 2),
        0xE3 => ins(Isc, Izx, 8), 0xE4 => ins(Cpx, Zp, 3),  0xE5 => ins(Sbc, Zp, 3),
        0xE6 => ins(Inc, Zp, 5),  0xE7 => ins(Isc, Zp, 5),  0xE8 => ins(Inx, Imp, 2),
        0xE9 => ins(Sbc, Imm, 2), 0xEA => ins(Nop, Imp, 2), 0xEB => ins(Sbc, Imm, 2),
        0xEC => ins(Cpx, Abs, 4), 0xED => ins(Sbc, Abs, 4), 0xEE => ins(Inc, Abs, 6),
        0xEF => ins(Isc, Abs, 6),
        // $Fx
        0xF0 => ins(Beq, Rel, 2), 0xF1 => ins(Sbc, Izy, 5), 0xF3 => ins(Isc, Izy, 8),
        0xF4 => ins(Nop, Zpx, 4), 0xF5 => ins(Sbc, Zpx, 4), 0xF6 => ins(Inc, Zpx, 6),
        0xF7 => ins(Isc, Zpx, 6), 0xF8 => ins(Sed, Imp, 2), 0xF9 => ins(Sbc, Aby, 4),
        0xFA => ins(Nop, Imp, 2), 0xFB => ins(Isc, Aby, 7), 0xFC => ins(Nop, Abx, 4),
        0xFD => ins(Sbc, Abx, 4), 0xFE => ins(Inc, Abx, 7), 0xFF => ins(Isc, Abx, 7),

        _ => None,
    }
}

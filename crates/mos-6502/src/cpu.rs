//! Instruction-stepped 6502 execution.

use emu_core::{Bus, Cpu, Observable, Value};

use crate::addressing::Operand;
use crate::decode::{Instruction, Op, decode};
use crate::flags::{C, D, I, N, Status, V, Z};
use crate::registers::Registers;

const NMI_VECTOR: u16 = 0xFFFA;
const RESET_VECTOR: u16 = 0xFFFC;
const IRQ_VECTOR: u16 = 0xFFFE;

/// The NMOS 6502.
///
/// Each call to [`Cpu::step`] runs one whole instruction and returns the
/// number of clock cycles it took. The caller advances the rest of the
/// machine by that amount.
#[derive(Debug, Clone)]
pub struct Mos6502 {
    pub regs: Registers,
    total_cycles: u64,
    /// One bit per opcode byte, set once a warning has been logged.
    unsupported_seen: [u64; 4],
}

impl Default for Mos6502 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mos6502 {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            regs: Registers::new(),
            total_cycles: 0,
            unsupported_seen: [0; 4],
        }
    }

    /// Cycles executed since construction.
    #[must_use]
    pub const fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    fn interrupt(&mut self, bus: &mut impl Bus, vector: u16) -> u32 {
        self.push_word(bus, self.regs.pc);
        self.push(bus, self.regs.p.to_stack_interrupt());
        self.regs.p.set_if(I, true);
        self.regs.pc = Self::read_word(bus, vector);
        self.total_cycles += 7;
        7
    }

    fn note_unsupported(&mut self, opcode: u8) {
        let word = usize::from(opcode >> 6);
        let bit = 1u64 << (opcode & 0x3F);
        if self.unsupported_seen[word] & bit == 0 {
            self.unsupported_seen[word] |= bit;
            log::warn!(
                "unsupported opcode ${opcode:02X} at ${:04X}",
                self.regs.pc.wrapping_sub(1)
            );
        }
    }

    fn load(&mut self, bus: &mut impl Bus, operand: Operand) -> u8 {
        match operand {
            Operand::Immediate(value) => value,
            Operand::Address(addr) => bus.read(addr),
            Operand::Accumulator => self.regs.a,
            Operand::None | Operand::Branch { .. } => 0,
        }
    }

    fn store(&mut self, bus: &mut impl Bus, operand: Operand, value: u8) {
        match operand {
            Operand::Address(addr) => bus.write(addr, value),
            Operand::Accumulator => self.regs.a = value,
            _ => {}
        }
    }

    /// Read-modify-write through `f`, returning the new value.
    fn modify(
        &mut self,
        bus: &mut impl Bus,
        operand: Operand,
        f: impl FnOnce(&mut Self, u8) -> u8,
    ) -> u8 {
        let value = self.load(bus, operand);
        let result = f(self, value);
        self.store(bus, operand, result);
        result
    }

    fn branch(&mut self, operand: Operand, taken: bool) -> u32 {
        match operand {
            Operand::Branch { target, crossed } if taken => {
                self.regs.pc = target;
                1 + u32::from(crossed)
            }
            _ => 0,
        }
    }

    fn set_a(&mut self, value: u8) {
        self.regs.a = value;
        self.regs.p.update_nz(value);
    }

    fn carry(&self) -> u8 {
        u8::from(self.regs.p.is_set(C))
    }

    // --- ALU ---

    fn adc(&mut self, value: u8) {
        if self.regs.p.is_set(D) {
            self.adc_decimal(value);
        } else {
            self.adc_binary(value);
        }
    }

    fn adc_binary(&mut self, value: u8) {
        let a = self.regs.a;
        let sum = u16::from(a) + u16::from(value) + u16::from(self.carry());
        let result = sum as u8;
        self.regs.p.set_if(C, sum > 0xFF);
        self.regs
            .p
            .set_if(V, (a ^ result) & (value ^ result) & 0x80 != 0);
        self.set_a(result);
    }

    fn adc_decimal(&mut self, value: u8) {
        let a = u16::from(self.regs.a);
        let v = u16::from(value);
        let c = u16::from(self.carry());

        let mut low = (a & 0x0F) + (v & 0x0F) + c;
        if low > 9 {
            low += 6;
        }
        let mut high = (a >> 4) + (v >> 4) + u16::from(low > 0x0F);

        // Z comes from the binary sum; N and V from the half-adjusted one.
        let binary = (a + v + c) as u8;
        let half = ((high << 4) & 0xF0) as u8;
        self.regs.p.set_if(Z, binary == 0);
        self.regs.p.set_if(N, half & 0x80 != 0);
        self.regs.p.set_if(
            V,
            (self.regs.a ^ half) & !(self.regs.a ^ value) & 0x80 != 0,
        );

        if high > 9 {
            high += 6;
        }
        self.regs.p.set_if(C, high > 0x0F);
        self.regs.a = (((high << 4) & 0xF0) | (low & 0x0F)) as u8;
    }

    fn sbc(&mut self, value: u8) {
        if self.regs.p.is_set(D) {
            self.sbc_decimal(value);
        } else {
            self.sbc_binary(value);
        }
    }

    fn sbc_binary(&mut self, value: u8) {
        let a = self.regs.a;
        let borrow = 1 - self.carry();
        let diff = i16::from(a) - i16::from(value) - i16::from(borrow);
        let result = diff as u8;
        self.regs.p.set_if(C, diff >= 0);
        self.regs
            .p
            .set_if(V, (a ^ value) & (a ^ result) & 0x80 != 0);
        self.set_a(result);
    }

    fn sbc_decimal(&mut self, value: u8) {
        let a = i16::from(self.regs.a);
        let v = i16::from(value);
        let borrow = i16::from(1 - self.carry());

        let mut low = (a & 0x0F) - (v & 0x0F) - borrow;
        if low < 0 {
            low = ((low - 6) & 0x0F) - 0x10;
        }
        let mut result = (a & 0xF0) - (v & 0xF0) + low;
        if result < 0 {
            result -= 0x60;
        }

        // Flags match the binary subtraction on NMOS parts.
        let binary = a - v - borrow;
        let b8 = binary as u8;
        self.regs.p.set_if(C, binary >= 0);
        self.regs.p.update_nz(b8);
        self.regs.p.set_if(
            V,
            (self.regs.a ^ value) & (self.regs.a ^ b8) & 0x80 != 0,
        );
        self.regs.a = result as u8;
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.regs.p.set_if(C, register >= value);
        self.regs.p.update_nz(register.wrapping_sub(value));
    }

    fn asl(&mut self, value: u8) -> u8 {
        self.regs.p.set_if(C, value & 0x80 != 0);
        let result = value << 1;
        self.regs.p.update_nz(result);
        result
    }

    fn lsr(&mut self, value: u8) -> u8 {
        self.regs.p.set_if(C, value & 0x01 != 0);
        let result = value >> 1;
        self.regs.p.update_nz(result);
        result
    }

    fn rol(&mut self, value: u8) -> u8 {
        let carry_in = self.carry();
        self.regs.p.set_if(C, value & 0x80 != 0);
        let result = (value << 1) | carry_in;
        self.regs.p.update_nz(result);
        result
    }

    fn ror(&mut self, value: u8) -> u8 {
        let carry_in = self.carry() << 7;
        self.regs.p.set_if(C, value & 0x01 != 0);
        let result = (value >> 1) | carry_in;
        self.regs.p.update_nz(result);
        result
    }

    fn inc(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.regs.p.update_nz(result);
        result
    }

    fn dec(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.regs.p.update_nz(result);
        result
    }

    fn bit(&mut self, value: u8) {
        self.regs.p.set_if(Z, self.regs.a & value == 0);
        self.regs.p.set_if(N, value & 0x80 != 0);
        self.regs.p.set_if(V, value & 0x40 != 0);
    }

    /// ARR: AND then rotate right, with C and V taken from bits 6 and 5.
    /// Binary behaviour only; the decimal-mode quirk is not modelled.
    fn arr(&mut self, value: u8) {
        let anded = self.regs.a & value;
        let result = (anded >> 1) | (self.carry() << 7);
        self.set_a(result);
        self.regs.p.set_if(C, result & 0x40 != 0);
        self.regs
            .p
            .set_if(V, ((result >> 6) ^ (result >> 5)) & 0x01 != 0);
    }

    fn sbx(&mut self, value: u8) {
        let ax = self.regs.a & self.regs.x;
        self.regs.p.set_if(C, ax >= value);
        self.regs.x = ax.wrapping_sub(value);
        self.regs.p.update_nz(self.regs.x);
    }

    fn execute(&mut self, bus: &mut impl Bus, ins: Instruction) -> u32 {
        let (operand, crossed) = self.resolve(bus, ins.mode);
        let mut cycles = u32::from(ins.cycles);
        if crossed && ins.op.pays_page_penalty() {
            cycles += 1;
        }

        let p = self.regs.p;
        match ins.op {
            // Loads, stores, transfers
            Op::Lda => {
                let v = self.load(bus, operand);
                self.set_a(v);
            }
            Op::Ldx => {
                self.regs.x = self.load(bus, operand);
                self.regs.p.update_nz(self.regs.x);
            }
            Op::Ldy => {
                self.regs.y = self.load(bus, operand);
                self.regs.p.update_nz(self.regs.y);
            }
            Op::Sta => self.store(bus, operand, self.regs.a),
            Op::Stx => self.store(bus, operand, self.regs.x),
            Op::Sty => self.store(bus, operand, self.regs.y),
            Op::Tax => {
                self.regs.x = self.regs.a;
                self.regs.p.update_nz(self.regs.x);
            }
            Op::Tay => {
                self.regs.y = self.regs.a;
                self.regs.p.update_nz(self.regs.y);
            }
            Op::Txa => self.set_a(self.regs.x),
            Op::Tya => self.set_a(self.regs.y),
            Op::Tsx => {
                self.regs.x = self.regs.s;
                self.regs.p.update_nz(self.regs.x);
            }
            Op::Txs => self.regs.s = self.regs.x,

            // Arithmetic and logic
            Op::Adc => {
                let v = self.load(bus, operand);
                self.adc(v);
            }
            Op::Sbc => {
                let v = self.load(bus, operand);
                self.sbc(v);
            }
            Op::And => {
                let v = self.load(bus, operand);
                self.set_a(self.regs.a & v);
            }
            Op::Ora => {
                let v = self.load(bus, operand);
                self.set_a(self.regs.a | v);
            }
            Op::Eor => {
                let v = self.load(bus, operand);
                self.set_a(self.regs.a ^ v);
            }
            Op::Cmp => {
                let v = self.load(bus, operand);
                self.compare(self.regs.a, v);
            }
            Op::Cpx => {
                let v = self.load(bus, operand);
                self.compare(self.regs.x, v);
            }
            Op::Cpy => {
                let v = self.load(bus, operand);
                self.compare(self.regs.y, v);
            }
            Op::Bit => {
                let v = self.load(bus, operand);
                self.bit(v);
            }

            // Read-modify-write
            Op::Asl => {
                self.modify(bus, operand, Self::asl);
            }
            Op::Lsr => {
                self.modify(bus, operand, Self::lsr);
            }
            Op::Rol => {
                self.modify(bus, operand, Self::rol);
            }
            Op::Ror => {
                self.modify(bus, operand, Self::ror);
            }
            Op::Inc => {
                self.modify(bus, operand, Self::inc);
            }
            Op::Dec => {
                self.modify(bus, operand, Self::dec);
            }
            Op::Inx => self.regs.x = self.inc(self.regs.x),
            Op::Iny => self.regs.y = self.inc(self.regs.y),
            Op::Dex => self.regs.x = self.dec(self.regs.x),
            Op::Dey => self.regs.y = self.dec(self.regs.y),

            // Branches
            Op::Bcc => cycles += self.branch(operand, !p.is_set(C)),
            Op::Bcs => cycles += self.branch(operand, p.is_set(C)),
            Op::Bne => cycles += self.branch(operand, !p.is_set(Z)),
            Op::Beq => cycles += self.branch(operand, p.is_set(Z)),
            Op::Bpl => cycles += self.branch(operand, !p.is_set(N)),
            Op::Bmi => cycles += self.branch(operand, p.is_set(N)),
            Op::Bvc => cycles += self.branch(operand, !p.is_set(V)),
            Op::Bvs => cycles += self.branch(operand, p.is_set(V)),

            // Jumps and stack
            Op::Jmp => {
                if let Operand::Address(target) = operand {
                    self.regs.pc = target;
                }
            }
            Op::Jsr => {
                if let Operand::Address(target) = operand {
                    self.push_word(bus, self.regs.pc.wrapping_sub(1));
                    self.regs.pc = target;
                }
            }
            Op::Rts => self.regs.pc = self.pull_word(bus).wrapping_add(1),
            Op::Rti => {
                let status = self.pull(bus);
                self.regs.p = Status::from_stack(status);
                self.regs.pc = self.pull_word(bus);
            }
            Op::Brk => {
                self.push_word(bus, self.regs.pc.wrapping_add(1));
                self.push(bus, self.regs.p.to_stack_break());
                self.regs.p.set_if(I, true);
                self.regs.pc = Self::read_word(bus, IRQ_VECTOR);
            }
            Op::Pha => self.push(bus, self.regs.a),
            Op::Php => self.push(bus, self.regs.p.to_stack_break()),
            Op::Pla => {
                let v = self.pull(bus);
                self.set_a(v);
            }
            Op::Plp => {
                let v = self.pull(bus);
                self.regs.p = Status::from_stack(v);
            }

            // Flags
            Op::Clc => self.regs.p.set_if(C, false),
            Op::Sec => self.regs.p.set_if(C, true),
            Op::Cli => self.regs.p.set_if(I, false),
            Op::Sei => self.regs.p.set_if(I, true),
            Op::Cld => self.regs.p.set_if(D, false),
            Op::Sed => self.regs.p.set_if(D, true),
            Op::Clv => self.regs.p.set_if(V, false),

            // Operand bytes were consumed by resolve(); nothing is read.
            Op::Nop => {}

            // Undocumented
            Op::Lax => {
                let v = self.load(bus, operand);
                self.regs.x = v;
                self.set_a(v);
            }
            Op::Sax => self.store(bus, operand, self.regs.a & self.regs.x),
            Op::Dcp => {
                let v = self.modify(bus, operand, |_, v| v.wrapping_sub(1));
                self.compare(self.regs.a, v);
            }
            Op::Isc => {
                let v = self.modify(bus, operand, |_, v| v.wrapping_add(1));
                self.sbc(v);
            }
            Op::Slo => {
                let v = self.modify(bus, operand, Self::asl);
                self.set_a(self.regs.a | v);
            }
            Op::Sre => {
                let v = self.modify(bus, operand, Self::lsr);
                self.set_a(self.regs.a ^ v);
            }
            Op::Rla => {
                let v = self.modify(bus, operand, Self::rol);
                self.set_a(self.regs.a & v);
            }
            Op::Rra => {
                let v = self.modify(bus, operand, Self::ror);
                self.adc(v);
            }
            Op::Anc => {
                let v = self.load(bus, operand);
                self.set_a(self.regs.a & v);
                self.regs.p.set_if(C, self.regs.a & 0x80 != 0);
            }
            Op::Alr => {
                let v = self.load(bus, operand);
                let anded = self.regs.a & v;
                self.regs.a = self.lsr(anded);
            }
            Op::Arr => {
                let v = self.load(bus, operand);
                self.arr(v);
            }
            Op::Sbx => {
                let v = self.load(bus, operand);
                self.sbx(v);
            }
        }

        cycles
    }
}

impl Cpu for Mos6502 {
    fn step<B: Bus>(&mut self, bus: &mut B) -> u32 {
        let opcode = self.fetch(bus);
        let Some(ins) = decode(opcode) else {
            self.note_unsupported(opcode);
            return 0;
        };
        let cycles = self.execute(bus, ins);
        self.total_cycles += u64::from(cycles);
        cycles
    }

    fn reset<B: Bus>(&mut self, bus: &mut B) -> u32 {
        self.regs = Registers::new();
        self.regs.pc = Self::read_word(bus, RESET_VECTOR);
        self.total_cycles += 6;
        6
    }

    fn irq<B: Bus>(&mut self, bus: &mut B) -> u32 {
        if self.regs.p.is_set(I) {
            return 0;
        }
        self.interrupt(bus, IRQ_VECTOR)
    }

    fn nmi<B: Bus>(&mut self, bus: &mut B) -> u32 {
        self.interrupt(bus, NMI_VECTOR)
    }

    fn pc(&self) -> u16 {
        self.regs.pc
    }

    fn set_pc(&mut self, pc: u16) {
        self.regs.pc = pc;
    }
}

impl Observable for Mos6502 {
    fn query(&self, path: &str) -> Option<Value> {
        let p = self.regs.p;
        match path {
            "pc" => Some(self.regs.pc.into()),
            "a" => Some(self.regs.a.into()),
            "x" => Some(self.regs.x.into()),
            "y" => Some(self.regs.y.into()),
            "s" | "sp" => Some(self.regs.s.into()),
            "p" | "status" => Some(p.0.into()),
            "flags.c" => Some(p.is_set(C).into()),
            "flags.z" => Some(p.is_set(Z).into()),
            "flags.i" => Some(p.is_set(I).into()),
            "flags.d" => Some(p.is_set(D).into()),
            "flags.v" => Some(p.is_set(V).into()),
            "flags.n" => Some(p.is_set(N).into()),
            "cycle" => Some(Value::U64(self.total_cycles)),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "pc", "a", "x", "y", "s", "p", "flags.c", "flags.z", "flags.i", "flags.d", "flags.v",
            "flags.n", "cycle",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emu_core::FlatBus;

    fn run(program: &[u8], setup: impl FnOnce(&mut Mos6502)) -> (Mos6502, FlatBus, u32) {
        let mut bus = FlatBus::new();
        bus.load(0x0200, program);
        let mut cpu = Mos6502::new();
        cpu.regs.pc = 0x0200;
        setup(&mut cpu);
        let cycles = cpu.step(&mut bus);
        (cpu, bus, cycles)
    }

    #[test]
    fn decimal_add_carries_between_nibbles() {
        // SED is set up front; ADC #$01 with A=$19
        let (cpu, _, _) = run(&[0x69, 0x01], |cpu| {
            cpu.regs.a = 0x19;
            cpu.regs.p.set_if(D, true);
        });
        assert_eq!(cpu.regs.a, 0x20);
        assert!(!cpu.regs.p.is_set(C));
    }

    #[test]
    fn binary_add_same_operands() {
        let (cpu, _, _) = run(&[0x69, 0x01], |cpu| cpu.regs.a = 0x19);
        assert_eq!(cpu.regs.a, 0x1A);
        assert!(!cpu.regs.p.is_set(C));
    }

    #[test]
    fn decimal_add_wraps_with_carry() {
        let (cpu, _, _) = run(&[0x69, 0x01], |cpu| {
            cpu.regs.a = 0x99;
            cpu.regs.p.set_if(D, true);
        });
        assert_eq!(cpu.regs.a, 0x00);
        assert!(cpu.regs.p.is_set(C));
    }

    #[test]
    fn decimal_subtract_borrows() {
        // SEC; SBC #$01 with A=$10 -> $09
        let (cpu, _, _) = run(&[0xE9, 0x01], |cpu| {
            cpu.regs.a = 0x10;
            cpu.regs.p.set_if(D, true);
            cpu.regs.p.set_if(C, true);
        });
        assert_eq!(cpu.regs.a, 0x09);
        assert!(cpu.regs.p.is_set(C));
    }

    #[test]
    fn decimal_subtract_underflow() {
        let (cpu, _, _) = run(&[0xE9, 0x01], |cpu| {
            cpu.regs.a = 0x00;
            cpu.regs.p.set_if(D, true);
            cpu.regs.p.set_if(C, true);
        });
        assert_eq!(cpu.regs.a, 0x99);
        assert!(!cpu.regs.p.is_set(C));
    }

    #[test]
    fn binary_overflow() {
        let (cpu, _, _) = run(&[0x69, 0x01], |cpu| cpu.regs.a = 0x7F);
        assert_eq!(cpu.regs.a, 0x80);
        assert!(cpu.regs.p.is_set(V));
        assert!(cpu.regs.p.is_set(N));
    }

    #[test]
    fn arr_sets_carry_and_overflow_from_result() {
        // A=$FF AND #$C0 = $C0, ROR with C=1 -> $E0; C=bit6=1, V=bit6^bit5=0
        let (cpu, _, _) = run(&[0x6B, 0xC0], |cpu| {
            cpu.regs.a = 0xFF;
            cpu.regs.p.set_if(C, true);
        });
        assert_eq!(cpu.regs.a, 0xE0);
        assert!(cpu.regs.p.is_set(C));
        assert!(!cpu.regs.p.is_set(V));
    }

    #[test]
    fn unsupported_opcode_is_logged_once_and_consumed() {
        let mut bus = FlatBus::new();
        bus.load(0x0200, &[0x02, 0x02]);
        let mut cpu = Mos6502::new();
        cpu.regs.pc = 0x0200;
        assert_eq!(cpu.step(&mut bus), 0);
        assert_eq!(cpu.regs.pc, 0x0201);
        assert_eq!(cpu.step(&mut bus), 0);
        assert_eq!(cpu.unsupported_seen[0], 1 << 2);
    }

    #[test]
    fn query_flags() {
        let (cpu, _, _) = run(&[0x38], |_| {});
        assert_eq!(cpu.query("flags.c"), Some(Value::Bool(true)));
        assert_eq!(cpu.query("pc"), Some(Value::U16(0x0201)));
        assert_eq!(cpu.query("cycle"), Some(Value::U64(2)));
        assert_eq!(cpu.query("nope"), None);
    }
}

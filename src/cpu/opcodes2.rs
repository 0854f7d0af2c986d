//! オペコードの実装（パート2）
//!
//! 比較、インクリメント/デクリメント、論理演算、シフト/ローテート、BIT

use super::{flags, Cpu, MemoryBus};

impl Cpu {
    //--------------------------------------------------
    // Compare Instructions
    //--------------------------------------------------
    fn do_compare(&mut self, register: u8, value: u8) {
        let result = register.wrapping_sub(value);
        self.regs.set_flag(flags::CARRY, register >= value);
        self.regs.update_zero_negative_flags(result);
    }

    pub(super) fn cmp_immediate<M: MemoryBus>(&mut self, memory: &mut M) {
        let value = self.get_immediate(memory);
        self.do_compare(self.regs.a, value);
    }

    pub(super) fn cmp_zeropage<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_addr(memory);
        let value = memory.read(addr);
        self.do_compare(self.regs.a, value);
    }

    pub(super) fn cmp_zeropage_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_x_addr(memory);
        let value = memory.read(addr);
        self.do_compare(self.regs.a, value);
    }

    pub(super) fn cmp_absolute<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_addr(memory);
        let value = memory.read(addr);
        self.do_compare(self.regs.a, value);
    }

    pub(super) fn cmp_absolute_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_x_addr(memory);
        let value = memory.read(addr);
        self.do_compare(self.regs.a, value);
    }

    pub(super) fn cmp_absolute_y<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_y_addr(memory);
        let value = memory.read(addr);
        self.do_compare(self.regs.a, value);
    }

    pub(super) fn cmp_indirect_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_indirect_x_addr(memory);
        let value = memory.read(addr);
        self.do_compare(self.regs.a, value);
    }

    pub(super) fn cmp_indirect_y<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_indirect_y_addr(memory);
        let value = memory.read(addr);
        self.do_compare(self.regs.a, value);
    }

    pub(super) fn cpx_immediate<M: MemoryBus>(&mut self, memory: &mut M) {
        let value = self.get_immediate(memory);
        self.do_compare(self.regs.x, value);
    }

    pub(super) fn cpx_zeropage<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_addr(memory);
        let value = memory.read(addr);
        self.do_compare(self.regs.x, value);
    }

    pub(super) fn cpx_absolute<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_addr(memory);
        let value = memory.read(addr);
        self.do_compare(self.regs.x, value);
    }

    pub(super) fn cpy_immediate<M: MemoryBus>(&mut self, memory: &mut M) {
        let value = self.get_immediate(memory);
        self.do_compare(self.regs.y, value);
    }

    pub(super) fn cpy_zeropage<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_addr(memory);
        let value = memory.read(addr);
        self.do_compare(self.regs.y, value);
    }

    pub(super) fn cpy_absolute<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_addr(memory);
        let value = memory.read(addr);
        self.do_compare(self.regs.y, value);
    }

    //--------------------------------------------------
    // Increment/Decrement Memory
    //--------------------------------------------------
    fn do_inc<M: MemoryBus>(&mut self, memory: &mut M, addr: u16) {
        let value = memory.read(addr).wrapping_add(1);
        memory.write(addr, value);
        self.regs.update_zero_negative_flags(value);
    }

    fn do_dec<M: MemoryBus>(&mut self, memory: &mut M, addr: u16) {
        let value = memory.read(addr).wrapping_sub(1);
        memory.write(addr, value);
        self.regs.update_zero_negative_flags(value);
    }

    pub(super) fn inc_zeropage<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_addr(memory);
        self.do_inc(memory, addr);
    }

    pub(super) fn inc_zeropage_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_x_addr(memory);
        self.do_inc(memory, addr);
    }

    pub(super) fn inc_absolute<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_addr(memory);
        self.do_inc(memory, addr);
    }

    pub(super) fn inc_absolute_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_x_addr(memory);
        self.do_inc(memory, addr);
    }

    pub(super) fn dec_zeropage<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_addr(memory);
        self.do_dec(memory, addr);
    }

    pub(super) fn dec_zeropage_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_x_addr(memory);
        self.do_dec(memory, addr);
    }

    pub(super) fn dec_absolute<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_addr(memory);
        self.do_dec(memory, addr);
    }

    pub(super) fn dec_absolute_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_x_addr(memory);
        self.do_dec(memory, addr);
    }

    pub(super) fn inx(&mut self) {
        self.regs.x = self.regs.x.wrapping_add(1);
        self.regs.update_zero_negative_flags(self.regs.x);
    }

    pub(super) fn iny(&mut self) {
        self.regs.y = self.regs.y.wrapping_add(1);
        self.regs.update_zero_negative_flags(self.regs.y);
    }

    pub(super) fn dex(&mut self) {
        self.regs.x = self.regs.x.wrapping_sub(1);
        self.regs.update_zero_negative_flags(self.regs.x);
    }

    pub(super) fn dey(&mut self) {
        self.regs.y = self.regs.y.wrapping_sub(1);
        self.regs.update_zero_negative_flags(self.regs.y);
    }

    //--------------------------------------------------
    // Logical Operations
    //--------------------------------------------------
    pub(super) fn and_immediate<M: MemoryBus>(&mut self, memory: &mut M) {
        self.regs.a &= self.get_immediate(memory);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn and_zeropage<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_addr(memory);
        self.regs.a &= memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn and_zeropage_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_x_addr(memory);
        self.regs.a &= memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn and_absolute<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_addr(memory);
        self.regs.a &= memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn and_absolute_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_x_addr(memory);
        self.regs.a &= memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn and_absolute_y<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_y_addr(memory);
        self.regs.a &= memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn and_indirect_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_indirect_x_addr(memory);
        self.regs.a &= memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn and_indirect_y<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_indirect_y_addr(memory);
        self.regs.a &= memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn ora_immediate<M: MemoryBus>(&mut self, memory: &mut M) {
        self.regs.a |= self.get_immediate(memory);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn ora_zeropage<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_addr(memory);
        self.regs.a |= memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn ora_zeropage_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_x_addr(memory);
        self.regs.a |= memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn ora_absolute<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_addr(memory);
        self.regs.a |= memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn ora_absolute_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_x_addr(memory);
        self.regs.a |= memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn ora_absolute_y<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_y_addr(memory);
        self.regs.a |= memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn ora_indirect_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_indirect_x_addr(memory);
        self.regs.a |= memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn ora_indirect_y<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_indirect_y_addr(memory);
        self.regs.a |= memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn eor_immediate<M: MemoryBus>(&mut self, memory: &mut M) {
        self.regs.a ^= self.get_immediate(memory);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn eor_zeropage<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_addr(memory);
        self.regs.a ^= memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn eor_zeropage_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_x_addr(memory);
        self.regs.a ^= memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn eor_absolute<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_addr(memory);
        self.regs.a ^= memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn eor_absolute_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_x_addr(memory);
        self.regs.a ^= memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn eor_absolute_y<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_y_addr(memory);
        self.regs.a ^= memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn eor_indirect_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_indirect_x_addr(memory);
        self.regs.a ^= memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn eor_indirect_y<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_indirect_y_addr(memory);
        self.regs.a ^= memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    //--------------------------------------------------
    // Shifts/Rotates
    //--------------------------------------------------
    pub(super) fn asl_accumulator(&mut self) {
        self.regs.set_flag(flags::CARRY, self.regs.a & 0x80 != 0);
        self.regs.a <<= 1;
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    fn do_asl<M: MemoryBus>(&mut self, memory: &mut M, addr: u16) {
        let value = memory.read(addr);
        self.regs.set_flag(flags::CARRY, value & 0x80 != 0);
        let result = value << 1;
        memory.write(addr, result);
        self.regs.update_zero_negative_flags(result);
    }

    pub(super) fn asl_zeropage<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_addr(memory);
        self.do_asl(memory, addr);
    }

    pub(super) fn asl_zeropage_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_x_addr(memory);
        self.do_asl(memory, addr);
    }

    pub(super) fn asl_absolute<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_addr(memory);
        self.do_asl(memory, addr);
    }

    pub(super) fn asl_absolute_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_x_addr(memory);
        self.do_asl(memory, addr);
    }

    pub(super) fn lsr_accumulator(&mut self) {
        self.regs.set_flag(flags::CARRY, self.regs.a & 0x01 != 0);
        self.regs.a >>= 1;
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    fn do_lsr<M: MemoryBus>(&mut self, memory: &mut M, addr: u16) {
        let value = memory.read(addr);
        self.regs.set_flag(flags::CARRY, value & 0x01 != 0);
        let result = value >> 1;
        memory.write(addr, result);
        self.regs.update_zero_negative_flags(result);
    }

    pub(super) fn lsr_zeropage<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_addr(memory);
        self.do_lsr(memory, addr);
    }

    pub(super) fn lsr_zeropage_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_x_addr(memory);
        self.do_lsr(memory, addr);
    }

    pub(super) fn lsr_absolute<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_addr(memory);
        self.do_lsr(memory, addr);
    }

    pub(super) fn lsr_absolute_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_x_addr(memory);
        self.do_lsr(memory, addr);
    }

    pub(super) fn rol_accumulator(&mut self) {
        let carry_in = self.regs.get_flag(flags::CARRY);
        self.regs.set_flag(flags::CARRY, self.regs.a & 0x80 != 0);
        self.regs.a = (self.regs.a << 1) | if carry_in { 1 } else { 0 };
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    fn do_rol<M: MemoryBus>(&mut self, memory: &mut M, addr: u16) {
        let value = memory.read(addr);
        let carry_in = self.regs.get_flag(flags::CARRY);
        self.regs.set_flag(flags::CARRY, value & 0x80 != 0);
        let result = (value << 1) | if carry_in { 1 } else { 0 };
        memory.write(addr, result);
        self.regs.update_zero_negative_flags(result);
    }

    pub(super) fn rol_zeropage<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_addr(memory);
        self.do_rol(memory, addr);
    }

    pub(super) fn rol_zeropage_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_x_addr(memory);
        self.do_rol(memory, addr);
    }

    pub(super) fn rol_absolute<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_addr(memory);
        self.do_rol(memory, addr);
    }

    pub(super) fn rol_absolute_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_x_addr(memory);
        self.do_rol(memory, addr);
    }

    pub(super) fn ror_accumulator(&mut self) {
        let carry_in = self.regs.get_flag(flags::CARRY);
        self.regs.set_flag(flags::CARRY, self.regs.a & 0x01 != 0);
        self.regs.a = (self.regs.a >> 1) | if carry_in { 0x80 } else { 0 };
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    fn do_ror<M: MemoryBus>(&mut self, memory: &mut M, addr: u16) {
        let value = memory.read(addr);
        let carry_in = self.regs.get_flag(flags::CARRY);
        self.regs.set_flag(flags::CARRY, value & 0x01 != 0);
        let result = (value >> 1) | if carry_in { 0x80 } else { 0 };
        memory.write(addr, result);
        self.regs.update_zero_negative_flags(result);
    }

    pub(super) fn ror_zeropage<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_addr(memory);
        self.do_ror(memory, addr);
    }

    pub(super) fn ror_zeropage_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_x_addr(memory);
        self.do_ror(memory, addr);
    }

    pub(super) fn ror_absolute<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_addr(memory);
        self.do_ror(memory, addr);
    }

    pub(super) fn ror_absolute_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_x_addr(memory);
        self.do_ror(memory, addr);
    }

    //--------------------------------------------------
    // BIT Test
    //--------------------------------------------------
    /// Z=A&M==0、Vはビット6、Nはビット7をそのまま映す
    fn do_bit(&mut self, value: u8) {
        self.regs.set_flag(flags::ZERO, self.regs.a & value == 0);
        self.regs.set_flag(flags::OVERFLOW, value & 0x40 != 0);
        self.regs.set_flag(flags::NEGATIVE, value & 0x80 != 0);
    }

    pub(super) fn bit_zeropage<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_addr(memory);
        let value = memory.read(addr);
        self.do_bit(value);
    }

    pub(super) fn bit_absolute<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_addr(memory);
        let value = memory.read(addr);
        self.do_bit(value);
    }
}

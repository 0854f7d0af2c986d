//! オペコードの実装（パート1）
//!
//! ロード/ストア、転送、スタック、加減算、フラグ、ジャンプ、ブランチ

use super::{flags, Cpu, MemoryBus};

impl Cpu {
    //--------------------------------------------------
    // Load Instructions
    //--------------------------------------------------
    pub(super) fn lda_immediate<M: MemoryBus>(&mut self, memory: &mut M) {
        self.regs.a = self.get_immediate(memory);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn lda_zeropage<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_addr(memory);
        self.regs.a = memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn lda_zeropage_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_x_addr(memory);
        self.regs.a = memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn lda_absolute<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_addr(memory);
        self.regs.a = memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn lda_absolute_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_x_addr(memory);
        self.regs.a = memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn lda_absolute_y<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_y_addr(memory);
        self.regs.a = memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn lda_indirect_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_indirect_x_addr(memory);
        self.regs.a = memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn lda_indirect_y<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_indirect_y_addr(memory);
        self.regs.a = memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn ldx_immediate<M: MemoryBus>(&mut self, memory: &mut M) {
        self.regs.x = self.get_immediate(memory);
        self.regs.update_zero_negative_flags(self.regs.x);
    }

    pub(super) fn ldx_zeropage<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_addr(memory);
        self.regs.x = memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.x);
    }

    pub(super) fn ldx_zeropage_y<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_y_addr(memory);
        self.regs.x = memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.x);
    }

    pub(super) fn ldx_absolute<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_addr(memory);
        self.regs.x = memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.x);
    }

    pub(super) fn ldx_absolute_y<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_y_addr(memory);
        self.regs.x = memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.x);
    }

    pub(super) fn ldy_immediate<M: MemoryBus>(&mut self, memory: &mut M) {
        self.regs.y = self.get_immediate(memory);
        self.regs.update_zero_negative_flags(self.regs.y);
    }

    pub(super) fn ldy_zeropage<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_addr(memory);
        self.regs.y = memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.y);
    }

    pub(super) fn ldy_zeropage_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_x_addr(memory);
        self.regs.y = memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.y);
    }

    pub(super) fn ldy_absolute<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_addr(memory);
        self.regs.y = memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.y);
    }

    pub(super) fn ldy_absolute_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_x_addr(memory);
        self.regs.y = memory.read(addr);
        self.regs.update_zero_negative_flags(self.regs.y);
    }

    //--------------------------------------------------
    // Store Instructions
    //--------------------------------------------------
    pub(super) fn sta_zeropage<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_addr(memory);
        memory.write(addr, self.regs.a);
    }

    pub(super) fn sta_zeropage_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_x_addr(memory);
        memory.write(addr, self.regs.a);
    }

    pub(super) fn sta_absolute<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_addr(memory);
        memory.write(addr, self.regs.a);
    }

    pub(super) fn sta_absolute_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_x_addr(memory);
        memory.write(addr, self.regs.a);
    }

    pub(super) fn sta_absolute_y<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_y_addr(memory);
        memory.write(addr, self.regs.a);
    }

    pub(super) fn sta_indirect_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_indirect_x_addr(memory);
        memory.write(addr, self.regs.a);
    }

    pub(super) fn sta_indirect_y<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_indirect_y_addr(memory);
        memory.write(addr, self.regs.a);
    }

    pub(super) fn stx_zeropage<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_addr(memory);
        memory.write(addr, self.regs.x);
    }

    pub(super) fn stx_zeropage_y<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_y_addr(memory);
        memory.write(addr, self.regs.x);
    }

    pub(super) fn stx_absolute<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_addr(memory);
        memory.write(addr, self.regs.x);
    }

    pub(super) fn sty_zeropage<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_addr(memory);
        memory.write(addr, self.regs.y);
    }

    pub(super) fn sty_zeropage_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_x_addr(memory);
        memory.write(addr, self.regs.y);
    }

    pub(super) fn sty_absolute<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_addr(memory);
        memory.write(addr, self.regs.y);
    }

    //--------------------------------------------------
    // Transfer Instructions
    //--------------------------------------------------
    pub(super) fn tax(&mut self) {
        self.regs.x = self.regs.a;
        self.regs.update_zero_negative_flags(self.regs.x);
    }

    pub(super) fn txa(&mut self) {
        self.regs.a = self.regs.x;
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn tay(&mut self) {
        self.regs.y = self.regs.a;
        self.regs.update_zero_negative_flags(self.regs.y);
    }

    pub(super) fn tya(&mut self) {
        self.regs.a = self.regs.y;
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn tsx(&mut self) {
        self.regs.x = self.regs.sp;
        self.regs.update_zero_negative_flags(self.regs.x);
    }

    /// TXSはフラグを変化させない
    pub(super) fn txs(&mut self) {
        self.regs.sp = self.regs.x;
    }

    //--------------------------------------------------
    // Stack Instructions
    //--------------------------------------------------
    pub(super) fn pha<M: MemoryBus>(&mut self, memory: &mut M) {
        self.push_byte(memory, self.regs.a);
    }

    pub(super) fn pla<M: MemoryBus>(&mut self, memory: &mut M) {
        self.regs.a = self.pop_byte(memory);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    /// PHPはBとUをセットした値を積む
    pub(super) fn php<M: MemoryBus>(&mut self, memory: &mut M) {
        self.push_byte(memory, self.regs.status | flags::BREAK | flags::UNUSED);
    }

    /// PLPはBをクリアし、Uを強制的にセットする
    pub(super) fn plp<M: MemoryBus>(&mut self, memory: &mut M) {
        let status = self.pop_byte(memory);
        self.regs.status = (status | flags::UNUSED) & !flags::BREAK;
    }

    //--------------------------------------------------
    // Arithmetic
    //--------------------------------------------------
    /// ADC本体（バイナリモードのみ、Dフラグは無視）
    fn do_adc(&mut self, value: u8) {
        let carry = if self.regs.get_flag(flags::CARRY) { 1 } else { 0 };
        let sum = self.regs.a as u16 + value as u16 + carry;
        let result = sum as u8;
        self.regs.set_flag(flags::CARRY, sum > 0xFF);
        self.regs
            .set_flag(flags::OVERFLOW, (self.regs.a ^ result) & (value ^ result) & 0x80 != 0);
        self.regs.a = result;
        self.regs.update_zero_negative_flags(result);
    }

    /// SBC本体。A - M - (1 - C) を16ビットで計算し、
    /// ボローが出なければキャリーをセットする
    fn do_sbc(&mut self, value: u8) {
        let borrow = if self.regs.get_flag(flags::CARRY) { 0 } else { 1 };
        let diff = (self.regs.a as u16)
            .wrapping_sub(value as u16)
            .wrapping_sub(borrow);
        let result = diff as u8;
        self.regs.set_flag(flags::CARRY, diff <= 0xFF);
        self.regs
            .set_flag(flags::OVERFLOW, (self.regs.a ^ result) & (!value ^ result) & 0x80 != 0);
        self.regs.a = result;
        self.regs.update_zero_negative_flags(result);
    }

    pub(super) fn adc_immediate<M: MemoryBus>(&mut self, memory: &mut M) {
        let value = self.get_immediate(memory);
        self.do_adc(value);
    }

    pub(super) fn adc_zeropage<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_addr(memory);
        let value = memory.read(addr);
        self.do_adc(value);
    }

    pub(super) fn adc_zeropage_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_x_addr(memory);
        let value = memory.read(addr);
        self.do_adc(value);
    }

    pub(super) fn adc_absolute<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_addr(memory);
        let value = memory.read(addr);
        self.do_adc(value);
    }

    pub(super) fn adc_absolute_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_x_addr(memory);
        let value = memory.read(addr);
        self.do_adc(value);
    }

    pub(super) fn adc_absolute_y<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_y_addr(memory);
        let value = memory.read(addr);
        self.do_adc(value);
    }

    pub(super) fn adc_indirect_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_indirect_x_addr(memory);
        let value = memory.read(addr);
        self.do_adc(value);
    }

    pub(super) fn adc_indirect_y<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_indirect_y_addr(memory);
        let value = memory.read(addr);
        self.do_adc(value);
    }

    pub(super) fn sbc_immediate<M: MemoryBus>(&mut self, memory: &mut M) {
        let value = self.get_immediate(memory);
        self.do_sbc(value);
    }

    pub(super) fn sbc_zeropage<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_addr(memory);
        let value = memory.read(addr);
        self.do_sbc(value);
    }

    pub(super) fn sbc_zeropage_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_zeropage_x_addr(memory);
        let value = memory.read(addr);
        self.do_sbc(value);
    }

    pub(super) fn sbc_absolute<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_addr(memory);
        let value = memory.read(addr);
        self.do_sbc(value);
    }

    pub(super) fn sbc_absolute_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_x_addr(memory);
        let value = memory.read(addr);
        self.do_sbc(value);
    }

    pub(super) fn sbc_absolute_y<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_y_addr(memory);
        let value = memory.read(addr);
        self.do_sbc(value);
    }

    pub(super) fn sbc_indirect_x<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_indirect_x_addr(memory);
        let value = memory.read(addr);
        self.do_sbc(value);
    }

    pub(super) fn sbc_indirect_y<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_indirect_y_addr(memory);
        let value = memory.read(addr);
        self.do_sbc(value);
    }

    //--------------------------------------------------
    // Branch Instructions
    //--------------------------------------------------
    pub(super) fn bpl<M: MemoryBus>(&mut self, memory: &mut M) {
        let condition = !self.regs.get_flag(flags::NEGATIVE);
        self.branch(memory, condition);
    }

    pub(super) fn bmi<M: MemoryBus>(&mut self, memory: &mut M) {
        let condition = self.regs.get_flag(flags::NEGATIVE);
        self.branch(memory, condition);
    }

    pub(super) fn bvc<M: MemoryBus>(&mut self, memory: &mut M) {
        let condition = !self.regs.get_flag(flags::OVERFLOW);
        self.branch(memory, condition);
    }

    pub(super) fn bvs<M: MemoryBus>(&mut self, memory: &mut M) {
        let condition = self.regs.get_flag(flags::OVERFLOW);
        self.branch(memory, condition);
    }

    pub(super) fn bcc<M: MemoryBus>(&mut self, memory: &mut M) {
        let condition = !self.regs.get_flag(flags::CARRY);
        self.branch(memory, condition);
    }

    pub(super) fn bcs<M: MemoryBus>(&mut self, memory: &mut M) {
        let condition = self.regs.get_flag(flags::CARRY);
        self.branch(memory, condition);
    }

    pub(super) fn bne<M: MemoryBus>(&mut self, memory: &mut M) {
        let condition = !self.regs.get_flag(flags::ZERO);
        self.branch(memory, condition);
    }

    pub(super) fn beq<M: MemoryBus>(&mut self, memory: &mut M) {
        let condition = self.regs.get_flag(flags::ZERO);
        self.branch(memory, condition);
    }

    //--------------------------------------------------
    // Jump/Call
    //--------------------------------------------------
    pub(super) fn jmp_absolute<M: MemoryBus>(&mut self, memory: &mut M) {
        self.regs.pc = self.get_absolute_addr(memory);
    }

    pub(super) fn jmp_indirect<M: MemoryBus>(&mut self, memory: &mut M) {
        self.regs.pc = self.get_indirect_addr(memory);
    }

    /// JSRはオペランドの次のバイトのアドレス-1を積む
    pub(super) fn jsr<M: MemoryBus>(&mut self, memory: &mut M) {
        let addr = self.get_absolute_addr(memory);
        let return_addr = self.regs.pc.wrapping_sub(1);
        self.push_word(memory, return_addr);
        self.regs.pc = addr;
    }

    pub(super) fn rts<M: MemoryBus>(&mut self, memory: &mut M) {
        self.regs.pc = self.pop_word(memory).wrapping_add(1);
    }

    /// BRKは2バイト命令として復帰アドレス（BRK+2）を積み、
    /// Bをセットした状態でPを積んで$FFFEへ飛ぶ
    pub(super) fn brk<M: MemoryBus>(&mut self, memory: &mut M) {
        self.regs.pc = self.regs.pc.wrapping_add(1);
        self.push_word(memory, self.regs.pc);
        self.push_byte(memory, self.regs.status | flags::BREAK | flags::UNUSED);
        self.regs.set_flag(flags::IRQ_DISABLE, true);
        let low = memory.read(0xFFFE) as u16;
        let high = memory.read(0xFFFF) as u16;
        self.regs.pc = (high << 8) | low;
    }

    /// RTIはPを戻し（Bクリア・U強制セット）、続けてPCを戻す
    pub(super) fn rti<M: MemoryBus>(&mut self, memory: &mut M) {
        let status = self.pop_byte(memory);
        self.regs.status = (status | flags::UNUSED) & !flags::BREAK;
        self.regs.pc = self.pop_word(memory);
    }

    //--------------------------------------------------
    // Flag Instructions
    //--------------------------------------------------
    pub(super) fn clc(&mut self) {
        self.regs.set_flag(flags::CARRY, false);
    }

    pub(super) fn sec(&mut self) {
        self.regs.set_flag(flags::CARRY, true);
    }

    pub(super) fn cli(&mut self) {
        self.regs.set_flag(flags::IRQ_DISABLE, false);
    }

    pub(super) fn sei(&mut self) {
        self.regs.set_flag(flags::IRQ_DISABLE, true);
    }

    pub(super) fn clv(&mut self) {
        self.regs.set_flag(flags::OVERFLOW, false);
    }

    pub(super) fn cld(&mut self) {
        self.regs.set_flag(flags::DECIMAL, false);
    }

    pub(super) fn sed(&mut self) {
        self.regs.set_flag(flags::DECIMAL, true);
    }

    pub(super) fn nop(&mut self) {}
}

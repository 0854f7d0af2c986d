//! MOS 6502 CPU エミュレータ
//!
//! Apple IIで使用される6502プロセッサのエミュレーション実装
//! Based on 6502 technical specifications and datasheet
//!
//! サイクル数は命令ごとに256エントリのテーブルから加算する。
//! ページ境界や分岐成立による追加サイクルは計上しない

mod opcodes;
mod opcodes2;
pub mod addressing;

/// CPUのステータスレジスタのフラグビット
pub mod flags {
    pub const CARRY: u8 = 0b0000_0001;       // C: キャリーフラグ
    pub const ZERO: u8 = 0b0000_0010;        // Z: ゼロフラグ
    pub const IRQ_DISABLE: u8 = 0b0000_0100; // I: 割り込み禁止フラグ
    pub const DECIMAL: u8 = 0b0000_1000;     // D: BCDモードフラグ（ビットのみ保持）
    pub const BREAK: u8 = 0b0001_0000;       // B: ブレークフラグ
    pub const UNUSED: u8 = 0b0010_0000;      // 未使用（常に1）
    pub const OVERFLOW: u8 = 0b0100_0000;    // V: オーバーフローフラグ
    pub const NEGATIVE: u8 = 0b1000_0000;    // N: 負数フラグ
}

/// 割り込み受付に要するサイクル数
const INTERRUPT_CYCLES: u32 = 7;

/// 全256オペコードの公称サイクル数
/// 未定義オペコードにもこの表の値がそのまま適用される
pub const CYCLE_TABLE: [u8; 256] = [
    7, 6, 0, 8, 3, 3, 5, 5, 3, 2, 2, 2, 4, 4, 6, 6,
    2, 5, 0, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7,
    6, 6, 0, 8, 3, 3, 5, 5, 4, 2, 2, 2, 4, 4, 6, 6,
    2, 5, 0, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7,
    6, 6, 0, 8, 3, 3, 5, 5, 3, 2, 2, 2, 3, 4, 6, 6,
    2, 5, 0, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7,
    6, 6, 0, 8, 3, 3, 5, 5, 4, 2, 2, 2, 5, 4, 6, 6,
    2, 5, 0, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7,
    2, 6, 2, 6, 3, 3, 3, 3, 2, 2, 2, 2, 4, 4, 4, 4,
    2, 6, 0, 6, 4, 4, 4, 4, 2, 5, 2, 5, 5, 5, 5, 5,
    2, 6, 2, 6, 3, 3, 3, 3, 2, 2, 2, 2, 4, 4, 4, 4,
    2, 5, 0, 5, 4, 4, 4, 4, 2, 4, 2, 4, 4, 4, 4, 4,
    2, 6, 2, 8, 3, 3, 5, 5, 2, 2, 2, 2, 4, 4, 6, 6,
    2, 5, 0, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7,
    2, 6, 2, 8, 3, 3, 5, 5, 2, 2, 2, 2, 4, 4, 6, 6,
    2, 5, 0, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7,
];

/// CPUレジスタの状態
#[derive(Debug, Clone)]
pub struct Registers {
    /// アキュムレータ（A）
    pub a: u8,
    /// Xインデックスレジスタ
    pub x: u8,
    /// Yインデックスレジスタ
    pub y: u8,
    /// スタックポインタ（$0100ページ内）
    pub sp: u8,
    /// プログラムカウンタ
    pub pc: u16,
    /// ステータスレジスタ（プロセッサフラグ）
    pub status: u8,
}

impl Default for Registers {
    fn default() -> Self {
        Registers {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFF,
            pc: 0,
            status: flags::UNUSED | flags::IRQ_DISABLE,
        }
    }
}

impl Registers {
    /// フラグをセット
    pub fn set_flag(&mut self, flag: u8, value: bool) {
        if value {
            self.status |= flag;
        } else {
            self.status &= !flag;
        }
    }

    /// フラグを取得
    pub fn get_flag(&self, flag: u8) -> bool {
        (self.status & flag) != 0
    }

    /// ゼロフラグと負数フラグを値に基づいて更新
    pub fn update_zero_negative_flags(&mut self, value: u8) {
        self.set_flag(flags::ZERO, value == 0);
        self.set_flag(flags::NEGATIVE, (value & 0x80) != 0);
    }
}

/// メモリバスインターフェース
/// CPUがメモリにアクセスするために必要なトレイト
pub trait MemoryBus {
    /// メモリから1バイト読み取り
    fn read(&mut self, address: u16) -> u8;
    /// メモリに1バイト書き込み
    fn write(&mut self, address: u16, value: u8);
}

/// 6502 CPUエミュレータ
#[derive(Debug, Clone)]
pub struct Cpu {
    /// CPUレジスタ
    pub regs: Registers,
    /// 累積サイクル数
    pub total_cycles: u64,
    /// IRQ（割り込み要求）ライン
    pub irq_pending: bool,
    /// NMI（ノンマスカブル割り込み）ライン
    pub nmi_pending: bool,
    /// trueにするとIフラグを無視してIRQを受け付ける（テスト用）
    pub irq_ignores_mask: bool,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    /// 新しいCPUインスタンスを作成
    pub fn new() -> Self {
        Cpu {
            regs: Registers::default(),
            total_cycles: 0,
            irq_pending: false,
            nmi_pending: false,
            irq_ignores_mask: false,
        }
    }

    /// CPUをリセット
    /// PCは$FFFC-$FFFDのリセットベクター、SP=$FF、P=$24
    /// RAMやディスクの状態はここでは触らない
    pub fn reset<M: MemoryBus>(&mut self, memory: &mut M) {
        let low = memory.read(0xFFFC) as u16;
        let high = memory.read(0xFFFD) as u16;
        self.regs.pc = (high << 8) | low;
        self.regs.sp = 0xFF;
        self.regs.status = flags::UNUSED | flags::IRQ_DISABLE;
    }

    /// IRQラインを立てる
    pub fn request_irq(&mut self) {
        self.irq_pending = true;
    }

    /// NMIラインを立てる
    pub fn request_nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// 割り込みシーケンス本体
    /// PC、ステータス（Uセット・Bクリア）を積み、Iを立ててベクターへ飛ぶ
    fn handle_interrupt<M: MemoryBus>(&mut self, memory: &mut M, vector: u16) {
        self.push_word(memory, self.regs.pc);
        let status = (self.regs.status | flags::UNUSED) & !flags::BREAK;
        self.push_byte(memory, status);
        self.regs.set_flag(flags::IRQ_DISABLE, true);
        let low = memory.read(vector) as u16;
        let high = memory.read(vector.wrapping_add(1)) as u16;
        self.regs.pc = (high << 8) | low;
    }

    /// 1命令を実行し、消費したサイクル数を返す
    /// 割り込みはフェッチ前に一度だけポーリングする（NMI優先）
    pub fn step<M: MemoryBus>(&mut self, memory: &mut M) -> u32 {
        if self.nmi_pending {
            self.nmi_pending = false;
            self.handle_interrupt(memory, 0xFFFA);
            self.total_cycles += INTERRUPT_CYCLES as u64;
            return INTERRUPT_CYCLES;
        }

        if self.irq_pending && (self.irq_ignores_mask || !self.regs.get_flag(flags::IRQ_DISABLE)) {
            self.irq_pending = false;
            self.handle_interrupt(memory, 0xFFFE);
            self.total_cycles += INTERRUPT_CYCLES as u64;
            return INTERRUPT_CYCLES;
        }

        let opcode = self.fetch_byte(memory);
        let cycles = CYCLE_TABLE[opcode as usize] as u32;
        self.execute_opcode(memory, opcode);
        self.total_cycles += cycles as u64;
        cycles
    }

    /// PCから1バイトフェッチしてPCをインクリメント
    fn fetch_byte<M: MemoryBus>(&mut self, memory: &mut M) -> u8 {
        let value = memory.read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    /// スタックに1バイトプッシュ（$0100ページ、SPはラップする）
    fn push_byte<M: MemoryBus>(&mut self, memory: &mut M, value: u8) {
        memory.write(0x0100 | self.regs.sp as u16, value);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
    }

    /// スタックから1バイトポップ
    fn pop_byte<M: MemoryBus>(&mut self, memory: &mut M) -> u8 {
        self.regs.sp = self.regs.sp.wrapping_add(1);
        memory.read(0x0100 | self.regs.sp as u16)
    }

    /// スタックに2バイトプッシュ（上位バイト先）
    fn push_word<M: MemoryBus>(&mut self, memory: &mut M, value: u16) {
        self.push_byte(memory, (value >> 8) as u8);
        self.push_byte(memory, value as u8);
    }

    /// スタックから2バイトポップ
    fn pop_word<M: MemoryBus>(&mut self, memory: &mut M) -> u16 {
        let low = self.pop_byte(memory) as u16;
        let high = self.pop_byte(memory) as u16;
        (high << 8) | low
    }

    /// オペコードを実行
    fn execute_opcode<M: MemoryBus>(&mut self, memory: &mut M, opcode: u8) {
        match opcode {
            // LDA - Load Accumulator
            0xA9 => self.lda_immediate(memory),
            0xA5 => self.lda_zeropage(memory),
            0xB5 => self.lda_zeropage_x(memory),
            0xAD => self.lda_absolute(memory),
            0xBD => self.lda_absolute_x(memory),
            0xB9 => self.lda_absolute_y(memory),
            0xA1 => self.lda_indirect_x(memory),
            0xB1 => self.lda_indirect_y(memory),

            // LDX - Load X Register
            0xA2 => self.ldx_immediate(memory),
            0xA6 => self.ldx_zeropage(memory),
            0xB6 => self.ldx_zeropage_y(memory),
            0xAE => self.ldx_absolute(memory),
            0xBE => self.ldx_absolute_y(memory),

            // LDY - Load Y Register
            0xA0 => self.ldy_immediate(memory),
            0xA4 => self.ldy_zeropage(memory),
            0xB4 => self.ldy_zeropage_x(memory),
            0xAC => self.ldy_absolute(memory),
            0xBC => self.ldy_absolute_x(memory),

            // STA - Store Accumulator
            0x85 => self.sta_zeropage(memory),
            0x95 => self.sta_zeropage_x(memory),
            0x8D => self.sta_absolute(memory),
            0x9D => self.sta_absolute_x(memory),
            0x99 => self.sta_absolute_y(memory),
            0x81 => self.sta_indirect_x(memory),
            0x91 => self.sta_indirect_y(memory),

            // STX - Store X Register
            0x86 => self.stx_zeropage(memory),
            0x96 => self.stx_zeropage_y(memory),
            0x8E => self.stx_absolute(memory),

            // STY - Store Y Register
            0x84 => self.sty_zeropage(memory),
            0x94 => self.sty_zeropage_x(memory),
            0x8C => self.sty_absolute(memory),

            // Transfer Instructions
            0xAA => self.tax(),
            0x8A => self.txa(),
            0xA8 => self.tay(),
            0x98 => self.tya(),
            0xBA => self.tsx(),
            0x9A => self.txs(),

            // Stack Instructions
            0x48 => self.pha(memory),
            0x68 => self.pla(memory),
            0x08 => self.php(memory),
            0x28 => self.plp(memory),

            // Arithmetic - ADC
            0x69 => self.adc_immediate(memory),
            0x65 => self.adc_zeropage(memory),
            0x75 => self.adc_zeropage_x(memory),
            0x6D => self.adc_absolute(memory),
            0x7D => self.adc_absolute_x(memory),
            0x79 => self.adc_absolute_y(memory),
            0x61 => self.adc_indirect_x(memory),
            0x71 => self.adc_indirect_y(memory),

            // Arithmetic - SBC
            0xE9 => self.sbc_immediate(memory),
            0xE5 => self.sbc_zeropage(memory),
            0xF5 => self.sbc_zeropage_x(memory),
            0xED => self.sbc_absolute(memory),
            0xFD => self.sbc_absolute_x(memory),
            0xF9 => self.sbc_absolute_y(memory),
            0xE1 => self.sbc_indirect_x(memory),
            0xF1 => self.sbc_indirect_y(memory),

            // Compare
            0xC9 => self.cmp_immediate(memory),
            0xC5 => self.cmp_zeropage(memory),
            0xD5 => self.cmp_zeropage_x(memory),
            0xCD => self.cmp_absolute(memory),
            0xDD => self.cmp_absolute_x(memory),
            0xD9 => self.cmp_absolute_y(memory),
            0xC1 => self.cmp_indirect_x(memory),
            0xD1 => self.cmp_indirect_y(memory),

            0xE0 => self.cpx_immediate(memory),
            0xE4 => self.cpx_zeropage(memory),
            0xEC => self.cpx_absolute(memory),

            0xC0 => self.cpy_immediate(memory),
            0xC4 => self.cpy_zeropage(memory),
            0xCC => self.cpy_absolute(memory),

            // Increment/Decrement
            0xE6 => self.inc_zeropage(memory),
            0xF6 => self.inc_zeropage_x(memory),
            0xEE => self.inc_absolute(memory),
            0xFE => self.inc_absolute_x(memory),

            0xC6 => self.dec_zeropage(memory),
            0xD6 => self.dec_zeropage_x(memory),
            0xCE => self.dec_absolute(memory),
            0xDE => self.dec_absolute_x(memory),

            0xE8 => self.inx(),
            0xC8 => self.iny(),
            0xCA => self.dex(),
            0x88 => self.dey(),

            // Logical - AND
            0x29 => self.and_immediate(memory),
            0x25 => self.and_zeropage(memory),
            0x35 => self.and_zeropage_x(memory),
            0x2D => self.and_absolute(memory),
            0x3D => self.and_absolute_x(memory),
            0x39 => self.and_absolute_y(memory),
            0x21 => self.and_indirect_x(memory),
            0x31 => self.and_indirect_y(memory),

            // Logical - ORA
            0x09 => self.ora_immediate(memory),
            0x05 => self.ora_zeropage(memory),
            0x15 => self.ora_zeropage_x(memory),
            0x0D => self.ora_absolute(memory),
            0x1D => self.ora_absolute_x(memory),
            0x19 => self.ora_absolute_y(memory),
            0x01 => self.ora_indirect_x(memory),
            0x11 => self.ora_indirect_y(memory),

            // Logical - EOR
            0x49 => self.eor_immediate(memory),
            0x45 => self.eor_zeropage(memory),
            0x55 => self.eor_zeropage_x(memory),
            0x4D => self.eor_absolute(memory),
            0x5D => self.eor_absolute_x(memory),
            0x59 => self.eor_absolute_y(memory),
            0x41 => self.eor_indirect_x(memory),
            0x51 => self.eor_indirect_y(memory),

            // Shifts
            0x0A => self.asl_accumulator(),
            0x06 => self.asl_zeropage(memory),
            0x16 => self.asl_zeropage_x(memory),
            0x0E => self.asl_absolute(memory),
            0x1E => self.asl_absolute_x(memory),

            0x4A => self.lsr_accumulator(),
            0x46 => self.lsr_zeropage(memory),
            0x56 => self.lsr_zeropage_x(memory),
            0x4E => self.lsr_absolute(memory),
            0x5E => self.lsr_absolute_x(memory),

            0x2A => self.rol_accumulator(),
            0x26 => self.rol_zeropage(memory),
            0x36 => self.rol_zeropage_x(memory),
            0x2E => self.rol_absolute(memory),
            0x3E => self.rol_absolute_x(memory),

            0x6A => self.ror_accumulator(),
            0x66 => self.ror_zeropage(memory),
            0x76 => self.ror_zeropage_x(memory),
            0x6E => self.ror_absolute(memory),
            0x7E => self.ror_absolute_x(memory),

            // BIT test
            0x24 => self.bit_zeropage(memory),
            0x2C => self.bit_absolute(memory),

            // Branch Instructions
            0x10 => self.bpl(memory),
            0x30 => self.bmi(memory),
            0x50 => self.bvc(memory),
            0x70 => self.bvs(memory),
            0x90 => self.bcc(memory),
            0xB0 => self.bcs(memory),
            0xD0 => self.bne(memory),
            0xF0 => self.beq(memory),

            // Jump/Call
            0x4C => self.jmp_absolute(memory),
            0x6C => self.jmp_indirect(memory),
            0x20 => self.jsr(memory),
            0x60 => self.rts(memory),

            // Interrupts
            0x00 => self.brk(memory),
            0x40 => self.rti(memory),

            // Flag Instructions
            0x18 => self.clc(),
            0x38 => self.sec(),
            0x58 => self.cli(),
            0x78 => self.sei(),
            0xB8 => self.clv(),
            0xD8 => self.cld(),
            0xF8 => self.sed(),

            // NOP
            0xEA => self.nop(),

            // 未定義オペコードはNOP扱い（サイクル数はテーブル値）
            _ => {}
        }
    }
}

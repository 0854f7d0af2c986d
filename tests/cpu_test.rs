//! 6502 CPUの命令・フラグ・割り込みのテスト
//!
//! Tests cover:
//! - ADC/SBCのフラグモデル（全A, M, Cの組み合わせ）
//! - SBCとADCの双対性
//! - 比較命令、スタック、JSR/RTS、BRK/RTI
//! - 間接JMPのページラップバグ
//! - 割り込みのマスクとベクター
//! - サイクルテーブル

use a2em::cpu::{flags, Cpu, MemoryBus, CYCLE_TABLE};

/// テスト用のシンプルなメモリ（64KB RAM）
struct TestMemory {
    ram: Vec<u8>,
}

impl TestMemory {
    fn new() -> Self {
        TestMemory {
            ram: vec![0; 0x10000],
        }
    }

    fn load(&mut self, address: u16, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            self.ram[(address as usize + i) & 0xFFFF] = byte;
        }
    }
}

impl MemoryBus for TestMemory {
    fn read(&mut self, address: u16) -> u8 {
        self.ram[address as usize]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.ram[address as usize] = value;
    }
}

/// PC=$8000で実行を始めるCPUとメモリを用意する
fn setup() -> (Cpu, TestMemory) {
    let mut cpu = Cpu::new();
    cpu.regs.pc = 0x8000;
    (cpu, TestMemory::new())
}

// ========== Arithmetic ==========

#[test]
fn adc_matches_model_for_all_inputs() {
    let (mut cpu, mut mem) = setup();
    mem.ram[0x8000] = 0x69; // ADC #imm

    for a in 0..=255u16 {
        for m in 0..=255u16 {
            for c in 0..=1u16 {
                cpu.regs.pc = 0x8000;
                cpu.regs.a = a as u8;
                cpu.regs.set_flag(flags::CARRY, c == 1);
                mem.ram[0x8001] = m as u8;

                cpu.step(&mut mem);

                let sum = a + m + c;
                let result = (sum & 0xFF) as u8;
                assert_eq!(cpu.regs.a, result);
                assert_eq!(cpu.regs.get_flag(flags::CARRY), sum > 0xFF);
                let overflow = (a as u8 ^ result) & (m as u8 ^ result) & 0x80 != 0;
                assert_eq!(cpu.regs.get_flag(flags::OVERFLOW), overflow);
                assert_eq!(cpu.regs.get_flag(flags::ZERO), result == 0);
                assert_eq!(cpu.regs.get_flag(flags::NEGATIVE), result & 0x80 != 0);
            }
        }
    }
}

#[test]
fn sbc_is_adc_of_complement() {
    let (mut cpu_sbc, mut mem_sbc) = setup();
    let (mut cpu_adc, mut mem_adc) = setup();
    mem_sbc.ram[0x8000] = 0xE9; // SBC #imm
    mem_adc.ram[0x8000] = 0x69; // ADC #imm

    for a in 0..=255u8 {
        for m in (0..=255u8).step_by(7) {
            for c in 0..=1u8 {
                cpu_sbc.regs.pc = 0x8000;
                cpu_sbc.regs.a = a;
                cpu_sbc.regs.set_flag(flags::CARRY, c == 1);
                mem_sbc.ram[0x8001] = m;
                cpu_sbc.step(&mut mem_sbc);

                cpu_adc.regs.pc = 0x8000;
                cpu_adc.regs.a = a;
                cpu_adc.regs.set_flag(flags::CARRY, c == 1);
                mem_adc.ram[0x8001] = !m;
                cpu_adc.step(&mut mem_adc);

                assert_eq!(cpu_sbc.regs.a, cpu_adc.regs.a, "A={:02X} M={:02X} C={}", a, m, c);
                assert_eq!(cpu_sbc.regs.status, cpu_adc.regs.status, "A={:02X} M={:02X} C={}", a, m, c);
            }
        }
    }
}

#[test]
fn sbc_basic_subtraction() {
    let (mut cpu, mut mem) = setup();
    mem.load(0x8000, &[0xE9, 0x10]); // SBC #$10
    cpu.regs.a = 0x50;
    cpu.regs.set_flag(flags::CARRY, true); // no borrow

    cpu.step(&mut mem);

    assert_eq!(cpu.regs.a, 0x40);
    assert!(cpu.regs.get_flag(flags::CARRY));
    assert!(!cpu.regs.get_flag(flags::OVERFLOW));
}

// ========== Compare ==========

#[test]
fn lda_then_cmp_same_value_sets_z_and_c() {
    let (mut cpu, mut mem) = setup();
    mem.load(0x8000, &[0xA9, 0x42, 0xC9, 0x42]); // LDA #$42; CMP #$42

    cpu.step(&mut mem);
    cpu.step(&mut mem);

    assert!(cpu.regs.get_flag(flags::ZERO));
    assert!(cpu.regs.get_flag(flags::CARRY));
}

#[test]
fn cmp_less_clears_carry() {
    let (mut cpu, mut mem) = setup();
    mem.load(0x8000, &[0xC9, 0x50]); // CMP #$50
    cpu.regs.a = 0x40;

    cpu.step(&mut mem);

    assert!(!cpu.regs.get_flag(flags::CARRY));
    assert!(!cpu.regs.get_flag(flags::ZERO));
    assert!(cpu.regs.get_flag(flags::NEGATIVE)); // 0x40 - 0x50 = 0xF0
}

#[test]
fn cpx_and_cpy_compare_index_registers() {
    let (mut cpu, mut mem) = setup();
    mem.load(0x8000, &[0xE0, 0x10, 0xC0, 0x20]); // CPX #$10; CPY #$20
    cpu.regs.x = 0x10;
    cpu.regs.y = 0x30;

    cpu.step(&mut mem);
    assert!(cpu.regs.get_flag(flags::ZERO));
    assert!(cpu.regs.get_flag(flags::CARRY));

    cpu.step(&mut mem);
    assert!(!cpu.regs.get_flag(flags::ZERO));
    assert!(cpu.regs.get_flag(flags::CARRY));
}

// ========== Stack ==========

#[test]
fn pha_pla_round_trips_accumulator() {
    let (mut cpu, mut mem) = setup();
    mem.load(0x8000, &[0x48, 0xA9, 0x00, 0x68]); // PHA; LDA #$00; PLA
    cpu.regs.a = 0x42;

    cpu.step(&mut mem);
    cpu.step(&mut mem);
    cpu.step(&mut mem);

    assert_eq!(cpu.regs.a, 0x42);
    assert_eq!(cpu.regs.sp, 0xFF);
}

#[test]
fn php_plp_round_trips_status_modulo_break() {
    let (mut cpu, mut mem) = setup();
    mem.load(0x8000, &[0x08, 0x28]); // PHP; PLP
    cpu.regs.status = flags::CARRY | flags::NEGATIVE | flags::UNUSED;

    cpu.step(&mut mem);
    // PHPはBとUをセットした値を積む
    assert_eq!(
        mem.ram[0x01FF],
        flags::CARRY | flags::NEGATIVE | flags::UNUSED | flags::BREAK
    );

    cpu.step(&mut mem);
    // プルするとBはクリアされ、Uはセットされたまま
    assert_eq!(cpu.regs.status, flags::CARRY | flags::NEGATIVE | flags::UNUSED);
}

#[test]
fn stack_pointer_wraps_within_stack_page() {
    let (mut cpu, mut mem) = setup();
    mem.load(0x8000, &[0x48, 0x48]); // PHA; PHA
    cpu.regs.sp = 0x00;
    cpu.regs.a = 0x77;

    cpu.step(&mut mem);
    assert_eq!(mem.ram[0x0100], 0x77);
    assert_eq!(cpu.regs.sp, 0xFF);

    cpu.step(&mut mem);
    assert_eq!(mem.ram[0x01FF], 0x77);
}

// ========== Control Flow ==========

#[test]
fn jsr_rts_resumes_after_operand() {
    let (mut cpu, mut mem) = setup();
    mem.load(0x8000, &[0x20, 0x00, 0x90]); // JSR $9000
    mem.ram[0x9000] = 0x60; // RTS

    cpu.step(&mut mem);
    assert_eq!(cpu.regs.pc, 0x9000);
    // JSRはオペランド末尾のアドレス（PC-1）を積む
    assert_eq!(mem.ram[0x01FF], 0x80);
    assert_eq!(mem.ram[0x01FE], 0x02);

    cpu.step(&mut mem);
    assert_eq!(cpu.regs.pc, 0x8003);
    assert_eq!(cpu.regs.sp, 0xFF);
}

#[test]
fn jmp_indirect_follows_pointer() {
    let (mut cpu, mut mem) = setup();
    mem.load(0x8000, &[0x6C, 0x00, 0x30]); // JMP ($3000)
    mem.ram[0x3000] = 0x34;
    mem.ram[0x3001] = 0x12;

    cpu.step(&mut mem);

    assert_eq!(cpu.regs.pc, 0x1234);
}

#[test]
fn jmp_indirect_page_wrap_bug() {
    let (mut cpu, mut mem) = setup();
    mem.load(0x8000, &[0x6C, 0xFF, 0x30]); // JMP ($30FF)
    mem.ram[0x30FF] = 0x34;
    mem.ram[0x3100] = 0x12; // 正しい6502ならここを読むはずだが
    mem.ram[0x3000] = 0x56; // バグにより同一ページの先頭から読む

    cpu.step(&mut mem);

    assert_eq!(cpu.regs.pc, 0x5634);
}

#[test]
fn branch_taken_and_not_taken_consume_offset_once() {
    let (mut cpu, mut mem) = setup();
    mem.load(0x8000, &[0xD0, 0x05]); // BNE +5
    cpu.regs.set_flag(flags::ZERO, false);
    cpu.step(&mut mem);
    assert_eq!(cpu.regs.pc, 0x8007);

    let (mut cpu, mut mem) = setup();
    mem.load(0x8000, &[0xD0, 0x05]); // BNE +5 (not taken)
    cpu.regs.set_flag(flags::ZERO, true);
    cpu.step(&mut mem);
    assert_eq!(cpu.regs.pc, 0x8002);
}

#[test]
fn branch_backward_with_negative_offset() {
    let (mut cpu, mut mem) = setup();
    mem.load(0x8000, &[0xF0, 0xFC]); // BEQ -4
    cpu.regs.set_flag(flags::ZERO, true);

    cpu.step(&mut mem);

    assert_eq!(cpu.regs.pc, 0x7FFE);
}

#[test]
fn brk_pushes_return_address_and_rti_restores() {
    let (mut cpu, mut mem) = setup();
    mem.ram[0x8000] = 0x00; // BRK
    mem.ram[0xFFFE] = 0x00;
    mem.ram[0xFFFF] = 0x90;
    mem.ram[0x9000] = 0x40; // RTI
    cpu.regs.status = flags::UNUSED | flags::CARRY;

    cpu.step(&mut mem);

    // BRKの復帰アドレスはBRKオペコードの2バイト後
    assert_eq!(cpu.regs.pc, 0x9000);
    assert_eq!(mem.ram[0x01FF], 0x80);
    assert_eq!(mem.ram[0x01FE], 0x02);
    // 積まれたステータスはBとUがセットされている
    assert_eq!(
        mem.ram[0x01FD],
        flags::UNUSED | flags::CARRY | flags::BREAK
    );
    assert!(cpu.regs.get_flag(flags::IRQ_DISABLE));

    cpu.step(&mut mem);

    // RTIはBをクリアしUをセットした状態で戻し、PCを正確に戻す
    assert_eq!(cpu.regs.pc, 0x8002);
    assert_eq!(cpu.regs.status, flags::UNUSED | flags::CARRY);
}

// ========== Addressing ==========

#[test]
fn zero_page_x_wraps_within_page() {
    let (mut cpu, mut mem) = setup();
    mem.load(0x8000, &[0xB5, 0xFF]); // LDA $FF,X
    cpu.regs.x = 0x02;
    mem.ram[0x0001] = 0x42;

    cpu.step(&mut mem);

    assert_eq!(cpu.regs.a, 0x42);
}

#[test]
fn indirect_x_pointer_wraps_in_zero_page() {
    let (mut cpu, mut mem) = setup();
    mem.load(0x8000, &[0xA1, 0xFF]); // LDA ($FF,X)
    cpu.regs.x = 0x01;
    mem.ram[0x0000] = 0x00;
    mem.ram[0x0001] = 0x20;
    mem.ram[0x2000] = 0x99;

    cpu.step(&mut mem);

    assert_eq!(cpu.regs.a, 0x99);
}

#[test]
fn indirect_y_adds_index_after_lookup() {
    let (mut cpu, mut mem) = setup();
    mem.load(0x8000, &[0xB1, 0x40]); // LDA ($40),Y
    cpu.regs.y = 0x03;
    mem.ram[0x0040] = 0x00;
    mem.ram[0x0041] = 0x20;
    mem.ram[0x2003] = 0x77;

    cpu.step(&mut mem);

    assert_eq!(cpu.regs.a, 0x77);
}

// ========== Shifts and Memory Ops ==========

#[test]
fn shifts_move_bits_through_carry() {
    let (mut cpu, mut mem) = setup();
    // ASL A; ROL A
    mem.load(0x8000, &[0x0A, 0x2A]);
    cpu.regs.a = 0x81;
    cpu.regs.set_flag(flags::CARRY, false);

    cpu.step(&mut mem);
    assert_eq!(cpu.regs.a, 0x02);
    assert!(cpu.regs.get_flag(flags::CARRY));

    cpu.step(&mut mem);
    // ROLは直前のキャリーをビット0に入れる
    assert_eq!(cpu.regs.a, 0x05);
    assert!(!cpu.regs.get_flag(flags::CARRY));
}

#[test]
fn ror_inserts_carry_on_the_left() {
    let (mut cpu, mut mem) = setup();
    mem.load(0x8000, &[0x6A]); // ROR A
    cpu.regs.a = 0x01;
    cpu.regs.set_flag(flags::CARRY, true);

    cpu.step(&mut mem);

    assert_eq!(cpu.regs.a, 0x80);
    assert!(cpu.regs.get_flag(flags::CARRY));
}

#[test]
fn inc_dec_memory_updates_flags() {
    let (mut cpu, mut mem) = setup();
    mem.load(0x8000, &[0xE6, 0x10, 0xC6, 0x10]); // INC $10; DEC $10
    mem.ram[0x0010] = 0xFF;

    cpu.step(&mut mem);
    assert_eq!(mem.ram[0x0010], 0x00);
    assert!(cpu.regs.get_flag(flags::ZERO));

    cpu.step(&mut mem);
    assert_eq!(mem.ram[0x0010], 0xFF);
    assert!(cpu.regs.get_flag(flags::NEGATIVE));
}

#[test]
fn bit_reflects_operand_bits() {
    let (mut cpu, mut mem) = setup();
    mem.load(0x8000, &[0x24, 0x10]); // BIT $10
    mem.ram[0x0010] = 0xC0;
    cpu.regs.a = 0x01;

    cpu.step(&mut mem);

    assert!(cpu.regs.get_flag(flags::ZERO));
    assert!(cpu.regs.get_flag(flags::OVERFLOW));
    assert!(cpu.regs.get_flag(flags::NEGATIVE));
}

// ========== Interrupts ==========

#[test]
fn irq_is_masked_while_i_flag_set() {
    let (mut cpu, mut mem) = setup();
    mem.ram[0x8000] = 0xEA; // NOP
    cpu.regs.set_flag(flags::IRQ_DISABLE, true);
    cpu.request_irq();

    cpu.step(&mut mem);

    // マスクされたIRQは保留のまま
    assert_eq!(cpu.regs.pc, 0x8001);
    assert!(cpu.irq_pending);
}

#[test]
fn irq_taken_after_cli() {
    let (mut cpu, mut mem) = setup();
    mem.ram[0x8000] = 0x58; // CLI
    mem.ram[0xFFFE] = 0x00;
    mem.ram[0xFFFF] = 0x40;
    cpu.request_irq();

    cpu.step(&mut mem); // CLI（IRQはまだIがセットされていたので通らない）
    let cycles = cpu.step(&mut mem); // ここでIRQ受付

    assert_eq!(cycles, 7);
    assert_eq!(cpu.regs.pc, 0x4000);
    assert!(!cpu.irq_pending);
    assert!(cpu.regs.get_flag(flags::IRQ_DISABLE));
    // 積まれたステータスはUセット・Bクリア
    assert_eq!(mem.ram[0x01FD] & flags::UNUSED, flags::UNUSED);
    assert_eq!(mem.ram[0x01FD] & flags::BREAK, 0);
}

#[test]
fn irq_ignores_mask_flag_reproduces_lax_behavior() {
    let (mut cpu, mut mem) = setup();
    mem.ram[0xFFFE] = 0x00;
    mem.ram[0xFFFF] = 0x40;
    cpu.irq_ignores_mask = true;
    cpu.regs.set_flag(flags::IRQ_DISABLE, true);
    cpu.request_irq();

    cpu.step(&mut mem);

    assert_eq!(cpu.regs.pc, 0x4000);
    assert!(!cpu.irq_pending);
}

#[test]
fn nmi_takes_priority_over_irq() {
    let (mut cpu, mut mem) = setup();
    mem.ram[0xFFFA] = 0x00;
    mem.ram[0xFFFB] = 0x50;
    mem.ram[0xFFFE] = 0x00;
    mem.ram[0xFFFF] = 0x40;
    cpu.regs.set_flag(flags::IRQ_DISABLE, false);
    cpu.request_nmi();
    cpu.request_irq();

    let cycles = cpu.step(&mut mem);

    assert_eq!(cycles, 7);
    assert_eq!(cpu.regs.pc, 0x5000);
    assert!(!cpu.nmi_pending);
    assert!(cpu.irq_pending); // IRQは次のstepまで保留
}

#[test]
fn nmi_return_address_points_at_interrupted_instruction() {
    let (mut cpu, mut mem) = setup();
    mem.ram[0xFFFA] = 0x00;
    mem.ram[0xFFFB] = 0x50;
    cpu.request_nmi();

    cpu.step(&mut mem);

    assert_eq!(mem.ram[0x01FF], 0x80);
    assert_eq!(mem.ram[0x01FE], 0x00);
}

// ========== Reset and Cycles ==========

#[test]
fn reset_loads_vector_and_initializes_sp_and_status() {
    let (mut cpu, mut mem) = setup();
    mem.ram[0xFFFC] = 0x00;
    mem.ram[0xFFFD] = 0xF0;
    cpu.regs.sp = 0x12;
    cpu.regs.status = 0xFF;

    cpu.reset(&mut mem);

    assert_eq!(cpu.regs.pc, 0xF000);
    assert_eq!(cpu.regs.sp, 0xFF);
    assert_eq!(cpu.regs.status, 0x24);
}

#[test]
fn step_returns_table_cycles() {
    let cases: &[(&[u8], u32)] = &[
        (&[0xA9, 0x01], 2), // LDA #imm
        (&[0xAD, 0x00, 0x10], 4), // LDA abs
        (&[0x20, 0x00, 0x90], 6), // JSR
        (&[0xE6, 0x10], 5), // INC zp
        (&[0xEA], 2), // NOP
    ];
    for (program, expected) in cases {
        let (mut cpu, mut mem) = setup();
        mem.load(0x8000, program);
        assert_eq!(cpu.step(&mut mem), *expected);
    }
}

#[test]
fn undocumented_opcode_is_a_nop_with_table_cycles() {
    let (mut cpu, mut mem) = setup();
    mem.ram[0x8000] = 0x1A; // 未定義
    let a = cpu.regs.a;

    let cycles = cpu.step(&mut mem);

    assert_eq!(cycles, CYCLE_TABLE[0x1A] as u32);
    assert_eq!(cpu.regs.pc, 0x8001);
    assert_eq!(cpu.regs.a, a);
}

#[test]
fn total_cycles_accumulates() {
    let (mut cpu, mut mem) = setup();
    mem.load(0x8000, &[0xA9, 0x01, 0xEA]); // LDA #$01; NOP

    cpu.step(&mut mem);
    cpu.step(&mut mem);

    assert_eq!(cpu.total_cycles, 4);
}

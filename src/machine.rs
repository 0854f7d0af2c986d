//! Apple IIマシン統合
//!
//! CPUとバスを束ねる最上位のコンテナ。ホストはMachineを1つだけ持ち、
//! ROM/ディスクのロード、リセット、命令単位の実行をここから行う

use crate::bus::Bus;
use crate::cpu::Cpu;

/// 64KB空間に収まるROMの最大サイズ
const MAX_ROM_SIZE: usize = 0x10000;

/// Apple II本体
pub struct Machine {
    pub cpu: Cpu,
    pub bus: Bus,
    /// ホストから見える実行フラグ。バッチ境界でのみ観測される
    pub running: bool,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    pub fn new() -> Self {
        Machine {
            cpu: Cpu::new(),
            bus: Bus::new(),
            running: true,
        }
    }

    /// ファームウェアROMをRAM上位（$10000-サイズ）へロードし、
    /// リセットベクターから再起動する
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<(), &'static str> {
        if rom.is_empty() {
            return Err("ROM image is empty");
        }
        if rom.len() > MAX_ROM_SIZE {
            return Err("ROM image larger than 64 KiB");
        }

        // スロットROM領域はRTSで埋めて、スロット探索がそのまま戻れるようにする
        // （$C600ページは読み取り時にバスがブートROMへ差し替える）
        for address in 0xC100..0xD000usize {
            self.bus.ram[address] = 0x60;
        }

        let base = MAX_ROM_SIZE - rom.len();
        self.bus.ram[base..].copy_from_slice(rom);
        log::info!("loaded {} byte ROM at ${:04X}", rom.len(), base);

        self.reset();
        Ok(())
    }

    /// ディスクイメージをニブル化してドライブへ挿入する
    pub fn load_disk(&mut self, drive: usize, data: &[u8], is_dos33: bool) -> Result<(), &'static str> {
        self.bus.disk.load_disk(drive, data, is_dos33)
    }

    /// リセット。PCは$FFFCのベクター、SP=$FF、P=$24。
    /// RAMとディスクバッファの内容は保持される
    pub fn reset(&mut self) {
        self.cpu.reset(&mut self.bus);
    }

    /// 1命令を実行し、消費サイクル数を返す
    pub fn step(&mut self) -> u32 {
        self.cpu.step(&mut self.bus)
    }

    /// 1フレーム分などのバッチ実行。runningフラグはバッチ開始時にのみ見る
    pub fn run_steps(&mut self, steps: u32) {
        if !self.running {
            return;
        }
        for _ in 0..steps {
            self.cpu.step(&mut self.bus);
        }
    }

    /// キー入力をキーボードラッチへ届ける
    pub fn key_down(&mut self, key: u8) {
        self.bus.keyboard.inject(key);
    }

    /// IRQラインを立てる
    pub fn request_irq(&mut self) {
        self.cpu.request_irq();
    }

    /// NMIラインを立てる
    pub fn request_nmi(&mut self) {
        self.cpu.request_nmi();
    }
}

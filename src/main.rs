//! A2EM - Apple II Emulator
//!
//! ホスト側ドライバ。コマンドライン解析、ROM/ディスクイメージのロード、
//! minifbウィンドウへの描画とキー入力の注入を行う。
//! エミュレーション本体はすべてライブラリ側（machine以下）にある
//!
//! # 使用方法
//! ```text
//! a2em appleii.rom -1 dos33.dsk
//! ```

use a2em::config::Config;
use a2em::machine::Machine;
use a2em::video::{VideoMode, HIRES_HEIGHT, HIRES_WIDTH, TEXT_HEIGHT, TEXT_WIDTH};
use clap::Parser;
use minifb::{Key, KeyRepeat, Window, WindowOptions};
use std::fs;
use std::process;

/// A2EM - Apple II Emulator
#[derive(Parser, Debug)]
#[command(name = "a2em")]
#[command(version = "0.1.0")]
#[command(about = "A2EM - Apple II Emulator", long_about = None)]
struct Args {
    /// ファームウェアROMファイル（最大64KB、末尾が$FFFFに合うよう配置される）
    rom: String,

    /// ディスクイメージファイル（ドライブ1）
    #[arg(short = '1', long)]
    disk1: Option<String>,

    /// ディスクイメージファイル（ドライブ2）
    #[arg(short = '2', long)]
    disk2: Option<String>,

    /// ヘッドレスモード（GUIなしで実行してテキスト画面を出力）
    #[arg(long)]
    headless: bool,

    /// 1フレーム（またはヘッドレス実行全体）あたりの命令数
    #[arg(long)]
    steps: Option<u32>,

    /// ウィンドウ拡大率
    #[arg(long)]
    scale: Option<usize>,
}

/// 文字グリフ（7x8ピクセル、64文字）
/// Apple II文字ROMの$00-$3F相当（大文字・数字・記号）。
/// ビット6が左端ピクセル
const FONT: [[u8; 8]; 64] = [
    [0x1C, 0x22, 0x2A, 0x2E, 0x2C, 0x20, 0x1E, 0x00], // @
    [0x08, 0x14, 0x22, 0x22, 0x3E, 0x22, 0x22, 0x00], // A
    [0x3C, 0x22, 0x22, 0x3C, 0x22, 0x22, 0x3C, 0x00], // B
    [0x1C, 0x22, 0x20, 0x20, 0x20, 0x22, 0x1C, 0x00], // C
    [0x3C, 0x22, 0x22, 0x22, 0x22, 0x22, 0x3C, 0x00], // D
    [0x3E, 0x20, 0x20, 0x3C, 0x20, 0x20, 0x3E, 0x00], // E
    [0x3E, 0x20, 0x20, 0x3C, 0x20, 0x20, 0x20, 0x00], // F
    [0x1E, 0x20, 0x20, 0x2E, 0x22, 0x22, 0x1E, 0x00], // G
    [0x22, 0x22, 0x22, 0x3E, 0x22, 0x22, 0x22, 0x00], // H
    [0x1C, 0x08, 0x08, 0x08, 0x08, 0x08, 0x1C, 0x00], // I
    [0x02, 0x02, 0x02, 0x02, 0x02, 0x22, 0x1C, 0x00], // J
    [0x22, 0x24, 0x28, 0x30, 0x28, 0x24, 0x22, 0x00], // K
    [0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x3E, 0x00], // L
    [0x22, 0x36, 0x2A, 0x2A, 0x22, 0x22, 0x22, 0x00], // M
    [0x22, 0x32, 0x2A, 0x26, 0x22, 0x22, 0x22, 0x00], // N
    [0x1C, 0x22, 0x22, 0x22, 0x22, 0x22, 0x1C, 0x00], // O
    [0x3C, 0x22, 0x22, 0x3C, 0x20, 0x20, 0x20, 0x00], // P
    [0x1C, 0x22, 0x22, 0x22, 0x2A, 0x24, 0x1A, 0x00], // Q
    [0x3C, 0x22, 0x22, 0x3C, 0x28, 0x24, 0x22, 0x00], // R
    [0x1C, 0x22, 0x20, 0x1C, 0x02, 0x22, 0x1C, 0x00], // S
    [0x3E, 0x08, 0x08, 0x08, 0x08, 0x08, 0x08, 0x00], // T
    [0x22, 0x22, 0x22, 0x22, 0x22, 0x22, 0x1C, 0x00], // U
    [0x22, 0x22, 0x22, 0x22, 0x14, 0x14, 0x08, 0x00], // V
    [0x22, 0x22, 0x22, 0x2A, 0x2A, 0x36, 0x22, 0x00], // W
    [0x22, 0x22, 0x14, 0x08, 0x14, 0x22, 0x22, 0x00], // X
    [0x22, 0x22, 0x14, 0x08, 0x08, 0x08, 0x08, 0x00], // Y
    [0x3E, 0x02, 0x04, 0x08, 0x10, 0x20, 0x3E, 0x00], // Z
    [0x1E, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1E, 0x00], // [
    [0x00, 0x20, 0x10, 0x08, 0x04, 0x02, 0x00, 0x00], // \
    [0x1E, 0x02, 0x02, 0x02, 0x02, 0x02, 0x1E, 0x00], // ]
    [0x08, 0x14, 0x22, 0x00, 0x00, 0x00, 0x00, 0x00], // ^
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x3F, 0x00], // _
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // space
    [0x08, 0x08, 0x08, 0x08, 0x08, 0x00, 0x08, 0x00], // !
    [0x14, 0x14, 0x14, 0x00, 0x00, 0x00, 0x00, 0x00], // "
    [0x14, 0x14, 0x3E, 0x14, 0x3E, 0x14, 0x14, 0x00], // #
    [0x08, 0x1E, 0x28, 0x1C, 0x0A, 0x3C, 0x08, 0x00], // $
    [0x30, 0x32, 0x04, 0x08, 0x10, 0x26, 0x06, 0x00], // %
    [0x10, 0x28, 0x28, 0x10, 0x2A, 0x24, 0x1A, 0x00], // &
    [0x08, 0x08, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00], // '
    [0x04, 0x08, 0x10, 0x10, 0x10, 0x08, 0x04, 0x00], // (
    [0x10, 0x08, 0x04, 0x04, 0x04, 0x08, 0x10, 0x00], // )
    [0x00, 0x08, 0x2A, 0x1C, 0x2A, 0x08, 0x00, 0x00], // *
    [0x00, 0x08, 0x08, 0x3E, 0x08, 0x08, 0x00, 0x00], // +
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x08, 0x08, 0x10], // ,
    [0x00, 0x00, 0x00, 0x3E, 0x00, 0x00, 0x00, 0x00], // -
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x08, 0x00], // .
    [0x00, 0x02, 0x04, 0x08, 0x10, 0x20, 0x00, 0x00], // /
    [0x1C, 0x22, 0x26, 0x2A, 0x32, 0x22, 0x1C, 0x00], // 0
    [0x08, 0x18, 0x08, 0x08, 0x08, 0x08, 0x1C, 0x00], // 1
    [0x1C, 0x22, 0x02, 0x0C, 0x10, 0x20, 0x3E, 0x00], // 2
    [0x1C, 0x22, 0x02, 0x0C, 0x02, 0x22, 0x1C, 0x00], // 3
    [0x04, 0x0C, 0x14, 0x24, 0x3E, 0x04, 0x04, 0x00], // 4
    [0x3E, 0x20, 0x3C, 0x02, 0x02, 0x22, 0x1C, 0x00], // 5
    [0x0E, 0x10, 0x20, 0x3C, 0x22, 0x22, 0x1C, 0x00], // 6
    [0x3E, 0x02, 0x04, 0x08, 0x10, 0x10, 0x10, 0x00], // 7
    [0x1C, 0x22, 0x22, 0x1C, 0x22, 0x22, 0x1C, 0x00], // 8
    [0x1C, 0x22, 0x22, 0x1E, 0x02, 0x04, 0x38, 0x00], // 9
    [0x00, 0x00, 0x08, 0x00, 0x00, 0x08, 0x00, 0x00], // :
    [0x00, 0x00, 0x08, 0x00, 0x00, 0x08, 0x08, 0x10], // ;
    [0x04, 0x08, 0x10, 0x20, 0x10, 0x08, 0x04, 0x00], // <
    [0x00, 0x00, 0x3E, 0x00, 0x3E, 0x00, 0x00, 0x00], // =
    [0x10, 0x08, 0x04, 0x02, 0x04, 0x08, 0x10, 0x00], // >
    [0x1C, 0x22, 0x02, 0x04, 0x08, 0x00, 0x08, 0x00], // ?
];

/// Lo-Res用16色パレット（NTSC artifact colors）
const COLORS: [u32; 16] = [
    0x000000, // 0: Black
    0xDD0033, // 1: Magenta
    0x604EBD, // 2: Dark Blue
    0xFF44FD, // 3: Purple
    0x00A360, // 4: Dark Green
    0x9C9C9C, // 5: Gray 1
    0x14CFFD, // 6: Medium Blue
    0xD0C3FF, // 7: Light Blue
    0x607203, // 8: Brown
    0xFF6A3C, // 9: Orange
    0x9C9C9C, // 10: Gray 2
    0xFFA0D0, // 11: Pink
    0x14F53C, // 12: Light Green
    0xD0DD8D, // 13: Yellow
    0x72FFD0, // 14: Aqua
    0xFFFFFF, // 15: White
];

/// モノクロ表示の前景色（緑）
const SCREEN_GREEN: u32 = 0x33FF33;

/// 7ビット文字からグリフ番号へ。小文字は大文字に畳む
fn glyph_index(ch: u8) -> usize {
    match ch {
        0x20..=0x3F => ch as usize,
        0x40..=0x5F => (ch - 0x40) as usize,
        0x60..=0x7F => (ch - 0x60) as usize,
        _ => 0x20,
    }
}

/// テキストモードの描画（40x24、7x8ピクセル/文字）
fn render_text(machine: &Machine, fb: &mut [u32]) {
    for row in 0..TEXT_HEIGHT {
        for col in 0..TEXT_WIDTH {
            let ch = machine.bus.video.read_text_cell(row, col);
            let glyph = &FONT[glyph_index(ch)];
            for (y, &bits) in glyph.iter().enumerate() {
                for x in 0..7 {
                    let on = bits & (0x40 >> x) != 0;
                    let color = if on { SCREEN_GREEN } else { 0x000000 };
                    fb[(row * 8 + y) * HIRES_WIDTH + col * 7 + x] = color;
                }
            }
        }
    }
}

/// Lo-Resモードの描画。各セルの下位ニブルが上ブロック、上位が下ブロック
fn render_lores(machine: &Machine, fb: &mut [u32]) {
    for row in 0..TEXT_HEIGHT {
        for col in 0..TEXT_WIDTH {
            let cell = machine.bus.video.read_text_cell(row, col);
            let top = COLORS[(cell & 0x0F) as usize];
            let bottom = COLORS[(cell >> 4) as usize];
            for y in 0..4 {
                for x in 0..7 {
                    fb[(row * 8 + y) * HIRES_WIDTH + col * 7 + x] = top;
                    fb[(row * 8 + y + 4) * HIRES_WIDTH + col * 7 + x] = bottom;
                }
            }
        }
    }
}

/// Hi-Resモードの描画（280x192モノクロ、各バイトの下位7ビットが左から）
fn render_hires(machine: &Machine, fb: &mut [u32]) {
    fb.fill(0);
    let page = machine.bus.video.read_hires_page();
    for (offset, &byte) in page.iter().enumerate() {
        if let Some((row, col)) = a2em::video::Video::hires_position(offset) {
            for bit in 0..7 {
                let color = if byte & (1 << bit) != 0 {
                    SCREEN_GREEN
                } else {
                    0x000000
                };
                fb[row * HIRES_WIDTH + col * 7 + bit] = color;
            }
        }
    }
}

fn render(machine: &Machine, fb: &mut [u32]) {
    match machine.bus.video.mode() {
        VideoMode::Text => render_text(machine, fb),
        VideoMode::Lores => render_lores(machine, fb),
        VideoMode::Hires => render_hires(machine, fb),
    }
}

/// minifbのキーをApple IIのキーコード（ASCII）へ変換
fn map_key(key: Key, shift: bool) -> Option<u8> {
    let ch = match key {
        Key::A => b'A',
        Key::B => b'B',
        Key::C => b'C',
        Key::D => b'D',
        Key::E => b'E',
        Key::F => b'F',
        Key::G => b'G',
        Key::H => b'H',
        Key::I => b'I',
        Key::J => b'J',
        Key::K => b'K',
        Key::L => b'L',
        Key::M => b'M',
        Key::N => b'N',
        Key::O => b'O',
        Key::P => b'P',
        Key::Q => b'Q',
        Key::R => b'R',
        Key::S => b'S',
        Key::T => b'T',
        Key::U => b'U',
        Key::V => b'V',
        Key::W => b'W',
        Key::X => b'X',
        Key::Y => b'Y',
        Key::Z => b'Z',
        Key::Key0 => if shift { b')' } else { b'0' },
        Key::Key1 => if shift { b'!' } else { b'1' },
        Key::Key2 => if shift { b'@' } else { b'2' },
        Key::Key3 => if shift { b'#' } else { b'3' },
        Key::Key4 => if shift { b'$' } else { b'4' },
        Key::Key5 => if shift { b'%' } else { b'5' },
        Key::Key6 => if shift { b'^' } else { b'6' },
        Key::Key7 => if shift { b'&' } else { b'7' },
        Key::Key8 => if shift { b'*' } else { b'8' },
        Key::Key9 => if shift { b'(' } else { b'9' },
        Key::Space => b' ',
        Key::Enter => 0x0D,
        Key::Escape => 0x1B,
        // 左矢印/バックスペースはApple IIではどちらも$08
        Key::Backspace | Key::Left => 0x08,
        Key::Right => 0x15,
        Key::Minus => if shift { b'_' } else { b'-' },
        Key::Equal => if shift { b'+' } else { b'=' },
        Key::Semicolon => if shift { b':' } else { b';' },
        Key::Apostrophe => if shift { b'"' } else { b'\'' },
        Key::Comma => if shift { b'<' } else { b',' },
        Key::Period => if shift { b'>' } else { b'.' },
        Key::Slash => if shift { b'?' } else { b'/' },
        Key::Backslash => b'\\',
        Key::LeftBracket => b'[',
        Key::RightBracket => b']',
        _ => return None,
    };
    Some(ch)
}

/// テキスト画面を標準出力へ書き出す（ヘッドレスモード用）
fn dump_text_screen(machine: &Machine) {
    for row in 0..TEXT_HEIGHT {
        let line: String = (0..TEXT_WIDTH)
            .map(|col| {
                let ch = machine.bus.video.read_text_cell(row, col);
                if (0x20..0x7F).contains(&ch) {
                    ch as char
                } else {
                    ' '
                }
            })
            .collect();
        println!("{}", line);
    }
}

/// 拡張子からDOS 3.3順かどうかを判定（.dskのみDOS 3.3、他はProDOS）
fn is_dos33_image(path: &str) -> bool {
    path.to_lowercase().ends_with(".dsk")
}

fn load_file(path: &str) -> Vec<u8> {
    match fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Error: cannot open {}: {}", path, e);
            process::exit(1);
        }
    }
}

fn main() {
    env_logger::init();

    let args = Args::try_parse().unwrap_or_else(|e| {
        let _ = e.print();
        process::exit(1);
    });

    let mut config = Config::load();
    let scale = args.scale.unwrap_or(config.scale).max(1);
    let steps_per_frame = args.steps.unwrap_or(config.steps_per_frame).max(1);

    let mut machine = Machine::new();

    let rom = load_file(&args.rom);
    if let Err(e) = machine.load_rom(&rom) {
        eprintln!("Error: {}: {}", args.rom, e);
        process::exit(1);
    }

    for (drive, path) in [&args.disk1, &args.disk2].iter().enumerate() {
        if let Some(path) = path {
            let data = load_file(path);
            if let Err(e) = machine.load_disk(drive, &data, is_dos33_image(path)) {
                eprintln!("Error: {}: {}", path, e);
                process::exit(1);
            }
        }
    }

    config.last_rom = Some(args.rom.clone());
    config.last_disk1 = args.disk1.clone();
    config.last_disk2 = args.disk2.clone();
    config.scale = scale;
    config.steps_per_frame = steps_per_frame;
    if let Err(e) = config.save() {
        log::warn!("{}", e);
    }

    if args.headless {
        machine.run_steps(steps_per_frame);
        dump_text_screen(&machine);
        return;
    }

    let mut window = Window::new(
        "A2EM - Apple II Emulator",
        HIRES_WIDTH * scale,
        HIRES_HEIGHT * scale,
        WindowOptions::default(),
    )
    .unwrap_or_else(|e| {
        eprintln!("Error: cannot open window: {}", e);
        process::exit(1);
    });
    window.set_target_fps(60);

    let mut framebuffer = vec![0u32; HIRES_WIDTH * HIRES_HEIGHT];
    let mut last_pc = 0u16;
    let mut stuck_frames = 0u32;

    while window.is_open() && machine.running {
        machine.run_steps(steps_per_frame);

        // スタックPCの検出は助言のみで、実行は止めない
        if machine.cpu.regs.pc == last_pc {
            stuck_frames += 1;
            if stuck_frames == 60 {
                log::warn!(
                    "CPU appears stuck at ${:04X} (A=${:02X} X=${:02X} Y=${:02X} SP=${:02X})",
                    machine.cpu.regs.pc,
                    machine.cpu.regs.a,
                    machine.cpu.regs.x,
                    machine.cpu.regs.y,
                    machine.cpu.regs.sp
                );
                stuck_frames = 0;
            }
        } else {
            stuck_frames = 0;
        }
        last_pc = machine.cpu.regs.pc;

        let shift = window.is_key_down(Key::LeftShift) || window.is_key_down(Key::RightShift);
        let ctrl = window.is_key_down(Key::LeftCtrl) || window.is_key_down(Key::RightCtrl);
        for key in window.get_keys_pressed(KeyRepeat::Yes) {
            if ctrl && key == Key::C {
                machine.request_irq();
            } else if let Some(ch) = map_key(key, shift) {
                machine.key_down(ch);
            }
        }

        render(&machine, &mut framebuffer);
        if let Err(e) = window.update_with_buffer(&framebuffer, HIRES_WIDTH, HIRES_HEIGHT) {
            log::warn!("window update failed: {}", e);
            break;
        }
    }
}

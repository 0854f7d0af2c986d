//! Apple II Disk II コントローラエミュレーション
//!
//! Disk II hardware emulation based on "Beneath Apple DOS" documentation
//! フェーズステッパーによるヘッド移動、モーター/ドライブ選択、
//! GCR 6-and-2エンコードによるDSKイメージのニブル化、
//! $C600のPR#6ブートROMを実装する

/// ディスクの定数
pub const NUM_DRIVES: usize = 2;
pub const TRACKS: usize = 35;
pub const SECTORS_PER_TRACK: usize = 16;
pub const BYTES_PER_SECTOR: usize = 256;
pub const BYTES_PER_TRACK: usize = SECTORS_PER_TRACK * BYTES_PER_SECTOR; // 4096
pub const DSK_SIZE: usize = TRACKS * BYTES_PER_TRACK; // 143360 bytes

/// 1トラックあたりの生ニブル数（NIB粒度）
pub const NIB_TRACK_SIZE: usize = 6656;

/// アドレスフィールドに書き込むボリューム番号
const VOLUME_NUMBER: u8 = 254;

/// 6-and-2エンコーディングテーブル
const GCR_ENCODE_TABLE: [u8; 64] = [
    0x96, 0x97, 0x9A, 0x9B, 0x9D, 0x9E, 0x9F, 0xA6,
    0xA7, 0xAB, 0xAC, 0xAD, 0xAE, 0xAF, 0xB2, 0xB3,
    0xB4, 0xB5, 0xB6, 0xB7, 0xB9, 0xBA, 0xBB, 0xBC,
    0xBD, 0xBE, 0xBF, 0xCB, 0xCD, 0xCE, 0xCF, 0xD3,
    0xD6, 0xD7, 0xD9, 0xDA, 0xDB, 0xDC, 0xDD, 0xDE,
    0xDF, 0xE5, 0xE6, 0xE7, 0xE9, 0xEA, 0xEB, 0xEC,
    0xED, 0xEE, 0xEF, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6,
    0xF7, 0xF9, 0xFA, 0xFB, 0xFC, 0xFD, 0xFE, 0xFF,
];

/// DOS 3.3の物理→論理セクター順
pub const DOS33_SECTOR_ORDER: [usize; 16] = [
    0x0, 0x7, 0xE, 0x6, 0xD, 0x5, 0xC, 0x4,
    0xB, 0x3, 0xA, 0x2, 0x9, 0x1, 0x8, 0xF,
];

/// ProDOSの物理→論理セクター順
pub const PRODOS_SECTOR_ORDER: [usize; 16] = [
    0x0, 0x8, 0x1, 0x9, 0x2, 0xA, 0x3, 0xB,
    0x4, 0xC, 0x5, 0xD, 0x6, 0xE, 0x7, 0xF,
];

/// 下位2ビットの入れ替えテーブル（D1,D0 → D0,D1）
const BIT_SWAP: [u8; 4] = [0, 2, 1, 3];

/// PR#6 ブートROM（$C600-$C6FF）
/// スロット6のP5A PROMイメージ。トラック0/セクタ0を$0800へ読み込んで
/// $0801へジャンプする
const BOOT_ROM: [u8; 256] = [
    0xA2, 0x20, 0xA0, 0x00, 0xA2, 0x03, 0x86, 0x3C, 0x8A, 0x0A, 0x24, 0x3C, 0xF0, 0x10, 0x05, 0x3C,
    0x49, 0xFF, 0x29, 0x7E, 0xB0, 0x08, 0x4A, 0xD0, 0xFB, 0x98, 0x9D, 0x56, 0x03, 0xC8, 0xE8, 0x10,
    0xE5, 0x20, 0x58, 0xFF, 0xBA, 0xBD, 0x00, 0x01, 0x0A, 0x0A, 0x0A, 0x0A, 0x85, 0x2B, 0xAA, 0xBD,
    0x8E, 0xC0, 0xBD, 0x8C, 0xC0, 0xBD, 0x8A, 0xC0, 0xBD, 0x89, 0xC0, 0xA0, 0x50, 0xBD, 0x80, 0xC0,
    0x98, 0x29, 0x03, 0x0A, 0x05, 0x2B, 0xAA, 0xBD, 0x81, 0xC0, 0xA9, 0x56, 0xA9, 0x00, 0xEA, 0x88,
    0x10, 0xEB, 0x85, 0x26, 0x85, 0x3D, 0x85, 0x41, 0xA9, 0x08, 0x85, 0x27, 0x18, 0x08, 0xBD, 0x8C,
    0xC0, 0x10, 0xFB, 0x49, 0xD5, 0xD0, 0xF7, 0xBD, 0x8C, 0xC0, 0x10, 0xFB, 0xC9, 0xAA, 0xD0, 0xF3,
    0xEA, 0xBD, 0x8C, 0xC0, 0x10, 0xFB, 0xC9, 0x96, 0xF0, 0x09, 0x28, 0x90, 0xDF, 0x49, 0xAD, 0xF0,
    0x25, 0xD0, 0xD9, 0xA0, 0x03, 0x85, 0x40, 0xBD, 0x8C, 0xC0, 0x10, 0xFB, 0x2A, 0x85, 0x3C, 0xBD,
    0x8C, 0xC0, 0x10, 0xFB, 0x25, 0x3C, 0x88, 0xD0, 0xEC, 0x28, 0xC5, 0x3D, 0xD0, 0xBE, 0xA5, 0x40,
    0xC5, 0x41, 0xD0, 0xB8, 0xB0, 0xB7, 0xA0, 0x56, 0x84, 0x3C, 0xBC, 0x8C, 0xC0, 0x10, 0xFB, 0x59,
    0xD6, 0x02, 0xA4, 0x3C, 0x88, 0x99, 0x00, 0x03, 0xD0, 0xEE, 0x84, 0x3C, 0xBC, 0x8C, 0xC0, 0x10,
    0xFB, 0x59, 0xD6, 0x02, 0xA4, 0x3C, 0x91, 0x26, 0xC8, 0xD0, 0xEF, 0xBC, 0x8C, 0xC0, 0x10, 0xFB,
    0x59, 0xD6, 0x02, 0xD0, 0x87, 0xA0, 0x00, 0xA2, 0x56, 0xCA, 0x30, 0xFB, 0xB1, 0x26, 0x5E, 0x00,
    0x03, 0x2A, 0x5E, 0x00, 0x03, 0x2A, 0x91, 0x26, 0xC8, 0xD0, 0xEE, 0xE6, 0x27, 0xE6, 0x3D, 0xA5,
    0x3D, 0xCD, 0x00, 0x08, 0xA6, 0x2B, 0x90, 0xDB, 0x4C, 0x01, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// フロッピードライブ1台の状態
#[derive(Debug, Clone)]
pub struct FloppyDrive {
    /// ニブルイメージ（tracks * NIB_TRACK_SIZE）
    pub data: Vec<u8>,
    /// トラック数
    pub tracks: usize,
    /// ディスクが挿入されているか
    pub loaded: bool,
    /// 書き込みプロテクト
    pub write_protected: bool,
}

impl Default for FloppyDrive {
    fn default() -> Self {
        Self::new()
    }
}

impl FloppyDrive {
    pub fn new() -> Self {
        FloppyDrive {
            data: Vec::new(),
            tracks: 0,
            loaded: false,
            write_protected: true,
        }
    }
}

/// Disk IIインターフェースカード（スロット6）
#[derive(Debug, Clone)]
pub struct Disk2Controller {
    /// ドライブ0と1
    pub drives: [FloppyDrive; NUM_DRIVES],
    /// 選択されているドライブ
    pub curr_drive: usize,
    /// フェーズマグネット状態（4ビット）
    pub phases: u8,
    /// モーターオン
    pub motor_on: bool,
    /// 物理ヘッド位置（ハーフトラック単位、0..2*tracks-1）
    pub curr_phys_track: i32,
    /// トラック内のニブル位置
    pub curr_nibble: usize,
    /// データラッチ
    pub latch: u8,
    /// 書き込みモード
    pub write_mode: bool,
    /// ロードモード
    pub load_mode: bool,
    /// モーター停止中にRWTSのスピンチェックを完走させるためのカウンタ
    drive_spin: u8,
}

impl Default for Disk2Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Disk2Controller {
    pub fn new() -> Self {
        Disk2Controller {
            drives: [FloppyDrive::new(), FloppyDrive::new()],
            curr_drive: 0,
            phases: 0,
            motor_on: false,
            curr_phys_track: 0,
            curr_nibble: 0,
            latch: 0,
            write_mode: false,
            load_mode: false,
            drive_spin: 0,
        }
    }

    /// ディスクイメージをロードしてニブル化する
    /// is_dos33で物理→論理セクター順を選ぶ（.dskはDOS 3.3、それ以外はProDOS）
    pub fn load_disk(&mut self, drive: usize, data: &[u8], is_dos33: bool) -> Result<(), &'static str> {
        if drive >= NUM_DRIVES {
            return Err("invalid drive number");
        }
        if data.is_empty() || data.len() % BYTES_PER_TRACK != 0 {
            return Err("disk image is not a multiple of 4096 bytes");
        }
        if data.len() > DSK_SIZE {
            return Err("disk image has more than 35 tracks");
        }

        let tracks = data.len() / BYTES_PER_TRACK;
        let sector_order = if is_dos33 {
            &DOS33_SECTOR_ORDER
        } else {
            &PRODOS_SECTOR_ORDER
        };

        let mut nibbles = vec![0u8; tracks * NIB_TRACK_SIZE];
        for track in 0..tracks {
            nibblize_track(
                &data[track * BYTES_PER_TRACK..(track + 1) * BYTES_PER_TRACK],
                &mut nibbles[track * NIB_TRACK_SIZE..(track + 1) * NIB_TRACK_SIZE],
                VOLUME_NUMBER,
                track as u8,
                sector_order,
            );
        }

        let floppy = &mut self.drives[drive];
        floppy.data = nibbles;
        floppy.tracks = tracks;
        floppy.loaded = true;
        floppy.write_protected = true;
        self.curr_nibble = 0;

        log::info!("loaded disk drive {}: {} tracks", drive, tracks);
        Ok(())
    }

    /// ブートROMの読み取り（$C600-$C6FF、読み取り専用）
    pub fn read_rom(&self, offset: u8) -> u8 {
        BOOT_ROM[offset as usize]
    }

    /// I/O読み取り（$C0E0-$C0EF）
    /// 偶数アドレスはラッチを返し、奇数アドレスは同期前の
    /// ビットストリームを模したノイズを返す
    pub fn io_read(&mut self, reg: u8) -> u8 {
        self.access(reg & 0x0F, None);
        if reg & 1 == 0 {
            self.latch
        } else {
            rand::random::<u8>()
        }
    }

    /// I/O書き込み（$C0E0-$C0EF）
    pub fn io_write(&mut self, reg: u8, value: u8) {
        self.access(reg & 0x0F, Some(value));
    }

    /// レジスタアクセスの副作用。読み書きでほぼ対称で、
    /// 書き込みはロード書き込みモードのときだけラッチに値が入る
    fn access(&mut self, reg: u8, written: Option<u8>) {
        match reg {
            // フェーズマグネット制御
            0x0..=0x7 => self.control_stepper(reg),
            0x8 => self.motor_on = false,
            0x9 => self.motor_on = true,
            0xA => self.curr_drive = 0,
            0xB => self.curr_drive = 1,
            // ラッチ/シフト操作
            0xC => self.shift_latch(),
            0xD => {
                self.load_mode = true;
                // 読み取りモードで書き込みプロテクトならビット7を立てる
                if written.is_none()
                    && self.motor_on
                    && !self.write_mode
                    && self.drives[self.curr_drive].write_protected
                {
                    self.latch |= 0x80;
                }
            }
            0xE => self.write_mode = false,
            0xF => self.write_mode = true,
            _ => {}
        }

        if let Some(value) = written {
            if self.motor_on && self.write_mode && self.load_mode {
                self.latch = value;
            }
        }
    }

    /// フェーズマグネット更新とヘッドステップ（$C0E0-$C0E7）
    fn control_stepper(&mut self, reg: u8) {
        let phase = (reg >> 1) & 3;
        let phase_bit = 1u8 << phase;
        if reg & 1 != 0 {
            self.phases |= phase_bit;
        } else {
            self.phases &= !phase_bit;
        }

        // 現在位置の隣のフェーズが引く方向を合成する
        let mut direction: i32 = 0;
        if self.phases & (1 << ((self.curr_phys_track + 1) & 3)) != 0 {
            direction += 1;
        }
        if self.phases & (1 << ((self.curr_phys_track + 3) & 3)) != 0 {
            direction -= 1;
        }

        if direction != 0 {
            let max = 2 * self.drive_tracks() as i32 - 1;
            let moved = (self.curr_phys_track + direction).clamp(0, max);
            if moved != self.curr_phys_track {
                self.curr_phys_track = moved;
                self.curr_nibble = 0;
            }
        }
    }

    /// ラッチ/シフト操作（$C0xC）
    fn shift_latch(&mut self) {
        self.load_mode = false;
        let drive = self.curr_drive;

        if !self.write_mode {
            if !self.motor_on {
                // モーター停止中でもRWTSのスピンチェック（$BD34付近）が
                // 完走できるよう、16アクセスごとに$7Fを見せる
                self.drive_spin = (self.drive_spin + 1) & 0x0F;
                if self.drive_spin == 0 {
                    self.latch = 0x7F;
                }
            } else if self.drives[drive].loaded {
                let track = (self.curr_phys_track >> 1) as usize;
                if track >= self.drives[drive].tracks {
                    self.latch = 0x7F;
                } else {
                    let base = track * NIB_TRACK_SIZE;
                    self.latch = self.drives[drive].data[base + self.curr_nibble];
                    if self.latch == 0x7F {
                        // $7Fパディングを読み飛ばして有効ニブルを探す
                        let mut remaining = NIB_TRACK_SIZE / 16;
                        while self.latch == 0x7F && remaining > 0 {
                            self.curr_nibble = (self.curr_nibble + 1) % NIB_TRACK_SIZE;
                            self.latch = self.drives[drive].data[base + self.curr_nibble];
                            remaining -= 1;
                        }
                    }
                }
            } else {
                self.latch = 0x7F;
            }
        } else {
            // 書き込みモード。プロテクト中・ディスクなし・トラック外は何もしない
            let track = (self.curr_phys_track >> 1) as usize;
            let floppy = &mut self.drives[drive];
            if floppy.loaded && !floppy.write_protected && track < floppy.tracks {
                floppy.data[track * NIB_TRACK_SIZE + self.curr_nibble] = self.latch;
            }
        }

        self.curr_nibble = (self.curr_nibble + 1) % NIB_TRACK_SIZE;
    }

    /// 現在のヘッドが指すトラック番号
    pub fn current_track(&self) -> usize {
        (self.curr_phys_track >> 1) as usize
    }

    /// 選択中ドライブのトラック数。未ロード時は標準の35として扱う
    fn drive_tracks(&self) -> usize {
        let tracks = self.drives[self.curr_drive].tracks;
        if tracks == 0 {
            TRACKS
        } else {
            tracks
        }
    }
}

/// 4096バイトのセクターデータを6656バイトのニブルストリームへ変換する
/// セクターごとに 12同期 + アドレスフィールド + 8同期 + データフィールド
/// を並べ、残りは$7Fで埋める
fn nibblize_track(track: &[u8], out: &mut [u8], volume: u8, track_num: u8, sector_order: &[usize; 16]) {
    let mut six = [0u8; BYTES_PER_SECTOR];
    let mut two = [0u8; 86];
    let mut pos = 0usize;

    for sector in 0..SECTORS_PER_TRACK {
        encode_6and2(track, sector_order[sector] * BYTES_PER_SECTOR, &mut six, &mut two);

        write_sync(out, &mut pos, 12);

        // アドレスフィールド
        write_nibble(out, &mut pos, 0xD5);
        write_nibble(out, &mut pos, 0xAA);
        write_nibble(out, &mut pos, 0x96);
        encode_4and4(out, &mut pos, volume);
        encode_4and4(out, &mut pos, track_num);
        encode_4and4(out, &mut pos, sector as u8);
        encode_4and4(out, &mut pos, volume ^ track_num ^ sector as u8);
        write_nibble(out, &mut pos, 0xDE);
        write_nibble(out, &mut pos, 0xAA);
        write_nibble(out, &mut pos, 0xEB);

        write_sync(out, &mut pos, 8);

        // データフィールド。86+256バイトを直前値とのXORでGCRテーブルに通し、
        // 最後にチェックサムを足す
        write_nibble(out, &mut pos, 0xD5);
        write_nibble(out, &mut pos, 0xAA);
        write_nibble(out, &mut pos, 0xAD);
        let mut last = 0u8;
        for i in (0..two.len()).rev() {
            write_nibble(out, &mut pos, GCR_ENCODE_TABLE[(last ^ two[i]) as usize]);
            last = two[i];
        }
        for &value in six.iter() {
            write_nibble(out, &mut pos, GCR_ENCODE_TABLE[(last ^ value) as usize]);
            last = value;
        }
        write_nibble(out, &mut pos, GCR_ENCODE_TABLE[last as usize]);
        write_nibble(out, &mut pos, 0xDE);
        write_nibble(out, &mut pos, 0xAA);
        write_nibble(out, &mut pos, 0xEB);
    }

    // 残りは$7F。ラッチ側が読み飛ばす
    while pos < out.len() {
        out[pos] = 0x7F;
        pos += 1;
    }
}

fn write_nibble(out: &mut [u8], pos: &mut usize, value: u8) {
    if *pos < out.len() {
        out[*pos] = value;
        *pos += 1;
    }
}

fn write_sync(out: &mut [u8], pos: &mut usize, count: usize) {
    for _ in 0..count {
        write_nibble(out, pos, 0xFF);
    }
}

/// 4-and-4エンコード
/// 奇数ビットを$AAと合成したバイト、偶数ビットを$AAと合成したバイトの順
fn encode_4and4(out: &mut [u8], pos: &mut usize, value: u8) {
    write_nibble(out, pos, (value >> 1) | 0xAA);
    write_nibble(out, pos, value | 0xAA);
}

/// 6-and-2プレニブル化
/// 各バイトの上位6ビットをsixへ、下位2ビット（BIT_SWAPで入れ替え済み）を
/// 86バイトのtwoへ3バイト分ずつ詰め込む
fn encode_6and2(track: &[u8], offset: usize, six: &mut [u8; BYTES_PER_SECTOR], two: &mut [u8; 86]) {
    two[0] = BIT_SWAP[(track[offset + 1] & 0x03) as usize];
    two[1] = BIT_SWAP[(track[offset] & 0x03) as usize];

    let mut j = 2usize;
    for i in (0..BYTES_PER_SECTOR).rev() {
        two[j] = (two[j] << 2) | BIT_SWAP[(track[offset + i] & 0x03) as usize];
        six[i] = track[offset + i] >> 2;
        j = if j == 85 { 0 } else { j + 1 };
    }

    for value in two.iter_mut() {
        *value &= 0x3F;
    }
}

//! ビデオサブシステムのテスト
//!
//! Tests cover:
//! - テキスト行の3ウェイインターリーブ
//! - スクリーンホールの扱い
//! - Hi-Resのアドレスデコード
//! - ソフトスイッチのモード遷移とページ選択

use a2em::video::{Video, VideoMode, TEXT_ROW_BASE};

// ========== Text Interleave ==========

#[test]
fn row_base_table_matches_band_layout() {
    // 24行は$0400/$0428/$0450起点の3バンドへ$80ストライドで並ぶ
    for row in 0..24 {
        let expected = 0x0400 + (row / 8) as u16 * 0x28 + (row % 8) as u16 * 0x80;
        assert_eq!(TEXT_ROW_BASE[row], expected, "row {}", row);
    }
}

#[test]
fn row1_lives_at_0480_not_0428() {
    let mut video = Video::new();
    video.write(0x0480, 0xC2);
    assert_eq!(video.read_text_cell(1, 0), 0x42);
    // $0428は行8の先頭
    video.write(0x0428, 0xC8);
    assert_eq!(video.read_text_cell(8, 0), 0x48);
}

#[test]
fn every_row_window_maps_to_its_row() {
    let mut video = Video::new();
    for row in 0..24 {
        let base = TEXT_ROW_BASE[row];
        video.write(base, 0xB0 + row as u8);
        video.write(base + 39, 0xB0 + row as u8);
        assert_eq!(video.read_text_cell(row, 0), 0x30 + row as u8);
        assert_eq!(video.read_text_cell(row, 39), 0x30 + row as u8);
    }
}

#[test]
fn writes_mask_bit7_and_reads_return_stored_char() {
    let mut video = Video::new();
    video.write(0x0400, 0xC1);
    assert_eq!(video.read(0x0400), 0x41);
}

#[test]
fn screen_holes_are_ignored() {
    let mut video = Video::new();
    // $07F8は行23のウィンドウ（$07D0+$28=$07F8）の直後で、どの行にも属さない
    video.write(0x07F8, 0xFF);
    assert_eq!(video.read(0x07F8), 0);
}

// ========== Hi-Res ==========

#[test]
fn hires_position_decodes_sections() {
    assert_eq!(Video::hires_position(0x0000), Some((0, 0)));
    assert_eq!(Video::hires_position(0x0080), Some((1, 0)));
    assert_eq!(Video::hires_position(0x0400), Some((64, 0)));
    assert_eq!(Video::hires_position(0x0C00), Some((8, 0)));
    assert_eq!(Video::hires_position(0x1000), Some((72, 0)));
    assert_eq!(Video::hires_position(0x1800), Some((16, 0)));
    assert_eq!(Video::hires_position(0x0027), Some((0, 39)));
}

#[test]
fn hires_position_rejects_off_screen_bytes() {
    // 桁40以上は表示されない
    assert_eq!(Video::hires_position(0x0028), None);
    assert_eq!(Video::hires_position(0x007F), None);
}

#[test]
fn hires_pages_are_independent() {
    let mut video = Video::new();
    video.write(0x2000, 0x55);
    video.write(0x4000, 0xAA);

    assert_eq!(video.read(0x2000), 0x55);
    assert_eq!(video.read(0x4000), 0xAA);
    assert_eq!(video.read_hires_page()[0], 0x55);

    video.soft_switch(0xC055);
    assert!(video.page2_selected());
    assert_eq!(video.read_hires_page()[0], 0xAA);

    video.soft_switch(0xC054);
    assert!(!video.page2_selected());
    assert_eq!(video.read_hires_page()[0], 0x55);
}

// ========== Soft Switches ==========

#[test]
fn soft_switches_select_modes() {
    let mut video = Video::new();
    assert_eq!(video.mode(), VideoMode::Text);

    video.soft_switch(0xC050);
    assert_eq!(video.mode(), VideoMode::Lores);

    video.soft_switch(0xC057);
    assert_eq!(video.mode(), VideoMode::Hires);

    video.soft_switch(0xC056);
    assert_eq!(video.mode(), VideoMode::Lores);

    video.soft_switch(0xC053); // MIXEDはHi-Res扱い
    assert_eq!(video.mode(), VideoMode::Hires);

    video.soft_switch(0xC051);
    assert_eq!(video.mode(), VideoMode::Text);
}

#[test]
fn full_screen_switch_is_a_no_op() {
    let mut video = Video::new();
    video.soft_switch(0xC057);
    video.soft_switch(0xC052);
    assert_eq!(video.mode(), VideoMode::Hires);
}

// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Conformance tests for the emulator, driven through the public
//! `consume()` byte interface exactly the way PTY output arrives.

use pretty_assertions::assert_eq;

use super::cell::{Attrs, CellColor};
use super::emulator::TerminalEmulator;

fn term(width: usize, height: usize) -> TerminalEmulator {
    TerminalEmulator::new(width, height)
}

fn row(t: &TerminalEmulator, y: usize) -> String { t.buffer().row_text(y) }

fn cursor(t: &TerminalEmulator) -> (usize, usize) {
    (t.buffer().cursor.x, t.buffer().cursor.y)
}

// ---------------------------------------------------------------------
// Plain text and C0.
// ---------------------------------------------------------------------

#[test]
fn hello_lands_on_row_zero() {
    let mut t = term(80, 25);
    t.consume(b"Hello");
    assert_eq!(&row(&t, 0)[..6], "Hello ");
    assert_eq!(cursor(&t), (5, 0));
}

#[test]
fn printable_round_trip_with_backspace() {
    // Wide enough that the march below never reaches the right margin.
    let mut t = term(120, 3);
    for c in 0x20u8..0x7F {
        let before = cursor(&t);
        t.consume(&[c]);
        let (bx, by) = before;
        // Cell under the previous cursor holds the byte with the pen style.
        let cell = *t.buffer().cell(bx, by);
        assert_eq!(cell.ch, c as char);
        assert_eq!(cell.fg, CellColor::Default);
        assert!(cell.attrs.is_empty());

        // BS undoes the advance.
        t.consume(b"\x08");
        assert_eq!(cursor(&t), before);
        // Re-advance so the loop marches across the grid.
        t.consume(&[c]);
    }
}

#[test]
fn cr_returns_to_column_zero() {
    let mut t = term(20, 5);
    t.consume(b"abc\rX");
    assert_eq!(&row(&t, 0)[..4], "Xbc ");
    assert_eq!(cursor(&t), (1, 0));
}

#[test]
fn lf_moves_down_without_cr() {
    let mut t = term(20, 5);
    t.consume(b"ab\ncd");
    assert_eq!(&row(&t, 0)[..2], "ab");
    assert_eq!(&row(&t, 1)[..4], "  cd");
    assert_eq!(cursor(&t), (4, 1));
}

#[test]
fn backspace_at_left_edge_goes_to_previous_row_start() {
    let mut t = term(20, 5);
    t.consume(b"ab\r\n\x08");
    assert_eq!(cursor(&t), (0, 0));
}

#[test]
fn horizontal_tab_walks_default_stops() {
    let mut t = term(20, 5);
    t.consume(b"a\t");
    assert_eq!(cursor(&t), (8, 0));
    t.consume(b"\t");
    assert_eq!(cursor(&t), (16, 0));
    // Past the last stop: parked on the right margin with wrap deferred,
    // so the next print starts a fresh row.
    t.consume(b"\t");
    assert_eq!(cursor(&t), (19, 0));
    t.consume(b"z");
    assert_eq!(cursor(&t), (1, 1));
    assert_eq!(&row(&t, 1)[..1], "z");
}

#[test]
fn vertical_tab_moves_one_row_by_default() {
    let mut t = term(20, 5);
    t.consume(b"\x0b\x0b");
    assert_eq!(cursor(&t), (0, 2));
}

// ---------------------------------------------------------------------
// Wrap and scroll.
// ---------------------------------------------------------------------

#[test]
fn wrap_on_flows_to_next_row() {
    let mut t = term(5, 2);
    t.consume(b"ABCDEFG");
    assert_eq!(row(&t, 0), "ABCDE");
    assert_eq!(&row(&t, 1)[..2], "FG");
    assert_eq!(cursor(&t), (2, 1));
}

#[test]
fn wrap_off_overwrites_last_column() {
    let mut t = term(5, 2);
    t.consume(b"\x1b[?7l");
    t.consume(b"ABCDEFG");
    assert_eq!(row(&t, 0), "ABCDG");
    assert_eq!(cursor(&t), (4, 0));
    assert_eq!(row(&t, 1), "     ");
}

#[test]
fn wrap_can_be_reenabled() {
    let mut t = term(5, 2);
    t.consume(b"\x1b[?7l\x1b[?7h");
    t.consume(b"ABCDEF");
    assert_eq!(cursor(&t), (1, 1));
}

#[test]
fn full_row_keeps_cursor_in_grid_across_consume_calls() {
    let mut t = term(5, 2);
    // A chunk ending exactly on the right margin must not leave the cursor
    // outside the grid between consume calls.
    t.consume(b"ABCDE");
    assert_eq!(cursor(&t), (4, 0));
    // The wrap is only deferred: the next chunk continues on a fresh row.
    t.consume(b"F");
    assert_eq!(&row(&t, 1)[..1], "F");
    assert_eq!(cursor(&t), (1, 1));
}

#[test]
fn full_row_then_crlf_advances_one_row() {
    let mut t = term(5, 3);
    t.consume(b"AAAAA\r\nBB");
    assert_eq!(row(&t, 0), "AAAAA");
    assert_eq!(&row(&t, 1)[..2], "BB");
    assert_eq!(row(&t, 2), "     ");
    assert_eq!(cursor(&t), (2, 1));
}

#[test]
fn scroll_at_bottom_drops_top_row() {
    let mut t = term(5, 2);
    t.consume(b"aa\r\nbb\r\ncc");
    assert_eq!(&row(&t, 0)[..2], "bb");
    assert_eq!(&row(&t, 1)[..2], "cc");
    assert_eq!(cursor(&t), (2, 1));
}

#[test]
fn long_output_keeps_cursor_in_bounds() {
    let mut t = term(10, 3);
    for _ in 0..50 {
        t.consume(b"some text that wraps and wraps\n");
        let (x, y) = cursor(&t);
        assert!(x < t.buffer().width());
        assert!(y < t.buffer().height());
    }
}

// ---------------------------------------------------------------------
// CSI cursor motion.
// ---------------------------------------------------------------------

#[test]
fn home_then_overwrite() {
    let mut t = term(80, 25);
    t.consume(b"X\x1b[HY");
    assert_eq!(t.buffer().cell(0, 0).ch, 'Y');
    assert_eq!(cursor(&t), (1, 0));
}

#[test]
fn cup_is_one_based_row_col() {
    let mut t = term(20, 5);
    t.consume(b"\x1b[3;7H");
    assert_eq!(cursor(&t), (6, 2));
    // Missing parameters default to 1.
    t.consume(b"\x1b[H");
    assert_eq!(cursor(&t), (0, 0));
    // Out-of-range clamps.
    t.consume(b"\x1b[99;99H");
    assert_eq!(cursor(&t), (19, 4));
}

#[test]
fn relative_motion_clamps_at_edges() {
    let mut t = term(10, 4);
    t.consume(b"\x1b[5A\x1b[7D");
    assert_eq!(cursor(&t), (0, 0));
    t.consume(b"\x1b[99B\x1b[99C");
    assert_eq!(cursor(&t), (9, 3));
    t.consume(b"\x1b[2A\x1b[3D");
    assert_eq!(cursor(&t), (6, 1));
}

#[test]
fn cnl_moves_down_and_to_column_zero() {
    let mut t = term(10, 4);
    t.consume(b"abc\x1b[2E");
    assert_eq!(cursor(&t), (0, 2));
}

#[test]
fn cha_and_vpa_set_single_axis() {
    let mut t = term(10, 4);
    t.consume(b"\x1b[5G");
    assert_eq!(cursor(&t), (4, 0));
    t.consume(b"\x1b[3d");
    assert_eq!(cursor(&t), (4, 2));
}

// ---------------------------------------------------------------------
// Erase / insert / delete.
// ---------------------------------------------------------------------

#[test]
fn erase_display_all_homes_cursor() {
    let mut t = term(5, 3);
    for _ in 0..3 {
        t.consume(b"#####");
    }
    t.consume(b"\x1b[2J");
    for y in 0..3 {
        assert_eq!(row(&t, y), "     ");
    }
    assert_eq!(cursor(&t), (0, 0));
}

#[test]
fn erase_display_to_end_keeps_before_cursor() {
    let mut t = term(5, 3);
    t.consume(b"11111\r\n22222\r\n33333");
    t.consume(b"\x1b[2;3H\x1b[0J");
    assert_eq!(row(&t, 0), "11111");
    assert_eq!(row(&t, 1), "22   ");
    assert_eq!(row(&t, 2), "     ");
}

#[test]
fn erase_display_from_start_keeps_after_cursor() {
    let mut t = term(5, 3);
    t.consume(b"11111\r\n22222\r\n33333");
    t.consume(b"\x1b[2;3H\x1b[1J");
    assert_eq!(row(&t, 0), "     ");
    assert_eq!(row(&t, 1), "   22");
    assert_eq!(row(&t, 2), "33333");
}

#[test]
fn erase_line_variants() {
    let mut t = term(5, 3);
    t.consume(b"abcde\x1b[1;3H");

    let mut t2 = term(5, 1);
    t2.consume(b"abcde\x1b[1;3H\x1b[K");
    assert_eq!(row(&t2, 0), "ab   ");

    let mut t3 = term(5, 1);
    t3.consume(b"abcde\x1b[1;3H\x1b[1K");
    assert_eq!(row(&t3, 0), "   de");

    t.consume(b"\x1b[2K");
    assert_eq!(row(&t, 0), "     ");
}

#[test]
fn erase_uses_pen_background() {
    let mut t = term(5, 1);
    t.consume(b"abcde\x1b[44m\x1b[2K");
    assert_eq!(row(&t, 0), "     ");
    assert_eq!(t.buffer().cell(0, 0).bg, CellColor::Indexed(4));
}

#[test]
fn insert_and_delete_lines_reset_column() {
    let mut t = term(3, 3);
    t.consume(b"aaa\r\nbbb\r\nccc");
    t.consume(b"\x1b[2;2H\x1b[L");
    assert_eq!(row(&t, 0), "aaa");
    assert_eq!(row(&t, 1), "   ");
    assert_eq!(row(&t, 2), "bbb");
    assert_eq!(cursor(&t), (0, 1));

    t.consume(b"\x1b[M");
    assert_eq!(row(&t, 1), "bbb");
    assert_eq!(row(&t, 2), "   ");
}

#[test]
fn insert_delete_erase_chars() {
    let mut t = term(6, 1);
    t.consume(b"abcdef\x1b[1;2H\x1b[2@");
    assert_eq!(row(&t, 0), "a  bcd");

    t.consume(b"\x1b[2P");
    assert_eq!(row(&t, 0), "abcd  ");

    t.consume(b"\x1b[2X");
    assert_eq!(row(&t, 0), "a  d  ");
    assert_eq!(cursor(&t), (1, 0));
}

#[test]
fn repeat_last_character() {
    let mut t = term(10, 1);
    t.consume(b"x\x1b[4b");
    assert_eq!(&row(&t, 0)[..6], "xxxxx ");
    assert_eq!(cursor(&t), (5, 0));
}

// ---------------------------------------------------------------------
// SGR.
// ---------------------------------------------------------------------

#[test]
fn sgr_basic_colors_and_attrs() {
    let mut t = term(10, 1);
    t.consume(b"\x1b[1;4;31;42mA");
    let cell = *t.buffer().cell(0, 0);
    assert_eq!(cell.fg, CellColor::Indexed(1));
    assert_eq!(cell.bg, CellColor::Indexed(2));
    assert!(cell.attrs.contains(Attrs::BOLD));
    assert!(cell.attrs.contains(Attrs::UNDERLINE));
}

#[test]
fn sgr_reset_restores_defaults() {
    let mut t = term(10, 1);
    t.consume(b"\x1b[1;31m\x1b[0mB");
    let cell = *t.buffer().cell(0, 0);
    assert_eq!(cell.fg, CellColor::Default);
    assert!(cell.attrs.is_empty());
}

#[test]
fn sgr_truecolor_foreground() {
    let mut t = term(10, 1);
    t.consume(b"\x1b[38;2;10;20;30mA");
    assert_eq!(t.buffer().cell(0, 0).fg, CellColor::Rgb(10, 20, 30));
}

#[test]
fn sgr_truecolor_background_and_256() {
    let mut t = term(10, 1);
    t.consume(b"\x1b[48;2;1;2;3m\x1b[38;5;196mA");
    let cell = *t.buffer().cell(0, 0);
    assert_eq!(cell.bg, CellColor::Rgb(1, 2, 3));
    assert_eq!(cell.fg, CellColor::Indexed(196));
}

#[test]
fn sgr_colon_subparameter_form() {
    let mut t = term(10, 1);
    t.consume(b"\x1b[38:2:9:8:7mA");
    assert_eq!(t.buffer().cell(0, 0).fg, CellColor::Rgb(9, 8, 7));
}

#[test]
fn sgr_lone_two_is_dim_not_color_selector() {
    let mut t = term(10, 1);
    t.consume(b"\x1b[2mA");
    let cell = *t.buffer().cell(0, 0);
    assert!(cell.attrs.contains(Attrs::DIM));
    assert_eq!(cell.fg, CellColor::Default);
}

#[test]
fn sgr_bright_foreground_also_sets_bold() {
    let mut t = term(10, 1);
    t.consume(b"\x1b[91mA");
    let cell = *t.buffer().cell(0, 0);
    assert_eq!(cell.fg, CellColor::Indexed(9));
    assert!(cell.attrs.contains(Attrs::BOLD));
}

#[test]
fn sgr_bright_background() {
    let mut t = term(10, 1);
    t.consume(b"\x1b[103mA");
    assert_eq!(t.buffer().cell(0, 0).bg, CellColor::Indexed(11));
}

#[test]
fn sgr_attribute_resets() {
    let mut t = term(10, 1);
    t.consume(b"\x1b[1;2;3;4;5;7;9m\x1b[22;23;24;25;27;29mA");
    assert!(t.buffer().cell(0, 0).attrs.is_empty());
}

#[test]
fn style_travels_on_pen_not_on_buffer() {
    let mut t = term(10, 1);
    t.consume(b"a\x1b[31mb");
    assert_eq!(t.buffer().cell(0, 0).fg, CellColor::Default);
    assert_eq!(t.buffer().cell(1, 0).fg, CellColor::Indexed(1));
}

// ---------------------------------------------------------------------
// Device queries.
// ---------------------------------------------------------------------

#[test]
fn dsr_cursor_position_reply() {
    let mut t = term(20, 10);
    t.consume(b"\x1b[8;4H");
    let before = t.snapshot();

    let reply = t.consume(b"\x1b[6n").expect("DSR must reply");
    assert_eq!(reply, b"\x1b[8;4R".to_vec());

    // Buffer unchanged by the query.
    let after = t.snapshot();
    assert_eq!(before.cells, after.cells);
    assert_eq!(before.cursor, after.cursor);
}

#[test]
fn dsr_reply_clamped_at_right_margin() {
    let mut t = term(5, 2);
    // Cursor parked on the last column with a wrap pending: the reported
    // column is the margin itself, never one past it.
    t.consume(b"ABCDE");
    let reply = t.consume(b"\x1b[6n").expect("DSR must reply");
    assert_eq!(reply, b"\x1b[1;5R".to_vec());
}

#[test]
fn dsr_status_ok_reply() {
    let mut t = term(20, 10);
    let reply = t.consume(b"\x1b[5n").expect("DSR must reply");
    assert_eq!(reply, b"\x1b[0n".to_vec());
}

#[test]
fn device_attributes_reply() {
    let mut t = term(20, 10);
    let reply = t.consume(b"\x1b[c").expect("DA must reply");
    assert_eq!(reply, b"\x1b[?1;0c".to_vec());
}

#[test]
fn plain_text_produces_no_reply() {
    let mut t = term(20, 10);
    assert_eq!(t.consume(b"no queries here"), None);
}

// ---------------------------------------------------------------------
// Modes, tabs, OSC robustness.
// ---------------------------------------------------------------------

#[test]
fn deccolm_switches_width_and_clears() {
    let mut t = term(80, 5);
    t.consume(b"hello\x1b[?3h");
    assert_eq!(t.buffer().width(), 132);
    assert_eq!(cursor(&t), (0, 0));
    assert_eq!(row(&t, 0).trim(), "");

    t.consume(b"\x1b[?3l");
    assert_eq!(t.buffer().width(), 80);
}

#[test]
fn decscnm_toggles_global_invert() {
    let mut t = term(10, 2);
    t.consume(b"\x1b[?5h");
    assert!(t.buffer().global_invert);
    t.consume(b"\x1b[?5l");
    assert!(!t.buffer().global_invert);
}

#[test]
fn hts_and_tbc() {
    let mut t = term(20, 5);
    // Set a custom stop at column 3.
    t.consume(b"\x1b[4G\x1bH\x1b[H\t");
    assert_eq!(cursor(&t), (3, 0));
    // Clear all horizontal stops: HT parks on the right margin.
    t.consume(b"\x1b[3g\x1b[H\t");
    assert_eq!(cursor(&t), (19, 0));
}

#[test]
fn csi_y_advances_to_next_vertical_stop() {
    let mut t = term(20, 5);
    t.consume(b"\x1b[Y");
    assert_eq!(cursor(&t), (0, 1));
}

#[test]
fn osc_payload_is_swallowed() {
    let mut t = term(20, 2);
    t.consume(b"\x1b]0;window title\x1b\\after");
    assert_eq!(&row(&t, 0)[..5], "after");
}

#[test]
fn osc_bel_terminated() {
    let mut t = term(20, 2);
    t.consume(b"\x1b]2;title\x07ok");
    assert_eq!(&row(&t, 0)[..2], "ok");
}

#[test]
fn charset_designation_is_consumed() {
    let mut t = term(20, 2);
    t.consume(b"\x1b(B\x1b)0text");
    assert_eq!(&row(&t, 0)[..4], "text");
}

#[test]
fn malformed_csi_leaves_buffer_untouched() {
    let mut t = term(10, 2);
    t.consume(b"ok");
    let before = t.snapshot();
    // Unknown final byte: dropped.
    t.consume(b"\x1b[99q");
    assert_eq!(before.cells, t.snapshot().cells);
}

#[test]
fn utf8_multibyte_lands_in_one_cell() {
    let mut t = term(10, 2);
    t.consume("héμ€".as_bytes());
    assert_eq!(t.buffer().cell(0, 0).ch, 'h');
    assert_eq!(t.buffer().cell(1, 0).ch, 'é');
    assert_eq!(t.buffer().cell(2, 0).ch, 'μ');
    assert_eq!(t.buffer().cell(3, 0).ch, '€');
    assert_eq!(cursor(&t), (4, 0));
}

#[test]
fn utf8_split_across_consume_calls() {
    let mut t = term(10, 2);
    let bytes = "é".as_bytes();
    t.consume(&bytes[..1]);
    t.consume(&bytes[1..]);
    assert_eq!(t.buffer().cell(0, 0).ch, 'é');
}

#[test]
fn escape_split_across_consume_calls() {
    let mut t = term(10, 2);
    t.consume(b"\x1b[");
    t.consume(b"3");
    t.consume(b"1mA");
    assert_eq!(t.buffer().cell(0, 0).fg, CellColor::Indexed(1));
}

#[test]
fn esc_index_family() {
    let mut t = term(5, 3);
    // ESC E: next line + column 0.
    t.consume(b"ab\x1bE");
    assert_eq!(cursor(&t), (0, 1));
    // ESC M at top inserts a line (content shifts down).
    t.consume(b"\x1b[HX\x1b[H\x1bM");
    assert_eq!(cursor(&t), (0, 0));
    assert_eq!(&row(&t, 1)[..1], "X");
}

#[test]
fn random_binary_never_panics_and_cursor_stays_bounded() {
    let mut t = term(13, 7);
    // A deterministic pseudo-random byte soup, escape bytes included.
    let mut state = 0x2545F491u32;
    let mut bytes = Vec::with_capacity(4096);
    for _ in 0..4096 {
        state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        bytes.push((state >> 16) as u8);
    }
    for chunk in bytes.chunks(17) {
        t.consume(chunk);
        let (x, y) = cursor(&t);
        assert!(x < t.buffer().width());
        assert!(y < t.buffer().height());
    }
    // Every cell still holds a valid codepoint (chars by construction).
    let snap = t.snapshot();
    for cell in &snap.cells {
        assert!(u32::from(cell.ch) <= 0x0010_FFFF);
    }
}

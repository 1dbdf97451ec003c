// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! SGR (`CSI ... m`): colors and attributes on the pen.
//!
//! Extended colors come in two shapes: colon subparameters (`38:2:r:g:b`,
//! one parameter group) and legacy semicolons (`38;2;r;g;b`, five groups).
//! The latter consumes following groups, which is exactly the "is_fg latch"
//! of the wire protocol: a `2` or `5` right after `38`/`48` is a color
//! selector, anywhere else `2` means DIM and `5` means BLINK.

use vte::Params;

use crate::term::buffer::TermBuffer;
use crate::term::cell::{Attrs, CellColor, Pen};

pub fn process(buf: &mut TermBuffer, params: &Params) {
    let groups: Vec<&[u16]> = params.iter().collect();

    // `CSI m` with no parameters at all is a reset.
    if groups.is_empty() {
        buf.pen = Pen::default();
        return;
    }

    let mut i = 0;
    while i < groups.len() {
        let group = groups[i];
        let code = group.first().copied().unwrap_or(0);
        match code {
            0 => buf.pen = Pen::default(),
            1 => buf.pen.attrs.insert(Attrs::BOLD),
            2 => buf.pen.attrs.insert(Attrs::DIM),
            3 => buf.pen.attrs.insert(Attrs::ITALIC),
            4 => buf.pen.attrs.insert(Attrs::UNDERLINE),
            // 6 is "rapid blink"; the buffer has a single blink flag.
            5 | 6 => buf.pen.attrs.insert(Attrs::BLINK),
            7 => buf.pen.attrs.insert(Attrs::INVERSE),
            9 => buf.pen.attrs.insert(Attrs::STRIKETHROUGH),
            22 => {
                buf.pen.attrs.remove(Attrs::BOLD);
                buf.pen.attrs.remove(Attrs::DIM);
            }
            23 => buf.pen.attrs.remove(Attrs::ITALIC),
            24 => buf.pen.attrs.remove(Attrs::UNDERLINE),
            25 => buf.pen.attrs.remove(Attrs::BLINK),
            27 => buf.pen.attrs.remove(Attrs::INVERSE),
            29 => buf.pen.attrs.remove(Attrs::STRIKETHROUGH),
            30..=37 => buf.pen.fg = CellColor::Indexed((code - 30) as u8),
            39 => buf.pen.fg = CellColor::Default,
            40..=47 => buf.pen.bg = CellColor::Indexed((code - 40) as u8),
            49 => buf.pen.bg = CellColor::Default,
            // Bright foregrounds double as bold, matching the 16-color model
            // where bold and bright are the same thing.
            90..=97 => {
                buf.pen.fg = CellColor::Indexed((code - 90 + 8) as u8);
                buf.pen.attrs.insert(Attrs::BOLD);
            }
            100..=107 => buf.pen.bg = CellColor::Indexed((code - 100 + 8) as u8),
            38 => {
                if let Some(color) = extended_color(&groups, &mut i) {
                    buf.pen.fg = color;
                }
            }
            48 => {
                if let Some(color) = extended_color(&groups, &mut i) {
                    buf.pen.bg = color;
                }
            }
            other => tracing::debug!("SGR: unsupported parameter {other}"),
        }
        i += 1;
    }
}

/// Decode the selector following `38` / `48` at `groups[*i]`. Advances `*i`
/// past every group it consumes; a malformed selector leaves the pen
/// untouched.
fn extended_color(groups: &[&[u16]], i: &mut usize) -> Option<CellColor> {
    let group = groups[*i];
    if group.len() > 1 {
        // Colon form: the whole selector arrived as one group.
        return match group[1] {
            2 if group.len() >= 5 => Some(CellColor::Rgb(
                clamp_u8(group[2]),
                clamp_u8(group[3]),
                clamp_u8(group[4]),
            )),
            5 if group.len() >= 3 && group[2] <= 255 => {
                Some(CellColor::Indexed(group[2] as u8))
            }
            _ => None,
        };
    }

    // Semicolon form: the selector and channels are separate groups.
    let next = |i: &mut usize| -> Option<u16> {
        *i += 1;
        groups.get(*i).and_then(|g| g.first()).copied()
    };
    match next(i)? {
        2 => {
            let r = next(i)?;
            let g = next(i)?;
            let b = next(i)?;
            Some(CellColor::Rgb(clamp_u8(r), clamp_u8(g), clamp_u8(b)))
        }
        5 => {
            let index = next(i)?;
            (index <= 255).then_some(CellColor::Indexed(index as u8))
        }
        _ => None,
    }
}

fn clamp_u8(v: u16) -> u8 { v.min(255) as u8 }

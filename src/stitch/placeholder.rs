//! Numeric placeholder panels.
//!
//! Digits are drawn as seven-segment glyphs so no font file is needed.

use image::{Rgb, RgbImage};

/// Side length of a placeholder panel.
pub const PLACEHOLDER_SIZE: u32 = 512;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

// Segment bits: a=top, b=top right, c=bottom right, d=bottom, e=bottom left,
// f=top left, g=middle.
const SEG_A: u8 = 1 << 0;
const SEG_B: u8 = 1 << 1;
const SEG_C: u8 = 1 << 2;
const SEG_D: u8 = 1 << 3;
const SEG_E: u8 = 1 << 4;
const SEG_F: u8 = 1 << 5;
const SEG_G: u8 = 1 << 6;

const DIGITS: [u8; 10] = [
    SEG_A | SEG_B | SEG_C | SEG_D | SEG_E | SEG_F,
    SEG_B | SEG_C,
    SEG_A | SEG_B | SEG_G | SEG_E | SEG_D,
    SEG_A | SEG_B | SEG_G | SEG_C | SEG_D,
    SEG_F | SEG_G | SEG_B | SEG_C,
    SEG_A | SEG_F | SEG_G | SEG_C | SEG_D,
    SEG_A | SEG_F | SEG_G | SEG_E | SEG_C | SEG_D,
    SEG_A | SEG_B | SEG_C,
    SEG_A | SEG_B | SEG_C | SEG_D | SEG_E | SEG_F | SEG_G,
    SEG_A | SEG_B | SEG_C | SEG_D | SEG_F | SEG_G,
];

/// A white square panel with `count` drawn in black at its centre.
#[must_use]
pub fn placeholder(count: usize) -> RgbImage {
    let size = PLACEHOLDER_SIZE;
    let mut canvas = RgbImage::from_pixel(size, size, WHITE);
    let text = count.to_string();
    let digits = text.len() as u32;

    // Glyph height starts at half the panel and shrinks until the text fits.
    let mut height = size / 2;
    loop {
        let (width, stroke) = (height / 2, (height / 8).max(1));
        let total = digits * width + digits.saturating_sub(1) * stroke;
        if total <= size * 9 / 10 || height <= 8 {
            break;
        }
        height -= 8;
    }
    let width = height / 2;
    let stroke = (height / 8).max(1);
    let total = digits * width + digits.saturating_sub(1) * stroke;

    let mut x = size.saturating_sub(total) / 2;
    let y = size.saturating_sub(height) / 2;
    for ch in text.chars() {
        if let Some(d) = ch.to_digit(10) {
            draw_digit(&mut canvas, DIGITS[d as usize], x, y, width, height, stroke);
        }
        x += width + stroke;
    }

    canvas
}

fn draw_digit(img: &mut RgbImage, segments: u8, x: u32, y: u32, w: u32, h: u32, t: u32) {
    let half = h / 2;
    let rects = [
        (SEG_A, x, y, w, t),
        (SEG_B, x + w - t, y, t, half),
        (SEG_C, x + w - t, y + half, t, h - half),
        (SEG_D, x, y + h - t, w, t),
        (SEG_E, x, y + half, t, h - half),
        (SEG_F, x, y, t, half),
        (SEG_G, x, y + half - t / 2, w, t),
    ];
    for (bit, rx, ry, rw, rh) in rects {
        if segments & bit != 0 {
            fill_rect(img, rx, ry, rw, rh);
        }
    }
}

fn fill_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32) {
    let x_end = (x + w).min(img.width());
    let y_end = (y + h).min(img.height());
    for py in y..y_end {
        for px in x..x_end {
            img.put_pixel(px, py, BLACK);
        }
    }
}

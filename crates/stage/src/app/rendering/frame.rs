use super::text::{glyph_advance, glyph_rows, GLYPH_WIDTH};
use super::Viewport;

pub type Rgba = [u8; 4];

/// Mutable view over an RGBA8 pixel buffer. All drawing is clipped.
pub struct Frame<'a> {
    pixels: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> Frame<'a> {
    pub fn new(pixels: &'a mut [u8], width: u32, height: u32) -> Self {
        debug_assert!(pixels.len() >= width as usize * height as usize * 4);
        Self {
            pixels,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.width,
            height: self.height,
        }
    }

    pub fn clear(&mut self, color: Rgba) {
        for chunk in self.pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgba> {
        let offset = self.byte_offset(x, y)?;
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.pixels[offset..offset + 4]);
        Some(out)
    }

    /// Writes one pixel; translucent colours are blended over what is there.
    pub fn put_pixel(&mut self, x: i32, y: i32, color: Rgba) {
        let Some(offset) = self.byte_offset(x, y) else {
            return;
        };
        let target = &mut self.pixels[offset..offset + 4];
        match color[3] {
            255 => target.copy_from_slice(&color),
            0 => {}
            alpha => {
                let a = alpha as u32;
                for channel in 0..3 {
                    let src = color[channel] as u32;
                    let dst = target[channel] as u32;
                    target[channel] = ((src * a + dst * (255 - a)) / 255) as u8;
                }
                target[3] = 255;
            }
        }
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, rect_width: i32, rect_height: i32, color: Rgba) {
        let start_x = x.max(0);
        let start_y = y.max(0);
        let end_x = x.saturating_add(rect_width).min(self.width as i32);
        let end_y = y.saturating_add(rect_height).min(self.height as i32);
        for py in start_y..end_y {
            for px in start_x..end_x {
                self.put_pixel(px, py, color);
            }
        }
    }

    pub fn outline_rect(
        &mut self,
        x: i32,
        y: i32,
        rect_width: i32,
        rect_height: i32,
        color: Rgba,
    ) {
        if rect_width <= 1 || rect_height <= 1 {
            return;
        }
        self.fill_rect(x, y, rect_width, 1, color);
        self.fill_rect(x, y + rect_height - 1, rect_width, 1, color);
        self.fill_rect(x, y, 1, rect_height, color);
        self.fill_rect(x + rect_width - 1, y, 1, rect_height, color);
    }

    pub fn fill_circle(&mut self, cx: i32, cy: i32, radius: i32, color: Rgba) {
        if radius <= 0 {
            self.put_pixel(cx, cy, color);
            return;
        }
        let radius_sq = radius * radius;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= radius_sq {
                    self.put_pixel(cx + dx, cy + dy, color);
                }
            }
        }
    }

    pub fn line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgba) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let step_x = if x0 < x1 { 1 } else { -1 };
        let step_y = if y0 < y1 { 1 } else { -1 };
        let mut error = dx + dy;
        let (mut x, mut y) = (x0, y0);
        loop {
            self.put_pixel(x, y, color);
            if x == x1 && y == y1 {
                break;
            }
            let doubled = 2 * error;
            if doubled >= dy {
                error += dy;
                x += step_x;
            }
            if doubled <= dx {
                error += dx;
                y += step_y;
            }
        }
    }

    pub fn draw_text(&mut self, x: i32, y: i32, text: &str, scale: i32, color: Rgba) {
        let scale = scale.max(1);
        let mut cursor_x = x;
        for ch in text.chars() {
            for (row_index, row_bits) in glyph_rows(ch).iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if row_bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                        continue;
                    }
                    self.fill_rect(
                        cursor_x + col * scale,
                        y + row_index as i32 * scale,
                        scale,
                        scale,
                        color,
                    );
                }
            }
            cursor_x += glyph_advance(scale);
        }
    }

    fn byte_offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        let offset = (y as usize)
            .checked_mul(self.width as usize)?
            .checked_add(x as usize)?
            .checked_mul(4)?;
        (offset + 4 <= self.pixels.len()).then_some(offset)
    }
}

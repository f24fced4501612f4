use std::io::{self, Cursor, Write};
use std::sync::{Arc, Mutex, OnceLock};

use base64::{engine::general_purpose, Engine as _};
use crossterm::{cursor::MoveTo, queue, style::Print};
use image::GenericImageView;
use ratatui::backend::{Backend, ClearType, CrosstermBackend, WindowSize};
use ratatui::buffer::Cell;
use ratatui::layout::{Position, Size};
use serde::{Deserialize, Serialize};

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const KITTY_FORMAT_PNG: u32 = 100;
const KITTY_CHUNK_SIZE: usize = 4096;
const KITTY_IMAGE_ID: u32 = 1;

/// A decoded catalog sprite, held as a base64 PNG payload ready for the
/// kitty graphics protocol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpriteData {
    pub payload: String,
    pub width: u32,
    pub height: u32,
}

/// Validate and normalize fetched image bytes. Non-PNG sources are
/// re-encoded so the payload is always a PNG stream.
pub fn decode_sprite(bytes: &[u8]) -> Result<SpriteData, String> {
    let image = image::load_from_memory(bytes).map_err(|err| err.to_string())?;
    let (width, height) = image.dimensions();
    let payload = if bytes.starts_with(PNG_MAGIC) {
        general_purpose::STANDARD.encode(bytes)
    } else {
        let mut buffer = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
            .map_err(|err| err.to_string())?;
        general_purpose::STANDARD.encode(&buffer)
    };
    Ok(SpriteData {
        payload,
        width,
        height,
    })
}

/// Build the escape sequence that transmits and places the sprite over a
/// cols x rows cell box at the cursor position.
pub fn kitty_sequence(sprite: &SpriteData, cols: u16, rows: u16) -> Result<String, String> {
    let mut sequence = String::new();
    let payload = sprite.payload.as_bytes();
    let total_chunks = payload.len().div_ceil(KITTY_CHUNK_SIZE);

    for (index, chunk) in payload.chunks(KITTY_CHUNK_SIZE).enumerate() {
        let more = index + 1 < total_chunks;
        let chunk_str = std::str::from_utf8(chunk).map_err(|err| err.to_string())?;
        if index == 0 {
            let mut params = format!(
                "f={},s={},v={},a=T,t=d,i={}",
                KITTY_FORMAT_PNG, sprite.width, sprite.height, KITTY_IMAGE_ID
            );
            if cols > 0 {
                params.push_str(&format!(",c={cols}"));
            }
            if rows > 0 {
                params.push_str(&format!(",r={rows}"));
            }
            params.push_str(&format!(",m={}", if more { 1 } else { 0 }));
            sequence.push_str(&format!("\x1b_G{params};{chunk_str}\x1b\\"));
        } else {
            sequence.push_str(&format!(
                "\x1b_Gm={};{chunk_str}\x1b\\",
                if more { 1 } else { 0 }
            ));
        }
    }
    Ok(sequence)
}

type OverlaySlot = Arc<Mutex<Option<(u16, u16, String)>>>;

static OVERLAY: OnceLock<OverlaySlot> = OnceLock::new();

pub fn overlay_slot() -> OverlaySlot {
    OVERLAY
        .get_or_init(|| Arc::new(Mutex::new(None)))
        .clone()
}

/// Place the single sprite overlay for the next frame flush.
pub fn place_overlay(x: u16, y: u16, sequence: String) {
    let slot = overlay_slot();
    let mut slot = slot.lock().expect("sprite overlay lock");
    *slot = Some((x, y, sequence));
}

pub fn clear_overlay() {
    let slot = overlay_slot();
    let mut slot = slot.lock().expect("sprite overlay lock");
    *slot = None;
}

/// Ratatui backend wrapper that emits the sprite overlay after every draw.
/// Previously transmitted images are deleted before the next placement so
/// stale sprites never linger on screen.
#[derive(Debug)]
pub struct SpriteBackend<W: Write> {
    inner: CrosstermBackend<W>,
    overlay: OverlaySlot,
    had_sprite: bool,
}

impl<W: Write> SpriteBackend<W> {
    pub fn new(writer: W, overlay: OverlaySlot) -> Self {
        Self {
            inner: CrosstermBackend::new(writer),
            overlay,
            had_sprite: false,
        }
    }
}

impl<W: Write> Backend for SpriteBackend<W> {
    fn draw<'a, I>(&mut self, content: I) -> io::Result<()>
    where
        I: Iterator<Item = (u16, u16, &'a Cell)>,
    {
        self.inner.draw(content)?;
        let overlay = {
            let slot = self.overlay.lock().expect("sprite overlay lock");
            slot.clone()
        };
        if self.had_sprite {
            queue!(self.inner, Print("\x1b_Ga=d,d=a\x1b\\"))?;
        }
        let Some((x, y, sequence)) = overlay else {
            self.had_sprite = false;
            return Ok(());
        };
        queue!(self.inner, MoveTo(x, y), Print(sequence))?;
        self.had_sprite = true;
        Ok(())
    }

    fn append_lines(&mut self, n: u16) -> io::Result<()> {
        self.inner.append_lines(n)
    }

    fn hide_cursor(&mut self) -> io::Result<()> {
        self.inner.hide_cursor()
    }

    fn show_cursor(&mut self) -> io::Result<()> {
        self.inner.show_cursor()
    }

    fn get_cursor_position(&mut self) -> io::Result<Position> {
        self.inner.get_cursor_position()
    }

    fn set_cursor_position<P: Into<Position>>(&mut self, position: P) -> io::Result<()> {
        self.inner.set_cursor_position(position)
    }

    fn clear(&mut self) -> io::Result<()> {
        self.inner.clear()
    }

    fn clear_region(&mut self, clear_type: ClearType) -> io::Result<()> {
        self.inner.clear_region(clear_type)
    }

    fn size(&self) -> io::Result<Size> {
        self.inner.size()
    }

    fn window_size(&mut self) -> io::Result<WindowSize> {
        self.inner.window_size()
    }

    fn flush(&mut self) -> io::Result<()> {
        Backend::flush(&mut self.inner)
    }
}

impl<W: Write> Write for SpriteBackend<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(&mut self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_fixture(width: u32, height: u32) -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, 255]));
        let mut buffer = Vec::new();
        image::DynamicImage::ImageRgba8(image)
            .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
            .expect("encode fixture");
        buffer
    }

    #[test]
    fn test_decode_sprite_reads_dimensions() {
        let bytes = png_fixture(3, 2);
        let sprite = decode_sprite(&bytes).expect("decode");
        assert_eq!((sprite.width, sprite.height), (3, 2));
        assert_eq!(
            general_purpose::STANDARD
                .decode(&sprite.payload)
                .expect("payload is base64"),
            bytes
        );
    }

    #[test]
    fn test_decode_sprite_rejects_garbage() {
        assert!(decode_sprite(b"not an image").is_err());
    }

    #[test]
    fn test_kitty_sequence_shape() {
        let bytes = png_fixture(2, 2);
        let sprite = decode_sprite(&bytes).expect("decode");
        let sequence = kitty_sequence(&sprite, 8, 4).expect("sequence");
        assert!(sequence.starts_with("\x1b_Gf=100,"));
        assert!(sequence.contains("a=T"));
        assert!(sequence.contains("c=8"));
        assert!(sequence.contains("r=4"));
        assert!(sequence.ends_with("\x1b\\"));
    }

    #[test]
    fn test_kitty_sequence_chunks_large_payloads() {
        let sprite = SpriteData {
            payload: "A".repeat(KITTY_CHUNK_SIZE * 2 + 10),
            width: 96,
            height: 96,
        };
        let sequence = kitty_sequence(&sprite, 0, 0).expect("sequence");
        assert_eq!(sequence.matches("\x1b_G").count(), 3);
        assert_eq!(sequence.matches("m=1").count(), 2);
        assert_eq!(sequence.matches("m=0").count(), 1);
    }
}

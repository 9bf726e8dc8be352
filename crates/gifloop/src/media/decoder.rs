use std::fs::File;
use std::io::Read;
use std::path::Path;

use image::RgbaImage;

use super::types::{RawFrame, RawFrameStack};
use crate::error::{PlayerError, PlayerResult};

/// Load a GIF from disk and decode every frame without compositing.
pub fn load_gif(path: &Path) -> PlayerResult<RawFrameStack> {
    let file = File::open(path).map_err(|e| PlayerError::load(path, e))?;
    let stack = decode_gif(file)?;

    log::info!(
        "Loaded GIF {}: {}x{}, {} frame{}",
        path.display(),
        stack.width,
        stack.height,
        stack.len(),
        if stack.len() == 1 { "" } else { "s" }
    );

    Ok(stack)
}

/// Decode a GIF from any reader into its raw sub-rectangle frames.
pub fn decode_gif<R: Read>(mut reader: R) -> PlayerResult<RawFrameStack> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(gif::DecodingError::Io)?;

    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::RGBA);
    // `read_info` reads up to the first image descriptor, so a well-formed
    // GIF without one surfaces as an EOF error
    let mut decoder = match options.read_info(bytes.as_slice()) {
        Ok(decoder) => decoder,
        Err(_) if is_frameless(&bytes) => return Err(PlayerError::EmptyAnimation),
        Err(e) => return Err(e.into()),
    };

    let width = u32::from(decoder.width());
    let height = u32::from(decoder.height());
    let mut frames = Vec::new();

    while let Some(frame) = decoder.read_next_frame()? {
        let index = frames.len();
        let pixels = RgbaImage::from_raw(
            u32::from(frame.width),
            u32::from(frame.height),
            frame.buffer.to_vec(),
        )
        .ok_or(PlayerError::MalformedFrame { index })?;

        frames.push(RawFrame {
            left: u32::from(frame.left),
            top: u32::from(frame.top),
            pixels,
            delay_cs: frame.delay,
        });
    }

    if frames.is_empty() {
        return Err(PlayerError::EmptyAnimation);
    }

    Ok(RawFrameStack {
        width,
        height,
        frames,
    })
}

/// Whether `bytes` is a complete GIF that reaches its trailer without any
/// image descriptor: header, screen descriptor, optional global palette, and
/// only extension blocks.
fn is_frameless(bytes: &[u8]) -> bool {
    const EXTENSION: u8 = 0x21;
    const TRAILER: u8 = 0x3B;

    if bytes.len() < 13 || !(bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a")) {
        return false;
    }

    let flags = bytes[10];
    let mut pos = 13;
    if flags & 0x80 != 0 {
        pos += 3 * (1usize << ((flags & 0x07) + 1));
    }

    loop {
        match bytes.get(pos) {
            Some(&TRAILER) => return true,
            Some(&EXTENSION) => {
                // introducer and label, then length-prefixed sub-blocks up to a 0 terminator
                pos += 2;
                loop {
                    match bytes.get(pos) {
                        Some(0) => {
                            pos += 1;
                            break;
                        }
                        Some(&len) => pos += 1 + usize::from(len),
                        None => return false,
                    }
                }
            }
            _ => return false,
        }
    }
}

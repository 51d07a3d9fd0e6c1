//! Panel protocol definitions and encoding.
//!
//! Protocol structure:
//! - Output buffer: 4107 bytes (1 report byte + 10 header bytes + 4096 data bytes)
//! - Signature byte: 0x6A
//! - Command bytes: 0xB1 (blit chunk), 0xB2 (backlight)
//! - Input report: 0x04, flags byte (button bits), point count, then
//!   x/y little-endian pairs for up to 5 touch points.

use crate::touch::TouchPoint;
use crate::{Error, Result, PANEL_HEIGHT, PANEL_WIDTH};

/// Total output buffer size including the HID report ID byte.
pub const BUFFER_SIZE: usize = 4107; // 1 report + 10 header + 4096 data

/// Header size (excluding report byte).
pub const HEADER_SIZE: usize = 10;

/// Data payload size per chunk.
pub const DATA_SIZE: usize = 4096;

/// Report byte size (HID report ID).
pub const REPORT_SIZE: usize = 1;

/// Protocol signature byte.
pub const PANEL_SIGNATURE: u8 = 0x6A;

/// Full framebuffer size in bytes (320 * 820 RGB565 pixels).
pub const FRAME_BYTES: usize = PANEL_WIDTH as usize * PANEL_HEIGHT as usize * 2;

/// Number of chunks for a full-frame blit.
pub const CHUNK_COUNT: usize = FRAME_BYTES.div_ceil(DATA_SIZE);

/// Size of the final chunk (524800 % 4096 = 512).
pub const FINAL_CHUNK_SIZE: usize = FRAME_BYTES - (CHUNK_COUNT - 1) * DATA_SIZE;

/// Maximum simultaneous touch points in one input report.
pub const MAX_TOUCH_POINTS: usize = 5;

/// Input report ID.
pub const INPUT_REPORT_ID: u8 = 0x04;

/// Panel command types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// Framebuffer blit chunk.
    Blit = 0xB1,
    /// Backlight on/off.
    Backlight = 0xB2,
}

/// Blit chunk phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BlitPhase {
    /// First chunk of a frame.
    Start = 0xE0,
    /// Middle chunks.
    Continue = 0xE1,
    /// Final chunk, triggers presentation.
    End = 0xE2,
}

/// Decoded input report: active touches plus the two button states.
#[derive(Debug, Clone, Default)]
pub struct Input {
    pub touches: Vec<TouchPoint>,
    pub button_up: bool,
    pub button_down: bool,
}

/// Builds a backlight command packet.
pub fn build_backlight_packet(on: bool) -> [u8; BUFFER_SIZE] {
    let mut buffer = [0u8; BUFFER_SIZE];
    // Index 0 is the HID report ID and stays zero.
    buffer[1] = PANEL_SIGNATURE;
    buffer[2] = Command::Backlight as u8;
    buffer[3] = if on { 0x01 } else { 0x00 };
    buffer
}

/// Builds one blit chunk packet for the frame at `pixel_data`.
///
/// `chunk_index` selects which 4096-byte slice of the frame is carried; the
/// final chunk is short (`FINAL_CHUNK_SIZE`). Pixels are sent big-endian.
pub fn build_blit_chunk(chunk_index: usize, pixel_data: &[u16]) -> [u8; BUFFER_SIZE] {
    let mut buffer = [0u8; BUFFER_SIZE];
    buffer[1] = PANEL_SIGNATURE;
    buffer[2] = Command::Blit as u8;

    let phase = match chunk_index {
        0 => BlitPhase::Start,
        i if i == CHUNK_COUNT - 1 => BlitPhase::End,
        _ => BlitPhase::Continue,
    };
    buffer[3] = phase as u8;

    // Sequence number (1-based, little-endian; chunk count exceeds a byte)
    let seq = (chunk_index + 1) as u16;
    buffer[4] = (seq & 0xFF) as u8;
    buffer[5] = (seq >> 8) as u8;

    let chunk_size = if chunk_index == CHUNK_COUNT - 1 {
        FINAL_CHUNK_SIZE
    } else {
        DATA_SIZE
    };

    // Byte offset into the frame (little-endian u24) and chunk length
    let byte_offset = chunk_index * DATA_SIZE;
    buffer[6] = (byte_offset & 0xFF) as u8;
    buffer[7] = ((byte_offset >> 8) & 0xFF) as u8;
    buffer[8] = ((byte_offset >> 16) & 0xFF) as u8;
    buffer[9] = (chunk_size >> 8) as u8;
    buffer[10] = (chunk_size & 0xFF) as u8;

    // Pixel data, big-endian
    let pixel_offset = byte_offset / 2;
    let data_start = REPORT_SIZE + HEADER_SIZE;
    for i in 0..chunk_size / 2 {
        let pixel_idx = pixel_offset + i;
        if pixel_idx < pixel_data.len() {
            let pixel = pixel_data[pixel_idx];
            let offset = data_start + i * 2;
            buffer[offset] = (pixel >> 8) as u8;
            buffer[offset + 1] = (pixel & 0xFF) as u8;
        }
    }

    buffer
}

/// Parses an input report into touches and button states.
///
/// An empty read (no report pending) is reported as the default `Input`.
pub fn parse_input_report(report: &[u8]) -> Result<Input> {
    if report.is_empty() {
        return Ok(Input::default());
    }
    if report.len() < 3 || report[0] != INPUT_REPORT_ID {
        return Err(Error::MalformedReport(report.len()));
    }

    let flags = report[1];
    let count = (report[2] as usize).min(MAX_TOUCH_POINTS);
    if report.len() < 3 + count * 4 {
        return Err(Error::MalformedReport(report.len()));
    }

    let mut touches = Vec::with_capacity(count);
    for i in 0..count {
        let base = 3 + i * 4;
        let x = u16::from_le_bytes([report[base], report[base + 1]]) as i32;
        let y = u16::from_le_bytes([report[base + 2], report[base + 3]]) as i32;
        touches.push(TouchPoint { x, y });
    }

    Ok(Input {
        touches,
        button_up: flags & 0x01 != 0,
        button_down: flags & 0x02 != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backlight_packet() {
        let packet = build_backlight_packet(true);
        assert_eq!(packet[1], PANEL_SIGNATURE);
        assert_eq!(packet[2], Command::Backlight as u8);
        assert_eq!(packet[3], 0x01);

        let packet = build_backlight_packet(false);
        assert_eq!(packet[3], 0x00);
    }

    #[test]
    fn test_chunk_geometry() {
        assert_eq!(FRAME_BYTES, 524800);
        assert_eq!(CHUNK_COUNT, 129);
        assert_eq!(FINAL_CHUNK_SIZE, 512);
    }

    #[test]
    fn test_blit_chunk_layout() {
        let frame = vec![0xABCDu16; FRAME_BYTES / 2];

        let first = build_blit_chunk(0, &frame);
        assert_eq!(first[1], PANEL_SIGNATURE);
        assert_eq!(first[2], Command::Blit as u8);
        assert_eq!(first[3], BlitPhase::Start as u8);
        assert_eq!(first[4], 1);
        assert_eq!(first[5], 0);
        // Big-endian pixel data
        assert_eq!(first[REPORT_SIZE + HEADER_SIZE], 0xAB);
        assert_eq!(first[REPORT_SIZE + HEADER_SIZE + 1], 0xCD);

        let last = build_blit_chunk(CHUNK_COUNT - 1, &frame);
        assert_eq!(last[3], BlitPhase::End as u8);
        let seq = u16::from_le_bytes([last[4], last[5]]);
        assert_eq!(seq as usize, CHUNK_COUNT);
        let len = ((last[9] as usize) << 8) | last[10] as usize;
        assert_eq!(len, FINAL_CHUNK_SIZE);
    }

    #[test]
    fn test_parse_input_report() {
        // Two touches, button up pressed
        let report = [
            INPUT_REPORT_ID,
            0x01,
            2,
            0x10,
            0x00,
            0x20,
            0x00,
            0x34,
            0x01,
            0x0A,
            0x03,
        ];
        let input = parse_input_report(&report).unwrap();
        assert!(input.button_up);
        assert!(!input.button_down);
        assert_eq!(input.touches.len(), 2);
        assert_eq!(input.touches[0], TouchPoint { x: 0x10, y: 0x20 });
        assert_eq!(input.touches[1], TouchPoint { x: 0x134, y: 0x30A });
    }

    #[test]
    fn test_parse_empty_and_malformed() {
        assert!(parse_input_report(&[]).unwrap().touches.is_empty());
        assert!(parse_input_report(&[0xFF, 0, 0]).is_err());
        // Declares 3 points but carries only one
        assert!(parse_input_report(&[INPUT_REPORT_ID, 0, 3, 1, 0, 2, 0]).is_err());
    }
}

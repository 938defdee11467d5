//! Line-oriented erase-and-redraw output.

use std::io::{self, Write};

use crate::data::FrameHeight;
use crate::term::{TermCaps, TermError};

/// Erases the lines of the previous frame and rehomes the cursor.
///
/// ## Example
///
/// ```rust
/// use tmv::{FrameHeight, ScreenEraser};
///
/// let eraser = ScreenEraser::new(b"<el>".to_vec(), b"<up>".to_vec());
/// let mut out = Vec::new();
///
/// eraser.erase_and_rehome(&mut out, FrameHeight::new(3)).unwrap();
/// assert_eq!(out, b"\r<el><up><el><up><el>");
///
/// // Nothing to erase, nothing written.
/// out.clear();
/// eraser.erase_and_rehome(&mut out, FrameHeight::ZERO).unwrap();
/// assert!(out.is_empty());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScreenEraser {
    /// Clear to end of line
    clr_eol: Vec<u8>,
    /// Cursor up one line
    cursor_up: Vec<u8>,
}

impl ScreenEraser {
    /// Create an eraser from raw control sequences.
    pub fn new(clr_eol: Vec<u8>, cursor_up: Vec<u8>) -> Self {
        Self { clr_eol, cursor_up }
    }

    /// Create an eraser from terminal capabilities.
    pub fn from_caps(caps: &TermCaps) -> Result<Self, TermError> {
        match (&caps.clr_eol, &caps.cursor_up) {
            (Some(el), Some(up)) => Ok(Self::new(el.clone(), up.clone())),
            _ => Err(TermError::MissingCapabilities {
                term: caps.term.clone(),
            }),
        }
    }

    /// Blank the last `height` lines, including the current one, and leave
    /// the cursor at the start of the topmost of them.
    pub fn erase_and_rehome<W: Write + ?Sized>(
        &self,
        out: &mut W,
        height: FrameHeight,
    ) -> io::Result<()> {
        let lines = height.lines();
        if lines == 0 {
            return Ok(());
        }

        // Clear whole lines, not just what follows the cursor
        out.write_all(b"\r")?;
        out.write_all(&self.clr_eol)?;
        for _ in 1..lines {
            out.write_all(&self.cursor_up)?;
            out.write_all(&self.clr_eol)?;
        }
        Ok(())
    }
}

/// Draw one content line of a frame and count it in `height`.
///
/// Lines after the first are moved down to with a line break; every line
/// starts at column zero.
pub fn draw_line<W: Write + ?Sized>(
    out: &mut W,
    line: &[u8],
    height: &mut FrameHeight,
) -> io::Result<()> {
    if !height.is_empty() {
        out.write_all(b"\n")?;
    }
    out.write_all(b"\r")?;
    out.write_all(line)?;
    height.increment();
    Ok(())
}

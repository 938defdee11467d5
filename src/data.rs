//! Core data structures for frame delimiting.

/// The line that delimits frames for one playback pass.
///
/// Captured from the first line of the stream and compared byte for byte
/// (after truncation) against every following line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Separator {
    bytes: Vec<u8>,
}

impl Separator {
    /// Create a separator from the bytes of a line.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Replace the separator with a newly read line, reusing the allocation.
    pub fn set(&mut self, line: &[u8]) {
        self.bytes.clear();
        self.bytes.extend_from_slice(line);
    }

    /// Check if `line` closes the current frame.
    #[inline]
    pub fn matches(&self, line: &[u8]) -> bool {
        self.bytes.len() == line.len() && self.bytes == line
    }

    /// Raw bytes of the separator.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Number of lines drawn for the frame currently on screen.
///
/// The count saturates at `u32::MAX`. Lines past that are still drawn but
/// not counted, so such a frame is under-erased on the next redraw.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct FrameHeight(u32);

impl FrameHeight {
    /// Height of a frame with no lines drawn yet.
    pub const ZERO: Self = Self(0);

    /// Create a height from a line count.
    #[inline]
    pub const fn new(lines: u32) -> Self {
        Self(lines)
    }

    /// Count one more drawn line.
    #[inline]
    pub fn increment(&mut self) {
        self.0 = self.0.saturating_add(1);
    }

    /// Forget the drawn lines once they have been erased.
    #[inline]
    pub fn reset(&mut self) {
        self.0 = 0;
    }

    /// Number of counted lines.
    #[inline]
    pub fn lines(self) -> u32 {
        self.0
    }

    /// Check if no line has been drawn.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

//! Terminal capabilities and cursor-visibility lifecycle.

use std::io::{self, BufWriter, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossterm::cursor::{Hide, MoveUp, Show};
use crossterm::terminal::{Clear, ClearType};
use crossterm::Command;

use crate::player::PlaybackEnd;

/// Error type for terminal setup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TermError {
    /// Erase-to-end-of-line or cursor-up is unavailable
    #[error("terminal {term:?} lacks the erase-to-end-of-line and cursor-up capabilities")]
    MissingCapabilities { term: String },
}

/// Control sequences used during playback.
///
/// Each capability is optional; [`ScreenEraser::from_caps`](crate::ScreenEraser::from_caps)
/// checks the two that playback cannot do without.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TermCaps {
    /// Terminal name the capabilities were selected for
    pub term: String,
    /// Clear from the cursor to the end of the line
    pub clr_eol: Option<Vec<u8>>,
    /// Move the cursor up one line
    pub cursor_up: Option<Vec<u8>>,
    /// Hide the cursor
    pub cursor_invisible: Option<Vec<u8>>,
    /// Make the cursor visible again
    pub cursor_normal: Option<Vec<u8>>,
}

fn ansi<C: Command>(command: C) -> Option<Vec<u8>> {
    let mut seq = String::new();
    command.write_ansi(&mut seq).ok()?;
    Some(seq.into_bytes())
}

impl TermCaps {
    /// ANSI / VT100 control sequences.
    pub fn ansi(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            clr_eol: ansi(Clear(ClearType::UntilNewLine)),
            cursor_up: ansi(MoveUp(1)),
            cursor_invisible: ansi(Hide),
            cursor_normal: ansi(Show),
        }
    }

    /// Capabilities for a terminal name as found in `TERM`.
    ///
    /// Unknown-but-named terminals are assumed to speak ANSI. An unset,
    /// empty or `dumb` terminal has no capabilities.
    pub fn for_term(term: Option<&str>) -> Self {
        match term.map(str::trim) {
            None | Some("") | Some("dumb") => Self {
                term: term.unwrap_or_default().to_string(),
                ..Self::default()
            },
            Some(name) => Self::ansi(name),
        }
    }

    /// Capabilities for the terminal named by the `TERM` environment variable.
    pub fn from_env() -> Self {
        let term = std::env::var("TERM").ok();
        Self::for_term(term.as_deref())
    }

    /// Check if the cursor can be both hidden and shown again.
    #[inline]
    pub fn can_hide_cursor(&self) -> bool {
        self.cursor_invisible.is_some() && self.cursor_normal.is_some()
    }
}

/// Cursor state for the duration of playback.
///
/// Clones share the restore flag, so the terminal is restored once no
/// matter how many exit paths race to do it.
#[derive(Clone, Debug)]
pub struct TerminalSession {
    /// Sequence to show the cursor, if it was hidden
    cursor_normal: Option<Vec<u8>>,
    restored: Arc<AtomicBool>,
}

impl TerminalSession {
    /// Hide the cursor if the terminal supports hiding and showing it.
    pub fn begin<W: Write>(caps: &TermCaps, out: &mut W) -> io::Result<Self> {
        let cursor_normal = if caps.can_hide_cursor() {
            out.write_all(caps.cursor_invisible.as_deref().unwrap_or_default())?;
            caps.cursor_normal.clone()
        } else {
            None
        };
        Ok(Self {
            cursor_normal,
            restored: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Check if the cursor was hidden by [`begin`](Self::begin).
    #[inline]
    pub fn hid_cursor(&self) -> bool {
        self.cursor_normal.is_some()
    }

    /// Check if the terminal has already been restored.
    #[inline]
    pub fn is_restored(&self) -> bool {
        self.restored.load(Ordering::SeqCst)
    }

    /// Show the cursor again and flush `out`.
    ///
    /// Only the first call across all clones writes anything; later calls
    /// return `Ok(false)`.
    pub fn restore<W: Write>(&self, out: &mut W) -> io::Result<bool> {
        if self.restored.swap(true, Ordering::SeqCst) {
            return Ok(false);
        }
        if let Some(show) = &self.cursor_normal {
            out.write_all(show)?;
        }
        out.flush()?;
        Ok(true)
    }

    /// Close the session once playback has ended.
    ///
    /// After a normal end or a read failure the buffered frame is flushed
    /// before the cursor is shown. After termination or an output failure
    /// the unflushed bytes are dropped, so no partial frame reaches the
    /// terminal.
    pub fn finish<W: Write>(&self, end: &PlaybackEnd, mut out: BufWriter<W>) -> io::Result<bool> {
        match end {
            PlaybackEnd::Finished | PlaybackEnd::ReadFailed(_) => self.restore(&mut out),
            PlaybackEnd::Terminated | PlaybackEnd::OutputFailed(_) => {
                let (mut inner, unflushed) = out.into_parts();
                if let Ok(bytes) = &unflushed {
                    log::debug!("dropping {} unflushed byte(s)", bytes.len());
                }
                self.restore(&mut inner)
            }
        }
    }
}

//! Movie playback state machine.
//!
//! The player pulls lines from a [`MovieSource`], splits them into frames
//! with the pass separator, draws each frame in place and holds it on
//! screen for at least one pacing tick:
//!
//! ```text
//! AwaitSeparator -> AccumulatingFrame <-> FrameBoundary -> AwaitSeparator | Done
//! ```

use std::io::{self, Write};

use crate::config::{LoopMode, PlayerConfig};
use crate::data::{FrameHeight, Separator};
use crate::line::{BoundedLineReader, ReadError, ReadOutcome};
use crate::pacer::FramePacer;
use crate::render::{self, ScreenEraser};
use crate::source::MovieSource;
use crate::termination::Termination;

/// Where the player is within a pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerState {
    /// Waiting for the first line of a pass
    AwaitSeparator,
    /// Drawing content lines of the current frame
    AccumulatingFrame,
    /// Holding a finished frame before erasing it
    FrameBoundary,
    /// Playback is over
    Done,
}

/// Why playback stopped.
///
/// None of these is a failure of the program: the caller reports read
/// and output errors but still exits successfully.
#[derive(Debug)]
pub enum PlaybackEnd {
    /// The movie ended and no further pass was requested or possible
    Finished,
    /// Termination was requested
    Terminated,
    /// The input could not be read
    ReadFailed(ReadError),
    /// The output could not be written
    OutputFailed(io::Error),
}

/// Summary of a [`MoviePlayer::play`] run.
#[derive(Debug)]
pub struct PlaybackReport {
    /// Why playback stopped
    pub end: PlaybackEnd,
    /// Number of passes played to the end of the stream
    pub passes: u64,
    /// Number of frames held on screen
    pub frames: u64,
}

/// Internal early exit from a pass.
enum Stop {
    Terminated,
    Read(ReadError),
    Output(io::Error),
}

impl From<io::Error> for Stop {
    fn from(err: io::Error) -> Self {
        Stop::Output(err)
    }
}

/// Plays a text movie to a writer.
///
/// ## Example
///
/// ```rust
/// use std::io::Cursor;
/// use tmv::{MoviePlayer, PlaybackEnd, PlayerConfig, ScreenEraser, Termination};
///
/// let config = PlayerConfig { delay_ms: 0, ..Default::default() };
/// let eraser = ScreenEraser::new(b"<el>".to_vec(), b"<up>".to_vec());
/// let mut player = MoviePlayer::new(Vec::new(), eraser, &config, Termination::new());
///
/// let mut movie = Cursor::new(b"--\nA\nB\n--\nC\n".to_vec());
/// let report = player.play(&mut movie);
///
/// assert!(matches!(report.end, PlaybackEnd::Finished));
/// assert_eq!(report.frames, 2);
/// assert_eq!(player.output(), b"\rA\n\rB\r<el><up><el>\rC");
/// ```
#[derive(Debug)]
pub struct MoviePlayer<W: Write> {
    out: W,
    eraser: ScreenEraser,
    pacer: FramePacer,
    termination: Termination,
    loop_mode: LoopMode,
    /// Line buffer shared by every read
    reader: BoundedLineReader,
    separator: Separator,
    /// Lines of the frame currently on screen
    frame_height: FrameHeight,
    state: PlayerState,
    passes: u64,
    frames: u64,
}

impl<W: Write> MoviePlayer<W> {
    /// Create a player writing to `out`.
    pub fn new(
        out: W,
        eraser: ScreenEraser,
        config: &PlayerConfig,
        termination: Termination,
    ) -> Self {
        Self {
            out,
            eraser,
            pacer: FramePacer::new(config.frame_delay()),
            termination,
            loop_mode: config.loop_mode,
            reader: BoundedLineReader::new(),
            separator: Separator::default(),
            frame_height: FrameHeight::ZERO,
            state: PlayerState::AwaitSeparator,
            passes: 0,
            frames: 0,
        }
    }

    /// Use a custom line reader, e.g. with a different length limit.
    pub fn with_reader(mut self, reader: BoundedLineReader) -> Self {
        self.reader = reader;
        self
    }

    /// Get the current state.
    #[inline]
    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// Height of the frame currently on screen.
    #[inline]
    pub fn frame_height(&self) -> FrameHeight {
        self.frame_height
    }

    /// Get the output written so far.
    #[inline]
    pub fn output(&self) -> &W {
        &self.out
    }

    /// Take back the output writer.
    pub fn into_output(self) -> W {
        self.out
    }

    /// Play `source` until it ends, fails or termination is requested.
    ///
    /// With [`LoopMode::Loop`] the source is rewound after every pass; a
    /// source that cannot rewind simply ends playback.
    pub fn play<S: MovieSource + ?Sized>(&mut self, source: &mut S) -> PlaybackReport {
        if !self.pacer.is_armed() {
            self.pacer.arm();
        }

        let end = match self.run(source) {
            Ok(()) => PlaybackEnd::Finished,
            Err(Stop::Terminated) => PlaybackEnd::Terminated,
            Err(Stop::Read(err)) => PlaybackEnd::ReadFailed(err),
            Err(Stop::Output(err)) => PlaybackEnd::OutputFailed(err),
        };
        self.state = PlayerState::Done;

        PlaybackReport {
            end,
            passes: self.passes,
            frames: self.frames,
        }
    }

    fn run<S: MovieSource + ?Sized>(&mut self, source: &mut S) -> Result<(), Stop> {
        loop {
            self.play_pass(source)?;
            self.passes += 1;

            if self.loop_mode != LoopMode::Loop {
                return Ok(());
            }
            if let Err(err) = source.rewind_movie() {
                log::warn!("cannot rewind input, stopping: {err}");
                return Ok(());
            }
            log::debug!("rewound input for pass {}", self.passes + 1);
        }
    }

    fn play_pass<S: MovieSource + ?Sized>(&mut self, source: &mut S) -> Result<(), Stop> {
        self.state = PlayerState::AwaitSeparator;
        // The last frame of the previous pass is still on screen
        self.eraser.erase_and_rehome(&mut self.out, self.frame_height)?;
        self.frame_height.reset();

        if self.read(source, "separator")? == ReadOutcome::EndOfStream {
            log::debug!("empty pass");
            return self.hold_frame();
        }
        self.separator.set(self.reader.line());
        self.state = PlayerState::AccumulatingFrame;

        loop {
            match self.read(source, "line")? {
                ReadOutcome::EndOfStream => {
                    if !self.frame_height.is_empty() {
                        self.frames += 1;
                    }
                    return self.hold_frame();
                }
                ReadOutcome::Line if self.separator.matches(self.reader.line()) => {
                    self.state = PlayerState::FrameBoundary;
                    self.frames += 1;
                    self.hold_frame()?;
                    self.eraser.erase_and_rehome(&mut self.out, self.frame_height)?;
                    self.frame_height.reset();
                    self.state = PlayerState::AccumulatingFrame;
                }
                ReadOutcome::Line => {
                    render::draw_line(&mut self.out, self.reader.line(), &mut self.frame_height)?;
                }
            }
        }
    }

    /// Read one line, giving a termination request priority over whatever
    /// the read returned.
    fn read<S: MovieSource + ?Sized>(
        &mut self,
        source: &mut S,
        what: &str,
    ) -> Result<ReadOutcome, Stop> {
        let result = self.reader.read_line(source);
        if self.termination.is_requested() {
            return Err(Stop::Terminated);
        }
        result.map_err(|err| {
            log::error!("failed to read {what}: {err}");
            Stop::Read(err)
        })
    }

    /// Show the frame drawn so far and keep it up until the next tick.
    fn hold_frame(&mut self) -> Result<(), Stop> {
        self.out.flush()?;
        self.pacer.wait_for_next_tick(&self.termination);
        if self.termination.is_requested() {
            return Err(Stop::Terminated);
        }
        Ok(())
    }
}

//! # tmv
//!
//! Terminal movie player: plays a text movie made of full-screen ASCII
//! frames, drawing each frame over the previous one in place.
//!
//! This crate provides the playback engine:
//! - Reading lines of raw bytes with a bounded per-line memory footprint
//! - Splitting the line stream into frames with a self-selected separator
//! - Holding each frame for a minimum duration without cumulative drift
//! - Erasing exactly the lines of the previous frame before redrawing
//!
//! ## Movie format
//!
//! The first line of the stream is the separator. Every following line is
//! frame content until a line equal to the separator appears, which ends
//! the current frame and starts the next one. The end of the stream ends
//! the last frame.
//!
//! ```text
//! ---
//!  o
//! /|\
//! ---
//! \o/
//!  |
//! ```
//!
//! ## Features
//!
//! - `serde` - Enable serialization/deserialization for the configuration
//! - `toml` - Enable TOML config files (on by default)
//!
//! ## Example
//!
//! ```rust,ignore
//! use tmv::{MoviePlayer, PlayerConfig, ScreenEraser, Source, TermCaps, Termination};
//!
//! let caps = TermCaps::from_env();
//! let mut source = Source::open("movie.txt".as_ref())?;
//!
//! let mut player = MoviePlayer::new(
//!     std::io::stdout(),
//!     ScreenEraser::from_caps(&caps)?,
//!     &PlayerConfig::default(),
//!     Termination::new(),
//! );
//! let report = player.play(&mut source);
//! println!("{} frames", report.frames);
//! ```

mod config;
mod data;
mod line;
mod pacer;
mod player;
pub mod render;
mod source;
mod term;
mod termination;

pub use config::{ConfigError, LoopMode, PlayerConfig, DEFAULT_DELAY_MS, MAX_DELAY_MS};
pub use data::{FrameHeight, Separator};
pub use line::{grown_capacity, BoundedLineReader, ReadError, ReadOutcome, MAX_LINE_LEN};
pub use pacer::FramePacer;
pub use player::{MoviePlayer, PlaybackEnd, PlaybackReport, PlayerState};
pub use render::ScreenEraser;
pub use source::{MovieSource, Source, Unseekable};
pub use term::{TermCaps, TermError, TerminalSession};
pub use termination::{Sleep, Termination, SHUTDOWN_GRACE};

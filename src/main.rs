//! tmv CLI - play a text movie in the terminal.

use std::fs;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tmv::{
    LoopMode, MovieSource, MoviePlayer, PlaybackEnd, PlayerConfig, ScreenEraser, Source,
    TermCaps, TerminalSession, Termination, MAX_DELAY_MS,
};

/// Output is flushed explicitly at frame boundaries; the buffer only needs
/// to hold a typical frame.
const OUTPUT_BUFFER: usize = 64 * 1024;

#[derive(Debug, Parser)]
#[command(
    name = "tmv",
    about = "Play a text movie of separator-delimited frames in the terminal",
    disable_version_flag = true,
    after_help = "If FILE is not given or is '-', the movie is read from standard input.\n\
                  The first line of the movie is the separator between frames."
)]
struct Cli {
    /// Delay a minimum of MS milliseconds between frames. The player may
    /// wait longer if reading or writing a frame takes too long [default: 100]
    #[arg(short = 'd', long = "delay", value_name = "MS",
          value_parser = clap::value_parser!(u64).range(0..=MAX_DELAY_MS))]
    delay: Option<u64>,

    /// Loop the animation. Requires that the input be seekable (this
    /// usually excludes a pipe on standard input)
    #[arg(short = 'l', long = "loop", overrides_with = "no_loop")]
    looping: bool,

    /// Do not loop. This is the default
    #[arg(short = 'L', long = "no-loop", overrides_with = "looping")]
    no_loop: bool,

    /// Read default settings from a TOML file
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print program version
    #[arg(short = 'v', long = "version")]
    version: bool,

    /// Movie to play
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,
}

impl Cli {
    /// Merge the config file (if any) with command-line overrides.
    fn player_config(&self) -> Result<PlayerConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => PlayerConfig::default(),
        };
        if let Some(delay) = self.delay {
            config.delay_ms = delay;
        }
        if self.looping {
            config.loop_mode = LoopMode::Loop;
        } else if self.no_loop {
            config.loop_mode = LoopMode::Once;
        }
        config.validate()?;
        Ok(config)
    }
}

fn load_config(path: &Path) -> Result<PlayerConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read config file {}", path.display()))?;
    PlayerConfig::from_toml_str(&text)
        .with_context(|| format!("cannot load config file {}", path.display()))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                eprintln!("Run 'tmv -h' for more help.");
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if cli.version {
        println!("tmv version {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("tmv: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Set up the terminal and input, then play.
///
/// Only setup failures are returned as errors. Once playback starts every
/// outcome, including read errors and termination, is a success.
fn run(cli: &Cli) -> Result<()> {
    let caps = TermCaps::from_env();
    let eraser = ScreenEraser::from_caps(&caps)?;
    let config = cli.player_config()?;

    let input = cli.input.clone().unwrap_or_else(|| PathBuf::from("-"));
    let mut source = Source::open(&input)
        .with_context(|| format!("cannot open file {}", input.display()))?;
    if config.loops() {
        source
            .rewind_movie()
            .context("-l requires that the input be seekable")?;
    }

    let mut out = BufWriter::with_capacity(OUTPUT_BUFFER, io::stdout());
    let session = TerminalSession::begin(&caps, &mut out).context("cannot write to the terminal")?;

    let termination = Termination::new();
    let emergency = session.clone();
    termination
        .install_signal_handlers(move || {
            let _ = emergency.restore(&mut io::stdout());
            std::process::exit(0);
        })
        .context("cannot install signal handlers")?;

    log::debug!(
        "playing {} with delay {}ms, {:?}",
        input.display(),
        config.delay_ms,
        config.loop_mode
    );
    let mut player = MoviePlayer::new(out, eraser, &config, termination.clone());
    let report = player.play(&mut source);
    log::info!(
        "played {} frame(s) over {} pass(es)",
        report.frames,
        report.passes
    );

    if let PlaybackEnd::OutputFailed(err) = &report.end {
        log::warn!("output failed: {err}");
    }
    if let Err(err) = session.finish(&report.end, player.into_output()) {
        log::warn!("cannot restore the terminal: {err}");
    }
    termination.mark_finished();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write as _;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_original_flags() {
        let cli = Cli::try_parse_from(["tmv", "-d", "40", "-l", "movie.txt"]).unwrap();
        assert_eq!(cli.delay, Some(40));
        assert!(cli.looping);
        assert_eq!(cli.input, Some(PathBuf::from("movie.txt")));

        let config = cli.player_config().unwrap();
        assert_eq!(config.delay_ms, 40);
        assert_eq!(config.loop_mode, LoopMode::Loop);
    }

    #[test]
    fn last_loop_flag_wins() {
        let cli = Cli::try_parse_from(["tmv", "-l", "-L"]).unwrap();
        assert_eq!(cli.player_config().unwrap().loop_mode, LoopMode::Once);

        let cli = Cli::try_parse_from(["tmv", "-L", "-l"]).unwrap();
        assert_eq!(cli.player_config().unwrap().loop_mode, LoopMode::Loop);
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(Cli::try_parse_from(["tmv", "-d", "2100001"]).is_err());
        assert!(Cli::try_parse_from(["tmv", "-d", "-5"]).is_err());
        assert!(Cli::try_parse_from(["tmv", "-d", "12ms"]).is_err());
        assert!(Cli::try_parse_from(["tmv", "a.txt", "b.txt"]).is_err());
        assert!(Cli::try_parse_from(["tmv", "-d", "2100000"]).is_ok());
    }

    #[test]
    fn command_line_overrides_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "delay_ms = 250\nloop = \"loop\"").unwrap();
        let path = file.path().to_str().unwrap();

        let cli = Cli::try_parse_from(["tmv", "-c", path]).unwrap();
        let config = cli.player_config().unwrap();
        assert_eq!(config.delay_ms, 250);
        assert!(config.loops());

        let cli = Cli::try_parse_from(["tmv", "-c", path, "-d", "0", "-L"]).unwrap();
        let config = cli.player_config().unwrap();
        assert_eq!(config.delay_ms, 0);
        assert!(!config.loops());
    }
}

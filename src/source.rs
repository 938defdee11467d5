//! Movie input sources.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Seek, SeekFrom};
use std::path::Path;

/// A readable movie stream that may be able to start over.
pub trait MovieSource: BufRead {
    /// Seek back to the first byte of the movie.
    ///
    /// Sources that cannot seek return an error; callers that do not loop
    /// may ignore it.
    fn rewind_movie(&mut self) -> io::Result<()>;
}

impl<T: AsRef<[u8]>> MovieSource for Cursor<T> {
    fn rewind_movie(&mut self) -> io::Result<()> {
        self.set_position(0);
        Ok(())
    }
}

impl MovieSource for BufReader<File> {
    fn rewind_movie(&mut self) -> io::Result<()> {
        self.seek(SeekFrom::Start(0)).map(drop)
    }
}

/// Wraps a reader that can never rewind, such as a pipe.
#[derive(Debug)]
pub struct Unseekable<R>(pub R);

impl<R: io::Read> io::Read for Unseekable<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl<R: BufRead> BufRead for Unseekable<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.0.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.0.consume(amt)
    }
}

impl<R: BufRead> MovieSource for Unseekable<R> {
    fn rewind_movie(&mut self) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "input is not seekable",
        ))
    }
}

/// The movie input selected on the command line.
#[derive(Debug)]
pub enum Source {
    /// A named file, or standard input duplicated as a file
    File(BufReader<File>),
    /// Standard input where it cannot be opened as a file
    Stdin(Unseekable<BufReader<io::Stdin>>),
}

impl Source {
    /// Open `path`, where `-` means standard input.
    pub fn open(path: &Path) -> io::Result<Self> {
        if path.as_os_str() == "-" {
            Self::stdin()
        } else {
            Ok(Source::File(BufReader::new(File::open(path)?)))
        }
    }

    /// Standard input. On unix it is opened through its file descriptor so a
    /// redirected regular file stays seekable.
    #[cfg(unix)]
    pub fn stdin() -> io::Result<Self> {
        use std::os::fd::AsFd;

        let fd = io::stdin().as_fd().try_clone_to_owned()?;
        Ok(Source::File(BufReader::new(File::from(fd))))
    }

    #[cfg(not(unix))]
    pub fn stdin() -> io::Result<Self> {
        Ok(Source::Stdin(Unseekable(BufReader::new(io::stdin()))))
    }
}

impl io::Read for Source {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Source::File(r) => r.read(buf),
            Source::Stdin(r) => r.read(buf),
        }
    }
}

impl BufRead for Source {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self {
            Source::File(r) => r.fill_buf(),
            Source::Stdin(r) => r.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            Source::File(r) => r.consume(amt),
            Source::Stdin(r) => r.consume(amt),
        }
    }
}

impl MovieSource for Source {
    fn rewind_movie(&mut self) -> io::Result<()> {
        match self {
            Source::File(r) => r.rewind_movie(),
            Source::Stdin(r) => r.rewind_movie(),
        }
    }
}

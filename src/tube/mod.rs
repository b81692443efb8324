//! Blocking byte streams to a target program, either a local process or a TCP
//! service. Both implement [`Tube`] so exploit code can be written once and pointed
//! at either.
pub mod forward;
pub mod process;
pub mod remote;

pub use forward::*;
pub use process::*;
pub use remote::*;

use crate::error::{Error, Result};
use crate::utils::{self, HexdumpLabels};
use std::io::{self, Read};
use std::time::Duration;

/// Size of the buffer used by [`Tube::recv`].
pub const RECV_SIZE: usize = 4096;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
pub enum LogLevel {
    /// Only warnings.
    #[default]
    Quiet,

    /// Also spawns, connects, and closes.
    Info,

    /// Also a hex dump of every buffer sent or received.
    Debug,
}

#[derive(Clone, Debug)]
pub struct Options {
    /// Applies to connecting and to each network send or receive. Zero means wait
    /// forever. Processes ignore this.
    pub timeout: Duration,

    /// Appended by send_line and stripped by recv_line.
    pub newline: Vec<u8>,

    pub log_level: LogLevel,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            timeout: Duration::from_secs(30),
            newline: b"\n".to_vec(),
            log_level: LogLevel::Quiet,
        }
    }
}

impl Options {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_newline(mut self, newline: &[u8]) -> Self {
        self.newline = newline.to_vec();
        self
    }

    pub fn with_log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }
}

/// The operations every tube supports. All of them fail with
/// [`Error::ClosedSession`] once the tube has been closed.
pub trait Tube {
    fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Sends data followed by the newline from the options.
    fn send_line(&mut self, data: &[u8]) -> Result<()> {
        let mut line = data.to_vec();
        line.extend_from_slice(&self.options().newline);
        self.send(&line)
    }

    /// Does one read of up to [`RECV_SIZE`] bytes.
    fn recv(&mut self) -> Result<Vec<u8>>;

    /// Reads until n bytes arrive. If the stream ends or errors part way through, the
    /// bytes read so far are returned. Zero means the same as recv.
    fn recv_n(&mut self, n: usize) -> Result<Vec<u8>>;

    /// Reads up to the next newline. The newline is not included.
    fn recv_line(&mut self) -> Result<Vec<u8>>;

    /// Reads up to and including delim.
    fn recv_until(&mut self, delim: &[u8]) -> Result<Vec<u8>>;

    /// Reads until the other side closes its end, ignoring the timeout.
    fn recv_all(&mut self) -> Result<Vec<u8>>;

    /// Hands the tube over to the user's terminal until either side is done.
    fn interactive(&mut self) -> Result<()>;

    /// Releases the process or connection. Closing twice is an error.
    fn close(&mut self) -> Result<()>;

    fn options(&self) -> &Options;

    fn set_timeout(&mut self, timeout: Duration);

    fn is_open(&self) -> bool;
}

/// Bookkeeping shared by the tube kinds.
#[derive(Debug)]
pub struct TubeState {
    pub options: Options,
    closed: bool,
}

impl TubeState {
    pub fn new(options: Options) -> Self {
        TubeState {
            options,
            closed: false,
        }
    }

    pub fn is_open(&self) -> bool {
        !self.closed
    }

    pub fn check_open(&self) -> Result<()> {
        if self.closed {
            Err(Error::ClosedSession)
        } else {
            Ok(())
        }
    }

    /// The one transition a tube makes.
    pub fn mark_closed(&mut self) -> Result<()> {
        self.check_open()?;
        self.closed = true;
        Ok(())
    }

    pub fn info(&self, mesg: &str) {
        if self.options.log_level >= LogLevel::Info {
            utils::trace(mesg);
        }
    }

    pub fn traffic(&self, what: &str, data: &[u8]) {
        if self.options.log_level >= LogLevel::Debug {
            utils::trace(&format!("{what} {:#x} bytes", data.len()));
            if !data.is_empty() {
                eprintln!("{}", utils::hexdump(data, 0, HexdumpLabels::Zero));
            }
        }
    }
}

fn end_of_stream() -> Error {
    Error::Io(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        "end of stream",
    ))
}

/// One read. An empty read means the other side is gone and is reported as an error.
pub(crate) fn read_once(source: &mut impl Read) -> Result<Vec<u8>> {
    let mut buf = vec![0; RECV_SIZE];
    loop {
        match source.read(&mut buf) {
            Ok(0) => return Err(end_of_stream()),
            Ok(n) => {
                buf.truncate(n);
                return Ok(buf);
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }
}

/// Reads n bytes, settling for fewer if the stream ends or errors after at least one
/// byte arrived.
pub(crate) fn read_up_to(source: &mut impl Read, n: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0; n];
    let mut total = 0;
    while total < n {
        match source.read(&mut buf[total..]) {
            Ok(0) if total > 0 => break,
            Ok(0) => return Err(end_of_stream()),
            Ok(count) => total += count,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) if total > 0 => break,
            Err(err) => return Err(err.into()),
        }
    }
    buf.truncate(total);
    Ok(buf)
}

/// Reads a byte at a time so that nothing past delim is consumed. Anything short of
/// the full delimiter is an error, partial results are dropped.
pub(crate) fn read_until(source: &mut impl Read, delim: &[u8]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    if delim.is_empty() {
        return Ok(buf);
    }

    let mut byte = [0u8; 1];
    loop {
        match source.read(&mut byte) {
            Ok(0) => return Err(end_of_stream()),
            Ok(_) => {
                buf.push(byte[0]);
                if buf.ends_with(delim) {
                    return Ok(buf);
                }
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }
}

pub(crate) fn read_line(source: &mut impl Read, newline: &[u8]) -> Result<Vec<u8>> {
    let mut line = read_until(source, newline)?;
    line.truncate(line.len() - newline.len());
    Ok(line)
}

pub(crate) fn read_all(source: &mut impl Read) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    source.read_to_end(&mut buf)?;
    Ok(buf)
}

/// A sink whose contents can still be read after it has been handed to a thread.
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct SharedSink(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

#[cfg(test)]
impl SharedSink {
    pub(crate) fn contents(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl io::Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

use crate::error::{Error, Result};
use crate::tube::{self, Forwarder, Options, Tube, TubeState};
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// How often the interactive copy thread wakes up to see whether it should stop.
const INTERACTIVE_POLL: Duration = Duration::from_millis(50);

/// A TCP connection. The timeout option bounds the connect and each individual send
/// or receive call.
pub struct Remote {
    state: TubeState,
    host: String,
    port: u16,
    stream: Option<TcpStream>,
}

impl Remote {
    pub fn new(host: &str, port: u16, options: Options) -> Result<Remote> {
        let address = format!("{host}:{port}");
        let stream = dial(&address, options.timeout)
            .map_err(|err| Error::construction(format!("connection to {address}"), err))?;

        let state = TubeState::new(options);
        state.info(&format!("connected to {address}"));
        Ok(Remote {
            state,
            host: host.to_string(),
            port,
            stream: Some(stream),
        })
    }

    /// host:port as given to new.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn stream(&mut self) -> Result<&mut TcpStream> {
        self.state.check_open()?;
        self.stream.as_mut().ok_or(Error::ClosedSession)
    }

    fn deadline(&self) -> Option<Duration> {
        let timeout = self.state.options.timeout;
        if timeout.is_zero() { None } else { Some(timeout) }
    }

    /// The stream with its read timeout set. None clears it.
    fn reader(&mut self, timeout: Option<Duration>) -> Result<&mut TcpStream> {
        let stream = self.stream()?;
        stream.set_read_timeout(timeout)?;
        Ok(stream)
    }

    /// Interactive mode with the terminal swapped out. The copy thread reads with a
    /// short timeout so it can be stopped before this returns, which leaves anything
    /// the peer sends afterwards for the next receive.
    pub(crate) fn interact_with<R, W>(&mut self, mut input: R, output: W) -> Result<()>
    where
        R: Read,
        W: Write + Send + 'static,
    {
        let stream = self.reader(Some(INTERACTIVE_POLL))?;
        stream.set_write_timeout(None)?;
        let incoming = stream.try_clone()?;
        let forwarder = Forwarder::spawn("socket", incoming, output)?;
        self.state.info(&format!("interacting with {}", self.address()));

        let mut buf = [0u8; tube::RECV_SIZE];
        let result = loop {
            if forwarder.is_finished() {
                break Ok(());
            }
            let n = match input.read(&mut buf) {
                Ok(0) => break Ok(()),
                Ok(n) => n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => break Err(err.into()),
            };
            let sent = self
                .stream()
                .and_then(|stream| Ok(stream.write_all(&buf[..n])?));
            match sent {
                Ok(()) => {}
                Err(Error::Io(err))
                    if matches!(
                        err.kind(),
                        io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset
                    ) =>
                {
                    break Ok(());
                }
                Err(err) => break Err(err),
            }
        };
        forwarder.join();
        result
    }

    fn received(&self, data: Vec<u8>) -> Vec<u8> {
        self.state.traffic("received", &data);
        data
    }
}

fn dial(address: &str, timeout: Duration) -> io::Result<TcpStream> {
    if timeout.is_zero() {
        return TcpStream::connect(address);
    }

    let mut last = None;
    for addr in address.to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(err) => last = Some(err),
        }
    }
    Err(last.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "address didn't resolve")
    }))
}

impl Tube for Remote {
    fn send(&mut self, data: &[u8]) -> Result<()> {
        let timeout = self.deadline();
        let stream = self.stream()?;
        stream.set_write_timeout(timeout)?;
        stream.write_all(data)?;
        self.state.traffic("sent", data);
        Ok(())
    }

    fn recv(&mut self) -> Result<Vec<u8>> {
        let timeout = self.deadline();
        let data = tube::read_once(self.reader(timeout)?)?;
        Ok(self.received(data))
    }

    fn recv_n(&mut self, n: usize) -> Result<Vec<u8>> {
        if n == 0 {
            return self.recv();
        }
        let timeout = self.deadline();
        let data = tube::read_up_to(self.reader(timeout)?, n)?;
        Ok(self.received(data))
    }

    fn recv_line(&mut self) -> Result<Vec<u8>> {
        let timeout = self.deadline();
        let newline = self.state.options.newline.clone();
        let data = tube::read_line(self.reader(timeout)?, &newline)?;
        Ok(self.received(data))
    }

    fn recv_until(&mut self, delim: &[u8]) -> Result<Vec<u8>> {
        let timeout = self.deadline();
        let data = tube::read_until(self.reader(timeout)?, delim)?;
        Ok(self.received(data))
    }

    fn recv_all(&mut self) -> Result<Vec<u8>> {
        let data = tube::read_all(self.reader(None)?)?;
        Ok(self.received(data))
    }

    /// Raw copy in both directions until our stdin ends or the peer stops sending.
    /// A peer that hangs up is only noticed before each read of stdin, so a read
    /// that is already waiting on the terminal finishes first.
    fn interactive(&mut self) -> Result<()> {
        self.interact_with(io::stdin().lock(), io::stdout())
    }

    fn close(&mut self) -> Result<()> {
        self.state.mark_closed()?;
        let Some(stream) = self.stream.take() else {
            return Ok(());
        };

        let result = match stream.shutdown(Shutdown::Both) {
            Err(err) if err.kind() != io::ErrorKind::NotConnected => Err(err.into()),
            _ => Ok(()),
        };
        self.state.info(&format!("closed connection to {}", self.address()));
        result
    }

    fn options(&self) -> &Options {
        &self.state.options
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.state.options.timeout = timeout;
    }

    fn is_open(&self) -> bool {
        self.state.is_open()
    }
}

impl Drop for Remote {
    fn drop(&mut self) {
        if self.is_open() {
            let _ = self.close();
        }
    }
}

use crate::error::{Error, Result};
use crate::tube::{self, Forwarder, Options, Tube, TubeState};
use crate::utils;
use std::ffi::OsStr;
use std::io::{self, BufRead, Write};
use std::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command, Stdio};
use std::thread;
use std::time::Duration;

const PROMPT: &str = "$ ";

/// Gives the child a chance to respond before the next prompt is printed.
const INTERACTIVE_PAUSE: Duration = Duration::from_millis(100);

/// How long close waits for the output forwarders once the child is gone.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// A local program with all three standard streams piped. Reads block until data
/// arrives: the timeout option doesn't apply here.
pub struct Process {
    state: TubeState,
    command: String,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    forwarders: Vec<Forwarder>,
}

impl Process {
    /// Spawns argv[0] with the remaining arguments and the current environment.
    pub fn new<S: AsRef<OsStr>>(argv: &[S], options: Options) -> Result<Process> {
        let command = argv
            .iter()
            .map(|a| a.as_ref().to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ");
        let what = format!("process `{command}`");
        let Some((program, args)) = argv.split_first() else {
            return Err(Error::construction(what, "no command"));
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| Error::construction(what.as_str(), err))?;
        let (stdin, stdout, stderr) = match (child.stdin.take(), child.stdout.take(), child.stderr.take()) {
            (Some(i), Some(o), Some(e)) => (i, o, e),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::construction(what, "standard streams weren't piped"));
            }
        };

        let state = TubeState::new(options);
        state.info(&format!("started {command} as pid {}", child.id()));
        Ok(Process {
            state,
            command,
            child,
            stdin: Some(stdin),
            stdout: Some(stdout),
            stderr: Some(stderr),
            forwarders: Vec::new(),
        })
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    fn stdout(&mut self) -> Result<&mut ChildStdout> {
        self.state.check_open()?;
        self.stdout.as_mut().ok_or_else(|| {
            Error::Io(io::Error::new(
                io::ErrorKind::Other,
                "stdout was handed to interactive mode",
            ))
        })
    }

    fn stdin(&mut self) -> Result<&mut ChildStdin> {
        self.state.check_open()?;
        self.stdin
            .as_mut()
            .ok_or_else(|| Error::Io(io::Error::new(io::ErrorKind::Other, "stdin is closed")))
    }

    fn received(&self, data: Vec<u8>) -> Vec<u8> {
        self.state.traffic("received", &data);
        data
    }

    /// True once the child exited or its output forwarder stopped.
    fn finished(&mut self) -> bool {
        self.forwarders.iter().any(|f| f.name() == "stdout" && f.is_finished())
            || !matches!(self.child.try_wait(), Ok(None))
    }

    /// Interactive mode with the terminal swapped out for input, output and errors.
    pub(crate) fn interact_with<R, O, E>(
        &mut self,
        mut input: R,
        output: O,
        errors: E,
    ) -> Result<()>
    where
        R: BufRead,
        O: Write + Send + 'static,
        E: Write + Send + 'static,
    {
        self.state.check_open()?;
        if let Some(stdout) = self.stdout.take() {
            self.forwarders.push(Forwarder::spawn("stdout", stdout, output)?);
        }
        if let Some(stderr) = self.stderr.take() {
            self.forwarders.push(Forwarder::spawn("stderr", stderr, errors)?);
        }
        self.state.info(&format!("interacting with {}", self.command));

        let mut line = String::new();
        while !self.finished() {
            print!("{PROMPT}");
            io::stdout().flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            let mut data = line.trim_end_matches(['\r', '\n']).as_bytes().to_vec();
            data.push(b'\n');
            match self.send(&data) {
                Ok(()) => {}
                Err(Error::Io(err)) if err.kind() == io::ErrorKind::BrokenPipe => break,
                Err(err) => return Err(err),
            }
            thread::sleep(INTERACTIVE_PAUSE);
        }
        Ok(())
    }
}

impl Tube for Process {
    fn send(&mut self, data: &[u8]) -> Result<()> {
        let stdin = self.stdin()?;
        stdin.write_all(data)?;
        stdin.flush()?;
        self.state.traffic("sent", data);
        Ok(())
    }

    fn recv(&mut self) -> Result<Vec<u8>> {
        let data = tube::read_once(self.stdout()?)?;
        Ok(self.received(data))
    }

    fn recv_n(&mut self, n: usize) -> Result<Vec<u8>> {
        if n == 0 {
            return self.recv();
        }
        let data = tube::read_up_to(self.stdout()?, n)?;
        Ok(self.received(data))
    }

    fn recv_line(&mut self) -> Result<Vec<u8>> {
        let newline = self.state.options.newline.clone();
        let data = tube::read_line(self.stdout()?, &newline)?;
        Ok(self.received(data))
    }

    fn recv_until(&mut self, delim: &[u8]) -> Result<Vec<u8>> {
        let data = tube::read_until(self.stdout()?, delim)?;
        Ok(self.received(data))
    }

    fn recv_all(&mut self) -> Result<Vec<u8>> {
        let data = tube::read_all(self.stdout()?)?;
        Ok(self.received(data))
    }

    /// Copies the child's output to our stdout and stderr in the background and
    /// forwards our stdin a line at a time until stdin ends or the child is done.
    /// The child's stdout stays with the forwarder afterwards, so later receives fail.
    /// An exit is only noticed before each prompt, so a read that is already waiting
    /// on the terminal finishes first.
    fn interactive(&mut self) -> Result<()> {
        self.interact_with(io::stdin().lock(), io::stdout(), io::stderr())
    }

    fn close(&mut self) -> Result<()> {
        self.state.mark_closed()?;
        self.stdin = None;
        self.stdout = None;
        self.stderr = None;

        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
        }
        let status = self.child.wait();
        for forwarder in self.forwarders.drain(..) {
            let name = forwarder.name().to_string();
            if forwarder.join_within(CLOSE_GRACE).is_none() {
                utils::warn(&format!(
                    "{} {name} is still held open by another process",
                    self.command
                ));
            }
        }

        let status = status?;
        self.state.info(&format!("{} finished: {status}", self.command));
        Ok(())
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

impl Drop for Process {
    fn drop(&mut self) {
        if self.is_open() {
            let _ = self.close();
        }
    }
}

use crate::error::Result;
use crate::tube::RECV_SIZE;
use std::io::{self, Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// A background thread copying one stream into another, used by interactive mode.
/// The thread stops when its source ends or errors, when the sink errors, or after
/// cancellation once the current read returns. Bytes from a read that was already
/// under way are still written to the sink.
pub struct Forwarder {
    name: String,
    cancel: Arc<AtomicBool>,
    handle: Option<JoinHandle<u64>>,
}

impl Forwarder {
    pub fn spawn<R, W>(name: &str, mut source: R, mut sink: W) -> Result<Self>
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        let cancel = Arc::new(AtomicBool::new(false));
        let cancelled = Arc::clone(&cancel);
        let handle = thread::Builder::new()
            .name(format!("forward-{name}"))
            .spawn(move || {
                let mut buf = [0u8; RECV_SIZE];
                let mut copied = 0;
                while !cancelled.load(Ordering::Acquire) {
                    let n = match source.read(&mut buf) {
                        Ok(0) => break,
                        Ok(n) => n,
                        // A source with a read timeout wakes up here to look at the
                        // cancel flag.
                        Err(err) if is_retryable(&err) => continue,
                        Err(_) => break,
                    };
                    if sink.write_all(&buf[..n]).and_then(|_| sink.flush()).is_err() {
                        break;
                    }
                    copied += n as u64;
                }
                copied
            })?;
        Ok(Forwarder {
            name: name.to_string(),
            cancel,
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    /// Cancels the thread and waits for it, returning the number of bytes copied.
    /// The source has to be closed, shut down, or have a read timeout if it may
    /// still block.
    pub fn join(mut self) -> u64 {
        self.cancel.store(true, Ordering::Release);
        match self.handle.take().map(|h| h.join()) {
            Some(Ok(copied)) => copied,
            _ => 0,
        }
    }

    /// Like join but gives up after limit, leaving the thread to finish on its own.
    /// Returns None if it was left running.
    pub fn join_within(self, limit: Duration) -> Option<u64> {
        self.cancel.store(true, Ordering::Release);
        let deadline = Instant::now() + limit;
        while !self.is_finished() {
            if Instant::now() >= deadline {
                return None;
            }
            thread::sleep(JOIN_POLL);
        }
        Some(self.join())
    }
}

const JOIN_POLL: Duration = Duration::from_millis(10);

fn is_retryable(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

//! Byte-stream sources for the boilerplate archive.

use std::cell::RefCell;
use std::io::{self, Read};
use std::rc::Rc;
use std::time::Duration;

use tracing::debug;

use super::{FETCH_TARGET, FetchError};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const READ_TIMEOUT: Duration = Duration::from_secs(120);

/// Opens a readable stream for an archive URL.
pub trait ArchiveTransport {
    /// Starts the download of `url`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Transport`] when the request cannot be made or
    /// the server rejects it.
    fn open(&self, url: &str) -> Result<Box<dyn Read + Send>, FetchError>;
}

/// HTTP(S) transport backed by a shared `ureq` agent.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    /// Builds a transport with connect and read timeouts applied.
    #[must_use]
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout_read(READ_TIMEOUT)
            .build();
        Self { agent }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveTransport for HttpTransport {
    fn open(&self, url: &str) -> Result<Box<dyn Read + Send>, FetchError> {
        debug!(target: FETCH_TARGET, url, "requesting archive");
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|error| FetchError::Transport {
                url: url.to_owned(),
                message: describe(&error),
            })?;
        debug!(
            target: FETCH_TARGET,
            url,
            status = response.status(),
            "archive response received"
        );
        Ok(Box::new(response.into_reader()))
    }
}

fn describe(error: &ureq::Error) -> String {
    match error {
        ureq::Error::Status(code, _) => format!("server responded with HTTP {code}"),
        ureq::Error::Transport(transport) => transport.to_string(),
    }
}

/// Wraps a transport stream and remembers the first error it raised.
///
/// Decoder and archive errors hide where a failure came from; the recorded
/// error tells a dropped connection apart from a malformed archive.
pub(crate) struct TrackedSource<R> {
    inner: R,
    failure: SourceFailure,
}

/// Shared slot holding the stream's first read error, if any.
#[derive(Debug, Clone, Default)]
pub(crate) struct SourceFailure(Rc<RefCell<Option<String>>>);

impl SourceFailure {
    /// Removes and returns the recorded error description.
    pub(crate) fn take(&self) -> Option<String> {
        self.0.borrow_mut().take()
    }

    fn record(&self, error: &io::Error) {
        let mut slot = self.0.borrow_mut();
        if slot.is_none() {
            *slot = Some(error.to_string());
        }
    }
}

impl<R: Read> TrackedSource<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner,
            failure: SourceFailure::default(),
        }
    }

    pub(crate) fn failure(&self) -> SourceFailure {
        self.failure.clone()
    }
}

impl<R: Read> Read for TrackedSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf).inspect_err(|error| {
            if error.kind() != io::ErrorKind::Interrupted {
                self.failure.record(error);
            }
        })
    }
}

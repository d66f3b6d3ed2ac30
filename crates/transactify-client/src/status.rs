//! Progress messages emitted while converting.
//!
//! Pipelines talk to a `StatusReporter` and never to a concrete UI. Reporting
//! has no return value and no error channel.

use std::cell::RefCell;
use std::io::{self, Write};

use tracing::warn;

pub trait StatusReporter {
    fn report(&self, message: &str);
}

/// Prints each message on its own line to standard output. A closed stdout
/// drops the message; other write errors are logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl StatusReporter for ConsoleReporter {
    fn report(&self, message: &str) {
        if let Err(error) = write_line(&mut io::stdout().lock(), message) {
            warn!(error = %error, "could not write status line");
        }
    }
}

fn write_line(writer: &mut dyn Write, message: &str) -> io::Result<()> {
    let written = writer
        .write_all(message.as_bytes())
        .and_then(|()| writer.write_all(b"\n"))
        .and_then(|()| writer.flush());
    match written {
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl StatusReporter for SilentReporter {
    fn report(&self, _message: &str) {}
}

/// Keeps every message in order, for callers that render them later.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    messages: RefCell<Vec<String>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }
}

impl StatusReporter for CollectingReporter {
    fn report(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}

impl<F> StatusReporter for F
where
    F: Fn(&str),
{
    fn report(&self, message: &str) {
        self(message);
    }
}

//! Stream handler: stdout, stderr or any `Write`

use super::sink::StreamTarget;
use crate::core::error::{LoggerError, Result};
use crate::core::handler::{Handler, HandlerCore};
use crate::core::record::Record;
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;

pub struct StreamHandler {
    core: HandlerCore,
    target: Mutex<StreamTarget>,
}

impl StreamHandler {
    pub fn new(target: StreamTarget, core: HandlerCore) -> Self {
        Self {
            core,
            target: Mutex::new(target),
        }
    }

    /// Write one complete line and flush, holding the lock for both
    fn write_line(&self, line: &str) -> Result<()> {
        let mut target = self.target.lock();
        let written = match &mut *target {
            StreamTarget::Stdout => write_and_flush(&mut io::stdout().lock(), line),
            StreamTarget::Stderr => write_and_flush(&mut io::stderr().lock(), line),
            StreamTarget::Writer { writer, .. } => write_and_flush(writer, line),
        };
        written.map_err(|e| LoggerError::sink("stream", e))
    }
}

fn write_and_flush<W: Write + ?Sized>(out: &mut W, line: &str) -> io::Result<()> {
    out.write_all(line.as_bytes())?;
    out.write_all(b"\n")?;
    out.flush()
}

impl Handler for StreamHandler {
    fn kind(&self) -> &'static str {
        "stream"
    }

    fn should_emit(&self, record: &Record) -> bool {
        self.core.should_emit(record)
    }

    fn deliver(&self, record: &Arc<Record>) -> Result<()> {
        let line = self.core.format(record);
        self.core.guard(self.kind(), || self.write_line(&line))
    }

    fn flush(&self) -> Result<()> {
        let mut target = self.target.lock();
        match &mut *target {
            StreamTarget::Stdout => io::stdout().flush()?,
            StreamTarget::Stderr => io::stderr().flush()?,
            StreamTarget::Writer { writer, .. } => writer.flush()?,
        }
        Ok(())
    }
}

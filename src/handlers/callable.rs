//! Handler invoking a user callback with each formatted record

use super::sink::Callback;
use crate::core::error::{LoggerError, Result};
use crate::core::handler::{Handler, HandlerCore};
use crate::core::record::Record;
use std::sync::Arc;

pub struct CallableHandler {
    core: HandlerCore,
    callback: Callback,
}

impl CallableHandler {
    pub fn new(callback: Callback, core: HandlerCore) -> Self {
        Self { core, callback }
    }
}

impl Handler for CallableHandler {
    fn kind(&self) -> &'static str {
        "callable"
    }

    fn should_emit(&self, record: &Record) -> bool {
        self.core.should_emit(record)
    }

    /// Passes the formatted line, or the JSON document when serializing
    fn deliver(&self, record: &Arc<Record>) -> Result<()> {
        let message = self.core.format(record);
        self.core.guard(self.kind(), || {
            (self.callback)(&message).map_err(|e| LoggerError::sink("callable", e))
        })
    }
}

/*
Copyright 2021 Robin Marchart

   Licensed under the Apache License, Version 2.0 (the "License");
   you may not use this file except in compliance with the License.
   You may obtain a copy of the License at

       http://www.apache.org/licenses/LICENSE-2.0

   Unless required by applicable law or agreed to in writing, software
   distributed under the License is distributed on an "AS IS" BASIS,
   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
   See the License for the specific language governing permissions and
   limitations under the License.
*/

use parking_lot::Mutex;
use std::fmt::Display;

/// Receiver for the step by step trace of a roll.
pub trait DebugSink {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn warning(&self, message: &str);
    fn error(&self, message: &str);
}

/// Collects every message in memory.
#[derive(Debug, Default)]
pub struct StringSink {
    messages: Mutex<Vec<String>>,
}

impl StringSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn logs(&self) -> String {
        self.messages.lock().join("\n")
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    pub fn clear(&self) {
        self.messages.lock().clear()
    }

    fn push(&self, message: &str) {
        self.messages.lock().push(message.to_owned())
    }
}

impl DebugSink for StringSink {
    fn debug(&self, message: &str) {
        self.push(message)
    }

    fn info(&self, message: &str) {
        self.push(message)
    }

    fn warning(&self, message: &str) {
        self.push(message)
    }

    fn error(&self, message: &str) {
        self.push(message)
    }
}

/// Forwards to the `log` facade.
#[cfg(feature = "logging")]
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[cfg(feature = "logging")]
impl DebugSink for LogSink {
    fn debug(&self, message: &str) {
        log::debug!("{}", message)
    }

    fn info(&self, message: &str) {
        log::info!("{}", message)
    }

    fn warning(&self, message: &str) {
        log::warn!("{}", message)
    }

    fn error(&self, message: &str) {
        log::error!("{}", message)
    }
}

/// Optional sink threaded through the pipeline, silent when empty.
#[derive(Clone, Copy)]
pub(crate) struct Trace<'a> {
    sink: Option<&'a dyn DebugSink>,
}

impl<'a> Trace<'a> {
    pub(crate) fn new(sink: Option<&'a dyn DebugSink>) -> Self {
        Trace { sink }
    }

    #[cfg(test)]
    pub(crate) fn silent() -> Trace<'static> {
        Trace { sink: None }
    }

    pub(crate) fn log<M: Display>(&self, message: M) {
        if let Some(sink) = self.sink {
            sink.debug(&format!("DEBUG: {}", message))
        }
    }

    pub(crate) fn step<M: Display>(&self, step: &str, description: M) {
        if let Some(sink) = self.sink {
            sink.debug(&format!("DEBUG: [{}] {}", step, description))
        }
    }

    pub(crate) fn roll<V: Display>(&self, dice: &str, value: V) {
        if let Some(sink) = self.sink {
            sink.debug(&format!("DEBUG: Rolling {}: {}", dice, value))
        }
    }

    pub(crate) fn failure<M: Display>(&self, message: M) {
        if let Some(sink) = self.sink {
            sink.error(&format!("DEBUG: [ERROR] {}", message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_sink() {
        let sink = StringSink::new();
        sink.debug("one");
        sink.info("two");
        sink.warning("three");
        sink.error("four");
        assert_eq!(sink.logs(), "one\ntwo\nthree\nfour");
        sink.clear();
        assert_eq!(sink.logs(), "");
    }

    #[test]
    fn test_trace_prefix() {
        let sink = StringSink::new();
        let trace = Trace::new(Some(&sink));
        trace.step("START", "Rolling expression: '1d6'");
        trace.roll("1d6", 4);
        trace.log("plain");
        trace.failure("Division by zero");
        assert_eq!(
            sink.messages(),
            vec![
                "DEBUG: [START] Rolling expression: '1d6'",
                "DEBUG: Rolling 1d6: 4",
                "DEBUG: plain",
                "DEBUG: [ERROR] Division by zero",
            ]
        );
    }

    #[test]
    fn test_silent_trace() {
        Trace::silent().step("START", "nothing happens");
    }
}

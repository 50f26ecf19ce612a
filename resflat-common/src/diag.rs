// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// The compiler core never prints directly; every message goes through a
// Diagnostics sink so that embedders can redirect or swallow output. The CLI
// binds the sink to stderr.

/// How serious a diagnostic message is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warn,
    Note
}

/// Sink for `(source, severity, message)` triples emitted by the compiler.
///
/// `source` is the input path the message is about, when there is one.
pub trait Diagnostics {
    fn diag(&self, severity: Severity, source: Option<&str>, message: &str);

    fn error(&self, source: Option<&str>, message: &str) {
        self.diag(Severity::Error, source, message);
    }

    fn warn(&self, source: Option<&str>, message: &str) {
        self.diag(Severity::Warn, source, message);
    }

    fn note(&self, source: Option<&str>, message: &str) {
        self.diag(Severity::Note, source, message);
    }
}

/// Writes diagnostics to the standard error stream as
/// `source: severity: message` lines. Notes are only emitted in verbose
/// mode.
pub struct StderrDiagnostics {
    pub verbose: bool
}

impl Diagnostics for StderrDiagnostics {
    fn diag(&self, severity: Severity, source: Option<&str>, message: &str) {
        let label = match severity {
            Severity::Error => "error",
            Severity::Warn => "warn",
            Severity::Note => {
                if !self.verbose {
                    return;
                }
                "note"
            }
        };
        match source {
            Some(source) => eprintln!("{}: {}: {}", source, label, message),
            None => eprintln!("{}: {}", label, message)
        }
    }
}

/// Discards everything. Useful in tests that only care about success or
/// failure.
pub struct NullDiagnostics;

impl Diagnostics for NullDiagnostics {
    fn diag(&self, _severity: Severity, _source: Option<&str>, _message: &str) {}
}

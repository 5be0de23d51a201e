use std::io::{self, Write as _};

/// Trait for handling output from the `print` operation.
///
/// Implement this to capture or redirect print output from evaluated
/// programs. The default implementation [`StdPrint`] writes to stdout.
pub trait PrintWriter {
    /// Called once per `print` with the rendered value.
    ///
    /// The interpreter adds no separators and no trailing newline; the
    /// program's own output is exactly the concatenation of these calls.
    fn stdout_write(&mut self, output: &str);
}

/// Default `PrintWriter` that writes to stdout.
///
/// Output is written unbuffered so a long-running program's prints appear
/// as they happen; the stream is flushed once more on drop so partial lines
/// are not lost when the host exits right after a run. Write errors are
/// ignored, matching what a CLI can usefully do with a broken stdout.
#[derive(Debug, Default)]
pub struct StdPrint;

impl PrintWriter for StdPrint {
    fn stdout_write(&mut self, output: &str) {
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(output.as_bytes());
    }
}

impl Drop for StdPrint {
    fn drop(&mut self) {
        let _ = io::stdout().flush();
    }
}

/// A `PrintWriter` that collects all output into a string.
///
/// Useful for testing or capturing print output programmatically.
#[derive(Debug, Default)]
pub struct CollectStringPrint(String);

impl CollectStringPrint {
    /// Creates a new empty `CollectStringPrint`.
    #[must_use]
    pub fn new() -> Self {
        Self(String::new())
    }

    /// Returns the collected output as a string slice.
    #[must_use]
    pub fn output(&self) -> &str {
        self.0.as_str()
    }

    /// Consumes the writer and returns the collected output.
    #[must_use]
    pub fn into_output(self) -> String {
        self.0
    }
}

impl PrintWriter for CollectStringPrint {
    fn stdout_write(&mut self, output: &str) {
        self.0.push_str(output);
    }
}

/// `PrintWriter` that ignores all output.
///
/// Useful for suppressing print output during testing or benchmarking.
#[derive(Debug, Default)]
pub struct NoPrint;

impl PrintWriter for NoPrint {
    fn stdout_write(&mut self, _output: &str) {}
}

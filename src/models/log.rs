//! Log lines surfaced by the tail tracker.

/// A raw log line together with the byte offset it started at.
///
/// Produced per cycle and not retained beyond it unless the line triggers an
/// error condition, in which case its text is carried in the alert body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    /// Byte offset of the start of the line within the log file.
    pub offset: u64,
    /// Line content without the trailing newline.
    pub text: String,
}

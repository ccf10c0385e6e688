use std::fmt;

use crate::error::SessionError;
use crate::frame::{Frame, commands};

/// One reply read from the broker: the text lines received before the frame
/// terminator, in arrival order, with line endings stripped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reply {
    pub lines: Vec<String>,
}

impl Reply {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// First line of the reply, which the broker uses for the command name.
    pub fn command(&self) -> Option<&str> {
        self.lines.first().map(String::as_str)
    }

    /// A reply is an error exactly when its first line is `ERROR`.
    pub fn is_error(&self) -> bool {
        self.command() == Some(commands::ERROR)
    }

    /// All lines joined with `\n`.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    /// Split the reply into command, headers and body.
    ///
    /// Headers are the lines after the command up to the first blank line,
    /// split at the first `:`; a header line without `:` gets an empty value.
    /// The body is every line after the blank line, joined with `\n`.
    /// Returns `None` for an empty reply.
    ///
    /// Splitting an encoded frame reproduces it only when the body has no
    /// NUL, no trailing `\n`, no `\r\n` (the `\r` is stripped) and is valid
    /// UTF-8 (invalid bytes are replaced lossily).
    pub fn to_frame(&self) -> Option<Frame> {
        let (command, rest) = self.lines.split_first()?;
        let mut frame = Frame::new(command.as_str());
        let mut iter = rest.iter();
        for line in iter.by_ref() {
            if line.is_empty() {
                break;
            }
            frame = match line.split_once(':') {
                Some((k, v)) => frame.header(k, v),
                None => frame.header(line.as_str(), ""),
            };
        }
        let body: Vec<&str> = iter.map(String::as_str).collect();
        Some(frame.set_body(body.join("\n").into_bytes()))
    }
}

impl From<Vec<String>> for Reply {
    fn from(lines: Vec<String>) -> Self {
        Self::new(lines)
    }
}

impl From<Vec<&str>> for Reply {
    fn from(lines: Vec<&str>) -> Self {
        Self::new(lines.into_iter().map(str::to_string).collect())
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Validate a reply.
///
/// - an empty reply fails with `SessionError::EmptyReply`;
/// - a reply whose first line is `ERROR` fails with
///   `SessionError::Protocol` carrying the whole reply text;
/// - anything else is returned unchanged.
pub fn check_status(reply: Reply) -> Result<Reply, SessionError> {
    if reply.is_empty() {
        return Err(SessionError::EmptyReply);
    }
    if reply.is_error() {
        return Err(SessionError::Protocol(reply.text()));
    }
    Ok(reply)
}

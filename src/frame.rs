use std::fmt;

use crate::config::Destination;

/// STOMP command names used by a session.
pub mod commands {
    pub const CONNECT: &str = "CONNECT";
    pub const SUBSCRIBE: &str = "SUBSCRIBE";
    pub const SEND: &str = "SEND";
    pub const DISCONNECT: &str = "DISCONNECT";
    /// First line of a reply the broker uses to reject a frame.
    pub const ERROR: &str = "ERROR";
}

/// An outbound STOMP frame.
///
/// `Frame` contains the command (e.g. "SEND", "SUBSCRIBE"), an ordered list
/// of headers (key/value pairs) and the raw body bytes. Headers are written
/// to the wire in insertion order, exactly as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// STOMP command (e.g. CONNECT, SEND, SUBSCRIBE)
    pub command: String,
    /// Ordered headers as (key, value) pairs
    pub headers: Vec<(String, String)>,
    /// Raw body bytes
    pub body: Vec<u8>,
}

impl Frame {
    /// Create a new frame with the given command and empty headers/body.
    ///
    /// Parameters
    /// - `command`: the STOMP command name (for example, `"SEND"` or
    ///   `"SUBSCRIBE"`). Accepts any type convertible into `String`.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Add a header (builder style).
    ///
    /// Parameters
    /// - `key`: header name (converted to `String`).
    /// - `value`: header value (converted to `String`). The value is sent
    ///   verbatim and must not contain `\n`, `:` or NUL.
    ///
    /// Returns the mutated `Frame` allowing builder-style chaining.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Set the frame body (builder style).
    ///
    /// Parameters
    /// - `body`: raw body bytes. Accepts any type convertible into `Vec<u8>`.
    ///
    /// Returns the mutated `Frame` allowing builder-style chaining.
    pub fn set_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Get the value of a header by name.
    ///
    /// Returns the first header value matching the given key (case-sensitive),
    /// or `None` if no such header exists.
    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// `CONNECT` frame carrying the `login` and `passcode` headers.
    pub fn connect(login: &str, passcode: &str) -> Self {
        Frame::new(commands::CONNECT)
            .header("login", login)
            .header("passcode", passcode)
    }

    /// `SUBSCRIBE` frame for a single destination.
    pub fn subscribe(destination: &Destination) -> Self {
        Frame::new(commands::SUBSCRIBE).header("destination", destination.to_string())
    }

    /// `SEND` frame with a `receipt` header and a text body.
    pub fn send(destination: &Destination, receipt: &str, body: impl Into<Vec<u8>>) -> Self {
        Frame::new(commands::SEND)
            .header("destination", destination.to_string())
            .header("receipt", receipt)
            .set_body(body)
    }

    /// `DISCONNECT` frame; it never carries headers or a body.
    pub fn disconnect() -> Self {
        Frame::new(commands::DISCONNECT)
    }

    /// Receipt id used for the message at `index` of a send loop.
    pub fn receipt_id(index: usize) -> String {
        format!("message-{}", index)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Command: {}", self.command)?;
        for (k, v) in &self.headers {
            writeln!(f, "{}: {}", k, v)?;
        }
        writeln!(f, "Body ({} bytes)", self.body.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Domain;

    #[test]
    fn verb_constructors_use_fixed_header_order() {
        let dest = Destination::new(Domain::Queue, "orders").unwrap();

        let c = Frame::connect("guest", "secret");
        assert_eq!(c.command, "CONNECT");
        assert_eq!(c.headers[0], ("login".into(), "guest".into()));
        assert_eq!(c.headers[1], ("passcode".into(), "secret".into()));

        let s = Frame::send(&dest, &Frame::receipt_id(7), "hi");
        assert_eq!(s.get_header("destination"), Some("/queue/orders"));
        assert_eq!(s.get_header("receipt"), Some("message-7"));
        assert_eq!(s.body, b"hi".to_vec());

        let d = Frame::disconnect();
        assert!(d.headers.is_empty());
        assert!(d.body.is_empty());
    }

    #[test]
    fn display_lists_headers_and_body_size() {
        let f = Frame::new("SEND")
            .header("destination", "/topic/news")
            .set_body(b"hello".to_vec());
        let s = format!("{}", f);
        assert!(s.contains("Command: SEND"));
        assert!(s.contains("destination: /topic/news"));
        assert!(s.contains("Body (5 bytes)"));
    }
}

use bytes::{Buf, BufMut, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

use crate::frame::Frame;
use crate::reply::Reply;

/// Serialize `frame` into `dst` using the STOMP wire layout:
///
/// ```text
/// COMMAND\n
/// key:value\n        (one per header, insertion order)
/// \n
/// <body bytes>\0
/// ```
///
/// Header keys and values are written verbatim. No escaping is applied and
/// no `content-length` header is added, so values containing `\n`, `:` or
/// NUL produce an ambiguous frame. The command is not checked here; an empty
/// one is refused by the `Encoder` impl and by `Session::send_frame`.
pub fn encode_frame(frame: &Frame, dst: &mut BytesMut) {
    let headers_len: usize = frame
        .headers
        .iter()
        .map(|(k, v)| k.len() + v.len() + 2)
        .sum();
    dst.reserve(frame.command.len() + headers_len + frame.body.len() + 3);

    dst.extend_from_slice(frame.command.as_bytes());
    dst.put_u8(b'\n');
    for (k, v) in &frame.headers {
        dst.extend_from_slice(k.as_bytes());
        dst.put_u8(b':');
        dst.extend_from_slice(v.as_bytes());
        dst.put_u8(b'\n');
    }
    dst.put_u8(b'\n');
    dst.extend_from_slice(&frame.body);
    dst.put_u8(0);
}

/// `StompCodec` implements `tokio_util::codec::{Decoder, Encoder}` for the
/// STOMP subset spoken by a session.
///
/// Responsibilities:
/// - Encode outbound `Frame`s (see [`encode_frame`]).
/// - Decode inbound bytes into `Reply` values: newline-delimited text lines
///   up to the frame terminator.
///
/// Termination rule: the first NUL byte ends the reply. Text on the same line
/// before the NUL is kept as the last line when non-empty. A single `\n`
/// directly after the NUL is padding and is dropped. Blank lines and stray
/// NULs between replies are skipped, so every decoded reply starts with a
/// non-blank line. A trailing `\r` is stripped from each line.
#[derive(Debug, Default)]
pub struct StompCodec {
    /// Lines of the reply currently being received.
    lines: Vec<String>,
    /// A NUL was the last byte seen; drop one `\n` if it comes next.
    skip_newline: bool,
}

impl StompCodec {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_line(&mut self, raw: &[u8]) {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        if raw.is_empty() && self.lines.is_empty() {
            return;
        }
        self.lines.push(String::from_utf8_lossy(raw).into_owned());
    }

    fn take_reply(&mut self) -> Option<Reply> {
        if self.lines.is_empty() {
            None
        } else {
            Some(Reply::new(std::mem::take(&mut self.lines)))
        }
    }
}

impl Decoder for StompCodec {
    type Item = Reply;
    type Error = io::Error;

    /// Decode bytes from `src` into a `Reply`.
    ///
    /// Complete lines are consumed from `src` as soon as they arrive and kept
    /// in the codec, so a reply may span any number of calls. Returns
    /// `Ok(None)` until a terminator is seen.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            if self.skip_newline && !src.is_empty() {
                if src[0] == b'\n' {
                    src.advance(1);
                }
                self.skip_newline = false;
            }

            let Some(pos) = src.iter().position(|&b| b == b'\n' || b == 0) else {
                return Ok(None);
            };

            if src[pos] == b'\n' {
                let line = src.split_to(pos + 1);
                self.push_line(&line[..pos]);
                continue;
            }

            // NUL terminator
            let line = src.split_to(pos);
            src.advance(1);
            self.skip_newline = true;
            if !line.is_empty() {
                self.push_line(&line);
            }
            if let Some(reply) = self.take_reply() {
                return Ok(Some(reply));
            }
        }
    }

    /// At end of stream, return whatever was collected: complete lines plus
    /// any unterminated trailing text. With nothing collected the stream ends.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(reply) = self.decode(src)? {
            return Ok(Some(reply));
        }
        if !src.is_empty() {
            let rest = src.split_to(src.len());
            self.push_line(&rest);
        }
        Ok(self.take_reply())
    }
}

impl Encoder<Frame> for StompCodec {
    type Error = io::Error;

    /// Rejects a frame with an empty command; `dst` is left untouched.
    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if frame.command.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "frame command must not be empty",
            ));
        }
        encode_frame(&frame, dst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(raw: &[u8]) -> Vec<Reply> {
        let mut codec = StompCodec::new();
        let mut buf = BytesMut::from(raw);
        let mut out = Vec::new();
        while let Some(r) = codec.decode_eof(&mut buf).unwrap() {
            out.push(r);
        }
        out
    }

    #[test]
    fn encodes_exact_layout() {
        let f = Frame::new("SEND")
            .header("destination", "/queue/a")
            .header("receipt", "message-0")
            .set_body(b"hi".to_vec());
        let mut buf = BytesMut::new();
        encode_frame(&f, &mut buf);
        assert_eq!(
            &buf[..],
            b"SEND\ndestination:/queue/a\nreceipt:message-0\n\nhi\0"
        );
    }

    #[test]
    fn encoder_refuses_empty_command() {
        let mut codec = StompCodec::new();
        let mut buf = BytesMut::new();
        let err = codec
            .encode(Frame::new("").header("k", "v"), &mut buf)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(buf.is_empty());
    }

    #[test]
    fn encodes_header_values_verbatim() {
        let f = Frame::new("SEND").header("k", "a:b\\c");
        let mut buf = BytesMut::new();
        encode_frame(&f, &mut buf);
        assert_eq!(&buf[..], b"SEND\nk:a:b\\c\n\n\0");
    }

    #[test]
    fn nul_alone_on_line_terminates() {
        let replies = decode_all(b"CONNECTED\nsession:1\n\n\0\n");
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].lines, vec!["CONNECTED", "session:1", ""]);
    }

    #[test]
    fn text_before_nul_is_kept() {
        let replies = decode_all(b"MESSAGE\n\nbody text\0");
        assert_eq!(replies[0].lines, vec!["MESSAGE", "", "body text"]);
    }

    #[test]
    fn bytes_after_nul_start_next_reply() {
        let replies = decode_all(b"RECEIPT\n\n\0MESSAGE\n\nx\0\n");
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0].lines, vec!["RECEIPT", ""]);
        assert_eq!(replies[1].lines, vec!["MESSAGE", "", "x"]);
    }

    #[test]
    fn eof_returns_partial_reply() {
        let replies = decode_all(b"MESSAGE\nh:v\ntrailing");
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].lines, vec!["MESSAGE", "h:v", "trailing"]);
        assert!(decode_all(b"").is_empty());
    }

    #[test]
    fn padding_newline_split_across_reads() {
        let mut codec = StompCodec::new();
        let mut buf = BytesMut::from(&b"RECEIPT\n\n\0"[..]);
        let first = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(first.lines, vec!["RECEIPT", ""]);

        buf.extend_from_slice(b"\nERROR\nmessage:x\n\0");
        let second = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(second.command(), Some("ERROR"));
    }

    #[test]
    fn crlf_line_endings_are_stripped() {
        let replies = decode_all(b"CONNECTED\r\nversion:1.0\r\n\r\n\0");
        assert_eq!(replies[0].lines, vec!["CONNECTED", "version:1.0", ""]);
    }
}

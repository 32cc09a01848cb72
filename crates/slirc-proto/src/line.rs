//! CRLF line framing for tokio.
//!
//! Decoding yields one `String` per line with the terminator removed and
//! blank lines skipped. Encoding appends CRLF. Both directions go through
//! the configured `encoding_rs` text encoding.

use std::borrow::Cow;

use bytes::BytesMut;
use encoding::Encoding;
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::error::{ProtocolError, Result};

/// Inbound limit: 512 bytes of message plus room for IRCv3 tags.
pub const DEFAULT_MAX_LEN: usize = 512 + 8191;

/// Line codec with a text encoding and a maximum line length.
#[derive(Debug, Clone)]
pub struct LineCodec {
    encoding: &'static Encoding,
    next_index: usize,
    max_len: usize,
    discarding: bool,
}

impl LineCodec {
    /// Create a codec for an encoding label such as `"utf-8"` or
    /// `"iso-8859-1"`.
    pub fn new(label: &str) -> Result<Self> {
        let encoding = Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| ProtocolError::UnknownEncoding(label.to_owned()))?;
        Ok(Self {
            encoding,
            next_index: 0,
            max_len: DEFAULT_MAX_LEN,
            discarding: false,
        })
    }

    /// Create a codec with a custom maximum line length.
    pub fn with_max_len(label: &str, max_len: usize) -> Result<Self> {
        let mut codec = Self::new(label)?;
        codec.max_len = max_len;
        Ok(codec)
    }

    /// Canonical name of the active encoding.
    pub fn encoding_name(&self) -> &'static str {
        self.encoding.name()
    }

    /// The byte-order mark the encoder would emit for this encoding, or an
    /// empty slice when the output encoding has none.
    ///
    /// Only UTF-8 output is produced by `encoding_rs`, so this is either the
    /// UTF-8 BOM or nothing.
    pub fn byte_order_mark(&self) -> &'static [u8] {
        if self.encoding.output_encoding() == encoding::UTF_8 {
            &b"\xEF\xBB\xBF"[..]
        } else {
            &[][..]
        }
    }

    fn decode_line(&self, line: &[u8]) -> String {
        let (text, had_errors) = self.encoding.decode_without_bom_handling(line);
        if had_errors {
            warn!(encoding = self.encoding.name(), "replaced undecodable bytes in line");
        }
        text.into_owned()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>> {
        loop {
            let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') else {
                self.next_index = src.len();
                if src.len() > self.max_len {
                    warn!(
                        limit = self.max_len,
                        buffered = src.len(),
                        "discarding over-long line"
                    );
                    src.clear();
                    self.next_index = 0;
                    self.discarding = true;
                }
                return Ok(None);
            };

            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            if std::mem::take(&mut self.discarding) {
                continue;
            }
            if line.len() > self.max_len {
                warn!(limit = self.max_len, actual = line.len(), "discarding over-long line");
                continue;
            }

            let mut body = &line[..];
            while let Some((last, rest)) = body.split_last() {
                if *last == b'\n' || *last == b'\r' {
                    body = rest;
                } else {
                    break;
                }
            }
            if body.is_empty() {
                continue;
            }

            return Ok(Some(self.decode_line(body)));
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>> {
        match self.decode(src)? {
            Some(line) => Ok(Some(line)),
            None if src.is_empty() => Ok(None),
            None if self.discarding => {
                src.clear();
                Ok(None)
            }
            None => {
                // Unterminated final line.
                let rest = src.split_to(src.len());
                self.next_index = 0;
                let text = self.decode_line(&rest);
                let text = text.trim_end_matches('\r');
                Ok(Some(text.to_owned()).filter(|t| !t.is_empty()))
            }
        }
    }
}

impl Encoder<String> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, msg: String, dst: &mut BytesMut) -> Result<()> {
        Encoder::<&str>::encode(self, msg.as_str(), dst)
    }
}

impl<'a> Encoder<&'a str> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, msg: &'a str, dst: &mut BytesMut) -> Result<()> {
        let line = msg.trim_end_matches(['\r', '\n']);
        let (bytes, _, _) = self.encoding.encode(line);
        let needed = bytes.len() + 2;
        if needed > self.max_len {
            return Err(ProtocolError::LineTooLong {
                actual: needed,
                limit: self.max_len,
            });
        }

        dst.reserve(needed);
        match bytes {
            Cow::Borrowed(b) => dst.extend_from_slice(b),
            Cow::Owned(v) => dst.extend_from_slice(&v),
        }
        dst.extend_from_slice(b"\r\n");
        Ok(())
    }
}

use std::io::{BufRead, Read};

use super::transport::TransportError;

const STATUS_OK: &str = "200 OK";
const CONTENT_LENGTH: &str = "Content-Length:";

/// How the body of a poll response is read once the headers are consumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BodyFraming {
    /// One line-read of the stream; `Content-Length` is parsed but not used
    /// to bound the read.
    #[default]
    Line,
    /// Read exactly `Content-Length` bytes, falling back to a line-read when
    /// the header is missing.
    ContentLength,
}

/// A successful (`200 OK`) poll response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: String,
    pub content_length: Option<usize>,
    pub body: String,
}

impl Response {
    /// Decode one response from `reader`.
    ///
    /// Anything other than a readable status line containing `200 OK`, or a
    /// header section that ends before its blank line, is an error; the
    /// puller treats every error as "no message this round".
    pub fn read_from<R: BufRead>(
        mut reader: R,
        framing: BodyFraming,
    ) -> Result<Self, TransportError> {
        let mut status = String::new();
        if reader.read_line(&mut status)? == 0 {
            return Err(TransportError::Closed);
        }
        let status = status.trim_end().to_string();
        if !status.contains(STATUS_OK) {
            return Err(TransportError::Status(status));
        }

        let mut content_length = None;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line)? == 0 {
                return Err(TransportError::UnterminatedHeaders);
            }
            if line == "\r\n" || line == "\n" {
                break;
            }
            if let Some(value) = line.strip_prefix(CONTENT_LENGTH) {
                // Unparsable lengths are ignored like any other header.
                if let Ok(length) = value.trim().parse::<usize>() {
                    content_length = Some(length);
                }
            }
        }

        let mut body = Vec::new();
        match (framing, content_length) {
            (BodyFraming::ContentLength, Some(length)) => {
                reader.by_ref().take(length as u64).read_to_end(&mut body)?;
                if body.len() < length {
                    return Err(TransportError::ShortBody {
                        expected: length,
                        read: body.len(),
                    });
                }
            }
            _ => {
                reader.read_until(b'\n', &mut body)?;
            }
        }

        Ok(Self {
            status,
            content_length,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

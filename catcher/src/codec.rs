use bytes::BytesMut;
use log::warn;
use tokio_util::codec::{Decoder, LinesCodec, LinesCodecError};
use crate::Error;

const MAX_LINE: usize = 4 * 1024 * 1024;

/// Frames a push stream into event payloads. An event is one or more
/// `data:` lines terminated by a blank line; multiple data lines are
/// joined with newlines.
///
/// A line longer than the maximum is skipped along with the rest of its
/// event.
pub struct EventCodec {
    lines:   LinesCodec,
    data:    Vec<String>,
    discard: bool,
}

impl EventCodec {
    pub fn new() -> Self {
        Self::with_max_length(MAX_LINE)
    }

    pub fn with_max_length(max: usize) -> Self {
        Self {
            lines:   LinesCodec::new_with_max_length(max),
            data:    Vec::new(),
            discard: false,
        }
    }

    fn line(&mut self, line: String) -> Option<String> {
        if line.trim().is_empty() {
            if self.discard {
                self.discard = false;
                self.data.clear();
                return None;
            }
            return self.flush();
        }

        if self.discard {
            return None;
        }

        match line.strip_prefix("data:") {
            Some(data) => self.data.push(data.trim().to_owned()),
            None       => warn!("ignoring stream line '{}'", line),
        }

        None
    }

    fn skip(&mut self) {
        warn!("skipping event with oversized line");
        self.discard = true;
        self.data.clear();
    }

    fn flush(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        let event = self.data.join("\n");
        self.data.clear();
        Some(event)
    }
}

impl Default for EventCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for EventCodec {
    type Item  = String;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, Error> {
        loop {
            let line = match self.lines.decode(src) {
                Ok(Some(line))                              => line,
                Ok(None)                                    => return Ok(None),
                Err(LinesCodecError::MaxLineLengthExceeded) => {
                    self.skip();
                    continue;
                }
                Err(e)                                      => return Err(e.into()),
            };

            if let Some(event) = self.line(line) {
                return Ok(Some(event));
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>, Error> {
        loop {
            let line = match self.lines.decode_eof(src) {
                Ok(Some(line))                              => line,
                Ok(None)                                    => break,
                Err(LinesCodecError::MaxLineLengthExceeded) => {
                    self.skip();
                    continue;
                }
                Err(e)                                      => return Err(e.into()),
            };

            if let Some(event) = self.line(line) {
                return Ok(Some(event));
            }
        }

        match self.discard {
            true  => Ok(None),
            false => Ok(self.flush()),
        }
    }
}

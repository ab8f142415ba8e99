//! STOMP 1.2 frame codec.
//!
//! Frames are text: a command line, `name:value` header lines, a blank
//! line, the body, then a NUL octet. A bare end-of-line is a heart-beat.

use std::time::Duration;

/// Protocol version offered in CONNECT.
pub const ACCEPT_VERSION: &str = "1.2";

const NUL: char = '\0';

/// STOMP commands used by the chat client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    // Client frames
    Connect,
    Send,
    Subscribe,
    Disconnect,
    // Server frames
    Connected,
    Message,
    Receipt,
    Error,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Send => "SEND",
            Self::Subscribe => "SUBSCRIBE",
            Self::Disconnect => "DISCONNECT",
            Self::Connected => "CONNECTED",
            Self::Message => "MESSAGE",
            Self::Receipt => "RECEIPT",
            Self::Error => "ERROR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CONNECT" => Some(Self::Connect),
            "SEND" => Some(Self::Send),
            "SUBSCRIBE" => Some(Self::Subscribe),
            "DISCONNECT" => Some(Self::Disconnect),
            "CONNECTED" => Some(Self::Connected),
            "MESSAGE" => Some(Self::Message),
            "RECEIPT" => Some(Self::Receipt),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }

    /// CONNECT and CONNECTED headers are never escaped.
    fn escapes_headers(&self) -> bool {
        !matches!(self, Self::Connect | Self::Connected)
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Frame decoding errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("malformed header line: {0}")]
    MalformedHeader(String),

    #[error("invalid escape sequence in header: {0}")]
    InvalidEscape(String),

    #[error("invalid content-length: {0}")]
    InvalidContentLength(String),
}

/// A single STOMP frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: Command,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Frame {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    /// Append a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Append several headers.
    pub fn headers<'a>(mut self, headers: impl IntoIterator<Item = &'a (String, String)>) -> Self {
        self.headers.extend(headers.into_iter().cloned());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// First value of header `name`; repeated headers keep the first.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// CONNECT frame with heart-beat offer and caller headers.
    pub fn connect(
        host: &str,
        heartbeat: (Duration, Duration),
        extra: &[(String, String)],
    ) -> Self {
        Frame::new(Command::Connect)
            .header("accept-version", ACCEPT_VERSION)
            .header("host", host)
            .header(
                "heart-beat",
                format!("{},{}", heartbeat.0.as_millis(), heartbeat.1.as_millis()),
            )
            .headers(extra)
    }

    pub fn subscribe(id: &str, destination: &str, extra: &[(String, String)]) -> Self {
        Frame::new(Command::Subscribe)
            .header("id", id)
            .header("destination", destination)
            .headers(extra)
    }

    /// SEND frame carrying a JSON body.
    pub fn send(destination: &str, body: String) -> Self {
        Frame::new(Command::Send)
            .header("destination", destination)
            .header("content-type", "application/json")
            .header("content-length", body.len().to_string())
            .body(body)
    }

    pub fn disconnect() -> Self {
        Frame::new(Command::Disconnect)
    }

    /// Negotiated heart-beat from a CONNECTED frame against our offer.
    ///
    /// Returns (outgoing, incoming); zero means disabled in that direction.
    pub fn negotiate_heartbeat(&self, offer: (Duration, Duration)) -> (Duration, Duration) {
        let (server_send, server_receive) = self
            .get("heart-beat")
            .and_then(|value| {
                let (sx, sy) = value.split_once(',')?;
                Some((sx.trim().parse::<u64>().ok()?, sy.trim().parse::<u64>().ok()?))
            })
            .unwrap_or((0, 0));

        let pick = |ours: Duration, theirs: u64| {
            if ours.is_zero() || theirs == 0 {
                Duration::ZERO
            } else {
                ours.max(Duration::from_millis(theirs))
            }
        };

        (pick(offer.0, server_receive), pick(offer.1, server_send))
    }

    /// Serialize to wire text, NUL terminated.
    pub fn encode(&self) -> String {
        let escape = self.command.escapes_headers();
        let mut out = String::with_capacity(self.body.len() + 64);
        out.push_str(self.command.as_str());
        out.push('\n');
        for (name, value) in &self.headers {
            if escape {
                out.push_str(&escape_header(name));
                out.push(':');
                out.push_str(&escape_header(value));
            } else {
                out.push_str(name);
                out.push(':');
                out.push_str(value);
            }
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push(NUL);
        out
    }

    /// Parse one frame. Returns `Ok(None)` for a heart-beat.
    pub fn decode(text: &str) -> Result<Option<Frame>, FrameError> {
        let text = text.trim_start_matches(is_eol);
        if text.is_empty() || text == "\0" {
            return Ok(None);
        }

        let (command_line, mut rest) = split_line(text);
        let command = Command::parse(command_line)
            .ok_or_else(|| FrameError::UnknownCommand(command_line.to_string()))?;

        let mut headers = Vec::new();
        loop {
            if rest.is_empty() {
                break;
            }
            let (line, remaining) = split_line(rest);
            rest = remaining;
            if line.is_empty() {
                break;
            }
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| FrameError::MalformedHeader(line.to_string()))?;
            if command.escapes_headers() {
                headers.push((unescape_header(name)?, unescape_header(value)?));
            } else {
                headers.push((name.to_string(), value.to_string()));
            }
        }

        let mut frame = Frame {
            command,
            headers,
            body: String::new(),
        };

        frame.body = match frame.get("content-length") {
            Some(length) => {
                let length: usize = length
                    .trim()
                    .parse()
                    .map_err(|_| FrameError::InvalidContentLength(length.to_string()))?;
                rest.get(..length)
                    .ok_or_else(|| FrameError::InvalidContentLength(length.to_string()))?
                    .to_string()
            }
            None => match rest.find(NUL) {
                Some(end) => rest[..end].to_string(),
                None => rest.to_string(),
            },
        };

        Ok(Some(frame))
    }

    /// Parse every frame in a transport message.
    ///
    /// Brokers usually send one frame per WebSocket message but may batch
    /// several or interleave heart-beats.
    pub fn decode_all(text: &str) -> Vec<Result<Frame, FrameError>> {
        let mut frames = Vec::new();
        let mut rest = text;
        loop {
            rest = rest.trim_start_matches(is_eol);
            if rest.is_empty() {
                break;
            }
            let end = frame_end(rest);
            match Frame::decode(&rest[..end]) {
                Ok(Some(frame)) => frames.push(Ok(frame)),
                Ok(None) => {}
                Err(e) => frames.push(Err(e)),
            }
            rest = rest.get(end + 1..).unwrap_or("");
        }
        frames
    }
}

/// Byte offset of the NUL that ends the frame at the start of `text`,
/// honouring content-length so bodies may contain NUL.
fn frame_end(text: &str) -> usize {
    let header_end = text.find("\n\n").or_else(|| text.find("\r\n\r\n"));
    if let Some(header_end) = header_end {
        let head = &text[..header_end];
        let body_start = if text[header_end..].starts_with("\n\n") {
            header_end + 2
        } else {
            header_end + 4
        };
        let length = head.lines().find_map(|line| {
            line.strip_prefix("content-length:")
                .and_then(|v| v.trim().parse::<usize>().ok())
        });
        if let Some(length) = length {
            let end = body_start + length;
            if end <= text.len() && text.is_char_boundary(end) {
                return end;
            }
        }
        if let Some(offset) = text[body_start.min(text.len())..].find(NUL) {
            return body_start + offset;
        }
    }
    text.find(NUL).unwrap_or(text.len())
}

fn is_eol(c: char) -> bool {
    c == '\r' || c == '\n'
}

fn split_line(text: &str) -> (&str, &str) {
    match text.find('\n') {
        Some(i) => (text[..i].trim_end_matches('\r'), &text[i + 1..]),
        None => (text.trim_end_matches('\r'), ""),
    }
}

fn escape_header(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            ':' => out.push_str("\\c"),
            other => out.push(other),
        }
    }
    out
}

fn unescape_header(value: &str) -> Result<String, FrameError> {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some('c') => out.push(':'),
            _ => return Err(FrameError::InvalidEscape(value.to_string())),
        }
    }
    Ok(out)
}

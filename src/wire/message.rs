//! HTTP message model: header lines plus an optional opaque body.

const LINE_END: &str = "\r\n";

/// One HTTP request or response as read off the wire.
///
/// `headers` holds every line of the header block with its `\r\n` terminator,
/// start line first and the structural blank line last, so concatenating them
/// reproduces the block exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpMessage {
    pub headers: Vec<String>,
    pub body: Option<Vec<u8>>,
}

impl HttpMessage {
    /// Split a raw header block (ending in an empty line) into header lines.
    pub fn from_header_block(block: &[u8]) -> Self {
        let text = decode_latin1(block);
        let mut lines: Vec<String> = text.split(LINE_END).map(str::to_string).collect();
        lines.pop();
        for line in &mut lines {
            line.push_str(LINE_END);
        }

        Self {
            headers: lines,
            body: None,
        }
    }

    /// Request line or status line, without its terminator.
    pub fn start_line(&self) -> Option<&str> {
        self.headers
            .first()
            .map(|line| line.trim_end_matches(LINE_END))
    }

    /// Header fields after the start line as `(name, value)` pairs.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.headers.iter().skip(1).filter_map(|line| split_field(line))
    }

    /// Value of the last field called `name` (ASCII case-insensitive).
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields()
            .filter(|(field, _)| field.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
            .last()
    }

    pub fn host(&self) -> Option<&str> {
        self.field("Host").filter(|host| !host.is_empty())
    }

    /// The header block exactly as it will be written.
    pub fn header_bytes(&self) -> Vec<u8> {
        self.headers
            .iter()
            .flat_map(|line| encode_latin1(line))
            .collect()
    }

    /// Header block followed by the body, if any.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.header_bytes();
        if let Some(body) = &self.body {
            bytes.extend_from_slice(body);
        }
        bytes
    }

    /// Header block with CR and LF made visible, for diagnostics.
    pub fn escaped_headers(&self) -> String {
        self.headers
            .concat()
            .replace('\r', "\\r")
            .replace('\n', "\\n")
    }
}

fn split_field(line: &str) -> Option<(&str, &str)> {
    let line = line.trim_end_matches(LINE_END);
    let (name, value) = line.split_once(':')?;
    Some((name.trim(), value.trim()))
}

/// Map each octet onto the char with the same code point.
pub(crate) fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&byte| char::from(byte)).collect()
}

/// Inverse of [`decode_latin1`]; chars outside ISO-8859-1 become `?`.
pub(crate) fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

use crate::http::request::{Method, RequestLine, Version};

#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    InvalidRequest,
    InvalidMethod,
    InvalidVersion,
}

/// Parses `METHOD SP TARGET SP HTTP/D.D`, with an optional trailing CRLF.
///
/// Any well-formed single digit version is accepted here; deciding whether
/// the server speaks it is left to the caller.
pub fn parse_request_line(line: &str) -> Result<RequestLine, ParseError> {
    let line = line.trim_end_matches(['\r', '\n']);

    let mut parts = line.split(' ');
    let method_str = parts.next().ok_or(ParseError::InvalidRequest)?;
    let target = parts.next().ok_or(ParseError::InvalidRequest)?;
    let version_str = parts.next().ok_or(ParseError::InvalidRequest)?;

    if parts.next().is_some() || target.is_empty() {
        return Err(ParseError::InvalidRequest);
    }

    let method = Method::from_str(method_str).ok_or(ParseError::InvalidMethod)?;
    let version = parse_version(version_str)?;

    Ok(RequestLine {
        method,
        target: target.to_string(),
        version,
    })
}

fn parse_version(s: &str) -> Result<Version, ParseError> {
    let digits = s.strip_prefix("HTTP/").ok_or(ParseError::InvalidVersion)?;

    match digits.as_bytes() {
        [major, b'.', minor] if major.is_ascii_digit() && minor.is_ascii_digit() => Ok(Version {
            major: major - b'0',
            minor: minor - b'0',
        }),
        _ => Err(ParseError::InvalidVersion),
    }
}

/// Splits a header line on its first colon. Lenient about whitespace; lines
/// without a colon yield `None`.
pub fn parse_header_line(line: &str) -> Option<(String, String)> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (key, value) = line.split_once(':')?;

    Some((key.trim().to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let parsed = parse_request_line("GET / HTTP/1.1\r\n").unwrap();

        assert_eq!(parsed.method, Method::GET);
        assert_eq!(parsed.target, "/");
        assert_eq!(parsed.version, Version::HTTP_11);
    }

    #[test]
    fn header_without_space_after_colon() {
        assert_eq!(
            parse_header_line("Host:example.com\r\n"),
            Some(("Host".to_string(), "example.com".to_string()))
        );
    }
}

use std::fmt;

/// HTTP request methods.
///
/// Only the two methods that never carry a request body are served.
/// Anything else on the request line is answered with 400 Bad Request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// HEAD - Like GET but without the response body
    HEAD,
}

impl Method {
    /// Parses an HTTP method from a string.
    ///
    /// # Returns
    ///
    /// `Some(Method)` if the string matches a served method, `None` otherwise.
    ///
    /// # Example
    ///
    /// ```
    /// # use parkway::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), None);
    /// assert_eq!(Method::from_str("POST"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            "HEAD" => Some(Method::HEAD),
            _ => None,
        }
    }

    /// Returns true when the response body must not be written.
    pub fn suppresses_body(&self) -> bool {
        matches!(self, Method::HEAD)
    }
}

/// Protocol version taken from `HTTP/MAJOR.MINOR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    pub const HTTP_10: Version = Version { major: 1, minor: 0 };
    pub const HTTP_11: Version = Version { major: 1, minor: 1 };

    /// Only 1.0 and 1.1 are served; everything else gets a 501.
    pub fn is_supported(&self) -> bool {
        *self == Self::HTTP_10 || *self == Self::HTTP_11
    }

    /// HTTP/1.1 connections are persistent by default.
    pub fn is_persistent(&self) -> bool {
        *self == Self::HTTP_11
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// The first line of a request, as it came off the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: Method,
    pub target: String,
    pub version: Version,
}

/// Represents a parsed HTTP request from a client.
///
/// Lives for exactly one exchange on a connection. No body is ever read.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method (GET or HEAD)
    pub method: Method,
    /// The request target (e.g., "/index.html")
    pub path: String,
    /// Protocol version from the request line
    pub version: Version,
    /// Request headers in arrival order
    pub headers: Vec<(String, String)>,
}

impl Request {
    pub fn new(line: RequestLine, headers: Vec<(String, String)>) -> Self {
        Self {
            method: line.method,
            path: line.target,
            version: line.version,
            headers,
        }
    }

    /// Retrieves the first header value with the given name, ignoring case.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// True if the client asked for the connection to be closed after this
    /// exchange.
    pub fn wants_close(&self) -> bool {
        self.header("Connection")
            .map(|v| v.eq_ignore_ascii_case("close"))
            .unwrap_or(false)
    }

    /// Whether the connection may carry another request after this one.
    pub fn keep_alive(&self) -> bool {
        self.version.is_persistent() && !self.wants_close()
    }
}

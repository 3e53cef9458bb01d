use serde::Serialize;

/// HTTP status codes supported by the server.
///
/// Common HTTP status codes used in responses:
/// - `Ok` (200): Request successful
/// - `Created` (201): Resource created successfully
/// - `NoContent` (204): Successful request with no content
/// - `BadRequest` (400): Malformed request
/// - `NotFound` (404): Resource not found
/// - `MethodNotAllowed` (405): HTTP method not supported
/// - `RequestTimeout` (408): Client did not finish sending in time
/// - `InternalServerError` (500): Server error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 201 Created
    Created,
    /// 204 No Content
    NoContent,
    /// 400 Bad Request
    BadRequest,
    /// 404 Not Found
    NotFound,
    /// 405 Method Not Allowed
    MethodNotAllowed,
    /// 408 Request Timeout
    RequestTimeout,
    /// 500 Internal Server Error
    InternalServerError,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use coinvault::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::Created => 201,
            StatusCode::NoContent => 204,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
            StatusCode::RequestTimeout => 408,
            StatusCode::InternalServerError => 500,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use coinvault::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::NoContent => "No Content",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::RequestTimeout => "Request Timeout",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }

    pub fn is_server_error(&self) -> bool {
        self.as_u16() >= 500
    }
}

/// Represents a complete HTTP response ready to be sent to a client.
///
/// Headers keep their insertion order, which is the order they are
/// written on the wire.
#[derive(Debug, Clone)]
pub struct Response {
    /// The HTTP status code
    pub status: StatusCode,
    /// Reason phrase for the status line, normally the standard one
    pub reason: String,
    /// HTTP headers in insertion order
    pub headers: Vec<(String, String)>,
    /// Response body as bytes; empty means nothing is written after the headers
    pub body: Vec<u8>,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .header("Content-Type", "application/json")
///     .body(b"{}".to_vec())
///     .build();
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    reason: Option<String>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl ResponseBuilder {
    /// Creates a new response builder with the specified status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            reason: None,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Overrides the reason phrase on the status line.
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Adds or replaces a header.
    ///
    /// Names compare case-insensitively; a replaced header keeps its
    /// original position.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&key))
        {
            Some(existing) => existing.1 = value,
            None => self.headers.push((key, value)),
        }
        self
    }

    /// Sets the response body.
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Builds the final Response.
    ///
    /// Appends a Content-Length header computed from the body if the caller
    /// did not set one.
    pub fn build(self) -> Response {
        let mut headers = self.headers;
        if !headers
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case("Content-Length"))
        {
            headers.push(("Content-Length".to_string(), self.body.len().to_string()));
        }

        Response {
            status: self.status,
            reason: self
                .reason
                .unwrap_or_else(|| self.status.reason_phrase().to_string()),
            headers,
            body: self.body,
        }
    }
}

impl Response {
    pub fn builder(status: StatusCode) -> ResponseBuilder {
        ResponseBuilder::new(status)
    }

    /// Creates a simple 200 OK response with the given body.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        ResponseBuilder::new(StatusCode::Ok)
            .body(body.into())
            .build()
    }

    /// Serializes `value` as the JSON body of a response with the given status.
    pub fn json<T: Serialize + ?Sized>(
        status: StatusCode,
        value: &T,
    ) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        Ok(ResponseBuilder::new(status)
            .header("Content-Type", "application/json")
            .body(body)
            .build())
    }

    /// 204 No Content; the writer sends no body bytes at all.
    pub fn no_content() -> Self {
        ResponseBuilder::new(StatusCode::NoContent).build()
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

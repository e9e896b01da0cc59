use std::{
    fmt,
    io::{self, Write},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single frame exchanged with the broker.
///
/// Requests built by the client travel through the outgoing queue; messages
/// delivered by the broker are wrapped in a `GET /queue/<name>` request that
/// carries the delivered body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    uri: String,
    body: Option<String>,
}

impl Request {
    pub fn new(method: Method, uri: impl Into<String>, body: Option<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            body,
        }
    }

    /// `PUT /topic/<topic>` carrying `body`.
    pub fn publish(topic: &str, body: impl Into<String>) -> Self {
        Self::new(Method::Put, format!("/topic/{topic}"), Some(body.into()))
    }

    /// `PUT /subscription/<name>/<topic>`.
    pub fn subscribe(name: &str, topic: &str) -> Self {
        Self::new(Method::Put, subscription_uri(name, topic), None)
    }

    /// `DELETE /subscription/<name>/<topic>`.
    pub fn unsubscribe(name: &str, topic: &str) -> Self {
        Self::new(Method::Delete, subscription_uri(name, topic), None)
    }

    /// `GET /queue/<name>`, the puller's poll.
    pub fn poll(name: &str) -> Self {
        Self::new(Method::Get, queue_uri(name), None)
    }

    /// A message delivered by the broker for the queue of `name`.
    pub fn delivery(name: &str, body: String) -> Self {
        Self::new(Method::Get, queue_uri(name), Some(body))
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn into_body(self) -> Option<String> {
        self.body
    }

    /// Encode the frame:
    ///
    /// ```text
    /// METHOD URI HTTP/1.0\r\n
    /// Content-Length: <N>\r\n
    /// \r\n
    /// BODY
    /// ```
    ///
    /// The `Content-Length` header and the body are only present when the
    /// request has a body.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = format!("{} {} HTTP/1.0\r\n", self.method, self.uri).into_bytes();
        match &self.body {
            Some(body) => {
                let header = format!("Content-Length: {}\r\n\r\n", body.len());
                buf.extend_from_slice(header.as_bytes());
                buf.extend_from_slice(body.as_bytes());
            }
            None => buf.extend_from_slice(b"\r\n"),
        }
        buf
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(&self.encode())?;
        writer.flush()
    }
}

fn subscription_uri(name: &str, topic: &str) -> String {
    format!("/subscription/{name}/{topic}")
}

fn queue_uri(name: &str) -> String {
    format!("/queue/{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_request() {
        let request = Request::publish("topicA", "hello");

        assert_eq!(request.method(), Method::Put);
        assert_eq!(request.uri(), "/topic/topicA");
        assert_eq!(request.body(), Some("hello"));
    }

    #[test]
    fn subscription_requests() {
        let subscribe = Request::subscribe("alice", "weather");
        let unsubscribe = Request::unsubscribe("alice", "weather");

        assert_eq!(subscribe.method(), Method::Put);
        assert_eq!(unsubscribe.method(), Method::Delete);
        assert_eq!(subscribe.uri(), "/subscription/alice/weather");
        assert_eq!(subscribe.uri(), unsubscribe.uri());
        assert_eq!(subscribe.body(), None);
        assert_eq!(unsubscribe.body(), None);
    }

    #[test]
    fn encode_with_body() {
        let request = Request::publish("news", "héllo");

        let encoded = String::from_utf8(request.encode()).unwrap();
        assert_eq!(
            encoded,
            "PUT /topic/news HTTP/1.0\r\nContent-Length: 6\r\n\r\nhéllo"
        );
    }

    #[test]
    fn encode_without_body() {
        let request = Request::poll("alice");

        let encoded = String::from_utf8(request.encode()).unwrap();
        assert_eq!(encoded, "GET /queue/alice HTTP/1.0\r\n\r\n");
        assert!(!encoded.contains("Content-Length"));
    }

    #[test]
    fn encode_empty_body_keeps_header() {
        let request = Request::publish("news", "");

        let encoded = String::from_utf8(request.encode()).unwrap();
        assert_eq!(encoded, "PUT /topic/news HTTP/1.0\r\nContent-Length: 0\r\n\r\n");
    }

    #[test]
    fn write_to_stream() {
        let mut out = Vec::new();
        Request::unsubscribe("bob", "sports")
            .write_to(&mut out)
            .unwrap();

        assert_eq!(out, b"DELETE /subscription/bob/sports HTTP/1.0\r\n\r\n");
    }
}

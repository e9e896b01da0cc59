//! Client-broker communication protocol.
//!
//! This module defines the plain-text protocol spoken between a Mercury client and
//! the message broker: the request frames the client sends, the poll responses it
//! decodes, and the connector used to open a byte stream for each exchange.
//!
//! # Overview
//!
//! Every operation is a single HTTP/1.0-style exchange over a freshly opened
//! connection. Nothing is kept alive between requests; the connection is dropped
//! as soon as the frame has been written (or the response read).
//!
//! | Operation   | Method   | URI                               | Body         |
//! |-------------|----------|-----------------------------------|--------------|
//! | publish     | `PUT`    | `/topic/<topic>`                  | message text |
//! | subscribe   | `PUT`    | `/subscription/<client>/<topic>`  | none         |
//! | unsubscribe | `DELETE` | `/subscription/<client>/<topic>`  | none         |
//! | poll        | `GET`    | `/queue/<client>`                 | none         |
//!
//! # Framing
//!
//! - Requests start with `METHOD URI HTTP/1.0\r\n`. A request with a body adds a
//!   `Content-Length` header, the blank line and the body; one without a body ends
//!   right after the blank line.
//! - Poll responses are only accepted with a `200 OK` status line. Headers run until
//!   a blank line and the body is read according to [`BodyFraming`].
//!
//! # Key Components
//!
//! - [`Request`]: A method/URI/body frame, also used to carry delivered messages.
//! - [`Response`]: A decoded `200 OK` poll response.
//! - [`Connector`]: Opens the byte stream for one exchange ([`TcpConnector`] for TCP).
//! - [`ProtocolTransport`]: Writes requests to and reads responses from a stream.
//!
//! # See Also
//!
//! - [`client`](crate::client): Workers that drive these exchanges.
mod request;
mod response;
mod transport;

pub use request::{Method, Request};
pub use response::{BodyFraming, Response};
pub use transport::{Connector, ProtocolTransport, TcpConnector, TransportError};

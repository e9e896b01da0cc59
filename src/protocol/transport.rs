use std::{
    io::{self, BufReader, Read, Write},
    net::{TcpStream, ToSocketAddrs},
    time::Duration,
};

use log::trace;
use thiserror::Error;

use super::{BodyFraming, Request, Response};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport io error: {0}")]
    Io(#[from] io::Error),
    #[error("no address found for {0}")]
    Unresolved(String),
    #[error("connection closed before a status line was read")]
    Closed,
    #[error("unexpected status '{0}'")]
    Status(String),
    #[error("stream ended before the end of the headers")]
    UnterminatedHeaders,
    #[error("body shorter than its content length: expected {expected} bytes, read {read}")]
    ShortBody { expected: usize, read: usize },
}

/// Opens one duplex byte stream to the broker per request.
pub trait Connector: Send + Sync + 'static {
    type Stream: Read + Write;

    fn connect(&self) -> Result<Self::Stream, TransportError>;
}

/// [`Connector`] over plain TCP to `host:port`.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    host: String,
    port: u16,
    timeout: Option<Duration>,
}

impl TcpConnector {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: None,
        }
    }

    /// Bound connect, read and write calls. `None` blocks indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Connector for TcpConnector {
    type Stream = TcpStream;

    fn connect(&self) -> Result<TcpStream, TransportError> {
        let address = self.address();
        let mut last_err = None;

        for addr in (self.host.as_str(), self.port).to_socket_addrs()? {
            let attempt = match self.timeout {
                Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => {
                    stream.set_read_timeout(self.timeout)?;
                    stream.set_write_timeout(self.timeout)?;
                    trace!("connected to {address} via {addr}");
                    return Ok(stream);
                }
                Err(e) => last_err = Some(e),
            }
        }

        Err(last_err
            .map(TransportError::Io)
            .unwrap_or_else(|| TransportError::Unresolved(address)))
    }
}

/// One request/response exchange over a freshly opened stream.
pub struct ProtocolTransport<T: Read + Write> {
    stream: BufReader<T>,
    framing: BodyFraming,
}

impl<T: Read + Write> ProtocolTransport<T> {
    pub fn new(stream: T, framing: BodyFraming) -> Self {
        Self {
            stream: BufReader::new(stream),
            framing,
        }
    }

    pub fn write_request(&mut self, req: &Request) -> Result<(), TransportError> {
        trace!("-> {} {}", req.method(), req.uri());
        req.write_to(self.stream.get_mut())?;
        Ok(())
    }

    pub fn read_response(&mut self) -> Result<Response, TransportError> {
        let resp = Response::read_from(&mut self.stream, self.framing)?;
        trace!("<- {} ({} body bytes)", resp.status, resp.body.len());
        Ok(resp)
    }

    pub fn into_inner(self) -> T {
        self.stream.into_inner()
    }
}

//! Blocking TCP listener.
//!
//! Serves exactly one connection at a time: accept, read once, reply,
//! close. A second client waits in the kernel backlog until the current
//! exchange has finished. Any I/O failure or non-UTF-8 payload ends the
//! loop.

use crate::config::Config;
use crate::message::Message;
use bytes::{Bytes, BytesMut};
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::str::Utf8Error;
use tracing::{debug, info, trace};

/// The bound, listening socket plus the per-connection settings.
pub struct Listener {
    inner: TcpListener,
    read_limit: usize,
    reply: Bytes,
}

/// Record of one served connection.
#[derive(Debug)]
pub struct Exchange {
    pub peer: SocketAddr,
    pub message: Message,
    /// Reply bytes written before closing.
    pub replied: usize,
}

impl Listener {
    /// Bind and listen on `config.listen` with `config.backlog`.
    pub fn bind(config: &Config) -> Result<Self, ServeError> {
        let addr: SocketAddr = config.listen.parse().map_err(|e| {
            ServeError::Bind(
                config.listen.clone(),
                io::Error::new(io::ErrorKind::InvalidInput, e),
            )
        })?;

        let inner = create_listener(addr, config.backlog)
            .map_err(|e| ServeError::Bind(config.listen.clone(), e))?;

        let listener = Listener {
            inner,
            read_limit: config.read_limit,
            reply: Bytes::from(config.reply.clone().into_bytes()),
        };

        let bound = listener
            .local_addr()
            .map_err(|e| ServeError::Bind(config.listen.clone(), e))?;
        info!(address = %bound, backlog = config.backlog, "Server listening");

        Ok(listener)
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    /// Accept and serve connections until the first error.
    pub fn serve_forever(&self) -> Result<(), ServeError> {
        loop {
            let exchange = self.serve_one()?;
            trace!(
                peer = %exchange.peer,
                received = exchange.message.len(),
                replied = exchange.replied,
                "Exchange complete"
            );
        }
    }

    /// Accept a single connection and run its one request/response cycle.
    pub fn serve_one(&self) -> Result<Exchange, ServeError> {
        let (mut stream, peer) = self.inner.accept().map_err(ServeError::Accept)?;
        info!(peer = %peer, "Connection established");

        let mut buffer = BytesMut::zeroed(self.read_limit);
        let n =
            read_once(&mut stream, &mut buffer).map_err(|e| ServeError::Receive(peer, e))?;
        buffer.truncate(n);
        let message = Message::new(buffer.freeze());
        if message.is_empty() {
            debug!(peer = %peer, "Peer closed without sending data");
        }

        let text = message.text().map_err(|e| ServeError::Decode(peer, e))?;
        info!(peer = %peer, len = message.len(), data = %text, "Received data");

        stream
            .write_all(&self.reply)
            .map_err(|e| ServeError::Send(peer, e))?;
        debug!(peer = %peer, bytes = self.reply.len(), "Reply sent");

        drop(stream);
        debug!(peer = %peer, "Connection closed");

        Ok(Exchange {
            peer,
            message,
            replied: self.reply.len(),
        })
    }
}

/// A single `read`, retried only when a signal interrupts it.
fn read_once(stream: &mut impl Read, buffer: &mut [u8]) -> io::Result<usize> {
    loop {
        match stream.read(buffer) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            result => return result,
        }
    }
}

/// Create a blocking TCP listener with the requested backlog.
fn create_listener(addr: SocketAddr, backlog: i32) -> io::Result<TcpListener> {
    let socket = socket2::Socket::new(
        match addr {
            SocketAddr::V4(_) => socket2::Domain::IPV4,
            SocketAddr::V6(_) => socket2::Domain::IPV6,
        },
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(backlog)?;

    Ok(socket.into())
}

/// Errors that stop the listener.
#[derive(Debug)]
pub enum ServeError {
    Bind(String, io::Error),
    Accept(io::Error),
    Receive(SocketAddr, io::Error),
    /// Received data is not valid UTF-8; no reply is sent.
    Decode(SocketAddr, Utf8Error),
    Send(SocketAddr, io::Error),
}

impl std::fmt::Display for ServeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServeError::Bind(addr, e) => write!(f, "Failed to bind '{addr}': {e}"),
            ServeError::Accept(e) => write!(f, "Failed to accept connection: {e}"),
            ServeError::Receive(peer, e) => write!(f, "Failed to receive from {peer}: {e}"),
            ServeError::Decode(peer, e) => write!(f, "Invalid data from {peer}: {e}"),
            ServeError::Send(peer, e) => write!(f, "Failed to send to {peer}: {e}"),
        }
    }
}

impl std::error::Error for ServeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServeError::Bind(_, e)
            | ServeError::Accept(e)
            | ServeError::Receive(_, e)
            | ServeError::Send(_, e) => Some(e),
            ServeError::Decode(_, e) => Some(e),
        }
    }
}

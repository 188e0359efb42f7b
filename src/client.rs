//! One-shot client for poking a running listener.

use bytes::Bytes;
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use tracing::debug;

/// Send `payload`, half-close, and collect the reply until the server closes.
///
/// The write half is shut down so the server's single read returns even
/// for an empty payload.
pub fn send<A: ToSocketAddrs>(addr: A, payload: &[u8]) -> io::Result<Bytes> {
    let mut stream = TcpStream::connect(addr)?;
    let peer = stream.peer_addr()?;
    debug!(peer = %peer, len = payload.len(), "Sending message");

    stream.write_all(payload)?;
    stream.shutdown(Shutdown::Write)?;

    let mut reply = Vec::new();
    stream.read_to_end(&mut reply)?;
    debug!(peer = %peer, len = reply.len(), "Reply received");

    Ok(Bytes::from(reply))
}

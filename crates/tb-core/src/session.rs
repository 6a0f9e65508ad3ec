//! Session channel: one TCP connection, one request/response cycle at a time
//!
//! A [`Session`] owns its socket exclusively. It moves through
//!
//! ```text
//! Open --send--> AwaitingResponse --receive--> Open ... --close--> Closed
//! ```
//!
//! Any failure closes the session, and dropping it closes the socket, so the
//! connection is released on every exit path without explicit `close()` calls.

use std::io::Write;
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tb_protocol::{
    decode_response, encode_request_parts, MeshRecord, PropertyBag, PROTOCOL_VERSION,
};

use crate::config::ClientConfig;
use crate::error::{ConnectionError, ReceptionError, TransmissionError};

/// Where a session is in its request/response cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, ready to send
    Open,
    /// Request sent, response not yet read
    AwaitingResponse,
    /// Socket released; terminal
    Closed,
}

/// A connection to the geometry server
#[derive(Debug)]
pub struct Session {
    stream: Option<TcpStream>,
    peer: String,
    state: SessionState,
}

impl Session {
    /// Connect using `config`. Connection failures are never retried.
    pub fn open(config: &ClientConfig) -> Result<Self, ConnectionError> {
        let address = config.address();
        tracing::debug!(
            protocol = PROTOCOL_VERSION,
            "Connecting to toxicblend server at {}",
            address
        );

        let candidates = address
            .to_socket_addrs()
            .map_err(|source| ConnectionError::Resolve {
                address: address.clone(),
                source,
            })?;

        // Resolution may yield several addresses (e.g. ::1 and 127.0.0.1 for
        // localhost); the first that accepts wins.
        let mut last_error = None;
        for candidate in candidates {
            let attempt = if config.connect_timeout.is_zero() {
                TcpStream::connect(candidate)
            } else {
                TcpStream::connect_timeout(&candidate, config.connect_timeout)
            };
            match attempt {
                Ok(stream) => return Self::from_stream(stream, address, config.io_timeout),
                Err(e) => {
                    tracing::trace!(%candidate, error = %e, "Connect attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(match last_error {
            Some(source) => ConnectionError::Connect { address, source },
            None => ConnectionError::NoAddress(address),
        })
    }

    /// Connect to `host:port` with default timeouts
    pub fn connect(host: &str, port: u16) -> Result<Self, ConnectionError> {
        Self::open(&ClientConfig::new(host, port))
    }

    fn from_stream(
        stream: TcpStream,
        peer: String,
        io_timeout: Option<Duration>,
    ) -> Result<Self, ConnectionError> {
        stream
            .set_read_timeout(io_timeout)
            .and_then(|()| stream.set_write_timeout(io_timeout))
            .and_then(|()| stream.set_nodelay(true))
            .map_err(ConnectionError::Socket)?;

        tracing::debug!(peer = %peer, "Session open");
        Ok(Self {
            stream: Some(stream),
            peer,
            state: SessionState::Open,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    /// Address this session was opened against
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Encode and transmit one request.
    ///
    /// The whole frame is written before this returns. On any failure the
    /// session is closed, including a send while a response is still unread.
    pub fn send(
        &mut self,
        command: &str,
        properties: &PropertyBag,
        mesh: Option<&MeshRecord>,
    ) -> Result<(), TransmissionError> {
        match self.state {
            SessionState::Open => {}
            SessionState::AwaitingResponse => {
                return Err(self.fail(TransmissionError::OutOfSequence))
            }
            SessionState::Closed => return Err(TransmissionError::Closed),
        }

        let meshes = mesh.map(std::slice::from_ref).unwrap_or_default();
        let frame = match encode_request_parts(command, properties, meshes) {
            Ok(frame) => frame,
            Err(e) => return Err(self.fail(e.into())),
        };

        let stream = self.stream.as_mut().ok_or(TransmissionError::Closed)?;
        // write_all loops over short writes until the frame is flushed
        if let Err(e) = stream.write_all(&frame).and_then(|()| stream.flush()) {
            return Err(self.fail(e.into()));
        }

        tracing::debug!(
            peer = %self.peer,
            command,
            properties = properties.len(),
            meshes = meshes.len(),
            bytes = frame.len(),
            "Request sent"
        );
        self.state = SessionState::AwaitingResponse;
        Ok(())
    }

    /// Read the complete response to the last request
    pub fn receive(&mut self) -> Result<Vec<MeshRecord>, ReceptionError> {
        let mut meshes = Vec::new();
        self.receive_each(|mesh| meshes.push(mesh))?;
        Ok(meshes)
    }

    /// Read the response to the last request, handing each mesh to
    /// `on_mesh` as soon as it is complete. Returns the number of meshes.
    ///
    /// Meshes already handed over before a failure belong to a response
    /// that is then reported as failed as a whole. Receiving with nothing
    /// sent also closes the session.
    pub fn receive_each<F>(&mut self, mut on_mesh: F) -> Result<usize, ReceptionError>
    where
        F: FnMut(MeshRecord),
    {
        match self.state {
            SessionState::AwaitingResponse => {}
            SessionState::Open => return Err(self.fail(ReceptionError::NothingSent)),
            SessionState::Closed => return Err(ReceptionError::Closed),
        }

        let stream = self.stream.as_mut().ok_or(ReceptionError::Closed)?;
        let mut count = 0;
        let mut failure = None;
        for item in decode_response(stream) {
            match item {
                Ok(mesh) => {
                    count += 1;
                    on_mesh(mesh);
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        if let Some(e) = failure {
            return Err(self.fail(e.into()));
        }

        tracing::debug!(peer = %self.peer, meshes = count, "Response received");
        self.state = SessionState::Open;
        Ok(count)
    }

    /// Release the socket. Calling this again does nothing.
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.shutdown(Shutdown::Both) {
                // The peer may already have torn the connection down
                tracing::trace!(peer = %self.peer, error = %e, "Shutdown failed");
            }
            tracing::debug!(peer = %self.peer, "Session closed");
        }
        self.state = SessionState::Closed;
    }

    /// Close after a failure and hand the error back
    fn fail<E: std::fmt::Display>(&mut self, error: E) -> E {
        tracing::warn!(peer = %self.peer, "Exchange failed, closing session: {}", error);
        self.close();
        error
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;
    use std::thread;

    use tb_protocol::{ResponseCodec, ResponseItem};
    use tokio_util::codec::Encoder;

    fn listener() -> (TcpListener, ClientConfig) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, ClientConfig::new("127.0.0.1", port))
    }

    fn response_bytes(items: Vec<ResponseItem>) -> Vec<u8> {
        let mut codec = ResponseCodec::new();
        let mut buf = bytes::BytesMut::new();
        for item in items {
            codec.encode(item, &mut buf).unwrap();
        }
        buf.to_vec()
    }

    #[test]
    fn test_connection_refused() {
        let (listener, config) = listener();
        drop(listener);

        let result = Session::open(&config);
        assert!(matches!(result, Err(ConnectionError::Connect { .. })));
    }

    #[test]
    fn test_close_is_idempotent() {
        let (listener, config) = listener();
        let server = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut rest = Vec::new();
            socket.read_to_end(&mut rest).unwrap();
            rest.len()
        });

        let mut session = Session::open(&config).unwrap();
        assert_eq!(session.state(), SessionState::Open);
        session.close();
        session.close();
        assert!(session.is_closed());

        // The server saw a clean close and no data
        assert_eq!(server.join().unwrap(), 0);
    }

    #[test]
    fn test_operations_after_close_fail() {
        let (listener, config) = listener();
        let _server = thread::spawn(move || listener.accept().map(|_| ()));

        let mut session = Session::open(&config).unwrap();
        session.close();

        assert!(matches!(
            session.send("cmd", &PropertyBag::new(), None),
            Err(TransmissionError::Closed)
        ));
        assert!(matches!(session.receive(), Err(ReceptionError::Closed)));
    }

    #[test]
    fn test_receive_before_send() {
        let (listener, config) = listener();
        let _server = thread::spawn(move || listener.accept().map(|_| ()));

        let mut session = Session::open(&config).unwrap();
        assert!(matches!(session.receive(), Err(ReceptionError::NothingSent)));
        assert!(session.is_closed());
        assert!(matches!(
            session.send("cmd", &PropertyBag::new(), None),
            Err(TransmissionError::Closed)
        ));
    }

    #[test]
    fn test_second_send_without_receive() {
        let (listener, config) = listener();
        let _server = thread::spawn(move || listener.accept().map(|(s, _)| s));

        let mut session = Session::open(&config).unwrap();
        session.send("cmd", &PropertyBag::new(), None).unwrap();
        assert_eq!(session.state(), SessionState::AwaitingResponse);
        assert!(matches!(
            session.send("cmd", &PropertyBag::new(), None),
            Err(TransmissionError::OutOfSequence)
        ));
        assert!(session.is_closed());
        assert!(matches!(session.receive(), Err(ReceptionError::Closed)));
    }

    #[test]
    fn test_encoding_failure_closes_before_writing() {
        let (listener, config) = listener();
        let server = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut rest = Vec::new();
            socket.read_to_end(&mut rest).unwrap();
            rest.len()
        });

        let bad = MeshRecord::new(vec![[0.0; 3]], vec![vec![0, 1]]);
        let mut session = Session::open(&config).unwrap();
        let result = session.send("cmd", &PropertyBag::new(), Some(&bad));

        assert!(matches!(result, Err(TransmissionError::Encoding(_))));
        assert!(session.is_closed());
        assert_eq!(server.join().unwrap(), 0, "no bytes reach the server");
    }

    #[test]
    fn test_truncated_response_closes_session() {
        let (listener, config) = listener();
        let server = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut request = [0u8; 12];
            socket.read_exact(&mut request).unwrap();
            let reply = response_bytes(vec![ResponseItem::Mesh(MeshRecord::new(
                vec![[1.0, 2.0, 3.0]],
                vec![],
            ))]);
            // Half a mesh, then hang up
            socket.write_all(&reply[..reply.len() / 2]).unwrap();
        });

        let mut session = Session::open(&config).unwrap();
        session.send("cmd", &PropertyBag::new(), None).unwrap();
        let result = session.receive();
        server.join().unwrap();

        assert!(matches!(
            result,
            Err(ReceptionError::Decoding(tb_protocol::DecodingError::Truncated { .. }))
        ));
        assert!(session.is_closed());
    }

    #[test]
    fn test_repeated_cycles_on_one_session() {
        let (listener, config) = listener();
        let server = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            for _ in 0..2 {
                let mut request = [0u8; 12];
                socket.read_exact(&mut request).unwrap();
                socket.write_all(&response_bytes(vec![ResponseItem::End])).unwrap();
            }
        });

        let mut session = Session::open(&config).unwrap();
        for _ in 0..2 {
            session.send("cmd", &PropertyBag::new(), None).unwrap();
            assert!(session.receive().unwrap().is_empty());
            assert_eq!(session.state(), SessionState::Open);
        }
        server.join().unwrap();
    }
}

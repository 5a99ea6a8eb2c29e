//! One blocking session with the store

use bytes::{Buf, BytesMut};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;
use sugar_core::{Command, Error, Reply, Result};
use tracing::{debug, trace};

use crate::args::command_args;
use crate::resp::{encode_request, parse_reply, Parsed};

const READ_CHUNK: usize = 16 * 1024;

/// A connected socket plus its read buffer
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    buf: BytesMut,
    broken: bool,
}

fn connection_err(addr: &str, e: std::io::Error) -> Error {
    Error::Connection(format!("{}: {}", addr, e))
}

impl Connection {
    /// Connect to `host:port` and select `db`
    pub fn open(
        host: &str,
        port: u16,
        db: u32,
        connect_timeout: Duration,
        io_timeout: Duration,
    ) -> Result<Self> {
        let addr = format!("{}:{}", host, port);
        let resolved: Vec<SocketAddr> = addr
            .to_socket_addrs()
            .map_err(|e| connection_err(&addr, e))?
            .collect();

        let mut last_err = None;
        let mut stream = None;
        for candidate in &resolved {
            match TcpStream::connect_timeout(candidate, connect_timeout) {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(e) => last_err = Some(e),
            }
        }
        let stream = match (stream, last_err) {
            (Some(s), _) => s,
            (None, Some(e)) => return Err(connection_err(&addr, e)),
            (None, None) => {
                return Err(Error::Connection(format!("{}: no addresses resolved", addr)))
            }
        };

        stream
            .set_read_timeout(Some(io_timeout))
            .and_then(|_| stream.set_write_timeout(Some(io_timeout)))
            .and_then(|_| stream.set_nodelay(true))
            .map_err(|e| connection_err(&addr, e))?;

        let mut conn = Connection {
            stream,
            buf: BytesMut::with_capacity(READ_CHUNK),
            broken: false,
        };
        if db != 0 {
            conn.send_raw(&[b"SELECT".to_vec(), db.to_string().into_bytes()])?
                .into_result()?;
        }
        debug!(target: "sugar::gateway", %addr, db, "Connected");
        Ok(conn)
    }

    /// Whether an I/O failure left the stream in an unknown state
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Send one command and read its reply
    pub fn request(&mut self, command: &Command) -> Result<Reply> {
        trace!(target: "sugar::gateway", cmd = command.name(), "Request");
        self.send_raw(&command_args(command))
    }

    /// Send several argument vectors in one write and read as many replies
    pub fn pipeline(&mut self, requests: &[Vec<Vec<u8>>]) -> Result<Vec<Reply>> {
        let mut out = BytesMut::new();
        for args in requests {
            encode_request(args, &mut out);
        }
        self.write_all(&out)?;
        let mut replies = Vec::with_capacity(requests.len());
        for _ in requests {
            replies.push(self.read_reply()?);
        }
        Ok(replies)
    }

    fn send_raw(&mut self, args: &[Vec<u8>]) -> Result<Reply> {
        let mut out = BytesMut::new();
        encode_request(args, &mut out);
        self.write_all(&out)?;
        self.read_reply()
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.stream.write_all(bytes).map_err(|e| {
            self.broken = true;
            Error::Connection(e.to_string())
        })
    }

    fn read_reply(&mut self) -> Result<Reply> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match parse_reply(&self.buf) {
                Parsed::Complete(reply, used) => {
                    self.buf.advance(used);
                    return Ok(reply);
                }
                Parsed::Invalid(msg) => {
                    self.broken = true;
                    return Err(Error::Protocol(msg));
                }
                Parsed::Incomplete => {}
            }
            let n = self.stream.read(&mut chunk).map_err(|e| {
                self.broken = true;
                Error::Connection(e.to_string())
            })?;
            if n == 0 {
                self.broken = true;
                return Err(Error::Connection("connection closed by peer".to_string()));
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_refused_connection() {
        // Port 1 is privileged and not listening in test environments
        let err = Connection::open(
            "127.0.0.1",
            1,
            0,
            Duration::from_millis(200),
            Duration::from_millis(200),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
    }

    #[test]
    fn test_request_against_scripted_peer() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            let (mut sock, _) = listener.accept().unwrap();
            let mut buf = [0u8; 256];
            let n = sock.read(&mut buf).unwrap();
            assert_eq!(&buf[..n], b"*2\r\n$4\r\nLLEN\r\n$1\r\nk\r\n");
            // Split the reply across two writes
            sock.write_all(b":4").unwrap();
            sock.flush().unwrap();
            thread::sleep(Duration::from_millis(20));
            sock.write_all(b"2\r\n").unwrap();
        });

        let mut conn = Connection::open(
            "127.0.0.1",
            port,
            0,
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .unwrap();
        let reply = conn.request(&Command::LLen("k".into())).unwrap();
        assert_eq!(reply, Reply::Int(42));
        server.join().unwrap();
    }
}

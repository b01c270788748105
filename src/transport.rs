use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::time::Duration;

use tracing::trace;

use crate::message::Message;
use crate::Error;

/// Sends one query to one server and hands back the parsed reply.
///
/// Implementations make a single attempt: a lost datagram or an elapsed
/// timeout is an error, never a retry.
pub trait Transport {
    fn send(&self, query: &Message, server: Ipv4Addr) -> Result<Message, Error>;
}

/// Plain DNS over UDP.
#[derive(Debug, Clone)]
pub struct UdpTransport {
    timeout: Duration,
    port: u16,
}

impl UdpTransport {
    pub fn new(timeout: Duration, port: u16) -> Self {
        Self { timeout, port }
    }
}

impl Transport for UdpTransport {
    fn send(&self, query: &Message, server: Ipv4Addr) -> Result<Message, Error> {
        let addr = SocketAddr::from((server, self.port));
        // port 0 = randomly picked by OS
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_read_timeout(Some(self.timeout))?;
        socket.set_write_timeout(Some(self.timeout))?;
        socket.connect(addr)?;

        let bytes_sent = socket.send(&query.to_query_bytes())?;

        // 4.2.1. UDP usage
        // ...Messages carried by UDP are restricted to 512 bytes (not counting the IP or UDP headers).
        let mut response = [0; 512];
        let bytes_received = socket.recv(&mut response)?;

        trace!(%addr, bytes_sent, bytes_received, "udp exchange");

        let message = Message::with_response(&response[..bytes_received], query)?;
        if message.header.is_truncated() {
            trace!(%addr, "response is truncated, using the records that fit");
        }

        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordType;

    #[test]
    fn test_silent_server_times_out() {
        // A bound socket that never answers.
        let silent = UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = silent.local_addr().unwrap().port();

        let transport = UdpTransport::new(Duration::from_millis(50), port);
        let query = Message::new_query("example.com", &RecordType::A);

        assert!(matches!(
            transport.send(&query, Ipv4Addr::LOCALHOST),
            Err(Error::NetworkError(_))
        ));
    }

    #[test]
    fn test_reply_is_parsed() {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = server.local_addr().unwrap().port();

        let responder = std::thread::spawn(move || {
            let mut buf = [0; 512];
            let (len, peer) = server.recv_from(&mut buf).unwrap();
            // Echo the query back as an empty response: set QR.
            buf[2] |= 0x80;
            server.send_to(&buf[..len], peer).unwrap();
        });

        let transport = UdpTransport::new(Duration::from_secs(2), port);
        let query = Message::new_query("example.com", &RecordType::A);
        let reply = transport.send(&query, Ipv4Addr::LOCALHOST).unwrap();
        responder.join().unwrap();

        assert_eq!(reply.header.id(), query.header.id());
        assert_eq!(reply.question.domain(), "example.com");
        assert!(reply.answers.is_empty());
    }
}

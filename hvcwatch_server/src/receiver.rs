use crossbeam_channel::Sender;
use hvcwatch_common::net::MAX_MESSAGE_BYTES;
use hvcwatch_common::{InboundMessage, Result, WatchError};
use log::{debug, error, info, warn};
use std::io::{ErrorKind, Read};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

/// How long one connection may take to deliver its payload.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// TCP intake receiver for mailbox messages.
///
/// Accepts one JSON-encoded `InboundMessage` per connection and forwards every
/// decoded message into a provided channel. A client that sends garbage only
/// loses its own message; the listener keeps accepting. A client that stays
/// silent is dropped after the read timeout.
pub struct IntakeReceiver {
    socket: TcpListener,
    read_timeout: Duration,
}

impl IntakeReceiver {
    /// Bind a new TCP receiver to `bind_addr` (e.g., `0.0.0.0:8025`).
    pub fn bind(bind_addr: &str) -> Result<Self> {
        let socket = TcpListener::bind(bind_addr)?;
        Ok(Self {
            socket,
            read_timeout: DEFAULT_READ_TIMEOUT,
        })
    }

    /// Replaces the per-connection read timeout. Zero is not allowed by the
    /// socket API and falls back to the default.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = if timeout.is_zero() {
            DEFAULT_READ_TIMEOUT
        } else {
            timeout
        };
        self
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Blocking loop that accepts connections, reads one message per connection
    /// and forwards it to `tx`. Returns when the receiving side of `tx` is gone.
    pub fn receive_loop_with_channel(self, tx: Sender<InboundMessage>) -> Result<()> {
        info!("Intake TCP server is started on {}", self.socket.local_addr()?);

        for stream in self.socket.incoming() {
            match stream {
                Ok(stream) => match read_message(stream, self.read_timeout) {
                    Ok(message) => {
                        debug!("Received message {:?}", message);
                        tx.send(message)
                            .map_err(|e| WatchError::ChannelSend(e.to_string()))?;
                    }
                    Err(e) => warn!("Dropping intake payload: {}", e),
                },
                Err(e) => error!("TCP connection error: {}", e),
            }
        }
        Ok(())
    }
}

/// Reads the whole payload (up to `MAX_MESSAGE_BYTES`) and decodes it.
fn read_message(stream: TcpStream, timeout: Duration) -> Result<InboundMessage> {
    let peer = stream.peer_addr()?;
    stream.set_read_timeout(Some(timeout))?;
    let mut buf = Vec::new();
    if let Err(e) = stream
        .take(MAX_MESSAGE_BYTES as u64 + 1)
        .read_to_end(&mut buf)
    {
        return Err(match e.kind() {
            ErrorKind::WouldBlock | ErrorKind::TimedOut => WatchError::Format(format!(
                "no complete payload from {} within {:?}",
                peer, timeout
            )),
            _ => e.into(),
        });
    }
    if buf.len() > MAX_MESSAGE_BYTES {
        return Err(WatchError::Format(format!(
            "payload from {} exceeds {} bytes",
            peer, MAX_MESSAGE_BYTES
        )));
    }
    debug!("Read {} bytes from {}", buf.len(), peer);
    InboundMessage::from_json_slice(&buf)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::thread;

    use chrono::DateTime;
    use crossbeam_channel::unbounded;

    use super::*;

    fn sample() -> InboundMessage {
        InboundMessage::new(
            Some("Alert: AAPL breakout".to_string()),
            DateTime::parse_from_rfc3339("2024-06-03T10:00:00-04:00").unwrap(),
        )
    }

    #[test]
    fn idle_client_does_not_block_intake() {
        let receiver = IntakeReceiver::bind("127.0.0.1:0")
            .unwrap()
            .with_read_timeout(Duration::from_millis(200));
        let addr = receiver.local_addr().unwrap();
        let (tx, rx) = unbounded();
        thread::spawn(move || receiver.receive_loop_with_channel(tx));

        let _idle = TcpStream::connect(addr).unwrap();
        let mut good = TcpStream::connect(addr).unwrap();
        good.write_all(&sample().to_json_bytes().unwrap()).unwrap();
        drop(good);

        let received = rx.recv_timeout(Duration::from_secs(3)).unwrap();
        assert_eq!(received, sample());
    }

    #[test]
    fn malformed_payload_does_not_stop_the_listener() {
        let receiver = IntakeReceiver::bind("127.0.0.1:0").unwrap();
        let addr = receiver.local_addr().unwrap();
        let (tx, rx) = unbounded();
        thread::spawn(move || receiver.receive_loop_with_channel(tx));

        let mut bad = TcpStream::connect(addr).unwrap();
        bad.write_all(b"not json").unwrap();
        drop(bad);

        let message = sample();
        let mut good = TcpStream::connect(addr).unwrap();
        good.write_all(&message.to_json_bytes().unwrap()).unwrap();
        drop(good);

        let received = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(received, message);
    }
}

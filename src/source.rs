//! Raddec source listening for decoding events from the upstream pipeline.
//!
//! The upstream decoding pipeline pushes raddecs as JSON datagrams over UDP;
//! this module parses them and forwards them over a channel to the ingest
//! loop. Delivery is push-style with no backpressure: malformed datagrams
//! are dropped, and nothing is ever sent back to the producer.

use crate::raddec::Raddec;
use std::io;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;

/// Largest raddec datagram accepted (a full UDP payload).
const MAX_DATAGRAM_BYTES: usize = 65536;

/// UDP listener that feeds parsed raddecs into the aggregation pipeline.
pub struct RaddecSource {
    socket: UdpSocket,
}

impl RaddecSource {
    /// Bind the raddec socket on the given port (0 for an ephemeral port).
    pub async fn bind(port: u16) -> io::Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", port)).await?;
        Ok(Self { socket })
    }

    /// Address the source is listening on.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Receive datagrams until the channel is closed, forwarding each
    /// well-formed raddec.
    pub async fn run(self, tx: mpsc::Sender<Raddec>) {
        let mut buf = vec![0u8; MAX_DATAGRAM_BYTES];

        loop {
            let len = match self.socket.recv(&mut buf).await {
                Ok(len) => len,
                Err(e) => {
                    tracing::warn!("Error receiving raddec datagram: {}", e);
                    continue;
                }
            };

            match serde_json::from_slice::<Raddec>(&buf[..len]) {
                Ok(raddec) => {
                    if tx.send(raddec).await.is_err() {
                        // Ingest loop is gone; stop listening.
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!("Dropping malformed raddec datagram: {}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_receives_and_parses_raddec_datagrams() {
        let source = RaddecSource::bind(0).await.unwrap();
        let addr = source.local_addr().unwrap();
        let (tx, mut rx) = mpsc::channel(16);
        tokio::spawn(source.run(tx));

        let sender = UdpSocket::bind(("127.0.0.1", 0)).await.unwrap();
        let payload = r#"{
            "transmitterId": "aa:bb:cc:dd:ee:ff",
            "rssiSignature": [{ "rssi": -70, "numberOfDecodings": 4 }]
        }"#;
        sender
            .send_to(payload.as_bytes(), ("127.0.0.1", addr.port()))
            .await
            .unwrap();

        let raddec = rx.recv().await.unwrap();
        assert_eq!(raddec.transmitter_id, "aa:bb:cc:dd:ee:ff");
        assert_eq!(raddec.number_of_decodings(), 4);
    }

    #[tokio::test]
    async fn test_malformed_datagrams_are_dropped() {
        let source = RaddecSource::bind(0).await.unwrap();
        let addr = source.local_addr().unwrap();
        let (tx, mut rx) = mpsc::channel(16);
        tokio::spawn(source.run(tx));

        let sender = UdpSocket::bind(("127.0.0.1", 0)).await.unwrap();
        sender
            .send_to(b"not json", ("127.0.0.1", addr.port()))
            .await
            .unwrap();
        sender
            .send_to(
                br#"{ "transmitterId": "valid" }"#,
                ("127.0.0.1", addr.port()),
            )
            .await
            .unwrap();

        // Only the valid raddec makes it through.
        let raddec = rx.recv().await.unwrap();
        assert_eq!(raddec.transmitter_id, "valid");
    }
}

use rosc::{OscMessage, OscPacket, OscType, encoder};
use tokio::net::UdpSocket;

/// Sends the combined intensity downstream as a single-float OSC message.
/// Fire and forget; the consumer is expected on localhost.
pub struct OutputSender {
    socket: UdpSocket,
    target: String,
    address: String,
}

impl OutputSender {
    pub async fn new(host: &str, port: u16, address: String) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let target = format!("{}:{}", host, port);
        Ok(Self {
            socket,
            target,
            address,
        })
    }

    pub async fn send(&self, value: f32) -> anyhow::Result<()> {
        let packet = OscPacket::Message(OscMessage {
            addr: self.address.clone(),
            args: vec![OscType::Float(value)],
        });
        let bytes = encoder::encode(&packet)?;
        self.socket.send_to(&bytes, self.target.as_str()).await?;
        Ok(())
    }
}

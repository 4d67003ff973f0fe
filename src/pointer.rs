use crate::error::{Result, WebOsError};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async, connect_async_tls_with_config, tungstenite::Message, Connector,
};

/// The low-latency pointer/button socket
///
/// Obtained through [`InputControl::pointer`](crate::InputControl::pointer).
/// Unlike the main connection this socket carries no JSON: each command is a
/// block of `key:value` lines terminated by a blank line, and the TV never
/// answers. Writes are fire-and-forget.
pub struct PointerSocket {
    tx: mpsc::UnboundedSender<Message>,
}

impl PointerSocket {
    /// Connect to the socket URL handed out by `getPointerInputSocket`
    pub(crate) async fn connect(
        url: &str,
        tls: Option<native_tls::TlsConnector>,
    ) -> Result<Self> {
        tracing::debug!("Connecting to pointer socket {}", url);

        let connect_result = match tls {
            Some(connector) if url.starts_with("wss") => {
                connect_async_tls_with_config(
                    url,
                    None,
                    false,
                    Some(Connector::NativeTls(connector)),
                )
                .await
            }
            _ => connect_async(url).await,
        };
        let (ws_stream, _) = connect_result?;
        let (mut write, mut read) = ws_stream.split();

        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                if let Err(e) = write.send(msg).await {
                    tracing::error!("Pointer socket write failed: {}", e);
                    break;
                }
            }
            let _ = write.close().await;
        });
        // Drain inbound frames so pings keep getting answered; the TV sends
        // nothing we act on.
        tokio::spawn(async move { while let Some(Ok(_)) = read.next().await {} });

        Ok(Self { tx })
    }

    fn send_block(&self, pairs: &[(&str, &str)]) -> Result<()> {
        self.tx
            .send(Message::Text(format_block(pairs)))
            .map_err(|_| WebOsError::ConnectionClosed)
    }

    /// Press a remote button, e.g. `HOME`, `BACK`, `UP`, `ENTER`
    pub fn button(&self, name: &str) -> Result<()> {
        self.send_block(&[("type", "button"), ("name", &name.to_uppercase())])
    }

    /// Move the pointer by a relative offset
    pub fn move_cursor(&self, dx: i32, dy: i32, drag: bool) -> Result<()> {
        self.send_block(&[
            ("type", "move"),
            ("dx", &dx.to_string()),
            ("dy", &dy.to_string()),
            ("down", if drag { "1" } else { "0" }),
        ])
    }

    /// Click at the current pointer position
    pub fn click(&self) -> Result<()> {
        self.send_block(&[("type", "click")])
    }

    /// Scroll by a relative offset
    pub fn scroll(&self, dx: i32, dy: i32) -> Result<()> {
        self.send_block(&[
            ("type", "scroll"),
            ("dx", &dx.to_string()),
            ("dy", &dy.to_string()),
        ])
    }

    /// Close the pointer socket
    pub fn close(&self) {
        let _ = self.tx.send(Message::Close(None));
    }
}

fn format_block(pairs: &[(&str, &str)]) -> String {
    let mut block = String::new();
    for (key, value) in pairs {
        block.push_str(key);
        block.push(':');
        block.push_str(value);
        block.push('\n');
    }
    block.push('\n');
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_are_key_value_lines_with_blank_terminator() {
        assert_eq!(
            format_block(&[("type", "button"), ("name", "HOME")]),
            "type:button\nname:HOME\n\n"
        );
        assert_eq!(
            format_block(&[("type", "move"), ("dx", "4"), ("dy", "-2"), ("down", "0")]),
            "type:move\ndx:4\ndy:-2\ndown:0\n\n"
        );
    }
}

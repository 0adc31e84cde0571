//! WebSocket Actor - live reload broadcast
//!
//! ```text
//! FsActor --[Reload]--> WsActor --[broadcast]--> Clients
//! ```
//!
//! Clients never send anything meaningful; a reader thread only drains
//! their frames to notice disconnects.

use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::messages::WsMsg;
use crate::reload::message::ReloadMessage;

type Clients = Arc<Mutex<Vec<WebSocket<TcpStream>>>>;

/// WebSocket Actor - manages client connections and broadcasts
pub struct WsActor {
    rx: mpsc::Receiver<WsMsg>,
    /// Connected clients (shared for broadcast + read thread)
    clients: Clients,
}

impl WsActor {
    pub fn new(rx: mpsc::Receiver<WsMsg>) -> Self {
        Self {
            rx,
            clients: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        let clients_for_reader = Arc::clone(&self.clients);
        std::thread::spawn(move || Self::client_reader_loop(clients_for_reader));

        while let Some(msg) = self.rx.recv().await {
            match msg {
                WsMsg::Reload { reason } => {
                    crate::debug!("ws"; "sending reload: {}", reason);
                    let msg = ReloadMessage::reload_with_reason(reason);
                    self.broadcast(Message::Text(msg.to_json().into()));
                }
                WsMsg::AddClient(stream) => self.add_client(stream),
                WsMsg::Shutdown => {
                    crate::debug!("ws"; "shutting down");
                    for mut client in self.clients.lock().drain(..) {
                        let _ = client.close(None);
                    }
                    break;
                }
            }
        }
    }

    /// Handshake a new connection and register it.
    fn add_client(&self, stream: TcpStream) {
        // Keep blocking mode during handshake, switch to non-blocking after
        match tungstenite::accept(stream) {
            Ok(mut ws) => {
                let _ = ws.get_ref().set_nonblocking(true);

                let connected = ReloadMessage::connected();
                if let Err(e) = ws.send(Message::Text(connected.to_json().into())) {
                    crate::log!("ws"; "failed to send connected message: {}", e);
                    return;
                }

                let mut clients = self.clients.lock();
                crate::debug!("ws"; "client connected (total: {})", clients.len() + 1);
                clients.push(ws);
            }
            Err(e) => {
                crate::log!("ws"; "handshake failed: {}", e);
            }
        }
    }

    /// Broadcast a message to all connected clients
    fn broadcast(&self, msg: Message) {
        let mut clients = self.clients.lock();
        let count = clients.len();

        if count == 0 {
            crate::debug!("ws"; "no clients connected");
            return;
        }

        clients.retain_mut(|client| match client.send(msg.clone()) {
            Ok(_) => true,
            Err(e) => {
                crate::debug!("ws"; "client disconnected: {}", e);
                false
            }
        });
        crate::debug!("ws"; "broadcast to {} clients", count);
    }

    /// Background thread draining client frames (non-blocking poll)
    fn client_reader_loop(clients: Clients) {
        loop {
            std::thread::sleep(Duration::from_millis(100));
            if crate::core::is_shutdown() {
                break;
            }

            clients.lock().retain_mut(|client| match client.read() {
                Ok(Message::Close(_)) => false,
                Ok(_) => true,
                Err(tungstenite::Error::Io(ref e)) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    true
                }
                Err(_) => false,
            });
        }
    }
}

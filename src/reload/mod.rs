//! Live-reload signaling.
//!
//! A plain WebSocket broadcaster: the dev server injects a small client
//! script into served HTML, and after a successful re-render the pipeline
//! broadcasts a reload message. Fire-and-forget — no acknowledgment, no
//! retry; dead clients are dropped on the next send.

use std::net::{TcpListener, TcpStream};
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tungstenite::{Message, WebSocket};

use crate::logger::Logger;

/// Message understood by the reload client.
const RELOAD_MESSAGE: &str = "reload";

#[derive(Clone)]
pub struct ReloadServer {
    clients: Arc<Mutex<Vec<WebSocket<TcpStream>>>>,
    port: u16,
}

impl ReloadServer {
    /// Bind and start accepting clients on a background thread.
    pub fn start(port: u16, logger: Logger) -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", port))
            .with_context(|| format!("failed to bind reload socket on port {port}"))?;
        let port = listener.local_addr()?.port();

        let clients: Arc<Mutex<Vec<WebSocket<TcpStream>>>> = Arc::default();
        let accepting = Arc::clone(&clients);
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                match stream {
                    Ok(stream) => match tungstenite::accept(stream) {
                        Ok(ws) => accepting.lock().push(ws),
                        Err(err) => logger.warn("reload", &format!("handshake failed: {err}")),
                    },
                    Err(err) => logger.warn("reload", &format!("accept failed: {err}")),
                }
            }
        });

        Ok(Self { clients, port })
    }

    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Send the reload signal to every connected client.
    pub fn broadcast(&self) {
        let mut clients = self.clients.lock();
        clients.retain_mut(|ws| ws.send(Message::Text(RELOAD_MESSAGE.into())).is_ok());
    }

    /// Client script injected into served HTML documents.
    pub fn client_script(&self) -> String {
        format!(
            "<script>(function(){{\
var ws=new WebSocket(\"ws://127.0.0.1:{}\");\
ws.onmessage=function(m){{if(m.data===\"{}\")location.reload();}};\
}})();</script>",
            self.port, RELOAD_MESSAGE,
        )
    }
}

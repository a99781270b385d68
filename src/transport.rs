use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::{SinkExt as _, StreamExt as _};
use log::{debug, error, info, warn};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::config::HubConfig;
use crate::errors::TransportError;

const OUTBOUND_QUEUE: usize = 32;
const EVENT_QUEUE: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Connected(String),
    Disconnected,
    Text(String),
}

/// Cloneable handle for sending text frames to the hub.
#[derive(Debug, Clone)]
pub struct HubLink {
    outbound: mpsc::Sender<String>,
    connected: Arc<AtomicBool>,
}

impl HubLink {
    pub fn new(outbound: mpsc::Sender<String>, connected: Arc<AtomicBool>) -> Self {
        HubLink {
            outbound,
            connected,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn send_text(&self, payload: String) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        self.outbound.try_send(payload).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => TransportError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
        })
    }
}

/// Starts the connection worker. Events arrive on the returned receiver one
/// at a time, in the order the worker observed them.
pub fn spawn(config: &HubConfig) -> (HubLink, mpsc::Receiver<TransportEvent>) {
    // wss:// handshakes need a process-wide rustls provider
    let _ = rustls::crypto::ring::default_provider().install_default();

    let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE);
    let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE);
    let connected = Arc::new(AtomicBool::new(false));

    let worker = Worker {
        url: config.url.clone(),
        reconnect_interval: config.reconnect_interval(),
        connected: Arc::clone(&connected),
        outbound_rx,
        event_tx,
    };
    tokio::spawn(worker.run());

    (HubLink::new(outbound_tx, connected), event_rx)
}

struct Worker {
    url: String,
    reconnect_interval: std::time::Duration,
    connected: Arc<AtomicBool>,
    outbound_rx: mpsc::Receiver<String>,
    event_tx: mpsc::Sender<TransportEvent>,
}

impl Worker {
    async fn run(mut self) {
        loop {
            match connect_async(self.url.as_str()).await {
                Ok((stream, _)) => {
                    info!("[WS] Connected to url: {}", self.url);
                    // frames queued for the previous connection are not replayed
                    while self.outbound_rx.try_recv().is_ok() {}
                    self.connected.store(true, Ordering::Release);
                    if self
                        .event_tx
                        .send(TransportEvent::Connected(self.url.clone()))
                        .await
                        .is_err()
                    {
                        break;
                    }

                    let (mut write, mut read) = stream.split();
                    loop {
                        tokio::select! {
                            maybe_out = self.outbound_rx.recv() => {
                                let Some(payload) = maybe_out else {
                                    debug!("All hub links dropped, stopping transport");
                                    return;
                                };
                                if let Err(err) = write.send(Message::Text(payload)).await {
                                    error!("[WS] Send failed: {:?}", err);
                                    break;
                                }
                            }
                            maybe_in = read.next() => {
                                match maybe_in {
                                    Some(Ok(Message::Text(text))) => {
                                        if self.event_tx.send(TransportEvent::Text(text)).await.is_err() {
                                            return;
                                        }
                                    }
                                    Some(Ok(Message::Close(frame))) => {
                                        debug!("[WS] Close frame: {:?}", frame);
                                        break;
                                    }
                                    Some(Ok(_)) => {}
                                    Some(Err(err)) => {
                                        warn!("[WS] Read failed: {:?}", err);
                                        break;
                                    }
                                    None => break,
                                }
                            }
                        }
                    }

                    self.connected.store(false, Ordering::Release);
                    while self.outbound_rx.try_recv().is_ok() {}
                    info!("[WS] Disconnected!");
                    if self
                        .event_tx
                        .send(TransportEvent::Disconnected)
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Err(err) => {
                    warn!("[WS] Connecting to {} failed: {:?}", self.url, err);
                }
            }
            tokio::time::sleep(self.reconnect_interval).await;
        }
    }
}

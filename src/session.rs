use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::sync::mpsc;

use crate::display::{Display, Presenter};
use crate::identity::IdentityStore;
use crate::messages::{self, ProtocolMessage, RegisterOutcome, RegisterRequest, Role};
use crate::transport::{HubLink, TransportEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Unregistered,
    Registered,
}

/// Drives registration and dispatches inbound hub messages.
pub struct Session<D: Display> {
    state: SessionState,
    role: Role,
    name: String,
    identity: Arc<IdentityStore>,
    link: HubLink,
    presenter: Presenter<D>,
}

impl<D: Display> Session<D> {
    pub fn new(
        role: Role,
        name: String,
        identity: Arc<IdentityStore>,
        link: HubLink,
        presenter: Presenter<D>,
    ) -> Self {
        Session {
            state: SessionState::Disconnected,
            role,
            name,
            identity,
            link,
            presenter,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[cfg(test)]
    pub fn presenter(&self) -> &Presenter<D> {
        &self.presenter
    }

    /// Handles events until the transport goes away.
    pub async fn run(mut self, mut events: mpsc::Receiver<TransportEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_event(event);
        }
        debug!("Transport event stream closed");
    }

    pub fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected(url) => {
                debug!("Session connected to {}", url);
                self.state = SessionState::Unregistered;
                self.register();
            }
            TransportEvent::Disconnected => {
                // the identity survives reconnects
                self.state = SessionState::Disconnected;
            }
            TransportEvent::Text(payload) => match messages::interpret(&payload) {
                Ok(message) => self.handle_message(message),
                Err(err) => warn!("Dropping message {:?}: {}", payload, err),
            },
        }
    }

    fn register(&self) {
        let request = RegisterRequest::new(self.role, &self.name);
        let payload = match serde_json::to_string(&request) {
            Ok(payload) => payload,
            Err(err) => {
                error!("Error encoding register request: {:?}", err);
                return;
            }
        };
        if let Err(err) = self.link.send_text(payload) {
            error!("Error sending register request: {}", err);
        }
    }

    fn handle_message(&mut self, message: ProtocolMessage) {
        match message {
            ProtocolMessage::LivenessAck => debug!("[WS]: Ping/Pong Frame Event: PONG"),
            ProtocolMessage::Register(outcome) => self.on_register_outcome(outcome),
            ProtocolMessage::Detection(event) => {
                self.presenter.on_detection_event(&event);
            }
            ProtocolMessage::Unrecognized => debug!("Ignoring unrecognized message"),
        }
    }

    fn on_register_outcome(&mut self, outcome: RegisterOutcome) {
        match outcome {
            RegisterOutcome::Success { assigned_id, role } => {
                info!(
                    "[REGISTER]: Registered as {} with ID {}",
                    role.as_deref().unwrap_or("?"),
                    assigned_id
                );
                if let Err(conflict) = self.identity.assign(assigned_id) {
                    info!("[REGISTER]: Keeping existing identity: {}", conflict);
                }
                if self.state == SessionState::Unregistered {
                    self.state = SessionState::Registered;
                }
            }
            RegisterOutcome::AlreadyRegistered => {
                info!("[REGISTER]: Already registered as {:?}.", self.role)
            }
            RegisterOutcome::Dead => info!("[REGISTER]: Client deemed dead by hub."),
        }
    }
}

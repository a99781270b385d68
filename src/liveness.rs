use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, trace};
use tokio::time::MissedTickBehavior;

use crate::config::LivenessConfig;
use crate::identity::IdentityStore;
use crate::messages::{PingRequest, Role};
use crate::transport::HubLink;

/// Periodically tells the hub this device is still alive, once it has an id.
pub struct LivenessEmitter {
    identity: Arc<IdentityStore>,
    link: HubLink,
    interval: Duration,
    role: Option<Role>,
}

impl LivenessEmitter {
    pub fn new(
        identity: Arc<IdentityStore>,
        link: HubLink,
        role: Role,
        config: &LivenessConfig,
    ) -> Self {
        LivenessEmitter {
            identity,
            link,
            interval: config.interval(),
            role: config.include_role().then_some(role),
        }
    }

    /// Runs one tick. Returns whether a ping was handed to the transport.
    pub fn tick(&self) -> bool {
        if !self.link.is_connected() {
            trace!("Skipping ping, not connected");
            return false;
        }
        let Some(id) = self.identity.current() else {
            trace!("Skipping ping, no identity yet");
            return false;
        };

        let payload = match serde_json::to_string(&PingRequest::new(id, self.role)) {
            Ok(payload) => payload,
            Err(err) => {
                error!("Error encoding ping: {:?}", err);
                return false;
            }
        };
        match self.link.send_text(payload) {
            Ok(()) => {
                debug!("Sent ping as {}", id);
                true
            }
            Err(err) => {
                error!("Error sending ping: {}", err);
                false
            }
        }
    }

    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.interval);
        // a stalled runtime resumes with one ping, not a catch-up burst
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            self.tick();
        }
    }
}

//! Wire shapes exchanged with the hub.
//!
//! Outbound requests are plain serializable structs; inbound frames are
//! classified by [`interpret`] into a [`ProtocolMessage`].

use serde_derive::{Deserialize, Serialize};

use crate::errors::InterpretError;

/// The functional category this device presents to the hub.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Master,
    Slave,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    role: Role,
    name: &'a str,
}

impl<'a> RegisterRequest<'a> {
    pub fn new(role: Role, name: &'a str) -> Self {
        RegisterRequest {
            kind: "register",
            role,
            name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PingRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<Role>,
    id: &'a str,
}

impl<'a> PingRequest<'a> {
    pub fn new(id: &'a str, role: Option<Role>) -> Self {
        PingRequest {
            kind: "ping",
            role,
            id,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
enum ActionCode {
    #[serde(rename = "REGISTERED_SUCCESSFULLY")]
    Success,
    #[serde(rename = "REGISTERED_ALREADY")]
    AlreadyRegistered,
    #[serde(rename = "DEAD")]
    Dead,
}

/// Hub's answer to a register request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    Success {
        assigned_id: String,
        role: Option<String>,
    },
    AlreadyRegistered,
    Dead,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionEvent {
    pub sensor_name: String,
    pub sensor_id: String,
    pub distance_cm: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolMessage {
    Register(RegisterOutcome),
    LivenessAck,
    Detection(DetectionEvent),
    /// A frame whose `type` is not one we handle.
    Unrecognized,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "type")]
enum Envelope {
    #[serde(rename = "PONG")]
    Pong,
    #[serde(rename = "REGISTER")]
    Register {
        #[serde(rename = "actionCode")]
        action_code: ActionCode,
        id: Option<String>,
        // informational only, so a malformed role must not sink the outcome
        role: Option<serde_json::Value>,
    },
    #[serde(rename = "RECEIVE_SIGNAL")]
    ReceiveSignal {
        #[serde(rename = "detectedSensorName")]
        sensor_name: Option<String>,
        #[serde(rename = "sensorId")]
        sensor_id: Option<String>,
        distance: Option<i64>,
    },
    #[serde(other)]
    Other,
}

fn required(
    value: Option<String>,
    tag: &'static str,
    field: &'static str,
) -> Result<String, InterpretError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(InterpretError::MissingField { tag, field })
}

/// Classifies one inbound text frame.
pub fn interpret(payload: &str) -> Result<ProtocolMessage, InterpretError> {
    let document: serde_json::Value =
        serde_json::from_str(payload).map_err(InterpretError::Decode)?;
    let envelope: Envelope =
        serde_json::from_value(document).map_err(InterpretError::Classification)?;

    let message = match envelope {
        Envelope::Pong => ProtocolMessage::LivenessAck,
        Envelope::Register {
            action_code,
            id,
            role,
        } => ProtocolMessage::Register(match action_code {
            ActionCode::Success => RegisterOutcome::Success {
                assigned_id: required(id, "REGISTER", "id")?,
                role: role.and_then(|r| r.as_str().map(str::to_string)),
            },
            ActionCode::AlreadyRegistered => RegisterOutcome::AlreadyRegistered,
            ActionCode::Dead => RegisterOutcome::Dead,
        }),
        Envelope::ReceiveSignal {
            sensor_name,
            sensor_id,
            distance,
        } => ProtocolMessage::Detection(DetectionEvent {
            sensor_name: required(sensor_name, "RECEIVE_SIGNAL", "detectedSensorName")?,
            sensor_id: required(sensor_id, "RECEIVE_SIGNAL", "sensorId")?,
            distance_cm: distance.ok_or(InterpretError::MissingField {
                tag: "RECEIVE_SIGNAL",
                field: "distance",
            })?,
        }),
        Envelope::Other => ProtocolMessage::Unrecognized,
    };
    Ok(message)
}

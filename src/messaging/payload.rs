//! # Step Payloads
//!
//! Wire structures exchanged across the queue boundary and with the downstream
//! order service. Every structure keeps the fields it does not understand in a
//! flattened `extra` map so a payload survives a decode/encode cycle without
//! losing anything another saga participant put there.

use crate::constants::SagaAction;
use crate::error::{StepError, StepResult};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Payload carried by a perform or revert task for this saga step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepPayload {
    /// Saga action tag; an unrecognised tag decodes as `None`
    #[serde(
        default,
        alias = "Action",
        deserialize_with = "lenient_action",
        skip_serializing_if = "Option::is_none"
    )]
    pub action: Option<SagaAction>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub token_id: u64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub user_id: u64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub amount: u64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,

    /// Downstream order id; only present once perform's create call succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<u64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StepPayload {
    /// Decode a payload received from the queue
    pub fn decode(bytes: &[u8]) -> StepResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| StepError::decode(e.to_string()))
    }

    /// Encode this payload for the wire
    pub fn encode(&self) -> StepResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| StepError::encode(e.to_string()))
    }

    /// Order id revert addresses; a zero id counts as unassigned
    pub fn order_id(&self) -> Option<u64> {
        self.order_id.filter(|id| *id != 0)
    }

    pub fn with_order_id(mut self, order_id: u64) -> Self {
        self.order_id = Some(order_id);
        self
    }
}

/// Absent and `null` fields both take the type's zero value
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_action<'de, D>(deserializer: D) -> Result<Option<SagaAction>, D::Error>
where
    D: Deserializer<'de>,
{
    let tag = Option::<Value>::deserialize(deserializer)?;
    Ok(tag
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|tag| tag.parse().ok()))
}

/// Order record returned by the downstream service on create
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: u64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub token_id: u64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub user_id: u64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub amount: u64,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload handed to the next saga step after a successful perform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextStepPayload {
    pub action: SagaAction,
    pub token_id: u64,
    pub user_id: u64,
    pub username: String,
    pub amount: u64,
    pub order_id: u64,
}

impl NextStepPayload {
    /// Build the next step's payload from the created order
    pub fn from_order(order: &Order, username: impl Into<String>) -> Self {
        Self {
            action: SagaAction::Perform,
            token_id: order.token_id,
            user_id: order.user_id,
            username: username.into(),
            amount: order.amount,
            order_id: order.id,
        }
    }

    pub fn encode(&self) -> StepResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| StepError::encode(e.to_string()))
    }
}

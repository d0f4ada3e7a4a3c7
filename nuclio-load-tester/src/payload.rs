use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Currency conversion request sent with every invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionPayload {
    pub base_currency: String,
    pub target_currency: String,
    pub amount: String,
}

impl Default for ConversionPayload {
    fn default() -> Self {
        Self {
            base_currency: "USD".to_string(),
            target_currency: "SGD".to_string(),
            amount: "100".to_string(),
        }
    }
}

impl ConversionPayload {
    /// Serialize once into a buffer that every worker can share.
    pub fn encode(&self) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }
}

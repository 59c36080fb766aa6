use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthzResponse {
    pub now: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

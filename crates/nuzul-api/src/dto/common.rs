//! Common DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Server time response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServerTimeResponse {
    /// Unix timestamp in milliseconds
    pub server_time: i64,
}

use serde::{Deserialize, Serialize};

/// Body of the health check response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// "ok" when the backend is serving.
    pub status: String,

    /// Backend version.
    #[serde(default)]
    pub version: String,
}

impl Health {
    /// True when the backend reports itself healthy.
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

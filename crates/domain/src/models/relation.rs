//! Business relations: an exporter's client agenda.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Directed link from a host organization to a partner in its agenda.
///
/// The pair is unique; adding an existing client is an idempotent no-op at
/// the store level.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BusinessRelation {
    pub id: Uuid,
    pub host_org: Uuid,
    pub partner_org: Uuid,
    /// Short display name the host uses for this partner
    pub alias: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_serialization() {
        let relation = BusinessRelation {
            id: Uuid::nil(),
            host_org: Uuid::nil(),
            partner_org: Uuid::nil(),
            alias: "Atlantic".to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&relation).unwrap();
        assert!(json.contains("\"alias\":\"Atlantic\""));
        assert!(json.contains("\"host_org\""));
    }
}

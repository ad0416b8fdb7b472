//! Business relation entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::BusinessRelation;

/// Database row mapping for the business_relations table.
#[derive(Debug, Clone, FromRow)]
pub struct BusinessRelationEntity {
    pub id: Uuid,
    pub host_org: Uuid,
    pub partner_org: Uuid,
    pub alias: String,
    pub created_at: DateTime<Utc>,
}

impl From<BusinessRelationEntity> for BusinessRelation {
    fn from(entity: BusinessRelationEntity) -> Self {
        Self {
            id: entity.id,
            host_org: entity.host_org,
            partner_org: entity.partner_org,
            alias: entity.alias,
            created_at: entity.created_at,
        }
    }
}

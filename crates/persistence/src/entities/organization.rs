//! Organization entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for org_status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "org_status", rename_all = "UPPERCASE")]
pub enum OrgStatusDb {
    Active,
    Unclaimed,
    Suspended,
}

impl From<OrgStatusDb> for domain::models::OrgStatus {
    fn from(db: OrgStatusDb) -> Self {
        match db {
            OrgStatusDb::Active => Self::Active,
            OrgStatusDb::Unclaimed => Self::Unclaimed,
            OrgStatusDb::Suspended => Self::Suspended,
        }
    }
}

impl From<domain::models::OrgStatus> for OrgStatusDb {
    fn from(status: domain::models::OrgStatus) -> Self {
        match status {
            domain::models::OrgStatus::Active => Self::Active,
            domain::models::OrgStatus::Unclaimed => Self::Unclaimed,
            domain::models::OrgStatus::Suspended => Self::Suspended,
        }
    }
}

/// Database row mapping for the organizations table.
#[derive(Debug, Clone, FromRow)]
pub struct OrganizationEntity {
    pub id: Uuid,
    pub name: String,
    pub tax_id: Option<String>,
    pub country: String,
    pub status: OrgStatusDb,
    pub contact_email: Option<String>,
    pub created_by_org: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrganizationEntity> for domain::models::Organization {
    fn from(entity: OrganizationEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            tax_id: entity.tax_id,
            country: entity.country,
            status: entity.status.into(),
            contact_email: entity.contact_email,
            created_by_org: entity.created_by_org,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_conversion() {
        assert_eq!(
            domain::models::OrgStatus::from(OrgStatusDb::Unclaimed),
            domain::models::OrgStatus::Unclaimed
        );
        assert_eq!(
            OrgStatusDb::from(domain::models::OrgStatus::Suspended),
            OrgStatusDb::Suspended
        );
    }
}

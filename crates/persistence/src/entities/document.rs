//! Shipment, magic-link and signature-log entities.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::document::{
    MagicLink, Shipment, ShipmentStatus, SignatureLog, SignatureStatus,
};

/// Database enum for shipment_status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "shipment_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatusDb {
    Draft,
    ScSent,
    Signed,
    Completed,
}

impl From<ShipmentStatusDb> for ShipmentStatus {
    fn from(db: ShipmentStatusDb) -> Self {
        match db {
            ShipmentStatusDb::Draft => Self::Draft,
            ShipmentStatusDb::ScSent => Self::ScSent,
            ShipmentStatusDb::Signed => Self::Signed,
            ShipmentStatusDb::Completed => Self::Completed,
        }
    }
}

impl From<ShipmentStatus> for ShipmentStatusDb {
    fn from(status: ShipmentStatus) -> Self {
        match status {
            ShipmentStatus::Draft => Self::Draft,
            ShipmentStatus::ScSent => Self::ScSent,
            ShipmentStatus::Signed => Self::Signed,
            ShipmentStatus::Completed => Self::Completed,
        }
    }
}

/// Database enum for signature_status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "signature_status", rename_all = "UPPERCASE")]
pub enum SignatureStatusDb {
    Approved,
    Rejected,
}

impl From<SignatureStatusDb> for SignatureStatus {
    fn from(db: SignatureStatusDb) -> Self {
        match db {
            SignatureStatusDb::Approved => Self::Approved,
            SignatureStatusDb::Rejected => Self::Rejected,
        }
    }
}

impl From<SignatureStatus> for SignatureStatusDb {
    fn from(status: SignatureStatus) -> Self {
        match status {
            SignatureStatus::Approved => Self::Approved,
            SignatureStatus::Rejected => Self::Rejected,
        }
    }
}

/// Database row mapping for the shipments table.
#[derive(Debug, Clone, FromRow)]
pub struct ShipmentEntity {
    pub id: Uuid,
    pub owner_org: Uuid,
    pub buyer_org: Option<Uuid>,
    pub internal_ref: String,
    pub status: ShipmentStatusDb,
    pub incoterm: String,
    pub currency: String,
    pub destination_port: Option<String>,
    pub buyer_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ShipmentEntity> for Shipment {
    fn from(entity: ShipmentEntity) -> Self {
        Self {
            id: entity.id,
            owner_org: entity.owner_org,
            buyer_org: entity.buyer_org,
            internal_ref: entity.internal_ref,
            status: entity.status.into(),
            incoterm: entity.incoterm,
            currency: entity.currency,
            destination_port: entity.destination_port,
            buyer_email: entity.buyer_email,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Database row mapping for the magic_links table.
#[derive(Debug, Clone, FromRow)]
pub struct MagicLinkEntity {
    pub id: Uuid,
    pub shipment_id: Uuid,
    pub token_hash: String,
    pub email_sent_to: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl From<MagicLinkEntity> for MagicLink {
    fn from(entity: MagicLinkEntity) -> Self {
        Self {
            id: entity.id,
            shipment_id: entity.shipment_id,
            token_hash: entity.token_hash,
            email_sent_to: entity.email_sent_to,
            created_at: entity.created_at,
            expires_at: entity.expires_at,
            used_at: entity.used_at,
            is_active: entity.is_active,
        }
    }
}

/// Database row mapping for the signature_logs table.
#[derive(Debug, Clone, FromRow)]
pub struct SignatureLogEntity {
    pub id: Uuid,
    pub shipment_id: Uuid,
    pub magic_link_id: Uuid,
    pub status: SignatureStatusDb,
    pub signature_name: Option<String>,
    pub rejection_comment: Option<String>,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub signed_at: DateTime<Utc>,
}

impl From<SignatureLogEntity> for SignatureLog {
    fn from(entity: SignatureLogEntity) -> Self {
        Self {
            id: entity.id,
            shipment_id: entity.shipment_id,
            magic_link_id: entity.magic_link_id,
            status: entity.status.into(),
            signature_name: entity.signature_name,
            rejection_comment: entity.rejection_comment,
            ip_address: entity.ip_address,
            user_agent: entity.user_agent,
            signed_at: entity.signed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shipment_status_conversion() {
        assert_eq!(
            ShipmentStatus::from(ShipmentStatusDb::ScSent),
            ShipmentStatus::ScSent
        );
        assert_eq!(
            ShipmentStatusDb::from(ShipmentStatus::Signed),
            ShipmentStatusDb::Signed
        );
    }

    #[test]
    fn test_signature_status_conversion() {
        assert_eq!(
            SignatureStatus::from(SignatureStatusDb::Rejected),
            SignatureStatus::Rejected
        );
    }
}

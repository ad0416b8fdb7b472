//! Shipment, magic-link and signature repository.

use domain::models::document::{MagicLink, Shipment, ShipmentStatus, SignatureLog, SignatureStatus};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::document::{
    MagicLinkEntity, ShipmentEntity, ShipmentStatusDb, SignatureLogEntity, SignatureStatusDb,
};
use crate::metrics::QueryTimer;

const SHIPMENT_COLUMNS: &str = "id, owner_org, buyer_org, internal_ref, status, incoterm, \
     currency, destination_port, buyer_email, created_at, updated_at";

const LINK_COLUMNS: &str =
    "id, shipment_id, token_hash, email_sent_to, created_at, expires_at, used_at, is_active";

const LOG_COLUMNS: &str = "id, shipment_id, magic_link_id, status, signature_name, \
     rejection_comment, ip_address, user_agent, signed_at";

/// Details of a signature event to persist.
#[derive(Debug, Clone)]
pub struct NewSignature<'a> {
    pub status: SignatureStatus,
    pub signature_name: Option<&'a str>,
    pub rejection_comment: Option<&'a str>,
    pub ip_address: &'a str,
    pub user_agent: Option<&'a str>,
}

/// Repository for the document-signing flow.
#[derive(Clone)]
pub struct DocumentRepository {
    pool: PgPool,
}

impl DocumentRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a shipment by ID.
    pub async fn find_shipment(&self, id: Uuid) -> Result<Option<Shipment>, sqlx::Error> {
        let timer = QueryTimer::new("find_shipment");
        let result = sqlx::query_as::<_, ShipmentEntity>(&format!(
            r#"
            SELECT {SHIPMENT_COLUMNS}
            FROM shipments
            WHERE id = $1
            "#,
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result.map(|entity| entity.map(Into::into))
    }

    /// Find the magic link for a shipment by the digest of a presented token.
    pub async fn find_magic_link(
        &self,
        shipment_id: Uuid,
        token_hash: &str,
    ) -> Result<Option<MagicLink>, sqlx::Error> {
        let timer = QueryTimer::new("find_magic_link");
        let result = sqlx::query_as::<_, MagicLinkEntity>(&format!(
            r#"
            SELECT {LINK_COLUMNS}
            FROM magic_links
            WHERE shipment_id = $1 AND token_hash = $2
            "#,
        ))
        .bind(shipment_id)
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result.map(|entity| entity.map(Into::into))
    }

    /// Record a signature outcome.
    ///
    /// Spends the magic link, writes the audit row and moves the shipment to
    /// its new status in one transaction. Returns `Ok(None)` when the link
    /// was already spent by a concurrent submission.
    pub async fn record_signature(
        &self,
        link_id: Uuid,
        shipment_id: Uuid,
        new_status: ShipmentStatus,
        signature: NewSignature<'_>,
    ) -> Result<Option<SignatureLog>, sqlx::Error> {
        let timer = QueryTimer::new("record_signature");
        let mut tx = self.pool.begin().await?;

        // Guarded on used_at so exactly one submission spends the link
        let spent = sqlx::query(
            r#"
            UPDATE magic_links
            SET used_at = NOW(), is_active = FALSE
            WHERE id = $1 AND used_at IS NULL AND is_active = TRUE
            "#,
        )
        .bind(link_id)
        .execute(&mut *tx)
        .await?;

        if spent.rows_affected() == 0 {
            tx.rollback().await?;
            timer.record();
            return Ok(None);
        }

        let log = sqlx::query_as::<_, SignatureLogEntity>(&format!(
            r#"
            INSERT INTO signature_logs
                (shipment_id, magic_link_id, status, signature_name, rejection_comment,
                 ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {LOG_COLUMNS}
            "#,
        ))
        .bind(shipment_id)
        .bind(link_id)
        .bind(SignatureStatusDb::from(signature.status))
        .bind(signature.signature_name)
        .bind(signature.rejection_comment)
        .bind(signature.ip_address)
        .bind(signature.user_agent)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE shipments
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(shipment_id)
        .bind(ShipmentStatusDb::from(new_status))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();

        Ok(Some(log.into()))
    }
}

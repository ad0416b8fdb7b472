//! Business relation repository.

use domain::models::BusinessRelation;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::relation::BusinessRelationEntity;
use crate::metrics::QueryTimer;

const RELATION_COLUMNS: &str = "id, host_org, partner_org, alias, created_at";

/// Repository for the exporter's client agenda.
#[derive(Clone)]
pub struct RelationRepository {
    pool: PgPool,
}

impl RelationRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Link a partner into the host's agenda.
    ///
    /// The (host, partner) pair is unique; re-adding an existing client is a
    /// no-op and the existing row is returned. Adding the same client twice
    /// never fails.
    pub async fn upsert(
        &self,
        host_org: Uuid,
        partner_org: Uuid,
        alias: &str,
    ) -> Result<BusinessRelation, sqlx::Error> {
        let timer = QueryTimer::new("upsert_relation");

        let inserted = sqlx::query_as::<_, BusinessRelationEntity>(&format!(
            r#"
            INSERT INTO business_relations (host_org, partner_org, alias)
            VALUES ($1, $2, $3)
            ON CONFLICT (host_org, partner_org) DO NOTHING
            RETURNING {RELATION_COLUMNS}
            "#,
        ))
        .bind(host_org)
        .bind(partner_org)
        .bind(alias)
        .fetch_optional(&self.pool)
        .await?;

        let entity = match inserted {
            Some(entity) => entity,
            // Conflict: the link already existed, fetch it
            None => {
                sqlx::query_as::<_, BusinessRelationEntity>(&format!(
                    r#"
                    SELECT {RELATION_COLUMNS}
                    FROM business_relations
                    WHERE host_org = $1 AND partner_org = $2
                    "#,
                ))
                .bind(host_org)
                .bind(partner_org)
                .fetch_one(&self.pool)
                .await?
            }
        };
        timer.record();

        Ok(entity.into())
    }
}

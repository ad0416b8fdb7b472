//! Organization repository for database operations.

use domain::models::{Organization, User};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::organization::OrganizationEntity;
use crate::entities::user::UserEntity;
use crate::metrics::QueryTimer;

const ORG_COLUMNS: &str =
    "id, name, tax_id, country, status, contact_email, created_by_org, created_at, updated_at";

const USER_COLUMNS: &str = "id, email, name, password_hash, organization_id, role, \
     invite_pending, is_active, created_at, last_login";

/// Repository for organization database operations.
#[derive(Clone)]
pub struct OrganizationRepository {
    pool: PgPool,
}

impl OrganizationRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find organization by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Organization>, sqlx::Error> {
        let timer = QueryTimer::new("find_org_by_id");
        let result = sqlx::query_as::<_, OrganizationEntity>(&format!(
            r#"
            SELECT {ORG_COLUMNS}
            FROM organizations
            WHERE id = $1
            "#,
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result.map(|entity| entity.map(Into::into))
    }

    /// Find organization by tax id (exact, case-insensitive).
    pub async fn find_by_tax_id(&self, tax_id: &str) -> Result<Option<Organization>, sqlx::Error> {
        let timer = QueryTimer::new("find_org_by_tax_id");
        let result = sqlx::query_as::<_, OrganizationEntity>(&format!(
            r#"
            SELECT {ORG_COLUMNS}
            FROM organizations
            WHERE LOWER(tax_id) = LOWER($1)
            ORDER BY created_at
            LIMIT 1
            "#,
        ))
        .bind(tax_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result.map(|entity| entity.map(Into::into))
    }

    /// Find organization by the domain part of its contact email.
    ///
    /// Heuristic fallback used when no tax id matches. Generic mail domains
    /// (gmail and friends) can conflate unrelated organizations; the first
    /// match by creation order wins. Known limitation, kept deliberately.
    pub async fn find_by_email_domain(
        &self,
        domain: &str,
    ) -> Result<Option<Organization>, sqlx::Error> {
        let timer = QueryTimer::new("find_org_by_email_domain");
        let result = sqlx::query_as::<_, OrganizationEntity>(&format!(
            r#"
            SELECT {ORG_COLUMNS}
            FROM organizations
            WHERE contact_email IS NOT NULL
              AND LOWER(SPLIT_PART(contact_email, '@', 2)) = LOWER($1)
            ORDER BY created_at
            LIMIT 1
            "#,
        ))
        .bind(domain)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result.map(|entity| entity.map(Into::into))
    }

    /// Atomically activate an unclaimed organization and finalize its
    /// claiming user.
    ///
    /// The organization update is compare-and-swapped on `status =
    /// 'UNCLAIMED'`; when another claim already won, no row matches, nothing
    /// is written and `Ok(None)` is returned. Otherwise the user's credential,
    /// display name, role and pending flag are updated in the same
    /// transaction, so a concurrent reader sees either the fully-unclaimed or
    /// the fully-claimed account and nothing in between.
    pub async fn activate_claimed(
        &self,
        org_id: Uuid,
        user_id: Uuid,
        password_hash: &str,
        name: Option<&str>,
    ) -> Result<Option<(Organization, User)>, sqlx::Error> {
        let timer = QueryTimer::new("activate_claimed_org");
        let mut tx = self.pool.begin().await?;

        let org = sqlx::query_as::<_, OrganizationEntity>(&format!(
            r#"
            UPDATE organizations
            SET status = 'ACTIVE', updated_at = NOW()
            WHERE id = $1 AND status = 'UNCLAIMED'
            RETURNING {ORG_COLUMNS}
            "#,
        ))
        .bind(org_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(org) = org else {
            tx.rollback().await?;
            timer.record();
            return Ok(None);
        };

        let user = sqlx::query_as::<_, UserEntity>(&format!(
            r#"
            UPDATE users
            SET password_hash = $2,
                name = COALESCE($3, name),
                invite_pending = FALSE,
                role = 'ADMIN',
                last_login = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(user_id)
        .bind(password_hash)
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();

        Ok(Some((org.into(), user.into())))
    }
}

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::category::models::Category;
use crate::domain::identity::models::Credentials;
use crate::domain::identity::models::DisplayName;
use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::Identity;
use crate::domain::identity::models::IdentityId;
use crate::identity::errors::AuthError;
use crate::identity::ports::IdentityRepository;

pub struct PostgresIdentityRepository {
    pool: PgPool,
}

impl PostgresIdentityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_identity(row: &PgRow) -> Result<Identity, AuthError> {
        let id: Uuid = row
            .try_get("id")
            .map_err(|e| AuthError::Database(e.to_string()))?;
        let email: String = row
            .try_get("email")
            .map_err(|e| AuthError::Database(e.to_string()))?;
        let password_hash: Option<String> = row
            .try_get("password_hash")
            .map_err(|e| AuthError::Database(e.to_string()))?;
        let google_id: Option<String> = row
            .try_get("google_id")
            .map_err(|e| AuthError::Database(e.to_string()))?;
        let name: Option<String> = row
            .try_get("name")
            .map_err(|e| AuthError::Database(e.to_string()))?;
        let picture_url: Option<String> = row
            .try_get("picture_url")
            .map_err(|e| AuthError::Database(e.to_string()))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| AuthError::Database(e.to_string()))?;
        let updated_at: Option<DateTime<Utc>> = row
            .try_get("updated_at")
            .map_err(|e| AuthError::Database(e.to_string()))?;

        let credentials = Credentials::from_parts(password_hash, google_id).ok_or_else(|| {
            // The table CHECK constraint forbids this state
            AuthError::Database(format!("Identity {} has no credentials", id))
        })?;

        Ok(Identity {
            id: IdentityId(id),
            email: EmailAddress::new(email).map_err(|e| AuthError::Database(e.to_string()))?,
            name: name.and_then(|n| DisplayName::new(n).ok()),
            picture_url,
            credentials,
            created_at,
            updated_at,
        })
    }
}

const SELECT_IDENTITY: &str = r#"
    SELECT id, email, password_hash, google_id, name, picture_url, created_at, updated_at
    FROM identities
"#;

#[async_trait]
impl IdentityRepository for PostgresIdentityRepository {
    async fn create_with_categories(
        &self,
        identity: Identity,
        categories: Vec<Category>,
    ) -> Result<Identity, AuthError> {
        // One transaction: the identity and its seeded categories become
        // visible together or not at all. Dropping the future before commit
        // rolls everything back.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO identities (id, email, password_hash, google_id, name, picture_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(identity.id.0)
        .bind(identity.email.as_str())
        .bind(identity.credentials.password_hash())
        .bind(identity.credentials.google_id())
        .bind(identity.name.as_ref().map(|n| n.as_str()))
        .bind(identity.picture_url.as_deref())
        .bind(identity.created_at)
        .bind(identity.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                // The unique index is the authoritative guard against the
                // concurrent-registration race
                if db_err.is_unique_violation()
                    && db_err.constraint() == Some("identities_email_key")
                {
                    return AuthError::AlreadyRegistered;
                }
            }
            AuthError::Database(e.to_string())
        })?;

        for category in &categories {
            sqlx::query(
                r#"
                INSERT INTO categories (id, user_id, name, icon, color, kind, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(category.id)
            .bind(category.user_id.0)
            .bind(&category.name)
            .bind(&category.icon)
            .bind(&category.color)
            .bind(category.kind.as_str())
            .bind(category.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;

        Ok(identity)
    }

    async fn find_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, AuthError> {
        let row = sqlx::query(&format!("{} WHERE id = $1", SELECT_IDENTITY))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;

        row.as_ref().map(Self::row_to_identity).transpose()
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<Identity>, AuthError> {
        // Emails are stored normalized; the value object lowercased already
        let row = sqlx::query(&format!("{} WHERE email = $1", SELECT_IDENTITY))
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;

        row.as_ref().map(Self::row_to_identity).transpose()
    }

    async fn update(&self, identity: Identity) -> Result<Identity, AuthError> {
        let result = sqlx::query(
            r#"
            UPDATE identities
            SET password_hash = $2, google_id = $3, name = $4, picture_url = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(identity.id.0)
        .bind(identity.credentials.password_hash())
        .bind(identity.credentials.google_id())
        .bind(identity.name.as_ref().map(|n| n.as_str()))
        .bind(identity.picture_url.as_deref())
        .bind(identity.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AuthError::Database(format!(
                "Identity {} not found for update",
                identity.id
            )));
        }

        Ok(identity)
    }
}

//! MySQL implementation of the RefreshTokenStore trait.
//!
//! Rotation correctness rests on two transactions:
//!
//! - `consume_and_insert` runs the conditional
//!   `UPDATE ... SET used = TRUE WHERE id = ? AND used = FALSE AND revoked = FALSE`
//!   and the child `INSERT` together, so the parent is never consumed
//!   without its child existing.
//! - `revoke_family_tree` locks the family level by level with
//!   `SELECT ... FOR UPDATE` and revokes it with a single `UPDATE`.
//!
//! Dropping an uncommitted `sqlx::Transaction` rolls it back.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, MySqlPool, QueryBuilder, Row};
use uuid::Uuid;

use rotor_core::domain::entities::family::FamilyRevocation;
use rotor_core::domain::entities::token::RefreshCredential;
use rotor_core::errors::StoreError;
use rotor_core::repositories::RefreshTokenStore;

const SELECT_COLUMNS: &str = r#"
    SELECT id, user_id, secret_hash, created_at, expires_at, used, revoked, parent_id
    FROM refresh_tokens
"#;

/// MySQL implementation of RefreshTokenStore
///
/// Ids are stored as `CHAR(36)`; `secret_hash` carries a unique index that
/// turns a secret collision into `StoreError::DuplicateSecret`.
pub struct MySqlRefreshTokenStore {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlRefreshTokenStore {
    /// Create a new MySQL refresh-token store
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert database row to RefreshCredential entity
    fn row_to_credential(row: &MySqlRow) -> Result<RefreshCredential, StoreError> {
        let id: String = row.try_get("id").map_err(column_error("id"))?;
        let user_id: String = row.try_get("user_id").map_err(column_error("user_id"))?;
        let parent_id: Option<String> = row.try_get("parent_id").map_err(column_error("parent_id"))?;

        Ok(RefreshCredential::restore(
            parse_uuid(&id)?,
            parse_uuid(&user_id)?,
            row.try_get("secret_hash").map_err(column_error("secret_hash"))?,
            row.try_get::<DateTime<Utc>, _>("created_at")
                .map_err(column_error("created_at"))?,
            row.try_get::<DateTime<Utc>, _>("expires_at")
                .map_err(column_error("expires_at"))?,
            row.try_get("used").map_err(column_error("used"))?,
            row.try_get("revoked").map_err(column_error("revoked"))?,
            parent_id.as_deref().map(parse_uuid).transpose()?,
        ))
    }

    fn rows_to_credentials(rows: &[MySqlRow]) -> Result<Vec<RefreshCredential>, StoreError> {
        rows.iter().map(Self::row_to_credential).collect()
    }

    async fn insert_with<'e, E>(executor: E, credential: &RefreshCredential) -> Result<(), StoreError>
    where
        E: sqlx::Executor<'e, Database = MySql>,
    {
        let query = r#"
            INSERT INTO refresh_tokens (
                id, user_id, secret_hash, created_at, expires_at, used, revoked, parent_id
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(credential.id().to_string())
            .bind(credential.owner_id().to_string())
            .bind(credential.secret_hash())
            .bind(credential.created_at())
            .bind(credential.expires_at())
            .bind(credential.is_used())
            .bind(credential.is_revoked())
            .bind(credential.parent_id().map(|id| id.to_string()))
            .execute(executor)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }
}

#[async_trait]
impl RefreshTokenStore for MySqlRefreshTokenStore {
    async fn insert(&self, credential: RefreshCredential) -> Result<RefreshCredential, StoreError> {
        Self::insert_with(&self.pool, &credential).await?;
        Ok(credential)
    }

    async fn find_by_secret_hash(&self, secret_hash: &str) -> Result<Option<RefreshCredential>, StoreError> {
        let query = format!("{SELECT_COLUMNS} WHERE secret_hash = ? LIMIT 1");

        let row = sqlx::query(&query)
            .bind(secret_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(Self::row_to_credential).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<RefreshCredential>, StoreError> {
        let query = format!("{SELECT_COLUMNS} WHERE id = ? LIMIT 1");

        let row = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(Self::row_to_credential).transpose()
    }

    async fn find_children(&self, parent_id: Uuid) -> Result<Vec<RefreshCredential>, StoreError> {
        let query = format!("{SELECT_COLUMNS} WHERE parent_id = ? ORDER BY created_at");

        let rows = sqlx::query(&query)
            .bind(parent_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Self::rows_to_credentials(&rows)
    }

    async fn find_active_by_owner(&self, owner_id: Uuid) -> Result<Vec<RefreshCredential>, StoreError> {
        let query = format!(
            "{SELECT_COLUMNS} WHERE user_id = ? AND used = FALSE AND revoked = FALSE AND expires_at > ? \
             ORDER BY created_at DESC"
        );

        let rows = sqlx::query(&query)
            .bind(owner_id.to_string())
            .bind(Utc::now())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Self::rows_to_credentials(&rows)
    }

    async fn mark_used(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET used = TRUE WHERE id = ? AND used = FALSE AND revoked = FALSE",
        )
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        match self.find_by_id(id).await? {
            Some(_) => Ok(false),
            None => Err(StoreError::NotFound { id: id.to_string() }),
        }
    }

    async fn consume_and_insert(
        &self,
        parent_id: Uuid,
        child: RefreshCredential,
    ) -> Result<RefreshCredential, StoreError> {
        let mut transaction = self.pool.begin().await.map_err(map_sqlx_error)?;

        let consumed = sqlx::query(
            "UPDATE refresh_tokens SET used = TRUE WHERE id = ? AND used = FALSE AND revoked = FALSE",
        )
        .bind(parent_id.to_string())
        .execute(&mut *transaction)
        .await
        .map_err(map_sqlx_error)?;

        if consumed.rows_affected() == 0 {
            // Locking read so a concurrent winner's committed state is visible
            let state: Option<(bool, bool)> =
                sqlx::query_as("SELECT used, revoked FROM refresh_tokens WHERE id = ? FOR UPDATE")
                    .bind(parent_id.to_string())
                    .fetch_optional(&mut *transaction)
                    .await
                    .map_err(map_sqlx_error)?;

            return Err(classify_failed_consume(parent_id, state));
        }

        // A duplicate child secret rolls the parent back to unused on drop
        Self::insert_with(&mut *transaction, &child).await?;

        transaction.commit().await.map_err(map_sqlx_error)?;

        Ok(child)
    }

    async fn revoke(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = ? AND revoked = FALSE")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn revoke_all_for_owner(&self, owner_id: Uuid) -> Result<usize, StoreError> {
        let result =
            sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE user_id = ? AND revoked = FALSE")
                .bind(owner_id.to_string())
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() as usize)
    }

    async fn revoke_family_tree(&self, root_id: Uuid) -> Result<FamilyRevocation, StoreError> {
        let mut transaction = self.pool.begin().await.map_err(map_sqlx_error)?;

        let root: Option<(String,)> = sqlx::query_as("SELECT id FROM refresh_tokens WHERE id = ? FOR UPDATE")
            .bind(root_id.to_string())
            .fetch_optional(&mut *transaction)
            .await
            .map_err(map_sqlx_error)?;

        if root.is_none() {
            return Err(StoreError::NotFound { id: root_id.to_string() });
        }

        let mut member_ids = vec![root_id];
        let mut visited = HashSet::from([root_id]);
        let mut frontier = vec![root_id];

        while !frontier.is_empty() {
            let mut builder = QueryBuilder::<MySql>::new("SELECT id FROM refresh_tokens WHERE parent_id IN (");
            let mut separated = builder.separated(", ");
            for id in &frontier {
                separated.push_bind(id.to_string());
            }
            separated.push_unseparated(") ORDER BY created_at FOR UPDATE");

            let rows: Vec<(String,)> = builder
                .build_query_as()
                .fetch_all(&mut *transaction)
                .await
                .map_err(map_sqlx_error)?;

            frontier = Vec::with_capacity(rows.len());
            for (id,) in rows {
                let id = parse_uuid(&id)?;
                if visited.insert(id) {
                    member_ids.push(id);
                    frontier.push(id);
                }
            }
        }

        let mut builder =
            QueryBuilder::<MySql>::new("UPDATE refresh_tokens SET revoked = TRUE WHERE revoked = FALSE AND id IN (");
        let mut separated = builder.separated(", ");
        for id in &member_ids {
            separated.push_bind(id.to_string());
        }
        separated.push_unseparated(")");

        let result = builder
            .build()
            .execute(&mut *transaction)
            .await
            .map_err(map_sqlx_error)?;

        transaction.commit().await.map_err(map_sqlx_error)?;

        Ok(FamilyRevocation {
            root_id,
            member_ids,
            newly_revoked: result.rows_affected() as usize,
        })
    }
}

/// Decide why the conditional consume matched no row
///
/// `state` is `(used, revoked)` re-read under lock, or `None` if the row is gone.
fn classify_failed_consume(parent_id: Uuid, state: Option<(bool, bool)>) -> StoreError {
    match state {
        None => StoreError::NotFound { id: parent_id.to_string() },
        Some((_, true)) => StoreError::Revoked,
        Some(_) => StoreError::AlreadyConsumed,
    }
}

/// Map SQLx failures onto store errors; unique violations mean a secret collision
fn map_sqlx_error(error: sqlx::Error) -> StoreError {
    match &error {
        sqlx::Error::Database(db_error) if db_error.is_unique_violation() => StoreError::DuplicateSecret,
        _ => {
            tracing::error!(error = %error, "Refresh token store query failed");
            StoreError::unavailable(&error)
        }
    }
}

fn column_error(column: &'static str) -> impl Fn(sqlx::Error) -> StoreError {
    move |e| StoreError::unavailable(format!("Failed to get {}: {}", column, e))
}

fn parse_uuid(value: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(value).map_err(|e| StoreError::unavailable(format!("Invalid UUID {:?}: {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_failed_consume() {
        let id = Uuid::new_v4();

        assert!(matches!(
            classify_failed_consume(id, None),
            StoreError::NotFound { .. }
        ));
        assert_eq!(classify_failed_consume(id, Some((true, false))), StoreError::AlreadyConsumed);
        assert_eq!(classify_failed_consume(id, Some((true, true))), StoreError::Revoked);
        assert_eq!(classify_failed_consume(id, Some((false, true))), StoreError::Revoked);
    }

    #[test]
    fn test_non_constraint_errors_are_unavailable() {
        let error = map_sqlx_error(sqlx::Error::RowNotFound);
        assert!(matches!(error, StoreError::Unavailable { .. }));

        let error = map_sqlx_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(error, StoreError::Unavailable { .. }));
    }

    #[test]
    fn test_parse_uuid() {
        let id = Uuid::new_v4();

        assert_eq!(parse_uuid(&id.to_string()).unwrap(), id);
        assert!(matches!(parse_uuid("not-a-uuid"), Err(StoreError::Unavailable { .. })));
    }

    #[test]
    fn test_select_columns_cover_entity() {
        for column in ["id", "user_id", "secret_hash", "created_at", "expires_at", "used", "revoked", "parent_id"] {
            assert!(SELECT_COLUMNS.contains(column), "missing column {}", column);
        }
    }
}

use async_trait::async_trait;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::connection::{ConnectionRequest, ConnectionRow, ConnectionStatus, NewConnection};
use crate::models::profile::UserId;
use crate::store::ConnectionStore;

const CONNECTION_COLUMNS: &str =
    "id, from_user_id, to_user_id, match_id, message, status, created_at, updated_at";

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Clone)]
pub struct PgConnectionStore {
    pool: PgPool,
}

impl PgConnectionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn has_code(err: &sqlx::Error, code: &str) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(code))
}

#[async_trait]
impl ConnectionStore for PgConnectionStore {
    async fn insert_pending(&self, new: NewConnection) -> Result<ConnectionRequest, AppError> {
        let mut tx = self.pool.begin().await?;

        // One lock per unordered pair, so A→B and B→A contend on the same key.
        let (low, high) = if new.from_user_id <= new.to_user_id {
            (new.from_user_id, new.to_user_id)
        } else {
            (new.to_user_id, new.from_user_id)
        };
        sqlx::query(
            "SELECT pg_advisory_xact_lock(\
             hashtextextended('connection:' || $1::text || ':' || $2::text, 0))",
        )
        .bind(low)
        .bind(high)
        .execute(&mut *tx)
        .await?;

        let pending: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT id FROM connection_requests
            WHERE LEAST(from_user_id, to_user_id) = $1
              AND GREATEST(from_user_id, to_user_id) = $2
              AND status = 'pending'
            "#,
        )
        .bind(low)
        .bind(high)
        .fetch_optional(&mut *tx)
        .await?;
        if pending.is_some() {
            return Err(AppError::DuplicatePending(new.from_user_id, new.to_user_id));
        }

        let inserted = sqlx::query_as::<_, ConnectionRow>(&format!(
            r#"
            INSERT INTO connection_requests (from_user_id, to_user_id, match_id, message, status)
            VALUES ($1, $2, $3, $4, 'pending')
            RETURNING {CONNECTION_COLUMNS}
            "#
        ))
        .bind(new.from_user_id)
        .bind(new.to_user_id)
        .bind(new.match_id)
        .bind(&new.message)
        .fetch_one(&mut *tx)
        .await;

        let row = match inserted {
            Ok(row) => row,
            Err(e) if has_code(&e, UNIQUE_VIOLATION) => {
                return Err(AppError::DuplicatePending(new.from_user_id, new.to_user_id))
            }
            Err(e) if has_code(&e, FOREIGN_KEY_VIOLATION) => {
                return Err(AppError::NotFound(format!(
                    "user {} or {} does not exist",
                    new.from_user_id, new.to_user_id
                )))
            }
            Err(e) => return Err(e.into()),
        };

        tx.commit().await?;
        Ok(ConnectionRequest::try_from(row)?)
    }

    async fn get(&self, id: i64) -> Result<Option<ConnectionRequest>, AppError> {
        let row: Option<ConnectionRow> = sqlx::query_as(&format!(
            "SELECT {CONNECTION_COLUMNS} FROM connection_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ConnectionRequest::try_from).transpose()?)
    }

    async fn resolve_pending(
        &self,
        id: i64,
        status: ConnectionStatus,
    ) -> Result<Option<ConnectionRequest>, AppError> {
        let row: Option<ConnectionRow> = sqlx::query_as(&format!(
            r#"
            UPDATE connection_requests
            SET status = $2, updated_at = now()
            WHERE id = $1 AND status = 'pending'
            RETURNING {CONNECTION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ConnectionRequest::try_from).transpose()?)
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<ConnectionRequest>, AppError> {
        let rows: Vec<ConnectionRow> = sqlx::query_as(&format!(
            "SELECT {CONNECTION_COLUMNS} FROM connection_requests \
             WHERE from_user_id = $1 OR to_user_id = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(ConnectionRequest::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::postgres::test_db;

    fn pending(from: UserId, to: UserId) -> NewConnection {
        NewConnection {
            from_user_id: from,
            to_user_id: to,
            match_id: None,
            message: None,
        }
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_pending_pair_is_unique_in_either_direction() {
        let pool = test_db::pool().await;
        let a = test_db::insert_user(&pool, "talent").await;
        let b = test_db::insert_user(&pool, "founder").await;
        let store = PgConnectionStore::new(pool);

        let first = store.insert_pending(pending(a, b)).await.unwrap();
        assert!(matches!(
            store.insert_pending(pending(b, a)).await,
            Err(AppError::DuplicatePending(_, _))
        ));

        store
            .resolve_pending(first.id, ConnectionStatus::Declined)
            .await
            .unwrap()
            .unwrap();
        let again = store.insert_pending(pending(b, a)).await.unwrap();
        assert_eq!(again.status, ConnectionStatus::Pending);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ignore = "requires DATABASE_URL"]
    async fn test_concurrent_inserts_leave_one_pending_row() {
        let pool = test_db::pool().await;
        let a = test_db::insert_user(&pool, "talent").await;
        let b = test_db::insert_user(&pool, "talent").await;
        let store = PgConnectionStore::new(pool);

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            let new = if i % 2 == 0 { pending(a, b) } else { pending(b, a) };
            handles.push(tokio::spawn(async move { store.insert_pending(new).await }));
        }
        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(AppError::DuplicatePending(_, _)) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(created, 1);
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_resolve_only_moves_pending_rows() {
        let pool = test_db::pool().await;
        let a = test_db::insert_user(&pool, "talent").await;
        let b = test_db::insert_user(&pool, "founder").await;
        let store = PgConnectionStore::new(pool);

        let request = store.insert_pending(pending(a, b)).await.unwrap();
        let accepted = store
            .resolve_pending(request.id, ConnectionStatus::Accepted)
            .await
            .unwrap();
        assert_eq!(accepted.map(|r| r.status), Some(ConnectionStatus::Accepted));
        assert!(store
            .resolve_pending(request.id, ConnectionStatus::Declined)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_unknown_user_is_not_found() {
        let pool = test_db::pool().await;
        let a = test_db::insert_user(&pool, "talent").await;
        let store = PgConnectionStore::new(pool);
        assert!(matches!(
            store.insert_pending(pending(a, i64::MAX)).await,
            Err(AppError::NotFound(_))
        ));
    }
}

// src/db/notification_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::notifications::{Notification, NotificationKind, NotificationPreference},
};

// Sempre no pool, nunca dentro da transação de quem notifica.
#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        kind: NotificationKind,
        title: &str,
        body: &str,
    ) -> Result<Notification, AppError> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (tenant_id, user_id, kind, title, body)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(kind)
        .bind(title)
        .bind(body)
        .fetch_one(&self.pool)
        .await?;
        Ok(notification)
    }

    pub async fn list_for_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Notification>, i64), AppError> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE tenant_id = $1 AND user_id = $2 AND (NOT $3 OR read_at IS NULL)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(unread_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *tx)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM notifications
            WHERE tenant_id = $1 AND user_id = $2 AND (NOT $3 OR read_at IS NULL)
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(unread_only)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((rows, total))
    }

    /// Marca uma notificação do próprio usuário como lida (idempotente).
    pub async fn mark_read(&self, tenant_id: Uuid, user_id: Uuid, id: Uuid) -> Result<Option<Notification>, AppError> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications SET read_at = COALESCE(read_at, NOW())
            WHERE id = $1 AND tenant_id = $2 AND user_id = $3
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(notification)
    }

    pub async fn mark_all_read(&self, tenant_id: Uuid, user_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE notifications SET read_at = NOW()
            WHERE tenant_id = $1 AND user_id = $2 AND read_at IS NULL
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn find_preference(&self, user_id: Uuid) -> Result<Option<NotificationPreference>, AppError> {
        let pref = sqlx::query_as::<_, NotificationPreference>(
            "SELECT in_app, email, sms FROM notification_preferences WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(pref)
    }

    pub async fn upsert_preference(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        pref: NotificationPreference,
    ) -> Result<NotificationPreference, AppError> {
        let saved = sqlx::query_as::<_, NotificationPreference>(
            r#"
            INSERT INTO notification_preferences (user_id, tenant_id, in_app, email, sms)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE SET
                in_app = EXCLUDED.in_app,
                email = EXCLUDED.email,
                sms = EXCLUDED.sms,
                updated_at = NOW()
            RETURNING in_app, email, sms
            "#,
        )
        .bind(user_id)
        .bind(tenant_id)
        .bind(pref.in_app)
        .bind(pref.email)
        .bind(pref.sms)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }
}

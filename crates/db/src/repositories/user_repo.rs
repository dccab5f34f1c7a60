//! Repositories for the `users` and `notification_channels` tables.

use sqlx::PgPool;
use startline_core::types::DbId;

use crate::models::user::{NotificationChannels, PushSubscriptionInput, User};

// ===========================================================================
// UserRepo
// ===========================================================================

const USER_COLUMNS: &str = "\
    id, email, password_hash, display_name, role, created_at, updated_at";

/// CRUD for the `users` table.
pub struct UserRepo;

impl UserRepo {
    /// Find a user by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by email address.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Create a new user with a pre-hashed password.
    pub async fn create(
        pool: &PgPool,
        email: &str,
        password_hash: &str,
        display_name: Option<&str>,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, password_hash, display_name) \
             VALUES ($1, $2, $3) \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .bind(password_hash)
            .bind(display_name)
            .fetch_one(pool)
            .await
    }
}

// ===========================================================================
// NotificationChannelRepo
// ===========================================================================

const CHANNEL_COLUMNS: &str = "\
    user_id, push_enabled, email_enabled, push_endpoint, push_p256dh, \
    push_auth, updated_at";

/// CRUD for the `notification_channels` table.
pub struct NotificationChannelRepo;

impl NotificationChannelRepo {
    /// Get a user's channel state, creating the default row if absent.
    pub async fn get_or_create(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<NotificationChannels, sqlx::Error> {
        let query = format!(
            "INSERT INTO notification_channels (user_id) \
             VALUES ($1) \
             ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id \
             RETURNING {CHANNEL_COLUMNS}"
        );
        sqlx::query_as::<_, NotificationChannels>(&query)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Update the per-channel enable flags. Unspecified flags are kept.
    pub async fn update_flags(
        pool: &PgPool,
        user_id: DbId,
        push_enabled: Option<bool>,
        email_enabled: Option<bool>,
    ) -> Result<NotificationChannels, sqlx::Error> {
        let query = format!(
            "INSERT INTO notification_channels (user_id, push_enabled, email_enabled) \
             VALUES ($1, COALESCE($2, FALSE), COALESCE($3, TRUE)) \
             ON CONFLICT (user_id) DO UPDATE SET \
                 push_enabled = COALESCE($2, notification_channels.push_enabled), \
                 email_enabled = COALESCE($3, notification_channels.email_enabled), \
                 updated_at = now() \
             RETURNING {CHANNEL_COLUMNS}"
        );
        sqlx::query_as::<_, NotificationChannels>(&query)
            .bind(user_id)
            .bind(push_enabled)
            .bind(email_enabled)
            .fetch_one(pool)
            .await
    }

    /// Store (or replace) the user's Web Push subscription.
    pub async fn set_push_subscription(
        pool: &PgPool,
        user_id: DbId,
        subscription: &PushSubscriptionInput,
    ) -> Result<NotificationChannels, sqlx::Error> {
        let query = format!(
            "INSERT INTO notification_channels \
                 (user_id, push_endpoint, push_p256dh, push_auth) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id) DO UPDATE SET \
                 push_endpoint = $2, push_p256dh = $3, push_auth = $4, \
                 updated_at = now() \
             RETURNING {CHANNEL_COLUMNS}"
        );
        sqlx::query_as::<_, NotificationChannels>(&query)
            .bind(user_id)
            .bind(&subscription.endpoint)
            .bind(&subscription.keys.p256dh)
            .bind(&subscription.keys.auth)
            .fetch_one(pool)
            .await
    }

    /// Drop the stored Web Push subscription (e.g. after unsubscribe).
    pub async fn clear_push_subscription(pool: &PgPool, user_id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE notification_channels \
             SET push_endpoint = NULL, push_p256dh = NULL, push_auth = NULL, \
                 updated_at = now() \
             WHERE user_id = $1",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}

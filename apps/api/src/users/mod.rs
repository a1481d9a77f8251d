//! Credentials and intake profiles, persisted in the `users` table.

pub mod password;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::{UserProfile, UserRow};

pub use password::{hash_password, verify_password};

const USER_COLUMNS: &str = "id, username, password_hash, pdf_path, full_name, age, gender, \
     family_history, previous_conditions, smoking_habits, alcohol_consumption, contact_email, \
     created_at";

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `AppError::Conflict` when the username is taken.
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<UserRow, AppError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRow>, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRow>, AppError>;
    async fn update_profile(&self, id: Uuid, profile: &UserProfile) -> Result<(), AppError>;
    async fn set_report_path(&self, id: Uuid, key: &str) -> Result<(), AppError>;
}

/// Username and password must be non-blank and the confirmation must match.
pub fn validate_registration(
    username: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), AppError> {
    if username.trim().is_empty() || password.trim().is_empty() {
        return Err(AppError::Validation(
            "Username and password are required".to_string(),
        ));
    }
    if password != confirm_password {
        return Err(AppError::Validation("Passwords do not match".to_string()));
    }
    Ok(())
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<UserRow, AppError> {
        let inserted = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (username, password_hash) VALUES ($1, $2) RETURNING {USER_COLUMNS}"
        ))
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(row) => {
                info!(user_id = %row.id, "Registered user {username}");
                Ok(row)
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(AppError::Conflict(
                format!("Username '{username}' is already taken"),
            )),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRow>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRow>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_profile(&self, id: Uuid, profile: &UserProfile) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                full_name = $2, age = $3, gender = $4, family_history = $5,
                previous_conditions = $6, smoking_habits = $7, alcohol_consumption = $8,
                contact_email = $9
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&profile.full_name)
        .bind(profile.age)
        .bind(profile.gender.as_str())
        .bind(&profile.family_history)
        .bind(&profile.previous_conditions)
        .bind(profile.smoking_habits.as_str())
        .bind(profile.alcohol_consumption.as_str())
        .bind(&profile.contact_email)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {id} not found")));
        }
        info!(user_id = %id, "Profile updated");
        Ok(())
    }

    async fn set_report_path(&self, id: Uuid, key: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET pdf_path = $2 WHERE id = $1")
            .bind(id)
            .bind(key)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {id} not found")));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use chrono::Utc;
    use tokio::sync::RwLock;

    use super::*;

    /// In-memory `UserStore` with the same uniqueness rule as the table.
    #[derive(Default)]
    pub(crate) struct MemoryUserStore {
        rows: RwLock<HashMap<Uuid, UserRow>>,
    }

    #[async_trait]
    impl UserStore for MemoryUserStore {
        async fn create_user(
            &self,
            username: &str,
            password_hash: &str,
        ) -> Result<UserRow, AppError> {
            let mut rows = self.rows.write().await;
            if rows.values().any(|r| r.username == username) {
                return Err(AppError::Conflict(format!(
                    "Username '{username}' is already taken"
                )));
            }
            let row = UserRow {
                id: Uuid::new_v4(),
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                pdf_path: None,
                full_name: None,
                age: None,
                gender: None,
                family_history: None,
                previous_conditions: None,
                smoking_habits: None,
                alcohol_consumption: None,
                contact_email: None,
                created_at: Utc::now(),
            };
            rows.insert(row.id, row.clone());
            Ok(row)
        }

        async fn find_by_username(&self, username: &str) -> Result<Option<UserRow>, AppError> {
            Ok(self
                .rows
                .read()
                .await
                .values()
                .find(|r| r.username == username)
                .cloned())
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRow>, AppError> {
            Ok(self.rows.read().await.get(&id).cloned())
        }

        async fn update_profile(&self, id: Uuid, profile: &UserProfile) -> Result<(), AppError> {
            let mut rows = self.rows.write().await;
            let row = rows
                .get_mut(&id)
                .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))?;
            row.full_name = Some(profile.full_name.clone());
            row.age = Some(profile.age);
            row.gender = Some(profile.gender.as_str().to_string());
            row.family_history = profile.family_history.clone();
            row.previous_conditions = profile.previous_conditions.clone();
            row.smoking_habits = Some(profile.smoking_habits.as_str().to_string());
            row.alcohol_consumption = Some(profile.alcohol_consumption.as_str().to_string());
            row.contact_email = Some(profile.contact_email.clone());
            Ok(())
        }

        async fn set_report_path(&self, id: Uuid, key: &str) -> Result<(), AppError> {
            let mut rows = self.rows.write().await;
            let row = rows
                .get_mut(&id)
                .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))?;
            row.pdf_path = Some(key.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_registration_requires_both_fields() {
        assert!(matches!(
            validate_registration("", "pw", "pw"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            validate_registration("nina", "   ", "   "),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_registration_requires_matching_confirmation() {
        assert!(validate_registration("nina", "pw1", "pw2").is_err());
        assert!(validate_registration("nina", "pw1", "pw1").is_ok());
    }

    #[tokio::test]
    async fn test_memory_store_enforces_unique_usernames() {
        let store = MemoryUserStore::default();
        store.create_user("nina", "h").await.unwrap();
        assert!(matches!(
            store.create_user("nina", "h2").await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_profile_columns_round_trip_through_row() {
        use crate::models::user::{AlcoholConsumption, Gender, SmokingHabits};

        let store = MemoryUserStore::default();
        let user = store.create_user("nina", "h").await.unwrap();
        assert!(user.profile().is_none());

        let profile = UserProfile {
            full_name: "Nina Patel".to_string(),
            age: 34,
            gender: Gender::Female,
            family_history: None,
            previous_conditions: Some("Eczema".to_string()),
            smoking_habits: SmokingHabits::NonSmoker,
            alcohol_consumption: AlcoholConsumption::Occasional,
            contact_email: "nina@example.com".to_string(),
        };
        store.update_profile(user.id, &profile).await.unwrap();

        let row = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(row.profile(), Some(profile));
    }
}

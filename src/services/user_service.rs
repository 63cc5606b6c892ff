//! User directory service.
//!
//! Account CRUD for the user directory. Passwords are stored as bcrypt
//! hashes and never leave this module in plain form except for the reset
//! flow, which returns the freshly generated password once.

use rand::Rng;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::user::{Role, User};
use crate::services::auth_service::AuthService;

/// Candidate fields for a new account.
#[derive(Debug, Deserialize, ToSchema)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    pub full_name: String,
    pub department: Option<String>,
    pub position: Option<String>,
    pub role: Option<Role>,
}

/// Partial update to an account. Username is immutable.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub role: Option<Role>,
    pub password: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.full_name.is_none()
            && self.department.is_none()
            && self.position.is_none()
            && self.role.is_none()
            && self.password.is_none()
    }
}

/// Generate a random password for resets.
pub(crate) fn generate_password() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghjkmnpqrstuvwxyz23456789!@#$%&*";
    let mut rng = rand::rng();
    (0..12)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// User directory service
pub struct UserService {
    db: PgPool,
}

impl UserService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List users with optional search and role filter, newest first.
    pub async fn list(
        &self,
        search: Option<&str>,
        role: Option<Role>,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<User>, i64)> {
        let offset = (page.saturating_sub(1) as i64) * limit as i64;
        let search = search.map(str::trim).filter(|s| !s.is_empty());

        let mut qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT * FROM users WHERE 1=1");
        push_user_predicates(&mut qb, search, role);
        qb.push(" ORDER BY created_at DESC, id LIMIT ")
            .push_bind(limit as i64)
            .push(" OFFSET ")
            .push_bind(offset);
        let users = qb.build_query_as::<User>().fetch_all(&self.db).await?;

        let mut count_qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM users WHERE 1=1");
        push_user_predicates(&mut count_qb, search, role);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.db).await?;

        Ok((users, total))
    }

    /// Create an account. Username and email must be unused.
    pub async fn create(&self, req: NewUser) -> Result<User> {
        if req.username.trim().is_empty()
            || req.password.is_empty()
            || req.email.trim().is_empty()
            || req.full_name.trim().is_empty()
        {
            return Err(AppError::Validation(
                "username, password, email and full_name are required".to_string(),
            ));
        }

        let username_taken: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM users WHERE username = $1")
                .bind(&req.username)
                .fetch_optional(&self.db)
                .await?;
        if username_taken.is_some() {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }

        let email_taken: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
            .bind(&req.email)
            .fetch_optional(&self.db)
            .await?;
        if email_taken.is_some() {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        let password_hash = AuthService::hash_password(&req.password)?;
        let role = req.role.unwrap_or(Role::Curator);

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, password_hash, email, full_name, department, position, role) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(&req.username)
        .bind(&password_hash)
        .bind(&req.email)
        .bind(&req.full_name)
        .bind(&req.department)
        .bind(&req.position)
        .bind(role)
        .fetch_one(&self.db)
        .await?;

        info!(username = %user.username, role = %user.role, "user created");
        Ok(user)
    }

    /// Get a user by ID
    pub async fn get(&self, id: Uuid) -> Result<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Apply a partial update to an account.
    pub async fn update(&self, id: Uuid, req: UserUpdate) -> Result<User> {
        if req.is_empty() {
            return Err(AppError::Validation("No fields to update".to_string()));
        }

        let current = self.get(id).await?;

        // Email uniqueness across other accounts.
        if let Some(email) = &req.email {
            if email != &current.email {
                let taken: Option<(Uuid,)> =
                    sqlx::query_as("SELECT id FROM users WHERE email = $1 AND id <> $2")
                        .bind(email)
                        .bind(id)
                        .fetch_optional(&self.db)
                        .await?;
                if taken.is_some() {
                    return Err(AppError::Conflict(
                        "Email already used by another account".to_string(),
                    ));
                }
            }
        }

        let password_hash = match &req.password {
            Some(p) if !p.is_empty() => Some(AuthService::hash_password(p)?),
            _ => None,
        };

        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new("UPDATE users SET ");
        {
            let mut set = qb.separated(", ");
            if let Some(email) = req.email {
                set.push("email = ").push_bind_unseparated(email);
            }
            if let Some(full_name) = req.full_name {
                set.push("full_name = ").push_bind_unseparated(full_name);
            }
            if let Some(department) = req.department {
                set.push("department = ").push_bind_unseparated(department);
            }
            if let Some(position) = req.position {
                set.push("position = ").push_bind_unseparated(position);
            }
            if let Some(role) = req.role {
                set.push("role = ").push_bind_unseparated(role);
            }
            if let Some(hash) = password_hash {
                set.push("password_hash = ").push_bind_unseparated(hash);
            }
        }
        qb.push(", updated_at = now() WHERE id = ")
            .push_bind(id)
            .push(" RETURNING *");

        let updated = qb
            .build_query_as::<User>()
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::UpdateFailed(format!("no rows affected updating user {}", id)))?;

        info!(username = %updated.username, "user updated");
        Ok(updated)
    }

    /// Delete an account. Self-deletion and deleting the bootstrap admin
    /// account are rejected.
    pub async fn delete(&self, id: Uuid, acting_user: Uuid) -> Result<()> {
        if id == acting_user {
            return Err(AppError::Validation(
                "Cannot delete your own account".to_string(),
            ));
        }

        let user = self.get(id).await?;
        if user.username == "admin" {
            return Err(AppError::Validation(
                "Cannot delete the system admin account".to_string(),
            ));
        }

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        info!(username = %user.username, "user deleted");
        Ok(())
    }

    /// Reset an account password to a random one and return it.
    pub async fn reset_password(&self, id: Uuid) -> Result<String> {
        let user = self.get(id).await?;

        let new_password = generate_password();
        let password_hash = AuthService::hash_password(&new_password)?;

        let result = sqlx::query("UPDATE users SET password_hash = $1, updated_at = now() WHERE id = $2")
            .bind(&password_hash)
            .bind(id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::UpdateFailed(format!(
                "no rows affected resetting password for user {}",
                id
            )));
        }

        info!(username = %user.username, "password reset");
        Ok(new_password)
    }
}

fn push_user_predicates(
    qb: &mut QueryBuilder<'_, Postgres>,
    search: Option<&str>,
    role: Option<Role>,
) {
    if let Some(search) = search {
        let pattern = format!("%{}%", search);
        qb.push(" AND (username ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR full_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(role) = role {
        qb.push(" AND role = ").push_bind(role);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_password_length_and_charset() {
        let password = generate_password();
        assert_eq!(password.chars().count(), 12);
        // Ambiguous characters (0, O, 1, I, l) are excluded from the charset.
        assert!(!password.contains(['0', 'O', '1', 'I', 'l']));
    }

    #[test]
    fn test_generated_passwords_differ() {
        assert_ne!(generate_password(), generate_password());
    }

    #[test]
    fn test_empty_update_detected() {
        assert!(UserUpdate::default().is_empty());
        let patch = UserUpdate {
            role: Some(Role::Researcher),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_user_predicates_sql() {
        let mut qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM users WHERE 1=1");
        push_user_predicates(&mut qb, Some("张"), Some(Role::Curator));
        let sql = qb.sql();
        assert!(sql.contains("username ILIKE $1"));
        assert!(sql.contains("role = $4"));
    }
}

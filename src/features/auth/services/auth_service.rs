use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::{AuthUserDto, LoginDto, RegisterDto, UserProfileDto};
use crate::features::auth::models::{User, UserRole};
use crate::features::auth::password::{hash_password, verify_password};
use crate::features::auth::JwtValidator;

/// Service for user registration, login and account management
pub struct AuthService {
    pool: PgPool,
    validator: Arc<JwtValidator>,
}

impl AuthService {
    pub fn new(pool: PgPool, validator: Arc<JwtValidator>) -> Self {
        Self { pool, validator }
    }

    /// Register a new photographer account and issue a token
    pub async fn register(&self, dto: RegisterDto) -> Result<AuthUserDto> {
        let existing = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE email = $1")
            .bind(&dto.email)
            .fetch_optional(&self.pool)
            .await?;

        if existing.is_some() {
            return Err(AppError::BadRequest("User already exists".to_string()));
        }

        let password_hash = hash_password(&dto.password)?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&dto.name)
        .bind(&dto.email)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("User registered: id={}, email={}", user.id, user.email);

        self.to_auth_dto(user)
    }

    /// Verify credentials and issue a token
    pub async fn login(&self, dto: LoginDto) -> Result<AuthUserDto> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(&dto.email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::Auth("Invalid email or password".to_string()))?;

        if !verify_password(&dto.password, &user.password_hash)? {
            return Err(AppError::Auth("Invalid email or password".to_string()));
        }

        self.to_auth_dto(user)
    }

    /// Fetch the profile for an authenticated user
    pub async fn profile(&self, user_id: Uuid) -> Result<UserProfileDto> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(user.into())
    }

    /// List all photographer accounts (admin view)
    pub async fn list_photographers(&self) -> Result<Vec<UserProfileDto>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE role = 'photographer' ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users.into_iter().map(Into::into).collect())
    }

    /// Delete a user account; their orders cascade at the database level
    pub async fn delete_user(&self, user_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        tracing::info!("User deleted: id={}", user_id);
        Ok(())
    }

    /// Ensure the bootstrap admin account exists
    pub async fn ensure_admin(&self, name: &str, email: &str, password: &str) -> Result<()> {
        let existing = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        if existing.is_some() {
            return Ok(());
        }

        let password_hash = hash_password(password)?;

        sqlx::query(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(&password_hash)
        .bind(UserRole::Admin)
        .execute(&self.pool)
        .await?;

        tracing::info!("Admin user created: {}", email);
        Ok(())
    }

    fn to_auth_dto(&self, user: User) -> Result<AuthUserDto> {
        let token = self.validator.issue_token(user.id)?;
        Ok(AuthUserDto {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            token,
        })
    }
}

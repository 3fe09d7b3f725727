//! Login and current-user use cases.

use crate::auth::password::verify_password;
use crate::auth::TokenService;
use crate::error::{AppError, MSG_MISSING_CREDENTIALS};
use crate::infra::get_connection;
use crate::infra::DbPool;
use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct LoginReq {
    /// Username or email.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserDto {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResp {
    pub token: String,
    pub expires_in: i64,
    pub user: UserDto,
}

pub fn login(pool: &DbPool, tokens: &TokenService, req: LoginReq) -> Result<LoginResp, AppError> {
    let username = req.username.as_deref().map(str::trim).unwrap_or_default();
    let password = req.password.as_deref().unwrap_or_default();
    if username.is_empty() || password.is_empty() {
        return Err(AppError::Validation(MSG_MISSING_CREDENTIALS.into()));
    }

    let row = {
        let conn = get_connection(pool);
        conn.query_row(
            "SELECT id, username, email, role, created_at, password_hash FROM users WHERE username = ?1 OR email = ?1",
            [username],
            |r| {
                Ok((
                    UserDto {
                        id: r.get(0)?,
                        username: r.get(1)?,
                        email: r.get(2)?,
                        role: r.get(3)?,
                        created_at: r.get(4)?,
                    },
                    r.get::<_, String>(5)?,
                ))
            },
        )
        .optional()?
    };

    let (user, hash) = match row {
        Some(found) => found,
        None => {
            log::warn!("login failed: unknown user '{}'", username);
            return Err(AppError::BadCredentials);
        }
    };
    if !verify_password(password, &hash) {
        log::warn!("login failed: bad password for '{}'", user.username);
        return Err(AppError::BadCredentials);
    }

    let token = tokens.issue(user.id, &user.username, &user.role)?;
    log::info!("user '{}' logged in", user.username);
    Ok(LoginResp {
        token,
        expires_in: tokens.ttl_seconds(),
        user,
    })
}

pub fn user_get(pool: &DbPool, id: i64) -> Result<UserDto, AppError> {
    let conn = get_connection(pool);
    conn.query_row(
        "SELECT id, username, email, role, created_at FROM users WHERE id = ?1",
        [id],
        |r| {
            Ok(UserDto {
                id: r.get(0)?,
                username: r.get(1)?,
                email: r.get(2)?,
                role: r.get(3)?,
                created_at: r.get(4)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| AppError::NotFound(format!("user {}", id)))
}

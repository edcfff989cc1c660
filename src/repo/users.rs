use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use super::{decode, decode_all};
use crate::domain::User;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRow {
    id: Uuid,
    role: String,
    username: String,
    email: Option<String>,
    full_name: String,
    company_name: String,
    phone: String,
    address: String,
    experience_years: i32,
    is_verified: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            role: decode("role", &row.role)?,
            username: row.username,
            email: row.email,
            full_name: row.full_name,
            company_name: row.company_name,
            phone: row.phone,
            address: row.address,
            experience_years: row.experience_years,
            is_verified: row.is_verified,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const COLUMNS: &str = "id, role, username, email, full_name, company_name, phone, address, \
                       experience_years, is_verified, created_at, updated_at";

pub async fn find(conn: &mut PgConnection, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    row.map(User::try_from).transpose()
}

pub async fn find_many(conn: &mut PgConnection, ids: &[Uuid]) -> Result<Vec<User>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {COLUMNS} FROM users WHERE id = ANY($1)"
    ))
    .bind(ids)
    .fetch_all(conn)
    .await?;
    decode_all(rows)
}

pub async fn insert(conn: &mut PgConnection, user: &User) -> Result<User, sqlx::Error> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        INSERT INTO users (id, role, username, email, full_name, company_name, phone, address,
                           experience_years, is_verified)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(user.id)
    .bind(user.role.as_str())
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.full_name)
    .bind(&user.company_name)
    .bind(&user.phone)
    .bind(&user.address)
    .bind(user.experience_years)
    .bind(user.is_verified)
    .fetch_one(conn)
    .await?;
    row.try_into()
}

/// Writes the mutable profile fields; `role` is never updated.
pub async fn update_profile(conn: &mut PgConnection, user: &User) -> Result<User, sqlx::Error> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        UPDATE users
        SET username = $2, email = $3, full_name = $4, company_name = $5, phone = $6,
            address = $7, experience_years = $8, updated_at = NOW()
        WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.full_name)
    .bind(&user.company_name)
    .bind(&user.phone)
    .bind(&user.address)
    .bind(user.experience_years)
    .fetch_one(conn)
    .await?;
    row.try_into()
}

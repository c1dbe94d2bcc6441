//! Postgres principal store.
//!
//! One table per role (`students`, `instructors`). Rotation is a single
//! `UPDATE ... WHERE id = $1 AND refresh_token_hash = $2`; a zero row count
//! means a concurrent rotation already consumed the presented token.

use super::{PrincipalFilter, PrincipalPatch, PrincipalStore, StoreError, StoreResult};
use crate::principal::{Account, EmailVerification, Instructor, Principal, Role, Student};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

const ACCOUNT_COLUMNS: &str = "id, email, password_hash, first_name, last_name, \
     refresh_token_hash, email_verified, verification_token, verification_token_expires, created_at";

pub struct PgPrincipalStore {
    pool: PgPool,
    role: Role,
}

impl PgPrincipalStore {
    pub fn new(pool: PgPool, role: Role) -> Self {
        Self { pool, role }
    }

    fn table(&self) -> &'static str {
        match self.role {
            Role::Student => "students",
            Role::Instructor => "instructors",
        }
    }

    fn select_columns(&self) -> String {
        match self.role {
            Role::Student => format!("{}, enrolled_courses", ACCOUNT_COLUMNS),
            Role::Instructor => format!("{}, bio, expertise", ACCOUNT_COLUMNS),
        }
    }

    fn decode(&self, row: &PgRow) -> StoreResult<Principal> {
        let account = Account {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            refresh_token_hash: row.try_get("refresh_token_hash")?,
            verification: EmailVerification {
                verified: row.try_get("email_verified")?,
                token: row.try_get("verification_token")?,
                expires_at: row.try_get("verification_token_expires")?,
            },
            created_at: row.try_get("created_at")?,
        };

        let principal = match self.role {
            Role::Student => Student {
                account,
                enrolled_courses: row.try_get("enrolled_courses")?,
            }
            .into(),
            Role::Instructor => Instructor {
                account,
                bio: row.try_get("bio")?,
                expertise: row.try_get("expertise")?,
            }
            .into(),
        };
        Ok(principal)
    }
}

#[async_trait]
impl PrincipalStore for PgPrincipalStore {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Principal>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            self.select_columns(),
            self.table()
        );
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(|r| self.decode(r)).transpose()
    }

    async fn find_one(&self, filter: &PrincipalFilter) -> StoreResult<Option<Principal>> {
        let sql = format!(
            r#"
            SELECT {} FROM {}
            WHERE ($1::text IS NULL OR id = $1) AND refresh_token_hash = $2
            LIMIT 1
            "#,
            self.select_columns(),
            self.table()
        );
        let row = sqlx::query(&sql)
            .bind(filter.id.as_deref())
            .bind(&filter.refresh_token_hash)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(|r| self.decode(r)).transpose()
    }

    async fn update_by_id(&self, id: &str, patch: PrincipalPatch) -> StoreResult<()> {
        let hash = match patch {
            PrincipalPatch::SetRefreshToken(hash) => Some(hash),
            PrincipalPatch::ClearRefreshToken => None,
        };
        let sql = format!(
            "UPDATE {} SET refresh_token_hash = $2 WHERE id = $1",
            self.table()
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(hash)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn rotate_refresh_token(
        &self,
        id: &str,
        expected: &str,
        replacement: &str,
    ) -> StoreResult<bool> {
        let sql = format!(
            "UPDATE {} SET refresh_token_hash = $3 WHERE id = $1 AND refresh_token_hash = $2",
            self.table()
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(expected)
            .bind(replacement)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn clear_refresh_token_if(&self, id: &str, expected: &str) -> StoreResult<bool> {
        let sql = format!(
            "UPDATE {} SET refresh_token_hash = NULL WHERE id = $1 AND refresh_token_hash = $2",
            self.table()
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(expected)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn insert(&self, principal: Principal) -> StoreResult<()> {
        if principal.role() != self.role {
            return Err(StoreError::Backend(format!(
                "{} cannot be stored in the {} table",
                principal.role(),
                self.table()
            )));
        }

        let account = principal.account();
        let (extra_columns, extra_params) = match self.role {
            Role::Student => ("enrolled_courses", "$11"),
            Role::Instructor => ("bio, expertise", "$11, $12"),
        };
        let sql = format!(
            r#"
            INSERT INTO {} ({}, {})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, {})
            "#,
            self.table(),
            ACCOUNT_COLUMNS,
            extra_columns,
            extra_params
        );

        let query = sqlx::query(&sql)
            .bind(&account.id)
            .bind(&account.email)
            .bind(&account.password_hash)
            .bind(&account.first_name)
            .bind(&account.last_name)
            .bind(&account.refresh_token_hash)
            .bind(account.verification.verified)
            .bind(&account.verification.token)
            .bind(account.verification.expires_at)
            .bind(account.created_at);

        let query = match &principal {
            Principal::Student(s) => query.bind(&s.enrolled_courses),
            Principal::Instructor(i) => query.bind(&i.bio).bind(&i.expertise),
        };
        query.execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    models::{User, UserFilter, UserRole},
    pagination::{
        fetch_page, like_pattern, FilterValue, PageScope, PaginationError, PaginationParams, PaginationResult,
    },
};

const USER_COLUMNS: &str = "id, name, email, password, role, verified_email, created_at, updated_at";

pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub verified_email: bool,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<UserRole>,
}

pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_user(&self, user: NewUser) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, name, email, password, role, verified_email) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(user.name)
        .bind(user.email.to_lowercase())
        .bind(user.password_hash)
        .bind(user.role)
        .bind(user.verified_email)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS))
            .bind(email.to_lowercase())
            .fetch_optional(&self.pool)
            .await
    }

    /// Applies the given changes and returns the updated row, or `None` for an unknown id.
    pub async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, sqlx::Error> {
        let mut query: QueryBuilder<'static, Postgres> = QueryBuilder::new("UPDATE users SET updated_at = NOW()");

        if let Some(name) = changes.name {
            query.push(", name = ").push_bind(name);
        }
        if let Some(email) = changes.email {
            query.push(", email = ").push_bind(email.to_lowercase());
        }
        if let Some(password_hash) = changes.password_hash {
            query.push(", password = ").push_bind(password_hash);
        }
        if let Some(role) = changes.role {
            query.push(", role = ").push_bind(role);
        }

        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(USER_COLUMNS);

        query.build_query_as::<User>().fetch_optional(&self.pool).await
    }

    /// Returns whether a row was removed.
    pub async fn delete_user(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_users(
        &self,
        params: &PaginationParams,
        filter: &UserFilter,
    ) -> Result<PaginationResult<User>, PaginationError> {
        fetch_page(&self.pool, &Self::scope(filter), params).await
    }

    pub fn scope(filter: &UserFilter) -> PageScope {
        let mut scope = PageScope::new("users", "created_at")
            .columns(USER_COLUMNS)
            .search(search_users);
        if let Some(role) = filter.role {
            scope = scope.filter_eq("role", FilterValue::Text(role.as_str().to_string()));
        }
        if let Some(verified) = filter.verified_email {
            scope = scope.filter_eq("verified_email", FilterValue::Bool(verified));
        }
        scope
    }
}

fn search_users(query: &mut QueryBuilder<'static, Postgres>, term: &str) {
    let pattern = like_pattern(term);
    query
        .push("name ILIKE ")
        .push_bind(pattern.clone())
        .push(" OR email ILIKE ")
        .push_bind(pattern.clone())
        .push(" OR role ILIKE ")
        .push_bind(pattern);
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! PostgreSQL access with typed operations.
//!
//! Provides high-level operations for:
//! - Users (mirrored from the identity provider)
//! - Problems (always scoped by owner)
//! - Categories (created on first use, linked through `problem_categories`)
//! - Maintenance (row counts, seeding categories, wiping every table)

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder, Transaction};

use crate::config::DatabaseConfig;
use crate::error::AppError;
use crate::models::{Problem, ProblemFields, ProblemFilter, ProblemSummary, User, UserProfile};

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Category names of `p`, sorted, as a `text[]`.
const CATEGORY_NAMES: &str = "COALESCE(array_agg(c.name ORDER BY c.name) \
     FILTER (WHERE c.name IS NOT NULL), '{}') AS categories";

const PROBLEM_COLUMNS: &str = "p.id, p.user_id, p.title, p.url, p.difficulty, p.language_used, \
     p.solution_notes, p.what_went_wrong, p.trigger_keywords, p.time_complexity, \
     p.space_complexity, p.was_hard, p.date_solved, p.created_at, p.updated_at";

const SUMMARY_COLUMNS: &str =
    "p.id, p.title, p.difficulty, p.language_used, p.was_hard, p.date_solved, p.updated_at";

const PROBLEM_JOINS: &str = "FROM problems p \
     LEFT JOIN problem_categories pc ON pc.problem_id = p.id \
     LEFT JOIN categories c ON c.id = pc.category_id";

const USER_COLUMNS: &str = "id, email, first_name, last_name, created_at, updated_at";

/// PostgreSQL database handle.
///
/// Cloning is cheap; all clones share one pool.
#[derive(Clone)]
pub struct Db {
    pool: Option<PgPool>,
}

impl Db {
    /// Connect to the resolved database and apply pending migrations.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(&config.url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(sqlx::Error::from)?;

        tracing::info!(
            mode = %config.mode,
            max_connections = config.max_connections,
            "Connected to PostgreSQL"
        );

        Ok(Self { pool: Some(pool) })
    }

    /// Create an offline handle for testing.
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { pool: None }
    }

    fn pool(&self) -> Result<&PgPool, AppError> {
        self.pool
            .as_ref()
            .ok_or(AppError::Database(sqlx::Error::PoolClosed))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by identity-provider id.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .fetch_optional(self.pool()?)
            .await?)
    }

    /// Create or update a user. Replays of the same event converge.
    pub async fn upsert_user(&self, profile: &UserProfile) -> Result<User, AppError> {
        let query = format!(
            "INSERT INTO users (id, email, first_name, last_name) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (id) DO UPDATE SET \
                 email = EXCLUDED.email, \
                 first_name = EXCLUDED.first_name, \
                 last_name = EXCLUDED.last_name, \
                 updated_at = now() \
             RETURNING {USER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(&profile.id)
            .bind(&profile.email)
            .bind(profile.first_name.as_deref())
            .bind(profile.last_name.as_deref())
            .fetch_one(self.pool()?)
            .await?)
    }

    /// Delete a user and, by cascade, their problems.
    ///
    /// Returns `false` if the user did not exist.
    pub async fn delete_user(&self, user_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(self.pool()?)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ─── Problem Operations ──────────────────────────────────────

    /// List a user's problems with optional filtering and sorting.
    pub async fn list_problems(
        &self,
        user_id: &str,
        filter: &ProblemFilter,
    ) -> Result<Vec<ProblemSummary>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {SUMMARY_COLUMNS}, {CATEGORY_NAMES} {PROBLEM_JOINS} WHERE p.user_id = "
        ));
        qb.push_bind(user_id);

        if let Some(difficulty) = filter.difficulty {
            qb.push(" AND p.difficulty = ").push_bind(difficulty);
        }
        if let Some(language) = non_blank(filter.language.as_deref()) {
            qb.push(" AND lower(p.language_used) = lower(")
                .push_bind(language.to_string())
                .push(")");
        }
        if let Some(q) = non_blank(filter.q.as_deref()) {
            qb.push(" AND p.title ILIKE ")
                .push_bind(format!("%{}%", escape_like(q)));
        }
        if let Some(category) = non_blank(filter.category.as_deref()) {
            qb.push(
                " AND EXISTS (SELECT 1 FROM problem_categories fpc \
                 JOIN categories fc ON fc.id = fpc.category_id \
                 WHERE fpc.problem_id = p.id AND fc.name = ",
            )
            .push_bind(category.to_string())
            .push(")");
        }

        qb.push(" GROUP BY p.id ORDER BY ")
            .push(filter.sort.column())
            .push(" ")
            .push(filter.order.keyword())
            .push(", p.id DESC");

        Ok(qb
            .build_query_as::<ProblemSummary>()
            .fetch_all(self.pool()?)
            .await?)
    }

    /// All of a user's problems, most recently solved first.
    pub async fn problems_for_user(&self, user_id: &str) -> Result<Vec<Problem>, AppError> {
        let query = format!(
            "SELECT {PROBLEM_COLUMNS}, {CATEGORY_NAMES} {PROBLEM_JOINS} \
             WHERE p.user_id = $1 \
             GROUP BY p.id \
             ORDER BY p.date_solved DESC, p.id DESC"
        );
        Ok(sqlx::query_as::<_, Problem>(&query)
            .bind(user_id)
            .fetch_all(self.pool()?)
            .await?)
    }

    /// Get one problem if it exists and belongs to `user_id`.
    pub async fn get_problem(&self, user_id: &str, id: i64) -> Result<Option<Problem>, AppError> {
        let query = format!(
            "SELECT {PROBLEM_COLUMNS}, {CATEGORY_NAMES} {PROBLEM_JOINS} \
             WHERE p.id = $1 AND p.user_id = $2 \
             GROUP BY p.id"
        );
        Ok(sqlx::query_as::<_, Problem>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool()?)
            .await?)
    }

    /// Create a problem and its category links in one transaction.
    pub async fn create_problem(
        &self,
        user_id: &str,
        fields: &ProblemFields,
    ) -> Result<Problem, AppError> {
        let mut tx = self.pool()?.begin().await?;

        // The session may predate the webhook that mirrors the user.
        sqlx::query("INSERT INTO users (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO problems (user_id, title, url, difficulty, language_used, \
                 solution_notes, what_went_wrong, trigger_keywords, time_complexity, \
                 space_complexity, was_hard, date_solved) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, COALESCE($12, now())) \
             RETURNING id",
        )
        .bind(user_id)
        .bind(&fields.title)
        .bind(&fields.url)
        .bind(fields.difficulty)
        .bind(&fields.language_used)
        .bind(&fields.solution_notes)
        .bind(&fields.what_went_wrong)
        .bind(&fields.trigger_keywords)
        .bind(&fields.time_complexity)
        .bind(&fields.space_complexity)
        .bind(fields.was_hard)
        .bind(fields.date_solved)
        .fetch_one(&mut *tx)
        .await?;

        link_categories(&mut tx, id, &fields.categories).await?;
        tx.commit().await?;

        tracing::debug!(user_id, problem_id = id, "Problem created");

        self.get_problem(user_id, id).await?.ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("problem {id} vanished after insert"))
        })
    }

    /// Replace a problem's mutable fields and category set.
    ///
    /// Returns `None` if the problem does not exist or belongs to someone else.
    pub async fn update_problem(
        &self,
        user_id: &str,
        id: i64,
        fields: &ProblemFields,
    ) -> Result<Option<Problem>, AppError> {
        let mut tx = self.pool()?.begin().await?;

        let updated: Option<i64> = sqlx::query_scalar(
            "UPDATE problems SET \
                 title = $3, url = $4, difficulty = $5, language_used = $6, \
                 solution_notes = $7, what_went_wrong = $8, trigger_keywords = $9, \
                 time_complexity = $10, space_complexity = $11, was_hard = $12, \
                 date_solved = COALESCE($13, date_solved), updated_at = now() \
             WHERE id = $1 AND user_id = $2 \
             RETURNING id",
        )
        .bind(id)
        .bind(user_id)
        .bind(&fields.title)
        .bind(&fields.url)
        .bind(fields.difficulty)
        .bind(&fields.language_used)
        .bind(&fields.solution_notes)
        .bind(&fields.what_went_wrong)
        .bind(&fields.trigger_keywords)
        .bind(&fields.time_complexity)
        .bind(&fields.space_complexity)
        .bind(fields.was_hard)
        .bind(fields.date_solved)
        .fetch_optional(&mut *tx)
        .await?;

        if updated.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        sqlx::query("DELETE FROM problem_categories WHERE problem_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        link_categories(&mut tx, id, &fields.categories).await?;
        tx.commit().await?;

        tracing::debug!(user_id, problem_id = id, "Problem updated");

        self.get_problem(user_id, id).await
    }

    /// Delete a problem owned by `user_id`. Category links cascade.
    ///
    /// Returns `false` if nothing matched.
    pub async fn delete_problem(&self, user_id: &str, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM problems WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool()?)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ─── Maintenance ─────────────────────────────────────────────

    /// Row counts of the main tables.
    pub async fn table_counts(&self) -> Result<TableCounts, AppError> {
        Ok(sqlx::query_as::<_, TableCounts>(
            "SELECT \
                 (SELECT COUNT(*) FROM users) AS users, \
                 (SELECT COUNT(*) FROM problems) AS problems, \
                 (SELECT COUNT(*) FROM categories) AS categories",
        )
        .fetch_one(self.pool()?)
        .await?)
    }

    /// Create any of `names` that do not exist yet. Returns how many were new.
    pub async fn ensure_categories(&self, names: &[&str]) -> Result<u64, AppError> {
        let result = sqlx::query(
            "INSERT INTO categories (name) SELECT * FROM UNNEST($1::text[]) \
             ON CONFLICT (name) DO NOTHING",
        )
        .bind(names)
        .execute(self.pool()?)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete every row of every table, children first, in one transaction.
    pub async fn reset_all(&self) -> Result<TableCounts, AppError> {
        let before = self.table_counts().await?;
        let mut tx = self.pool()?.begin().await?;
        for table in ["problem_categories", "problems", "categories", "users"] {
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(before)
    }
}

/// Row counts reported around destructive maintenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct TableCounts {
    pub users: i64,
    pub problems: i64,
    pub categories: i64,
}

/// Create-or-reuse each category and link it to the problem.
///
/// `names` must already be unique.
async fn link_categories(
    tx: &mut Transaction<'_, Postgres>,
    problem_id: i64,
    names: &[String],
) -> Result<(), sqlx::Error> {
    for name in names {
        // DO UPDATE (not DO NOTHING) so RETURNING yields the existing row.
        let category_id: i64 = sqlx::query_scalar(
            "INSERT INTO categories (name) VALUES ($1) \
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
             RETURNING id",
        )
        .bind(name)
        .fetch_one(&mut **tx)
        .await?;

        sqlx::query(
            "INSERT INTO problem_categories (problem_id, category_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(problem_id)
        .bind(category_id)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Escape `LIKE` wildcards so user input matches literally.
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// PostgreSQL document store
///
/// Each collection is one table; a user's pending list is a `UUID[]` column
/// patched in place with `array_append` / `array_remove`, which gives the
/// same set-add / set-remove semantics as a document database's element
/// operators.
///
/// Queries are assembled with `sqlx::QueryBuilder`. Only values are bound;
/// column names come from the closed [`UserSortField`] / [`TaskSortField`]
/// enums, never from callers.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
/// use taskboard_shared::store::{PgStore, Store};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(&DatabaseConfig::new(std::env::var("DATABASE_URL")?)).await?;
///
/// let store = PgStore::new(pool);
/// store.ping().await?;
/// # Ok(())
/// # }
/// ```

use super::{
    FindOptions, PendingTasksPatch, SortKey, Store, StoreError, StoreResult, TaskFilter, TaskPatch,
    TaskSortField, UserFilter, UserSortField,
};
use crate::db::pool;
use crate::models::{Task, User};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

const USER_COLUMNS: &str = "SELECT id, name, email, pending_tasks, date_created FROM users";

const TASK_COLUMNS: &str = "SELECT id, name, description, deadline, completed, assigned_user, \
                            assigned_user_name, date_created FROM tasks";

/// Store over a PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps an existing pool. Migrations must already have run.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps unique violations to `StoreError::Duplicate`
fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let field = match db_err.constraint() {
                Some(constraint) if constraint.contains("email") => "email".to_string(),
                Some(constraint) => constraint.to_string(),
                None => "unknown".to_string(),
            };
            return StoreError::Duplicate { field };
        }
    }
    StoreError::Database(err)
}

fn push_user_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    builder.push(" WHERE TRUE");

    if let Some(ids) = &filter.ids {
        builder.push(" AND id = ANY(").push_bind(ids.clone()).push(")");
    }
    if let Some(name) = &filter.name {
        builder.push(" AND name = ").push_bind(name.clone());
    }
    if let Some(email) = &filter.email {
        builder.push(" AND email = ").push_bind(email.clone());
    }
    if let Some(task_id) = filter.pending_task {
        builder.push(" AND ").push_bind(task_id).push(" = ANY(pending_tasks)");
    }
}

fn push_task_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &TaskFilter) {
    builder.push(" WHERE TRUE");

    if let Some(ids) = &filter.ids {
        builder.push(" AND id = ANY(").push_bind(ids.clone()).push(")");
    }
    if let Some(name) = &filter.name {
        builder.push(" AND name = ").push_bind(name.clone());
    }
    if let Some(completed) = filter.completed {
        builder.push(" AND completed = ").push_bind(completed);
    }
    match filter.assigned_user {
        Some(Some(user_id)) => {
            builder.push(" AND assigned_user = ").push_bind(user_id);
        }
        Some(None) => {
            builder.push(" AND assigned_user IS NULL");
        }
        None => {}
    }
    if let Some(name) = &filter.assigned_user_name {
        builder.push(" AND assigned_user_name = ").push_bind(name.clone());
    }
}

/// Appends ORDER BY / LIMIT / OFFSET. Creation order breaks ties.
fn push_options<F: Copy>(
    builder: &mut QueryBuilder<'_, Postgres>,
    sort: &[SortKey<F>],
    skip: Option<u64>,
    limit: Option<u64>,
    column: impl Fn(F) -> &'static str,
) {
    builder.push(" ORDER BY ");
    for key in sort {
        builder
            .push(column(key.field))
            .push(" ")
            .push(key.direction.as_sql())
            .push(", ");
    }
    builder.push("date_created ASC, id ASC");

    // BIGINT tops out at i64::MAX, which already means "everything"
    if let Some(limit) = limit {
        builder
            .push(" LIMIT ")
            .push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }
    if let Some(skip) = skip {
        builder
            .push(" OFFSET ")
            .push_bind(i64::try_from(skip).unwrap_or(i64::MAX));
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> StoreResult<()> {
        pool::health_check(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        pool::close_pool(&self.pool).await;
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("{USER_COLUMNS} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_users(
        &self,
        filter: &UserFilter,
        options: &FindOptions<UserSortField>,
    ) -> StoreResult<Vec<User>> {
        let mut builder = QueryBuilder::<Postgres>::new(USER_COLUMNS);
        push_user_filter(&mut builder, filter);
        push_options(
            &mut builder,
            &options.sort,
            options.skip,
            options.limit,
            UserSortField::column,
        );

        let users = builder.build_query_as::<User>().fetch_all(&self.pool).await?;
        Ok(users)
    }

    async fn count_users(&self, filter: &UserFilter) -> StoreResult<u64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_user_filter(&mut builder, filter);

        let count = builder.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(count as u64)
    }

    async fn save_user(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, pending_tasks, date_created)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                email = EXCLUDED.email,
                pending_tasks = EXCLUDED.pending_tasks
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.pending_tasks)
        .bind(user.date_created)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        debug!(user_id = %user.id, "Saved user");
        Ok(())
    }

    async fn update_users(&self, filter: &UserFilter, patch: PendingTasksPatch) -> StoreResult<u64> {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE users SET pending_tasks = ");

        let task_id = match patch {
            PendingTasksPatch::Add(task_id) => {
                builder
                    .push("array_append(pending_tasks, ")
                    .push_bind(task_id)
                    .push(")");
                task_id
            }
            PendingTasksPatch::Pull(task_id) => {
                builder
                    .push("array_remove(pending_tasks, ")
                    .push_bind(task_id)
                    .push(")");
                task_id
            }
        };

        push_user_filter(&mut builder, filter);

        // Only touch rows the patch actually changes
        match patch {
            PendingTasksPatch::Add(_) => builder.push(" AND NOT ("),
            PendingTasksPatch::Pull(_) => builder.push(" AND ("),
        };
        builder.push_bind(task_id).push(" = ANY(pending_tasks))");

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_task_by_id(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(&format!("{TASK_COLUMNS} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(task)
    }

    async fn find_tasks(
        &self,
        filter: &TaskFilter,
        options: &FindOptions<TaskSortField>,
    ) -> StoreResult<Vec<Task>> {
        let mut builder = QueryBuilder::<Postgres>::new(TASK_COLUMNS);
        push_task_filter(&mut builder, filter);
        push_options(
            &mut builder,
            &options.sort,
            options.skip,
            options.limit,
            TaskSortField::column,
        );

        let tasks = builder.build_query_as::<Task>().fetch_all(&self.pool).await?;
        Ok(tasks)
    }

    async fn count_tasks(&self, filter: &TaskFilter) -> StoreResult<u64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tasks");
        push_task_filter(&mut builder, filter);

        let count = builder.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(count as u64)
    }

    async fn save_task(&self, task: &Task) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tasks (id, name, description, deadline, completed,
                               assigned_user, assigned_user_name, date_created)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                description = EXCLUDED.description,
                deadline = EXCLUDED.deadline,
                completed = EXCLUDED.completed,
                assigned_user = EXCLUDED.assigned_user,
                assigned_user_name = EXCLUDED.assigned_user_name
            "#,
        )
        .bind(task.id)
        .bind(&task.name)
        .bind(&task.description)
        .bind(task.deadline)
        .bind(task.completed)
        .bind(task.assigned_user)
        .bind(&task.assigned_user_name)
        .bind(task.date_created)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        debug!(task_id = %task.id, "Saved task");
        Ok(())
    }

    async fn update_tasks(&self, filter: &TaskFilter, patch: &TaskPatch) -> StoreResult<u64> {
        if patch.is_empty() {
            return Ok(0);
        }

        let mut builder = QueryBuilder::<Postgres>::new("UPDATE tasks SET ");
        {
            let mut assignments = builder.separated(", ");
            if let Some(assignee) = patch.assigned_user {
                assignments.push("assigned_user = ").push_bind_unseparated(assignee);
            }
            if let Some(name) = &patch.assigned_user_name {
                assignments
                    .push("assigned_user_name = ")
                    .push_bind_unseparated(name.clone());
            }
        }

        push_task_filter(&mut builder, filter);

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

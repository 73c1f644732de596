/*!
    Persistence for todos. The command loop only sees the `TodoStore`
    trait, `SqliteStore` is the implementation backed by a single
    sqlx connection.
!*/
use std::str::FromStr;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::Connection;
use tracing::debug;

use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::todo::{NewTodo, Todo};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub trait TodoStore {
    /// Creates the `todos` table if it does not exist yet.
    async fn ensure_schema(&mut self) -> Result<()>;

    /// Inserts a todo and returns its id, or `None` if no row was written.
    async fn create(&mut self, todo: &NewTodo) -> Result<Option<i64>>;

    /// Every stored todo, in whatever order the database yields them.
    async fn list_all(&mut self) -> Result<Vec<Todo>>;

    async fn fetch_by_id(&mut self, id: i64) -> Result<Option<Todo>>;

    /// Releases the underlying connection.
    async fn close(self) -> Result<()>;
}

pub struct SqliteStore {
    conn: SqliteConnection,
}

impl SqliteStore {
    /// Opens one connection to the configured database, creating the file
    /// when it is missing.
    pub async fn connect(cfg: &DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&cfg.url)?.create_if_missing(true);
        let conn = SqliteConnection::connect_with(&options).await?;
        debug!(url = %cfg.url, "connected to database");
        Ok(SqliteStore { conn })
    }
}

impl TodoStore for SqliteStore {
    async fn ensure_schema(&mut self) -> Result<()> {
        MIGRATOR.run(&mut self.conn).await?;
        Ok(())
    }

    async fn create(&mut self, todo: &NewTodo) -> Result<Option<i64>> {
        let insert_stmt = r#"
            insert into todos(title, deadline_date, created_date, username)
            values($1, $2, $3, $4)
        "#;
        let res = sqlx::query(insert_stmt)
            .bind(&todo.title)
            .bind(todo.deadline_date)
            .bind(Utc::now().naive_utc())
            .bind(&todo.username)
            .execute(&mut self.conn)
            .await?;
        if res.rows_affected() == 0 {
            return Ok(None);
        }
        let id = res.last_insert_rowid();
        debug!(id, "inserted todo");
        Ok(Some(id))
    }

    async fn list_all(&mut self) -> Result<Vec<Todo>> {
        let select_stmt = r#"
            select id, title, deadline_date, created_date, username, completed
            from todos
        "#;
        let todos = sqlx::query_as::<_, Todo>(select_stmt)
            .fetch_all(&mut self.conn)
            .await?;
        debug!(count = todos.len(), "listed todos");
        Ok(todos)
    }

    async fn fetch_by_id(&mut self, id: i64) -> Result<Option<Todo>> {
        let select_stmt = r#"
            select id, title, deadline_date, created_date, username, completed
            from todos
            where id = $1
        "#;
        let todo = sqlx::query_as::<_, Todo>(select_stmt)
            .bind(id)
            .fetch_optional(&mut self.conn)
            .await?;
        Ok(todo)
    }

    async fn close(self) -> Result<()> {
        self.conn.close().await?;
        debug!("database connection closed");
        Ok(())
    }
}

//! TODO repository contract and SQLite implementations.
//!
//! # Responsibility
//! - Provide the four CRUD operations over the single `todos` table.
//! - Own the lifecycle of the underlying storage handle.
//!
//! # Invariants
//! - Each operation is one atomic statement.
//! - `update_todo` on a missing id creates the record (upsert).
//! - `delete_todo` on a missing id is a no-op.
//! - `list_todos` is ordered by `id ASC`.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::todo::{TodoId, TodoItem};
use log::{debug, error};
use once_cell::unsync::OnceCell;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const TODO_SELECT_SQL: &str = "SELECT id, text FROM todos ORDER BY id ASC;";

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage failure surfaced to the controller.
#[derive(Debug)]
pub enum RepoError {
    /// The store could not be opened, read or written.
    StorageUnavailable(DbError),
    /// A persisted row could not be decoded.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StorageUnavailable(err) => write!(f, "storage unavailable: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted todo data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StorageUnavailable(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::StorageUnavailable(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::StorageUnavailable(DbError::Sqlite(value))
    }
}

/// Storage contract used by the controller.
///
/// No operation returns what it wrote; callers observe new state through
/// `list_todos`.
pub trait TodoRepository {
    fn create_todo(&self, text: &str) -> RepoResult<()>;
    fn list_todos(&self) -> RepoResult<Vec<TodoItem>>;
    fn update_todo(&self, id: TodoId, text: &str) -> RepoResult<()>;
    fn delete_todo(&self, id: TodoId) -> RepoResult<()>;
}

impl<R: TodoRepository + ?Sized> TodoRepository for &R {
    fn create_todo(&self, text: &str) -> RepoResult<()> {
        (**self).create_todo(text)
    }

    fn list_todos(&self) -> RepoResult<Vec<TodoItem>> {
        (**self).list_todos()
    }

    fn update_todo(&self, id: TodoId, text: &str) -> RepoResult<()> {
        (**self).update_todo(id, text)
    }

    fn delete_todo(&self, id: TodoId) -> RepoResult<()> {
        (**self).delete_todo(id)
    }
}

/// SQLite-backed repository over a caller-owned connection.
pub struct SqliteTodoRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTodoRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TodoRepository for SqliteTodoRepository<'_> {
    fn create_todo(&self, text: &str) -> RepoResult<()> {
        self.conn
            .execute("INSERT INTO todos (text) VALUES (?1);", [text])?;
        Ok(())
    }

    fn list_todos(&self) -> RepoResult<Vec<TodoItem>> {
        let mut stmt = self.conn.prepare(TODO_SELECT_SQL)?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();

        while let Some(row) = rows.next()? {
            items.push(parse_todo_row(row)?);
        }

        Ok(items)
    }

    fn update_todo(&self, id: TodoId, text: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO todos (id, text) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET text = excluded.text;",
            params![id, text],
        )?;
        Ok(())
    }

    fn delete_todo(&self, id: TodoId) -> RepoResult<()> {
        self.conn.execute("DELETE FROM todos WHERE id = ?1;", [id])?;
        Ok(())
    }
}

fn parse_todo_row(row: &Row<'_>) -> RepoResult<TodoItem> {
    let decode = |err: rusqlite::Error| match err {
        rusqlite::Error::InvalidColumnType(..) | rusqlite::Error::FromSqlConversionFailure(..) => {
            RepoError::InvalidData(err.to_string())
        }
        other => other.into(),
    };

    Ok(TodoItem {
        id: row.get("id").map_err(decode)?,
        text: row.get("text").map_err(decode)?,
    })
}

/// Where a [`TodoStore`] keeps its table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    Memory,
}

impl StoreLocation {
    fn mode(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory => "memory",
        }
    }
}

/// Repository that owns its storage handle.
///
/// The connection is opened on first use and reused afterwards. A failed
/// open is not remembered, so the next operation tries again.
pub struct TodoStore {
    location: StoreLocation,
    conn: OnceCell<Connection>,
}

impl TodoStore {
    /// Creates a store backed by a database file. Nothing is opened yet.
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self::with_location(StoreLocation::File(path.as_ref().to_path_buf()))
    }

    /// Creates a store backed by a private in-memory database.
    pub fn in_memory() -> Self {
        Self::with_location(StoreLocation::Memory)
    }

    pub fn with_location(location: StoreLocation) -> Self {
        Self {
            location,
            conn: OnceCell::new(),
        }
    }

    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    /// Returns whether the handle has been opened successfully.
    pub fn is_open(&self) -> bool {
        self.conn.get().is_some()
    }

    fn connection(&self) -> RepoResult<&Connection> {
        let conn = self.conn.get_or_try_init(|| match &self.location {
            StoreLocation::File(path) => open_db(path),
            StoreLocation::Memory => open_db_in_memory(),
        })?;
        Ok(conn)
    }

    fn run<T>(
        &self,
        operation: &'static str,
        action: impl FnOnce(&SqliteTodoRepository<'_>) -> RepoResult<T>,
    ) -> RepoResult<T> {
        let result = self
            .connection()
            .and_then(|conn| action(&SqliteTodoRepository::new(conn)));
        match &result {
            Ok(_) => debug!(
                "event=todo_{operation} module=repo status=ok mode={}",
                self.location.mode()
            ),
            Err(err) => error!(
                "event=todo_{operation} module=repo status=error mode={} error={err}",
                self.location.mode()
            ),
        }
        result
    }
}

impl TodoRepository for TodoStore {
    fn create_todo(&self, text: &str) -> RepoResult<()> {
        self.run("create", |repo| repo.create_todo(text))
    }

    fn list_todos(&self) -> RepoResult<Vec<TodoItem>> {
        self.run("list", |repo| repo.list_todos())
    }

    fn update_todo(&self, id: TodoId, text: &str) -> RepoResult<()> {
        self.run("update", |repo| repo.update_todo(id, text))
    }

    fn delete_todo(&self, id: TodoId) -> RepoResult<()> {
        self.run("delete", |repo| repo.delete_todo(id))
    }
}

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{Result, StorageContext, TodoError};

/// A single todo, saved as an entry in the todo table.
#[derive(Debug, Clone, PartialEq)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Todo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.id, self.title)
    }
}

/// The todo table. Every statement runs on a single connection; concurrent
/// requests queue on the mutex and SQLite takes care of the rest.
pub struct Store {
    db: Mutex<Connection>,
}

impl Store {
    /// Open the database file, creating it and the todo table if they do
    /// not exist.
    pub fn open(path: &Path) -> Result<Store> {
        let db = Connection::open(path).storage("Failed to open database")?;
        Store::init(db)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Store> {
        let db = Connection::open_in_memory().storage("Failed to open in-memory database")?;
        Store::init(db)
    }

    fn init(db: Connection) -> Result<Store> {
        // AUTOINCREMENT keeps ids of deleted todos from being handed out again.
        db.execute(
            "CREATE TABLE if not exists todo (
                  id              INTEGER PRIMARY KEY AUTOINCREMENT,
                  title           TEXT NOT NULL,
                  description     TEXT NOT NULL,
                  created_at      TEXT NOT NULL
                  )",
            [],
        )
        .storage("Failed to create todo table")?;

        Ok(Store { db: Mutex::new(db) })
    }

    /// Insert a new todo stamped with the current time.
    pub fn insert(&self, title: &str, description: &str) -> Result<Todo> {
        let created_at = Utc::now();
        let db = self.db.lock();
        db.execute(
            "INSERT INTO todo (title, description, created_at) VALUES (?1, ?2, ?3)",
            params![title, description, created_at],
        )
        .storage("Failed to insert todo into database")?;

        Ok(Todo {
            id: db.last_insert_rowid(),
            title: title.to_owned(),
            description: description.to_owned(),
            created_at,
        })
    }

    /// All todos, oldest first.
    pub fn list_all(&self) -> Result<Vec<Todo>> {
        let db = self.db.lock();
        let mut stmt = db
            .prepare("SELECT id, title, description, created_at FROM todo ORDER BY id")
            .storage("Failed to fetch todos from database")?;
        let mapped_rows = stmt
            .query_map([], |row| todo_from_row(row))
            .storage("Failed to fetch todos from database")?;

        let mut todos = Vec::new();
        for todo in mapped_rows {
            todos.push(todo.storage("Failed to read todo row")?);
        }
        Ok(todos)
    }

    pub fn get(&self, id: i64) -> Result<Option<Todo>> {
        let db = self.db.lock();
        db.query_row(
            "SELECT id, title, description, created_at FROM todo WHERE id = ?1",
            params![id],
            |row| todo_from_row(row),
        )
        .optional()
        .storage("Failed to fetch todo from database")
    }

    /// Replace title and description. id and created_at never change.
    pub fn update(&self, id: i64, title: &str, description: &str) -> Result<()> {
        let changed = self
            .db
            .lock()
            .execute(
                "UPDATE todo SET title = ?1, description = ?2 WHERE id = ?3",
                params![title, description, id],
            )
            .storage("Failed to update todo in database")?;

        if changed == 0 {
            return Err(TodoError::NotFound(id));
        }
        Ok(())
    }

    pub fn delete(&self, id: i64) -> Result<()> {
        let changed = self
            .db
            .lock()
            .execute("DELETE FROM todo WHERE id = ?1", params![id])
            .storage("Failed to delete todo from database")?;

        if changed == 0 {
            return Err(TodoError::NotFound(id));
        }
        Ok(())
    }

    /// Close the underlying connection, reporting any pending failure.
    pub fn close(self) -> Result<()> {
        self.db
            .into_inner()
            .close()
            .map_err(|(_, e)| e)
            .storage("Failed to close database")
    }
}

/// Return a todo from a row in this order: [id, title, description, created_at]
fn todo_from_row(row: &Row) -> rusqlite::Result<Todo> {
    Ok(Todo {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        created_at: row.get::<_, DateTime<Utc>>(3)?,
    })
}

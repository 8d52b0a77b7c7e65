use std::sync::Arc;

use serde::Deserialize;

use crate::error::{Result, TodoError};
use crate::model::{Store, Todo};

/// The fields submitted by the create and edit forms. Both are optional so
/// that a missing field reaches validation instead of failing extraction.
#[derive(Debug, Default, Deserialize)]
pub struct TodoForm {
    pub title: Option<String>,
    pub desc: Option<String>,
}

impl TodoForm {
    #[cfg(test)]
    pub fn new(title: &str, desc: &str) -> TodoForm {
        TodoForm {
            title: Some(title.to_owned()),
            desc: Some(desc.to_owned()),
        }
    }

    /// Return title and description, or the first one that is missing.
    fn validate(&self) -> Result<(&str, &str)> {
        let title = required(&self.title, "title")?;
        let desc = required(&self.desc, "desc")?;
        Ok((title, desc))
    }
}

fn required<'a>(field: &'a Option<String>, name: &'static str) -> Result<&'a str> {
    match field.as_deref() {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(TodoError::Validation(name)),
    }
}

/// Validation in front of the store.
#[derive(Clone)]
pub struct TodoService {
    store: Arc<Store>,
}

impl TodoService {
    pub fn new(store: Arc<Store>) -> TodoService {
        TodoService { store }
    }

    pub fn create(&self, form: &TodoForm) -> Result<Todo> {
        let (title, desc) = form.validate()?;
        let todo = self.store.insert(title, desc)?;
        tracing::info!("Added todo {}", todo);
        Ok(todo)
    }

    pub fn list(&self) -> Result<Vec<Todo>> {
        self.store.list_all()
    }

    pub fn get(&self, id: i64) -> Result<Todo> {
        self.store.get(id)?.ok_or(TodoError::NotFound(id))
    }

    pub fn update(&self, id: i64, form: &TodoForm) -> Result<Todo> {
        let (title, desc) = form.validate()?;
        self.store.update(id, title, desc)?;
        tracing::info!("Updated todo {}", id);
        self.get(id)
    }

    pub fn delete(&self, id: i64) -> Result<()> {
        self.store.delete(id)?;
        tracing::info!("Deleted todo {}", id);
        Ok(())
    }
}

//! HTML pages. Templates are compiled into the binary and auto-escaped.

use serde::Serialize;
use tera::{Context, Tera};

use crate::error::Result;
use crate::model::Todo;

const INDEX: &str = "index.html";
const UPDATE: &str = "update.html";

/// A todo as the templates see it.
#[derive(Serialize)]
struct TodoRow<'a> {
    id: i64,
    title: &'a str,
    description: &'a str,
    created_at: String,
}

impl<'a> From<&'a Todo> for TodoRow<'a> {
    fn from(todo: &'a Todo) -> Self {
        TodoRow {
            id: todo.id,
            title: &todo.title,
            description: &todo.description,
            created_at: todo.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

pub struct Views {
    tera: Tera,
}

impl Views {
    pub fn new() -> Result<Views> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (INDEX, include_str!("../templates/index.html")),
            (UPDATE, include_str!("../templates/update.html")),
        ])?;
        Ok(Views { tera })
    }

    /// The list page with the create form on top.
    pub fn index(&self, todos: &[Todo]) -> Result<String> {
        let rows: Vec<TodoRow> = todos.iter().map(TodoRow::from).collect();
        let mut context = Context::new();
        context.insert("todos", &rows);
        Ok(self.tera.render(INDEX, &context)?)
    }

    /// The edit form, pre-filled with the current record.
    pub fn update(&self, todo: &Todo) -> Result<String> {
        let mut context = Context::new();
        context.insert("todo", &TodoRow::from(todo));
        Ok(self.tera.render(UPDATE, &context)?)
    }
}

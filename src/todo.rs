use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::FromRow;

const ABSENT: &str = "N/A";

/// A todo as stored in the `todos` table.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub deadline_date: Option<NaiveDate>,
    pub created_date: NaiveDateTime,
    pub username: Option<String>,
    pub completed: bool,
}

/// Input for a todo that has not been inserted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTodo {
    pub title: String,
    pub deadline_date: NaiveDate,
    pub username: Option<String>,
}

impl NewTodo {
    /// A blank username is kept as `None`, never as an empty string.
    pub fn new(title: &str, deadline_date: NaiveDate, username: &str) -> Self {
        let username = if username.trim().is_empty() {
            None
        } else {
            Some(username.to_string())
        };
        NewTodo {
            title: title.to_string(),
            deadline_date,
            username,
        }
    }
}

impl fmt::Display for Todo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let deadline = self
            .deadline_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| ABSENT.to_string());
        writeln!(f, "- ({}) {}", self.id, self.title)?;
        writeln!(f, "  Deadline: {}", deadline)?;
        writeln!(f, "  Created: {}", self.created_date.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "  Completed: {}", if self.completed { "Yes" } else { "No" })?;
        write!(f, "  User: {}", self.username.as_deref().unwrap_or(ABSENT))
    }
}

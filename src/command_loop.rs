use std::io::{self, BufRead, Write};
use std::str::FromStr;

use tracing::{debug, warn};

use crate::database::TodoStore;
use crate::date_parser::parse_deadline;
use crate::error::Error;
use crate::todo::NewTodo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    CreateTodo,
    ShowTodos,
    ViewTodo,
    DeleteTodo,
    UpdateTodo,
    CompleteTodo,
    Exit,
}

impl Command {
    const ALL: [Command; 7] = [
        Command::CreateTodo,
        Command::ShowTodos,
        Command::ViewTodo,
        Command::DeleteTodo,
        Command::UpdateTodo,
        Command::CompleteTodo,
        Command::Exit,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Command::CreateTodo => "create-todo",
            Command::ShowTodos => "show-todos",
            Command::ViewTodo => "view-todo",
            Command::DeleteTodo => "delete-todo",
            Command::UpdateTodo => "update-todo",
            Command::CompleteTodo => "complete-todo",
            Command::Exit => "exit",
        }
    }

    fn help(self) -> &'static str {
        match self {
            Command::CreateTodo => "Create and save a todo to database.",
            Command::ShowTodos => "Fetch and show all saved todos.",
            Command::ViewTodo => "Fetch and show a specific todo.",
            Command::DeleteTodo => "Delete a previously saved todo.",
            Command::UpdateTodo => "Update a todo.",
            Command::CompleteTodo => "Mark a todo as completed.",
            Command::Exit => "Leave the application.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCommand(pub String);

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Command::ALL
            .into_iter()
            .find(|cmd| cmd.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownCommand(s.to_string()))
    }
}

/// Ids are any signed 64-bit integer; existence is checked by the store.
fn parse_id(input: &str) -> crate::error::Result<i64> {
    let trimmed = input.trim();
    trimmed
        .parse::<i64>()
        .map_err(|_| Error::InvalidId(trimmed.to_string()))
}

enum Flow {
    Continue,
    Exit,
}

/// Reads commands from `input` and answers on `output` until `exit` or end of
/// input. Store failures are reported to the user and never end the loop;
/// only I/O errors on `input`/`output` are returned.
pub struct CommandLoop<'s, S, R, W> {
    store: &'s mut S,
    input: R,
    output: W,
}

impl<'s, S, R, W> CommandLoop<'s, S, R, W>
where
    S: TodoStore,
    R: BufRead,
    W: Write,
{
    pub fn new(store: &'s mut S, input: R, output: W) -> Self {
        CommandLoop {
            store,
            input,
            output,
        }
    }

    pub async fn run(&mut self) -> io::Result<()> {
        self.print_menu()?;
        loop {
            let Some(line) = self.read_line()? else {
                debug!("end of input, leaving command loop");
                return Ok(());
            };
            let flow = match line.parse::<Command>() {
                Ok(cmd) => {
                    debug!(command = cmd.name(), "dispatching");
                    self.dispatch(cmd).await?
                }
                Err(UnknownCommand(input)) => {
                    debug!(%input, "unknown command");
                    writeln!(self.output, "There is no such command, please try again.")?;
                    Flow::Continue
                }
            };
            if let Flow::Exit = flow {
                return Ok(());
            }
        }
    }

    async fn dispatch(&mut self, cmd: Command) -> io::Result<Flow> {
        match cmd {
            Command::CreateTodo => self.create_todo().await,
            Command::ShowTodos => self.show_todos().await,
            Command::ViewTodo => self.view_todo().await,
            // Accepted but not implemented: no output, no state change.
            Command::DeleteTodo | Command::UpdateTodo | Command::CompleteTodo => {
                Ok(Flow::Continue)
            }
            Command::Exit => Ok(Flow::Exit),
        }
    }

    fn print_menu(&mut self) -> io::Result<()> {
        writeln!(self.output, "Welcome to the todo application!")?;
        for cmd in Command::ALL {
            writeln!(self.output, "{:<14} - {}", cmd.name(), cmd.help())?;
        }
        self.output.flush()
    }

    /// Bytes that are not UTF-8 are replaced, so a garbled line is handled
    /// like any other unexpected input.
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut buf = Vec::new();
        if self.input.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&buf);
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;
        self.read_line()
    }

    async fn create_todo(&mut self) -> io::Result<Flow> {
        let Some(title) = self.prompt("Enter a title: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(deadline) = self.prompt("Enter a deadline date (YYYY-MM-DD): ")? else {
            return Ok(Flow::Exit);
        };
        let deadline = match parse_deadline(&deadline) {
            Ok(d) => d,
            Err(e) => {
                debug!(error = %e, "rejected deadline");
                writeln!(
                    self.output,
                    "Could not parse date. Did you enter the correct format?"
                )?;
                return Ok(Flow::Continue);
            }
        };
        let Some(username) = self.prompt("Enter a username (or empty): ")? else {
            return Ok(Flow::Exit);
        };

        let todo = NewTodo::new(&title, deadline, &username);
        match self.store.create(&todo).await {
            Ok(Some(id)) => writeln!(self.output, "Saved todo #{} to database.", id)?,
            Ok(None) => writeln!(
                self.output,
                "Nothing was inserted, perhaps there was a conflict?"
            )?,
            Err(e) => {
                warn!(error = %e, "failed to insert todo");
                writeln!(self.output, "Failed to save to database.")?
            }
        }
        Ok(Flow::Continue)
    }

    async fn show_todos(&mut self) -> io::Result<Flow> {
        match self.store.list_all().await {
            Ok(todos) => {
                for todo in todos {
                    writeln!(self.output, "{}", todo)?;
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to list todos");
                writeln!(self.output, "Failed to fetch todos from database.")?;
            }
        }
        Ok(Flow::Continue)
    }

    async fn view_todo(&mut self) -> io::Result<Flow> {
        let Some(input) = self.prompt("Enter an id: ")? else {
            return Ok(Flow::Exit);
        };
        let id = match parse_id(&input) {
            Ok(id) => id,
            Err(e) => {
                debug!(error = %e, "rejected id");
                writeln!(self.output, "Invalid id, expected a number.")?;
                return Ok(Flow::Continue);
            }
        };
        match self.store.fetch_by_id(id).await {
            Ok(Some(todo)) => writeln!(self.output, "{}", todo)?,
            // Missing ids are not reported.
            Ok(None) => debug!(id, "no todo with this id"),
            Err(e) => {
                warn!(error = %e, "failed to fetch todo");
                writeln!(self.output, "Failed to fetch todo from database.")?;
            }
        }
        Ok(Flow::Continue)
    }
}

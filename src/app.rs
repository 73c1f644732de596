use std::io::{BufRead, Write};

use tracing::{error, warn};

use crate::command_loop::CommandLoop;
use crate::database::TodoStore;

/// Runs one interactive session against an already connected store. The
/// store is consumed and closed exactly once, whichever way the session ends.
pub async fn session<S, R, W>(mut store: S, input: R, mut output: W)
where
    S: TodoStore,
    R: BufRead,
    W: Write,
{
    if let Err(e) = store.ensure_schema().await {
        error!(error = %e, "schema setup failed");
        let _ = writeln!(
            output,
            "Failed to create 'todos' table. Check the database configuration."
        );
        release(store).await;
        return;
    }

    let result = CommandLoop::new(&mut store, input, &mut output).run().await;
    if let Err(e) = result {
        error!(error = %e, "command loop aborted");
        let _ = writeln!(output, "Something went wrong.");
    }

    release(store).await;
}

async fn release<S: TodoStore>(store: S) {
    if let Err(e) = store.close().await {
        warn!(error = %e, "failed to close database connection");
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::io::{self, BufReader, Read};
    use std::rc::Rc;

    use super::*;
    use crate::error::Result;
    use crate::todo::{NewTodo, Todo};

    struct CountingStore {
        closes: Rc<Cell<u32>>,
        schema_fails: bool,
    }

    impl CountingStore {
        fn new(schema_fails: bool) -> (Self, Rc<Cell<u32>>) {
            let closes = Rc::new(Cell::new(0));
            let store = CountingStore {
                closes: Rc::clone(&closes),
                schema_fails,
            };
            (store, closes)
        }
    }

    impl TodoStore for CountingStore {
        async fn ensure_schema(&mut self) -> Result<()> {
            if self.schema_fails {
                return Err(sqlx::Error::Protocol("table creation refused".to_string()).into());
            }
            Ok(())
        }

        async fn create(&mut self, _todo: &NewTodo) -> Result<Option<i64>> {
            Ok(Some(1))
        }

        async fn list_all(&mut self) -> Result<Vec<Todo>> {
            Ok(Vec::new())
        }

        async fn fetch_by_id(&mut self, _id: i64) -> Result<Option<Todo>> {
            Ok(None)
        }

        async fn close(self) -> Result<()> {
            self.closes.set(self.closes.get() + 1);
            Ok(())
        }
    }

    /// Yields its script, then fails instead of reporting end of input.
    struct FailingReader<'a> {
        script: &'a [u8],
    }

    impl Read for FailingReader<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.script.is_empty() {
                return Err(io::Error::other("terminal went away"));
            }
            self.script.read(buf)
        }
    }

    #[tokio::test]
    async fn test_closes_once_after_exit() {
        let (store, closes) = CountingStore::new(false);
        let mut out = Vec::new();
        session(store, "show-todos\nexit\n".as_bytes(), &mut out).await;
        assert_eq!(closes.get(), 1);
    }

    #[tokio::test]
    async fn test_closes_once_after_end_of_input() {
        let (store, closes) = CountingStore::new(false);
        let mut out = Vec::new();
        session(store, "".as_bytes(), &mut out).await;
        assert_eq!(closes.get(), 1);
        assert!(!String::from_utf8(out).unwrap().contains("Something went wrong."));
    }

    #[tokio::test]
    async fn test_closes_once_after_schema_failure() {
        let (store, closes) = CountingStore::new(true);
        let mut out = Vec::new();
        session(store, "create-todo\n".as_bytes(), &mut out).await;

        let out = String::from_utf8(out).unwrap();
        assert_eq!(closes.get(), 1);
        assert_eq!(
            out,
            "Failed to create 'todos' table. Check the database configuration.\n"
        );
    }

    #[tokio::test]
    async fn test_closes_once_after_loop_failure() {
        let (store, closes) = CountingStore::new(false);
        let mut out = Vec::new();
        let input = BufReader::new(FailingReader {
            script: b"view-todo\n5\n",
        });
        session(store, input, &mut out).await;

        assert_eq!(closes.get(), 1);
        assert!(String::from_utf8(out).unwrap().ends_with("Something went wrong.\n"));
    }
}

use crate::{helper::SqlHelper, render};
use bitsql::{Connection, Error, Params};
use rustyline::{Editor, error::ReadlineError, history::DefaultHistory};
use std::path::PathBuf;

const PROMPT: &str = "bitsql> ";
const HISTORY_FILE: &str = ".bitsql_history";

/// Read-eval-print loop over one connection. Statement errors are printed
/// and the loop continues; only editor failures end it early.
pub fn run(conn: &Connection) -> Result<(), ReadlineError> {
    let mut editor: Editor<SqlHelper, DefaultHistory> = Editor::new()?;

    let tables = conn.table_ids().unwrap_or_else(|err| {
        tracing::warn!(%err, "table ids unavailable for completion");
        Vec::new()
    });
    editor.set_helper(Some(SqlHelper::new(tables)));

    let history = history_path();
    if let Some(path) = &history
        && let Err(err) = editor.load_history(path)
    {
        tracing::debug!(%err, path = %path.display(), "no history loaded");
    }

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                let Some(sql) = statement_text(&line) else {
                    continue;
                };
                editor.add_history_entry(sql)?;

                if sql.eq_ignore_ascii_case("exit") || sql.eq_ignore_ascii_case("quit") {
                    break;
                }

                match execute(conn, sql) {
                    Ok(output) => print!("{output}"),
                    Err(err) => eprintln!("{}", err.display_with_class()),
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(err) => return Err(err),
        }
    }

    println!("bye!");
    if let Some(path) = &history
        && let Err(err) = editor.save_history(path)
    {
        tracing::warn!(%err, path = %path.display(), "history not saved");
    }

    Ok(())
}

fn history_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(HISTORY_FILE))
}

// Trim whitespace and trailing semicolons; `None` for a blank line.
fn statement_text(line: &str) -> Option<&str> {
    let sql = line.trim().trim_end_matches(';').trim_end();

    (!sql.is_empty()).then_some(sql)
}

fn execute(conn: &Connection, sql: &str) -> Result<String, Error> {
    let mut cursor = conn.execute(sql, &Params::None)?;

    if let Some(record_id) = cursor.lastrowid() {
        return Ok(format!("inserted {record_id}\n"));
    }
    if let Some(count) = cursor.rowcount() {
        return Ok(format!("{count} row(s) affected\n"));
    }

    let names: Vec<String> = cursor
        .description()
        .into_iter()
        .map(|column| column.name)
        .collect();
    let rows = cursor.fetchall()?;

    Ok(render::table(&names, &rows))
}

///
/// TESTS
///

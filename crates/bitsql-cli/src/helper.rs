use rustyline::{
    Context, Helper, Highlighter, Hinter, Validator,
    completion::{Completer, Pair},
};

const KEYWORDS: &[&str] = &[
    "AND", "AS", "ASC", "BETWEEN", "BY", "DELETE", "DESC", "FALSE", "FROM", "IN", "INSERT",
    "INTO", "IS", "LIKE", "LIMIT", "NOT", "NULL", "OFFSET", "OR", "ORDER", "SELECT", "SET",
    "SHOW", "TABLES", "TRUE", "UPDATE", "VALUES", "WHERE",
];

///
/// SqlHelper
///
/// Completes SQL keywords (case-insensitively) and the base's table ids.
///

#[derive(Debug, Helper, Hinter, Highlighter, Validator)]
pub struct SqlHelper {
    tables: Vec<String>,
}

impl SqlHelper {
    pub const fn new(tables: Vec<String>) -> Self {
        Self { tables }
    }

    fn candidates(&self, line: &str, pos: usize) -> (usize, Vec<String>) {
        let head = line.get(..pos).unwrap_or(line);
        let start = head
            .char_indices()
            .rev()
            .find(|(_, ch)| !is_word(*ch))
            .map_or(0, |(idx, ch)| idx + ch.len_utf8());

        let word = &head[start..];
        if word.is_empty() {
            return (pos, Vec::new());
        }

        let upper = word.to_ascii_uppercase();
        let mut out: Vec<String> = KEYWORDS
            .iter()
            .filter(|keyword| keyword.starts_with(&upper))
            .map(|keyword| (*keyword).to_string())
            .collect();
        out.extend(
            self.tables
                .iter()
                .filter(|table| table.starts_with(word))
                .cloned(),
        );

        (start, out)
    }
}

const fn is_word(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

impl Completer for SqlHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, words) = self.candidates(line, pos);
        let pairs = words
            .into_iter()
            .map(|word| Pair {
                display: word.clone(),
                replacement: word,
            })
            .collect();

        Ok((start, pairs))
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    fn helper() -> SqlHelper {
        SqlHelper::new(vec!["tblPeople".to_string(), "tblPets".to_string()])
    }

    #[test]
    fn keywords_complete_case_insensitively() {
        let (start, words) = helper().candidates("sel", 3);

        assert_eq!(start, 0);
        assert_eq!(words, ["SELECT"]);
    }

    #[test]
    fn table_ids_complete_after_from() {
        let line = "SELECT * FROM tblPe";

        let (start, words) = helper().candidates(line, line.len());

        assert_eq!(start, 14);
        assert_eq!(words, ["tblPeople", "tblPets"]);
    }

    #[test]
    fn nothing_to_complete_after_whitespace() {
        let (start, words) = helper().candidates("SELECT ", 7);

        assert_eq!(start, 7);
        assert!(words.is_empty());
    }
}

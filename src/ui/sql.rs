//! Lightweight SQL highlighting for executed query text.

use ratatui::text::{Line, Span};

use super::Theme;

const KEYWORDS: &[&str] = &[
    "ALTER", "AND", "AS", "ASC", "BETWEEN", "BY", "CASE", "COUNT", "CREATE", "CROSS", "DELETE",
    "DESC", "DISTINCT", "DROP", "ELSE", "END", "EXISTS", "FOR", "FROM", "FULL", "GROUP", "HAVING",
    "IN", "INNER", "INSERT", "INTO", "IS", "JOIN", "LEFT", "LIKE", "LIMIT", "NOT", "NULL",
    "OFFSET", "ON", "OR", "ORDER", "OUTER", "RETURNING", "RIGHT", "SELECT", "SET", "TABLE",
    "THEN", "UNION", "UPDATE", "VALUES", "WHEN", "WHERE", "WITH",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    String,
    Number,
    Comment,
    Plain,
}

/// Split SQL into classified tokens. Concatenating the token texts gives
/// back the input unchanged.
pub fn tokenize(sql: &str) -> Vec<(TokenKind, &str)> {
    let bytes = sql.as_bytes();
    let mut tokens = Vec::new();
    let mut plain_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let (kind, end) = match bytes[i] {
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                let end = sql[i..].find('\n').map_or(sql.len(), |n| i + n);
                (TokenKind::Comment, end)
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = sql[i + 2..].find("*/").map_or(sql.len(), |n| i + 2 + n + 2);
                (TokenKind::Comment, end)
            }
            b'\'' => (TokenKind::String, string_end(bytes, i)),
            b'0'..=b'9' if !follows_identifier(bytes, i) => {
                let mut end = i;
                while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'.') {
                    end += 1;
                }
                (TokenKind::Number, end)
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                let mut end = i;
                while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_')
                {
                    end += 1;
                }
                let word = &sql[i..end];
                if KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(word)) {
                    (TokenKind::Keyword, end)
                } else {
                    (TokenKind::Plain, end)
                }
            }
            _ => {
                i += 1;
                continue;
            }
        };

        if kind == TokenKind::Plain {
            i = end;
            continue;
        }
        if plain_start < i {
            tokens.push((TokenKind::Plain, &sql[plain_start..i]));
        }
        tokens.push((kind, &sql[i..end]));
        i = end;
        plain_start = end;
    }

    if plain_start < sql.len() {
        tokens.push((TokenKind::Plain, &sql[plain_start..]));
    }
    tokens
}

/// A quoted string runs to the next unescaped quote (`''` escapes), or to the end.
fn string_end(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            if bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

fn follows_identifier(bytes: &[u8], i: usize) -> bool {
    i > 0 && (bytes[i - 1].is_ascii_alphanumeric() || bytes[i - 1] == b'_')
}

/// Highlighted lines for one statement, split on newlines.
pub fn highlight(sql: &str, theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut spans: Vec<Span<'static>> = Vec::new();

    for (kind, text) in tokenize(sql) {
        let style = match kind {
            TokenKind::Keyword => theme.sql_keyword,
            TokenKind::String => theme.sql_string,
            TokenKind::Number => theme.sql_number,
            TokenKind::Comment => theme.sql_comment,
            TokenKind::Plain => Default::default(),
        };
        let mut parts = text.split('\n').peekable();
        while let Some(part) = parts.next() {
            if !part.is_empty() {
                spans.push(Span::styled(part.to_string(), style));
            }
            if parts.peek().is_some() {
                lines.push(Line::from(std::mem::take(&mut spans)));
            }
        }
    }
    lines.push(Line::from(spans));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(sql: &str) -> Vec<(TokenKind, &str)> {
        tokenize(sql)
            .into_iter()
            .filter(|(kind, text)| *kind != TokenKind::Plain || !text.trim().is_empty())
            .collect()
    }

    #[test]
    fn test_keywords_any_case() {
        let tokens = kinds("select id from orders Where x");
        assert_eq!(tokens[0], (TokenKind::Keyword, "select"));
        assert_eq!(tokens[1], (TokenKind::Plain, " id "));
        assert_eq!(tokens[2], (TokenKind::Keyword, "from"));
        assert_eq!(tokens[4], (TokenKind::Keyword, "Where"));
    }

    #[test]
    fn test_strings_and_escapes() {
        let tokens = kinds("WHERE name = 'O''Brien' AND 1");
        assert!(tokens.contains(&(TokenKind::String, "'O''Brien'")));
        assert!(tokens.contains(&(TokenKind::Number, "1")));
    }

    #[test]
    fn test_numbers_not_inside_identifiers() {
        let tokens = kinds("SELECT col1 FROM t2 LIMIT 10.5");
        assert!(tokens.contains(&(TokenKind::Number, "10.5")));
        assert!(!tokens.iter().any(|(k, t)| *k == TokenKind::Number && *t == "1"));
    }

    #[test]
    fn test_comments() {
        let tokens = kinds("SELECT 1 -- trailing\n/* block */ FROM dual");
        assert!(tokens.contains(&(TokenKind::Comment, "-- trailing")));
        assert!(tokens.contains(&(TokenKind::Comment, "/* block */")));
        assert_eq!(tokens.last(), Some(&(TokenKind::Plain, " dual")));
    }

    #[test]
    fn test_unterminated_string_runs_to_end() {
        let tokens = kinds("SELECT 'abc");
        assert_eq!(tokens.last(), Some(&(TokenKind::String, "'abc")));
    }

    #[test]
    fn test_round_trip_text() {
        let sql = "UPDATE t SET a = 'x', b = 42 -- c\nWHERE id IN (1, 2)";
        let joined: String = tokenize(sql).iter().map(|(_, t)| *t).collect();
        assert_eq!(joined, sql);
    }

    #[test]
    fn test_highlight_splits_lines() {
        let lines = highlight("SELECT 1\nFROM dual", &Theme::dark());
        assert_eq!(lines.len(), 2);
    }
}

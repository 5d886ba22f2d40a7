use anyhow::anyhow;

use crate::ast::{Token, TokenType};
use crate::dialect::Dialect;

pub struct Scanner {
    source_chars: Vec<char>,
    byte_offsets: Vec<usize>,
    dialect: Dialect,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: u32,
    col: u32,
}

impl Scanner {
    pub fn new(source: &str, dialect: Dialect) -> Self {
        let mut source_chars = vec![];
        let mut byte_offsets = vec![];
        for (offset, c) in source.char_indices() {
            source_chars.push(c);
            byte_offsets.push(offset);
        }
        byte_offsets.push(source.len());
        Self {
            source_chars,
            byte_offsets,
            dialect,
            tokens: vec![],
            start: 0,
            current: 0,
            line: 1,
            col: 0,
        }
    }

    pub fn tokens(&self) -> &Vec<Token> {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    fn advance(&mut self) -> char {
        let c = self.source_chars[self.current];
        self.current += 1;
        self.col += 1;
        c
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source_chars.len()
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.source_chars[self.current]
        }
    }

    fn peek_next_i(&self, i: usize) -> char {
        if self.current + i >= self.source_chars.len() {
            '\0'
        } else {
            self.source_chars[self.current + i]
        }
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() != expected {
            return false;
        };

        self.advance();
        true
    }

    fn add_token(&mut self, token_type: TokenType) {
        self.tokens.push(Token {
            kind: token_type,
            lexeme: self.current_source_str(),
            line: self.line,
            col: self.col,
            start: self.byte_offsets[self.start],
            end: self.byte_offsets[self.current],
        });
    }

    fn current_source_str(&self) -> String {
        self.source_chars[self.start..self.current].iter().collect()
    }

    fn reset(&mut self) {
        self.tokens.clear();
        self.start = 0;
        self.current = 0;
        self.col = 1;
        self.line = 1;
    }

    fn new_line(&mut self) {
        self.line += 1;
        self.col = 1;
    }

    pub fn scan(&mut self) -> anyhow::Result<()> {
        self.reset();
        while self.current < self.source_chars.len() {
            self.start = self.current;
            self.scan_token()?;
        }
        let eof_offset = self.byte_offsets[self.source_chars.len()];
        self.tokens.push(Token {
            kind: TokenType::Eof,
            lexeme: String::from("eof"),
            line: self.line,
            col: self.col,
            start: eof_offset,
            end: eof_offset,
        });

        Ok(())
    }

    fn is_escape_string(&self, c: char) -> bool {
        (c == 'e' || c == 'E') && self.peek() == '\'' && self.dialect == Dialect::Postgres
    }

    fn is_dollar_quote(&self) -> bool {
        let mut i = 0;
        loop {
            let c = self.peek_next_i(i);
            if c == '$' {
                return true;
            }
            if !(c.is_alphabetic() || c == '_' || (i > 0 && c.is_ascii_digit())) {
                return false;
            }
            i += 1;
        }
    }

    // Quote already consumed. Returns the unescaped content.
    fn scan_quoted(&mut self, delimiter: char, backslash_escapes: bool) -> anyhow::Result<String> {
        let mut value = String::new();
        loop {
            if self.is_at_end() {
                return Err(anyhow!(self.error_str("Found unterminated string")));
            }
            let c = self.advance();
            if c == '\n' {
                self.new_line();
            }
            if backslash_escapes && c == '\\' {
                if self.is_at_end() {
                    return Err(anyhow!(self.error_str("Found unterminated string")));
                }
                let escaped = self.advance();
                value.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '0' => '\0',
                    other => other,
                });
                continue;
            }
            if c == delimiter {
                if self.match_char(delimiter) {
                    value.push(delimiter);
                    continue;
                }
                break;
            }
            value.push(c);
        }
        Ok(value)
    }

    fn match_string(&mut self, backslash_escapes: bool) -> anyhow::Result<()> {
        let value = self.scan_quoted('\'', backslash_escapes)?;
        self.add_token(TokenType::String(value));
        Ok(())
    }

    fn match_quoted_identifier(&mut self) -> anyhow::Result<()> {
        let value = self.scan_quoted('"', false)?;
        if value.is_empty() {
            return Err(anyhow!(self.error_str("Found empty quoted identifier.")));
        }
        self.add_token(TokenType::QuotedIdentifier(value));
        Ok(())
    }

    fn match_dollar_string(&mut self) -> anyhow::Result<()> {
        let mut tag = String::from("$");
        loop {
            let c = self.advance();
            tag.push(c);
            if c == '$' {
                break;
            }
        }
        let tag_chars: Vec<char> = tag.chars().collect();
        let content_start = self.current;
        loop {
            if self.is_at_end() {
                return Err(anyhow!(self.error_str("Found unterminated string")));
            }
            if self.source_chars[self.current..].starts_with(&tag_chars) {
                let value: String = self.source_chars[content_start..self.current]
                    .iter()
                    .collect();
                for _ in 0..tag_chars.len() {
                    self.advance();
                }
                self.add_token(TokenType::String(value));
                return Ok(());
            }
            if self.advance() == '\n' {
                self.new_line();
            }
        }
    }

    fn match_placeholder(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        self.add_token(TokenType::Placeholder(self.current_source_str()));
    }

    fn match_number(&mut self) -> anyhow::Result<()> {
        let mut found_dot = self.source_chars[self.start] == '.';
        let mut found_e = false;
        loop {
            let peek_char = self.peek();

            if peek_char == '.' {
                if found_dot || found_e {
                    return Err(anyhow!(self.error_str("Found invalid number")));
                }
                found_dot = true;
                self.advance();
            } else if peek_char == 'e' || peek_char == 'E' {
                if found_e {
                    return Err(anyhow!(self.error_str("Found invalid number")));
                }
                found_e = true;
                let peek_next_char = self.peek_next_i(1);
                if peek_next_char == '+' || peek_next_char == '-' {
                    self.advance();
                    if !(self.peek_next_i(1).is_ascii_digit()) {
                        return Err(anyhow!(self.error_str("Found invalid number")));
                    }
                    self.advance();
                } else if peek_next_char.is_ascii_digit() {
                    self.advance();
                } else {
                    return Err(anyhow!(self.error_str("Found invalid number")));
                }
            } else if peek_char.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }
        self.add_token(TokenType::Number(self.current_source_str()));

        Ok(())
    }

    fn match_keyword_or_identifier(&mut self) {
        loop {
            let peek_char = self.peek();
            if !(peek_char.is_alphanumeric() || peek_char == '_' || peek_char == '$') {
                break;
            }
            self.advance();
        }
        let identifer = self.current_source_str();

        match identifer.to_lowercase().as_str() {
            "all" => self.add_token(TokenType::All),
            "and" => self.add_token(TokenType::And),
            "array" => self.add_token(TokenType::Array),
            "as" => self.add_token(TokenType::As),
            "asc" => self.add_token(TokenType::Asc),
            "between" => self.add_token(TokenType::Between),
            "by" => self.add_token(TokenType::By),
            "case" => self.add_token(TokenType::Case),
            "cast" => self.add_token(TokenType::Cast),
            "create" => self.add_token(TokenType::Create),
            "cross" => self.add_token(TokenType::Cross),
            "desc" => self.add_token(TokenType::Desc),
            "distinct" => self.add_token(TokenType::Distinct),
            "else" => self.add_token(TokenType::Else),
            "end" => self.add_token(TokenType::End),
            "except" => self.add_token(TokenType::Except),
            "exists" => self.add_token(TokenType::Exists),
            "extract" => self.add_token(TokenType::Extract),
            "false" => self.add_token(TokenType::False),
            "for" => self.add_token(TokenType::For),
            "from" => self.add_token(TokenType::From),
            "full" => self.add_token(TokenType::Full),
            "group" => self.add_token(TokenType::Group),
            "having" => self.add_token(TokenType::Having),
            "ilike" => self.add_token(TokenType::Ilike),
            "in" => self.add_token(TokenType::In),
            "inner" => self.add_token(TokenType::Inner),
            "intersect" => self.add_token(TokenType::Intersect),
            "interval" => self.add_token(TokenType::Interval),
            "into" => self.add_token(TokenType::Into),
            "is" => self.add_token(TokenType::Is),
            "join" => self.add_token(TokenType::Join),
            "lateral" => self.add_token(TokenType::Lateral),
            "left" => self.add_token(TokenType::Left),
            "like" => self.add_token(TokenType::Like),
            "limit" => self.add_token(TokenType::Limit),
            "natural" => self.add_token(TokenType::Natural),
            "not" => self.add_token(TokenType::Not),
            "null" => self.add_token(TokenType::Null),
            "offset" => self.add_token(TokenType::Offset),
            "on" => self.add_token(TokenType::On),
            "or" => self.add_token(TokenType::Or),
            "order" => self.add_token(TokenType::Order),
            "outer" => self.add_token(TokenType::Outer),
            "qualify" => self.add_token(TokenType::Qualify),
            "recursive" => self.add_token(TokenType::Recursive),
            "right" => self.add_token(TokenType::Right),
            "select" => self.add_token(TokenType::Select),
            "then" => self.add_token(TokenType::Then),
            "true" => self.add_token(TokenType::True),
            "union" => self.add_token(TokenType::Union),
            "using" => self.add_token(TokenType::Using),
            "values" => self.add_token(TokenType::Values),
            "when" => self.add_token(TokenType::When),
            "where" => self.add_token(TokenType::Where),
            "window" => self.add_token(TokenType::Window),
            "with" => self.add_token(TokenType::With),
            _ => self.add_token(TokenType::Identifier(identifer)),
        }
    }

    fn scan_token(&mut self) -> anyhow::Result<()> {
        let curr_char = self.advance();
        match curr_char {
            '(' => self.add_token(TokenType::LeftParen),
            ')' => self.add_token(TokenType::RightParen),
            '[' => self.add_token(TokenType::LeftSquare),
            ']' => self.add_token(TokenType::RightSquare),
            '*' => self.add_token(TokenType::Star),
            ',' => self.add_token(TokenType::Comma),
            '%' => self.add_token(TokenType::Percent),
            ';' => self.add_token(TokenType::Semicolon),
            '+' => self.add_token(TokenType::Plus),
            '=' => self.add_token(TokenType::Equal),
            '~' => self.add_token(TokenType::BitwiseNot),
            '?' => self.add_token(TokenType::Placeholder(String::from("?"))),
            ':' => {
                if self.match_char(':') {
                    self.add_token(TokenType::DoubleColon);
                } else {
                    self.add_token(TokenType::Colon);
                }
            }
            '.' => {
                if self.peek().is_ascii_digit() {
                    self.match_number()?;
                } else {
                    self.add_token(TokenType::Dot);
                }
            }
            '/' => {
                if self.match_char('*') {
                    loop {
                        if self.is_at_end() {
                            return Err(anyhow!(self.error_str("Found unterminated comment")));
                        }
                        if self.peek() == '*' && self.peek_next_i(1) == '/' {
                            self.advance();
                            self.advance();
                            break;
                        }
                        if self.advance() == '\n' {
                            self.new_line();
                        }
                    }
                } else {
                    self.add_token(TokenType::Slash)
                }
            }
            '-' => {
                if self.match_char('-') {
                    loop {
                        let peek_char = self.peek();
                        if peek_char == '\n' || peek_char == '\0' {
                            break;
                        }
                        self.advance();
                    }
                } else if self.match_char('>') {
                    if self.match_char('>') {
                        self.add_token(TokenType::LongArrow);
                    } else {
                        self.add_token(TokenType::Arrow);
                    }
                } else {
                    self.add_token(TokenType::Minus)
                }
            }
            '<' => {
                if self.match_char('>') {
                    self.add_token(TokenType::NotEqual);
                } else if self.match_char('=') {
                    self.add_token(TokenType::LessEqual);
                } else {
                    self.add_token(TokenType::Less);
                }
            }
            '!' => {
                if self.match_char('=') {
                    self.add_token(TokenType::BangEqual);
                } else {
                    return Err(anyhow!(self.error_str("Found unexpected character while scanning: !")));
                }
            }
            '>' => {
                if self.match_char('=') {
                    self.add_token(TokenType::GreaterEqual);
                } else {
                    self.add_token(TokenType::Greater);
                }
            }
            '|' => {
                if self.match_char('|') {
                    self.add_token(TokenType::ConcatOperator);
                } else {
                    return Err(anyhow!(self.error_str("Found unexpected character while scanning: |")));
                }
            }
            '\n' => {
                self.new_line();
            }
            '\r' | ' ' | '\t' => {}

            // strings
            '\'' => self.match_string(self.dialect.backslash_escapes())?,
            c if self.is_escape_string(c) => {
                self.advance();
                self.match_string(true)?;
            }
            '"' => self.match_quoted_identifier()?,
            '$' => {
                if self.peek().is_ascii_digit() {
                    self.match_placeholder();
                } else if self.is_dollar_quote() {
                    self.match_dollar_string()?;
                } else {
                    return Err(anyhow!(self.error_str("Found unexpected character while scanning: $")));
                }
            }

            // numeric
            c if c.is_ascii_digit() => {
                self.match_number()?;
            }

            // Keywords and identifiers
            c if c.is_alphabetic() || c == '_' => {
                self.match_keyword_or_identifier();
            }

            _ => {
                return Err(anyhow!(self.error_str(&format!(
                    "Found unexpected character while scanning: {}",
                    curr_char
                ))));
            }
        }
        Ok(())
    }

    fn error_str(&self, error: &str) -> String {
        format!(
            "[line: {}, col: {}] Scanner error: {}",
            self.line, self.col, error
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(sql: &str, dialect: Dialect) -> Vec<TokenType> {
        let mut scanner = Scanner::new(sql, dialect);
        scanner.scan().unwrap();
        scanner.into_tokens().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn scans_casts_and_json_operators() {
        assert_eq!(
            kinds("a::text -> 'k' ->> 'v'", Dialect::Postgres),
            vec![
                TokenType::Identifier("a".into()),
                TokenType::DoubleColon,
                TokenType::Identifier("text".into()),
                TokenType::Arrow,
                TokenType::String("k".into()),
                TokenType::LongArrow,
                TokenType::String("v".into()),
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn unescapes_strings_per_dialect() {
        assert_eq!(
            kinds("'it''s'", Dialect::Postgres)[0],
            TokenType::String("it's".into())
        );
        assert_eq!(
            kinds(r"'a\'b'", Dialect::Snowflake)[0],
            TokenType::String("a'b".into())
        );
        assert_eq!(
            kinds(r"E'a\nb'", Dialect::Postgres)[0],
            TokenType::String("a\nb".into())
        );
        assert_eq!(
            kinds("$$x'y$$", Dialect::Postgres)[0],
            TokenType::String("x'y".into())
        );
    }

    #[test]
    fn quoted_identifiers_and_placeholders() {
        assert_eq!(
            kinds(r#""My ""Col""" = $1"#, Dialect::Postgres),
            vec![
                TokenType::QuotedIdentifier("My \"Col\"".into()),
                TokenType::Equal,
                TokenType::Placeholder("$1".into()),
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn tracks_byte_offsets() {
        let sql = "select 'é', x";
        let mut scanner = Scanner::new(sql, Dialect::Postgres);
        scanner.scan().unwrap();
        let x = &scanner.tokens()[3];
        assert_eq!(&sql[x.start..x.end], "x");
    }

    #[test]
    fn reports_unterminated_string() {
        let mut scanner = Scanner::new("select 'abc", Dialect::Postgres);
        let err = scanner.scan().unwrap_err();
        assert!(err.to_string().contains("unterminated string"));
    }
}

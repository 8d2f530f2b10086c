//! DDL interpreter for the in-memory store
//!
//! Understands the statements the schema browser generates and turns them
//! into edits of the store's JSON table descriptions. Anything else is
//! rejected the way a real store would reject it, as a backing-store error.

use nosql_core::{NosqlError, Result};
use serde_json::{Map, Value, json};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Statement {
    CreateTable { if_not_exists: bool, table: Value },
    DropTable { if_exists: bool, name: String },
    AddColumn { table: String, field: Value },
    DropColumn { table: String, column: String },
    AlterTtl { table: String, ttl: Value },
    CreateIndex { if_not_exists: bool, table: String, index: Value },
    DropIndex { if_exists: bool, table: String, name: String },
}

impl Statement {
    pub(crate) fn table_name(&self) -> &str {
        match self {
            Statement::CreateTable { table, .. } => table["name"].as_str().unwrap_or_default(),
            Statement::DropTable { name, .. } => name,
            Statement::AddColumn { table, .. }
            | Statement::DropColumn { table, .. }
            | Statement::AlterTtl { table, .. }
            | Statement::CreateIndex { table, .. }
            | Statement::DropIndex { table, .. } => table,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Str(String),
    Open,
    Close,
    Comma,
}

pub(crate) fn parse(statement: &str) -> Result<Statement> {
    let tokens = tokenize(statement)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        text: statement,
    };
    let parsed = parser.statement()?;
    if parser.pos < parser.tokens.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(parsed)
}

fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() || c == ';' => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '"' | '\'' => {
                chars.next();
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some('\\') => {
                            if let Some(escaped) = chars.next() {
                                value.push(escaped);
                            }
                        }
                        Some(ch) if ch == c => break,
                        Some(ch) => value.push(ch),
                        None => {
                            return Err(NosqlError::backing_store(format!(
                                "syntax error in '{text}': unterminated string"
                            )));
                        }
                    }
                }
                tokens.push(Token::Str(value));
            }
            _ => {
                let mut word = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_whitespace() || "(),;\"'".contains(ch) {
                        break;
                    }
                    word.push(ch);
                    chars.next();
                }
                tokens.push(Token::Word(word));
            }
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    text: &'a str,
}

impl Parser<'_> {
    fn statement(&mut self) -> Result<Statement> {
        if self.keyword("CREATE") {
            if self.keyword("TABLE") {
                return self.create_table();
            }
            if self.keyword("INDEX") {
                return self.create_index();
            }
        } else if self.keyword("DROP") {
            if self.keyword("TABLE") {
                let if_exists = self.keywords(&["IF", "EXISTS"]);
                let name = self.ident()?;
                return Ok(Statement::DropTable { if_exists, name });
            }
            if self.keyword("INDEX") {
                let if_exists = self.keywords(&["IF", "EXISTS"]);
                let name = self.ident()?;
                self.expect_keyword("ON")?;
                let table = self.ident()?;
                return Ok(Statement::DropIndex {
                    if_exists,
                    table,
                    name,
                });
            }
        } else if self.keyword("ALTER") {
            self.expect_keyword("TABLE")?;
            return self.alter_table();
        }
        Err(self.error("unsupported statement"))
    }

    fn create_table(&mut self) -> Result<Statement> {
        let if_not_exists = self.keywords(&["IF", "NOT", "EXISTS"]);
        let name = self.ident()?;
        self.expect(Token::Open)?;

        let mut fields = Vec::new();
        let mut primary_key = Vec::new();
        let mut shard_key = None;
        loop {
            if self.keyword("PRIMARY") {
                self.expect_keyword("KEY")?;
                self.expect(Token::Open)?;
                loop {
                    if self.keyword("SHARD") {
                        let shard = self.ident_list()?;
                        primary_key.extend(shard.iter().cloned());
                        shard_key = Some(shard);
                    } else {
                        primary_key.push(self.ident()?);
                    }
                    if !self.eat(&Token::Comma) {
                        break;
                    }
                }
                self.expect(Token::Close)?;
            } else {
                fields.push(self.column_definition()?);
            }
            if self.eat(&Token::Close) {
                break;
            }
            self.expect(Token::Comma)?;
        }

        let mut table = json!({
            "name": name,
            "primaryKey": primary_key,
            "fields": fields,
            "indexes": [],
        });
        if let Some(shard_key) = shard_key {
            table["shardKey"] = json!(shard_key);
        }
        if self.keyword("USING") {
            table["ttl"] = self.ttl()?;
        }
        Ok(Statement::CreateTable {
            if_not_exists,
            table,
        })
    }

    fn create_index(&mut self) -> Result<Statement> {
        let if_not_exists = self.keywords(&["IF", "NOT", "EXISTS"]);
        let name = self.ident()?;
        self.expect_keyword("ON")?;
        let table = self.ident()?;
        let fields = self.ident_list()?;
        Ok(Statement::CreateIndex {
            if_not_exists,
            table,
            index: json!({"name": name, "fields": fields}),
        })
    }

    fn alter_table(&mut self) -> Result<Statement> {
        let table = self.ident()?;
        if self.keyword("USING") {
            let ttl = self.ttl()?;
            return Ok(Statement::AlterTtl { table, ttl });
        }
        self.expect(Token::Open)?;
        let statement = if self.keyword("ADD") {
            Statement::AddColumn {
                table,
                field: self.column_definition()?,
            }
        } else if self.keyword("DROP") {
            Statement::DropColumn {
                table,
                column: self.ident()?,
            }
        } else {
            return Err(self.error("expected ADD or DROP"));
        };
        self.expect(Token::Close)?;
        Ok(statement)
    }

    /// `name TYPE[(n)] [NOT NULL] [DEFAULT value]` as a field node
    fn column_definition(&mut self) -> Result<Value> {
        let name = self.ident()?;
        let mut type_name = self.ident()?.to_ascii_uppercase();
        let mut field = Map::new();
        if self.peek() == Some(&Token::Open) {
            self.pos += 1;
            match (self.tokens.get(self.pos), self.tokens.get(self.pos + 1)) {
                (Some(Token::Word(n)), Some(Token::Close)) if n.parse::<u32>().is_ok() => {
                    let size: u32 = n.parse().unwrap_or_default();
                    if type_name == "BINARY" {
                        type_name = "FIXED_BINARY".to_string();
                    }
                    field.insert("size".into(), json!(size));
                    self.pos += 2;
                }
                _ => self.skip_group()?,
            }
        }
        field.insert("name".into(), json!(name));
        field.insert("type".into(), json!(type_name));
        field.insert("nullable".into(), json!(true));
        loop {
            if self.keywords(&["NOT", "NULL"]) {
                field.insert("nullable".into(), json!(false));
            } else if self.keyword("DEFAULT") {
                let value = match self.next() {
                    Some(Token::Str(s)) => json!(s),
                    Some(Token::Word(w)) => {
                        serde_json::from_str::<Value>(&w).unwrap_or(Value::String(w))
                    }
                    _ => return Err(self.error("expected a default value")),
                };
                field.insert("default".into(), value);
            } else {
                break;
            }
        }
        Ok(Value::Object(field))
    }

    /// `TTL n DAYS|HOURS` after `USING`
    fn ttl(&mut self) -> Result<Value> {
        self.expect_keyword("TTL")?;
        let value: u32 = self
            .ident()?
            .parse()
            .map_err(|_| self.error("TTL value must be a number"))?;
        let unit = self.ident()?.to_ascii_uppercase();
        let unit = match unit.trim_end_matches('S') {
            "DAY" => "DAYS",
            "HOUR" => "HOURS",
            _ => return Err(self.error("TTL unit must be DAYS or HOURS")),
        };
        Ok(json!({"value": value, "unit": unit}))
    }

    /// `(a, b, ..)`
    fn ident_list(&mut self) -> Result<Vec<String>> {
        self.expect(Token::Open)?;
        let mut names = vec![self.ident()?];
        while self.eat(&Token::Comma) {
            names.push(self.ident()?);
        }
        self.expect(Token::Close)?;
        Ok(names)
    }

    /// Skip to the parenthesis closing the one just consumed
    fn skip_group(&mut self) -> Result<()> {
        let mut depth = 1;
        while depth > 0 {
            match self.next() {
                Some(Token::Open) => depth += 1,
                Some(Token::Close) => depth -= 1,
                Some(_) => {}
                None => return Err(self.error("unbalanced parentheses")),
            }
        }
        Ok(())
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> Result<()> {
        if self.eat(&token) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {token:?}")))
        }
    }

    fn keyword(&mut self, keyword: &str) -> bool {
        match self.peek() {
            Some(Token::Word(w)) if w.eq_ignore_ascii_case(keyword) => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    /// Consume a keyword sequence only if all of it is present
    fn keywords(&mut self, sequence: &[&str]) -> bool {
        let start = self.pos;
        if sequence.iter().all(|kw| self.keyword(kw)) {
            true
        } else {
            self.pos = start;
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        if self.keyword(keyword) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {keyword}")))
        }
    }

    fn ident(&mut self) -> Result<String> {
        match self.next() {
            Some(Token::Word(w)) => Ok(w),
            _ => Err(self.error("expected a name")),
        }
    }

    fn error(&self, message: &str) -> NosqlError {
        NosqlError::backing_store(format!("syntax error in '{}': {message}", self.text))
    }
}

#[cfg(test)]
mod tests;

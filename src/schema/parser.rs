//! Schema parser - Converts tokens into table schemas
//!
//! The only statement form in a schema definition is CREATE TABLE; disabled
//! load directives are comments and never reach the parser.

use std::iter::Peekable;

use crate::{
    error::{Error, Result},
    schema::{
        Column, Table,
        lexer::{Keyword, Lexer, Token},
    },
    types::{DataType, Value},
};

/// Schema-definition parser
pub struct Parser<'a> {
    lexer: Peekable<Lexer<'a>>,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given schema-definition text
    pub fn new(input: &'a str) -> Self {
        Parser {
            lexer: Lexer::new(input).peekable(),
        }
    }

    /// Parses a full schema definition: a sequence of CREATE TABLE statements
    pub fn parse_schema(&mut self) -> Result<Vec<Table>> {
        let mut tables = Vec::new();
        while self.peek()?.is_some() {
            tables.push(self.parse_create_table()?);
        }
        Ok(tables)
    }

    /// Parses a single CREATE TABLE statement including its semicolon
    fn parse_create_table(&mut self) -> Result<Table> {
        self.next_expect(Token::Keyword(Keyword::Create))?;
        self.next_expect(Token::Keyword(Keyword::Table))?;
        let name = self.next_ident()?;
        self.next_expect(Token::OpenParen)?;

        let mut columns = Vec::new();
        loop {
            columns.push(self.parse_column()?);
            if self.next_if_token(Token::Comma).is_none() {
                break;
            }
        }
        self.next_expect(Token::CloseParen)?;
        self.next_expect(Token::Semicolon)?;

        Ok(Table { name, columns })
    }

    /// Parses a column definition
    fn parse_column(&mut self) -> Result<Column> {
        let name = self.next_ident()?;
        let datatype = match self.next()? {
            Token::Keyword(Keyword::Int) | Token::Keyword(Keyword::Integer) => DataType::Integer,
            Token::Keyword(Keyword::Bool) | Token::Keyword(Keyword::Boolean) => DataType::Boolean,
            Token::Keyword(Keyword::Float) | Token::Keyword(Keyword::Double) => DataType::Float,
            Token::Keyword(Keyword::String)
            | Token::Keyword(Keyword::Text)
            | Token::Keyword(Keyword::Varchar) => DataType::String,
            token => return Err(Error::Parse(format!("[Parser] Unexpected token {}", token))),
        };

        // Parse column constraints (NULL, NOT NULL, DEFAULT)
        let mut nullable = None;
        let mut default = None;
        while let Some(Token::Keyword(keyword)) = self.next_if_keyword() {
            match keyword {
                Keyword::Null => nullable = Some(true),
                Keyword::Not => {
                    self.next_expect(Token::Keyword(Keyword::Null))?;
                    nullable = Some(false);
                }
                Keyword::Default => default = Some(self.parse_literal()?),
                k => return Err(Error::Parse(format!("[Parser] Unexpected keyword {}", k))),
            }
        }

        // Unmarked columns are nullable, and nullable columns default to NULL
        let nullable = nullable.unwrap_or(true);
        let default = default.or_else(|| nullable.then(|| Value::Null));

        Ok(Column {
            name,
            datatype,
            nullable,
            default,
        })
    }

    /// Parses a literal value (used by DEFAULT)
    fn parse_literal(&mut self) -> Result<Value> {
        Ok(match self.next()? {
            Token::Number(n) => {
                // The lexer scans both 120 and 4.5 as Token::Number(String),
                // so integer and float are distinguished here
                if n.chars().all(|c| c.is_ascii_digit()) {
                    Value::Integer(n.parse()?)
                } else {
                    Value::Float(n.parse()?)
                }
            }
            Token::String(s) => Value::String(s),
            Token::Keyword(Keyword::True) => Value::Boolean(true),
            Token::Keyword(Keyword::False) => Value::Boolean(false),
            Token::Keyword(Keyword::Null) => Value::Null,
            t => {
                return Err(Error::Parse(format!(
                    "[Parser] Unexpected literal token {}",
                    t
                )));
            }
        })
    }

    /// Peeks at the next token
    fn peek(&mut self) -> Result<Option<Token>> {
        self.lexer.peek().cloned().transpose()
    }

    /// Consumes and returns the next token
    fn next(&mut self) -> Result<Token> {
        self.lexer
            .next()
            .unwrap_or_else(|| Err(Error::Parse("[Parser] Unexpected end of input".to_string())))
    }

    /// Expects and consumes an identifier
    fn next_ident(&mut self) -> Result<String> {
        match self.next()? {
            Token::Ident(ident) => Ok(ident),
            token => Err(Error::Parse(format!(
                "[Parser] Expected ident, got token {}",
                token
            ))),
        }
    }

    /// Expects a specific token, returns error if different
    fn next_expect(&mut self, expect: Token) -> Result<()> {
        let token = self.next()?;
        if token != expect {
            return Err(Error::Parse(format!(
                "[Parser] Expected token {}, got {}",
                expect, token
            )));
        }
        Ok(())
    }

    /// Consumes next token if it satisfies the predicate
    fn next_if<F: Fn(&Token) -> bool>(&mut self, predicate: F) -> Option<Token> {
        self.peek().unwrap_or(None).filter(|t| predicate(t))?;
        self.next().ok()
    }

    /// Consumes next token if it's a keyword
    fn next_if_keyword(&mut self) -> Option<Token> {
        self.next_if(|t| matches!(t, Token::Keyword(_)))
    }

    /// Consumes next token if it matches the given token
    fn next_if_token(&mut self, token: Token) -> Option<Token> {
        self.next_if(|t| t == &token)
    }
}

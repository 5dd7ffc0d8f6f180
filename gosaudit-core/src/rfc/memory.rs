//! In-memory RFC transport.
//!
//! `MemoryConnector` serves tables held in memory through the same
//! [`RfcConnector`]/[`RfcSession`] seam as the network transports. Every
//! call is recorded so callers can check request counts, skips and option
//! lines. Predicates support the subset of Open SQL the scanner issues:
//! `FIELD = 'value'` and `FIELD IN ('a','b')` joined by `AND`.

use super::{RfcConnector, RfcError, RfcSession, ReadTableRequest};
use crate::models::{DataType, FieldSpec};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A recorded remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open,
    ReadTable(ReadTableRequest),
    FieldInfo(String),
    RowCount(String),
    Close,
}

#[derive(Debug, Default)]
struct MemoryTable {
    specs: Vec<FieldSpec>,
    rows: Vec<Vec<String>>,
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<String, MemoryTable>,
    scripted: HashMap<String, VecDeque<Vec<String>>>,
    calls: Vec<Call>,
    logon_error: Option<RfcError>,
    read_error: Option<(Option<String>, RfcError)>,
    field_info_error: Option<RfcError>,
    row_count_error: Option<RfcError>,
    opened: usize,
    closed: usize,
}

/// Connector serving in-memory tables.
///
/// Clones share the same tables and call log.
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    client: String,
    state: Arc<Mutex<State>>,
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryConnector {
    /// Creates an empty connector for logon client `client`.
    pub fn new(client: impl Into<String>) -> Self {
        Self {
            client: client.into(),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Adds (or replaces) a table.
    ///
    /// `fields` holds `(name, dictionary type, length)` triples and each row
    /// holds one value per field, in the same order.
    pub fn add_table<S: Into<String>>(
        &self,
        name: &str,
        fields: &[(&str, &str, u32)],
        rows: Vec<Vec<S>>,
    ) {
        let specs = fields
            .iter()
            .map(|(field, data_type, length)| {
                FieldSpec::new(*field, DataType::from_dictionary(data_type), *length)
            })
            .collect();
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();

        lock(&self.state)
            .tables
            .insert(name.to_string(), MemoryTable { specs, rows });
    }

    /// Queues a raw response for the next read of `table`, bypassing
    /// predicate evaluation and projection.
    pub fn push_raw_rows(&self, table: &str, rows: Vec<String>) {
        lock(&self.state)
            .scripted
            .entry(table.to_string())
            .or_default()
            .push_back(rows);
    }

    /// Makes every subsequent logon fail with `error`.
    pub fn fail_logon(&self, error: RfcError) {
        lock(&self.state).logon_error = Some(error);
    }

    /// Makes every subsequent table read fail with `error`.
    pub fn fail_read_table(&self, error: RfcError) {
        lock(&self.state).read_error = Some((None, error));
    }

    /// Makes subsequent reads of `table` fail with `error`.
    pub fn fail_read_table_of(&self, table: &str, error: RfcError) {
        lock(&self.state).read_error = Some((Some(table.to_string()), error));
    }

    /// Makes every subsequent metadata lookup fail with `error`.
    pub fn fail_field_info(&self, error: RfcError) {
        lock(&self.state).field_info_error = Some(error);
    }

    /// Makes every subsequent row count probe fail with `error`.
    pub fn fail_row_count(&self, error: RfcError) {
        lock(&self.state).row_count_error = Some(error);
    }

    /// Returns a copy of the call log.
    pub fn calls(&self) -> Vec<Call> {
        lock(&self.state).calls.clone()
    }

    /// Returns every recorded `RFC_READ_TABLE` request.
    pub fn read_requests(&self) -> Vec<ReadTableRequest> {
        lock(&self.state)
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::ReadTable(request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of `RFC_READ_TABLE` calls issued so far.
    pub fn read_table_calls(&self) -> usize {
        lock(&self.state)
            .calls
            .iter()
            .filter(|call| matches!(call, Call::ReadTable(_)))
            .count()
    }

    /// Number of sessions opened.
    pub fn opened_sessions(&self) -> usize {
        lock(&self.state).opened
    }

    /// Number of sessions closed.
    pub fn closed_sessions(&self) -> usize {
        lock(&self.state).closed
    }
}

#[async_trait]
impl RfcConnector for MemoryConnector {
    async fn open(&self) -> Result<Box<dyn RfcSession>, RfcError> {
        let mut state = lock(&self.state);
        state.calls.push(Call::Open);
        if let Some(error) = &state.logon_error {
            return Err(error.clone());
        }
        state.opened = state.opened.saturating_add(1);

        Ok(Box::new(MemorySession {
            state: Arc::clone(&self.state),
        }))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }

    fn logon_client(&self) -> &str {
        &self.client
    }
}

struct MemorySession {
    state: Arc<Mutex<State>>,
}

fn table_not_available(table: &str) -> RfcError {
    RfcError::Abap {
        key: "TABLE_NOT_AVAILABLE".to_string(),
        message: format!("Table {} does not exist", table),
    }
}

#[async_trait]
impl RfcSession for MemorySession {
    async fn read_table(&self, request: &ReadTableRequest) -> Result<Vec<String>, RfcError> {
        let mut state = lock(&self.state);
        state.calls.push(Call::ReadTable(request.clone()));

        if let Some((scope, error)) = &state.read_error
            && scope.as_ref().is_none_or(|table| table == &request.table)
        {
            return Err(error.clone());
        }

        if let Some(rows) = state
            .scripted
            .get_mut(&request.table)
            .and_then(VecDeque::pop_front)
        {
            return Ok(rows);
        }

        let table = state
            .tables
            .get(&request.table)
            .ok_or_else(|| table_not_available(&request.table))?;

        let column_of = |field: &str| -> Result<usize, RfcError> {
            table
                .specs
                .iter()
                .position(|spec| spec.name == field)
                .ok_or_else(|| RfcError::Abap {
                    key: "FIELD_NOT_VALID".to_string(),
                    message: format!("Field {} not in {}", field, request.table),
                })
        };

        let projection = request
            .fields
            .iter()
            .map(|field| column_of(field))
            .collect::<Result<Vec<_>, _>>()?;

        let conditions = parse_predicate(&request.options.concat())?
            .into_iter()
            .map(|condition| Ok((column_of(condition.field())?, condition)))
            .collect::<Result<Vec<_>, RfcError>>()?;

        if let Some(row) = table.rows.iter().find(|row| row.len() != table.specs.len()) {
            return Err(RfcError::Protocol(format!(
                "Row of {} has {} values, table defines {} fields",
                request.table,
                row.len(),
                table.specs.len()
            )));
        }

        let skip = usize::try_from(request.skip).unwrap_or(usize::MAX);
        let delimiter = request.delimiter.to_string();

        Ok(table
            .rows
            .iter()
            .filter(|row| {
                conditions.iter().all(|(column, condition)| {
                    row.get(*column)
                        .is_some_and(|value| condition.matches(value))
                })
            })
            .skip(skip)
            .take(request.count as usize)
            .map(|row| {
                projection
                    .iter()
                    .map(|column| row.get(*column).map_or("", String::as_str))
                    .collect::<Vec<_>>()
                    .join(&delimiter)
            })
            .collect())
    }

    async fn field_info(&self, table: &str) -> Result<Vec<FieldSpec>, RfcError> {
        let mut state = lock(&self.state);
        state.calls.push(Call::FieldInfo(table.to_string()));
        if let Some(error) = &state.field_info_error {
            return Err(error.clone());
        }
        state
            .tables
            .get(table)
            .map(|t| t.specs.clone())
            .ok_or_else(|| table_not_available(table))
    }

    async fn row_count(&self, table: &str) -> Result<u64, RfcError> {
        let mut state = lock(&self.state);
        state.calls.push(Call::RowCount(table.to_string()));
        if let Some(error) = &state.row_count_error {
            return Err(error.clone());
        }
        state
            .tables
            .get(table)
            .map(|t| t.rows.len() as u64)
            .ok_or_else(|| table_not_available(table))
    }

    async fn close(&mut self) -> Result<(), RfcError> {
        let mut state = lock(&self.state);
        state.calls.push(Call::Close);
        state.closed = state.closed.saturating_add(1);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Condition {
    Eq(String, String),
    In(String, HashSet<String>),
}

impl Condition {
    fn field(&self) -> &str {
        match self {
            Condition::Eq(field, _) | Condition::In(field, _) => field,
        }
    }

    fn matches(&self, value: &str) -> bool {
        match self {
            Condition::Eq(_, expected) => value == expected,
            Condition::In(_, values) => values.contains(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Literal(String),
    Equals,
    Open,
    Close,
    Comma,
}

fn syntax_error(text: &str) -> RfcError {
    RfcError::Abap {
        key: "OPTION_NOT_VALID".to_string(),
        message: format!("Cannot parse option '{}'", text),
    }
}

fn tokenize(text: &str) -> Result<Vec<Token>, RfcError> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '=' => {
                chars.next();
                tokens.push(Token::Equals);
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
            '\'' => {
                chars.next();
                let mut literal = String::new();
                loop {
                    match chars.next() {
                        Some('\'') if chars.peek() == Some(&'\'') => {
                            chars.next();
                            literal.push('\'');
                        }
                        Some('\'') => break,
                        Some(other) => literal.push(other),
                        None => return Err(syntax_error(text)),
                    }
                }
                tokens.push(Token::Literal(literal));
            }
            c if c.is_ascii_alphanumeric() || c == '_' || c == '/' => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' || c == '/' {
                        word.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Word(word));
            }
            _ => return Err(syntax_error(text)),
        }
    }

    Ok(tokens)
}

fn parse_predicate(text: &str) -> Result<Vec<Condition>, RfcError> {
    let tokens = tokenize(text)?;
    let mut conditions = Vec::new();
    let mut iter = tokens.into_iter();

    while let Some(token) = iter.next() {
        let Token::Word(field) = token else {
            return Err(syntax_error(text));
        };

        match iter.next() {
            Some(Token::Equals) => match iter.next() {
                Some(Token::Literal(value)) => conditions.push(Condition::Eq(field, value)),
                _ => return Err(syntax_error(text)),
            },
            Some(Token::Word(keyword)) if keyword.eq_ignore_ascii_case("IN") => {
                if iter.next() != Some(Token::Open) {
                    return Err(syntax_error(text));
                }
                let mut values = HashSet::new();
                loop {
                    match iter.next() {
                        Some(Token::Literal(value)) => {
                            values.insert(value);
                        }
                        _ => return Err(syntax_error(text)),
                    }
                    match iter.next() {
                        Some(Token::Comma) => continue,
                        Some(Token::Close) => break,
                        _ => return Err(syntax_error(text)),
                    }
                }
                conditions.push(Condition::In(field, values));
            }
            _ => return Err(syntax_error(text)),
        }

        match iter.next() {
            None => break,
            Some(Token::Word(keyword)) if keyword.eq_ignore_ascii_case("AND") => {}
            Some(_) => return Err(syntax_error(text)),
        }
    }

    Ok(conditions)
}

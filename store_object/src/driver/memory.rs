//! In-memory driver
//!
//! Parses the literal statements `PersistentRepository` emits with
//! `sqlparser` and runs them against tables held in process memory: `SELECT`
//! (with `WHERE`, `ORDER BY`, `LIMIT`, `OFFSET`), `SELECT COUNT(*)`,
//! `INSERT ... RETURNING`, `UPDATE ... RETURNING` and `DELETE ... RETURNING`.
//! It records every statement it receives and can be told to fail a given
//! insert, which makes it the driver of choice for tests and local
//! development.
//!
//! Each statement is applied in full or not at all. Rows inserted without an
//! `id` column get a random UUID, mirroring the `gen_random_uuid()` default of
//! the real schema. The empty-array literal `'{}'` becomes `[]` only in
//! columns a registered schema declares as arrays.

use super::{Record, SqlDriver, SqlRows};
use crate::errors::DriverError;
use crate::schema::{TableRegistry, TableSchema};
use async_trait::async_trait;
use regex::RegexBuilder;
use serde_json::{Number, Value};
use sqlparser::ast::{
    self as sql_ast, AssignmentTarget, BinaryOperator, Expr, FromTable, LimitClause, ObjectName,
    OrderByKind, SelectItem, SetExpr, Statement, TableFactor, TableWithJoins, UnaryOperator,
};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::{Arc, Mutex, MutexGuard};
use type_mapping::substitute_placeholders;
use uuid::Uuid;

const EMPTY_ARRAY: &str = "{}";

#[derive(Debug, Default)]
struct MemoryState {
    tables: HashMap<String, Vec<Record>>,
    schemas: HashMap<String, Arc<TableSchema>>,
    statements: Vec<String>,
    inserts: usize,
    fail_on_insert: Option<usize>,
}

#[derive(Debug, Default)]
pub struct MemoryDriver {
    state: Mutex<MemoryState>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Driver aware of the column types of every registered table
    pub fn with_registry(registry: &TableRegistry) -> Self {
        let driver = Self::new();
        for name in registry.table_names() {
            if let Some(schema) = registry.get(name) {
                driver.define_table(schema);
            }
        }
        driver
    }

    pub fn define_table(&self, schema: Arc<TableSchema>) {
        self.state()
            .schemas
            .insert(schema.name().to_string(), schema);
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Seed a row directly, bypassing SQL
    pub fn insert_row(&self, table: &str, row: Record) {
        self.state()
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    /// Current contents of a table
    pub fn rows(&self, table: &str) -> Vec<Record> {
        self.state().tables.get(table).cloned().unwrap_or_default()
    }

    /// Every statement executed so far, fully literal
    pub fn statements(&self) -> Vec<String> {
        self.state().statements.clone()
    }

    pub fn last_statement(&self) -> Option<String> {
        self.state().statements.last().cloned()
    }

    /// Make the `n`-th INSERT from now on fail (1-based)
    pub fn fail_on_insert(&self, n: usize) {
        let mut state = self.state();
        state.inserts = 0;
        state.fail_on_insert = Some(n);
    }
}

#[async_trait]
impl SqlDriver for MemoryDriver {
    async fn execute_sql(&self, sql: &str, values: &[Value]) -> Result<SqlRows, DriverError> {
        let sql = if values.is_empty() {
            sql.to_string()
        } else {
            substitute_placeholders(sql, values)
                .map_err(|e| DriverError::Execution(e.to_string()))?
        };

        let statement = parse_statement(&sql)?;

        let mut state = self.state();
        state.statements.push(sql);
        state.execute(statement).map(SqlRows::new)
    }
}

fn parse_statement(sql: &str) -> Result<Statement, DriverError> {
    let mut statements = Parser::parse_sql(&PostgreSqlDialect {}, sql)
        .map_err(|e| DriverError::Execution(format!("syntax error: {}", e)))?;

    match (statements.pop(), statements.is_empty()) {
        (Some(statement), true) => Ok(statement),
        _ => Err(DriverError::Execution(format!(
            "expected exactly one statement: {}",
            sql
        ))),
    }
}

fn unsupported(what: impl Display) -> DriverError {
    DriverError::Execution(format!("unsupported by the in-memory driver: {}", what))
}

impl MemoryState {
    fn execute(&mut self, statement: Statement) -> Result<Vec<Record>, DriverError> {
        match statement {
            Statement::Query(query) => self.select(*query),
            Statement::Insert(insert) => {
                let table = strip_quotes(&insert.table.to_string(), '"');
                let values = match insert.source {
                    None => Vec::new(),
                    Some(source) => {
                        let SetExpr::Values(values) = *source.body else {
                            return Err(unsupported("INSERT without VALUES"));
                        };
                        let mut rows = values.rows.into_iter();
                        match (rows.next(), rows.next()) {
                            (Some(row), None) => row.iter().map(literal).collect::<Result<Vec<_>, _>>()?,
                            _ => return Err(unsupported("multi-row INSERT")),
                        }
                    }
                };
                let columns: Vec<String> = insert.columns.into_iter().map(|ident| ident.value).collect();
                if columns.len() != values.len() {
                    return Err(DriverError::Execution(format!(
                        "INSERT has {} columns but {} values",
                        columns.len(),
                        values.len()
                    )));
                }

                let projection = Projection::returning(insert.returning.as_deref())?;
                self.insert(table, columns, values, &projection)
            }
            Statement::Update {
                table,
                assignments,
                selection,
                returning,
                ..
            } => {
                let table = table_name(&table)?;
                let assignments = assignments
                    .into_iter()
                    .map(|assignment| {
                        let column = match &assignment.target {
                            AssignmentTarget::ColumnName(name) => object_name(name)?,
                            other => return Err(unsupported(format!("assignment to {:?}", other))),
                        };
                        let value = self.coerce(&table, &column, literal(&assignment.value)?);
                        Ok((column, value))
                    })
                    .collect::<Result<Vec<_>, DriverError>>()?;

                let projection = Projection::returning(returning.as_deref())?;
                self.update(&table, &assignments, selection.as_ref(), &projection)
            }
            Statement::Delete(delete) => {
                let tables = match &delete.from {
                    FromTable::WithFromKeyword(tables) | FromTable::WithoutKeyword(tables) => tables,
                };
                let [from] = tables.as_slice() else {
                    return Err(unsupported("DELETE from several tables"));
                };
                let table = table_name(from)?;

                let projection = Projection::returning(delete.returning.as_deref())?;
                self.delete(&table, delete.selection.as_ref(), &projection)
            }
            other => Err(unsupported(format!("statement {}", other))),
        }
    }

    fn select(&self, query: sql_ast::Query) -> Result<Vec<Record>, DriverError> {
        let SetExpr::Select(select) = *query.body else {
            return Err(unsupported("compound query"));
        };
        let [from] = select.from.as_slice() else {
            return Err(unsupported("SELECT without exactly one table"));
        };
        let table = table_name(from)?;
        let mut rows = self.matching(&table, select.selection.as_ref())?;

        if is_count(&select.projection) {
            let mut row = Record::new();
            row.insert("count".to_string(), Value::from(rows.len()));
            return Ok(vec![row]);
        }

        let order_by = sort_keys(query.order_by)?;
        rows.sort_by(|a, b| {
            order_by
                .iter()
                .map(|(key, descending)| {
                    let ordering = sort_cmp(field(a, key), field(b, key));
                    if *descending {
                        ordering.reverse()
                    } else {
                        ordering
                    }
                })
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });

        let (limit, offset) = window(query.limit_clause.as_ref())?;
        Projection::from_items(&select.projection)?
            .rows(rows.iter().skip(offset).take(limit.unwrap_or(usize::MAX)))
    }

    fn insert(
        &mut self,
        table: String,
        columns: Vec<String>,
        values: Vec<Value>,
        projection: &Projection,
    ) -> Result<Vec<Record>, DriverError> {
        self.inserts += 1;
        if self.fail_on_insert == Some(self.inserts) {
            return Err(DriverError::Execution(format!(
                "simulated failure on insert #{} into {}",
                self.inserts, table
            )));
        }

        let mut row = Record::new();
        if !columns.iter().any(|column| column == "id") {
            row.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        for (column, value) in columns.into_iter().zip(values) {
            let value = self.coerce(&table, &column, value);
            row.insert(column, value);
        }

        let returned = projection.rows([&row])?;
        self.tables.entry(table).or_default().push(row);
        Ok(returned)
    }

    fn update(
        &mut self,
        table: &str,
        assignments: &[(String, Value)],
        predicate: Option<&Expr>,
        projection: &Projection,
    ) -> Result<Vec<Record>, DriverError> {
        let rows = self.tables.entry(table.to_string()).or_default();

        let mut changed = Vec::new();
        for (index, row) in rows.iter().enumerate() {
            if matches(row, predicate)? {
                let mut row = row.clone();
                for (column, value) in assignments {
                    row.insert(column.clone(), value.clone());
                }
                changed.push((index, row));
            }
        }

        let returned = projection.rows(changed.iter().map(|(_, row)| row))?;
        for (index, row) in changed {
            rows[index] = row;
        }
        Ok(returned)
    }

    fn delete(
        &mut self,
        table: &str,
        predicate: Option<&Expr>,
        projection: &Projection,
    ) -> Result<Vec<Record>, DriverError> {
        let rows = self.tables.entry(table.to_string()).or_default();

        let doomed = rows
            .iter()
            .map(|row| matches(row, predicate))
            .collect::<Result<Vec<bool>, _>>()?;
        let returned = projection.rows(
            rows.iter()
                .zip(&doomed)
                .filter(|(_, doomed)| **doomed)
                .map(|(row, _)| row),
        )?;

        let mut doomed = doomed.into_iter();
        rows.retain(|_| !doomed.next().unwrap_or(false));
        Ok(returned)
    }

    fn matching(&self, table: &str, predicate: Option<&Expr>) -> Result<Vec<Record>, DriverError> {
        let mut rows = Vec::new();
        for row in self.tables.get(table).into_iter().flatten() {
            if matches(row, predicate)? {
                rows.push(row.clone());
            }
        }
        Ok(rows)
    }

    /// `'{}'` is the empty array in array columns and plain text elsewhere
    fn coerce(&self, table: &str, column: &str, value: Value) -> Value {
        let is_array = self
            .schemas
            .get(table)
            .and_then(|schema| schema.get_column(column))
            .is_some_and(|column| column.kind.is_array());

        match value {
            Value::String(text) if is_array && text == EMPTY_ARRAY => Value::Array(Vec::new()),
            other => other,
        }
    }
}

/// Output columns of a SELECT list or RETURNING clause
#[derive(Debug, PartialEq)]
enum Projection {
    Nothing,
    All,
    Columns(Vec<String>),
}

impl Projection {
    fn from_items(items: &[SelectItem]) -> Result<Self, DriverError> {
        if let [SelectItem::Wildcard(_)] = items {
            return Ok(Projection::All);
        }

        items
            .iter()
            .map(|item| match item {
                SelectItem::UnnamedExpr(expr) => column_name(expr),
                other => Err(unsupported(format!("select item {}", other))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Projection::Columns)
    }

    fn returning(items: Option<&[SelectItem]>) -> Result<Self, DriverError> {
        match items {
            None => Ok(Projection::Nothing),
            Some(items) => Self::from_items(items),
        }
    }

    fn rows<'a>(&self, rows: impl IntoIterator<Item = &'a Record>) -> Result<Vec<Record>, DriverError> {
        match self {
            Projection::Nothing => Ok(Vec::new()),
            Projection::All => Ok(rows.into_iter().cloned().collect()),
            Projection::Columns(columns) => rows.into_iter().map(|row| project(row, columns)).collect(),
        }
    }
}

fn project(row: &Record, columns: &[String]) -> Result<Record, DriverError> {
    columns
        .iter()
        .map(|column| {
            row.get(column)
                .map(|value| (column.clone(), value.clone()))
                .ok_or_else(|| DriverError::Execution(format!("column \"{}\" does not exist", column)))
        })
        .collect()
}

fn is_count(items: &[SelectItem]) -> bool {
    matches!(
        items,
        [SelectItem::UnnamedExpr(Expr::Function(function))]
            if function.name.to_string().eq_ignore_ascii_case("count")
    )
}

fn table_name(table: &TableWithJoins) -> Result<String, DriverError> {
    if !table.joins.is_empty() {
        return Err(unsupported("JOIN"));
    }
    match &table.relation {
        TableFactor::Table { name, .. } => object_name(name),
        other => Err(unsupported(format!("table reference {}", other))),
    }
}

fn object_name(name: &ObjectName) -> Result<String, DriverError> {
    name.0
        .last()
        .map(|part| strip_quotes(&part.to_string(), '"'))
        .ok_or_else(|| DriverError::Execution("empty object name".to_string()))
}

fn column_name(expr: &Expr) -> Result<String, DriverError> {
    match expr {
        Expr::Identifier(ident) => Ok(ident.value.clone()),
        other => Err(unsupported(format!("column expression {}", other))),
    }
}

/// Remove surrounding quotes and undouble embedded ones
fn strip_quotes(text: &str, quote: char) -> String {
    match text.strip_prefix(quote).and_then(|rest| rest.strip_suffix(quote)) {
        Some(inner) => inner.replace(&format!("{0}{0}", quote), &quote.to_string()),
        None => text.to_string(),
    }
}

fn sort_keys(order_by: Option<sql_ast::OrderBy>) -> Result<Vec<(String, bool)>, DriverError> {
    let Some(order_by) = order_by else {
        return Ok(Vec::new());
    };

    match order_by.kind {
        OrderByKind::Expressions(exprs) => exprs
            .iter()
            .map(|order| Ok((column_name(&order.expr)?, order.options.asc == Some(false))))
            .collect(),
        OrderByKind::All(_) => Err(unsupported("ORDER BY ALL")),
    }
}

/// `(limit, offset)` of a query
fn window(limit_clause: Option<&LimitClause>) -> Result<(Option<usize>, usize), DriverError> {
    match limit_clause {
        None => Ok((None, 0)),
        Some(LimitClause::LimitOffset { limit, offset, .. }) => {
            let limit = limit.as_ref().map(row_count).transpose()?;
            let offset = offset
                .as_ref()
                .map(|offset| row_count(&offset.value))
                .transpose()?
                .unwrap_or(0);
            Ok((limit, offset))
        }
        Some(_) => Err(unsupported("LIMIT offset, count")),
    }
}

fn row_count(expr: &Expr) -> Result<usize, DriverError> {
    literal(expr)?
        .as_u64()
        .map(|n| usize::try_from(n).unwrap_or(usize::MAX))
        .ok_or_else(|| DriverError::Execution(format!("LIMIT/OFFSET must be a non-negative integer, got {}", expr)))
}

fn field<'a>(row: &'a Record, column: &str) -> &'a Value {
    row.get(column).unwrap_or(&Value::Null)
}

fn matches(row: &Record, predicate: Option<&Expr>) -> Result<bool, DriverError> {
    predicate.map_or(Ok(true), |expr| truth(row, expr))
}

fn truth(row: &Record, expr: &Expr) -> Result<bool, DriverError> {
    match expr {
        Expr::Nested(inner) => truth(row, inner),
        Expr::UnaryOp {
            op: UnaryOperator::Not,
            expr: inner,
        } => Ok(!truth(row, inner)?),
        Expr::BinaryOp {
            left,
            op: BinaryOperator::And,
            right,
        } => Ok(truth(row, left)? && truth(row, right)?),
        Expr::BinaryOp {
            left,
            op: BinaryOperator::Or,
            right,
        } => Ok(truth(row, left)? || truth(row, right)?),
        Expr::BinaryOp { left, op, right } => compare(&operand(row, left)?, op, &operand(row, right)?),
        Expr::AnyOp {
            left,
            compare_op,
            right,
            ..
        } => {
            let actual = operand(row, left)?;
            let candidates = operand(row, right)?;
            for candidate in as_array(&candidates) {
                if compare(&actual, compare_op, candidate)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Expr::IsNull(inner) => Ok(operand(row, inner)?.is_null()),
        Expr::IsNotNull(inner) => Ok(!operand(row, inner)?.is_null()),
        Expr::IsTrue(inner) => Ok(operand(row, inner)? == Value::Bool(true)),
        Expr::IsNotTrue(inner) => Ok(operand(row, inner)? != Value::Bool(true)),
        Expr::IsFalse(inner) => Ok(operand(row, inner)? == Value::Bool(false)),
        Expr::IsNotFalse(inner) => Ok(operand(row, inner)? != Value::Bool(false)),
        Expr::Like {
            negated,
            expr: text,
            pattern,
            ..
        } => like(row, text, pattern, *negated, false),
        Expr::ILike {
            negated,
            expr: text,
            pattern,
            ..
        } => like(row, text, pattern, *negated, true),
        other => Err(unsupported(format!("predicate {}", other))),
    }
}

fn operand(row: &Record, expr: &Expr) -> Result<Value, DriverError> {
    match expr {
        Expr::Identifier(ident) => Ok(field(row, &ident.value).clone()),
        Expr::Nested(inner) => operand(row, inner),
        other => literal(other),
    }
}

/// Evaluate a constant expression as emitted by the value formatter
fn literal(expr: &Expr) -> Result<Value, DriverError> {
    match expr {
        Expr::Value(value) => scalar(&value.value),
        Expr::Nested(inner) => literal(inner),
        Expr::UnaryOp {
            op: UnaryOperator::Minus,
            expr: inner,
        } => match literal(inner)? {
            Value::Number(n) => negate(&n),
            other => Err(DriverError::Execution(format!("cannot negate {}", other))),
        },
        Expr::Array(array) => array
            .elem
            .iter()
            .map(literal)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Expr::TypedString(sql_ast::TypedString {
            data_type, value, ..
        }) => {
            let text = strip_quotes(&value.to_string(), '\'');
            match data_type {
                sql_ast::DataType::JSON | sql_ast::DataType::JSONB => serde_json::from_str(&text)
                    .map_err(|e| DriverError::Execution(format!("invalid {} literal: {}", data_type, e))),
                _ => Ok(Value::String(text)),
            }
        }
        other => Err(unsupported(format!("expression {}", other))),
    }
}

fn scalar(value: &sql_ast::Value) -> Result<Value, DriverError> {
    match value {
        sql_ast::Value::Null => Ok(Value::Null),
        sql_ast::Value::Boolean(b) => Ok(Value::Bool(*b)),
        sql_ast::Value::SingleQuotedString(text) => Ok(Value::String(text.clone())),
        sql_ast::Value::Number(text, _) => number(text),
        other => Err(unsupported(format!("literal {}", other))),
    }
}

fn number(text: &str) -> Result<Value, DriverError> {
    if let Ok(n) = text.parse::<i64>() {
        return Ok(Value::from(n));
    }
    if let Ok(n) = text.parse::<u64>() {
        return Ok(Value::from(n));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| DriverError::Execution(format!("invalid number {}", text)))
}

fn negate(n: &Number) -> Result<Value, DriverError> {
    if let Some(i) = n.as_i64() {
        return Ok(Value::from(-i));
    }
    n.as_f64()
        .and_then(|f| Number::from_f64(-f))
        .map(Value::Number)
        .ok_or_else(|| DriverError::Execution(format!("cannot negate {}", n)))
}

fn compare(actual: &Value, op: &BinaryOperator, expected: &Value) -> Result<bool, DriverError> {
    let result = match op {
        BinaryOperator::Eq => values_equal(actual, expected),
        BinaryOperator::NotEq => !actual.is_null() && !expected.is_null() && !values_equal(actual, expected),
        BinaryOperator::Gt => compare_values(actual, expected) == Some(Ordering::Greater),
        BinaryOperator::GtEq => matches!(compare_values(actual, expected), Some(Ordering::Greater | Ordering::Equal)),
        BinaryOperator::Lt => compare_values(actual, expected) == Some(Ordering::Less),
        BinaryOperator::LtEq => matches!(compare_values(actual, expected), Some(Ordering::Less | Ordering::Equal)),
        BinaryOperator::AtArrow => contains_all(actual, expected),
        BinaryOperator::ArrowAt => contains_all(expected, actual),
        BinaryOperator::PGOverlap => {
            let haystack = as_array(actual);
            as_array(expected)
                .iter()
                .any(|needle| haystack.iter().any(|item| values_equal(item, needle)))
        }
        other => return Err(unsupported(format!("operator {}", other))),
    };

    Ok(result)
}

fn contains_all(haystack: &Value, needles: &Value) -> bool {
    let haystack = as_array(haystack);
    as_array(needles)
        .iter()
        .all(|needle| haystack.iter().any(|item| values_equal(item, needle)))
}

/// Array elements; `'{}'` and every non-array value have none
fn as_array(value: &Value) -> &[Value] {
    match value {
        Value::Array(items) => items,
        _ => &[],
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(items), Value::String(text)) | (Value::String(text), Value::Array(items)) => {
            items.is_empty() && text == EMPTY_ARRAY
        }
        _ => a == b,
    }
}

fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Ascending order with NULLs last
fn sort_cmp(a: &Value, b: &Value) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => compare_values(a, b).unwrap_or(Ordering::Equal),
    }
}

fn like(row: &Record, text: &Expr, pattern: &Expr, negated: bool, case_insensitive: bool) -> Result<bool, DriverError> {
    let (Value::String(text), Value::String(pattern)) = (operand(row, text)?, operand(row, pattern)?) else {
        return Ok(false);
    };
    Ok(like_match(&text, &pattern, case_insensitive)? != negated)
}

/// `%` and `_` wildcards with backslash escapes, compiled to an anchored regex
fn like_match(text: &str, pattern: &str, case_insensitive: bool) -> Result<bool, DriverError> {
    let mut expression = String::with_capacity(pattern.len() + 2);
    expression.push('^');

    let mut chars = pattern.chars();
    let mut buf = [0u8; 4];
    while let Some(c) = chars.next() {
        match c {
            '%' => expression.push_str(".*"),
            '_' => expression.push('.'),
            '\\' => {
                let escaped = chars.next().unwrap_or('\\');
                expression.push_str(&regex::escape(escaped.encode_utf8(&mut buf)));
            }
            c => expression.push_str(&regex::escape(c.encode_utf8(&mut buf))),
        }
    }
    expression.push('$');

    RegexBuilder::new(&expression)
        .case_insensitive(case_insensitive)
        .dot_matches_new_line(true)
        .build()
        .map(|regex| regex.is_match(text))
        .map_err(|e| DriverError::Execution(format!("invalid LIKE pattern {:?}: {}", pattern, e)))
}

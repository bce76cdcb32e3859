//! Read-only statement guard
//!
//! Off unless the assistant runs in read-only mode. When on, the sanitized SQL
//! must parse as exactly one query statement.

use crate::error::{AssistantError, Result};
use sqlparser::ast::{Query, SetExpr, Statement};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;

#[derive(Debug, Clone, Copy, Default)]
pub struct StatementGuard {
    read_only: bool,
}

impl StatementGuard {
    pub fn new(read_only: bool) -> Self {
        Self { read_only }
    }

    pub fn check(&self, sql: &str) -> Result<()> {
        if !self.read_only {
            return Ok(());
        }

        let statements = Parser::parse_sql(&SQLiteDialect {}, sql)
            .map_err(|e| AssistantError::Guard(format!("could not parse statement: {}", e)))?;

        match statements.as_slice() {
            [Statement::Query(query)] if is_read_only(query) => Ok(()),
            [] => Err(AssistantError::Guard("no statement found".to_string())),
            [_] => Err(AssistantError::Guard(
                "only read-only queries are allowed".to_string(),
            )),
            many => Err(AssistantError::Guard(format!(
                "expected a single statement, found {}",
                many.len()
            ))),
        }
    }
}

/// A query is read-only when its body and every CTE only select
fn is_read_only(query: &Query) -> bool {
    let ctes_read_only = query
        .with
        .as_ref()
        .map(|with| with.cte_tables.iter().all(|cte| is_read_only(&cte.query)))
        .unwrap_or(true);
    ctes_read_only && is_read_only_body(&query.body)
}

fn is_read_only_body(body: &SetExpr) -> bool {
    match body {
        SetExpr::Select(_) | SetExpr::Values(_) => true,
        SetExpr::Query(query) => is_read_only(query),
        SetExpr::SetOperation { left, right, .. } => {
            is_read_only_body(left) && is_read_only_body(right)
        }
        // INSERT/UPDATE bodies behind a WITH clause
        _ => false,
    }
}

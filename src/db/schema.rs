//! Schema introspection
//!
//! Reads table and column metadata from the SQLite catalog and renders it as
//! the text block the SQL-generation prompt is grounded on.

use crate::error::Result;
use rusqlite::Connection;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,

    /// Declared type, empty when the column was declared without one
    pub data_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

/// Tables in catalog order, columns in declared order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub tables: Vec<TableInfo>,
}

impl Schema {
    /// Render the schema as one `Table name ( ... )` block per table
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for table in &self.tables {
            let _ = writeln!(out, "\nTable {} (", table.name);
            for column in &table.columns {
                let _ = writeln!(out, "  {} {},", column.name, column.data_type);
            }
            out.push_str(")\n");
        }
        out
    }
}

/// One catalog query for table names plus one column query per table
pub fn introspect(conn: &Connection) -> Result<Schema> {
    let mut tables_stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
    let names = tables_stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut columns_stmt =
        conn.prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;

    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        let columns = columns_stmt
            .query_map([&name], |row| {
                Ok(ColumnInfo {
                    name: row.get(0)?,
                    data_type: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        tables.push(TableInfo { name, columns });
    }

    Ok(Schema { tables })
}

use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    schema::{Table, parser::Parser},
    storage::engine::Engine as StorageEngine,
    types::{Row, Value},
};

/// Table-level store trait (schema and row operations)
pub trait Store {
    fn create_table(&mut self, table: Table) -> Result<()>;
    fn get_table(&mut self, table_name: &str) -> Result<Option<Table>>;
    /// Lists all relations in the store
    fn tables(&mut self) -> Result<Vec<Table>>;
    /// Appends a row to a table
    fn create_row(&mut self, table_name: &str, row: Row) -> Result<()>;
    /// Scans table rows in insertion order, with an optional column equality filter
    fn scan_table(&mut self, table_name: &str, filter: Option<(String, Value)>) -> Result<Vec<Row>>;

    /// Returns table info, returns error if table doesn't exist
    fn must_get_table(&mut self, table_name: &str) -> Result<Table> {
        self.get_table(table_name)?.ok_or(Error::Internal(format!(
            "table {} does not exist",
            table_name
        )))
    }

    /// Applies a schema definition: creates every relation it declares
    ///
    /// Returns the created table names in declaration order.
    fn apply_schema(&mut self, sql: &str) -> Result<Vec<String>> {
        let mut created = Vec::new();
        for table in Parser::new(sql).parse_schema()? {
            created.push(table.name.clone());
            self.create_table(table)?;
        }
        Ok(created)
    }
}

/// Key-value backed table store
pub struct KvStore<E: StorageEngine> {
    engine: E,
}

impl<E: StorageEngine> KvStore<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    /// Allocates the next row id for a table
    ///
    /// Ids increase monotonically, so appended rows keep their insertion
    /// order and duplicate rows never collide.
    fn next_row_id(&mut self, table_name: &str) -> Result<u64> {
        let key = Key::NextRowId(table_name.to_string()).encode()?;
        let next = match self.engine.get(key.clone())? {
            Some(value) => bincode::deserialize::<u64>(&value)?,
            None => 1,
        };
        self.engine.set(key, bincode::serialize(&(next + 1))?)?;
        Ok(next)
    }
}

impl<E: StorageEngine> Store for KvStore<E> {
    fn create_table(&mut self, table: Table) -> Result<()> {
        if self.get_table(&table.name)?.is_some() {
            return Err(Error::Internal(format!(
                "table {} already exists",
                table.name
            )));
        }
        table.validate()?;

        // Store table schema: key = table name, value = serialized schema
        let key = Key::Table(table.name.clone()).encode()?;
        self.engine.set(key, bincode::serialize(&table)?)?;
        Ok(())
    }

    fn get_table(&mut self, table_name: &str) -> Result<Option<Table>> {
        let key = Key::Table(table_name.to_string()).encode()?;
        Ok(self
            .engine
            .get(key)?
            .map(|v| bincode::deserialize(&v))
            .transpose()?)
    }

    fn tables(&mut self) -> Result<Vec<Table>> {
        let prefix = KeyPrefix::Table.encode()?;
        let mut tables = Vec::new();
        for result in self.engine.scan_prefix(prefix) {
            let (_, value) = result?;
            tables.push(bincode::deserialize(&value)?);
        }
        Ok(tables)
    }

    fn create_row(&mut self, table_name: &str, mut row: Row) -> Result<()> {
        let table = self.must_get_table(table_name)?;

        if row.len() > table.columns.len() {
            return Err(Error::Internal(format!(
                "too many values for table {}",
                table.name
            )));
        }
        // Missing trailing values fall back to column defaults
        for column in table.columns.iter().skip(row.len()) {
            match &column.default {
                Some(default) => row.push(default.clone()),
                None => {
                    return Err(Error::Internal(format!(
                        "no default value for column {}",
                        column.name
                    )));
                }
            }
        }

        // Validate row data types match table schema
        for (column, value) in table.columns.iter().zip(row.iter()) {
            match value.datatype() {
                None if column.nullable => {}
                None => {
                    return Err(Error::Internal(format!(
                        "column {} cannot be null",
                        column.name
                    )));
                }
                Some(datatype) if datatype != column.datatype => {
                    return Err(Error::Internal(format!(
                        "column {} type mismatch",
                        column.name
                    )));
                }
                _ => {}
            }
        }

        // Store row data: key = table name + row id, value = serialized row
        let row_id = self.next_row_id(table_name)?;
        let key = Key::Row(table_name.to_string(), row_id).encode()?;
        self.engine.set(key, bincode::serialize(&row)?)?;
        Ok(())
    }

    fn scan_table(&mut self, table_name: &str, filter: Option<(String, Value)>) -> Result<Vec<Row>> {
        let table = self.must_get_table(table_name)?;
        let filter = match filter {
            Some((column, value)) => Some((table.column_index(&column)?, value)),
            None => None,
        };

        // Use prefix scan to find all rows in the table
        let prefix = KeyPrefix::Row(table_name.to_string()).encode()?;
        let mut rows = Vec::new();
        for result in self.engine.scan_prefix(prefix) {
            let (_, value) = result?;
            let row: Row = bincode::deserialize(&value)?;
            match &filter {
                Some((index, expect)) if row[*index] != *expect => {}
                _ => rows.push(row),
            }
        }
        Ok(rows)
    }
}

/// Key types for KV storage operations
#[derive(Debug, Serialize, Deserialize)]
enum Key {
    Table(String),
    NextRowId(String),
    Row(String, u64),
}

impl Key {
    fn encode(&self) -> Result<Vec<u8>> {
        Ok(keycode().serialize(self)?)
    }
}

/// Key prefix types for prefix scanning
///
/// Enums are serialized as [variant_index][variant_data...], so the variant
/// indices here must line up with those of Key.
#[derive(Debug, Serialize, Deserialize)]
enum KeyPrefix {
    Table,
    #[allow(dead_code)]
    NextRowId,
    Row(String),
}

impl KeyPrefix {
    fn encode(&self) -> Result<Vec<u8>> {
        Ok(keycode().serialize(self)?)
    }
}

/// Bincode options for key encoding
///
/// Big-endian fixed-width integers keep the lexicographic byte order of row
/// keys aligned with numeric row-id order, so scans return insertion order.
fn keycode() -> impl Options {
    bincode::options().with_big_endian().with_fixint_encoding()
}

//! CSV bulk load - fills a relation from a delimited text file
//!
//! Loading is always invoked explicitly; nothing in the crate runs it
//! automatically when a schema is applied.

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use csv::{ReaderBuilder, StringRecord};

use crate::{
    error::{Error, Result},
    schema::{Column, Table},
    store::Store,
    types::{DataType, Row, Value},
};

/// CSV bulk loader for a single relation
///
/// Fields map positionally onto the declared columns. Every record is
/// coerced against the schema before any row is written, so a malformed
/// record rejects the whole file and leaves the relation untouched.
pub struct CsvLoader {
    path: PathBuf,
    delimiter: u8,
    has_headers: bool,
}

impl CsvLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            delimiter: b',',
            has_headers: true,
        }
    }

    /// Sets the field delimiter (comma by default)
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Controls whether the first line is a header to discard (true by default)
    pub fn has_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    /// Loads the file into the named relation, returning the appended row count
    ///
    /// Re-running the same load appends the same rows again; no uniqueness
    /// constraint exists to reject them.
    pub fn load<S: Store>(&self, store: &mut S, table_name: &str) -> Result<usize> {
        let table = store.must_get_table(table_name)?;

        let file = File::open(&self.path)?;
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(self.has_headers)
            // Record lengths are checked against the schema, not the header
            .flexible(true)
            .from_reader(file);

        let mut rows = Vec::new();
        let offset = if self.has_headers { 2 } else { 1 };
        for (i, record) in reader.records().enumerate() {
            let record = record?;
            rows.push(coerce_record(&table, &record, i + offset)?);
        }

        let count = rows.len();
        for row in rows {
            store.create_row(table_name, row)?;
        }
        Ok(count)
    }
}

/// Maps one CSV record positionally onto the table's columns
fn coerce_record(table: &Table, record: &StringRecord, line: usize) -> Result<Row> {
    if record.len() != table.columns.len() {
        return Err(Error::Parse(format!(
            "line {}: expected {} fields, got {}",
            line,
            table.columns.len(),
            record.len()
        )));
    }
    table
        .columns
        .iter()
        .zip(record.iter())
        .map(|(column, field)| coerce_field(column, field, line))
        .collect()
}

/// Parses one field as the column's data type; the empty field becomes NULL
fn coerce_field(column: &Column, field: &str, line: usize) -> Result<Value> {
    if field.is_empty() {
        if !column.nullable {
            return Err(Error::Parse(format!(
                "line {}: column {} cannot be null",
                line, column.name
            )));
        }
        return Ok(Value::Null);
    }

    Ok(match column.datatype {
        DataType::String => Value::String(field.to_string()),
        DataType::Integer => match field.parse() {
            Ok(v) => Value::Integer(v),
            Err(_) => {
                return Err(Error::Parse(format!(
                    "line {}: {} is not an integer for column {}",
                    line, field, column.name
                )));
            }
        },
        DataType::Float => match field.parse() {
            Ok(v) => Value::Float(v),
            Err(_) => {
                return Err(Error::Parse(format!(
                    "line {}: {} is not a number for column {}",
                    line, field, column.name
                )));
            }
        },
        DataType::Boolean => match field.to_ascii_lowercase().as_str() {
            "true" => Value::Boolean(true),
            "false" => Value::Boolean(false),
            _ => {
                return Err(Error::Parse(format!(
                    "line {}: {} is not a boolean for column {}",
                    line, field, column.name
                )));
            }
        },
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::CsvLoader;
    use crate::{
        error::{Error, Result},
        schema::RESTAURANT_DATA_SQL,
        storage::memory::MemoryEngine,
        store::{KvStore, Store},
        types::Value,
    };

    fn store_with_schema() -> Result<KvStore<MemoryEngine>> {
        let mut store = KvStore::new(MemoryEngine::new());
        store.apply_schema(RESTAURANT_DATA_SQL)?;
        Ok(store)
    }

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write csv");
        file
    }

    #[test]
    fn test_load_discards_header() -> Result<()> {
        let mut store = store_with_schema()?;
        let file = csv_file("name,location,cuisine,score,reviews\n\"A\",\"Berlin\",\"Italian\",4.5,120\n");

        let count = CsvLoader::new(file.path()).load(&mut store, "restaurant_data")?;
        assert_eq!(count, 1);

        // The header line is not materialized as data
        let rows = store.scan_table("restaurant_data", None)?;
        assert_eq!(
            rows,
            vec![vec![
                Value::String("A".to_string()),
                Value::String("Berlin".to_string()),
                Value::String("Italian".to_string()),
                Value::Float(4.5),
                Value::Integer(120),
            ]]
        );
        Ok(())
    }

    #[test]
    fn test_load_twice_appends_duplicates() -> Result<()> {
        let mut store = store_with_schema()?;
        let file = csv_file("name,location,cuisine,score,reviews\nA,Berlin,Italian,4.5,120\n");

        let loader = CsvLoader::new(file.path());
        loader.load(&mut store, "restaurant_data")?;
        loader.load(&mut store, "restaurant_data")?;

        // Expected behavior: re-running the load duplicates every row
        let rows = store.scan_table("restaurant_data", None)?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], rows[1]);
        Ok(())
    }

    #[test]
    fn test_load_malformed_score_aborts() -> Result<()> {
        let mut store = store_with_schema()?;
        let file = csv_file(
            "name,location,cuisine,score,reviews\n\
             A,Berlin,Italian,4.5,120\n\
             B,Berlin,Cafe,notanumber,10\n",
        );

        let err = CsvLoader::new(file.path())
            .load(&mut store, "restaurant_data")
            .unwrap_err();
        assert_eq!(
            err,
            Error::Parse(
                "line 3: notanumber is not a number for column Restaurant_score".to_string()
            )
        );

        // Records are coerced before anything is written, so the valid
        // first record is not visible either
        assert!(store.scan_table("restaurant_data", None)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_load_field_count_mismatch() -> Result<()> {
        let mut store = store_with_schema()?;
        let file = csv_file("name,location,cuisine,score,reviews\nA,Berlin,4.5,120\n");

        let err = CsvLoader::new(file.path())
            .load(&mut store, "restaurant_data")
            .unwrap_err();
        assert_eq!(
            err,
            Error::Parse("line 2: expected 5 fields, got 4".to_string())
        );
        Ok(())
    }

    #[test]
    fn test_load_missing_file() -> Result<()> {
        let mut store = store_with_schema()?;
        let err = CsvLoader::new("/nonexistent/listings.csv")
            .load(&mut store, "restaurant_data")
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        Ok(())
    }

    #[test]
    fn test_load_empty_fields_become_null() -> Result<()> {
        let mut store = store_with_schema()?;
        let file = csv_file("name,location,cuisine,score,reviews\nA,,Italian,,120\n");

        CsvLoader::new(file.path()).load(&mut store, "restaurant_data")?;
        let rows = store.scan_table("restaurant_data", None)?;
        assert_eq!(
            rows,
            vec![vec![
                Value::String("A".to_string()),
                Value::Null,
                Value::String("Italian".to_string()),
                Value::Null,
                Value::Integer(120),
            ]]
        );
        Ok(())
    }

    #[test]
    fn test_load_custom_delimiter_without_headers() -> Result<()> {
        let mut store = store_with_schema()?;
        let file = csv_file("A;Berlin;Italian;4.5;120\nB;Kreuzberg;Cafe;4.0;80\n");

        let count = CsvLoader::new(file.path())
            .delimiter(b';')
            .has_headers(false)
            .load(&mut store, "restaurant_data")?;
        assert_eq!(count, 2);

        let rows = store.scan_table("restaurant_data", None)?;
        assert_eq!(rows[0][0], Value::String("A".to_string()));
        assert_eq!(rows[1][1], Value::String("Kreuzberg".to_string()));
        Ok(())
    }

    #[test]
    fn test_load_into_unknown_table() -> Result<()> {
        let mut store = KvStore::new(MemoryEngine::new());
        let file = csv_file("a,b\n1,2\n");
        assert!(
            CsvLoader::new(file.path())
                .load(&mut store, "restaurant_data")
                .is_err()
        );
        Ok(())
    }
}

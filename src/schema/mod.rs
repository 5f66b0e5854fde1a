use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    types::{DataType, Value},
};

mod lexer;
pub mod parser;

/// Table schema definition
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    /// Validates table schema
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(Error::Internal(format!(
                "table {} has no columns",
                self.name
            )));
        }

        for (i, col) in self.columns.iter().enumerate() {
            if self.columns[..i].iter().any(|c| c.name == col.name) {
                return Err(Error::Internal(format!(
                    "duplicate column {} in table {}",
                    col.name, self.name
                )));
            }
        }

        Ok(())
    }

    /// Returns the column index for a given column name
    pub fn column_index(&self, col_name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name == col_name)
            .ok_or(Error::Internal(format!("column {} not found", col_name)))
    }
}

/// Column schema definition
///
/// There is no primary-key or uniqueness concept: every row is independently
/// insertable and duplicate rows are permitted.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub datatype: DataType,
    pub nullable: bool,
    pub default: Option<Value>,
}

/// Schema-definition text for the restaurant listings relation.
///
/// The trailing directive mirrors the container-init load step it replaces.
/// It stays a comment: bulk loading is an explicit operation invoked through
/// `load::CsvLoader`, never implied by the schema.
pub const RESTAURANT_DATA_SQL: &str = "\
CREATE TABLE restaurant_data (
    Restaurant_name VARCHAR,
    Restaurant_location VARCHAR,
    Restaurant_cuisine VARCHAR,
    Restaurant_score FLOAT,
    Number_of_reviews INTEGER
);
-- COPY restaurant_data FROM '/docker-entrypoint-initdb.d/restaurant_listings.csv' DELIMITER ',' CSV HEADER;
";

/// Builds the restaurant listings table schema
///
/// Five columns, all nullable, no constraints of any kind.
pub fn restaurant_data() -> Table {
    let column = |name: &str, datatype| Column {
        name: name.to_string(),
        datatype,
        nullable: true,
        default: Some(Value::Null),
    };

    Table {
        name: "restaurant_data".to_string(),
        columns: vec![
            column("Restaurant_name", DataType::String),
            column("Restaurant_location", DataType::String),
            column("Restaurant_cuisine", DataType::String),
            column("Restaurant_score", DataType::Float),
            column("Number_of_reviews", DataType::Integer),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;

    #[test]
    fn test_restaurant_data_shape() -> Result<()> {
        let table = restaurant_data();
        table.validate()?;

        assert_eq!(table.name, "restaurant_data");
        let names = table
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![
                "Restaurant_name",
                "Restaurant_location",
                "Restaurant_cuisine",
                "Restaurant_score",
                "Number_of_reviews",
            ]
        );

        let datatypes = table.columns.iter().map(|c| c.datatype).collect::<Vec<_>>();
        assert_eq!(
            datatypes,
            vec![
                DataType::String,
                DataType::String,
                DataType::String,
                DataType::Float,
                DataType::Integer,
            ]
        );

        assert!(table.columns.iter().all(|c| c.nullable));
        Ok(())
    }

    #[test]
    fn test_validate_rejects_empty_and_duplicates() {
        let empty = Table {
            name: "empty".to_string(),
            columns: vec![],
        };
        assert!(empty.validate().is_err());

        let mut table = restaurant_data();
        table.columns[1].name = "Restaurant_name".to_string();
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_column_index() -> Result<()> {
        let table = restaurant_data();
        assert_eq!(table.column_index("Restaurant_location")?, 1);
        assert_eq!(table.column_index("Number_of_reviews")?, 4);
        assert!(table.column_index("restaurant_location").is_err());
        Ok(())
    }
}

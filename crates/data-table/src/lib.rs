//! Table is a named, ordered set of typed columns which share a row count.
//! Tables are the unit of encoding: each encodes to, and decodes from,
//! a self-describing Arrow IPC stream.

mod ipc;
mod values;

pub use values::{ElementType, Value, Values};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("row has {got} values but the table has {want} columns")]
    RowArity { got: usize, want: usize },
    #[error("column '{column}' holds {want} values, but was given {got}")]
    ElementType {
        column: String,
        got: ElementType,
        want: ElementType,
    },
    #[error("cannot merge a table of {got} columns into one of {want} columns")]
    ColumnCount { got: usize, want: usize },
    #[error("timestamp {0} is outside of the range representable in nanoseconds")]
    TimeOutOfRange(chrono::DateTime<chrono::Utc>),
    #[error("column '{column}' has unsupported Arrow type {data_type}")]
    UnsupportedType {
        column: String,
        data_type: arrow::datatypes::DataType,
    },
    #[error("expected exactly one record batch in the encoded table, but found {0}")]
    BatchCount(usize),
    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Values,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    /// Human-readable name of the table.
    pub name: String,
    /// Identifier of the query this table answers.
    pub ref_id: String,
    pub columns: Vec<Column>,
}

impl Table {
    /// A Table having no name, columns, or rows.
    pub const fn empty() -> Self {
        Self {
            name: String::new(),
            ref_id: String::new(),
            columns: Vec::new(),
        }
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::empty()
        }
    }

    pub fn with_column(mut self, name: impl Into<String>, values: impl Into<Values>) -> Self {
        self.columns.push(Column {
            name: name.into(),
            values: values.into(),
        });
        self
    }

    /// Number of rows of the Table, which is the length of its columns.
    /// A Table without columns has no rows.
    pub fn rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    /// A copy of this Table having the same name, identifier,
    /// and column names and types, but no rows.
    pub fn empty_copy(&self) -> Self {
        Self {
            name: self.name.clone(),
            ref_id: self.ref_id.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    values: c.values.empty_like(),
                })
                .collect(),
        }
    }

    /// Append a row having one Value per column, in column order.
    /// The row is checked in full before any column is modified,
    /// so a rejected row leaves the Table unchanged.
    pub fn append_row(&mut self, row: Vec<Value>) -> Result<(), Error> {
        if row.len() != self.columns.len() {
            return Err(Error::RowArity {
                got: row.len(),
                want: self.columns.len(),
            });
        }
        for (column, value) in self.columns.iter().zip(row.iter()) {
            let want = column.values.element_type();
            if value.element_type() != want {
                return Err(Error::ElementType {
                    column: column.name.clone(),
                    got: value.element_type(),
                    want,
                });
            }
        }
        for (column, value) in self.columns.iter_mut().zip(row) {
            if let Err(value) = column.values.push(value) {
                return Err(Error::ElementType {
                    column: column.name.clone(),
                    got: value.element_type(),
                    want: column.values.element_type(),
                });
            }
        }
        Ok(())
    }

    /// Append the rows of `other` to this Table, column-for-column in declared order.
    /// Column names of `other` are not consulted, but counts and types must match.
    pub fn append_table(&mut self, other: Table) -> Result<(), Error> {
        if other.columns.len() != self.columns.len() {
            return Err(Error::ColumnCount {
                got: other.columns.len(),
                want: self.columns.len(),
            });
        }
        for (column, incoming) in self.columns.iter().zip(other.columns.iter()) {
            let want = column.values.element_type();
            if incoming.values.element_type() != want {
                return Err(Error::ElementType {
                    column: column.name.clone(),
                    got: incoming.values.element_type(),
                    want,
                });
            }
        }
        for (column, incoming) in self.columns.iter_mut().zip(other.columns) {
            if let Err(values) = column.values.extend(incoming.values) {
                return Err(Error::ElementType {
                    column: column.name.clone(),
                    got: values.element_type(),
                    want: column.values.element_type(),
                });
            }
        }
        Ok(())
    }

    /// Encode this Table as an Arrow IPC stream.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        ipc::encode(self)
    }

    /// Decode a Table from an Arrow IPC stream produced by `encode`.
    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        ipc::decode(buf)
    }
}

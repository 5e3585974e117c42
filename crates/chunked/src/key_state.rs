use crate::{Error, QueryError, MARKER};
use data_table::{Table, Value};

/// Fragment is a pending unit of a KeyState, encoded as one frame of a batch.
#[derive(Debug)]
enum Fragment {
    Marker,
    Table(Table),
}

impl Fragment {
    fn table(&self) -> &Table {
        match self {
            Fragment::Marker => &MARKER,
            Fragment::Table(table) => table,
        }
    }
}

/// KeyState buffers the fragments of a single identifier between flushes.
#[derive(Debug, Default)]
pub(crate) struct KeyState {
    // Fragments in the order they're to be sent.
    fragments: Vec<Fragment>,
    // Index of the fragment which accepts appended rows.
    open: Option<usize>,
    // Is the first fragment an empty copy carried over from the last flush?
    continued: bool,
    error: Option<QueryError>,
}

impl KeyState {
    /// Begin a new table, which is preceded by a MARKER.
    pub fn open_table(&mut self, table: Table) {
        self.fragments.push(Fragment::Marker);
        self.fragments.push(Fragment::Table(table));
        self.open = Some(self.fragments.len() - 1);
    }

    pub fn append_row(&mut self, ref_id: &str, row: Vec<Value>) -> crate::Result<()> {
        let Some(Fragment::Table(table)) = self.open.and_then(|i| self.fragments.get_mut(i)) else {
            return Err(Error::NoOpenFragment(ref_id.to_string()));
        };

        if row.len() != table.columns.len() {
            return Err(Error::FieldArityMismatch {
                ref_id: ref_id.to_string(),
                got: row.len(),
                want: table.columns.len(),
            });
        }

        table.append_row(row).map_err(|source| Error::FieldType {
            ref_id: ref_id.to_string(),
            source,
        })
    }

    pub fn set_error(&mut self, error: QueryError) {
        self.error = Some(error);
    }

    // Fragments which must be delivered by the next flush. A continuation
    // which hasn't received rows is skipped: consumers would read it as a MARKER.
    fn pending(&self) -> impl Iterator<Item = &Table> {
        let skip = match self.fragments.first() {
            Some(first) if self.continued => first.table().rows() == 0,
            _ => false,
        };
        self.fragments.iter().skip(skip as usize).map(Fragment::table)
    }

    /// Encode the pending fragments and error into a batch,
    /// or return None if there's nothing to deliver.
    /// The KeyState is not modified.
    pub fn encode(&self, ref_id: &str) -> crate::Result<Option<proto_data::ChunkedDataResponse>> {
        let frames = self
            .pending()
            .map(|table| {
                table.encode().map_err(|source| Error::EncodingFailure {
                    ref_id: ref_id.to_string(),
                    source,
                })
            })
            .collect::<crate::Result<Vec<_>>>()?;

        if frames.is_empty() && self.error.is_none() {
            return Ok(None);
        }

        let (status, error, error_source) = match &self.error {
            Some(QueryError {
                message,
                status,
                error_source,
            }) => (
                status.0,
                message.clone(),
                error_source
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_default(),
            ),
            None => (0, String::new(), String::new()),
        };

        Ok(Some(proto_data::ChunkedDataResponse {
            ref_id: ref_id.to_string(),
            frames,
            status,
            error,
            error_source,
        }))
    }

    /// Reset after a flush. An open table is continued by an empty copy
    /// of itself, so that further rows extend the same table without a MARKER.
    /// Everything else, including an error, is discarded.
    pub fn reset(&mut self) {
        let continuation = match self.open.and_then(|i| self.fragments.get(i)) {
            Some(Fragment::Table(table)) => Some(table.empty_copy()),
            _ => None,
        };
        *self = Self::default();

        if let Some(table) = continuation {
            self.fragments.push(Fragment::Table(table));
            self.open = Some(0);
            self.continued = true;
        }
    }

    #[cfg(test)]
    fn shape(&self) -> Vec<usize> {
        self.fragments.iter().map(|f| f.table().rows()).collect()
    }
}

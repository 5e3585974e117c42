use super::{Column, Error, Table, Values};
use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Float32Array, Float64Array, Int16Array, Int32Array,
    Int64Array, Int8Array, StringArray, TimestampNanosecondArray, UInt16Array, UInt32Array,
    UInt64Array, UInt8Array,
};
use arrow::datatypes::{
    DataType, Field, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, Schema,
    TimeUnit, TimestampNanosecondType, UInt16Type, UInt32Type, UInt64Type, UInt8Type,
};
use arrow::ipc::reader::StreamReader;
use arrow::ipc::writer::StreamWriter;
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use std::collections::HashMap;
use std::sync::Arc;

// Schema metadata keys which carry the Table's name and identifier.
const META_NAME: &str = "name";
const META_REF_ID: &str = "refId";

pub fn encode(table: &Table) -> Result<Vec<u8>, Error> {
    let mut fields = Vec::with_capacity(table.columns.len());
    let mut arrays = Vec::with_capacity(table.columns.len());

    for column in &table.columns {
        let array = to_array(&column.values)?;
        fields.push(Field::new(&column.name, array.data_type().clone(), false));
        arrays.push(array);
    }

    let metadata = HashMap::from([
        (META_NAME.to_string(), table.name.clone()),
        (META_REF_ID.to_string(), table.ref_id.clone()),
    ]);
    let schema = Arc::new(Schema::new_with_metadata(fields, metadata));

    // An explicit row count is required for tables without columns,
    // and also verifies that every column has the same length.
    let options = RecordBatchOptions::new().with_row_count(Some(table.rows()));
    let batch = RecordBatch::try_new_with_options(schema.clone(), arrays, &options)?;

    let mut buf = Vec::new();
    let mut writer = StreamWriter::try_new(&mut buf, &schema)?;
    writer.write(&batch)?;
    writer.finish()?;
    std::mem::drop(writer);

    Ok(buf)
}

pub fn decode(buf: &[u8]) -> Result<Table, Error> {
    let reader = StreamReader::try_new(std::io::Cursor::new(buf), None)?;
    let schema = reader.schema();
    let mut batches = reader.collect::<Result<Vec<_>, _>>()?;

    let batch = match (batches.pop(), batches.len()) {
        (Some(batch), 0) => batch,
        (None, _) => return Err(Error::BatchCount(0)),
        (Some(_), rest) => return Err(Error::BatchCount(rest + 1)),
    };

    let columns = schema
        .fields()
        .iter()
        .zip(batch.columns())
        .map(|(field, array)| {
            Ok(Column {
                name: field.name().clone(),
                values: from_array(field.name(), array)?,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    let meta = schema.metadata();

    Ok(Table {
        name: meta.get(META_NAME).cloned().unwrap_or_default(),
        ref_id: meta.get(META_REF_ID).cloned().unwrap_or_default(),
        columns,
    })
}

fn to_array(values: &Values) -> Result<ArrayRef, Error> {
    let array: ArrayRef = match values {
        Values::F32(v) => Arc::new(Float32Array::from_iter_values(v.iter().copied())),
        Values::F64(v) => Arc::new(Float64Array::from_iter_values(v.iter().copied())),
        Values::Str(v) => Arc::new(StringArray::from_iter_values(v.iter())),
        Values::I8(v) => Arc::new(Int8Array::from_iter_values(v.iter().copied())),
        Values::I16(v) => Arc::new(Int16Array::from_iter_values(v.iter().copied())),
        Values::I32(v) => Arc::new(Int32Array::from_iter_values(v.iter().copied())),
        Values::I64(v) => Arc::new(Int64Array::from_iter_values(v.iter().copied())),
        Values::U8(v) => Arc::new(UInt8Array::from_iter_values(v.iter().copied())),
        Values::U16(v) => Arc::new(UInt16Array::from_iter_values(v.iter().copied())),
        Values::U32(v) => Arc::new(UInt32Array::from_iter_values(v.iter().copied())),
        Values::U64(v) => Arc::new(UInt64Array::from_iter_values(v.iter().copied())),
        Values::Time(v) => {
            let nanos = v
                .iter()
                .map(|t| t.timestamp_nanos_opt().ok_or(Error::TimeOutOfRange(*t)))
                .collect::<Result<Vec<i64>, Error>>()?;

            Arc::new(TimestampNanosecondArray::from(nanos).with_timezone("UTC"))
        }
        Values::Bool(v) => Arc::new(BooleanArray::from(v.clone())),
    };
    Ok(array)
}

// Null slots are not represented by Values, and read as the type's default.
fn from_array(column: &str, array: &ArrayRef) -> Result<Values, Error> {
    let values = match array.data_type() {
        DataType::Float32 => Values::F32(array.as_primitive::<Float32Type>().values().to_vec()),
        DataType::Float64 => Values::F64(array.as_primitive::<Float64Type>().values().to_vec()),
        DataType::Utf8 => Values::Str(
            array
                .as_string::<i32>()
                .iter()
                .map(|s| s.unwrap_or_default().to_string())
                .collect(),
        ),
        DataType::Int8 => Values::I8(array.as_primitive::<Int8Type>().values().to_vec()),
        DataType::Int16 => Values::I16(array.as_primitive::<Int16Type>().values().to_vec()),
        DataType::Int32 => Values::I32(array.as_primitive::<Int32Type>().values().to_vec()),
        DataType::Int64 => Values::I64(array.as_primitive::<Int64Type>().values().to_vec()),
        DataType::UInt8 => Values::U8(array.as_primitive::<UInt8Type>().values().to_vec()),
        DataType::UInt16 => Values::U16(array.as_primitive::<UInt16Type>().values().to_vec()),
        DataType::UInt32 => Values::U32(array.as_primitive::<UInt32Type>().values().to_vec()),
        DataType::UInt64 => Values::U64(array.as_primitive::<UInt64Type>().values().to_vec()),
        DataType::Timestamp(TimeUnit::Nanosecond, _) => Values::Time(
            array
                .as_primitive::<TimestampNanosecondType>()
                .values()
                .iter()
                .map(|n| chrono::DateTime::from_timestamp_nanos(*n))
                .collect(),
        ),
        DataType::Boolean => Values::Bool(
            array
                .as_boolean()
                .iter()
                .map(|b| b.unwrap_or_default())
                .collect(),
        ),
        data_type => {
            return Err(Error::UnsupportedType {
                column: column.to_string(),
                data_type: data_type.clone(),
            })
        }
    };
    Ok(values)
}

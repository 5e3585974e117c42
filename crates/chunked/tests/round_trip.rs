#[macro_use(quickcheck)]
extern crate quickcheck_macros;

use chunked::{read_all, ChunkedWriter, WriterConfig};
use data_table::{Table, Values};
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

// Each op appends a row to query A or B, first opening a new table
// if asked to or if the query has none yet.
type Op = (bool, bool, u8);

fn model(ops: &[Op]) -> BTreeMap<String, Vec<Values>> {
    let mut out: BTreeMap<String, Vec<Values>> = BTreeMap::new();

    for &(is_b, new_table, value) in ops {
        let tables = out.entry(ref_id(is_b).to_string()).or_default();
        if new_table || tables.is_empty() {
            tables.push(Values::U8(Vec::new()));
        }
        let Some(Values::U8(last)) = tables.last_mut() else {
            unreachable!()
        };
        last.push(value);
    }
    out
}

fn ref_id(is_b: bool) -> &'static str {
    if is_b {
        "B"
    } else {
        "A"
    }
}

async fn write_and_reassemble(
    ops: &[Op],
    max_batch_rows: usize,
) -> BTreeMap<String, Vec<Values>> {
    let (tx, rx) = mpsc::channel(2 * ops.len() + 4);
    let mut writer = ChunkedWriter::new(tx, WriterConfig { max_batch_rows });
    let mut opened = [false, false];

    for (n, &(is_b, new_table, value)) in ops.iter().enumerate() {
        let id = ref_id(is_b);
        if new_table || !opened[is_b as usize] {
            let table = Table::new(format!("table-{n}")).with_column("v", Vec::<u8>::new());
            writer.open_table(id, table).await.unwrap();
            opened[is_b as usize] = true;
        }
        writer.append_row(id, vec![value.into()]).await.unwrap();
    }
    writer.close().await.unwrap();
    std::mem::drop(writer);

    let response = read_all(ReceiverStream::new(rx)).await.unwrap();

    response
        .responses
        .into_iter()
        .map(|(ref_id, response)| {
            assert!(response.failure.is_none(), "{:?}", response.failure);
            let tables = response
                .frames
                .into_iter()
                .map(|mut table| table.columns.remove(0).values)
                .collect();
            (ref_id, tables)
        })
        .collect()
}

#[quickcheck]
fn reassembled_tables_match_written_tables(ops: Vec<Op>, threshold: u8) -> bool {
    let max_batch_rows = 1 + threshold as usize % 16;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let actual = runtime.block_on(write_and_reassemble(&ops, max_batch_rows));

    actual == model(&ops)
}

use chunked::{ChunkedWriter, Error, QueryError, Reassembler, WriterConfig, MARKER};
use data_table::{Table, Value, Values};
use pretty_assertions::assert_eq;
use proto_data::ChunkedDataResponse;
use tokio::sync::mpsc;

type Rx = mpsc::Receiver<tonic::Result<ChunkedDataResponse>>;

fn writer(max_batch_rows: usize) -> (ChunkedWriter, Rx) {
    let (tx, rx) = mpsc::channel(1024);
    (ChunkedWriter::new(tx, WriterConfig { max_batch_rows }), rx)
}

fn drain(rx: &mut Rx) -> Vec<ChunkedDataResponse> {
    let mut out = Vec::new();
    while let Ok(batch) = rx.try_recv() {
        out.push(batch.unwrap());
    }
    out
}

// (column count, row count) of each decoded fragment of each batch.
fn shapes(batches: &[ChunkedDataResponse]) -> Vec<(String, Vec<(usize, usize)>)> {
    batches
        .iter()
        .map(|batch| {
            let frames = batch
                .frames
                .iter()
                .map(|frame| {
                    let table = Table::decode(frame).unwrap();
                    (table.columns.len(), table.rows())
                })
                .collect();
            (batch.ref_id.clone(), frames)
        })
        .collect()
}

fn reassemble(batches: Vec<ChunkedDataResponse>) -> chunked::QueryDataResponse {
    let mut reassembler = Reassembler::new();
    for batch in batches {
        reassembler.push(batch);
    }
    reassembler.finish()
}

fn f32_string_table() -> Table {
    Table::new("series")
        .with_column("value", Vec::<f32>::new())
        .with_column("label", Vec::<String>::new())
}

fn f32_string_row(i: usize) -> Vec<Value> {
    vec![(i as f32).into(), format!("label-{i}").into()]
}

#[tokio::test]
async fn test_threshold_flush_continues_the_same_table() {
    let (mut w, mut rx) = writer(1000);
    w.open_table("A", f32_string_table()).await.unwrap();

    for i in 0..1500 {
        w.append_row("A", f32_string_row(i)).await.unwrap();

        if i == 998 {
            assert!(rx.try_recv().is_err(), "nothing is sent below the threshold");
        }
    }
    let mut batches = drain(&mut rx);
    assert_eq!(batches.len(), 1);
    assert_eq!(w.pending_rows(), 500);

    w.close().await.unwrap();
    batches.extend(drain(&mut rx));

    // The marker appears once, ahead of the opened table, and not at the
    // automatic flush boundary.
    assert_eq!(
        shapes(&batches),
        vec![
            ("A".to_string(), vec![(0, 0), (2, 1000)]),
            ("A".to_string(), vec![(2, 500)]),
        ]
    );
    assert_eq!(Table::decode(&batches[0].frames[0]).unwrap(), MARKER);

    let response = reassemble(batches);
    let a = &response.responses["A"];
    assert_eq!(a.frames.len(), 1);
    assert_eq!(a.rows(), 1500);
    assert_eq!(a.frames[0].name, "series");
    assert_eq!(a.frames[0].ref_id, "A");
    assert_eq!(
        a.frames[0].columns[0].values,
        Values::F32((0..1500).map(|i| i as f32).collect())
    );
}

#[tokio::test]
async fn test_append_without_open_table() {
    let (mut w, mut rx) = writer(10);

    let err = w.append_row("A", f32_string_row(0)).await.unwrap_err();
    assert!(matches!(&err, Error::NoOpenFragment(id) if id == "A"), "{err:?}");

    // An identifier which only saw an error still has no open table.
    w.signal_error("B", "boom").await.unwrap();
    let err = w.append_row("B", f32_string_row(0)).await.unwrap_err();
    assert!(matches!(&err, Error::NoOpenFragment(id) if id == "B"), "{err:?}");

    assert_eq!(w.pending_rows(), 0);
    assert_eq!(drain(&mut rx).len(), 1);
}

#[tokio::test]
async fn test_arity_mismatch_does_not_modify_table() {
    let (mut w, mut rx) = writer(10);
    w.open_table("A", f32_string_table()).await.unwrap();
    w.append_row("A", f32_string_row(1)).await.unwrap();

    let err = w
        .append_row("A", vec![1.0f32.into(), "x".into(), 2i64.into()])
        .await
        .unwrap_err();
    assert!(
        matches!(err, Error::FieldArityMismatch { got: 3, want: 2, .. }),
        "{err:?}"
    );
    assert_eq!(
        err.to_string(),
        "field count mismatch for 'A': got 3, want 2"
    );

    let err = w
        .append_row("A", vec!["x".into(), 1.0f32.into()])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::FieldType { .. }), "{err:?}");
    assert_eq!(w.pending_rows(), 1);

    w.close().await.unwrap();
    let response = reassemble(drain(&mut rx));
    assert_eq!(response.responses["A"].rows(), 1);
}

#[tokio::test]
async fn test_idle_flush_and_close_send_nothing() {
    let (mut w, mut rx) = writer(10);

    w.flush().await.unwrap();
    w.close().await.unwrap();
    assert!(drain(&mut rx).is_empty());

    w.open_table("A", f32_string_table()).await.unwrap();
    w.append_row("A", f32_string_row(0)).await.unwrap();
    w.close().await.unwrap();
    assert_eq!(drain(&mut rx).len(), 1);

    // Closing again, with an open but idle table, is a no-op.
    w.close().await.unwrap();
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_signal_error_flushes_every_identifier() {
    let (mut w, mut rx) = writer(1000);
    w.open_table("A", f32_string_table()).await.unwrap();
    for i in 0..5 {
        w.append_row("A", f32_string_row(i)).await.unwrap();
    }
    assert!(drain(&mut rx).is_empty());

    w.signal_error("B", "boom").await.unwrap();
    let batches = drain(&mut rx);

    assert_eq!(
        shapes(&batches),
        vec![
            ("A".to_string(), vec![(0, 0), (2, 5)]),
            ("B".to_string(), vec![]),
        ]
    );
    assert_eq!(batches[0].error, "");
    assert_eq!(batches[1].error, "boom");
    assert_eq!(batches[1].status, 500);
    assert_eq!(batches[1].error_source, "");

    // A continues to accept rows into the same table.
    w.append_row("A", f32_string_row(5)).await.unwrap();
    w.close().await.unwrap();

    let mut all = batches;
    all.extend(drain(&mut rx));
    let response = reassemble(all);

    let a = &response.responses["A"];
    assert_eq!((a.frames.len(), a.rows(), a.error.as_deref()), (1, 6, None));
    let b = &response.responses["B"];
    assert_eq!((b.frames.len(), b.error.as_deref()), (0, Some("boom")));
}

#[tokio::test]
async fn test_classified_error_is_delivered_inline() {
    let (mut w, mut rx) = writer(1000);
    w.signal_error("B", QueryError::downstream("upstream timed out"))
        .await
        .unwrap();

    let response = reassemble(drain(&mut rx));
    let b = &response.responses["B"];
    assert_eq!(b.status, chunked::Status::BAD_GATEWAY);
    assert_eq!(b.error.as_deref(), Some("upstream timed out"));
    assert_eq!(b.error_source, Some(chunked::ErrorSource::Downstream));
}

#[tokio::test]
async fn test_idle_continuation_is_not_sent() {
    let (mut w, mut rx) = writer(4);
    w.open_table("A", f32_string_table()).await.unwrap();
    w.open_table("B", f32_string_table()).await.unwrap();

    for i in 0..2 {
        w.append_row("A", f32_string_row(i)).await.unwrap();
    }
    for i in 0..6 {
        w.append_row("B", f32_string_row(i)).await.unwrap();
    }
    for i in 2..4 {
        w.append_row("A", f32_string_row(i)).await.unwrap();
    }
    w.close().await.unwrap();

    let batches = drain(&mut rx);
    assert_eq!(
        shapes(&batches),
        vec![
            ("A".to_string(), vec![(0, 0), (2, 2)]),
            ("B".to_string(), vec![(0, 0), (2, 2)]),
            // A received no rows during this cycle, and is skipped.
            ("B".to_string(), vec![(2, 4)]),
            ("A".to_string(), vec![(2, 2)]),
        ]
    );

    let response = reassemble(batches);
    assert_eq!(response.responses["A"].frames.len(), 1);
    assert_eq!(response.responses["A"].rows(), 4);
    assert_eq!(response.responses["B"].frames.len(), 1);
    assert_eq!(response.responses["B"].rows(), 6);
}

#[tokio::test]
async fn test_multiple_tables_of_one_identifier() {
    let (mut w, mut rx) = writer(2);

    let first = Table::new("first").with_column("n", Vec::<i64>::new());
    let second = Table::new("second")
        .with_column("s", Vec::<String>::new())
        .with_column("b", Vec::<bool>::new());

    w.open_table("A", first).await.unwrap();
    for n in 0..3i64 {
        w.append_row("A", vec![n.into()]).await.unwrap();
    }
    w.open_table("A", second).await.unwrap();
    w.append_row("A", vec!["x".into(), true.into()]).await.unwrap();
    w.append_row("A", vec!["y".into(), false.into()]).await.unwrap();
    w.close().await.unwrap();

    let response = reassemble(drain(&mut rx));
    let a = &response.responses["A"];
    assert_eq!(
        a.frames
            .iter()
            .map(|t| (t.name.as_str(), t.rows()))
            .collect::<Vec<_>>(),
        vec![("first", 3), ("second", 2)]
    );
    assert_eq!(a.frames[0].columns[0].values, Values::I64(vec![0, 1, 2]));
    assert_eq!(a.frames[1].columns[1].values, Values::Bool(vec![true, false]));
}

#[tokio::test]
async fn test_table_opened_with_rows_counts_toward_threshold() {
    let (mut w, mut rx) = writer(3);

    let mut table = f32_string_table().with_column("extra", Vec::<u8>::new());
    for i in 0..3 {
        table
            .append_row(vec![(i as f32).into(), "x".into(), (i as u8).into()])
            .unwrap();
    }
    w.open_table("A", table).await.unwrap();

    assert_eq!(w.pending_rows(), 0);
    assert_eq!(shapes(&drain(&mut rx)), vec![("A".to_string(), vec![(0, 0), (3, 3)])]);
}

#[tokio::test]
async fn test_encoding_failure_sends_nothing() {
    let (mut w, mut rx) = writer(1000);
    w.open_table("A", f32_string_table()).await.unwrap();
    w.append_row("A", f32_string_row(0)).await.unwrap();

    // Columns of unequal length cannot be encoded.
    let ragged = Table::new("ragged")
        .with_column("a", vec![1i32, 2])
        .with_column("b", vec![1i32]);
    w.open_table("Z", ragged).await.unwrap();

    let err = w.flush().await.unwrap_err();
    assert!(
        matches!(&err, Error::EncodingFailure { ref_id, .. } if ref_id == "Z"),
        "{err:?}"
    );
    // A was encoded before Z failed, but nothing may be sent.
    assert!(drain(&mut rx).is_empty());
    assert_eq!(w.pending_rows(), 3);
}

#[tokio::test]
async fn test_closed_receiver_fails_fast() {
    let (mut w, rx) = writer(1);
    std::mem::drop(rx);

    w.open_table("A", f32_string_table()).await.unwrap();
    let err = w.append_row("A", f32_string_row(0)).await.unwrap_err();

    let Error::TransportFailure(status) = err else {
        panic!("expected a transport failure, not {err:?}");
    };
    assert_eq!(status.code(), tonic::Code::Cancelled);
}

#[tokio::test]
async fn test_slow_receiver_applies_backpressure() {
    let (tx, mut rx) = mpsc::channel(1);
    let mut w = ChunkedWriter::new(tx, WriterConfig { max_batch_rows: 1 });

    let producer = tokio::spawn(async move {
        w.open_table("A", f32_string_table()).await?;
        for i in 0..3 {
            w.append_row("A", f32_string_row(i)).await?;
        }
        w.close().await
    });

    // One batch fits in the channel. The second blocks the producer.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(!producer.is_finished());

    let mut batches = Vec::new();
    while let Some(batch) = rx.recv().await {
        batches.push(batch.unwrap());
    }
    producer.await.unwrap().unwrap();

    assert_eq!(batches.len(), 3);
    assert_eq!(reassemble(batches).responses["A"].rows(), 3);
}

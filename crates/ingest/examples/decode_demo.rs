use ingest::{decode, DecodeError, IngestConfig, RecordSchema};

fn main() {
    let schema = RecordSchema::new(4);
    let config = IngestConfig::default().with_max_batch_records(Some(2));

    let keyed = br#"{"7": {"pixels": [0.0, 0.25, 0.5, 1.0], "label": "3"}, "8": {"pixels": [1, 1, 0, 0]}}"#;
    match decode(keyed, &schema, &config) {
        Ok(records) => println!("{records:#?}"),
        Err(err) => eprintln!("decode failed: {err}"),
    }

    let short = br#"[{"identifier": 9, "pixels": [0.0, 1.0]}]"#;
    match decode(short, &schema, &config) {
        Err(DecodeError::InvalidRecord {
            index,
            identifier,
            source,
        }) => println!(
            "record {index} (identifier {identifier:?}) rejected at `{}`: {source}",
            source.field().unwrap_or("?")
        ),
        other => println!("unexpected: {other:?}"),
    }
}

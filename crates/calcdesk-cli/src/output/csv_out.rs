use serde_json::{Map, Value};
use std::io;

use super::{plain, split_result};

/// Write CSV to stdout.
///
/// Results that carry a schedule are written as one row per schedule entry;
/// otherwise a two-column `field,value` listing of the result.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let outcome = match value.get("result") {
        Some(Value::Object(result)) => write_result(&mut wtr, result),
        _ => match value {
            Value::Array(rows) => write_rows(&mut wtr, rows),
            _ => wtr.write_record([plain(value, "")]),
        },
    };

    if let Err(e) = outcome.and_then(|_| wtr.flush().map_err(csv::Error::from)) {
        eprintln!("CSV write error: {e}");
    }
}

fn write_result<W: io::Write>(wtr: &mut csv::Writer<W>, result: &Map<String, Value>) -> csv::Result<()> {
    let (scalars, row_sets) = split_result(result);

    // Only the first row set fits a single CSV stream
    if let Some((_, rows)) = row_sets.first() {
        return write_rows(wtr, rows);
    }

    wtr.write_record(["field", "value"])?;
    for (key, val) in scalars {
        wtr.write_record([key, &plain(val, "")])?;
    }
    Ok(())
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) -> csv::Result<()> {
    let Some(Value::Object(first)) = rows.first() else {
        return Ok(());
    };

    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    wtr.write_record(&headers)?;
    for row in rows.iter().filter_map(Value::as_object) {
        let record: Vec<String> = headers
            .iter()
            .map(|h| row.get(*h).map(|v| plain(v, "")).unwrap_or_default())
            .collect();
        wtr.write_record(&record)?;
    }
    Ok(())
}

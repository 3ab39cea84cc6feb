// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use chrono::{DateTime, Local, NaiveDateTime};
use clap::{Parser, ValueEnum};
use csv::{ReaderBuilder, Trim, Writer};
use log::{info, warn};
use points_ledger::{Balances, Engine, Transaction};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;

/// Points Ledger - Spend loyalty points oldest first
///
/// Reads earn and spend transactions from a CSV file, withdraws the
/// requested points and prints what is left per payer.
#[derive(Parser, Debug)]
#[command(name = "points-ledger")]
#[command(about = "Spends loyalty points oldest first and reports remaining balances", long_about = None)]
struct Args {
    /// Number of points to withdraw
    #[arg(value_name = "POINTS")]
    points: u64,

    /// Path to CSV file with transactions
    ///
    /// Expected format: payer,points,timestamp
    /// Example: cargo run -- 5000 transactions.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Timestamp of the withdrawal (defaults to now)
    #[arg(long, value_name = "TIMESTAMP", value_parser = parse_timestamp)]
    at: Option<NaiveDateTime>,

    /// Output format for the remaining balances
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// `{PAYER: points, ...}`
    Text,
    /// `payer,points` rows with a header
    Csv,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Parse command line arguments
    let args = Args::parse();

    // Open input file
    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    // Load file transactions into a fresh engine
    let mut engine = match process_transactions(BufReader::new(file)) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error processing transactions: {}", e);
            process::exit(1);
        }
    };

    // The caller's withdrawal always goes last
    let at = args.at.unwrap_or_else(|| Local::now().naive_local());
    if let Err(e) = engine.withdraw(args.points, at) {
        eprintln!("Error recording withdrawal: {}", e);
        process::exit(1);
    }

    let balances = match engine.settle() {
        Ok(balances) => balances,
        Err(e) if e.is_guard_failure() => {
            // Guard failures are an answer, not a crash
            println!("{}", e);
            return;
        }
        Err(e) => {
            eprintln!("Error settling ledger: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = write_balances(&balances, args.format, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

/// Raw CSV record, read by position: `payer, points, timestamp`.
#[derive(Debug, Deserialize)]
struct CsvRecord(String, i64, String);

impl CsvRecord {
    /// Converts CSV record to a Transaction.
    ///
    /// Returns `None` when the timestamp cannot be parsed.
    fn into_transaction(self) -> Option<Transaction> {
        let CsvRecord(payer, points, timestamp) = self;
        let timestamp = parse_timestamp(&timestamp).ok()?;
        Some(Transaction::new(payer, points, timestamp))
    }
}

/// Parses an ISO-8601 date-time.
///
/// Seconds are optional. An offset such as `Z` or `+02:00` is accepted and
/// dropped, keeping the wall-clock time as written.
fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    let raw = raw.trim().trim_matches('"');
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M%#z"))
        .map(|dt| dt.naive_local())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
}

/// Process transactions from a CSV reader.
///
/// The first row is a header and is skipped. Rows that fail to parse, or
/// that the ledger rejects, are logged and skipped.
///
/// # CSV Format
///
/// ```csv
/// payer,points,timestamp
/// DANNON,1000,2020-11-02T14:00:00Z
/// UNILEVER,200,2020-10-31T11:00:00Z
/// DANNON,-200,2020-10-31T15:00:00Z
/// ```
///
/// # Errors
///
/// Returns a CSV error only if the underlying reader fails.
fn process_transactions<R: Read>(reader: R) -> Result<Engine, csv::Error> {
    let mut engine = Engine::new();

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .has_headers(true)
        .from_reader(reader);

    for (line, result) in rdr.deserialize::<CsvRecord>().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e),
            Err(e) => {
                warn!("Skipping malformed row {}: {}", line + 2, e);
                continue;
            }
        };

        let Some(tx) = record.into_transaction() else {
            warn!("Skipping row {}: unparseable timestamp", line + 2);
            continue;
        };

        if let Err(e) = engine.record(tx) {
            warn!("Skipping row {}: {}", line + 2, e);
        }
    }

    info!(
        "Loaded {} earn and {} spend transaction(s)",
        engine.ledger().earn_count(),
        engine.ledger().spends().len()
    );
    Ok(engine)
}

/// Write the balances in the requested format.
fn write_balances<W: Write>(
    balances: &Balances,
    format: Format,
    mut writer: W,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        Format::Text => writeln!(writer, "{}", balances)?,
        Format::Csv => {
            let mut wtr = Writer::from_writer(writer);
            for row in balances {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn at(raw: &str) -> NaiveDateTime {
        parse_timestamp(raw).unwrap()
    }

    #[test]
    fn parse_timestamp_with_and_without_offset() {
        assert_eq!(at("2020-11-02T14:00:00Z"), at("2020-11-02T14:00:00"));
        assert_eq!(at("2020-11-02T14:00:00+02:00"), at("2020-11-02T14:00:00"));
        assert_eq!(at("\"2020-11-02T14:00:00Z\""), at("2020-11-02T14:00:00"));
        assert!(at("2020-11-02T14:00:00.250") > at("2020-11-02T14:00:00"));
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn parse_timestamp_without_seconds() {
        assert_eq!(at("2020-11-02T14:00"), at("2020-11-02T14:00:00"));
        assert_eq!(at("2020-11-02T14:00Z"), at("2020-11-02T14:00:00"));
        assert_eq!(at("2020-11-02T14:00+02:00"), at("2020-11-02T14:00:00"));
        assert!(parse_timestamp("2020-11-02T14").is_err());
    }

    #[test]
    fn rows_without_seconds_are_kept() {
        let csv = "payer,points,timestamp\n\
                   DANNON,300,2020-10-31T10:00\n\
                   UNILEVER,200,2020-10-31T11:00:00Z\n\
                   KRAFT,50,2020-10-31T09:30Z\n";
        let engine = process_transactions(Cursor::new(csv)).unwrap();

        assert_eq!(engine.ledger().earn_count(), 3);
        assert_eq!(engine.ledger().earned_total(), 550);
    }

    #[test]
    fn parse_quoted_rows() {
        let csv = "\"payer\",\"points\",\"timestamp\"\n\
                   \"DANNON\",1000,\"2020-11-02T14:00:00Z\"\n\
                   \"UNILEVER\",200,\"2020-10-31T11:00:00Z\"\n";
        let engine = process_transactions(Cursor::new(csv)).unwrap();

        assert_eq!(engine.ledger().earn_count(), 2);
        assert_eq!(engine.ledger().earned_total(), 1200);
    }

    #[test]
    fn negative_rows_become_spends() {
        let csv = "payer,points,timestamp\n\
                   DANNON,300,2020-10-31T10:00:00Z\n\
                   DANNON,-200,2020-10-31T15:00:00Z\n";
        let engine = process_transactions(Cursor::new(csv)).unwrap();

        assert_eq!(engine.ledger().earn_count(), 1);
        assert_eq!(engine.ledger().spent_total(), 200);
    }

    #[test]
    fn skip_malformed_rows() {
        let csv = "payer,points,timestamp\n\
                   DANNON,300,2020-10-31T10:00:00Z\n\
                   UNILEVER,lots,2020-10-31T11:00:00Z\n\
                   MILLER COORS,10000,not-a-date\n\
                   ,50,2020-10-31T12:00:00Z\n\
                   KRAFT,0,2020-10-31T12:00:00Z\n\
                   DANNON,100,2020-11-01T10:00:00Z\n";
        let engine = process_transactions(Cursor::new(csv)).unwrap();

        assert_eq!(engine.ledger().earn_count(), 2);
        assert_eq!(engine.ledger().earned_total(), 400);
    }

    #[test]
    fn settles_sample_file() {
        let csv = "payer,points,timestamp\n\
                   DANNON,1000,2020-11-02T14:00:00Z\n\
                   UNILEVER,200,2020-10-31T11:00:00Z\n\
                   DANNON,-200,2020-10-31T15:00:00Z\n\
                   MILLER COORS,10000,2020-11-01T14:00:00Z\n\
                   DANNON,300,2020-10-31T10:00:00Z\n";
        let mut engine = process_transactions(Cursor::new(csv)).unwrap();
        engine.withdraw(5000, at("2020-11-03T00:00:00")).unwrap();
        let balances = engine.settle().unwrap();

        assert_eq!(balances.get("DANNON"), Some(1000));
        assert_eq!(balances.get("UNILEVER"), Some(0));
        assert_eq!(balances.get("MILLER COORS"), Some(5300));
    }

    #[test]
    fn write_text_format() {
        let csv = "payer,points,timestamp\nDANNON,10,2020-10-31T10:00:00Z\n";
        let mut engine = process_transactions(Cursor::new(csv)).unwrap();
        engine.withdraw(3, at("2020-11-01T00:00:00")).unwrap();
        let balances = engine.settle().unwrap();

        let mut output = Vec::new();
        write_balances(&balances, Format::Text, &mut output).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "{DANNON: 7}\n");
    }

    #[test]
    fn write_csv_format() {
        let csv = "payer,points,timestamp\n\
                   DANNON,10,2020-10-31T10:00:00Z\n\
                   UNILEVER,5,2020-10-30T10:00:00Z\n";
        let mut engine = process_transactions(Cursor::new(csv)).unwrap();
        engine.withdraw(5, at("2020-11-01T00:00:00")).unwrap();
        let balances = engine.settle().unwrap();

        let mut output = Vec::new();
        write_balances(&balances, Format::Csv, &mut output).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "payer,points\nDANNON,10\nUNILEVER,0\n"
        );
    }
}

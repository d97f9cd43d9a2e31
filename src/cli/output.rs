//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::cli::args::{OutputFormat, TesseraArgs};
use crate::error::Result;

/// Result of a query that produces one posting set.
#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResult {
    pub series_id: u64,
    pub index_rule_id: u32,
    pub total_items: u64,
    pub items: Vec<u64>,
    pub duration_ms: u64,
}

/// One term and its items.
#[derive(Debug, Serialize, Deserialize)]
pub struct TermEntry {
    pub term: String,
    pub items: Vec<u64>,
}

/// Result of a term scan.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScanResult {
    pub series_id: u64,
    pub index_rule_id: u32,
    pub order: String,
    pub terms: Vec<TermEntry>,
    pub duration_ms: u64,
}

/// Write a query result in the requested format.
pub fn output_query(message: &str, result: &QueryResult, args: &TesseraArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Json => output_json(result, args),
        OutputFormat::Human => {
            if args.verbosity() > 0 {
                println!("{message}");
                println!();
            }
            println!(
                "Field {}/{}: {} items",
                result.series_id, result.index_rule_id, result.total_items
            );
            println!("{}", join_items(&result.items));
            if args.verbosity() > 1 {
                println!("Query time: {}ms", result.duration_ms);
            }
            Ok(())
        }
    }
}

/// Write a scan result in the requested format.
pub fn output_scan(message: &str, result: &ScanResult, args: &TesseraArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Json => output_json(result, args),
        OutputFormat::Human => {
            if args.verbosity() > 0 {
                println!("{message}");
                println!();
            }
            for entry in &result.terms {
                println!("{:<24} {}", entry.term, join_items(&entry.items));
            }
            if args.verbosity() > 1 {
                println!();
                println!("{} terms, scan time: {}ms", result.terms.len(), result.duration_ms);
            }
            Ok(())
        }
    }
}

fn output_json<T: Serialize>(result: &T, args: &TesseraArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    println!("{json}");
    Ok(())
}

fn join_items(items: &[u64]) -> String {
    items
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_items() {
        assert_eq!(join_items(&[1, 2, 3]), "1, 2, 3");
        assert_eq!(join_items(&[]), "");
    }

    #[test]
    fn test_query_result_serialization() {
        let result = QueryResult {
            series_id: 1,
            index_rule_id: 2,
            total_items: 2,
            items: vec![4, 5],
            duration_ms: 0,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["items"], serde_json::json!([4, 5]));
        assert_eq!(json["total_items"], 2);
    }
}

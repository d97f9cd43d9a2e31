//! Command implementations for the Tessera CLI.

use std::time::Instant;

use log::info;

use crate::cli::args::*;
use crate::cli::fixture::Fixture;
use crate::cli::output::*;
use crate::error::{Result, TesseraError};
use crate::index::config::IndexConfig;
use crate::index::field::{Field, FieldKey, RangeOpts, SortOrder};
use crate::index::search::{LsmIndex, Searcher};
use crate::schema::term::TermMetadata;

/// Execute a CLI command.
pub fn execute_command(args: TesseraArgs) -> Result<()> {
    match &args.command {
        Command::MatchTerms(match_args) => match_terms(match_args, &args),
        Command::MatchField(match_args) => match_field(match_args, &args),
        Command::Range(range_args) => range(range_args, &args),
        Command::Scan(scan_args) => scan(scan_args, &args),
    }
}

/// Load the index described by the field arguments.
pub fn open_index(field: &FieldArgs) -> Result<LsmIndex> {
    let config = match &field.config {
        Some(path) => IndexConfig::from_file(path)?,
        None => IndexConfig::default(),
    };
    info!(
        "loading fixture {} into index {}",
        field.store.display(),
        config.name
    );
    Fixture::from_file(&field.store)?.into_index(config)
}

/// Convert textual bounds into term range options.
pub fn range_opts(bounds: &BoundArgs, metadata: &TermMetadata) -> Result<RangeOpts> {
    let mut opts = RangeOpts::all();
    if let Some(lower) = &bounds.lower {
        opts = opts.lower(metadata.parse_term(lower)?, !bounds.exclude_lower);
    }
    if let Some(upper) = &bounds.upper {
        opts = opts.upper(metadata.parse_term(upper)?, !bounds.exclude_upper);
    }
    Ok(opts)
}

fn field_key(field: &FieldArgs) -> FieldKey {
    FieldKey::new(field.series, field.rule)
}

fn match_terms(args: &MatchTermsArgs, cli_args: &TesseraArgs) -> Result<()> {
    let index = open_index(&args.field)?;
    let key = field_key(&args.field);
    let term = index.term_metadata().parse_term(&args.term)?;

    let start = Instant::now();
    let list = index.match_terms(&Field::new(key, term))?;

    let result = QueryResult {
        series_id: key.series_id,
        index_rule_id: key.index_rule_id,
        total_items: list.len(),
        items: list.to_vec(),
        duration_ms: start.elapsed().as_millis() as u64,
    };
    output_query(&format!("Items matching term {:?}", args.term), &result, cli_args)
}

fn match_field(args: &MatchFieldArgs, cli_args: &TesseraArgs) -> Result<()> {
    let index = open_index(&args.field)?;
    let key = field_key(&args.field);

    let start = Instant::now();
    let list = index.match_field(&key)?;

    let result = QueryResult {
        series_id: key.series_id,
        index_rule_id: key.index_rule_id,
        total_items: list.len(),
        items: list.to_vec(),
        duration_ms: start.elapsed().as_millis() as u64,
    };
    output_query("Items with any term", &result, cli_args)
}

fn range(args: &RangeArgs, cli_args: &TesseraArgs) -> Result<()> {
    let index = open_index(&args.field)?;
    let key = field_key(&args.field);
    let opts = range_opts(&args.bounds, index.term_metadata())?;

    let start = Instant::now();
    let list = index.range(&key, &opts)?;

    let result = QueryResult {
        series_id: key.series_id,
        index_rule_id: key.index_rule_id,
        total_items: list.len(),
        items: list.to_vec(),
        duration_ms: start.elapsed().as_millis() as u64,
    };
    output_query("Items in term range", &result, cli_args)
}

fn scan(args: &ScanArgs, cli_args: &TesseraArgs) -> Result<()> {
    let index = open_index(&args.field)?;
    let key = field_key(&args.field);
    let opts = range_opts(&args.bounds, index.term_metadata())?;
    let order = SortOrder::from(args.order);
    let metadata = *index.term_metadata();

    let start = Instant::now();
    let terms = collect_terms(&index, &key, &opts, order, args.limit, &metadata)?;

    let result = ScanResult {
        series_id: key.series_id,
        index_rule_id: key.index_rule_id,
        order: format!("{order:?}").to_lowercase(),
        terms,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    output_scan("Terms", &result, cli_args)
}

/// Walk the field term by term, stopping after `limit` terms.
///
/// The iterator is closed on every path and a close failure is reported
/// together with any traversal failure.
pub fn collect_terms(
    index: &LsmIndex,
    key: &FieldKey,
    opts: &RangeOpts,
    order: SortOrder,
    limit: Option<usize>,
    metadata: &TermMetadata,
) -> Result<Vec<TermEntry>> {
    let mut iter = index.iterator(key, opts, order)?;

    let mut terms = Vec::new();
    let mut errors = Vec::new();
    while limit.is_none_or(|limit| terms.len() < limit) {
        match iter.next() {
            Ok(true) => {
                if let Some(value) = iter.take_val() {
                    terms.push(TermEntry {
                        term: metadata.format_term(&value.term),
                        items: value.value.to_vec(),
                    });
                }
            }
            Ok(false) => break,
            Err(e) => {
                errors.push(e);
                break;
            }
        }
    }
    if let Err(e) = iter.close() {
        errors.push(e);
    }
    TesseraError::aggregate(errors)?;
    Ok(terms)
}

//! CSV expense import
//!
//! Expected header: `date,amount,category[,merchant]` (any column order,
//! header names are case-insensitive). Rows are validated here so the engine
//! only ever sees non-negative amounts and non-empty categories.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use csv::{ReaderBuilder, StringRecord};
use std::io::Read;
use tracing::{debug, info};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::NewExpense;

/// Hour assigned to rows that carry a date but no time
pub const DEFAULT_IMPORT_HOUR: u32 = 12;

struct Columns {
    date: usize,
    amount: usize,
    category: usize,
    merchant: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let required = |name: &str| {
            find(name).ok_or_else(|| Error::Import(format!("Missing '{}' column in header", name)))
        };

        Ok(Self {
            date: required("date")?,
            amount: required("amount")?,
            category: required("category")?,
            merchant: find("merchant"),
        })
    }
}

/// Parse an expense CSV into validated expenses
///
/// The first bad row fails the whole parse with an error naming its line.
pub fn parse_expenses_csv<R: Read>(reader: R) -> Result<Vec<NewExpense>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = Columns::from_headers(rdr.headers()?)?;
    let mut expenses = Vec::new();

    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let expense = parse_row(&record, &columns)
            .map_err(|e| Error::Import(format!("line {}: {}", line, e)))?;
        expenses.push(expense);
    }

    debug!("Parsed {} expenses", expenses.len());
    Ok(expenses)
}

/// Parse and store an expense CSV for a user in one transaction
pub fn import_expenses<R: Read>(db: &Database, user_id: i64, reader: R) -> Result<usize> {
    let expenses = parse_expenses_csv(reader)?;
    let count = db.insert_expenses(user_id, &expenses)?;
    info!(user_id, count, "Expenses imported");
    Ok(count)
}

fn parse_row(record: &StringRecord, columns: &Columns) -> std::result::Result<NewExpense, String> {
    let field = |i: usize, name: &str| {
        record
            .get(i)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| format!("missing {}", name))
    };

    let date = parse_datetime(field(columns.date, "date")?)?;
    let amount = parse_amount(field(columns.amount, "amount")?)?;
    let category = field(columns.category, "category")?;

    let mut expense = NewExpense::new(date, amount, category);
    if let Some(merchant) = columns
        .merchant
        .and_then(|i| record.get(i))
        .filter(|s| !s.is_empty())
    {
        expense = expense.with_merchant(merchant);
    }

    expense.validate().map_err(|e| e.to_string())?;
    Ok(expense)
}

/// Parse a timestamp; date-only values get [`DEFAULT_IMPORT_HOUR`]
pub fn parse_datetime(s: &str) -> std::result::Result<NaiveDateTime, String> {
    let s = s.trim();

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }

    let noon = NaiveTime::from_hms_opt(DEFAULT_IMPORT_HOUR, 0, 0)
        .ok_or_else(|| "invalid default hour".to_string())?;
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|d| d.and_time(noon))
        .map_err(|_| format!("unable to parse date: {}", s))
}

/// Parse an amount, ignoring currency symbols and thousands separators
fn parse_amount(s: &str) -> std::result::Result<f64, String> {
    let cleaned = s.trim().replace(['$', '₹', ',', ' '], "");
    cleaned
        .parse::<f64>()
        .map_err(|_| format!("unable to parse amount: {}", s))
}

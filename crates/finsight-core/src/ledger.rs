//! CSV-backed ledger store
//!
//! The whole ledger lives in memory and is written back to its backing file
//! in full after every append. Column layout:
//!
//! ```text
//! Date,Category,Note,Income/Expense,Amount
//! ```
//!
//! Loading is lenient about values: unreadable dates and amounts become
//! missing, and entry types are read the way model replies are. Structure is
//! strict: every column must be present and every row needs an entry type.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::aggregation;
use crate::ai::parsing::strip_markup;
use crate::error::{Error, Result};
use crate::models::{CategoryTotal, EntryType, Transaction};

/// Column headers of the backing file, in order
pub const HEADERS: [&str; 5] = ["Date", "Category", "Note", "Income/Expense", "Amount"];

/// Date layout used when writing
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Date-only layouts accepted on load, tried in order after the ISO ones
const DATE_FORMATS: &[&str] = &[
    "%Y/%m/%d",  // 2025/01/15
    "%m/%d/%Y",  // 01/15/2025
    "%m/%d/%y",  // 01/15/25
    "%m-%d-%Y",  // 01-15-2025
    "%d %B %Y",  // 15 January 2025
    "%d %b %Y",  // 15 Jan 2025
    "%B %d, %Y", // January 15, 2025
    "%b %d, %Y", // Jan 15, 2025
];

/// Ordered, file-backed collection of transactions
#[derive(Debug)]
pub struct LedgerStore {
    path: PathBuf,
    transactions: Vec<Transaction>,
}

impl LedgerStore {
    /// Open the ledger at `path`, loading it if the file exists
    ///
    /// A missing file is not an error: the ledger starts empty and the file
    /// is created on the first append.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let transactions = if path.exists() {
            let file = File::open(&path)?;
            read_transactions(file)?
        } else {
            debug!("No ledger at {}, starting empty", path.display());
            Vec::new()
        };

        debug!(
            "Loaded {} transactions from {}",
            transactions.len(),
            path.display()
        );
        Ok(Self { path, transactions })
    }

    /// Append a transaction and rewrite the backing file
    ///
    /// Category and note are stored trimmed, as they read back from the file.
    /// If the write fails the transaction is removed again, so memory never
    /// holds rows the file does not.
    pub fn append(&mut self, transaction: Transaction) -> Result<()> {
        let transaction = transaction.into_new_entry()?;
        self.transactions.push(transaction);
        if let Err(e) = self.persist() {
            self.transactions.pop();
            return Err(e);
        }

        info!(
            "Added transaction #{} to {}",
            self.transactions.len(),
            self.path.display()
        );
        Ok(())
    }

    /// The last `n` transactions in insertion order
    pub fn recent(&self, n: usize) -> &[Transaction] {
        let start = self.transactions.len().saturating_sub(n);
        &self.transactions[start..]
    }

    /// The full ledger
    pub fn all(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Per-category totals for one entry type, highest first
    pub fn totals_by_category(&self, entry_type: EntryType) -> Vec<CategoryTotal> {
        aggregation::totals_by_category(&self.transactions, entry_type)
    }

    /// Income minus expenses
    pub fn net_balance(&self) -> Decimal {
        aggregation::net_balance(&self.transactions)
    }

    /// Distinct years with at least one dated row, ascending
    pub fn years(&self) -> Vec<i32> {
        self.transactions
            .iter()
            .filter_map(|tx| tx.date.map(|d| d.year()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the ledger in backing-file format to any writer
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        write_transactions(writer, &self.transactions)
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(&self.path)?;
        self.write_csv(file)
    }
}

/// Read transactions from CSV data in backing-file format
pub fn read_transactions<R: Read>(reader: R) -> Result<Vec<Transaction>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Ok(Vec::new());
    }
    let columns = ColumnIndex::from_headers(&headers)?;

    let mut transactions = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let row = record
            .position()
            .map(|p| p.line())
            .unwrap_or(i as u64 + 2);
        transactions.push(columns.parse_row(&record, row)?);
    }

    Ok(transactions)
}

/// Write transactions as CSV in backing-file format
pub fn write_transactions<W: Write>(writer: W, transactions: &[Transaction]) -> Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(HEADERS)?;

    for tx in transactions {
        let date = tx
            .date
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_default();
        let amount = tx.amount.map(|a| a.to_string()).unwrap_or_default();
        wtr.write_record([
            date.as_str(),
            tx.category.as_str(),
            tx.note.as_str(),
            tx.entry_type.as_str(),
            amount.as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Positions of the required columns in a header row
struct ColumnIndex {
    date: usize,
    category: usize,
    note: usize,
    entry_type: usize,
    amount: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| {
                    Error::InvalidData(format!("Ledger file is missing the '{}' column", name))
                })
        };

        Ok(Self {
            date: find(HEADERS[0])?,
            category: find(HEADERS[1])?,
            note: find(HEADERS[2])?,
            entry_type: find(HEADERS[3])?,
            amount: find(HEADERS[4])?,
        })
    }

    fn parse_row(&self, record: &StringRecord, row: u64) -> Result<Transaction> {
        let field = |idx: usize| record.get(idx).unwrap_or("").trim();

        let raw_type = field(self.entry_type);
        let entry_type = match raw_type.parse::<EntryType>() {
            Ok(entry_type) => entry_type,
            Err(_) => {
                let cleaned = strip_markup(raw_type);
                if cleaned.is_empty() {
                    return Err(Error::InvalidData(format!(
                        "Row {}: missing entry type (expected Income or Expense)",
                        row
                    )));
                }
                let guess = EntryType::from_guess(cleaned);
                warn!(
                    "Row {}: unrecognized entry type '{}', reading it as {}",
                    row, raw_type, guess
                );
                guess
            }
        };

        let raw_date = field(self.date);
        let date = parse_date(raw_date);
        if date.is_none() {
            warn!("Row {}: unreadable date '{}', treating as missing", row, raw_date);
        }

        let raw_amount = field(self.amount);
        let amount = match parse_amount(raw_amount) {
            Some(a) if a < Decimal::ZERO => {
                warn!("Row {}: negative amount {}, treating as missing", row, a);
                None
            }
            Some(a) => Some(a),
            None => {
                warn!(
                    "Row {}: unreadable amount '{}', treating as missing",
                    row, raw_amount
                );
                None
            }
        };

        Ok(Transaction {
            date,
            category: field(self.category).to_string(),
            note: field(self.note).to_string(),
            entry_type,
            amount,
        })
    }
}

/// Parse a date leniently
///
/// Accepts ISO dates, ISO date-times (with or without an offset), and the
/// common slash, dash and spelled-out month layouts. Numeric dates are read
/// month-first.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return plausible(date);
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return plausible(dt.date());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return plausible(dt.date_naive());
    }

    DATE_FORMATS
        .iter()
        .filter_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .find_map(plausible)
}

/// `%Y` also accepts short years; two-digit years are only valid through `%y`
fn plausible(date: NaiveDate) -> Option<NaiveDate> {
    (date.year() >= 100).then_some(date)
}

/// Parse an amount, tolerating currency symbols and thousands separators
fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .trim()
        .replace(['$', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    cleaned.parse::<Decimal>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(d: NaiveDate, category: &str, note: &str, entry_type: EntryType, amount: Decimal) -> Transaction {
        Transaction::new(d, category, note, entry_type, amount).unwrap()
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = date(2025, 1, 15);
        for input in [
            "2025-01-15",
            "2025-01-15 08:30:00",
            "2025-01-15T08:30:00",
            "2025-01-15T08:30:00+02:00",
            "2025/01/15",
            "01/15/2025",
            "01/15/25",
            "01-15-2025",
            "15 January 2025",
            "15 Jan 2025",
            "January 15, 2025",
            "Jan 15, 2025",
        ] {
            assert_eq!(parse_date(input), Some(expected), "failed on {}", input);
        }
    }

    #[test]
    fn test_parse_date_is_month_first() {
        assert_eq!(parse_date("03/04/2025"), Some(date(2025, 3, 4)));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("2025-13-01"), None);
        assert_eq!(parse_date("15/01/2025"), None);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$1,234.56"), Some(dec!(1234.56)));
        assert_eq!(parse_amount("20"), Some(dec!(20)));
        assert_eq!(parse_amount("(100.00)"), Some(dec!(-100)));
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("NaN"), None);
    }

    #[test]
    fn test_read_lenient_values() {
        let csv = "Date,Category,Note,Income/Expense,Amount,Extra\n\
                   2025-01-05,Food,Lunch,Expense,20,x\n\
                   not a date,Food,Dinner,Expense,30,\n\
                   2025-01-07,Food,Refund,Expense,-5,\n\
                   2025-01-08,Other,\"Gift, from aunt\",income,abc,\n";

        let txs = read_transactions(csv.as_bytes()).unwrap();
        assert_eq!(txs.len(), 4);
        assert_eq!(txs[0].amount, Some(dec!(20)));
        assert_eq!(txs[1].date, None);
        assert_eq!(txs[1].amount, Some(dec!(30)));
        assert_eq!(txs[2].amount, None);
        assert_eq!(txs[3].note, "Gift, from aunt");
        assert_eq!(txs[3].entry_type, EntryType::Income);
        assert_eq!(txs[3].amount, None);
    }

    #[test]
    fn test_read_rejects_missing_column() {
        let csv = "Date,Category,Note,Amount\n2025-01-05,Food,Lunch,20\n";
        let err = read_transactions(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Income/Expense"));
    }

    #[test]
    fn test_read_guesses_unusual_entry_types() {
        let csv = "Date,Category,Note,Income/Expense,Amount\n\
                   2025-01-05,Food,Lunch,Expense,20\n\
                   2025-01-06,Food,Pizza,Expense.,12\n\
                   2025-01-07,Other,Bonus,**Income**,300\n\
                   2025-01-08,Other,Move money,Transfer,30\n";
        let txs = read_transactions(csv.as_bytes()).unwrap();
        assert_eq!(txs.len(), 4);
        assert_eq!(txs[1].entry_type, EntryType::Expense);
        assert_eq!(txs[1].amount, Some(dec!(12)));
        assert_eq!(txs[2].entry_type, EntryType::Income);
        assert_eq!(txs[3].entry_type, EntryType::Expense);
    }

    #[test]
    fn test_read_rejects_missing_entry_type() {
        let csv = "Date,Category,Note,Income/Expense,Amount\n\
                   2025-01-05,Food,Lunch,Expense,20\n\
                   2025-01-06,Food,Dinner,,30\n";
        let err = read_transactions(csv.as_bytes()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Row 3"), "{}", msg);
        assert!(msg.contains("missing entry type"));

        let short_row = "Date,Category,Note,Income/Expense,Amount\n2025-01-05,Food,Lunch\n";
        assert!(read_transactions(short_row.as_bytes()).is_err());
    }

    #[test]
    fn test_read_empty_input() {
        assert!(read_transactions("".as_bytes()).unwrap().is_empty());
        assert!(read_transactions("Date,Category,Note,Income/Expense,Amount\n".as_bytes())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_open_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::open(dir.path().join("ledger.csv")).unwrap();
        assert!(store.is_empty());
        assert!(store.recent(5).is_empty());
        assert_eq!(store.net_balance(), Decimal::ZERO);
    }

    #[test]
    fn test_append_then_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ledger.csv");

        let mut store = LedgerStore::open(&path).unwrap();
        store
            .append(tx(date(2025, 1, 5), "Food", "Lunch, with \"team\"", EntryType::Expense, dec!(12.5)))
            .unwrap();
        store
            .append(tx(date(2025, 1, 12), "Salary", "Pay", EntryType::Income, dec!(1000)))
            .unwrap();

        let reopened = LedgerStore::open(&path).unwrap();
        assert_eq!(reopened.all(), store.all());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Date,Category,Note,Income/Expense,Amount\n"));
        assert!(content.contains("2025-01-12,Salary,Pay,Income,1000\n"));
    }

    #[test]
    fn test_append_stores_text_as_it_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        let mut store = LedgerStore::open(&path).unwrap();

        store
            .append(Transaction {
                date: Some(date(2025, 1, 5)),
                category: " Food".to_string(),
                note: "Lunch ".to_string(),
                entry_type: EntryType::Expense,
                amount: Some(dec!(12.50)),
            })
            .unwrap();

        let reopened = LedgerStore::open(&path).unwrap();
        assert_eq!(reopened.all(), store.all());
        assert_eq!(store.all()[0].category, "Food");
        assert_eq!(store.all()[0].note, "Lunch");
        assert_eq!(reopened.all()[0].amount, Some(dec!(12.50)));
    }

    #[test]
    fn test_append_rejects_invalid_entries() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LedgerStore::open(dir.path().join("ledger.csv")).unwrap();

        let mut bad = tx(date(2025, 1, 5), "Food", "Lunch", EntryType::Expense, dec!(1));
        bad.amount = Some(dec!(-1));
        assert!(matches!(store.append(bad), Err(Error::InvalidData(_))));

        let mut undated = tx(date(2025, 1, 5), "Food", "Lunch", EntryType::Expense, dec!(1));
        undated.date = None;
        assert!(store.append(undated).is_err());

        // Year 50 would be written as "0050-..." and not read back
        let mut ancient = tx(date(2025, 1, 5), "Food", "Lunch", EntryType::Expense, dec!(1));
        ancient.date = Some(date(50, 1, 5));
        assert!(matches!(store.append(ancient), Err(Error::InvalidData(_))));

        assert!(store.is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_append_rolls_back_on_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        let mut store = LedgerStore::open(&path).unwrap();

        // A directory where the file should be makes the write fail
        std::fs::create_dir(&path).unwrap();
        let result = store.append(tx(date(2025, 1, 5), "Food", "Lunch", EntryType::Expense, dec!(20)));

        assert!(matches!(result, Err(Error::Io(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_recent() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LedgerStore::open(dir.path().join("ledger.csv")).unwrap();
        for i in 1..=7 {
            store
                .append(tx(date(2025, 1, i), "Food", &format!("Meal {}", i), EntryType::Expense, dec!(1)))
                .unwrap();
        }

        let notes: Vec<&str> = store.recent(3).iter().map(|t| t.note.as_str()).collect();
        assert_eq!(notes, vec!["Meal 5", "Meal 6", "Meal 7"]);
        assert_eq!(store.recent(100).len(), 7);
        assert!(store.recent(0).is_empty());
    }

    #[test]
    fn test_years_and_totals() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LedgerStore::open(dir.path().join("ledger.csv")).unwrap();
        store
            .append(tx(date(2025, 1, 5), "Food", "Lunch", EntryType::Expense, dec!(20)))
            .unwrap();
        store
            .append(tx(date(2024, 12, 20), "Transportation", "Bus", EntryType::Expense, dec!(30)))
            .unwrap();
        store
            .append(tx(date(2025, 1, 12), "Salary", "Pay", EntryType::Income, dec!(100)))
            .unwrap();

        assert_eq!(store.years(), vec![2024, 2025]);
        assert_eq!(store.net_balance(), dec!(50));

        let totals = store.totals_by_category(EntryType::Expense);
        assert_eq!(totals[0].category, "Transportation");
        assert_eq!(totals[1].category, "Food");
    }

    #[test]
    fn test_write_csv_keeps_missing_values_blank() {
        let txs = vec![Transaction {
            date: None,
            category: "Food".to_string(),
            note: "Lunch".to_string(),
            entry_type: EntryType::Expense,
            amount: None,
        }];
        let mut out = Vec::new();
        write_transactions(&mut out, &txs).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with(",Food,Lunch,Expense,\n"));
    }
}

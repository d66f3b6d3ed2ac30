use std::path::Path;

use calamine::{Data, DataType};
use chrono::{NaiveDate, NaiveDateTime};

use crate::contracts::types::{Balance, CanonicalTransaction};
use crate::excel::sheet::SheetTable;
use crate::hashing::{excel_natural_key, identity_hash};
use crate::{ClientError, ClientResult};

pub const SETTLEMENT_DATE: &str = "Settlement Date";
pub const TRANSACTION_DATE: &str = "Transaction Date";
pub const NET_AMOUNT: &str = "Net Amount";
pub const PRICE: &str = "Price";
pub const ACCOUNT_NUMBER: &str = "Account #";
pub const ACTIVITY_TYPE: &str = "Activity Type";
pub const SYMBOL: &str = "Symbol";

pub const REQUIRED_COLUMNS: [&str; 7] = [
    SETTLEMENT_DATE,
    TRANSACTION_DATE,
    NET_AMOUNT,
    PRICE,
    ACCOUNT_NUMBER,
    ACTIVITY_TYPE,
    SYMBOL,
];

pub const SOURCE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %I:%M:%S %p";

struct ColumnIndexes {
    settlement_date: usize,
    transaction_date: usize,
    net_amount: usize,
    price: usize,
    account_number: usize,
    activity_type: usize,
    symbol: usize,
}

impl ColumnIndexes {
    fn resolve(file: &Path, table: &SheetTable) -> ClientResult<Self> {
        let missing = REQUIRED_COLUMNS
            .iter()
            .filter(|name| table.column_index(name).is_none())
            .map(|name| name.to_string())
            .collect::<Vec<String>>();
        if !missing.is_empty() {
            return Err(ClientError::missing_columns(
                file,
                missing,
                table.headers.clone(),
            ));
        }

        let index = |name: &str| table.column_index(name).unwrap_or_default();
        Ok(Self {
            settlement_date: index(SETTLEMENT_DATE),
            transaction_date: index(TRANSACTION_DATE),
            net_amount: index(NET_AMOUNT),
            price: index(PRICE),
            account_number: index(ACCOUNT_NUMBER),
            activity_type: index(ACTIVITY_TYPE),
            symbol: index(SYMBOL),
        })
    }
}

/// Maps every non-empty data row of `table` onto a canonical transaction.
/// The first unreadable cell aborts the whole sheet.
pub fn derive_transactions(
    file: &Path,
    table: &SheetTable,
) -> ClientResult<Vec<CanonicalTransaction>> {
    let columns = ColumnIndexes::resolve(file, table)?;

    let mut transactions = Vec::with_capacity(table.rows.len());
    for (index, row) in table.rows.iter().enumerate() {
        if row.iter().all(is_blank) {
            continue;
        }
        let cells = RowCells {
            file,
            row,
            row_number: table.sheet_row_number(index),
        };
        transactions.push(derive_transaction(&cells, &columns)?);
    }

    Ok(transactions)
}

struct RowCells<'a> {
    file: &'a Path,
    row: &'a [Data],
    row_number: usize,
}

impl RowCells<'_> {
    fn cell(&self, index: usize) -> &Data {
        self.row.get(index).unwrap_or(&Data::Empty)
    }

    fn error(&self, column: &str, detail: &str) -> ClientError {
        ClientError::cell_parse_failure(self.file, self.row_number, column, detail)
    }
}

fn derive_transaction(
    cells: &RowCells<'_>,
    columns: &ColumnIndexes,
) -> ClientResult<CanonicalTransaction> {
    let settlement_date = read_date(cells, columns.settlement_date, SETTLEMENT_DATE)?;
    let transaction_date = read_date(cells, columns.transaction_date, TRANSACTION_DATE)?;

    let net_amount = read_number(cells, columns.net_amount, NET_AMOUNT)?
        .ok_or_else(|| cells.error(NET_AMOUNT, "the cell is empty"))?;
    let price = read_number(cells, columns.price, PRICE)?.unwrap_or(f64::NAN);
    let account_number = read_account_number(cells, columns.account_number)?;
    let activity_type = read_text(cells.cell(columns.activity_type))
        .ok_or_else(|| cells.error(ACTIVITY_TYPE, "the cell is empty"))?;
    let symbol = read_text(cells.cell(columns.symbol)).filter(|value| !value.trim().is_empty());

    let transaction_date_text = format_iso_date(transaction_date);
    let natural_key = excel_natural_key(
        &render_float(net_amount),
        &render_float(price),
        &transaction_date_text,
        &account_number.to_string(),
    );

    let name = match symbol {
        Some(symbol) => format!("{symbol} {activity_type}"),
        None => activity_type,
    };

    Ok(CanonicalTransaction {
        id: identity_hash(&natural_key),
        date: format_iso_date(settlement_date),
        amount: net_amount,
        name,
        account_id: account_number,
        balance: Balance::Unreported,
    })
}

fn read_date(cells: &RowCells<'_>, index: usize, column: &str) -> ClientResult<NaiveDate> {
    let cell = cells.cell(index);
    match cell {
        Data::String(value) => parse_source_timestamp(value).ok_or_else(|| {
            cells.error(
                column,
                &format!("`{value}` is not a `YYYY-MM-DD hh:mm:ss AM/PM` timestamp"),
            )
        }),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_datetime()
            .map(|value| value.date())
            .ok_or_else(|| cells.error(column, "the date cell is out of range")),
        Data::Empty => Err(cells.error(column, "the cell is empty")),
        other => Err(cells.error(column, &format!("`{other}` is not a date"))),
    }
}

pub fn parse_source_timestamp(value: &str) -> Option<NaiveDate> {
    NaiveDateTime::parse_from_str(value.trim(), SOURCE_TIMESTAMP_FORMAT)
        .ok()
        .map(|timestamp| timestamp.date())
}

fn format_iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `None` for an empty cell; an error for anything that is not a number.
fn read_number(cells: &RowCells<'_>, index: usize, column: &str) -> ClientResult<Option<f64>> {
    match cells.cell(index) {
        Data::Float(value) => Ok(Some(*value)),
        Data::Int(value) => Ok(Some(*value as f64)),
        Data::String(value) if value.trim().is_empty() => Ok(None),
        Data::String(value) => value
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| cells.error(column, &format!("`{value}` is not a number"))),
        Data::Empty => Ok(None),
        other => Err(cells.error(column, &format!("`{other}` is not a number"))),
    }
}

fn read_account_number(cells: &RowCells<'_>, index: usize) -> ClientResult<i64> {
    match cells.cell(index) {
        Data::Int(value) => Ok(*value),
        Data::Float(value) if value.fract() == 0.0 && value.is_finite() => Ok(*value as i64),
        Data::String(value) => value
            .trim()
            .parse::<i64>()
            .map_err(|_| cells.error(ACCOUNT_NUMBER, &format!("`{value}` is not an integer"))),
        Data::Empty => Err(cells.error(ACCOUNT_NUMBER, "the cell is empty")),
        other => Err(cells.error(ACCOUNT_NUMBER, &format!("`{other}` is not an integer"))),
    }
}

fn read_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(value) if value.is_empty() => None,
        Data::String(value) => Some(value.clone()),
        other => Some(other.to_string()),
    }
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::String(value) => value.trim().is_empty(),
        other => other.is_empty(),
    }
}

/// Renders a float the way natural keys have always spelled it: shortest
/// round-trip digits, always with a fractional part or an exponent, `nan`
/// for a missing value.
pub fn render_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let magnitude = value.abs();
    if magnitude >= 1e16 || (magnitude != 0.0 && magnitude < 1e-4) {
        let scientific = format!("{value:e}");
        let Some((mantissa, exponent)) = scientific.split_once('e') else {
            return scientific;
        };
        let (sign, digits) = match exponent.strip_prefix('-') {
            Some(digits) => ('-', digits),
            None => ('+', exponent),
        };
        return format!("{mantissa}e{sign}{digits:0>2}");
    }

    let text = value.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{text}.0")
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use calamine::{Data, ExcelDateTime, ExcelDateTimeType};

    use super::{derive_transactions, parse_source_timestamp, render_float};
    use crate::contracts::types::Balance;
    use crate::excel::sheet::SheetTable;
    use crate::hashing::identity_hash;

    const HEADERS: [&str; 7] = [
        "Settlement Date",
        "Transaction Date",
        "Net Amount",
        "Price",
        "Account #",
        "Activity Type",
        "Symbol",
    ];

    fn text(value: &str) -> Data {
        Data::String(value.to_string())
    }

    fn row(symbol: Data, price: Data) -> Vec<Data> {
        vec![
            text("2023-01-01 10:00:00 AM"),
            text("2023-01-01 09:00:00 AM"),
            Data::Float(100.50),
            price,
            Data::Float(12345.0),
            text("BUY"),
            symbol,
        ]
    }

    fn file() -> &'static Path {
        Path::new("/statements/activity.xlsx")
    }

    #[test]
    fn projects_row_onto_canonical_fields() {
        let table = SheetTable::new(HEADERS.to_vec(), vec![row(text("STOCKA"), Data::Float(10.0))]);
        let derived = derive_transactions(file(), &table);
        assert!(derived.is_ok());
        if let Ok(transactions) = derived {
            assert_eq!(transactions.len(), 1);
            let transaction = &transactions[0];
            assert_eq!(transaction.id, identity_hash("100.510.02023-01-0112345"));
            assert_eq!(transaction.id, 29_464_280_644_590);
            assert_eq!(transaction.date, "2023-01-01");
            assert_eq!(transaction.amount, 100.5);
            assert_eq!(transaction.name, "STOCKA BUY");
            assert_eq!(transaction.account_id, 12345);
            assert_eq!(transaction.balance, Balance::Unreported);
        }
    }

    #[test]
    fn native_date_cells_are_read_like_text_timestamps() {
        let native = |serial: f64| {
            Data::DateTime(ExcelDateTime::new(serial, ExcelDateTimeType::DateTime, false))
        };
        let mut same_day = row(text("STOCKA"), Data::Float(10.0));
        same_day[0] = native(44927.4166);
        same_day[1] = native(44927.4166);
        let mut later_settlement = same_day.clone();
        later_settlement[0] = native(44929.5);

        let table = SheetTable::new(HEADERS.to_vec(), vec![same_day, later_settlement]);
        let derived = derive_transactions(file(), &table);
        assert!(derived.is_ok(), "{derived:?}");
        if let Ok(transactions) = derived {
            assert_eq!(transactions[0].date, "2023-01-01");
            assert_eq!(transactions[0].id, 29_464_280_644_590);
            // The id follows the transaction date, the record date the settlement date.
            assert_eq!(transactions[1].date, "2023-01-03");
            assert_eq!(transactions[1].id, 29_464_280_644_590);
        }
    }

    #[test]
    fn blank_symbol_leaves_activity_type_alone() {
        let table = SheetTable::new(
            HEADERS.to_vec(),
            vec![
                row(Data::Empty, Data::Float(10.0)),
                row(text("   "), Data::Float(10.0)),
            ],
        );
        let derived = derive_transactions(file(), &table);
        assert!(derived.is_ok());
        if let Ok(transactions) = derived {
            assert_eq!(transactions[0].name, "BUY");
            assert_eq!(transactions[1].name, "BUY");
        }
    }

    #[test]
    fn empty_price_hashes_as_nan() {
        let table = SheetTable::new(HEADERS.to_vec(), vec![row(Data::Empty, Data::Empty)]);
        let derived = derive_transactions(file(), &table);
        assert!(derived.is_ok());
        if let Ok(transactions) = derived {
            assert_eq!(transactions[0].id, identity_hash("100.5nan2023-01-0112345"));
        }
    }

    #[test]
    fn column_order_does_not_matter_and_extra_columns_are_ignored() {
        let headers = vec![
            "Description",
            "Symbol",
            "Account #",
            "Activity Type",
            "Price",
            "Net Amount",
            "Transaction Date",
            "Settlement Date",
        ];
        let rows = vec![vec![
            text("ignored"),
            text("STOCKA"),
            text("12345"),
            text("BUY"),
            text("10"),
            text("100.50"),
            text("2023-01-01 09:00:00 AM"),
            text("2023-01-01 10:00:00 AM"),
        ]];
        let derived = derive_transactions(file(), &SheetTable::new(headers, rows));
        assert!(derived.is_ok());
        if let Ok(transactions) = derived {
            assert_eq!(transactions[0].id, 29_464_280_644_590);
        }
    }

    #[test]
    fn fully_blank_rows_are_skipped() {
        let table = SheetTable::new(
            HEADERS.to_vec(),
            vec![
                row(text("STOCKA"), Data::Float(10.0)),
                vec![Data::Empty; 7],
                vec![text(" "), Data::Empty],
            ],
        );
        let derived = derive_transactions(file(), &table);
        assert!(matches!(derived, Ok(transactions) if transactions.len() == 1));
    }

    #[test]
    fn missing_columns_are_a_schema_violation() {
        let table = SheetTable::new(vec!["Settlement Date", "Net Amount"], Vec::new());
        let derived = derive_transactions(file(), &table);
        assert!(derived.is_err());
        if let Err(error) = derived {
            assert_eq!(error.code, "schema_violation");
            assert!(error.message.contains("Transaction Date, Price, Account #"));
        }
    }

    #[test]
    fn unparseable_date_reports_row_and_column() {
        let mut bad = row(text("STOCKA"), Data::Float(10.0));
        bad[1] = text("01/02/2023");
        let table = SheetTable::new(HEADERS.to_vec(), vec![row(text("A"), Data::Float(1.0)), bad]);
        let derived = derive_transactions(file(), &table);
        assert!(derived.is_err());
        if let Err(error) = derived {
            assert_eq!(error.code, "parse_failure");
            let data = error.data.unwrap_or_default();
            assert_eq!(data["row"], 3);
            assert_eq!(data["column"], "Transaction Date");
        }
    }

    #[test]
    fn malformed_amount_is_a_parse_failure() {
        let mut bad = row(text("STOCKA"), Data::Float(10.0));
        bad[2] = text("one hundred");
        let derived = derive_transactions(file(), &SheetTable::new(HEADERS.to_vec(), vec![bad]));
        assert!(matches!(derived, Err(error) if error.code == "parse_failure"));
    }

    #[test]
    fn empty_net_amount_is_a_parse_failure() {
        let mut bad = row(text("STOCKA"), Data::Float(10.0));
        bad[2] = Data::Empty;
        let derived = derive_transactions(file(), &SheetTable::new(HEADERS.to_vec(), vec![bad]));
        assert!(matches!(derived, Err(error) if error.code == "parse_failure"));
    }

    #[test]
    fn fractional_account_number_is_rejected() {
        let mut bad = row(text("STOCKA"), Data::Float(10.0));
        bad[4] = Data::Float(123.5);
        let derived = derive_transactions(file(), &SheetTable::new(HEADERS.to_vec(), vec![bad]));
        assert!(matches!(derived, Err(error) if error.code == "parse_failure"));
    }

    #[test]
    fn source_timestamps_keep_only_the_calendar_date() {
        let parsed = parse_source_timestamp("2023-12-31 11:59:59 PM");
        assert_eq!(parsed.map(|date| date.to_string()), Some("2023-12-31".to_string()));
        assert!(parse_source_timestamp("2023-12-31 23:59:59").is_none());
        assert!(parse_source_timestamp("2023-13-01 10:00:00 AM").is_none());
    }

    #[test]
    fn floats_render_with_a_fractional_part() {
        assert_eq!(render_float(100.5), "100.5");
        assert_eq!(render_float(10.0), "10.0");
        assert_eq!(render_float(-1200.0), "-1200.0");
        assert_eq!(render_float(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(render_float(f64::NAN), "nan");
        assert_eq!(render_float(0.00005), "5e-05");
        assert_eq!(render_float(1.5e16), "1.5e+16");
    }
}

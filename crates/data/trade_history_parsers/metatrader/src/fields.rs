use chrono::{DateTime, NaiveDateTime, Utc};
use scraper::ElementRef;
use tracing::debug;

use crate::error::RowError;
use crate::header::{ColumnMapping, Field};

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '円', '元', '₽', '₩', '₺', '₹'];

/// Cell texts meaning "no timestamp".
const NO_VALUE: &[&str] = &["0", "0.00000", "", "&nbsp;"];

/// Tried in order, first success wins. RFC 3339 is tried last.
pub const DATETIME_LAYOUTS: &[&str] = &[
    "%Y.%m.%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y年%m月%d日 %H:%M:%S",
    "%Y年%m月%d日 %H:%M",
];

/// All descendant text of a cell, concatenated and trimmed.
pub fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

pub fn digits_only(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

/// "1001 [sl]" → 1001. Fails when no digits remain or the number overflows.
pub fn parse_ticket(s: &str) -> Option<u64> {
    digits_only(s).parse().ok()
}

/// Strips spacing, thousands separators and currency symbols, and maps the
/// typographic minus signs to '-'. Idempotent.
pub fn normalize_numeric(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '\u{00A0}' | ',') && !CURRENCY_SYMBOLS.contains(c))
        .map(|c| match c {
            '\u{2212}' | '\u{FF0D}' => '-',
            other => other,
        })
        .collect()
}

pub fn parse_number(raw: &str) -> Option<f64> {
    normalize_numeric(raw)
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Naive layouts are read as UTC.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if NO_VALUE.contains(&s) {
        return None;
    }

    DATETIME_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(s, layout).ok())
        .map(|naive| naive.and_utc())
        .or_else(|| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
}

/// Typed field values of one data row, before an identifier is assigned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedTrade {
    pub ticket: u64,
    pub open_time: Option<DateTime<Utc>>,
    pub kind: String,
    pub size: f64,
    pub item: String,
    pub open_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub close_time: Option<DateTime<Utc>>,
    pub close_price: f64,
    pub commission: f64,
    pub taxes: f64,
    pub swap: f64,
    pub profit: f64,
}

struct RowCells<'r, 'a> {
    cells: &'r [ElementRef<'a>],
    mapping: &'r ColumnMapping,
}

impl RowCells<'_, '_> {
    fn text(&self, field: Field) -> Option<String> {
        self.mapping
            .get(field)
            .and_then(|idx| self.cells.get(idx))
            .map(|cell| cell_text(*cell))
    }

    fn ticket(&self) -> Result<u64, RowError> {
        match self.text(Field::Ticket) {
            Some(text) => parse_ticket(&text).ok_or(RowError::InvalidTicket(text)),
            None => Ok(0),
        }
    }

    fn label(&self, field: Field, max_len: usize) -> Result<String, RowError> {
        let text = self.text(field).unwrap_or_default();
        if text.chars().count() > max_len {
            return Err(RowError::LabelTooLong {
                field: field.tag(),
                text,
            });
        }
        Ok(text)
    }

    fn amount(&self, field: Field) -> f64 {
        let Some(text) = self.text(field) else {
            return 0.0;
        };
        parse_number(&text).unwrap_or_else(|| {
            if !text.is_empty() {
                debug!(field = field.tag(), text = %text, "Unparsable number, using 0");
            }
            0.0
        })
    }

    fn timestamp(&self, field: Field) -> Option<DateTime<Utc>> {
        let text = self.text(field)?;
        let parsed = parse_datetime(&text);
        if parsed.is_none() && !NO_VALUE.contains(&text.as_str()) {
            debug!(field = field.tag(), text = %text, "Unparsable date time, leaving empty");
        }
        parsed
    }
}

/// Reads every mapped field of a data row.
///
/// Fails only on an unreadable ticket or an over-long type/item text; every
/// other field falls back to 0.0 or no timestamp.
pub fn extract_trade(
    cells: &[ElementRef<'_>],
    mapping: &ColumnMapping,
    max_label_len: usize,
) -> Result<ExtractedTrade, RowError> {
    let row = RowCells { cells, mapping };

    let ticket = row.ticket()?;
    let kind = row.label(Field::Type, max_label_len)?;
    let item = row.label(Field::Item, max_label_len)?;

    Ok(ExtractedTrade {
        ticket,
        open_time: row.timestamp(Field::OpenTime),
        kind,
        size: row.amount(Field::Size),
        item,
        open_price: row.amount(Field::OpenPrice),
        stop_loss: row.amount(Field::StopLoss),
        take_profit: row.amount(Field::TakeProfit),
        close_time: row.timestamp(Field::CloseTime),
        close_price: row.amount(Field::ClosePrice),
        commission: row.amount(Field::Commission),
        taxes: row.amount(Field::Taxes),
        swap: row.amount(Field::Swap),
        profit: row.amount(Field::Profit),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::classify_header;
    use crate::rows::{row_cells, table_rows};
    use chrono::{TimeZone, Timelike};
    use scraper::Html;

    #[test]
    fn test_normalize_numeric() {
        assert_eq!(normalize_numeric("$1,234.56"), "1234.56");
        assert_eq!(normalize_numeric("\u{2212}5.00"), "-5.00");
        assert_eq!(normalize_numeric("\u{FF0D}5.00"), "-5.00");
        assert_eq!(normalize_numeric(" 10 000.00 € "), "10000.00");
        assert_eq!(normalize_numeric("1\u{00A0}500円"), "1500");
        assert_eq!(normalize_numeric("¥3,000元"), "3000");
        assert_eq!(normalize_numeric("₹99 ₽ ₩ ₺ £"), "99");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["$1,234.56", "\u{2212}5.00", " 1 000 ", "abc", "", "-0.50", "1e3"] {
            let once = normalize_numeric(raw);
            assert_eq!(normalize_numeric(&once), once, "input {:?}", raw);
        }
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("$1,234.56"), Some(1234.56));
        assert_eq!(parse_number("\u{2212}5.00"), Some(-5.0));
        assert_eq!(parse_number("1.1000"), Some(1.1));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn test_parse_ticket() {
        assert_eq!(parse_ticket("1001 [sl]"), Some(1001));
        assert_eq!(parse_ticket("#42"), Some(42));
        assert_eq!(parse_ticket("[tp]"), None);
        assert_eq!(parse_ticket("99999999999999999999999"), None);
    }

    #[test]
    fn test_datetime_layouts_round_trip() {
        let with_seconds = Utc.with_ymd_and_hms(2023, 1, 5, 10, 4, 33).unwrap();
        let whole_minute = with_seconds.with_second(0).unwrap();

        for layout in DATETIME_LAYOUTS {
            let instant = if layout.ends_with("%S") { with_seconds } else { whole_minute };
            let text = instant.format(layout).to_string();
            assert_eq!(parse_datetime(&text), Some(instant), "layout {} text {}", layout, text);
        }

        let rfc = with_seconds.to_rfc3339();
        assert_eq!(parse_datetime(&rfc), Some(with_seconds));
    }

    #[test]
    fn test_datetime_day_and_month_order() {
        let expected = Utc.with_ymd_and_hms(2023, 1, 5, 12, 0, 0).unwrap();
        assert_eq!(parse_datetime("05.01.2023 12:00"), Some(expected));
        assert_eq!(parse_datetime("01/05/2023 12:00:00"), Some(expected));
        assert_eq!(parse_datetime("2023年01月05日 12:00"), Some(expected));
        assert_eq!(
            parse_datetime("2023-01-05T14:00:00+02:00"),
            Some(expected)
        );
    }

    #[test]
    fn test_datetime_no_value() {
        for s in ["0", "0.00000", "", "  ", "&nbsp;", "\u{00A0}", "yesterday"] {
            assert_eq!(parse_datetime(s), None, "input {:?}", s);
        }
    }

    fn first_data_row(html: &str) -> Result<ExtractedTrade, RowError> {
        let doc = Html::parse_document(html);
        let rows = table_rows(doc.root_element());
        let labels: Vec<String> = row_cells(rows[0]).into_iter().map(cell_text).collect();
        let mapping = classify_header(&labels);
        extract_trade(&row_cells(rows[1]), &mapping, 20)
    }

    #[test]
    fn test_extract_trade() {
        let trade = first_data_row(
            "<table>
             <tr><td>Ticket</td><td>Open Time</td><td>Type</td><td>Size</td><td>Item</td><td>Price</td>
                 <td>S / L</td><td>T / P</td><td>Close Time</td><td>Price</td><td>Commission</td>
                 <td>Taxes</td><td>Swap</td><td>Profit</td></tr>
             <tr><td>1001 [sl]</td><td>2023.01.05 10:00:00</td><td>buy</td><td>1.00</td><td>EURUSD</td>
                 <td>1.1000</td><td>1.0900</td><td>1.1100</td><td>2023.01.05 12:00:00</td><td>1.1050</td>
                 <td>-2.00</td><td>0.00</td><td>\u{2212}0.50</td><td><b>45.00</b></td></tr>
             </table>",
        )
        .unwrap();

        assert_eq!(trade.ticket, 1001);
        assert_eq!(trade.kind, "buy");
        assert_eq!(trade.item, "EURUSD");
        assert_eq!(trade.open_price, 1.1);
        assert_eq!(trade.close_price, 1.105);
        assert_eq!(trade.stop_loss, 1.09);
        assert_eq!(trade.take_profit, 1.11);
        assert_eq!(trade.commission, -2.0);
        assert_eq!(trade.swap, -0.5);
        assert_eq!(trade.profit, 45.0);
        assert_eq!(
            trade.close_time,
            Some(Utc.with_ymd_and_hms(2023, 1, 5, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_extract_defaults_and_missing_columns() {
        let trade = first_data_row(
            "<table>
             <tr><td>Ticket</td><td>Open Time</td><td>Type</td><td>Size</td><td>Profit</td></tr>
             <tr><td>7</td><td>0</td><td>sell</td><td>n/a</td></tr>
             </table>",
        )
        .unwrap();

        assert_eq!(trade.ticket, 7);
        assert_eq!(trade.open_time, None);
        assert_eq!(trade.size, 0.0);
        // Profit column exists in the header but not in this short row
        assert_eq!(trade.profit, 0.0);
        assert_eq!(trade.item, "");
    }

    #[test]
    fn test_row_level_failures() {
        let bad_ticket = first_data_row(
            "<table><tr><td>Ticket</td><td>Type</td></tr><tr><td>n/a</td><td>buy</td></tr></table>",
        );
        assert_eq!(bad_ticket, Err(RowError::InvalidTicket("n/a".to_string())));

        let long_item = first_data_row(
            "<table><tr><td>Ticket</td><td>Item</td></tr>
             <tr><td>5</td><td>cancelled by the dealer</td></tr></table>",
        );
        assert!(matches!(long_item, Err(RowError::LabelTooLong { field: "item", .. })));

        // Twenty characters is still fine; multi-byte text counts characters
        let ok = first_data_row(
            "<table><tr><td>Ticket</td><td>Type</td></tr>
             <tr><td>5</td><td>買い買い買い買い買い買い買い買い買い買い</td></tr></table>",
        );
        assert!(ok.is_ok());
    }
}

use std::collections::HashMap;

use scraper::ElementRef;

use crate::fields::cell_text;
use crate::rows::row_cells;

/// Semantic columns of a closed-trades table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Ticket,
    OpenTime,
    Type,
    Size,
    Item,
    OpenPrice,
    StopLoss,
    TakeProfit,
    CloseTime,
    ClosePrice,
    Commission,
    Taxes,
    Swap,
    Profit,
}

impl Field {
    pub fn tag(self) -> &'static str {
        match self {
            Field::Ticket => "ticket",
            Field::OpenTime => "open_time",
            Field::Type => "type",
            Field::Size => "size",
            Field::Item => "item",
            Field::OpenPrice => "open_price",
            Field::StopLoss => "stop_loss",
            Field::TakeProfit => "take_profit",
            Field::CloseTime => "close_time",
            Field::ClosePrice => "close_price",
            Field::Commission => "commission",
            Field::Taxes => "taxes",
            Field::Swap => "swap",
            Field::Profit => "profit",
        }
    }
}

/// Field → column index for one header row. Unmatched fields are simply absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMapping {
    columns: HashMap<Field, usize>,
}

impl ColumnMapping {
    pub fn get(&self, field: Field) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    pub fn insert(&mut self, field: Field, idx: usize) {
        self.columns.insert(field, idx);
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// `tag=idx` pairs sorted by column, for logs.
    pub fn describe(&self) -> String {
        let mut pairs: Vec<(usize, &str)> = self.columns.iter().map(|(f, i)| (*i, f.tag())).collect();
        pairs.sort();
        pairs
            .iter()
            .map(|(i, tag)| format!("{}={}", tag, i))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A header cell's text, lower-cased, plus a whitespace-free copy so that
/// "S / L" and "SL" compare alike.
#[derive(Debug, Clone)]
pub struct HeaderLabel {
    pub text: String,
    pub compact: String,
}

impl HeaderLabel {
    pub fn new(raw: &str) -> Self {
        let text = raw.trim().to_lowercase();
        let compact = text.chars().filter(|c| !c.is_whitespace()).collect();
        Self { text, compact }
    }
}

/// Running state of one left-to-right header scan.
///
/// "Price" (and MT5's bare "Time") name two different columns; which one a
/// cell means depends on how many of them came before it. MT5 deal tables
/// carry both "Deal" and "Order", and only the first ticket-like column counts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifierState {
    pub price_labels: usize,
    pub time_labels: usize,
    pub ticket_labels: usize,
}

impl ClassifierState {
    fn observe(&mut self, label: &HeaderLabel) {
        match label.text.as_str() {
            "price" => self.price_labels += 1,
            "time" => self.time_labels += 1,
            text if is_ticket_text(text) => self.ticket_labels += 1,
            _ => {}
        }
    }
}

pub struct Rule {
    pub field: Field,
    pub matches: fn(&HeaderLabel, &ClassifierState) -> bool,
}

/// Evaluated top to bottom; the first matching rule classifies the cell.
pub const RULES: &[Rule] = &[
    Rule { field: Field::Ticket, matches: is_ticket },
    Rule { field: Field::OpenTime, matches: is_open_time },
    Rule { field: Field::Type, matches: is_type },
    Rule { field: Field::Size, matches: is_size },
    Rule { field: Field::Item, matches: is_item },
    Rule { field: Field::OpenPrice, matches: is_open_price },
    Rule { field: Field::StopLoss, matches: is_stop_loss },
    Rule { field: Field::TakeProfit, matches: is_take_profit },
    Rule { field: Field::CloseTime, matches: is_close_time },
    Rule { field: Field::ClosePrice, matches: is_close_price },
    Rule { field: Field::Commission, matches: is_commission },
    Rule { field: Field::Taxes, matches: is_taxes },
    Rule { field: Field::Swap, matches: is_swap },
    Rule { field: Field::Profit, matches: is_profit },
];

fn is_ticket_text(text: &str) -> bool {
    matches!(text, "ticket" | "チケット" | "position" | "order" | "deal")
}

fn is_ticket(l: &HeaderLabel, s: &ClassifierState) -> bool {
    is_ticket_text(&l.text) && s.ticket_labels == 0
}

fn is_open_time(l: &HeaderLabel, s: &ClassifierState) -> bool {
    (l.text.contains("open") && l.text.contains("time"))
        || l.text == "オープン時間"
        || (l.text == "time" && s.time_labels == 0)
}

fn is_type(l: &HeaderLabel, _: &ClassifierState) -> bool {
    matches!(l.text.as_str(), "type" | "タイプ")
}

fn is_size(l: &HeaderLabel, _: &ClassifierState) -> bool {
    matches!(l.text.as_str(), "size" | "ロット" | "数量" | "volume" | "lots")
}

fn is_item(l: &HeaderLabel, _: &ClassifierState) -> bool {
    matches!(l.text.as_str(), "item" | "シンボル" | "symbol")
}

fn is_open_price(l: &HeaderLabel, s: &ClassifierState) -> bool {
    l.text == "price" && s.price_labels == 0
}

fn is_stop_loss(l: &HeaderLabel, _: &ClassifierState) -> bool {
    l.compact.contains("s/l") || l.compact == "sl" || l.compact == "stoploss"
}

fn is_take_profit(l: &HeaderLabel, _: &ClassifierState) -> bool {
    l.compact.contains("t/p") || l.compact == "tp" || l.compact == "takeprofit"
}

fn is_close_time(l: &HeaderLabel, s: &ClassifierState) -> bool {
    (l.text.contains("close") && l.text.contains("time"))
        || l.text == "クローズ時間"
        || (l.text == "time" && s.time_labels == 1)
}

fn is_close_price(l: &HeaderLabel, s: &ClassifierState) -> bool {
    l.text == "price" && s.price_labels == 1
}

fn is_commission(l: &HeaderLabel, _: &ClassifierState) -> bool {
    matches!(l.text.as_str(), "commission" | "手数料")
}

fn is_taxes(l: &HeaderLabel, _: &ClassifierState) -> bool {
    matches!(l.text.as_str(), "taxes" | "税金")
}

fn is_swap(l: &HeaderLabel, _: &ClassifierState) -> bool {
    matches!(l.text.as_str(), "swap" | "スワップ")
}

fn is_profit(l: &HeaderLabel, _: &ClassifierState) -> bool {
    matches!(l.text.as_str(), "profit" | "損益" | "利益")
}

pub fn classify_label(label: &HeaderLabel, state: &ClassifierState) -> Option<Field> {
    RULES
        .iter()
        .find(|rule| (rule.matches)(label, state))
        .map(|rule| rule.field)
}

/// Single pass over the header texts. A later column claiming an already
/// mapped field replaces the earlier one.
pub fn classify_header<S: AsRef<str>>(labels: &[S]) -> ColumnMapping {
    let mut mapping = ColumnMapping::default();
    let mut state = ClassifierState::default();

    for (idx, raw) in labels.iter().enumerate() {
        let label = HeaderLabel::new(raw.as_ref());
        if let Some(field) = classify_label(&label, &state) {
            mapping.insert(field, idx);
        }
        state.observe(&label);
    }

    mapping
}

/// First row carrying the header background colour in `bgcolor` or `style`.
pub fn find_header_row<'a>(rows: &[ElementRef<'a>], background: &str) -> Option<ElementRef<'a>> {
    let needle = background.trim().to_ascii_uppercase();
    if needle.is_empty() {
        return None;
    }

    rows.iter().copied().find(|row| {
        ["bgcolor", "style"]
            .iter()
            .filter_map(|attr| row.value().attr(attr))
            .any(|value| value.to_ascii_uppercase().contains(&needle))
    })
}

pub fn header_labels(row: ElementRef<'_>) -> Vec<String> {
    row_cells(row).into_iter().map(cell_text).collect()
}

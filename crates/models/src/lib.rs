
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Settings models
pub const DEFAULT_SECTION_MARKER: &str = "Closed Transactions:";
pub const DEFAULT_EMPTY_SECTION_MARKER: &str = "No transactions";
pub const DEFAULT_HEADER_BACKGROUND: &str = "C0C0C0";
pub const DEFAULT_MAX_LABEL_LEN: usize = 20;
pub const DEFAULT_MIN_ROW_CELLS: usize = 4;
pub const DEFAULT_FALLBACK_ENCODING: &str = "windows-1252";

/// Knobs for the statement parser. Every field falls back to the MetaTrader 4
/// statement layout when missing from the settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
	pub section_marker: String,
	pub section_terminators: Vec<String>,
	pub empty_section_marker: String,
	pub header_background: String,
	pub max_label_len: usize,
	pub min_row_cells: usize,
	pub fallback_encoding: String,
}

impl Default for ParserSettings {
	fn default() -> Self {
		Self {
			section_marker: DEFAULT_SECTION_MARKER.to_string(),
			section_terminators: vec!["Open Trades:".to_string(), "Working Orders:".to_string()],
			empty_section_marker: DEFAULT_EMPTY_SECTION_MARKER.to_string(),
			header_background: DEFAULT_HEADER_BACKGROUND.to_string(),
			max_label_len: DEFAULT_MAX_LABEL_LEN,
			min_row_cells: DEFAULT_MIN_ROW_CELLS,
			fallback_encoding: DEFAULT_FALLBACK_ENCODING.to_string(),
		}
	}
}

// Output models

/// One closed trade as read from a broker statement.
///
/// Monetary and quantity fields hold 0.0 both when the statement showed zero
/// and when the cell was missing or unreadable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
	pub id: Uuid,
	pub ticket: u64,
	pub open_time: Option<DateTime<Utc>>,
	#[serde(rename = "type")]
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

impl TradeRecord {
	/// Realised result of the trade including costs.
	pub fn net_result(&self) -> f64 {
		self.profit + self.commission + self.taxes + self.swap
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeSummary {
	pub total_trades: usize,
	pub short_positions: usize,
	pub long_positions: usize,
	pub profit_trades: usize,
	pub loss_trades: usize,
	pub gross_profit: f64,
	pub gross_loss: f64,
	pub net_profit: f64,
	pub profit_factor: f64,
	pub expected_payoff: f64,
	pub maximal_drawdown: f64,
	pub relative_drawdown: f64,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_partial_settings_keep_defaults() {
		let s: ParserSettings = serde_json::from_str(r#"{"section_marker": "Positions"}"#).unwrap();
		assert_eq!(s.section_marker, "Positions");
		assert_eq!(s.max_label_len, 20);
		assert_eq!(s.section_terminators, vec!["Open Trades:", "Working Orders:"]);
	}

	#[test]
	fn test_record_json_uses_camel_case() {
		let record = TradeRecord {
			id: Uuid::nil(),
			ticket: 1001,
			open_time: None,
			kind: "buy".to_string(),
			size: 1.0,
			item: "EURUSD".to_string(),
			open_price: 1.1,
			stop_loss: 0.0,
			take_profit: 0.0,
			close_time: None,
			close_price: 1.2,
			commission: -2.0,
			taxes: 0.0,
			swap: -0.5,
			profit: 45.0,
		};
		let v = serde_json::to_value(&record).unwrap();
		assert_eq!(v["type"], "buy");
		assert_eq!(v["closePrice"], 1.2);
		assert!(v["openTime"].is_null());
		assert_eq!(record.net_result(), 42.5);
	}
}

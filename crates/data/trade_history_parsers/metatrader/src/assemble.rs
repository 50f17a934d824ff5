use models::{ParserSettings, TradeRecord};
use scraper::ElementRef;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::fields::{extract_trade, ExtractedTrade};
use crate::header::ColumnMapping;
use crate::rows::{row_cells, RowFilter};
use crate::section::contains_text;

/// Low 62 bits of a UUIDv7 (`rand_b`), below the variant bits.
const RAND_B_MASK: u128 = (1 << 62) - 1;
const VERSION_7: u128 = 0x7 << 76;
const VARIANT_RFC4122: u128 = 0b10 << 62;

/// Hands out UUIDv7 identifiers that strictly increase within one extraction,
/// even when several rows are stamped in the same millisecond.
#[derive(Debug, Default)]
pub struct RecordIdGenerator {
    last: Option<Uuid>,
}

impl RecordIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> Uuid {
        let candidate = Uuid::now_v7();
        let id = match self.last {
            Some(last) if candidate <= last => successor(last),
            _ => candidate,
        };
        self.last = Some(id);
        id
    }
}

/// Smallest valid UUIDv7 above `last`: bump `rand_b`, or on overflow move to
/// the next millisecond with zeroed random bits.
fn successor(last: Uuid) -> Uuid {
    let bits = last.as_u128();
    if bits & RAND_B_MASK != RAND_B_MASK {
        return Uuid::from_u128(bits + 1);
    }
    let millis = (bits >> 80) + 1;
    Uuid::from_u128((millis << 80) | VERSION_7 | VARIANT_RFC4122)
}

impl ExtractedTrade {
    pub fn into_record(self, id: Uuid) -> TradeRecord {
        TradeRecord {
            id,
            ticket: self.ticket,
            open_time: self.open_time,
            kind: self.kind,
            size: self.size,
            item: self.item,
            open_price: self.open_price,
            stop_loss: self.stop_loss,
            take_profit: self.take_profit,
            close_time: self.close_time,
            close_price: self.close_price,
            commission: self.commission,
            taxes: self.taxes,
            swap: self.swap,
            profit: self.profit,
        }
    }
}

/// Runs filter and extractor over `rows` and keeps the rows that survive, in order.
pub fn assemble_records<'a>(
    rows: &[ElementRef<'a>],
    filter: &RowFilter<'a>,
    mapping: &ColumnMapping,
    settings: &ParserSettings,
) -> Vec<TradeRecord> {
    let mut ids = RecordIdGenerator::new();
    let mut records = Vec::new();

    for (idx, row) in rows.iter().enumerate() {
        let cells = row_cells(*row);

        if let Err(reason) = filter.check(idx, *row, &cells) {
            trace!(row = idx, ?reason, "Not a closed-trade row");
            continue;
        }

        if !settings.empty_section_marker.is_empty()
            && contains_text(*row, &settings.empty_section_marker)
        {
            continue;
        }

        match extract_trade(&cells, mapping, settings.max_label_len) {
            Ok(trade) => records.push(trade.into_record(ids.next_id())),
            Err(err) => debug!(row = idx, error = %err, "Failed to create trade record"),
        }
    }

    records
}

//! Human-facing document numbers derived from internal ids.
//!
//! Numbers are the prefix followed by the id zero-padded to six digits;
//! ids above 999999 are printed in full.

pub const PURCHASE_ORDER_PREFIX: &str = "PO";
pub const GOODS_RECEIPT_PREFIX: &str = "GRV";
pub const LINE_PREFIX: &str = "LINE";

pub fn document_number(prefix: &str, id: i64) -> String {
    format!("{}{:06}", prefix, id)
}

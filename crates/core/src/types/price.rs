//! Money display formatting.
//!
//! The API carries all money values as integer cents. Formatting stays in
//! integer arithmetic so values round-trip exactly.

/// Format integer cents as a USD display string.
///
/// `1999` becomes `"$19.99"`, `0` becomes `"$0.00"`. Negative amounts (refund
/// displays) render as `"-$0.50"`.
#[must_use]
pub fn format_price(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}${}.{:02}", abs / 100, abs % 100)
}

//! Text formatting of banner headers and cells.

/// Placeholder used in a segment label when the base count is unknown.
pub(crate) const UNKNOWN_BASE: &str = "NA";

/// Formats a segment header as "<name> (n=<base>)".
pub(crate) fn segment_label(name: &str, base: Option<i64>) -> String {
    match base {
        Some(base) => format!("{} (n={})", name, base),
        None => format!("{} (n={})", name, UNKNOWN_BASE),
    }
}

/// Fallback name of the segment at the given 0-based position.
pub(crate) fn default_segment_name(position: usize) -> String {
    format!("Segment {}", position + 1)
}

/// Formats a percentage share (0.337) and its frequency (42) as "33.7% (42)".
///
/// The frequency is truncated to its integer part.
pub(crate) fn format_cell(percentage: f64, frequency: f64) -> String {
    format!("{:.1}% ({})", percentage * 100.0, frequency.trunc() as i64)
}

/// Joins the non-blank significance codes of a row.
pub(crate) fn join_sig<'a, I: IntoIterator<Item = &'a str>>(codes: I) -> String {
    codes
        .into_iter()
        .map(|code| code.trim())
        .filter(|code| !code.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

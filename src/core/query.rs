/// Shortest query that triggers a search, in UTF-16 code units after trimming.
pub const MIN_QUERY_LEN: usize = 2;

/// Returns the query to send if it is long enough, `None` otherwise.
///
/// The text is forwarded as typed; trimming only decides acceptance. Length is
/// measured in UTF-16 code units, so a single astral character such as an
/// emoji already counts as two.
pub fn accept_query(query: &str) -> Option<&str> {
    if query.trim().encode_utf16().count() < MIN_QUERY_LEN {
        return None;
    }
    Some(query)
}

//! Pagination arithmetic for the two-slot merge.
//!
//! The global result list of a mirrored query is slot 0's matches followed by
//! slot 1's matches. A requested window `[offset, offset + count)` over that
//! list is answered by slot 0's part of the window plus a residual window
//! into slot 1.

/// A pagination window: skip `offset`, take at most `count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: usize,
    pub count: usize,
}

impl Window {
    pub fn new(offset: usize, count: usize) -> Self {
        Self { offset, count }
    }

    /// Everything from the first match on.
    pub fn unbounded() -> Self {
        Self {
            offset: 0,
            count: usize::MAX,
        }
    }

    /// Whether a first page of `returned` rows already fills this window.
    pub fn is_filled_by(&self, returned: usize) -> bool {
        returned >= self.count
    }

    /// The window into slot 1 that continues this window.
    ///
    /// `returned` is how many rows slot 0 gave for this window and `size0` is
    /// slot 0's total match count. If slot 0 changed between the two calls
    /// the offset saturates at zero instead of underflowing.
    pub fn residual(&self, returned: usize, size0: usize) -> Window {
        Window {
            offset: self.offset.saturating_add(returned).saturating_sub(size0),
            count: self.count.saturating_sub(returned),
        }
    }
}

/// The key of an `id:<key>` or `id:"<key>"` query.
///
/// Returns `None` for anything else, including an empty key and unquoted
/// keys containing whitespace (those are compound queries, not lookups).
pub fn parse_id_lookup<'a>(query: &'a str, id_field: &str) -> Option<&'a str> {
    let rest = query.strip_prefix(id_field)?.strip_prefix(':')?;

    let key = match rest.strip_prefix('"') {
        Some(quoted) => quoted.strip_suffix('"')?,
        None if rest.chars().any(char::is_whitespace) => return None,
        None => rest,
    };

    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

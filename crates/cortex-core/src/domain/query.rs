//! File listing query parameters
//!
//! Raw request parameters are accepted as loosely-typed strings and
//! normalised into a [`FileQuery`] that is always safe to execute:
//! page and limit are clamped, blank searches are dropped, and the sort
//! field is restricted to an allow-list of columns.

use serde::{Deserialize, Serialize};

use super::file_record::FileRecord;

/// Page size used when the caller gives none (or an unparseable one)
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Upper bound for a single page
pub const MAX_PAGE_LIMIT: u32 = 2000;

/// Query-string parameters as received from a caller
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilesParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

/// Allow-listed sort columns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Name,
    MimeType,
    Size,
    #[default]
    ModifiedTime,
    CreatedTime,
    IndexedAt,
}

impl SortField {
    /// Parses a caller-supplied field name, falling back to `modifiedTime`
    /// for anything outside the allow-list
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("name") => Self::Name,
            Some("mimeType") => Self::MimeType,
            Some("size") => Self::Size,
            Some("modifiedTime") => Self::ModifiedTime,
            Some("createdTime") => Self::CreatedTime,
            Some("indexedAt") => Self::IndexedAt,
            _ => Self::default(),
        }
    }

    /// Storage column backing this field
    pub fn column(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::MimeType => "mime_type",
            Self::Size => "size",
            Self::ModifiedTime => "modified_time",
            Self::CreatedTime => "created_time",
            Self::IndexedAt => "indexed_at",
        }
    }
}

/// Sort direction; anything other than `asc` means descending
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("asc") => Self::Asc,
            _ => Self::Desc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A normalised, always-valid listing query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileQuery {
    page: u32,
    limit: u32,
    search: Option<String>,
    sort_by: SortField,
    order: SortOrder,
}

impl Default for FileQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            search: None,
            sort_by: SortField::default(),
            order: SortOrder::default(),
        }
    }
}

impl FileQuery {
    /// Normalises raw parameters.
    ///
    /// - `page` below 1 (or unparseable) becomes 1
    /// - `limit` is clamped to `1..=MAX_PAGE_LIMIT`, defaulting to
    ///   [`DEFAULT_PAGE_LIMIT`] when missing or unparseable
    /// - `search` is trimmed; blank means no filter
    pub fn from_params(params: &ListFilesParams) -> Self {
        let page = params
            .page
            .as_deref()
            .and_then(parse_leading_int)
            .unwrap_or(1)
            .clamp(1, i64::from(u32::MAX));

        let limit = params
            .limit
            .as_deref()
            .and_then(parse_leading_int)
            .unwrap_or(i64::from(DEFAULT_PAGE_LIMIT))
            .clamp(1, i64::from(MAX_PAGE_LIMIT));

        let search = params
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Self {
            page: u32::try_from(page).unwrap_or(1),
            limit: u32::try_from(limit).unwrap_or(DEFAULT_PAGE_LIMIT),
            search,
            sort_by: SortField::parse_lenient(params.sort_by.as_deref()),
            order: SortOrder::parse_lenient(params.order.as_deref()),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn sort_by(&self) -> SortField {
        self.sort_by
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    /// Number of records to skip: `(page - 1) * limit`
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    /// `ceil(total / limit)`
    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.limit))
    }
}

/// One page of a user's files
#[derive(Debug, Clone)]
pub struct FilePage {
    pub files: Vec<FileRecord>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u64,
    pub limit: u32,
}

/// Parses an optional sign followed by leading digits, ignoring any
/// trailing garbage (`"12abc"` is 12). Saturates instead of overflowing.
fn parse_leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim();
    let (negative, digits) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };

    let digits: &str = &digits[..digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len())];
    if digits.is_empty() {
        return None;
    }

    let magnitude = digits.bytes().fold(0i64, |acc, b| {
        acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
    });
    Some(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<&str>, limit: Option<&str>) -> ListFilesParams {
        ListFilesParams {
            page: page.map(str::to_string),
            limit: limit.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_when_nothing_given() {
        let q = FileQuery::from_params(&ListFilesParams::default());
        assert_eq!(q.page(), 1);
        assert_eq!(q.limit(), DEFAULT_PAGE_LIMIT);
        assert_eq!(q.search(), None);
        assert_eq!(q.sort_by(), SortField::ModifiedTime);
        assert_eq!(q.order(), SortOrder::Desc);
        assert_eq!(q, FileQuery::default());
    }

    #[test]
    fn limit_is_clamped_to_range() {
        assert_eq!(FileQuery::from_params(&params(None, Some("99999"))).limit(), 2000);
        assert_eq!(FileQuery::from_params(&params(None, Some("0"))).limit(), 1);
        assert_eq!(FileQuery::from_params(&params(None, Some("-3"))).limit(), 1);
        assert_eq!(FileQuery::from_params(&params(None, Some("abc"))).limit(), 20);
        assert_eq!(
            FileQuery::from_params(&params(None, Some("99999999999999999999999"))).limit(),
            2000
        );
    }

    #[test]
    fn page_is_clamped_to_one() {
        let q = FileQuery::from_params(&params(Some("-5"), None));
        assert_eq!(q.page(), 1);
        assert_eq!(q.offset(), 0);

        assert_eq!(FileQuery::from_params(&params(Some("0"), None)).page(), 1);
        assert_eq!(FileQuery::from_params(&params(Some("x"), None)).page(), 1);
        assert_eq!(FileQuery::from_params(&params(Some("3"), None)).page(), 3);
    }

    #[test]
    fn leading_digits_are_parsed() {
        assert_eq!(parse_leading_int("12abc"), Some(12));
        assert_eq!(parse_leading_int(" 7 "), Some(7));
        assert_eq!(parse_leading_int("-"), None);
        assert_eq!(parse_leading_int(""), None);
    }

    #[test]
    fn offset_and_total_pages() {
        let q = FileQuery::from_params(&params(Some("3"), Some("10")));
        assert_eq!(q.offset(), 20);
        assert_eq!(q.total_pages(0), 0);
        assert_eq!(q.total_pages(10), 1);
        assert_eq!(q.total_pages(21), 3);
    }

    #[test]
    fn blank_search_is_no_filter() {
        let q = FileQuery::from_params(&ListFilesParams {
            search: Some("   ".to_string()),
            ..Default::default()
        });
        assert_eq!(q.search(), None);

        let q = FileQuery::from_params(&ListFilesParams {
            search: Some("  report ".to_string()),
            ..Default::default()
        });
        assert_eq!(q.search(), Some("report"));
    }

    #[test]
    fn sort_field_falls_back_for_unknown_values() {
        assert_eq!(SortField::parse_lenient(Some("size")), SortField::Size);
        assert_eq!(SortField::parse_lenient(Some("indexedAt")), SortField::IndexedAt);
        assert_eq!(
            SortField::parse_lenient(Some("name; DROP TABLE files")),
            SortField::ModifiedTime
        );
        assert_eq!(SortField::parse_lenient(Some("user_id")), SortField::ModifiedTime);
        assert_eq!(SortField::parse_lenient(None), SortField::ModifiedTime);
        assert_eq!(SortField::MimeType.column(), "mime_type");
    }

    #[test]
    fn order_defaults_to_desc() {
        assert_eq!(SortOrder::parse_lenient(Some("asc")), SortOrder::Asc);
        assert_eq!(SortOrder::parse_lenient(Some("ASC")), SortOrder::Desc);
        assert_eq!(SortOrder::parse_lenient(Some("sideways")), SortOrder::Desc);
        assert_eq!(SortOrder::Desc.as_sql(), "DESC");
    }
}

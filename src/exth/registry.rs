//! Static table of known EXTH record types.
//!
//! Labels follow the names used in the MobileRead MOBI documentation.
//! Unknown codes are not an error: callers get `None` / `false` and keep
//! the record as opaque bytes.

/// How the payload of a known record type is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Text in the book's character encoding.
    Text,
    /// Big-endian unsigned integer (usually 4 bytes).
    Integer,
    /// Flag stored as a single byte (or integer) where non-zero means true.
    Boolean,
    /// Date stored as text, e.g. `2011-04-03` or `2011-04-03T10:00:00+00:00`.
    Date,
    /// Binary blob with no useful text form.
    Binary,
}

struct KnownType {
    code: u32,
    label: &'static str,
    kind: ValueKind,
}

const fn known(code: u32, label: &'static str, kind: ValueKind) -> KnownType {
    KnownType { code, label, kind }
}

use ValueKind::{Binary, Boolean, Date, Integer, Text};

// Sorted by code.
static KNOWN_TYPES: &[KnownType] = &[
    known(100, "author", Text),
    known(101, "publisher", Text),
    known(102, "imprint", Text),
    known(103, "description", Text),
    known(104, "isbn", Text),
    known(105, "subject", Text),
    known(106, "publishing date", Date),
    known(107, "review", Text),
    known(108, "contributor", Text),
    known(109, "rights", Text),
    known(110, "subject code", Text),
    known(111, "type", Text),
    known(112, "source", Text),
    known(113, "asin", Text),
    known(114, "version number", Text),
    known(115, "sample", Boolean),
    known(116, "start reading", Integer),
    known(117, "adult", Text),
    known(118, "retail price", Text),
    known(119, "retail price currency", Text),
    known(121, "kf8 boundary offset", Integer),
    known(125, "resource count", Integer),
    known(129, "kf8 cover uri", Text),
    known(131, "unknown 131", Integer),
    known(200, "dictionary short name", Text),
    known(201, "cover offset", Integer),
    known(202, "thumb offset", Integer),
    known(203, "has fake cover", Boolean),
    known(204, "creator software", Integer),
    known(205, "creator major version", Integer),
    known(206, "creator minor version", Integer),
    known(207, "creator build number", Integer),
    known(208, "watermark", Binary),
    known(209, "tamper proof keys", Binary),
    known(300, "font signature", Binary),
    known(401, "clipping limit", Integer),
    known(402, "publisher limit", Integer),
    known(403, "unknown 403", Integer),
    known(404, "text to speech disabled", Boolean),
    known(405, "rental", Boolean),
    known(406, "rental expiration date", Binary),
    known(407, "unknown 407", Binary),
    known(450, "unknown 450", Binary),
    known(451, "unknown 451", Binary),
    known(452, "unknown 452", Binary),
    known(453, "unknown 453", Binary),
    known(501, "cde type", Text),
    known(502, "last update time", Date),
    known(503, "updated title", Text),
    known(504, "asin (copy)", Text),
    known(508, "title pronunciation", Text),
    known(517, "author pronunciation", Text),
    known(522, "title language", Text),
    known(524, "language", Text),
    known(525, "primary writing mode", Text),
    known(527, "page progression direction", Text),
    known(528, "override kindle fonts", Text),
    known(529, "original source description", Text),
    known(534, "input source type", Text),
    known(535, "creator build tag", Text),
    known(536, "hd image container info", Text),
    known(538, "hd image resolution", Text),
    known(542, "content checksum", Binary),
    known(547, "in memory", Text),
];

fn lookup(code: u32) -> Option<&'static KnownType> {
    KNOWN_TYPES
        .binary_search_by_key(&code, |t| t.code)
        .ok()
        .map(|i| &KNOWN_TYPES[i])
}

/// Whether `code` is a documented EXTH record type.
pub fn is_known_type(code: u32) -> bool {
    lookup(code).is_some()
}

/// Semantic label for a known type code.
pub fn description_for_type(code: u32) -> Option<&'static str> {
    lookup(code).map(|t| t.label)
}

/// Payload interpretation for a known type code.
pub fn value_kind(code: u32) -> Option<ValueKind> {
    lookup(code).map(|t| t.kind)
}

/// Whether the payload of `code` is a boolean flag.
pub fn is_boolean_type(code: u32) -> bool {
    value_kind(code) == Some(Boolean)
}

/// Whether the payload of `code` is a date string.
pub fn is_date_type(code: u32) -> bool {
    value_kind(code) == Some(Date)
}

/// Whether the payload of `code` is a big-endian integer.
pub fn is_integer_type(code: u32) -> bool {
    value_kind(code) == Some(Integer)
}

/// Reverse lookup used by the CLI (`--add author=...`).
pub fn type_for_description(label: &str) -> Option<u32> {
    let wanted = label.trim().to_lowercase().replace(['_', '-'], " ");
    KNOWN_TYPES.iter().find(|t| t.label == wanted).map(|t| t.code)
}

/// All known type codes in ascending order.
pub fn known_types() -> impl Iterator<Item = (u32, &'static str)> {
    KNOWN_TYPES.iter().map(|t| (t.code, t.label))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_sorted_and_unique() {
        for pair in KNOWN_TYPES.windows(2) {
            assert!(pair[0].code < pair[1].code, "{} >= {}", pair[0].code, pair[1].code);
        }
    }

    #[test]
    fn test_author_is_known() {
        assert!(is_known_type(100));
        assert_eq!(description_for_type(100), Some("author"));
    }

    #[test]
    fn test_unknown_type() {
        assert!(!is_known_type(99999));
        assert_eq!(description_for_type(99999), None);
        assert!(!is_boolean_type(99999));
        assert!(!is_date_type(99999));
    }

    #[test]
    fn test_classification() {
        assert!(is_boolean_type(404));
        assert!(is_date_type(106));
        assert!(is_integer_type(201));
        assert!(!is_boolean_type(100));
    }

    #[test]
    fn test_reverse_lookup() {
        assert_eq!(type_for_description("author"), Some(100));
        assert_eq!(type_for_description("Publishing-Date"), Some(106));
        assert_eq!(type_for_description("cover_offset"), Some(201));
        assert_eq!(type_for_description("nonsense"), None);
    }

    #[test]
    fn test_known_types_round_trip_labels() {
        let all: Vec<(u32, &str)> = known_types().collect();
        assert_eq!(all.len(), KNOWN_TYPES.len());
        assert!(all.contains(&(100, "author")));
        for (code, label) in all {
            assert_eq!(type_for_description(label), Some(code), "{label}");
        }
    }
}

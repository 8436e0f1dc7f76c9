use std::fmt::{Display, Formatter};
use std::sync::OnceLock;

/// Number of decimal digits in a tag's ordinal field.
pub const ORDINAL_WIDTH: usize = 5;

/// Length of the process-unique tag prefix, in characters.
pub const UNIQUE_PREFIX_LEN: usize = 16;

/// Size of the ordinal space, and therefore the most patterns a
/// single index can hold.
pub const MAX_PATTERNS: usize = 100_000;

/// Encoded length of a tag: prefix, kind char, ordinal.
pub(crate) const TAG_LEN: usize = UNIQUE_PREFIX_LEN + 1 + ORDINAL_WIDTH;

const KIND_LITERAL: char = '-';
const KIND_RESIDUAL: char = '*';

/// The prefix opening every encoded tag: 16 hex characters drawn from
/// process randomness, so the prefix cannot occur in real input and
/// tag parsing stays unambiguous.
pub(crate) fn unique_prefix() -> &'static str {
    static PREFIX: OnceLock<String> = OnceLock::new();
    PREFIX.get_or_init(|| format!("{:016X}", rand::random::<u64>()))
}

/// Which class of pattern a tag stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagKind {
    /// The hit alone proves the pattern matches; the ordinal is the
    /// pattern id.
    Literal,
    /// The hit only nominates a residual pattern for confirmation by
    /// its backing regex; the ordinal indexes the residual table.
    Residual,
}

/// A marker standing in for a literal hit during scanning.
///
/// Encodes to `<unique prefix><kind char><zero-padded ordinal>`, 22
/// characters total, with `-` for [`TagKind::Literal`] and `*` for
/// [`TagKind::Residual`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tag {
    /// Pattern class the tag stands for.
    pub kind: TagKind,
    /// Pattern id (literal) or residual table index (residual).
    pub ordinal: usize,
}

impl Tag {
    pub(crate) fn literal(pattern_id: usize) -> Self {
        debug_assert!(pattern_id < MAX_PATTERNS);
        Tag {
            kind: TagKind::Literal,
            ordinal: pattern_id,
        }
    }

    pub(crate) fn residual(ordinal: usize) -> Self {
        debug_assert!(ordinal < MAX_PATTERNS);
        Tag {
            kind: TagKind::Residual,
            ordinal,
        }
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            TagKind::Literal => KIND_LITERAL,
            TagKind::Residual => KIND_RESIDUAL,
        };
        write!(
            f,
            "{}{}{:0width$}",
            unique_prefix(),
            kind,
            self.ordinal,
            width = ORDINAL_WIDTH
        )
    }
}

/// Decodes the tag whose unique prefix starts at byte `at` of
/// `replaced`, returning it along with the offset one past its end.
///
/// The prefix cannot occur in real input, so anything other than a
/// well-formed tag after it means the index or the replaced text got
/// corrupted; that is not recoverable and panics.
pub(crate) fn decode(replaced: &str, at: usize) -> (Tag, usize) {
    let rest = &replaced.as_bytes()[at + UNIQUE_PREFIX_LEN..];
    assert!(
        rest.len() > ORDINAL_WIDTH,
        "truncated tag at byte {at} of replaced text"
    );
    let kind = match rest[0] as char {
        KIND_LITERAL => TagKind::Literal,
        KIND_RESIDUAL => TagKind::Residual,
        c => panic!("unknown tag kind {c:?} at byte {at} of replaced text"),
    };
    let ordinal = std::str::from_utf8(&rest[1..=ORDINAL_WIDTH])
        .ok()
        .and_then(|digits| digits.parse().ok())
        .unwrap_or_else(|| panic!("malformed tag ordinal at byte {at} of replaced text"));
    (Tag { kind, ordinal }, at + TAG_LEN)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn prefix_is_stable_and_hex() {
        let p = unique_prefix();
        assert_eq!(p.len(), UNIQUE_PREFIX_LEN);
        assert!(p.bytes().all(|b| b.is_ascii_hexdigit()));
        assert_eq!(p, unique_prefix());
    }

    #[test]
    fn roundtrip() {
        for tag in [Tag::literal(0), Tag::literal(42), Tag::residual(99_999)] {
            let encoded = tag.to_string();
            assert_eq!(encoded.len(), TAG_LEN);
            let text = format!("xy{encoded}z");
            let (decoded, next) = decode(&text, 2);
            assert_eq!(decoded, tag);
            assert_eq!(&text[next..], "z");
        }
    }

    #[test]
    #[should_panic(expected = "unknown tag kind")]
    fn bad_kind_is_fatal() {
        let text = format!("{}q00001", unique_prefix());
        decode(&text, 0);
    }

    #[test]
    #[should_panic(expected = "malformed tag ordinal")]
    fn bad_ordinal_is_fatal() {
        let text = format!("{}-12a45", unique_prefix());
        decode(&text, 0);
    }

    #[test]
    #[should_panic(expected = "truncated tag")]
    fn short_tag_is_fatal() {
        let text = format!("{}-12", unique_prefix());
        decode(&text, 0);
    }
}

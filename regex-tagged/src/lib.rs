#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::borrow::Cow;
use std::fmt::{Display, Formatter};

use aho_corasick::AhoCorasick;
use indexmap::IndexMap;

mod analyze;
mod int_set;
mod tag;

use analyze::Analysis;
use int_set::IntSet;

pub use analyze::{MAX_LITERALS, MIN_LITERAL_LEN};
pub use tag::{Tag, TagKind, MAX_PATTERNS, ORDINAL_WIDTH, UNIQUE_PREFIX_LEN};

/// Builder for a pattern index.
///
/// Patterns are classified as they are pushed: either expanded into
/// their full literal set, or kept as a compiled regex gated by a
/// main-literal indicator. [`Builder::build`] folds every literal of
/// every pattern into one Aho–Corasick automaton.
#[derive(Default)]
pub struct Builder {
    patterns: Vec<Analysis>,
}

/// Analysis error when adding a regex to the [`Builder`].
#[derive(Debug)]
pub enum ParseError {
    /// The pattern could not be parsed as a regex.
    SyntaxError(String),
    /// Literal expansion overflowed [`MAX_LITERALS`] and the longest
    /// substring guaranteed to occur in every match is shorter than
    /// [`MIN_LITERAL_LEN`], leaving nothing to index the pattern by.
    NotIndexable {
        /// Source of the offending pattern.
        pattern: String,
        /// The longest guaranteed literal that was found.
        longest: String,
    },
    /// The residual regex was too large to compile within the default
    /// limits.
    RegexTooLarge(usize),
    /// The index is full: [`MAX_PATTERNS`] patterns were already
    /// pushed.
    TooManyPatterns(usize),
}
impl std::error::Error for ParseError {}
impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::NotIndexable { pattern, longest } => write!(
                f,
                "pattern {pattern:?} cannot be indexed, longest guaranteed literal {longest:?} \
                 is shorter than {MIN_LITERAL_LEN}"
            ),
            e => write!(f, "{e:?}"),
        }
    }
}
impl From<regex_syntax::Error> for ParseError {
    fn from(value: regex_syntax::Error) -> Self {
        Self::SyntaxError(value.to_string())
    }
}
impl From<regex::Error> for ParseError {
    fn from(value: regex::Error) -> Self {
        match value {
            regex::Error::CompiledTooBig(v) => Self::RegexTooLarge(v),
            e => Self::SyntaxError(e.to_string()),
        }
    }
}

/// Error while compiling the builder to a pattern index.
#[derive(Debug)]
pub enum BuildError {
    /// Error while building the literal automaton.
    AutomatonError(aho_corasick::BuildError),
}
impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::AutomatonError(p) => Some(p),
        }
    }
}
impl Display for BuildError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
impl From<aho_corasick::BuildError> for BuildError {
    fn from(value: aho_corasick::BuildError) -> Self {
        Self::AutomatonError(value)
    }
}

impl Builder {
    /// Instantiate an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a single pattern into the builder. The pattern id
    /// reported by [`Patterns::matching`] is its zero-based push
    /// order.
    pub fn push(mut self, pattern: &str) -> Result<Self, ParseError> {
        if self.patterns.len() >= MAX_PATTERNS {
            return Err(ParseError::TooManyPatterns(self.patterns.len()));
        }
        self.patterns.push(analyze::analyze(pattern)?);
        Ok(self)
    }

    /// Push a batch of patterns into the builder.
    pub fn push_all<T, I>(self, i: I) -> Result<Self, ParseError>
    where
        T: AsRef<str>,
        I: IntoIterator<Item = T>,
    {
        i.into_iter().try_fold(self, |b, s| b.push(s.as_ref()))
    }

    /// Build the pattern index. Building from no patterns is useless
    /// but not an error.
    pub fn build(self) -> Result<Patterns, BuildError> {
        let count = self.patterns.len();

        // One automaton entry per distinct literal, mapped to every
        // tag it fires. Literal classifiers are inserted before
        // residual indicators so that a string owned by both kinds
        // lists its classifiers first.
        let mut literal_tags: IndexMap<String, Vec<Tag>> = IndexMap::new();
        let mut unconditional = Vec::new();
        for (id, analysis) in self.patterns.iter().enumerate() {
            let Analysis::Literalized(literals) = analysis else {
                continue;
            };
            // The empty literal occurs in every input: the pattern
            // matches unconditionally and needs no automaton entry.
            if literals.iter().any(String::is_empty) {
                unconditional.push(id);
                continue;
            }
            for literal in literals {
                literal_tags
                    .entry(literal.clone())
                    .or_default()
                    .push(Tag::literal(id));
            }
        }
        let mut residuals = Vec::new();
        for (id, analysis) in self.patterns.into_iter().enumerate() {
            let Analysis::Residual { main, regex } = analysis else {
                continue;
            };
            literal_tags
                .entry(main)
                .or_default()
                .push(Tag::residual(residuals.len()));
            residuals.push(Residual {
                pattern_id: id,
                regex,
            });
        }

        let searcher = AhoCorasick::builder()
            .prefilter(true)
            .build(literal_tags.keys())?;

        let replacements = literal_tags
            .values()
            .map(|tags| {
                let mut out = String::new();
                for tag in tags {
                    out.push(' ');
                    out.push_str(&tag.to_string());
                }
                out.push(' ');
                out
            })
            .collect();
        let tags = literal_tags.into_values().collect();

        Ok(Patterns {
            searcher,
            tags,
            replacements,
            residuals,
            unconditional,
            count,
        })
    }
}

#[derive(Debug)]
struct Residual {
    pattern_id: usize,
    regex: regex::Regex,
}

/// An immutable pattern index, able to report which of a *large*
/// number of regexes match a haystack in roughly the time of one
/// multi-string scan.
///
/// Queries wrap the haystack in `^`/`$` sentinel characters so that
/// anchor literals participate in ordinary substring matching; the
/// sentinels never appear in the reported results.
#[derive(Debug)]
pub struct Patterns {
    searcher: AhoCorasick,
    /// Tags fired per automaton pattern, parallel to `replacements`.
    tags: Vec<Vec<Tag>>,
    /// Pre-rendered ` tag… ` splice text per automaton pattern.
    replacements: Vec<String>,
    residuals: Vec<Residual>,
    /// Ids of patterns matching every input, in push order.
    unconditional: Vec<usize>,
    count: usize,
}

fn sentinelize(haystack: &str) -> String {
    format!("^{haystack}$")
}

impl Patterns {
    /// Number of patterns in the index.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the index holds no patterns at all.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Streams every tag fired by `text`, in scan order (position of
    /// the hit, left to right; overlapping hits all fire).
    ///
    /// `text` is searched as-is: callers wanting anchor literals to
    /// participate must add the `^`/`$` sentinels themselves.
    pub fn scan<'a>(&'a self, text: &'a str) -> impl Iterator<Item = Tag> + 'a {
        self.searcher
            .find_overlapping_iter(text)
            .flat_map(move |m| self.tags[m.pattern().as_usize()].iter().copied())
    }

    /// Rewrites `text` with every hit's tag spliced in, in scan
    /// order, each surrounded by single spaces. Returns
    /// [`Cow::Borrowed`] exactly when nothing fired, which makes the
    /// no-match case allocation-free and trivially detectable.
    pub fn replace_all<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let mut out = String::new();
        let mut copied = 0;
        for m in self.searcher.find_overlapping_iter(text) {
            if m.start() > copied {
                out.push_str(&text[copied..m.start()]);
                copied = m.start();
            }
            out.push_str(&self.replacements[m.pattern().as_usize()]);
            copied = copied.max(m.end());
        }
        if out.is_empty() {
            return Cow::Borrowed(text);
        }
        out.push_str(&text[copied..]);
        Cow::Owned(out)
    }

    /// Returns whether any pattern in the index matches the haystack.
    ///
    /// Consumes the tag stream directly and stops at the first
    /// literal classifier or confirmed residual.
    pub fn is_match(&self, haystack: &str) -> bool {
        if !self.unconditional.is_empty() {
            return true;
        }
        let text = sentinelize(haystack);
        let mut rejected = IntSet::new(self.residuals.len());
        for tag in self.scan(&text) {
            match tag.kind {
                TagKind::Literal => return true,
                TagKind::Residual => {
                    if rejected.contains(tag.ordinal) {
                        continue;
                    }
                    if self.residuals[tag.ordinal].regex.is_match(haystack) {
                        return true;
                    }
                    rejected.insert(tag.ordinal);
                }
            }
        }
        false
    }

    /// Returns the id of every matching pattern, in the scan order of
    /// the hit that first proved each of them (unconditional patterns
    /// first).
    ///
    /// Each id is reported at most once, however many times the
    /// pattern's literals fire in the haystack.
    pub fn matching(&self, haystack: &str) -> Vec<usize> {
        let mut ids = self.unconditional.clone();
        let text = sentinelize(haystack);
        let replaced = match self.replace_all(&text) {
            Cow::Borrowed(_) => return ids,
            Cow::Owned(replaced) => replaced,
        };

        let prefix = tag::unique_prefix();
        let mut seen = IntSet::new(self.count);
        let mut rejected = IntSet::new(self.count);
        let mut at = 0;
        while let Some(found) = replaced[at..].find(prefix) {
            let (tag, next) = tag::decode(&replaced, at + found);
            at = next;
            match tag.kind {
                TagKind::Literal => {
                    if seen.insert(tag.ordinal) {
                        ids.push(tag.ordinal);
                    }
                }
                TagKind::Residual => {
                    let residual = &self.residuals[tag.ordinal];
                    // one regex evaluation per pattern per query; a
                    // repeated indicator changes nothing either way
                    if seen.contains(residual.pattern_id) || rejected.contains(residual.pattern_id)
                    {
                        continue;
                    }
                    if residual.regex.is_match(haystack) {
                        seen.insert(residual.pattern_id);
                        ids.push(residual.pattern_id);
                    } else {
                        rejected.insert(residual.pattern_id);
                    }
                }
            }
        }
        ids
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn build(patterns: &[&str]) -> Patterns {
        Builder::new().push_all(patterns).unwrap().build().unwrap()
    }

    #[test]
    fn empty_index() {
        let p = build(&[]);
        assert!(p.is_empty());
        assert!(!p.is_match("foo"));
        assert_eq!(p.matching("foo"), vec![]);
    }

    #[test]
    fn empty_pattern_matches_everything() {
        let p = build(&[""]);
        assert_eq!(p.matching("0123"), vec![0]);
        assert!(p.is_match(""));
    }

    #[test]
    fn single_literal() {
        let p = build(&["Googlebot"]);
        assert_eq!(p.matching("Mozilla/5.0 (compatible; Googlebot/2.1)"), vec![0]);
        assert!(p.is_match("Mozilla/5.0 (compatible; Googlebot/2.1)"));
        assert_eq!(p.matching("Mozilla/5.0 AppleWebKit Safari (human)"), vec![]);
        assert!(!p.is_match("Mozilla/5.0 AppleWebKit Safari (human)"));
    }

    #[test]
    fn nested_literals_both_fire() {
        let p = build(&["AdsBot-Google", "AdsBot-Google-Mobile"]);
        assert_eq!(p.matching("AdsBot-Google-Mobile"), vec![0, 1]);
        assert_eq!(p.matching("AdsBot-Google (+http://www.google.com/adsbot.html)"), vec![0]);
    }

    #[test]
    fn ids_follow_scan_order() {
        let p = build(&["foo", "bar"]);
        assert_eq!(p.matching("bar foo"), vec![1, 0]);
    }

    #[test]
    fn class_expansion_matches_each_variant() {
        let p = build(&["[Ss]lurp"]);
        assert_eq!(p.matching("Yahoo! Slurp"), vec![0]);
        assert_eq!(p.matching("yahoo! slurp"), vec![0]);
        assert_eq!(p.matching("Yahoo! SLURP"), vec![]);
    }

    #[test]
    fn residual_needs_regex_confirmation() {
        let p = build(&["too many [aA][lL][tT][eE][rR][nN][aA][tT][iI][oO][nN][sS]"]);
        assert_eq!(p.matching("too many ALTERNATIONs"), vec![0]);
        assert!(p.is_match("too many ALTERNATIONs"));
        // indicator fires, regex says no
        assert_eq!(p.matching("too many potatoes"), vec![]);
        assert!(!p.is_match("too many potatoes"));
    }

    #[test]
    fn word_boundary_matches_through_residual_path() {
        let p = build(&[r"\d+bot"]);
        assert_eq!(p.matching("99bot/1.0"), vec![0]);
        assert_eq!(p.matching("robot"), vec![]);
    }

    #[test]
    fn literal_owner_reported_alongside_residual_verdict() {
        let p = build(&["Googlebot-Mobile", "Googlebot.*Safari"]);
        // the residual indicator "Googlebot" fires but its regex
        // fails; the literal classifier must still come through
        assert_eq!(p.matching("Googlebot-Mobile"), vec![0]);
        // ids in scan order: the indicator's hit ends first
        assert_eq!(p.matching("Googlebot-Mobile Safari"), vec![1, 0]);
    }

    #[test]
    fn start_anchor() {
        let p = build(&["^curl"]);
        assert_eq!(p.matching("curl/7.5"), vec![0]);
        assert_eq!(p.matching("uses curl/7.5"), vec![]);
    }

    #[test]
    fn end_anchor() {
        let p = build(&["trailer$"]);
        assert_eq!(p.matching("x trailer"), vec![0]);
        assert_eq!(p.matching("trailer x"), vec![]);
    }

    #[test]
    fn empty_haystack_only_matches_empty_shapes() {
        let p = build(&["Googlebot", "^$"]);
        assert_eq!(p.matching(""), vec![1]);
        assert!(p.is_match(""));
    }

    #[test]
    fn repeated_hits_are_reported_once() {
        let p = build(&["abc"]);
        assert_eq!(p.matching("abc abc"), vec![0]);

        let p = build(&["abcd.*xy"]);
        assert_eq!(p.matching("abcd abcd xy"), vec![0]);
    }

    #[test]
    fn unconditional_ids_come_first() {
        let p = build(&["(abc)?", "xyz"]);
        assert_eq!(p.matching("xyz"), vec![0, 1]);
        assert_eq!(p.matching("qqq"), vec![0]);
        assert!(p.is_match("qqq"));
    }

    #[test]
    fn replace_all_is_borrowed_iff_nothing_fired() {
        let p = build(&["foo"]);
        assert!(matches!(p.replace_all("no hits here"), Cow::Borrowed(_)));
        let replaced = p.replace_all("a foo b");
        assert!(matches!(replaced, Cow::Owned(_)));
        assert!(replaced.starts_with("a  "));
        assert!(replaced.ends_with("  b"));
        assert!(replaced.contains(tag::unique_prefix()));
    }

    #[test]
    fn scan_streams_tags_in_position_order() {
        let p = build(&["foo", "bar"]);
        let tags: Vec<_> = p.scan("bar foo").collect();
        assert_eq!(
            tags,
            vec![
                Tag { kind: TagKind::Literal, ordinal: 1 },
                Tag { kind: TagKind::Literal, ordinal: 0 },
            ],
        );
    }

    #[test]
    #[should_panic(expected = "unknown tag kind")]
    fn pathological_prefix_in_input_is_fatal() {
        let p = build(&["foo"]);
        // 16 process-random hex characters occurring in a real input
        // is astronomically improbable; if it happens anyway, tag
        // decoding must fault rather than misreport
        p.matching(&format!("{}Q foo", tag::unique_prefix()));
    }

    #[test]
    fn syntax_error_surfaces() {
        assert!(matches!(
            Builder::new().push("(unclosed"),
            Err(ParseError::SyntaxError(_)),
        ));
    }
}

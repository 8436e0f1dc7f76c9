use std::collections::BTreeSet;
use std::ops::Deref;

use itertools::iproduct;
use regex_syntax::hir::{self, Hir, HirKind, Look};

use crate::ParseError;

/// Hard cap on the number of literals a single pattern may expand to.
pub const MAX_LITERALS: usize = 100;

/// Minimum length, in bytes, for a residual pattern's main literal.
pub const MIN_LITERAL_LEN: usize = 3;

/// Build-time classification of one pattern.
#[derive(Debug)]
pub(crate) enum Analysis {
    /// The pattern matches exactly the inputs containing one of these
    /// substrings. Canonically ordered, shortest first.
    Literalized(Vec<String>),
    /// The pattern needs its backing regex; `main` is a substring
    /// guaranteed to occur in every match, used to gate the regex.
    Residual { main: String, regex: regex::Regex },
}

pub(crate) fn analyze(pattern: &str) -> Result<Analysis, ParseError> {
    let hir = regex_syntax::parse(pattern)?;
    if let Some(set) = expand(&hir, MAX_LITERALS) {
        return Ok(Analysis::Literalized(simplify(set).collect()));
    }
    let main = longest_required(&hir);
    if main.len() < MIN_LITERAL_LEN {
        return Err(ParseError::NotIndexable {
            pattern: pattern.to_owned(),
            longest: main,
        });
    }
    let regex = regex::Regex::new(pattern)?;
    Ok(Analysis::Residual { main, regex })
}

// Sorting shortest-first lets `simplify` find containments by only
// looking at following siblings, and doubles as the canonical literal
// order.
#[derive(PartialEq, Eq, Debug, Clone)]
struct ShortestFirst(String);
impl Deref for ShortestFirst {
    type Target = String;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl Ord for ShortestFirst {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}
impl PartialOrd for ShortestFirst {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

type Literals = BTreeSet<ShortestFirst>;

fn singleton(s: String) -> Literals {
    [ShortestFirst(s)].into()
}

/// Drops every literal which contains another (non-empty) literal of
/// the set: an occurrence of the shorter one already proves the
/// pattern, so scanning for the longer one too is useless.
fn simplify(literals: Literals) -> impl Iterator<Item = String> {
    let mut keep = vec![true; literals.len()];
    let mut e = literals.iter().enumerate();
    while let Some((i, s)) = e.next() {
        if s.is_empty() || !keep[i] {
            continue;
        }

        for (kept, (_, longer)) in keep[i..].iter_mut().skip(1).zip(e.clone()) {
            if *kept && longer.len() > s.len() && longer.0.contains(&s.0) {
                *kept = false;
            }
        }
    }

    std::iter::zip(keep, literals)
        .filter(|v| v.0)
        .map(|v| v.1 .0)
}

/// Expands the HIR into the finite set of substrings whose
/// disjunction is equivalent to it, or `None` when the node is
/// unsupported or the set would exceed `budget`.
///
/// Start/end anchors become the `^`/`$` characters the query engine
/// wraps its input in.
fn expand(hir: &Hir, budget: usize) -> Option<Literals> {
    Some(match hir.kind() {
        HirKind::Empty => singleton(String::new()),
        HirKind::Literal(hir::Literal(data)) => singleton(std::str::from_utf8(data).ok()?.into()),
        HirKind::Class(cls) => {
            let uc;
            let c = match cls {
                hir::Class::Unicode(c) => c,
                hir::Class::Bytes(b) => {
                    uc = b.to_unicode_class()?;
                    &uc
                }
            };
            // An empty class (e.g. `[a&&b]`) matches nothing and
            // expands to the empty disjunction.
            let mut set = Literals::new();
            for range in c.iter() {
                for ch in range.start()..=range.end() {
                    set.insert(ShortestFirst(ch.to_string()));
                    if set.len() > budget {
                        return None;
                    }
                }
            }
            set
        }
        HirKind::Look(look) => match look {
            Look::Start | Look::StartLF | Look::StartCRLF => singleton("^".into()),
            Look::End | Look::EndLF | Look::EndCRLF => singleton("$".into()),
            // word boundaries, and whatever regex-syntax grows next
            _ => return None,
        },
        HirKind::Capture(cap) => expand(&cap.sub, budget)?,
        HirKind::Repetition(rep) => {
            // `?` adds the empty string to its child's set; any other
            // repetition has unbounded (or just unhelpfully large)
            // cardinality.
            if (rep.min, rep.max) != (0, Some(1)) {
                return None;
            }
            let mut set = expand(&rep.sub, budget)?;
            set.insert(ShortestFirst(String::new()));
            if set.len() > budget {
                return None;
            }
            set
        }
        HirKind::Concat(subs) => {
            let mut acc = singleton(String::new());
            for sub in subs {
                let set = expand(sub, budget)?;
                acc = iproduct!(&acc, &set)
                    .map(|(a, b)| {
                        let mut s = String::with_capacity(a.len() + b.len());
                        s.push_str(a);
                        s.push_str(b);
                        ShortestFirst(s)
                    })
                    .collect();
                if acc.len() > budget {
                    return None;
                }
            }
            acc
        }
        HirKind::Alternation(subs) => {
            let mut acc = Literals::new();
            for sub in subs {
                acc.append(&mut expand(sub, budget)?);
                if acc.len() > budget {
                    return None;
                }
            }
            acc
        }
    })
}

/// Returns a substring guaranteed to occur in every match of the HIR,
/// preferring the longest one visible without weighing alternatives;
/// `""` when nothing is guaranteed.
fn longest_required(hir: &Hir) -> String {
    match hir.kind() {
        HirKind::Literal(hir::Literal(data)) => {
            std::str::from_utf8(data).map(str::to_owned).unwrap_or_default()
        }
        HirKind::Look(look) => match look {
            Look::Start | Look::StartLF | Look::StartCRLF => "^".into(),
            Look::End | Look::EndLF | Look::EndCRLF => "$".into(),
            _ => String::new(),
        },
        HirKind::Capture(cap) => longest_required(&cap.sub),
        // a repetition matched at least once must contain its child's
        // required substring; an optional one guarantees nothing
        HirKind::Repetition(rep) if rep.min >= 1 => longest_required(&rep.sub),
        // every match contains every child's required substring, so
        // the longest child result is itself a required substring
        HirKind::Concat(subs) => subs
            .iter()
            .map(longest_required)
            .max_by_key(String::len)
            .unwrap_or_default(),
        // classes, alternations, `*`/`?`, and unknown kinds guarantee
        // no particular substring
        _ => String::new(),
    }
}

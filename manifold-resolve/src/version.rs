use std::cmp::Ordering;
use std::fmt;

/// A version string with Maven-style ordering.
///
/// The string is split on `.`, `-`, `_` and on digit/letter transitions.
/// Numeric items compare numerically, qualifiers rank
/// `alpha < beta < milestone < rc < snapshot < release < sp`, and unknown
/// qualifiers sort after all known ones. Missing trailing items compare as
/// zero/release, so `1 == 1.0 == 1.0.0` and `1.0-rc1 < 1.0`.
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    Num(u64),
    Qual(String),
}

const RELEASE_RANK: u8 = 5;
const UNKNOWN_RANK: u8 = 7;

fn qualifier_rank(q: &str) -> u8 {
    match q {
        "alpha" | "a" => 0,
        "beta" | "b" => 1,
        "milestone" | "m" => 2,
        "rc" | "cr" => 3,
        "snapshot" => 4,
        "" | "ga" | "final" | "release" => RELEASE_RANK,
        "sp" => 6,
        _ => UNKNOWN_RANK,
    }
}

fn tokenize(raw: &str) -> Vec<Item> {
    fn flush(buf: &mut String, digits: bool, out: &mut Vec<Item>) {
        if buf.is_empty() {
            return;
        }
        let item = if digits {
            Item::Num(buf.parse().unwrap_or(u64::MAX))
        } else {
            Item::Qual(buf.to_ascii_lowercase())
        };
        out.push(item);
        buf.clear();
    }

    let mut out = Vec::new();
    let mut buf = String::new();
    let mut digits = false;
    for c in raw.chars() {
        if matches!(c, '.' | '-' | '_') {
            flush(&mut buf, digits, &mut out);
            continue;
        }
        let is_digit = c.is_ascii_digit();
        if !buf.is_empty() && is_digit != digits {
            flush(&mut buf, digits, &mut out);
        }
        digits = is_digit;
        buf.push(c);
    }
    flush(&mut buf, digits, &mut out);
    normalize(out)
}

/// Drop zeros and release qualifiers that end the version or precede a
/// qualifier, so `1.0.0-rc1` and `1-rc1` compare equal.
fn normalize(items: Vec<Item>) -> Vec<Item> {
    let mut kept = Vec::with_capacity(items.len());
    let mut at_boundary = true;
    for item in items.into_iter().rev() {
        let is_null = match &item {
            Item::Num(n) => *n == 0,
            Item::Qual(q) => qualifier_rank(q) == RELEASE_RANK,
        };
        if is_null && at_boundary {
            continue;
        }
        at_boundary = matches!(item, Item::Qual(_));
        kept.push(item);
    }
    kept.reverse();
    kept
}

fn cmp_against_release(item: &Item) -> Ordering {
    match item {
        Item::Num(0) => Ordering::Equal,
        Item::Num(_) => Ordering::Greater,
        Item::Qual(q) => qualifier_rank(q).cmp(&RELEASE_RANK),
    }
}

fn cmp_items(a: &Item, b: &Item) -> Ordering {
    match (a, b) {
        (Item::Num(x), Item::Num(y)) => x.cmp(y),
        (Item::Num(_), Item::Qual(_)) => Ordering::Greater,
        (Item::Qual(_), Item::Num(_)) => Ordering::Less,
        (Item::Qual(x), Item::Qual(y)) => {
            let (rx, ry) = (qualifier_rank(x), qualifier_rank(y));
            if rx == UNKNOWN_RANK && ry == UNKNOWN_RANK {
                x.cmp(y)
            } else {
                rx.cmp(&ry)
            }
        }
    }
}

impl Version {
    pub fn parse(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            items: tokenize(raw),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_snapshot(&self) -> bool {
        self.items
            .iter()
            .any(|i| matches!(i, Item::Qual(q) if q == "snapshot"))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.items.len().max(other.items.len());
        for i in 0..len {
            let ord = match (self.items.get(i), other.items.get(i)) {
                (Some(a), Some(b)) => cmp_items(a, b),
                (Some(a), None) => cmp_against_release(a),
                (None, Some(b)) => cmp_against_release(b).reverse(),
                (None, None) => Ordering::Equal,
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// How a requested version string selects among available versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSelector {
    /// A fixed version.
    Exact(String),
    /// `1.2.+`: the highest version starting with `1.2.`.
    Prefix(String),
    /// `+` or `latest.release`: the highest non-snapshot version.
    Latest,
}

impl VersionSelector {
    pub fn parse(raw: &str) -> Self {
        if raw == "+" || raw == "latest.release" {
            VersionSelector::Latest
        } else if let Some(prefix) = raw.strip_suffix('+') {
            VersionSelector::Prefix(prefix.to_string())
        } else {
            VersionSelector::Exact(raw.to_string())
        }
    }

    pub fn is_dynamic(&self) -> bool {
        !matches!(self, VersionSelector::Exact(_))
    }

    /// Pick the best available version. `Exact` selectors only match themselves.
    pub fn select<'a>(&self, available: &'a [String]) -> Option<&'a String> {
        match self {
            VersionSelector::Exact(v) => available.iter().find(|a| *a == v),
            VersionSelector::Prefix(prefix) => available
                .iter()
                .filter(|a| a.starts_with(prefix.as_str()))
                .max_by_key(|a| Version::parse(a)),
            VersionSelector::Latest => available
                .iter()
                .filter(|a| !Version::parse(a).is_snapshot())
                .max_by_key(|a| Version::parse(a)),
        }
    }
}

//! Version parsing and ordering
//!
//! Implements the PEP 440 subset that actually occurs in lockfiles: epoch,
//! dotted release, pre/post/dev releases and local segments, with the PEP 440
//! total order (release segments compare zero-padded, and within one release
//! dev < pre < final < post).

use std::cmp::Ordering;
use std::fmt;

use crate::error::{LockError, LockResult};

/// Pre-release phase, in ascending precedence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PreKind {
    Alpha,
    Beta,
    Rc,
}

impl PreKind {
    fn as_str(self) -> &'static str {
        match self {
            PreKind::Alpha => "a",
            PreKind::Beta => "b",
            PreKind::Rc => "rc",
        }
    }
}

/// One segment of a local version label (`+cu118`, `+deadbeef.2`)
#[derive(Debug, Clone, PartialEq, Eq)]
enum LocalSegment {
    Str(String),
    Num(u64),
}

impl PartialOrd for LocalSegment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LocalSegment {
    fn cmp(&self, other: &Self) -> Ordering {
        // Numeric local segments sort after alphanumeric ones
        match (self, other) {
            (LocalSegment::Num(a), LocalSegment::Num(b)) => a.cmp(b),
            (LocalSegment::Str(a), LocalSegment::Str(b)) => a.cmp(b),
            (LocalSegment::Num(_), LocalSegment::Str(_)) => Ordering::Greater,
            (LocalSegment::Str(_), LocalSegment::Num(_)) => Ordering::Less,
        }
    }
}

/// A parsed package version
///
/// Equality and ordering follow PEP 440, so `1.0` equals `1.0.0` and
/// `1.0rc1` sorts below `1.0` but above `1.0b3`.
#[derive(Debug, Clone)]
pub struct Version {
    epoch: u64,
    release: Vec<u64>,
    pre: Option<(PreKind, u64)>,
    post: Option<u64>,
    dev: Option<u64>,
    local: Vec<LocalSegment>,
}

/// Comparison key segment: a value bounded below and above
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Bound<T> {
    NegInf,
    Val(T),
    PosInf,
}

impl Version {
    /// Parse a version string
    pub fn parse(text: &str) -> LockResult<Self> {
        let invalid = || LockError::InvalidVersion {
            text: text.to_string(),
        };

        let s = text.trim().to_ascii_lowercase();
        let s = s.strip_prefix('v').unwrap_or(&s);

        let (head, local) = match s.split_once('+') {
            Some((head, local)) => (head, parse_local(local).ok_or_else(invalid)?),
            None => (s, Vec::new()),
        };

        let (epoch, rest) = match head.split_once('!') {
            Some((e, rest)) => (e.parse::<u64>().map_err(|_| invalid())?, rest),
            None => (0, head),
        };

        let bytes = rest.as_bytes();
        let mut i = 0;
        let mut release = Vec::new();
        loop {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if start == i {
                return Err(invalid());
            }
            release.push(rest[start..i].parse::<u64>().map_err(|_| invalid())?);
            if i + 1 < bytes.len() && bytes[i] == b'.' && bytes[i + 1].is_ascii_digit() {
                i += 1;
            } else {
                break;
            }
        }

        let mut pre = None;
        let mut post = None;
        let mut dev = None;

        let mut suffix = &rest[i..];
        while !suffix.is_empty() {
            let had_sep = matches!(suffix.as_bytes()[0], b'.' | b'-' | b'_');
            let sep = suffix.as_bytes()[0];
            let body = if had_sep { &suffix[1..] } else { suffix };

            // `1.0-2` is an implicit post release
            if had_sep && sep == b'-' && body.bytes().next().is_some_and(|b| b.is_ascii_digit()) {
                let (digits, rest) = take_digits(body);
                if post.is_some() {
                    return Err(invalid());
                }
                post = Some(digits.parse::<u64>().map_err(|_| invalid())?);
                suffix = rest;
                continue;
            }

            let (tag, after_tag) = take_letters(body);
            if tag.is_empty() {
                return Err(invalid());
            }
            let after_tag = strip_one_sep(after_tag);
            let (digits, rest) = take_digits(after_tag);
            let n = if digits.is_empty() {
                0
            } else {
                digits.parse::<u64>().map_err(|_| invalid())?
            };

            match tag {
                "a" | "alpha" => set_once(&mut pre, (PreKind::Alpha, n)).ok_or_else(invalid)?,
                "b" | "beta" => set_once(&mut pre, (PreKind::Beta, n)).ok_or_else(invalid)?,
                "rc" | "c" | "pre" | "preview" => {
                    set_once(&mut pre, (PreKind::Rc, n)).ok_or_else(invalid)?;
                }
                "post" | "rev" | "r" => set_once(&mut post, n).ok_or_else(invalid)?,
                "dev" => set_once(&mut dev, n).ok_or_else(invalid)?,
                _ => return Err(invalid()),
            }
            suffix = rest;
        }

        Ok(Self {
            epoch,
            release,
            pre,
            post,
            dev,
            local,
        })
    }

    /// Smallest version with the given release: its `.dev0` floor. Used as
    /// the exclusive upper bound of caret and tilde ranges.
    pub(crate) fn dev_floor(epoch: u64, release: Vec<u64>) -> Self {
        Self {
            epoch,
            release,
            pre: None,
            post: None,
            dev: Some(0),
            local: Vec::new(),
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Release segments as written (no zero padding)
    pub fn release(&self) -> &[u64] {
        &self.release
    }

    /// Release segment at `index`, zero-padded
    pub fn release_at(&self, index: usize) -> u64 {
        self.release.get(index).copied().unwrap_or(0)
    }

    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some() || self.dev.is_some()
    }

    pub fn is_postrelease(&self) -> bool {
        self.post.is_some()
    }

    pub fn has_local(&self) -> bool {
        !self.local.is_empty()
    }

    /// Release-prefix match used by wildcard constraints (`1.2.*`)
    pub fn release_starts_with(&self, prefix: &[u64]) -> bool {
        prefix
            .iter()
            .enumerate()
            .all(|(i, &seg)| self.release_at(i) == seg)
    }

    fn cmp_key(&self) -> impl Ord + '_ {
        // PEP 440: a dev release with no pre/post sorts below every
        // pre-release of the same release; a final release sorts above all
        // pre-releases.
        let pre_key = match self.pre {
            Some(pre) => Bound::Val(pre),
            None if self.post.is_none() && self.dev.is_some() => Bound::NegInf,
            None => Bound::PosInf,
        };
        let post_key = match self.post {
            Some(n) => Bound::Val(n),
            None => Bound::NegInf,
        };
        let dev_key = match self.dev {
            Some(n) => Bound::Val(n),
            None => Bound::PosInf,
        };
        (pre_key, post_key, dev_key, &self.local)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.epoch.cmp(&other.epoch) {
            Ordering::Equal => {}
            unequal => return unequal,
        }
        let width = self.release.len().max(other.release.len());
        for i in 0..width {
            match self.release_at(i).cmp(&other.release_at(i)) {
                Ordering::Equal => {}
                unequal => return unequal,
            }
        }
        self.cmp_key().cmp(&other.cmp_key())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}!", self.epoch)?;
        }
        let release: Vec<String> = self.release.iter().map(u64::to_string).collect();
        write!(f, "{}", release.join("."))?;
        if let Some((kind, n)) = self.pre {
            write!(f, "{}{}", kind.as_str(), n)?;
        }
        if let Some(n) = self.post {
            write!(f, ".post{n}")?;
        }
        if let Some(n) = self.dev {
            write!(f, ".dev{n}")?;
        }
        if !self.local.is_empty() {
            let segments: Vec<String> = self
                .local
                .iter()
                .map(|seg| match seg {
                    LocalSegment::Str(s) => s.clone(),
                    LocalSegment::Num(n) => n.to_string(),
                })
                .collect();
            write!(f, "+{}", segments.join("."))?;
        }
        Ok(())
    }
}

fn parse_local(s: &str) -> Option<Vec<LocalSegment>> {
    if s.is_empty() {
        return None;
    }
    s.split(['.', '-', '_'])
        .map(|seg| {
            if seg.is_empty() || !seg.bytes().all(|b| b.is_ascii_alphanumeric()) {
                None
            } else if seg.bytes().all(|b| b.is_ascii_digit()) {
                seg.parse().ok().map(LocalSegment::Num)
            } else {
                Some(LocalSegment::Str(seg.to_string()))
            }
        })
        .collect()
}

fn take_letters(s: &str) -> (&str, &str) {
    let end = s
        .bytes()
        .position(|b| !b.is_ascii_lowercase())
        .unwrap_or(s.len());
    s.split_at(end)
}

fn take_digits(s: &str) -> (&str, &str) {
    let end = s
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(s.len());
    s.split_at(end)
}

fn strip_one_sep(s: &str) -> &str {
    match s.as_bytes().first() {
        Some(b'.' | b'-' | b'_') => &s[1..],
        _ => s,
    }
}

fn set_once<T>(slot: &mut Option<T>, value: T) -> Option<()> {
    if slot.is_some() {
        return None;
    }
    *slot = Some(value);
    Some(())
}

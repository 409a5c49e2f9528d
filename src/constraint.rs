//! Version constraint expressions
//!
//! The expression grammar the external resolver records in dependency maps
//! and `python-versions` fields: `*`, caret (`^1.2.3`), tilde (`~1.2`),
//! PEP 440 comparison operators, wildcard suffixes (`3.0.*`), commas for
//! conjunction and `||` for disjunction.

use std::fmt;

use crate::error::{LockError, LockResult};
use crate::version::Version;

/// Comparison operators accepted in constraint clauses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Ne,
    Le,
    Ge,
    Lt,
    Gt,
}

/// One atomic clause of a constraint expression
#[derive(Debug, Clone)]
enum Predicate {
    Compare(Op, Version),
    /// Release-prefix match, e.g. `==3.0.*` / `!=3.0.*`
    Wildcard { negated: bool, prefix: Vec<u64> },
}

impl Predicate {
    fn matches(&self, version: &Version) -> bool {
        match self {
            Predicate::Compare(op, bound) => match op {
                Op::Eq => version == bound,
                Op::Ne => version != bound,
                Op::Le => version <= bound,
                Op::Ge => version >= bound,
                Op::Lt => version < bound,
                Op::Gt => version > bound,
            },
            Predicate::Wildcard { negated, prefix } => {
                version.release_starts_with(prefix) != *negated
            }
        }
    }
}

/// A parsed constraint expression: a disjunction of conjunctions
///
/// Keeps the original text for display, so diagnostics quote the lockfile
/// verbatim.
#[derive(Debug, Clone)]
pub struct VersionConstraint {
    text: String,
    groups: Vec<Vec<Predicate>>,
}

impl VersionConstraint {
    /// The unconstrained expression
    pub const ANY: &'static str = "*";

    /// Parse a constraint expression
    pub fn parse(text: &str) -> LockResult<Self> {
        let mut groups = Vec::new();
        for group in text.split("||") {
            let group = group.trim();
            if group.is_empty() {
                return Err(invalid(text, "empty alternative"));
            }
            let mut predicates = Vec::new();
            for clause in group.split(',') {
                let clause = clause.trim();
                if clause.is_empty() {
                    return Err(invalid(text, "empty clause"));
                }
                parse_clause(clause, text, &mut predicates)?;
            }
            groups.push(predicates);
        }
        if groups.is_empty() {
            return Err(invalid(text, "empty expression"));
        }
        Ok(Self {
            text: text.to_string(),
            groups,
        })
    }

    /// True when the expression accepts every version (`*`)
    pub fn is_any(&self) -> bool {
        self.groups.iter().any(Vec::is_empty)
    }

    /// Evaluate the expression against a version
    pub fn matches(&self, version: &Version) -> bool {
        self.groups
            .iter()
            .any(|group| group.iter().all(|p| p.matches(version)))
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

fn invalid(text: &str, reason: &str) -> LockError {
    LockError::InvalidConstraint {
        text: text.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_clause(clause: &str, text: &str, out: &mut Vec<Predicate>) -> LockResult<()> {
    if clause == VersionConstraint::ANY {
        // Always true; contributes no predicate
        return Ok(());
    }

    if let Some(rest) = clause.strip_prefix('^') {
        return parse_caret(rest.trim(), text, out);
    }
    if let Some(rest) = clause.strip_prefix("~=") {
        return parse_compatible(rest.trim(), text, out);
    }
    if let Some(rest) = clause.strip_prefix('~') {
        return parse_tilde(rest.trim(), text, out);
    }

    let (op, rest) = split_op(clause);
    let rest = rest.trim();
    if rest.is_empty() {
        return Err(invalid(text, "missing version after operator"));
    }

    if let Some(prefix) = rest.strip_suffix(".*").or_else(|| rest.strip_suffix(".x")) {
        let negated = match op {
            Some(Op::Ne) => true,
            Some(Op::Eq) | None => false,
            Some(_) => return Err(invalid(text, "wildcard only allowed with == or !=")),
        };
        let prefix = parse_release_prefix(prefix).ok_or_else(|| invalid(text, "bad wildcard"))?;
        out.push(Predicate::Wildcard { negated, prefix });
        return Ok(());
    }

    let version = Version::parse(rest).map_err(|_| invalid(text, "unparseable version"))?;
    // A bare version is an exact pin
    out.push(Predicate::Compare(op.unwrap_or(Op::Eq), version));
    Ok(())
}

fn split_op(clause: &str) -> (Option<Op>, &str) {
    for (token, op) in [
        ("===", Op::Eq),
        ("==", Op::Eq),
        ("!=", Op::Ne),
        ("<=", Op::Le),
        (">=", Op::Ge),
        ("<", Op::Lt),
        (">", Op::Gt),
    ] {
        if let Some(rest) = clause.strip_prefix(token) {
            return (Some(op), rest);
        }
    }
    (None, clause)
}

fn parse_caret(rest: &str, text: &str, out: &mut Vec<Predicate>) -> LockResult<()> {
    let lower = Version::parse(rest).map_err(|_| invalid(text, "unparseable caret version"))?;
    let release = lower.release();
    if release.is_empty() {
        return Err(invalid(text, "missing version after '^'"));
    }
    // Bump the leftmost non-zero segment; all-zero releases bump the last one
    let idx = release
        .iter()
        .position(|&seg| seg != 0)
        .unwrap_or(release.len() - 1);
    let mut upper: Vec<u64> = release[..=idx].to_vec();
    upper[idx] = bump(upper[idx]).ok_or_else(|| invalid(text, "release segment too large"))?;
    push_range(lower, &upper, out);
    Ok(())
}

fn parse_tilde(rest: &str, text: &str, out: &mut Vec<Predicate>) -> LockResult<()> {
    let lower = Version::parse(rest).map_err(|_| invalid(text, "unparseable tilde version"))?;
    let release = lower.release();
    if release.is_empty() {
        return Err(invalid(text, "missing version after '~'"));
    }
    // `~1.2.3` allows patch-level movement, `~1` minor-level
    let mut upper: Vec<u64> = if release.len() >= 2 {
        release[..2].to_vec()
    } else {
        release.to_vec()
    };
    if let Some(last) = upper.last_mut() {
        *last = bump(*last).ok_or_else(|| invalid(text, "release segment too large"))?;
    }
    push_range(lower, &upper, out);
    Ok(())
}

fn parse_compatible(rest: &str, text: &str, out: &mut Vec<Predicate>) -> LockResult<()> {
    let lower =
        Version::parse(rest).map_err(|_| invalid(text, "unparseable version after '~='"))?;
    let release = lower.release();
    // PEP 440: `~=X.Y.Z` means `>=X.Y.Z, ==X.Y.*`, so bump the second-to-last
    // written segment
    if release.len() < 2 {
        return Err(invalid(text, "'~=' needs at least two release segments"));
    }
    let mut upper: Vec<u64> = release[..release.len() - 1].to_vec();
    if let Some(last) = upper.last_mut() {
        *last = bump(*last).ok_or_else(|| invalid(text, "release segment too large"))?;
    }
    push_range(lower, &upper, out);
    Ok(())
}

fn bump(segment: u64) -> Option<u64> {
    segment.checked_add(1)
}

fn push_range(lower: Version, upper_release: &[u64], out: &mut Vec<Predicate>) {
    // The upper bound is a `.dev0` floor so pre-releases of the bound
    // itself fall outside the range.
    let upper = Version::dev_floor(lower.epoch(), upper_release.to_vec());
    out.push(Predicate::Compare(Op::Ge, lower));
    out.push(Predicate::Compare(Op::Lt, upper));
}

fn parse_release_prefix(s: &str) -> Option<Vec<u64>> {
    if s.is_empty() {
        return None;
    }
    s.split('.').map(|seg| seg.parse().ok()).collect()
}

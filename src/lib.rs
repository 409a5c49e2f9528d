//! pylock - parser, validator and inspector for Python dependency lockfiles
//!
//! A lockfile is a machine-generated manifest pinning exact package versions,
//! integrity hashes and transitive dependency constraints. pylock models that
//! artifact as typed records, parses and canonically re-serializes the TOML
//! wire format, and runs data-integrity checks over it (dependency closure,
//! hash well-formedness, constraint satisfaction).

pub mod check;
pub mod constraint;
pub mod diff;
pub mod error;
pub mod hash;
pub mod model;
pub mod parse;
pub mod version;
pub mod write;

// Re-exports for convenience
pub use check::{run_checks, CheckReport, CheckStatus, IntegrityCheck};
pub use constraint::VersionConstraint;
pub use diff::{diff, DiffEntry, LockfileDiff, VersionChange};
pub use error::{LockError, LockResult};
pub use hash::{ArtifactHash, HashAlgorithm};
pub use model::{
    normalize_name, split_requirement, Category, Dependency, DependencySpec, LockedPackage,
    Lockfile, Metadata, PackageFile, PackageSource,
};
pub use parse::{parse_file, parse_str};
pub use version::Version;
pub use write::{write_file, write_str};

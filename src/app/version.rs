//! Semantic version handling for manifest keys
//!
//! Version keys in the manifest are plain strings (`"1.2.3"`,
//! `"1.0.0-beta.2"`). All ordering decisions parse them as semantic versions
//! first, so `1.10.0` sorts above `1.9.0` and `1.0.0-beta.10` above
//! `1.0.0-beta.2`. Historic manifests written under string ordering may hold
//! keys that violate these rules; parse failures are therefore tolerated
//! wherever a legacy key could appear, and surface as validator findings
//! instead of panics.

use semver::Version;

use crate::constants::lifecycle::BETA_MARKER;
use crate::errors::VersionError;

/// Parse a manifest version string as a semantic version
pub fn parse(value: &str) -> Result<Version, VersionError> {
    Version::parse(value).map_err(|e| VersionError::Invalid {
        value: value.to_string(),
        source: e,
    })
}

/// Whether a version string parses as a semantic version
pub fn is_valid(value: &str) -> bool {
    parse(value).is_ok()
}

/// Whether a version key belongs to the beta track
pub fn is_beta_key(value: &str) -> bool {
    value.to_lowercase().contains(BETA_MARKER)
}

/// Whether `candidate` should replace `current` as the newest version
///
/// An unparseable `current` (a legacy key written under string ordering) is
/// always superseded; the caller has already validated `candidate`.
pub fn supersedes(candidate: &Version, current: &str) -> bool {
    match Version::parse(current) {
        Ok(current) => *candidate > current,
        Err(_) => true,
    }
}

/// Semantic maximum of a set of version keys, skipping unparseable ones
pub fn max_key<'a, I>(keys: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    keys.into_iter()
        .filter_map(|k| Version::parse(k).ok().map(|v| (v, k)))
        .max_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, k)| k)
}

//! Manifest validation rules
//!
//! Pure, side-effect-free checking of a loaded manifest document. The
//! validator works on raw JSON rather than the typed model so that a
//! manifest that *parses* but is structurally wrong (missing fields, a
//! scalar where a list belongs, a bad date string) is reported rule by
//! rule instead of failing one deserialization step.
//!
//! Every applicable rule runs against every applicable element; the result
//! is the complete defect set of the document, never just the first hit.

use std::fmt;

use chrono::NaiveDate;
use serde_json::Value;

use crate::app::catalog::PlatformCatalog;
use crate::app::version;
use crate::constants::dates::DATE_FORMAT;
use crate::constants::lifecycle::BETA_MARKER;

/// Identifier of a validation rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleId {
    RootRequiredFields,
    VersionFormat,
    BetaKeyMarker,
    VersionEntryFields,
    DateFormat,
    BetaExpiryRequired,
    PlatformFields,
    PlatformVersionMatch,
    UrlShape,
    ArchitectureType,
}

impl RuleId {
    /// Stable kebab-case identifier, used in reports and CI output
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::RootRequiredFields => "root-required-fields",
            RuleId::VersionFormat => "version-format",
            RuleId::BetaKeyMarker => "beta-key-marker",
            RuleId::VersionEntryFields => "version-entry-fields",
            RuleId::DateFormat => "date-format",
            RuleId::BetaExpiryRequired => "beta-expiry-required",
            RuleId::PlatformFields => "platform-fields",
            RuleId::PlatformVersionMatch => "platform-version-match",
            RuleId::UrlShape => "url-shape",
            RuleId::ArchitectureType => "architecture-type",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rule violation found in a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub rule: RuleId,
    pub message: String,
}

impl Violation {
    fn new(rule: RuleId, message: impl Into<String>) -> Self {
        Self {
            rule,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.rule, self.message)
    }
}

/// Validation context: the canonical downloads host and platform catalog
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Host every artifact URL must live under
    pub downloads_host: String,
    /// Capability table providing per-platform installer extensions
    pub catalog: PlatformCatalog,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            downloads_host: crate::constants::DEFAULT_DOWNLOADS_HOST.to_string(),
            catalog: PlatformCatalog::default(),
        }
    }
}

/// Validate a manifest document, returning every violation found
pub fn validate(manifest: &Value, config: &ValidatorConfig) -> Vec<Violation> {
    let mut violations = Vec::new();

    for field in ["latest", "versions", "minimum_supported"] {
        if manifest.get(field).is_none() {
            violations.push(Violation::new(
                RuleId::RootRequiredFields,
                format!("missing required field '{}'", field),
            ));
        }
    }

    if let Some(latest) = manifest.get("latest") {
        check_version_string(latest, "latest", &mut violations);
    }
    if let Some(latest_beta) = manifest.get("latest_beta") {
        check_version_string(latest_beta, "latest_beta", &mut violations);
    }
    if let Some(minimum) = manifest.get("minimum_supported") {
        check_version_string(minimum, "minimum_supported", &mut violations);
    }

    if let Some(versions) = manifest.get("versions") {
        check_track(versions, false, config, &mut violations);
    }
    if let Some(beta) = manifest.get("beta") {
        check_track(beta, true, config, &mut violations);
    }

    violations
}

fn check_version_string(value: &Value, field: &str, violations: &mut Vec<Violation>) {
    match value.as_str() {
        Some(s) if version::is_valid(s) => {}
        Some(s) => violations.push(Violation::new(
            RuleId::VersionFormat,
            format!("invalid version format in '{}': {}", field, s),
        )),
        None => violations.push(Violation::new(
            RuleId::VersionFormat,
            format!("'{}' is not a string", field),
        )),
    }
}

fn check_track(track: &Value, is_beta: bool, config: &ValidatorConfig, violations: &mut Vec<Violation>) {
    let track_name = if is_beta { "beta" } else { "versions" };
    let entries = match track.as_object() {
        Some(entries) => entries,
        None => {
            violations.push(Violation::new(
                RuleId::VersionEntryFields,
                format!("'{}' is not an object", track_name),
            ));
            return;
        }
    };

    for (key, entry) in entries {
        if !version::is_valid(key) {
            violations.push(Violation::new(
                RuleId::VersionFormat,
                format!("invalid version key: {}", key),
            ));
        }
        if is_beta && !key.to_lowercase().contains(BETA_MARKER) {
            violations.push(Violation::new(
                RuleId::BetaKeyMarker,
                format!("beta key does not contain 'beta': {}", key),
            ));
        }
        check_entry(key, entry, is_beta, config, violations);
    }
}

fn check_entry(
    key: &str,
    entry: &Value,
    is_beta: bool,
    config: &ValidatorConfig,
    violations: &mut Vec<Violation>,
) {
    let fields = match entry.as_object() {
        Some(fields) => fields,
        None => {
            violations.push(Violation::new(
                RuleId::VersionEntryFields,
                format!("entry for {} is not an object", key),
            ));
            return;
        }
    };

    for field in ["release_date", "release_notes", "critical", "platforms"] {
        if !fields.contains_key(field) {
            violations.push(Violation::new(
                RuleId::VersionEntryFields,
                format!("{}: missing required field '{}'", key, field),
            ));
        }
    }

    if let Some(critical) = fields.get("critical") {
        if !critical.is_boolean() {
            violations.push(Violation::new(
                RuleId::VersionEntryFields,
                format!("{}: 'critical' is not a boolean", key),
            ));
        }
    }

    if let Some(date) = fields.get("release_date") {
        check_date(date, &format!("{}: release_date", key), violations);
    }

    if is_beta {
        match fields.get("expires") {
            None => violations.push(Violation::new(
                RuleId::BetaExpiryRequired,
                format!("{}: beta release missing expiration date", key),
            )),
            Some(expires) => check_date(expires, &format!("{}: expires", key), violations),
        }
    }

    if let Some(platforms) = fields.get("platforms") {
        check_platforms(key, platforms, is_beta, config, violations);
    }
}

fn check_date(value: &Value, context: &str, violations: &mut Vec<Violation>) {
    let valid = value
        .as_str()
        .map(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).is_ok())
        .unwrap_or(false);
    if !valid {
        violations.push(Violation::new(
            RuleId::DateFormat,
            format!("{} is not a valid YYYY-MM-DD date: {}", context, value),
        ));
    }
}

fn check_platforms(
    key: &str,
    platforms: &Value,
    is_beta: bool,
    config: &ValidatorConfig,
    violations: &mut Vec<Violation>,
) {
    let entries = match platforms.as_object() {
        Some(entries) => entries,
        None => {
            violations.push(Violation::new(
                RuleId::VersionEntryFields,
                format!("{}: 'platforms' is not an object", key),
            ));
            return;
        }
    };

    if entries.is_empty() {
        violations.push(Violation::new(
            RuleId::VersionEntryFields,
            format!("{}: 'platforms' is empty", key),
        ));
    }

    for (platform_key, artifact) in entries {
        check_artifact(key, platform_key, artifact, is_beta, config, violations);
    }
}

fn check_artifact(
    version_key: &str,
    platform_key: &str,
    artifact: &Value,
    is_beta: bool,
    config: &ValidatorConfig,
    violations: &mut Vec<Violation>,
) {
    let context = format!("{}/{}", version_key, platform_key);
    let fields = match artifact.as_object() {
        Some(fields) => fields,
        None => {
            violations.push(Violation::new(
                RuleId::PlatformFields,
                format!("{}: platform info is not an object", context),
            ));
            return;
        }
    };

    for field in ["version", "url", "checksum", "size", "min_os", "architecture"] {
        if !fields.contains_key(field) {
            violations.push(Violation::new(
                RuleId::PlatformFields,
                format!("{}: missing required field '{}'", context, field),
            ));
        }
    }

    if let Some(artifact_version) = fields.get("version").and_then(Value::as_str) {
        if artifact_version != version_key {
            violations.push(Violation::new(
                RuleId::PlatformVersionMatch,
                format!(
                    "{}: version mismatch: {} != {}",
                    context, artifact_version, version_key
                ),
            ));
        }
    }

    if let Some(url) = fields.get("url").and_then(Value::as_str) {
        check_url(&context, url, version_key, platform_key, is_beta, config, violations);
    }

    if let Some(architecture) = fields.get("architecture") {
        let ok = architecture
            .as_array()
            .map(|a| !a.is_empty())
            .unwrap_or(false);
        if !ok {
            violations.push(Violation::new(
                RuleId::ArchitectureType,
                format!("{}: architecture must be a non-empty list", context),
            ));
        }
    }
}

fn check_url(
    context: &str,
    url: &str,
    version_key: &str,
    platform_key: &str,
    is_beta: bool,
    config: &ValidatorConfig,
    violations: &mut Vec<Violation>,
) {
    let host = config.downloads_host.trim_end_matches('/');
    let track = if is_beta { "beta/" } else { "" };
    let expected_prefix = format!("{}/{}v{}/{}/", host, track, version_key, platform_key);

    if !url.starts_with(&expected_prefix) {
        violations.push(Violation::new(
            RuleId::UrlShape,
            format!(
                "{}: URL does not match {}...: {}",
                context, expected_prefix, url
            ),
        ));
        return;
    }

    if let Some(extension) = config.catalog.extension_for(platform_key) {
        if !url.ends_with(extension) {
            violations.push(Violation::new(
                RuleId::UrlShape,
                format!("{}: URL does not end with {}: {}", context, extension, url),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> ValidatorConfig {
        ValidatorConfig {
            downloads_host: "https://downloads.example.com".to_string(),
            catalog: PlatformCatalog::default(),
        }
    }

    fn valid_manifest() -> Value {
        json!({
            "latest": "1.2.3",
            "latest_beta": "1.3.0-beta.1",
            "minimum_supported": "1.0.0",
            "versions": {
                "1.2.3": {
                    "release_date": "2024-02-10",
                    "release_notes": "Bug fixes",
                    "critical": false,
                    "platforms": {
                        "windows": {
                            "version": "1.2.3",
                            "url": "https://downloads.example.com/v1.2.3/windows/app.exe",
                            "checksum": "0123456789abcdef0123456789abcdef",
                            "size": 52_428_800,
                            "min_os": "10.0.0",
                            "architecture": ["x86_64"]
                        },
                        "macos": {
                            "version": "1.2.3",
                            "url": "https://downloads.example.com/v1.2.3/macos/app.dmg",
                            "checksum": "abcdef0123456789abcdef0123456789",
                            "size": 61_865_984,
                            "min_os": "11.0.0",
                            "architecture": ["x86_64", "arm64"]
                        }
                    }
                }
            },
            "beta": {
                "1.3.0-beta.1": {
                    "release_date": "2024-03-01",
                    "release_notes": "Beta notes",
                    "critical": false,
                    "expires": "2099-01-01",
                    "platforms": {
                        "linux": {
                            "version": "1.3.0-beta.1",
                            "url": "https://downloads.example.com/beta/v1.3.0-beta.1/linux/app.AppImage",
                            "checksum": "00112233445566778899aabbccddeeff",
                            "size": 73_400_320,
                            "min_os": "Ubuntu 20.04",
                            "architecture": ["x86_64", "arm64"]
                        }
                    }
                }
            }
        })
    }

    #[test]
    fn test_valid_manifest_has_no_violations() {
        let violations = validate(&valid_manifest(), &config());
        assert!(violations.is_empty(), "unexpected: {:?}", violations);
    }

    #[test]
    fn test_empty_document_reports_instead_of_failing() {
        let violations = validate(&json!({}), &config());
        assert!(!violations.is_empty());

        let root_violations: Vec<_> = violations
            .iter()
            .filter(|v| v.rule == RuleId::RootRequiredFields)
            .collect();
        assert_eq!(root_violations.len(), 3);
    }

    #[test]
    fn test_one_violation_per_missing_root_field() {
        let mut manifest = valid_manifest();
        manifest.as_object_mut().unwrap().remove("latest");

        let violations = validate(&manifest, &config());
        let root: Vec<_> = violations
            .iter()
            .filter(|v| v.rule == RuleId::RootRequiredFields)
            .collect();
        assert_eq!(root.len(), 1);
        assert!(root[0].message.contains("latest"));

        // The rest of the document is still checked
        assert!(violations.iter().all(|v| v.rule != RuleId::UrlShape));
    }

    #[test]
    fn test_invalid_version_formats_reported() {
        let mut manifest = valid_manifest();
        manifest["latest"] = json!("not-a-version");
        manifest["versions"]["oops"] = manifest["versions"]["1.2.3"].clone();

        let violations = validate(&manifest, &config());
        let formats: Vec<_> = violations
            .iter()
            .filter(|v| v.rule == RuleId::VersionFormat)
            .collect();
        // One for "latest", one for the bad "oops" key
        assert_eq!(formats.len(), 2);
    }

    #[test]
    fn test_beta_key_must_contain_marker() {
        let mut manifest = valid_manifest();
        let entry = manifest["beta"]["1.3.0-beta.1"].clone();
        manifest["beta"]["1.4.0"] = entry;

        let violations = validate(&manifest, &config());
        assert!(violations.iter().any(|v| v.rule == RuleId::BetaKeyMarker));
    }

    #[test]
    fn test_beta_without_expiry_reported() {
        let mut manifest = valid_manifest();
        manifest["beta"]["1.3.0-beta.1"]
            .as_object_mut()
            .unwrap()
            .remove("expires");

        let violations = validate(&manifest, &config());
        assert!(violations
            .iter()
            .any(|v| v.rule == RuleId::BetaExpiryRequired));
    }

    #[test]
    fn test_malformed_dates_reported() {
        let mut manifest = valid_manifest();
        manifest["versions"]["1.2.3"]["release_date"] = json!("02/10/2024");
        manifest["beta"]["1.3.0-beta.1"]["expires"] = json!("someday");

        let violations = validate(&manifest, &config());
        let dates: Vec<_> = violations
            .iter()
            .filter(|v| v.rule == RuleId::DateFormat)
            .collect();
        assert_eq!(dates.len(), 2);
    }

    #[test]
    fn test_platform_version_mismatch_reported() {
        let mut manifest = valid_manifest();
        manifest["versions"]["1.2.3"]["platforms"]["windows"]["version"] = json!("1.2.2");

        let violations = validate(&manifest, &config());
        assert!(violations
            .iter()
            .any(|v| v.rule == RuleId::PlatformVersionMatch));
    }

    #[test]
    fn test_stable_url_passes_beta_url_fails_without_segment() {
        // The same URL is valid for a stable entry and invalid for a beta
        // entry, which must carry the beta/ path segment
        let url = "https://downloads.example.com/v1.2.3/windows/app.exe";

        let stable = json!({
            "latest": "1.2.3",
            "minimum_supported": "1.2.3",
            "versions": {
                "1.2.3": {
                    "release_date": "2024-02-10",
                    "release_notes": "",
                    "critical": false,
                    "platforms": {
                        "windows": {
                            "version": "1.2.3",
                            "url": url,
                            "checksum": "0123456789abcdef0123456789abcdef",
                            "size": 1,
                            "min_os": "10.0.0",
                            "architecture": ["x86_64"]
                        }
                    }
                }
            }
        });
        assert!(validate(&stable, &config()).is_empty());

        let mut beta = stable.clone();
        let entry = beta["versions"]["1.2.3"].clone();
        beta.as_object_mut().unwrap().remove("versions");
        beta["versions"] = json!({});
        beta["beta"] = json!({ "1.2.3-beta.1": entry });
        beta["beta"]["1.2.3-beta.1"]["expires"] = json!("2099-01-01");
        beta["beta"]["1.2.3-beta.1"]["platforms"]["windows"]["version"] = json!("1.2.3-beta.1");

        let violations = validate(&beta, &config());
        assert!(violations.iter().any(|v| v.rule == RuleId::UrlShape));
    }

    #[test]
    fn test_wrong_extension_reported() {
        let mut manifest = valid_manifest();
        manifest["versions"]["1.2.3"]["platforms"]["windows"]["url"] =
            json!("https://downloads.example.com/v1.2.3/windows/app.msi");

        let violations = validate(&manifest, &config());
        assert!(violations.iter().any(|v| v.rule == RuleId::UrlShape));
    }

    #[test]
    fn test_scalar_architecture_reported() {
        let mut manifest = valid_manifest();
        manifest["versions"]["1.2.3"]["platforms"]["windows"]["architecture"] = json!("x86_64");

        let violations = validate(&manifest, &config());
        assert!(violations
            .iter()
            .any(|v| v.rule == RuleId::ArchitectureType));
    }

    #[test]
    fn test_empty_architecture_reported() {
        let mut manifest = valid_manifest();
        manifest["versions"]["1.2.3"]["platforms"]["macos"]["architecture"] = json!([]);

        let violations = validate(&manifest, &config());
        assert!(violations
            .iter()
            .any(|v| v.rule == RuleId::ArchitectureType));
    }

    #[test]
    fn test_missing_platform_fields_reported() {
        let mut manifest = valid_manifest();
        manifest["versions"]["1.2.3"]["platforms"]["windows"]
            .as_object_mut()
            .unwrap()
            .remove("checksum");

        let violations = validate(&manifest, &config());
        let missing: Vec<_> = violations
            .iter()
            .filter(|v| v.rule == RuleId::PlatformFields)
            .collect();
        assert_eq!(missing.len(), 1);
        assert!(missing[0].message.contains("checksum"));
    }

    #[test]
    fn test_empty_platforms_reported() {
        let mut manifest = valid_manifest();
        manifest["versions"]["1.2.3"]["platforms"] = json!({});

        let violations = validate(&manifest, &config());
        assert!(violations
            .iter()
            .any(|v| v.rule == RuleId::VersionEntryFields && v.message.contains("empty")));
    }

    #[test]
    fn test_all_defects_accumulate_in_one_pass() {
        let manifest = json!({
            "latest": "bogus",
            "versions": {
                "1.0.0": {
                    "release_notes": "",
                    "critical": "yes",
                    "platforms": {}
                }
            }
        });

        let violations = validate(&manifest, &config());
        let rules: Vec<RuleId> = violations.iter().map(|v| v.rule).collect();
        assert!(rules.contains(&RuleId::RootRequiredFields)); // minimum_supported
        assert!(rules.contains(&RuleId::VersionFormat)); // latest
        assert!(rules.contains(&RuleId::VersionEntryFields)); // date + critical + platforms
        assert!(violations.len() >= 4);
    }
}

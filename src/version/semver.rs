use std::fmt;

use regex::Regex;
use semver::{BuildMetadata, Version};

/// A release version that can take part in comparisons
///
/// Pre-release versions never parse into this type, so they are neither
/// update candidates nor usable as the current version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParsedVersion(Version);

impl fmt::Display for ParsedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Extract the comparable part of a raw tag
///
/// Without a pattern the tag is returned unchanged. With a pattern the first
/// capture group of the first match is returned; a tag that does not match,
/// or a pattern without a capture group, yields `None`.
///
/// Examples (pattern `^(\d+\.\d+\.\d+)-\w+$`):
/// - "2026.1.20-abcdef" -> Some("2026.1.20")
/// - "no-match" -> None
pub fn extract_version<'a>(tag: &'a str, pattern: Option<&Regex>) -> Option<&'a str> {
    let Some(pattern) = pattern else {
        return Some(tag);
    };

    pattern
        .captures(tag)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// Parse a version string into a [`ParsedVersion`]
///
/// Accepts an optional leading `v`. Strict semver otherwise: partial versions
/// such as "1.2" and anything flagged pre-release yield `None`. Build
/// metadata is dropped.
///
/// Examples:
/// - "v1.0.0" -> Version(1, 0, 0)
/// - "1.0.0" -> Version(1, 0, 0)
/// - "2.0.0-rc.1" -> None
pub fn parse_version(version: Option<&str>) -> Option<ParsedVersion> {
    let version = version?;
    let stripped = version.strip_prefix('v').unwrap_or(version);

    let mut parsed = Version::parse(stripped).ok()?;
    if !parsed.pre.is_empty() {
        return None;
    }
    // Build metadata has no precedence
    parsed.build = BuildMetadata::EMPTY;

    Some(ParsedVersion(parsed))
}

/// Extract and parse in one step
pub fn comparable_version(tag: &str, pattern: Option<&Regex>) -> Option<ParsedVersion> {
    parse_version(extract_version(tag, pattern))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const BUILD_PATTERN: &str = r"^(\d+\.\d+\.\d+)-\w+$";

    #[rstest]
    #[case("2026.1.20-abcdef", Some(BUILD_PATTERN), Some("2026.1.20"))]
    #[case("2026.1.20-410996df9", Some(BUILD_PATTERN), Some("2026.1.20"))]
    #[case("no-match", Some(BUILD_PATTERN), None)]
    #[case("1.2.3", Some(r"^\d+\.\d+\.\d+$"), None)] // no capture group
    #[case("v1.5.1", None, Some("v1.5.1"))]
    fn extract_version_returns_expected(
        #[case] tag: &str,
        #[case] pattern: Option<&str>,
        #[case] expected: Option<&str>,
    ) {
        let pattern = pattern.map(|p| Regex::new(p).unwrap());
        assert_eq!(extract_version(tag, pattern.as_ref()), expected);
    }

    #[test]
    fn extract_version_uses_first_match_only() {
        let pattern = Regex::new(r"(\d+\.\d+\.\d+)").unwrap();
        assert_eq!(
            extract_version("1.0.0-and-2.0.0", Some(&pattern)),
            Some("1.0.0")
        );
    }

    #[test]
    fn parse_version_ignores_leading_v() {
        assert_eq!(parse_version(Some("v1.0.0")), parse_version(Some("1.0.0")));
        assert!(parse_version(Some("v1.0.0")).is_some());
    }

    #[rstest]
    #[case(Some("2.0.0a1"))]
    #[case(Some("2.0.0-rc.1"))]
    #[case(Some("1.2"))]
    #[case(Some("latest"))]
    #[case(Some(""))]
    #[case(None)]
    fn parse_version_rejects_non_release_versions(#[case] version: Option<&str>) {
        assert_eq!(parse_version(version), None);
    }

    #[test]
    fn parsed_versions_follow_semver_precedence() {
        let older = parse_version(Some("1.9.0")).unwrap();
        let newer = parse_version(Some("1.10.0")).unwrap();
        assert!(newer > older);
    }

    #[test]
    fn build_metadata_does_not_affect_precedence() {
        let plain = parse_version(Some("1.0.0")).unwrap();
        let with_build = parse_version(Some("1.0.0+build.2")).unwrap();

        assert_eq!(with_build, plain);
        assert!(with_build <= plain);
    }

    #[test]
    fn comparable_version_applies_pattern_before_parsing() {
        let pattern = Regex::new(BUILD_PATTERN).unwrap();
        assert_eq!(
            comparable_version("2026.1.20-abcdef", Some(&pattern)),
            parse_version(Some("2026.1.20"))
        );
        assert_eq!(comparable_version("main-abcdef", Some(&pattern)), None);
    }
}

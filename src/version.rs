//! Version extraction and selection over repository tag names
//!
//! Tag names may carry path and branch prefixes (`lib/dev/1.2.0`); the
//! version is always the last `/`-delimited segment with any leading `v`
//! stripped. Tags that do not parse as semantic versions are ignored for
//! ordering but kept as fallback candidates.

use semver::{Version, VersionReq};

/// Extract the version part of a tag name (last path segment, `v` stripped)
pub fn version_part(tag: &str) -> &str {
    let part = tag.rsplit('/').next().unwrap_or(tag);
    part.strip_prefix('v').unwrap_or(part)
}

/// Parse a tag or version string leniently, tolerating a `v` prefix
pub fn parse_version_loose(raw: &str) -> Option<Version> {
    let t = raw.trim();
    if t.is_empty() {
        return None;
    }
    let t = t.strip_prefix('v').unwrap_or(t);
    Version::parse(t).ok()
}

fn is_constraint_boundary(ch: char) -> bool {
    ch.is_ascii_whitespace() || matches!(ch, ',' | '<' | '>' | '=' | '^' | '~')
}

/// Strip `v` prefixes from the version literals inside a constraint string
/// so that `>=v1.0.0,<v2.0.0` parses the same as `>=1.0.0,<2.0.0`
fn normalize_constraint(raw: &str) -> String {
    let chars: Vec<char> = raw.trim().chars().collect();
    let mut out = String::with_capacity(chars.len());
    for (i, &ch) in chars.iter().enumerate() {
        if ch == 'v'
            && i + 1 < chars.len()
            && chars[i + 1].is_ascii_digit()
            && (i == 0 || is_constraint_boundary(chars[i - 1]))
        {
            continue;
        }
        out.push(ch);
    }
    out
}

/// True for strings shaped like a plain version literal (`1.0`, `v1.2.3`)
/// with no comparison operators
fn is_bare_version_shape(raw: &str) -> bool {
    let t = raw.strip_prefix('v').unwrap_or(raw);
    !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit() || b == b'.')
}

/// Parse a constraint expression like `>=1.0.0,<2.0.0`
///
/// A bare full version (`1.0.0` or `v1.0.0`) is treated as an exact
/// match. A bare partial version (`1.0`) is rejected rather than being
/// widened into a caret range.
pub fn parse_constraint(raw: &str) -> Option<VersionReq> {
    let t = raw.trim();
    if t.is_empty() {
        return None;
    }
    if let Some(v) = parse_version_loose(t) {
        return VersionReq::parse(&format!("={}", v)).ok();
    }
    if is_bare_version_shape(t) {
        return None;
    }
    VersionReq::parse(&normalize_constraint(t)).ok()
}

/// Find the tag carrying the highest semantic version
///
/// Unparsable tags are skipped. If no tag parses as a version at all, the
/// last tag in enumeration order is returned as a best-effort fallback.
pub fn find_latest(tags: &[String]) -> Option<String> {
    if tags.is_empty() {
        return None;
    }

    let mut best: Option<(Version, &str)> = None;
    for tag in tags {
        if let Some(ver) = parse_version_loose(version_part(tag)) {
            match &best {
                Some((b, _)) if ver <= *b => {}
                _ => best = Some((ver, tag)),
            }
        }
    }

    match best {
        Some((_, tag)) => Some(tag.to_string()),
        None => tags.last().cloned(),
    }
}

/// Find the highest-version tag satisfying a constraint expression
pub fn find_matching(tags: &[String], constraint: &str) -> Option<String> {
    let req = parse_constraint(constraint)?;

    let mut best: Option<(Version, &str)> = None;
    for tag in tags {
        if let Some(ver) = parse_version_loose(version_part(tag)) {
            if req.matches(&ver) {
                match &best {
                    Some((b, _)) if ver <= *b => {}
                    _ => best = Some((ver, tag)),
                }
            }
        }
    }

    best.map(|(_, tag)| tag.to_string())
}

/// Check whether a request looks like a git commit id (6-40 lowercase hex)
pub fn is_commit_id(value: &str) -> bool {
    (6..=40).contains(&value.len())
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn version_part_strips_prefixes() {
        assert_eq!(version_part("v1.0.0"), "1.0.0");
        assert_eq!(version_part("lib/1.0.0"), "1.0.0");
        assert_eq!(version_part("lib/dev/v2.1.3"), "2.1.3");
        assert_eq!(version_part("1.0.0"), "1.0.0");
    }

    #[test]
    fn find_latest_orders_semantically() {
        let t = tags(&["v0.9.0", "v1.0.0", "v1.1.0"]);
        assert_eq!(find_latest(&t).unwrap(), "v1.1.0");

        // 1.10 sorts above 1.9 numerically, not lexically
        let t = tags(&["v1.9.0", "v1.10.0"]);
        assert_eq!(find_latest(&t).unwrap(), "v1.10.0");
    }

    #[test]
    fn find_latest_prerelease_precedence() {
        let t = tags(&["1.0.0-alpha", "1.0.0-beta", "1.0.0"]);
        assert_eq!(find_latest(&t).unwrap(), "1.0.0");
    }

    #[test]
    fn find_latest_skips_invalid_tags() {
        let t = tags(&["nightly", "v1.2.0", "snapshot"]);
        assert_eq!(find_latest(&t).unwrap(), "v1.2.0");
    }

    #[test]
    fn find_latest_falls_back_to_last_tag() {
        let t = tags(&["alpha", "beta", "release-candidate"]);
        assert_eq!(find_latest(&t).unwrap(), "release-candidate");
        assert_eq!(find_latest(&[]), None);
    }

    #[test]
    fn find_matching_range() {
        let t = tags(&["v0.9.0", "v1.0.0", "v1.1.0"]);
        assert_eq!(find_matching(&t, ">=1.0.0,<1.1.0").unwrap(), "v1.0.0");
        assert_eq!(find_matching(&t, ">=1.0.0").unwrap(), "v1.1.0");
        assert_eq!(find_matching(&t, ">=2.0.0"), None);
    }

    #[test]
    fn find_matching_exact_version() {
        let t = tags(&["v0.9.0", "v1.0.0"]);
        assert_eq!(find_matching(&t, "1.0.0").unwrap(), "v1.0.0");
        assert_eq!(find_matching(&t, "v0.9.0").unwrap(), "v0.9.0");
    }

    #[test]
    fn bare_partial_version_is_not_a_range() {
        // "1.0" must not silently become ^1.0 and match 1.9.x
        let t = tags(&["v1.0.0", "v1.9.9"]);
        assert_eq!(find_matching(&t, "1.0"), None);
        assert_eq!(find_matching(&t, "v1.0"), None);

        // an explicit comparator with a partial version still works
        assert_eq!(find_matching(&t, ">=1.0").unwrap(), "v1.9.9");
    }

    #[test]
    fn find_matching_prefixed_tags() {
        let t = tags(&["lib/0.9.0", "lib/1.0.0", "lib/dev/1.5.0"]);
        assert_eq!(find_matching(&t, ">=1.0.0").unwrap(), "lib/dev/1.5.0");
    }

    #[test]
    fn constraint_tolerates_v_prefix() {
        let t = tags(&["v1.0.0", "v1.4.0"]);
        assert_eq!(find_matching(&t, ">=v1.2").unwrap(), "v1.4.0");
    }

    #[test]
    fn commit_id_detection() {
        assert!(is_commit_id("abc123"));
        assert!(is_commit_id("0123456789abcdef0123456789abcdef01234567"));
        assert!(!is_commit_id("abc12")); // too short
        assert!(!is_commit_id("ABC123")); // uppercase
        assert!(!is_commit_id("v1.0.0"));
        assert!(!is_commit_id("main"));
    }
}

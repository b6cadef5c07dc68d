use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Oldest Inkscape major version with the `--export-type`/`--export-filename` CLI.
pub const MIN_MAJOR_VERSION: u32 = 1;

static VERSION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)inkscape(?:\.exe|\.com)?\s+(\d+)\.(\d+)(?:\.(\d+))?",
        r"(?i)inkscape\s+\(version\s+(\d+)\.(\d+)(?:\.(\d+))?\)",
        r"(?:^|\s)(\d+)\.(\d+)(?:\.(\d+))?(?:\s|$)",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub fn is_supported(&self) -> bool {
        self.major >= MIN_MAJOR_VERSION
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Parse the version out of `inkscape --version` output.
pub fn extract_version(output: &str) -> Option<Version> {
    for re in VERSION_PATTERNS.iter() {
        if let Some(caps) = re.captures(output) {
            let major = caps.get(1)?.as_str().parse().ok()?;
            let minor = caps.get(2)?.as_str().parse().ok()?;
            let patch = caps.get(3).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);

            return Some(Version { major, minor, patch });
        }
    }

    output
        .lines()
        .flat_map(str::split_whitespace)
        .find_map(parse_version_token)
}

fn parse_version_token(token: &str) -> Option<Version> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() >= 2
        && let (Ok(major), Ok(minor)) = (parts[0].parse(), parts[1].parse())
    {
        let patch = parts.get(2).and_then(|p| p.parse().ok()).unwrap_or(0);
        return Some(Version { major, minor, patch });
    }
    None
}

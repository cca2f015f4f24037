// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! DOI value handling.
//!
//! The registrar speaks bare DOIs (`10.18130/abc`); objects store the
//! resolvable form (`https://doi.org/10.18130/abc`). Older records may also
//! carry `doi:10.18130/abc`. Every comparison is done on the bare form.

/// Environment-specific DOI naming: the registrar prefix ("shoulder") and the
/// resolver base used for stored values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoiFormat {
    shoulder: String,
    resolver_base: String,
}

impl DoiFormat {
    pub fn new(shoulder: &str, resolver_base: &str) -> Self {
        let shoulder = shoulder.trim();
        Self {
            shoulder: shoulder.strip_prefix("doi:").unwrap_or(shoulder).trim_end_matches('/').to_string(),
            resolver_base: resolver_base.trim().trim_end_matches('/').to_string(),
        }
    }

    /// Bare registrar prefix, e.g. `10.18130`
    pub fn shoulder(&self) -> &str {
        &self.shoulder
    }

    /// True when a stored DOI was minted under this environment's prefix
    pub fn owns(&self, stored: &str) -> bool {
        bare_doi(stored)
            .strip_prefix(self.shoulder.as_str())
            .is_some_and(|rest| rest.starts_with('/') && rest.len() > 1)
    }

    /// Resolvable form written back to the object
    pub fn stored_form(&self, bare: &str) -> String {
        format!("{}/{}", self.resolver_base, bare_doi(bare))
    }
}

/// Strips `doi:` and resolver URL prefixes from a stored DOI value.
pub fn bare_doi(stored: &str) -> &str {
    let value = stored.trim();
    let value = value.strip_prefix("doi:").unwrap_or(value);
    match value.find("://") {
        Some(scheme_end) => {
            let rest = &value[scheme_end + 3..];
            rest.find('/').map(|path| &rest[path + 1..]).unwrap_or_default()
        }
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_doi_forms() {
        assert_eq!(bare_doi("https://doi.org/10.18130/abc"), "10.18130/abc");
        assert_eq!(bare_doi("doi:10.18130/abc"), "10.18130/abc");
        assert_eq!(bare_doi(" 10.18130/abc "), "10.18130/abc");
        assert_eq!(bare_doi("https://doi.org"), "");
    }

    #[test]
    fn test_shoulder_normalization() {
        let format = DoiFormat::new("doi:10.18130", "https://doi.org/");
        assert_eq!(format.shoulder(), "10.18130");
        assert_eq!(format.stored_form("10.18130/xyz"), "https://doi.org/10.18130/xyz");
    }

    #[test]
    fn test_owns_same_environment_only() {
        let format = DoiFormat::new("10.18130", "https://doi.org");
        assert!(format.owns("https://doi.org/10.18130/abc"));
        assert!(format.owns("doi:10.18130/abc"));
        assert!(!format.owns("https://doi.org/10.70020/abc"));
        // a longer prefix that merely starts with the shoulder digits
        assert!(!format.owns("https://doi.org/10.181301/abc"));
        assert!(!format.owns("https://doi.org/10.18130/"));
    }
}

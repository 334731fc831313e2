//! Environment-driven proptest tuning shared by the workspace's property
//! suites, so CI can run deeper searches than local `cargo test`.

use std::env;

use proptest::test_runner::Config;

/// Environment variable overriding the number of cases per property.
pub const CASES_ENV_KEY: &str = "POPGRAPH_PROPTEST_CASES";

/// Case count and derived runner configuration for property suites.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProptestRunProfile {
    cases: u32,
}

impl ProptestRunProfile {
    /// Reads [`CASES_ENV_KEY`], falling back to `default_cases` when the
    /// variable is unset or malformed.
    ///
    /// # Examples
    ///
    /// ```
    /// use popgraph_test_support::proptest_profile::ProptestRunProfile;
    ///
    /// let profile = ProptestRunProfile::load(32);
    /// assert!(profile.cases() > 0);
    /// ```
    #[must_use]
    pub fn load(default_cases: u32) -> Self {
        let cases = match env::var(CASES_ENV_KEY) {
            Ok(raw) => parse_cases(&raw).unwrap_or_else(|reason| {
                tracing::warn!(
                    env = CASES_ENV_KEY,
                    raw = %raw,
                    reason = %reason,
                    "invalid property-test case override; using default",
                );
                default_cases
            }),
            Err(_) => default_cases,
        };
        Self { cases }
    }

    /// Number of cases to run per property.
    #[must_use]
    pub fn cases(&self) -> u32 {
        self.cases
    }

    /// Runner configuration for `#![proptest_config(..)]`.
    #[must_use]
    pub fn config(&self) -> Config {
        Config::with_cases(self.cases)
    }
}

fn parse_cases(raw: &str) -> Result<u32, String> {
    let parsed = raw
        .trim()
        .parse::<u32>()
        .map_err(|error| format!("parse error: {error}"))?;
    if parsed == 0 {
        return Err("cases must be > 0".to_owned());
    }
    Ok(parsed)
}

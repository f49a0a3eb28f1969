//! Build and deploy metadata.
//!
//! Everything here is read from the environment at call time. CI injects
//! `BUILD_TIME`, `GIT_*` and `GITHUB_RUN_*` into the container image, and
//! Cloud Run provides `K_SERVICE` / `K_REVISION` at runtime.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::EnvSource;

/// Compiler version the binary was built with (set by `build.rs`).
pub const RUNTIME_VERSION: &str = env!("RUSTC_VERSION");

/// Length of the abbreviated commit hash.
pub const SHORT_SHA_LEN: usize = 8;

/// Format of `deploy_time`.
const DEPLOY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Snapshot of the build/deploy identity for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    /// When CI built the image.
    pub build_time: String,
    /// Branch the image was built from.
    pub git_branch: String,
    /// Full commit hash.
    pub git_commit_sha: String,
    /// First 8 characters of `git_commit_sha`.
    pub git_commit_short: String,
    /// GitHub Actions run id.
    pub github_run_id: String,
    /// GitHub Actions run number.
    pub github_run_number: String,
    /// Toolchain version of this binary.
    pub runtime_version: String,
    /// Whether Sentry was initialized at startup.
    pub sentry_enabled: bool,
    /// Time of the current request.
    pub deploy_time: String,
    /// Cloud Run service name.
    pub k_service: String,
    /// Cloud Run revision.
    pub k_revision: String,
}

impl BuildInfo {
    /// Collect build info as of now.
    pub fn current(env: &dyn EnvSource, sentry_enabled: bool) -> Self {
        Self::collect(env, sentry_enabled, Utc::now())
    }

    /// Collect build info as of `now`.
    pub fn collect(env: &dyn EnvSource, sentry_enabled: bool, now: DateTime<Utc>) -> Self {
        let git_commit_sha = env.get_or("GIT_COMMIT_SHA", "unknown");

        Self {
            build_time: env.get_or("BUILD_TIME", "Not set"),
            git_branch: env.get_or("GIT_BRANCH", "unknown"),
            git_commit_short: short_sha(&git_commit_sha).to_string(),
            git_commit_sha,
            github_run_id: env.get_or("GITHUB_RUN_ID", "N/A"),
            github_run_number: env.get_or("GITHUB_RUN_NUMBER", "N/A"),
            runtime_version: RUNTIME_VERSION.to_string(),
            sentry_enabled,
            deploy_time: now.format(DEPLOY_TIME_FORMAT).to_string(),
            k_service: env.get_or("K_SERVICE", "N/A"),
            k_revision: env.get_or("K_REVISION", "N/A"),
        }
    }
}

/// First [`SHORT_SHA_LEN`] characters of `sha`, or all of it if shorter.
pub fn short_sha(sha: &str) -> &str {
    match sha.char_indices().nth(SHORT_SHA_LEN) {
        Some((idx, _)) => &sha[..idx],
        None => sha,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    }

    #[test]
    fn empty_environment_uses_fallbacks() {
        let info = BuildInfo::collect(&HashMap::<String, String>::new(), false, fixed_time());

        assert_eq!(
            info,
            BuildInfo {
                build_time: "Not set".into(),
                git_branch: "unknown".into(),
                git_commit_sha: "unknown".into(),
                git_commit_short: "unknown".into(),
                github_run_id: "N/A".into(),
                github_run_number: "N/A".into(),
                runtime_version: RUNTIME_VERSION.into(),
                sentry_enabled: false,
                deploy_time: "2024-01-02 03:04:05 UTC".into(),
                k_service: "N/A".into(),
                k_revision: "N/A".into(),
            }
        );
    }

    #[test]
    fn reads_values_from_environment() {
        let vars = env(&[
            ("BUILD_TIME", "2024-01-01T00:00:00Z"),
            ("GIT_BRANCH", "test-branch"),
            ("GIT_COMMIT_SHA", "abc123def456"),
            ("GITHUB_RUN_ID", "12345"),
            ("GITHUB_RUN_NUMBER", "42"),
            ("K_SERVICE", "github-cicd-demo"),
            ("K_REVISION", "github-cicd-demo-00001-abc"),
        ]);

        let info = BuildInfo::collect(&vars, true, fixed_time());

        assert_eq!(info.build_time, "2024-01-01T00:00:00Z");
        assert_eq!(info.git_branch, "test-branch");
        assert_eq!(info.git_commit_sha, "abc123def456");
        assert_eq!(info.git_commit_short, "abc123de");
        assert_eq!(info.github_run_id, "12345");
        assert_eq!(info.github_run_number, "42");
        assert_eq!(info.k_service, "github-cicd-demo");
        assert_eq!(info.k_revision, "github-cicd-demo-00001-abc");
        assert!(info.sentry_enabled);
    }

    #[test]
    fn short_sha_is_prefix_of_full_sha() {
        for sha in ["", "abc", "abcdefgh", "abcdefghi", "0123456789abcdef0123456789abcdef01234567"] {
            let vars = env(&[("GIT_COMMIT_SHA", sha)]);
            let info = BuildInfo::collect(&vars, false, fixed_time());

            assert!(info.git_commit_sha.starts_with(&info.git_commit_short));
            assert_eq!(info.git_commit_short.chars().count(), sha.chars().count().min(8));
        }
    }

    #[test]
    fn short_sha_respects_char_boundaries() {
        assert_eq!(short_sha("ééééééééé"), "éééééééé");
    }

    #[test]
    fn set_but_empty_variable_is_kept() {
        let vars = env(&[("GIT_BRANCH", "")]);
        let info = BuildInfo::collect(&vars, false, fixed_time());
        assert_eq!(info.git_branch, "");
    }

    #[test]
    fn serializes_every_field() {
        let info = BuildInfo::collect(&HashMap::<String, String>::new(), false, fixed_time());
        let json = serde_json::to_value(&info).unwrap();
        let object = json.as_object().unwrap();

        for key in [
            "build_time",
            "git_branch",
            "git_commit_sha",
            "git_commit_short",
            "github_run_id",
            "github_run_number",
            "runtime_version",
            "sentry_enabled",
            "deploy_time",
            "k_service",
            "k_revision",
        ] {
            assert!(object.contains_key(key), "missing {key}");
        }
        assert_eq!(object["sentry_enabled"], serde_json::Value::Bool(false));
    }
}

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Fixed name of the published check run.
pub const CHECK_NAME: &str = "Allstar Review Bot";

/// Banner prepended to the check run title.
pub const TITLE_PREFIX: &str = "⭐️ Allstar Pull Request Review Bot - ";

/// The decision produced by one evaluation. Produced once per webhook
/// delivery and consumed exactly once by the check reporter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationResult {
    /// Authorized approval points collected.
    pub points: u32,

    /// Configured minimum points required to pass.
    pub required: u32,

    pub passed: bool,

    /// Commit the check run is attached to.
    pub head_sha: String,
}

impl AuthorizationResult {
    pub fn new(points: u32, required: u32, head_sha: impl ToString) -> Self {
        Self {
            points,
            required,
            passed: points >= required,
            head_sha: head_sha.to_string(),
        }
    }

    pub fn conclusion(&self) -> &'static str {
        if self.passed {
            "success"
        } else {
            "failure"
        }
    }

    pub fn title(&self) -> String {
        format!("{}{}", TITLE_PREFIX, self.conclusion())
    }

    /// One-sentence statement of the count versus the requirement.
    pub fn summary(&self) -> String {
        format!(
            "PR has {} authorized approvals, {} required",
            self.points, self.required
        )
    }
}

/// Request body of `POST /repos/{owner}/{repo}/check-runs`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateCheckRun {
    pub name: String,
    pub head_sha: String,
    pub status: String,
    pub conclusion: String,
    pub completed_at: String,
    pub output: CheckRunOutput,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckRunOutput {
    pub title: String,
    pub summary: String,
    pub text: String,
}

impl CreateCheckRun {
    pub fn from_result(result: &AuthorizationResult) -> Self {
        let summary = if result.passed {
            "PR has enough authorized approvals"
        } else {
            "PR does not have enough authorized approvals"
        };
        Self {
            name: String::from(CHECK_NAME),
            head_sha: result.head_sha.clone(),
            status: String::from("completed"),
            conclusion: result.conclusion().to_string(),
            completed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            output: CheckRunOutput {
                title: result.title(),
                summary: String::from(summary),
                text: result.summary(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_text() {
        let result = AuthorizationResult::new(2, 2, "abc123");
        assert!(result.passed);
        assert_eq!(result.conclusion(), "success");
        assert_eq!(
            result.title(),
            "⭐️ Allstar Pull Request Review Bot - success"
        );
        assert_eq!(result.summary(), "PR has 2 authorized approvals, 2 required");

        let result = AuthorizationResult::new(1, 3, "abc123");
        assert!(!result.passed);
        assert_eq!(result.conclusion(), "failure");
        assert_eq!(result.summary(), "PR has 1 authorized approvals, 3 required");
    }

    #[test]
    fn test_check_run_from_result() {
        let result = AuthorizationResult::new(0, 1, "6dcb09b5");
        let check = CreateCheckRun::from_result(&result);

        assert_eq!(check.name, "Allstar Review Bot");
        assert_eq!(check.head_sha, "6dcb09b5");
        assert_eq!(check.status, "completed");
        assert_eq!(check.conclusion, "failure");
        assert_eq!(
            check.output.title,
            "⭐️ Allstar Pull Request Review Bot - failure"
        );
        assert_eq!(check.output.summary, "PR does not have enough authorized approvals");
        assert_eq!(check.output.text, "PR has 0 authorized approvals, 1 required");
    }
}

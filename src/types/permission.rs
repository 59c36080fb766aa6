use serde::{Deserialize, Serialize};

/// Repository permission level of a login, as reported by the GitHub
/// permission API. Levels the API may add later deserialize to
/// [`PermissionLevel::Unknown`], which never authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    Admin,
    Write,
    Read,
    None,
    #[serde(other)]
    Unknown,
}

impl PermissionLevel {
    /// Whether this level is enough for an approval to count.
    pub fn authorized(self) -> bool {
        matches!(self, PermissionLevel::Admin | PermissionLevel::Write)
    }
}

/// Response body of `GET /repos/{owner}/{repo}/collaborators/{login}/permission`.
#[derive(Debug, Clone, Deserialize)]
pub struct PermissionResponse {
    pub permission: PermissionLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorized_levels() {
        assert!(PermissionLevel::Admin.authorized());
        assert!(PermissionLevel::Write.authorized());
        assert!(!PermissionLevel::Read.authorized());
        assert!(!PermissionLevel::None.authorized());
        assert!(!PermissionLevel::Unknown.authorized());
    }

    #[test]
    fn test_parse_permission_response() {
        let resp: PermissionResponse =
            serde_json::from_str(r#"{"permission": "write", "user": {"login": "octocat"}}"#)
                .unwrap();
        assert_eq!(resp.permission, PermissionLevel::Write);

        let resp: PermissionResponse =
            serde_json::from_str(r#"{"permission": "maintain"}"#).unwrap();
        assert_eq!(resp.permission, PermissionLevel::Unknown);
        assert!(!resp.permission.authorized());
    }
}

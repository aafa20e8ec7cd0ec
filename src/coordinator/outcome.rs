//! Permission outcome record

use serde::{Deserialize, Serialize};
use std::fmt;

/// Resolution of one permission request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionOutcome {
    /// The permission this outcome is for
    pub identifier: String,
    /// Whether the permission is granted
    pub granted: bool,
    /// Whether the platform suggests explaining the permission before asking again
    pub should_show_rationale: bool,
}

impl PermissionOutcome {
    pub fn new(identifier: impl Into<String>, granted: bool, should_show_rationale: bool) -> Self {
        Self {
            identifier: identifier.into(),
            granted,
            should_show_rationale,
        }
    }

    /// An already-granted permission
    pub fn granted(identifier: impl Into<String>) -> Self {
        Self::new(identifier, true, false)
    }

    /// A permission revoked by policy
    pub fn revoked(identifier: impl Into<String>) -> Self {
        Self::new(identifier, false, false)
    }

    /// Fold several outcomes into one
    ///
    /// The identifiers are joined with `", "`. The result is granted only if
    /// every outcome is, and suggests rationale if any outcome does.
    /// Returns `None` for an empty slice.
    pub fn combine(outcomes: &[PermissionOutcome]) -> Option<PermissionOutcome> {
        if outcomes.is_empty() {
            return None;
        }

        let identifier = outcomes
            .iter()
            .map(|o| o.identifier.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        Some(Self {
            identifier,
            granted: outcomes.iter().all(|o| o.granted),
            should_show_rationale: outcomes.iter().any(|o| o.should_show_rationale),
        })
    }
}

impl fmt::Display for PermissionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.granted { "granted" } else { "denied" };
        write!(f, "{}: {}", self.identifier, status)?;
        if self.should_show_rationale {
            write!(f, " (show rationale)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_all_granted() {
        let combined = PermissionOutcome::combine(&[
            PermissionOutcome::granted("CAMERA"),
            PermissionOutcome::granted("MIC"),
        ])
        .unwrap();

        assert_eq!(combined.identifier, "CAMERA, MIC");
        assert!(combined.granted);
        assert!(!combined.should_show_rationale);
    }

    #[test]
    fn test_combine_one_denied_with_rationale() {
        let combined = PermissionOutcome::combine(&[
            PermissionOutcome::granted("CAMERA"),
            PermissionOutcome::new("MIC", false, true),
        ])
        .unwrap();

        assert!(!combined.granted);
        assert!(combined.should_show_rationale);
    }

    #[test]
    fn test_combine_empty() {
        assert_eq!(PermissionOutcome::combine(&[]), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(PermissionOutcome::granted("CAMERA").to_string(), "CAMERA: granted");
        assert_eq!(
            PermissionOutcome::new("MIC", false, true).to_string(),
            "MIC: denied (show rationale)"
        );
    }

    #[test]
    fn test_serializes_to_json() {
        let json = serde_json::to_value(PermissionOutcome::revoked("SMS")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "identifier": "SMS",
                "granted": false,
                "should_show_rationale": false
            })
        );
    }
}

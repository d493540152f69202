//! Typed approval chains

use serde::{Deserialize, Serialize};

use care_common::{Capability, CoreError, CoreResult, Role};

/// One ordered step in an approval chain, gated to a role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalLevel {
    pub level: u32,
    pub approver_role: Role,
}

/// A validated, ordered approval chain
///
/// Construction is the only validation point: levels are contiguous from 1,
/// and every gating role is one that can actually approve. Approval calls
/// trust the chain instead of re-parsing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ApprovalLevel>", into = "Vec<ApprovalLevel>")]
pub struct ApprovalWorkflow {
    levels: Vec<ApprovalLevel>,
}

impl ApprovalWorkflow {
    /// Validate a chain; input order does not matter
    pub fn new(mut levels: Vec<ApprovalLevel>) -> CoreResult<Self> {
        if levels.is_empty() {
            return Err(CoreError::validation(
                "approval_workflow",
                "must contain at least one level",
            ));
        }
        levels.sort_by_key(|l| l.level);
        for (index, descriptor) in levels.iter().enumerate() {
            let expected = index as u32 + 1;
            if descriptor.level != expected {
                return Err(CoreError::validation(
                    "approval_workflow",
                    format!("levels must be contiguous from 1, found {}", descriptor.level),
                ));
            }
            if !descriptor.approver_role.grants(Capability::ApproveAccess) {
                return Err(CoreError::validation(
                    "approval_workflow",
                    format!(
                        "role {} cannot approve access requests",
                        descriptor.approver_role.as_str()
                    ),
                ));
            }
        }
        Ok(Self { levels })
    }

    /// The role gating a level
    pub fn role_for(&self, level: u32) -> Option<Role> {
        self.levels
            .iter()
            .find(|l| l.level == level)
            .map(|l| l.approver_role)
    }

    /// The final level of the chain
    pub fn max_level(&self) -> u32 {
        self.levels.len() as u32
    }

    /// The ordered level descriptors
    pub fn levels(&self) -> &[ApprovalLevel] {
        &self.levels
    }
}

impl TryFrom<Vec<ApprovalLevel>> for ApprovalWorkflow {
    type Error = CoreError;

    fn try_from(levels: Vec<ApprovalLevel>) -> Result<Self, Self::Error> {
        Self::new(levels)
    }
}

impl From<ApprovalWorkflow> for Vec<ApprovalLevel> {
    fn from(workflow: ApprovalWorkflow) -> Self {
        workflow.levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(level: u32, approver_role: Role) -> ApprovalLevel {
        ApprovalLevel {
            level,
            approver_role,
        }
    }

    #[test]
    fn test_valid_chain() {
        let workflow = ApprovalWorkflow::new(vec![
            level(1, Role::DepartmentHead),
            level(2, Role::MedicalDirector),
            level(3, Role::ComplianceOfficer),
        ])
        .unwrap();
        assert_eq!(workflow.max_level(), 3);
        assert_eq!(workflow.role_for(2), Some(Role::MedicalDirector));
        assert_eq!(workflow.role_for(4), None);
    }

    #[test]
    fn test_input_order_is_normalized() {
        let workflow = ApprovalWorkflow::new(vec![
            level(2, Role::MedicalDirector),
            level(1, Role::DepartmentHead),
        ])
        .unwrap();
        assert_eq!(workflow.levels()[0].level, 1);
        assert_eq!(workflow.role_for(1), Some(Role::DepartmentHead));
    }

    #[test]
    fn test_empty_chain_rejected() {
        let err = ApprovalWorkflow::new(vec![]).unwrap_err();
        assert!(matches!(err, CoreError::Validation { field: "approval_workflow", .. }));
    }

    #[test]
    fn test_gap_rejected() {
        let err = ApprovalWorkflow::new(vec![
            level(1, Role::DepartmentHead),
            level(3, Role::MedicalDirector),
        ])
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
    }

    #[test]
    fn test_duplicate_level_rejected() {
        let err = ApprovalWorkflow::new(vec![
            level(1, Role::DepartmentHead),
            level(1, Role::MedicalDirector),
        ])
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
    }

    #[test]
    fn test_non_approver_role_rejected() {
        let err = ApprovalWorkflow::new(vec![level(1, Role::Physician)]).unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
    }

    #[test]
    fn test_survives_serde_roundtrip() {
        let workflow = ApprovalWorkflow::new(vec![level(1, Role::DepartmentHead)]).unwrap();
        let json = serde_json::to_string(&workflow).unwrap();
        let parsed: ApprovalWorkflow = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, workflow);

        let invalid: Result<ApprovalWorkflow, _> =
            serde_json::from_str(r#"[{"level": 5, "approver_role": "medical_director"}]"#);
        assert!(invalid.is_err());
    }
}

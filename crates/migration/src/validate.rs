use crate::resolve::{MigrationPlan, Mismatch};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Any mismatch fails validation.
    #[default]
    Strict,
    /// Mismatches are reported as warnings only.
    Permissive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub policy: Policy,
    pub errors: Vec<Mismatch>,
    pub warnings: Vec<Mismatch>,
    pub pending: usize,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn validate(plan: &MigrationPlan, policy: Policy) -> ValidationReport {
    let (errors, warnings) = match policy {
        Policy::Strict => (plan.mismatches.clone(), Vec::new()),
        Policy::Permissive => {
            for mismatch in &plan.mismatches {
                tracing::warn!(version = %mismatch.version(), "{mismatch}");
            }
            (Vec::new(), plan.mismatches.clone())
        }
    };

    ValidationReport {
        policy,
        errors,
        warnings,
        pending: plan.pending.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::{validate, Policy};
    use crate::resolve::tests::{m, record};
    use crate::resolve::{resolve, ResolveOptions};

    #[test]
    fn clean_plan_passes_in_both_modes() {
        let history = vec![record(1, "1", "a", true)];
        let plan = resolve(vec![m("1", "a"), m("2", "b")], &history, ResolveOptions::default())
            .unwrap();

        assert!(validate(&plan, Policy::Strict).passed());
        let report = validate(&plan, Policy::Permissive);
        assert!(report.passed());
        assert!(report.warnings.is_empty());
        assert_eq!(report.pending, 1);
    }

    #[test]
    fn drift_fails_strict_and_warns_when_permissive() {
        let history = vec![record(1, "1", "before", true)];
        let plan = resolve(vec![m("1", "after")], &history, ResolveOptions::default()).unwrap();

        let strict = validate(&plan, Policy::Strict);
        assert!(!strict.passed());
        assert_eq!(strict.errors.len(), 1);

        let permissive = validate(&plan, Policy::Permissive);
        assert!(permissive.passed());
        assert_eq!(permissive.warnings.len(), 1);
    }

    #[test]
    fn strict_is_the_default_policy() {
        assert_eq!(Policy::default(), Policy::Strict);
    }
}

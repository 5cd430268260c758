//! Mutant and result types for mutation testing.

use serde::{Deserialize, Serialize};

use crate::bytecode::MethodBody;

use super::MutationIdentifier;

/// A candidate mutation as reported by a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationDetails {
    /// Identity of the mutation.
    pub id: MutationIdentifier,
    /// 1-based position in the scan's registration order; pass this back to
    /// reproduce the mutant.
    pub ordinal: usize,
    /// Source line of the mutated instruction, when line numbers are present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl MutationDetails {
    pub fn new(id: MutationIdentifier, ordinal: usize, line: Option<u32>) -> Self {
        Self { id, ordinal, line }
    }

    /// Human-readable description of the mutation.
    pub fn description(&self) -> &str {
        &self.id.description
    }
}

/// A single generated mutant: the method body with exactly one mutation applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mutant {
    pub details: MutationDetails,
    /// The mutated method body.
    pub method: MethodBody,
}

/// Status of a mutant after test execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStatus {
    /// A test failed - the mutant was detected (good).
    Killed,
    /// All tests passed - the mutant was not detected (bad).
    Survived,
    /// No test covers the mutated code.
    NoCoverage,
    /// Test execution timed out.
    TimedOut,
    /// The test run ran out of memory.
    MemoryError,
    /// The test run failed for reasons unrelated to the mutant.
    RunError,
    /// The mutated bytecode was rejected by the verifier.
    NonViable,
}

impl DetectionStatus {
    /// Returns true if this status represents a detected mutant.
    pub fn is_detected(&self) -> bool {
        matches!(self, Self::Killed | Self::TimedOut | Self::MemoryError)
    }

    /// Returns true if this status represents an undetected mutant.
    pub fn is_survived(&self) -> bool {
        matches!(self, Self::Survived | Self::NoCoverage)
    }

    /// Returns true if a stored result with this status can stand in for a
    /// fresh run when nothing about the class changed.
    pub fn is_reusable(&self) -> bool {
        matches!(
            self,
            Self::Killed | Self::Survived | Self::TimedOut | Self::NoCoverage
        )
    }
}

/// Outcome of running the test suite against one mutant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationStatusTestPair {
    /// Number of tests executed against the mutant.
    pub tests_run: u32,
    pub status: DetectionStatus,
    /// Name of the first test that killed the mutant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub killing_test: Option<String>,
}

impl MutationStatusTestPair {
    pub fn new(tests_run: u32, status: DetectionStatus) -> Self {
        Self {
            tests_run,
            status,
            killing_test: None,
        }
    }

    pub fn killed_by(tests_run: u32, test: impl Into<String>) -> Self {
        Self {
            tests_run,
            status: DetectionStatus::Killed,
            killing_test: Some(test.into()),
        }
    }
}

/// Result fed back by the external test runner for one mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationResult {
    /// The mutation that was tested.
    pub details: MutationDetails,
    /// Status after test execution.
    pub status: MutationStatusTestPair,
}

impl MutationResult {
    pub fn new(details: MutationDetails, status: MutationStatusTestPair) -> Self {
        Self { details, status }
    }

    pub fn id(&self) -> &MutationIdentifier {
        &self.details.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::{MethodLocation, OperatorId};

    fn details() -> MutationDetails {
        MutationDetails::new(
            MutationIdentifier::new(
                MethodLocation::new("a/Calc", "add", "(II)I"),
                OperatorId::from_static("bytemut.math.v1"),
                2,
                0,
                "Replaced integer addition with subtraction",
            ),
            1,
            Some(12),
        )
    }

    #[test]
    fn test_details_description() {
        assert_eq!(
            details().description(),
            "Replaced integer addition with subtraction"
        );
    }

    #[test]
    fn test_status_is_detected() {
        assert!(DetectionStatus::Killed.is_detected());
        assert!(DetectionStatus::TimedOut.is_detected());
        assert!(!DetectionStatus::Survived.is_detected());
        assert!(!DetectionStatus::RunError.is_detected());
    }

    #[test]
    fn test_status_is_survived() {
        assert!(DetectionStatus::Survived.is_survived());
        assert!(DetectionStatus::NoCoverage.is_survived());
        assert!(!DetectionStatus::Killed.is_survived());
    }

    #[test]
    fn test_status_is_reusable() {
        assert!(DetectionStatus::Killed.is_reusable());
        assert!(DetectionStatus::NoCoverage.is_reusable());
        assert!(!DetectionStatus::RunError.is_reusable());
        assert!(!DetectionStatus::MemoryError.is_reusable());
        assert!(!DetectionStatus::NonViable.is_reusable());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&DetectionStatus::Killed).unwrap(),
            "\"killed\""
        );
        assert_eq!(
            serde_json::to_string(&DetectionStatus::TimedOut).unwrap(),
            "\"timed_out\""
        );
        assert_eq!(
            serde_json::to_string(&DetectionStatus::NoCoverage).unwrap(),
            "\"no_coverage\""
        );
    }

    #[test]
    fn test_killed_by() {
        let pair = MutationStatusTestPair::killed_by(3, "CalcTest.adds");
        assert_eq!(pair.status, DetectionStatus::Killed);
        assert_eq!(pair.killing_test.as_deref(), Some("CalcTest.adds"));
    }

    #[test]
    fn test_result_serialization_skips_missing_test() {
        let result = MutationResult::new(
            details(),
            MutationStatusTestPair::new(4, DetectionStatus::Survived),
        );
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"status\":\"survived\""));
        assert!(!json.contains("killing_test"));
        assert_eq!(result.id().instruction, 2);
    }
}

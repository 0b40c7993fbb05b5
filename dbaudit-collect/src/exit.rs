//! Process exit status for an audit run.

use dbaudit_core::AuditReport;

/// How an audit run ends, mapped onto the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditExit {
    /// The audit completed with a passing grade.
    Passed,
    /// The audit completed below the passing grade.
    BelowPassingGrade,
    /// Connection, configuration or report write failure.
    Fatal,
}

impl AuditExit {
    /// Numeric exit code: 0 passed, 1 below the passing grade, 2 fatal.
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Passed => 0,
            Self::BelowPassingGrade => 1,
            Self::Fatal => 2,
        }
    }

    /// Exit status for a completed audit. A report never yields `Fatal`.
    pub fn from_report(report: &AuditReport) -> Self {
        if report.passing {
            Self::Passed
        } else {
            Self::BelowPassingGrade
        }
    }
}

impl From<AuditExit> for std::process::ExitCode {
    fn from(exit: AuditExit) -> Self {
        Self::from(exit.as_u8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbaudit_core::{AuditCatalog, AuditPipeline, Grade, MemorySession};

    #[test]
    fn test_exit_codes_are_distinct() {
        assert_eq!(AuditExit::Passed.as_u8(), 0);
        assert_eq!(AuditExit::BelowPassingGrade.as_u8(), 1);
        assert_eq!(AuditExit::Fatal.as_u8(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_catalog_fails_the_grade() {
        let session = MemorySession::new();
        let catalog = AuditCatalog::listings();
        let mut pipeline = AuditPipeline::new(&catalog);
        pipeline.attach(&session);
        let report = pipeline.run().await.unwrap();

        assert_eq!(report.grade, Grade::C);
        assert_eq!(AuditExit::from_report(&report), AuditExit::BelowPassingGrade);
    }
}

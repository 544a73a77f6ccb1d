//! Per-category aggregation into the overview summary.
//!
//! A category fails when any diff row is a mismatch or is missing in
//! TARGET; extra TARGET entities alone never fail a category, they are
//! surfaced in the reason text instead.

use crate::report::{CategoryReport, CategorySummary, Verdict};

/// Rolls one category's diff rows into counts, verdict and reason.
pub fn summarize(report: &CategoryReport) -> CategorySummary {
    let missing = report.rows.iter().filter(|r| r.status.is_missing()).count();
    let mismatches = report.rows.iter().filter(|r| r.status.is_mismatch()).count();
    let extra = report.rows.iter().filter(|r| r.status.is_extra()).count();

    let verdict = if missing > 0 || mismatches > 0 {
        Verdict::Failed
    } else {
        Verdict::Passed
    };

    // Fixed phrase order: missing, mismatch, extra. Extra is suppressed once
    // anything failed, to keep reasons focused on what blocks the migration.
    let mut parts = Vec::new();
    if missing > 0 {
        parts.push(format!("{} missing in TARGET", missing));
    }
    if mismatches > 0 {
        parts.push(format!("{} mismatches", mismatches));
    }
    if extra > 0 && missing == 0 && mismatches == 0 {
        parts.push(format!("{} extra in TARGET", extra));
    }

    let reason = if parts.is_empty() {
        "All matched".to_string()
    } else {
        parts.join("; ")
    };

    let difference = i64::try_from(report.source_count).unwrap_or(i64::MAX)
        - i64::try_from(report.target_count).unwrap_or(i64::MAX);

    CategorySummary {
        category: report.category,
        source_count: report.source_count,
        target_count: report.target_count,
        difference,
        verdict,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use crate::report::{DiffRow, Status};

    fn report_with(statuses: Vec<Status>) -> CategoryReport {
        let mut report = CategoryReport::new(Category::View, vec!["Status".to_string()]);
        report.rows = statuses.into_iter().map(DiffRow::new).collect();
        report.source_count = report
            .rows
            .iter()
            .filter(|r| !r.status.is_extra())
            .count() as u64;
        report.target_count = report
            .rows
            .iter()
            .filter(|r| !r.status.is_missing())
            .count() as u64;
        report
    }

    #[test]
    fn test_all_matched_passes() {
        let summary = summarize(&report_with(vec![Status::Matched, Status::Matched]));
        assert_eq!(summary.verdict, Verdict::Passed);
        assert_eq!(summary.reason, "All matched");
        assert_eq!(summary.difference, 0);
    }

    #[test]
    fn test_extra_alone_passes_with_reason() {
        let summary = summarize(&report_with(vec![Status::Matched, Status::ExtraInTarget]));
        assert_eq!(summary.verdict, Verdict::Passed);
        assert_eq!(summary.reason, "1 extra in TARGET");
    }

    #[test]
    fn test_missing_fails() {
        let summary = summarize(&report_with(vec![Status::Matched, Status::MissingInTarget]));
        assert_eq!(summary.verdict, Verdict::Failed);
        assert_eq!(summary.reason, "1 missing in TARGET");
    }

    #[test]
    fn test_mismatch_fails_and_suppresses_extra() {
        let summary = summarize(&report_with(vec![
            Status::plain_mismatch(),
            Status::ExtraInTarget,
            Status::MissingInTarget,
        ]));
        assert_eq!(summary.verdict, Verdict::Failed);
        // Extra is suppressed once missing/mismatch exist; fixed order.
        assert_eq!(summary.reason, "1 missing in TARGET; 1 mismatches");
    }

    #[test]
    fn test_both_zero_counts_as_pass() {
        let summary = summarize(&report_with(vec![Status::MatchedBothZero]));
        assert_eq!(summary.verdict, Verdict::Passed);
        assert_eq!(summary.reason, "All matched");
    }
}

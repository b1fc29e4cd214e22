//! Pure aggregation over a fetched profile.
//!
//! Everything here is deterministic and side-effect-free: read-only input,
//! derived figures out, recomputed on every load and never stored.

use crate::api::graphql::{ProfileData, TransactionRecord, XpRecord};

pub const PISCINE_GO_PREFIX: &str = "/adam/piscine-go/";
pub const PISCINE_JS_PREFIX: &str = "/adam/module/piscine-js/";

/// Categories retained for the skill pie; anything else is dropped.
pub const SKILL_CATEGORIES: [&str; 5] = ["go", "html", "js", "sql", "css"];

/// Bucket labels for the per-project XP totals. "Piscine-Java" is the
/// platform's historical label for the JS piscine; keep it as-is.
pub const XP_BUCKET_LABELS: [&str; 3] = ["Piscine-Java", "Piscine-Go", "Module"];

/// Hard-coded baseline credit added to the module XP sum before scaling.
pub const MODULE_XP_BASELINE: f64 = 70_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedMetrics {
    pub piscine_go_kb: f64,
    pub piscine_js_kb: f64,
    pub module_xp_percent: i64,
    pub highest_checkpoint: f64,
    /// (category, max score) pairs in allow-list order; absent categories omitted.
    pub skill_scores: Vec<(String, f64)>,
    /// (bucket label, XP sum) pairs in fixed label order; empty buckets omitted.
    pub xp_buckets: Vec<(String, f64)>,
}

/// Sum of amounts on paths under `prefix`, presented in KB (divided by 1000).
pub fn piscine_xp_total(xps: &[XpRecord], prefix: &str) -> f64 {
    xps.iter()
        .filter(|xp| xp.path.starts_with(prefix))
        .map(|xp| xp.amount)
        .sum::<f64>()
        / 1000.0
}

/// True when the path contains `module` (case-insensitive) at least once
/// NOT immediately followed by `/piscine`. A path may contain several
/// occurrences; one qualifying occurrence is enough.
fn has_module_outside_piscine(path: &str) -> bool {
    let lower = path.to_lowercase();
    let mut start = 0;
    while let Some(pos) = lower[start..].find("module") {
        let after = start + pos + "module".len();
        if !lower[after..].starts_with("/piscine") {
            return true;
        }
        start = after;
    }
    false
}

fn module_xp_total(xps: &[XpRecord]) -> f64 {
    xps.iter()
        .filter(|xp| has_module_outside_piscine(&xp.path))
        .map(|xp| xp.amount)
        .sum()
}

/// Module XP as a percentage-like integer: (sum + baseline) / 1000, rounded.
pub fn total_module_percentage(xps: &[XpRecord]) -> i64 {
    ((module_xp_total(xps) + MODULE_XP_BASELINE) / 1000.0).round() as i64
}

/// Maximum amount among `skill_prog` transactions; 0 when none exist.
pub fn highest_skill_progress(transactions: &[TransactionRecord]) -> f64 {
    transactions
        .iter()
        .filter(|tx| tx.kind == "skill_prog")
        .fold(0.0_f64, |max, tx| max.max(tx.amount))
}

/// Max score per allow-listed skill category. Transactions typed
/// `skill_<category>` contribute; categories outside the allow-list are
/// dropped silently. Output follows allow-list order for determinism.
pub fn skill_scores_by_category(transactions: &[TransactionRecord]) -> Vec<(String, f64)> {
    let mut best: [Option<f64>; SKILL_CATEGORIES.len()] = [None; SKILL_CATEGORIES.len()];
    for tx in transactions {
        let category = match tx.kind.strip_prefix("skill_") {
            Some(c) => c,
            None => continue,
        };
        let idx = match SKILL_CATEGORIES.iter().position(|c| *c == category) {
            Some(i) => i,
            None => continue,
        };
        let slot = best[idx].get_or_insert(tx.amount);
        if tx.amount > *slot {
            *slot = tx.amount;
        }
    }
    SKILL_CATEGORIES
        .iter()
        .zip(best)
        .filter_map(|(category, score)| score.map(|s| ((*category).to_string(), s)))
        .collect()
}

/// Partition every XP record into exactly one bucket, in priority order:
/// the JS piscine prefix first (it nests under `/adam/module/`), then the
/// Go piscine prefix, then the catch-all. Buckets no record landed in are
/// omitted; a bucket holding only zero-amount records is still present.
pub fn xp_by_project_category(xps: &[XpRecord]) -> Vec<(String, f64)> {
    let mut sums: [Option<f64>; XP_BUCKET_LABELS.len()] = [None; XP_BUCKET_LABELS.len()];
    for xp in xps {
        let idx = if xp.path.starts_with(PISCINE_JS_PREFIX) {
            0
        } else if xp.path.starts_with(PISCINE_GO_PREFIX) {
            1
        } else {
            2
        };
        *sums[idx].get_or_insert(0.0) += xp.amount;
    }
    XP_BUCKET_LABELS
        .iter()
        .zip(sums)
        .filter_map(|(label, sum)| sum.map(|s| ((*label).to_string(), s)))
        .collect()
}

/// Run every aggregation over one fetched profile.
pub fn aggregate(profile: &ProfileData) -> AggregatedMetrics {
    let xps = &profile.user.xps;
    let transactions = &profile.transactions;
    AggregatedMetrics {
        piscine_go_kb: piscine_xp_total(xps, PISCINE_GO_PREFIX),
        piscine_js_kb: piscine_xp_total(xps, PISCINE_JS_PREFIX),
        module_xp_percent: total_module_percentage(xps),
        highest_checkpoint: highest_skill_progress(transactions),
        skill_scores: skill_scores_by_category(transactions),
        xp_buckets: xp_by_project_category(xps),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::graphql::UserRecord;

    fn xp(amount: f64, path: &str) -> XpRecord {
        XpRecord {
            amount,
            path: path.to_string(),
        }
    }

    fn tx(kind: &str, amount: f64) -> TransactionRecord {
        TransactionRecord {
            kind: kind.to_string(),
            amount,
            created_at: String::new(),
        }
    }

    #[test]
    fn test_piscine_total_sums_matching_prefix_in_kb() {
        let xps = vec![
            xp(1000.0, "/adam/piscine-go/quest-01"),
            xp(500.0, "/adam/piscine-go/quest-02"),
            xp(9999.0, "/adam/module/other"),
        ];
        assert_eq!(piscine_xp_total(&xps, PISCINE_GO_PREFIX), 1.5);
    }

    #[test]
    fn test_piscine_total_is_zero_without_matches() {
        assert_eq!(piscine_xp_total(&[], PISCINE_GO_PREFIX), 0.0);
        let xps = vec![xp(100.0, "/adam/module/x")];
        assert_eq!(piscine_xp_total(&xps, PISCINE_GO_PREFIX), 0.0);
    }

    #[test]
    fn test_module_percentage_excludes_piscine_subpaths() {
        let xps = vec![xp(1000.0, "/module/x"), xp(500.0, "/module/piscine/y")];
        assert_eq!(total_module_percentage(&xps), 71);
    }

    #[test]
    fn test_module_percentage_baseline_on_empty() {
        assert_eq!(total_module_percentage(&[]), 70);
    }

    #[test]
    fn test_module_match_is_case_insensitive() {
        let xps = vec![xp(2000.0, "/adam/MODULE/checkpoint")];
        assert_eq!(total_module_percentage(&xps), 72);
        let excluded = vec![xp(2000.0, "/adam/Module/Piscine/x")];
        assert_eq!(total_module_percentage(&excluded), 70);
    }

    #[test]
    fn test_module_match_any_occurrence_qualifies() {
        // First occurrence is piscine-flavored, second is not.
        let xps = vec![xp(3000.0, "/module/piscine/module/z")];
        assert_eq!(total_module_percentage(&xps), 73);
    }

    #[test]
    fn test_js_piscine_paths_are_not_module_xp() {
        let xps = vec![xp(5000.0, "/adam/module/piscine-js/tron")];
        assert_eq!(total_module_percentage(&xps), 70);
    }

    #[test]
    fn test_highest_skill_progress() {
        let txs = vec![
            tx("skill_prog", 40.0),
            tx("skill_prog", 75.0),
            tx("other", 999.0),
        ];
        assert_eq!(highest_skill_progress(&txs), 75.0);
    }

    #[test]
    fn test_highest_skill_progress_empty_is_zero() {
        assert_eq!(highest_skill_progress(&[]), 0.0);
        assert_eq!(highest_skill_progress(&[tx("xp", 100.0)]), 0.0);
    }

    #[test]
    fn test_skill_scores_keep_max_and_drop_unknown() {
        let txs = vec![
            tx("skill_go", 10.0),
            tx("skill_go", 30.0),
            tx("skill_rust", 99.0),
        ];
        let scores = skill_scores_by_category(&txs);
        assert_eq!(scores, vec![("go".to_string(), 30.0)]);
    }

    #[test]
    fn test_skill_scores_follow_allow_list_order() {
        let txs = vec![tx("skill_css", 5.0), tx("skill_go", 7.0)];
        let scores = skill_scores_by_category(&txs);
        assert_eq!(
            scores,
            vec![("go".to_string(), 7.0), ("css".to_string(), 5.0)]
        );
    }

    #[test]
    fn test_skill_prog_is_not_a_pie_category() {
        let txs = vec![tx("skill_prog", 80.0)];
        assert!(skill_scores_by_category(&txs).is_empty());
    }

    #[test]
    fn test_buckets_partition_all_records() {
        let xps = vec![
            xp(100.0, "/adam/module/piscine-js/tron"),
            xp(200.0, "/adam/piscine-go/quest"),
            xp(300.0, "/adam/module/checkpoint"),
            xp(50.0, "/somewhere/else"),
        ];
        let buckets = xp_by_project_category(&xps);
        assert_eq!(
            buckets,
            vec![
                ("Piscine-Java".to_string(), 100.0),
                ("Piscine-Go".to_string(), 200.0),
                ("Module".to_string(), 350.0),
            ]
        );
        let total: f64 = buckets.iter().map(|(_, sum)| sum).sum();
        assert_eq!(total, 650.0);
    }

    #[test]
    fn test_js_piscine_wins_bucket_priority() {
        // The JS piscine prefix nests under /adam/module/ and must be
        // classified before the catch-all sees it.
        let xps = vec![xp(100.0, "/adam/module/piscine-js/tron")];
        let buckets = xp_by_project_category(&xps);
        assert_eq!(buckets, vec![("Piscine-Java".to_string(), 100.0)]);
    }

    #[test]
    fn test_empty_buckets_are_omitted() {
        let xps = vec![xp(100.0, "/adam/piscine-go/quest")];
        let buckets = xp_by_project_category(&xps);
        assert_eq!(buckets, vec![("Piscine-Go".to_string(), 100.0)]);
    }

    #[test]
    fn test_zero_amount_record_keeps_bucket_present() {
        let xps = vec![xp(0.0, "/adam/piscine-go/quest")];
        let buckets = xp_by_project_category(&xps);
        assert_eq!(buckets, vec![("Piscine-Go".to_string(), 0.0)]);
    }

    #[test]
    fn test_no_records_no_buckets() {
        assert!(xp_by_project_category(&[]).is_empty());
    }

    #[test]
    fn test_aggregate_zero_data() {
        let profile = ProfileData {
            user: UserRecord {
                id: 1,
                first_name: None,
                last_name: None,
                audit_ratio: 0.0,
                xps: vec![],
                groups: vec![],
            },
            transactions: vec![],
        };
        let metrics = aggregate(&profile);
        assert_eq!(metrics.piscine_go_kb, 0.0);
        assert_eq!(metrics.piscine_js_kb, 0.0);
        assert_eq!(metrics.module_xp_percent, 70);
        assert_eq!(metrics.highest_checkpoint, 0.0);
        assert!(metrics.skill_scores.is_empty());
        assert!(metrics.xp_buckets.is_empty());
    }
}

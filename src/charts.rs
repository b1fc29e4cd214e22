//! Chart specifications, built from aggregated metrics.
//!
//! These are pure descriptions of what to draw. The renderer maps them
//! onto widgets each frame, so rebuilding a spec replaces the previous
//! chart instead of stacking another one onto the same surface.

use crate::stats::AggregatedMetrics;

/// Five-slot palette; slices cycle through it when labels outnumber colors.
pub const PALETTE: [(u8, u8, u8); 5] = [
    (255, 105, 180),
    (255, 20, 147),
    (255, 182, 193),
    (255, 160, 122),
    (255, 215, 0),
];

pub const LINE_DATASET_LABEL: &str = "Total XP per Project";

#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
    pub color_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieSpec {
    pub slices: Vec<PieSlice>,
}

impl PieSpec {
    pub fn total(&self) -> f64 {
        self.slices.iter().map(|s| s.value).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineSpec {
    pub label: &'static str,
    pub points: Vec<(String, f64)>,
}

impl LineSpec {
    pub fn max_value(&self) -> f64 {
        self.points.iter().fold(0.0_f64, |max, (_, v)| max.max(*v))
    }
}

/// Pie over max skill scores. `None` when no allow-listed skill was seen,
/// which the renderer turns into a textual placeholder.
pub fn build_skill_pie(metrics: &AggregatedMetrics) -> Option<PieSpec> {
    if metrics.skill_scores.is_empty() {
        return None;
    }
    let slices = metrics
        .skill_scores
        .iter()
        .enumerate()
        .map(|(i, (label, value))| PieSlice {
            label: label.clone(),
            value: *value,
            color_index: i % PALETTE.len(),
        })
        .collect();
    Some(PieSpec { slices })
}

/// Line over per-bucket XP totals. `None` when the profile had no XP
/// records at all.
pub fn build_xp_line(metrics: &AggregatedMetrics) -> Option<LineSpec> {
    if metrics.xp_buckets.is_empty() {
        return None;
    }
    Some(LineSpec {
        label: LINE_DATASET_LABEL,
        points: metrics.xp_buckets.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics_with(
        skill_scores: Vec<(String, f64)>,
        xp_buckets: Vec<(String, f64)>,
    ) -> AggregatedMetrics {
        AggregatedMetrics {
            piscine_go_kb: 0.0,
            piscine_js_kb: 0.0,
            module_xp_percent: 70,
            highest_checkpoint: 0.0,
            skill_scores,
            xp_buckets,
        }
    }

    #[test]
    fn test_pie_assigns_palette_indices_in_order() {
        let metrics = metrics_with(
            vec![
                ("go".to_string(), 30.0),
                ("html".to_string(), 20.0),
                ("js".to_string(), 10.0),
                ("sql".to_string(), 5.0),
                ("css".to_string(), 1.0),
            ],
            vec![],
        );
        let pie = build_skill_pie(&metrics).unwrap();
        let indices: Vec<usize> = pie.slices.iter().map(|s| s.color_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        assert_eq!(pie.total(), 66.0);
    }

    #[test]
    fn test_pie_is_none_without_skills() {
        let metrics = metrics_with(vec![], vec![("Module".to_string(), 10.0)]);
        assert!(build_skill_pie(&metrics).is_none());
    }

    #[test]
    fn test_line_carries_buckets_in_order() {
        let metrics = metrics_with(
            vec![],
            vec![
                ("Piscine-Go".to_string(), 200.0),
                ("Module".to_string(), 350.0),
            ],
        );
        let line = build_xp_line(&metrics).unwrap();
        assert_eq!(line.label, LINE_DATASET_LABEL);
        assert_eq!(line.points.len(), 2);
        assert_eq!(line.max_value(), 350.0);
    }

    #[test]
    fn test_line_is_none_without_xp() {
        let metrics = metrics_with(vec![("go".to_string(), 1.0)], vec![]);
        assert!(build_xp_line(&metrics).is_none());
    }
}

// ============================================================
// Layer 5 - Evaluation Maths
// ============================================================
// Plain functions over slices, no tensors:
//
//   accuracy / classification_report  → end-of-run metrics
//   roc_curve                          → per-class ROC for the tracker
//   histogram                          → gradient histograms
//   argmax_rows                        → predictions from stored logits
//
// Precision, recall and F1 follow the usual multi-class
// conventions: a zero denominator gives 0, and the "weighted"
// average weights each class by its support (number of true
// examples of that class).

use serde::{Deserialize, Serialize};

use crate::domain::record::Histogram;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
    pub support:   usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub per_class: Vec<ClassMetrics>,
    pub accuracy:  f64,
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
}

/// Fraction of positions where `preds` equals `targets`.
/// Returns 0.0 for empty input.
pub fn accuracy(targets: &[usize], preds: &[usize]) -> f64 {
    if targets.is_empty() {
        return 0.0;
    }
    let correct = targets.iter().zip(preds).filter(|(t, p)| t == p).count();
    correct as f64 / targets.len() as f64
}

/// Per-class and support-weighted precision/recall/F1.
/// Labels outside `0..num_classes` are ignored.
pub fn classification_report(
    targets:     &[usize],
    preds:       &[usize],
    num_classes: usize,
) -> ClassificationReport {
    let mut tp = vec![0usize; num_classes];
    let mut fp = vec![0usize; num_classes];
    let mut fn_ = vec![0usize; num_classes];

    for (&t, &p) in targets.iter().zip(preds) {
        if t >= num_classes || p >= num_classes {
            continue;
        }
        if t == p {
            tp[t] += 1;
        } else {
            fp[p] += 1;
            fn_[t] += 1;
        }
    }

    let per_class: Vec<ClassMetrics> = (0..num_classes)
        .map(|c| {
            let precision = ratio(tp[c], tp[c] + fp[c]);
            let recall = ratio(tp[c], tp[c] + fn_[c]);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            ClassMetrics { precision, recall, f1, support: tp[c] + fn_[c] }
        })
        .collect();

    let total: usize = per_class.iter().map(|m| m.support).sum();
    let weighted = |f: fn(&ClassMetrics) -> f64| {
        if total == 0 {
            return 0.0;
        }
        per_class.iter().map(|m| f(m) * m.support as f64).sum::<f64>() / total as f64
    };

    ClassificationReport {
        accuracy:  accuracy(targets, preds),
        precision: weighted(|m| m.precision),
        recall:    weighted(|m| m.recall),
        f1:        weighted(|m| m.f1),
        per_class,
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

/// One-vs-rest ROC curve.
///
/// Returns `(fpr, tpr, auc)` with a point for every distinct score
/// threshold, starting at (0, 0). `None` when `truth` has no
/// positives or no negatives, since one axis is then undefined.
pub fn roc_curve(truth: &[bool], scores: &[f32]) -> Option<(Vec<f64>, Vec<f64>, f64)> {
    let positives = truth.iter().filter(|&&t| t).count();
    let negatives = truth.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..truth.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut fpr = vec![0.0];
    let mut tpr = vec![0.0];
    let (mut tp, mut fp) = (0usize, 0usize);

    for (i, &idx) in order.iter().enumerate() {
        if truth[idx] {
            tp += 1;
        } else {
            fp += 1;
        }

        // Emit a point only once every sample sharing this score is counted
        let last_of_threshold = order
            .get(i + 1)
            .map_or(true, |&next| scores[next] != scores[idx]);
        if last_of_threshold {
            fpr.push(fp as f64 / negatives as f64);
            tpr.push(tp as f64 / positives as f64);
        }
    }

    let auc = fpr
        .windows(2)
        .zip(tpr.windows(2))
        .map(|(x, y)| (x[1] - x[0]) * (y[1] + y[0]) / 2.0)
        .sum();

    Some((fpr, tpr, auc))
}

/// Equal-width histogram over the finite values.
///
/// The range is [min, max]; a constant input uses [v - 0.5, v + 0.5]
/// and an input without finite values uses [0, 1].
pub fn histogram(values: &[f32], bins: usize) -> Histogram {
    let bins = bins.max(1);
    let finite = values.iter().copied().filter(|v| v.is_finite()).map(f64::from);

    let (lo, hi) = finite
        .clone()
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
        .map(|(lo, hi)| if lo == hi { (lo - 0.5, hi + 0.5) } else { (lo, hi) })
        .unwrap_or((0.0, 1.0));

    let width = (hi - lo) / bins as f64;
    let bin_edges = (0..=bins).map(|i| lo + width * i as f64).collect();

    let mut counts = vec![0u64; bins];
    for v in finite {
        // The right edge belongs to the last bin
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    Histogram { bin_edges, counts }
}

/// Row-wise argmax of a row-major `[rows, cols]` score matrix.
pub fn argmax_rows(scores: &[f32], cols: usize) -> Vec<usize> {
    scores
        .chunks_exact(cols)
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((0, f32::NEG_INFINITY), |(bi, bv), (i, &v)| if v > bv { (i, v) } else { (bi, bv) })
                .0
        })
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_accuracy() {
        assert!(close(accuracy(&[0, 1, 2, 3], &[0, 1, 0, 3]), 0.75));
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    fn test_weighted_report_matches_hand_computation() {
        // class 0: tp=2 fp=1 fn=0 → p=2/3 r=1   f1=0.8   support 2
        // class 1: tp=1 fp=0 fn=1 → p=1   r=1/2 f1=2/3   support 2
        // class 2: tp=0 fp=0 fn=0 → all 0              support 0
        let targets = [0, 0, 1, 1];
        let preds = [0, 0, 1, 0];
        let r = classification_report(&targets, &preds, 3);

        assert!(close(r.accuracy, 0.75));
        assert!(close(r.precision, (2.0 / 3.0 + 1.0) / 2.0));
        assert!(close(r.recall, (1.0 + 0.5) / 2.0));
        assert!(close(r.f1, (0.8 + 2.0 / 3.0) / 2.0));
        assert_eq!(r.per_class[2].support, 0);
        assert_eq!(r.per_class[2].precision, 0.0);
    }

    #[test]
    fn test_weighted_recall_equals_accuracy() {
        let targets = [0, 1, 2, 2, 1, 0, 3];
        let preds = [0, 2, 2, 1, 1, 3, 3];
        let r = classification_report(&targets, &preds, 4);
        assert!(close(r.recall, r.accuracy));
    }

    #[test]
    fn test_predicted_only_class_has_no_weight() {
        // Class 5 is never a target, so its zero precision must not drag
        // the weighted average down.
        let r = classification_report(&[0, 0], &[0, 5], 10);
        assert!(close(r.precision, 1.0));
        assert!(close(r.recall, 0.5));
    }

    #[test]
    fn test_roc_perfect_and_inverted() {
        let truth = [true, true, false, false];
        let (_, _, auc) = roc_curve(&truth, &[0.9, 0.8, 0.2, 0.1]).unwrap();
        assert!(close(auc, 1.0));

        let (_, _, auc) = roc_curve(&truth, &[0.1, 0.2, 0.8, 0.9]).unwrap();
        assert!(close(auc, 0.0));
    }

    #[test]
    fn test_roc_ties_collapse_to_one_point() {
        let truth = [true, false, true, false];
        let (fpr, tpr, auc) = roc_curve(&truth, &[0.5, 0.5, 0.5, 0.5]).unwrap();
        assert_eq!(fpr, vec![0.0, 1.0]);
        assert_eq!(tpr, vec![0.0, 1.0]);
        assert!(close(auc, 0.5));
    }

    #[test]
    fn test_roc_undefined_without_both_classes() {
        assert!(roc_curve(&[true, true], &[0.1, 0.2]).is_none());
        assert!(roc_curve(&[false], &[0.1]).is_none());
    }

    #[test]
    fn test_histogram_counts_every_finite_value() {
        let h = histogram(&[0.0, 0.5, 1.0, 1.0, f32::NAN, f32::INFINITY], 2);
        assert_eq!(h.bin_edges, vec![0.0, 0.5, 1.0]);
        assert_eq!(h.counts, vec![1, 3]);
    }

    #[test]
    fn test_histogram_constant_input() {
        let h = histogram(&[2.0, 2.0, 2.0], 4);
        assert!(close(h.bin_edges[0], 1.5));
        assert!(close(h.bin_edges[4], 2.5));
        assert_eq!(h.total(), 3);
    }

    #[test]
    fn test_argmax_rows() {
        let scores = [0.1, 0.7, 0.2, 3.0, -1.0, 2.0];
        assert_eq!(argmax_rows(&scores, 3), vec![1, 0]);
    }
}

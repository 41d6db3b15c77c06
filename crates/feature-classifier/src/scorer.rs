//! Category scoring: weighted rules over a [`FeatureVector`]
//!
//! Seven independent rules are evaluated against every vector. Each rule either abstains
//! or assigns a fixed score to one category; a category keeps the highest score any rule
//! gave it. The best-scoring category wins. On equal scores the category whose first
//! firing rule comes earliest in [`RULES`] wins. If nothing fires the result is
//! `(unknown, 0.0)`.
//!
//! Diagnostic notes are derived separately and never influence the score.

use serde::{Deserialize, Serialize};
use tracing::debug;
use vmap_common::{FeatureVector, SpaceCategory};

/// One scoring rule
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub category: SpaceCategory,
    pub score: f64,
    pub condition: fn(&FeatureVector) -> bool,
}

/// Scoring rules in evaluation order
pub const RULES: [Rule; 7] = [
    Rule {
        name: "hallway-lines",
        category: SpaceCategory::Hallway,
        score: 0.80,
        condition: |f| f.line_count > 50 && f.vertical_line_count > 20 && f.edge_density > 0.15,
    },
    Rule {
        name: "hallway-doors",
        category: SpaceCategory::Hallway,
        score: 0.75,
        condition: |f| f.door_count > 2,
    },
    Rule {
        name: "classroom",
        category: SpaceCategory::Classroom,
        score: 0.60,
        condition: |f| {
            f.edge_density > 0.10 && f.edge_density < 0.20 && f.symmetry < 0.5 && f.contrast > 50.0
        },
    },
    Rule {
        name: "common-area",
        category: SpaceCategory::CommonArea,
        score: 0.70,
        condition: |f| f.edge_density < 0.10 && f.brightness > 150.0,
    },
    Rule {
        name: "doorway",
        category: SpaceCategory::Doorway,
        score: 0.65,
        condition: |f| f.door_count >= 1 && f.symmetry > 0.6,
    },
    Rule {
        name: "stairwell",
        category: SpaceCategory::Stairwell,
        score: 0.70,
        condition: |f| f.line_count > 80 && f.edge_density > 0.25,
    },
    Rule {
        name: "office",
        category: SpaceCategory::Office,
        score: 0.50,
        condition: |f| f.edge_density > 0.12 && f.edge_density < 0.18 && f.saturation < 100.0,
    },
];

/// Outcome of classifying one feature vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: SpaceCategory,
    /// Rule strength in [0, 1]; not a calibrated probability
    pub confidence: f64,
    pub features: FeatureVector,
    /// Human-readable observations, in a fixed order
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
struct CategoryScore {
    score: f64,
    first_rule: usize,
}

/// Per-category running maximum over every firing rule
fn score_categories(features: &FeatureVector) -> [Option<CategoryScore>; SpaceCategory::COUNT] {
    let mut scores: [Option<CategoryScore>; SpaceCategory::COUNT] = [None; SpaceCategory::COUNT];
    for (rank, rule) in RULES.iter().enumerate() {
        if !(rule.condition)(features) {
            continue;
        }
        debug!(
            "Rule {} fired ({} = {:.2})",
            rule.name, rule.category, rule.score
        );
        let idx = rule.category.index();
        scores[idx] = Some(match scores[idx] {
            Some(existing) => CategoryScore {
                score: existing.score.max(rule.score),
                ..existing
            },
            None => CategoryScore {
                score: rule.score,
                first_rule: rank,
            },
        });
    }
    scores
}

/// Pick the best category and its confidence
#[must_use]
pub fn best_category(features: &FeatureVector) -> (SpaceCategory, f64) {
    let scores = score_categories(features);
    let mut best: Option<(SpaceCategory, CategoryScore)> = None;
    for category in SpaceCategory::ALL {
        let Some(candidate) = scores[category.index()] else {
            continue;
        };
        let replace = match &best {
            None => true,
            Some((_, current)) => {
                candidate.score > current.score
                    || (candidate.score == current.score
                        && candidate.first_rule < current.first_rule)
            }
        };
        if replace {
            best = Some((category, candidate));
        }
    }

    match best {
        Some((category, s)) => (category, s.score.clamp(0.0, 1.0)),
        None => (SpaceCategory::Unknown, 0.0),
    }
}

/// Threshold observations about the space, independent of scoring
#[must_use]
pub fn diagnostic_notes(features: &FeatureVector) -> Vec<String> {
    let mut notes = Vec::new();

    // Space characteristics
    if features.edge_density > 0.2 {
        notes.push("High architectural complexity".to_string());
    } else if features.edge_density < 0.1 {
        notes.push("Simple, open space".to_string());
    }
    if features.symmetry > 0.6 {
        notes.push("Symmetrical layout".to_string());
    }
    if features.brightness > 150.0 {
        notes.push("Well-lit area".to_string());
    } else if features.brightness < 80.0 {
        notes.push("Dimly lit area".to_string());
    }

    // Detected elements
    if features.door_count > 0 {
        notes.push(format!("{} door(s)", features.door_count));
    }
    if features.vertical_line_count > 30 {
        notes.push("Strong vertical structures".to_string());
    }
    if features.horizontal_line_count > 20 {
        notes.push("Horizontal architectural elements".to_string());
    }

    if features.line_count > 100 {
        notes.push("Complex architectural features".to_string());
    }
    if features.contrast > 70.0 {
        notes.push("High contrast environment".to_string());
    }

    notes
}

/// Classify a feature vector. Deterministic and infallible.
#[must_use]
pub fn classify(features: &FeatureVector) -> ClassificationResult {
    let (category, confidence) = best_category(features);
    ClassificationResult {
        category,
        confidence,
        features: *features,
        notes: diagnostic_notes(features),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> FeatureVector {
        FeatureVector {
            edge_density: 0.05,
            line_count: 0,
            vertical_line_count: 0,
            horizontal_line_count: 0,
            door_count: 0,
            brightness: 100.0,
            contrast: 30.0,
            symmetry: 0.2,
            saturation: 80.0,
            value: 100.0,
        }
    }

    #[test]
    fn test_stairwell_scenario() {
        let features = FeatureVector {
            edge_density: 0.26,
            line_count: 90,
            contrast: 60.0,
            ..base()
        };
        let result = classify(&features);
        assert_eq!(result.category, SpaceCategory::Stairwell);
        assert!((result.confidence - 0.70).abs() < 1e-12);
    }

    #[test]
    fn test_stairwell_edge_threshold_is_strict() {
        let features = FeatureVector {
            edge_density: 0.25,
            line_count: 90,
            contrast: 60.0,
            ..base()
        };
        assert_ne!(classify(&features).category, SpaceCategory::Stairwell);
    }

    #[test]
    fn test_nothing_fires_is_unknown() {
        let result = classify(&base());
        assert_eq!(result.category, SpaceCategory::Unknown);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_hallway_lines_beats_hallway_doors() {
        let features = FeatureVector {
            edge_density: 0.3,
            line_count: 60,
            vertical_line_count: 25,
            door_count: 3,
            ..base()
        };
        let result = classify(&features);
        assert_eq!(result.category, SpaceCategory::Hallway);
        assert!((result.confidence - 0.80).abs() < 1e-12);
    }

    #[test]
    fn test_hallway_doors_without_lines() {
        let features = FeatureVector {
            door_count: 3,
            ..base()
        };
        let result = classify(&features);
        assert_eq!(result.category, SpaceCategory::Hallway);
        assert!((result.confidence - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_zero_lines_never_fire_hallway_lines() {
        let features = FeatureVector {
            edge_density: 0.3,
            line_count: 0,
            vertical_line_count: 40,
            ..base()
        };
        assert_ne!(classify(&features).category, SpaceCategory::Hallway);
    }

    #[test]
    fn test_common_area() {
        let features = FeatureVector {
            edge_density: 0.05,
            brightness: 180.0,
            ..base()
        };
        let result = classify(&features);
        assert_eq!(result.category, SpaceCategory::CommonArea);
        assert!((result.confidence - 0.70).abs() < 1e-12);
    }

    #[test]
    fn test_symmetric_door_is_doorway() {
        let features = FeatureVector {
            edge_density: 0.15,
            contrast: 60.0,
            door_count: 1,
            symmetry: 0.7,
            saturation: 150.0,
            ..base()
        };
        let result = classify(&features);
        assert_eq!(result.category, SpaceCategory::Doorway);
        assert!((result.confidence - 0.65).abs() < 1e-12);
    }

    #[test]
    fn test_classroom_beats_office() {
        let features = FeatureVector {
            edge_density: 0.15,
            contrast: 60.0,
            symmetry: 0.1,
            saturation: 50.0,
            ..base()
        };
        let result = classify(&features);
        assert_eq!(result.category, SpaceCategory::Classroom);
        assert!((result.confidence - 0.60).abs() < 1e-12);
    }

    #[test]
    fn test_office_alone() {
        let features = FeatureVector {
            edge_density: 0.15,
            contrast: 20.0,
            saturation: 50.0,
            ..base()
        };
        let result = classify(&features);
        assert_eq!(result.category, SpaceCategory::Office);
        assert!((result.confidence - 0.50).abs() < 1e-12);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let features = FeatureVector {
            edge_density: 0.15,
            contrast: 60.0,
            door_count: 4,
            symmetry: 0.8,
            ..base()
        };
        assert_eq!(classify(&features), classify(&features));
    }

    #[test]
    fn test_confidence_in_range_over_grid() {
        for edge in [0.0, 0.05, 0.11, 0.15, 0.19, 0.22, 0.3, 1.0] {
            for lines in [0, 51, 81, 120] {
                for doors in [0, 1, 3] {
                    for symmetry in [-1.0, 0.0, 0.55, 0.9] {
                        let features = FeatureVector {
                            edge_density: edge,
                            line_count: lines,
                            vertical_line_count: lines / 2,
                            door_count: doors,
                            symmetry,
                            brightness: 160.0,
                            contrast: 60.0,
                            ..base()
                        };
                        let result = classify(&features);
                        assert!((0.0..=1.0).contains(&result.confidence));
                        assert!(SpaceCategory::ALL.contains(&result.category));
                    }
                }
            }
        }
    }

    #[test]
    fn test_notes_follow_thresholds() {
        let features = FeatureVector {
            edge_density: 0.25,
            line_count: 120,
            vertical_line_count: 35,
            horizontal_line_count: 25,
            door_count: 2,
            brightness: 60.0,
            contrast: 80.0,
            symmetry: 0.7,
            ..base()
        };
        assert_eq!(
            diagnostic_notes(&features),
            vec![
                "High architectural complexity",
                "Symmetrical layout",
                "Dimly lit area",
                "2 door(s)",
                "Strong vertical structures",
                "Horizontal architectural elements",
                "Complex architectural features",
                "High contrast environment",
            ]
        );
    }

    #[test]
    fn test_notes_do_not_affect_score() {
        let quiet = base();
        let noisy = FeatureVector {
            contrast: 90.0,
            horizontal_line_count: 50,
            ..base()
        };
        assert_eq!(best_category(&quiet), best_category(&noisy));
        assert!(
            diagnostic_notes(&quiet).len() < diagnostic_notes(&noisy).len()
        );
    }
}

//! Placement of avalanche problems in the five EAWS categories.

use avy_varsom::{
    danger::{AvalancheDanger, SourceKind},
    problem::{AvalancheProblem, EawsCategory},
    record::RecordSchema,
};

/// Category of a forecast problem type.
pub fn forecast_category(problem_type_id: i32) -> Option<EawsCategory> {
    match problem_type_id {
        3 | 7 | 20 => Some(EawsCategory::NewSnow),
        5 | 45 => Some(EawsCategory::WetSnow),
        10 => Some(EawsCategory::WindDriftedSnow),
        25 | 30 | 35 | 37 => Some(EawsCategory::PersistentWeakLayers),
        50 => Some(EawsCategory::GlidingSnow),
        _ => None,
    }
}

/// Category of an observed problem from its avalanche type, cause and
/// cause attributes. The rules are tried in order and the first match wins.
fn observation_category(problem: &AvalancheProblem) -> Option<EawsCategory> {
    let avalanche_type = problem.avalanche_type_id;
    // merged two-part codes are not causes of any vocabulary
    let cause = match problem.schema {
        RecordSchema::EvalProblemV0 => None,
        _ => problem.cause_id,
    };

    if avalanche_type == Some(10) {
        Some(EawsCategory::NewSnow)
    } else if avalanche_type == Some(15) || avalanche_type == Some(25) {
        Some(EawsCategory::WetSnow)
    } else if avalanche_type == Some(27) {
        Some(EawsCategory::GlidingSnow)
    } else if cause == Some(15) {
        Some(EawsCategory::WindDriftedSnow)
    } else if cause == Some(20) {
        Some(EawsCategory::GlidingSnow)
    } else if cause == Some(22) || cause == Some(24) {
        Some(EawsCategory::WetSnow)
    } else if avalanche_type == Some(20) {
        match (cause, problem.cause_attributes) {
            (Some(10 | 14), Some(attributes)) => {
                if attributes.soft {
                    Some(EawsCategory::NewSnow)
                } else {
                    Some(EawsCategory::WindDriftedSnow)
                }
            }
            (Some(11 | 13 | 16 | 17 | 18 | 19), _) => Some(EawsCategory::PersistentWeakLayers),
            _ => None,
        }
    } else {
        None
    }
}

/// The EAWS category of a problem, or `None` when no rule applies.
pub fn classify(problem: &AvalancheProblem) -> Option<EawsCategory> {
    match problem.source {
        SourceKind::Forecast => problem.problem_type_id.and_then(forecast_category),
        SourceKind::Observation => observation_category(problem),
    }
}

pub fn annotate(problem: &mut AvalancheProblem) {
    problem.eaws_category = classify(problem);
}

/// Classify every problem of every danger.
pub fn annotate_dangers(dangers: &mut [AvalancheDanger]) {
    for problem in dangers.iter_mut().flat_map(|d| d.problems.iter_mut()) {
        annotate(problem);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avy_varsom::problem::CauseAttributes;
    use chrono::NaiveDate;

    fn observed(
        avalanche_type: Option<i32>,
        cause: Option<i32>,
        attributes: Option<CauseAttributes>,
    ) -> AvalancheProblem {
        let mut problem = AvalancheProblem::new(
            3016,
            "Lyngen",
            NaiveDate::from_ymd_opt(2018, 1, 20).unwrap(),
            0,
            cause,
            "cause",
            SourceKind::Observation,
            RecordSchema::EvaluationV3,
        );
        problem.avalanche_type_id = avalanche_type;
        problem.cause_attributes = attributes;
        problem
    }

    fn forecast(problem_type: i32) -> AvalancheProblem {
        let mut problem = AvalancheProblem::new(
            3016,
            "Lyngen",
            NaiveDate::from_ymd_opt(2018, 1, 20).unwrap(),
            0,
            Some(10),
            "cause",
            SourceKind::Forecast,
            RecordSchema::ForecastV2,
        );
        problem.problem_type_id = Some(problem_type);
        problem
    }

    #[test]
    fn test_forecast_table() {
        let expected = [
            (3, EawsCategory::NewSnow),
            (5, EawsCategory::WetSnow),
            (7, EawsCategory::NewSnow),
            (10, EawsCategory::WindDriftedSnow),
            (20, EawsCategory::NewSnow),
            (25, EawsCategory::PersistentWeakLayers),
            (30, EawsCategory::PersistentWeakLayers),
            (35, EawsCategory::PersistentWeakLayers),
            (37, EawsCategory::PersistentWeakLayers),
            (45, EawsCategory::WetSnow),
            (50, EawsCategory::GlidingSnow),
        ];
        for (type_id, category) in expected {
            assert_eq!(classify(&forecast(type_id)), Some(category), "type {}", type_id);
        }
        let known: Vec<i32> = expected.iter().map(|(id, _)| *id).collect();
        for type_id in 0..100 {
            if !known.contains(&type_id) {
                assert_eq!(classify(&forecast(type_id)), None, "type {}", type_id);
            }
        }
    }

    #[test]
    fn test_dry_slab_new_snow_uses_soft_flag() {
        let soft = CauseAttributes {
            soft: true,
            ..CauseAttributes::default()
        };
        let problem = observed(Some(20), Some(10), Some(soft));
        assert_eq!(classify(&problem), Some(EawsCategory::NewSnow));

        let problem = observed(Some(20), Some(10), Some(CauseAttributes::default()));
        assert_eq!(classify(&problem), Some(EawsCategory::WindDriftedSnow));
    }

    #[test]
    fn test_dry_slab_new_snow_without_attributes_is_unclassified() {
        assert_eq!(classify(&observed(Some(20), Some(14), None)), None);
    }

    #[test]
    fn test_dry_slab_persistent_causes() {
        for cause in [11, 13, 16, 17, 18, 19] {
            assert_eq!(
                classify(&observed(Some(20), Some(cause), None)),
                Some(EawsCategory::PersistentWeakLayers),
                "cause {}",
                cause
            );
        }
    }

    #[test]
    fn test_avalanche_type_takes_precedence_over_cause() {
        // loose dry beats wind-deposit cause
        assert_eq!(
            classify(&observed(Some(10), Some(15), None)),
            Some(EawsCategory::NewSnow)
        );
        // glide beats water pooling
        assert_eq!(
            classify(&observed(Some(27), Some(22), None)),
            Some(EawsCategory::GlidingSnow)
        );
        // cause rule beats the dry slab attribute rule
        let soft = CauseAttributes {
            soft: true,
            ..CauseAttributes::default()
        };
        assert_eq!(
            classify(&observed(Some(20), Some(15), Some(soft))),
            Some(EawsCategory::WindDriftedSnow)
        );
    }

    #[test]
    fn test_cause_rules_without_avalanche_type() {
        assert_eq!(
            classify(&observed(None, Some(20), None)),
            Some(EawsCategory::GlidingSnow)
        );
        assert_eq!(
            classify(&observed(None, Some(24), None)),
            Some(EawsCategory::WetSnow)
        );
        assert_eq!(classify(&observed(None, Some(11), None)), None);
        assert_eq!(classify(&observed(Some(99), None, None)), None);
    }

    #[test]
    fn test_merged_cause_codes_skip_cause_rules() {
        let mut problem = observed(None, Some(15), None);
        problem.schema = RecordSchema::EvalProblemV0;
        assert_eq!(classify(&problem), None);
        problem.avalanche_type_id = Some(25);
        assert_eq!(classify(&problem), Some(EawsCategory::WetSnow));
    }

    #[test]
    fn test_classification_is_deterministic() {
        let problem = observed(Some(20), Some(13), None);
        let first = classify(&problem);
        for _ in 0..10 {
            assert_eq!(classify(&problem), first);
        }
    }

    #[test]
    fn test_annotate_dangers() {
        let mut danger = AvalancheDanger {
            region_id: 3016,
            region_name: "Lyngen".to_string(),
            source: SourceKind::Forecast,
            schema: RecordSchema::ForecastV2,
            date: NaiveDate::from_ymd_opt(2018, 1, 20).unwrap(),
            time: None,
            danger_level: 3,
            danger_level_name: "3 Considerable".to_string(),
            main_message: None,
            nick: None,
            reg_id: None,
            forecast_correct: None,
            problems: vec![forecast(10), forecast(1)],
        };
        annotate_dangers(std::slice::from_mut(&mut danger));
        assert_eq!(
            danger.problems[0].eaws_category,
            Some(EawsCategory::WindDriftedSnow)
        );
        assert_eq!(danger.problems[1].eaws_category, None);
    }
}

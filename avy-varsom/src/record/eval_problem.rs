use super::{code_name, require, MapContext, RecordSchema, Registration};
use crate::{codebook::Field, error::RecordError, problem::AvalancheProblem};
use serde::Deserialize;

/// Observed problem with a two-part cause, 2012-2014.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct EvalProblemV0 {
    #[serde(flatten)]
    pub registration: Registration,
    pub avalanche_eval_problem_id: Option<i32>,
    pub aval_cause_tid: Option<i32>,
    pub aval_cause_ext_tid: Option<i32>,
    pub aval_probability_tid: Option<i32>,
    pub aval_trigger_simple_tid: Option<i32>,
    pub destructive_size_ext_tid: Option<i32>,
}

/// Observed problem, 2014-2017.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct EvalProblemV2 {
    #[serde(flatten)]
    pub registration: Registration,
    pub avalanche_eval_problem_id: Option<i32>,
    pub aval_cause_tid: Option<i32>,
    pub avalanche_ext_tid: Option<i32>,
    pub destructive_size_ext_tid: Option<i32>,
    pub aval_trigger_simple_tid: Option<i32>,
    pub aval_probability_tid: Option<i32>,
    pub aval_propagation_tid: Option<i32>,
}

impl EvalProblemV0 {
    /// The cause is named "{cause}, {extension}" and its id is the sum of
    /// both codes. That sum is not an id in any vocabulary.
    pub fn to_problem(&self, ctx: &MapContext) -> Result<AvalancheProblem, RecordError> {
        let schema = RecordSchema::EvalProblemV0;
        let vocabulary = schema.vocabulary();
        let codebook = ctx.codebook;
        let header = self.registration.header(ctx)?;
        let order = require(&self.avalanche_eval_problem_id, "avalanche_eval_problem_id")?;
        let cause_tid = require(&self.aval_cause_tid, "aval_cause_tid")?;
        let ext_tid = require(&self.aval_cause_ext_tid, "aval_cause_ext_tid")?;
        let cause = codebook.lookup(vocabulary, Field::AvalCause, cause_tid)?;
        let extension = codebook.lookup(vocabulary, Field::AvalCauseExt, ext_tid)?;
        let cause_name = format!("{}, {}", cause, extension);
        let cause_id = cause_tid
            .checked_add(ext_tid)
            .ok_or(RecordError::OutOfRange {
                field: "aval_cause_ext_tid",
                value: i64::from(cause_tid) + i64::from(ext_tid),
            })?;

        let mut problem = header.problem(schema, order, Some(cause_id), &cause_name);
        problem.destructive_size_id = self.destructive_size_ext_tid;
        problem.destructive_size_name = code_name(
            codebook,
            vocabulary,
            Field::DestructiveSize,
            self.destructive_size_ext_tid,
        )?;
        problem.trigger =
            code_name(codebook, vocabulary, Field::Trigger, self.aval_trigger_simple_tid)?;
        problem.probability =
            code_name(codebook, vocabulary, Field::Probability, self.aval_probability_tid)?;
        Ok(problem)
    }
}

impl EvalProblemV2 {
    pub fn to_problem(&self, ctx: &MapContext) -> Result<AvalancheProblem, RecordError> {
        let schema = RecordSchema::EvalProblemV2;
        let vocabulary = schema.vocabulary();
        let codebook = ctx.codebook;
        let header = self.registration.header(ctx)?;
        let order = require(&self.avalanche_eval_problem_id, "avalanche_eval_problem_id")?;
        let cause_id = require(&self.aval_cause_tid, "aval_cause_tid")?;
        let cause_name = codebook.lookup(vocabulary, Field::AvalCause, cause_id)?;

        let mut problem = header.problem(schema, order, Some(cause_id), cause_name);
        problem.avalanche_type_id = self.avalanche_ext_tid;
        problem.avalanche_type_name =
            code_name(codebook, vocabulary, Field::AvalancheType, self.avalanche_ext_tid)?;
        problem.destructive_size_id = self.destructive_size_ext_tid;
        problem.destructive_size_name = code_name(
            codebook,
            vocabulary,
            Field::DestructiveSize,
            self.destructive_size_ext_tid,
        )?;
        problem.trigger =
            code_name(codebook, vocabulary, Field::Trigger, self.aval_trigger_simple_tid)?;
        problem.probability =
            code_name(codebook, vocabulary, Field::Probability, self.aval_probability_tid)?;
        problem.distribution =
            code_name(codebook, vocabulary, Field::Propagation, self.aval_propagation_tid)?;
        Ok(problem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{codebook::Vocabulary, record::test_support};

    fn registration() -> Registration {
        Registration {
            reg_id: Some(501),
            dt_obs_time: Some("2013-02-01T11:00:00".to_string()),
            nick_name: Some("observer".to_string()),
            forecast_region_tid: Some(9),
            forecast_region_name: Some("Vest-Finnmark".to_string()),
            utm_east: None,
            utm_north: None,
            lang_key: None,
        }
    }

    #[test]
    fn test_composite_cause_name_and_sum_id() {
        let codebook = test_support::codebook();
        let resolver = test_support::resolver();
        let ctx = MapContext {
            codebook: &codebook,
            resolver: &resolver,
        };
        let record = EvalProblemV0 {
            registration: registration(),
            avalanche_eval_problem_id: Some(0),
            aval_cause_tid: Some(4),
            aval_cause_ext_tid: Some(1),
            aval_trigger_simple_tid: Some(10),
            ..EvalProblemV0::default()
        };
        let problem = record.to_problem(&ctx).unwrap();
        let cause = codebook.name(Vocabulary::Legacy, Field::AvalCause, 4).unwrap();
        let extension = codebook.name(Vocabulary::Legacy, Field::AvalCauseExt, 1).unwrap();
        assert_eq!(problem.cause_name, format!("{}, {}", cause, extension));
        assert_eq!(problem.cause_id, Some(5));
        assert_eq!(problem.region_id, 109);
        assert_eq!(problem.schema, RecordSchema::EvalProblemV0);
        assert_eq!(problem.trigger.as_deref(), Some("Large additional load"));
        assert!(problem.avalanche_type_id.is_none());
    }

    #[test]
    fn test_composite_cause_requires_extension() {
        let codebook = test_support::codebook();
        let resolver = test_support::resolver();
        let ctx = MapContext {
            codebook: &codebook,
            resolver: &resolver,
        };
        let record = EvalProblemV0 {
            registration: registration(),
            avalanche_eval_problem_id: Some(0),
            aval_cause_tid: Some(4),
            ..EvalProblemV0::default()
        };
        assert!(matches!(
            record.to_problem(&ctx),
            Err(RecordError::MissingField("aval_cause_ext_tid"))
        ));
    }

    #[test]
    fn test_composite_cause_sum_overflow_is_out_of_range() {
        let mut codebook = test_support::codebook();
        codebook
            .insert(Vocabulary::Legacy, Field::AvalCause, i32::MAX, "Unbounded cause")
            .unwrap();
        let resolver = test_support::resolver();
        let ctx = MapContext {
            codebook: &codebook,
            resolver: &resolver,
        };
        let record = EvalProblemV0 {
            registration: registration(),
            avalanche_eval_problem_id: Some(0),
            aval_cause_tid: Some(i32::MAX),
            aval_cause_ext_tid: Some(1),
            ..EvalProblemV0::default()
        };
        let expected = i64::from(i32::MAX) + 1;
        assert!(matches!(
            record.to_problem(&ctx),
            Err(RecordError::OutOfRange {
                field: "aval_cause_ext_tid",
                value,
            }) if value == expected
        ));
    }

    #[test]
    fn test_eval_problem_v2_uses_eval2_vocabulary() {
        let codebook = test_support::codebook();
        let resolver = test_support::resolver();
        let ctx = MapContext {
            codebook: &codebook,
            resolver: &resolver,
        };
        let record = EvalProblemV2 {
            registration: Registration {
                dt_obs_time: Some("2017-02-10T08:00:00".to_string()),
                forecast_region_tid: Some(3016),
                forecast_region_name: Some("Lyngen".to_string()),
                ..registration()
            },
            avalanche_eval_problem_id: Some(1),
            aval_cause_tid: Some(15),
            avalanche_ext_tid: Some(20),
            aval_propagation_tid: Some(3),
            ..EvalProblemV2::default()
        };
        let problem = record.to_problem(&ctx).unwrap();
        assert_eq!(problem.order, 1);
        assert_eq!(problem.region_id, 3016);
        assert_eq!(
            problem.cause_name,
            codebook.name(Vocabulary::Eval2, Field::AvalCause, 15).unwrap()
        );
        assert_eq!(problem.distribution.as_deref(), Some("Many steep slopes"));
        assert!(problem.danger_level.is_none());
        assert!(problem.cause_attributes.is_none());
    }

    #[test]
    fn test_eval_problem_v2_unknown_avalanche_type() {
        let codebook = test_support::codebook();
        let resolver = test_support::resolver();
        let ctx = MapContext {
            codebook: &codebook,
            resolver: &resolver,
        };
        let record = EvalProblemV2 {
            registration: registration(),
            avalanche_eval_problem_id: Some(0),
            aval_cause_tid: Some(10),
            avalanche_ext_tid: Some(21),
            ..EvalProblemV2::default()
        };
        assert!(matches!(
            record.to_problem(&ctx),
            Err(RecordError::UnknownCode {
                field: Field::AvalancheType,
                id: 21,
                ..
            })
        ));
    }
}

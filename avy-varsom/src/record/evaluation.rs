use super::{
    code_name, danger_level, require, MapContext, ObservationHeader, RecordSchema, Registration,
};
use crate::{
    codebook::Field,
    danger::{AvalancheDanger, LangText, SourceKind},
    error::RecordError,
    problem::{AvalancheProblem, CauseAttributes},
    region::NOT_GIVEN,
};
use serde::Deserialize;

/// Observed danger with up to three free-text problems, 2012-2014.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct EvaluationV1 {
    #[serde(flatten)]
    pub registration: Registration,
    pub avalanche_danger_tid: Option<i32>,
    pub avalanche_evaluation: Option<String>,
    pub avalanche_problem_name1: Option<String>,
    pub avalanche_problem_name2: Option<String>,
    pub avalanche_problem_name3: Option<String>,
}

/// Observed danger, 2014-2017. Problems arrive as separate records.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct EvaluationV2 {
    #[serde(flatten)]
    pub registration: Registration,
    pub avalanche_danger_tid: Option<i32>,
    pub avalanche_evaluation: Option<String>,
    pub avalanche_development: Option<String>,
}

/// Observed danger with nested problems, 2017-2019.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct EvaluationV3 {
    #[serde(flatten)]
    pub registration: Registration,
    pub avalanche_danger_tid: Option<i32>,
    pub avalanche_evaluation: Option<String>,
    pub avalanche_development: Option<String>,
    pub forecast_correct_tid: Option<i32>,
    #[serde(default)]
    pub avalanche_problems: Vec<EvaluationV3Problem>,
}

/// A problem nested in an [`EvaluationV3`].
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct EvaluationV3Problem {
    pub avalanche_eval_problem_id: Option<i32>,
    pub aval_cause_tid: Option<i32>,
    pub avalanche_ext_tid: Option<i32>,
    pub destructive_size_ext_tid: Option<i32>,
    pub aval_trigger_simple_tid: Option<i32>,
    pub aval_probability_tid: Option<i32>,
    pub aval_propagation_tid: Option<i32>,
    pub aval_cause_attribute_crystal_tid: Option<i32>,
    pub aval_cause_attribute_light_tid: Option<i32>,
    pub aval_cause_attribute_soft_tid: Option<i32>,
    pub aval_cause_attribute_thin_tid: Option<i32>,
}

/// Observed danger for a registration. The level name comes from the
/// schema's own vocabulary.
fn observed_danger(
    header: &ObservationHeader,
    schema: RecordSchema,
    danger_tid: Option<i32>,
    evaluation: &Option<String>,
    ctx: &MapContext,
) -> Result<AvalancheDanger, RecordError> {
    let level = danger_level(
        require(&danger_tid, "avalanche_danger_tid")?,
        "avalanche_danger_tid",
    )?;
    let level_name = ctx
        .codebook
        .lookup(schema.vocabulary(), Field::DangerLevel, i32::from(level))?;
    Ok(AvalancheDanger {
        region_id: header.region_id,
        region_name: header.region_name.clone(),
        source: SourceKind::Observation,
        schema,
        date: header.date,
        time: header.time,
        danger_level: level,
        danger_level_name: level_name.to_string(),
        main_message: evaluation.as_ref().map(|text| LangText {
            lang: header.lang,
            text: text.clone(),
        }),
        nick: Some(header.nick.clone()),
        reg_id: Some(header.reg_id),
        forecast_correct: None,
        problems: Vec::new(),
    })
}

impl EvaluationV1 {
    pub fn to_danger(&self, ctx: &MapContext) -> Result<AvalancheDanger, RecordError> {
        let header = self.registration.header(ctx)?;
        observed_danger(
            &header,
            RecordSchema::EvaluationV1,
            self.avalanche_danger_tid,
            &self.avalanche_evaluation,
            ctx,
        )
    }

    /// One problem per filled slot, ordered by slot position. Slots holding
    /// the "Not given" sentinel or nothing are skipped.
    pub fn to_problems(&self, ctx: &MapContext) -> Result<Vec<AvalancheProblem>, RecordError> {
        let header = self.registration.header(ctx)?;
        let slots = [
            &self.avalanche_problem_name1,
            &self.avalanche_problem_name2,
            &self.avalanche_problem_name3,
        ];
        let problems = slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                let text = slot.as_deref()?.trim();
                if text.is_empty() || text == NOT_GIVEN {
                    return None;
                }
                Some(header.problem(RecordSchema::EvaluationV1, index as i32, None, text))
            })
            .collect();
        Ok(problems)
    }
}

impl EvaluationV2 {
    pub fn to_danger(&self, ctx: &MapContext) -> Result<AvalancheDanger, RecordError> {
        let header = self.registration.header(ctx)?;
        observed_danger(
            &header,
            RecordSchema::EvaluationV2,
            self.avalanche_danger_tid,
            &self.avalanche_evaluation,
            ctx,
        )
    }
}

impl EvaluationV3 {
    pub fn to_danger(&self, ctx: &MapContext) -> Result<AvalancheDanger, RecordError> {
        let header = self.registration.header(ctx)?;
        let schema = RecordSchema::EvaluationV3;
        let mut danger = observed_danger(
            &header,
            schema,
            self.avalanche_danger_tid,
            &self.avalanche_evaluation,
            ctx,
        )?;
        danger.forecast_correct = code_name(
            ctx.codebook,
            schema.vocabulary(),
            Field::ForecastCorrect,
            self.forecast_correct_tid,
        )?;
        Ok(danger)
    }

    pub fn to_problems(&self, ctx: &MapContext) -> Result<Vec<AvalancheProblem>, RecordError> {
        let header = self.registration.header(ctx)?;
        self.avalanche_problems
            .iter()
            .map(|p| p.to_problem(&header, ctx))
            .collect()
    }
}

impl EvaluationV3Problem {
    fn attributes(&self) -> CauseAttributes {
        let flag = |tid: Option<i32>| tid.unwrap_or(0) != 0;
        CauseAttributes {
            crystal: flag(self.aval_cause_attribute_crystal_tid),
            light: flag(self.aval_cause_attribute_light_tid),
            soft: flag(self.aval_cause_attribute_soft_tid),
            thin: flag(self.aval_cause_attribute_thin_tid),
        }
    }

    fn to_problem(
        &self,
        header: &ObservationHeader,
        ctx: &MapContext,
    ) -> Result<AvalancheProblem, RecordError> {
        let schema = RecordSchema::EvaluationV3;
        let vocabulary = schema.vocabulary();
        let codebook = ctx.codebook;
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
        problem.cause_attributes = Some(self.attributes());
        Ok(problem)
    }
}

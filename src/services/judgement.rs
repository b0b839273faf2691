//! Judgement engine: critiques appended to a candidate's history.

use std::sync::Arc;
use tracing::{debug, instrument};

use super::context::EvolutionContext;
use super::prompts::{judgement_messages, task_prompt};
use crate::domain::errors::DomainResult;
use crate::domain::models::{Candidate, TestCase};

/// Produces critiques of pool members.
pub struct JudgementEngine {
    ctx: Arc<EvolutionContext>,
}

impl JudgementEngine {
    /// Engine over `ctx`.
    pub fn new(ctx: Arc<EvolutionContext>) -> Self {
        Self { ctx }
    }

    /// Critique `candidate` and append the critique to its history.
    ///
    /// The prompt sees every critique appended so far. Judgement never
    /// touches `answer` or `check`; the audit record is always stored with
    /// `check = false`.
    #[instrument(skip_all, fields(test_id = %test.id, depth = candidate.critiques.len()))]
    pub async fn judge(&self, test: &TestCase, candidate: &mut Candidate) -> DomainResult<()> {
        let task = task_prompt(
            &self.ctx.dataset.instructions(),
            &self.ctx.dataset.reasoning_step_instructions(),
        );
        let messages = judgement_messages(&task, &test.question, candidate);
        let query = self
            .ctx
            .query(messages, self.ctx.config.judgement_max_tokens);

        let completion = self.ctx.complete(&query).await?;
        debug!(length = completion.content.len(), "Received judgement");

        candidate.push_critique(completion.content.clone());
        self.ctx.record(test, query, completion, false).await;

        Ok(())
    }
}

//! QueryPipeline: plan → retrieve → (answer) → evaluate → provenance.
//!
//! `start` runs everything up to the external generation step and returns a
//! `QuerySession`; `complete` takes the generated answer (if any) through the
//! evaluation gate and closes the provenance bundle.

use std::sync::Arc;
use std::time::Instant;

use grimoire_core::deadline::Deadline;
use grimoire_core::errors::{EvaluationError, GrimoireResult};
use grimoire_core::models::{DegradationEvent, QueryPlan, RerankingStrategy};
use grimoire_evaluation::{EvaluationRequest, EvaluationResult};
use grimoire_observability::tracing_setup::events;
use grimoire_observability::QueryLogEntry;
use grimoire_provenance::{AnswerRecord, ProvenanceBundle};
use grimoire_retrieval::{RetrievalOutcome, RetrievalSource};
use tracing::{info, warn};

use crate::context::AppContext;
use crate::response::{EvalSummary, QueryRequest, QueryResponse};

/// State carried between `start` and `complete`.
#[derive(Debug)]
pub struct QuerySession {
    pub request: QueryRequest,
    pub plan: QueryPlan,
    pub plan_cache_hit: bool,
    pub retrieval: RetrievalOutcome,
    pub provenance: Option<ProvenanceBundle>,
    deadline: Deadline,
    started: Instant,
}

impl QuerySession {
    pub fn deadline(&self) -> &Deadline {
        &self.deadline
    }
}

pub struct QueryPipeline {
    ctx: Arc<AppContext>,
}

impl QueryPipeline {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    /// Plan and retrieve. Fails only on invalid input.
    pub fn start(&self, request: QueryRequest) -> GrimoireResult<QuerySession> {
        request.validate()?;
        let started = Instant::now();
        let deadline = Deadline::from_millis(
            request
                .deadline_ms
                .unwrap_or(self.ctx.config.pipeline.request_deadline_ms),
        );

        let plan_start = Instant::now();
        let lookup = self.ctx.planner.resolve(&request.query)?;
        let plan_ms = plan_start.elapsed().as_millis() as u64;
        let plan = lookup.plan;

        let mut provenance = self
            .ctx
            .tracker
            .is_enabled()
            .then(|| self.ctx.tracker.start_tracking_with(&plan.query, plan.provenance_config.as_ref()));
        if let Some(bundle) = provenance.as_mut() {
            self.ctx
                .tracker
                .track_query_processing(bundle, &plan, lookup.cache_hit, plan_ms);
        }

        let limit = request.top_k.unwrap_or(self.ctx.config.retrieval.default_top_k);
        let retrieval = match self.ctx.retriever.retrieve(&plan, &plan.query, limit, &deadline) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "retrieval aborted");
                events::degradation_triggered("retriever", &err.to_string(), "empty result");
                RetrievalOutcome {
                    chunks: Vec::new(),
                    reranked: None,
                    rerank_stats: None,
                    source: RetrievalSource::None,
                    degradations: vec![DegradationEvent::new("retriever", err.to_string(), "empty result")],
                    elapsed_ms: 0,
                }
            }
        };
        self.ctx.record_degradations(&retrieval.degradations);

        if let Some(bundle) = provenance.as_mut() {
            self.ctx.tracker.track_retrieval(bundle, &retrieval);
            if let Some(reranked) = &retrieval.reranked {
                let strategy = plan
                    .reranking_config
                    .as_ref()
                    .map_or(RerankingStrategy::HybridFull, |r| r.strategy);
                self.ctx
                    .tracker
                    .track_reranking(bundle, strategy, reranked, retrieval.rerank_stats.as_ref());
            }
        }

        Ok(QuerySession {
            plan_cache_hit: lookup.cache_hit,
            request,
            plan,
            retrieval,
            provenance,
            deadline,
            started,
        })
    }

    /// Evaluate `answer` (when given), close provenance, and build the response.
    ///
    /// An answer submitted while the evaluation gate is disabled is a request error.
    pub fn complete(&self, mut session: QuerySession, answer: Option<&str>) -> GrimoireResult<QueryResponse> {
        let evaluation = match answer {
            Some(answer) => Some(self.evaluate(&session, answer)?),
            None => None,
        };
        let mut degradations = std::mem::take(&mut session.retrieval.degradations);
        if let Some(result) = evaluation.as_ref().filter(|r| r.fallback_used) {
            let reason = result
                .critical_failures
                .first()
                .map_or("evaluation failed", String::as_str);
            events::degradation_triggered("evaluation", reason, "fallback decision");
            let event = DegradationEvent::new("evaluation", reason, "fallback decision");
            self.ctx.record_degradations(std::slice::from_ref(&event));
            degradations.push(event);
        }

        let model = session.plan.model_config.model.clone();
        let provenance = session.provenance.as_mut().map(|bundle| {
            if let Some(answer) = answer {
                self.ctx.tracker.track_answer_generation(
                    bundle,
                    &AnswerRecord {
                        answer,
                        model: &model,
                        evaluation: evaluation.as_ref(),
                    },
                );
            }
            if let Err(err) = self.ctx.tracker.finalize_bundle(bundle) {
                warn!(error = %err, "provenance bundle not finalized");
            }
            bundle.summary()
        });

        let elapsed = session.started.elapsed();
        let retrieval = session.retrieval;
        let degraded = !degradations.is_empty();
        self.ctx.record_query(QueryLogEntry::new(
            session.plan.query_hash.clone(),
            Some(session.plan.classification.intent),
            elapsed,
            retrieval.chunks.len(),
            session.plan_cache_hit,
            degraded,
        ));
        info!(
            query_hash = %session.plan.query_hash,
            result_count = retrieval.chunks.len(),
            source = retrieval.source.as_str(),
            degraded,
            decision = evaluation.as_ref().map(|e| e.gate_decision.as_str()),
            elapsed_ms = elapsed.as_millis() as u64,
            "query complete"
        );

        Ok(QueryResponse {
            query: session.request.query,
            classification: session.plan.classification.clone(),
            plan: session.plan.retrieval_strategy.clone(),
            model: session.plan.model_config.clone(),
            reranked: retrieval.reranked.is_some(),
            retrieved: retrieval.chunks,
            plan_cache_hit: session.plan_cache_hit,
            eval: evaluation.as_ref().map(EvalSummary::from),
            provenance,
            degraded,
            degradations,
            elapsed_ms: elapsed.as_millis() as u64,
        })
    }

    /// `start` then `complete` with no answer.
    pub fn run(&self, request: QueryRequest) -> GrimoireResult<QueryResponse> {
        let session = self.start(request)?;
        self.complete(session, None)
    }

    fn evaluate(&self, session: &QuerySession, answer: &str) -> GrimoireResult<EvaluationResult> {
        if !self.ctx.gate.config().enabled {
            return Err(EvaluationError::Disabled.into());
        }
        let request = EvaluationRequest {
            query: &session.plan.query,
            answer,
            sources: &session.retrieval.chunks,
            classification: Some(&session.plan.classification),
            settings: session.plan.eval_config.as_ref(),
        };
        Ok(self.ctx.gate.evaluate(&request, &session.deadline)?)
    }
}

//! Session-scoped prediction state.
//!
//! A `Session` owns the form, the request lifecycle and the last result. It
//! is only changed through [`Session::begin_submit`] and [`Session::settle`],
//! so independent sessions never interfere with each other.

use super::request::{Outcome, Ticket};
use crate::classify::Classification;
use crate::form::FormStore;
use crate::model::{FormState, Lifecycle, PredictionResult, ResubmitPolicy};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub network: Duration,
    pub total: Duration,
}

#[derive(Debug, Default)]
pub struct Session {
    form: FormStore,
    lifecycle: Lifecycle,
    result: Option<PredictionResult>,
    timing: Option<Timing>,
    /// Form snapshot of the most recent submission, until it settles.
    pending_form: Option<FormState>,
    /// Form that produced the current result or error.
    submitted_form: Option<FormState>,
    policy: ResubmitPolicy,
    /// Sequence number handed to the most recent submission.
    latest_seq: u64,
}

impl Session {
    pub fn new(policy: ResubmitPolicy) -> Self {
        Self {
            form: FormStore::new(),
            policy,
            ..Default::default()
        }
    }

    pub fn form(&self) -> &FormStore {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormStore {
        &mut self.form
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn result(&self) -> Option<&PredictionResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.lifecycle.error()
    }

    /// Form the settled result or error belongs to; `None` until a submission settles.
    pub fn submitted_form(&self) -> Option<&FormState> {
        self.submitted_form.as_ref()
    }

    pub fn timing(&self) -> Option<Timing> {
        self.timing
    }

    pub fn is_submitting(&self) -> bool {
        self.lifecycle == Lifecycle::Submitting
    }

    pub fn classification(&self) -> Option<Classification> {
        self.result.as_ref().map(Classification::from_result)
    }

    /// Move to `Submitting` and snapshot the form.
    ///
    /// Returns `None` when a submission is already in flight and the policy
    /// is [`ResubmitPolicy::Ignore`].
    pub fn begin_submit(&mut self) -> Option<Ticket> {
        if self.is_submitting() && self.policy == ResubmitPolicy::Ignore {
            tracing::debug!(seq = self.latest_seq, "submission already in flight; ignoring");
            return None;
        }
        if self.is_submitting() {
            tracing::debug!(superseded = self.latest_seq, "superseding in-flight submission");
        }
        self.latest_seq += 1;
        self.lifecycle = Lifecycle::Submitting;
        self.result = None;
        self.timing = None;
        self.submitted_form = None;
        self.pending_form = Some(self.form.state().clone());
        tracing::info!(seq = self.latest_seq, "submitting prediction request");
        Some(Ticket {
            seq: self.latest_seq,
            form: self.form.state().clone(),
        })
    }

    /// Apply an outcome. Outcomes from superseded submissions are dropped.
    pub fn settle(&mut self, outcome: Outcome) -> bool {
        if outcome.seq != self.latest_seq || !self.is_submitting() {
            tracing::debug!(
                seq = outcome.seq,
                latest = self.latest_seq,
                "dropping stale prediction outcome"
            );
            return false;
        }
        self.submitted_form = self.pending_form.take();
        self.timing = Some(Timing {
            network: outcome.network_elapsed,
            total: outcome.total_elapsed,
        });
        match outcome.result {
            Ok(prediction) => {
                tracing::info!(
                    seq = outcome.seq,
                    probability = prediction.claim_probability,
                    risk_level = prediction.risk_level.as_str(),
                    "prediction succeeded"
                );
                self.result = Some(prediction);
                self.lifecycle = Lifecycle::Succeeded;
            }
            Err(failure) => {
                tracing::info!(seq = outcome.seq, ?failure, "prediction failed");
                self.lifecycle = Lifecycle::Failed(failure.message().to_string());
            }
        }
        true
    }
}

//! Single-flight submission of stock movements.
//!
//! One `MovementSubmitter` issues at most one request at a time. Every
//! attempt ends in exactly one [`SubmissionOutcome`], which is turned into a
//! notice here and never propagated further.

use std::sync::{Arc, Mutex, MutexGuard};

use stocklog_core::{Direction, MovementIntent, ProductReference, Quantity, SubmissionId};
use tracing::Instrument;

use crate::api::{ApiError, InventoryService, MovementRequest};
use crate::config::NoticeTimings;
use crate::notice::{NoticeKind, TransientStatus};
use crate::refresh::RefreshSignal;

/// Shown when the service could not be reached or answered unintelligibly.
pub const TRANSPORT_FAILURE_MESSAGE: &str =
    "System connection failed. Check the inventory service.";

pub const MISSING_PRODUCT_MESSAGE: &str = "Please select a product.";

/// How one submission attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Success,
    /// Caught before any request was sent.
    ValidationFailed(String),
    /// No usable answer from the service; the message is generic.
    TransportFailed(String),
    /// The service declined; the message is the service's own.
    Rejected(String),
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Success)
    }

    /// The error text to show, if this is a failure.
    pub fn message(&self) -> Option<&str> {
        match self {
            SubmissionOutcome::Success => None,
            SubmissionOutcome::ValidationFailed(m)
            | SubmissionOutcome::TransportFailed(m)
            | SubmissionOutcome::Rejected(m) => Some(m),
        }
    }

    fn from_response(result: &Result<(), ApiError>) -> Self {
        match result {
            Ok(()) => SubmissionOutcome::Success,
            Err(ApiError::Rejected { detail, .. }) => SubmissionOutcome::Rejected(detail.clone()),
            Err(_) => SubmissionOutcome::TransportFailed(TRANSPORT_FAILURE_MESSAGE.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmitterState {
    #[default]
    Idle,
    Submitting,
    Terminal(SubmissionOutcome),
}

/// What the form holds at the moment submit is pressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionInput {
    pub product: Option<ProductReference>,
    pub raw_quantity: String,
}

/// Turn form input into an intent, or explain why it cannot be sent.
pub fn validate(input: &SubmissionInput, direction: Direction) -> Result<MovementIntent, String> {
    let product = input
        .product
        .clone()
        .ok_or_else(|| MISSING_PRODUCT_MESSAGE.to_string())?;
    let quantity = Quantity::parse(&input.raw_quantity)
        .map_err(|e| format!("Enter a valid quantity ({e})."))?;
    Ok(MovementIntent::new(product, quantity, direction))
}

#[derive(Debug, Default)]
struct Machine {
    state: SubmitterState,
    last_outcome: Option<SubmissionOutcome>,
}

/// Held while a request is outstanding. Dropping it unsettled (the submit
/// future was cancelled) returns the machine to `Idle`.
struct InFlight<'a> {
    machine: &'a Mutex<Machine>,
    id: SubmissionId,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(mut self, outcome: SubmissionOutcome) {
        self.settled = true;
        lock_machine(self.machine).settle(outcome);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        tracing::warn!(submission_id = %self.id, "submission dropped before the service answered");
        lock_machine(self.machine)
            .settle(SubmissionOutcome::TransportFailed(TRANSPORT_FAILURE_MESSAGE.to_string()));
    }
}

fn lock_machine(machine: &Mutex<Machine>) -> MutexGuard<'_, Machine> {
    machine.lock().unwrap_or_else(|e| e.into_inner())
}

impl Machine {
    /// Record the outcome, pass through `Terminal`, and return to `Idle`.
    fn settle(&mut self, outcome: SubmissionOutcome) {
        self.state = SubmitterState::Terminal(outcome.clone());
        tracing::debug!(state = ?self.state, "submission settled");
        self.state = SubmitterState::Idle;
        self.last_outcome = Some(outcome);
    }
}

pub struct MovementSubmitter {
    service: Arc<dyn InventoryService>,
    machine: Mutex<Machine>,
    success: TransientStatus,
    error: TransientStatus,
    refresh: RefreshSignal,
}

impl MovementSubmitter {
    pub fn new(
        service: Arc<dyn InventoryService>,
        refresh: RefreshSignal,
        timings: NoticeTimings,
    ) -> Self {
        Self {
            service,
            machine: Mutex::new(Machine::default()),
            success: TransientStatus::new(NoticeKind::Success, timings.success),
            error: TransientStatus::new(NoticeKind::Error, timings.error),
            refresh,
        }
    }

    pub fn state(&self) -> SubmitterState {
        self.lock().state.clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.lock().state == SubmitterState::Submitting
    }

    pub fn last_outcome(&self) -> Option<SubmissionOutcome> {
        self.lock().last_outcome.clone()
    }

    pub fn success_notice(&self) -> &TransientStatus {
        &self.success
    }

    pub fn error_notice(&self) -> &TransientStatus {
        &self.error
    }

    pub fn refresh_signal(&self) -> &RefreshSignal {
        &self.refresh
    }

    /// Run one submission.
    ///
    /// `read` is called once, when the attempt starts; later edits to the
    /// form do not reach the request. `on_success` runs before the submitter
    /// leaves `Submitting`.
    ///
    /// Returns `None` without doing anything while another attempt is in
    /// flight. If the returned future is dropped mid-request the submitter
    /// still goes back to `Idle`, recording a transport failure.
    pub async fn submit<R, S>(
        &self,
        direction: Direction,
        read: R,
        on_success: S,
    ) -> Option<SubmissionOutcome>
    where
        R: FnOnce() -> SubmissionInput,
        S: FnOnce(),
    {
        let id = SubmissionId::new();

        let intent = {
            let mut machine = self.lock();
            if machine.state == SubmitterState::Submitting {
                tracing::debug!(submission_id = %id, "submit ignored; a movement is already in flight");
                return None;
            }

            match validate(&read(), direction) {
                Ok(intent) => {
                    machine.state = SubmitterState::Submitting;
                    intent
                }
                Err(reason) => {
                    tracing::warn!(submission_id = %id, %direction, reason = %reason, "movement rejected locally");
                    let outcome = SubmissionOutcome::ValidationFailed(reason.clone());
                    machine.last_outcome = Some(outcome.clone());
                    drop(machine);
                    self.error.show(reason);
                    return Some(outcome);
                }
            }
        };
        let in_flight = InFlight {
            machine: &self.machine,
            id,
            settled: false,
        };

        let span = tracing::info_span!(
            "submission",
            submission_id = %id,
            %direction,
            product = intent.product.name(),
            provisional = intent.product.is_provisional(),
            quantity = intent.quantity.get(),
        );

        let request = MovementRequest::from(&intent);
        let result = self
            .service
            .record_movement(&request)
            .instrument(span.clone())
            .await;
        let outcome = SubmissionOutcome::from_response(&result);

        span.in_scope(|| match &result {
            Ok(()) => {
                on_success();
                let generation = self.refresh.raise();
                self.success.show(success_message(&intent));
                tracing::info!(refresh_generation = generation, "movement recorded");
            }
            Err(e) => {
                if e.is_rejection() {
                    tracing::warn!(error = %e, "movement rejected by service");
                } else {
                    tracing::warn!(error = %e, "movement failed in transport");
                }
                if let Some(message) = outcome.message() {
                    self.error.show(message);
                }
            }
        });

        in_flight.settle(outcome.clone());
        Some(outcome)
    }

    fn lock(&self) -> MutexGuard<'_, Machine> {
        lock_machine(&self.machine)
    }
}

fn success_message(intent: &MovementIntent) -> String {
    let verb = match intent.direction {
        Direction::In => "Stock in",
        Direction::Out => "Stock out",
    };
    format!("{}: {} x {}", verb, intent.quantity, intent.product.name())
}

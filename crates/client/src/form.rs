//! The movement form: product, quantity, and the submit buttons.

use std::sync::{Arc, Mutex, MutexGuard};

use stocklog_core::{Direction, Preset, ProductReference, Quantity};

use crate::api::InventoryService;
use crate::config::NoticeTimings;
use crate::notice::TransientStatus;
use crate::quantity::QuantityEditor;
use crate::refresh::RefreshSignal;
use crate::resolver::ProductResolver;
use crate::submitter::{MovementSubmitter, SubmissionInput, SubmissionOutcome, SubmitterState};

#[derive(Debug, Default)]
pub(crate) struct FormInputs {
    resolver: ProductResolver,
    quantity: QuantityEditor,
}

impl FormInputs {
    fn snapshot(&self) -> SubmissionInput {
        SubmissionInput {
            product: self.resolver.selection().cloned(),
            raw_quantity: self.quantity.raw().to_string(),
        }
    }

    fn reset(&mut self) {
        self.resolver.clear_selection();
        self.quantity.reset();
    }
}

struct FormInner {
    service: Arc<dyn InventoryService>,
    inputs: Mutex<FormInputs>,
    submitter: MovementSubmitter,
}

/// Cheap to clone; clones drive the same form.
#[derive(Clone)]
pub struct MovementForm {
    inner: Arc<FormInner>,
}

impl MovementForm {
    pub fn new(
        service: Arc<dyn InventoryService>,
        refresh: RefreshSignal,
        timings: NoticeTimings,
    ) -> Self {
        let submitter = MovementSubmitter::new(service.clone(), refresh, timings);
        Self {
            inner: Arc::new(FormInner {
                service,
                inputs: Mutex::new(FormInputs::default()),
                submitter,
            }),
        }
    }

    /// Fetch the product catalog. Failures leave the catalog empty.
    pub async fn load_catalog(&self) {
        self.inputs().resolver.begin_loading();
        let result = self.inner.service.list_products().await;
        self.inputs().resolver.finish_loading(result);
    }

    pub fn is_loading_catalog(&self) -> bool {
        self.inputs().resolver.is_loading()
    }

    pub fn placeholder(&self) -> &'static str {
        self.inputs().resolver.placeholder()
    }

    pub fn search(&self, query: &str) -> Vec<ProductReference> {
        self.inputs().resolver.search(query)
    }

    pub fn select(&self, reference: ProductReference) {
        self.inputs().resolver.select(reference);
    }

    pub fn selection(&self) -> Option<ProductReference> {
        self.inputs().resolver.selection().cloned()
    }

    pub fn clear_selection(&self) {
        self.inputs().resolver.clear_selection();
    }

    pub fn quantity_raw(&self) -> String {
        self.inputs().quantity.raw().to_string()
    }

    pub fn set_quantity_raw(&self, text: impl Into<String>) {
        self.inputs().quantity.set_raw(text);
    }

    pub fn adjust_quantity(&self, delta: i64) -> Quantity {
        self.inputs().quantity.adjust(delta)
    }

    pub fn set_preset(&self, preset: Preset) {
        self.inputs().quantity.set_preset(preset);
    }

    /// Submit is offered only with a product selected and nothing in flight.
    pub fn can_submit(&self) -> bool {
        self.inputs().resolver.selection().is_some() && !self.inner.submitter.is_submitting()
    }

    pub fn is_submitting(&self) -> bool {
        self.inner.submitter.is_submitting()
    }

    pub fn state(&self) -> SubmitterState {
        self.inner.submitter.state()
    }

    /// Record a movement in `direction` from the current inputs.
    ///
    /// Returns `None` if a submission is already in flight. On success the
    /// inputs are reset; on any failure they are left as they were.
    pub async fn submit(&self, direction: Direction) -> Option<SubmissionOutcome> {
        self.inner
            .submitter
            .submit(
                direction,
                || self.inputs().snapshot(),
                || self.inputs().reset(),
            )
            .await
    }

    pub fn success_notice(&self) -> &TransientStatus {
        self.inner.submitter.success_notice()
    }

    pub fn error_notice(&self) -> &TransientStatus {
        self.inner.submitter.error_notice()
    }

    pub fn last_outcome(&self) -> Option<SubmissionOutcome> {
        self.inner.submitter.last_outcome()
    }

    /// Tear the form down: pending notice timers are cancelled.
    pub fn dispose(&self) {
        self.success_notice().clear();
        self.error_notice().clear();
        tracing::debug!("movement form disposed");
    }

    fn inputs(&self) -> MutexGuard<'_, FormInputs> {
        self.inner.inputs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::submitter::{MISSING_PRODUCT_MESSAGE, TRANSPORT_FAILURE_MESSAGE};
    use crate::testing::{FakeService, entry};
    use std::time::Duration;
    use tokio::sync::Notify;

    fn form_with(service: Arc<FakeService>) -> (MovementForm, RefreshSignal) {
        let refresh = RefreshSignal::new();
        let form = MovementForm::new(
            service,
            refresh.clone(),
            NoticeTimings {
                success: Duration::from_millis(1500),
                error: Duration::from_millis(3000),
            },
        );
        (form, refresh)
    }

    fn pick(form: &MovementForm, query: &str) {
        let choice = form.search(query).remove(0);
        form.select(choice);
    }

    #[tokio::test]
    async fn nothing_is_sent_without_a_product() {
        let service = Arc::new(FakeService::new());
        let (form, _) = form_with(service.clone());

        assert!(!form.can_submit());
        let outcome = form.submit(Direction::In).await;

        assert_eq!(
            outcome,
            Some(SubmissionOutcome::ValidationFailed(MISSING_PRODUCT_MESSAGE.to_string()))
        );
        assert_eq!(service.movement_count(), 0);
        assert_eq!(form.state(), SubmitterState::Idle);
        assert!(form.error_notice().is_showing());
    }

    #[tokio::test]
    async fn invalid_quantities_are_caught_locally() {
        let service = Arc::new(FakeService::new());
        let (form, _) = form_with(service.clone());
        pick(&form, "Widget A");

        for raw in ["", "0", "-4", "abc"] {
            form.set_quantity_raw(raw);
            let outcome = form.submit(Direction::Out).await;
            assert!(
                matches!(outcome, Some(SubmissionOutcome::ValidationFailed(_))),
                "{raw:?} produced {outcome:?}"
            );
            assert_eq!(form.quantity_raw(), raw);
        }
        assert_eq!(service.movement_count(), 0);
    }

    #[tokio::test]
    async fn new_product_movement_resets_and_refreshes() {
        let service = Arc::new(FakeService::new().with_products(vec![entry(1, "Widget A", 12)]));
        let (form, refresh) = form_with(service.clone());
        form.load_catalog().await;

        let choices = form.search("New Part");
        assert_eq!(choices.len(), 1);
        assert!(choices[0].is_provisional());
        form.select(choices[0].clone());
        form.set_quantity_raw("10");

        let outcome = form.submit(Direction::In).await;
        assert_eq!(outcome, Some(SubmissionOutcome::Success));

        let sent = service.movements();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            serde_json::to_value(&sent[0]).unwrap(),
            serde_json::json!({"product_name": "New Part", "quantity": 10, "type": "IN"})
        );

        assert!(form.selection().is_none());
        assert_eq!(form.quantity_raw(), "1");
        assert_eq!(refresh.generation(), 1);
        assert!(form.success_notice().is_showing());
        assert!(!form.error_notice().is_showing());
    }

    #[tokio::test]
    async fn rejection_keeps_inputs_and_shows_service_text() {
        let service = Arc::new(
            FakeService::new()
                .with_products(vec![entry(1, "Widget A", 2)])
                .failing_movements(ApiError::Rejected {
                    status: 409,
                    detail: "Insufficient stock".to_string(),
                }),
        );
        let (form, refresh) = form_with(service.clone());
        form.load_catalog().await;
        pick(&form, "widget");
        form.set_quantity_raw("5");

        let outcome = form.submit(Direction::Out).await;

        assert_eq!(outcome, Some(SubmissionOutcome::Rejected("Insufficient stock".to_string())));
        assert_eq!(form.selection().unwrap().name(), "Widget A");
        assert_eq!(form.quantity_raw(), "5");
        assert_eq!(refresh.generation(), 0);
        assert_eq!(form.error_notice().current().unwrap().message, "Insufficient stock");
        assert!(form.can_submit());
    }

    #[tokio::test]
    async fn transport_failure_uses_the_generic_message() {
        let service = Arc::new(
            FakeService::new().failing_movements(ApiError::Network("connection refused".to_string())),
        );
        let (form, refresh) = form_with(service.clone());
        pick(&form, "Widget A");

        let outcome = form.submit(Direction::In).await;

        assert_eq!(
            outcome,
            Some(SubmissionOutcome::TransportFailed(TRANSPORT_FAILURE_MESSAGE.to_string()))
        );
        assert_eq!(form.selection().unwrap().name(), "Widget A");
        assert_eq!(refresh.generation(), 0);
        assert_eq!(form.last_outcome(), outcome);
    }

    #[tokio::test]
    async fn second_submit_while_in_flight_is_ignored() {
        let gate = Arc::new(Notify::new());
        let service = Arc::new(FakeService::new().gated(gate.clone()));
        let (form, refresh) = form_with(service.clone());
        pick(&form, "Widget A");
        form.set_quantity_raw("5");

        let first = tokio::spawn({
            let form = form.clone();
            async move { form.submit(Direction::Out).await }
        });
        while !form.is_submitting() {
            tokio::task::yield_now().await;
        }

        assert!(!form.can_submit());
        // Edits made mid-flight must not reach the request already sent.
        form.set_quantity_raw("99");
        assert_eq!(form.submit(Direction::In).await, None);
        assert_eq!(service.movement_count(), 1);

        gate.notify_one();
        assert_eq!(first.await.unwrap(), Some(SubmissionOutcome::Success));

        let sent = service.movements();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].quantity.get(), 5);
        assert_eq!(sent[0].direction, Direction::Out);
        assert_eq!(refresh.generation(), 1);
        assert_eq!(form.state(), SubmitterState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_submit_frees_the_form() {
        let gate = Arc::new(Notify::new());
        let service = Arc::new(FakeService::new().gated(gate.clone()));
        let (form, refresh) = form_with(service.clone());
        pick(&form, "Widget A");

        let abandoned = tokio::time::timeout(Duration::from_millis(50), form.submit(Direction::In)).await;
        assert!(abandoned.is_err());

        assert_eq!(form.state(), SubmitterState::Idle);
        assert!(form.can_submit());
        assert_eq!(
            form.last_outcome(),
            Some(SubmissionOutcome::TransportFailed(TRANSPORT_FAILURE_MESSAGE.to_string()))
        );
        assert_eq!(form.selection().unwrap().name(), "Widget A");
        assert_eq!(refresh.generation(), 0);

        gate.notify_one();
        assert_eq!(form.submit(Direction::In).await, Some(SubmissionOutcome::Success));
        assert_eq!(service.movement_count(), 2);
        assert_eq!(refresh.generation(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn later_error_does_not_cut_short_the_success_notice() {
        let service = Arc::new(FakeService::new());
        let (form, _) = form_with(service.clone());

        pick(&form, "Widget A");
        assert_eq!(form.submit(Direction::In).await, Some(SubmissionOutcome::Success));

        tokio::time::sleep(Duration::from_millis(500)).await;
        service.set_movement_result(Err(ApiError::Rejected {
            status: 409,
            detail: "Insufficient stock".to_string(),
        }));
        pick(&form, "Widget A");
        form.submit(Direction::Out).await;

        assert_eq!(form.success_notice().current().unwrap().message, "Stock in: 1 x Widget A");
        assert_eq!(form.error_notice().current().unwrap().message, "Insufficient stock");

        // t = 1600ms: success lifetime over, error still running.
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(!form.success_notice().is_showing());
        assert!(form.error_notice().is_showing());

        // t = 3400ms: error shown at 500ms lasts until 3500ms.
        tokio::time::sleep(Duration::from_millis(1800)).await;
        assert!(form.error_notice().is_showing());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!form.error_notice().is_showing());
    }

    #[tokio::test]
    async fn failed_catalog_still_allows_new_products() {
        let service = Arc::new(
            FakeService::new().failing_products(ApiError::Unexpected { status: 500 }),
        );
        let (form, _) = form_with(service.clone());
        form.load_catalog().await;

        assert!(!form.is_loading_catalog());
        assert_eq!(service.product_calls(), 1);
        let choices = form.search("Bolt");
        assert_eq!(choices.len(), 1);
        assert!(choices[0].is_provisional());
    }

    #[tokio::test]
    async fn quantity_controls_feed_the_request() {
        let service = Arc::new(FakeService::new());
        let (form, _) = form_with(service.clone());
        pick(&form, "Widget A");

        form.set_preset(Preset::Twenty);
        assert_eq!(form.adjust_quantity(-1).get(), 19);
        form.submit(Direction::In).await;

        assert_eq!(service.movements()[0].quantity.get(), 19);
    }

    #[tokio::test(start_paused = true)]
    async fn dispose_clears_pending_notices() {
        let service = Arc::new(FakeService::new());
        let (form, _) = form_with(service.clone());
        form.submit(Direction::In).await;
        assert!(form.error_notice().is_showing());

        form.dispose();
        assert!(!form.error_notice().is_showing());
        assert!(!form.success_notice().is_showing());
    }
}

//! Checkout flow controller.
//!
//! A [`CheckoutSession`] owns one shopper's wizard: the shipping draft, the
//! loaded cart and payment methods, the current step and the user-visible
//! error banner. It never talks to the network on its own; every remote call
//! goes through a [`CheckoutGateway`] passed in by the caller.
//!
//! Order placement is split in three so that no lock has to be held across
//! a network call:
//!
//! 1. [`CheckoutSession::begin_submission`] validates and marks the
//!    submission pending, returning a [`Submission`].
//! 2. [`Submission::execute`] talks to the gateway.
//! 3. [`CheckoutSession::finish_submission`] applies the outcome.
//!
//! [`CheckoutSession::place_order`] runs all three for single-owner callers.

use gearline_core::{
    CheckoutSessionId, OrderConfirmation, PaymentMethodId, ShippingMethod, UserId,
};
use rust_decimal::Decimal;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::compensation::{Compensation, CompensationPolicy};
use super::error::CheckoutError;
use super::gateway::{
    CartSnapshot, CheckoutGateway, GatewayError, OrderRequest, PaymentMethodRef,
    default_payment_method,
};
use super::request::RequestState;
use super::shipping::{ShippingField, ShippingInfo};
use super::step::WizardStep;
use super::total::OrderSummary;

/// An order the service created but that has not been paid yet.
#[derive(Debug, Clone, PartialEq, Eq)]
struct UnpaidOrder {
    order: OrderConfirmation,
    shipping: ShippingInfo,
}

/// State of one shopper's checkout wizard.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    id: CheckoutSessionId,
    user_id: UserId,
    policy: CompensationPolicy,
    idempotency_key: Uuid,
    step: WizardStep,
    shipping: ShippingInfo,
    cart: Option<CartSnapshot>,
    payment_methods: Vec<PaymentMethodRef>,
    selected_payment_method: Option<PaymentMethodId>,
    processing_fee: Option<Decimal>,
    error: Option<String>,
    load_state: RequestState,
    submission: RequestState,
    unpaid_order: Option<UnpaidOrder>,
    confirmation: Option<OrderConfirmation>,
}

impl CheckoutSession {
    /// Start a new checkout at step 1 with an empty shipping draft.
    #[must_use]
    pub fn new(user_id: UserId, policy: CompensationPolicy) -> Self {
        Self {
            id: CheckoutSessionId::generate(),
            user_id,
            policy,
            idempotency_key: Uuid::new_v4(),
            step: WizardStep::Shipping,
            shipping: ShippingInfo::default(),
            cart: None,
            payment_methods: Vec::new(),
            selected_payment_method: None,
            processing_fee: None,
            error: None,
            load_state: RequestState::Idle,
            submission: RequestState::Idle,
            unpaid_order: None,
            confirmation: None,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub const fn id(&self) -> CheckoutSessionId {
        self.id
    }

    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub const fn step(&self) -> WizardStep {
        self.step
    }

    #[must_use]
    pub const fn shipping(&self) -> &ShippingInfo {
        &self.shipping
    }

    #[must_use]
    pub const fn cart(&self) -> Option<&CartSnapshot> {
        self.cart.as_ref()
    }

    #[must_use]
    pub fn payment_methods(&self) -> &[PaymentMethodRef] {
        &self.payment_methods
    }

    #[must_use]
    pub const fn selected_payment_method(&self) -> Option<PaymentMethodId> {
        self.selected_payment_method
    }

    #[must_use]
    pub const fn processing_fee(&self) -> Option<Decimal> {
        self.processing_fee
    }

    /// The single user-visible error message, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub const fn load_state(&self) -> &RequestState {
        &self.load_state
    }

    #[must_use]
    pub const fn submission_state(&self) -> &RequestState {
        &self.submission
    }

    /// Order created by a previous attempt whose payment failed.
    #[must_use]
    pub fn awaiting_payment(&self) -> Option<&OrderConfirmation> {
        self.unpaid_order.as_ref().map(|unpaid| &unpaid.order)
    }

    /// The placed order, once the wizard reached confirmation.
    #[must_use]
    pub const fn confirmation(&self) -> Option<&OrderConfirmation> {
        self.confirmation.as_ref()
    }

    #[must_use]
    pub const fn compensation_policy(&self) -> CompensationPolicy {
        self.policy
    }

    /// Current subtotal, fee, shipping cost and total.
    ///
    /// Figures not loaded yet count as zero.
    #[must_use]
    pub fn summary(&self) -> OrderSummary {
        OrderSummary::new(
            self.cart.as_ref().map_or(Decimal::ZERO, |cart| cart.subtotal),
            self.processing_fee.unwrap_or(Decimal::ZERO),
            self.shipping.method,
        )
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Fetch the cart, the saved payment methods and the processing fee, in
    /// that order.
    ///
    /// On failure the banner is set and whatever was fetched before the
    /// failure stays in place.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Load`] if any fetch fails, or
    /// [`CheckoutError::InvalidTransition`] once the order is confirmed.
    #[instrument(skip(self, gateway), fields(session_id = %self.id, user_id = %self.user_id))]
    pub async fn load(&mut self, gateway: &dyn CheckoutGateway) -> Result<(), CheckoutError> {
        if self.step == WizardStep::Confirmation {
            return Err(self.invalid("load checkout data"));
        }

        self.load_state = RequestState::Pending;
        self.error = None;

        match self.fetch(gateway).await {
            Ok(()) => {
                self.load_state = RequestState::Succeeded;
                debug!(
                    items = self.cart.as_ref().map_or(0, CartSnapshot::item_count),
                    payment_methods = self.payment_methods.len(),
                    "Checkout data loaded"
                );
                Ok(())
            }
            Err(source) => {
                warn!(error = %source, "Failed to load checkout data");
                let err = CheckoutError::Load(source);
                let message = err.user_message();
                self.error = Some(message.clone());
                self.load_state = RequestState::Failed(message);
                Err(err)
            }
        }
    }

    async fn fetch(&mut self, gateway: &dyn CheckoutGateway) -> Result<(), GatewayError> {
        let cart = gateway.cart_items(self.user_id).await?;
        let subtotal = cart.subtotal;
        self.cart = Some(cart);

        let methods = gateway.payment_methods(self.user_id).await?;
        let still_listed = self
            .selected_payment_method
            .is_some_and(|id| methods.iter().any(|method| method.id == id));
        if !still_listed {
            self.selected_payment_method = default_payment_method(&methods);
        }
        self.payment_methods = methods;

        self.processing_fee = Some(gateway.processing_fee(subtotal).await?);
        Ok(())
    }

    // =========================================================================
    // Step 1: shipping
    // =========================================================================

    /// Overwrite one shipping text field.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] outside step 1.
    pub fn update_shipping(
        &mut self,
        field: ShippingField,
        value: impl Into<String>,
    ) -> Result<(), CheckoutError> {
        if self.step != WizardStep::Shipping {
            return Err(self.invalid("edit shipping details"));
        }
        self.shipping.set_field(field, value);
        Ok(())
    }

    /// Choose the shipping speed.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] outside step 1.
    pub fn set_shipping_method(&mut self, method: ShippingMethod) -> Result<(), CheckoutError> {
        if self.step != WizardStep::Shipping {
            return Err(self.invalid("change shipping method"));
        }
        self.shipping.method = method;
        Ok(())
    }

    /// Move from shipping to payment if address, city, state and zip are all
    /// filled in.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::IncompleteShipping`] (and sets the banner)
    /// when a required field is blank, or [`CheckoutError::InvalidTransition`]
    /// outside step 1.
    pub fn advance_from_shipping(&mut self) -> Result<WizardStep, CheckoutError> {
        if self.step != WizardStep::Shipping {
            return Err(self.invalid("advance from shipping"));
        }

        let missing = self.shipping.missing_fields();
        if !missing.is_empty() {
            let err = CheckoutError::IncompleteShipping { missing };
            debug!(session_id = %self.id, error = %err, "Shipping validation failed");
            self.error = Some(err.user_message());
            return Err(err);
        }

        self.error = None;
        self.step = WizardStep::Payment;
        Ok(self.step)
    }

    /// Go back one step and clear the banner.
    ///
    /// No-op at step 1, at confirmation, and while a submission is pending.
    pub fn retreat_step(&mut self) -> WizardStep {
        if self.submission.is_pending() {
            return self.step;
        }
        if let Some(previous) = self.step.previous() {
            self.step = previous;
            self.error = None;
        }
        self.step
    }

    // =========================================================================
    // Step 2: payment
    // =========================================================================

    /// Select one of the loaded payment methods.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::UnknownPaymentMethod`] for an id that was not
    /// loaded, or [`CheckoutError::InvalidTransition`] outside step 2 or while
    /// a submission is pending.
    pub fn select_payment_method(&mut self, id: PaymentMethodId) -> Result<(), CheckoutError> {
        if self.step != WizardStep::Payment || self.submission.is_pending() {
            return Err(self.invalid("select a payment method"));
        }
        if !self.payment_methods.iter().any(|method| method.id == id) {
            let err = CheckoutError::UnknownPaymentMethod(id);
            self.error = Some(err.user_message());
            return Err(err);
        }
        self.selected_payment_method = Some(id);
        self.error = None;
        Ok(())
    }

    /// Validate and mark the submission pending.
    ///
    /// While the returned [`Submission`] is outstanding, further calls fail
    /// with [`CheckoutError::SubmissionInFlight`].
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::SubmissionInFlight`],
    /// [`CheckoutError::InvalidTransition`] outside step 2, or
    /// [`CheckoutError::NoPaymentMethod`] (setting the banner) when no payment
    /// method is selected. None of these contact any service.
    pub fn begin_submission(&mut self) -> Result<Submission, CheckoutError> {
        if self.submission.is_pending() {
            return Err(CheckoutError::SubmissionInFlight);
        }
        if self.step != WizardStep::Payment {
            return Err(self.invalid("place an order"));
        }
        let Some(payment_method_id) = self.selected_payment_method else {
            let err = CheckoutError::NoPaymentMethod;
            self.error = Some(err.user_message());
            return Err(err);
        };

        let stage = match self.unpaid_order.take() {
            Some(unpaid) if unpaid.shipping == self.shipping => Stage::Pay(unpaid.order),
            stale => {
                if let Some(unpaid) = stale {
                    warn!(
                        session_id = %self.id,
                        order_id = %unpaid.order.id,
                        "Shipping changed since unpaid order was created; creating a new order"
                    );
                    self.idempotency_key = Uuid::new_v4();
                }
                Stage::Create(OrderRequest {
                    shipping: self.shipping.clone(),
                    payment_method_id,
                    idempotency_key: self.idempotency_key,
                })
            }
        };

        self.error = None;
        self.submission = RequestState::Pending;

        Ok(Submission {
            session_id: self.id,
            user_id: self.user_id,
            payment_method_id,
            policy: self.policy,
            stage,
        })
    }

    /// Apply the outcome of an executed [`Submission`].
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::OrderCreation`] or
    /// [`CheckoutError::PaymentProcessing`] when the submission failed; the
    /// banner carries the service message or a generic fallback.
    pub fn finish_submission(
        &mut self,
        outcome: SubmissionOutcome,
    ) -> Result<OrderConfirmation, CheckoutError> {
        match outcome {
            SubmissionOutcome::Placed(order) => {
                info!(
                    session_id = %self.id,
                    order_id = %order.id,
                    order_number = %order.order_number,
                    total = %order.total_amount,
                    "Order placed"
                );
                self.unpaid_order = None;
                self.confirmation = Some(order.clone());
                self.step = WizardStep::Confirmation;
                self.submission = RequestState::Succeeded;
                self.error = None;
                Ok(order)
            }
            SubmissionOutcome::OrderFailed(source) => {
                self.fail_submission(CheckoutError::OrderCreation(source))
            }
            SubmissionOutcome::PaymentFailed {
                order,
                error: source,
                compensation,
            } => {
                let order_id = order.id;
                self.unpaid_order = match compensation {
                    Compensation::Cancelled => {
                        // The next attempt must not be deduplicated onto the cancelled order.
                        self.idempotency_key = Uuid::new_v4();
                        None
                    }
                    Compensation::Retained | Compensation::CancelFailed(_) => Some(UnpaidOrder {
                        order,
                        shipping: self.shipping.clone(),
                    }),
                };
                self.fail_submission(CheckoutError::PaymentProcessing { order_id, source })
            }
        }
    }

    /// Place the order: create it, charge it, and move to confirmation.
    ///
    /// # Errors
    ///
    /// See [`Self::begin_submission`] and [`Self::finish_submission`].
    pub async fn place_order(
        &mut self,
        gateway: &dyn CheckoutGateway,
    ) -> Result<OrderConfirmation, CheckoutError> {
        let submission = self.begin_submission()?;
        let outcome = submission.execute(gateway).await;
        self.finish_submission(outcome)
    }

    fn fail_submission(&mut self, err: CheckoutError) -> Result<OrderConfirmation, CheckoutError> {
        warn!(session_id = %self.id, error = %err, "Order submission failed");
        let message = err.user_message();
        self.error = Some(message.clone());
        self.submission = RequestState::Failed(message);
        Err(err)
    }

    const fn invalid(&self, action: &'static str) -> CheckoutError {
        CheckoutError::InvalidTransition {
            step: self.step,
            action,
        }
    }
}

/// What a submission still has to do.
#[derive(Debug, Clone)]
enum Stage {
    /// Create the order, then pay it.
    Create(OrderRequest),
    /// Pay an order left unpaid by an earlier attempt.
    Pay(OrderConfirmation),
}

/// A validated order submission, detached from its session.
#[derive(Debug, Clone)]
#[must_use = "a submission leaves its session pending until finished"]
pub struct Submission {
    session_id: CheckoutSessionId,
    user_id: UserId,
    payment_method_id: PaymentMethodId,
    policy: CompensationPolicy,
    stage: Stage,
}

/// Result of [`Submission::execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Order created and paid.
    Placed(OrderConfirmation),
    /// The order service did not create an order.
    OrderFailed(GatewayError),
    /// The order exists but payment failed.
    PaymentFailed {
        order: OrderConfirmation,
        error: GatewayError,
        compensation: Compensation,
    },
}

impl Submission {
    /// Whether this submission reuses an order created by an earlier attempt.
    #[must_use]
    pub const fn retries_payment(&self) -> bool {
        matches!(self.stage, Stage::Pay(_))
    }

    /// Create the order (unless retrying payment), then charge its
    /// `total_amount`. Calls run one at a time; nothing is retried.
    #[instrument(
        skip_all,
        fields(session_id = %self.session_id, user_id = %self.user_id, policy = %self.policy)
    )]
    pub async fn execute(self, gateway: &dyn CheckoutGateway) -> SubmissionOutcome {
        let order = match self.stage {
            Stage::Pay(order) => {
                debug!(order_id = %order.id, "Retrying payment for existing order");
                order
            }
            Stage::Create(request) => match gateway.create_order(self.user_id, &request).await {
                Ok(order) => {
                    debug!(order_id = %order.id, "Order created");
                    order
                }
                Err(err) => return SubmissionOutcome::OrderFailed(err),
            },
        };

        match gateway
            .process_payment(order.id, order.total_amount, self.payment_method_id)
            .await
        {
            Ok(()) => SubmissionOutcome::Placed(order),
            Err(err) => {
                let compensation = match self.policy {
                    CompensationPolicy::RetryPayment => Compensation::Retained,
                    CompensationPolicy::CancelOrder => match gateway.cancel_order(order.id).await {
                        Ok(()) => {
                            info!(order_id = %order.id, "Cancelled unpaid order");
                            Compensation::Cancelled
                        }
                        Err(cancel_err) => {
                            error!(
                                order_id = %order.id,
                                error = %cancel_err,
                                "Failed to cancel unpaid order; keeping it for payment retry"
                            );
                            Compensation::CancelFailed(cancel_err)
                        }
                    },
                };
                SubmissionOutcome::PaymentFailed {
                    order,
                    error: err,
                    compensation,
                }
            }
        }
    }
}

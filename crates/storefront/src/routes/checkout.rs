//! Checkout API route handlers.
//!
//! Every handler answers with the session's [`CheckoutView`]. Validation
//! failures come back as 422 and service failures as 200, both with the
//! banner in `error`; state conflicts are 409.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use gearline_core::{
    CheckoutSessionId, OrderConfirmation, PaymentMethodId, ShippingMethod, UserId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::checkout::{
    CartSnapshot, CheckoutError, CheckoutSession, GatewayError, PaymentMethodRef, RequestState,
    SharedSession, ShippingField, ShippingInfo, SubmissionOutcome, WizardStep,
};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireUser;
use crate::state::AppState;

/// Response for every checkout route.
pub type ViewResponse = (StatusCode, Json<CheckoutView>);

/// Snapshot of a checkout session as the client sees it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutView {
    pub id: CheckoutSessionId,
    pub step: WizardStep,
    pub step_label: &'static str,
    pub shipping: ShippingInfo,
    pub cart: Option<CartSnapshot>,
    pub payment_methods: Vec<PaymentMethodRef>,
    pub selected_payment_method_id: Option<PaymentMethodId>,
    pub subtotal: Decimal,
    pub processing_fee: Option<Decimal>,
    pub shipping_cost: Decimal,
    pub total: Decimal,
    pub subtotal_display: String,
    pub shipping_cost_display: String,
    pub total_display: String,
    pub error: Option<String>,
    pub load_state: RequestState,
    pub submission_state: RequestState,
    pub awaiting_payment: Option<OrderConfirmation>,
    pub confirmation: Option<OrderConfirmation>,
    /// Service-reported order total, formatted.
    pub confirmation_total_display: Option<String>,
}

impl From<&CheckoutSession> for CheckoutView {
    fn from(session: &CheckoutSession) -> Self {
        let summary = session.summary();
        Self {
            id: session.id(),
            step: session.step(),
            step_label: session.step().label(),
            shipping: session.shipping().clone(),
            cart: session.cart().cloned(),
            payment_methods: session.payment_methods().to_vec(),
            selected_payment_method_id: session.selected_payment_method(),
            subtotal: summary.subtotal,
            processing_fee: session.processing_fee(),
            shipping_cost: summary.shipping_cost,
            total: summary.total,
            subtotal_display: gearline_core::Price::usd(summary.subtotal).display(),
            shipping_cost_display: gearline_core::Price::usd(summary.shipping_cost).display(),
            total_display: summary.total_display(),
            error: session.error().map(String::from),
            load_state: session.load_state().clone(),
            submission_state: session.submission_state().clone(),
            awaiting_payment: session.awaiting_payment().cloned(),
            confirmation: session.confirmation().cloned(),
            confirmation_total_display: session
                .confirmation()
                .map(|order| order.total().display()),
        }
    }
}

/// Shipping draft update. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingUpdate {
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub method: Option<ShippingMethod>,
}

impl ShippingUpdate {
    fn fields(self) -> impl Iterator<Item = (ShippingField, String)> {
        [
            (ShippingField::Address, self.address),
            (ShippingField::City, self.city),
            (ShippingField::State, self.state),
            (ShippingField::Zip, self.zip),
            (ShippingField::Country, self.country),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|value| (field, value)))
    }
}

/// Payment method selection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodSelection {
    pub payment_method_id: PaymentMethodId,
}

// =============================================================================
// Helpers
// =============================================================================

/// Look up a session, hiding sessions that belong to someone else.
async fn owned_session(
    state: &AppState,
    id: CheckoutSessionId,
    user_id: UserId,
) -> Result<SharedSession> {
    let shared = state
        .sessions()
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound("checkout session".to_string()))?;

    if shared.lock().await.user_id() != user_id {
        debug!(session_id = %id, user_id = %user_id, "Session owned by another user");
        return Err(AppError::NotFound("checkout session".to_string()));
    }

    Ok(shared)
}

/// Turn an operation result into the view response.
fn respond<T>(
    session: &CheckoutSession,
    result: std::result::Result<T, CheckoutError>,
) -> Result<ViewResponse> {
    let view = Json(CheckoutView::from(session));
    match result {
        Ok(_) => Ok((StatusCode::OK, view)),
        Err(err) if err.is_conflict() => Err(AppError::Checkout(err)),
        Err(err) if err.is_validation() => Ok((StatusCode::UNPROCESSABLE_ENTITY, view)),
        Err(_) => Ok((StatusCode::OK, view)),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Start a checkout and load the cart, payment methods and fee.
///
/// The session is created even if loading fails; the view carries the banner.
#[instrument(skip(state))]
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
) -> Result<ViewResponse> {
    let mut session = CheckoutSession::new(user_id, state.checkout().compensation);
    if let Err(err) = session.load(state.gateway().as_ref()).await {
        debug!(session_id = %session.id(), error = %err, "Checkout started without full data");
    }

    let view = CheckoutView::from(&session);
    state.sessions().insert(session).await;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Current view of a session.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path(id): Path<CheckoutSessionId>,
) -> Result<Json<CheckoutView>> {
    let shared = owned_session(&state, id, user_id).await?;
    let session = shared.lock().await;
    Ok(Json(CheckoutView::from(&*session)))
}

/// Update shipping fields and/or the shipping method.
#[instrument(skip(state, update))]
pub async fn update_shipping(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path(id): Path<CheckoutSessionId>,
    Json(update): Json<ShippingUpdate>,
) -> Result<ViewResponse> {
    let shared = owned_session(&state, id, user_id).await?;
    let mut session = shared.lock().await;

    let method = update.method;
    let result = update
        .fields()
        .try_for_each(|(field, value)| session.update_shipping(field, value))
        .and_then(|()| method.map_or(Ok(()), |method| session.set_shipping_method(method)));

    respond(&session, result)
}

/// Validate shipping and move to the payment step.
#[instrument(skip(state))]
pub async fn advance(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path(id): Path<CheckoutSessionId>,
) -> Result<ViewResponse> {
    let shared = owned_session(&state, id, user_id).await?;
    let mut session = shared.lock().await;
    let result = session.advance_from_shipping();
    respond(&session, result)
}

/// Go back one step. Never fails.
#[instrument(skip(state))]
pub async fn back(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path(id): Path<CheckoutSessionId>,
) -> Result<Json<CheckoutView>> {
    let shared = owned_session(&state, id, user_id).await?;
    let mut session = shared.lock().await;
    session.retreat_step();
    Ok(Json(CheckoutView::from(&*session)))
}

/// Choose one of the loaded payment methods.
#[instrument(skip(state, selection))]
pub async fn select_payment_method(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path(id): Path<CheckoutSessionId>,
    Json(selection): Json<PaymentMethodSelection>,
) -> Result<ViewResponse> {
    let shared = owned_session(&state, id, user_id).await?;
    let mut session = shared.lock().await;
    let result = session.select_payment_method(selection.payment_method_id);
    respond(&session, result)
}

/// Create the order and charge it.
///
/// The gateway calls run on a spawned task without the session lock, so a
/// disconnecting client cannot leave the session pending. A concurrent call
/// sees the pending submission and gets 409.
#[instrument(skip(state))]
pub async fn place_order(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path(id): Path<CheckoutSessionId>,
) -> Result<ViewResponse> {
    let shared = owned_session(&state, id, user_id).await?;

    let submission = {
        let mut session = shared.lock().await;
        match session.begin_submission() {
            Ok(submission) => submission,
            Err(err) => return respond(&session, Err::<(), _>(err)),
        }
    };

    let session_tag = id.to_string();
    add_breadcrumb(
        "checkout",
        if submission.retries_payment() {
            "Retrying payment"
        } else {
            "Placing order"
        },
        Some(&[("session_id", session_tag.as_str())][..]),
    );

    let gateway = std::sync::Arc::clone(state.gateway());
    let task_session = std::sync::Arc::clone(&shared);
    let task = tokio::spawn(async move {
        let outcome = submission.execute(gateway.as_ref()).await;
        let mut session = task_session.lock().await;
        let result = session.finish_submission(outcome);
        respond(&session, result)
    });

    match task.await {
        Ok(response) => response,
        Err(join_err) => {
            error!(session_id = %id, error = %join_err, "Order submission task failed");
            let mut session = shared.lock().await;
            if session.submission_state().is_pending() {
                if let Err(err) = session.finish_submission(SubmissionOutcome::OrderFailed(
                    GatewayError::Transport(join_err.to_string()),
                )) {
                    error!(
                        session_id = %id,
                        error = %err,
                        "Marked stalled submission as failed"
                    );
                }
            }
            Err(AppError::Internal(join_err.to_string()))
        }
    }
}

//! Import wizard handlers
//!
//! Every handler locks the session's wizard, first applies the extraction
//! events that arrived since the last request, then performs its operation.

use std::time::Duration;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use tokio::sync::MutexGuard;
use tokio::time::Instant;

use core_kernel::ImportSessionId;
use domain_billing::{CalendarView, MembershipOffer, PaymentGroup};
use domain_import::{
    ImportReceipt, ImportWizard, MembershipChoice, SessionSnapshot, SourceFile, WizardStep,
};
use domain_member::SourceRole;

use crate::dto::imports::*;
use crate::error::ApiError;
use crate::registry::SharedWizard;
use crate::AppState;

fn parse_session_id(raw: &str) -> Result<ImportSessionId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid import session id: {}", raw)))
}

fn parse_role(raw: &str) -> Result<SourceRole, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::NotFound(format!("upload slot {} not found", raw)))
}

async fn session(state: &AppState, raw_id: &str) -> Result<SharedWizard, ApiError> {
    state.sessions.get(parse_session_id(raw_id)?).await
}

/// Pause between polls while a request waits for extractions
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Locks the wizard and applies pending extraction events
async fn lock(wizard: &SharedWizard) -> MutexGuard<'_, ImportWizard> {
    let mut guard = wizard.lock().await;
    guard.poll_events();
    guard
}

/// Starts a new import session
pub async fn create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionSnapshot>) {
    let wizard = ImportWizard::new(state.ports.clone(), state.import_config.clone());
    let snapshot = wizard.snapshot();
    state.sessions.insert(wizard).await;
    (StatusCode::CREATED, Json(snapshot))
}

/// Current session state; `?wait=true` first waits for running extractions
///
/// The wait polls and releases the session lock between polls, so uploads
/// and removals on the same session are not held up by it. It gives up after
/// the extraction timeout.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let wizard = session(&state, &id).await?;
    if !query.wait {
        return Ok(Json(lock(&wizard).await.snapshot()));
    }

    let deadline = Instant::now() + state.import_config.extraction_timeout();
    loop {
        {
            let guard = lock(&wizard).await;
            if !guard.session().slots().any_in_flight() || Instant::now() >= deadline {
                return Ok(Json(guard.snapshot()));
            }
        }
        tokio::time::sleep(WAIT_POLL_INTERVAL).await;
    }
}

/// Discards a session and aborts its extractions
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_session_id(&id)?;
    state
        .sessions
        .remove(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("import session {} not found", id)))?;
    tracing::info!(session_id = %id, "Import session discarded");
    Ok(StatusCode::NO_CONTENT)
}

/// Uploads a document into a slot (multipart part `file`)
pub async fn upload_file(
    State(state): State<AppState>,
    Path((id, role)): Path<(String, String)>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SlotAcceptedResponse>), ApiError> {
    let role = parse_role(&role)?;
    let wizard = session(&state, &id).await?;

    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("upload.pdf").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        file = Some(SourceFile::new(name, content_type, bytes.to_vec()));
    }
    let file = file.ok_or_else(|| ApiError::BadRequest("multipart part 'file' is missing".to_string()))?;

    let mut wizard = lock(&wizard).await;
    let ticket = wizard.accept_file(role, file)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SlotAcceptedResponse {
            role,
            ticket,
            session: wizard.snapshot(),
        }),
    ))
}

/// Clears a slot; the session returns to step 1
pub async fn remove_file(
    State(state): State<AppState>,
    Path((id, role)): Path<(String, String)>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let role = parse_role(&role)?;
    let wizard = session(&state, &id).await?;
    let mut wizard = lock(&wizard).await;
    wizard.remove_file(role)?;
    Ok(Json(wizard.snapshot()))
}

pub async fn advance(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let wizard = session(&state, &id).await?;
    let mut wizard = lock(&wizard).await;
    wizard.advance()?;
    Ok(Json(wizard.snapshot()))
}

pub async fn go_back(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<GoBackRequest>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let target = WizardStep::from_number(request.step)
        .ok_or_else(|| ApiError::Validation(format!("no wizard step {}", request.step)))?;
    let wizard = session(&state, &id).await?;
    let mut wizard = lock(&wizard).await;
    wizard.go_back(target)?;
    Ok(Json(wizard.snapshot()))
}

/// Sets manual bank details; an empty `iban` clears the override
pub async fn set_bank_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<BankDetailsRequest>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let wizard = session(&state, &id).await?;
    let mut wizard = lock(&wizard).await;

    match request.iban.as_deref().map(str::trim) {
        Some("") => wizard.clear_iban()?,
        Some(iban) => wizard.set_iban(iban)?,
        None => {}
    }
    if request.bic.is_some() || request.bank_name.is_some() || request.account_holder.is_some() {
        wizard.set_bank_details(
            request.bic.as_deref(),
            request.bank_name.as_deref(),
            request.account_holder.as_deref(),
        )?;
    }
    Ok(Json(wizard.snapshot()))
}

pub async fn calendar(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CalendarView>, ApiError> {
    let wizard = session(&state, &id).await?;
    let wizard = lock(&wizard).await;
    Ok(Json(wizard.calendar()?))
}

pub async fn membership_options(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<MembershipOffer>>, ApiError> {
    let wizard = session(&state, &id).await?;
    let wizard = lock(&wizard).await;
    Ok(Json(wizard.membership_options().await?))
}

pub async fn select_membership(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(choice): Json<MembershipChoice>,
) -> Result<Json<SelectionResponse<MembershipOffer>>, ApiError> {
    let wizard = session(&state, &id).await?;
    let mut wizard = lock(&wizard).await;
    let selected = wizard.select_membership(choice).await?;
    Ok(Json(SelectionResponse {
        selected,
        session: wizard.snapshot(),
    }))
}

pub async fn payment_groups(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PaymentGroupsResponse>, ApiError> {
    let wizard = session(&state, &id).await?;
    let wizard = lock(&wizard).await;

    let groups = wizard.payment_groups().await?;
    let suggested = match wizard.session().canonical_record() {
        Some(_) => wizard.suggested_payment_group().await?.map(|g| g.id),
        None => None,
    };
    Ok(Json(PaymentGroupsResponse { groups, suggested }))
}

pub async fn select_payment_group(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SelectPaymentGroupRequest>,
) -> Result<Json<SelectionResponse<PaymentGroup>>, ApiError> {
    let wizard = session(&state, &id).await?;
    let mut wizard = lock(&wizard).await;
    let selected = wizard.select_payment_group(request.payment_group_id).await?;
    Ok(Json(SelectionResponse {
        selected,
        session: wizard.snapshot(),
    }))
}

/// Persists the import from the final step and releases the session
pub async fn commit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<ImportReceipt>), ApiError> {
    let shared = session(&state, &id).await?;
    let receipt = lock(&shared).await.commit().await?;

    // A committed session accepts no further changes; release it and its files
    state.sessions.remove(receipt.session_id).await;
    tracing::debug!(session_id = %receipt.session_id, "Committed session released");

    Ok((StatusCode::CREATED, Json(receipt)))
}

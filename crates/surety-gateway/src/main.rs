use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result as AnyResult, bail};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use rust_decimal::Decimal;
use surety_core::{
    Amount, ErrorKind, EventEnvelope, EventStore, EventStream, FlightKey, FlightStatus, Identity,
    InsurancePolicy, LedgerError, LedgerEvent, RequestKey,
};
use surety_eventstore::InMemoryEventStore;
use surety_ledger::{
    CallContext, FlightRegistration, Genesis, HashChainEntropy, Ledger, Outcome, PayoutReport,
    RegistrationOutcome, Settlement, SubmissionOutcome,
};
use surety_platform::{
    AirlineView, AirlinesCountResponse, BuyInsuranceRequest, EntryPointRequest,
    EntryPointResponse, EventsQuery, EventsResponse, FetchFlightStatusResponse,
    FlightActionRequest, FlightView, FundAirlineRequest, FundAirlineResponse, InsureeView,
    LedgerBalanceResponse, LedgerReceipt, OperationalStatusResponse, OracleIndexesResponse,
    PayoutView, PolicyView, RedisBus, RegisterAirlineRequest, RegisterFlightRequest,
    RegisterOracleRequest, ServiceConfig, SetOperationalRequest, SettlementView,
    StatusRequestView, SubmitOracleResponseRequest, WithdrawPayoutRequest,
    WithdrawPayoutResponse,
};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{error, info, warn};

const DEFAULT_EVENTS_LIMIT: usize = 100;
const MAX_EVENTS_LIMIT: usize = 500;
const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

#[derive(Clone)]
struct AppState {
    ledger: Arc<Mutex<Ledger>>,
    events: Arc<InMemoryEventStore>,
    redis: Option<RedisBus>,
    gateway: Identity,
    admin_token: Option<Arc<str>>,
}

impl AppState {
    fn call(&self, requester: Identity) -> CallContext {
        CallContext::new(self.gateway.clone(), requester)
    }
}

#[tokio::main]
async fn main() -> AnyResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "surety_gateway=info".to_string()),
        )
        .init();

    let config = ServiceConfig::from_env("0.0.0.0:8080")?;
    let redis = match config.redis_url.as_deref() {
        Some(url) => Some(RedisBus::connect(url).await?),
        None => None,
    };

    let mut ledger = Ledger::new(
        Genesis {
            owner: config.owner.clone(),
            airline: config.genesis_airline.clone(),
            airline_name: config.genesis_airline_name.clone(),
        },
        HashChainEntropy::from_seed(&config.entropy_seed),
    );
    ledger
        .authorize_caller(&config.owner, config.gateway_identity.clone())
        .context("failed to authorize gateway entry point")?;
    info!(
        owner = %config.owner,
        genesis_airline = %config.genesis_airline,
        gateway = %config.gateway_identity,
        redis = redis.is_some(),
        admin_routes = config.admin_token.is_some(),
        "ledger initialized"
    );

    let state = AppState {
        ledger: Arc::new(Mutex::new(ledger)),
        events: Arc::new(InMemoryEventStore::new()),
        redis,
        gateway: config.gateway_identity,
        admin_token: config.admin_token.map(Arc::from),
    };

    let addr: SocketAddr = config.http_addr.parse()?;
    info!("gateway listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/operational", get(operational_status))
        .route("/admin/operational", post(set_operational))
        .route("/admin/authorize", post(authorize_entry_point))
        .route("/admin/revoke", post(revoke_entry_point))
        .route("/airlines", post(register_airline))
        .route("/airlines/fund", post(fund_airline))
        .route("/airlines/count", get(airlines_count))
        .route("/airlines/{airline}", get(airline_view))
        .route("/flights", post(register_flight))
        .route("/flights/{airline}/{flight}/{timestamp}", get(flight_view))
        .route("/insurance", post(buy_insurance))
        .route("/insurance/payout", post(payout_insurance))
        .route(
            "/insurance/{insuree}/{airline}/{flight}/{timestamp}",
            get(insurance_policy),
        )
        .route("/insurees/withdraw", post(withdraw_payout))
        .route("/insurees/{insuree}", get(insuree_view))
        .route("/oracles", post(register_oracle))
        .route("/oracles/{operator}/indexes", get(oracle_indexes))
        .route("/oracles/requests", post(fetch_flight_status))
        .route("/oracles/responses", post(submit_oracle_response))
        .route(
            "/oracles/requests/{index}/{airline}/{flight}/{timestamp}",
            get(request_state),
        )
        .route("/ledger/balance", get(ledger_balance))
        .route("/events", get(list_events))
        .route("/events/{stream}", get(list_stream_events))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn operational_status(State(state): State<AppState>) -> Json<OperationalStatusResponse> {
    let ledger = state.ledger.lock().await;
    Json(OperationalStatusResponse {
        operational: ledger.is_operational(),
    })
}

async fn set_operational(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<SetOperationalRequest>,
) -> ApiResult<OperationalStatusResponse> {
    require_admin(&state, &headers)?;
    let mut ledger = state.ledger.lock().await;
    ledger
        .set_operational(&payload.requested_by, payload.operational)
        .map_err(ledger_error)?;
    info!(operational = payload.operational, "operational flag changed");

    Ok(Json(OperationalStatusResponse {
        operational: ledger.is_operational(),
    }))
}

async fn authorize_entry_point(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<EntryPointRequest>,
) -> ApiResult<EntryPointResponse> {
    require_admin(&state, &headers)?;
    let mut ledger = state.ledger.lock().await;
    let changed = ledger
        .authorize_caller(&payload.requested_by, payload.entry_point.clone())
        .map_err(ledger_error)?;

    Ok(Json(EntryPointResponse {
        authorized: ledger.is_authorized(&payload.entry_point),
        entry_point: payload.entry_point,
        changed,
    }))
}

async fn revoke_entry_point(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<EntryPointRequest>,
) -> ApiResult<EntryPointResponse> {
    require_admin(&state, &headers)?;
    let mut ledger = state.ledger.lock().await;
    let changed = ledger
        .revoke_caller(&payload.requested_by, &payload.entry_point)
        .map_err(ledger_error)?;
    if payload.entry_point == state.gateway {
        warn!("gateway revoked its own entry point; mutating routes will be rejected");
    }

    Ok(Json(EntryPointResponse {
        authorized: ledger.is_authorized(&payload.entry_point),
        entry_point: payload.entry_point,
        changed,
    }))
}

async fn register_airline(
    State(state): State<AppState>,
    Json(payload): Json<RegisterAirlineRequest>,
) -> ApiResult<LedgerReceipt<RegistrationOutcome>> {
    let name = required_text(&payload.name, "name").map_err(invalid_request)?;

    let mut ledger = state.ledger.lock().await;
    let outcome = ledger
        .register_airline(&state.call(payload.requested_by), payload.candidate, &name)
        .map_err(ledger_error)?;
    publish(&state, ledger, &outcome.events).await?;

    Ok(Json(receipt(outcome)))
}

async fn fund_airline(
    State(state): State<AppState>,
    Json(payload): Json<FundAirlineRequest>,
) -> ApiResult<LedgerReceipt<FundAirlineResponse>> {
    let amount = parse_amount(payload.amount, "amount").map_err(invalid_request)?;

    let mut ledger = state.ledger.lock().await;
    let outcome = ledger
        .fund(&state.call(payload.requested_by.clone()), amount)
        .map_err(ledger_error)?;
    let is_funded = ledger
        .airline(&payload.requested_by)
        .is_some_and(|airline| airline.is_funded);
    publish(&state, ledger, &outcome.events).await?;

    let result = FundAirlineResponse {
        funds: display(outcome.value)?,
        is_funded,
        airline: payload.requested_by,
    };
    Ok(Json(LedgerReceipt {
        result,
        events: outcome.events,
    }))
}

async fn airlines_count(State(state): State<AppState>) -> Json<AirlinesCountResponse> {
    let ledger = state.ledger.lock().await;
    Json(AirlinesCountResponse {
        count: ledger.airlines_count(),
    })
}

async fn airline_view(
    State(state): State<AppState>,
    Path(airline): Path<Identity>,
) -> ApiResult<AirlineView> {
    let ledger = state.ledger.lock().await;
    let record = ledger.airline(&airline);

    Ok(Json(AirlineView {
        name: record.map(|record| record.name.clone()),
        is_registered: ledger.is_airline(&airline),
        is_funded: record.is_some_and(|record| record.is_funded),
        funds: display(ledger.airline_funds(&airline))?,
        pending_approvals: ledger.approvals_for(&airline),
        airline,
    }))
}

async fn register_flight(
    State(state): State<AppState>,
    Json(payload): Json<RegisterFlightRequest>,
) -> ApiResult<LedgerReceipt<FlightRegistration>> {
    let flight = required_text(&payload.flight, "flight").map_err(invalid_request)?;

    let mut ledger = state.ledger.lock().await;
    let outcome = ledger
        .register_flight(
            &state.call(payload.requested_by),
            &flight,
            payload.timestamp,
            payload.origin.trim(),
            payload.destination.trim(),
        )
        .map_err(ledger_error)?;
    publish(&state, ledger, &outcome.events).await?;

    Ok(Json(receipt(outcome)))
}

async fn flight_view(
    State(state): State<AppState>,
    Path((airline, flight, timestamp)): Path<(Identity, String, u64)>,
) -> ApiResult<FlightView> {
    let key = FlightKey::new(airline, flight, timestamp);
    let ledger = state.ledger.lock().await;
    let record = ledger.flight(&key);
    let status = ledger.flight_status(&key);

    Ok(Json(FlightView {
        is_registered: ledger.is_flight(&key),
        status,
        status_label: status.to_string(),
        is_finalized: record.is_some_and(|record| record.is_finalized),
        origin: record.map(|record| record.origin.clone()),
        destination: record.map(|record| record.destination.clone()),
        airline: key.airline,
        flight: key.flight,
        timestamp: key.timestamp,
    }))
}

async fn buy_insurance(
    State(state): State<AppState>,
    Json(payload): Json<BuyInsuranceRequest>,
) -> ApiResult<LedgerReceipt<PolicyView>> {
    let passenger_name =
        required_text(&payload.passenger_name, "passenger_name").map_err(invalid_request)?;
    let amount = parse_amount(payload.amount, "amount").map_err(invalid_request)?;
    let key = FlightKey::new(payload.airline, payload.flight, payload.timestamp);

    let mut ledger = state.ledger.lock().await;
    let outcome = ledger
        .buy_insurance(
            &state.call(payload.requested_by),
            &passenger_name,
            key,
            amount,
        )
        .map_err(ledger_error)?;
    publish(&state, ledger, &outcome.events).await?;

    Ok(Json(LedgerReceipt {
        result: policy_view(&outcome.value)?,
        events: outcome.events,
    }))
}

async fn payout_insurance(
    State(state): State<AppState>,
    Json(payload): Json<FlightActionRequest>,
) -> ApiResult<LedgerReceipt<PayoutView>> {
    let key = FlightKey::new(payload.airline, payload.flight, payload.timestamp);

    let mut ledger = state.ledger.lock().await;
    let outcome = ledger
        .payout_insurance(&state.call(payload.requested_by), &key)
        .map_err(ledger_error)?;
    publish(&state, ledger, &outcome.events).await?;

    Ok(Json(LedgerReceipt {
        result: payout_view(&outcome.value)?,
        events: outcome.events,
    }))
}

async fn insurance_policy(
    State(state): State<AppState>,
    Path((insuree, airline, flight, timestamp)): Path<(Identity, Identity, String, u64)>,
) -> ApiResult<PolicyView> {
    let key = FlightKey::new(airline, flight, timestamp);
    let ledger = state.ledger.lock().await;

    match ledger.policy(&insuree, &key) {
        Some(policy) => Ok(Json(policy_view(policy)?)),
        None => Ok(Json(PolicyView {
            insuree,
            airline: key.airline,
            flight: key.flight,
            timestamp: key.timestamp,
            is_bought: false,
            is_active: false,
            paid: Decimal::ZERO,
        })),
    }
}

async fn withdraw_payout(
    State(state): State<AppState>,
    Json(payload): Json<WithdrawPayoutRequest>,
) -> ApiResult<LedgerReceipt<WithdrawPayoutResponse>> {
    let mut ledger = state.ledger.lock().await;
    let outcome = ledger
        .withdraw_payout(&state.call(payload.requested_by.clone()))
        .map_err(ledger_error)?;
    publish(&state, ledger, &outcome.events).await?;

    Ok(Json(LedgerReceipt {
        result: WithdrawPayoutResponse {
            insuree: payload.requested_by,
            withdrawn: display(outcome.value)?,
        },
        events: outcome.events,
    }))
}

async fn insuree_view(
    State(state): State<AppState>,
    Path(insuree): Path<Identity>,
) -> ApiResult<InsureeView> {
    let ledger = state.ledger.lock().await;
    Ok(Json(InsureeView {
        is_insuree: ledger.is_insuree(&insuree),
        payout: display(ledger.insuree_payout(&insuree))?,
        insuree,
    }))
}

async fn register_oracle(
    State(state): State<AppState>,
    Json(payload): Json<RegisterOracleRequest>,
) -> ApiResult<LedgerReceipt<OracleIndexesResponse>> {
    let fee = parse_amount(payload.fee, "fee").map_err(invalid_request)?;

    let mut ledger = state.ledger.lock().await;
    let outcome = ledger
        .register_oracle(&state.call(payload.requested_by.clone()), fee)
        .map_err(ledger_error)?;
    publish(&state, ledger, &outcome.events).await?;

    Ok(Json(LedgerReceipt {
        result: OracleIndexesResponse {
            operator: payload.requested_by,
            indices: Some(outcome.value),
        },
        events: outcome.events,
    }))
}

async fn oracle_indexes(
    State(state): State<AppState>,
    Path(operator): Path<Identity>,
) -> Json<OracleIndexesResponse> {
    let ledger = state.ledger.lock().await;
    Json(OracleIndexesResponse {
        indices: ledger.my_indexes(&operator),
        operator,
    })
}

async fn fetch_flight_status(
    State(state): State<AppState>,
    Json(payload): Json<FlightActionRequest>,
) -> ApiResult<LedgerReceipt<FetchFlightStatusResponse>> {
    let key = FlightKey::new(payload.airline, payload.flight, payload.timestamp);

    let mut ledger = state.ledger.lock().await;
    let outcome = ledger
        .fetch_flight_status(&state.call(payload.requested_by), key)
        .map_err(ledger_error)?;
    publish(&state, ledger, &outcome.events).await?;

    Ok(Json(LedgerReceipt {
        result: FetchFlightStatusResponse {
            index: outcome.value,
        },
        events: outcome.events,
    }))
}

async fn submit_oracle_response(
    State(state): State<AppState>,
    Json(payload): Json<SubmitOracleResponseRequest>,
) -> ApiResult<LedgerReceipt<SubmissionOutcome>> {
    let status = FlightStatus::try_from(payload.status_code).map_err(ledger_error)?;
    let key = FlightKey::new(payload.airline, payload.flight, payload.timestamp);

    let mut ledger = state.ledger.lock().await;
    let outcome = ledger
        .submit_oracle_response(
            &state.call(payload.requested_by),
            payload.index,
            key,
            status,
        )
        .map_err(ledger_error)?;
    publish(&state, ledger, &outcome.events).await?;

    Ok(Json(receipt(outcome)))
}

async fn request_state(
    State(state): State<AppState>,
    Path((index, airline, flight, timestamp)): Path<(u8, Identity, String, u64)>,
) -> Json<StatusRequestView> {
    let key = RequestKey {
        index,
        flight: FlightKey::new(airline, flight, timestamp),
    };
    let ledger = state.ledger.lock().await;

    Json(StatusRequestView {
        state: ledger.request_state(&key),
        index,
        airline: key.flight.airline,
        flight: key.flight.flight,
        timestamp: key.flight.timestamp,
    })
}

async fn ledger_balance(State(state): State<AppState>) -> ApiResult<LedgerBalanceResponse> {
    let ledger = state.ledger.lock().await;
    let balance = ledger.ledger_balance().map_err(ledger_error)?;
    Ok(Json(LedgerBalanceResponse {
        balance: display(balance)?,
    }))
}

async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> ApiResult<EventsResponse> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_EVENTS_LIMIT)
        .clamp(1, MAX_EVENTS_LIMIT);
    let items = state
        .events
        .since(query.after.unwrap_or_default(), limit)
        .await
        .map_err(internal_error)?;
    let latest_sequence = state
        .events
        .latest_sequence()
        .await
        .map_err(internal_error)?;

    Ok(Json(EventsResponse {
        items,
        latest_sequence,
    }))
}

async fn list_stream_events(
    State(state): State<AppState>,
    Path(stream): Path<EventStream>,
) -> ApiResult<EventsResponse> {
    let items = state.events.stream(stream).await.map_err(internal_error)?;
    let latest_sequence = state
        .events
        .latest_sequence()
        .await
        .map_err(internal_error)?;

    Ok(Json(EventsResponse {
        items,
        latest_sequence,
    }))
}

/// Stores events in emission order while the ledger guard is held, so store
/// sequences follow the ledger journal. The guard is released before the
/// envelopes go out to redis; subscribers order them by `sequence`.
async fn publish(
    state: &AppState,
    ledger: MutexGuard<'_, Ledger>,
    events: &[LedgerEvent],
) -> Result<(), (StatusCode, String)> {
    let mut envelopes: Vec<EventEnvelope> = Vec::with_capacity(events.len());
    for event in events {
        let envelope = state
            .events
            .append(event.clone())
            .await
            .map_err(internal_error)?;
        envelopes.push(envelope);
    }
    drop(ledger);

    if let Some(redis) = &state.redis {
        for envelope in &envelopes {
            if let Err(err) = redis.publish_event(envelope).await {
                error!(
                    "failed to publish {} event {}: {err}",
                    envelope.event.name(),
                    envelope.sequence
                );
            }
        }
    }

    Ok(())
}

fn receipt<T>(outcome: Outcome<T>) -> LedgerReceipt<T> {
    LedgerReceipt {
        result: outcome.value,
        events: outcome.events,
    }
}

fn policy_view(policy: &InsurancePolicy) -> Result<PolicyView, (StatusCode, String)> {
    Ok(PolicyView {
        insuree: policy.key.insuree.clone(),
        airline: policy.key.flight.airline.clone(),
        flight: policy.key.flight.flight.clone(),
        timestamp: policy.key.flight.timestamp,
        is_bought: true,
        is_active: policy.is_active,
        paid: display(policy.paid)?,
    })
}

fn payout_view(report: &PayoutReport) -> Result<PayoutView, (StatusCode, String)> {
    Ok(PayoutView {
        settled: report
            .settled
            .iter()
            .map(settlement_view)
            .collect::<Result<_, _>>()?,
        skipped: report
            .skipped
            .iter()
            .map(settlement_view)
            .collect::<Result<_, _>>()?,
    })
}

fn settlement_view(settlement: &Settlement) -> Result<SettlementView, (StatusCode, String)> {
    Ok(SettlementView {
        insuree: settlement.insuree.clone(),
        paid: display(settlement.paid)?,
        credited: display(settlement.credited)?,
    })
}

fn required_text(value: &str, field_name: &str) -> AnyResult<String> {
    let value = value.trim();
    if value.is_empty() {
        bail!("{field_name} is required");
    }
    Ok(value.to_string())
}

fn parse_amount(value: Decimal, field_name: &str) -> AnyResult<Amount> {
    match Amount::from_display(value) {
        Some(amount) => Ok(amount),
        None => bail!("{field_name} must be a non-negative amount with at most 18 decimal places"),
    }
}

fn display(amount: Amount) -> Result<Decimal, (StatusCode, String)> {
    amount
        .to_display()
        .ok_or_else(|| internal_error(format!("amount {amount} exceeds display precision")))
}

/// `requested_by` on admin routes is only trusted once the caller has shown
/// the operator token; the ledger then still checks it against the owner.
fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Err((
            StatusCode::FORBIDDEN,
            "admin routes are disabled".to_string(),
        ));
    };
    let presented = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());
    if presented != Some(expected) {
        warn!("admin route called without a valid {ADMIN_TOKEN_HEADER}");
        return Err((
            StatusCode::UNAUTHORIZED,
            "missing or invalid admin token".to_string(),
        ));
    }
    Ok(())
}

fn ledger_error(err: LedgerError) -> (StatusCode, String) {
    let status = match err.kind() {
        ErrorKind::Access => StatusCode::FORBIDDEN,
        ErrorKind::State => StatusCode::CONFLICT,
        ErrorKind::Value => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (status, err.to_string())
}

fn invalid_request(err: anyhow::Error) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, err.to_string())
}

fn internal_error<E: std::fmt::Display>(err: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> Identity {
        Identity::parse(raw).unwrap()
    }

    fn test_state() -> AppState {
        let mut ledger = Ledger::new(
            Genesis {
                owner: id("owner"),
                airline: id("first"),
                airline_name: "First Airline".to_string(),
            },
            HashChainEntropy::from_seed("gateway-tests"),
        );
        ledger.authorize_caller(&id("owner"), id("gateway")).unwrap();

        AppState {
            ledger: Arc::new(Mutex::new(ledger)),
            events: Arc::new(InMemoryEventStore::new()),
            redis: None,
            gateway: id("gateway"),
            admin_token: Some(Arc::from("admin-secret")),
        }
    }

    fn admin_headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ADMIN_TOKEN_HEADER, token.parse().unwrap());
        headers
    }

    async fn fund(
        state: &AppState,
        airline: &str,
        amount: Decimal,
    ) -> ApiResult<LedgerReceipt<FundAirlineResponse>> {
        fund_airline(
            State(state.clone()),
            Json(FundAirlineRequest {
                amount,
                requested_by: id(airline),
            }),
        )
        .await
    }

    async fn register_nd1309(state: &AppState) {
        let Json(registered) = register_flight(
            State(state.clone()),
            Json(RegisterFlightRequest {
                flight: "ND1309".to_string(),
                timestamp: 1_700_000_000,
                origin: "Singapore".to_string(),
                destination: "Hong Kong".to_string(),
                requested_by: id("first"),
            }),
        )
        .await
        .unwrap();
        assert_eq!(registered.result, FlightRegistration::Registered);
    }

    fn insurance_request(amount: Decimal) -> BuyInsuranceRequest {
        BuyInsuranceRequest {
            passenger_name: "Ada".to_string(),
            airline: id("first"),
            flight: "ND1309".to_string(),
            timestamp: 1_700_000_000,
            amount,
            requested_by: id("passenger"),
        }
    }

    #[test]
    fn ledger_errors_map_by_kind() {
        assert_eq!(
            ledger_error(LedgerError::NotOwner(id("x"))).0,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ledger_error(LedgerError::NothingToWithdraw(id("x"))).0,
            StatusCode::CONFLICT
        );
        assert_eq!(
            ledger_error(LedgerError::InvalidAmount).0,
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn amounts_outside_precision_are_bad_requests() {
        assert!(parse_amount(Decimal::new(1, 19), "amount").is_err());
        assert!(parse_amount(Decimal::new(-1, 0), "amount").is_err());
        assert_eq!(
            parse_amount(Decimal::new(15, 1), "amount").unwrap(),
            Amount::from_elementary(1_500_000_000_000_000_000)
        );
    }

    #[tokio::test]
    async fn funding_updates_view_and_event_log() {
        let state = test_state();
        let Json(funded) = fund(&state, "first", Decimal::new(10, 0)).await.unwrap();
        assert_eq!(funded.result.funds, Decimal::new(10, 0));
        assert!(funded.result.is_funded);
        assert_eq!(funded.events.len(), 1);

        let Json(view) = airline_view(State(state.clone()), Path(id("first")))
            .await
            .unwrap();
        assert!(view.is_registered);
        assert_eq!(view.name.as_deref(), Some("First Airline"));
        assert_eq!(view.funds, Decimal::new(10, 0));

        assert_eq!(state.events.latest_sequence().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn funding_beyond_displayable_custody_leaves_views_readable() {
        let state = test_state();
        let whale = Decimal::new(79_000_000_000, 0);
        assert!(fund(&state, "first", whale).await.is_ok());

        let err = fund(&state, "first", whale).await.unwrap_err();
        assert_eq!(err.0, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(state.events.latest_sequence().await.unwrap(), 1);

        let Json(view) = airline_view(State(state.clone()), Path(id("first")))
            .await
            .unwrap();
        assert_eq!(view.funds, whale);
        let Json(balance) = ledger_balance(State(state.clone())).await.unwrap();
        assert_eq!(balance.balance, whale);
    }

    #[tokio::test]
    async fn publishing_releases_the_ledger_before_fan_out() {
        let state = test_state();
        let mut ledger = state.ledger.lock().await;
        let outcome = ledger
            .fund(&state.call(id("first")), Amount::from_elementary(1))
            .unwrap();
        publish(&state, ledger, &outcome.events).await.unwrap();

        assert!(state.ledger.try_lock().is_ok());
        assert_eq!(state.events.latest_sequence().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn insurance_above_cap_is_unprocessable() {
        let state = test_state();
        assert!(fund(&state, "first", Decimal::new(10, 0)).await.is_ok());
        register_nd1309(&state).await;

        let err = buy_insurance(
            State(state.clone()),
            Json(insurance_request(Decimal::new(2, 0))),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::UNPROCESSABLE_ENTITY);

        let Json(policy) = insurance_policy(
            State(state.clone()),
            Path((id("passenger"), id("first"), "ND1309".to_string(), 1_700_000_000)),
        )
        .await
        .unwrap();
        assert!(!policy.is_bought);
        assert_eq!(state.events.latest_sequence().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn suspended_ledger_rejects_mutations_with_forbidden() {
        let state = test_state();
        let Json(status) = set_operational(
            State(state.clone()),
            admin_headers("admin-secret"),
            Json(SetOperationalRequest {
                operational: false,
                requested_by: id("owner"),
            }),
        )
        .await
        .unwrap();
        assert!(!status.operational);

        let err = fund(&state, "first", Decimal::new(10, 0)).await.unwrap_err();
        assert_eq!(err.0, StatusCode::FORBIDDEN);

        let Json(status) = operational_status(State(state.clone())).await;
        assert!(!status.operational);
    }

    #[tokio::test]
    async fn non_owner_cannot_authorize() {
        let state = test_state();
        let err = authorize_entry_point(
            State(state.clone()),
            admin_headers("admin-secret"),
            Json(EntryPointRequest {
                entry_point: id("other-app"),
                requested_by: id("first"),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn admin_routes_require_the_operator_token() {
        let state = test_state();
        let request = || {
            Json(EntryPointRequest {
                entry_point: id("rogue-app"),
                requested_by: id("owner"),
            })
        };

        let err = authorize_entry_point(State(state.clone()), HeaderMap::new(), request())
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::UNAUTHORIZED);

        let err = authorize_entry_point(State(state.clone()), admin_headers("guess"), request())
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::UNAUTHORIZED);

        let err = revoke_entry_point(State(state.clone()), HeaderMap::new(), request())
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::UNAUTHORIZED);

        assert!(!state.ledger.lock().await.is_authorized(&id("rogue-app")));
        assert!(state.ledger.lock().await.is_authorized(&id("gateway")));

        let disabled = AppState {
            admin_token: None,
            ..state.clone()
        };
        let err = set_operational(
            State(disabled),
            admin_headers("admin-secret"),
            Json(SetOperationalRequest {
                operational: false,
                requested_by: id("owner"),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::FORBIDDEN);
        assert!(state.ledger.lock().await.is_operational());

        let Json(authorized) =
            authorize_entry_point(State(state.clone()), admin_headers("admin-secret"), request())
                .await
                .unwrap();
        assert!(authorized.authorized);
        assert!(authorized.changed);
    }

    #[tokio::test]
    async fn unknown_status_code_is_rejected() {
        let state = test_state();
        let err = submit_oracle_response(
            State(state.clone()),
            Json(SubmitOracleResponseRequest {
                index: 0,
                airline: id("first"),
                flight: "ND1309".to_string(),
                timestamp: 1_700_000_000,
                status_code: 7,
                requested_by: id("oracle"),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn events_are_paged_by_sequence() {
        let state = test_state();
        assert!(fund(&state, "first", Decimal::new(10, 0)).await.is_ok());
        register_nd1309(&state).await;
        let Json(bought) = buy_insurance(
            State(state.clone()),
            Json(insurance_request(Decimal::new(1, 0))),
        )
        .await
        .unwrap();
        assert!(bought.result.is_active);

        let Json(page) = list_events(
            State(state.clone()),
            Query(EventsQuery {
                after: Some(1),
                limit: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(page.latest_sequence, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].sequence, 2);
        assert_eq!(page.items[1].event.name(), "InsuranceBought");

        let Json(insurance) =
            list_stream_events(State(state.clone()), Path(EventStream::Insurance))
                .await
                .unwrap();
        assert_eq!(insurance.items.len(), 1);

        let Json(balance) = ledger_balance(State(state.clone())).await.unwrap();
        assert_eq!(balance.balance, Decimal::new(11, 0));
    }

    #[tokio::test]
    async fn blank_airline_name_is_a_bad_request() {
        let state = test_state();
        let err = register_airline(
            State(state.clone()),
            Json(RegisterAirlineRequest {
                candidate: id("second"),
                name: "  ".to_string(),
                requested_by: id("first"),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);

        let Json(count) = airlines_count(State(state.clone())).await;
        assert_eq!(count.count, 1);
    }
}

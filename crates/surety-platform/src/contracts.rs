use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use surety_core::{EventEnvelope, FlightStatus, Identity, LedgerEvent, RequestState};

// Amounts on the wire are display units as decimal strings; the ledger
// stores elementary units.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerReceipt<T> {
    pub result: T,
    pub events: Vec<LedgerEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetOperationalRequest {
    pub operational: bool,
    pub requested_by: Identity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryPointRequest {
    pub entry_point: Identity,
    pub requested_by: Identity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationalStatusResponse {
    pub operational: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryPointResponse {
    pub entry_point: Identity,
    pub authorized: bool,
    pub changed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterAirlineRequest {
    pub candidate: Identity,
    pub name: String,
    pub requested_by: Identity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundAirlineRequest {
    pub amount: Decimal,
    pub requested_by: Identity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundAirlineResponse {
    pub airline: Identity,
    pub funds: Decimal,
    pub is_funded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirlineView {
    pub airline: Identity,
    pub name: Option<String>,
    pub is_registered: bool,
    pub is_funded: bool,
    pub funds: Decimal,
    pub pending_approvals: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirlinesCountResponse {
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterFlightRequest {
    pub flight: String,
    pub timestamp: u64,
    pub origin: String,
    pub destination: String,
    pub requested_by: Identity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightView {
    pub airline: Identity,
    pub flight: String,
    pub timestamp: u64,
    pub is_registered: bool,
    pub status: FlightStatus,
    pub status_label: String,
    pub is_finalized: bool,
    pub origin: Option<String>,
    pub destination: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyInsuranceRequest {
    pub passenger_name: String,
    pub airline: Identity,
    pub flight: String,
    pub timestamp: u64,
    pub amount: Decimal,
    pub requested_by: Identity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyView {
    pub insuree: Identity,
    pub airline: Identity,
    pub flight: String,
    pub timestamp: u64,
    pub is_bought: bool,
    pub is_active: bool,
    pub paid: Decimal,
}

/// Identifies a flight for operations acting on one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightActionRequest {
    pub airline: Identity,
    pub flight: String,
    pub timestamp: u64,
    pub requested_by: Identity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementView {
    pub insuree: Identity,
    pub paid: Decimal,
    pub credited: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutView {
    pub settled: Vec<SettlementView>,
    pub skipped: Vec<SettlementView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawPayoutRequest {
    pub requested_by: Identity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawPayoutResponse {
    pub insuree: Identity,
    pub withdrawn: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsureeView {
    pub insuree: Identity,
    pub is_insuree: bool,
    pub payout: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterOracleRequest {
    pub fee: Decimal,
    pub requested_by: Identity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleIndexesResponse {
    pub operator: Identity,
    pub indices: Option<[u8; 3]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchFlightStatusResponse {
    pub index: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitOracleResponseRequest {
    pub index: u8,
    pub airline: Identity,
    pub flight: String,
    pub timestamp: u64,
    pub status_code: u8,
    pub requested_by: Identity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRequestView {
    pub index: u8,
    pub airline: Identity,
    pub flight: String,
    pub timestamp: u64,
    #[serde(flatten)]
    pub state: RequestState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerBalanceResponse {
    pub balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsQuery {
    pub after: Option<u64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsResponse {
    pub items: Vec<EventEnvelope>,
    pub latest_sequence: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_accept_decimal_strings() {
        let request: FundAirlineRequest = serde_json::from_str(
            r#"{"amount":"10.5","requested_by":"0xFirst"}"#,
        )
        .unwrap();
        assert_eq!(request.amount, Decimal::new(105, 1));
        assert_eq!(request.requested_by.as_str(), "0xfirst");
    }

    #[test]
    fn blank_identity_is_rejected() {
        let result = serde_json::from_str::<WithdrawPayoutRequest>(r#"{"requested_by":" "}"#);
        assert!(result.is_err());
    }

    #[test]
    fn request_state_flattens_into_view() {
        let view = StatusRequestView {
            index: 3,
            airline: Identity::parse("first").unwrap(),
            flight: "ND1309".to_string(),
            timestamp: 1,
            state: RequestState::Finalized(FlightStatus::LateAirline),
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["state"], "FINALIZED");
        assert_eq!(json["status"], 20);
    }
}

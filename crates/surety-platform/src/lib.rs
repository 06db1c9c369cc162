pub mod config;
pub mod contracts;
pub mod redis_bus;

pub use config::ServiceConfig;
pub use contracts::{
    AirlineView, AirlinesCountResponse, BuyInsuranceRequest, EntryPointRequest,
    EntryPointResponse, EventsQuery, EventsResponse, FetchFlightStatusResponse,
    FlightActionRequest, FlightView, FundAirlineRequest, FundAirlineResponse, InsureeView,
    LedgerBalanceResponse, LedgerReceipt, OperationalStatusResponse, OracleIndexesResponse,
    PayoutView, PolicyView, RegisterAirlineRequest, RegisterFlightRequest,
    RegisterOracleRequest, SetOperationalRequest, SettlementView, StatusRequestView,
    SubmitOracleResponseRequest, WithdrawPayoutRequest, WithdrawPayoutResponse,
};
pub use redis_bus::{EVENTS_CHANNEL, RedisBus};

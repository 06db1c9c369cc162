use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use serde::{Deserialize, Serialize};

use crate::{Amount, Identity, LedgerError};

/// Flight status as reported by the oracle quorum. Discriminants are the wire codes.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum FlightStatus {
    #[default]
    Unknown = 0,
    OnTime = 10,
    LateAirline = 20,
    LateWeather = 30,
    LateTechnical = 40,
    LateOther = 50,
}

impl FlightStatus {
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Unknown),
            10 => Some(Self::OnTime),
            20 => Some(Self::LateAirline),
            30 => Some(Self::LateWeather),
            40 => Some(Self::LateTechnical),
            50 => Some(Self::LateOther),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::OnTime => "ON_TIME",
            Self::LateAirline => "LATE_AIRLINE",
            Self::LateWeather => "LATE_WEATHER",
            Self::LateTechnical => "LATE_TECHNICAL",
            Self::LateOther => "LATE_OTHER",
        }
    }
}

impl TryFrom<u8> for FlightStatus {
    type Error = LedgerError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(LedgerError::InvalidStatusCode(code))
    }
}

impl From<FlightStatus> for u8 {
    fn from(status: FlightStatus) -> Self {
        status.code()
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Airline {
    pub identity: Identity,
    pub name: String,
    pub is_registered: bool,
    pub is_funded: bool,
    pub funds: Amount,
}

impl Airline {
    pub fn registered(identity: Identity, name: impl Into<String>) -> Self {
        Self {
            identity,
            name: name.into(),
            is_registered: true,
            is_funded: false,
            funds: Amount::ZERO,
        }
    }
}

/// Pending vote to admit a candidate airline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistrationBallot {
    pub candidate: Identity,
    pub candidate_name: String,
    pub voters: BTreeSet<Identity>,
}

impl RegistrationBallot {
    pub fn new(candidate: Identity, candidate_name: impl Into<String>) -> Self {
        Self {
            candidate,
            candidate_name: candidate_name.into(),
            voters: BTreeSet::new(),
        }
    }

    /// Records an approval; `false` when the voter had already approved.
    pub fn approve(&mut self, voter: Identity) -> bool {
        self.voters.insert(voter)
    }

    pub fn approvals(&self) -> usize {
        self.voters.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlightKey {
    pub airline: Identity,
    pub flight: String,
    pub timestamp: u64,
}

impl FlightKey {
    pub fn new(airline: Identity, flight: impl Into<String>, timestamp: u64) -> Self {
        Self {
            airline,
            flight: flight.into(),
            timestamp,
        }
    }
}

impl fmt::Display for FlightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.airline, self.flight, self.timestamp)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flight {
    pub key: FlightKey,
    pub origin: String,
    pub destination: String,
    pub status: FlightStatus,
    pub is_finalized: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PolicyKey {
    pub insuree: Identity,
    pub flight: FlightKey,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InsurancePolicy {
    pub key: PolicyKey,
    pub paid: Amount,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InsureeAccount {
    pub identity: Identity,
    pub name: String,
    pub credit: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Oracle {
    pub operator: Identity,
    pub indices: [u8; 3],
}

impl Oracle {
    pub fn holds(&self, index: u8) -> bool {
        self.indices.contains(&index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestKey {
    pub index: u8,
    pub flight: FlightKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestState {
    NoRequest,
    AwaitingResponses,
    Finalized(FlightStatus),
}

/// Oracle responses collected for one request key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusRequest {
    pub key: RequestKey,
    pub requester: Identity,
    pub responses: BTreeMap<FlightStatus, u32>,
    pub responders: BTreeSet<Identity>,
    pub state: RequestState,
}

impl StatusRequest {
    pub fn open(key: RequestKey, requester: Identity) -> Self {
        Self {
            key,
            requester,
            responses: BTreeMap::new(),
            responders: BTreeSet::new(),
            state: RequestState::AwaitingResponses,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state == RequestState::AwaitingResponses
    }

    pub fn count(&self, status: FlightStatus) -> u32 {
        self.responses.get(&status).copied().unwrap_or_default()
    }
}

use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MarketError>;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("admin token missing or invalid")]
    Unauthenticated,
    #[error("profile {0} is not a party to this operation")]
    Unauthorized(u32),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u32 },
    #[error("amount must be a positive value")]
    InvalidAmount,
    #[error("insufficient balance on profile {profile}")]
    InsufficientBalance { profile: u32 },
    #[error("job {0} is already paid")]
    AlreadyPaid(u32),
    #[error("deposit of {amount} is not below 25% of the outstanding jobs total {outstanding}")]
    DepositCapExceeded { amount: Decimal, outstanding: Decimal },
    #[error("transient store failure: {0}")]
    TransientStore(String),
    #[error("{0}")]
    Validation(String),
    #[error("not enough data")]
    NoData,
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl MarketError {
    /// Suggested HTTP status for service layers that bind these results to a
    /// REST surface. An already-paid job is reported as not-found so callers
    /// cannot probe payment state of jobs they do not own.
    pub fn status_hint(&self) -> u16 {
        match self {
            Self::Unauthenticated => 401,
            Self::Unauthorized(_) => 403,
            Self::NotFound { .. } | Self::AlreadyPaid(_) => 404,
            Self::InvalidAmount
            | Self::InsufficientBalance { .. }
            | Self::DepositCapExceeded { .. }
            | Self::Validation(_)
            | Self::NoData => 406,
            Self::TransientStore(_) | Self::Csv(_) | Self::Io(_) | Self::Serde(_) => 500,
        }
    }
}

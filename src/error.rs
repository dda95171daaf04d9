use chrono::NaiveDate;

#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("no contracts found for {symbol}")]
    NoContracts { symbol: String },

    #[error("broker is not connected")]
    NotConnected,

    #[error("no price data for {contract} up to {end}")]
    NoPriceData { contract: String, end: NaiveDate },

    #[error("contract index {index} out of range ({available} eligible contracts)")]
    ContractIndexOutOfRange { index: usize, available: usize },

    #[error("position in {contract} is {actual} after trading, expected {expected}")]
    PositionMismatch {
        contract: String,
        expected: f64,
        actual: f64,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("config parse error: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Broker(#[from] anyhow::Error),
}

pub type Result<T, E = BotError> = std::result::Result<T, E>;

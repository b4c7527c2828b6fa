use {
    super::error::PipelineError,
    rust_decimal::Decimal,
    serde::{Deserialize, Serialize},
    std::{fmt, str::FromStr},
};

/// Requested top-up sum. Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, PipelineError> {
        if value <= Decimal::ZERO {
            return Err(PipelineError::Validation(format!(
                "amount must be positive, got: {value}"
            )));
        }
        Ok(Self(value))
    }

    /// Parse user-typed input such as `"100.50"`. A comma decimal separator is accepted.
    pub fn parse(input: &str) -> Result<Self, PipelineError> {
        let normalized = input.trim().replace(',', ".");
        let value = Decimal::from_str(&normalized)
            .map_err(|_| PipelineError::Validation(format!("not a number: {input}")))?;
        Self::new(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PipelineError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Decimal {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

/// Internal user balance. Never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Balance(Decimal);

impl Balance {
    pub const ZERO: Balance = Balance(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self, PipelineError> {
        if value < Decimal::ZERO {
            return Err(PipelineError::Validation(format!(
                "balance cannot be negative, got: {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn checked_add(self, amount: Amount) -> Option<Balance> {
        self.0.checked_add(amount.0).map(Balance)
    }
}

impl TryFrom<Decimal> for Balance {
    type Error = PipelineError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Balance> for Decimal {
    fn from(balance: Balance) -> Decimal {
        balance.0
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Asset {
    Ton,
    Btc,
    Eth,
    Usdt,
    Usdc,
}

impl Asset {
    pub const SUPPORTED: [Asset; 5] = [Self::Ton, Self::Btc, Self::Eth, Self::Usdt, Self::Usdc];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ton => "TON",
            Self::Btc => "BTC",
            Self::Eth => "ETH",
            Self::Usdt => "USDT",
            Self::Usdc => "USDC",
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for Asset {
    type Error = PipelineError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "TON" => Ok(Self::Ton),
            "BTC" => Ok(Self::Btc),
            "ETH" => Ok(Self::Eth),
            "USDT" => Ok(Self::Usdt),
            "USDC" => Ok(Self::Usdc),
            other => Err(PipelineError::Validation(format!(
                "unsupported asset: {other}"
            ))),
        }
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Exchange(pub String);

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Symbol(pub String);

/// Broker-assigned contract identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContractId(pub i64);

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

/// Base instrument descriptor handed to the broker's contract-detail lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractTemplate {
    pub symbol: Symbol,
    pub exchange: Exchange,
    pub currency: String,
    pub include_expired: bool,
}

impl ContractTemplate {
    pub fn future(symbol: &str, exchange: &str) -> Self {
        Self {
            symbol: Symbol(symbol.to_string()),
            exchange: Exchange(exchange.to_string()),
            currency: "USD".to_string(),
            include_expired: false,
        }
    }
}

impl Default for ContractTemplate {
    fn default() -> Self {
        Self::future("CL", "NYMEX")
    }
}

/// A tradeable futures contract as resolved by the broker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub con_id: ContractId,
    pub symbol: Symbol,
    pub exchange: Exchange,
    /// Exchange-local code, e.g. `CLZ6`.
    pub local_symbol: String,
    /// Last trade date.
    pub expiry: NaiveDate,
    pub multiplier: f64,
}

impl Contract {
    /// Same instrument and same expiry. Broker position lists are matched this way.
    pub fn same_listing(&self, other: &Contract) -> bool {
        self.symbol == other.symbol && self.expiry == other.expiry
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarSize {
    OneHour,
    OneDay,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WhatToShow {
    Trades,
    Midpoint,
    Settlement,
}

/// Historical bar. A non-finite `close` marks a missing value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub contract: Contract,
    /// Signed: positive long, negative short.
    pub quantity: f64,
    pub avg_cost: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn sign(self) -> f64 {
        match self {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        }
    }

    /// Side that moves a position by `delta` contracts.
    pub fn for_delta(delta: f64) -> Option<Self> {
        if delta > 0.0 {
            Some(Side::Buy)
        } else if delta < 0.0 {
            Some(Side::Sell)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimeInForce {
    Day,
    Ioc,
    Gtc,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderParams {
    pub contract: Contract,
    pub side: Side,
    pub order_type: OrderType,
    pub tif: TimeInForce,
    pub qty_contracts: f64,
    pub limit_price: Option<f64>,
}

impl OrderParams {
    pub fn market(contract: Contract, side: Side, qty_contracts: f64, tif: TimeInForce) -> Self {
        Self {
            contract,
            side,
            order_type: OrderType::Market,
            tif,
            qty_contracts,
            limit_price: None,
        }
    }

    /// Signed change in position if the order fills completely.
    pub fn signed_qty(&self) -> f64 {
        self.side.sign() * self.qty_contracts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_for_delta_follows_sign() {
        assert_eq!(Side::for_delta(2.0), Some(Side::Buy));
        assert_eq!(Side::for_delta(-1.0), Some(Side::Sell));
        assert_eq!(Side::for_delta(0.0), None);
    }

    #[test]
    fn same_listing_ignores_con_id() {
        let expiry = NaiveDate::from_ymd_opt(2026, 12, 18).unwrap();
        let a = Contract {
            con_id: ContractId(1),
            symbol: Symbol("CL".into()),
            exchange: Exchange("NYMEX".into()),
            local_symbol: "CLZ6".into(),
            expiry,
            multiplier: 1000.0,
        };
        let mut b = a.clone();
        b.con_id = ContractId(2);
        assert!(a.same_listing(&b));

        b.expiry = expiry.succ_opt().unwrap();
        assert!(!a.same_listing(&b));
    }
}

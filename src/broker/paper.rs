use crate::broker::Broker;
use crate::types::*;
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// How the paper account reacts to an order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FillModel {
    /// Fill the whole quantity immediately.
    Full,
    /// Fill this fraction of the quantity (rounded to whole contracts).
    Partial(f64),
    /// Refuse every order.
    Reject,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PaperFill {
    pub order_id: OrderId,
    pub params: OrderParams,
    pub filled_contracts: f64,
    pub price: Option<f64>,
}

#[derive(Default)]
struct PaperState {
    contracts: Vec<Contract>,
    bars: BTreeMap<ContractId, Vec<Bar>>,
    positions: BTreeMap<ContractId, Position>,
    fills: Vec<PaperFill>,
    next_order: u64,
}

/// In-memory broker account.
///
/// Contract lookup matches on symbol and exchange only; every listed contract is
/// returned and expiry filtering is left to the caller. Market orders fill at
/// the contract's most recent close according to the configured [`FillModel`].
pub struct PaperBroker {
    connected: AtomicBool,
    fill_model: Mutex<FillModel>,
    state: Mutex<PaperState>,
}

impl Default for PaperBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl PaperBroker {
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            fill_model: Mutex::new(FillModel::Full),
            state: Mutex::new(PaperState::default()),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn set_fill_model(&self, model: FillModel) {
        *self.fill_model.lock() = model;
    }

    /// Lists a contract with its bar history.
    pub fn add_contract(&self, contract: Contract, bars: Vec<Bar>) {
        let mut state = self.state.lock();
        state.bars.insert(contract.con_id, bars);
        state.contracts.push(contract);
    }

    pub fn set_position(&self, contract: Contract, quantity: f64) {
        let mut state = self.state.lock();
        state.positions.insert(
            contract.con_id,
            Position {
                contract,
                quantity,
                avg_cost: 0.0,
            },
        );
    }

    pub fn fills(&self) -> Vec<PaperFill> {
        self.state.lock().fills.clone()
    }

    /// A quarterly (Mar/Jun/Sep/Dec) contract strip with random-walk daily
    /// bars, deterministic for a given seed.
    ///
    /// Each contract's close is the shared spot path plus a carry of
    /// `contango_per_month` for every month left to its expiry.
    pub fn synthetic_strip(template: &ContractTemplate, shape: &SyntheticStrip, seed: u64) -> Self {
        let broker = Self::new();
        let mut rng = StdRng::seed_from_u64(seed);

        let mut spot = Vec::new();
        let mut price = shape.start_price;
        let mut day = shape.history_start;
        while day <= shape.history_end {
            if is_weekday(day) {
                price *= 1.0 + rng.gen_range(-shape.daily_vol..=shape.daily_vol);
                price = price.max(0.01);
                spot.push((day, price));
            }
            day += Duration::days(1);
        }

        let mut con_id = 1_000;
        let mut year = shape.history_start.year();
        let mut contracts_listed = 0;
        while contracts_listed < shape.contracts {
            for month in [3u32, 6, 9, 12] {
                if contracts_listed >= shape.contracts {
                    break;
                }
                let Some(expiry) = third_friday(year, month) else {
                    continue;
                };
                if expiry < shape.history_start {
                    continue;
                }
                con_id += 1;
                contracts_listed += 1;
                let contract = Contract {
                    con_id: ContractId(con_id),
                    symbol: template.symbol.clone(),
                    exchange: template.exchange.clone(),
                    local_symbol: format!("{}{}{}", template.symbol.0, month_code(month), year % 10),
                    expiry,
                    multiplier: shape.multiplier,
                };
                let bars = spot
                    .iter()
                    .filter(|(d, _)| *d <= expiry)
                    .map(|(d, s)| {
                        let months_out = (expiry - *d).num_days() as f64 / 30.0;
                        let close = s + shape.contango_per_month * months_out;
                        Bar {
                            date: *d,
                            open: close,
                            high: close,
                            low: close,
                            close,
                            volume: rng.gen_range(1_000.0..50_000.0),
                        }
                    })
                    .collect();
                broker.add_contract(contract, bars);
            }
            year += 1;
        }
        broker
    }

    fn fill_quantity(model: FillModel, qty: f64) -> anyhow::Result<f64> {
        match model {
            FillModel::Full => Ok(qty),
            FillModel::Partial(ratio) => Ok((qty * ratio.clamp(0.0, 1.0)).round()),
            FillModel::Reject => Err(anyhow!("order rejected by paper account")),
        }
    }
}

/// Shape of the generated paper market.
#[derive(Clone, Debug, PartialEq)]
pub struct SyntheticStrip {
    pub history_start: NaiveDate,
    pub history_end: NaiveDate,
    pub contracts: usize,
    pub start_price: f64,
    pub daily_vol: f64,
    pub contango_per_month: f64,
    pub multiplier: f64,
}

impl SyntheticStrip {
    /// Day the generated price path starts from unless a request reaches further back.
    pub fn epoch() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or(NaiveDate::MIN)
    }

    /// A strip whose history serves evaluations on `[first, last]` with the
    /// given lookback, roll index and expiry buffer.
    ///
    /// The path always starts at [`SyntheticStrip::epoch`] (or earlier when the
    /// lookback needs it), so a seed yields the same prices for a date whatever
    /// range was requested.
    pub fn covering(first: NaiveDate, last: NaiveDate, lookback_days: u32, nth_contract: usize, min_days_to_expiry: u32) -> Self {
        let needed = first
            .checked_sub_signed(Duration::days(i64::from(lookback_days) + 10))
            .unwrap_or(NaiveDate::MIN);
        let history_start = needed.min(Self::epoch());
        let span_days = (last - history_start).num_days().max(0) + i64::from(min_days_to_expiry);
        Self {
            history_start,
            history_end: last,
            contracts: (span_days / 90) as usize + nth_contract + 3,
            start_price: 70.0,
            daily_vol: 0.02,
            contango_per_month: 0.25,
            multiplier: 1000.0,
        }
    }
}

#[async_trait]
impl Broker for PaperBroker {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn contract_details(&self, template: &ContractTemplate) -> anyhow::Result<Vec<Contract>> {
        let state = self.state.lock();
        Ok(state
            .contracts
            .iter()
            .filter(|c| c.symbol == template.symbol && c.exchange == template.exchange)
            .cloned()
            .collect())
    }

    async fn historical_bars(
        &self,
        contract: &Contract,
        end: NaiveDate,
        duration_days: u32,
        bar_size: BarSize,
        _what_to_show: WhatToShow,
        _use_rth: bool,
    ) -> anyhow::Result<Vec<Bar>> {
        if bar_size != BarSize::OneDay {
            return Err(anyhow!("paper account only serves daily bars"));
        }
        let start = end
            .checked_sub_signed(Duration::days(i64::from(duration_days)))
            .unwrap_or(NaiveDate::MIN);
        let state = self.state.lock();
        let bars = state
            .bars
            .get(&contract.con_id)
            .ok_or_else(|| anyhow!("unknown contract {}", contract.local_symbol))?;
        Ok(bars
            .iter()
            .filter(|b| b.date > start && b.date <= end)
            .cloned()
            .collect())
    }

    async fn positions(&self) -> anyhow::Result<Vec<Position>> {
        Ok(self
            .state
            .lock()
            .positions
            .values()
            .filter(|p| p.quantity != 0.0)
            .cloned()
            .collect())
    }

    async fn place_order(&self, params: OrderParams) -> anyhow::Result<OrderId> {
        if !self.is_connected() {
            return Err(anyhow!("paper account disconnected"));
        }
        if params.order_type != OrderType::Market {
            return Err(anyhow!("paper account only accepts market orders"));
        }
        let model = *self.fill_model.lock();
        let filled = Self::fill_quantity(model, params.qty_contracts)?;

        let mut state = self.state.lock();
        state.next_order += 1;
        let order_id = OrderId(format!("paper:{}:{}", state.next_order, rand::thread_rng().gen::<u32>()));

        let price = state
            .bars
            .get(&params.contract.con_id)
            .and_then(|bars| bars.iter().rev().find(|b| b.close.is_finite()))
            .map(|b| b.close);

        let delta = params.side.sign() * filled;
        let position = state
            .positions
            .entry(params.contract.con_id)
            .or_insert_with(|| Position {
                contract: params.contract.clone(),
                quantity: 0.0,
                avg_cost: 0.0,
            });
        let old_qty = position.quantity;
        let new_qty = old_qty + delta;
        if let Some(px) = price {
            if filled > 0.0 {
                position.avg_cost = if old_qty == 0.0 || old_qty.signum() == delta.signum() {
                    (position.avg_cost * old_qty.abs() + px * filled) / (old_qty.abs() + filled)
                } else if new_qty == 0.0 || new_qty.signum() == old_qty.signum() {
                    position.avg_cost
                } else {
                    px
                };
            }
        }
        position.quantity = new_qty;

        state.fills.push(PaperFill {
            order_id: order_id.clone(),
            params,
            filled_contracts: filled,
            price,
        });
        Ok(order_id)
    }
}

fn is_weekday(d: NaiveDate) -> bool {
    !matches!(d.weekday(), Weekday::Sat | Weekday::Sun)
}

fn third_friday(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, Weekday::Fri, 3)
}

fn month_code(month: u32) -> char {
    match month {
        1 => 'F',
        2 => 'G',
        3 => 'H',
        4 => 'J',
        5 => 'K',
        6 => 'M',
        7 => 'N',
        8 => 'Q',
        9 => 'U',
        10 => 'V',
        11 => 'X',
        _ => 'Z',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn strip() -> PaperBroker {
        PaperBroker::synthetic_strip(
            &ContractTemplate::default(),
            &SyntheticStrip {
                history_start: ymd(2025, 1, 1),
                history_end: ymd(2025, 6, 30),
                contracts: 6,
                start_price: 70.0,
                daily_vol: 0.02,
                contango_per_month: 0.3,
                multiplier: 1000.0,
            },
            7,
        )
    }

    #[tokio::test]
    async fn synthetic_strip_lists_quarterlies_in_order() {
        let broker = strip();
        let contracts = broker.contract_details(&ContractTemplate::default()).await.unwrap();
        assert_eq!(contracts.len(), 6);
        assert_eq!(contracts[0].local_symbol, "CLH5");
        assert_eq!(contracts[0].expiry, ymd(2025, 3, 21));
        assert!(contracts.windows(2).all(|w| w[0].expiry < w[1].expiry));

        let other = ContractTemplate::future("GC", "COMEX");
        assert!(broker.contract_details(&other).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn bars_respect_window() {
        let broker = strip();
        let contracts = broker.contract_details(&ContractTemplate::default()).await.unwrap();
        let end = ymd(2025, 6, 13);
        let bars = broker
            .historical_bars(&contracts[2], end, 30, BarSize::OneDay, WhatToShow::Trades, true)
            .await
            .unwrap();
        assert!(!bars.is_empty());
        assert!(bars.iter().all(|b| b.date <= end && b.date > end - Duration::days(30)));
        assert!(bars.iter().all(|b| is_weekday(b.date)));
    }

    #[tokio::test]
    async fn oversized_window_returns_full_history() {
        let broker = strip();
        let contracts = broker.contract_details(&ContractTemplate::default()).await.unwrap();
        let end = ymd(2025, 6, 13);
        let all = broker
            .historical_bars(&contracts[2], end, u32::MAX, BarSize::OneDay, WhatToShow::Trades, true)
            .await
            .unwrap();
        assert_eq!(all.first().map(|b| b.date), Some(ymd(2025, 1, 1)));
        assert_eq!(all.last().map(|b| b.date), Some(end));
    }

    #[tokio::test]
    async fn average_cost_tracks_opening_fills() {
        let broker = PaperBroker::new();
        let contract = Contract {
            con_id: ContractId(7),
            symbol: Symbol("CL".into()),
            exchange: Exchange("NYMEX".into()),
            local_symbol: "CLZ6".into(),
            expiry: ymd(2026, 12, 18),
            multiplier: 1000.0,
        };
        let bar = |px: f64| Bar {
            date: ymd(2026, 1, 15),
            open: px,
            high: px,
            low: px,
            close: px,
            volume: 1.0,
        };
        let order = |side, qty| OrderParams::market(contract.clone(), side, qty, TimeInForce::Day);
        let avg = |broker: &PaperBroker| broker.state.lock().positions[&ContractId(7)].avg_cost;

        broker.add_contract(contract.clone(), vec![bar(60.0)]);
        broker.place_order(order(Side::Buy, 2.0)).await.unwrap();
        assert_eq!(avg(&broker), 60.0);

        // Adding at 66 blends: (2 * 60 + 1 * 66) / 3.
        broker.state.lock().bars.insert(ContractId(7), vec![bar(66.0)]);
        broker.place_order(order(Side::Buy, 1.0)).await.unwrap();
        assert_eq!(avg(&broker), 62.0);

        // Reducing keeps the cost basis.
        broker.place_order(order(Side::Sell, 2.0)).await.unwrap();
        assert_eq!(avg(&broker), 62.0);

        // Flipping through zero restarts at the fill price.
        broker.state.lock().bars.insert(ContractId(7), vec![bar(70.0)]);
        broker.place_order(order(Side::Sell, 3.0)).await.unwrap();
        assert_eq!(avg(&broker), 70.0);
        assert_eq!(broker.positions().await.unwrap()[0].quantity, -2.0);
    }

    async fn closes_for_range(first: NaiveDate, date: NaiveDate) -> Vec<f64> {
        let template = ContractTemplate::default();
        let shape = SyntheticStrip::covering(first, date, 30, 1, 50);
        let broker = PaperBroker::synthetic_strip(&template, &shape, 42);
        let contracts = broker.contract_details(&template).await.unwrap();
        let contract = contracts.iter().find(|c| c.local_symbol == "CLU6").unwrap();
        broker
            .historical_bars(contract, date, 30, BarSize::OneDay, WhatToShow::Trades, true)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.close)
            .collect()
    }

    #[tokio::test]
    async fn prices_do_not_depend_on_requested_range() {
        let date = ymd(2026, 3, 16);
        let narrow = closes_for_range(date, date).await;
        let wide = closes_for_range(ymd(2026, 1, 5), date).await;
        assert!(!narrow.is_empty());
        assert_eq!(narrow, wide);
    }

    #[test]
    fn covering_strip_reaches_past_the_roll_buffer() {
        let shape = SyntheticStrip::covering(ymd(2026, 1, 5), ymd(2026, 3, 16), 30, 1, 50);
        assert_eq!(shape.history_start, SyntheticStrip::epoch());
        let broker = PaperBroker::synthetic_strip(&ContractTemplate::default(), &shape, 1);
        let last_expiry = broker.state.lock().contracts.iter().map(|c| c.expiry).max().unwrap();
        assert!(last_expiry > ymd(2026, 3, 16) + Duration::days(50 + 180));
    }

    #[tokio::test]
    async fn market_orders_move_position() {
        let broker = strip();
        let contract = broker.contract_details(&ContractTemplate::default()).await.unwrap()[3].clone();

        broker
            .place_order(OrderParams::market(contract.clone(), Side::Buy, 3.0, TimeInForce::Day))
            .await
            .unwrap();
        broker
            .place_order(OrderParams::market(contract.clone(), Side::Sell, 5.0, TimeInForce::Day))
            .await
            .unwrap();

        let positions = broker.positions().await.unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].quantity, -2.0);
        assert_eq!(broker.fills().len(), 2);
    }

    #[tokio::test]
    async fn rejecting_account_leaves_position_alone() {
        let broker = strip();
        broker.set_fill_model(FillModel::Reject);
        let contract = broker.contract_details(&ContractTemplate::default()).await.unwrap()[3].clone();
        let res = broker
            .place_order(OrderParams::market(contract, Side::Buy, 1.0, TimeInForce::Day))
            .await;
        assert!(res.is_err());
        assert!(broker.positions().await.unwrap().is_empty());
    }
}

//! Contract roll: which listed future to trade on a given date.

use chrono::{Duration, NaiveDate};
use tracing::{debug, info};

use crate::broker::Broker;
use crate::error::{BotError, Result};
use crate::types::{Contract, ContractTemplate};

/// Contracts expiring strictly after `date + min_days_to_expiry`, nearest expiry first.
///
/// A cutoff past the last representable date leaves nothing eligible.
pub fn select_valid(contracts: Vec<Contract>, date: NaiveDate, min_days_to_expiry: u32) -> Vec<Contract> {
    let Some(cutoff) = date.checked_add_signed(Duration::days(i64::from(min_days_to_expiry))) else {
        return Vec::new();
    };
    let mut valid: Vec<Contract> = contracts.into_iter().filter(|c| c.expiry > cutoff).collect();
    valid.sort_by(|a, b| a.expiry.cmp(&b.expiry).then(a.con_id.cmp(&b.con_id)));
    valid
}

/// Every contract of the template that can still be held for
/// `min_days_to_expiry` days past `date`, sorted by expiry.
pub async fn valid_contracts<B: Broker + ?Sized>(
    broker: &B,
    template: &ContractTemplate,
    date: NaiveDate,
    min_days_to_expiry: u32,
) -> Result<Vec<Contract>> {
    let all = broker.contract_details(template).await?;
    if all.is_empty() {
        return Err(BotError::NoContracts {
            symbol: template.symbol.0.clone(),
        });
    }
    let listed = all.len();
    let valid = select_valid(all, date, min_days_to_expiry);
    debug!(
        symbol = %template.symbol.0,
        %date,
        listed,
        valid = valid.len(),
        "filtered contract chain"
    );
    Ok(valid)
}

/// The `nth` eligible contract (0 = nearest). The default roll trades `nth = 1`.
pub async fn front_month_contract<B: Broker + ?Sized>(
    broker: &B,
    template: &ContractTemplate,
    date: NaiveDate,
    nth: usize,
    min_days_to_expiry: u32,
) -> Result<Contract> {
    let valid = valid_contracts(broker, template, date, min_days_to_expiry).await?;
    let available = valid.len();
    let contract = valid
        .into_iter()
        .nth(nth)
        .ok_or(BotError::ContractIndexOutOfRange { index: nth, available })?;
    info!(
        %date,
        contract = %contract.local_symbol,
        expiry = %contract.expiry,
        "resolved active contract"
    );
    Ok(contract)
}

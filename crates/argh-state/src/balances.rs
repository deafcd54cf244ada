//! Balances map: `"<address>:<asset>"` → [`Amount`]. Missing keys read as
//! zero (§3 "Balances"). Grounded on the reference deployment's `k(addr,
//! asset)` key convention (`core/tx_engine.py`), adapted into a typed map
//! instead of untyped dict string-concatenation.

use std::collections::HashMap;

use argh_core::{Address, Amount, Asset, CoreError, POOL_ACCOUNT_PREFIX, PROTOCOL_REWARD_SENDER};

/// Either a real account address, the synthetic `_protocol` reward sender,
/// or a synthetic `pool:<id>` account. All three share the same balance
/// namespace (§3 "Address").
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum BalanceKeyAddr {
    Account(Address),
    Protocol,
    Pool(String),
}

impl BalanceKeyAddr {
    fn as_key_string(&self) -> String {
        match self {
            BalanceKeyAddr::Account(a) => a.to_hex(),
            BalanceKeyAddr::Protocol => PROTOCOL_REWARD_SENDER.to_string(),
            BalanceKeyAddr::Pool(id) => format!("{POOL_ACCOUNT_PREFIX}{id}"),
        }
    }
}

impl From<Address> for BalanceKeyAddr {
    fn from(a: Address) -> Self {
        BalanceKeyAddr::Account(a)
    }
}

#[derive(Default, Clone, Debug)]
pub struct Balances(HashMap<String, Amount>);

impl Balances {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(addr: &BalanceKeyAddr, asset: &Asset) -> String {
        format!("{}:{}", addr.as_key_string(), asset.as_str())
    }

    pub fn get(&self, addr: impl Into<BalanceKeyAddr>, asset: &Asset) -> Amount {
        self.0
            .get(&Self::key(&addr.into(), asset))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    pub fn get_pool(&self, pool_id: &str, asset: &Asset) -> Amount {
        self.get(BalanceKeyAddr::Pool(pool_id.to_string()), asset)
    }

    pub fn set(&mut self, addr: impl Into<BalanceKeyAddr>, asset: &Asset, amount: Amount) {
        self.0.insert(Self::key(&addr.into(), asset), amount);
    }

    /// Credits `amount` to `(addr, asset)`, saturating on overflow is not
    /// permitted — an overflow here indicates a protocol-level bug, so this
    /// surfaces as [`CoreError::AmountOverflow`] rather than silently wrapping.
    pub fn credit(
        &mut self,
        addr: impl Into<BalanceKeyAddr>,
        asset: &Asset,
        amount: Amount,
    ) -> Result<(), CoreError> {
        let addr = addr.into();
        let current = self.get(addr.clone(), asset);
        let next = current.checked_add(amount).ok_or(CoreError::AmountOverflow)?;
        self.set(addr, asset, next);
        Ok(())
    }

    /// Debits `amount` from `(addr, asset)`. Callers must have already
    /// checked sufficiency via [`Balances::get`]; this still guards against
    /// underflow defensively since genesis/system paths bypass that check.
    pub fn debit(
        &mut self,
        addr: impl Into<BalanceKeyAddr>,
        asset: &Asset,
        amount: Amount,
    ) -> Result<(), CoreError> {
        let addr = addr.into();
        let current = self.get(addr.clone(), asset);
        let next = current.checked_sub(amount).ok_or(CoreError::AmountOverflow)?;
        self.set(addr, asset, next);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Amount)> {
        self.0.iter()
    }
}

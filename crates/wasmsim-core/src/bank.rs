//! Minimal bank module.
//!
//! Balances live in the chain store, so bank effects revert together with
//! everything else when a snapshot is restored. Coins only move through
//! explicit messages routed here; the wasm engine never transfers funds
//! implicitly.

use crate::error::CoreError;
use crate::store::ChainStore;
use wasmsim_types::coin::coins_to_string;
use wasmsim_types::{
    Addr, AppResponse, BalanceResponse, BankMsg, BankQuery, Binary, Coin, Event,
};

pub struct BankKeeper;

impl BankKeeper {
    pub fn handle_msg(
        &self,
        store: &mut ChainStore,
        sender: Addr,
        msg: BankMsg,
    ) -> Result<AppResponse, CoreError> {
        match msg {
            BankMsg::Send { to_address, amount } => {
                let to = Addr::unchecked(to_address);
                self.move_coins(store, &sender, &to, &amount)?;
                tracing::debug!(%sender, %to, coins = %coins_to_string(&amount), "bank send");
                let event = Event::new("transfer")
                    .add_attribute("recipient", to.as_str())
                    .add_attribute("sender", sender.as_str())
                    .add_attribute("amount", coins_to_string(&amount));
                Ok(AppResponse {
                    events: vec![event],
                    data: None,
                })
            }
            BankMsg::Burn { amount } => {
                for coin in &amount {
                    self.withdraw(store, &sender, coin)?;
                }
                let event = Event::new("burn")
                    .add_attribute("burner", sender.as_str())
                    .add_attribute("amount", coins_to_string(&amount));
                Ok(AppResponse {
                    events: vec![event],
                    data: None,
                })
            }
        }
    }

    pub fn handle_query(
        &self,
        store: &ChainStore,
        query: BankQuery,
    ) -> Result<Binary, CoreError> {
        match query {
            BankQuery::Balance { address, denom } => {
                let addr = Addr::unchecked(address);
                let response = BalanceResponse {
                    amount: Coin::new(store.balance_of(&addr, &denom), denom),
                };
                Ok(Binary::from(serde_json::to_vec(&response)?))
            }
        }
    }

    fn move_coins(
        &self,
        store: &mut ChainStore,
        from: &Addr,
        to: &Addr,
        coins: &[Coin],
    ) -> Result<(), CoreError> {
        for coin in coins {
            self.withdraw(store, from, coin)?;
            let have = store.balance_of(to, &coin.denom);
            store.set_denom_balance(to, &coin.denom, have + coin.amount);
        }
        Ok(())
    }

    fn withdraw(&self, store: &mut ChainStore, from: &Addr, coin: &Coin) -> Result<(), CoreError> {
        let have = store.balance_of(from, &coin.denom);
        if have < coin.amount {
            return Err(CoreError::Bank(format!(
                "insufficient funds: {} has {}{}, needs {}{}",
                from, have, coin.denom, coin.amount, coin.denom
            )));
        }
        store.set_denom_balance(from, &coin.denom, have - coin.amount);
        Ok(())
    }
}

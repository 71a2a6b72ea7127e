use hermes_core::channel::Channel;
use hermes_core::config::HubPolicy;
use hermes_core::error::HermesError;
use hermes_core::hub::{Hub, HubStatus};
use hermes_core::types::{AccountId, Balance, BasisPoints, ChannelId, HubId, Timestamp};

use crate::store::Store;

/// Read-only views over hubs and channels.
pub struct HubQuery<'a, S: Store + ?Sized> {
    store: &'a S,
}

impl<'a, S: Store + ?Sized> HubQuery<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn hub(&self, id: &HubId) -> Result<Hub, HermesError> {
        self.store.get_hub(id)?.ok_or_else(|| HermesError::UnknownHub(id.to_string()))
    }

    pub fn channel(&self, id: &ChannelId) -> Result<Channel, HermesError> {
        self.store.get_channel(id)?.ok_or_else(|| HermesError::UnknownChannel(id.to_hex()))
    }

    pub fn balance_of(&self, id: &AccountId) -> Result<Balance, HermesError> {
        Ok(self.store.get_account(id)?.map(|a| a.balance).unwrap_or(0))
    }

    pub fn available_balance(&self, id: &HubId) -> Result<Balance, HermesError> {
        let hub = self.hub(id)?;
        Ok(hub.available_balance(self.balance_of(id)?))
    }

    pub fn minimal_expected_balance(&self, id: &HubId) -> Result<Balance, HermesError> {
        Ok(self.hub(id)?.minimal_expected_balance())
    }

    pub fn current_fee(&self, id: &HubId, now: Timestamp) -> Result<BasisPoints, HermesError> {
        Ok(self.hub(id)?.fees.resolve(now))
    }

    /// Hub fee owed on settling `amount` at `now`.
    pub fn calculate_fee(
        &self,
        id: &HubId,
        amount: Balance,
        now: Timestamp,
        policy: &HubPolicy,
    ) -> Result<Balance, HermesError> {
        Ok(self.hub(id)?.fees.calculate(amount, now, policy.min_fee))
    }

    /// Human-readable summary of a hub's state.
    pub fn describe(&self, id: &HubId, now: Timestamp) -> Result<String, HermesError> {
        let hub = self.hub(id)?;
        let ledger = self.balance_of(id)?;

        let status = match hub.status {
            HubStatus::Active | HubStatus::Paused => hub.status.to_string(),
            HubStatus::Punishment => match hub.punishment.activated_at {
                Some(at) => format!("in punishment for {}s", now - at),
                None => hub.status.to_string(),
            },
            HubStatus::Closed => match hub.stake_unlock_at {
                Some(at) if at > now => format!("closed, stake unlocks in {}s", at - now),
                _ => "closed, stake unlocked".to_string(),
            },
        };
        let fee = if hub.fees.is_pending(now) {
            format!(
                "{} bp ({} bp from {})",
                hub.fees.previous.value, hub.fees.last.value, hub.fees.last.valid_from
            )
        } else {
            format!("{} bp", hub.fees.last.value)
        };

        Ok(format!(
            "Hub {} | {} | stake {} | channels stake {} locked {} | available {} | punishment {} | fee {}",
            id,
            status,
            hub.stake,
            hub.total_stake,
            hub.locked_funds,
            hub.available_balance(ledger),
            hub.punishment.amount,
            fee,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{World, HUB_STAKE, NOW};
    use hermes_core::transaction::Action;

    #[test]
    fn balances_track_reserved_funds() {
        let w = World::new(0);
        w.fund_hub(700);
        w.open(&w.client, 100);
        let q = HubQuery::new(w.engine.store.as_ref());

        assert_eq!(q.balance_of(&w.hub_id).unwrap(), HUB_STAKE + 800);
        assert_eq!(q.available_balance(&w.hub_id).unwrap(), 700);
        assert_eq!(q.minimal_expected_balance(&w.hub_id).unwrap(), HUB_STAKE + 100);
        assert!(matches!(
            q.hub(&AccountId::from_bytes([0u8; 32])),
            Err(HermesError::UnknownHub(_))
        ));
    }

    #[test]
    fn describe_reports_pending_fee_and_status() {
        let w = World::new(250);
        w.run(&w.operator.account_id, Action::SetFee { hub_id: w.hub_id.clone(), fee: 175 })
            .unwrap();
        let q = HubQuery::new(w.engine.store.as_ref());

        let text = q.describe(&w.hub_id, NOW).unwrap();
        assert!(text.contains("active"), "{text}");
        assert!(text.contains("250 bp (175 bp from"), "{text}");
        assert_eq!(q.current_fee(&w.hub_id, NOW).unwrap(), 250);

        w.run(&w.operator.account_id, Action::CloseHub { hub_id: w.hub_id.clone() }).unwrap();
        let text = q.describe(&w.hub_id, NOW).unwrap();
        assert!(text.contains("closed, stake unlocks in"), "{text}");
    }
}

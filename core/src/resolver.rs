//! Account and customer lookup against committed state.
//!
//! Pure reads, no side effects. Malformed account numbers are rejected
//! before any query runs.

use crate::error::{LedgerError, LedgerResult};
use crate::store::LedgerStore;
use crate::types::{AccountId, AccountNumber, AccountRecord, CustomerRecord};

pub struct AccountResolver<'a> {
    store: &'a LedgerStore,
}

impl<'a> AccountResolver<'a> {
    pub fn new(store: &'a LedgerStore) -> Self {
        Self { store }
    }

    pub fn by_id(&self, account_id: AccountId) -> LedgerResult<AccountRecord> {
        self.store
            .account_by_id(account_id)?
            .ok_or_else(|| LedgerError::not_found("account", account_id))
    }

    pub fn by_account_number(&self, raw: &str) -> LedgerResult<CustomerRecord> {
        let number: AccountNumber = raw
            .parse()
            .map_err(|e| LedgerError::validation("account_number", format!("{e}")))?;
        self.store
            .customer_by_account_number(&number)?
            .ok_or_else(|| LedgerError::not_found("customer", number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Ledger;

    #[test]
    fn malformed_number_rejected_before_lookup() {
        let ledger = Ledger::in_memory().unwrap();
        let resolver = AccountResolver::new(ledger.store());

        for bad in ["123", "12345678901", "12345abc90", ""] {
            let err = resolver.by_account_number(bad).unwrap_err();
            assert!(matches!(err, LedgerError::Validation { field, .. } if field == "account_number"));
        }
    }

    #[test]
    fn unknown_number_is_not_found() {
        let ledger = Ledger::in_memory().unwrap();
        let resolver = AccountResolver::new(ledger.store());
        let err = resolver.by_account_number("0123456789").unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { .. }));
    }

    #[test]
    fn resolves_account_and_owner() {
        let mut ledger = Ledger::in_memory().unwrap();
        let alice = ledger.signup("alice").unwrap();
        let accounts = ledger.accounts(alice.customer_id).unwrap();

        let resolver = AccountResolver::new(ledger.store());
        let found = resolver.by_id(accounts[0].account_id).unwrap();
        assert_eq!(found.customer_id, alice.customer_id);

        let owner = resolver
            .by_account_number(alice.account_number.as_str())
            .unwrap();
        assert_eq!(owner.customer_id, alice.customer_id);
    }
}

//! The `Ledger` facade — the surface collaborators program against.
//!
//! Owns the store, the confirmation-plan store, the tier policy, the
//! retention pruner and the notification sink, and sequences them:
//! validate against a snapshot, park the plan, execute atomically on
//! confirmation, then notify and prune after commit.

use chrono::{Duration, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::deposit::{self, DEFAULT_DEPOSIT_NOTE};
use crate::error::{LedgerError, LedgerResult};
use crate::executor::{self, TransferReceipt};
use crate::feed::{self, FeedItem};
use crate::notify::{LedgerEvent, NotificationSink, NullSink};
use crate::plan::{PlanStore, TransferPlan};
use crate::pruner::RetentionPruner;
use crate::store::LedgerStore;
use crate::types::{
    AccountNumber, AccountRecord, AccountType, CustomerId, CustomerRecord, Tier,
    TransactionRecord, TxnId, TxnKind, TxnStatus,
};
use crate::validator::{TierPolicy, TransferIntent, TransferValidator};

pub struct Ledger {
    store: LedgerStore,
    plans: PlanStore,
    policy: TierPolicy,
    pruner: RetentionPruner,
    sink: Box<dyn NotificationSink>,
}

impl Ledger {
    /// Open (or create) a ledger database at `path` and apply migrations.
    pub fn open(path: &str) -> LedgerResult<Self> {
        let store = LedgerStore::open(path)?;
        store.migrate()?;
        Ok(Self::with_store(store))
    }

    /// In-memory ledger (used in tests).
    pub fn in_memory() -> LedgerResult<Self> {
        let store = LedgerStore::in_memory()?;
        store.migrate()?;
        Ok(Self::with_store(store))
    }

    fn with_store(store: LedgerStore) -> Self {
        Self {
            store,
            plans: PlanStore::with_default_ttl(),
            policy: TierPolicy::unrestricted(),
            pruner: RetentionPruner::default(),
            sink: Box::new(NullSink),
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn NotificationSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_policy(mut self, policy: TierPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_retention(mut self, keep: usize) -> Self {
        self.pruner = RetentionPruner::new(keep);
        self
    }

    pub fn with_plan_ttl(mut self, ttl: Duration) -> Self {
        self.plans = PlanStore::new(ttl);
        self
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    // ── Customer lifecycle ────────────────────────────────────

    /// Create a customer with a fresh account number and the default
    /// zero-balance Checking and Savings accounts, as one unit.
    pub fn signup(&mut self, username: &str) -> LedgerResult<CustomerRecord> {
        self.create_customer(username, Tier::Standard, false, &AccountType::ALL[..2])
    }

    /// Create an operator: admin flag, premier tier, all account types.
    pub fn create_operator(&mut self, username: &str) -> LedgerResult<CustomerRecord> {
        self.create_customer(username, Tier::Premier, true, &AccountType::ALL)
    }

    fn create_customer(
        &mut self,
        username: &str,
        tier: Tier,
        is_admin: bool,
        account_types: &[AccountType],
    ) -> LedgerResult<CustomerRecord> {
        let username = username.trim();
        if username.len() < 4 {
            return Err(LedgerError::validation(
                "username",
                "username must be at least 4 characters",
            ));
        }
        if self.store.customer_by_username(username)?.is_some() {
            return Err(LedgerError::validation(
                "username",
                "username is already taken",
            ));
        }

        let number = self.generate_account_number()?;
        let joined_at = Utc::now();
        let tx = self.store.begin_immediate()?;
        let customer_id = tx.insert_customer(username, &number, tier, is_admin, &joined_at)?;
        for account_type in account_types {
            tx.insert_account(customer_id, *account_type, &Decimal::ZERO)?;
        }
        tx.commit()?;

        log::info!("customer {customer_id} ({username}) created with number {number}");
        self.customer(customer_id)
    }

    /// Generate a 10-digit account number not yet present in the store.
    /// The UNIQUE constraint closes the remaining race at insert time.
    fn generate_account_number(&self) -> LedgerResult<AccountNumber> {
        let mut rng = rand::thread_rng();
        loop {
            let digits: String = (0..10)
                .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
                .collect();
            if !self.store.account_number_exists(&digits)? {
                return digits
                    .parse()
                    .map_err(|e| anyhow::anyhow!("generated number: {e}").into());
            }
        }
    }

    pub fn request_tier_upgrade(&mut self, customer_id: CustomerId) -> LedgerResult<()> {
        let customer = self.customer(customer_id)?;
        if customer.tier != Tier::Standard {
            return Err(LedgerError::InvalidState(format!(
                "customer {customer_id} is {}, cannot request upgrade",
                customer.tier.as_str()
            )));
        }
        self.store.set_tier(customer_id, Tier::Pending)
    }

    pub fn approve_tier_upgrade(&mut self, customer_id: CustomerId) -> LedgerResult<()> {
        let customer = self.customer(customer_id)?;
        if customer.tier == Tier::Premier {
            return Err(LedgerError::InvalidState(format!(
                "customer {customer_id} is already premier"
            )));
        }
        self.store.set_tier(customer_id, Tier::Premier)
    }

    pub fn set_customer_active(&mut self, customer_id: CustomerId, active: bool) -> LedgerResult<()> {
        self.store.set_active(customer_id, active)
    }

    /// Delete a customer; their accounts and transactions cascade away.
    pub fn delete_customer(&mut self, customer_id: CustomerId) -> LedgerResult<()> {
        self.store.delete_customer(customer_id)
    }

    // ── Transfers ─────────────────────────────────────────────

    /// Validate an intent and park the resulting plan for confirmation.
    pub fn submit_transfer_intent(
        &mut self,
        customer_id: CustomerId,
        intent: TransferIntent,
    ) -> LedgerResult<TransferPlan> {
        let plan = TransferValidator::new(&self.store).validate(customer_id, &intent)?;
        self.plans.insert(plan.clone());
        Ok(plan)
    }

    /// Execute a previously submitted plan. Each token confirms at most
    /// once; replays and stale tokens get `ExpiredPlan`.
    pub fn confirm_transfer(&mut self, token: &Uuid) -> LedgerResult<TransferReceipt> {
        let plan = self.plans.take(token)?;
        let receipt = executor::execute(&mut self.store, &plan)?;

        // Post-commit, fire-and-forget.
        if let Some(debit_txn_id) = receipt.debit_txn_id {
            self.sink.publish(&LedgerEvent::TransactionPosted {
                customer_id: plan.customer_id,
                txn_id: debit_txn_id,
                kind: TxnKind::Send,
                amount: receipt.amount,
            });
        }
        let dest_customer = plan.destination_customer();
        self.sink.publish(&LedgerEvent::TransactionPosted {
            customer_id: dest_customer,
            txn_id: receipt.credit_txn_id,
            kind: TxnKind::Receive,
            amount: receipt.amount,
        });

        self.pruner.prune_after_commit(&self.store, plan.customer_id);
        if dest_customer != plan.customer_id {
            self.pruner.prune_after_commit(&self.store, dest_customer);
        }
        Ok(receipt)
    }

    // ── Staged deposits ───────────────────────────────────────

    pub fn stage_deposit(
        &mut self,
        customer_id: CustomerId,
        account_type: AccountType,
        amount: Decimal,
        note: Option<&str>,
    ) -> LedgerResult<TransactionRecord> {
        let note = note.unwrap_or(DEFAULT_DEPOSIT_NOTE);
        let record = deposit::stage(&mut self.store, customer_id, account_type, amount, note)?;
        self.sink.publish(&LedgerEvent::DepositStaged {
            customer_id,
            txn_id: record.txn_id,
            amount: record.amount,
        });
        Ok(record)
    }

    pub fn approve_deposit(&mut self, txn_id: TxnId) -> LedgerResult<TransferReceipt> {
        let staged = self
            .store
            .txn_by_id(txn_id)?
            .ok_or_else(|| LedgerError::not_found("transaction", txn_id))?;
        let receipt = deposit::approve(&mut self.store, &self.policy, txn_id)?;

        self.sink.publish(&LedgerEvent::DepositApproved {
            customer_id: staged.customer_id,
            txn_id,
            amount: receipt.amount,
        });
        self.pruner
            .prune_after_commit(&self.store, staged.customer_id);
        Ok(receipt)
    }

    // ── Operator messages ─────────────────────────────────────

    /// Post a zero-amount `admin_message` entry to a customer's feed.
    pub fn post_notice(
        &mut self,
        customer_id: CustomerId,
        message: &str,
    ) -> LedgerResult<TransactionRecord> {
        let message = message.trim();
        if message.is_empty() {
            return Err(LedgerError::validation("message", "message cannot be empty"));
        }

        let tx = self.store.begin_immediate()?;
        tx.customer_by_id(customer_id)?
            .ok_or_else(|| LedgerError::not_found("customer", customer_id))?;
        let txn_id = tx.insert_txn(
            customer_id,
            TxnKind::AdminMessage,
            "System",
            &Decimal::ZERO,
            Some(message),
            TxnStatus::Completed,
            &Utc::now(),
        )?;
        let record = tx
            .txn_by_id(txn_id)?
            .ok_or_else(|| LedgerError::not_found("transaction", txn_id))?;
        tx.commit()?;

        self.sink
            .publish(&LedgerEvent::NoticePosted { customer_id, txn_id });
        self.pruner.prune_after_commit(&self.store, customer_id);
        Ok(record)
    }

    // ── Activity & reads ──────────────────────────────────────

    pub fn recent_activity(
        &self,
        customer_id: CustomerId,
        limit: usize,
    ) -> LedgerResult<Vec<TransactionRecord>> {
        self.customer(customer_id)?;
        self.store.recent_transactions(customer_id, limit)
    }

    /// Recent activity as feed items, with the welcome notice prepended
    /// for customers inside the welcome window.
    pub fn activity_feed(
        &self,
        customer_id: CustomerId,
        limit: usize,
    ) -> LedgerResult<Vec<FeedItem>> {
        let customer = self.customer(customer_id)?;
        let recent = self.store.recent_transactions(customer_id, limit)?;
        Ok(feed::assemble(&customer, recent, Utc::now()))
    }

    pub fn has_unread_activity(&self, customer_id: CustomerId) -> LedgerResult<bool> {
        self.customer(customer_id)?;
        self.store.has_unread(customer_id)
    }

    pub fn mark_activity_read(&mut self, customer_id: CustomerId) -> LedgerResult<usize> {
        self.customer(customer_id)?;
        self.store.mark_all_read(customer_id)
    }

    pub fn customer(&self, customer_id: CustomerId) -> LedgerResult<CustomerRecord> {
        self.store
            .customer_by_id(customer_id)?
            .ok_or_else(|| LedgerError::not_found("customer", customer_id))
    }

    pub fn customer_by_username(&self, username: &str) -> LedgerResult<Option<CustomerRecord>> {
        self.store.customer_by_username(username)
    }

    pub fn customers(&self) -> LedgerResult<Vec<CustomerRecord>> {
        self.store.customers()
    }

    pub fn accounts(&self, customer_id: CustomerId) -> LedgerResult<Vec<AccountRecord>> {
        self.store.accounts_of(customer_id)
    }

    pub fn total_balance(&self, customer_id: CustomerId) -> LedgerResult<Decimal> {
        self.store.total_balance(customer_id)
    }
}

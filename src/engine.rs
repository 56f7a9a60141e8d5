use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::codec::{self, Kind};
use crate::entities::{Account, Bank, Customer, Payment};
use crate::references::{self, Violation};
use crate::repository::{BankProfile, EntityStore};
use crate::settlement::{self, PaymentOrder, RateTable};
use crate::stores::{MemoryStore, RecordStore, UnitOfWork};
use crate::{queries, Result};

/// Input for [`Engine::create_bank`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewBank {
    pub bank_id: String,
    pub bank_admin_id: String,
    pub name: String,
    pub password: String,
    pub country: String,
    pub currency: String,
    pub reserves: Decimal,
    pub exchange_rate: Decimal,
}

/// Entry point for every ledger operation.
///
/// Each mutating call is one unit of work: its writes are buffered and reach
/// the store only if the whole operation succeeds. The engine keeps no state
/// of its own besides the store.
pub struct Engine<S: RecordStore = MemoryStore> {
    store: S,
}

impl Engine<MemoryStore> {
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }
}

impl Default for Engine<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: RecordStore> Engine<S> {
    pub fn with_store(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Runs `operation` against a write buffer and commits it only on success.
    fn unit_of_work<T>(
        &mut self,
        name: &str,
        operation: impl FnOnce(&mut UnitOfWork<'_, S>) -> Result<T>,
    ) -> Result<T> {
        let mut unit = UnitOfWork::new(&mut self.store);
        match operation(&mut unit) {
            Ok(value) => {
                let writes = unit.commit()?;
                info!(operation = name, writes, "committed");
                Ok(value)
            }
            Err(err) => {
                warn!(operation = name, error = %err, "rolled back");
                Err(err)
            }
        }
    }

    pub fn create_bank(&mut self, new: NewBank) -> Result<Bank> {
        let bank = Bank {
            name: new.name,
            bank_id: new.bank_id,
            bank_admin_id: new.bank_admin_id,
            password: new.password,
            country: new.country,
            currency: new.currency,
            reserves: new.reserves,
            account_ids: Vec::new(),
            exchange_rate: new.exchange_rate,
        };
        self.unit_of_work("create_bank", |store| {
            store.insert(&bank)?;
            Ok(bank)
        })
    }

    pub fn create_customer(
        &mut self,
        customer_id: &str,
        password: &str,
        name: &str,
        surname: &str,
    ) -> Result<Customer> {
        let customer = Customer {
            name: name.to_owned(),
            surname: surname.to_owned(),
            customer_id: customer_id.to_owned(),
            password: password.to_owned(),
            account_ids: Vec::new(),
        };
        self.unit_of_work("create_customer", |store| {
            store.insert(&customer)?;
            Ok(customer)
        })
    }

    /// Opens an account in the bank's currency and links it to both owners.
    pub fn create_account(
        &mut self,
        account_id: &str,
        customer_id: &str,
        bank_id: &str,
        balance: Decimal,
    ) -> Result<Account> {
        self.unit_of_work("create_account", |store| {
            codec::validate_id(Kind::Account, account_id)?;
            let bank = store.fetch::<Bank>(bank_id)?;
            store.fetch::<Customer>(customer_id)?;
            let account = Account {
                account_id: account_id.to_owned(),
                customer_id: customer_id.to_owned(),
                bank_id: bank_id.to_owned(),
                balance,
                currency: bank.currency,
                payment_ids: Vec::new(),
            };
            store.insert(&account)?;
            references::link_account(store, &account)?;
            Ok(account)
        })
    }

    pub fn create_payment(&mut self, order: PaymentOrder) -> Result<Payment> {
        self.unit_of_work("create_payment", |store| settlement::settle(store, order))
    }

    pub fn update_profile(
        &mut self,
        customer_id: &str,
        name: &str,
        surname: &str,
        password: &str,
    ) -> Result<Customer> {
        self.unit_of_work("update_profile", |store| {
            store.update_customer_profile(customer_id, name, surname, password)
        })
    }

    pub fn update_bank_profile(&mut self, bank_id: &str, profile: &BankProfile) -> Result<Bank> {
        self.unit_of_work("update_bank_profile", |store| {
            store.update_bank_profile(bank_id, profile)
        })
    }

    /// Adjusts a balance outside of settlement. Bank reserves are left alone.
    pub fn update_balance(&mut self, account_id: &str, delta: Decimal) -> Result<Account> {
        self.unit_of_work("update_balance", |store| {
            store.update_balance(account_id, delta)
        })
    }

    /// Deletes the account and its back-references. Payments that name it are kept.
    pub fn delete_account(&mut self, account_id: &str) -> Result<Account> {
        self.unit_of_work("delete_account", |store| {
            let account = store.remove::<Account>(account_id)?;
            references::unlink_account(store, &account)?;
            Ok(account)
        })
    }

    /// Repairs back-reference lists and the composite index. Returns the number of records written.
    pub fn rebuild_references(&mut self) -> Result<usize> {
        self.unit_of_work("rebuild_references", |store| references::rebuild(store))
    }

    /// Prices a transfer from the sender account's currency into the receiver's.
    pub fn quote(
        &self,
        sender_account_id: &str,
        receiver_account_id: &str,
        rates: &RateTable,
    ) -> Result<Decimal> {
        let sender = self.account(sender_account_id)?;
        let receiver = self.account(receiver_account_id)?;
        rates.rate(&sender.currency, &receiver.currency)
    }

    pub fn bank(&self, bank_id: &str) -> Result<Bank> {
        self.store.fetch(bank_id)
    }

    pub fn customer(&self, customer_id: &str) -> Result<Customer> {
        self.store.fetch(customer_id)
    }

    pub fn account(&self, account_id: &str) -> Result<Account> {
        self.store.fetch(account_id)
    }

    pub fn payment(&self, payment_id: &str) -> Result<Payment> {
        self.store.fetch(payment_id)
    }

    pub fn payments(&self, account_id: &str) -> Result<Vec<Payment>> {
        queries::payments(&self.store, account_id)
    }

    pub fn customer_accounts(&self, customer_id: &str) -> Result<Vec<Account>> {
        queries::customer_accounts(&self.store, customer_id)
    }

    pub fn bank_accounts(&self, bank_id: &str) -> Result<Vec<Account>> {
        queries::bank_accounts(&self.store, bank_id)
    }

    pub fn customers_by_bank(&self, bank_id: &str) -> Result<Vec<Customer>> {
        queries::customers_by_bank(&self.store, bank_id)
    }

    pub fn customer_password(&self, customer_id: &str) -> Result<String> {
        queries::customer_password(&self.store, customer_id)
    }

    pub fn banks(&self) -> Result<Vec<Bank>> {
        self.store.list()
    }

    pub fn accounts(&self) -> Result<Vec<Account>> {
        self.store.list()
    }

    pub fn audit(&self) -> Result<Vec<Violation>> {
        references::audit(&self.store)
    }
}

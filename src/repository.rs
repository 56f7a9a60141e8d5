//! Typed CRUD over the record store.
//!
//! [`EntityStore`] is implemented for every [`RecordStore`], so the same calls
//! work against a backend directly or through a [`crate::stores::UnitOfWork`].
//! Each mutation is one read-modify-write of exactly one record.

use rust_decimal::Decimal;

use crate::codec::{self, Entity};
use crate::entities::{Account, Bank, Customer};
use crate::stores::RecordStore;
use crate::{Error, Result};

/// Editable bank attributes. Reserves only move through settlement.
#[derive(Debug, Clone, PartialEq)]
pub struct BankProfile {
    pub name: String,
    pub country: String,
}

pub trait EntityStore: RecordStore {
    /// Loads an entity, or `None` when its key is absent.
    fn find<E: Entity>(&self, id: &str) -> Result<Option<E>> {
        let key = codec::entity_key(E::KIND, id);
        match self.get(&key)? {
            Some(bytes) => codec::decode(&key, &bytes).map(Some),
            None => Ok(None),
        }
    }

    fn fetch<E: Entity>(&self, id: &str) -> Result<E> {
        self.find(id)?.ok_or_else(|| Error::not_found(E::KIND, id))
    }

    fn exists<E: Entity>(&self, id: &str) -> Result<bool> {
        Ok(self.get(&codec::entity_key(E::KIND, id))?.is_some())
    }

    /// Every stored entity of one kind, ordered by ID.
    fn list<E: Entity>(&self) -> Result<Vec<E>> {
        self.scan_prefix(E::KIND.prefix())?
            .into_iter()
            .map(|(key, bytes)| codec::decode(&key, &bytes))
            .collect()
    }

    /// Writes a new entity. Fails if the ID is already taken by the same kind.
    fn insert<E: Entity>(&mut self, entity: &E) -> Result<()> {
        codec::validate_id(E::KIND, entity.id())?;
        if self.exists::<E>(entity.id())? {
            return Err(Error::already_exists(E::KIND, entity.id()));
        }
        self.save(entity)
    }

    /// Overwrites an entity unconditionally.
    fn save<E: Entity>(&mut self, entity: &E) -> Result<()> {
        let bytes = codec::encode(entity)?;
        self.put(&entity.key(), bytes)
    }

    /// Deletes an entity and returns its last stored value.
    fn remove<E: Entity>(&mut self, id: &str) -> Result<E> {
        let entity = self.fetch::<E>(id)?;
        self.delete(&codec::entity_key(E::KIND, id))?;
        Ok(entity)
    }

    fn update_customer_profile(
        &mut self,
        customer_id: &str,
        name: &str,
        surname: &str,
        password: &str,
    ) -> Result<Customer> {
        let mut customer = self.fetch::<Customer>(customer_id)?;
        customer.name = name.to_owned();
        customer.surname = surname.to_owned();
        customer.password = password.to_owned();
        self.save(&customer)?;
        Ok(customer)
    }

    fn update_bank_profile(&mut self, bank_id: &str, profile: &BankProfile) -> Result<Bank> {
        let mut bank = self.fetch::<Bank>(bank_id)?;
        bank.name = profile.name.clone();
        bank.country = profile.country.clone();
        self.save(&bank)?;
        Ok(bank)
    }

    /// Adjusts an account balance without touching its bank's reserves.
    fn update_balance(&mut self, account_id: &str, delta: Decimal) -> Result<Account> {
        let mut account = self.fetch::<Account>(account_id)?;
        account.balance = account
            .balance
            .checked_add(delta)
            .ok_or_else(|| Error::overflow(format!("balance of account {account_id}")))?;
        self.save(&account)?;
        Ok(account)
    }

    fn update_bank_reserves(&mut self, bank_id: &str, delta: Decimal) -> Result<Bank> {
        let mut bank = self.fetch::<Bank>(bank_id)?;
        bank.reserves = bank
            .reserves
            .checked_add(delta)
            .ok_or_else(|| Error::overflow(format!("reserves of bank {bank_id}")))?;
        self.save(&bank)?;
        Ok(bank)
    }
}

impl<S: RecordStore + ?Sized> EntityStore for S {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Kind;
    use crate::stores::MemoryStore;
    use rust_decimal_macros::dec;

    fn customer(id: &str) -> Customer {
        Customer {
            name: "Al".into(),
            surname: "Ice".into(),
            customer_id: id.into(),
            password: "pw".into(),
            account_ids: vec![],
        }
    }

    fn account(id: &str, balance: Decimal) -> Account {
        Account {
            account_id: id.into(),
            customer_id: "C1".into(),
            bank_id: "B1".into(),
            balance,
            currency: "USD".into(),
            payment_ids: vec![],
        }
    }

    #[test]
    fn test_insert_and_fetch() {
        let mut store = MemoryStore::new();
        store.insert(&customer("C1")).unwrap();
        assert_eq!(store.fetch::<Customer>("C1").unwrap(), customer("C1"));
        assert!(store.exists::<Customer>("C1").unwrap());
    }

    #[test]
    fn test_fetch_missing_is_not_found() {
        let store = MemoryStore::new();
        assert_eq!(
            store.fetch::<Customer>("C1").unwrap_err(),
            Error::NotFound {
                kind: Kind::Customer,
                id: "C1".into()
            }
        );
        assert_eq!(store.find::<Customer>("C1").unwrap(), None);
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut store = MemoryStore::new();
        store.insert(&customer("C1")).unwrap();
        let err = store.insert(&customer("C1")).unwrap_err();
        assert_eq!(err, Error::already_exists(Kind::Customer, "C1"));
    }

    #[test]
    fn test_same_id_different_kinds_do_not_collide() {
        let mut store = MemoryStore::new();
        store.insert(&customer("X")).unwrap();
        store.insert(&account("X", dec!(1))).unwrap();
        assert_eq!(store.fetch::<Customer>("X").unwrap().customer_id, "X");
        assert_eq!(store.fetch::<Account>("X").unwrap().balance, dec!(1));
    }

    #[test]
    fn test_insert_validates_id() {
        let mut store = MemoryStore::new();
        assert!(matches!(
            store.insert(&customer("")),
            Err(Error::InvalidArgument(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_fetch_corrupt_bytes() {
        let mut store = MemoryStore::new();
        store.put("account:A1", b"\xff\xfe".to_vec()).unwrap();
        assert!(matches!(
            store.fetch::<Account>("A1"),
            Err(Error::CorruptRecord { .. })
        ));
    }

    #[test]
    fn test_list_is_scoped_to_kind() {
        let mut store = MemoryStore::new();
        store.insert(&account("A2", dec!(2))).unwrap();
        store.insert(&account("A1", dec!(1))).unwrap();
        store.insert(&customer("C1")).unwrap();

        let ids: Vec<_> = store
            .list::<Account>()
            .unwrap()
            .into_iter()
            .map(|a| a.account_id)
            .collect();
        assert_eq!(ids, vec!["A1", "A2"]);
    }

    #[test]
    fn test_remove() {
        let mut store = MemoryStore::new();
        store.insert(&account("A1", dec!(1))).unwrap();
        assert_eq!(store.remove::<Account>("A1").unwrap().account_id, "A1");
        assert!(!store.exists::<Account>("A1").unwrap());
        assert!(matches!(
            store.remove::<Account>("A1"),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_update_balance() {
        let mut store = MemoryStore::new();
        store.insert(&account("A1", dec!(100))).unwrap();
        let updated = store.update_balance("A1", dec!(-30.5)).unwrap();
        assert_eq!(updated.balance, dec!(69.5));
        assert_eq!(store.fetch::<Account>("A1").unwrap().balance, dec!(69.5));
        assert!(matches!(
            store.update_balance("A9", dec!(1)),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_update_balance_overflow_is_rejected() {
        let mut store = MemoryStore::new();
        store.insert(&account("A1", Decimal::MAX)).unwrap();
        assert!(matches!(
            store.update_balance("A1", dec!(1)),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(store.fetch::<Account>("A1").unwrap().balance, Decimal::MAX);
    }

    #[test]
    fn test_update_customer_profile_keeps_accounts() {
        let mut store = MemoryStore::new();
        let mut stored = customer("C1");
        stored.account_ids.push("A1".into());
        store.insert(&stored).unwrap();

        let updated = store
            .update_customer_profile("C1", "Bob", "Builder", "secret")
            .unwrap();
        assert_eq!(updated.name, "Bob");
        assert_eq!(updated.surname, "Builder");
        assert_eq!(updated.password, "secret");
        assert_eq!(updated.account_ids, vec!["A1"]);
    }
}

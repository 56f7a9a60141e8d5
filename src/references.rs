//! Back-reference bookkeeping between accounts and their owners.
//!
//! An account's `bankID` and `customerID` fields are mirrored by three other
//! representations: the bank's `accountIDs`, the customer's `accountIDs` and
//! the composite index row. Linking and unlinking keep all four in step;
//! [`audit`] detects drift and [`rebuild`] repairs it, treating the account's
//! own foreign keys as authoritative.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::codec::Kind;
use crate::entities::{Account, Bank, Customer};
use crate::index::{self, AccountIndexEntry};
use crate::repository::EntityStore;
use crate::stores::RecordStore;
use crate::Result;

/// Records a freshly created account on its bank, its customer and the index.
pub fn link_account<S: RecordStore + ?Sized>(store: &mut S, account: &Account) -> Result<()> {
    let mut bank = store.fetch::<Bank>(&account.bank_id)?;
    bank.account_ids.push(account.account_id.clone());
    store.save(&bank)?;

    let mut customer = store.fetch::<Customer>(&account.customer_id)?;
    customer.account_ids.push(account.account_id.clone());
    store.save(&customer)?;

    index::put_account_entry(
        store,
        &account.bank_id,
        &account.account_id,
        &account.customer_id,
    )
}

/// Drops a deleted account from its bank, its customer and the index.
pub fn unlink_account<S: RecordStore + ?Sized>(store: &mut S, account: &Account) -> Result<()> {
    let mut bank = store.fetch::<Bank>(&account.bank_id)?;
    if remove_first(&mut bank.account_ids, &account.account_id) {
        store.save(&bank)?;
    }

    let mut customer = store.fetch::<Customer>(&account.customer_id)?;
    if remove_first(&mut customer.account_ids, &account.account_id) {
        store.save(&customer)?;
    }

    index::delete_account_entry(store, &account.bank_id, &account.account_id)
}

/// Removes the first occurrence of `id`. Returns whether anything was removed.
pub fn remove_first(ids: &mut Vec<String>, id: &str) -> bool {
    match ids.iter().position(|candidate| candidate == id) {
        Some(pos) => {
            ids.remove(pos);
            true
        }
        None => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// The owner lists an account that does not exist.
    Dangling {
        owner: Kind,
        owner_id: String,
        account_id: String,
    },
    /// The owner lists an account that names a different owner.
    Misplaced {
        owner: Kind,
        owner_id: String,
        account_id: String,
    },
    /// The owner lists the same account more than once.
    Duplicate {
        owner: Kind,
        owner_id: String,
        account_id: String,
    },
    /// The account names an owner that does not list it.
    Unlisted {
        owner: Kind,
        owner_id: String,
        account_id: String,
    },
    /// The account names an owner that does not exist.
    Orphaned {
        owner: Kind,
        owner_id: String,
        account_id: String,
    },
    MissingIndexEntry {
        bank_id: String,
        account_id: String,
    },
    StaleIndexEntry {
        bank_id: String,
        account_id: String,
    },
}

fn owner_of(kind: Kind, account: &Account) -> &str {
    match kind {
        Kind::Customer => &account.customer_id,
        _ => &account.bank_id,
    }
}

fn audit_owner_lists(
    kind: Kind,
    lists: &[(String, Vec<String>)],
    accounts: &HashMap<String, Account>,
    violations: &mut Vec<Violation>,
) {
    let mut listed: HashSet<(&str, &str)> = HashSet::new();
    for (owner_id, account_ids) in lists {
        for account_id in account_ids {
            let violation = if !listed.insert((owner_id.as_str(), account_id.as_str())) {
                Violation::Duplicate {
                    owner: kind,
                    owner_id: owner_id.clone(),
                    account_id: account_id.clone(),
                }
            } else {
                match accounts.get(account_id) {
                    None => Violation::Dangling {
                        owner: kind,
                        owner_id: owner_id.clone(),
                        account_id: account_id.clone(),
                    },
                    Some(account) if owner_of(kind, account) != owner_id.as_str() => {
                        Violation::Misplaced {
                            owner: kind,
                            owner_id: owner_id.clone(),
                            account_id: account_id.clone(),
                        }
                    }
                    Some(_) => continue,
                }
            };
            violations.push(violation);
        }
    }

    let owners: HashSet<&str> = lists.iter().map(|(owner_id, _)| owner_id.as_str()).collect();
    let mut account_ids: Vec<&String> = accounts.keys().collect();
    account_ids.sort();
    for account_id in account_ids {
        let owner_id = owner_of(kind, &accounts[account_id]);
        if !owners.contains(owner_id) {
            violations.push(Violation::Orphaned {
                owner: kind,
                owner_id: owner_id.to_owned(),
                account_id: account_id.clone(),
            });
        } else if !listed.contains(&(owner_id, account_id.as_str())) {
            violations.push(Violation::Unlisted {
                owner: kind,
                owner_id: owner_id.to_owned(),
                account_id: account_id.clone(),
            });
        }
    }
}

fn expected_index(accounts: &HashMap<String, Account>) -> HashSet<AccountIndexEntry> {
    accounts
        .values()
        .map(|account| AccountIndexEntry {
            bank_id: account.bank_id.clone(),
            account_id: account.account_id.clone(),
            customer_id: account.customer_id.clone(),
        })
        .collect()
}

/// Lists every place where the four representations of account ownership disagree.
pub fn audit<S: RecordStore + ?Sized>(store: &S) -> Result<Vec<Violation>> {
    let accounts: HashMap<String, Account> = store
        .list::<Account>()?
        .into_iter()
        .map(|account| (account.account_id.clone(), account))
        .collect();
    let banks: Vec<(String, Vec<String>)> = store
        .list::<Bank>()?
        .into_iter()
        .map(|bank| (bank.bank_id, bank.account_ids))
        .collect();
    let customers: Vec<(String, Vec<String>)> = store
        .list::<Customer>()?
        .into_iter()
        .map(|customer| (customer.customer_id, customer.account_ids))
        .collect();

    let mut violations = Vec::new();
    audit_owner_lists(Kind::Bank, &banks, &accounts, &mut violations);
    audit_owner_lists(Kind::Customer, &customers, &accounts, &mut violations);

    let expected = expected_index(&accounts);
    let actual = index::scan_account_entries(store, None)?;
    let actual_set: HashSet<&AccountIndexEntry> = actual.iter().collect();
    for entry in &actual {
        if !expected.contains(entry) {
            violations.push(Violation::StaleIndexEntry {
                bank_id: entry.bank_id.clone(),
                account_id: entry.account_id.clone(),
            });
        }
    }
    let mut missing: Vec<&AccountIndexEntry> = expected
        .iter()
        .filter(|entry| !actual_set.contains(entry))
        .collect();
    missing.sort_by(|a, b| a.account_id.cmp(&b.account_id));
    for entry in missing {
        violations.push(Violation::MissingIndexEntry {
            bank_id: entry.bank_id.clone(),
            account_id: entry.account_id.clone(),
        });
    }

    Ok(violations)
}

/// Rewrites `ids` so it holds exactly the accounts in `owned`, keeping the
/// surviving order and appending the missing ones. Returns `None` if unchanged.
fn reconcile(ids: &[String], owned: &[&str]) -> Option<Vec<String>> {
    let owned_set: HashSet<&str> = owned.iter().copied().collect();
    let mut seen = HashSet::new();
    let mut rebuilt: Vec<String> = ids
        .iter()
        .filter(|id| owned_set.contains(id.as_str()) && seen.insert(id.as_str()))
        .cloned()
        .collect();
    for id in owned {
        if !seen.contains(id) {
            rebuilt.push((*id).to_owned());
        }
    }
    (rebuilt.as_slice() != ids).then_some(rebuilt)
}

/// Repairs back-reference lists and the index from the accounts' own foreign
/// keys. Accounts whose owner is gone stay orphaned. Returns the number of
/// records written or deleted.
pub fn rebuild<S: RecordStore + ?Sized>(store: &mut S) -> Result<usize> {
    let accounts = store.list::<Account>()?;
    let mut by_bank: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut by_customer: HashMap<&str, Vec<&str>> = HashMap::new();
    for account in &accounts {
        by_bank
            .entry(&account.bank_id)
            .or_default()
            .push(&account.account_id);
        by_customer
            .entry(&account.customer_id)
            .or_default()
            .push(&account.account_id);
    }

    let mut writes = 0;
    for mut bank in store.list::<Bank>()? {
        let owned = by_bank.get(bank.bank_id.as_str()).cloned().unwrap_or_default();
        if let Some(ids) = reconcile(&bank.account_ids, &owned) {
            debug!(bank = %bank.bank_id, "rewriting bank account list");
            bank.account_ids = ids;
            store.save(&bank)?;
            writes += 1;
        }
    }
    for mut customer in store.list::<Customer>()? {
        let owned = by_customer
            .get(customer.customer_id.as_str())
            .cloned()
            .unwrap_or_default();
        if let Some(ids) = reconcile(&customer.account_ids, &owned) {
            debug!(customer = %customer.customer_id, "rewriting customer account list");
            customer.account_ids = ids;
            store.save(&customer)?;
            writes += 1;
        }
    }

    let expected: HashMap<(String, String), String> = accounts
        .iter()
        .map(|account| {
            (
                (account.bank_id.clone(), account.account_id.clone()),
                account.customer_id.clone(),
            )
        })
        .collect();
    let mut present = HashSet::new();
    for entry in index::scan_account_entries(&*store, None)? {
        let key = (entry.bank_id.clone(), entry.account_id.clone());
        match expected.get(&key) {
            Some(customer_id) if *customer_id == entry.customer_id => {
                present.insert(key);
            }
            _ => {
                index::delete_account_entry(store, &entry.bank_id, &entry.account_id)?;
                writes += 1;
            }
        }
    }
    for ((bank_id, account_id), customer_id) in &expected {
        if !present.contains(&(bank_id.clone(), account_id.clone())) {
            index::put_account_entry(store, bank_id, account_id, customer_id)?;
            writes += 1;
        }
    }

    Ok(writes)
}

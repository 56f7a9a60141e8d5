//! Composite-key secondary index.
//!
//! A composite key packs an object type and its attributes into one store key:
//! `\0{object_type}\0{attr}\0{attr}\0`. The leading separator keeps index keys
//! apart from entity keys, and the trailing separator makes every partial key
//! a strict prefix, so `("Account", ["B1"])` never matches bank `B10`.
//!
//! The only index maintained today maps `("Account", bankID, accountID)` to the
//! owning customer ID, answering "which customers bank here" without reading
//! every account.

use crate::codec::SEPARATOR;
use crate::stores::RecordStore;
use crate::{Error, Result};

pub const ACCOUNT_BY_BANK: &str = "Account";

pub fn composite_key(object_type: &str, attributes: &[&str]) -> String {
    let mut key = String::new();
    key.push(SEPARATOR);
    key.push_str(object_type);
    key.push(SEPARATOR);
    for attribute in attributes {
        key.push_str(attribute);
        key.push(SEPARATOR);
    }
    key
}

/// Prefix covering every key of `object_type` starting with `attributes`.
pub fn partial_key(object_type: &str, attributes: &[&str]) -> String {
    composite_key(object_type, attributes)
}

pub fn split_composite_key(key: &str) -> Result<(String, Vec<String>)> {
    let malformed = || Error::CorruptRecord {
        key: key.to_owned(),
        reason: "malformed composite key".to_owned(),
    };
    let body = key
        .strip_prefix(SEPARATOR)
        .and_then(|rest| rest.strip_suffix(SEPARATOR))
        .ok_or_else(malformed)?;
    let mut parts = body.split(SEPARATOR).map(str::to_owned);
    let object_type = parts.next().filter(|t| !t.is_empty()).ok_or_else(malformed)?;
    Ok((object_type, parts.collect()))
}

/// One row of the bank -> account -> customer index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountIndexEntry {
    pub bank_id: String,
    pub account_id: String,
    pub customer_id: String,
}

pub fn put_account_entry<S: RecordStore + ?Sized>(
    store: &mut S,
    bank_id: &str,
    account_id: &str,
    customer_id: &str,
) -> Result<()> {
    let key = composite_key(ACCOUNT_BY_BANK, &[bank_id, account_id]);
    store.put(&key, customer_id.as_bytes().to_vec())
}

pub fn delete_account_entry<S: RecordStore + ?Sized>(
    store: &mut S,
    bank_id: &str,
    account_id: &str,
) -> Result<()> {
    store.delete(&composite_key(ACCOUNT_BY_BANK, &[bank_id, account_id]))
}

/// Index rows for one bank, or for every bank when `bank_id` is `None`.
pub fn scan_account_entries<S: RecordStore + ?Sized>(
    store: &S,
    bank_id: Option<&str>,
) -> Result<Vec<AccountIndexEntry>> {
    let prefix = match bank_id {
        Some(bank_id) => partial_key(ACCOUNT_BY_BANK, &[bank_id]),
        None => partial_key(ACCOUNT_BY_BANK, &[]),
    };
    store
        .scan_prefix(&prefix)?
        .into_iter()
        .map(|(key, value)| {
            let (_, attributes) = split_composite_key(&key)?;
            let [bank_id, account_id]: [String; 2] =
                attributes.try_into().map_err(|_| Error::CorruptRecord {
                    key: key.clone(),
                    reason: "expected bank and account attributes".to_owned(),
                })?;
            let customer_id = String::from_utf8(value).map_err(|err| Error::CorruptRecord {
                key,
                reason: err.to_string(),
            })?;
            Ok(AccountIndexEntry {
                bank_id,
                account_id,
                customer_id,
            })
        })
        .collect()
}

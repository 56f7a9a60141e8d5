use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::codec::Kind;
use crate::engine::NewBank;
use crate::entities::{Account, Bank};
use crate::repository::BankProfile;
use crate::settlement::PaymentOrder;
use crate::Error;

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    CreateBank,
    CreateCustomer,
    CreateAccount,
    CreatePayment,
    UpdateProfile,
    UpdateBankProfile,
    UpdateBalance,
    DeleteAccount,
}

/// One row of a journal file. Which columns are required depends on `type`.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct JournalEntry {
    #[serde(rename = "type")]
    pub op: OperationType,
    pub id: Option<String>,
    pub bank: Option<String>,
    pub customer: Option<String>,
    pub sender_account: Option<String>,
    pub receiver_account: Option<String>,
    pub sender_customer: Option<String>,
    pub receiver_customer: Option<String>,
    pub admin: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub password: Option<String>,
    pub country: Option<String>,
    pub currency: Option<String>,
    pub amount: Option<Decimal>,
    pub rate: Option<Decimal>,
    pub date: Option<String>,
}

/// A journal row checked for the columns its operation needs.
#[derive(Debug, PartialEq)]
pub enum Command {
    CreateBank(NewBank),
    CreateCustomer {
        customer_id: String,
        password: String,
        name: String,
        surname: String,
    },
    CreateAccount {
        account_id: String,
        customer_id: String,
        bank_id: String,
        balance: Decimal,
    },
    /// `exchange_rate` is `None` when the row leaves pricing to a rate table.
    CreatePayment {
        order: PaymentOrder,
        exchange_rate: Option<Decimal>,
    },
    UpdateProfile {
        customer_id: String,
        name: String,
        surname: String,
        password: String,
    },
    UpdateBankProfile {
        bank_id: String,
        profile: BankProfile,
    },
    UpdateBalance {
        account_id: String,
        delta: Decimal,
    },
    DeleteAccount {
        account_id: String,
    },
}

fn required<T>(value: Option<T>, column: &str, op: OperationType) -> Result<T, Error> {
    value.ok_or_else(|| Error::InvalidArgument(format!("{op:?} row is missing `{column}`")))
}

impl TryFrom<JournalEntry> for Command {
    type Error = Error;

    fn try_from(row: JournalEntry) -> Result<Self, Error> {
        let op = row.op;
        let text = |value: Option<String>| value.unwrap_or_default();
        let command = match op {
            OperationType::CreateBank => Command::CreateBank(NewBank {
                bank_id: required(row.id, "id", op)?,
                bank_admin_id: text(row.admin),
                name: required(row.name, "name", op)?,
                password: text(row.password),
                country: text(row.country),
                currency: required(row.currency, "currency", op)?,
                reserves: row.amount.unwrap_or_default(),
                exchange_rate: row.rate.unwrap_or(Decimal::ONE),
            }),
            OperationType::CreateCustomer => Command::CreateCustomer {
                customer_id: required(row.id, "id", op)?,
                password: text(row.password),
                name: required(row.name, "name", op)?,
                surname: text(row.surname),
            },
            OperationType::CreateAccount => Command::CreateAccount {
                account_id: required(row.id, "id", op)?,
                customer_id: required(row.customer, "customer", op)?,
                bank_id: required(row.bank, "bank", op)?,
                balance: row.amount.unwrap_or_default(),
            },
            OperationType::CreatePayment => Command::CreatePayment {
                order: PaymentOrder {
                    payment_id: required(row.id, "id", op)?,
                    sender_account_id: required(row.sender_account, "sender_account", op)?,
                    receiver_account_id: required(row.receiver_account, "receiver_account", op)?,
                    sender_customer_id: required(row.sender_customer, "sender_customer", op)?,
                    receiver_customer_id: required(
                        row.receiver_customer,
                        "receiver_customer",
                        op,
                    )?,
                    amount: required(row.amount, "amount", op)?,
                    // Placeholder until the runner prices the row
                    exchange_rate: row.rate.unwrap_or(Decimal::ONE),
                    date: text(row.date),
                },
                exchange_rate: row.rate,
            },
            OperationType::UpdateProfile => Command::UpdateProfile {
                customer_id: required(row.id, "id", op)?,
                name: required(row.name, "name", op)?,
                surname: text(row.surname),
                password: text(row.password),
            },
            OperationType::UpdateBankProfile => Command::UpdateBankProfile {
                bank_id: required(row.id, "id", op)?,
                profile: BankProfile {
                    name: required(row.name, "name", op)?,
                    country: text(row.country),
                },
            },
            OperationType::UpdateBalance => Command::UpdateBalance {
                account_id: required(row.id, "id", op)?,
                delta: required(row.amount, "amount", op)?,
            },
            OperationType::DeleteAccount => Command::DeleteAccount {
                account_id: required(row.id, "id", op)?,
            },
        };
        Ok(command)
    }
}

/// One line of the ledger snapshot written after a run.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct LedgerRow {
    pub kind: Kind,
    pub id: String,
    pub bank: String,
    pub currency: String,
    /// Reserves for banks, balance for accounts.
    pub balance: Decimal,
}

impl From<Bank> for LedgerRow {
    fn from(bank: Bank) -> Self {
        Self {
            kind: Kind::Bank,
            bank: bank.bank_id.clone(),
            id: bank.bank_id,
            currency: bank.currency,
            balance: bank.reserves.normalize(),
        }
    }
}

impl From<Account> for LedgerRow {
    fn from(account: Account) -> Self {
        Self {
            kind: Kind::Account,
            id: account.account_id,
            bank: account.bank_id,
            currency: account.currency,
            balance: account.balance.normalize(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const HEADER: &str = "type,id,bank,customer,sender_account,receiver_account,sender_customer,receiver_customer,admin,name,surname,password,country,currency,amount,rate,date";

    fn parse_csv_row(row: &str) -> Result<JournalEntry, csv::Error> {
        let data_with_header = format!("{}\n{}", HEADER, row);
        let mut reader = csv::Reader::from_reader(data_with_header.as_bytes());
        reader.deserialize().next().unwrap()
    }

    #[test]
    fn test_parse_create_bank() {
        let row = parse_csv_row("create_bank,B1,,,,,,,boss,BankOne,,pw,US,USD,1000,1.0,").unwrap();
        assert_eq!(
            Command::try_from(row).unwrap(),
            Command::CreateBank(NewBank {
                bank_id: "B1".into(),
                bank_admin_id: "boss".into(),
                name: "BankOne".into(),
                password: "pw".into(),
                country: "US".into(),
                currency: "USD".into(),
                reserves: dec!(1000),
                exchange_rate: dec!(1.0),
            })
        );
    }

    #[test]
    fn test_parse_create_account() {
        let row = parse_csv_row("create_account,A1,B1,C1,,,,,,,,,,,100.50,,").unwrap();
        assert_eq!(row.amount, Some(dec!(100.50)));
        assert_eq!(row.name, None);
        assert_eq!(
            Command::try_from(row).unwrap(),
            Command::CreateAccount {
                account_id: "A1".into(),
                customer_id: "C1".into(),
                bank_id: "B1".into(),
                balance: dec!(100.50),
            }
        );
    }

    #[test]
    fn test_parse_create_payment_without_rate() {
        let row = parse_csv_row("create_payment,P1,,,A1,A2,C1,C2,,,,,,,50,,2024-01-01").unwrap();
        match Command::try_from(row).unwrap() {
            Command::CreatePayment {
                order,
                exchange_rate,
            } => {
                assert_eq!(exchange_rate, None);
                assert_eq!(order.amount, dec!(50));
                assert_eq!(order.sender_account_id, "A1");
                assert_eq!(order.receiver_customer_id, "C2");
                assert_eq!(order.date, "2024-01-01");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_missing_required_column() {
        let row = parse_csv_row("create_payment,P1,,,A1,A2,C1,C2,,,,,,,,0.9,").unwrap();
        assert!(matches!(
            Command::try_from(row),
            Err(Error::InvalidArgument(msg)) if msg.contains("amount")
        ));
    }

    #[test]
    fn test_parse_invalid_operation_type() {
        assert!(parse_csv_row("transfer_all,P1,,,,,,,,,,,,,,,").is_err());
        assert!(parse_csv_row(",P1,,,,,,,,,,,,,,,").is_err());
    }

    #[test]
    fn test_parse_invalid_amount_format() {
        assert!(parse_csv_row("update_balance,A1,,,,,,,,,,,,,abc,,").is_err());
    }

    #[test]
    fn test_ledger_row_normalizes_balance() {
        let row = LedgerRow::from(Account {
            account_id: "A2".into(),
            customer_id: "C2".into(),
            bank_id: "B2".into(),
            balance: dec!(45.00),
            currency: "EUR".into(),
            payment_ids: vec![],
        });
        assert_eq!(row.balance.to_string(), "45");
        assert_eq!(row.kind, Kind::Account);
    }
}

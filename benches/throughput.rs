use border_ledger::{run, Engine, NewBank, PaymentOrder};
use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::io;
use std::time::Duration;

const ACCOUNTS: usize = 1_000;
const PAYMENTS: usize = 10_000;

struct NoopWriter;

impl io::Write for NoopWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // Just return the length of input without actually writing
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Two banks in different currencies with `ACCOUNTS` funded accounts each.
fn seeded_engine() -> Engine {
    let mut engine = Engine::new();
    for (bank, currency) in [("B1", "USD"), ("B2", "EUR")] {
        engine
            .create_bank(NewBank {
                bank_id: bank.into(),
                bank_admin_id: String::new(),
                name: bank.into(),
                password: String::new(),
                country: String::new(),
                currency: currency.into(),
                reserves: Decimal::ZERO,
                exchange_rate: Decimal::ONE,
            })
            .unwrap();
    }
    for i in 0..ACCOUNTS {
        let customer = format!("C{i}");
        engine.create_customer(&customer, "", "", "").unwrap();
        let bank = if i % 2 == 0 { "B1" } else { "B2" };
        engine
            .create_account(&format!("A{i}"), &customer, bank, dec!(1000000))
            .unwrap();
    }
    engine
}

fn settle_payments(c: &mut Criterion) {
    let mut group = c.benchmark_group("throughput");

    group.throughput(Throughput::Elements(PAYMENTS as u64));
    group.measurement_time(Duration::from_secs(30));
    group.sample_size(20);

    group.bench_function("settle_10K_cross_currency_payments", |b| {
        b.iter_batched(
            seeded_engine,
            |mut engine| {
                for p in 0..PAYMENTS {
                    let from = p % ACCOUNTS;
                    let to = (p + 1) % ACCOUNTS;
                    engine
                        .create_payment(PaymentOrder {
                            payment_id: format!("P{p}"),
                            sender_account_id: format!("A{from}"),
                            receiver_account_id: format!("A{to}"),
                            sender_customer_id: format!("C{from}"),
                            receiver_customer_id: format!("C{to}"),
                            amount: dec!(1.25),
                            exchange_rate: dec!(0.9),
                            date: "2024-01-01".into(),
                        })
                        .unwrap();
                }
                engine
            },
            BatchSize::LargeInput,
        );
    });

    group.bench_function("replay_happy_path_journal", |b| {
        b.iter(|| {
            run("data/happy_path.csv", None, NoopWriter).unwrap();
        });
    });

    group.finish();
}

criterion_group!(benches, settle_payments);
criterion_main!(benches);

//! Synthetic datasets shared by the unit tests of this crate.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use drift_core::models::{Dataset, EventRecord};

/// A single record at noon on the given day with neutral values.
pub(crate) fn record_at(year: i32, month: u32, day: u32) -> EventRecord {
    EventRecord {
        timestamp: Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap(),
        is_fraud: false,
        predicted_fraud: false,
        predicted_fraud_proba: 0.1,
        transaction_amount: 100.0,
        transaction_type: "purchase".to_string(),
        time_since_login_min: 5.0,
        is_first_transaction: false,
        user_tenure_months: 12.0,
    }
}

/// Recipe for one month of synthetic traffic.
///
/// Every fourth record is fraud; the first `wrong` records carry a wrong
/// prediction, so realized accuracy is `1 - wrong / rows`. Every record is
/// scored with the same `confidence`, so estimated accuracy equals it.
#[derive(Debug, Clone)]
pub(crate) struct MonthSpec {
    year: i32,
    month: u32,
    rows: usize,
    wrong: usize,
    confidence: f64,
    amount: f64,
    login: f64,
    tx_type: &'static str,
}

impl MonthSpec {
    pub(crate) fn new(year: i32, month: u32) -> Self {
        Self {
            year,
            month,
            rows: 20,
            wrong: 1,
            confidence: 0.92,
            amount: 100.0,
            login: 5.0,
            tx_type: "purchase",
        }
    }

    pub(crate) fn rows(mut self, rows: usize) -> Self {
        self.rows = rows;
        self
    }

    pub(crate) fn wrong(mut self, wrong: usize) -> Self {
        self.wrong = wrong;
        self
    }

    pub(crate) fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub(crate) fn amount(mut self, amount: f64) -> Self {
        self.amount = amount;
        self
    }

    pub(crate) fn login(mut self, login: f64) -> Self {
        self.login = login;
        self
    }

    pub(crate) fn tx_type(mut self, tx_type: &'static str) -> Self {
        self.tx_type = tx_type;
        self
    }

    pub(crate) fn records(&self) -> Vec<EventRecord> {
        (0..self.rows)
            .map(|i| {
                let day = 1 + (i % 28) as u32;
                let hour = ((i / 28) % 24) as u32;
                let is_fraud = i % 4 == 0;
                let predicted = if i < self.wrong { !is_fraud } else { is_fraud };
                EventRecord {
                    timestamp: Utc
                        .with_ymd_and_hms(self.year, self.month, day, hour, 0, 0)
                        .unwrap(),
                    is_fraud,
                    predicted_fraud: predicted,
                    predicted_fraud_proba: if predicted {
                        self.confidence
                    } else {
                        1.0 - self.confidence
                    },
                    transaction_amount: self.amount + (i % 7) as f64,
                    transaction_type: if i % 3 == 0 {
                        "transfer".to_string()
                    } else {
                        self.tx_type.to_string()
                    },
                    time_since_login_min: self.login + (i % 5) as f64,
                    is_first_transaction: i % 6 == 0,
                    user_tenure_months: 12.0 + (i % 10) as f64,
                }
            })
            .collect()
    }

    pub(crate) fn dataset(&self, name: &str) -> Dataset {
        dataset(name, std::slice::from_ref(self))
    }
}

pub(crate) fn dataset(name: &str, months: &[MonthSpec]) -> Dataset {
    let records = months.iter().flat_map(|m| m.records()).collect();
    Dataset::new(name, format!("{}.csv", name), records)
}

/// Six stable months of 2023: realized accuracy alternates 0.95 / 0.90.
pub(crate) fn reference_months() -> Vec<MonthSpec> {
    let wrong = [1, 2, 1, 2, 1, 2];
    let confidence = [0.93, 0.9, 0.93, 0.9, 0.93, 0.9];
    let amount = [100.0, 102.0, 98.0, 101.0, 99.0, 100.0];
    (0..6)
        .map(|i| {
            MonthSpec::new(2023, i as u32 + 1)
                .wrong(wrong[i])
                .confidence(confidence[i])
                .amount(amount[i])
        })
        .collect()
}

/// First half of 2024.
///
/// April degrades in both estimated and realized accuracy, May only in
/// realized accuracy (with large amounts), June only in estimated accuracy.
/// Logins move later from April on.
pub(crate) fn analysis_months() -> Vec<MonthSpec> {
    vec![
        MonthSpec::new(2024, 1).wrong(1).confidence(0.93),
        MonthSpec::new(2024, 2).wrong(2).confidence(0.9),
        MonthSpec::new(2024, 3).wrong(1).confidence(0.92),
        MonthSpec::new(2024, 4).wrong(8).confidence(0.6).login(20.0),
        MonthSpec::new(2024, 5)
            .wrong(6)
            .confidence(0.9)
            .amount(300.0)
            .login(20.0),
        MonthSpec::new(2024, 6).wrong(1).confidence(0.7).login(20.0),
    ]
}

pub(crate) fn reference_dataset() -> Dataset {
    dataset("reference", &reference_months())
}

pub(crate) fn analysis_dataset() -> Dataset {
    dataset("analysis", &analysis_months())
}

/// Write records in the on-disk CSV layout.
pub(crate) fn write_csv(dir: &Path, name: &str, records: &[EventRecord]) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        "timestamp,is_fraud,predicted_fraud,predicted_fraud_proba,transaction_amount,transaction_type,time_since_login_min,is_first_transaction,user_tenure_months"
    )
    .unwrap();
    for r in records {
        writeln!(
            file,
            "{},{},{},{},{},{},{},{},{}",
            r.timestamp.format("%Y-%m-%d %H:%M:%S"),
            u8::from(r.is_fraud),
            u8::from(r.predicted_fraud),
            r.predicted_fraud_proba,
            r.transaction_amount,
            r.transaction_type,
            r.time_since_login_min,
            u8::from(r.is_first_transaction),
            r.user_tenure_months,
        )
        .unwrap();
    }
    path
}

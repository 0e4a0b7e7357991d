//! Operation journal: summaries over committed records

use std::collections::BTreeMap;

use crate::types::*;

/// Totals derived by replaying the journal
///
/// Replay never fails: a record that would push a running total out of range
/// is noted in `anomalies` and the affected total stops being tracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalSummary {
    /// Number of registrations
    pub registrations: usize,
    /// Number of deposits
    pub deposits: usize,
    /// Number of withdrawals
    pub withdrawals: usize,
    /// Custody implied by deposits and withdrawals, `None` once out of range
    pub net_custody: Option<u128>,
    /// Number of energy status updates
    pub status_updates: usize,
    /// Energy status per subject as reconstructed from the deltas
    pub energy_by_subject: BTreeMap<Address, i128>,
    /// Range errors met while replaying
    pub anomalies: Vec<LedgerError>,
}

impl Default for JournalSummary {
    fn default() -> Self {
        Self {
            registrations: 0,
            deposits: 0,
            withdrawals: 0,
            net_custody: Some(0),
            status_updates: 0,
            energy_by_subject: BTreeMap::new(),
            anomalies: Vec::new(),
        }
    }
}

impl JournalSummary {
    /// Replay records in order
    pub fn replay<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a LedgerRecord>,
    {
        let mut summary = Self::default();

        for record in records {
            match &record.kind {
                RecordKind::Registered => summary.registrations += 1,
                RecordKind::Deposited { amount } => {
                    summary.deposits += 1;
                    if let Some(custody) = summary.net_custody {
                        summary.net_custody = custody.checked_add(*amount);
                        if summary.net_custody.is_none() {
                            summary.anomalies.push(LedgerError::ArithmeticOverflow(format!(
                                "journal custody {} cannot absorb deposit {} by {}",
                                custody, amount, record.subject
                            )));
                        }
                    }
                }
                RecordKind::Withdrawn { amount } => {
                    summary.withdrawals += 1;
                    if let Some(custody) = summary.net_custody {
                        summary.net_custody = custody.checked_sub(*amount);
                        if summary.net_custody.is_none() {
                            summary.anomalies.push(LedgerError::ArithmeticUnderflow(format!(
                                "journal custody {} is below withdrawal {} by {}",
                                custody, amount, record.subject
                            )));
                        }
                    }
                }
                RecordKind::EnergyStatusUpdated { delta, .. } => {
                    summary.status_updates += 1;
                    let status = summary
                        .energy_by_subject
                        .entry(record.subject.clone())
                        .or_default();
                    match status.checked_add(*delta) {
                        Some(next) => *status = next,
                        None => {
                            let detail = format!(
                                "journal energy {} of {} cannot take delta {}",
                                status, record.subject, delta
                            );
                            summary.anomalies.push(if *delta > 0 {
                                LedgerError::ArithmeticOverflow(detail)
                            } else {
                                LedgerError::ArithmeticUnderflow(detail)
                            });
                        }
                    }
                }
            }
        }

        summary
    }
}

/// Keep only the most recent `limit` records, preserving order
pub fn most_recent(mut records: Vec<LedgerRecord>, limit: usize) -> Vec<LedgerRecord> {
    if records.len() > limit {
        records.drain(..records.len() - limit);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(n: u8) -> Address {
        Address::parse(&format!("0x{:040x}", n)).unwrap()
    }

    fn record(kind: RecordKind, subject: u8) -> LedgerRecord {
        LedgerRecord::new(kind, address(subject), address(subject))
    }

    #[test]
    fn test_replay_totals() {
        let records = vec![
            record(RecordKind::Registered, 1),
            record(RecordKind::Deposited { amount: 50 }, 1),
            record(RecordKind::Withdrawn { amount: 20 }, 1),
            record(
                RecordKind::EnergyStatusUpdated {
                    delta: -2,
                    new_status: -2,
                },
                1,
            ),
            record(
                RecordKind::EnergyStatusUpdated {
                    delta: 5,
                    new_status: 5,
                },
                2,
            ),
            record(
                RecordKind::EnergyStatusUpdated {
                    delta: 1,
                    new_status: -1,
                },
                1,
            ),
        ];

        let summary = JournalSummary::replay(&records);
        assert_eq!(summary.registrations, 1);
        assert_eq!(summary.deposits, 1);
        assert_eq!(summary.withdrawals, 1);
        assert_eq!(summary.net_custody, Some(30));
        assert_eq!(summary.status_updates, 3);
        assert_eq!(summary.energy_by_subject[&address(1)], -1);
        assert_eq!(summary.energy_by_subject[&address(2)], 5);
        assert!(summary.anomalies.is_empty());
    }

    #[test]
    fn test_replay_tracks_net_custody_across_full_cycles() {
        let records = vec![
            record(RecordKind::Deposited { amount: u128::MAX }, 1),
            record(RecordKind::Withdrawn { amount: u128::MAX }, 1),
            record(RecordKind::Deposited { amount: u128::MAX }, 1),
            record(RecordKind::Withdrawn { amount: 7 }, 1),
        ];

        let summary = JournalSummary::replay(&records);
        assert_eq!(summary.net_custody, Some(u128::MAX - 7));
        assert!(summary.anomalies.is_empty());
    }

    #[test]
    fn test_replay_notes_custody_out_of_range() {
        let excess = vec![
            record(RecordKind::Deposited { amount: 1 }, 1),
            record(RecordKind::Withdrawn { amount: 2 }, 1),
            record(RecordKind::Deposited { amount: 5 }, 1),
        ];
        let summary = JournalSummary::replay(&excess);
        assert_eq!(summary.net_custody, None);
        assert_eq!(summary.anomalies.len(), 1);
        assert!(matches!(
            summary.anomalies[0],
            LedgerError::ArithmeticUnderflow(_)
        ));

        let overflow = vec![
            record(RecordKind::Deposited { amount: u128::MAX }, 1),
            record(RecordKind::Deposited { amount: 1 }, 2),
        ];
        let summary = JournalSummary::replay(&overflow);
        assert_eq!(summary.net_custody, None);
        assert!(matches!(
            summary.anomalies[..],
            [LedgerError::ArithmeticOverflow(_)]
        ));
    }

    #[test]
    fn test_replay_energy_range_keeps_sign_of_error() {
        let records = vec![
            record(
                RecordKind::EnergyStatusUpdated {
                    delta: i128::MIN,
                    new_status: i128::MIN,
                },
                1,
            ),
            record(
                RecordKind::EnergyStatusUpdated {
                    delta: -1,
                    new_status: i128::MIN,
                },
                1,
            ),
            record(
                RecordKind::EnergyStatusUpdated {
                    delta: i128::MAX,
                    new_status: i128::MAX,
                },
                2,
            ),
            record(
                RecordKind::EnergyStatusUpdated {
                    delta: 1,
                    new_status: i128::MAX,
                },
                2,
            ),
        ];

        let summary = JournalSummary::replay(&records);
        assert!(matches!(
            summary.anomalies[..],
            [
                LedgerError::ArithmeticUnderflow(_),
                LedgerError::ArithmeticOverflow(_)
            ]
        ));
        assert_eq!(summary.energy_by_subject[&address(1)], i128::MIN);
        assert_eq!(summary.energy_by_subject[&address(2)], i128::MAX);
    }

    #[test]
    fn test_most_recent() {
        let records: Vec<LedgerRecord> =
            (1..=5).map(|n| record(RecordKind::Registered, n)).collect();

        let tail = most_recent(records.clone(), 2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].subject, address(4));
        assert_eq!(tail[1].subject, address(5));

        assert_eq!(most_recent(records, 10).len(), 5);
    }
}

//! One inbox scan: identify the card, extract transactions, book rows,
//! label the thread.
//!
//! A thread is marked processed only after every message in it has been
//! booked. A failing thread is left unlabeled so the next scan retries it;
//! rows already appended for earlier messages of that thread stay where
//! they are (appends are at-least-once, there is no rollback).

use tracing::{info, warn};

use kinisi_core::{ServiceError, UserConfig};
use kinisi_ingest::{CardIdentifier, TransactionExtractor};

use crate::mail::{MailGateway, MessageRef, ThreadRef};
use crate::sheets::{transaction_row, SheetWriter};

/// Outcome of one scan.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub threads_seen: usize,
    pub threads_processed: usize,
    pub threads_failed: usize,
}

pub struct Workflow<M, S> {
    mail: M,
    sheets: S,
    identifier: CardIdentifier,
    extractor: TransactionExtractor,
}

impl<M: MailGateway, S: SheetWriter> Workflow<M, S> {
    pub fn new(config: &UserConfig, mail: M, sheets: S) -> Result<Workflow<M, S>, ServiceError> {
        Ok(Workflow {
            mail,
            sheets,
            identifier: CardIdentifier::new(&config.cards)?,
            extractor: TransactionExtractor::new(&config.locale)?,
        })
    }

    /// Scan the inbox once. Threads are handled strictly in order; one
    /// thread's failure is logged and the scan moves on to the next.
    pub async fn execute(&self) -> Result<ScanSummary, ServiceError> {
        info!("starting the email processing workflow");
        let threads = self.mail.unprocessed_threads().await?;
        info!("found {} email threads to process", threads.len());

        let mut summary = ScanSummary {
            threads_seen: threads.len(),
            ..ScanSummary::default()
        };
        for thread in &threads {
            match self.process_thread(thread).await {
                Ok(()) => summary.threads_processed += 1,
                Err(e) => {
                    warn!("thread {} left unprocessed: {e}", thread.id);
                    summary.threads_failed += 1;
                }
            }
        }
        info!("workflow completed");
        Ok(summary)
    }

    /// Every message must succeed before the thread gets the processed
    /// label.
    async fn process_thread(&self, thread: &ThreadRef) -> Result<(), ServiceError> {
        let messages = self.mail.messages(thread).await?;
        for message in &messages {
            self.process_message(message).await?;
        }
        self.mail.mark_processed(thread).await
    }

    async fn process_message(&self, message: &MessageRef) -> Result<(), ServiceError> {
        let body = self.mail.plain_body(message).await?;
        let card = self
            .identifier
            .identify(&body)
            .ok_or(ServiceError::NoCardIdentified)?;
        info!("card identified: {}", card.name);

        let transactions = self.extractor.extract(&body, &card.name)?;
        if transactions.is_empty() {
            return Err(ServiceError::NoTransactionsFound);
        }
        info!("extracted {} transactions", transactions.len());

        let rows = transactions.iter().map(transaction_row).collect();
        self.sheets.append_rows(&card.sheet_name, rows).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Mutex;

    use kinisi_core::CardSpec;

    const REPORT_BODY: &str = "\
Σύνολο Κινήσεων Κάρτας **1234
ΧΡΕΩΣΗ 50,00 Ημ/νία: 01/01/2024 Αιτιολογία: Test Purchase Έξοδα Συναλλάγματος: 0,00 Έξοδα Ανάληψης Μετρητών: 0,00
ΠΙΣΤΩΣΗ 1.600,00 Ημ/νία: 03/05/2025 Αιτιολογία: ΠΛ. ΚΑΡΤΑΣ WEB/EUROP Έξοδα Συναλλάγματος: 0,00 Έξοδα Ανάληψης Μετρητών: 0,00
";

    /// In-memory mail service. A body of `None` simulates a message whose
    /// body cannot be read.
    struct FakeMail {
        threads: Vec<(String, Vec<(String, Option<String>)>)>,
        processed: Mutex<Vec<String>>,
    }

    impl FakeMail {
        fn new(threads: Vec<(&str, Vec<(&str, Option<&str>)>)>) -> FakeMail {
            FakeMail {
                threads: threads
                    .into_iter()
                    .map(|(thread_id, messages)| {
                        (
                            thread_id.to_string(),
                            messages
                                .into_iter()
                                .map(|(id, body)| (id.to_string(), body.map(str::to_string)))
                                .collect(),
                        )
                    })
                    .collect(),
                processed: Mutex::new(Vec::new()),
            }
        }

        fn processed_ids(&self) -> Vec<String> {
            self.processed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MailGateway for FakeMail {
        async fn unprocessed_threads(&self) -> Result<Vec<ThreadRef>, ServiceError> {
            Ok(self
                .threads
                .iter()
                .map(|(id, _)| ThreadRef { id: id.clone() })
                .collect())
        }

        async fn messages(&self, thread: &ThreadRef) -> Result<Vec<MessageRef>, ServiceError> {
            let (_, messages) = self
                .threads
                .iter()
                .find(|(id, _)| *id == thread.id)
                .ok_or_else(|| ServiceError::Mail(format!("unknown thread {}", thread.id)))?;
            Ok(messages
                .iter()
                .map(|(id, _)| MessageRef { id: id.clone() })
                .collect())
        }

        async fn plain_body(&self, message: &MessageRef) -> Result<String, ServiceError> {
            let body = self
                .threads
                .iter()
                .flat_map(|(_, messages)| messages.iter())
                .find(|(id, _)| *id == message.id)
                .and_then(|(_, body)| body.clone());
            body.ok_or_else(|| ServiceError::Mail(format!("failed to read body of {}", message.id)))
        }

        async fn mark_processed(&self, thread: &ThreadRef) -> Result<(), ServiceError> {
            self.processed.lock().unwrap().push(thread.id.clone());
            Ok(())
        }
    }

    /// In-memory sheet store keyed by tab name.
    struct FakeSheets {
        known_sheets: Vec<String>,
        appended: Mutex<HashMap<String, Vec<Vec<Value>>>>,
    }

    impl FakeSheets {
        fn new(known_sheets: &[&str]) -> FakeSheets {
            FakeSheets {
                known_sheets: known_sheets.iter().map(|s| s.to_string()).collect(),
                appended: Mutex::new(HashMap::new()),
            }
        }

        fn rows_for(&self, sheet_name: &str) -> Vec<Vec<Value>> {
            self.appended
                .lock()
                .unwrap()
                .get(sheet_name)
                .cloned()
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl SheetWriter for FakeSheets {
        async fn append_rows(
            &self,
            sheet_name: &str,
            rows: Vec<Vec<Value>>,
        ) -> Result<(), ServiceError> {
            if !self.known_sheets.iter().any(|s| s == sheet_name) {
                return Err(ServiceError::SheetNotFound(sheet_name.to_string()));
            }
            self.appended
                .lock()
                .unwrap()
                .entry(sheet_name.to_string())
                .or_default()
                .extend(rows);
            Ok(())
        }
    }

    fn test_config() -> UserConfig {
        UserConfig {
            cards: vec![CardSpec {
                name: "Test Card".to_string(),
                last_four_digits: "1234".to_string(),
                sheet_name: "Test Sheet".to_string(),
            }],
            spreadsheet_id: "123".to_string(),
            locale: "el-GR".to_string(),
        }
    }

    #[tokio::test]
    async fn test_books_report_thread_and_marks_it_processed() {
        let mail = FakeMail::new(vec![("t1", vec![("m1", Some(REPORT_BODY))])]);
        let sheets = FakeSheets::new(&["Test Sheet"]);
        let workflow = Workflow::new(&test_config(), mail, sheets).unwrap();

        let summary = workflow.execute().await.unwrap();
        assert_eq!(
            summary,
            ScanSummary {
                threads_seen: 1,
                threads_processed: 1,
                threads_failed: 0
            }
        );

        let rows = workflow.sheets.rows_for("Test Sheet");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][5], json!(50.0));
        assert_eq!(rows[1][5], json!(-1600.0));
        assert_eq!(workflow.mail.processed_ids(), vec!["t1".to_string()]);
    }

    #[tokio::test]
    async fn test_unreadable_body_parks_thread_but_scan_continues() {
        let mail = FakeMail::new(vec![
            ("t1", vec![("m1", None)]),
            ("t2", vec![("m2", Some(REPORT_BODY))]),
        ]);
        let sheets = FakeSheets::new(&["Test Sheet"]);
        let workflow = Workflow::new(&test_config(), mail, sheets).unwrap();

        let summary = workflow.execute().await.unwrap();
        assert_eq!(summary.threads_processed, 1);
        assert_eq!(summary.threads_failed, 1);
        // The broken thread stays unlabeled for the next run.
        assert_eq!(workflow.mail.processed_ids(), vec!["t2".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_card_parks_thread() {
        let mail = FakeMail::new(vec![(
            "t1",
            vec![("m1", Some("Σύνολο Κινήσεων Κάρτας **9999\nΧΡΕΩΣΗ 5,00"))],
        )]);
        let sheets = FakeSheets::new(&["Test Sheet"]);
        let workflow = Workflow::new(&test_config(), mail, sheets).unwrap();

        let summary = workflow.execute().await.unwrap();
        assert_eq!(summary.threads_failed, 1);
        assert!(workflow.mail.processed_ids().is_empty());
        assert!(workflow.sheets.rows_for("Test Sheet").is_empty());
    }

    #[tokio::test]
    async fn test_marker_without_transactions_is_a_failure() {
        let mail = FakeMail::new(vec![(
            "t1",
            vec![("m1", Some("Σύνολο Κινήσεων Κάρτας **1234\nno movements\n"))],
        )]);
        let sheets = FakeSheets::new(&["Test Sheet"]);
        let workflow = Workflow::new(&test_config(), mail, sheets).unwrap();

        let summary = workflow.execute().await.unwrap();
        assert_eq!(summary.threads_failed, 1);
        assert!(workflow.mail.processed_ids().is_empty());
    }

    #[tokio::test]
    async fn test_missing_sheet_parks_thread() {
        let mail = FakeMail::new(vec![("t1", vec![("m1", Some(REPORT_BODY))])]);
        let sheets = FakeSheets::new(&[]);
        let workflow = Workflow::new(&test_config(), mail, sheets).unwrap();

        let summary = workflow.execute().await.unwrap();
        assert_eq!(summary.threads_failed, 1);
        assert!(workflow.mail.processed_ids().is_empty());
    }

    #[tokio::test]
    async fn test_second_message_failure_leaves_earlier_rows() {
        // First message books fine, second fails: the thread stays
        // unprocessed but the first message's rows remain (at-least-once).
        let mail = FakeMail::new(vec![(
            "t1",
            vec![("m1", Some(REPORT_BODY)), ("m2", None)],
        )]);
        let sheets = FakeSheets::new(&["Test Sheet"]);
        let workflow = Workflow::new(&test_config(), mail, sheets).unwrap();

        let summary = workflow.execute().await.unwrap();
        assert_eq!(summary.threads_failed, 1);
        assert!(workflow.mail.processed_ids().is_empty());
        assert_eq!(workflow.sheets.rows_for("Test Sheet").len(), 2);
    }
}

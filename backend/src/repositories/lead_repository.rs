use chrono::{SecondsFormat, Utc};

use crate::models::lead_models::{ReconcileOutcome, SheetRow, StoreError, SubscribeOutcome};

/// Storage port for the lead sheet. Row numbers are 1-based because the
/// sheet is header-less and the API addresses cells that way.
pub trait LeadStore {
    /// The full email column, one entry per row; blank cells come back as
    /// empty strings.
    async fn email_column(&self) -> Result<Vec<String>, StoreError>;

    async fn append_row(&self, row: SheetRow) -> Result<(), StoreError>;

    /// Rewrite only the name cell of an existing row.
    async fn update_name(&self, row_number: u32, name: &str) -> Result<(), StoreError>;
}

pub struct LeadRepository<S> {
    store: S,
}

impl<S: LeadStore> LeadRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Case-insensitive lookup; a read failure aborts before any write.
    async fn find_row(&self, email: &str) -> Result<Option<u32>, StoreError> {
        let column = self.store.email_column().await?;
        let needle = email.to_lowercase();
        Ok(column
            .iter()
            .position(|cell| !cell.is_empty() && cell.to_lowercase() == needle)
            .map(|index| index as u32 + 1))
    }

    /// Insert-or-update for the popup flow. An existing lead keeps its
    /// timestamp and email; only the name cell is rewritten.
    pub async fn reconcile(&self, name: &str, email: &str) -> Result<ReconcileOutcome, StoreError> {
        match self.find_row(email).await? {
            Some(row_number) => {
                self.store.update_name(row_number, name).await?;
                Ok(ReconcileOutcome::Updated)
            }
            None => {
                self.store.append_row(new_row(name, email)).await?;
                Ok(ReconcileOutcome::Inserted)
            }
        }
    }

    /// Newsletter path: idempotent on an already-known email, no update.
    pub async fn subscribe(&self, email: &str) -> Result<SubscribeOutcome, StoreError> {
        if self.find_row(email).await?.is_some() {
            return Ok(SubscribeOutcome::AlreadySubscribed);
        }
        self.store.append_row(new_row("", email)).await?;
        Ok(SubscribeOutcome::Subscribed)
    }
}

fn new_row(name: &str, email: &str) -> SheetRow {
    SheetRow {
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        name: name.to_string(),
        email: email.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct MemorySheet {
        rows: Arc<Mutex<Vec<SheetRow>>>,
    }

    impl MemorySheet {
        fn seeded(rows: Vec<SheetRow>) -> Self {
            Self {
                rows: Arc::new(Mutex::new(rows)),
            }
        }

        fn rows(&self) -> Vec<SheetRow> {
            self.rows.lock().unwrap().clone()
        }
    }

    impl LeadStore for MemorySheet {
        async fn email_column(&self) -> Result<Vec<String>, StoreError> {
            Ok(self.rows.lock().unwrap().iter().map(|r| r.email.clone()).collect())
        }

        async fn append_row(&self, row: SheetRow) -> Result<(), StoreError> {
            self.rows.lock().unwrap().push(row);
            Ok(())
        }

        async fn update_name(&self, row_number: u32, name: &str) -> Result<(), StoreError> {
            let mut rows = self.rows.lock().unwrap();
            let row = rows.get_mut(row_number as usize - 1).expect("row exists");
            row.name = name.to_string();
            Ok(())
        }
    }

    /// Store whose read always fails; writes would panic if reached.
    struct BrokenSheet;

    impl LeadStore for BrokenSheet {
        async fn email_column(&self) -> Result<Vec<String>, StoreError> {
            Err(StoreError::Api {
                status: 503,
                message: "backend unavailable".into(),
            })
        }

        async fn append_row(&self, _row: SheetRow) -> Result<(), StoreError> {
            panic!("write attempted after failed read");
        }

        async fn update_name(&self, _row_number: u32, _name: &str) -> Result<(), StoreError> {
            panic!("write attempted after failed read");
        }
    }

    fn row(timestamp: &str, name: &str, email: &str) -> SheetRow {
        SheetRow {
            timestamp: timestamp.into(),
            name: name.into(),
            email: email.into(),
        }
    }

    #[tokio::test]
    async fn reconcile_appends_new_lead() {
        let sheet = MemorySheet::default();
        let repo = LeadRepository::new(sheet.clone());

        let outcome = repo.reconcile("Ana", "ana@x.com").await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::Inserted);
        let rows = sheet.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Ana");
        assert_eq!(rows[0].email, "ana@x.com");
        assert!(!rows[0].timestamp.is_empty());
    }

    #[tokio::test]
    async fn reconcile_updates_only_the_name_cell() {
        let sheet = MemorySheet::seeded(vec![
            row("2024-01-01T00:00:00.000Z", "First", "first@x.com"),
            row("2024-02-02T00:00:00.000Z", "Ana", "ana@x.com"),
        ]);
        let repo = LeadRepository::new(sheet.clone());

        let outcome = repo.reconcile("Ana2", "ana@x.com").await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::Updated);
        let rows = sheet.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].name, "Ana2");
        assert_eq!(rows[1].email, "ana@x.com");
        assert_eq!(rows[1].timestamp, "2024-02-02T00:00:00.000Z");
        assert_eq!(rows[0].name, "First");
    }

    #[tokio::test]
    async fn reconcile_matches_email_case_insensitively() {
        let sheet = MemorySheet::seeded(vec![row("t", "Ana", "Ana@X.com")]);
        let repo = LeadRepository::new(sheet.clone());

        let outcome = repo.reconcile("Ana2", "ana@x.COM").await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::Updated);
        assert_eq!(sheet.rows().len(), 1);
        assert_eq!(sheet.rows()[0].name, "Ana2");
    }

    #[tokio::test]
    async fn duplicate_submissions_converge_to_one_row() {
        let sheet = MemorySheet::default();
        let repo = LeadRepository::new(sheet.clone());

        assert_eq!(repo.reconcile("Ana", "ana@x.com").await.unwrap(), ReconcileOutcome::Inserted);
        assert_eq!(repo.reconcile("Ana2", "ana@x.com").await.unwrap(), ReconcileOutcome::Updated);

        let rows = sheet.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Ana2");
    }

    #[tokio::test]
    async fn subscribe_inserts_row_with_blank_name() {
        let sheet = MemorySheet::default();
        let repo = LeadRepository::new(sheet.clone());

        let outcome = repo.subscribe("new@x.com").await.unwrap();

        assert_eq!(outcome, SubscribeOutcome::Subscribed);
        let rows = sheet.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "");
        assert_eq!(rows[0].email, "new@x.com");
    }

    #[tokio::test]
    async fn subscribe_is_idempotent_and_writes_nothing_for_known_email() {
        let seeded = vec![row("t", "", "known@x.com")];
        let sheet = MemorySheet::seeded(seeded.clone());
        let repo = LeadRepository::new(sheet.clone());

        let outcome = repo.subscribe("KNOWN@x.com").await.unwrap();

        assert_eq!(outcome, SubscribeOutcome::AlreadySubscribed);
        assert_eq!(sheet.rows(), seeded);
    }

    #[tokio::test]
    async fn blank_cells_never_match() {
        let sheet = MemorySheet::seeded(vec![row("t", "pad", "")]);
        let repo = LeadRepository::new(sheet.clone());

        let outcome = repo.subscribe("fresh@x.com").await.unwrap();

        assert_eq!(outcome, SubscribeOutcome::Subscribed);
        assert_eq!(sheet.rows().len(), 2);
    }

    #[tokio::test]
    async fn failed_read_aborts_before_any_write() {
        let repo = LeadRepository::new(BrokenSheet);

        let err = repo.reconcile("Ana", "ana@x.com").await.unwrap_err();
        assert!(matches!(err, StoreError::Api { status: 503, .. }));

        let err = repo.subscribe("ana@x.com").await.unwrap_err();
        assert!(matches!(err, StoreError::Api { status: 503, .. }));
    }
}

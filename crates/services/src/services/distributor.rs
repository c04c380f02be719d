use db::models::{record::Record, user::User};
use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};
use serde::Serialize;
use thiserror::Error;

use crate::services::intake;

#[derive(Debug, Error)]
pub enum DistributorError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("No callers available for distribution")]
    NoCallersAvailable,
}

pub struct SheetUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Processed {
        records_found: usize,
        records_added: usize,
        skipped_duplicates: usize,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Serialize)]
pub struct FileReport {
    pub filename: String,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

#[derive(Debug, Serialize)]
pub struct CallerLoad {
    pub caller_id: i64,
    pub caller_name: String,
    pub total_records: u64,
}

#[derive(Debug, Serialize)]
pub struct BatchSummary {
    pub total_added: usize,
    pub total_skipped: usize,
    pub files_processed: usize,
    pub files_failed: usize,
    pub reports: Vec<FileReport>,
    pub caller_loads: Vec<CallerLoad>,
}

/// Distributes a batch of uploaded contact sheets across the caller pool.
///
/// Assignment is positional: within each file the contact at position `i`
/// (after dedup, counting rows later skipped as already-known) goes to
/// `callers[i % callers.len()]`, callers ordered by id. The whole batch is
/// one transaction; a file that fails to parse is reported and the rest of
/// the batch proceeds.
pub async fn distribute(
    db: &DatabaseConnection,
    sheets: Vec<SheetUpload>,
) -> Result<BatchSummary, DistributorError> {
    let callers = User::find_callers(db).await?;
    if callers.is_empty() {
        return Err(DistributorError::NoCallersAvailable);
    }

    let txn = db.begin().await?;
    let mut reports = Vec::with_capacity(sheets.len());
    let mut total_added = 0;
    let mut total_skipped = 0;
    let mut files_processed = 0;
    let mut files_failed = 0;

    for sheet in &sheets {
        let contacts = match intake::parse_sheet(&sheet.filename, &sheet.bytes) {
            Ok(contacts) => contacts,
            Err(err) => {
                tracing::warn!(file = %sheet.filename, error = %err, "skipping unusable sheet");
                files_failed += 1;
                reports.push(FileReport {
                    filename: sheet.filename.clone(),
                    outcome: FileOutcome::Failed {
                        error: err.to_string(),
                    },
                });
                continue;
            }
        };

        let mut added = 0;
        let mut skipped = 0;
        for (position, contact) in contacts.iter().enumerate() {
            let caller = &callers[position % callers.len()];
            if Record::exists_by_phone(&txn, &contact.phone).await? {
                skipped += 1;
                continue;
            }
            Record::create(&txn, Some(caller.id), &contact.phone, contact.name.as_deref())
                .await?;
            added += 1;
        }

        tracing::info!(
            file = %sheet.filename,
            found = contacts.len(),
            added,
            skipped,
            "distributed sheet"
        );
        files_processed += 1;
        total_added += added;
        total_skipped += skipped;
        reports.push(FileReport {
            filename: sheet.filename.clone(),
            outcome: FileOutcome::Processed {
                records_found: contacts.len(),
                records_added: added,
                skipped_duplicates: skipped,
            },
        });
    }

    txn.commit().await?;

    let mut caller_loads = Vec::with_capacity(callers.len());
    for caller in &callers {
        let total_records = Record::count_by_caller(db, caller.id).await?;
        caller_loads.push(CallerLoad {
            caller_id: caller.id,
            caller_name: caller.name.clone(),
            total_records,
        });
    }

    Ok(BatchSummary {
        total_added,
        total_skipped,
        files_processed,
        files_failed,
        reports,
        caller_loads,
    })
}

#[cfg(test)]
mod tests {
    use db::models::user::{CreateUser, User};
    use db::types::Role;
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;

    async fn setup_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    async fn seed_caller(db: &DatabaseConnection, name: &str, username: &str) -> User {
        User::create(
            db,
            &CreateUser {
                name: name.to_string(),
                username: username.to_string(),
                password_hash: "x".to_string(),
                role: Role::Caller,
            },
        )
        .await
        .unwrap()
    }

    fn sheet(filename: &str, body: &str) -> SheetUpload {
        SheetUpload {
            filename: filename.to_string(),
            bytes: body.as_bytes().to_vec(),
        }
    }

    #[tokio::test]
    async fn round_robin_assigns_by_position() {
        let db = setup_db().await;
        let c1 = seed_caller(&db, "C1", "c1").await;
        let c2 = seed_caller(&db, "C2", "c2").await;

        let body = "phone\n111\n222\n333\n444\n555\n";
        let summary = distribute(&db, vec![sheet("leads.csv", body)]).await.unwrap();

        assert_eq!(summary.total_added, 5);
        assert_eq!(Record::count_by_caller(&db, c1.id).await.unwrap(), 3);
        assert_eq!(Record::count_by_caller(&db, c2.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn already_known_phones_are_skipped_but_hold_their_position() {
        let db = setup_db().await;
        let c1 = seed_caller(&db, "C1", "c1").await;
        let c2 = seed_caller(&db, "C2", "c2").await;
        Record::create(&db, Some(c1.id), "222", None).await.unwrap();

        // 222 occupies position 1; 333 still lands on c1 (position 2).
        let body = "phone\n111\n222\n333\n";
        let summary = distribute(&db, vec![sheet("leads.csv", body)]).await.unwrap();

        assert_eq!(summary.total_added, 2);
        assert_eq!(summary.total_skipped, 1);
        assert_eq!(Record::count_by_caller(&db, c1.id).await.unwrap(), 3);
        assert_eq!(Record::count_by_caller(&db, c2.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn empty_caller_pool_creates_nothing() {
        let db = setup_db().await;
        let result = distribute(&db, vec![sheet("leads.csv", "phone\n111\n")]).await;
        assert!(matches!(result, Err(DistributorError::NoCallersAvailable)));
        assert!(!Record::exists_by_phone(&db, "111").await.unwrap());
    }

    #[tokio::test]
    async fn bad_file_is_reported_without_aborting_the_batch() {
        let db = setup_db().await;
        seed_caller(&db, "C1", "c1").await;

        let summary = distribute(
            &db,
            vec![
                sheet("leads.xlsx", "not a csv"),
                sheet("good.csv", "phone\n111\n"),
            ],
        )
        .await
        .unwrap();

        assert_eq!(summary.files_failed, 1);
        assert_eq!(summary.files_processed, 1);
        assert_eq!(summary.total_added, 1);
        assert!(matches!(
            summary.reports[0].outcome,
            FileOutcome::Failed { .. }
        ));
    }

    #[tokio::test]
    async fn summary_snapshot_counts_all_owned_records() {
        let db = setup_db().await;
        let c1 = seed_caller(&db, "C1", "c1").await;
        Record::create(&db, Some(c1.id), "000", None).await.unwrap();

        let summary = distribute(&db, vec![sheet("leads.csv", "phone\n111\n")])
            .await
            .unwrap();
        assert_eq!(summary.caller_loads.len(), 1);
        assert_eq!(summary.caller_loads[0].total_records, 2);
    }

    #[tokio::test]
    async fn dedup_within_a_file_counts_once() {
        let db = setup_db().await;
        seed_caller(&db, "C1", "c1").await;

        let body = "phone\n111\n111\n222\n";
        let summary = distribute(&db, vec![sheet("leads.csv", body)]).await.unwrap();
        match &summary.reports[0].outcome {
            FileOutcome::Processed {
                records_found,
                records_added,
                skipped_duplicates,
            } => {
                assert_eq!(*records_found, 2);
                assert_eq!(*records_added, 2);
                assert_eq!(*skipped_duplicates, 0);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}

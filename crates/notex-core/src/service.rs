//! Mutation API: note CRUD coupled to change notification.
//!
//! [`NoteService`] validates input, calls the persistence collaborator, and
//! only after a mutation has committed hands the authoritative record to the
//! [`ChangeNotifier`]. Validation failures, missing ids, and storage errors
//! all return before the notifier is reached, so they never produce events.
//!
//! Mutations are serialized from persistence through publication, so the
//! order subscribers observe events is the order the writes committed.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::events::{BroadcastRegistry, ChangeEvent, DeliveryReport};
use crate::models::{CreateNoteRequest, Note, NoteRef, UpdateNoteRequest};
use crate::traits::NoteRepository;

/// Builds change events for committed mutations and publishes them.
#[derive(Clone)]
pub struct ChangeNotifier {
    registry: BroadcastRegistry,
}

impl ChangeNotifier {
    pub fn new(registry: BroadcastRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &BroadcastRegistry {
        &self.registry
    }

    pub fn created(&self, note: &Note) -> DeliveryReport {
        self.registry.publish(&ChangeEvent::Created {
            note: note.clone(),
            timestamp: now_millis(),
        })
    }

    pub fn updated(&self, note: &Note) -> DeliveryReport {
        self.registry.publish(&ChangeEvent::Updated {
            note: note.clone(),
            timestamp: now_millis(),
        })
    }

    pub fn deleted(&self, id: i64) -> DeliveryReport {
        self.registry.publish(&ChangeEvent::Deleted {
            note: NoteRef { id },
            timestamp: now_millis(),
        })
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Note CRUD with live-update notification.
#[derive(Clone)]
pub struct NoteService {
    repo: Arc<dyn NoteRepository>,
    notifier: ChangeNotifier,
    /// Held from the write until its event is published.
    write_lock: Arc<Mutex<()>>,
}

impl NoteService {
    pub fn new(repo: Arc<dyn NoteRepository>, notifier: ChangeNotifier) -> Self {
        Self {
            repo,
            notifier,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    /// All notes, most recently updated first.
    pub async fn list(&self) -> Result<Vec<Note>> {
        self.repo.list().await
    }

    pub async fn get(&self, id: i64) -> Result<Note> {
        self.repo.fetch(id).await
    }

    pub async fn create(&self, req: CreateNoteRequest) -> Result<Note> {
        let new = req.validate()?;
        let start = Instant::now();
        let _guard = self.write_lock.lock().await;
        let note = self.repo.insert(new).await?;
        let report = self.notifier.created(&note);
        tracing::info!(
            subsystem = "api",
            component = "notes",
            op = "create",
            note_id = note.id,
            delivered = report.delivered,
            duration_ms = start.elapsed().as_millis() as u64,
            "Note created"
        );
        Ok(note)
    }

    pub async fn update(&self, id: i64, req: UpdateNoteRequest) -> Result<Note> {
        let changes = req.validate()?;
        let start = Instant::now();
        let _guard = self.write_lock.lock().await;
        let note = self.repo.update(id, changes).await?;
        let report = self.notifier.updated(&note);
        tracing::info!(
            subsystem = "api",
            component = "notes",
            op = "update",
            note_id = id,
            delivered = report.delivered,
            duration_ms = start.elapsed().as_millis() as u64,
            "Note updated"
        );
        Ok(note)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let start = Instant::now();
        let _guard = self.write_lock.lock().await;
        self.repo.delete(id).await?;
        let report = self.notifier.deleted(id);
        tracing::info!(
            subsystem = "api",
            component = "notes",
            op = "delete",
            note_id = id,
            delivered = report.delivered,
            duration_ms = start.elapsed().as_millis() as u64,
            "Note deleted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::{NewNote, NoteChanges};
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    /// Repository stub: one stored note (id 5) and an optional forced failure.
    struct StubRepo {
        note: StdMutex<Option<Note>>,
        fail: bool,
    }

    impl StubRepo {
        fn with_note() -> Self {
            Self {
                note: StdMutex::new(Some(Note {
                    id: 5,
                    name: "X".to_string(),
                    description: String::new(),
                    bg_color: "#ffffff".to_string(),
                    created_at: Some(Utc::now()),
                    updated_at: Some(Utc::now()),
                })),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                note: StdMutex::new(None),
                fail: true,
            }
        }

        fn check(&self) -> Result<()> {
            if self.fail {
                return Err(Error::Database(sqlx::Error::PoolTimedOut));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl NoteRepository for StubRepo {
        async fn insert(&self, new: NewNote) -> Result<Note> {
            self.check()?;
            Ok(Note {
                id: 6,
                name: new.name,
                description: new.description,
                bg_color: new.bg_color,
                created_at: Some(Utc::now()),
                updated_at: Some(Utc::now()),
            })
        }

        async fn list(&self) -> Result<Vec<Note>> {
            self.check()?;
            Ok(self.note.lock().unwrap().iter().cloned().collect())
        }

        async fn fetch(&self, id: i64) -> Result<Note> {
            self.check()?;
            self.note
                .lock()
                .unwrap()
                .clone()
                .filter(|n| n.id == id)
                .ok_or(Error::NoteNotFound(id))
        }

        async fn update(&self, id: i64, changes: NoteChanges) -> Result<Note> {
            self.check()?;
            let mut guard = self.note.lock().unwrap();
            match guard.as_mut().filter(|n| n.id == id) {
                Some(note) => {
                    changes.apply_to(note);
                    note.updated_at = Some(Utc::now());
                    Ok(note.clone())
                }
                None => Err(Error::NoteNotFound(id)),
            }
        }

        async fn delete(&self, id: i64) -> Result<()> {
            self.check()?;
            let mut guard = self.note.lock().unwrap();
            if guard.as_ref().map(|n| n.id) == Some(id) {
                *guard = None;
                Ok(())
            } else {
                Err(Error::NoteNotFound(id))
            }
        }
    }

    fn service(repo: StubRepo) -> (NoteService, BroadcastRegistry) {
        let registry = BroadcastRegistry::default();
        let service = NoteService::new(Arc::new(repo), ChangeNotifier::new(registry.clone()));
        (service, registry)
    }

    fn next_event(sub: &mut crate::events::Subscription) -> Option<ChangeEvent> {
        sub.try_recv()
            .map(|payload| serde_json::from_str(&payload).unwrap())
    }

    #[tokio::test]
    async fn test_create_broadcasts_created_event() {
        let (service, registry) = service(StubRepo::with_note());
        let mut sub = registry.register();

        let note = service
            .create(CreateNoteRequest::new("Groceries"))
            .await
            .unwrap();
        assert_eq!(note.bg_color, "#ffffff");
        assert_eq!(note.description, "");

        match next_event(&mut sub) {
            Some(ChangeEvent::Created { note: pushed, .. }) => assert_eq!(pushed, note),
            other => panic!("expected created event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_create_produces_no_event() {
        let (service, registry) = service(StubRepo::with_note());
        let mut sub = registry.register();

        let err = service
            .create(CreateNoteRequest::new("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(next_event(&mut sub).is_none());
    }

    #[tokio::test]
    async fn test_update_broadcasts_merged_record() {
        let (service, registry) = service(StubRepo::with_note());
        let mut sub = registry.register();

        let note = service
            .update(
                5,
                UpdateNoteRequest {
                    bg_color: Some("#000000".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(note.name, "X");
        assert_eq!(note.bg_color, "#000000");

        match next_event(&mut sub) {
            Some(ChangeEvent::Updated { note: pushed, .. }) => assert_eq!(pushed, note),
            other => panic!("expected updated event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_ids_produce_no_event() {
        let (service, registry) = service(StubRepo::with_note());
        let mut sub = registry.register();

        assert!(service.delete(999).await.unwrap_err().is_not_found());
        assert!(service
            .update(999, UpdateNoteRequest::default())
            .await
            .unwrap_err()
            .is_not_found());
        assert!(next_event(&mut sub).is_none());
    }

    #[tokio::test]
    async fn test_delete_broadcasts_id_stub() {
        let (service, registry) = service(StubRepo::with_note());
        let mut sub = registry.register();

        service.delete(5).await.unwrap();
        match next_event(&mut sub) {
            Some(ChangeEvent::Deleted { note, .. }) => assert_eq!(note.id, 5),
            other => panic!("expected deleted event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_persistence_failure_produces_no_event() {
        let (service, registry) = service(StubRepo::failing());
        let mut sub = registry.register();

        let err = service
            .create(CreateNoteRequest::new("n"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Database(_)));
        assert!(next_event(&mut sub).is_none());
    }

    #[tokio::test]
    async fn test_reads_produce_no_event() {
        let (service, registry) = service(StubRepo::with_note());
        let mut sub = registry.register();

        service.list().await.unwrap();
        service.get(5).await.unwrap();
        assert!(next_event(&mut sub).is_none());
    }

    /// Commits on every update, then yields before returning, the way a
    /// database round trip hands the runtime to other tasks.
    struct YieldingRepo {
        note: StdMutex<Note>,
    }

    #[async_trait]
    impl NoteRepository for YieldingRepo {
        async fn insert(&self, _new: NewNote) -> Result<Note> {
            unreachable!()
        }

        async fn list(&self) -> Result<Vec<Note>> {
            Ok(vec![self.note.lock().unwrap().clone()])
        }

        async fn fetch(&self, _id: i64) -> Result<Note> {
            Ok(self.note.lock().unwrap().clone())
        }

        async fn update(&self, _id: i64, changes: NoteChanges) -> Result<Note> {
            let committed = {
                let mut note = self.note.lock().unwrap();
                changes.apply_to(&mut note);
                note.clone()
            };
            tokio::task::yield_now().await;
            Ok(committed)
        }

        async fn delete(&self, _id: i64) -> Result<()> {
            unreachable!()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_publish_in_commit_order() {
        let repo = Arc::new(YieldingRepo {
            note: StdMutex::new(Note {
                id: 5,
                name: "start".to_string(),
                description: String::new(),
                bg_color: "#ffffff".to_string(),
                created_at: None,
                updated_at: None,
            }),
        });
        let registry = BroadcastRegistry::new(1024, std::time::Duration::from_secs(60));
        let service = NoteService::new(repo.clone(), ChangeNotifier::new(registry.clone()));
        let mut sub = registry.register();

        for round in 0..200 {
            let rename = |name: String| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .update(
                            5,
                            UpdateNoteRequest {
                                name: Some(name),
                                ..Default::default()
                            },
                        )
                        .await
                        .unwrap()
                })
            };
            let a = rename(format!("a{round}"));
            let b = rename(format!("b{round}"));
            a.await.unwrap();
            b.await.unwrap();

            let mut last = None;
            while let Some(event) = next_event(&mut sub) {
                last = Some(event);
            }
            let persisted = repo.note.lock().unwrap().name.clone();
            match last {
                Some(ChangeEvent::Updated { note, .. }) => {
                    assert_eq!(note.name, persisted, "round {round}")
                }
                other => panic!("expected updated event, got {other:?}"),
            }
        }
    }
}

//! Integration tests for the release processor: the claim guard, the
//! unconditional status commit, and metadata assembly, exercised with
//! in-memory gateway and publisher doubles against a real database.

use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use futures::StreamExt;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use tagvault_core::error::CoreError;
use tagvault_core::metadata::RecordMetadata;
use tagvault_core::types::DbId;
use tagvault_db::models::{CreateProject, CreateRelease, Project, Release, ReleaseStatus};
use tagvault_db::repositories::{EventRepo, ProjectRepo, ReleaseRepo};
use tagvault_gitlab::types::{GlCommit, GlContributor, GlProject, GlTag, HookAttrs};
use tagvault_gitlab::{ArchiveStream, GatewayFactory, GitLabError, GitLabGateway};
use tagvault_worker::processor::ProcessError;
use tagvault_worker::publisher::{Deposit, PublishError, PublishedRecord, RecordPublisher};
use tagvault_worker::ReleaseProcessor;

// ---------------------------------------------------------------------------
// Gateway double
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct MockGateway {
    fail_tag: bool,
    fail_contributors: bool,
    fail_archive: bool,
}

fn remote_error(endpoint: &str) -> GitLabError {
    GitLabError::Status {
        status: 500,
        endpoint: endpoint.to_string(),
    }
}

#[async_trait]
impl GitLabGateway for MockGateway {
    async fn project(&self, project_id: i64) -> Result<GlProject, GitLabError> {
        Ok(GlProject {
            id: project_id,
            name: "archiver".to_string(),
            path_with_namespace: "group/archiver".to_string(),
            description: Some("Example project".to_string()),
            web_url: "https://gitlab.example.org/group/archiver".to_string(),
        })
    }

    async fn tag(&self, _project_id: i64, tag: &str) -> Result<GlTag, GitLabError> {
        if self.fail_tag {
            return Err(remote_error("tags"));
        }
        Ok(GlTag {
            name: tag.to_string(),
            commit: GlCommit {
                id: "82b3d5ae55f7089bc192c954e98a7b4d4a7b1ddc".to_string(),
                created_at: Utc.with_ymd_and_hms(2019, 3, 14, 15, 9, 26).unwrap(),
            },
        })
    }

    async fn contributors(&self, _project_id: i64) -> Result<Vec<GlContributor>, GitLabError> {
        if self.fail_contributors {
            return Err(remote_error("contributors"));
        }
        Ok(vec![
            GlContributor {
                name: "Ada Lovelace".to_string(),
            },
            GlContributor {
                name: String::new(),
            },
        ])
    }

    async fn archive(&self, _project_id: i64, _sha: &str) -> Result<ArchiveStream, GitLabError> {
        if self.fail_archive {
            return Err(remote_error("archive"));
        }
        let chunks = vec![
            Ok(Bytes::from_static(b"tar")),
            Ok(Bytes::from_static(b"ball")),
        ];
        Ok(futures::stream::iter(chunks).boxed())
    }

    async fn install_hook(&self, _project_id: i64, _attrs: &HookAttrs) -> Result<i64, GitLabError> {
        Ok(456)
    }

    async fn remove_hook(&self, _project_id: i64, _hook_id: i64) -> Result<(), GitLabError> {
        Ok(())
    }
}

struct MockFactory {
    gateway: MockGateway,
}

#[async_trait]
impl GatewayFactory for MockFactory {
    type Gateway = MockGateway;

    async fn for_user(&self, _user_id: DbId) -> Result<MockGateway, GitLabError> {
        Ok(self.gateway.clone())
    }
}

// ---------------------------------------------------------------------------
// Publisher double
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Upload {
    title: String,
    version: String,
    publication_date: String,
    creators: usize,
    filename: String,
    bytes: usize,
}

#[derive(Clone)]
struct MockPublisher {
    record_id: Uuid,
    fail_attach: bool,
    uploads: Arc<Mutex<Vec<Upload>>>,
}

impl MockPublisher {
    fn new() -> Self {
        Self {
            record_id: Uuid::new_v4(),
            fail_attach: false,
            uploads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().unwrap().clone()
    }
}

struct MockDeposit {
    record_id: Uuid,
    fail_attach: bool,
    uploads: Arc<Mutex<Vec<Upload>>>,
    upload: Upload,
}

#[async_trait]
impl Deposit for MockDeposit {
    async fn attach_file(
        &mut self,
        name: &str,
        mut content: ArchiveStream,
    ) -> Result<(), PublishError> {
        if self.fail_attach {
            return Err(PublishError::Status {
                status: 500,
                detail: "upload rejected".to_string(),
            });
        }
        self.upload.filename = name.to_string();
        while let Some(chunk) = content.next().await {
            self.upload.bytes += chunk
                .map_err(|e| PublishError::Status {
                    status: 502,
                    detail: e.to_string(),
                })?
                .len();
        }
        Ok(())
    }

    async fn publish(self: Box<Self>) -> Result<PublishedRecord, PublishError> {
        self.uploads.lock().unwrap().push(self.upload.clone());
        Ok(PublishedRecord {
            record_id: self.record_id,
        })
    }
}

#[async_trait]
impl RecordPublisher for MockPublisher {
    async fn create_draft(
        &self,
        _owner_id: DbId,
        metadata: &RecordMetadata,
    ) -> Result<Box<dyn Deposit>, PublishError> {
        Ok(Box::new(MockDeposit {
            record_id: self.record_id,
            fail_attach: self.fail_attach,
            uploads: self.uploads.clone(),
            upload: Upload {
                title: metadata.title.clone(),
                version: metadata.version.clone(),
                publication_date: metadata.publication_date.to_string(),
                creators: metadata.creators.len(),
                filename: String::new(),
                bytes: 0,
            },
        }))
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn tag_push_payload(remote_id: i64) -> serde_json::Value {
    json!({
        "object_kind": "tag_push",
        "ref": "refs/tags/v1.0.0",
        "checkout_sha": "82b3d5ae55f7089bc192c954e98a7b4d4a7b1ddc",
        "project_id": remote_id,
        "project": {
            "name": "archiver",
            "path_with_namespace": "group/archiver",
            "description": "Example project",
            "web_url": "https://gitlab.example.org/group/archiver"
        }
    })
}

async fn seed_release(pool: &PgPool, owner_id: DbId, event_user: DbId) -> (Project, Release) {
    let project = ProjectRepo::create(
        pool,
        &CreateProject {
            owner_id,
            remote_id: Some(1234),
            full_name: "group/archiver".to_string(),
            release_pattern: None,
        },
    )
    .await
    .unwrap();
    let project = ProjectRepo::set_hook(pool, project.id, owner_id, 456)
        .await
        .unwrap();

    let event = EventRepo::insert(pool, &tag_push_payload(1234), event_user)
        .await
        .unwrap();
    let release = ReleaseRepo::create(
        pool,
        &CreateRelease {
            tag: "v1.0.0".to_string(),
            project_id: project.id,
            event_id: Some(event.id),
        },
    )
    .await
    .unwrap();

    (project, release)
}

fn processor(
    pool: &PgPool,
    gateway: MockGateway,
    publisher: MockPublisher,
) -> ReleaseProcessor<MockFactory, MockPublisher> {
    ReleaseProcessor::new(pool.clone(), MockFactory { gateway }, publisher)
}

async fn status_of(pool: &PgPool, release_id: DbId) -> ReleaseStatus {
    ReleaseRepo::find_by_id(pool, release_id)
        .await
        .unwrap()
        .unwrap()
        .status()
        .unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn publishes_a_received_release(pool: PgPool) {
    let publisher = MockPublisher::new();
    let proc = processor(&pool, MockGateway::default(), publisher.clone());
    let (project, release) = seed_release(&pool, 1, 1).await;

    proc.process("v1.0.0", project.id, false).await.unwrap();

    let row = ReleaseRepo::find_by_id(&pool, release.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status(), Some(ReleaseStatus::Published));
    assert_eq!(row.record_id, Some(publisher.record_id));
    assert!(row.errors.is_none());

    let uploads = publisher.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].filename, "group/archiver-v1.0.0.tar.gz");
    assert_eq!(uploads[0].title, "group/archiver: v1.0.0");
    assert_eq!(uploads[0].version, "v1.0.0");
    assert_eq!(uploads[0].publication_date, "2019-03-14");
    assert_eq!(uploads[0].creators, 1, "empty contributor names are dropped");
    assert_eq!(uploads[0].bytes, 7, "both archive chunks were streamed");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn archive_failure_marks_the_release_failed(pool: PgPool) {
    let publisher = MockPublisher::new();
    let gateway = MockGateway {
        fail_archive: true,
        ..MockGateway::default()
    };
    let proc = processor(&pool, gateway, publisher.clone());
    let (project, release) = seed_release(&pool, 1, 1).await;

    proc.process("v1.0.0", project.id, false).await.unwrap();

    let row = ReleaseRepo::find_by_id(&pool, release.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status(), Some(ReleaseStatus::Failed));
    assert!(row.record_id.is_none());
    let errors = row.errors.expect("failure must be captured");
    assert!(errors["errors"].as_str().unwrap().contains("archive"));
    assert!(publisher.uploads().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn tag_lookup_failure_marks_the_release_failed(pool: PgPool) {
    let publisher = MockPublisher::new();
    let gateway = MockGateway {
        fail_tag: true,
        ..MockGateway::default()
    };
    let proc = processor(&pool, gateway, publisher.clone());
    let (project, release) = seed_release(&pool, 1, 1).await;

    proc.process("v1.0.0", project.id, false).await.unwrap();

    assert_eq!(status_of(&pool, release.id).await, ReleaseStatus::Failed);
    assert!(publisher.uploads().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn noop_when_already_processing(pool: PgPool) {
    let publisher = MockPublisher::new();
    let proc = processor(&pool, MockGateway::default(), publisher.clone());
    let (project, release) = seed_release(&pool, 1, 1).await;

    ReleaseRepo::claim_for_processing(&pool, "v1.0.0", project.id)
        .await
        .unwrap()
        .unwrap();

    proc.process("v1.0.0", project.id, false).await.unwrap();

    assert_eq!(status_of(&pool, release.id).await, ReleaseStatus::Processing);
    assert!(publisher.uploads().is_empty(), "nothing may be published");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn noop_when_already_published(pool: PgPool) {
    let publisher = MockPublisher::new();
    let proc = processor(&pool, MockGateway::default(), publisher.clone());
    let (project, release) = seed_release(&pool, 1, 1).await;

    let first_record = Uuid::new_v4();
    ReleaseRepo::claim_for_processing(&pool, "v1.0.0", project.id)
        .await
        .unwrap()
        .unwrap();
    ReleaseRepo::mark_published(&pool, release.id, first_record)
        .await
        .unwrap();

    proc.process("v1.0.0", project.id, false).await.unwrap();

    let row = ReleaseRepo::find_by_id(&pool, release.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.record_id, Some(first_record), "no duplicate publication");
    assert!(publisher.uploads().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failed_release_is_processed_again(pool: PgPool) {
    let publisher = MockPublisher::new();
    let proc = processor(&pool, MockGateway::default(), publisher.clone());
    let (project, release) = seed_release(&pool, 1, 1).await;

    ReleaseRepo::claim_for_processing(&pool, "v1.0.0", project.id)
        .await
        .unwrap()
        .unwrap();
    ReleaseRepo::mark_failed(&pool, release.id, &json!({"errors": "first attempt"}))
        .await
        .unwrap();

    proc.process("v1.0.0", project.id, false).await.unwrap();

    let row = ReleaseRepo::find_by_id(&pool, release.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status(), Some(ReleaseStatus::Published));
    assert!(row.errors.is_none(), "stale errors are cleared");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn attach_failure_marks_the_release_failed(pool: PgPool) {
    let mut publisher = MockPublisher::new();
    publisher.fail_attach = true;
    let proc = processor(&pool, MockGateway::default(), publisher.clone());
    let (project, release) = seed_release(&pool, 1, 1).await;

    proc.process("v1.0.0", project.id, false).await.unwrap();

    assert_eq!(status_of(&pool, release.id).await, ReleaseStatus::Failed);
    assert!(publisher.uploads().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn contributor_failure_degrades_to_no_creators(pool: PgPool) {
    let publisher = MockPublisher::new();
    let gateway = MockGateway {
        fail_contributors: true,
        ..MockGateway::default()
    };
    let proc = processor(&pool, gateway, publisher.clone());
    let (project, release) = seed_release(&pool, 1, 1).await;

    proc.process("v1.0.0", project.id, false).await.unwrap();

    assert_eq!(status_of(&pool, release.id).await, ReleaseStatus::Published);
    let uploads = publisher.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].creators, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invalid_sender_aborts_without_touching_status(pool: PgPool) {
    let publisher = MockPublisher::new();
    let proc = processor(&pool, MockGateway::default(), publisher.clone());
    // Event user no longer owns the project row.
    let (project, release) = seed_release(&pool, 1, 99).await;

    let err = proc.process("v1.0.0", project.id, true).await.unwrap_err();

    assert_matches!(err, ProcessError::Core(CoreError::InvalidSender { .. }));
    assert_eq!(
        status_of(&pool, release.id).await,
        ReleaseStatus::Processing,
        "the claim stands; no further status write happened"
    );
    assert!(publisher.uploads().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_event_context_marks_the_release_failed(pool: PgPool) {
    let publisher = MockPublisher::new();
    let proc = processor(&pool, MockGateway::default(), publisher.clone());

    let project = ProjectRepo::create(
        &pool,
        &CreateProject {
            owner_id: 1,
            remote_id: Some(1234),
            full_name: "group/archiver".to_string(),
            release_pattern: None,
        },
    )
    .await
    .unwrap();
    let release = ReleaseRepo::create(
        &pool,
        &CreateRelease {
            tag: "v1.0.0".to_string(),
            project_id: project.id,
            event_id: None,
        },
    )
    .await
    .unwrap();

    proc.process("v1.0.0", project.id, false).await.unwrap();

    let row = ReleaseRepo::find_by_id(&pool, release.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status(), Some(ReleaseStatus::Failed));
    assert!(row
        .errors
        .unwrap()["errors"]
        .as_str()
        .unwrap()
        .contains("event"));
}

//! Integration tests for remote webhook install/remove tied to the
//! registry enable/disable operations.

use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use async_trait::async_trait;
use sqlx::PgPool;

use tagvault_core::error::CoreError;
use tagvault_db::repositories::ProjectRepo;
use tagvault_gitlab::types::{GlContributor, GlProject, GlTag, HookAttrs};
use tagvault_gitlab::{ArchiveStream, GitLabError, GitLabGateway};
use tagvault_intake::{hooks, HookSettings, IntakeError};

/// Gateway double handing out fixed project data and counting hook
/// installs/removals.
#[derive(Clone)]
struct FakeGateway {
    next_hook_id: i64,
    installed: Arc<Mutex<Vec<HookAttrs>>>,
    removed: Arc<Mutex<Vec<(i64, i64)>>>,
}

impl FakeGateway {
    fn new(next_hook_id: i64) -> Self {
        Self {
            next_hook_id,
            installed: Arc::new(Mutex::new(Vec::new())),
            removed: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl GitLabGateway for FakeGateway {
    async fn project(&self, project_id: i64) -> Result<GlProject, GitLabError> {
        Ok(GlProject {
            id: project_id,
            name: "archiver".to_string(),
            path_with_namespace: "group/archiver".to_string(),
            description: None,
            web_url: "https://gitlab.example.org/group/archiver".to_string(),
        })
    }

    async fn tag(&self, _project_id: i64, _tag: &str) -> Result<GlTag, GitLabError> {
        unimplemented!("not used by hook management")
    }

    async fn contributors(&self, _project_id: i64) -> Result<Vec<GlContributor>, GitLabError> {
        unimplemented!("not used by hook management")
    }

    async fn archive(&self, _project_id: i64, _sha: &str) -> Result<ArchiveStream, GitLabError> {
        unimplemented!("not used by hook management")
    }

    async fn install_hook(&self, _project_id: i64, attrs: &HookAttrs) -> Result<i64, GitLabError> {
        self.installed.lock().unwrap().push(attrs.clone());
        Ok(self.next_hook_id)
    }

    async fn remove_hook(&self, project_id: i64, hook_id: i64) -> Result<(), GitLabError> {
        self.removed.lock().unwrap().push((project_id, hook_id));
        Ok(())
    }
}

fn settings() -> HookSettings {
    HookSettings {
        receiver_url: "https://archive.example.org/hooks/receivers/gitlab/events/7".to_string(),
        secret: "shared-secret".to_string(),
        verify_ssl: true,
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn install_creates_and_enables_the_project(pool: PgPool) {
    let gateway = FakeGateway::new(456);

    let project = hooks::install_project_hook(&pool, &gateway, &settings(), 7, 1234)
        .await
        .unwrap();

    assert!(project.enabled());
    assert_eq!(project.hook_id, Some(456));
    assert_eq!(project.owner_id, Some(7));
    assert_eq!(project.full_name, "group/archiver");

    let installed = gateway.installed.lock().unwrap();
    assert_eq!(installed.len(), 1);
    assert!(installed[0].tag_push_events);
    assert_eq!(installed[0].token, "shared-secret");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn reinstall_keeps_a_single_row_with_the_new_hook(pool: PgPool) {
    let first = FakeGateway::new(456);
    let second = FakeGateway::new(789);

    let project = hooks::install_project_hook(&pool, &first, &settings(), 7, 1234)
        .await
        .unwrap();
    let again = hooks::install_project_hook(&pool, &second, &settings(), 7, 1234)
        .await
        .unwrap();

    assert_eq!(project.id, again.id);
    assert_eq!(again.hook_id, Some(789));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn remove_deletes_the_remote_hook_and_disables(pool: PgPool) {
    let gateway = FakeGateway::new(456);
    hooks::install_project_hook(&pool, &gateway, &settings(), 7, 1234)
        .await
        .unwrap();

    let project = hooks::remove_project_hook(&pool, &gateway, 7, 1234)
        .await
        .unwrap();

    assert!(!project.enabled());
    assert_eq!(*gateway.removed.lock().unwrap(), vec![(1234, 456)]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn remove_without_a_recorded_hook_skips_the_gateway(pool: PgPool) {
    let gateway = FakeGateway::new(456);
    // Project registered but never hooked.
    tagvault_intake::ProjectRegistry::create(&pool, 7, Some(1234), "group/archiver", None)
        .await
        .unwrap();

    hooks::remove_project_hook(&pool, &gateway, 7, 1234)
        .await
        .unwrap();

    assert!(gateway.removed.lock().unwrap().is_empty());
    let row = ProjectRepo::find_by_remote_id(&pool, 1234)
        .await
        .unwrap()
        .unwrap();
    assert!(!row.enabled());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn remove_for_an_unknown_project_is_not_found(pool: PgPool) {
    let gateway = FakeGateway::new(456);
    let err = hooks::remove_project_hook(&pool, &gateway, 7, 1234)
        .await
        .unwrap_err();
    assert_matches!(err, IntakeError::Core(CoreError::NotFound { .. }));
}

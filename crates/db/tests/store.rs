//! Integration tests for `PgStore` against a real database:
//! - Overlapping task ranges are rejected, also under concurrent creation
//! - The active-range exclusion constraint maps to `InvalidRange`
//! - Commits link into a chain listed newest first, with snapshot sizes
//! - A stale head, a finished task or replaced deltas roll the append back
//! - The chain's unique indexes map to `Conflict`

use annotask_core::annotation::fixtures::annotation;
use annotask_core::annotation::DocAnnotations;
use annotask_core::delta::{DeltaStatus, TaskAnnotation, TaskDeltaAnnotations};
use annotask_core::document::{NewCommit, NewDocument};
use annotask_core::error::CoreError;
use annotask_core::page_range::PageRange;
use annotask_core::store::AnnotationStore;
use annotask_core::task::{NewTask, TaskStatus};
use annotask_core::types::DbId;
use annotask_db::repositories::{DocCommitRepo, TaskRepo};
use annotask_db::store::store_error;
use annotask_db::PgStore;
use assert_matches::assert_matches;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_user(pool: &PgPool, username: &str) -> DbId {
    sqlx::query_scalar::<_, DbId>(
        "INSERT INTO users (username, email, role) VALUES ($1, $2, 'annotator') RETURNING id",
    )
    .bind(username)
    .bind(format!("{username}@annotask.test"))
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Create a store with one annotator and one document of `pages` pages.
/// Returns (store, document_id, user_id).
async fn setup(pool: PgPool, pages: i32) -> (PgStore, DbId, DbId) {
    let user_id = seed_user(&pool, "annotator").await;
    let store = PgStore::new(pool);
    let doc = store
        .create_document(&NewDocument {
            name: "manual.pdf".to_string(),
            total_pages: pages,
            file_ref: "blob/manual".to_string(),
        })
        .await
        .unwrap();
    (store, doc.id, user_id)
}

fn new_task(document_id: DbId, user_id: DbId, start: i32, end: i32) -> NewTask {
    NewTask {
        document_id,
        user_id,
        page_range: PageRange::new(start, end),
        description: String::new(),
    }
}

fn commit_of(document_id: DbId, task_id: DbId, expected_head: Option<DbId>) -> NewCommit {
    NewCommit {
        document_id,
        task_id,
        expected_head,
        deltas: TaskDeltaAnnotations::empty(),
        snapshot: DocAnnotations::empty(),
    }
}

fn created(id: &str, page: i32) -> TaskAnnotation {
    TaskAnnotation {
        annotation: annotation(id, page),
        status: DeltaStatus::Created,
    }
}

// ---------------------------------------------------------------------------
// Test: task creation guards page ranges
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_create_task_rejects_overlap(pool: PgPool) {
    let (store, doc, user) = setup(pool, 10).await;

    let task = store.create_task(new_task(doc, user, 1, 5)).await.unwrap();
    assert_eq!(task.status, TaskStatus::Active);
    assert_eq!(task.base_commit_id, None);

    let err = store.create_task(new_task(doc, user, 5, 8)).await.unwrap_err();
    assert_matches!(err, CoreError::InvalidRange(_));

    let err = store.create_task(new_task(doc, user, 9, 11)).await.unwrap_err();
    assert_matches!(err, CoreError::InvalidRange(_));

    // Dismissing frees the pages.
    store.dismiss_task(task.id).await.unwrap().unwrap();
    store.create_task(new_task(doc, user, 3, 4)).await.unwrap();
}

#[sqlx::test(migrations = "./migrations")]
async fn test_concurrent_overlapping_creates_admit_one(pool: PgPool) {
    let (store, doc, user) = setup(pool, 10).await;

    let (a, b) = tokio::join!(
        store.create_task(new_task(doc, user, 1, 4)),
        store.create_task(new_task(doc, user, 3, 6)),
    );

    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(CoreError::InvalidRange(_)))));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_exclusion_constraint_maps_to_invalid_range(pool: PgPool) {
    let (store, doc, user) = setup(pool.clone(), 10).await;
    store.create_task(new_task(doc, user, 2, 4)).await.unwrap();

    // Bypass the range check so only the schema can refuse the row.
    let mut conn = pool.acquire().await.unwrap();
    let err = TaskRepo::insert(&mut conn, &new_task(doc, user, 4, 6), None)
        .await
        .unwrap_err();
    assert_matches!(store_error(err), CoreError::InvalidRange(_));
}

// ---------------------------------------------------------------------------
// Test: commit chain
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_commits_form_chain_newest_first(pool: PgPool) {
    let (store, doc, user) = setup(pool, 10).await;
    let t1 = store.create_task(new_task(doc, user, 1, 2)).await.unwrap();
    let t2 = store.create_task(new_task(doc, user, 3, 4)).await.unwrap();

    let mut first = commit_of(doc, t1.id, None);
    first.snapshot = DocAnnotations::empty()
        .with_annotation(annotation("a1", 0))
        .with_annotation(annotation("a2", 1));
    let c1 = store.append_commit(first).await.unwrap();
    let c2 = store
        .append_commit(commit_of(doc, t2.id, Some(c1.id)))
        .await
        .unwrap();

    assert_eq!(c1.prev_commit_id, None);
    assert_eq!(c2.prev_commit_id, Some(c1.id));

    let document = store.get_document(doc).await.unwrap().unwrap();
    assert_eq!(document.head_commit_id, Some(c2.id));

    let history = store.list_commits(doc).await.unwrap();
    let ids: Vec<DbId> = history.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![c2.id, c1.id]);
    assert_eq!(history[0].annotation_count, 0);
    assert_eq!(history[1].annotation_count, 2);
    assert_eq!(history[1].relation_count, 0);

    let t1 = store.get_task(t1.id).await.unwrap().unwrap();
    assert_eq!(t1.status, TaskStatus::Completed);
    assert!(t1.completed_at.is_some());

    // Tasks created after a commit are based on it.
    let t3 = store.create_task(new_task(doc, user, 5, 6)).await.unwrap();
    assert_eq!(t3.base_commit_id, Some(c2.id));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_commits_unknown_document(pool: PgPool) {
    let (store, _doc, _user) = setup(pool, 3).await;
    let err = store.list_commits(9_999).await.unwrap_err();
    assert_matches!(err, CoreError::NotFound { entity: "Document", .. });
}

// ---------------------------------------------------------------------------
// Test: rejected appends write nothing
// ---------------------------------------------------------------------------

/// The document still has no commits and the task is still active.
async fn assert_untouched(store: &PgStore, doc: DbId, task_id: DbId) {
    let document = store.get_document(doc).await.unwrap().unwrap();
    assert_eq!(document.head_commit_id, None);
    assert!(store.list_commits(doc).await.unwrap().is_empty());
    let task = store.get_task(task_id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Active);
    assert!(task.completed_at.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_stale_head_rolls_back(pool: PgPool) {
    let (store, doc, user) = setup(pool, 10).await;
    let task = store.create_task(new_task(doc, user, 1, 2)).await.unwrap();

    let err = store
        .append_commit(commit_of(doc, task.id, Some(424_242)))
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Conflict(_));
    assert_untouched(&store, doc, task.id).await;
}

#[sqlx::test(migrations = "./migrations")]
async fn test_replaced_deltas_roll_back(pool: PgPool) {
    let (store, doc, user) = setup(pool, 10).await;
    let task = store.create_task(new_task(doc, user, 1, 2)).await.unwrap();

    // The caller merged the (empty) deltas, then a delta write landed.
    let late = TaskDeltaAnnotations {
        annotations: vec![created("late", 0)],
        relations: Vec::new(),
    };
    assert!(store.update_task_deltas(task.id, &late).await.unwrap().is_some());

    let err = store
        .append_commit(commit_of(doc, task.id, None))
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Conflict(_));
    assert_untouched(&store, doc, task.id).await;

    let stored = store.get_task(task.id).await.unwrap().unwrap();
    assert_eq!(stored.delta_annotations, late);

    // Committing what is actually stored goes through.
    let mut retry = commit_of(doc, task.id, None);
    retry.deltas = late;
    store.append_commit(retry).await.unwrap();
}

#[sqlx::test(migrations = "./migrations")]
async fn test_finished_task_cannot_commit(pool: PgPool) {
    let (store, doc, user) = setup(pool, 10).await;
    let task = store.create_task(new_task(doc, user, 1, 2)).await.unwrap();
    store.dismiss_task(task.id).await.unwrap().unwrap();

    let err = store
        .append_commit(commit_of(doc, task.id, None))
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Conflict(_));

    let document = store.get_document(doc).await.unwrap().unwrap();
    assert_eq!(document.head_commit_id, None);
    assert!(store.list_commits(doc).await.unwrap().is_empty());
    let task = store.get_task(task.id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Dismissed);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_second_root_commit_maps_to_conflict(pool: PgPool) {
    let (store, doc, user) = setup(pool.clone(), 10).await;
    let t1 = store.create_task(new_task(doc, user, 1, 2)).await.unwrap();
    let t2 = store.create_task(new_task(doc, user, 3, 4)).await.unwrap();

    let mut conn = pool.acquire().await.unwrap();
    DocCommitRepo::insert(&mut conn, doc, t1.id, None, &DocAnnotations::empty())
        .await
        .unwrap();
    let err = DocCommitRepo::insert(&mut conn, doc, t2.id, None, &DocAnnotations::empty())
        .await
        .unwrap_err();
    assert_matches!(store_error(err), CoreError::Conflict(_));
}

// ---------------------------------------------------------------------------
// Test: state-guarded task updates
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_guarded_updates_skip_finished_tasks(pool: PgPool) {
    let (store, doc, user) = setup(pool, 10).await;
    let task = store.create_task(new_task(doc, user, 1, 2)).await.unwrap();

    assert!(store.dismiss_task(task.id).await.unwrap().is_some());
    assert!(store.dismiss_task(task.id).await.unwrap().is_none());
    assert!(store
        .update_task_deltas(task.id, &TaskDeltaAnnotations::empty())
        .await
        .unwrap()
        .is_none());
    assert!(!store.delete_task(task.id).await.unwrap());

    let updated = store
        .update_task_comments(task.id, "checked twice")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.comments, "checked twice");
    let flagged = store
        .set_task_marked_complete(task.id, true)
        .await
        .unwrap()
        .unwrap();
    assert!(flagged.marked_complete);
}

//! Integration tests for prompt creation, slugs, and content versioning.

use assert_matches::assert_matches;
use prompthub_core::prompt::{AiProvider, Visibility, DEFAULT_CHANGE_DESCRIPTION};
use prompthub_core::roles::Role;
use prompthub_core::types::DbId;
use prompthub_db::models::prompt::{CreatePrompt, UpdatePrompt};
use prompthub_db::models::user::CreateUser;
use prompthub_db::repositories::{PromptRepo, PromptVersionRepo, UserRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_user(pool: &PgPool, email: &str) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            username: None,
            name: None,
            password_hash: "not-a-real-hash".to_string(),
            role: Role::User,
        },
    )
    .await
    .unwrap()
    .id
}

fn new_prompt(user_id: DbId, title: &str) -> CreatePrompt {
    CreatePrompt {
        user_id,
        title: title.to_string(),
        content: "Version zero content".to_string(),
        description: None,
        category: None,
        visibility: Visibility::Private,
        ai_provider: AiProvider::Both,
        tag_ids: Vec::new(),
    }
}

fn content_change(content: &str) -> UpdatePrompt {
    UpdatePrompt {
        content: Some(content.to_string()),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Slugs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn identical_titles_get_distinct_slugs(pool: PgPool) {
    let user = seed_user(&pool, "slugs@example.com").await;

    let a = PromptRepo::create(&pool, &new_prompt(user, "Code Review")).await.unwrap();
    let b = PromptRepo::create(&pool, &new_prompt(user, "Code Review")).await.unwrap();
    let c = PromptRepo::create(&pool, &new_prompt(user, "code review!")).await.unwrap();

    assert_eq!(a.slug, "code-review");
    assert_eq!(b.slug, "code-review-1");
    assert_eq!(c.slug, "code-review-2");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unsluggable_title_falls_back(pool: PgPool) {
    let user = seed_user(&pool, "fallback@example.com").await;
    let prompt = PromptRepo::create(&pool, &new_prompt(user, "???")).await.unwrap();
    assert_eq!(prompt.slug, "prompt");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn slug_is_stable_across_title_edits(pool: PgPool) {
    let user = seed_user(&pool, "stable@example.com").await;
    let prompt = PromptRepo::create(&pool, &new_prompt(user, "Original Title")).await.unwrap();

    let input = UpdatePrompt {
        title: Some("Renamed Title".to_string()),
        ..Default::default()
    };
    let updated = PromptRepo::update(&pool, prompt.id, &input, Some(user))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.prompt.title, "Renamed Title");
    assert_eq!(updated.prompt.slug, "original-title");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn lookup_by_id_or_slug(pool: PgPool) {
    let user = seed_user(&pool, "lookup@example.com").await;
    let prompt = PromptRepo::create(&pool, &new_prompt(user, "Lookup Me")).await.unwrap();

    let by_id = PromptRepo::find_by_id_or_slug(&pool, &prompt.id.to_string())
        .await
        .unwrap();
    let by_slug = PromptRepo::find_by_id_or_slug(&pool, "lookup-me").await.unwrap();
    let missing = PromptRepo::find_by_id_or_slug(&pool, "nope").await.unwrap();

    assert_eq!(by_id.map(|p| p.id), Some(prompt.id));
    assert_eq!(by_slug.map(|p| p.id), Some(prompt.id));
    assert!(missing.is_none());
}

// ---------------------------------------------------------------------------
// Versioning
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn creation_records_no_version(pool: PgPool) {
    let user = seed_user(&pool, "create@example.com").await;
    let prompt = PromptRepo::create(&pool, &new_prompt(user, "No History")).await.unwrap();

    let count = PromptVersionRepo::count_for_prompt(&pool, prompt.id).await.unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn each_content_change_snapshots_previous_content(pool: PgPool) {
    let user = seed_user(&pool, "versions@example.com").await;
    let prompt = PromptRepo::create(&pool, &new_prompt(user, "Versioned")).await.unwrap();

    let contents = ["Version one content", "Version two content", "Version three content"];
    for content in contents {
        let outcome = PromptRepo::update(&pool, prompt.id, &content_change(content), Some(user))
            .await
            .unwrap()
            .unwrap();
        assert!(outcome.version.is_some());
        assert_eq!(outcome.prompt.content, content);
    }

    let versions = PromptVersionRepo::list_for_prompt(&pool, prompt.id).await.unwrap();
    let numbers: Vec<i32> = versions.iter().map(|v| v.version.version_number).collect();
    assert_eq!(numbers, vec![3, 2, 1]);

    let snapshots: Vec<&str> = versions.iter().map(|v| v.version.content.as_str()).collect();
    assert_eq!(
        snapshots,
        vec!["Version two content", "Version one content", "Version zero content"]
    );
    assert!(versions
        .iter()
        .all(|v| v.version.change_description.as_deref() == Some(DEFAULT_CHANGE_DESCRIPTION)));
    assert!(versions.iter().all(|v| v.version.changed_by_id == Some(user)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn non_content_edits_create_no_version(pool: PgPool) {
    let user = seed_user(&pool, "meta@example.com").await;
    let prompt = PromptRepo::create(&pool, &new_prompt(user, "Metadata Only")).await.unwrap();

    let input = UpdatePrompt {
        title: Some("New Title Here".to_string()),
        visibility: Some(Visibility::Public),
        category: Some("writing".to_string()),
        content: Some(prompt.content.clone()),
        ..Default::default()
    };
    let outcome = PromptRepo::update(&pool, prompt.id, &input, Some(user))
        .await
        .unwrap()
        .unwrap();

    assert!(outcome.version.is_none());
    assert_eq!(outcome.prompt.visibility, Visibility::Public);
    assert_eq!(
        PromptVersionRepo::count_for_prompt(&pool, prompt.id).await.unwrap(),
        0
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn custom_change_description_is_recorded(pool: PgPool) {
    let user = seed_user(&pool, "describe@example.com").await;
    let prompt = PromptRepo::create(&pool, &new_prompt(user, "Described")).await.unwrap();

    let input = UpdatePrompt {
        content: Some("Tightened the wording".to_string()),
        change_description: Some("Tone pass".to_string()),
        ..Default::default()
    };
    let outcome = PromptRepo::update(&pool, prompt.id, &input, Some(user))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        outcome.version.unwrap().change_description.as_deref(),
        Some("Tone pass")
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn restore_is_itself_versioned(pool: PgPool) {
    let user = seed_user(&pool, "restore@example.com").await;
    let prompt = PromptRepo::create(&pool, &new_prompt(user, "Restorable")).await.unwrap();

    PromptRepo::update(&pool, prompt.id, &content_change("Version one content"), Some(user))
        .await
        .unwrap();
    PromptRepo::update(&pool, prompt.id, &content_change("Version two content"), Some(user))
        .await
        .unwrap();

    // Version 1 snapshots the original content.
    let versions = PromptVersionRepo::list_for_prompt(&pool, prompt.id).await.unwrap();
    let first = versions
        .iter()
        .find(|v| v.version.version_number == 1)
        .unwrap()
        .version
        .clone();

    let outcome = PromptRepo::restore_version(&pool, &first, Some(user))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome.prompt.content, "Version zero content");
    let new_version = outcome.version.unwrap();
    assert_eq!(new_version.version_number, 3);
    assert_eq!(new_version.content, "Version two content");
    assert_eq!(
        new_version.change_description.as_deref(),
        Some("Restored from version 1")
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn restoring_current_content_is_a_no_op(pool: PgPool) {
    let user = seed_user(&pool, "noop@example.com").await;
    let prompt = PromptRepo::create(&pool, &new_prompt(user, "No Op")).await.unwrap();

    PromptRepo::update(&pool, prompt.id, &content_change("Version one content"), Some(user))
        .await
        .unwrap();
    PromptRepo::update(&pool, prompt.id, &content_change("Version zero content"), Some(user))
        .await
        .unwrap();

    // Version 2 holds "Version one content"; version 1 holds the current content.
    let versions = PromptVersionRepo::list_for_prompt(&pool, prompt.id).await.unwrap();
    let v1 = versions
        .iter()
        .find(|v| v.version.version_number == 1)
        .unwrap()
        .version
        .clone();

    let outcome = PromptRepo::restore_version(&pool, &v1, Some(user))
        .await
        .unwrap()
        .unwrap();
    assert!(outcome.version.is_none());
    assert_eq!(
        PromptVersionRepo::count_for_prompt(&pool, prompt.id).await.unwrap(),
        2
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn version_lookup_is_scoped_to_prompt(pool: PgPool) {
    let user = seed_user(&pool, "scoped@example.com").await;
    let a = PromptRepo::create(&pool, &new_prompt(user, "Prompt A")).await.unwrap();
    let b = PromptRepo::create(&pool, &new_prompt(user, "Prompt B")).await.unwrap();

    let outcome = PromptRepo::update(&pool, a.id, &content_change("Changed content A"), Some(user))
        .await
        .unwrap()
        .unwrap();
    let version_id = outcome.version.unwrap().id;

    assert!(PromptVersionRepo::find_for_prompt(&pool, a.id, version_id)
        .await
        .unwrap()
        .is_some());
    assert!(PromptVersionRepo::find_for_prompt(&pool, b.id, version_id)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_missing_prompt_returns_none(pool: PgPool) {
    let outcome = PromptRepo::update(&pool, 999_999, &content_change("whatever text"), None)
        .await
        .unwrap();
    assert!(outcome.is_none());
}

// ---------------------------------------------------------------------------
// Deletion and duplication
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_cascades_versions(pool: PgPool) {
    let user = seed_user(&pool, "cascade@example.com").await;
    let prompt = PromptRepo::create(&pool, &new_prompt(user, "Doomed")).await.unwrap();
    PromptRepo::update(&pool, prompt.id, &content_change("Edited before delete"), Some(user))
        .await
        .unwrap();

    let keys = PromptRepo::delete(&pool, prompt.id).await.unwrap();
    assert_matches!(keys, Some(ref k) if k.is_empty());

    let orphans: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM prompt_versions WHERE prompt_id = $1")
            .bind(prompt.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(orphans, 0);
    assert!(PromptRepo::delete(&pool, prompt.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_creates_private_copy(pool: PgPool) {
    let owner = seed_user(&pool, "owner@example.com").await;
    let other = seed_user(&pool, "copier@example.com").await;

    let mut input = new_prompt(owner, "Shared Prompt");
    input.visibility = Visibility::Public;
    input.ai_provider = AiProvider::Anthropic;
    let source = PromptRepo::create(&pool, &input).await.unwrap();

    let copy = PromptRepo::duplicate(&pool, &source, other).await.unwrap();

    assert_ne!(copy.id, source.id);
    assert_eq!(copy.user_id, other);
    assert_eq!(copy.title, "Shared Prompt (copy)");
    assert_eq!(copy.slug, "shared-prompt-copy");
    assert_eq!(copy.visibility, Visibility::Private);
    assert_eq!(copy.ai_provider, AiProvider::Anthropic);
    assert_eq!(copy.content, source.content);
    assert_eq!(copy.usage_count, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn increment_usage_counts_up(pool: PgPool) {
    let user = seed_user(&pool, "usage@example.com").await;
    let prompt = PromptRepo::create(&pool, &new_prompt(user, "Used Often")).await.unwrap();

    assert_eq!(PromptRepo::increment_usage(&pool, prompt.id).await.unwrap(), Some(1));
    assert_eq!(PromptRepo::increment_usage(&pool, prompt.id).await.unwrap(), Some(2));
    assert_eq!(PromptRepo::increment_usage(&pool, 424_242).await.unwrap(), None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deleting_editor_keeps_version_content(pool: PgPool) {
    let owner = seed_user(&pool, "keeper@example.com").await;
    let editor = seed_user(&pool, "editor@example.com").await;
    let prompt = PromptRepo::create(&pool, &new_prompt(owner, "Kept History")).await.unwrap();

    PromptRepo::update(&pool, prompt.id, &content_change("Edited by someone"), Some(editor))
        .await
        .unwrap();
    UserRepo::delete(&pool, editor).await.unwrap();

    let versions = PromptVersionRepo::list_for_prompt(&pool, prompt.id).await.unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].version.content, "Version zero content");
    assert!(versions[0].editor().is_none());
}

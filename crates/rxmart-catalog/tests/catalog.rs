//! End-to-end catalog tests against a fresh, migrated database per test
//! (`#[sqlx::test]`) with images written to a temporary directory.

use rxmart_catalog::{
    CatalogError, CatalogService, ImageUpload, LocalImageStore, NewMerchandiseInput,
    ReferenceIntent,
};
use rxmart_core::{CommentInput, CommentPatch, Gender, ReferenceKind, ValidationError};
use sqlx::PgPool;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn service(pool: &PgPool) -> (CatalogService<LocalImageStore>, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = LocalImageStore::new(dir.path(), "/images", 1024 * 1024);
    (CatalogService::new(pool.clone(), store), dir)
}

fn upload(bytes: &[u8]) -> ImageUpload {
    ImageUpload {
        file_name: Some("box.png".to_string()),
        content_type: Some("image/png".to_string()),
        bytes: bytes.to_vec(),
    }
}

fn merchandise_input(name: &str, manufacturer: &str, effects: &[&str]) -> NewMerchandiseInput {
    NewMerchandiseInput {
        name: name.to_string(),
        manufacturer: manufacturer.to_string(),
        usage_instruction: "Take once daily".to_string(),
        effects: effects.iter().map(|e| (*e).to_string()).collect(),
    }
}

async fn create(
    catalog: &CatalogService<LocalImageStore>,
    name: &str,
    manufacturer: &str,
    effects: &[&str],
) -> i64 {
    catalog
        .create_merchandise(
            merchandise_input(name, manufacturer, effects),
            upload(name.as_bytes()),
        )
        .await
        .unwrap_or_else(|e| panic!("create_merchandise '{name}' failed: {e}"))
        .result
        .id
}

async fn insert_pharmacist(pool: &PgPool, user_name: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO pharmacists (user_name, email) VALUES ($1, $2) RETURNING id",
    )
    .bind(user_name)
    .bind(format!("{user_name}@example.com"))
    .fetch_one(pool)
    .await
    .expect("insert pharmacist")
}

async fn insert_customer(pool: &PgPool, user_name: &str, age: i32, gender: Gender) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO customers (user_name, email, age, gender) \
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(user_name)
    .bind(format!("{user_name}@example.com"))
    .bind(age)
    .bind(gender.as_str())
    .fetch_one(pool)
    .await
    .expect("insert customer")
}

fn comment_input(positive: Option<&str>, negative: Option<&str>, rating: Option<i32>) -> CommentInput {
    CommentInput {
        positive: positive.map(str::to_string),
        negative: negative.map(str::to_string),
        rating,
    }
}

async fn comment_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments")
        .fetch_one(pool)
        .await
        .expect("count comments")
}

// ---------------------------------------------------------------------------
// Merchandise writer
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn creating_two_merchandises_reuses_manufacturer(pool: PgPool) {
    let (catalog, _dir) = service(&pool);

    let first = create(&catalog, "Vitamin C", "Acme", &[]).await;
    let second = create(&catalog, "Vitamin D", " Acme ", &[]).await;
    assert_ne!(first, second);

    let manufacturers: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM manufacturers WHERE name = 'Acme'")
            .fetch_one(&pool)
            .await
            .expect("count manufacturers");
    assert_eq!(manufacturers, 1);

    let usage_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM usage_instructions")
        .fetch_one(&pool)
        .await
        .expect("count usage instructions");
    assert_eq!(usage_rows, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn create_merchandise_returns_detail_with_effects(pool: PgPool) {
    let (catalog, dir) = service(&pool);

    let outcome = catalog
        .create_merchandise(
            merchandise_input("Cold Relief", "Acme", &["fever", "cough", "fever"]),
            upload(b"cold-relief"),
        )
        .await
        .expect("create_merchandise");

    let detail = outcome.result;
    assert_eq!(detail.name, "Cold Relief");
    assert_eq!(detail.manufacturer, "Acme");
    assert_eq!(detail.usage_instruction, "Take once daily");
    assert_eq!(detail.effects, vec!["cough".to_string(), "fever".to_string()]);
    assert_eq!(detail.like_count, 0);
    assert!(detail.comments.is_empty());
    assert!(detail.image_url.starts_with("/images/"));
    assert_eq!(outcome.message, "merchandise 'Cold Relief' created");

    let key = detail.image_url.trim_start_matches("/images/");
    assert!(dir.path().join(key).exists());
}

#[sqlx::test(migrations = "../../migrations")]
async fn blank_manufacturer_is_rejected_before_writing(pool: PgPool) {
    let (catalog, _dir) = service(&pool);

    let err = catalog
        .create_merchandise(merchandise_input("Cold Relief", "  ", &[]), upload(b"x"))
        .await
        .expect_err("blank manufacturer");
    assert!(matches!(
        err,
        CatalogError::Validation(ValidationError::Empty("manufacturer"))
    ));

    let merchandises: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM merchandises")
        .fetch_one(&pool)
        .await
        .expect("count merchandises");
    assert_eq!(merchandises, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn rejected_image_rolls_back_reference_rows(pool: PgPool) {
    let (catalog, _dir) = service(&pool);

    let err = catalog
        .create_merchandise(merchandise_input("Cold Relief", "Acme", &[]), upload(b""))
        .await
        .expect_err("empty image");
    assert!(matches!(err, CatalogError::Image(_)));

    let manufacturers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM manufacturers")
        .fetch_one(&pool)
        .await
        .expect("count manufacturers");
    assert_eq!(manufacturers, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn nul_effect_name_fails_without_writing(pool: PgPool) {
    let (catalog, _dir) = service(&pool);

    for _ in 0..2 {
        let err = catalog
            .create_merchandise(
                merchandise_input("Cold", "Acme", &["fe\0ver"]),
                upload(b"cold"),
            )
            .await
            .expect_err("nul in effect name");
        assert!(matches!(
            err,
            CatalogError::Validation(ValidationError::NulByte("effect"))
        ));
    }

    for table in ["merchandises", "manufacturers", "usage_instructions", "effects", "images"] {
        let rows: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .expect("count rows");
        assert_eq!(rows, 0, "{table}");
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn concurrent_creates_share_reference_rows(pool: PgPool) {
    const WRITERS: usize = 8;
    let (catalog, _dir) = service(&pool);

    let handles: Vec<_> = (0..WRITERS)
        .map(|i| {
            let catalog = catalog.clone();
            tokio::spawn(async move {
                let name = format!("Cold Relief {i}");
                catalog
                    .create_merchandise(
                        merchandise_input(&name, "Acme", &["fever"]),
                        upload(name.as_bytes()),
                    )
                    .await
            })
        })
        .collect();

    for handle in handles {
        handle
            .await
            .expect("writer task panicked")
            .expect("create_merchandise");
    }

    let count = |sql: &'static str| {
        let pool = pool.clone();
        async move {
            sqlx::query_scalar::<_, i64>(sql)
                .fetch_one(&pool)
                .await
                .expect("count rows")
        }
    };
    assert_eq!(count("SELECT COUNT(*) FROM manufacturers").await, 1);
    assert_eq!(count("SELECT COUNT(*) FROM effects").await, 1);
    assert_eq!(count("SELECT COUNT(*) FROM merchandises").await, 8);
    assert_eq!(count("SELECT COUNT(*) FROM merchandise_effects").await, 8);
}

#[sqlx::test(migrations = "../../migrations")]
async fn normalize_reports_connect_after_creation(pool: PgPool) {
    let (catalog, _dir) = service(&pool);

    let before = catalog
        .normalize(ReferenceKind::Manufacturer, " Acme ")
        .await
        .expect("normalize");
    assert_eq!(
        before.result,
        ReferenceIntent::Create {
            value: "Acme".to_string()
        }
    );

    let id = create(&catalog, "Vitamin C", "Acme", &[]).await;
    let detail = catalog.get_merchandise(id).await.expect("detail").result;

    let after = catalog
        .normalize(ReferenceKind::Manufacturer, "Acme")
        .await
        .expect("normalize");
    assert_eq!(
        after.result,
        ReferenceIntent::Connect {
            id: detail.manufacturer_id
        }
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn attach_effects_reports_new_and_existing_links(pool: PgPool) {
    let (catalog, _dir) = service(&pool);
    let id = create(&catalog, "Cold Relief", "Acme", &["fever"]).await;

    let outcome = catalog
        .attach_effects(id, &["fever".to_string(), "cough".to_string()])
        .await
        .expect("attach_effects");

    let attached: Vec<(&str, bool)> = outcome
        .result
        .iter()
        .map(|a| (a.name.as_str(), a.attached))
        .collect();
    assert_eq!(attached, vec![("fever", false), ("cough", true)]);

    let err = catalog
        .attach_effects(999, &["fever".to_string()])
        .await
        .expect_err("unknown merchandise");
    assert!(matches!(
        err,
        CatalogError::NotFound {
            entity: "merchandise",
            id: 999
        }
    ));
}

// ---------------------------------------------------------------------------
// Comment manager
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn create_comment_stores_ids_exactly(pool: PgPool) {
    let (catalog, _dir) = service(&pool);
    let merchandise_id = create(&catalog, "Cold Relief", "Acme", &[]).await;
    let author = insert_pharmacist(&pool, "dr_lee").await;

    let comment = catalog
        .create_comment(
            merchandise_id,
            comment_input(Some("fast"), Some("bitter"), Some(4)),
            author,
        )
        .await
        .expect("create_comment")
        .result;

    assert_eq!(comment.merchandise_id, merchandise_id);
    assert_eq!(comment.pharmacist_id, author);
    assert_eq!(comment.rating, 4);
}

#[sqlx::test(migrations = "../../migrations")]
async fn incomplete_comment_fails_without_writing(pool: PgPool) {
    let (catalog, _dir) = service(&pool);
    let merchandise_id = create(&catalog, "Cold Relief", "Acme", &[]).await;
    let author = insert_pharmacist(&pool, "dr_lee").await;

    for input in [
        comment_input(None, Some("bitter"), Some(4)),
        comment_input(Some("fast"), Some(""), Some(4)),
        comment_input(Some("fast"), Some("bitter"), None),
        comment_input(Some("fast"), Some("bitter"), Some(0)),
    ] {
        let err = catalog
            .create_comment(merchandise_id, input, author)
            .await
            .expect_err("incomplete comment");
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    assert_eq!(comment_count(&pool).await, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn comment_on_unknown_merchandise_is_not_found(pool: PgPool) {
    let (catalog, _dir) = service(&pool);
    let author = insert_pharmacist(&pool, "dr_lee").await;

    let err = catalog
        .create_comment(999, comment_input(Some("a"), Some("b"), Some(1)), author)
        .await
        .expect_err("unknown merchandise");
    assert!(matches!(err, CatalogError::NotFound { entity: "merchandise", .. }));
}

#[sqlx::test(migrations = "../../migrations")]
async fn comment_guards_run_in_order(pool: PgPool) {
    let (catalog, _dir) = service(&pool);
    let merchandise_id = create(&catalog, "Cold Relief", "Acme", &[]).await;
    let other_merchandise = create(&catalog, "Pain Away", "Acme", &[]).await;
    let author = insert_pharmacist(&pool, "dr_lee").await;
    let stranger = insert_pharmacist(&pool, "dr_kim").await;

    let comment_id = catalog
        .create_comment(
            merchandise_id,
            comment_input(Some("fast"), Some("bitter"), Some(4)),
            author,
        )
        .await
        .expect("create_comment")
        .result
        .id;

    let missing = catalog
        .delete_comment(merchandise_id, 999, author)
        .await
        .expect_err("unknown comment");
    assert!(matches!(missing, CatalogError::NotFound { entity: "comment", .. }));

    // Wrong author and wrong parent: authorship wins.
    let not_author = catalog
        .update_comment(other_merchandise, comment_id, CommentPatch::default(), stranger)
        .await
        .expect_err("stranger");
    assert!(matches!(not_author, CatalogError::Unauthorized { .. }));

    let not_author_delete = catalog
        .delete_comment(merchandise_id, comment_id, stranger)
        .await
        .expect_err("stranger delete");
    assert!(matches!(not_author_delete, CatalogError::Unauthorized { .. }));

    let wrong_parent = catalog
        .delete_comment(other_merchandise, comment_id, author)
        .await
        .expect_err("wrong parent");
    assert!(matches!(wrong_parent, CatalogError::InconsistentParent { .. }));

    assert_eq!(comment_count(&pool).await, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn author_updates_then_deletes_comment(pool: PgPool) {
    let (catalog, _dir) = service(&pool);
    let merchandise_id = create(&catalog, "Cold Relief", "Acme", &[]).await;
    let author = insert_pharmacist(&pool, "dr_lee").await;

    let created = catalog
        .create_comment(
            merchandise_id,
            comment_input(Some("fast"), Some("bitter"), Some(4)),
            author,
        )
        .await
        .expect("create_comment")
        .result;

    let patch = CommentPatch {
        negative: Some("slightly bitter".to_string()),
        ..CommentPatch::default()
    };
    let updated = catalog
        .update_comment(merchandise_id, created.id, patch, author)
        .await
        .expect("update_comment");
    assert_eq!(updated.result.negative, "slightly bitter");
    assert_eq!(updated.result.positive, "fast");
    assert_eq!(updated.result.author.as_deref(), Some("dr_lee"));

    let listed = catalog
        .list_comments(merchandise_id)
        .await
        .expect("list_comments")
        .result;
    assert_eq!(listed.len(), 1);

    let deleted = catalog
        .delete_comment(merchandise_id, created.id, author)
        .await
        .expect("delete_comment");
    assert_eq!(deleted.result.id, created.id);
    assert_eq!(comment_count(&pool).await, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn blank_patch_field_is_validation_error(pool: PgPool) {
    let (catalog, _dir) = service(&pool);

    let patch = CommentPatch {
        positive: Some("   ".to_string()),
        ..CommentPatch::default()
    };
    let err = catalog
        .update_comment(1, 1, patch, 1)
        .await
        .expect_err("blank patch");
    assert!(matches!(
        err,
        CatalogError::Validation(ValidationError::Empty("positive"))
    ));
}

// ---------------------------------------------------------------------------
// Likes and rankings
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn toggle_like_twice_restores_state(pool: PgPool) {
    let (catalog, _dir) = service(&pool);
    let merchandise_id = create(&catalog, "Cold Relief", "Acme", &[]).await;
    let customer = insert_customer(&pool, "kim", 30, Gender::Female).await;

    let first = catalog
        .toggle_like(merchandise_id, customer)
        .await
        .expect("first toggle");
    assert!(first.result.liked);
    assert_eq!(first.message, "merchandise liked");

    let second = catalog
        .toggle_like(merchandise_id, customer)
        .await
        .expect("second toggle");
    assert!(!second.result.liked);

    let detail = catalog.get_merchandise(merchandise_id).await.expect("detail");
    assert_eq!(detail.result.like_count, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn like_on_unknown_merchandise_is_not_found(pool: PgPool) {
    let (catalog, _dir) = service(&pool);
    let customer = insert_customer(&pool, "kim", 30, Gender::Female).await;

    let err = catalog
        .toggle_like(999, customer)
        .await
        .expect_err("unknown merchandise");
    assert!(matches!(err, CatalogError::NotFound { entity: "merchandise", id: 999 }));
}

#[sqlx::test(migrations = "../../migrations")]
async fn age_ranking_counts_only_the_band(pool: PgPool) {
    let (catalog, _dir) = service(&pool);
    let merchandise_id = create(&catalog, "Cold Relief", "Acme", &[]).await;
    let twenty = insert_customer(&pool, "twenty", 20, Gender::Male).await;
    let forty = insert_customer(&pool, "forty", 40, Gender::Female).await;
    catalog.toggle_like(merchandise_id, twenty).await.expect("like");
    catalog.toggle_like(merchandise_id, forty).await.expect("like");

    let ranking = catalog
        .rank_by_age(18, 30, None)
        .await
        .expect("rank_by_age");

    assert_eq!(ranking.result.len(), 1);
    assert_eq!(ranking.result[0].likes, 1);
    assert_eq!(ranking.message, "most liked by customers aged 18 to 30");

    let err = catalog
        .rank_by_age(30, 18, None)
        .await
        .expect_err("inverted band");
    assert!(matches!(err, CatalogError::Validation(_)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn rankings_are_sorted_non_increasing(pool: PgPool) {
    let (catalog, _dir) = service(&pool);
    let a = create(&catalog, "A", "Acme", &["sleep"]).await;
    let b = create(&catalog, "B", "Acme", &["sleep"]).await;
    let c = create(&catalog, "C", "Acme", &[]).await;
    let customers = [
        insert_customer(&pool, "c1", 21, Gender::Male).await,
        insert_customer(&pool, "c2", 22, Gender::Male).await,
        insert_customer(&pool, "c3", 23, Gender::Male).await,
    ];

    for customer in customers {
        catalog.toggle_like(b, customer).await.expect("like b");
    }
    catalog.toggle_like(a, customers[0]).await.expect("like a");
    catalog.toggle_like(c, customers[1]).await.expect("like c");

    let by_gender = catalog
        .rank_by_gender(Gender::Male, None)
        .await
        .expect("rank_by_gender")
        .result;
    let ids: Vec<i64> = by_gender.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![b, a, c]);
    assert!(by_gender.windows(2).all(|w| w[0].likes >= w[1].likes));

    let sleep_id: i64 = sqlx::query_scalar("SELECT id FROM effects WHERE name = 'sleep'")
        .fetch_one(&pool)
        .await
        .expect("sleep effect");
    let by_effect = catalog
        .rank_by_effect(sleep_id, None)
        .await
        .expect("rank_by_effect")
        .result;
    let counts: Vec<(i64, i64)> = by_effect.iter().map(|r| (r.id, r.likes)).collect();
    assert_eq!(counts, vec![(b, 3), (a, 1)]);

    let female = catalog
        .rank_by_gender(Gender::Female, None)
        .await
        .expect("rank_by_gender");
    assert!(female.result.is_empty());
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn search_matches_manufacturer_name_alone(pool: PgPool) {
    let (catalog, _dir) = service(&pool);
    let zentiva = create(&catalog, "Cold Relief", "Zentiva", &["fever"]).await;
    create(&catalog, "Pain Away", "Acme", &["headache"]).await;

    let hits = catalog.search("Zent").await.expect("search").result;
    let ids: Vec<i64> = hits.iter().map(|h| h.id).collect();
    assert_eq!(ids, vec![zentiva]);

    let by_effect = catalog.search("head").await.expect("search").result;
    assert_eq!(by_effect.len(), 1);
    assert_eq!(by_effect[0].name, "Pain Away");
}

#[sqlx::test(migrations = "../../migrations")]
async fn category_search_returns_rows(pool: PgPool) {
    let (catalog, _dir) = service(&pool);
    let id = create(&catalog, "Cold Relief", "Acme", &["fever"]).await;

    let outcome = catalog
        .search_by_category("fever")
        .await
        .expect("search_by_category");
    assert_eq!(outcome.result.len(), 1);
    assert_eq!(outcome.result[0].id, id);

    let err = catalog
        .search_by_category("  ")
        .await
        .expect_err("blank keyword");
    assert!(matches!(
        err,
        CatalogError::Validation(ValidationError::Empty("keyword"))
    ));
}

mod common;

use common::{create_test_db, question, quiz};
use quizbook::models::{Book, BookPage, OptionKey, Score};
use quizbook::play::PlayState;
use std::time::Duration;

fn sample_book(slug: &str, year: i32) -> Book {
    Book {
        slug: slug.to_string(),
        title: format!("Book {slug}"),
        year,
        pages: vec![
            BookPage {
                page_number: 1,
                content: vec![question(1, &[OptionKey::A])],
            },
            BookPage {
                page_number: 2,
                content: vec![],
            },
        ],
    }
}

#[tokio::test]
async fn quiz_roundtrips_with_questions_and_prerequisite() {
    let db = create_test_db().await;
    let first = quiz("first", None, vec![question(1, &[OptionKey::B, OptionKey::C])]);
    let second = quiz("second", Some("first"), vec![question(1, &[OptionKey::A])]);

    db.insert_quiz(&first).await.unwrap();
    db.insert_quiz(&second).await.unwrap();

    let loaded = db.get_quiz("second").await.unwrap().expect("quiz exists");
    assert_eq!(loaded, second);
    assert_eq!(db.list_quizzes().await.unwrap().len(), 2);
    assert!(db.get_quiz("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn update_quiz_reports_missing_rows() {
    let db = create_test_db().await;
    let mut original = quiz("first", None, vec![question(1, &[OptionKey::A])]);
    db.insert_quiz(&original).await.unwrap();

    original.title = "Renamed".to_string();
    assert!(db.update_quiz(&original).await.unwrap());
    assert_eq!(db.get_quiz("first").await.unwrap().unwrap().title, "Renamed");

    let ghost = quiz("ghost", None, vec![question(1, &[OptionKey::A])]);
    assert!(!db.update_quiz(&ghost).await.unwrap());
}

#[tokio::test]
async fn deleting_a_quiz_removes_its_scores_and_attempts() {
    let db = create_test_db().await;
    db.insert_quiz(&quiz("first", None, vec![question(1, &[OptionKey::A])]))
        .await
        .unwrap();
    db.save_best_score("guest:1", "first", Score { score: 1, total: 1 })
        .await
        .unwrap();
    let token = db
        .create_attempt("guest:1", &PlayState::new("first"))
        .await
        .unwrap();

    assert!(db.delete_quiz("first").await.unwrap());
    assert!(!db.delete_quiz("first").await.unwrap());
    assert!(db.scoreboard("guest:1").await.unwrap().is_empty());
    assert!(db.get_attempt(&token, "guest:1").await.unwrap().is_none());
}

#[tokio::test]
async fn only_better_scores_replace_the_best() {
    let db = create_test_db().await;

    assert!(db
        .save_best_score("guest:1", "first", Score { score: 3, total: 5 })
        .await
        .unwrap());
    assert!(!db
        .save_best_score("guest:1", "first", Score { score: 3, total: 5 })
        .await
        .unwrap());
    assert!(!db
        .save_best_score("guest:1", "first", Score { score: 2, total: 5 })
        .await
        .unwrap());
    assert!(db
        .save_best_score("guest:1", "first", Score { score: 5, total: 5 })
        .await
        .unwrap());

    assert_eq!(
        db.best_score("guest:1", "first").await.unwrap(),
        Some(Score { score: 5, total: 5 })
    );
    assert!(db.best_score("guest:2", "first").await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_finishes_keep_the_higher_score() {
    let db = create_test_db().await;

    for round in 0..20 {
        let quiz_slug = format!("quiz-{round}");
        let high = {
            let db = db.clone();
            let quiz_slug = quiz_slug.clone();
            tokio::spawn(async move {
                db.save_best_score("guest:1", &quiz_slug, Score { score: 5, total: 5 })
                    .await
            })
        };
        let low = {
            let db = db.clone();
            let quiz_slug = quiz_slug.clone();
            tokio::spawn(async move {
                db.save_best_score("guest:1", &quiz_slug, Score { score: 3, total: 5 })
                    .await
            })
        };

        let high = high.await.unwrap().expect("high score save should not fail");
        low.await.unwrap().expect("low score save should not fail");

        assert!(high, "5/5 always beats 3/5 or an empty slot");
        assert_eq!(
            db.best_score("guest:1", &quiz_slug).await.unwrap(),
            Some(Score { score: 5, total: 5 })
        );
    }
}

#[tokio::test]
async fn merging_guest_scores_keeps_the_best_of_both() {
    let db = create_test_db().await;
    db.save_best_score("guest:1", "first", Score { score: 4, total: 4 })
        .await
        .unwrap();
    db.save_best_score("guest:1", "second", Score { score: 1, total: 4 })
        .await
        .unwrap();
    db.save_best_score("user:1", "second", Score { score: 3, total: 4 })
        .await
        .unwrap();

    db.merge_scores("guest:1", "user:1").await.unwrap();

    let board = db.scoreboard("user:1").await.unwrap();
    assert_eq!(board.get("first"), Some(&Score { score: 4, total: 4 }));
    assert_eq!(board.get("second"), Some(&Score { score: 3, total: 4 }));
    assert!(db.scoreboard("guest:1").await.unwrap().is_empty());
}

#[tokio::test]
async fn attempts_belong_to_their_player() {
    let db = create_test_db().await;
    let mut state = PlayState::new("first");
    let token = db.create_attempt("guest:1", &state).await.unwrap();

    state.toggle(OptionKey::C);
    db.save_attempt(&token, &state).await.unwrap();

    assert_eq!(
        db.get_attempt(&token, "guest:1").await.unwrap(),
        Some(state)
    );
    assert!(db.get_attempt(&token, "guest:2").await.unwrap().is_none());

    db.delete_attempt(&token, "guest:2").await.unwrap();
    assert!(db.get_attempt(&token, "guest:1").await.unwrap().is_some());

    db.delete_attempt(&token, "guest:1").await.unwrap();
    assert!(db.get_attempt(&token, "guest:1").await.unwrap().is_none());
}

#[tokio::test]
async fn player_attempts_can_be_dropped_at_once() {
    let db = create_test_db().await;
    let first = db
        .create_attempt("guest:1", &PlayState::new("first"))
        .await
        .unwrap();
    let second = db
        .create_attempt("guest:1", &PlayState::new("second"))
        .await
        .unwrap();
    let other = db
        .create_attempt("guest:2", &PlayState::new("first"))
        .await
        .unwrap();

    assert_eq!(db.delete_player_attempts("guest:1").await.unwrap(), 2);
    assert!(db.get_attempt(&first, "guest:1").await.unwrap().is_none());
    assert!(db.get_attempt(&second, "guest:1").await.unwrap().is_none());
    assert!(db.get_attempt(&other, "guest:2").await.unwrap().is_some());
}

#[tokio::test]
async fn stale_attempts_are_pruned() {
    let db = create_test_db().await;
    let token = db
        .create_attempt("guest:1", &PlayState::new("first"))
        .await
        .unwrap();

    assert_eq!(db.prune_attempts(Duration::from_secs(3600)).await.unwrap(), 0);
    assert!(db.get_attempt(&token, "guest:1").await.unwrap().is_some());

    assert_eq!(db.prune_attempts(Duration::ZERO).await.unwrap(), 1);
    assert!(db.get_attempt(&token, "guest:1").await.unwrap().is_none());
}

#[tokio::test]
async fn books_are_listed_most_recent_year_first() {
    let db = create_test_db().await;
    db.insert_book(&sample_book("old-2023", 2023)).await.unwrap();
    db.insert_book(&sample_book("new-2024", 2024)).await.unwrap();

    let books = db.list_books().await.unwrap();
    let slugs: Vec<_> = books.iter().map(|b| b.slug.as_str()).collect();
    assert_eq!(slugs, ["new-2024", "old-2023"]);

    let loaded = db.get_book("old-2023").await.unwrap().expect("book exists");
    assert_eq!(loaded.pages.len(), 2);
    assert!(loaded.pages[1].content.is_empty());
}

#[tokio::test]
async fn book_update_and_delete() {
    let db = create_test_db().await;
    let mut book = sample_book("guide-2024", 2024);
    db.insert_book(&book).await.unwrap();

    book.pages.pop();
    assert!(db.update_book(&book).await.unwrap());
    assert_eq!(
        db.get_book("guide-2024").await.unwrap().unwrap().pages.len(),
        1
    );

    assert!(db.delete_book("guide-2024").await.unwrap());
    assert!(!db.delete_book("guide-2024").await.unwrap());
    assert!(db.get_book("guide-2024").await.unwrap().is_none());
}

#[tokio::test]
async fn seeding_only_fills_an_empty_table() {
    let db = create_test_db().await;

    let seeded = db.seed_quizzes().await.unwrap();
    assert!(seeded > 0);
    assert_eq!(db.count_quizzes().await.unwrap(), seeded as u64);
    assert_eq!(db.seed_quizzes().await.unwrap(), 0);

    let quizzes = db.list_quizzes().await.unwrap();
    assert!(quizzes[0].required_quiz_slug.is_none());
    assert!(quizzes
        .iter()
        .skip(1)
        .all(|q| q.required_quiz_slug.is_some()));
}

#[tokio::test]
async fn sessions_resolve_to_users_until_deleted() {
    let db = create_test_db().await;
    let id = db
        .create_user("player@example.com", "secret-password", false)
        .await
        .unwrap();
    let session = db.create_user_session(id).await.unwrap();

    let user = db
        .get_user_by_session(&session)
        .await
        .unwrap()
        .expect("session resolves");
    assert_eq!(user.email, "player@example.com");
    assert!(!user.is_admin);
    assert_eq!(user.player_key(), format!("user:{id}"));

    assert!(db
        .verify_user_password("player@example.com", "secret-password")
        .await
        .unwrap());
    assert!(!db
        .verify_user_password("player@example.com", "wrong")
        .await
        .unwrap());

    db.delete_user_session(&session).await.unwrap();
    assert!(db.get_user_by_session(&session).await.unwrap().is_none());
}

#[tokio::test]
async fn configured_emails_are_promoted_to_admin() {
    let db = create_test_db().await;
    db.create_user("boss@example.com", "secret-password", false)
        .await
        .unwrap();

    let promoted = db
        .promote_admins(&["boss@example.com".to_string()])
        .await
        .unwrap();
    assert_eq!(promoted, 1);
    assert_eq!(
        db.promote_admins(&["boss@example.com".to_string()])
            .await
            .unwrap(),
        0
    );

    let user = db
        .find_user_by_email("boss@example.com")
        .await
        .unwrap()
        .expect("user exists");
    assert!(user.is_admin);
}

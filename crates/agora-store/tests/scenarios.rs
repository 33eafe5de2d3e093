//! End-to-end behaviour of the store across components, including several
//! handles writing to one database file at once.

use std::path::Path;
use std::thread;

use agora_shared::{PostQuery, SortMode, ThreadRef, Voice};
use agora_store::{CreateOutcome, Database, NewForum, NewPost, NewThread, StoreError, User};

fn open(dir: &Path) -> Database {
    Database::open_at(&dir.join("agora.db")).unwrap()
}

fn add_user(db: &mut Database, nickname: &str) {
    let outcome = db
        .create_user(&User {
            nickname: nickname.to_string(),
            fullname: nickname.to_uppercase(),
            email: format!("{nickname}@example.org"),
            about: String::new(),
        })
        .unwrap();
    assert!(outcome.is_created());
}

fn cats_forum() -> NewForum {
    NewForum {
        slug: "cats".to_string(),
        title: "All about cats".to_string(),
        user: "alice".to_string(),
    }
}

fn new_thread(slug: Option<&str>) -> NewThread {
    NewThread {
        title: "Naps".to_string(),
        author: "alice".to_string(),
        forum: "cats".to_string(),
        message: "Where do yours sleep?".to_string(),
        slug: slug.map(str::to_string),
        created: None,
    }
}

#[test]
fn forum_creation_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = open(dir.path());
    add_user(&mut db, "alice");

    let forum = db.create_forum(&cats_forum()).unwrap().created().unwrap();
    assert_eq!((forum.posts, forum.threads), (0, 0));
    assert_eq!(forum.user, "alice");

    match db.create_forum(&cats_forum()).unwrap() {
        CreateOutcome::Conflict(existing) => assert_eq!(existing, forum),
        CreateOutcome::Created(_) => panic!("second create must conflict"),
    }
    assert!(matches!(
        db.insert_forum(&cats_forum()),
        Err(StoreError::ForumAlreadyExists(_))
    ));
}

#[test]
fn thread_resolves_by_id_and_slug() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = open(dir.path());
    add_user(&mut db, "alice");
    db.create_forum(&cats_forum()).unwrap();

    let anonymous = db.create_thread(&new_thread(None)).unwrap().into_inner();
    assert!(anonymous.id > 0);
    assert_eq!(anonymous.slug, None);
    assert_eq!(db.resolve_thread(&ThreadRef::Id(anonymous.id)).unwrap(), anonymous.id);

    let named = db.create_thread(&new_thread(Some("naps"))).unwrap().into_inner();
    assert_eq!(db.resolve_thread(&ThreadRef::parse("naps").unwrap()).unwrap(), named.id);
    assert_eq!(db.resolve_thread(&ThreadRef::parse(&named.id.to_string()).unwrap()).unwrap(), named.id);
    assert_eq!(db.get_forum("cats").unwrap().threads, 2);
}

#[test]
fn three_read_orders() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = open(dir.path());
    add_user(&mut db, "alice");
    db.create_forum(&cats_forum()).unwrap();
    let thread = db.create_thread(&new_thread(Some("naps"))).unwrap().into_inner();
    let at = thread.reference();

    let p1 = db.add_posts(&at, &[NewPost::top_level("alice", "first")]).unwrap().remove(0);
    let p2 = db.add_posts(&at, &[NewPost::reply(p1.id, "alice", "reply")]).unwrap().remove(0);
    let p3 = db.add_posts(&at, &[NewPost::top_level("alice", "second")]).unwrap().remove(0);

    assert_eq!(p2.path.segments(), &[p1.id, p2.id]);

    let ids = |sort: SortMode, limit: u32| -> Vec<i64> {
        db.list_posts(&at, &PostQuery::new(sort).limit(limit))
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect()
    };
    assert_eq!(ids(SortMode::Flat, 100), vec![p1.id, p2.id, p3.id]);
    assert_eq!(ids(SortMode::Tree, 100), vec![p1.id, p2.id, p3.id]);
    assert_eq!(ids(SortMode::ParentTree, 1), vec![p1.id, p2.id]);
}

#[test]
fn foreign_parent_fails_whole_batch() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = open(dir.path());
    add_user(&mut db, "alice");
    db.create_forum(&cats_forum()).unwrap();
    let first = db.create_thread(&new_thread(Some("naps"))).unwrap().into_inner();
    let second = db.create_thread(&new_thread(Some("toys"))).unwrap().into_inner();

    let foreign = db
        .add_posts(&first.reference(), &[NewPost::top_level("alice", "elsewhere")])
        .unwrap()
        .remove(0);

    let err = db
        .add_posts(
            &second.reference(),
            &[
                NewPost::top_level("alice", "ok"),
                NewPost::reply(foreign.id, "alice", "wrong thread"),
            ],
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::ParentNotFound(id) if id == foreign.id));
    assert!(db
        .list_posts(&second.reference(), &PostQuery::default())
        .unwrap()
        .is_empty());
    assert_eq!(db.status().unwrap().post, 1);
}

#[test]
fn changed_vote_replaces_earlier_voice() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = open(dir.path());
    add_user(&mut db, "alice");
    add_user(&mut db, "bob");
    db.create_forum(&cats_forum()).unwrap();
    let thread = db.create_thread(&new_thread(Some("naps"))).unwrap().into_inner();

    db.cast_vote(&thread.reference(), "alice", Voice::Up).unwrap();
    db.cast_vote(&thread.reference(), "bob", Voice::Up).unwrap();
    let after = db.cast_vote(&thread.reference(), "bob", Voice::Down).unwrap();

    assert_eq!(after.votes, 0);
    assert_eq!(db.get_vote(&thread.reference(), "bob").unwrap().voice, Voice::Down);
}

#[test]
fn concurrent_handles_keep_score_and_batches_consistent() {
    const WORKERS: usize = 8;

    let dir = tempfile::tempdir().unwrap();
    let mut db = open(dir.path());
    add_user(&mut db, "alice");
    for i in 0..WORKERS {
        add_user(&mut db, &format!("voter{i}"));
    }
    db.create_forum(&cats_forum()).unwrap();
    let thread = db.create_thread(&new_thread(Some("naps"))).unwrap().into_inner();

    let handles: Vec<_> = (0..WORKERS)
        .map(|i| {
            let dir = dir.path().to_path_buf();
            thread::spawn(move || {
                let mut db = open(&dir);
                let at = ThreadRef::Slug("naps".to_string());
                let nickname = format!("voter{i}");

                // Flip a few times before settling: even workers end on Down.
                for round in 0..4 {
                    let voice = if (round + i) % 2 == 0 { Voice::Up } else { Voice::Down };
                    db.cast_vote(&at, &nickname, voice).unwrap();
                }
                let final_voice = if i % 2 == 0 { Voice::Down } else { Voice::Up };
                db.cast_vote(&at, &nickname, final_voice).unwrap();

                let batch: Vec<_> = (0..5)
                    .map(|n| NewPost::top_level(nickname.clone(), format!("{n}")))
                    .collect();
                db.add_posts(&at, &batch).unwrap()
            })
        })
        .collect();

    for handle in handles {
        let batch = handle.join().unwrap();
        let first = batch[0].id;
        for (offset, post) in batch.iter().enumerate() {
            assert_eq!(post.id, first + offset as i64);
            assert_eq!(post.created, batch[0].created);
        }
    }

    let expected: i64 = (0..WORKERS).map(|i| if i % 2 == 0 { -1 } else { 1 }).sum();
    let thread = db.get_thread(&thread.reference()).unwrap();
    assert_eq!(thread.votes, expected);

    let status = db.status().unwrap();
    assert_eq!(status.post, (WORKERS * 5) as i64);
    assert_eq!(db.get_forum("cats").unwrap().posts, (WORKERS * 5) as i64);
}

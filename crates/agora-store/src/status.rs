//! Store-wide counters.

use crate::database::Database;
use crate::error::Result;
use crate::models::Status;

impl Database {
    /// Number of users, forums, threads and posts.
    pub fn status(&self) -> Result<Status> {
        Ok(self.conn().query_row(
            "SELECT (SELECT COUNT(*) FROM users),
                    (SELECT COUNT(*) FROM forums),
                    (SELECT COUNT(*) FROM threads),
                    (SELECT COUNT(*) FROM posts)",
            [],
            |row| {
                Ok(Status {
                    user: row.get(0)?,
                    forum: row.get(1)?,
                    thread: row.get(2)?,
                    post: row.get(3)?,
                })
            },
        )?)
    }
}

#[cfg(test)]
mod tests {
    use crate::models::NewPost;
    use crate::testing;

    #[test]
    fn counts_every_table() {
        let (_dir, mut db) = testing::temp_db();
        assert_eq!(db.status().unwrap(), Default::default());

        testing::user(&mut db, "alice");
        testing::user(&mut db, "bob");
        testing::forum(&mut db, "cats", "alice");
        let thread = testing::thread(&mut db, "cats", "bob", None);
        db.add_posts(
            &thread.reference(),
            &[NewPost::top_level("alice", "a"), NewPost::top_level("bob", "b")],
        )
        .unwrap();

        let status = db.status().unwrap();
        assert_eq!((status.user, status.forum, status.thread, status.post), (2, 1, 1, 2));
    }
}

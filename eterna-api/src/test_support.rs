use diesel::prelude::*;
use uuid::Uuid;

use crate::models::NewUser;
use crate::schema::users;

/// Connection to the migrated database named by `DATABASE_URL`. Tests that
/// need Postgres return early when it is unset.
pub fn db_conn() -> Option<PgConnection> {
    let url = std::env::var("DATABASE_URL").ok()?;
    match PgConnection::establish(&url) {
        Ok(conn) => Some(conn),
        Err(e) => panic!("DATABASE_URL is set but unreachable: {e}"),
    }
}

pub fn insert_user(conn: &mut PgConnection, name: &str) -> Uuid {
    diesel::insert_into(users::table)
        .values(&NewUser {
            email: format!("{name}-{}@eterna.test", Uuid::now_v7()),
            name: Some(name.to_string()),
            password_hash: "not-a-real-hash".into(),
        })
        .returning(users::id)
        .get_result(conn)
        .unwrap()
}

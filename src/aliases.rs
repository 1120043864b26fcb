use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::bb8::PooledConnection;

pub type DieselError = diesel::result::Error;

/// A pooled database connection as handed out by [`crate::app_state::AppState`].
pub type DbConn<'a> = PooledConnection<'a, AsyncPgConnection>;

//! Storage for the meet roster: the Diesel schema, row types and the pooled
//! SQLite connection used by the server.

pub mod athlete;
pub mod catalog;
/// Text codes (gender, venue, ...) stored as `TEXT`.
pub mod codes;
pub mod meet;
/// Database schema
pub mod schema;

use diesel::connection::{
    DefaultLoadingMode, LoadConnection, TransactionManager,
};
use diesel::expression::QueryMetadata;
use diesel::migration::{MigrationConnection, CREATE_MIGRATIONS_TABLE};
use diesel::query_builder::Query;
use diesel::{
    connection::{
        AnsiTransactionManager, ConnectionSealed, Instrumentation,
        InstrumentationEvent, SimpleConnection,
    },
    query_builder::{QueryFragment, QueryId},
    r2d2::{ConnectionManager, CustomizeConnection, ManageConnection, Pool},
    sqlite::Sqlite,
    Connection, ConnectionResult, QueryResult, SqliteConnection,
};
use diesel::{sql_query, RunQueryDsl};
use rocket::{Build, Rocket};
use rocket_sync_db_pools::{database, Config, PoolResult, Poolable};

/// Settings applied to every connection, pooled or not. Foreign keys must be
/// on for meet deletion to cascade to offerings and entries.
pub const CONNECTION_PRAGMAS: &str = "\
    PRAGMA busy_timeout = 1000;\
    PRAGMA journal_mode = WAL;\
    PRAGMA foreign_keys = ON;\
";

#[database("database")]
pub struct DbConn(DbWrapper);

/// A `SqliteConnection` that opens a tracing span around each load and
/// transaction, so statements are attributed to the request that ran them.
pub struct DbWrapper(SqliteConnection);

impl SimpleConnection for DbWrapper {
    #[tracing::instrument(skip(self, query))]
    fn batch_execute(&mut self, query: &str) -> QueryResult<()> {
        self.0.batch_execute(query)?;

        Ok(())
    }
}

impl ConnectionSealed for DbWrapper {}

impl Connection for DbWrapper {
    type Backend = Sqlite;
    type TransactionManager = AnsiTransactionManager;

    fn establish(database_url: &str) -> ConnectionResult<DbWrapper> {
        open_connection(database_url).map(DbWrapper)
    }

    #[tracing::instrument(skip(self, f))]
    fn transaction<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<diesel::result::Error>,
    {
        Self::TransactionManager::transaction(self, f)
    }

    fn execute_returning_count<T>(&mut self, source: &T) -> QueryResult<usize>
    where
        T: QueryFragment<Sqlite> + QueryId,
    {
        self.0.execute_returning_count(source)
    }

    fn transaction_state(&mut self) -> &mut Self::TransactionManager {
        self.0.transaction_state()
    }

    fn instrumentation(&mut self) -> &mut dyn Instrumentation {
        self.0.instrumentation()
    }

    fn set_instrumentation(&mut self, instrumentation: impl Instrumentation) {
        self.0.set_instrumentation(instrumentation)
    }
}

impl LoadConnection<DefaultLoadingMode> for DbWrapper {
    type Cursor<'conn, 'query>
        = <SqliteConnection as LoadConnection<DefaultLoadingMode>>::Cursor<
        'conn,
        'query,
    >
    where
        Self: 'conn;
    type Row<'conn, 'query>
        = <SqliteConnection as LoadConnection<DefaultLoadingMode>>::Row<
        'conn,
        'query,
    >
    where
        Self: 'conn;

    #[tracing::instrument(skip(self, source))]
    fn load<'conn, 'query, T>(
        &'conn mut self,
        source: T,
    ) -> QueryResult<Self::Cursor<'conn, 'query>>
    where
        T: Query + QueryFragment<Self::Backend> + QueryId + 'query,
        Self::Backend: QueryMetadata<T::SqlType>,
    {
        self.0.load(source)
    }
}

impl MigrationConnection for DbWrapper {
    fn setup(&mut self) -> QueryResult<usize> {
        sql_query(CREATE_MIGRATIONS_TABLE).execute(self)
    }
}

pub struct DbWrapperManager {
    manager: ConnectionManager<SqliteConnection>,
}

impl ManageConnection for DbWrapperManager {
    type Connection = DbWrapper;

    type Error = diesel::r2d2::Error;

    fn connect(&self) -> Result<Self::Connection, Self::Error> {
        self.manager.connect().map(DbWrapper)
    }

    fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        self.manager.is_valid(&mut conn.0)
    }

    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        self.manager.has_broken(&mut conn.0)
    }
}

/// Logs statements as they run. Failures are logged here as well as being
/// returned, since a constraint violation that the caller maps to a domain
/// error is otherwise invisible in the trace.
pub struct StatementLogger;

impl Instrumentation for StatementLogger {
    fn on_connection_event(&mut self, event: InstrumentationEvent<'_>) {
        match event {
            InstrumentationEvent::StartQuery { query, .. } => {
                tracing::trace!("running statement {query}");
            }
            InstrumentationEvent::FinishQuery {
                query,
                error: Some(error),
                ..
            } => {
                tracing::warn!(%error, "statement failed: {query}");
            }
            InstrumentationEvent::BeginTransaction { depth, .. } => {
                tracing::trace!(depth = depth.get(), "begin transaction");
            }
            _ => (),
        }
    }
}

/// Installs the statement logger and applies [`CONNECTION_PRAGMAS`].
pub fn prepare_connection(conn: &mut SqliteConnection) -> QueryResult<()> {
    conn.set_instrumentation(StatementLogger);
    conn.batch_execute(CONNECTION_PRAGMAS)
}

/// Opens a standalone connection configured like the pooled ones.
pub fn open_connection(url: &str) -> ConnectionResult<SqliteConnection> {
    let mut conn = SqliteConnection::establish(url)?;
    prepare_connection(&mut conn).map_err(|error| {
        diesel::ConnectionError::BadConnection(error.to_string())
    })?;
    Ok(conn)
}

/// A SQLite connection with diesel's ANSI transaction manager: either a bare
/// `SqliteConnection` or the pooled [`DbWrapper`].
pub trait RosterConnection:
    Connection<Backend = Sqlite, TransactionManager = AnsiTransactionManager>
    + LoadConnection
{
}

impl<C> RosterConnection for C where
    C: Connection<Backend = Sqlite, TransactionManager = AnsiTransactionManager>
        + LoadConnection
{
}

/// Runs `f` in a transaction that holds the write lock from the start
/// (`BEGIN IMMEDIATE`). Concurrent writers wait on `busy_timeout` for it,
/// so anything `f` reads is still current when it writes. Inside an open
/// transaction this is a savepoint.
pub fn immediate_transaction<C, T, E, F>(conn: &mut C, f: F) -> Result<T, E>
where
    C: RosterConnection,
    F: FnOnce(&mut C) -> Result<T, E>,
    E: From<diesel::result::Error>,
{
    let depth = AnsiTransactionManager::transaction_manager_status_mut(conn)
        .transaction_depth()?;
    if depth.is_some() {
        return conn.transaction(f);
    }

    AnsiTransactionManager::begin_transaction_sql(conn, "BEGIN IMMEDIATE")?;
    match f(conn) {
        Ok(value) => {
            AnsiTransactionManager::commit_transaction(conn)?;
            Ok(value)
        }
        Err(error) => {
            AnsiTransactionManager::rollback_transaction(conn)?;
            Err(error)
        }
    }
}

#[derive(Debug)]
struct PrepareOnAcquire;

impl CustomizeConnection<DbWrapper, diesel::r2d2::Error> for PrepareOnAcquire {
    fn on_acquire(
        &self,
        conn: &mut DbWrapper,
    ) -> Result<(), diesel::r2d2::Error> {
        prepare_connection(&mut conn.0).map_err(diesel::r2d2::Error::QueryError)
    }
}

impl Poolable for DbWrapper {
    type Manager = DbWrapperManager;

    type Error = std::convert::Infallible;

    fn pool(db_name: &str, rocket: &Rocket<Build>) -> PoolResult<Self> {
        let config = Config::from(db_name, rocket)?;
        tracing::info!(url = %config.url, pool_size = config.pool_size, "opening database pool");

        let manager = DbWrapperManager {
            manager: ConnectionManager::new(&config.url),
        };
        let pool = Pool::builder()
            .connection_customizer(Box::new(PrepareOnAcquire))
            .max_size(config.pool_size)
            .connection_timeout(std::time::Duration::from_secs(
                config.timeout as u64,
            ))
            .build(manager)?;

        Ok(pool)
    }
}

mod logging_driver;
pub use logging_driver::{DriverOp, LoggingDriver, OpsLog};

pub mod models;

use skein::{db::Builder, Db};
use skein_driver_sqlite::Sqlite;
use std::sync::{Mutex, Once};

static INIT_LOGGING: Once = Once::new();

/// Routes `skein` logs to the test output, filtered by `RUST_LOG`.
pub fn init_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A database handle over a fresh in-memory SQLite database with the
/// tables of every registered entity created, plus the log of operations
/// it executes after setup.
pub async fn setup(configure: impl FnOnce(&mut Builder)) -> (Db, OpsLog) {
    init_logging();

    let driver = LoggingDriver::new(Box::new(Sqlite::in_memory()));
    let ops_log = driver.ops_log_handle();

    let mut builder = Db::builder();
    configure(&mut builder);
    let db = builder.build(driver).await.unwrap();
    db.push_schema().await.unwrap();

    ops_log.lock().unwrap().clear();
    (db, ops_log)
}

/// Registers the `User`, `Post` and `Comment` entities.
pub async fn setup_blog() -> (Db, OpsLog) {
    setup(|builder| {
        builder
            .register::<models::User>()
            .register::<models::Post>()
            .register::<models::Comment>();
    })
    .await
}

/// The SQL of every logged operation, in execution order.
pub fn logged_sql(ops_log: &Mutex<Vec<DriverOp>>) -> Vec<String> {
    ops_log
        .lock()
        .unwrap()
        .iter()
        .map(|op| op.operation.sql().to_string())
        .collect()
}

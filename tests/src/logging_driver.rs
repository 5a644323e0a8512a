use skein_core::{
    async_trait,
    driver::{Capability, Connection, Driver, Operation, Response},
    Result,
};
use std::{
    borrow::Cow,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

/// Every round trip made through a [`LoggingDriver`], in execution order.
pub type OpsLog = Arc<Mutex<Vec<DriverOp>>>;

/// A driver decorator that records each operation with its response.
#[derive(Debug)]
pub struct LoggingDriver {
    inner: Box<dyn Driver>,
    capability_override: Option<&'static Capability>,
    log: OpsLog,
    connections_opened: AtomicUsize,
}

#[derive(Debug, Clone)]
pub struct DriverOp {
    /// Which connection of the driver ran the operation, counting from 0
    pub connection: usize,
    pub operation: Operation,
    pub response: Response,
}

#[derive(Debug)]
struct LoggingConnection {
    id: usize,
    inner: Box<dyn Connection>,
    log: OpsLog,
}

impl LoggingDriver {
    pub fn new(inner: Box<dyn Driver>) -> LoggingDriver {
        LoggingDriver {
            inner,
            capability_override: None,
            log: OpsLog::default(),
            connections_opened: AtomicUsize::new(0),
        }
    }

    /// Reports `capability` instead of the wrapped driver's.
    pub fn with_capability(self, capability: &'static Capability) -> LoggingDriver {
        LoggingDriver {
            capability_override: Some(capability),
            ..self
        }
    }

    pub fn ops_log_handle(&self) -> OpsLog {
        Arc::clone(&self.log)
    }
}

#[async_trait]
impl Driver for LoggingDriver {
    fn url(&self) -> Cow<'_, str> {
        self.inner.url()
    }

    fn capability(&self) -> &'static Capability {
        match self.capability_override {
            Some(capability) => capability,
            None => self.inner.capability(),
        }
    }

    async fn connect(&self) -> Result<Box<dyn Connection>> {
        let inner = self.inner.connect().await?;
        Ok(Box::new(LoggingConnection {
            id: self.connections_opened.fetch_add(1, Ordering::SeqCst),
            inner,
            log: self.ops_log_handle(),
        }))
    }
}

#[async_trait]
impl Connection for LoggingConnection {
    async fn exec(&mut self, operation: Operation) -> Result<Response> {
        let response = self.inner.exec(operation.clone()).await?;
        let entry = DriverOp {
            connection: self.id,
            operation,
            response: response.clone(),
        };
        self.log.lock().unwrap().push(entry);
        Ok(response)
    }
}

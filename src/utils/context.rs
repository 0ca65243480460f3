use mongodb::Database;
use parking_lot::RwLock;
use chrono::{DateTime, Utc};
use crate::model::policy::SecurityPolicy;
use crate::utils::{config::Configuration, crypto::BlobCipher};

#[cfg(feature = "kafka")]
use serde_json::Value;
#[cfg(feature = "kafka")]
use crate::utils::errors::WardenError;
#[cfg(feature = "kafka")]
use rdkafka::producer::FutureProducer;

///
/// The context is available to all gRPC service endpoints and gives them access to the DB,
/// the security policy, the blob cipher, the clock, Kafka, config, etc.
///
pub struct ServiceContext {
    db: Database,
    config: Configuration,
    policy: SecurityPolicy,
    cipher: BlobCipher,
    time_provider: RwLock<TimeProvider>,

    #[cfg(feature = "kafka")]
    producer: FutureProducer,
}

impl ServiceContext {
    pub fn new(config: Configuration, db: Database, policy: SecurityPolicy, cipher: BlobCipher) -> Self {
        ServiceContext {
            db,
            config: config.clone(),
            policy,
            cipher,
            time_provider: RwLock::new(TimeProvider::default()),

            #[cfg(feature = "kafka")]
            producer: crate::utils::kafka::producer::producer(&config),
        }
    }

    #[cfg(feature = "kafka")]
    pub async fn send(&self, topic: &str, payload: Value) -> Result<(), WardenError> {
        crate::utils::kafka::producer::send(
            &self.producer,
            &self.config,
            topic,
            &payload.to_string()).await
    }

    #[cfg(not(feature = "kafka"))]
    pub async fn send(&self, _topic: &str, _payload: serde_json::Value) -> Result<(), crate::utils::errors::WardenError> {
        Ok(())
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.time_provider.read().now()
    }

    ///
    /// Set or clear the fixed time used by every time-boxed check in the service.
    ///
    pub fn set_now(&self, now: Option<DateTime<Utc>>) {
        self.time_provider.write().fix(now);
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn policy(&self) -> &SecurityPolicy {
        &self.policy
    }

    pub fn cipher(&self) -> &BlobCipher {
        &self.cipher
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }
}

///
/// An overridable clock - when fixed (via the internal SetTime API) the
/// integration tests can time-travel across lockout, session and TOTP windows.
///
#[derive(Debug)]
struct TimeProvider {
    fixed: Option<DateTime<Utc>>
}

impl TimeProvider {
    fn default() -> Self {
        TimeProvider { fixed: None }
    }

    fn now(&self) -> DateTime<Utc> {
        match self.fixed {
            Some(fixed) => fixed,
            None => Utc::now()
        }
    }

    fn fix(&mut self, fixed: Option<DateTime<Utc>>) {
        self.fixed = fixed;
    }
}

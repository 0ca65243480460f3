use std::time::Duration;
use tracing::instrument;
use crate::{APP_NAME, utils::{config::Configuration, errors::WardenError}};
use rdkafka::{ClientConfig, message::OwnedHeaders, producer::{FutureProducer, FutureRecord}};

pub fn producer(config: &Configuration) -> FutureProducer {
    ClientConfig::new()
        .set("bootstrap.servers", config.clone().kafka_servers)
        .set("message.timeout.ms", format!("{}", config.kafka_timeout))
        .create()
        .expect("Producer creation error")
}

#[instrument(name="kafka:send", skip(producer, config, payload))]
pub async fn send(producer: &FutureProducer, config: &Configuration, topic: &str, payload: &str) -> Result<(), WardenError> {
    producer
        .send(
            FutureRecord::to(topic)
                .payload(payload)
                .key("EVENT_LOG") // Partition key - use fixed value to ensure sequencing is in order.
                .headers(OwnedHeaders::new().add("sender", APP_NAME)),
            Duration::from_millis(config.kafka_timeout as u64),
        )
        .await?;
    Ok(())
}

// region:    --- Imports
use super::{BroadcastError, Broadcaster};
use crate::auction::events::AuctionEvent;
use async_trait::async_trait;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use std::time::Duration;
use tracing::{error, info};

// endregion: --- Imports

// region:    --- Kafka Broadcaster
/// Publishes auction events to a Kafka topic, keyed by item id so that the
/// events of one auction stay ordered within a partition.
pub struct KafkaBroadcaster {
    producer: FutureProducer,
    brokers: String,
    topic: String,
}

impl KafkaBroadcaster {
    pub fn new(brokers: &str, topic: &str) -> Result<Self, KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(KafkaBroadcaster {
            producer,
            brokers: brokers.to_string(),
            topic: topic.to_string(),
        })
    }

    /// Create the topic, treating an existing one as success
    pub async fn create_topic(
        &self,
        num_partitions: i32,
        replication_factor: i32,
    ) -> Result<(), KafkaError> {
        info!("{:<12} --> Creating topic: {}", "Kafka", self.topic);

        let admin_client: AdminClient<DefaultClientContext> = ClientConfig::new()
            .set("bootstrap.servers", &self.brokers)
            .create()?;

        let new_topic = NewTopic::new(
            &self.topic,
            num_partitions,
            TopicReplication::Fixed(replication_factor),
        );

        let results = admin_client
            .create_topics(&[new_topic], &AdminOptions::new())
            .await?;
        for result in results {
            match result {
                Ok(topic) => info!("{:<12} --> Topic ready: {}", "Kafka", topic),
                Err((topic, RDKafkaErrorCode::TopicAlreadyExists)) => {
                    info!("{:<12} --> Topic already exists: {}", "Kafka", topic)
                }
                Err((topic, code)) => {
                    error!("{:<12} --> Topic {} not created: {:?}", "Kafka", topic, code);
                    return Err(KafkaError::AdminOp(code));
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Broadcaster for KafkaBroadcaster {
    async fn publish(&self, event: &AuctionEvent) -> Result<(), BroadcastError> {
        let key = event.item_id().to_string();
        let payload = serde_json::to_string(event)?;
        info!(
            "{:<12} --> Sending {}: topic={}, key={}",
            "Kafka",
            event.name(),
            self.topic,
            key
        );

        let record = FutureRecord::to(&self.topic).key(&key).payload(&payload);
        self.producer
            .send(record, Duration::from_secs(0))
            .await
            .map_err(|(e, _)| BroadcastError::Kafka(e))?;

        Ok(())
    }
}
// endregion: --- Kafka Broadcaster

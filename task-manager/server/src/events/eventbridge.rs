use async_trait::async_trait;
use aws_sdk_eventbridge::Client;
use aws_sdk_eventbridge::error::DisplayErrorContext;
use aws_sdk_eventbridge::primitives::DateTime;
use aws_sdk_eventbridge::types::PutEventsRequestEntry;

use crate::events::{EventBus, EventEnvelope, EventError};

/// [`EventBus`] backed by Amazon EventBridge `PutEvents`.
#[derive(Clone, Debug)]
pub struct EventBridgeBus {
    client: Client,
    event_bus_name: Option<String>,
}

impl EventBridgeBus {
    /// Builds a client from the default AWS credential chain for `region`.
    /// Events go to `event_bus_name`, or the account's default bus when `None`.
    pub async fn connect(region: String, event_bus_name: Option<String>) -> Self {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region))
            .load()
            .await;
        Self::with_client(Client::new(&sdk_config), event_bus_name)
    }

    pub fn with_client(client: Client, event_bus_name: Option<String>) -> Self {
        Self {
            client,
            event_bus_name,
        }
    }
}

#[async_trait]
impl EventBus for EventBridgeBus {
    #[tracing::instrument(skip(self, event), fields(detail_type = %event.detail_type))]
    async fn put_event(&self, event: EventEnvelope) -> Result<(), EventError> {
        let entry = PutEventsRequestEntry::builder()
            .source(event.source)
            .detail_type(event.detail_type)
            .detail(event.detail)
            .time(DateTime::from_millis(event.time.timestamp_millis()))
            .set_event_bus_name(self.event_bus_name.clone())
            .build();

        let output = self
            .client
            .put_events()
            .entries(entry)
            .send()
            .await
            .map_err(|err| EventError::Dispatch(DisplayErrorContext(&err).to_string()))?;

        let failed = output.failed_entry_count();
        if failed > 0 {
            let reason = output
                .entries()
                .iter()
                .filter_map(|result| {
                    result.error_code().map(|code| match result.error_message() {
                        Some(message) => format!("{code}: {message}"),
                        None => code.to_string(),
                    })
                })
                .collect::<Vec<_>>()
                .join(", ");
            return Err(EventError::Rejected { failed, reason });
        }

        tracing::debug!("EventBridge accepted event: {:?}", output.entries());
        Ok(())
    }
}

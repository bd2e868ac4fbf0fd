use pulse_core::listener::NextFn;
use pulse_core::{Dispatcher, DispatcherConfig, Listener, ListenerHandle, PulseResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Dispatcher over dynamically-shaped payloads, so one instance can serve
/// topics that carry different kinds of data.
pub type JsonDispatcher = Dispatcher<Value>;

/// A [`JsonDispatcher`] whose `emit` traces print the payload itself.
pub fn json_dispatcher(config: DispatcherConfig) -> JsonDispatcher {
    JsonDispatcher::new(config).with_payload_trace()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusEvent {
    pub topic: String,
    #[serde(default)]
    pub payload: Value,
}

impl BusEvent {
    pub fn new(topic: impl Into<String>, payload: impl Into<Value>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    pub fn from_json(raw: &str) -> PulseResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

pub trait EventBus: Send + Sync {
    fn publish(&self, event: BusEvent);
    fn listen(&self, topic: &str, on_next: Box<NextFn<Value>>) -> ListenerHandle<Value>;
    fn unlisten(&self, listener: &ListenerHandle<Value>);
}

impl EventBus for JsonDispatcher {
    fn publish(&self, event: BusEvent) {
        self.emit(&event.topic, event.payload);
    }

    fn listen(&self, topic: &str, on_next: Box<NextFn<Value>>) -> ListenerHandle<Value> {
        self.subscribe(Listener::new(topic, on_next))
    }

    fn unlisten(&self, listener: &ListenerHandle<Value>) {
        self.unsubscribe(listener);
    }
}

/// Parses a `{"topic": .., "payload": ..}` document and publishes it. Only
/// the parse can fail; delivery follows the usual no-throw rules.
pub fn publish_json(bus: &dyn EventBus, raw: &str) -> PulseResult<()> {
    let event = BusEvent::from_json(raw)?;
    tracing::debug!(target: "pulse", topic = %event.topic, "publishing json event");
    bus.publish(event);
    Ok(())
}

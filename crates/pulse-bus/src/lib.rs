pub mod bus;
pub mod singleton;

pub use bus::{json_dispatcher, publish_json, BusEvent, EventBus, JsonDispatcher};
pub use singleton::SingletonDispatcher;

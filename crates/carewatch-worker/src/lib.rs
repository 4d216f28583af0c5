// Monitor worker
//
// Runs a monitor session: subscribes to the sensor feed, polls the mood
// service, fires alerts and drives the fall alarm. The API crate hosts the
// same session in-process.

pub mod adapters;
pub mod alarm;
pub mod config;
pub mod demo;
pub mod dispatch;
pub mod mood_client;
pub mod mood_poller;
pub mod session;

// Re-export main types
pub use adapters::{
    create_mood_source, create_store_backends, StoreBackends, TracingAudio, TracingNotifier,
};
pub use alarm::AlarmSlot;
pub use config::{StoreKind, WorkerConfig};
pub use demo::{parse_demo_readings, spawn_demo_feed};
pub use dispatch::AlertDispatcher;
pub use mood_client::HttpMoodSource;
pub use mood_poller::MoodPoller;
pub use session::{MonitorSession, SessionDeps, SessionHandle};

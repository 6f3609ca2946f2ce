pub mod app;
pub mod registry;

pub use app::AppState;
pub use registry::SubscriberRegistry;

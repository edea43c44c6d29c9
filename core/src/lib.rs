pub mod config;
pub mod error;
pub mod matcher;
pub mod selector;

pub use config::Config;
pub use config::ConfigStore;
pub use error::ConfigError;
pub use selector::Outcome;
pub use selector::PinSink;
pub use selector::Restriction;
pub use selector::Selector;
pub use selector::SelectorParams;

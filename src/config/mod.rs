mod settings;

pub use settings::{CalendarConfig, ExecutorConfig, LoggingConfig, Settings, StderrPolicy};

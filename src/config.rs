use camino::Utf8Path;
use config::{Config, ConfigError, Source};

pub use huetray_api::config::*;

fn load(source: impl Source + Send + Sync + 'static) -> Result<AppConfig, ConfigError> {
    let settings = Config::builder()
        .set_default("huetray.command_pacing_ms", DEFAULT_COMMAND_PACING_MS)?
        .add_source(source)
        .build()?;

    settings.try_deserialize()
}

pub fn parse(filename: &Utf8Path) -> Result<AppConfig, ConfigError> {
    load(config::File::with_name(filename.as_str()))
}

// 📝 Logger setup for the binaries
// The library only uses the `log` facade; binaries call `init()` once.

use std::io::Write;
use std::sync::Once;

use chrono::Utc;

use crate::config::{LogConfig, LogFormat};

static INIT: Once = Once::new();

/// Install the global `env_logger` (safe to call more than once).
///
/// Filter defaults to `info` and honours `RUST_LOG`. Each record is one line,
/// plain text or JSON depending on `config.format`.
pub fn init(config: &LogConfig) {
    let format = config.format;
    INIT.call_once(|| {
        let mut builder =
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

        builder.format(move |buf, record| {
            let ts = Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
            match format {
                LogFormat::Json => {
                    let obj = serde_json::json!({
                        "ts": ts,
                        "level": record.level().to_string(),
                        "target": record.target(),
                        "msg": record.args().to_string(),
                    });
                    writeln!(buf, "{}", obj)
                }
                LogFormat::Text => writeln!(
                    buf,
                    "{} {} {} {}",
                    ts,
                    record.level(),
                    record.target(),
                    record.args()
                ),
            }
        });

        builder.target(env_logger::Target::Stderr);

        if let Err(err) = builder.try_init() {
            eprintln!("[logging] logger already installed: {}", err);
        }
    });
}

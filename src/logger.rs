//! logger.rs
//! Configuración del logger usando env_logger.

use env_logger::Env;

pub fn init_logger() {
    // RUST_LOG manda; si no está, "info" (sqlx sólo advertencias)
    let log_env = std::env::var("RUST_LOG").unwrap_or_else(|_| "info,sqlx=warn".to_string());

    // try_init: los tests pueden llamarlo más de una vez
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(log_env))
        .format_timestamp_secs()
        .try_init();
}

//! Configuración de bitácora para el driver.

use env_logger::{Builder, Env};
use log::{trace, LevelFilter};

use std::io::Write;

/// Variable de entorno que, si está definida, reemplaza el filtro.
const LOG_ENV: &str = "OBSACT_LOG";

/// Configura la bitácora con el nivel de verbosidad indicado.
///
/// Cada nivel adicional habilita mensajes de menor severidad, hasta
/// un máximo.
pub fn configure(verbosity: u64) -> Result<(), String> {
    let level = filter(verbosity)?;

    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}:{}] {}",
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .filter_level(level)
        .parse_env(Env::new().filter(LOG_ENV))
        .try_init()
        .map_err(|error| error.to_string())?;

    trace!("Logger verbosity {}", level);
    Ok(())
}

fn filter(verbosity: u64) -> Result<LevelFilter, String> {
    let level = match verbosity {
        0 => LevelFilter::Error,
        1 => LevelFilter::Warn,
        2 => LevelFilter::Info,
        3 => LevelFilter::Debug,
        4 => LevelFilter::Trace,
        _ => return Err(String::from("Too many -v flags, at most 4 are meaningful")),
    };

    Ok(level)
}

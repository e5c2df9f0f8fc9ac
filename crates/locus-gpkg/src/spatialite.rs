//! SpatiaLite extension loading
//!
//! GeoPackage geometry handling (`CastAutomagic`, `ST_Contains`, the Mbr
//! functions) and SRID transformation both come from the SpatiaLite loadable
//! extension. The library path can be pinned with `SPATIALITE_LIBRARY_PATH`;
//! otherwise a platform candidate list is probed in order.

use std::env;
use std::path::Path;

use rusqlite::{Connection, LoadExtensionGuard};

use locus_core::{LocusError, Result};

/// Environment override naming the extension library file.
pub const LIBRARY_PATH_ENV: &str = "SPATIALITE_LIBRARY_PATH";

/// Probed in order when no override is set. Bare names defer to the
/// dynamic-linker search path.
const CANDIDATES: &[&str] = &[
    "mod_spatialite",
    "mod_spatialite.so",
    "mod_spatialite.so.8",
    "mod_spatialite.so.7",
    "/usr/lib/x86_64-linux-gnu/mod_spatialite.so",
    "/usr/lib/aarch64-linux-gnu/mod_spatialite.so",
    "/usr/local/lib/mod_spatialite.so",
    "/usr/lib/mod_spatialite.so",
    "mod_spatialite.dylib",
    "/opt/homebrew/lib/mod_spatialite.dylib",
    "/usr/local/lib/mod_spatialite.dylib",
    "mod_spatialite.dll",
];

/// Load the extension into `conn` and verify it answers
/// `spatialite_version()`.
pub fn load(conn: &Connection) -> Result<String> {
    let override_path = env::var(LIBRARY_PATH_ENV).ok();
    let mut last_error = None;

    let candidates: Vec<&str> = match &override_path {
        Some(path) => vec![path.as_str()],
        None => CANDIDATES.to_vec(),
    };

    for candidate in candidates {
        let loaded = unsafe {
            let _guard = match LoadExtensionGuard::new(conn) {
                Ok(guard) => guard,
                Err(e) => {
                    return Err(LocusError::Spatialite(format!(
                        "extension loading is disabled: {e}"
                    )))
                }
            };
            conn.load_extension(Path::new(candidate), None)
        };

        match loaded {
            Ok(()) => return verify(conn),
            Err(e) => last_error = Some(format!("{candidate}: {e}")),
        }
    }

    Err(LocusError::Spatialite(format!(
        "could not load mod_spatialite (set {LIBRARY_PATH_ENV}); last attempt: {}",
        last_error.unwrap_or_else(|| "no candidates probed".to_string())
    )))
}

fn verify(conn: &Connection) -> Result<String> {
    conn.query_row("SELECT spatialite_version()", [], |row| {
        row.get::<_, String>(0)
    })
    .map_err(|e| LocusError::Spatialite(format!("spatialite_version() failed: {e}")))
}

/// Open an in-memory database with the full EPSG dictionary initialized.
///
/// Used by the transformer; dataset files themselves need not carry an SRS
/// table. `InitSpatialMetaDataFull` takes a few seconds once at startup.
pub fn open_reference_db() -> Result<Connection> {
    let conn = Connection::open_in_memory()
        .map_err(|e| LocusError::Database(format!("open in-memory db: {e}")))?;
    load(&conn)?;

    conn.query_row("SELECT InitSpatialMetaDataFull(1)", [], |_row| Ok(()))
        .map_err(|e| LocusError::Spatialite(format!("InitSpatialMetaDataFull failed: {e}")))?;

    Ok(conn)
}

/// Whether the extension can be loaded in this environment. Lets tests that
/// need real spatial functions skip instead of fail on hosts without
/// mod_spatialite.
pub fn available() -> bool {
    match Connection::open_in_memory() {
        Ok(conn) => load(&conn).is_ok(),
        Err(_) => false,
    }
}

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use energy_core::analytics::{Analytics, EnergyAnalyzer};
use energy_core::form::{Advance, FormError, FormSession};
use energy_core::store::{StoreConfig, StoreRegistry};
use energy_core::{AuthError, EnergyRecord, RecordStore, Session};
use energy_store_sqlite::SqliteStoreFactory;
use tracing::{debug, info};

use crate::intake::{ApplianceEntry, IntakeFile};

/// Shown by `report` when nothing has been submitted yet.
pub const NO_DATA_MESSAGE: &str =
    "No energy data found. Run `energy-intake submit` to complete the energy consumption form.";

pub const SAVED_MESSAGE: &str = "Your energy consumption data has been saved.";

/// Build a registry with every compiled-in store backend registered.
pub fn build_registry() -> StoreRegistry {
    let mut registry = StoreRegistry::new();
    registry.register(Box::new(SqliteStoreFactory));
    registry
}

pub async fn open_store(config: &StoreConfig) -> Result<Box<dyn RecordStore>> {
    debug!(backend = %config.backend, "opening record store");
    let store = build_registry()
        .create(config)
        .await
        .with_context(|| format!("Failed to open '{}' store", config.backend))?;
    Ok(store)
}

pub async fn sign_up(
    store: &dyn RecordStore,
    email: &str,
    password: &str,
) -> Result<()> {
    store.sign_up(email, password).await?;
    Ok(())
}

/// Sign in and remember the access token in `session_file`.
///
/// The session previously remembered in the file is signed out if still live.
pub async fn sign_in(
    store: &dyn RecordStore,
    email: &str,
    password: &str,
    session_file: &Path,
) -> Result<Session> {
    let session = store.sign_in(email, password).await?;
    retire_remembered_session(store, session_file).await?;
    write_session_file(session_file, &session.access_token)
        .with_context(|| format!("Failed to write session file '{}'", session_file.display()))?;
    Ok(session)
}

async fn retire_remembered_session(
    store: &dyn RecordStore,
    session_file: &Path,
) -> Result<()> {
    if !session_file.is_file() {
        return Ok(());
    }
    let token = std::fs::read_to_string(session_file)
        .with_context(|| format!("Failed to read session file '{}'", session_file.display()))?;
    if let Some(previous) = store.get_session(token.trim()).await? {
        debug!(user_id = %previous.user_id, "signing out replaced session");
        store.sign_out(&previous).await?;
    }
    Ok(())
}

/// Write the token readable by the owner only.
fn write_session_file(
    path: &Path,
    token: &str,
) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    // `mode` only applies on creation; tighten a file left by an older sign-in.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(token.as_bytes())
}

/// Resolve the remembered access token to a live session.
pub async fn current_session(
    store: &dyn RecordStore,
    session_file: &Path,
) -> Result<Session> {
    if !session_file.is_file() {
        bail!("Not signed in. Run `energy-intake sign-in` first.");
    }
    let token = std::fs::read_to_string(session_file)
        .with_context(|| format!("Failed to read session file '{}'", session_file.display()))?;

    match store.get_session(token.trim()).await? {
        Some(session) => Ok(session),
        None => {
            forget_session(session_file)?;
            Err(AuthError::SessionExpired.into())
        }
    }
}

fn forget_session(session_file: &Path) -> Result<()> {
    std::fs::remove_file(session_file)
        .with_context(|| format!("Failed to remove session file '{}'", session_file.display()))
}

pub async fn sign_out(
    store: &dyn RecordStore,
    session_file: &Path,
) -> Result<()> {
    let session = current_session(store, session_file).await?;
    store.sign_out(&session).await?;
    forget_session(session_file)
}

/// Walk the form through every step with the intake answers and submit it.
///
/// An existing record prefills the form, so an intake file only needs the
/// answers that change.
pub async fn submit_intake(
    store: &dyn RecordStore,
    session: &Session,
    intake: &IntakeFile,
    extra_appliances: Vec<ApplianceEntry>,
) -> Result<EnergyRecord> {
    let mut form = match store.fetch_record(session, &session.user_id).await? {
        Some(record) => {
            debug!("prefilling form from stored record");
            FormSession::from_record(&record)
        }
        None => FormSession::new(),
    };
    intake.apply_to(&mut form, extra_appliances)?;

    loop {
        match form.next(store, session).await {
            Ok(Advance::Moved(step)) => debug!(step = step.title(), "step complete"),
            Ok(Advance::Submitted(record)) => return Ok(record),
            Err(FormError::Validation(err)) => {
                bail!("{} step: {}", err.step.title(), err)
            }
            Err(err) => return Err(err.into()),
        }
    }
}

pub async fn load_analytics(
    store: &dyn RecordStore,
    session: &Session,
    analyzer: &EnergyAnalyzer,
) -> Result<Analytics> {
    let record = store.fetch_record(session, &session.user_id).await?;
    let analytics = analyzer.analyze(record.as_ref())?;
    if let Analytics::Report(report) = &analytics {
        info!(
            level = report.consumption_level.as_str(),
            footprint_kg = %report.carbon_footprint.footprint_kg,
            "analytics computed"
        );
    }
    Ok(analytics)
}

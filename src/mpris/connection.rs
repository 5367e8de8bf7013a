//! D-Bus connection management and player discovery for MPRIS.

use std::sync::Arc;
use tokio::sync::OnceCell;
use zbus::proxy;

#[derive(thiserror::Error, Debug)]
pub enum MprisError {
    #[error("D-Bus call failed: {0}")]
    ZBus(#[from] zbus::Error),
    #[error("no D-Bus session bus: {0}")]
    NoSessionBus(#[source] zbus::Error),
}

static SESSION_BUS: OnceCell<Arc<zbus::Connection>> = OnceCell::const_new();

/// Session bus connection shared by every MPRIS call.
pub async fn get_dbus_conn() -> Result<Arc<zbus::Connection>, MprisError> {
    let conn = SESSION_BUS
        .get_or_try_init(|| async {
            zbus::Connection::session()
                .await
                .map(Arc::new)
                .map_err(MprisError::NoSessionBus)
        })
        .await?;
    Ok(Arc::clone(conn))
}

/// playerctld keeps the list of MPRIS players ordered by recent activity.
#[proxy(
    interface = "com.github.altdesktop.playerctld",
    default_service = "org.mpris.MediaPlayer2.playerctld",
    default_path = "/org/mpris/MediaPlayer2"
)]
trait Playerctld {
    #[zbus(property)]
    fn player_names(&self) -> zbus::Result<Vec<String>>;
}

/// Active MPRIS player service names, most recently active first.
///
/// Queries playerctld; returns an empty list when it is not running.
pub async fn get_active_player_names() -> Result<Vec<String>, MprisError> {
    let conn = get_dbus_conn().await?;
    let Ok(playerctld) = PlayerctldProxy::new(&conn).await else {
        return Ok(Vec::new());
    };
    Ok(playerctld.player_names().await.unwrap_or_default())
}

/// Case-insensitive substring match against the blocklist. Blank entries
/// are ignored.
pub fn is_blocked(service: &str, block_list: &[String]) -> bool {
    let service = service.to_lowercase();
    block_list
        .iter()
        .map(|entry| entry.trim().to_lowercase())
        .any(|entry| !entry.is_empty() && service.contains(&entry))
}

/// First active player that is not blocked.
pub fn pick_player(names: &[String], block_list: &[String]) -> Option<String> {
    names
        .iter()
        .find(|name| !name.is_empty() && !is_blocked(name, block_list))
        .cloned()
}

/// Discover a player to drive, honouring the blocklist.
pub async fn discover_player(block_list: &[String]) -> Option<String> {
    match get_active_player_names().await {
        Ok(names) => pick_player(&names, block_list),
        Err(e) => {
            tracing::debug!(error = %e, "player discovery failed");
            None
        }
    }
}

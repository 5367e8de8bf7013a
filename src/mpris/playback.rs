//! Playback status, position and transport control for MPRIS.

use crate::mpris::connection::{MprisError, get_dbus_conn};
use zbus::Proxy;
use zvariant::OwnedValue;

const PLAYER_PATH: &str = "/org/mpris/MediaPlayer2";
const PLAYER_IFACE: &str = "org.mpris.MediaPlayer2.Player";
const PROPS_IFACE: &str = "org.freedesktop.DBus.Properties";

fn parse_position_from_owned(val: &OwnedValue) -> Option<f64> {
    if let Ok(i) = TryInto::<i64>::try_into(val.clone()) {
        return Some(i as f64 / 1_000_000.0);
    }
    if let Ok(u) = TryInto::<u64>::try_into(val.clone()) {
        return Some(u as f64 / 1_000_000.0);
    }
    if let Ok((i,)) = TryInto::<(i64,)>::try_into(val.clone()) {
        return Some(i as f64 / 1_000_000.0);
    }
    if let Ok((u,)) = TryInto::<(u64,)>::try_into(val.clone()) {
        return Some(u as f64 / 1_000_000.0);
    }
    None
}

/// Seconds to MPRIS microseconds; non-finite input maps to zero.
pub fn secs_to_micros(secs: f64) -> i64 {
    let micros = (secs * 1_000_000.0).round();
    if micros.is_finite() { micros as i64 } else { 0 }
}

async fn props_proxy(service: &str) -> Result<Proxy<'static>, MprisError> {
    let conn = get_dbus_conn().await?;
    let proxy = Proxy::new(&*conn, service.to_string(), PLAYER_PATH, PROPS_IFACE).await?;
    Ok(proxy)
}

async fn player_proxy(service: &str) -> Result<Proxy<'static>, MprisError> {
    let conn = get_dbus_conn().await?;
    let proxy = Proxy::new(&*conn, service.to_string(), PLAYER_PATH, PLAYER_IFACE).await?;
    Ok(proxy)
}

/// Query the playback position for a specific MPRIS player service.
pub async fn get_position(service: &str) -> Result<f64, MprisError> {
    if service.is_empty() {
        return Ok(0.0);
    }
    let proxy = props_proxy(service).await?;
    // Targeted Properties.Get: some players misbehave on GetAll
    if let Ok(reply) = proxy.call_method("Get", &(PLAYER_IFACE, "Position")).await
        && let Ok(val) = reply.body().deserialize::<OwnedValue>()
        && let Some(pos) = parse_position_from_owned(&val)
    {
        return Ok(pos);
    }
    Ok(0.0)
}

/// Query the playback status for a specific MPRIS player service.
pub async fn get_playback_status(service: &str) -> Result<String, MprisError> {
    if service.is_empty() {
        return Ok("Stopped".to_string());
    }
    let proxy = props_proxy(service).await?;
    if let Ok(reply) = proxy.call_method("Get", &(PLAYER_IFACE, "PlaybackStatus")).await
        && let Ok(val) = reply.body().deserialize::<OwnedValue>()
        && let Ok(status) = TryInto::<String>::try_into(val)
    {
        return Ok(status);
    }
    Ok("Stopped".to_string())
}

async fn call_transport(service: &str, method: &str) -> Result<(), MprisError> {
    if service.is_empty() {
        return Ok(());
    }
    let proxy = player_proxy(service).await?;
    proxy.call_method(method, &()).await?;
    Ok(())
}

pub async fn play(service: &str) -> Result<(), MprisError> {
    call_transport(service, "Play").await
}

pub async fn pause(service: &str) -> Result<(), MprisError> {
    call_transport(service, "Pause").await
}

pub async fn play_pause(service: &str) -> Result<(), MprisError> {
    call_transport(service, "PlayPause").await
}

/// Move the playhead to an absolute position.
///
/// MPRIS `Seek` is relative, so the current position is queried first and
/// the difference is sent. Returns the position that was requested.
pub async fn seek_to_position(service: &str, position_secs: f64) -> Result<f64, MprisError> {
    if service.is_empty() {
        return Ok(position_secs);
    }
    let current = get_position(service).await?;
    let offset = secs_to_micros(position_secs) - secs_to_micros(current);
    let proxy = player_proxy(service).await?;
    proxy.call_method("Seek", &(offset,)).await?;
    Ok(position_secs)
}

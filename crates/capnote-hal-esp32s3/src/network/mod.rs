//! Wi-Fi and MQTT endpoint configuration shared by the firmware tasks.

use core::fmt::Write;
use core::net::Ipv4Addr;

use heapless::String;

/// Wi-Fi credentials source.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WifiConfig {
    pub ssid: &'static str,
    pub password: &'static str,
}

impl WifiConfig {
    pub const fn new(ssid: &'static str, password: &'static str) -> Self {
        Self { ssid, password }
    }
}

/// Broker endpoint and session parameters for the audio publish path.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MqttConfig {
    pub broker_addr: Ipv4Addr,
    pub broker_port: u16,
    pub username: &'static str,
    pub password: &'static str,
    pub audio_topic: &'static str,
    pub client_id_prefix: &'static str,
    pub keep_alive_secs: u16,
}

pub const CLIENT_ID_BYTES: usize = 64;

/// Broker-unique client id: `<prefix>-XXYYZZ` from the STA MAC tail, or a
/// boot-counter suffix when the MAC is not yet readable.
pub fn derive_client_id(
    prefix: &str,
    mac: Option<[u8; 6]>,
    fallback_counter: u32,
) -> String<CLIENT_ID_BYTES> {
    let mut id = String::new();
    let result = match mac {
        Some(mac) => write!(id, "{}-{:02X}{:02X}{:02X}", prefix, mac[3], mac[4], mac[5]),
        None => write!(id, "{}-{}", prefix, fallback_counter),
    };
    if result.is_err() {
        // Prefix too long for the buffer; keep whatever fit.
        log::warn!("client id truncated (prefix too long)");
    }
    id
}

//! Network worker: executes the connectivity supervisor's commands, owns all
//! Wi-Fi and MQTT I/O, and drains the audio channel into broker publishes.
//!
//! The worker is the only caller of the supervisor, so every result and loss
//! feeds back from one place and the emitted events go through the shared
//! dispatch funnel. No wait in here exceeds [`POLL_INTERVAL_MS`], keeping
//! connectivity events timely while audio drains.

use embassy_net::{Stack, driver::HardwareAddress, tcp::TcpSocket};
use embassy_time::{Duration, Instant, Timer, WithTimeout};
use esp_radio::wifi::WifiController;
use log::{info, warn};
use rust_mqtt::client::client::MqttClient;
use rust_mqtt::client::client_config::{ClientConfig as MqttClientConfig, MqttVersion};
use rust_mqtt::packet::v5::publish_packet::QualityOfService;
use rust_mqtt::utils::rng_generator::CountingRng;

use capnote_core::audio::FRAME_BYTES;
use capnote_core::connectivity::{ConnectivitySupervisor, EventBatch, LinkCommand};
use capnote_hal_esp32s3::network::{MqttConfig, derive_client_id};

/// Upper bound on any single wait in the worker.
const POLL_INTERVAL_MS: u64 = 100;
/// Cadence of the external trigger that restarts a dormant layer.
const HEALTH_CHECK_SECS: u64 = 30;
const DHCP_TIMEOUT_SECS: u64 = 15;
const SOCKET_TIMEOUT_SECS: u64 = 10;

const MQTT_WRITE_BUFFER_BYTES: usize = FRAME_BYTES + 256;
const MQTT_RECV_BUFFER_BYTES: usize = 256;
const TCP_TX_BUFFER_BYTES: usize = 2048;
const TCP_RX_BUFFER_BYTES: usize = 1024;

fn now_ms() -> u64 {
    Instant::now().as_millis()
}

fn dispatch_batch(events: EventBatch) {
    for event in events {
        crate::dispatch_event(event);
    }
}

/// Consume pending considered-lost hints. Both feed back as loss reports;
/// the supervisor ignores them when the layer already left `Up`.
fn drain_hints(supervisor: &mut ConnectivitySupervisor) {
    if crate::LINK_LOST_HINT.try_take().is_some() {
        dispatch_batch(supervisor.on_transport_lost(now_ms()));
    }
    if crate::SESSION_LOST_HINT.try_take().is_some() {
        dispatch_batch(supervisor.on_session_lost(now_ms()));
    }
}

pub async fn network_worker(
    wifi: &mut WifiController<'_>,
    stack: Stack<'_>,
    config: MqttConfig,
) -> ! {
    let mac = match stack.hardware_address() {
        HardwareAddress::Ethernet(mac) => Some(mac),
        _ => None,
    };

    let mut supervisor = ConnectivitySupervisor::new();
    let mut session_seq: u32 = 0;
    let mut last_health_check_ms = now_ms();

    loop {
        drain_hints(&mut supervisor);

        // The worker's own loss detection, in addition to the hints.
        if supervisor.transport_state().is_up()
            && !(stack.is_link_up() && matches!(wifi.is_connected(), Ok(true)))
        {
            dispatch_batch(supervisor.on_transport_lost(now_ms()));
        }

        match supervisor.next_command(now_ms()) {
            LinkCommand::ConnectTransport => {
                let ok = connect_transport(wifi, stack).await;
                dispatch_batch(supervisor.on_transport_result(ok, now_ms()));
            }
            LinkCommand::ConnectSession => {
                session_seq = session_seq.wrapping_add(1);
                run_session(&mut supervisor, stack, &config, mac, session_seq).await;
            }
            LinkCommand::Wait { ms } => {
                Timer::after_millis(ms.min(POLL_INTERVAL_MS)).await;
            }
            LinkCommand::Idle => {
                let now = now_ms();
                if now.saturating_sub(last_health_check_ms) >= HEALTH_CHECK_SECS * 1_000 {
                    supervisor.external_trigger(now);
                    last_health_check_ms = now;
                }
                Timer::after_millis(POLL_INTERVAL_MS).await;
            }
        }
    }
}

/// One transport connection attempt: radio association plus DHCP.
async fn connect_transport(wifi: &mut WifiController<'_>, stack: Stack<'_>) -> bool {
    if !wifi.is_started().unwrap_or(false) {
        if let Err(err) = wifi.start_async().await {
            warn!("wifi start failed: {:?}", err);
            return false;
        }
    }

    if let Err(err) = wifi.connect_async().await {
        warn!("wifi connect failed: {:?}", err);
        let _ = wifi.disconnect_async().await;
        return false;
    }

    match stack
        .wait_config_up()
        .with_timeout(Duration::from_secs(DHCP_TIMEOUT_SECS))
        .await
    {
        Ok(()) => {
            info!("wifi connected and dhcp ready");
            true
        }
        Err(_) => {
            warn!("dhcp timeout; dropping wifi");
            let _ = wifi.disconnect_async().await;
            false
        }
    }
}

/// One session attempt and, on success, its whole publish lifetime. The
/// socket and MQTT buffers live on this frame, so a lost session tears all
/// of it down on return and a reconnect starts clean.
async fn run_session(
    supervisor: &mut ConnectivitySupervisor,
    stack: Stack<'_>,
    config: &MqttConfig,
    mac: Option<[u8; 6]>,
    session_seq: u32,
) {
    let mut tcp_rx_buffer = [0u8; TCP_RX_BUFFER_BYTES];
    let mut tcp_tx_buffer = [0u8; TCP_TX_BUFFER_BYTES];
    let mut socket = TcpSocket::new(stack, &mut tcp_rx_buffer, &mut tcp_tx_buffer);
    socket.set_timeout(Some(Duration::from_secs(SOCKET_TIMEOUT_SECS)));

    if let Err(err) = socket
        .connect((config.broker_addr, config.broker_port))
        .await
    {
        warn!("broker tcp connect failed: {:?}", err);
        dispatch_batch(supervisor.on_session_result(false, now_ms()));
        return;
    }

    let client_id = derive_client_id(config.client_id_prefix, mac, session_seq);
    let mut mqtt_config: MqttClientConfig<'_, 5, CountingRng> =
        MqttClientConfig::new(MqttVersion::MQTTv5, CountingRng(20000));
    mqtt_config.add_client_id(client_id.as_str());
    if !config.username.is_empty() {
        mqtt_config.add_username(config.username);
        mqtt_config.add_password(config.password);
    }
    mqtt_config.keep_alive = config.keep_alive_secs;
    mqtt_config.max_packet_size = MQTT_WRITE_BUFFER_BYTES as u32;

    let mut write_buffer = [0u8; MQTT_WRITE_BUFFER_BYTES];
    let mut recv_buffer = [0u8; MQTT_RECV_BUFFER_BYTES];
    let mut client = MqttClient::<_, 5, _>::new(
        socket,
        &mut write_buffer,
        MQTT_WRITE_BUFFER_BYTES,
        &mut recv_buffer,
        MQTT_RECV_BUFFER_BYTES,
        mqtt_config,
    );

    if let Err(err) = client.connect_to_broker().await {
        warn!("mqtt connect failed: {:?}", err);
        dispatch_batch(supervisor.on_session_result(false, now_ms()));
        return;
    }
    info!("mqtt session up as {}", client_id.as_str());
    dispatch_batch(supervisor.on_session_result(true, now_ms()));

    let mut payload = [0u8; FRAME_BYTES];
    let mut last_activity = Instant::now();

    while supervisor.transport_state().is_up() && supervisor.session_state().is_up() {
        drain_hints(supervisor);
        if supervisor.transport_state().is_up() && !stack.is_link_up() {
            dispatch_batch(supervisor.on_transport_lost(now_ms()));
        }
        if !supervisor.session_state().is_up() {
            break;
        }

        match crate::AUDIO_CHANNEL.try_pop() {
            Some(frame) => {
                let len = frame.copy_to_le_bytes(&mut payload);
                match client
                    .send_message(config.audio_topic, &payload[..len], QualityOfService::QoS0, false)
                    .await
                {
                    Ok(()) => last_activity = Instant::now(),
                    Err(err) => {
                        warn!("audio publish failed: {:?}", err);
                        dispatch_batch(supervisor.on_session_lost(now_ms()));
                    }
                }
            }
            None => {
                let idle_for = last_activity.elapsed();
                if idle_for >= Duration::from_secs(u64::from(config.keep_alive_secs) / 2) {
                    if let Err(err) = client.send_ping().await {
                        warn!("mqtt ping failed: {:?}", err);
                        dispatch_batch(supervisor.on_session_lost(now_ms()));
                    }
                    last_activity = Instant::now();
                }
                Timer::after_millis(POLL_INTERVAL_MS).await;
            }
        }
    }

    let _ = client.disconnect().await;
    info!("mqtt session closed");
}

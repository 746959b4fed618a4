#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use core::cell::RefCell;
use core::net::Ipv4Addr;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use embassy_executor::Spawner;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Instant, Timer};
use esp_hal::{
    clock::CpuClock,
    dma_buffers,
    gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull},
    i2s::master::{DataFormat, I2s, Standard},
    time::Rate,
    timer::timg::TimerGroup,
};
use esp_radio::wifi::{ClientConfig, ModeConfig};
use log::{LevelFilter, info, warn};
use static_cell::StaticCell;

use capnote_core::{
    app::{AppEvent, AppStateMachine, StateActions},
    audio::{AUDIO_QUEUE_DEPTH, AudioChannel, SAMPLE_RATE_HZ},
    indicator::{IndicatorPattern, LedIndicator},
};
use capnote_hal_esp32s3::{
    input::touch::{GpioTouchScanner, TouchConfig},
    led::StatusLed,
    mic::{MIC_DMA_BUFFER_BYTES, PdmMic},
    network::{MqttConfig, WifiConfig},
};

#[path = "main/capture.rs"]
mod capture;
#[path = "main/net.rs"]
mod net;
#[path = "main/status_led.rs"]
mod status_led;
#[path = "main/ui.rs"]
mod ui;

const WIFI_SSID: &str = env!(
    "CAPNOTE_WIFI_SSID",
    "Set CAPNOTE_WIFI_SSID in your environment before building/flashing."
);
const WIFI_PASSWORD: &str = env!(
    "CAPNOTE_WIFI_PASSWORD",
    "Set CAPNOTE_WIFI_PASSWORD in your environment before building/flashing."
);
const WIFI_CONFIG: WifiConfig = WifiConfig::new(WIFI_SSID, WIFI_PASSWORD);

const MQTT_BROKER: &str = env!(
    "CAPNOTE_MQTT_BROKER",
    "Set CAPNOTE_MQTT_BROKER to the broker IPv4 address before building/flashing."
);
const MQTT_PORT: u16 = 1883;
const MQTT_USERNAME: &str = match option_env!("CAPNOTE_MQTT_USERNAME") {
    Some(username) => username,
    None => "",
};
const MQTT_PASSWORD: &str = match option_env!("CAPNOTE_MQTT_PASSWORD") {
    Some(password) => password,
    None => "",
};
const AUDIO_TOPIC: &str = match option_env!("CAPNOTE_MQTT_TOPIC") {
    Some(topic) => topic,
    None => "capnote/audio",
};
const CLIENT_ID_PREFIX: &str = "capnote";
const MQTT_KEEP_ALIVE_SECS: u16 = 60;

/// Resolution the slider percent is scaled against (sensing-engine units).
const SLIDER_RESOLUTION: u16 = 100;
const LED_ACTIVE_LOW: bool = false;

static AUDIO_CHANNEL: AudioChannel<AUDIO_QUEUE_DEPTH> = AudioChannel::new();
static CAPTURE_ENABLED: AtomicBool = AtomicBool::new(false);
static MIC_GAIN_PERCENT: AtomicU8 = AtomicU8::new(100);
/// Considered-lost hints from state entry actions to the network worker.
static LINK_LOST_HINT: Signal<CriticalSectionRawMutex, ()> = Signal::new();
static SESSION_LOST_HINT: Signal<CriticalSectionRawMutex, ()> = Signal::new();
static INDICATOR: critical_section::Mutex<RefCell<LedIndicator>> =
    critical_section::Mutex::new(RefCell::new(LedIndicator::new()));
/// The single mutual-exclusion point for the state machine; events may be
/// observed first by either the network worker or the UI task.
static STATE_MACHINE: critical_section::Mutex<RefCell<Option<AppStateMachine<DeviceActions>>>> =
    critical_section::Mutex::new(RefCell::new(None));
static NET_RESOURCES: StaticCell<embassy_net::StackResources<4>> = StaticCell::new();

/// Entry-action fan-out to the board: indicator pattern, the capture gate,
/// and the considered-lost hints.
struct DeviceActions;

impl StateActions for DeviceActions {
    fn set_indicator(&mut self, pattern: IndicatorPattern) {
        let now_ms = Instant::now().as_millis();
        critical_section::with(|cs| INDICATOR.borrow_ref_mut(cs).set_pattern(pattern, now_ms));
    }

    fn start_capture(&mut self) {
        CAPTURE_ENABLED.store(true, Ordering::Release);
    }

    fn stop_capture(&mut self) {
        CAPTURE_ENABLED.store(false, Ordering::Release);
    }

    fn link_considered_lost(&mut self) {
        LINK_LOST_HINT.signal(());
    }

    fn session_considered_lost(&mut self) {
        SESSION_LOST_HINT.signal(());
    }
}

/// Funnel for state-machine events from any task.
fn dispatch_event(event: AppEvent) {
    critical_section::with(|cs| {
        if let Some(machine) = STATE_MACHINE.borrow_ref_mut(cs).as_mut() {
            machine.handle_event(event);
        }
    });
}

#[panic_handler]
fn panic(_: &core::panic::PanicInfo) -> ! {
    loop {}
}

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    esp_println::logger::init_logger(LevelFilter::Info);
    esp_println::println!("boot: capnote starting");

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // esp-radio requires an allocator.
    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 65536);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // Wiring used by this board:
    // LED=GPIO2, touch PRIMARY=GPIO10, touch SECONDARY=GPIO11,
    // mic CLK=GPIO42, WS=GPIO40, DATA=GPIO41
    let led_pin = Output::new(peripherals.GPIO2, Level::Low, OutputConfig::default());
    let status_led = StatusLed::new(led_pin, LED_ACTIVE_LOW).unwrap();

    let input_cfg = InputConfig::default().with_pull(Pull::Up);
    let touch_primary = Input::new(peripherals.GPIO10, input_cfg);
    let touch_secondary = Input::new(peripherals.GPIO11, input_cfg);
    let scanner = GpioTouchScanner::new(touch_primary, touch_secondary, TouchConfig::default());

    // Microphone capture runs a circular DMA transfer for its whole lifetime.
    // A failure here is fatal to the audio subsystem alone; UI and
    // connectivity keep running in degraded mode.
    let (mic_rx_buffer, mic_rx_descriptors, _, _) = dma_buffers!(MIC_DMA_BUFFER_BYTES, 0);
    let i2s = I2s::new(
        peripherals.I2S0,
        Standard::Philips,
        DataFormat::Data16Channel16,
        Rate::from_hz(SAMPLE_RATE_HZ),
        peripherals.DMA_CH0,
    )
    .into_async();
    let i2s_rx = i2s
        .i2s_rx
        .with_bclk(peripherals.GPIO42)
        .with_ws(peripherals.GPIO40)
        .with_din(peripherals.GPIO41)
        .build(mic_rx_descriptors);
    let mic = match i2s_rx.read_dma_circular_async(mic_rx_buffer) {
        Ok(transfer) => Some(PdmMic::new(transfer)),
        Err(err) => {
            warn!("mic capture start failed: {:?}; audio disabled", err);
            None
        }
    };

    let radio = match esp_radio::init() {
        Ok(radio) => radio,
        Err(err) => {
            info!("esp-radio init failed: {:?}", err);
            loop {
                Timer::after_secs(1).await;
            }
        }
    };

    let (mut wifi_controller, interfaces) =
        match esp_radio::wifi::new(&radio, peripherals.WIFI, esp_radio::wifi::Config::default()) {
            Ok(parts) => parts,
            Err(err) => {
                info!("wifi peripheral init failed: {:?}", err);
                loop {
                    Timer::after_secs(1).await;
                }
            }
        };

    let client_config = ClientConfig::default()
        .with_ssid(WIFI_CONFIG.ssid.into())
        .with_password(WIFI_CONFIG.password.into());
    let wifi_mode = ModeConfig::Client(client_config);
    if let Err(err) = wifi_controller.set_config(&wifi_mode) {
        info!("wifi mode config failed: {:?}", err);
        loop {
            Timer::after_secs(1).await;
        }
    }

    let stack_config = embassy_net::Config::dhcpv4(Default::default());
    let (stack, mut net_runner) = embassy_net::new(
        interfaces.sta,
        stack_config,
        NET_RESOURCES.init(embassy_net::StackResources::<4>::new()),
        0x7C41_9A02_55B8_ED13,
    );

    let broker_addr: Ipv4Addr = match MQTT_BROKER.parse() {
        Ok(addr) => addr,
        Err(_) => {
            info!("CAPNOTE_MQTT_BROKER is not an IPv4 address: {}", MQTT_BROKER);
            loop {
                Timer::after_secs(1).await;
            }
        }
    };
    let mqtt_config = MqttConfig {
        broker_addr,
        broker_port: MQTT_PORT,
        username: MQTT_USERNAME,
        password: MQTT_PASSWORD,
        audio_topic: AUDIO_TOPIC,
        client_id_prefix: CLIENT_ID_PREFIX,
        keep_alive_secs: MQTT_KEEP_ALIVE_SECS,
    };

    info!("LED pin: GPIO2; touch pins: PRIMARY=GPIO10 SECONDARY=GPIO11");
    info!("Mic pins: CLK=GPIO42 WS=GPIO40 DATA=GPIO41");
    info!(
        "Audio: {} Hz, {} frames queued max; broker {}:{} topic {}",
        SAMPLE_RATE_HZ,
        AUDIO_CHANNEL.capacity(),
        mqtt_config.broker_addr,
        mqtt_config.broker_port,
        mqtt_config.audio_topic
    );

    // Boot into LinkDown; its entry action runs here, before any task
    // observes the shared state.
    critical_section::with(|cs| {
        STATE_MACHINE
            .borrow_ref_mut(cs)
            .replace(AppStateMachine::new(DeviceActions));
    });

    let net_future = net_runner.run();
    let worker_future = net::network_worker(&mut wifi_controller, stack, mqtt_config);
    let capture_future = capture::capture_loop(mic);
    let ui_future = ui::ui_loop(scanner, SLIDER_RESOLUTION);
    let led_future = status_led::led_loop(status_led);

    let _ = embassy_futures::join::join5(
        net_future,
        worker_future,
        capture_future,
        ui_future,
        led_future,
    )
    .await;
    unreachable!()
}

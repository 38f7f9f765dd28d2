//! Nordic UART Service adapter.
//!
//! Implements [`RadioPort`] (the write side of the Bangle.js link) and
//! feeds inbound writes into the shared [`NUS_RX`] buffer.
//!
//! ## cfg gating
//!
//! - **`feature = "espidf"`**: Bluedroid GATT server via `esp_idf_svc::sys`.
//! - **otherwise**: simulation stubs for host-side tests.
//!
//! ## GATT layout
//!
//! | Characteristic | UUID                                   | Props          |
//! |----------------|----------------------------------------|----------------|
//! | NUS TX         | `6e400003-b5a3-f393-e0a9-e50e24dcca9e` | Notify         |
//! | NUS RX         | `6e400002-b5a3-f393-e0a9-e50e24dcca9e` | Write, WriteNR |
//! | Manufacturer   | `2a29` (Device Information)            | Read           |
//! | Model          | `2a24`                                 | Read           |
//! | Firmware rev   | `2a26`                                 | Read           |
//!
//! The advertised name must start with `Bangle.js` for Gadgetbridge to
//! offer the device.

use log::{debug, info, warn};

use crate::app::ports::{AdvertisingProfile, RadioPort};
use crate::config::{AdvInterval, ConnInterval, WatchConfig};
use crate::error::RadioError;
use crate::protocol::rx_buffer::RxBuffer;

// ───────────────────────────────────────────────────────────────
// Constants
// ───────────────────────────────────────────────────────────────

pub const NUS_SERVICE_UUID: u128 = 0x6e400001_b5a3_f393_e0a9_e50e24dcca9e;
pub const NUS_RX_UUID: u128 = 0x6e400002_b5a3_f393_e0a9_e50e24dcca9e;
pub const NUS_TX_UUID: u128 = 0x6e400003_b5a3_f393_e0a9_e50e24dcca9e;

pub const DIS_SERVICE_UUID: u16 = 0x180a;
pub const DIS_MANUFACTURER_UUID: u16 = 0x2a29;
pub const DIS_MODEL_UUID: u16 = 0x2a24;
pub const DIS_FIRMWARE_UUID: u16 = 0x2a26;

pub const MANUFACTURER: &str = "WizWatch";
pub const MODEL: &str = "Bangle.js WizWatch";
pub const FIRMWARE_REVISION: &str = env!("CARGO_PKG_VERSION");

/// ATT MTU before the central negotiates a larger one.
const DEFAULT_MTU: u16 = 23;

/// Inbound bytes written by the phone.  The GATT write callback appends;
/// the main loop drains.
pub static NUS_RX: RxBuffer = RxBuffer::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BleState {
    Idle,
    Advertising,
    Connected,
    Failed,
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF static state
// ───────────────────────────────────────────────────────────────
//
// Bluedroid callbacks are C function pointers that cannot capture Rust
// closures.  These atomics bridge the callback context to the adapter.

#[cfg(feature = "espidf")]
mod stack {
    use core::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, Ordering};
    use esp_idf_svc::sys::*;

    use super::{
        DIS_FIRMWARE_UUID, DIS_MANUFACTURER_UUID, DIS_MODEL_UUID, DIS_SERVICE_UUID, FIRMWARE_REVISION,
        MANUFACTURER, MODEL, NUS_RX, NUS_RX_UUID, NUS_SERVICE_UUID, NUS_TX_UUID,
    };
    use crate::events::{push_link_event, LinkEvent};

    pub static GATTS_IF: AtomicU32 = AtomicU32::new(0);
    pub static CONN_ID: AtomicU32 = AtomicU32::new(0);
    pub static CONNECTED: AtomicBool = AtomicBool::new(false);
    pub static MTU: AtomicU16 = AtomicU16::new(super::DEFAULT_MTU);
    pub static TX_HANDLE: AtomicU32 = AtomicU32::new(0);
    static RX_HANDLE: AtomicU32 = AtomicU32::new(0);
    static NUS_SVC_HANDLE: AtomicU32 = AtomicU32::new(0);
    static DIS_SVC_HANDLE: AtomicU32 = AtomicU32::new(0);
    static CHAR_STEP: AtomicU32 = AtomicU32::new(0);

    /// Advertising interval in 0.625 ms units, packed `min << 16 | max`.
    pub static ADV_INTERVAL: AtomicU32 = AtomicU32::new((0x20 << 16) | 0x40);

    /// Address of the connected central, for connection parameter updates.
    pub static PEER_BDA: std::sync::Mutex<[u8; 6]> = std::sync::Mutex::new([0; 6]);

    static NUS_UUID_LE: [u8; 16] = NUS_SERVICE_UUID.to_le_bytes();

    fn uuid128_to_esp(uuid: u128) -> esp_bt_uuid_t {
        let mut t: esp_bt_uuid_t = unsafe { core::mem::zeroed() };
        t.len = 16;
        t.uuid.uuid128 = uuid.to_le_bytes();
        t
    }

    fn uuid16_to_esp(uuid: u16) -> esp_bt_uuid_t {
        let mut t: esp_bt_uuid_t = unsafe { core::mem::zeroed() };
        t.len = 2;
        t.uuid.uuid16 = uuid;
        t
    }

    unsafe fn add_gatt_char(svc_handle: u16, uuid: u128, perm: u32, prop: u32) {
        let mut char_uuid = uuid128_to_esp(uuid);
        unsafe {
            esp_ble_gatts_add_char(
                svc_handle,
                &mut char_uuid,
                perm as esp_gatt_perm_t,
                prop as esp_gatt_char_prop_t,
                core::ptr::null_mut(),
                core::ptr::null_mut(),
            );
        }
    }

    /// Read-only characteristic answered by the stack.
    unsafe fn add_static_char(svc_handle: u16, uuid: u16, value: &'static str) {
        let mut char_uuid = uuid16_to_esp(uuid);
        let mut attr = esp_attr_value_t {
            attr_max_len: value.len() as u16,
            attr_len: value.len() as u16,
            attr_value: value.as_ptr().cast_mut(),
        };
        let mut control = esp_attr_control_t {
            auto_rsp: ESP_GATT_AUTO_RSP as u8,
        };
        unsafe {
            esp_ble_gatts_add_char(
                svc_handle,
                &mut char_uuid,
                ESP_GATT_PERM_READ as esp_gatt_perm_t,
                ESP_GATT_CHAR_PROP_BIT_READ as esp_gatt_char_prop_t,
                &mut attr,
                &mut control,
            );
        }
    }

    pub fn adv_params() -> esp_ble_adv_params_t {
        let packed = ADV_INTERVAL.load(Ordering::Relaxed);
        esp_ble_adv_params_t {
            adv_int_min: (packed >> 16) as u16,
            adv_int_max: packed as u16,
            adv_type: esp_ble_adv_type_t_ADV_TYPE_IND,
            own_addr_type: esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC,
            channel_map: esp_ble_adv_channel_t_ADV_CHNL_ALL,
            adv_filter_policy: esp_ble_adv_filter_t_ADV_FILTER_ALLOW_SCAN_ANY_CON_ANY,
            ..unsafe { core::mem::zeroed() }
        }
    }

    /// Advertise the NUS service, name and preferred connection interval.
    pub unsafe fn config_adv_data(conn_min: u16, conn_max: u16) -> i32 {
        let mut adv = esp_ble_adv_data_t {
            set_scan_rsp: false,
            include_name: true,
            include_txpower: false,
            min_interval: conn_min as i32,
            max_interval: conn_max as i32,
            appearance: 0x00C0, // generic watch
            service_uuid_len: NUS_UUID_LE.len() as u16,
            p_service_uuid: NUS_UUID_LE.as_ptr().cast_mut(),
            flag: (ESP_BLE_ADV_FLAG_GEN_DISC | ESP_BLE_ADV_FLAG_BREDR_NOT_SPT) as u8,
            ..unsafe { core::mem::zeroed() }
        };
        unsafe { esp_ble_gap_config_adv_data(&mut adv) }
    }

    pub unsafe extern "C" fn gap_event_handler(
        event: esp_gap_ble_cb_event_t,
        param: *mut esp_ble_gap_cb_param_t,
    ) {
        match event {
            esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_DATA_SET_COMPLETE_EVT => {
                let mut params = adv_params();
                unsafe { esp_ble_gap_start_advertising(&mut params) };
            }
            esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_START_COMPLETE_EVT => {
                log::info!("BLE GAP: advertising started");
            }
            esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_STOP_COMPLETE_EVT => {
                log::debug!("BLE GAP: advertising stopped");
            }
            esp_gap_ble_cb_event_t_ESP_GAP_BLE_SEC_REQ_EVT => unsafe {
                esp_ble_gap_security_rsp((*param).ble_security.ble_req.bd_addr.as_mut_ptr(), true);
            },
            esp_gap_ble_cb_event_t_ESP_GAP_BLE_AUTH_CMPL_EVT => {
                let p = unsafe { &(*param).ble_security.auth_cmpl };
                if p.success {
                    log::info!("BLE GAP: authentication complete (bonded)");
                } else {
                    log::warn!("BLE GAP: authentication failed (reason={})", p.fail_reason);
                }
            }
            esp_gap_ble_cb_event_t_ESP_GAP_BLE_UPDATE_CONN_PARAMS_EVT => {
                let p = unsafe { &(*param).update_conn_params };
                log::debug!("BLE GAP: conn interval {} latency {}", p.conn_int, p.latency);
            }
            _ => {}
        }
    }

    pub unsafe extern "C" fn gatts_event_handler(
        event: esp_gatts_cb_event_t,
        gatts_if: esp_gatt_if_t,
        param: *mut esp_ble_gatts_cb_param_t,
    ) {
        match event {
            esp_gatts_cb_event_t_ESP_GATTS_REG_EVT => {
                GATTS_IF.store(gatts_if as u32, Ordering::Relaxed);
                log::info!("BLE GATTS: app registered (if={})", gatts_if);
                let mut svc_id = esp_gatt_srvc_id_t {
                    id: esp_gatt_id_t {
                        uuid: uuid128_to_esp(NUS_SERVICE_UUID),
                        inst_id: 0,
                    },
                    is_primary: true,
                };
                unsafe { esp_ble_gatts_create_service(gatts_if, &mut svc_id, 8) };
            }
            esp_gatts_cb_event_t_ESP_GATTS_CREATE_EVT => {
                let p = unsafe { &(*param).create };
                let svc_handle = p.service_handle;
                unsafe { esp_ble_gatts_start_service(svc_handle) };
                if CHAR_STEP.load(Ordering::Relaxed) == 0 {
                    NUS_SVC_HANDLE.store(svc_handle as u32, Ordering::Relaxed);
                    log::info!("BLE GATTS: NUS service created (handle={})", svc_handle);
                    CHAR_STEP.store(1, Ordering::Relaxed);
                    unsafe {
                        add_gatt_char(
                            svc_handle,
                            NUS_TX_UUID,
                            ESP_GATT_PERM_READ,
                            ESP_GATT_CHAR_PROP_BIT_NOTIFY,
                        );
                    }
                } else {
                    DIS_SVC_HANDLE.store(svc_handle as u32, Ordering::Relaxed);
                    log::info!("BLE GATTS: DIS service created (handle={})", svc_handle);
                    CHAR_STEP.store(4, Ordering::Relaxed);
                    unsafe { add_static_char(svc_handle, DIS_MANUFACTURER_UUID, MANUFACTURER) };
                }
            }
            esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_EVT => {
                let handle = unsafe { (*param).add_char.attr_handle };
                let nus = NUS_SVC_HANDLE.load(Ordering::Relaxed) as u16;
                let dis = DIS_SVC_HANDLE.load(Ordering::Relaxed) as u16;
                match CHAR_STEP.load(Ordering::Relaxed) {
                    1 => {
                        TX_HANDLE.store(handle as u32, Ordering::Relaxed);
                        log::info!("BLE GATTS: TX char (handle={})", handle);
                        CHAR_STEP.store(2, Ordering::Relaxed);
                        let mut cccd = uuid16_to_esp(ESP_GATT_UUID_CHAR_CLIENT_CONFIG as u16);
                        unsafe {
                            esp_ble_gatts_add_char_descr(
                                nus,
                                &mut cccd,
                                (ESP_GATT_PERM_READ | ESP_GATT_PERM_WRITE) as esp_gatt_perm_t,
                                core::ptr::null_mut(),
                                core::ptr::null_mut(),
                            );
                        }
                    }
                    3 => {
                        RX_HANDLE.store(handle as u32, Ordering::Relaxed);
                        log::info!("BLE GATTS: RX char (handle={})", handle);
                        let mut svc_id = esp_gatt_srvc_id_t {
                            id: esp_gatt_id_t {
                                uuid: uuid16_to_esp(DIS_SERVICE_UUID),
                                inst_id: 0,
                            },
                            is_primary: true,
                        };
                        unsafe { esp_ble_gatts_create_service(gatts_if, &mut svc_id, 8) };
                    }
                    4 => {
                        CHAR_STEP.store(5, Ordering::Relaxed);
                        unsafe { add_static_char(dis, DIS_MODEL_UUID, MODEL) };
                    }
                    5 => {
                        CHAR_STEP.store(6, Ordering::Relaxed);
                        unsafe { add_static_char(dis, DIS_FIRMWARE_UUID, FIRMWARE_REVISION) };
                    }
                    6 => {
                        CHAR_STEP.store(7, Ordering::Relaxed);
                        log::info!("BLE GATTS: all characteristics registered");
                    }
                    _ => {}
                }
            }
            esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_DESCR_EVT => {
                if CHAR_STEP.load(Ordering::Relaxed) == 2 {
                    CHAR_STEP.store(3, Ordering::Relaxed);
                    let nus = NUS_SVC_HANDLE.load(Ordering::Relaxed) as u16;
                    unsafe {
                        add_gatt_char(
                            nus,
                            NUS_RX_UUID,
                            ESP_GATT_PERM_WRITE,
                            ESP_GATT_CHAR_PROP_BIT_WRITE | ESP_GATT_CHAR_PROP_BIT_WRITE_NR,
                        );
                    }
                }
            }
            esp_gatts_cb_event_t_ESP_GATTS_CONNECT_EVT => {
                let p = unsafe { &(*param).connect };
                CONN_ID.store(p.conn_id as u32, Ordering::Relaxed);
                CONNECTED.store(true, Ordering::Release);
                if let Ok(mut bda) = PEER_BDA.lock() {
                    *bda = p.remote_bda;
                }
                log::info!("BLE GATTS: phone connected (conn_id={})", p.conn_id);
                push_link_event(LinkEvent::Connected);
            }
            esp_gatts_cb_event_t_ESP_GATTS_DISCONNECT_EVT => {
                CONNECTED.store(false, Ordering::Release);
                MTU.store(super::DEFAULT_MTU, Ordering::Relaxed);
                log::info!("BLE GATTS: phone disconnected");
                push_link_event(LinkEvent::Disconnected);
            }
            esp_gatts_cb_event_t_ESP_GATTS_MTU_EVT => {
                let mtu = unsafe { (*param).mtu.mtu };
                MTU.store(mtu, Ordering::Relaxed);
                log::info!("BLE GATTS: MTU {}", mtu);
            }
            esp_gatts_cb_event_t_ESP_GATTS_WRITE_EVT => {
                let p = unsafe { &(*param).write };
                if p.handle as u32 == RX_HANDLE.load(Ordering::Relaxed) && p.len > 0 {
                    let data = unsafe { core::slice::from_raw_parts(p.value, p.len as usize) };
                    NUS_RX.append(data);
                }
                if p.need_rsp {
                    unsafe {
                        esp_ble_gatts_send_response(
                            gatts_if,
                            p.conn_id,
                            p.trans_id,
                            esp_gatt_status_t_ESP_GATT_OK,
                            core::ptr::null_mut(),
                        );
                    }
                }
            }
            _ => {}
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Adapter
// ───────────────────────────────────────────────────────────────

pub struct NusAdapter {
    state: BleState,
    device_name: heapless::String<32>,
    local_mtu: u16,
    profile: AdvertisingProfile,
    adv_fast: AdvInterval,
    adv_slow: AdvInterval,
    conn_responsive: ConnInterval,
    conn_relaxed: ConnInterval,
    /// Simulation: frames handed to `notify`.
    #[cfg(not(feature = "espidf"))]
    sim_notified: usize,
}

impl NusAdapter {
    pub fn new(config: &WatchConfig) -> Self {
        Self {
            state: BleState::Idle,
            device_name: config.device_name.clone(),
            local_mtu: config.mtu,
            profile: AdvertisingProfile::Fast,
            adv_fast: config.adv_fast,
            adv_slow: config.adv_slow,
            conn_responsive: config.conn_responsive,
            conn_relaxed: config.conn_relaxed,
            #[cfg(not(feature = "espidf"))]
            sim_notified: 0,
        }
    }

    pub fn state(&self) -> BleState {
        self.state
    }

    /// The inbound buffer the GATT write callback fills.
    pub fn rx_buffer(&self) -> &'static RxBuffer {
        &NUS_RX
    }

    /// Bring up the controller, register the GATT services and start
    /// advertising.
    pub fn start(&mut self) -> Result<(), RadioError> {
        info!("BLE: starting as '{}'", self.device_name);
        match self.platform_start() {
            Ok(()) => {
                self.state = BleState::Advertising;
                Ok(())
            }
            Err(e) => {
                self.state = BleState::Failed;
                Err(e)
            }
        }
    }

    /// Track connection lifecycle from the link event queue.
    pub fn on_link_change(&mut self, connected: bool) {
        if self.state == BleState::Failed {
            return;
        }
        self.state = if connected {
            BleState::Connected
        } else {
            BleState::Advertising
        };
        if connected {
            self.platform_apply_conn_params();
        }
    }

    fn adv_interval(&self) -> AdvInterval {
        match self.profile {
            AdvertisingProfile::Fast => self.adv_fast,
            AdvertisingProfile::Slow => self.adv_slow,
        }
    }

    fn conn_interval(&self) -> ConnInterval {
        match self.profile {
            AdvertisingProfile::Fast => self.conn_responsive,
            AdvertisingProfile::Slow => self.conn_relaxed,
        }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(feature = "espidf")]
    fn platform_start(&mut self) -> Result<(), RadioError> {
        use core::sync::atomic::Ordering;
        use esp_idf_svc::sys::*;

        let adv = self.adv_interval();
        stack::ADV_INTERVAL.store(((adv.min as u32) << 16) | adv.max as u32, Ordering::Relaxed);

        unsafe {
            // BLE-only: release classic BT memory.
            esp_bt_controller_mem_release(esp_bt_mode_t_ESP_BT_MODE_CLASSIC_BT);

            let mut bt_cfg = esp_bt_controller_config_t::default();
            let ret = esp_bt_controller_init(&mut bt_cfg);
            if ret != ESP_OK as i32 {
                return Err(RadioError::StackInitFailed(ret));
            }
            let ret = esp_bt_controller_enable(esp_bt_mode_t_ESP_BT_MODE_BLE);
            if ret != ESP_OK as i32 {
                return Err(RadioError::StackInitFailed(ret));
            }
            let ret = esp_bluedroid_init();
            if ret != ESP_OK as i32 {
                return Err(RadioError::StackInitFailed(ret));
            }
            let ret = esp_bluedroid_enable();
            if ret != ESP_OK as i32 {
                return Err(RadioError::StackInitFailed(ret));
            }

            esp_ble_gap_register_callback(Some(stack::gap_event_handler));
            esp_ble_gatts_register_callback(Some(stack::gatts_event_handler));
            esp_ble_gatts_app_register(0);
            esp_ble_gatt_set_local_mtu(self.local_mtu);

            // Just-works pairing with bonding.
            let auth_req = esp_ble_auth_req_t_ESP_LE_AUTH_REQ_SC_BOND;
            let iocap = esp_ble_io_cap_t_ESP_IO_CAP_NONE;
            let key_size: u8 = 16;
            let init_key: u8 = (ESP_BLE_ENC_KEY_MASK | ESP_BLE_ID_KEY_MASK) as u8;
            let rsp_key: u8 = (ESP_BLE_ENC_KEY_MASK | ESP_BLE_ID_KEY_MASK) as u8;
            esp_ble_gap_set_security_param(
                esp_ble_sm_param_t_ESP_BLE_SM_AUTHEN_REQ_MODE,
                &auth_req as *const _ as *mut _,
                core::mem::size_of_val(&auth_req) as u8,
            );
            esp_ble_gap_set_security_param(
                esp_ble_sm_param_t_ESP_BLE_SM_IOCAP_MODE,
                &iocap as *const _ as *mut _,
                core::mem::size_of_val(&iocap) as u8,
            );
            esp_ble_gap_set_security_param(
                esp_ble_sm_param_t_ESP_BLE_SM_MAX_KEY_SIZE,
                &key_size as *const _ as *mut _,
                1,
            );
            esp_ble_gap_set_security_param(
                esp_ble_sm_param_t_ESP_BLE_SM_SET_INIT_KEY,
                &init_key as *const _ as *mut _,
                1,
            );
            esp_ble_gap_set_security_param(
                esp_ble_sm_param_t_ESP_BLE_SM_SET_RSP_KEY,
                &rsp_key as *const _ as *mut _,
                1,
            );

            let mut name = [0u8; 33];
            name[..self.device_name.len()].copy_from_slice(self.device_name.as_bytes());
            esp_ble_gap_set_device_name(name.as_ptr().cast());

            // Advertising starts from the ADV_DATA_SET_COMPLETE callback.
            let conn = self.conn_interval();
            let ret = stack::config_adv_data(conn.min, conn.max);
            if ret != ESP_OK as i32 {
                return Err(RadioError::AdvertisingFailed(ret));
            }
        }
        info!("BLE(espidf): Bluedroid up, advertising as '{}'", self.device_name);
        Ok(())
    }

    #[cfg(not(feature = "espidf"))]
    fn platform_start(&mut self) -> Result<(), RadioError> {
        info!(
            "BLE(sim): advertising '{}' (service {:032x})",
            self.device_name, NUS_SERVICE_UUID
        );
        Ok(())
    }

    #[cfg(feature = "espidf")]
    fn platform_advertise(&mut self) -> Result<(), RadioError> {
        use core::sync::atomic::Ordering;
        use esp_idf_svc::sys::*;
        let adv = self.adv_interval();
        stack::ADV_INTERVAL.store(((adv.min as u32) << 16) | adv.max as u32, Ordering::Relaxed);
        let mut params = stack::adv_params();
        let ret = unsafe {
            esp_ble_gap_stop_advertising();
            esp_ble_gap_start_advertising(&mut params)
        };
        if ret == ESP_OK as i32 {
            Ok(())
        } else {
            Err(RadioError::AdvertisingFailed(ret))
        }
    }

    #[cfg(not(feature = "espidf"))]
    fn platform_advertise(&mut self) -> Result<(), RadioError> {
        let adv = self.adv_interval();
        debug!("BLE(sim): advertising {}-{} ms", adv.min_ms(), adv.max_ms());
        Ok(())
    }

    #[cfg(feature = "espidf")]
    fn platform_apply_conn_params(&mut self) {
        use esp_idf_svc::sys::*;
        let conn = self.conn_interval();
        let Ok(bda) = stack::PEER_BDA.lock().map(|b| *b) else {
            return;
        };
        let mut params = esp_ble_conn_update_params_t {
            bda,
            min_int: conn.min,
            max_int: conn.max,
            latency: 0,
            timeout: 400, // 4 s supervision timeout
        };
        let ret = unsafe { esp_ble_gap_update_conn_params(&mut params) };
        if ret != ESP_OK as i32 {
            warn!("BLE: connection parameter update failed ({})", ret);
        }
    }

    #[cfg(not(feature = "espidf"))]
    fn platform_apply_conn_params(&mut self) {
        let conn = self.conn_interval();
        debug!("BLE(sim): conn interval {:#x}-{:#x}", conn.min, conn.max);
    }

    #[cfg(feature = "espidf")]
    fn platform_notify(&mut self, frame: &[u8]) -> Result<(), RadioError> {
        use core::sync::atomic::Ordering;
        use esp_idf_svc::sys::*;
        if !stack::CONNECTED.load(Ordering::Acquire) {
            return Err(RadioError::NotifyFailed(ESP_ERR_INVALID_STATE as i32));
        }
        let ret = unsafe {
            esp_ble_gatts_send_indicate(
                stack::GATTS_IF.load(Ordering::Relaxed) as esp_gatt_if_t,
                stack::CONN_ID.load(Ordering::Relaxed) as u16,
                stack::TX_HANDLE.load(Ordering::Relaxed) as u16,
                frame.len() as u16,
                frame.as_ptr().cast_mut(),
                false,
            )
        };
        if ret == ESP_OK as i32 {
            Ok(())
        } else {
            Err(RadioError::NotifyFailed(ret))
        }
    }

    #[cfg(not(feature = "espidf"))]
    fn platform_notify(&mut self, frame: &[u8]) -> Result<(), RadioError> {
        self.sim_notified += 1;
        debug!("BLE(sim): notify {} bytes", frame.len());
        Ok(())
    }

    #[cfg(feature = "espidf")]
    fn platform_mtu(&self) -> u16 {
        stack::MTU.load(core::sync::atomic::Ordering::Relaxed)
    }

    #[cfg(not(feature = "espidf"))]
    fn platform_mtu(&self) -> u16 {
        if self.state == BleState::Connected {
            self.local_mtu
        } else {
            DEFAULT_MTU
        }
    }

    /// Simulation: number of notifications sent.
    #[cfg(not(feature = "espidf"))]
    pub fn sim_notified(&self) -> usize {
        self.sim_notified
    }
}

// ───────────────────────────────────────────────────────────────
// RadioPort implementation
// ───────────────────────────────────────────────────────────────

impl RadioPort for NusAdapter {
    fn notify(&mut self, frame: &[u8]) -> Result<(), RadioError> {
        self.platform_notify(frame)
    }

    fn set_advertising(&mut self, profile: AdvertisingProfile) {
        if self.profile == profile {
            return;
        }
        self.profile = profile;
        info!("BLE: {:?} profile", profile);
        match self.state {
            BleState::Connected => self.platform_apply_conn_params(),
            BleState::Advertising => {
                if let Err(e) = self.platform_advertise() {
                    warn!("BLE: {}", e);
                }
            }
            BleState::Idle | BleState::Failed => {}
        }
    }

    fn restart_advertising(&mut self) -> Result<(), RadioError> {
        if self.state == BleState::Failed {
            return Err(RadioError::AdvertisingFailed(-1));
        }
        info!("BLE: restarting advertising");
        self.platform_advertise()?;
        self.state = BleState::Advertising;
        Ok(())
    }

    fn mtu(&self) -> u16 {
        self.platform_mtu()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────

// Smart Node — ADC1 Oneshot Driver
//
// Thin wrapper over the ESP-IDF oneshot ADC API.  One `OneshotAdc` owns the
// unit handle; each MQ sensor gets an `OneshotChannel` sharing it.  The
// handle is a raw pointer, so all of this must live on the thread that uses
// it.

use std::rc::Rc;

use esp_idf_sys as sys;

use crate::drivers::mq::AnalogInput;
use crate::error::{Error, Result};

pub struct OneshotAdc {
    handle: sys::adc_oneshot_unit_handle_t,
}

impl OneshotAdc {
    pub fn new() -> Result<Rc<Self>> {
        let mut handle: sys::adc_oneshot_unit_handle_t = core::ptr::null_mut();
        // SAFETY: plain FFI call; the config struct is fully initialised.
        let ret = unsafe {
            let unit_cfg = sys::adc_oneshot_unit_init_cfg_t {
                unit_id: sys::adc_unit_t_ADC_UNIT_1,
                ulp_mode: sys::adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
                ..core::mem::zeroed()
            };
            sys::adc_oneshot_new_unit(&unit_cfg, &mut handle)
        };
        if ret != sys::ESP_OK {
            log::error!("ADC unit init failed ({})", ret);
            return Err(Error::Adc(ret));
        }
        Ok(Rc::new(Self { handle }))
    }
}

impl Drop for OneshotAdc {
    fn drop(&mut self) {
        // SAFETY: handle came from adc_oneshot_new_unit and is released once.
        unsafe {
            sys::adc_oneshot_del_unit(self.handle);
        }
    }
}

pub struct OneshotChannel {
    unit: Rc<OneshotAdc>,
    channel: sys::adc_channel_t,
}

impl OneshotChannel {
    /// Configure `channel` for 12-bit reads over the 0–3.1 V range.
    pub fn new(unit: &Rc<OneshotAdc>, channel: sys::adc_channel_t) -> Result<Self> {
        let chan_cfg = sys::adc_oneshot_chan_cfg_t {
            atten: sys::adc_atten_t_ADC_ATTEN_DB_11,
            bitwidth: sys::adc_bitwidth_t_ADC_BITWIDTH_12,
        };
        // SAFETY: `unit` owns a live handle.
        let ret = unsafe { sys::adc_oneshot_config_channel(unit.handle, channel, &chan_cfg) };
        if ret != sys::ESP_OK {
            log::error!("ADC channel {} config failed ({})", channel, ret);
            return Err(Error::Adc(ret));
        }
        Ok(Self {
            unit: Rc::clone(unit),
            channel,
        })
    }
}

impl AnalogInput for OneshotChannel {
    fn read_raw(&mut self) -> Result<u16> {
        let mut raw: i32 = 0;
        // SAFETY: handle is kept alive by the Rc.
        let ret = unsafe { sys::adc_oneshot_read(self.unit.handle, self.channel, &mut raw) };
        if ret != sys::ESP_OK {
            return Err(Error::Adc(ret));
        }
        Ok(raw.clamp(0, i32::from(u16::MAX)) as u16)
    }
}

// GPIO → ADC1 channel on the classic ESP32.
pub const MQ135_CHANNEL: sys::adc_channel_t = sys::adc_channel_t_ADC_CHANNEL_6; // GPIO34
pub const MQ5_CHANNEL: sys::adc_channel_t = sys::adc_channel_t_ADC_CHANNEL_7; // GPIO35
pub const MQ9_CHANNEL: sys::adc_channel_t = sys::adc_channel_t_ADC_CHANNEL_4; // GPIO32

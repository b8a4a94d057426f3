//! DXGI-backed enumeration provider for the output cache.
//!
//! Walks every adapter's outputs and snapshots mode and colorimetry data
//! from `IDXGIOutput6::GetDesc1` plus the current display settings.
//! Staleness is detected by re-querying the cheap display-settings path
//! and comparing against the snapshot, which is what makes the owning
//! cache's flush inexpensive when nothing changed.

use std::mem;

use winapi::shared::{dxgi, dxgi1_6, dxgitype, winerror};
use winapi::um::winuser;
use winapi::Interface;

use super::{conv, ComPtr};
use crate::output::{MonitorId, Output, OutputProvider};

pub struct DxgiOutputProvider;

fn wide_to_string(wide: &[u16]) -> String {
    let len = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
    String::from_utf16_lossy(&wide[..len])
}

fn string_to_wide(value: &str) -> Vec<u16> {
    value.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Current display settings of the named display device, or `None` when
/// the device is gone.
fn current_mode(device_name: &str) -> Option<(api::Rect, u32)> {
    let wide = string_to_wide(device_name);
    let mut mode = unsafe { mem::zeroed::<winapi::um::wingdi::DEVMODEW>() };
    mode.dmSize = mem::size_of::<winapi::um::wingdi::DEVMODEW>() as u16;

    let ok = unsafe {
        winuser::EnumDisplaySettingsW(wide.as_ptr(), winuser::ENUM_CURRENT_SETTINGS, &mut mode)
    };
    if ok == 0 {
        return None;
    }

    let position = unsafe { mode.u1.s2().dmPosition };
    let rect = api::Rect {
        left: position.x,
        top: position.y,
        right: position.x + mode.dmPelsWidth as i32,
        bottom: position.y + mode.dmPelsHeight as i32,
    };
    Some((rect, mode.dmDisplayFrequency))
}

impl OutputProvider for DxgiOutputProvider {
    fn is_current(&self, output: &Output) -> bool {
        match current_mode(&output.device_name) {
            Some((rect, frequency)) => {
                rect == output.desktop_rect && frequency == output.refresh_rate.numerator
            }
            None => false,
        }
    }

    fn enumerate(&self) -> Vec<Output> {
        let mut outputs = Vec::new();

        let mut factory = ComPtr::<dxgi::IDXGIFactory1>::null();
        let hr = unsafe {
            dxgi::CreateDXGIFactory1(&dxgi::IDXGIFactory1::uuidof(), factory.mut_void())
        };
        if !winerror::SUCCEEDED(hr) {
            log::error!("CreateDXGIFactory1 failed with {:#x}", hr);
            return outputs;
        }

        for adapter_index in 0.. {
            let mut adapter = ComPtr::<dxgi::IDXGIAdapter1>::null();
            let hr = unsafe { factory.EnumAdapters1(adapter_index, adapter.mut_self()) };
            if hr == winerror::DXGI_ERROR_NOT_FOUND || !winerror::SUCCEEDED(hr) {
                break;
            }

            for output_index in 0.. {
                let mut output = ComPtr::<dxgi::IDXGIOutput>::null();
                let hr = unsafe { adapter.EnumOutputs(output_index, output.mut_self()) };
                if hr == winerror::DXGI_ERROR_NOT_FOUND || !winerror::SUCCEEDED(hr) {
                    break;
                }

                let mut desc = unsafe { mem::zeroed::<dxgi::DXGI_OUTPUT_DESC>() };
                if !winerror::SUCCEEDED(unsafe { output.GetDesc(&mut desc) }) {
                    continue;
                }
                if desc.AttachedToDesktop == 0 {
                    continue;
                }

                let device_name = wide_to_string(&desc.DeviceName);
                let (desktop_rect, frequency) = match current_mode(&device_name) {
                    Some(mode) => mode,
                    None => (
                        api::Rect {
                            left: desc.DesktopCoordinates.left,
                            top: desc.DesktopCoordinates.top,
                            right: desc.DesktopCoordinates.right,
                            bottom: desc.DesktopCoordinates.bottom,
                        },
                        0,
                    ),
                };

                let mut snapshot = Output {
                    monitor: MonitorId(desc.Monitor as usize as u64),
                    display_name: device_name.clone(),
                    device_name,
                    desktop_rect,
                    refresh_rate: api::Rational {
                        numerator: frequency,
                        denominator: 1,
                    },
                    color_depth: 8,
                    color_space: api::ColorSpace::SrgbNonLinear,
                    hdr_supported: false,
                    hdr_enabled: false,
                    red_primary: [0.0; 2],
                    green_primary: [0.0; 2],
                    blue_primary: [0.0; 2],
                    white_point: [0.0; 2],
                    min_luminance: 0.0,
                    max_luminance: 0.0,
                    max_full_frame_luminance: 0.0,
                    // Reference SDR white; without an HDR signal this is
                    // the sRGB paper-white level.
                    sdr_white_nits: 80.0,
                };

                // Colorimetry and luminance need DXGI 1.6.
                if let Ok(output6) = unsafe { output.cast::<dxgi1_6::IDXGIOutput6>() } {
                    let mut desc1 = unsafe { mem::zeroed::<dxgi1_6::DXGI_OUTPUT_DESC1>() };
                    if winerror::SUCCEEDED(unsafe { output6.GetDesc1(&mut desc1) }) {
                        snapshot.color_depth = desc1.BitsPerColor;
                        snapshot.color_space = conv::unmap_color_space(desc1.ColorSpace);
                        // DXGI only reports the active color space; when
                        // HDR is off it cannot distinguish "unsupported"
                        // from "disabled".
                        snapshot.hdr_enabled = desc1.ColorSpace
                            == dxgitype::DXGI_COLOR_SPACE_RGB_FULL_G2084_NONE_P2020;
                        snapshot.hdr_supported = snapshot.hdr_enabled;
                        snapshot.red_primary = desc1.RedPrimary;
                        snapshot.green_primary = desc1.GreenPrimary;
                        snapshot.blue_primary = desc1.BluePrimary;
                        snapshot.white_point = desc1.WhitePoint;
                        snapshot.min_luminance = desc1.MinLuminance;
                        snapshot.max_luminance = desc1.MaxLuminance;
                        snapshot.max_full_frame_luminance = desc1.MaxFullFrameLuminance;
                    }
                }

                outputs.push(snapshot);
            }
        }

        outputs
    }
}

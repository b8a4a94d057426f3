//! DXGI-facing conversions shared by the Direct3D backends.
//!
//! The unified format numbering matches DXGI below 1000, so format
//! conversion is a checked numeric cast rather than a lookup table.

use winapi::shared::{dxgiformat, dxgitype};

pub fn map_format(format: api::Format) -> dxgiformat::DXGI_FORMAT {
    format as dxgiformat::DXGI_FORMAT
}

pub fn unmap_format(format: dxgiformat::DXGI_FORMAT) -> api::Format {
    api::Format::from_u32(format)
}

pub fn map_color_space(color_space: api::ColorSpace) -> dxgitype::DXGI_COLOR_SPACE_TYPE {
    match color_space {
        api::ColorSpace::Unknown | api::ColorSpace::SrgbNonLinear => {
            dxgitype::DXGI_COLOR_SPACE_RGB_FULL_G22_NONE_P709
        }
        api::ColorSpace::ExtendedSrgbLinear => {
            dxgitype::DXGI_COLOR_SPACE_RGB_FULL_G10_NONE_P709
        }
        api::ColorSpace::Hdr10St2084 => dxgitype::DXGI_COLOR_SPACE_RGB_FULL_G2084_NONE_P2020,
        api::ColorSpace::Hdr10Hlg => dxgitype::DXGI_COLOR_SPACE_RGB_FULL_G22_NONE_P2020,
    }
}

pub fn unmap_color_space(color_space: dxgitype::DXGI_COLOR_SPACE_TYPE) -> api::ColorSpace {
    match color_space {
        dxgitype::DXGI_COLOR_SPACE_RGB_FULL_G22_NONE_P709 => api::ColorSpace::SrgbNonLinear,
        dxgitype::DXGI_COLOR_SPACE_RGB_FULL_G10_NONE_P709 => api::ColorSpace::ExtendedSrgbLinear,
        dxgitype::DXGI_COLOR_SPACE_RGB_FULL_G2084_NONE_P2020 => api::ColorSpace::Hdr10St2084,
        dxgitype::DXGI_COLOR_SPACE_RGB_FULL_G22_NONE_P2020 => api::ColorSpace::Hdr10Hlg,
        _ => api::ColorSpace::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_cast_round_trips() {
        for value in [
            api::Format::R8G8B8A8Unorm,
            api::Format::B8G8R8A8UnormSrgb,
            api::Format::D24UnormS8Uint,
            api::Format::Bc7UnormSrgb,
        ] {
            assert_eq!(unmap_format(map_format(value)), value);
        }
        assert_eq!(
            map_format(api::Format::R10G10B10A2Unorm),
            dxgiformat::DXGI_FORMAT_R10G10B10A2_UNORM
        );
    }

    #[test]
    fn color_space_round_trips_where_representable() {
        for value in [
            api::ColorSpace::SrgbNonLinear,
            api::ColorSpace::ExtendedSrgbLinear,
            api::ColorSpace::Hdr10St2084,
            api::ColorSpace::Hdr10Hlg,
        ] {
            assert_eq!(unmap_color_space(map_color_space(value)), value);
        }
    }
}

//! The unified texel format enumeration and the variant-mapping helpers
//! (typeless, typed and sRGB views of the same memory layout).
//!
//! The numeric values below `1000` match the DXGI format numbering, so the
//! Direct3D backends convert by numeric cast. Other backends use lookup
//! conversion. The values are part of the stable wire contract.

use bitflags::bitflags;

/// A texel or vertex element data format.
#[repr(u32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Format {
    #[default]
    Unknown = 0,

    R32G32B32A32Typeless = 1,
    R32G32B32A32Float = 2,
    R32G32B32A32Uint = 3,
    R32G32B32A32Sint = 4,

    R32G32B32Typeless = 5,
    R32G32B32Float = 6,
    R32G32B32Uint = 7,
    R32G32B32Sint = 8,

    R16G16B16A16Typeless = 9,
    R16G16B16A16Float = 10,
    R16G16B16A16Unorm = 11,
    R16G16B16A16Uint = 12,
    R16G16B16A16Snorm = 13,
    R16G16B16A16Sint = 14,

    R32G32Typeless = 15,
    R32G32Float = 16,
    R32G32Uint = 17,
    R32G32Sint = 18,

    R32G8X24Typeless = 19,
    D32FloatS8X24Uint = 20,
    R32FloatX8X24Typeless = 21,
    X32TypelessG8X24Uint = 22,

    R10G10B10A2Typeless = 23,
    R10G10B10A2Unorm = 24,
    R10G10B10A2Uint = 25,
    R11G11B10Float = 26,

    R8G8B8A8Typeless = 27,
    R8G8B8A8Unorm = 28,
    R8G8B8A8UnormSrgb = 29,
    R8G8B8A8Uint = 30,
    R8G8B8A8Snorm = 31,
    R8G8B8A8Sint = 32,

    R16G16Typeless = 33,
    R16G16Float = 34,
    R16G16Unorm = 35,
    R16G16Uint = 36,
    R16G16Snorm = 37,
    R16G16Sint = 38,

    R32Typeless = 39,
    D32Float = 40,
    R32Float = 41,
    R32Uint = 42,
    R32Sint = 43,

    R24G8Typeless = 44,
    D24UnormS8Uint = 45,
    R24UnormX8Typeless = 46,
    X24TypelessG8Uint = 47,

    R8G8Typeless = 48,
    R8G8Unorm = 49,
    R8G8Uint = 50,
    R8G8Snorm = 51,
    R8G8Sint = 52,

    R16Typeless = 53,
    R16Float = 54,
    D16Unorm = 55,
    R16Unorm = 56,
    R16Uint = 57,
    R16Snorm = 58,
    R16Sint = 59,

    R8Typeless = 60,
    R8Unorm = 61,
    R8Uint = 62,
    R8Snorm = 63,
    R8Sint = 64,
    A8Unorm = 65,

    R1Unorm = 66,
    R9G9B9E5Float = 67,
    R8G8B8G8Unorm = 68,
    G8R8G8B8Unorm = 69,

    Bc1Typeless = 70,
    Bc1Unorm = 71,
    Bc1UnormSrgb = 72,
    Bc2Typeless = 73,
    Bc2Unorm = 74,
    Bc2UnormSrgb = 75,
    Bc3Typeless = 76,
    Bc3Unorm = 77,
    Bc3UnormSrgb = 78,
    Bc4Typeless = 79,
    Bc4Unorm = 80,
    Bc4Snorm = 81,
    Bc5Typeless = 82,
    Bc5Unorm = 83,
    Bc5Snorm = 84,

    B5G6R5Unorm = 85,
    B5G5R5A1Unorm = 86,
    B8G8R8A8Unorm = 87,
    B8G8R8X8Unorm = 88,
    R10G10B10XrBiasA2Unorm = 89,
    B8G8R8A8Typeless = 90,
    B8G8R8A8UnormSrgb = 91,
    B8G8R8X8Typeless = 92,
    B8G8R8X8UnormSrgb = 93,

    Bc6hTypeless = 94,
    Bc6hUfloat = 95,
    Bc6hSfloat = 96,
    Bc7Typeless = 97,
    Bc7Unorm = 98,
    Bc7UnormSrgb = 99,

    B4G4R4A4Unorm = 115,
}

bitflags! {
    /// Which data planes a format carries.
    pub struct FormatAspect: u8 {
        const COLOR = 1;
        const DEPTH = 2;
        const STENCIL = 4;
    }
}

impl Format {
    /// Recovers a format from its stable numeric value. Values outside the
    /// modeled set yield `Unknown` rather than failing, since native code
    /// may hand over vendor-specific formats.
    pub const fn from_u32(value: u32) -> Self {
        match value {
            1 => Self::R32G32B32A32Typeless,
            2 => Self::R32G32B32A32Float,
            3 => Self::R32G32B32A32Uint,
            4 => Self::R32G32B32A32Sint,
            5 => Self::R32G32B32Typeless,
            6 => Self::R32G32B32Float,
            7 => Self::R32G32B32Uint,
            8 => Self::R32G32B32Sint,
            9 => Self::R16G16B16A16Typeless,
            10 => Self::R16G16B16A16Float,
            11 => Self::R16G16B16A16Unorm,
            12 => Self::R16G16B16A16Uint,
            13 => Self::R16G16B16A16Snorm,
            14 => Self::R16G16B16A16Sint,
            15 => Self::R32G32Typeless,
            16 => Self::R32G32Float,
            17 => Self::R32G32Uint,
            18 => Self::R32G32Sint,
            19 => Self::R32G8X24Typeless,
            20 => Self::D32FloatS8X24Uint,
            21 => Self::R32FloatX8X24Typeless,
            22 => Self::X32TypelessG8X24Uint,
            23 => Self::R10G10B10A2Typeless,
            24 => Self::R10G10B10A2Unorm,
            25 => Self::R10G10B10A2Uint,
            26 => Self::R11G11B10Float,
            27 => Self::R8G8B8A8Typeless,
            28 => Self::R8G8B8A8Unorm,
            29 => Self::R8G8B8A8UnormSrgb,
            30 => Self::R8G8B8A8Uint,
            31 => Self::R8G8B8A8Snorm,
            32 => Self::R8G8B8A8Sint,
            33 => Self::R16G16Typeless,
            34 => Self::R16G16Float,
            35 => Self::R16G16Unorm,
            36 => Self::R16G16Uint,
            37 => Self::R16G16Snorm,
            38 => Self::R16G16Sint,
            39 => Self::R32Typeless,
            40 => Self::D32Float,
            41 => Self::R32Float,
            42 => Self::R32Uint,
            43 => Self::R32Sint,
            44 => Self::R24G8Typeless,
            45 => Self::D24UnormS8Uint,
            46 => Self::R24UnormX8Typeless,
            47 => Self::X24TypelessG8Uint,
            48 => Self::R8G8Typeless,
            49 => Self::R8G8Unorm,
            50 => Self::R8G8Uint,
            51 => Self::R8G8Snorm,
            52 => Self::R8G8Sint,
            53 => Self::R16Typeless,
            54 => Self::R16Float,
            55 => Self::D16Unorm,
            56 => Self::R16Unorm,
            57 => Self::R16Uint,
            58 => Self::R16Snorm,
            59 => Self::R16Sint,
            60 => Self::R8Typeless,
            61 => Self::R8Unorm,
            62 => Self::R8Uint,
            63 => Self::R8Snorm,
            64 => Self::R8Sint,
            65 => Self::A8Unorm,
            66 => Self::R1Unorm,
            67 => Self::R9G9B9E5Float,
            68 => Self::R8G8B8G8Unorm,
            69 => Self::G8R8G8B8Unorm,
            70 => Self::Bc1Typeless,
            71 => Self::Bc1Unorm,
            72 => Self::Bc1UnormSrgb,
            73 => Self::Bc2Typeless,
            74 => Self::Bc2Unorm,
            75 => Self::Bc2UnormSrgb,
            76 => Self::Bc3Typeless,
            77 => Self::Bc3Unorm,
            78 => Self::Bc3UnormSrgb,
            79 => Self::Bc4Typeless,
            80 => Self::Bc4Unorm,
            81 => Self::Bc4Snorm,
            82 => Self::Bc5Typeless,
            83 => Self::Bc5Unorm,
            84 => Self::Bc5Snorm,
            85 => Self::B5G6R5Unorm,
            86 => Self::B5G5R5A1Unorm,
            87 => Self::B8G8R8A8Unorm,
            88 => Self::B8G8R8X8Unorm,
            89 => Self::R10G10B10XrBiasA2Unorm,
            90 => Self::B8G8R8A8Typeless,
            91 => Self::B8G8R8A8UnormSrgb,
            92 => Self::B8G8R8X8Typeless,
            93 => Self::B8G8R8X8UnormSrgb,
            94 => Self::Bc6hTypeless,
            95 => Self::Bc6hUfloat,
            96 => Self::Bc6hSfloat,
            97 => Self::Bc7Typeless,
            98 => Self::Bc7Unorm,
            99 => Self::Bc7UnormSrgb,
            115 => Self::B4G4R4A4Unorm,
            _ => Self::Unknown,
        }
    }

    /// Maps to the typeless variant of this format's family, if one exists.
    pub const fn into_typeless(self) -> Self {
        match self {
            Self::R32G32B32A32Float | Self::R32G32B32A32Uint | Self::R32G32B32A32Sint => {
                Self::R32G32B32A32Typeless
            }
            Self::R32G32B32Float | Self::R32G32B32Uint | Self::R32G32B32Sint => {
                Self::R32G32B32Typeless
            }
            Self::R16G16B16A16Float
            | Self::R16G16B16A16Unorm
            | Self::R16G16B16A16Uint
            | Self::R16G16B16A16Snorm
            | Self::R16G16B16A16Sint => Self::R16G16B16A16Typeless,
            Self::R32G32Float | Self::R32G32Uint | Self::R32G32Sint => Self::R32G32Typeless,
            Self::D32FloatS8X24Uint
            | Self::R32FloatX8X24Typeless
            | Self::X32TypelessG8X24Uint => Self::R32G8X24Typeless,
            Self::R10G10B10A2Unorm | Self::R10G10B10A2Uint => Self::R10G10B10A2Typeless,
            Self::R8G8B8A8Unorm
            | Self::R8G8B8A8UnormSrgb
            | Self::R8G8B8A8Uint
            | Self::R8G8B8A8Snorm
            | Self::R8G8B8A8Sint => Self::R8G8B8A8Typeless,
            Self::R16G16Float
            | Self::R16G16Unorm
            | Self::R16G16Uint
            | Self::R16G16Snorm
            | Self::R16G16Sint => Self::R16G16Typeless,
            Self::D32Float | Self::R32Float | Self::R32Uint | Self::R32Sint => Self::R32Typeless,
            Self::D24UnormS8Uint | Self::R24UnormX8Typeless | Self::X24TypelessG8Uint => {
                Self::R24G8Typeless
            }
            Self::R8G8Unorm | Self::R8G8Uint | Self::R8G8Snorm | Self::R8G8Sint => {
                Self::R8G8Typeless
            }
            Self::R16Float
            | Self::D16Unorm
            | Self::R16Unorm
            | Self::R16Uint
            | Self::R16Snorm
            | Self::R16Sint => Self::R16Typeless,
            Self::R8Unorm | Self::R8Uint | Self::R8Snorm | Self::R8Sint => Self::R8Typeless,
            Self::Bc1Unorm | Self::Bc1UnormSrgb => Self::Bc1Typeless,
            Self::Bc2Unorm | Self::Bc2UnormSrgb => Self::Bc2Typeless,
            Self::Bc3Unorm | Self::Bc3UnormSrgb => Self::Bc3Typeless,
            Self::Bc4Unorm | Self::Bc4Snorm => Self::Bc4Typeless,
            Self::Bc5Unorm | Self::Bc5Snorm => Self::Bc5Typeless,
            Self::B8G8R8A8Unorm | Self::B8G8R8A8UnormSrgb => Self::B8G8R8A8Typeless,
            Self::B8G8R8X8Unorm | Self::B8G8R8X8UnormSrgb => Self::B8G8R8X8Typeless,
            Self::Bc6hUfloat | Self::Bc6hSfloat => Self::Bc6hTypeless,
            Self::Bc7Unorm | Self::Bc7UnormSrgb => Self::Bc7Typeless,
            other => other,
        }
    }

    /// Maps a typeless format to the default typed variant of its family.
    /// Typed formats map to themselves; depth formats map to the color-
    /// readable equivalent.
    pub const fn into_typed(self) -> Self {
        match self {
            Self::R32G32B32A32Typeless => Self::R32G32B32A32Float,
            Self::R32G32B32Typeless => Self::R32G32B32Float,
            Self::R16G16B16A16Typeless => Self::R16G16B16A16Float,
            Self::R32G32Typeless => Self::R32G32Float,
            Self::R32G8X24Typeless | Self::D32FloatS8X24Uint => Self::R32FloatX8X24Typeless,
            Self::R10G10B10A2Typeless => Self::R10G10B10A2Unorm,
            Self::R8G8B8A8Typeless => Self::R8G8B8A8Unorm,
            Self::R16G16Typeless => Self::R16G16Float,
            Self::R32Typeless | Self::D32Float => Self::R32Float,
            Self::R24G8Typeless | Self::D24UnormS8Uint => Self::R24UnormX8Typeless,
            Self::R8G8Typeless => Self::R8G8Unorm,
            Self::R16Typeless | Self::D16Unorm => Self::R16Unorm,
            Self::R8Typeless => Self::R8Unorm,
            Self::Bc1Typeless => Self::Bc1Unorm,
            Self::Bc2Typeless => Self::Bc2Unorm,
            Self::Bc3Typeless => Self::Bc3Unorm,
            Self::Bc4Typeless => Self::Bc4Unorm,
            Self::Bc5Typeless => Self::Bc5Unorm,
            Self::B8G8R8A8Typeless => Self::B8G8R8A8Unorm,
            Self::B8G8R8X8Typeless => Self::B8G8R8X8Unorm,
            Self::Bc6hTypeless => Self::Bc6hUfloat,
            Self::Bc7Typeless => Self::Bc7Unorm,
            other => other,
        }
    }

    /// Maps a format family to its depth-stencil typed variant, for use
    /// when creating depth-stencil views of typeless resources.
    pub const fn into_depth_stencil_typed(self) -> Self {
        match self {
            Self::R32G8X24Typeless | Self::R32FloatX8X24Typeless => Self::D32FloatS8X24Uint,
            Self::R32Typeless | Self::R32Float => Self::D32Float,
            Self::R24G8Typeless | Self::R24UnormX8Typeless => Self::D24UnormS8Uint,
            Self::R16Typeless | Self::R16Unorm => Self::D16Unorm,
            other => other,
        }
    }

    /// Maps to the sRGB variant, where the family has one.
    pub const fn into_srgb(self) -> Self {
        match self {
            Self::R8G8B8A8Typeless | Self::R8G8B8A8Unorm => Self::R8G8B8A8UnormSrgb,
            Self::B8G8R8A8Typeless | Self::B8G8R8A8Unorm => Self::B8G8R8A8UnormSrgb,
            Self::B8G8R8X8Typeless | Self::B8G8R8X8Unorm => Self::B8G8R8X8UnormSrgb,
            Self::Bc1Typeless | Self::Bc1Unorm => Self::Bc1UnormSrgb,
            Self::Bc2Typeless | Self::Bc2Unorm => Self::Bc2UnormSrgb,
            Self::Bc3Typeless | Self::Bc3Unorm => Self::Bc3UnormSrgb,
            Self::Bc7Typeless | Self::Bc7Unorm => Self::Bc7UnormSrgb,
            other => other,
        }
    }

    /// Maps to the non-sRGB variant of the family.
    pub const fn into_non_srgb(self) -> Self {
        match self {
            Self::R8G8B8A8UnormSrgb => Self::R8G8B8A8Unorm,
            Self::B8G8R8A8UnormSrgb => Self::B8G8R8A8Unorm,
            Self::B8G8R8X8UnormSrgb => Self::B8G8R8X8Unorm,
            Self::Bc1UnormSrgb => Self::Bc1Unorm,
            Self::Bc2UnormSrgb => Self::Bc2Unorm,
            Self::Bc3UnormSrgb => Self::Bc3Unorm,
            Self::Bc7UnormSrgb => Self::Bc7Unorm,
            other => other,
        }
    }

    /// Whether this is a fully typeless format. The partially typeless
    /// plane-view formats (`R24UnormX8Typeless` and friends) are concrete
    /// view formats and intentionally not part of this set.
    pub const fn is_typeless(self) -> bool {
        matches!(
            self,
            Self::R32G32B32A32Typeless
                | Self::R32G32B32Typeless
                | Self::R16G16B16A16Typeless
                | Self::R32G32Typeless
                | Self::R32G8X24Typeless
                | Self::R10G10B10A2Typeless
                | Self::R8G8B8A8Typeless
                | Self::R16G16Typeless
                | Self::R32Typeless
                | Self::R24G8Typeless
                | Self::R8G8Typeless
                | Self::R16Typeless
                | Self::R8Typeless
                | Self::Bc1Typeless
                | Self::Bc2Typeless
                | Self::Bc3Typeless
                | Self::Bc4Typeless
                | Self::Bc5Typeless
                | Self::B8G8R8A8Typeless
                | Self::B8G8R8X8Typeless
                | Self::Bc6hTypeless
                | Self::Bc7Typeless
        )
    }

    pub const fn is_compressed(self) -> bool {
        (self as u32) >= Self::Bc1Typeless as u32 && (self as u32) <= Self::Bc5Snorm as u32
            || (self as u32) >= Self::Bc6hTypeless as u32
                && (self as u32) <= Self::Bc7UnormSrgb as u32
    }

    /// Which aspects a view of this format reads. Families that can alias a
    /// depth-stencil resource report their depth/stencil planes.
    pub fn aspect(self) -> FormatAspect {
        match self {
            Self::D16Unorm | Self::D32Float | Self::R32Typeless | Self::R16Typeless => {
                FormatAspect::DEPTH
            }
            Self::D24UnormS8Uint
            | Self::D32FloatS8X24Uint
            | Self::R24G8Typeless
            | Self::R32G8X24Typeless => FormatAspect::DEPTH | FormatAspect::STENCIL,
            Self::X24TypelessG8Uint | Self::X32TypelessG8X24Uint => FormatAspect::STENCIL,
            _ => FormatAspect::COLOR,
        }
    }

    /// Bytes per texel for uncompressed formats, bytes per 4x4 block for
    /// block-compressed ones. Zero for `Unknown` and `R1Unorm`.
    pub const fn block_size_bytes(self) -> u32 {
        match self {
            Self::Unknown | Self::R1Unorm => 0,
            Self::R32G32B32A32Typeless
            | Self::R32G32B32A32Float
            | Self::R32G32B32A32Uint
            | Self::R32G32B32A32Sint => 16,
            Self::R32G32B32Typeless
            | Self::R32G32B32Float
            | Self::R32G32B32Uint
            | Self::R32G32B32Sint => 12,
            Self::R16G16B16A16Typeless
            | Self::R16G16B16A16Float
            | Self::R16G16B16A16Unorm
            | Self::R16G16B16A16Uint
            | Self::R16G16B16A16Snorm
            | Self::R16G16B16A16Sint
            | Self::R32G32Typeless
            | Self::R32G32Float
            | Self::R32G32Uint
            | Self::R32G32Sint
            | Self::R32G8X24Typeless
            | Self::D32FloatS8X24Uint
            | Self::R32FloatX8X24Typeless
            | Self::X32TypelessG8X24Uint => 8,
            Self::R8G8Typeless
            | Self::R8G8Unorm
            | Self::R8G8Uint
            | Self::R8G8Snorm
            | Self::R8G8Sint
            | Self::R16Typeless
            | Self::R16Float
            | Self::D16Unorm
            | Self::R16Unorm
            | Self::R16Uint
            | Self::R16Snorm
            | Self::R16Sint
            | Self::B5G6R5Unorm
            | Self::B5G5R5A1Unorm
            | Self::B4G4R4A4Unorm => 2,
            Self::R8Typeless
            | Self::R8Unorm
            | Self::R8Uint
            | Self::R8Snorm
            | Self::R8Sint
            | Self::A8Unorm => 1,
            Self::Bc1Typeless
            | Self::Bc1Unorm
            | Self::Bc1UnormSrgb
            | Self::Bc4Typeless
            | Self::Bc4Unorm
            | Self::Bc4Snorm => 8,
            Self::Bc2Typeless
            | Self::Bc2Unorm
            | Self::Bc2UnormSrgb
            | Self::Bc3Typeless
            | Self::Bc3Unorm
            | Self::Bc3UnormSrgb
            | Self::Bc5Typeless
            | Self::Bc5Unorm
            | Self::Bc5Snorm
            | Self::Bc6hTypeless
            | Self::Bc6hUfloat
            | Self::Bc6hSfloat
            | Self::Bc7Typeless
            | Self::Bc7Unorm
            | Self::Bc7UnormSrgb => 16,
            // Everything else in the modeled set is 32 bits per texel.
            _ => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The set of every format variant, for exhaustive property loops.
    const ALL: &[Format] = &[
        Format::Unknown,
        Format::R32G32B32A32Typeless,
        Format::R32G32B32A32Float,
        Format::R32G32B32A32Uint,
        Format::R32G32B32A32Sint,
        Format::R32G32B32Typeless,
        Format::R32G32B32Float,
        Format::R32G32B32Uint,
        Format::R32G32B32Sint,
        Format::R16G16B16A16Typeless,
        Format::R16G16B16A16Float,
        Format::R16G16B16A16Unorm,
        Format::R16G16B16A16Uint,
        Format::R16G16B16A16Snorm,
        Format::R16G16B16A16Sint,
        Format::R32G32Typeless,
        Format::R32G32Float,
        Format::R32G32Uint,
        Format::R32G32Sint,
        Format::R32G8X24Typeless,
        Format::D32FloatS8X24Uint,
        Format::R32FloatX8X24Typeless,
        Format::X32TypelessG8X24Uint,
        Format::R10G10B10A2Typeless,
        Format::R10G10B10A2Unorm,
        Format::R10G10B10A2Uint,
        Format::R11G11B10Float,
        Format::R8G8B8A8Typeless,
        Format::R8G8B8A8Unorm,
        Format::R8G8B8A8UnormSrgb,
        Format::R8G8B8A8Uint,
        Format::R8G8B8A8Snorm,
        Format::R8G8B8A8Sint,
        Format::R16G16Typeless,
        Format::R16G16Float,
        Format::R16G16Unorm,
        Format::R16G16Uint,
        Format::R16G16Snorm,
        Format::R16G16Sint,
        Format::R32Typeless,
        Format::D32Float,
        Format::R32Float,
        Format::R32Uint,
        Format::R32Sint,
        Format::R24G8Typeless,
        Format::D24UnormS8Uint,
        Format::R24UnormX8Typeless,
        Format::X24TypelessG8Uint,
        Format::R8G8Typeless,
        Format::R8G8Unorm,
        Format::R8G8Uint,
        Format::R8G8Snorm,
        Format::R8G8Sint,
        Format::R16Typeless,
        Format::R16Float,
        Format::D16Unorm,
        Format::R16Unorm,
        Format::R16Uint,
        Format::R16Snorm,
        Format::R16Sint,
        Format::R8Typeless,
        Format::R8Unorm,
        Format::R8Uint,
        Format::R8Snorm,
        Format::R8Sint,
        Format::A8Unorm,
        Format::R1Unorm,
        Format::R9G9B9E5Float,
        Format::R8G8B8G8Unorm,
        Format::G8R8G8B8Unorm,
        Format::Bc1Typeless,
        Format::Bc1Unorm,
        Format::Bc1UnormSrgb,
        Format::Bc2Typeless,
        Format::Bc2Unorm,
        Format::Bc2UnormSrgb,
        Format::Bc3Typeless,
        Format::Bc3Unorm,
        Format::Bc3UnormSrgb,
        Format::Bc4Typeless,
        Format::Bc4Unorm,
        Format::Bc4Snorm,
        Format::Bc5Typeless,
        Format::Bc5Unorm,
        Format::Bc5Snorm,
        Format::B5G6R5Unorm,
        Format::B5G5R5A1Unorm,
        Format::B8G8R8A8Unorm,
        Format::B8G8R8X8Unorm,
        Format::R10G10B10XrBiasA2Unorm,
        Format::B8G8R8A8Typeless,
        Format::B8G8R8A8UnormSrgb,
        Format::B8G8R8X8Typeless,
        Format::B8G8R8X8UnormSrgb,
        Format::Bc6hTypeless,
        Format::Bc6hUfloat,
        Format::Bc6hSfloat,
        Format::Bc7Typeless,
        Format::Bc7Unorm,
        Format::Bc7UnormSrgb,
        Format::B4G4R4A4Unorm,
    ];

    #[test]
    fn numeric_round_trip() {
        for &format in ALL {
            assert_eq!(Format::from_u32(format as u32), format);
        }
    }

    #[test]
    fn unknown_values_decode_to_unknown() {
        assert_eq!(Format::from_u32(100), Format::Unknown);
        assert_eq!(Format::from_u32(0xffff_ffff), Format::Unknown);
    }

    #[test]
    fn typeless_mapping_is_idempotent() {
        for &format in ALL {
            let typeless = format.into_typeless();
            assert_eq!(typeless.into_typeless(), typeless);
            if format.is_typeless() {
                assert_eq!(format.into_typeless(), format);
                // Typed variant of a typeless family is concrete again.
                assert!(
                    !format.into_typed().is_typeless(),
                    "{:?} did not resolve to a typed variant",
                    format
                );
            }
        }
    }

    #[test]
    fn srgb_pairs_invert() {
        for &format in ALL {
            let srgb = format.into_srgb();
            if srgb != format {
                assert_eq!(srgb.into_non_srgb(), format.into_non_srgb());
            }
        }
    }

    #[test]
    fn depth_formats_report_depth_aspect() {
        assert_eq!(Format::D32Float.aspect(), FormatAspect::DEPTH);
        assert!(Format::D24UnormS8Uint.aspect().contains(FormatAspect::STENCIL));
        assert_eq!(Format::R8G8B8A8Unorm.aspect(), FormatAspect::COLOR);
    }
}

/*! This library describes the unified, backend-agnostic object model of the
 *  refract graphics interception layer.
 *
 *  Every type in here is part of the stable boundary contract between the
 *  abstraction core, the per-API hook shims and third-party extensions:
 *  enum discriminants and bit-flag values are frozen and must not be
 *  renumbered between versions. Object references crossing the boundary are
 *  plain 64-bit handles whose bit pattern aliases the native object where
 *  the backend allows it.
 */

#![allow(
    // We don't use syntax sugar where it's not necessary.
    clippy::match_like_matches_macro,
)]
#![warn(trivial_casts, trivial_numeric_casts, unsafe_op_in_unsafe_fn)]

use bitflags::bitflags;

mod format;

pub use format::{Format, FormatAspect};

/// Sentinel for "all remaining mipmap levels" in a view description.
pub const ALL_LEVELS: u32 = !0;
/// Sentinel for "all remaining array layers" in a view description.
pub const ALL_LAYERS: u32 = !0;
/// Sentinel for "the rest of the buffer" in byte ranges.
pub const WHOLE_SIZE: u64 = !0;

// Serialize bit-flag sets as their raw bits, so unknown bits survive a
// round-trip instead of failing deserialization.
macro_rules! impl_bitflags_serde {
    ($name:ident) => {
        #[cfg(feature = "serde")]
        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                self.bits().serialize(serializer)
            }
        }

        #[cfg(feature = "serde")]
        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<$name, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let bits = <_ as serde::Deserialize<'de>>::deserialize(deserializer)?;
                Ok($name::from_bits_truncate(bits))
            }
        }
    };
}

/// Defines an opaque 64-bit handle type.
///
/// A handle's value either *is* the native backend pointer/handle or encodes
/// a pointer into a backend-owned record, so equality of two handles means
/// identity of the referenced object. Zero universally means "no object".
macro_rules! define_handle {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[repr(transparent)]
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(pub u64);

        impl $name {
            /// The zero handle, meaning "no object" / "query failed".
            pub const NULL: Self = Self(0);

            #[inline]
            pub const fn is_null(self) -> bool {
                self.0 == 0
            }

            /// Raw 64-bit value of the handle.
            #[inline]
            pub const fn get(self) -> u64 {
                self.0
            }
        }
    };
}

define_handle!(
    /// An opaque handle to a sampler state object.
    Sampler
);
define_handle!(
    /// An opaque handle to a resource (buffer or texture).
    Resource
);
define_handle!(
    /// An opaque handle to a typed view into a resource.
    ResourceView
);
define_handle!(
    /// An opaque handle to a pipeline state object.
    ///
    /// On backends whose pipelines are bundles of independently bindable
    /// state objects, this may reference a backend-owned aggregate record
    /// rather than a single native object.
    Pipeline
);
define_handle!(
    /// An opaque handle to a pipeline layout.
    PipelineLayout
);
define_handle!(
    /// An opaque handle to a bindable descriptor table (descriptor set).
    DescriptorTable
);
define_handle!(
    /// An opaque handle to a fixed-size pool of queries.
    QueryPool
);
define_handle!(
    /// An opaque handle to a GPU/CPU synchronization fence.
    Fence
);
define_handle!(
    /// An opaque handle to an effect runtime instance.
    ///
    /// The effect runtime itself lives outside this layer; the handle only
    /// exists so lifecycle events can reference it.
    EffectRuntime
);

/// The native render API a device is built on.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Backend {
    /// Direct3D 9
    D3d9 = 0x9000,
    /// Direct3D 10
    D3d10 = 0xa000,
    /// Direct3D 11
    D3d11 = 0xb000,
    /// Direct3D 12
    D3d12 = 0xc000,
    /// OpenGL
    OpenGl = 0x10000,
    /// Vulkan
    Vulkan = 0x20000,
    /// Inert backend used for testing.
    Noop = 0,
}

impl Backend {
    /// Whether command lists are persistent objects that can be reset and
    /// re-recorded, as opposed to an immediate context that doubles as the
    /// command queue.
    pub const fn has_standalone_command_lists(self) -> bool {
        matches!(self, Self::D3d12 | Self::Vulkan)
    }
}

/// The features a device implementation may or may not support.
///
/// Queried through `check_capability`; the answer is fixed for the lifetime
/// of the device.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Capability {
    /// Compute shaders and `dispatch` are available.
    ComputeShader = 1,
    GeometryShader,
    /// Hull and domain (tessellation) shader stages are available.
    HullAndDomainShader,
    /// Blend state supports logic operations.
    LogicOp,
    /// Dual-source blend factors may be used.
    DualSourceBlend,
    /// Blend state is controlled independently per render target.
    IndependentBlend,
    /// Point and wireframe fill modes are supported.
    FillModeNonSolid,
    ConservativeRasterization,
    /// Binding individual render target and depth-stencil views is legal;
    /// without it only the render-pass path may be used.
    BindRenderTargetsAndDepthStencil,
    MultiViewport,
    /// `push_constants` may update a sub-range rather than the whole range.
    PartialPushConstantUpdates,
    /// `push_descriptors` may update a sub-range rather than the whole range.
    PartialPushDescriptorUpdates,
    DrawInstanced,
    DrawOrDispatchIndirect,
    CopyBufferRegion,
    CopyBufferToTexture,
    /// `copy_texture_region` may scale between differently sized boxes.
    Blit,
    /// `resolve_texture_region` may target a sub-region.
    ResolveRegion,
    CopyQueryPoolResults,
    SamplerCompare,
    SamplerAnisotropic,
    /// Combined sampler-and-resource-view descriptors are supported.
    SamplerWithResourceView,
    SharedResource,
    SharedResourceNtHandle,
}

/// Memory heap classes, hinting where a resource allocation should live.
#[repr(u32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MemoryHeap {
    /// Resource is reserved but not bound to memory yet.
    #[default]
    Unknown = 0,
    GpuOnly,
    CpuToGpu,
    GpuToCpu,
    CpuOnly,
    Custom,
}

/// Host access hints for `map_buffer_region`/`map_texture_region`.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MapAccess {
    ReadOnly = 0,
    WriteOnly,
    ReadWrite,
    /// Write access that discards the previous contents, allowing the
    /// driver to hand back fresh memory instead of stalling.
    WriteDiscard,
}

bitflags! {
    /// Additional parameters of a resource, specified at creation.
    pub struct ResourceFlags: u32 {
        const SHARED = 1 << 0;
        const DYNAMIC = 1 << 1;
        const SPARSE_BINDING = 1 << 2;
        const CUBE_COMPATIBLE = 1 << 3;
        const GENERATE_MIPMAPS = 1 << 4;
        const SHARED_NT_HANDLE = 1 << 5;
    }
}
impl_bitflags_serde!(ResourceFlags);

bitflags! {
    /// Ways a resource may be used.
    ///
    /// Specified at creation and also used to describe state transitions in
    /// `CommandList::barrier`. The bit values are part of the stable wire
    /// contract.
    pub struct ResourceUsage: u32 {
        const VERTEX_BUFFER = 0x1;
        const INDEX_BUFFER = 0x2;
        const RENDER_TARGET = 0x4;
        const UNORDERED_ACCESS = 0x8;
        const DEPTH_STENCIL_WRITE = 0x10;
        const DEPTH_STENCIL_READ = 0x20;
        const DEPTH_STENCIL = Self::DEPTH_STENCIL_WRITE.bits | Self::DEPTH_STENCIL_READ.bits;
        const SHADER_RESOURCE_NON_PIXEL = 0x40;
        const SHADER_RESOURCE_PIXEL = 0x80;
        const SHADER_RESOURCE = Self::SHADER_RESOURCE_NON_PIXEL.bits | Self::SHADER_RESOURCE_PIXEL.bits;
        const STREAM_OUTPUT = 0x200;
        const COPY_DEST = 0x400;
        const COPY_SOURCE = 0x800;
        const RESOLVE_DEST = 0x1000;
        const RESOLVE_SOURCE = 0x2000;
        const CONSTANT_BUFFER = 0x8000;
        const GENERAL = 0x8000_0000;
        const PRESENT = Self::GENERAL.bits | Self::RENDER_TARGET.bits | Self::COPY_SOURCE.bits;
        const CPU_ACCESS = Self::VERTEX_BUFFER.bits | Self::INDEX_BUFFER.bits
            | Self::SHADER_RESOURCE.bits | Self::STREAM_OUTPUT.bits | Self::COPY_SOURCE.bits;
    }
}
impl_bitflags_serde!(ResourceUsage);

impl Default for ResourceUsage {
    fn default() -> Self {
        Self::empty()
    }
}

bitflags! {
    /// The individual programmable shader stages.
    pub struct ShaderStages: u32 {
        const VERTEX = 0x1;
        const HULL = 0x2;
        const DOMAIN = 0x4;
        const GEOMETRY = 0x8;
        const PIXEL = 0x10;
        const COMPUTE = 0x20;
        const ALL_GRAPHICS = Self::VERTEX.bits | Self::HULL.bits | Self::DOMAIN.bits
            | Self::GEOMETRY.bits | Self::PIXEL.bits;
        const ALL = Self::ALL_GRAPHICS.bits | Self::COMPUTE.bits;
    }
}
impl_bitflags_serde!(ShaderStages);

bitflags! {
    /// Pipeline stages a `bind_pipeline` call can update.
    ///
    /// Backends with monolithic pipeline objects only accept `ALL_GRAPHICS`
    /// or `COMPUTE`; backends with independently bindable state objects
    /// honor individual bits.
    pub struct PipelineStages: u32 {
        const INPUT_ASSEMBLER = 0x4;
        const VERTEX_SHADER = 0x8;
        const HULL_SHADER = 0x10;
        const DOMAIN_SHADER = 0x20;
        const GEOMETRY_SHADER = 0x40;
        const PIXEL_SHADER = 0x80;
        const RASTERIZER = 0x100;
        const DEPTH_STENCIL = 0x200;
        const OUTPUT_MERGER = 0x400;
        const COMPUTE_SHADER = 0x800;
        const STREAM_OUTPUT = 0x1000;
        const ALL_GRAPHICS = Self::INPUT_ASSEMBLER.bits | Self::VERTEX_SHADER.bits
            | Self::HULL_SHADER.bits | Self::DOMAIN_SHADER.bits | Self::GEOMETRY_SHADER.bits
            | Self::PIXEL_SHADER.bits | Self::RASTERIZER.bits | Self::DEPTH_STENCIL.bits
            | Self::OUTPUT_MERGER.bits | Self::STREAM_OUTPUT.bits;
        const ALL = Self::ALL_GRAPHICS.bits | Self::COMPUTE_SHADER.bits;
    }
}
impl_bitflags_serde!(PipelineStages);

bitflags! {
    /// Per-channel write mask of a render target.
    pub struct ColorWriteMask: u32 {
        const RED = 0x1;
        const GREEN = 0x2;
        const BLUE = 0x4;
        const ALPHA = 0x8;
        const ALL = Self::RED.bits | Self::GREEN.bits | Self::BLUE.bits | Self::ALPHA.bits;
    }
}
impl_bitflags_serde!(ColorWriteMask);

impl Default for ColorWriteMask {
    fn default() -> Self {
        Self::ALL
    }
}

bitflags! {
    /// Flags controlling fence creation.
    pub struct FenceFlags: u32 {
        const SHARED = 1 << 0;
        const SHARED_NT_HANDLE = 1 << 1;
    }
}
impl_bitflags_serde!(FenceFlags);

/// The available query kinds.
///
/// Pools are created for exactly one kind and every member query is
/// constructed eagerly, so begin/end/copy at record time never allocate.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QueryType {
    Occlusion = 0,
    BinaryOcclusion = 1,
    Timestamp = 2,
    PipelineStatistics = 3,
    StreamOutputStatistics0 = 4,
    StreamOutputStatistics1 = 5,
    StreamOutputStatistics2 = 6,
    StreamOutputStatistics3 = 7,
    AccelerationStructureSize = 8,
    AccelerationStructureCompactedSize = 9,
}

/// The kinds of indirect commands `draw_or_dispatch_indirect` can execute.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IndirectCommand {
    Unknown = 0,
    Draw,
    DrawIndexed,
    Dispatch,
}

bitflags! {
    /// The command kinds a queue can execute.
    pub struct QueueType: u32 {
        const GRAPHICS = 0x1;
        const COMPUTE = 0x2;
        const COPY = 0x4;
    }
}
impl_bitflags_serde!(QueueType);

/// Color space of a presentation surface or output.
#[repr(u32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColorSpace {
    #[default]
    Unknown = 0,
    SrgbNonLinear,
    ExtendedSrgbLinear,
    Hdr10St2084,
    Hdr10Hlg,
}

/// The comparison functions, compatible with Vulkan's numbering.
///
/// The Direct3D equivalent differs from these values by a constant +1.
#[repr(u32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompareOp {
    Never = 0,
    Less = 1,
    Equal = 2,
    LessEqual = 3,
    Greater = 4,
    NotEqual = 5,
    GreaterEqual = 6,
    #[default]
    Always = 7,
}

impl CompareOp {
    pub const fn from_u32(value: u32) -> Self {
        match value {
            0 => Self::Never,
            1 => Self::Less,
            2 => Self::Equal,
            3 => Self::LessEqual,
            4 => Self::Greater,
            5 => Self::NotEqual,
            6 => Self::GreaterEqual,
            _ => Self::Always,
        }
    }
}

/// Blend equation operators. The Direct3D equivalent is these values +1.
#[repr(u32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlendOp {
    #[default]
    Add = 0,
    Subtract = 1,
    ReverseSubtract = 2,
    Min = 3,
    Max = 4,
}

impl BlendOp {
    pub const fn from_u32(value: u32) -> Self {
        match value {
            1 => Self::Subtract,
            2 => Self::ReverseSubtract,
            3 => Self::Min,
            4 => Self::Max,
            _ => Self::Add,
        }
    }
}

/// Stencil operations. The Direct3D equivalent is these values +1.
#[repr(u32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StencilOp {
    #[default]
    Keep = 0,
    Zero = 1,
    Replace = 2,
    IncrementSaturate = 3,
    DecrementSaturate = 4,
    Invert = 5,
    Increment = 6,
    Decrement = 7,
}

impl StencilOp {
    pub const fn from_u32(value: u32) -> Self {
        match value {
            1 => Self::Zero,
            2 => Self::Replace,
            3 => Self::IncrementSaturate,
            4 => Self::DecrementSaturate,
            5 => Self::Invert,
            6 => Self::Increment,
            7 => Self::Decrement,
            _ => Self::Keep,
        }
    }
}

/// Face culling modes. The Direct3D equivalent of the first three is these
/// values +1; `FrontAndBack` has no Direct3D representation.
#[repr(u32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CullMode {
    None = 0,
    Front = 1,
    #[default]
    Back = 2,
    FrontAndBack = 3,
}

impl CullMode {
    pub const fn from_u32(value: u32) -> Self {
        match value {
            1 => Self::Front,
            2 => Self::Back,
            3 => Self::FrontAndBack,
            _ => Self::None,
        }
    }
}

/// Polygon rasterization modes.
#[repr(u32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FillMode {
    #[default]
    Solid = 0,
    Wireframe = 1,
    Point = 2,
}

/// Blend factors. Not an arithmetic relation to any native API.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlendFactor {
    Zero = 0,
    One = 1,
    SourceColor = 2,
    OneMinusSourceColor = 3,
    DestColor = 4,
    OneMinusDestColor = 5,
    SourceAlpha = 6,
    OneMinusSourceAlpha = 7,
    DestAlpha = 8,
    OneMinusDestAlpha = 9,
    ConstantColor = 10,
    OneMinusConstantColor = 11,
    SourceAlphaSaturate = 12,
    Source1Color = 13,
    OneMinusSource1Color = 14,
    Source1Alpha = 15,
    OneMinusSource1Alpha = 16,
}

/// Logic operations available in the blend state, matching D3D numbering.
#[repr(u32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LogicOp {
    Clear = 0,
    Set = 1,
    Copy = 2,
    CopyInverted = 3,
    #[default]
    Noop = 4,
    Invert = 5,
    And = 6,
    Nand = 7,
    Or = 8,
    Nor = 9,
    Xor = 10,
    Equivalent = 11,
    AndReverse = 12,
    AndInverted = 13,
    OrReverse = 14,
    OrInverted = 15,
}

impl LogicOp {
    pub const fn from_u32(value: u32) -> Self {
        match value {
            0 => Self::Clear,
            1 => Self::Set,
            2 => Self::Copy,
            3 => Self::CopyInverted,
            5 => Self::Invert,
            6 => Self::And,
            7 => Self::Nand,
            8 => Self::Or,
            9 => Self::Nor,
            10 => Self::Xor,
            11 => Self::Equivalent,
            12 => Self::AndReverse,
            13 => Self::AndInverted,
            14 => Self::OrReverse,
            15 => Self::OrInverted,
            _ => Self::Noop,
        }
    }
}

/// Combined min/mag/mip filtering modes, matching D3D numbering.
#[repr(u32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FilterMode {
    #[default]
    MinMagMipPoint = 0,
    MinMagPointMipLinear = 0x1,
    MinPointMagLinearMipPoint = 0x4,
    MinPointMagMipLinear = 0x5,
    MinLinearMagMipPoint = 0x10,
    MinLinearMagPointMipLinear = 0x11,
    MinMagLinearMipPoint = 0x14,
    MinMagMipLinear = 0x15,
    Anisotropic = 0x55,
    CompareMinMagMipPoint = 0x80,
    CompareMinMagPointMipLinear = 0x81,
    CompareMinPointMagLinearMipPoint = 0x84,
    CompareMinPointMagMipLinear = 0x85,
    CompareMinLinearMagMipPoint = 0x90,
    CompareMinLinearMagPointMipLinear = 0x91,
    CompareMinMagLinearMipPoint = 0x94,
    CompareMinMagMipLinear = 0x95,
    CompareAnisotropic = 0xd5,
}

impl FilterMode {
    /// Whether this is one of the comparison filtering modes.
    pub const fn has_compare(self) -> bool {
        (self as u32) & 0x80 != 0
    }

    pub const fn from_u32(value: u32) -> Self {
        match value {
            0x1 => Self::MinMagPointMipLinear,
            0x4 => Self::MinPointMagLinearMipPoint,
            0x5 => Self::MinPointMagMipLinear,
            0x10 => Self::MinLinearMagMipPoint,
            0x11 => Self::MinLinearMagPointMipLinear,
            0x14 => Self::MinMagLinearMipPoint,
            0x15 => Self::MinMagMipLinear,
            0x55 => Self::Anisotropic,
            0x80 => Self::CompareMinMagMipPoint,
            0x81 => Self::CompareMinMagPointMipLinear,
            0x84 => Self::CompareMinPointMagLinearMipPoint,
            0x85 => Self::CompareMinPointMagMipLinear,
            0x90 => Self::CompareMinLinearMagMipPoint,
            0x91 => Self::CompareMinLinearMagPointMipLinear,
            0x94 => Self::CompareMinMagLinearMipPoint,
            0x95 => Self::CompareMinMagMipLinear,
            0xd5 => Self::CompareAnisotropic,
            _ => Self::MinMagMipPoint,
        }
    }
}

/// Sampling behavior for texture coordinates outside the resource,
/// matching D3D numbering.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextureAddressMode {
    Wrap = 1,
    Mirror = 2,
    Clamp = 3,
    Border = 4,
    MirrorOnce = 5,
}

impl Default for TextureAddressMode {
    fn default() -> Self {
        Self::Clamp
    }
}

impl TextureAddressMode {
    pub const fn from_u32(value: u32) -> Self {
        match value {
            1 => Self::Wrap,
            2 => Self::Mirror,
            4 => Self::Border,
            5 => Self::MirrorOnce,
            _ => Self::Clamp,
        }
    }
}

/// Primitive topologies, matching D3D numbering (patch lists start at 33).
#[repr(u32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrimitiveTopology {
    #[default]
    Undefined = 0,
    PointList = 1,
    LineList = 2,
    LineStrip = 3,
    TriangleList = 4,
    TriangleStrip = 5,
    TriangleFan = 6,
    LineListAdjacent = 10,
    LineStripAdjacent = 11,
    TriangleListAdjacent = 12,
    TriangleStripAdjacent = 13,
    PatchList01 = 33,
    PatchList02 = 34,
    PatchList03 = 35,
    PatchList04 = 36,
    PatchList05 = 37,
    PatchList06 = 38,
    PatchList07 = 39,
    PatchList08 = 40,
    PatchList09 = 41,
    PatchList10 = 42,
    PatchList11 = 43,
    PatchList12 = 44,
    PatchList13 = 45,
    PatchList14 = 46,
    PatchList15 = 47,
    PatchList16 = 48,
    PatchList17 = 49,
    PatchList18 = 50,
    PatchList19 = 51,
    PatchList20 = 52,
    PatchList21 = 53,
    PatchList22 = 54,
    PatchList23 = 55,
    PatchList24 = 56,
    PatchList25 = 57,
    PatchList26 = 58,
    PatchList27 = 59,
    PatchList28 = 60,
    PatchList29 = 61,
    PatchList30 = 62,
    PatchList31 = 63,
    PatchList32 = 64,
}

impl PrimitiveTopology {
    pub const fn from_u32(value: u32) -> Self {
        match value {
            1 => Self::PointList,
            2 => Self::LineList,
            3 => Self::LineStrip,
            4 => Self::TriangleList,
            5 => Self::TriangleStrip,
            6 => Self::TriangleFan,
            10 => Self::LineListAdjacent,
            11 => Self::LineStripAdjacent,
            12 => Self::TriangleListAdjacent,
            13 => Self::TriangleStripAdjacent,
            33 => Self::PatchList01,
            34 => Self::PatchList02,
            35 => Self::PatchList03,
            36 => Self::PatchList04,
            37 => Self::PatchList05,
            38 => Self::PatchList06,
            39 => Self::PatchList07,
            40 => Self::PatchList08,
            41 => Self::PatchList09,
            42 => Self::PatchList10,
            43 => Self::PatchList11,
            44 => Self::PatchList12,
            45 => Self::PatchList13,
            46 => Self::PatchList14,
            47 => Self::PatchList15,
            48 => Self::PatchList16,
            49 => Self::PatchList17,
            50 => Self::PatchList18,
            51 => Self::PatchList19,
            52 => Self::PatchList20,
            53 => Self::PatchList21,
            54 => Self::PatchList22,
            55 => Self::PatchList23,
            56 => Self::PatchList24,
            57 => Self::PatchList25,
            58 => Self::PatchList26,
            59 => Self::PatchList27,
            60 => Self::PatchList28,
            61 => Self::PatchList29,
            62 => Self::PatchList30,
            63 => Self::PatchList31,
            64 => Self::PatchList32,
            _ => Self::Undefined,
        }
    }
}

/// Pipeline states that can be updated dynamically on the command list,
/// provided the bound pipeline listed them in its dynamic-state list.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DynamicState {
    Unknown = 0,
    PrimitiveTopology,
    BlendConstant,
    StencilReference,
    SampleMask,
    AlphaToCoverageEnable,
    BlendEnable,
    LogicOpEnable,
    ColorBlendOp,
    SourceColorBlendFactor,
    DestColorBlendFactor,
    FillMode,
    CullMode,
    FrontCounterClockwise,
    DepthBias,
    DepthBiasClamp,
    DepthBiasSlopeScaled,
    DepthClipEnable,
    ScissorEnable,
    DepthEnable,
    DepthWriteMask,
    DepthFunc,
    StencilEnable,
    StencilReadMask,
    StencilWriteMask,
}

/// The resource dimensionalities.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextureType {
    D1 = 1,
    D2 = 2,
    D3 = 3,
}

/// The shape of a resource: a linear buffer or a 1/2/3-dimensional texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResourceDim {
    Buffer {
        /// Size of the buffer in bytes.
        size: u64,
    },
    Texture {
        ty: TextureType,
        width: u32,
        /// Height in texels for 2D/3D textures, otherwise 1.
        height: u32,
        /// Depth for 3D textures, otherwise number of array layers.
        depth_or_layers: u16,
        /// Number of mipmap levels including the base level, at least 1.
        levels: u16,
        format: Format,
        /// Samples per texel; above 1 means multisampling.
        samples: u16,
    },
}

/// Describes a resource.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceDesc {
    pub dim: ResourceDim,
    pub heap: MemoryHeap,
    pub usage: ResourceUsage,
    pub flags: ResourceFlags,
}

impl ResourceDesc {
    pub fn buffer(size: u64, heap: MemoryHeap, usage: ResourceUsage) -> Self {
        Self {
            dim: ResourceDim::Buffer { size },
            heap,
            usage,
            flags: ResourceFlags::empty(),
        }
    }

    pub fn tex_2d(
        width: u32,
        height: u32,
        layers: u16,
        levels: u16,
        format: Format,
        samples: u16,
        heap: MemoryHeap,
        usage: ResourceUsage,
    ) -> Self {
        Self {
            dim: ResourceDim::Texture {
                ty: TextureType::D2,
                width,
                height,
                depth_or_layers: layers,
                levels,
                format,
                samples,
            },
            heap,
            usage,
            flags: ResourceFlags::empty(),
        }
    }

    pub const fn is_buffer(&self) -> bool {
        matches!(self.dim, ResourceDim::Buffer { .. })
    }

    /// Format of the texture, or `Format::Unknown` for buffers.
    pub const fn format(&self) -> Format {
        match self.dim {
            ResourceDim::Texture { format, .. } => format,
            ResourceDim::Buffer { .. } => Format::Unknown,
        }
    }
}

/// The view dimensionalities a texture view can take.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextureViewType {
    Texture1D = 2,
    Texture1DArray = 3,
    Texture2D = 4,
    Texture2DArray = 5,
    Texture2DMultisample = 6,
    Texture2DMultisampleArray = 7,
    Texture3D = 8,
    TextureCube = 9,
    TextureCubeArray = 10,
}

/// Describes a typed sub-range view into a resource.
///
/// The view format must never be a typeless variant; resolve it to a
/// concrete typed format before creating the view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResourceViewDesc {
    Buffer {
        format: Format,
        /// Offset from the start of the buffer, in bytes.
        offset: u64,
        /// Number of bytes this view covers, or `WHOLE_SIZE`.
        size: u64,
    },
    Texture {
        ty: TextureViewType,
        format: Format,
        first_level: u32,
        /// Number of mipmap levels, or `ALL_LEVELS`.
        levels: u32,
        first_layer: u32,
        /// Number of array layers, or `ALL_LAYERS`.
        layers: u32,
    },
}

impl ResourceViewDesc {
    /// A view of the first level and layer of a 2D texture.
    pub const fn tex_2d(format: Format) -> Self {
        Self::Texture {
            ty: TextureViewType::Texture2D,
            format,
            first_level: 0,
            levels: 1,
            first_layer: 0,
            layers: 1,
        }
    }

    pub const fn format(&self) -> Format {
        match *self {
            Self::Buffer { format, .. } => format,
            Self::Texture { format, .. } => format,
        }
    }
}

/// Describes a sampler state.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SamplerDesc {
    pub filter: FilterMode,
    pub address_u: TextureAddressMode,
    pub address_v: TextureAddressMode,
    pub address_w: TextureAddressMode,
    pub mip_lod_bias: f32,
    pub max_anisotropy: f32,
    pub compare_op: CompareOp,
    pub min_lod: f32,
    pub max_lod: f32,
    pub border_color: [f32; 4],
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self {
            filter: FilterMode::MinMagMipLinear,
            address_u: TextureAddressMode::Clamp,
            address_v: TextureAddressMode::Clamp,
            address_w: TextureAddressMode::Clamp,
            mip_lod_bias: 0.0,
            max_anisotropy: 1.0,
            compare_op: CompareOp::Always,
            min_lod: -f32::MAX,
            max_lod: f32::MAX,
            border_color: [0.0; 4],
        }
    }
}

/// Data for initializing a subresource, or a view of mapped subresource
/// memory.
#[derive(Clone, Copy, Debug)]
pub struct SubresourceData {
    /// Pointer to the start of the data.
    pub data: *mut u8,
    /// Bytes to advance between texture rows (unused for buffers).
    pub row_pitch: u32,
    /// Bytes to advance between depth/array slices.
    pub slice_pitch: u32,
}

impl SubresourceData {
    pub const fn empty() -> Self {
        Self {
            data: std::ptr::null_mut(),
            row_pitch: 0,
            slice_pitch: 0,
        }
    }
}

/// A 3D box describing a texture region, in texels. `right`, `bottom` and
/// `back` are exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubresourceBox {
    pub left: u32,
    pub top: u32,
    pub front: u32,
    pub right: u32,
    pub bottom: u32,
    pub back: u32,
}

impl SubresourceBox {
    pub const fn width(&self) -> u32 {
        self.right - self.left
    }
    pub const fn height(&self) -> u32 {
        self.bottom - self.top
    }
    pub const fn depth(&self) -> u32 {
        self.back - self.front
    }
}

/// A 2D rectangle in pixels, with exclusive right/bottom.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn width(&self) -> i32 {
        self.right - self.left
    }
    pub const fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// A rasterizer viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

/// Blend state of a single render target.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderTargetBlend {
    pub blend_enable: bool,
    pub logic_op_enable: bool,
    pub source_color_blend_factor: BlendFactor,
    pub dest_color_blend_factor: BlendFactor,
    pub color_blend_op: BlendOp,
    pub source_alpha_blend_factor: BlendFactor,
    pub dest_alpha_blend_factor: BlendFactor,
    pub alpha_blend_op: BlendOp,
    pub logic_op: LogicOp,
    pub write_mask: ColorWriteMask,
}

impl Default for RenderTargetBlend {
    /// The documented default state: blending disabled, source factor one,
    /// destination factor zero, add operation, all channels written.
    fn default() -> Self {
        Self {
            blend_enable: false,
            logic_op_enable: false,
            source_color_blend_factor: BlendFactor::One,
            dest_color_blend_factor: BlendFactor::Zero,
            color_blend_op: BlendOp::Add,
            source_alpha_blend_factor: BlendFactor::One,
            dest_alpha_blend_factor: BlendFactor::Zero,
            alpha_blend_op: BlendOp::Add,
            logic_op: LogicOp::Noop,
            write_mask: ColorWriteMask::ALL,
        }
    }
}

/// Maximum number of simultaneously bound render targets.
pub const MAX_RENDER_TARGETS: usize = 8;

/// Describes the blend state of a pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlendDesc {
    pub alpha_to_coverage_enable: bool,
    pub independent_blend_enable: bool,
    pub targets: [RenderTargetBlend; MAX_RENDER_TARGETS],
    pub blend_constant: [f32; 4],
}

/// Describes the rasterizer state of a pipeline.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RasterizerDesc {
    pub fill_mode: FillMode,
    pub cull_mode: CullMode,
    pub front_counter_clockwise: bool,
    pub depth_bias: f32,
    pub depth_bias_clamp: f32,
    pub slope_scaled_depth_bias: f32,
    pub depth_clip_enable: bool,
    pub scissor_enable: bool,
    pub multisample_enable: bool,
    pub antialiased_line_enable: bool,
    pub conservative_rasterization: bool,
}

impl Default for RasterizerDesc {
    /// The documented default state: solid fill, back-face culling, depth
    /// clipping enabled.
    fn default() -> Self {
        Self {
            fill_mode: FillMode::Solid,
            cull_mode: CullMode::Back,
            front_counter_clockwise: false,
            depth_bias: 0.0,
            depth_bias_clamp: 0.0,
            slope_scaled_depth_bias: 0.0,
            depth_clip_enable: true,
            scissor_enable: false,
            multisample_enable: false,
            antialiased_line_enable: false,
            conservative_rasterization: false,
        }
    }
}

/// Stencil state of one face.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StencilFaceDesc {
    pub fail_op: StencilOp,
    pub depth_fail_op: StencilOp,
    pub pass_op: StencilOp,
    pub func: CompareOp,
}

impl Default for StencilFaceDesc {
    fn default() -> Self {
        Self {
            fail_op: StencilOp::Keep,
            depth_fail_op: StencilOp::Keep,
            pass_op: StencilOp::Keep,
            func: CompareOp::Always,
        }
    }
}

/// Describes the depth-stencil state of a pipeline.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DepthStencilDesc {
    pub depth_enable: bool,
    pub depth_write_enable: bool,
    pub depth_func: CompareOp,
    pub stencil_enable: bool,
    pub stencil_read_mask: u8,
    pub stencil_write_mask: u8,
    pub stencil_reference: u8,
    pub front: StencilFaceDesc,
    pub back: StencilFaceDesc,
}

impl Default for DepthStencilDesc {
    /// The documented default state: depth test enabled with less
    /// comparison and writes on, stencil disabled with full masks.
    fn default() -> Self {
        Self {
            depth_enable: true,
            depth_write_enable: true,
            depth_func: CompareOp::Less,
            stencil_enable: false,
            stencil_read_mask: 0xff,
            stencil_write_mask: 0xff,
            stencil_reference: 0,
            front: StencilFaceDesc::default(),
            back: StencilFaceDesc::default(),
        }
    }
}

/// Per-element vertex input classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InputStepRate {
    PerVertex,
    /// Advance once per this many instances.
    PerInstance(u32),
}

/// One element of the vertex input layout.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InputElement {
    pub semantic: String,
    pub semantic_index: u32,
    pub format: Format,
    pub buffer_binding: u32,
    /// Byte offset in the vertex buffer, or `!0` to append after the
    /// previous element.
    pub offset: u32,
    pub stride: u32,
    pub step: InputStepRate,
}

/// Shader bytecode for one pipeline stage.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShaderDesc {
    pub code: Vec<u8>,
    /// Entry point name, for backends that compile from source.
    pub entry_point: String,
}

/// Describes a pipeline state object.
///
/// Stages that are `None` are absent; a description with only `compute`
/// set describes a compute pipeline. Backends with independently bindable
/// state objects may also accept partial descriptions (a single stage or a
/// single fixed-function block).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PipelineDesc {
    pub layout: PipelineLayout,
    pub vertex: Option<ShaderDesc>,
    pub hull: Option<ShaderDesc>,
    pub domain: Option<ShaderDesc>,
    pub geometry: Option<ShaderDesc>,
    pub pixel: Option<ShaderDesc>,
    pub compute: Option<ShaderDesc>,
    pub input_layout: Vec<InputElement>,
    pub blend: Option<BlendDesc>,
    pub rasterizer: Option<RasterizerDesc>,
    pub depth_stencil: Option<DepthStencilDesc>,
    pub topology: PrimitiveTopology,
    pub sample_mask: u32,
    pub sample_count: u16,
    pub viewport_count: u16,
    pub dynamic_states: Vec<DynamicState>,
}

impl PipelineDesc {
    pub fn is_compute(&self) -> bool {
        self.compute.is_some()
    }
}

/// The descriptor kinds a binding can hold.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DescriptorType {
    Sampler = 0,
    SamplerWithResourceView = 1,
    ShaderResourceView = 2,
    UnorderedAccessView = 3,
    ConstantBuffer = 4,
}

impl DescriptorType {
    /// Number of 64-bit payload words one descriptor of this type occupies
    /// in a descriptor table.
    pub const fn slot_width(self) -> usize {
        match self {
            Self::Sampler | Self::ShaderResourceView | Self::UnorderedAccessView => 1,
            Self::SamplerWithResourceView => 2,
            // Buffer handle plus byte offset plus byte size.
            Self::ConstantBuffer => 3,
        }
    }
}

/// A sub-range of a buffer bound as a constant buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BufferRange {
    pub buffer: Resource,
    pub offset: u64,
    /// Number of bytes, or `WHOLE_SIZE`.
    pub size: u64,
}

impl BufferRange {
    pub const NULL: Self = Self {
        buffer: Resource::NULL,
        offset: 0,
        size: WHOLE_SIZE,
    };
}

/// A contiguous range of descriptors in a pipeline layout parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DescriptorRange {
    /// First binding index this range maps in the layout.
    pub binding: u32,
    /// Native shader register index of the first descriptor.
    pub dx_register_index: u32,
    /// Native shader register space.
    pub dx_register_space: u32,
    /// Number of descriptors in the range, or `!0` for unbounded.
    pub count: u32,
    /// Size of each array binding in the range; merged layouts require 1.
    pub array_size: u32,
    pub ty: DescriptorType,
    pub visibility: ShaderStages,
}

/// A range of 32-bit constants in a pipeline layout parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstantRange {
    pub binding: u32,
    pub dx_register_index: u32,
    pub dx_register_space: u32,
    /// Number of 32-bit values.
    pub count: u32,
    pub visibility: ShaderStages,
}

/// One parameter of a pipeline layout.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PipelineLayoutParam {
    /// Root/push constants written directly into the command stream.
    PushConstants(ConstantRange),
    /// A single descriptor range updated through `push_descriptors`.
    PushDescriptors(DescriptorRange),
    /// A bindable descriptor table built from one or more ranges.
    DescriptorTable { ranges: Vec<DescriptorRange> },
}

/// The concrete descriptors written by a table update or push.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DescriptorData {
    Samplers(Vec<Sampler>),
    SamplerWithResourceViews(Vec<(Sampler, ResourceView)>),
    ShaderResourceViews(Vec<ResourceView>),
    UnorderedAccessViews(Vec<ResourceView>),
    ConstantBuffers(Vec<BufferRange>),
}

impl DescriptorData {
    pub const fn ty(&self) -> DescriptorType {
        match *self {
            Self::Samplers(_) => DescriptorType::Sampler,
            Self::SamplerWithResourceViews(_) => DescriptorType::SamplerWithResourceView,
            Self::ShaderResourceViews(_) => DescriptorType::ShaderResourceView,
            Self::UnorderedAccessViews(_) => DescriptorType::UnorderedAccessView,
            Self::ConstantBuffers(_) => DescriptorType::ConstantBuffer,
        }
    }

    pub fn len(&self) -> usize {
        match *self {
            Self::Samplers(ref v) => v.len(),
            Self::SamplerWithResourceViews(ref v) => v.len(),
            Self::ShaderResourceViews(ref v) => v.len(),
            Self::UnorderedAccessViews(ref v) => v.len(),
            Self::ConstantBuffers(ref v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An update writing descriptors into a table.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DescriptorTableUpdate {
    /// Table to update. Ignored by `push_descriptors`.
    pub table: DescriptorTable,
    pub binding: u32,
    pub array_offset: u32,
    pub descriptors: DescriptorData,
}

/// A copy of descriptors between two tables.
///
/// Source and destination ranges must hold the same descriptor type; a
/// copy never crosses a type boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DescriptorTableCopy {
    pub source_table: DescriptorTable,
    pub source_binding: u32,
    pub source_array_offset: u32,
    pub dest_table: DescriptorTable,
    pub dest_binding: u32,
    pub dest_array_offset: u32,
    pub count: u32,
}

/// Describes a render target attachment of a render pass.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderPassRenderTargetDesc {
    pub view: ResourceView,
    pub load_clear: Option<[f32; 4]>,
}

/// Describes the depth-stencil attachment of a render pass.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderPassDepthStencilDesc {
    pub view: ResourceView,
    pub clear_depth: Option<f32>,
    pub clear_stencil: Option<u8>,
}

/// Describes a swap chain and its back buffers.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SwapchainDesc {
    /// Description shared by all back buffer resources.
    pub back_buffer: ResourceDesc,
    pub buffer_count: u32,
    /// Native present mode / swap effect value.
    pub present_mode: u32,
    /// Native swap chain creation flags.
    pub present_flags: u32,
    pub fullscreen: bool,
    pub refresh_rate: Rational,
}

/// An exact rational number, used for refresh rates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rational {
    pub numerator: u32,
    pub denominator: u32,
}

impl Rational {
    pub fn as_f32(self) -> f32 {
        if self.denominator == 0 {
            0.0
        } else {
            self.numerator as f32 / self.denominator as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_handles_are_zero() {
        assert_eq!(Resource::NULL.get(), 0);
        assert!(ResourceView::default().is_null());
        assert!(!Pipeline(2).is_null());
    }

    #[test]
    fn stable_usage_bits() {
        // These values are wire contract and must never change.
        assert_eq!(ResourceUsage::VERTEX_BUFFER.bits(), 0x1);
        assert_eq!(ResourceUsage::INDEX_BUFFER.bits(), 0x2);
        assert_eq!(ResourceUsage::RENDER_TARGET.bits(), 0x4);
        assert_eq!(ResourceUsage::UNORDERED_ACCESS.bits(), 0x8);
        assert_eq!(ResourceUsage::DEPTH_STENCIL.bits(), 0x30);
        assert_eq!(ResourceUsage::SHADER_RESOURCE.bits(), 0xC0);
        assert_eq!(ResourceUsage::COPY_DEST.bits(), 0x400);
        assert_eq!(ResourceUsage::COPY_SOURCE.bits(), 0x800);
        assert_eq!(ResourceUsage::CONSTANT_BUFFER.bits(), 0x8000);
        assert_eq!(
            ResourceUsage::PRESENT.bits(),
            0x8000_0000 | 0x4 | 0x800
        );
    }

    #[test]
    fn descriptor_slot_widths() {
        assert_eq!(DescriptorType::Sampler.slot_width(), 1);
        assert_eq!(DescriptorType::ShaderResourceView.slot_width(), 1);
        assert_eq!(DescriptorType::UnorderedAccessView.slot_width(), 1);
        assert_eq!(DescriptorType::SamplerWithResourceView.slot_width(), 2);
        assert_eq!(DescriptorType::ConstantBuffer.slot_width(), 3);
    }

    #[test]
    fn enum_from_u32_round_trips() {
        for v in 0..8 {
            assert_eq!(CompareOp::from_u32(v) as u32, v);
            assert_eq!(StencilOp::from_u32(v) as u32, v);
        }
        for v in 0..5 {
            assert_eq!(BlendOp::from_u32(v) as u32, v);
        }
    }

    #[test]
    fn default_states_match_documented_values() {
        let blend = RenderTargetBlend::default();
        assert!(!blend.blend_enable);
        assert_eq!(blend.source_color_blend_factor, BlendFactor::One);
        assert_eq!(blend.dest_color_blend_factor, BlendFactor::Zero);
        assert_eq!(blend.color_blend_op, BlendOp::Add);

        let raster = RasterizerDesc::default();
        assert_eq!(raster.fill_mode, FillMode::Solid);
        assert_eq!(raster.cull_mode, CullMode::Back);
        assert!(raster.depth_clip_enable);

        let ds = DepthStencilDesc::default();
        assert!(ds.depth_enable);
        assert!(ds.depth_write_enable);
        assert_eq!(ds.depth_func, CompareOp::Less);
        assert_eq!(ds.stencil_read_mask, 0xff);
    }
}

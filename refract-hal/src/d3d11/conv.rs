//! Bidirectional conversion between the unified model and the Direct3D
//! 11 structures. Everything in here is a pure function of its inputs.
//!
//! The operator enums (blend op, comparison, stencil op, cull mode) sit
//! at a constant +1 offset from their D3D11 counterparts, so those
//! conversions are the arithmetic relation rather than a table. Memory
//! heap classes encode jointly into the `Usage`/`CPUAccessFlags` pair.
//!
//! The `..._1` view description variants carry a `PlaneSlice` field the
//! unified model does not represent; converting from those keeps every
//! other field intact and drops the plane slice (the loss is permanent
//! and deliberate, not silent truncation of neighbouring fields).

use winapi::shared::minwindef::{BOOL, UINT};
use winapi::um::{d3d11, d3d11_1, d3d11_3, d3dcommon};

pub use crate::auxil::dxgi::conv::{map_format, unmap_format};

// ---------------------------------------------------------------------
// Operator enums: pure arithmetic relations.

pub fn map_blend_op(value: api::BlendOp) -> d3d11::D3D11_BLEND_OP {
    value as u32 + 1
}

pub fn unmap_blend_op(value: d3d11::D3D11_BLEND_OP) -> api::BlendOp {
    api::BlendOp::from_u32(value.wrapping_sub(1))
}

pub fn map_compare_op(value: api::CompareOp) -> d3d11::D3D11_COMPARISON_FUNC {
    value as u32 + 1
}

pub fn unmap_compare_op(value: d3d11::D3D11_COMPARISON_FUNC) -> api::CompareOp {
    api::CompareOp::from_u32(value.wrapping_sub(1))
}

pub fn map_stencil_op(value: api::StencilOp) -> d3d11::D3D11_STENCIL_OP {
    value as u32 + 1
}

pub fn unmap_stencil_op(value: d3d11::D3D11_STENCIL_OP) -> api::StencilOp {
    api::StencilOp::from_u32(value.wrapping_sub(1))
}

pub fn map_cull_mode(value: api::CullMode) -> d3d11::D3D11_CULL_MODE {
    // Culling both faces cannot be expressed; the rasterizer state for
    // it must be rejected before getting here.
    debug_assert!(value != api::CullMode::FrontAndBack);
    value as u32 + 1
}

pub fn unmap_cull_mode(value: d3d11::D3D11_CULL_MODE) -> api::CullMode {
    api::CullMode::from_u32(value.wrapping_sub(1))
}

pub fn map_fill_mode(value: api::FillMode) -> d3d11::D3D11_FILL_MODE {
    match value {
        api::FillMode::Wireframe => d3d11::D3D11_FILL_WIREFRAME,
        // Point fill does not exist in D3D11; gated by the fill-mode
        // capability.
        api::FillMode::Solid | api::FillMode::Point => d3d11::D3D11_FILL_SOLID,
    }
}

pub fn unmap_fill_mode(value: d3d11::D3D11_FILL_MODE) -> api::FillMode {
    match value {
        d3d11::D3D11_FILL_WIREFRAME => api::FillMode::Wireframe,
        _ => api::FillMode::Solid,
    }
}

pub fn map_blend_factor(value: api::BlendFactor) -> d3d11::D3D11_BLEND {
    use api::BlendFactor as Bf;
    match value {
        Bf::Zero => d3d11::D3D11_BLEND_ZERO,
        Bf::One => d3d11::D3D11_BLEND_ONE,
        Bf::SourceColor => d3d11::D3D11_BLEND_SRC_COLOR,
        Bf::OneMinusSourceColor => d3d11::D3D11_BLEND_INV_SRC_COLOR,
        Bf::SourceAlpha => d3d11::D3D11_BLEND_SRC_ALPHA,
        Bf::OneMinusSourceAlpha => d3d11::D3D11_BLEND_INV_SRC_ALPHA,
        Bf::DestAlpha => d3d11::D3D11_BLEND_DEST_ALPHA,
        Bf::OneMinusDestAlpha => d3d11::D3D11_BLEND_INV_DEST_ALPHA,
        Bf::DestColor => d3d11::D3D11_BLEND_DEST_COLOR,
        Bf::OneMinusDestColor => d3d11::D3D11_BLEND_INV_DEST_COLOR,
        Bf::SourceAlphaSaturate => d3d11::D3D11_BLEND_SRC_ALPHA_SAT,
        Bf::ConstantColor => d3d11::D3D11_BLEND_BLEND_FACTOR,
        Bf::OneMinusConstantColor => d3d11::D3D11_BLEND_INV_BLEND_FACTOR,
        Bf::Source1Color => d3d11::D3D11_BLEND_SRC1_COLOR,
        Bf::OneMinusSource1Color => d3d11::D3D11_BLEND_INV_SRC1_COLOR,
        Bf::Source1Alpha => d3d11::D3D11_BLEND_SRC1_ALPHA,
        Bf::OneMinusSource1Alpha => d3d11::D3D11_BLEND_INV_SRC1_ALPHA,
    }
}

pub fn unmap_blend_factor(value: d3d11::D3D11_BLEND) -> api::BlendFactor {
    use api::BlendFactor as Bf;
    match value {
        d3d11::D3D11_BLEND_ONE => Bf::One,
        d3d11::D3D11_BLEND_SRC_COLOR => Bf::SourceColor,
        d3d11::D3D11_BLEND_INV_SRC_COLOR => Bf::OneMinusSourceColor,
        d3d11::D3D11_BLEND_SRC_ALPHA => Bf::SourceAlpha,
        d3d11::D3D11_BLEND_INV_SRC_ALPHA => Bf::OneMinusSourceAlpha,
        d3d11::D3D11_BLEND_DEST_ALPHA => Bf::DestAlpha,
        d3d11::D3D11_BLEND_INV_DEST_ALPHA => Bf::OneMinusDestAlpha,
        d3d11::D3D11_BLEND_DEST_COLOR => Bf::DestColor,
        d3d11::D3D11_BLEND_INV_DEST_COLOR => Bf::OneMinusDestColor,
        d3d11::D3D11_BLEND_SRC_ALPHA_SAT => Bf::SourceAlphaSaturate,
        d3d11::D3D11_BLEND_BLEND_FACTOR => Bf::ConstantColor,
        d3d11::D3D11_BLEND_INV_BLEND_FACTOR => Bf::OneMinusConstantColor,
        d3d11::D3D11_BLEND_SRC1_COLOR => Bf::Source1Color,
        d3d11::D3D11_BLEND_INV_SRC1_COLOR => Bf::OneMinusSource1Color,
        d3d11::D3D11_BLEND_SRC1_ALPHA => Bf::Source1Alpha,
        d3d11::D3D11_BLEND_INV_SRC1_ALPHA => Bf::OneMinusSource1Alpha,
        _ => Bf::Zero,
    }
}

pub fn map_topology(value: api::PrimitiveTopology) -> d3dcommon::D3D_PRIMITIVE_TOPOLOGY {
    value as u32
}

pub fn unmap_topology(value: d3dcommon::D3D_PRIMITIVE_TOPOLOGY) -> api::PrimitiveTopology {
    api::PrimitiveTopology::from_u32(value)
}

pub fn map_map_access(value: api::MapAccess) -> d3d11::D3D11_MAP {
    value as u32 + 1
}

// ---------------------------------------------------------------------
// Resource usage / heap codecs.

pub fn map_usage_to_bind_flags(usage: api::ResourceUsage) -> UINT {
    let mut flags = 0;
    if usage.intersects(api::ResourceUsage::VERTEX_BUFFER) {
        flags |= d3d11::D3D11_BIND_VERTEX_BUFFER;
    }
    if usage.intersects(api::ResourceUsage::INDEX_BUFFER) {
        flags |= d3d11::D3D11_BIND_INDEX_BUFFER;
    }
    if usage.intersects(api::ResourceUsage::CONSTANT_BUFFER) {
        flags |= d3d11::D3D11_BIND_CONSTANT_BUFFER;
    }
    if usage.intersects(api::ResourceUsage::SHADER_RESOURCE) {
        flags |= d3d11::D3D11_BIND_SHADER_RESOURCE;
    }
    if usage.intersects(api::ResourceUsage::STREAM_OUTPUT) {
        flags |= d3d11::D3D11_BIND_STREAM_OUTPUT;
    }
    if usage.intersects(api::ResourceUsage::RENDER_TARGET) {
        flags |= d3d11::D3D11_BIND_RENDER_TARGET;
    }
    if usage.intersects(api::ResourceUsage::DEPTH_STENCIL) {
        flags |= d3d11::D3D11_BIND_DEPTH_STENCIL;
    }
    if usage.intersects(api::ResourceUsage::UNORDERED_ACCESS) {
        flags |= d3d11::D3D11_BIND_UNORDERED_ACCESS;
    }
    flags
}

pub fn unmap_bind_flags(flags: UINT) -> api::ResourceUsage {
    let mut usage = api::ResourceUsage::COPY_DEST | api::ResourceUsage::COPY_SOURCE;
    if flags & d3d11::D3D11_BIND_VERTEX_BUFFER != 0 {
        usage |= api::ResourceUsage::VERTEX_BUFFER;
    }
    if flags & d3d11::D3D11_BIND_INDEX_BUFFER != 0 {
        usage |= api::ResourceUsage::INDEX_BUFFER;
    }
    if flags & d3d11::D3D11_BIND_CONSTANT_BUFFER != 0 {
        usage |= api::ResourceUsage::CONSTANT_BUFFER;
    }
    if flags & d3d11::D3D11_BIND_SHADER_RESOURCE != 0 {
        usage |= api::ResourceUsage::SHADER_RESOURCE;
    }
    if flags & d3d11::D3D11_BIND_STREAM_OUTPUT != 0 {
        usage |= api::ResourceUsage::STREAM_OUTPUT;
    }
    if flags & d3d11::D3D11_BIND_RENDER_TARGET != 0 {
        usage |= api::ResourceUsage::RENDER_TARGET | api::ResourceUsage::RESOLVE_DEST;
    }
    if flags & d3d11::D3D11_BIND_DEPTH_STENCIL != 0 {
        usage |= api::ResourceUsage::DEPTH_STENCIL;
    }
    if flags & d3d11::D3D11_BIND_UNORDERED_ACCESS != 0 {
        usage |= api::ResourceUsage::UNORDERED_ACCESS;
    }
    usage
}

/// Encodes the heap class into the `Usage`/`CPUAccessFlags` pair. The
/// two native fields are one logical value; existing contents are only
/// preserved where they already agree with the requested heap.
pub fn map_memory_heap(heap: api::MemoryHeap, usage: &mut d3d11::D3D11_USAGE, cpu_access: &mut UINT) {
    match heap {
        api::MemoryHeap::Unknown | api::MemoryHeap::Custom => {}
        api::MemoryHeap::GpuOnly => {
            if *usage != d3d11::D3D11_USAGE_IMMUTABLE {
                *usage = d3d11::D3D11_USAGE_DEFAULT;
            }
        }
        api::MemoryHeap::CpuToGpu => {
            // Default usage with write access is the "upload" pattern
            // and already matches; anything else becomes dynamic.
            if !(*usage == d3d11::D3D11_USAGE_DEFAULT
                && *cpu_access == d3d11::D3D11_CPU_ACCESS_WRITE)
            {
                *usage = d3d11::D3D11_USAGE_DYNAMIC;
                *cpu_access |= d3d11::D3D11_CPU_ACCESS_WRITE;
            }
        }
        api::MemoryHeap::GpuToCpu => {
            *usage = d3d11::D3D11_USAGE_STAGING;
            *cpu_access |= d3d11::D3D11_CPU_ACCESS_READ;
        }
        api::MemoryHeap::CpuOnly => {
            *usage = d3d11::D3D11_USAGE_STAGING;
            if *cpu_access == 0 {
                *cpu_access = d3d11::D3D11_CPU_ACCESS_READ | d3d11::D3D11_CPU_ACCESS_WRITE;
            }
        }
    }
}

pub fn unmap_memory_heap(usage: d3d11::D3D11_USAGE, cpu_access: UINT) -> api::MemoryHeap {
    match usage {
        d3d11::D3D11_USAGE_DEFAULT if cpu_access == d3d11::D3D11_CPU_ACCESS_WRITE => {
            api::MemoryHeap::CpuToGpu
        }
        d3d11::D3D11_USAGE_DEFAULT | d3d11::D3D11_USAGE_IMMUTABLE => {
            debug_assert!(usage == d3d11::D3D11_USAGE_DEFAULT || cpu_access == 0);
            api::MemoryHeap::GpuOnly
        }
        d3d11::D3D11_USAGE_DYNAMIC => {
            debug_assert_eq!(cpu_access, d3d11::D3D11_CPU_ACCESS_WRITE);
            api::MemoryHeap::CpuToGpu
        }
        d3d11::D3D11_USAGE_STAGING => {
            if cpu_access == d3d11::D3D11_CPU_ACCESS_READ {
                api::MemoryHeap::GpuToCpu
            } else {
                api::MemoryHeap::CpuOnly
            }
        }
        _ => api::MemoryHeap::Unknown,
    }
}

pub fn map_resource_flags(flags: api::ResourceFlags) -> UINT {
    let mut misc = 0;
    if flags.contains(api::ResourceFlags::SHARED) {
        misc |= d3d11::D3D11_RESOURCE_MISC_SHARED;
    }
    if flags.contains(api::ResourceFlags::SHARED_NT_HANDLE) {
        misc |= d3d11::D3D11_RESOURCE_MISC_SHARED_NTHANDLE;
    }
    if flags.contains(api::ResourceFlags::CUBE_COMPATIBLE) {
        misc |= d3d11::D3D11_RESOURCE_MISC_TEXTURECUBE;
    }
    if flags.contains(api::ResourceFlags::GENERATE_MIPMAPS) {
        misc |= d3d11::D3D11_RESOURCE_MISC_GENERATE_MIPS;
    }
    if flags.contains(api::ResourceFlags::SPARSE_BINDING) {
        misc |= d3d11::D3D11_RESOURCE_MISC_TILED;
    }
    misc
}

pub fn unmap_resource_flags(misc: UINT) -> api::ResourceFlags {
    let mut flags = api::ResourceFlags::empty();
    if misc & (d3d11::D3D11_RESOURCE_MISC_SHARED | d3d11::D3D11_RESOURCE_MISC_SHARED_KEYEDMUTEX)
        != 0
    {
        flags |= api::ResourceFlags::SHARED;
    }
    if misc & d3d11::D3D11_RESOURCE_MISC_SHARED_NTHANDLE != 0 {
        flags |= api::ResourceFlags::SHARED | api::ResourceFlags::SHARED_NT_HANDLE;
    }
    if misc & d3d11::D3D11_RESOURCE_MISC_TEXTURECUBE != 0 {
        flags |= api::ResourceFlags::CUBE_COMPATIBLE;
    }
    if misc & d3d11::D3D11_RESOURCE_MISC_GENERATE_MIPS != 0 {
        flags |= api::ResourceFlags::GENERATE_MIPMAPS;
    }
    if misc & d3d11::D3D11_RESOURCE_MISC_TILED != 0 {
        flags |= api::ResourceFlags::SPARSE_BINDING;
    }
    flags
}

/// The format-support bits a usage set requires. Used by
/// `check_format_support`, which fails as soon as one requested bit is
/// missing from the native mask.
pub fn map_usage_to_format_support(usage: api::ResourceUsage) -> UINT {
    let mut support = 0;
    if usage.intersects(api::ResourceUsage::VERTEX_BUFFER) {
        support |= d3d11::D3D11_FORMAT_SUPPORT_IA_VERTEX_BUFFER;
    }
    if usage.intersects(api::ResourceUsage::INDEX_BUFFER) {
        support |= d3d11::D3D11_FORMAT_SUPPORT_IA_INDEX_BUFFER;
    }
    if usage.intersects(api::ResourceUsage::CONSTANT_BUFFER) {
        support |= d3d11::D3D11_FORMAT_SUPPORT_BUFFER;
    }
    if usage.intersects(api::ResourceUsage::DEPTH_STENCIL) {
        support |= d3d11::D3D11_FORMAT_SUPPORT_DEPTH_STENCIL;
    }
    if usage.intersects(api::ResourceUsage::RENDER_TARGET) {
        support |= d3d11::D3D11_FORMAT_SUPPORT_RENDER_TARGET;
    }
    if usage.intersects(api::ResourceUsage::SHADER_RESOURCE) {
        support |= d3d11::D3D11_FORMAT_SUPPORT_SHADER_LOAD | d3d11::D3D11_FORMAT_SUPPORT_SHADER_SAMPLE;
    }
    if usage.intersects(api::ResourceUsage::UNORDERED_ACCESS) {
        support |= d3d11::D3D11_FORMAT_SUPPORT_TYPED_UNORDERED_ACCESS_VIEW;
    }
    if usage.intersects(api::ResourceUsage::RESOLVE_DEST | api::ResourceUsage::RESOLVE_SOURCE) {
        support |= d3d11::D3D11_FORMAT_SUPPORT_MULTISAMPLE_RESOLVE;
    }
    support
}

// ---------------------------------------------------------------------
// Resource descriptions.

fn map_common_desc(
    desc: &api::ResourceDesc,
    usage: &mut d3d11::D3D11_USAGE,
    cpu_access: &mut UINT,
) -> (UINT, UINT) {
    map_memory_heap(desc.heap, usage, cpu_access);
    let mut bind_flags = map_usage_to_bind_flags(desc.usage);
    let misc_flags = map_resource_flags(desc.flags);
    if desc.flags.contains(api::ResourceFlags::GENERATE_MIPMAPS) {
        // Mip generation requires both views on the same resource.
        bind_flags |= d3d11::D3D11_BIND_RENDER_TARGET | d3d11::D3D11_BIND_SHADER_RESOURCE;
    }
    if *usage == d3d11::D3D11_USAGE_STAGING {
        // Staging resources cannot be bound to the pipeline at all.
        bind_flags = 0;
    }
    (bind_flags, misc_flags)
}

pub fn map_buffer_desc(desc: &api::ResourceDesc) -> d3d11::D3D11_BUFFER_DESC {
    let size = match desc.dim {
        api::ResourceDim::Buffer { size } => size,
        api::ResourceDim::Texture { .. } => unreachable!(),
    };
    let mut usage = d3d11::D3D11_USAGE_DEFAULT;
    let mut cpu_access = 0;
    let (bind_flags, misc_flags) = map_common_desc(desc, &mut usage, &mut cpu_access);

    d3d11::D3D11_BUFFER_DESC {
        ByteWidth: size as UINT,
        Usage: usage,
        BindFlags: bind_flags,
        CPUAccessFlags: cpu_access,
        MiscFlags: misc_flags,
        StructureByteStride: 0,
    }
}

pub fn unmap_buffer_desc(internal: &d3d11::D3D11_BUFFER_DESC) -> api::ResourceDesc {
    let mut flags = unmap_resource_flags(internal.MiscFlags);
    if internal.Usage == d3d11::D3D11_USAGE_DYNAMIC {
        flags |= api::ResourceFlags::DYNAMIC;
    }
    api::ResourceDesc {
        dim: api::ResourceDim::Buffer {
            size: internal.ByteWidth as u64,
        },
        heap: unmap_memory_heap(internal.Usage, internal.CPUAccessFlags),
        usage: unmap_bind_flags(internal.BindFlags),
        flags,
    }
}

pub fn map_texture_1d_desc(desc: &api::ResourceDesc) -> d3d11::D3D11_TEXTURE1D_DESC {
    let (width, layers, levels, format) = match desc.dim {
        api::ResourceDim::Texture {
            width,
            depth_or_layers,
            levels,
            format,
            ..
        } => (width, depth_or_layers, levels, format),
        api::ResourceDim::Buffer { .. } => unreachable!(),
    };
    let mut usage = d3d11::D3D11_USAGE_DEFAULT;
    let mut cpu_access = 0;
    let (bind_flags, misc_flags) = map_common_desc(desc, &mut usage, &mut cpu_access);

    d3d11::D3D11_TEXTURE1D_DESC {
        Width: width,
        MipLevels: levels as UINT,
        ArraySize: layers as UINT,
        Format: map_format(format),
        Usage: usage,
        BindFlags: bind_flags,
        CPUAccessFlags: cpu_access,
        MiscFlags: misc_flags,
    }
}

pub fn map_texture_2d_desc(desc: &api::ResourceDesc) -> d3d11::D3D11_TEXTURE2D_DESC {
    let (width, height, layers, levels, format, samples) = match desc.dim {
        api::ResourceDim::Texture {
            width,
            height,
            depth_or_layers,
            levels,
            format,
            samples,
            ..
        } => (width, height, depth_or_layers, levels, format, samples),
        api::ResourceDim::Buffer { .. } => unreachable!(),
    };
    let mut usage = d3d11::D3D11_USAGE_DEFAULT;
    let mut cpu_access = 0;
    let (bind_flags, misc_flags) = map_common_desc(desc, &mut usage, &mut cpu_access);

    d3d11::D3D11_TEXTURE2D_DESC {
        Width: width,
        Height: height,
        MipLevels: levels as UINT,
        ArraySize: layers as UINT,
        Format: map_format(format),
        SampleDesc: winapi::shared::dxgitype::DXGI_SAMPLE_DESC {
            Count: samples as UINT,
            Quality: 0,
        },
        Usage: usage,
        BindFlags: bind_flags,
        CPUAccessFlags: cpu_access,
        MiscFlags: misc_flags,
    }
}

pub fn map_texture_3d_desc(desc: &api::ResourceDesc) -> d3d11::D3D11_TEXTURE3D_DESC {
    let (width, height, depth, levels, format) = match desc.dim {
        api::ResourceDim::Texture {
            width,
            height,
            depth_or_layers,
            levels,
            format,
            ..
        } => (width, height, depth_or_layers, levels, format),
        api::ResourceDim::Buffer { .. } => unreachable!(),
    };
    let mut usage = d3d11::D3D11_USAGE_DEFAULT;
    let mut cpu_access = 0;
    let (bind_flags, misc_flags) = map_common_desc(desc, &mut usage, &mut cpu_access);

    d3d11::D3D11_TEXTURE3D_DESC {
        Width: width,
        Height: height,
        Depth: depth as UINT,
        MipLevels: levels as UINT,
        Format: map_format(format),
        Usage: usage,
        BindFlags: bind_flags,
        CPUAccessFlags: cpu_access,
        MiscFlags: misc_flags,
    }
}

fn unmap_texture_flags(misc: UINT, usage: d3d11::D3D11_USAGE) -> api::ResourceFlags {
    let mut flags = unmap_resource_flags(misc);
    if usage == d3d11::D3D11_USAGE_DYNAMIC {
        flags |= api::ResourceFlags::DYNAMIC;
    }
    flags
}

pub fn unmap_texture_1d_desc(internal: &d3d11::D3D11_TEXTURE1D_DESC) -> api::ResourceDesc {
    api::ResourceDesc {
        dim: api::ResourceDim::Texture {
            ty: api::TextureType::D1,
            width: internal.Width,
            height: 1,
            depth_or_layers: internal.ArraySize as u16,
            levels: internal.MipLevels as u16,
            format: unmap_format(internal.Format),
            samples: 1,
        },
        heap: unmap_memory_heap(internal.Usage, internal.CPUAccessFlags),
        usage: unmap_bind_flags(internal.BindFlags),
        flags: unmap_texture_flags(internal.MiscFlags, internal.Usage),
    }
}

pub fn unmap_texture_2d_desc(internal: &d3d11::D3D11_TEXTURE2D_DESC) -> api::ResourceDesc {
    let mut usage = unmap_bind_flags(internal.BindFlags);
    if internal.SampleDesc.Count > 1 {
        usage |= api::ResourceUsage::RESOLVE_SOURCE;
    }
    api::ResourceDesc {
        dim: api::ResourceDim::Texture {
            ty: api::TextureType::D2,
            width: internal.Width,
            height: internal.Height,
            depth_or_layers: internal.ArraySize as u16,
            levels: internal.MipLevels as u16,
            format: unmap_format(internal.Format),
            samples: internal.SampleDesc.Count as u16,
        },
        heap: unmap_memory_heap(internal.Usage, internal.CPUAccessFlags),
        usage,
        flags: unmap_texture_flags(internal.MiscFlags, internal.Usage),
    }
}

pub fn unmap_texture_3d_desc(internal: &d3d11::D3D11_TEXTURE3D_DESC) -> api::ResourceDesc {
    api::ResourceDesc {
        dim: api::ResourceDim::Texture {
            ty: api::TextureType::D3,
            width: internal.Width,
            height: internal.Height,
            depth_or_layers: internal.Depth as u16,
            levels: internal.MipLevels as u16,
            format: unmap_format(internal.Format),
            samples: 1,
        },
        heap: unmap_memory_heap(internal.Usage, internal.CPUAccessFlags),
        usage: unmap_bind_flags(internal.BindFlags),
        flags: unmap_texture_flags(internal.MiscFlags, internal.Usage),
    }
}

// ---------------------------------------------------------------------
// Samplers.

pub fn map_sampler_desc(desc: &api::SamplerDesc) -> d3d11::D3D11_SAMPLER_DESC {
    d3d11::D3D11_SAMPLER_DESC {
        Filter: desc.filter as u32,
        AddressU: desc.address_u as u32,
        AddressV: desc.address_v as u32,
        AddressW: desc.address_w as u32,
        MipLODBias: desc.mip_lod_bias,
        MaxAnisotropy: desc.max_anisotropy as UINT,
        ComparisonFunc: map_compare_op(desc.compare_op),
        BorderColor: desc.border_color,
        MinLOD: desc.min_lod,
        MaxLOD: desc.max_lod,
    }
}

pub fn unmap_sampler_desc(internal: &d3d11::D3D11_SAMPLER_DESC) -> api::SamplerDesc {
    api::SamplerDesc {
        filter: api::FilterMode::from_u32(internal.Filter),
        address_u: api::TextureAddressMode::from_u32(internal.AddressU),
        address_v: api::TextureAddressMode::from_u32(internal.AddressV),
        address_w: api::TextureAddressMode::from_u32(internal.AddressW),
        mip_lod_bias: internal.MipLODBias,
        max_anisotropy: internal.MaxAnisotropy as f32,
        compare_op: unmap_compare_op(internal.ComparisonFunc),
        min_lod: internal.MinLOD,
        max_lod: internal.MaxLOD,
        border_color: internal.BorderColor,
    }
}

// ---------------------------------------------------------------------
// Pipeline fixed-function state. A missing description converts to the
// documented default state, spelled out as explicit constants.

fn bool_to(value: bool) -> BOOL {
    value as BOOL
}

pub fn map_render_target_blend(
    target: &api::RenderTargetBlend,
) -> d3d11::D3D11_RENDER_TARGET_BLEND_DESC {
    d3d11::D3D11_RENDER_TARGET_BLEND_DESC {
        BlendEnable: bool_to(target.blend_enable),
        SrcBlend: map_blend_factor(target.source_color_blend_factor),
        DestBlend: map_blend_factor(target.dest_color_blend_factor),
        BlendOp: map_blend_op(target.color_blend_op),
        SrcBlendAlpha: map_blend_factor(target.source_alpha_blend_factor),
        DestBlendAlpha: map_blend_factor(target.dest_alpha_blend_factor),
        BlendOpAlpha: map_blend_op(target.alpha_blend_op),
        RenderTargetWriteMask: target.write_mask.bits() as u8,
    }
}

pub fn map_blend_desc(desc: Option<&api::BlendDesc>) -> d3d11::D3D11_BLEND_DESC {
    let default_desc = api::BlendDesc::default();
    let desc = desc.unwrap_or(&default_desc);

    let mut targets = [map_render_target_blend(&api::RenderTargetBlend::default());
        d3d11::D3D11_SIMULTANEOUS_RENDER_TARGET_COUNT as usize];
    for (raw, target) in targets.iter_mut().zip(desc.targets.iter()) {
        *raw = map_render_target_blend(target);
    }

    d3d11::D3D11_BLEND_DESC {
        AlphaToCoverageEnable: bool_to(desc.alpha_to_coverage_enable),
        IndependentBlendEnable: bool_to(desc.independent_blend_enable),
        RenderTarget: targets,
    }
}

pub fn map_blend_desc1(desc: Option<&api::BlendDesc>) -> d3d11_1::D3D11_BLEND_DESC1 {
    let default_desc = api::BlendDesc::default();
    let desc = desc.unwrap_or(&default_desc);

    let mut targets = [d3d11_1::D3D11_RENDER_TARGET_BLEND_DESC1 {
        BlendEnable: 0,
        LogicOpEnable: 0,
        SrcBlend: d3d11::D3D11_BLEND_ONE,
        DestBlend: d3d11::D3D11_BLEND_ZERO,
        BlendOp: d3d11::D3D11_BLEND_OP_ADD,
        SrcBlendAlpha: d3d11::D3D11_BLEND_ONE,
        DestBlendAlpha: d3d11::D3D11_BLEND_ZERO,
        BlendOpAlpha: d3d11::D3D11_BLEND_OP_ADD,
        LogicOp: d3d11_1::D3D11_LOGIC_OP_NOOP,
        RenderTargetWriteMask: api::ColorWriteMask::ALL.bits() as u8,
    }; d3d11::D3D11_SIMULTANEOUS_RENDER_TARGET_COUNT as usize];

    for (raw, target) in targets.iter_mut().zip(desc.targets.iter()) {
        raw.BlendEnable = bool_to(target.blend_enable);
        raw.LogicOpEnable = bool_to(target.logic_op_enable);
        raw.SrcBlend = map_blend_factor(target.source_color_blend_factor);
        raw.DestBlend = map_blend_factor(target.dest_color_blend_factor);
        raw.BlendOp = map_blend_op(target.color_blend_op);
        raw.SrcBlendAlpha = map_blend_factor(target.source_alpha_blend_factor);
        raw.DestBlendAlpha = map_blend_factor(target.dest_alpha_blend_factor);
        raw.BlendOpAlpha = map_blend_op(target.alpha_blend_op);
        raw.LogicOp = target.logic_op as u32;
        raw.RenderTargetWriteMask = target.write_mask.bits() as u8;
    }

    d3d11_1::D3D11_BLEND_DESC1 {
        AlphaToCoverageEnable: bool_to(desc.alpha_to_coverage_enable),
        IndependentBlendEnable: bool_to(desc.independent_blend_enable),
        RenderTarget: targets,
    }
}

pub fn unmap_blend_desc(internal: &d3d11::D3D11_BLEND_DESC) -> api::BlendDesc {
    let mut desc = api::BlendDesc {
        alpha_to_coverage_enable: internal.AlphaToCoverageEnable != 0,
        independent_blend_enable: internal.IndependentBlendEnable != 0,
        ..api::BlendDesc::default()
    };
    for (target, raw) in desc.targets.iter_mut().zip(internal.RenderTarget.iter()) {
        target.blend_enable = raw.BlendEnable != 0;
        target.source_color_blend_factor = unmap_blend_factor(raw.SrcBlend);
        target.dest_color_blend_factor = unmap_blend_factor(raw.DestBlend);
        target.color_blend_op = unmap_blend_op(raw.BlendOp);
        target.source_alpha_blend_factor = unmap_blend_factor(raw.SrcBlendAlpha);
        target.dest_alpha_blend_factor = unmap_blend_factor(raw.DestBlendAlpha);
        target.alpha_blend_op = unmap_blend_op(raw.BlendOpAlpha);
        target.write_mask =
            api::ColorWriteMask::from_bits_truncate(raw.RenderTargetWriteMask as u32);
    }
    desc
}

pub fn unmap_blend_desc1(internal: &d3d11_1::D3D11_BLEND_DESC1) -> api::BlendDesc {
    let mut desc = api::BlendDesc {
        alpha_to_coverage_enable: internal.AlphaToCoverageEnable != 0,
        independent_blend_enable: internal.IndependentBlendEnable != 0,
        ..api::BlendDesc::default()
    };
    for (target, raw) in desc.targets.iter_mut().zip(internal.RenderTarget.iter()) {
        target.blend_enable = raw.BlendEnable != 0;
        target.logic_op_enable = raw.LogicOpEnable != 0;
        target.source_color_blend_factor = unmap_blend_factor(raw.SrcBlend);
        target.dest_color_blend_factor = unmap_blend_factor(raw.DestBlend);
        target.color_blend_op = unmap_blend_op(raw.BlendOp);
        target.source_alpha_blend_factor = unmap_blend_factor(raw.SrcBlendAlpha);
        target.dest_alpha_blend_factor = unmap_blend_factor(raw.DestBlendAlpha);
        target.alpha_blend_op = unmap_blend_op(raw.BlendOpAlpha);
        target.logic_op = api::LogicOp::from_u32(raw.LogicOp);
        target.write_mask =
            api::ColorWriteMask::from_bits_truncate(raw.RenderTargetWriteMask as u32);
    }
    desc
}

pub fn map_rasterizer_desc(desc: Option<&api::RasterizerDesc>) -> d3d11::D3D11_RASTERIZER_DESC {
    let default_desc = api::RasterizerDesc::default();
    let desc = desc.unwrap_or(&default_desc);
    debug_assert!(!desc.conservative_rasterization);

    d3d11::D3D11_RASTERIZER_DESC {
        FillMode: map_fill_mode(desc.fill_mode),
        CullMode: map_cull_mode(desc.cull_mode),
        FrontCounterClockwise: bool_to(desc.front_counter_clockwise),
        DepthBias: desc.depth_bias as i32,
        DepthBiasClamp: desc.depth_bias_clamp,
        SlopeScaledDepthBias: desc.slope_scaled_depth_bias,
        DepthClipEnable: bool_to(desc.depth_clip_enable),
        ScissorEnable: bool_to(desc.scissor_enable),
        MultisampleEnable: bool_to(desc.multisample_enable),
        AntialiasedLineEnable: bool_to(desc.antialiased_line_enable),
    }
}

pub fn unmap_rasterizer_desc(internal: &d3d11::D3D11_RASTERIZER_DESC) -> api::RasterizerDesc {
    api::RasterizerDesc {
        fill_mode: unmap_fill_mode(internal.FillMode),
        cull_mode: unmap_cull_mode(internal.CullMode),
        front_counter_clockwise: internal.FrontCounterClockwise != 0,
        depth_bias: internal.DepthBias as f32,
        depth_bias_clamp: internal.DepthBiasClamp,
        slope_scaled_depth_bias: internal.SlopeScaledDepthBias,
        depth_clip_enable: internal.DepthClipEnable != 0,
        scissor_enable: internal.ScissorEnable != 0,
        multisample_enable: internal.MultisampleEnable != 0,
        antialiased_line_enable: internal.AntialiasedLineEnable != 0,
        conservative_rasterization: false,
    }
}

fn map_stencil_face(face: &api::StencilFaceDesc) -> d3d11::D3D11_DEPTH_STENCILOP_DESC {
    d3d11::D3D11_DEPTH_STENCILOP_DESC {
        StencilFailOp: map_stencil_op(face.fail_op),
        StencilDepthFailOp: map_stencil_op(face.depth_fail_op),
        StencilPassOp: map_stencil_op(face.pass_op),
        StencilFunc: map_compare_op(face.func),
    }
}

fn unmap_stencil_face(internal: &d3d11::D3D11_DEPTH_STENCILOP_DESC) -> api::StencilFaceDesc {
    api::StencilFaceDesc {
        fail_op: unmap_stencil_op(internal.StencilFailOp),
        depth_fail_op: unmap_stencil_op(internal.StencilDepthFailOp),
        pass_op: unmap_stencil_op(internal.StencilPassOp),
        func: unmap_compare_op(internal.StencilFunc),
    }
}

pub fn map_depth_stencil_desc(
    desc: Option<&api::DepthStencilDesc>,
) -> d3d11::D3D11_DEPTH_STENCIL_DESC {
    let default_desc = api::DepthStencilDesc::default();
    let desc = desc.unwrap_or(&default_desc);

    d3d11::D3D11_DEPTH_STENCIL_DESC {
        DepthEnable: bool_to(desc.depth_enable),
        DepthWriteMask: if desc.depth_write_enable {
            d3d11::D3D11_DEPTH_WRITE_MASK_ALL
        } else {
            d3d11::D3D11_DEPTH_WRITE_MASK_ZERO
        },
        DepthFunc: map_compare_op(desc.depth_func),
        StencilEnable: bool_to(desc.stencil_enable),
        StencilReadMask: desc.stencil_read_mask,
        StencilWriteMask: desc.stencil_write_mask,
        FrontFace: map_stencil_face(&desc.front),
        BackFace: map_stencil_face(&desc.back),
    }
}

pub fn unmap_depth_stencil_desc(
    internal: &d3d11::D3D11_DEPTH_STENCIL_DESC,
) -> api::DepthStencilDesc {
    api::DepthStencilDesc {
        depth_enable: internal.DepthEnable != 0,
        depth_write_enable: internal.DepthWriteMask == d3d11::D3D11_DEPTH_WRITE_MASK_ALL,
        depth_func: unmap_compare_op(internal.DepthFunc),
        stencil_enable: internal.StencilEnable != 0,
        stencil_read_mask: internal.StencilReadMask,
        stencil_write_mask: internal.StencilWriteMask,
        stencil_reference: 0,
        front: unmap_stencil_face(&internal.FrontFace),
        back: unmap_stencil_face(&internal.BackFace),
    }
}

// ---------------------------------------------------------------------
// Resource views.

fn view_buffer_elements(format: api::Format, offset: u64, size: u64) -> (UINT, UINT) {
    let element = format.block_size_bytes().max(1) as u64;
    ((offset / element) as UINT, (size / element) as UINT)
}

pub fn map_srv_desc(desc: &api::ResourceViewDesc) -> d3d11::D3D11_SHADER_RESOURCE_VIEW_DESC {
    let mut internal = unsafe { std::mem::zeroed::<d3d11::D3D11_SHADER_RESOURCE_VIEW_DESC>() };
    internal.Format = map_format(desc.format());

    match *desc {
        api::ResourceViewDesc::Buffer { format, offset, size } => {
            internal.ViewDimension = d3dcommon::D3D_SRV_DIMENSION_BUFFER;
            let (first, count) = view_buffer_elements(format, offset, size);
            unsafe {
                *internal.u.Buffer_mut().u1.FirstElement_mut() = first;
                *internal.u.Buffer_mut().u2.NumElements_mut() = count;
            }
        }
        api::ResourceViewDesc::Texture {
            ty,
            first_level,
            levels,
            first_layer,
            layers,
            ..
        } => match ty {
            api::TextureViewType::Texture1D => {
                internal.ViewDimension = d3dcommon::D3D_SRV_DIMENSION_TEXTURE1D;
                let tex = unsafe { internal.u.Texture1D_mut() };
                tex.MostDetailedMip = first_level;
                tex.MipLevels = levels;
            }
            api::TextureViewType::Texture1DArray => {
                internal.ViewDimension = d3dcommon::D3D_SRV_DIMENSION_TEXTURE1DARRAY;
                let tex = unsafe { internal.u.Texture1DArray_mut() };
                tex.MostDetailedMip = first_level;
                tex.MipLevels = levels;
                tex.FirstArraySlice = first_layer;
                tex.ArraySize = layers;
            }
            api::TextureViewType::Texture2D => {
                internal.ViewDimension = d3dcommon::D3D_SRV_DIMENSION_TEXTURE2D;
                let tex = unsafe { internal.u.Texture2D_mut() };
                tex.MostDetailedMip = first_level;
                tex.MipLevels = levels;
            }
            api::TextureViewType::Texture2DArray => {
                internal.ViewDimension = d3dcommon::D3D_SRV_DIMENSION_TEXTURE2DARRAY;
                let tex = unsafe { internal.u.Texture2DArray_mut() };
                tex.MostDetailedMip = first_level;
                tex.MipLevels = levels;
                tex.FirstArraySlice = first_layer;
                tex.ArraySize = layers;
            }
            api::TextureViewType::Texture2DMultisample => {
                internal.ViewDimension = d3dcommon::D3D_SRV_DIMENSION_TEXTURE2DMS;
            }
            api::TextureViewType::Texture2DMultisampleArray => {
                internal.ViewDimension = d3dcommon::D3D_SRV_DIMENSION_TEXTURE2DMSARRAY;
                let tex = unsafe { internal.u.Texture2DMSArray_mut() };
                tex.FirstArraySlice = first_layer;
                tex.ArraySize = layers;
            }
            api::TextureViewType::Texture3D => {
                internal.ViewDimension = d3dcommon::D3D_SRV_DIMENSION_TEXTURE3D;
                let tex = unsafe { internal.u.Texture3D_mut() };
                tex.MostDetailedMip = first_level;
                tex.MipLevels = levels;
            }
            api::TextureViewType::TextureCube => {
                internal.ViewDimension = d3dcommon::D3D_SRV_DIMENSION_TEXTURECUBE;
                let tex = unsafe { internal.u.TextureCube_mut() };
                tex.MostDetailedMip = first_level;
                tex.MipLevels = levels;
            }
            api::TextureViewType::TextureCubeArray => {
                internal.ViewDimension = d3dcommon::D3D_SRV_DIMENSION_TEXTURECUBEARRAY;
                let tex = unsafe { internal.u.TextureCubeArray_mut() };
                tex.MostDetailedMip = first_level;
                tex.MipLevels = levels;
                tex.First2DArrayFace = first_layer;
                tex.NumCubes = if layers == api::ALL_LAYERS {
                    api::ALL_LAYERS
                } else {
                    layers / 6
                };
            }
        },
    }
    internal
}

pub fn unmap_srv_desc(internal: &d3d11::D3D11_SHADER_RESOURCE_VIEW_DESC) -> api::ResourceViewDesc {
    let format = unmap_format(internal.Format);
    match internal.ViewDimension {
        d3dcommon::D3D_SRV_DIMENSION_BUFFER => {
            let element = format.block_size_bytes().max(1) as u64;
            let buffer = unsafe { internal.u.Buffer() };
            api::ResourceViewDesc::Buffer {
                format,
                offset: unsafe { *buffer.u1.FirstElement() } as u64 * element,
                size: unsafe { *buffer.u2.NumElements() } as u64 * element,
            }
        }
        d3dcommon::D3D_SRV_DIMENSION_TEXTURE1D => {
            let tex = unsafe { internal.u.Texture1D() };
            api::ResourceViewDesc::Texture {
                ty: api::TextureViewType::Texture1D,
                format,
                first_level: tex.MostDetailedMip,
                levels: tex.MipLevels,
                first_layer: 0,
                layers: 1,
            }
        }
        d3dcommon::D3D_SRV_DIMENSION_TEXTURE1DARRAY => {
            let tex = unsafe { internal.u.Texture1DArray() };
            api::ResourceViewDesc::Texture {
                ty: api::TextureViewType::Texture1DArray,
                format,
                first_level: tex.MostDetailedMip,
                levels: tex.MipLevels,
                first_layer: tex.FirstArraySlice,
                layers: tex.ArraySize,
            }
        }
        d3dcommon::D3D_SRV_DIMENSION_TEXTURE2D => {
            let tex = unsafe { internal.u.Texture2D() };
            api::ResourceViewDesc::Texture {
                ty: api::TextureViewType::Texture2D,
                format,
                first_level: tex.MostDetailedMip,
                levels: tex.MipLevels,
                first_layer: 0,
                layers: 1,
            }
        }
        d3dcommon::D3D_SRV_DIMENSION_TEXTURE2DARRAY => {
            let tex = unsafe { internal.u.Texture2DArray() };
            api::ResourceViewDesc::Texture {
                ty: api::TextureViewType::Texture2DArray,
                format,
                first_level: tex.MostDetailedMip,
                levels: tex.MipLevels,
                first_layer: tex.FirstArraySlice,
                layers: tex.ArraySize,
            }
        }
        d3dcommon::D3D_SRV_DIMENSION_TEXTURE2DMS => api::ResourceViewDesc::Texture {
            ty: api::TextureViewType::Texture2DMultisample,
            format,
            first_level: 0,
            levels: 1,
            first_layer: 0,
            layers: 1,
        },
        d3dcommon::D3D_SRV_DIMENSION_TEXTURE2DMSARRAY => {
            let tex = unsafe { internal.u.Texture2DMSArray() };
            api::ResourceViewDesc::Texture {
                ty: api::TextureViewType::Texture2DMultisampleArray,
                format,
                first_level: 0,
                levels: 1,
                first_layer: tex.FirstArraySlice,
                layers: tex.ArraySize,
            }
        }
        d3dcommon::D3D_SRV_DIMENSION_TEXTURE3D => {
            let tex = unsafe { internal.u.Texture3D() };
            api::ResourceViewDesc::Texture {
                ty: api::TextureViewType::Texture3D,
                format,
                first_level: tex.MostDetailedMip,
                levels: tex.MipLevels,
                first_layer: 0,
                layers: 1,
            }
        }
        d3dcommon::D3D_SRV_DIMENSION_TEXTURECUBE => {
            let tex = unsafe { internal.u.TextureCube() };
            api::ResourceViewDesc::Texture {
                ty: api::TextureViewType::TextureCube,
                format,
                first_level: tex.MostDetailedMip,
                levels: tex.MipLevels,
                first_layer: 0,
                layers: 6,
            }
        }
        d3dcommon::D3D_SRV_DIMENSION_TEXTURECUBEARRAY => {
            let tex = unsafe { internal.u.TextureCubeArray() };
            api::ResourceViewDesc::Texture {
                ty: api::TextureViewType::TextureCubeArray,
                format,
                first_level: tex.MostDetailedMip,
                levels: tex.MipLevels,
                first_layer: tex.First2DArrayFace,
                layers: if tex.NumCubes == api::ALL_LAYERS {
                    api::ALL_LAYERS
                } else {
                    tex.NumCubes * 6
                },
            }
        }
        _ => api::ResourceViewDesc::tex_2d(format),
    }
}

/// The `PlaneSlice` of the extended description has no unified
/// representation and is dropped; all other fields convert unchanged.
pub fn unmap_srv_desc1(
    internal: &d3d11_3::D3D11_SHADER_RESOURCE_VIEW_DESC1,
) -> api::ResourceViewDesc {
    let format = unmap_format(internal.Format);
    match internal.ViewDimension {
        d3dcommon::D3D_SRV_DIMENSION_TEXTURE2D => {
            let tex = unsafe { internal.u.Texture2D() };
            api::ResourceViewDesc::Texture {
                ty: api::TextureViewType::Texture2D,
                format,
                first_level: tex.MostDetailedMip,
                levels: tex.MipLevels,
                first_layer: 0,
                layers: 1,
            }
        }
        d3dcommon::D3D_SRV_DIMENSION_TEXTURE2DARRAY => {
            let tex = unsafe { internal.u.Texture2DArray() };
            api::ResourceViewDesc::Texture {
                ty: api::TextureViewType::Texture2DArray,
                format,
                first_level: tex.MostDetailedMip,
                levels: tex.MipLevels,
                first_layer: tex.FirstArraySlice,
                layers: tex.ArraySize,
            }
        }
        _ => {
            // The remaining dimensions have identical layout in both
            // description versions.
            let base = unsafe {
                &*(internal as *const d3d11_3::D3D11_SHADER_RESOURCE_VIEW_DESC1
                    as *const d3d11::D3D11_SHADER_RESOURCE_VIEW_DESC)
            };
            unmap_srv_desc(base)
        }
    }
}

pub fn map_rtv_desc(desc: &api::ResourceViewDesc) -> d3d11::D3D11_RENDER_TARGET_VIEW_DESC {
    let mut internal = unsafe { std::mem::zeroed::<d3d11::D3D11_RENDER_TARGET_VIEW_DESC>() };
    internal.Format = map_format(desc.format());

    match *desc {
        api::ResourceViewDesc::Buffer { format, offset, size } => {
            internal.ViewDimension = d3d11::D3D11_RTV_DIMENSION_BUFFER;
            let (first, count) = view_buffer_elements(format, offset, size);
            unsafe {
                *internal.u.Buffer_mut().u1.FirstElement_mut() = first;
                *internal.u.Buffer_mut().u2.NumElements_mut() = count;
            }
        }
        api::ResourceViewDesc::Texture {
            ty,
            first_level,
            first_layer,
            layers,
            ..
        } => match ty {
            api::TextureViewType::Texture1D => {
                internal.ViewDimension = d3d11::D3D11_RTV_DIMENSION_TEXTURE1D;
                unsafe { internal.u.Texture1D_mut() }.MipSlice = first_level;
            }
            api::TextureViewType::Texture1DArray => {
                internal.ViewDimension = d3d11::D3D11_RTV_DIMENSION_TEXTURE1DARRAY;
                let tex = unsafe { internal.u.Texture1DArray_mut() };
                tex.MipSlice = first_level;
                tex.FirstArraySlice = first_layer;
                tex.ArraySize = layers;
            }
            api::TextureViewType::Texture2D => {
                internal.ViewDimension = d3d11::D3D11_RTV_DIMENSION_TEXTURE2D;
                unsafe { internal.u.Texture2D_mut() }.MipSlice = first_level;
            }
            // Render targets address cube faces as 2D array slices.
            api::TextureViewType::Texture2DArray
            | api::TextureViewType::TextureCube
            | api::TextureViewType::TextureCubeArray => {
                internal.ViewDimension = d3d11::D3D11_RTV_DIMENSION_TEXTURE2DARRAY;
                let tex = unsafe { internal.u.Texture2DArray_mut() };
                tex.MipSlice = first_level;
                tex.FirstArraySlice = first_layer;
                tex.ArraySize = layers;
            }
            api::TextureViewType::Texture2DMultisample => {
                internal.ViewDimension = d3d11::D3D11_RTV_DIMENSION_TEXTURE2DMS;
            }
            api::TextureViewType::Texture2DMultisampleArray => {
                internal.ViewDimension = d3d11::D3D11_RTV_DIMENSION_TEXTURE2DMSARRAY;
                let tex = unsafe { internal.u.Texture2DMSArray_mut() };
                tex.FirstArraySlice = first_layer;
                tex.ArraySize = layers;
            }
            api::TextureViewType::Texture3D => {
                internal.ViewDimension = d3d11::D3D11_RTV_DIMENSION_TEXTURE3D;
                let tex = unsafe { internal.u.Texture3D_mut() };
                tex.MipSlice = first_level;
                tex.FirstWSlice = first_layer;
                tex.WSize = layers;
            }
        },
    }
    internal
}

pub fn unmap_rtv_desc(internal: &d3d11::D3D11_RENDER_TARGET_VIEW_DESC) -> api::ResourceViewDesc {
    let format = unmap_format(internal.Format);
    match internal.ViewDimension {
        d3d11::D3D11_RTV_DIMENSION_BUFFER => {
            let element = format.block_size_bytes().max(1) as u64;
            let buffer = unsafe { internal.u.Buffer() };
            api::ResourceViewDesc::Buffer {
                format,
                offset: unsafe { *buffer.u1.FirstElement() } as u64 * element,
                size: unsafe { *buffer.u2.NumElements() } as u64 * element,
            }
        }
        d3d11::D3D11_RTV_DIMENSION_TEXTURE1D => api::ResourceViewDesc::Texture {
            ty: api::TextureViewType::Texture1D,
            format,
            first_level: unsafe { internal.u.Texture1D() }.MipSlice,
            levels: 1,
            first_layer: 0,
            layers: 1,
        },
        d3d11::D3D11_RTV_DIMENSION_TEXTURE1DARRAY => {
            let tex = unsafe { internal.u.Texture1DArray() };
            api::ResourceViewDesc::Texture {
                ty: api::TextureViewType::Texture1DArray,
                format,
                first_level: tex.MipSlice,
                levels: 1,
                first_layer: tex.FirstArraySlice,
                layers: tex.ArraySize,
            }
        }
        d3d11::D3D11_RTV_DIMENSION_TEXTURE2D => api::ResourceViewDesc::Texture {
            ty: api::TextureViewType::Texture2D,
            format,
            first_level: unsafe { internal.u.Texture2D() }.MipSlice,
            levels: 1,
            first_layer: 0,
            layers: 1,
        },
        d3d11::D3D11_RTV_DIMENSION_TEXTURE2DARRAY => {
            let tex = unsafe { internal.u.Texture2DArray() };
            api::ResourceViewDesc::Texture {
                ty: api::TextureViewType::Texture2DArray,
                format,
                first_level: tex.MipSlice,
                levels: 1,
                first_layer: tex.FirstArraySlice,
                layers: tex.ArraySize,
            }
        }
        d3d11::D3D11_RTV_DIMENSION_TEXTURE2DMS => api::ResourceViewDesc::Texture {
            ty: api::TextureViewType::Texture2DMultisample,
            format,
            first_level: 0,
            levels: 1,
            first_layer: 0,
            layers: 1,
        },
        d3d11::D3D11_RTV_DIMENSION_TEXTURE2DMSARRAY => {
            let tex = unsafe { internal.u.Texture2DMSArray() };
            api::ResourceViewDesc::Texture {
                ty: api::TextureViewType::Texture2DMultisampleArray,
                format,
                first_level: 0,
                levels: 1,
                first_layer: tex.FirstArraySlice,
                layers: tex.ArraySize,
            }
        }
        d3d11::D3D11_RTV_DIMENSION_TEXTURE3D => {
            let tex = unsafe { internal.u.Texture3D() };
            api::ResourceViewDesc::Texture {
                ty: api::TextureViewType::Texture3D,
                format,
                first_level: tex.MipSlice,
                levels: 1,
                first_layer: tex.FirstWSlice,
                layers: tex.WSize,
            }
        }
        _ => api::ResourceViewDesc::tex_2d(format),
    }
}

pub fn map_dsv_desc(desc: &api::ResourceViewDesc) -> d3d11::D3D11_DEPTH_STENCIL_VIEW_DESC {
    let mut internal = unsafe { std::mem::zeroed::<d3d11::D3D11_DEPTH_STENCIL_VIEW_DESC>() };
    internal.Format = map_format(desc.format());
    internal.Flags = 0;

    if let api::ResourceViewDesc::Texture {
        ty,
        first_level,
        first_layer,
        layers,
        ..
    } = *desc
    {
        match ty {
            api::TextureViewType::Texture1D => {
                internal.ViewDimension = d3d11::D3D11_DSV_DIMENSION_TEXTURE1D;
                unsafe { internal.u.Texture1D_mut() }.MipSlice = first_level;
            }
            api::TextureViewType::Texture1DArray => {
                internal.ViewDimension = d3d11::D3D11_DSV_DIMENSION_TEXTURE1DARRAY;
                let tex = unsafe { internal.u.Texture1DArray_mut() };
                tex.MipSlice = first_level;
                tex.FirstArraySlice = first_layer;
                tex.ArraySize = layers;
            }
            api::TextureViewType::Texture2D => {
                internal.ViewDimension = d3d11::D3D11_DSV_DIMENSION_TEXTURE2D;
                unsafe { internal.u.Texture2D_mut() }.MipSlice = first_level;
            }
            api::TextureViewType::Texture2DArray
            | api::TextureViewType::TextureCube
            | api::TextureViewType::TextureCubeArray => {
                internal.ViewDimension = d3d11::D3D11_DSV_DIMENSION_TEXTURE2DARRAY;
                let tex = unsafe { internal.u.Texture2DArray_mut() };
                tex.MipSlice = first_level;
                tex.FirstArraySlice = first_layer;
                tex.ArraySize = layers;
            }
            api::TextureViewType::Texture2DMultisample => {
                internal.ViewDimension = d3d11::D3D11_DSV_DIMENSION_TEXTURE2DMS;
            }
            api::TextureViewType::Texture2DMultisampleArray => {
                internal.ViewDimension = d3d11::D3D11_DSV_DIMENSION_TEXTURE2DMSARRAY;
                let tex = unsafe { internal.u.Texture2DMSArray_mut() };
                tex.FirstArraySlice = first_layer;
                tex.ArraySize = layers;
            }
            api::TextureViewType::Texture3D => {
                // No 3D depth-stencil views in D3D11.
                debug_assert!(false);
            }
        }
    } else {
        debug_assert!(false);
    }
    internal
}

pub fn unmap_dsv_desc(internal: &d3d11::D3D11_DEPTH_STENCIL_VIEW_DESC) -> api::ResourceViewDesc {
    let format = unmap_format(internal.Format);
    match internal.ViewDimension {
        d3d11::D3D11_DSV_DIMENSION_TEXTURE1D => api::ResourceViewDesc::Texture {
            ty: api::TextureViewType::Texture1D,
            format,
            first_level: unsafe { internal.u.Texture1D() }.MipSlice,
            levels: 1,
            first_layer: 0,
            layers: 1,
        },
        d3d11::D3D11_DSV_DIMENSION_TEXTURE1DARRAY => {
            let tex = unsafe { internal.u.Texture1DArray() };
            api::ResourceViewDesc::Texture {
                ty: api::TextureViewType::Texture1DArray,
                format,
                first_level: tex.MipSlice,
                levels: 1,
                first_layer: tex.FirstArraySlice,
                layers: tex.ArraySize,
            }
        }
        d3d11::D3D11_DSV_DIMENSION_TEXTURE2D => api::ResourceViewDesc::Texture {
            ty: api::TextureViewType::Texture2D,
            format,
            first_level: unsafe { internal.u.Texture2D() }.MipSlice,
            levels: 1,
            first_layer: 0,
            layers: 1,
        },
        d3d11::D3D11_DSV_DIMENSION_TEXTURE2DARRAY => {
            let tex = unsafe { internal.u.Texture2DArray() };
            api::ResourceViewDesc::Texture {
                ty: api::TextureViewType::Texture2DArray,
                format,
                first_level: tex.MipSlice,
                levels: 1,
                first_layer: tex.FirstArraySlice,
                layers: tex.ArraySize,
            }
        }
        d3d11::D3D11_DSV_DIMENSION_TEXTURE2DMS => api::ResourceViewDesc::Texture {
            ty: api::TextureViewType::Texture2DMultisample,
            format,
            first_level: 0,
            levels: 1,
            first_layer: 0,
            layers: 1,
        },
        d3d11::D3D11_DSV_DIMENSION_TEXTURE2DMSARRAY => {
            let tex = unsafe { internal.u.Texture2DMSArray() };
            api::ResourceViewDesc::Texture {
                ty: api::TextureViewType::Texture2DMultisampleArray,
                format,
                first_level: 0,
                levels: 1,
                first_layer: tex.FirstArraySlice,
                layers: tex.ArraySize,
            }
        }
        _ => api::ResourceViewDesc::tex_2d(format),
    }
}

pub fn map_uav_desc(desc: &api::ResourceViewDesc) -> d3d11::D3D11_UNORDERED_ACCESS_VIEW_DESC {
    let mut internal = unsafe { std::mem::zeroed::<d3d11::D3D11_UNORDERED_ACCESS_VIEW_DESC>() };
    internal.Format = map_format(desc.format());

    match *desc {
        api::ResourceViewDesc::Buffer { format, offset, size } => {
            internal.ViewDimension = d3d11::D3D11_UAV_DIMENSION_BUFFER;
            let (first, count) = view_buffer_elements(format, offset, size);
            let buffer = unsafe { internal.u.Buffer_mut() };
            buffer.FirstElement = first;
            buffer.NumElements = count;
            buffer.Flags = 0;
        }
        api::ResourceViewDesc::Texture {
            ty,
            first_level,
            first_layer,
            layers,
            ..
        } => match ty {
            api::TextureViewType::Texture1D => {
                internal.ViewDimension = d3d11::D3D11_UAV_DIMENSION_TEXTURE1D;
                unsafe { internal.u.Texture1D_mut() }.MipSlice = first_level;
            }
            api::TextureViewType::Texture1DArray => {
                internal.ViewDimension = d3d11::D3D11_UAV_DIMENSION_TEXTURE1DARRAY;
                let tex = unsafe { internal.u.Texture1DArray_mut() };
                tex.MipSlice = first_level;
                tex.FirstArraySlice = first_layer;
                tex.ArraySize = layers;
            }
            api::TextureViewType::Texture2D => {
                internal.ViewDimension = d3d11::D3D11_UAV_DIMENSION_TEXTURE2D;
                unsafe { internal.u.Texture2D_mut() }.MipSlice = first_level;
            }
            api::TextureViewType::Texture2DArray
            | api::TextureViewType::TextureCube
            | api::TextureViewType::TextureCubeArray => {
                internal.ViewDimension = d3d11::D3D11_UAV_DIMENSION_TEXTURE2DARRAY;
                let tex = unsafe { internal.u.Texture2DArray_mut() };
                tex.MipSlice = first_level;
                tex.FirstArraySlice = first_layer;
                tex.ArraySize = layers;
            }
            api::TextureViewType::Texture3D => {
                internal.ViewDimension = d3d11::D3D11_UAV_DIMENSION_TEXTURE3D;
                let tex = unsafe { internal.u.Texture3D_mut() };
                tex.MipSlice = first_level;
                tex.FirstWSlice = first_layer;
                tex.WSize = layers;
            }
            // Multisampled unordered access is not a thing in D3D11.
            api::TextureViewType::Texture2DMultisample
            | api::TextureViewType::Texture2DMultisampleArray => {
                debug_assert!(false);
            }
        },
    }
    internal
}

pub fn unmap_uav_desc(
    internal: &d3d11::D3D11_UNORDERED_ACCESS_VIEW_DESC,
) -> api::ResourceViewDesc {
    let format = unmap_format(internal.Format);
    match internal.ViewDimension {
        d3d11::D3D11_UAV_DIMENSION_BUFFER => {
            let element = format.block_size_bytes().max(1) as u64;
            let buffer = unsafe { internal.u.Buffer() };
            api::ResourceViewDesc::Buffer {
                format,
                offset: buffer.FirstElement as u64 * element,
                size: buffer.NumElements as u64 * element,
            }
        }
        d3d11::D3D11_UAV_DIMENSION_TEXTURE1D => api::ResourceViewDesc::Texture {
            ty: api::TextureViewType::Texture1D,
            format,
            first_level: unsafe { internal.u.Texture1D() }.MipSlice,
            levels: 1,
            first_layer: 0,
            layers: 1,
        },
        d3d11::D3D11_UAV_DIMENSION_TEXTURE1DARRAY => {
            let tex = unsafe { internal.u.Texture1DArray() };
            api::ResourceViewDesc::Texture {
                ty: api::TextureViewType::Texture1DArray,
                format,
                first_level: tex.MipSlice,
                levels: 1,
                first_layer: tex.FirstArraySlice,
                layers: tex.ArraySize,
            }
        }
        d3d11::D3D11_UAV_DIMENSION_TEXTURE2D => api::ResourceViewDesc::Texture {
            ty: api::TextureViewType::Texture2D,
            format,
            first_level: unsafe { internal.u.Texture2D() }.MipSlice,
            levels: 1,
            first_layer: 0,
            layers: 1,
        },
        d3d11::D3D11_UAV_DIMENSION_TEXTURE2DARRAY => {
            let tex = unsafe { internal.u.Texture2DArray() };
            api::ResourceViewDesc::Texture {
                ty: api::TextureViewType::Texture2DArray,
                format,
                first_level: tex.MipSlice,
                levels: 1,
                first_layer: tex.FirstArraySlice,
                layers: tex.ArraySize,
            }
        }
        d3d11::D3D11_UAV_DIMENSION_TEXTURE3D => {
            let tex = unsafe { internal.u.Texture3D() };
            api::ResourceViewDesc::Texture {
                ty: api::TextureViewType::Texture3D,
                format,
                first_level: tex.MipSlice,
                levels: 1,
                first_layer: tex.FirstWSlice,
                layers: tex.WSize,
            }
        }
        _ => api::ResourceViewDesc::tex_2d(format),
    }
}

// ---------------------------------------------------------------------
// Miscellaneous.

pub fn map_query_type(ty: api::QueryType) -> Option<d3d11::D3D11_QUERY> {
    Some(match ty {
        api::QueryType::Occlusion => d3d11::D3D11_QUERY_OCCLUSION,
        api::QueryType::BinaryOcclusion => d3d11::D3D11_QUERY_OCCLUSION_PREDICATE,
        api::QueryType::Timestamp => d3d11::D3D11_QUERY_TIMESTAMP,
        api::QueryType::PipelineStatistics => d3d11::D3D11_QUERY_PIPELINE_STATISTICS,
        api::QueryType::StreamOutputStatistics0 => d3d11::D3D11_QUERY_SO_STATISTICS_STREAM0,
        api::QueryType::StreamOutputStatistics1 => d3d11::D3D11_QUERY_SO_STATISTICS_STREAM1,
        api::QueryType::StreamOutputStatistics2 => d3d11::D3D11_QUERY_SO_STATISTICS_STREAM2,
        api::QueryType::StreamOutputStatistics3 => d3d11::D3D11_QUERY_SO_STATISTICS_STREAM3,
        api::QueryType::AccelerationStructureSize
        | api::QueryType::AccelerationStructureCompactedSize => return None,
    })
}

pub fn map_box(sub_box: &api::SubresourceBox) -> d3d11::D3D11_BOX {
    d3d11::D3D11_BOX {
        left: sub_box.left,
        top: sub_box.top,
        front: sub_box.front,
        right: sub_box.right,
        bottom: sub_box.bottom,
        back: sub_box.back,
    }
}

pub fn map_viewport(viewport: &api::Viewport) -> d3d11::D3D11_VIEWPORT {
    d3d11::D3D11_VIEWPORT {
        TopLeftX: viewport.x,
        TopLeftY: viewport.y,
        Width: viewport.width,
        Height: viewport.height,
        MinDepth: viewport.min_depth,
        MaxDepth: viewport.max_depth,
    }
}

pub fn map_rect(rect: &api::Rect) -> d3d11::D3D11_RECT {
    d3d11::D3D11_RECT {
        left: rect.left,
        top: rect.top,
        right: rect.right,
        bottom: rect.bottom,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_offsets_are_bijective() {
        // Walk the full native enumerator ranges to pin the +1 relation.
        for native in d3d11::D3D11_BLEND_OP_ADD..=d3d11::D3D11_BLEND_OP_MAX {
            assert_eq!(map_blend_op(unmap_blend_op(native)), native);
        }
        for native in d3d11::D3D11_COMPARISON_NEVER..=d3d11::D3D11_COMPARISON_ALWAYS {
            assert_eq!(map_compare_op(unmap_compare_op(native)), native);
        }
        for native in d3d11::D3D11_STENCIL_OP_KEEP..=d3d11::D3D11_STENCIL_OP_DECR {
            assert_eq!(map_stencil_op(unmap_stencil_op(native)), native);
        }
        for native in d3d11::D3D11_CULL_NONE..=d3d11::D3D11_CULL_BACK {
            assert_eq!(map_cull_mode(unmap_cull_mode(native)), native);
        }
    }

    #[test]
    fn memory_heap_joint_codec_round_trips() {
        for heap in [
            api::MemoryHeap::GpuOnly,
            api::MemoryHeap::CpuToGpu,
            api::MemoryHeap::GpuToCpu,
            api::MemoryHeap::CpuOnly,
        ] {
            let mut usage = d3d11::D3D11_USAGE_DEFAULT;
            let mut cpu_access = 0;
            map_memory_heap(heap, &mut usage, &mut cpu_access);
            assert_eq!(unmap_memory_heap(usage, cpu_access), heap);
        }
    }

    #[test]
    fn absent_state_descs_yield_documented_defaults() {
        let blend = map_blend_desc(None);
        assert_eq!(blend.RenderTarget[0].BlendEnable, 0);
        assert_eq!(blend.RenderTarget[0].SrcBlend, d3d11::D3D11_BLEND_ONE);
        assert_eq!(blend.RenderTarget[0].DestBlend, d3d11::D3D11_BLEND_ZERO);
        assert_eq!(blend.RenderTarget[0].BlendOp, d3d11::D3D11_BLEND_OP_ADD);

        let raster = map_rasterizer_desc(None);
        assert_eq!(raster.FillMode, d3d11::D3D11_FILL_SOLID);
        assert_eq!(raster.CullMode, d3d11::D3D11_CULL_BACK);
        assert_ne!(raster.DepthClipEnable, 0);

        let depth = map_depth_stencil_desc(None);
        assert_ne!(depth.DepthEnable, 0);
        assert_eq!(depth.DepthWriteMask, d3d11::D3D11_DEPTH_WRITE_MASK_ALL);
        assert_eq!(depth.DepthFunc, d3d11::D3D11_COMPARISON_LESS);
    }

    #[test]
    fn resource_desc_round_trips() {
        let desc = api::ResourceDesc::tex_2d(
            256,
            256,
            1,
            1,
            api::Format::R8G8B8A8Unorm,
            1,
            api::MemoryHeap::GpuOnly,
            api::ResourceUsage::SHADER_RESOURCE | api::ResourceUsage::RENDER_TARGET,
        );
        let native = map_texture_2d_desc(&desc);
        let round = unmap_texture_2d_desc(&native);
        assert_eq!(round.dim, desc.dim);
        assert_eq!(round.heap, desc.heap);
        assert!(round.usage.contains(desc.usage));
    }

    #[test]
    fn view_desc_round_trips() {
        let desc = api::ResourceViewDesc::Texture {
            ty: api::TextureViewType::Texture2DArray,
            format: api::Format::R16G16B16A16Float,
            first_level: 2,
            levels: 3,
            first_layer: 1,
            layers: 4,
        };
        assert_eq!(unmap_srv_desc(&map_srv_desc(&desc)), desc);

        let buffer = api::ResourceViewDesc::Buffer {
            format: api::Format::R32Uint,
            offset: 64,
            size: 256,
        };
        assert_eq!(unmap_uav_desc(&map_uav_desc(&buffer)), buffer);
    }

    #[test]
    fn sampler_desc_round_trips() {
        let desc = api::SamplerDesc {
            filter: api::FilterMode::CompareMinMagMipLinear,
            address_u: api::TextureAddressMode::Wrap,
            address_v: api::TextureAddressMode::Mirror,
            address_w: api::TextureAddressMode::Border,
            mip_lod_bias: 0.5,
            max_anisotropy: 4.0,
            compare_op: api::CompareOp::LessEqual,
            min_lod: 0.0,
            max_lod: 16.0,
            border_color: [0.0, 0.0, 0.0, 1.0],
        };
        assert_eq!(unmap_sampler_desc(&map_sampler_desc(&desc)), desc);
    }
}

use std::ffi::CString;
use std::ptr;
use std::sync::Arc;

use parking_lot::Mutex;
use winapi::ctypes::c_void;
use winapi::shared::winerror::{self, SUCCEEDED};
use winapi::shared::{dxgi, dxgi1_2};
use winapi::um::{d3d11, d3d11_1, d3d11_3, d3dcommon, d3dcompiler};
use winapi::Interface;

use super::{
    conv, decode_pipeline, DecodedPipeline, DeviceShared, FenceData, PipelineArena,
    PipelineBundle, PipelineLayoutData, QueryPoolData, TableData,
};
use crate::auxil::dxgi::ComPtr;
use crate::binding::{self, DescriptorTableData};
use crate::events::EventRegistry;
use crate::fence::CpuFence;
use crate::{ApiObject, DeviceError, PrivateDataStore, SharedHandle};

// Full-screen triangle used by the swap chain to stretch the resolved
// image back into a multisampled back buffer.
const BLIT_SHADER_SOURCE: &str = "
Texture2D t0 : register(t0);
SamplerState s0 : register(s0);

void vs_main(uint id : SV_VertexID, out float4 pos : SV_Position, out float2 uv : TEXCOORD0)
{
    uv = float2((id << 1) & 2, id & 2);
    pos = float4(uv * float2(2.0, -2.0) + float2(-1.0, 1.0), 0.0, 1.0);
}

float4 ps_main(float4 pos : SV_Position, float2 uv : TEXCOORD0) : SV_Target
{
    return t0.SampleLevel(s0, uv, 0.0);
}
";

unsafe fn compile_blit_shader(entry: &str, target: &str) -> Result<ComPtr<d3dcommon::ID3DBlob>, DeviceError> {
    let entry = CString::new(entry).unwrap();
    let target = CString::new(target).unwrap();

    let mut code = ComPtr::<d3dcommon::ID3DBlob>::null();
    let mut errors = ComPtr::<d3dcommon::ID3DBlob>::null();
    let hr = unsafe {
        d3dcompiler::D3DCompile(
            BLIT_SHADER_SOURCE.as_ptr() as *const c_void,
            BLIT_SHADER_SOURCE.len(),
            ptr::null(),
            ptr::null(),
            ptr::null_mut(),
            entry.as_ptr(),
            target.as_ptr(),
            0,
            0,
            code.mut_self(),
            errors.mut_self(),
        )
    };
    if !SUCCEEDED(hr) {
        if !errors.is_null() {
            let message = unsafe {
                std::slice::from_raw_parts(
                    errors.GetBufferPointer() as *const u8,
                    errors.GetBufferSize(),
                )
            };
            log::error!(
                "blit shader compilation failed: {}",
                String::from_utf8_lossy(message)
            );
        }
        return Err(DeviceError::CreationFailed);
    }
    Ok(code)
}

/// Returns the raw pointer when the bundle holds exactly one native
/// object and no fixed-function extras, or gives the bundle back
/// otherwise. The returned pointer carries the bundle's reference.
fn extract_single_object(mut bundle: PipelineBundle) -> Result<u64, PipelineBundle> {
    if bundle.topology != d3dcommon::D3D_PRIMITIVE_TOPOLOGY_UNDEFINED {
        return Err(bundle);
    }
    let populated = [
        !bundle.vs.is_null(),
        !bundle.hs.is_null(),
        !bundle.ds.is_null(),
        !bundle.gs.is_null(),
        !bundle.ps.is_null(),
        !bundle.input_layout.is_null(),
        !bundle.blend_state.is_null(),
        !bundle.rasterizer_state.is_null(),
        !bundle.depth_stencil_state.is_null(),
    ]
    .iter()
    .filter(|&&set| set)
    .count();
    if populated != 1 {
        return Err(bundle);
    }

    macro_rules! take_if_set {
        ($field:ident) => {
            if !bundle.$field.is_null() {
                return Ok(std::mem::replace(&mut bundle.$field, ComPtr::null()).into_raw() as u64);
            }
        };
    }
    take_if_set!(vs);
    take_if_set!(hs);
    take_if_set!(ds);
    take_if_set!(gs);
    take_if_set!(ps);
    take_if_set!(input_layout);
    take_if_set!(blend_state);
    take_if_set!(rasterizer_state);
    take_if_set!(depth_stencil_state);
    Err(bundle)
}

/// The Direct3D 11 device implementation. Cloning shares the underlying
/// device; all methods are safe for concurrent use, matching the native
/// device's own free-threading.
#[derive(Clone)]
pub struct Device {
    pub(crate) shared: Arc<DeviceShared>,
}

impl Device {
    /// Wraps a native device. Adds its own reference to `raw`; the
    /// caller keeps whatever references it held.
    ///
    /// # Safety
    /// `raw` must be a valid `ID3D11Device` pointer.
    pub unsafe fn new(
        raw: *mut d3d11::ID3D11Device,
        events: Arc<EventRegistry>,
    ) -> Result<Self, DeviceError> {
        unsafe { (*raw).AddRef() };
        let raw = unsafe { ComPtr::from_raw(raw) };

        let mut immediate = ComPtr::<d3d11::ID3D11DeviceContext>::null();
        unsafe { raw.GetImmediateContext(immediate.mut_self()) };
        let feature_level = unsafe { raw.GetFeatureLevel() };

        // Build the shared blit pipeline once, up front, so per-frame
        // resolve work never hits the shader compiler.
        let vs_code = unsafe { compile_blit_shader("vs_main", "vs_4_0")? };
        let ps_code = unsafe { compile_blit_shader("ps_main", "ps_4_0")? };

        let mut copy_vs = ComPtr::<d3d11::ID3D11VertexShader>::null();
        let mut copy_ps = ComPtr::<d3d11::ID3D11PixelShader>::null();
        unsafe {
            if !SUCCEEDED(raw.CreateVertexShader(
                vs_code.GetBufferPointer(),
                vs_code.GetBufferSize(),
                ptr::null_mut(),
                copy_vs.mut_self(),
            )) || !SUCCEEDED(raw.CreatePixelShader(
                ps_code.GetBufferPointer(),
                ps_code.GetBufferSize(),
                ptr::null_mut(),
                copy_ps.mut_self(),
            )) {
                return Err(DeviceError::CreationFailed);
            }
        }

        let sampler_desc = conv::map_sampler_desc(&api::SamplerDesc {
            filter: api::FilterMode::MinMagMipPoint,
            ..api::SamplerDesc::default()
        });
        let mut copy_sampler = ComPtr::<d3d11::ID3D11SamplerState>::null();
        if !SUCCEEDED(unsafe { raw.CreateSamplerState(&sampler_desc, copy_sampler.mut_self()) }) {
            return Err(DeviceError::CreationFailed);
        }

        let device = Self {
            shared: Arc::new(DeviceShared {
                raw,
                immediate,
                events,
                feature_level,
                pipelines: Mutex::new(PipelineArena::default()),
                private: PrivateDataStore::default(),
                copy_vs,
                copy_ps,
                copy_sampler,
            }),
        };
        device.shared.events.init_device.notify(|cb| cb(&device));
        Ok(device)
    }

    /// Fires the destroy notification. The hook layer calls this right
    /// before releasing its last native device reference.
    pub fn on_destroy(&self) {
        self.shared.events.destroy_device.notify(|cb| cb(self));
    }

    pub(crate) fn events(&self) -> &EventRegistry {
        &self.shared.events
    }

    fn create_pipeline_bundle(
        &self,
        desc: &api::PipelineDesc,
    ) -> Result<PipelineBundle, DeviceError> {
        let raw = &self.shared.raw;
        let mut bundle = PipelineBundle {
            vs: ComPtr::null(),
            hs: ComPtr::null(),
            ds: ComPtr::null(),
            gs: ComPtr::null(),
            ps: ComPtr::null(),
            input_layout: ComPtr::null(),
            blend_state: ComPtr::null(),
            rasterizer_state: ComPtr::null(),
            depth_stencil_state: ComPtr::null(),
            topology: conv::map_topology(desc.topology),
            sample_mask: if desc.sample_mask == 0 {
                !0
            } else {
                desc.sample_mask
            },
            blend_constant: desc.blend.map_or([1.0; 4], |b| b.blend_constant),
            stencil_reference: desc
                .depth_stencil
                .map_or(0, |ds| ds.stencil_reference as u32),
        };

        unsafe {
            if let Some(ref shader) = desc.vertex {
                if !SUCCEEDED(raw.CreateVertexShader(
                    shader.code.as_ptr() as *const c_void,
                    shader.code.len(),
                    ptr::null_mut(),
                    bundle.vs.mut_self(),
                )) {
                    return Err(DeviceError::CreationFailed);
                }
            }
            if let Some(ref shader) = desc.hull {
                if !SUCCEEDED(raw.CreateHullShader(
                    shader.code.as_ptr() as *const c_void,
                    shader.code.len(),
                    ptr::null_mut(),
                    bundle.hs.mut_self(),
                )) {
                    return Err(DeviceError::CreationFailed);
                }
            }
            if let Some(ref shader) = desc.domain {
                if !SUCCEEDED(raw.CreateDomainShader(
                    shader.code.as_ptr() as *const c_void,
                    shader.code.len(),
                    ptr::null_mut(),
                    bundle.ds.mut_self(),
                )) {
                    return Err(DeviceError::CreationFailed);
                }
            }
            if let Some(ref shader) = desc.geometry {
                if !SUCCEEDED(raw.CreateGeometryShader(
                    shader.code.as_ptr() as *const c_void,
                    shader.code.len(),
                    ptr::null_mut(),
                    bundle.gs.mut_self(),
                )) {
                    return Err(DeviceError::CreationFailed);
                }
            }
            if let Some(ref shader) = desc.pixel {
                if !SUCCEEDED(raw.CreatePixelShader(
                    shader.code.as_ptr() as *const c_void,
                    shader.code.len(),
                    ptr::null_mut(),
                    bundle.ps.mut_self(),
                )) {
                    return Err(DeviceError::CreationFailed);
                }
            }

            if !desc.input_layout.is_empty() {
                let vertex_code = match desc.vertex {
                    Some(ref shader) => &shader.code,
                    // Input layouts validate against vertex shader input
                    // signatures, so one is required.
                    None => return Err(DeviceError::InvalidArgument("input layout without vertex shader")),
                };

                let semantics: Vec<CString> = desc
                    .input_layout
                    .iter()
                    .map(|element| CString::new(element.semantic.as_str()).unwrap_or_default())
                    .collect();
                let elements: Vec<d3d11::D3D11_INPUT_ELEMENT_DESC> = desc
                    .input_layout
                    .iter()
                    .zip(&semantics)
                    .map(|(element, semantic)| d3d11::D3D11_INPUT_ELEMENT_DESC {
                        SemanticName: semantic.as_ptr(),
                        SemanticIndex: element.semantic_index,
                        Format: conv::map_format(element.format),
                        InputSlot: element.buffer_binding,
                        AlignedByteOffset: element.offset,
                        InputSlotClass: match element.step {
                            api::InputStepRate::PerVertex => d3d11::D3D11_INPUT_PER_VERTEX_DATA,
                            api::InputStepRate::PerInstance(_) => {
                                d3d11::D3D11_INPUT_PER_INSTANCE_DATA
                            }
                        },
                        InstanceDataStepRate: match element.step {
                            api::InputStepRate::PerVertex => 0,
                            api::InputStepRate::PerInstance(rate) => rate,
                        },
                    })
                    .collect();

                if !SUCCEEDED(raw.CreateInputLayout(
                    elements.as_ptr(),
                    elements.len() as u32,
                    vertex_code.as_ptr() as *const c_void,
                    vertex_code.len(),
                    bundle.input_layout.mut_self(),
                )) {
                    return Err(DeviceError::CreationFailed);
                }
            }

            let uses_logic_op = desc
                .blend
                .map_or(false, |b| b.targets.iter().any(|t| t.logic_op_enable));
            if uses_logic_op {
                let device1 = self
                    .shared
                    .raw
                    .cast::<d3d11_1::ID3D11Device1>()
                    .map_err(|_| DeviceError::Unsupported)?;
                let blend_desc = conv::map_blend_desc1(desc.blend.as_ref());
                let mut state = ComPtr::<d3d11_1::ID3D11BlendState1>::null();
                if !SUCCEEDED(device1.CreateBlendState1(&blend_desc, state.mut_self())) {
                    return Err(DeviceError::CreationFailed);
                }
                bundle.blend_state = ComPtr::from_raw(state.into_raw() as *mut d3d11::ID3D11BlendState);
            } else if desc.blend.is_some() {
                let blend_desc = conv::map_blend_desc(desc.blend.as_ref());
                if !SUCCEEDED(raw.CreateBlendState(&blend_desc, bundle.blend_state.mut_self())) {
                    return Err(DeviceError::CreationFailed);
                }
            }

            if let Some(ref rasterizer) = desc.rasterizer {
                if rasterizer.cull_mode == api::CullMode::FrontAndBack {
                    return Err(DeviceError::InvalidArgument("cull mode front and back"));
                }
                let rasterizer_desc = conv::map_rasterizer_desc(Some(rasterizer));
                if !SUCCEEDED(
                    raw.CreateRasterizerState(&rasterizer_desc, bundle.rasterizer_state.mut_self()),
                ) {
                    return Err(DeviceError::CreationFailed);
                }
            }

            if desc.depth_stencil.is_some() {
                let depth_desc = conv::map_depth_stencil_desc(desc.depth_stencil.as_ref());
                if !SUCCEEDED(
                    raw.CreateDepthStencilState(&depth_desc, bundle.depth_stencil_state.mut_self()),
                ) {
                    return Err(DeviceError::CreationFailed);
                }
            }
        }

        Ok(bundle)
    }
}

impl ApiObject for Device {
    fn native(&self) -> u64 {
        self.shared.raw.as_mut_ptr() as u64
    }

    fn private_data(&self, key: &[u8; 16]) -> u64 {
        self.shared.private.get(key)
    }

    fn set_private_data(&self, key: &[u8; 16], value: u64) {
        self.shared.private.set(key, value)
    }
}

impl crate::Device for Device {
    fn backend(&self) -> api::Backend {
        api::Backend::D3d11
    }

    fn check_capability(&self, capability: api::Capability) -> bool {
        use api::Capability as Cap;
        match capability {
            Cap::ComputeShader | Cap::HullAndDomainShader | Cap::DrawOrDispatchIndirect => {
                self.shared.feature_level >= d3dcommon::D3D_FEATURE_LEVEL_11_0
            }
            Cap::GeometryShader => self.shared.feature_level >= d3dcommon::D3D_FEATURE_LEVEL_10_0,
            Cap::LogicOp => {
                let mut options =
                    unsafe { std::mem::zeroed::<d3d11::D3D11_FEATURE_DATA_D3D11_OPTIONS>() };
                let hr = unsafe {
                    self.shared.raw.CheckFeatureSupport(
                        d3d11::D3D11_FEATURE_D3D11_OPTIONS,
                        &mut options as *mut _ as *mut c_void,
                        std::mem::size_of::<d3d11::D3D11_FEATURE_DATA_D3D11_OPTIONS>() as u32,
                    )
                };
                SUCCEEDED(hr) && options.OutputMergerLogicOp != 0
            }
            Cap::DualSourceBlend
            | Cap::IndependentBlend
            | Cap::FillModeNonSolid
            | Cap::BindRenderTargetsAndDepthStencil
            | Cap::MultiViewport
            | Cap::PartialPushConstantUpdates
            | Cap::PartialPushDescriptorUpdates
            | Cap::DrawInstanced
            | Cap::CopyBufferRegion
            | Cap::SamplerCompare
            | Cap::SamplerAnisotropic
            | Cap::SharedResource => true,
            Cap::SharedResourceNtHandle => unsafe {
                self.shared.raw.cast::<d3d11_1::ID3D11Device1>().is_ok()
            },
            Cap::ConservativeRasterization
            | Cap::CopyBufferToTexture
            | Cap::Blit
            | Cap::ResolveRegion
            | Cap::CopyQueryPoolResults
            | Cap::SamplerWithResourceView => false,
        }
    }

    fn check_format_support(&self, format: api::Format, usage: api::ResourceUsage) -> bool {
        let mut support = 0u32;
        let hr = unsafe {
            self.shared.raw.CheckFormatSupport(conv::map_format(format), &mut support)
        };
        if !SUCCEEDED(hr) {
            return false;
        }
        let required = conv::map_usage_to_format_support(usage);
        support & required == required
    }

    fn create_sampler(&self, desc: &api::SamplerDesc) -> Result<api::Sampler, DeviceError> {
        let mut desc = *desc;
        self.events().create_sampler.modify(|cb| cb(self, &mut desc));

        let native_desc = conv::map_sampler_desc(&desc);
        let mut sampler = ComPtr::<d3d11::ID3D11SamplerState>::null();
        if !SUCCEEDED(unsafe {
            self.shared.raw.CreateSamplerState(&native_desc, sampler.mut_self())
        }) {
            log::error!("sampler creation failed");
            return Err(DeviceError::CreationFailed);
        }

        let handle = api::Sampler(sampler.into_raw() as u64);
        self.events().init_sampler.notify(|cb| cb(self, &desc, handle));
        Ok(handle)
    }

    fn destroy_sampler(&self, sampler: api::Sampler) {
        if sampler.is_null() {
            return;
        }
        self.events().destroy_sampler.notify(|cb| cb(self, sampler));
        unsafe { (*(sampler.0 as *mut d3d11::ID3D11SamplerState)).Release() };
    }

    fn create_resource(
        &self,
        desc: &api::ResourceDesc,
        initial_data: &[api::SubresourceData],
        initial_state: api::ResourceUsage,
        shared: Option<&mut SharedHandle>,
    ) -> Result<api::Resource, DeviceError> {
        let mut desc = *desc;
        self.events()
            .create_resource
            .modify(|cb| cb(self, &mut desc, initial_data, initial_state));

        let is_shared = desc
            .flags
            .intersects(api::ResourceFlags::SHARED | api::ResourceFlags::SHARED_NT_HANDLE);
        let mut shared_slot = match (is_shared, shared) {
            (true, Some(slot)) => Some(slot),
            (true, None) => return Err(DeviceError::InvalidArgument("shared handle slot")),
            (false, _) => None,
        };

        // Import path: the shared handle references an existing native
        // resource, so no creation and no initial data.
        if let Some(slot) = shared_slot.as_deref_mut() {
            if !slot.is_null() {
                if !initial_data.is_empty() {
                    return Err(DeviceError::InvalidArgument(
                        "initial data on imported resource",
                    ));
                }
                let mut resource = ComPtr::<d3d11::ID3D11Resource>::null();
                let hr = if desc.flags.contains(api::ResourceFlags::SHARED_NT_HANDLE) {
                    let device1 = unsafe { self.shared.raw.cast::<d3d11_1::ID3D11Device1>() }
                        .map_err(|_| DeviceError::Unsupported)?;
                    unsafe {
                        device1.OpenSharedResource1(
                            slot.0.cast(),
                            &d3d11::ID3D11Resource::uuidof(),
                            resource.mut_void(),
                        )
                    }
                } else {
                    unsafe {
                        self.shared.raw.OpenSharedResource(
                            slot.0.cast(),
                            &d3d11::ID3D11Resource::uuidof(),
                            resource.mut_void(),
                        )
                    }
                };
                if !SUCCEEDED(hr) {
                    log::error!("shared resource import failed with {:#x}", hr);
                    return Err(DeviceError::CreationFailed);
                }

                let handle = api::Resource(resource.into_raw() as u64);
                self.events()
                    .init_resource
                    .notify(|cb| cb(self, &desc, initial_data, initial_state, handle));
                return Ok(handle);
            }
        }

        let native_initial: Vec<d3d11::D3D11_SUBRESOURCE_DATA> = initial_data
            .iter()
            .map(|data| d3d11::D3D11_SUBRESOURCE_DATA {
                pSysMem: data.data as *const c_void,
                SysMemPitch: data.row_pitch,
                SysMemSlicePitch: data.slice_pitch,
            })
            .collect();
        let initial_ptr = if native_initial.is_empty() {
            ptr::null()
        } else {
            native_initial.as_ptr()
        };

        let mut resource = ComPtr::<d3d11::ID3D11Resource>::null();
        let hr = match desc.dim {
            api::ResourceDim::Buffer { size } => {
                if size == 0 {
                    return Err(DeviceError::InvalidArgument("zero-sized buffer"));
                }
                let native_desc = conv::map_buffer_desc(&desc);
                unsafe {
                    self.shared.raw.CreateBuffer(
                        &native_desc,
                        initial_ptr,
                        resource.mut_void() as *mut *mut d3d11::ID3D11Buffer,
                    )
                }
            }
            api::ResourceDim::Texture { ty, .. } => match ty {
                api::TextureType::D1 => {
                    let native_desc = conv::map_texture_1d_desc(&desc);
                    unsafe {
                        self.shared.raw.CreateTexture1D(
                            &native_desc,
                            initial_ptr,
                            resource.mut_void() as *mut *mut d3d11::ID3D11Texture1D,
                        )
                    }
                }
                api::TextureType::D2 => {
                    let native_desc = conv::map_texture_2d_desc(&desc);
                    unsafe {
                        self.shared.raw.CreateTexture2D(
                            &native_desc,
                            initial_ptr,
                            resource.mut_void() as *mut *mut d3d11::ID3D11Texture2D,
                        )
                    }
                }
                api::TextureType::D3 => {
                    let native_desc = conv::map_texture_3d_desc(&desc);
                    unsafe {
                        self.shared.raw.CreateTexture3D(
                            &native_desc,
                            initial_ptr,
                            resource.mut_void() as *mut *mut d3d11::ID3D11Texture3D,
                        )
                    }
                }
            },
        };
        if !SUCCEEDED(hr) {
            log::error!("resource creation failed with {:#x} for {:?}", hr, desc);
            return Err(DeviceError::CreationFailed);
        }

        // Export path: hand a new shared handle back through the slot.
        {
            if let Some(slot) = shared_slot {
                let hr = if desc.flags.contains(api::ResourceFlags::SHARED_NT_HANDLE) {
                    match unsafe { resource.cast::<dxgi1_2::IDXGIResource1>() } {
                        Ok(dxgi_resource) => {
                            let mut handle = ptr::null_mut();
                            let hr = unsafe {
                                dxgi_resource.CreateSharedHandle(
                                    ptr::null(),
                                    dxgi1_2::DXGI_SHARED_RESOURCE_READ
                                        | dxgi1_2::DXGI_SHARED_RESOURCE_WRITE,
                                    ptr::null(),
                                    &mut handle,
                                )
                            };
                            slot.0 = handle.cast();
                            hr
                        }
                        Err(hr) => hr,
                    }
                } else {
                    match unsafe { resource.cast::<dxgi::IDXGIResource>() } {
                        Ok(dxgi_resource) => {
                            let mut handle = ptr::null_mut();
                            let hr = unsafe { dxgi_resource.GetSharedHandle(&mut handle) };
                            slot.0 = handle.cast();
                            hr
                        }
                        Err(hr) => hr,
                    }
                };
                if !SUCCEEDED(hr) {
                    log::error!("shared handle export failed with {:#x}", hr);
                    return Err(DeviceError::CreationFailed);
                }
            }
        }

        let handle = api::Resource(resource.into_raw() as u64);
        self.events()
            .init_resource
            .notify(|cb| cb(self, &desc, initial_data, initial_state, handle));
        Ok(handle)
    }

    fn destroy_resource(&self, resource: api::Resource) {
        if resource.is_null() {
            return;
        }
        self.events().destroy_resource.notify(|cb| cb(self, resource));
        unsafe { (*(resource.0 as *mut d3d11::ID3D11Resource)).Release() };
    }

    fn resource_desc(&self, resource: api::Resource) -> api::ResourceDesc {
        debug_assert!(!resource.is_null());
        let raw = resource.0 as *mut d3d11::ID3D11Resource;
        let mut dimension = 0;
        unsafe { (*raw).GetType(&mut dimension) };

        unsafe {
            match dimension {
                d3d11::D3D11_RESOURCE_DIMENSION_BUFFER => {
                    let mut desc = std::mem::zeroed::<d3d11::D3D11_BUFFER_DESC>();
                    (*(raw as *mut d3d11::ID3D11Buffer)).GetDesc(&mut desc);
                    conv::unmap_buffer_desc(&desc)
                }
                d3d11::D3D11_RESOURCE_DIMENSION_TEXTURE1D => {
                    let mut desc = std::mem::zeroed::<d3d11::D3D11_TEXTURE1D_DESC>();
                    (*(raw as *mut d3d11::ID3D11Texture1D)).GetDesc(&mut desc);
                    conv::unmap_texture_1d_desc(&desc)
                }
                d3d11::D3D11_RESOURCE_DIMENSION_TEXTURE2D => {
                    let mut desc = std::mem::zeroed::<d3d11::D3D11_TEXTURE2D_DESC>();
                    (*(raw as *mut d3d11::ID3D11Texture2D)).GetDesc(&mut desc);
                    conv::unmap_texture_2d_desc(&desc)
                }
                d3d11::D3D11_RESOURCE_DIMENSION_TEXTURE3D => {
                    let mut desc = std::mem::zeroed::<d3d11::D3D11_TEXTURE3D_DESC>();
                    (*(raw as *mut d3d11::ID3D11Texture3D)).GetDesc(&mut desc);
                    conv::unmap_texture_3d_desc(&desc)
                }
                _ => api::ResourceDesc {
                    dim: api::ResourceDim::Buffer { size: 0 },
                    heap: api::MemoryHeap::Unknown,
                    usage: api::ResourceUsage::empty(),
                    flags: api::ResourceFlags::empty(),
                },
            }
        }
    }

    fn create_resource_view(
        &self,
        resource: api::Resource,
        usage_type: api::ResourceUsage,
        desc: &api::ResourceViewDesc,
    ) -> Result<api::ResourceView, DeviceError> {
        if resource.is_null() {
            return Err(DeviceError::InvalidArgument("null resource"));
        }
        let mut desc = *desc;
        self.events()
            .create_resource_view
            .modify(|cb| cb(self, resource, usage_type, &mut desc));

        if desc.format().is_typeless() {
            return Err(DeviceError::InvalidArgument("typeless view format"));
        }

        let raw = resource.0 as *mut d3d11::ID3D11Resource;
        let mut view = ComPtr::<d3d11::ID3D11View>::null();
        let hr = unsafe {
            if usage_type.intersects(api::ResourceUsage::DEPTH_STENCIL) {
                let native_desc = conv::map_dsv_desc(&desc);
                self.shared.raw.CreateDepthStencilView(
                    raw,
                    &native_desc,
                    view.mut_void() as *mut *mut d3d11::ID3D11DepthStencilView,
                )
            } else if usage_type.intersects(api::ResourceUsage::RENDER_TARGET) {
                let native_desc = conv::map_rtv_desc(&desc);
                self.shared.raw.CreateRenderTargetView(
                    raw,
                    &native_desc,
                    view.mut_void() as *mut *mut d3d11::ID3D11RenderTargetView,
                )
            } else if usage_type.intersects(api::ResourceUsage::SHADER_RESOURCE) {
                let native_desc = conv::map_srv_desc(&desc);
                self.shared.raw.CreateShaderResourceView(
                    raw,
                    &native_desc,
                    view.mut_void() as *mut *mut d3d11::ID3D11ShaderResourceView,
                )
            } else if usage_type.intersects(api::ResourceUsage::UNORDERED_ACCESS) {
                let native_desc = conv::map_uav_desc(&desc);
                self.shared.raw.CreateUnorderedAccessView(
                    raw,
                    &native_desc,
                    view.mut_void() as *mut *mut d3d11::ID3D11UnorderedAccessView,
                )
            } else {
                return Err(DeviceError::InvalidArgument("view usage type"));
            }
        };
        if !SUCCEEDED(hr) {
            log::error!("resource view creation failed with {:#x}", hr);
            return Err(DeviceError::CreationFailed);
        }

        let handle = api::ResourceView(view.into_raw() as u64);
        self.events()
            .init_resource_view
            .notify(|cb| cb(self, resource, usage_type, &desc, handle));
        Ok(handle)
    }

    fn destroy_resource_view(&self, view: api::ResourceView) {
        if view.is_null() {
            return;
        }
        self.events().destroy_resource_view.notify(|cb| cb(self, view));
        unsafe { (*(view.0 as *mut d3d11::ID3D11View)).Release() };
    }

    fn resource_from_view(&self, view: api::ResourceView) -> api::Resource {
        if view.is_null() {
            return api::Resource::NULL;
        }
        let mut resource = ptr::null_mut::<d3d11::ID3D11Resource>();
        unsafe {
            (*(view.0 as *mut d3d11::ID3D11View)).GetResource(&mut resource);
            // The view keeps the resource alive; the handle does not own
            // a reference of its own.
            if !resource.is_null() {
                (*resource).Release();
            }
        }
        api::Resource(resource as u64)
    }

    fn resource_view_desc(&self, view: api::ResourceView) -> api::ResourceViewDesc {
        debug_assert!(!view.is_null());
        let raw = unsafe { ComPtr::from_raw(view.0 as *mut d3d11::ID3D11View) };
        let desc = unsafe {
            if let Ok(srv1) = raw.cast::<d3d11_3::ID3D11ShaderResourceView1>() {
                let mut desc = std::mem::zeroed::<d3d11_3::D3D11_SHADER_RESOURCE_VIEW_DESC1>();
                srv1.GetDesc1(&mut desc);
                conv::unmap_srv_desc1(&desc)
            } else if let Ok(srv) = raw.cast::<d3d11::ID3D11ShaderResourceView>() {
                let mut desc = std::mem::zeroed::<d3d11::D3D11_SHADER_RESOURCE_VIEW_DESC>();
                srv.GetDesc(&mut desc);
                conv::unmap_srv_desc(&desc)
            } else if let Ok(rtv) = raw.cast::<d3d11::ID3D11RenderTargetView>() {
                let mut desc = std::mem::zeroed::<d3d11::D3D11_RENDER_TARGET_VIEW_DESC>();
                rtv.GetDesc(&mut desc);
                conv::unmap_rtv_desc(&desc)
            } else if let Ok(dsv) = raw.cast::<d3d11::ID3D11DepthStencilView>() {
                let mut desc = std::mem::zeroed::<d3d11::D3D11_DEPTH_STENCIL_VIEW_DESC>();
                dsv.GetDesc(&mut desc);
                conv::unmap_dsv_desc(&desc)
            } else if let Ok(uav) = raw.cast::<d3d11::ID3D11UnorderedAccessView>() {
                let mut desc = std::mem::zeroed::<d3d11::D3D11_UNORDERED_ACCESS_VIEW_DESC>();
                uav.GetDesc(&mut desc);
                conv::unmap_uav_desc(&desc)
            } else {
                api::ResourceViewDesc::tex_2d(api::Format::Unknown)
            }
        };
        // `raw` borrowed the handle's pointer; keep the count unchanged.
        let _ = raw.into_raw();
        desc
    }

    fn map_buffer_region(
        &self,
        resource: api::Resource,
        offset: u64,
        _size: u64,
        access: api::MapAccess,
    ) -> Result<*mut u8, DeviceError> {
        if resource.is_null() {
            return Err(DeviceError::InvalidArgument("null resource"));
        }
        let mut mapped = unsafe { std::mem::zeroed::<d3d11::D3D11_MAPPED_SUBRESOURCE>() };
        let hr = unsafe {
            self.shared.immediate.Map(
                resource.0 as *mut d3d11::ID3D11Resource,
                0,
                conv::map_map_access(access),
                0,
                &mut mapped,
            )
        };
        if !SUCCEEDED(hr) {
            return Err(DeviceError::CreationFailed);
        }
        let data = unsafe { (mapped.pData as *mut u8).add(offset as usize) };
        self.events()
            .map_buffer_region
            .notify(|cb| cb(self, resource, offset, _size, access, data));
        Ok(data)
    }

    fn unmap_buffer_region(&self, resource: api::Resource) {
        if resource.is_null() {
            return;
        }
        self.events().unmap_buffer_region.notify(|cb| cb(self, resource));
        unsafe {
            self.shared.immediate.Unmap(resource.0 as *mut d3d11::ID3D11Resource, 0)
        };
    }

    fn map_texture_region(
        &self,
        resource: api::Resource,
        subresource: u32,
        sub_box: Option<&api::SubresourceBox>,
        access: api::MapAccess,
    ) -> Result<api::SubresourceData, DeviceError> {
        // Mapping less than a whole subresource is not possible here (or
        // on several other backends), so the region path fails uniformly.
        if sub_box.is_some() {
            return Err(DeviceError::InvalidArgument("texture sub-box mapping"));
        }
        if resource.is_null() {
            return Err(DeviceError::InvalidArgument("null resource"));
        }

        let mut mapped = unsafe { std::mem::zeroed::<d3d11::D3D11_MAPPED_SUBRESOURCE>() };
        let hr = unsafe {
            self.shared.immediate.Map(
                resource.0 as *mut d3d11::ID3D11Resource,
                subresource,
                conv::map_map_access(access),
                0,
                &mut mapped,
            )
        };
        if !SUCCEEDED(hr) {
            return Err(DeviceError::CreationFailed);
        }
        let data = api::SubresourceData {
            data: mapped.pData as *mut u8,
            row_pitch: mapped.RowPitch,
            slice_pitch: mapped.DepthPitch,
        };
        self.events()
            .map_texture_region
            .notify(|cb| cb(self, resource, subresource, access, &data));
        Ok(data)
    }

    fn unmap_texture_region(&self, resource: api::Resource, subresource: u32) {
        if resource.is_null() {
            return;
        }
        self.events()
            .unmap_texture_region
            .notify(|cb| cb(self, resource, subresource));
        unsafe {
            self.shared.immediate.Unmap(resource.0 as *mut d3d11::ID3D11Resource, subresource)
        };
    }

    fn update_buffer_region(
        &self,
        data: &[u8],
        resource: api::Resource,
        offset: u64,
    ) -> Result<(), DeviceError> {
        if resource.is_null() {
            return Err(DeviceError::InvalidArgument("null resource"));
        }
        if self
            .events()
            .update_buffer_region
            .veto(|cb| cb(self, data, resource, offset))
        {
            return Ok(());
        }

        let sub_box = d3d11::D3D11_BOX {
            left: offset as u32,
            top: 0,
            front: 0,
            right: (offset + data.len() as u64) as u32,
            bottom: 1,
            back: 1,
        };
        unsafe {
            self.shared.immediate.UpdateSubresource(
                resource.0 as *mut d3d11::ID3D11Resource,
                0,
                &sub_box,
                data.as_ptr() as *const c_void,
                data.len() as u32,
                0,
            )
        };
        Ok(())
    }

    fn update_texture_region(
        &self,
        data: &api::SubresourceData,
        resource: api::Resource,
        subresource: u32,
        sub_box: Option<&api::SubresourceBox>,
    ) -> Result<(), DeviceError> {
        if resource.is_null() {
            return Err(DeviceError::InvalidArgument("null resource"));
        }
        if self
            .events()
            .update_texture_region
            .veto(|cb| cb(self, data, resource, subresource, sub_box))
        {
            return Ok(());
        }

        let native_box = sub_box.map(conv::map_box);
        unsafe {
            self.shared.immediate.UpdateSubresource(
                resource.0 as *mut d3d11::ID3D11Resource,
                subresource,
                native_box.as_ref().map_or(ptr::null(), |b| b),
                data.data as *const c_void,
                data.row_pitch,
                data.slice_pitch,
            )
        };
        Ok(())
    }

    fn create_pipeline(&self, desc: &api::PipelineDesc) -> Result<api::Pipeline, DeviceError> {
        let mut desc = desc.clone();
        self.events().create_pipeline.modify(|cb| cb(self, &mut desc));

        // A compute pipeline is always a single native object.
        if let Some(ref shader) = desc.compute {
            let mut cs = ComPtr::<d3d11::ID3D11ComputeShader>::null();
            if !SUCCEEDED(unsafe {
                self.shared.raw.CreateComputeShader(
                    shader.code.as_ptr() as *const c_void,
                    shader.code.len(),
                    ptr::null_mut(),
                    cs.mut_self(),
                )
            }) {
                return Err(DeviceError::CreationFailed);
            }
            let handle = api::Pipeline(cs.into_raw() as u64);
            self.events().init_pipeline.notify(|cb| cb(self, &desc, handle));
            return Ok(handle);
        }

        let bundle = self.create_pipeline_bundle(&desc)?;

        // A description with a single state object does not need the
        // heap-allocated aggregate; its native pointer becomes the
        // handle directly (the low tag bit stays clear thanks to COM
        // pointer alignment). Everything else goes through the arena and
        // gets the tag bit set.
        let handle = match extract_single_object(bundle) {
            Ok(raw) => {
                debug_assert!(raw & 1 == 0);
                api::Pipeline(raw)
            }
            Err(bundle) => {
                let handle = self.shared.pipelines.lock().insert(bundle);
                debug_assert!(handle.0 & 1 != 0);
                handle
            }
        };

        self.events().init_pipeline.notify(|cb| cb(self, &desc, handle));
        Ok(handle)
    }

    fn destroy_pipeline(&self, pipeline: api::Pipeline) {
        let decoded = match decode_pipeline(pipeline) {
            Some(decoded) => decoded,
            None => return,
        };
        self.events().destroy_pipeline.notify(|cb| cb(self, pipeline));
        match decoded {
            DecodedPipeline::Native(raw) => unsafe {
                (*(raw as *mut winapi::um::unknwnbase::IUnknown)).Release();
            },
            DecodedPipeline::Owned { index, generation } => {
                if self.shared.pipelines.lock().remove(index, generation).is_none() {
                    log::warn!("destroy_pipeline called with a stale handle");
                }
            }
        }
    }

    fn create_pipeline_layout(
        &self,
        params: &[api::PipelineLayoutParam],
    ) -> Result<api::PipelineLayout, DeviceError> {
        self.events().create_pipeline_layout.modify(|cb| cb(self, params));

        let merged = binding::merge_layout_params(params)?;
        let data = Box::new(PipelineLayoutData { merged });
        let handle = api::PipelineLayout(Box::into_raw(data) as u64);

        self.events()
            .init_pipeline_layout
            .notify(|cb| cb(self, params, handle));
        Ok(handle)
    }

    fn destroy_pipeline_layout(&self, layout: api::PipelineLayout) {
        if layout.is_null() {
            return;
        }
        self.events()
            .destroy_pipeline_layout
            .notify(|cb| cb(self, layout));
        drop(unsafe { Box::from_raw(layout.0 as *mut PipelineLayoutData) });
    }

    fn allocate_descriptor_tables(
        &self,
        layout: api::PipelineLayout,
        param: u32,
        count: u32,
    ) -> Result<Vec<api::DescriptorTable>, DeviceError> {
        if layout.is_null() {
            return Err(DeviceError::InvalidArgument("null pipeline layout"));
        }
        let layout_data = unsafe { &*(layout.0 as *const PipelineLayoutData) };
        let merged = layout_data
            .merged
            .get(param as usize)
            .ok_or(DeviceError::InvalidArgument("layout parameter index"))?;

        let mut tables = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let data = DescriptorTableData::for_param(merged)?;
            tables.push(api::DescriptorTable(
                Box::into_raw(Box::new(TableData { data })) as u64,
            ));
        }
        Ok(tables)
    }

    fn free_descriptor_tables(&self, tables: &[api::DescriptorTable]) {
        for table in tables {
            if !table.is_null() {
                drop(unsafe { Box::from_raw(table.0 as *mut TableData) });
            }
        }
    }

    fn descriptor_table_layout(
        &self,
        table: api::DescriptorTable,
    ) -> Option<(api::DescriptorType, u32, u32)> {
        if table.is_null() {
            return None;
        }
        let data = unsafe { &*(table.0 as *const TableData) };
        Some((data.data.ty, data.data.base_binding, data.data.count))
    }

    fn update_descriptor_tables(
        &self,
        updates: &[api::DescriptorTableUpdate],
    ) -> Result<(), DeviceError> {
        if self
            .events()
            .update_descriptor_tables
            .veto(|cb| cb(self, updates))
        {
            return Ok(());
        }
        for update in updates {
            let table = unsafe { &mut *(update.table.0 as *mut TableData) };
            table
                .data
                .write(update.binding, update.array_offset, &update.descriptors)?;
        }
        Ok(())
    }

    fn copy_descriptor_tables(
        &self,
        copies: &[api::DescriptorTableCopy],
    ) -> Result<(), DeviceError> {
        if self
            .events()
            .copy_descriptor_tables
            .veto(|cb| cb(self, copies))
        {
            return Ok(());
        }
        for copy in copies {
            if copy.source_table == copy.dest_table {
                return Err(DeviceError::InvalidArgument("overlapping table copy"));
            }
            let source = unsafe { &*(copy.source_table.0 as *const TableData) };
            let dest = unsafe { &mut *(copy.dest_table.0 as *mut TableData) };
            binding::copy_descriptors(&source.data, &mut dest.data, copy)?;
        }
        Ok(())
    }

    fn create_query_pool(
        &self,
        ty: api::QueryType,
        size: u32,
    ) -> Result<api::QueryPool, DeviceError> {
        let mut size = size;
        self.events().create_query_pool.modify(|cb| cb(self, ty, &mut size));

        let query_type = conv::map_query_type(ty).ok_or(DeviceError::Unsupported)?;
        let desc = d3d11::D3D11_QUERY_DESC {
            Query: query_type,
            MiscFlags: 0,
        };

        // Construct every member query now, so begin/end/copy-results
        // never allocate at record time.
        let mut queries = Vec::with_capacity(size as usize);
        for _ in 0..size {
            let mut query = ComPtr::<d3d11::ID3D11Query>::null();
            if !SUCCEEDED(unsafe { self.shared.raw.CreateQuery(&desc, query.mut_self()) }) {
                return Err(DeviceError::CreationFailed);
            }
            queries.push(query);
        }

        let handle = api::QueryPool(
            Box::into_raw(Box::new(QueryPoolData { ty, queries })) as u64,
        );
        self.events()
            .init_query_pool
            .notify(|cb| cb(self, ty, size, handle));
        Ok(handle)
    }

    fn destroy_query_pool(&self, pool: api::QueryPool) {
        if pool.is_null() {
            return;
        }
        self.events().destroy_query_pool.notify(|cb| cb(self, pool));
        drop(unsafe { Box::from_raw(pool.0 as *mut QueryPoolData) });
    }

    fn get_query_pool_results(
        &self,
        pool: api::QueryPool,
        first: u32,
        count: u32,
        results: &mut [u8],
        stride: u32,
    ) -> bool {
        if pool.is_null() {
            return false;
        }
        if self
            .events()
            .get_query_pool_results
            .veto(|cb| cb(self, pool, first, count))
        {
            return true;
        }

        let data = unsafe { &*(pool.0 as *const QueryPoolData) };
        for i in 0..count as usize {
            let query = match data.queries.get(first as usize + i) {
                Some(query) => query,
                None => return false,
            };
            if (i + 1) * stride as usize > results.len() {
                return false;
            }
            let hr = unsafe {
                self.shared.immediate.GetData(
                    query.as_mut_ptr() as *mut d3d11::ID3D11Asynchronous,
                    results[i * stride as usize..].as_mut_ptr() as *mut c_void,
                    stride,
                    d3d11::D3D11_ASYNC_GETDATA_DONOTFLUSH,
                )
            };
            if hr != winerror::S_OK {
                return false;
            }
        }
        true
    }

    fn create_fence(
        &self,
        initial_value: u64,
        flags: api::FenceFlags,
        shared: Option<&mut SharedHandle>,
    ) -> Result<api::Fence, DeviceError> {
        let data = if flags
            .intersects(api::FenceFlags::SHARED | api::FenceFlags::SHARED_NT_HANDLE)
        {
            // Only importing an existing shared fence is possible, and
            // then only as the keyed mutex of the shared resource.
            let slot = match shared {
                Some(slot) if !slot.is_null() => slot,
                _ => return Err(DeviceError::Unsupported),
            };
            let mut resource = ComPtr::<d3d11::ID3D11Resource>::null();
            let hr = unsafe {
                self.shared.raw.OpenSharedResource(
                    slot.0.cast(),
                    &d3d11::ID3D11Resource::uuidof(),
                    resource.mut_void(),
                )
            };
            if !SUCCEEDED(hr) {
                return Err(DeviceError::CreationFailed);
            }
            let keyed_mutex = unsafe { resource.cast::<dxgi::IDXGIKeyedMutex>() }
                .map_err(|_| DeviceError::Unsupported)?;
            FenceData::KeyedMutex(keyed_mutex)
        } else {
            FenceData::Cpu(CpuFence::new(initial_value))
        };

        let handle = api::Fence(Box::into_raw(Box::new(data)) as u64);
        self.events()
            .init_fence
            .notify(|cb| cb(self, initial_value, handle));
        Ok(handle)
    }

    fn destroy_fence(&self, fence: api::Fence) {
        if fence.is_null() {
            return;
        }
        self.events().destroy_fence.notify(|cb| cb(self, fence));
        drop(unsafe { Box::from_raw(fence.0 as *mut FenceData) });
    }

    fn set_resource_name(&self, resource: api::Resource, name: &str) {
        if resource.is_null() {
            return;
        }
        unsafe {
            (*(resource.0 as *mut d3d11::ID3D11Resource)).SetPrivateData(
                &d3dcommon::WKPDID_D3DDebugObjectName,
                name.len() as u32,
                name.as_ptr() as *const c_void,
            )
        };
    }

    fn set_resource_view_name(&self, view: api::ResourceView, name: &str) {
        if view.is_null() {
            return;
        }
        unsafe {
            (*(view.0 as *mut d3d11::ID3D11View)).SetPrivateData(
                &d3dcommon::WKPDID_D3DDebugObjectName,
                name.len() as u32,
                name.as_ptr() as *const c_void,
            )
        };
    }

    fn event_registry(&self) -> &EventRegistry {
        &self.shared.events
    }
}

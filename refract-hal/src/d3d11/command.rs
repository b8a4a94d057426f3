use std::ptr;

use arrayvec::ArrayVec;
use smallvec::SmallVec;
use winapi::ctypes::c_void;
use winapi::shared::minwindef::BOOL;
use winapi::shared::winerror::{SUCCEEDED, S_FALSE};
use winapi::um::{d3d11, d3d11_1, d3dcommon, synchapi};

use super::{
    conv, decode_pipeline, DecodedPipeline, Device, FenceData, PipelineLayoutData, QueryPoolData,
    TableData,
};
use crate::auxil::dxgi::ComPtr;
use crate::binding::MergedParam;
use crate::events::EventRegistry;
use crate::{ApiObject, CommandError, PrivateDataStore};

fn wide(label: &str) -> Vec<u16> {
    label.encode_utf16().chain(std::iter::once(0)).collect()
}

/// The immediate device context, acting as both the always-available
/// immediate command list and the submission queue.
///
/// Recording is single-threaded by contract; the device itself remains
/// free-threaded.
pub struct CommandContext {
    device: Device,
    ctx: ComPtr<d3d11::ID3D11DeviceContext>,
    annotation: ComPtr<d3d11_1::ID3DUserDefinedAnnotation>,
    private: PrivateDataStore,
    render_pass_open: bool,
    // Emulated push constants: one growable constant buffer plus a
    // shadow copy of all values seen so far.
    push_constants: ComPtr<d3d11::ID3D11Buffer>,
    push_constants_data: Vec<u32>,
}

unsafe impl Send for CommandContext {}
unsafe impl Sync for CommandContext {}

impl CommandContext {
    /// Wraps the device's immediate context.
    pub fn new(device: Device) -> Self {
        let ctx = device.shared.immediate.clone();
        let annotation = unsafe {
            ctx.cast::<d3d11_1::ID3DUserDefinedAnnotation>()
                .unwrap_or_else(|_| ComPtr::null())
        };

        let context = Self {
            device,
            ctx,
            annotation,
            private: PrivateDataStore::default(),
            render_pass_open: false,
            push_constants: ComPtr::null(),
            push_constants_data: Vec::new(),
        };
        context.events().init_command_queue.notify(|cb| cb(&context));
        context.events().init_command_list.notify(|cb| cb(&context));
        context
    }

    /// Fires the destroy notifications, right before the hook layer
    /// releases the native context.
    pub fn on_destroy(&self) {
        self.events().destroy_command_list.notify(|cb| cb(self));
        self.events().destroy_command_queue.notify(|cb| cb(self));
    }

    /// Closes a render pass the application left open, e.g. at the end
    /// of a frame. Presentation must not happen inside a pass.
    pub(crate) fn finish_open_render_pass(&mut self) {
        if self.render_pass_open {
            self.render_pass_open = false;
            self.events().end_render_pass.notify(|cb| cb(self));
        }
    }

    fn events(&self) -> &EventRegistry {
        self.device.events()
    }

    unsafe fn bind_constant_buffers(
        &self,
        stages: api::ShaderStages,
        slot: u32,
        buffers: &[*mut d3d11::ID3D11Buffer],
    ) {
        let count = buffers.len() as u32;
        let ptr = buffers.as_ptr();
        unsafe {
            if stages.contains(api::ShaderStages::VERTEX) {
                self.ctx.VSSetConstantBuffers(slot, count, ptr);
            }
            if stages.contains(api::ShaderStages::HULL) {
                self.ctx.HSSetConstantBuffers(slot, count, ptr);
            }
            if stages.contains(api::ShaderStages::DOMAIN) {
                self.ctx.DSSetConstantBuffers(slot, count, ptr);
            }
            if stages.contains(api::ShaderStages::GEOMETRY) {
                self.ctx.GSSetConstantBuffers(slot, count, ptr);
            }
            if stages.contains(api::ShaderStages::PIXEL) {
                self.ctx.PSSetConstantBuffers(slot, count, ptr);
            }
            if stages.contains(api::ShaderStages::COMPUTE) {
                self.ctx.CSSetConstantBuffers(slot, count, ptr);
            }
        }
    }

    unsafe fn bind_samplers(
        &self,
        stages: api::ShaderStages,
        slot: u32,
        samplers: &[*mut d3d11::ID3D11SamplerState],
    ) {
        let count = samplers.len() as u32;
        let ptr = samplers.as_ptr();
        unsafe {
            if stages.contains(api::ShaderStages::VERTEX) {
                self.ctx.VSSetSamplers(slot, count, ptr);
            }
            if stages.contains(api::ShaderStages::HULL) {
                self.ctx.HSSetSamplers(slot, count, ptr);
            }
            if stages.contains(api::ShaderStages::DOMAIN) {
                self.ctx.DSSetSamplers(slot, count, ptr);
            }
            if stages.contains(api::ShaderStages::GEOMETRY) {
                self.ctx.GSSetSamplers(slot, count, ptr);
            }
            if stages.contains(api::ShaderStages::PIXEL) {
                self.ctx.PSSetSamplers(slot, count, ptr);
            }
            if stages.contains(api::ShaderStages::COMPUTE) {
                self.ctx.CSSetSamplers(slot, count, ptr);
            }
        }
    }

    unsafe fn bind_shader_resource_views(
        &self,
        stages: api::ShaderStages,
        slot: u32,
        views: &[*mut d3d11::ID3D11ShaderResourceView],
    ) {
        let count = views.len() as u32;
        let ptr = views.as_ptr();
        unsafe {
            if stages.contains(api::ShaderStages::VERTEX) {
                self.ctx.VSSetShaderResources(slot, count, ptr);
            }
            if stages.contains(api::ShaderStages::HULL) {
                self.ctx.HSSetShaderResources(slot, count, ptr);
            }
            if stages.contains(api::ShaderStages::DOMAIN) {
                self.ctx.DSSetShaderResources(slot, count, ptr);
            }
            if stages.contains(api::ShaderStages::GEOMETRY) {
                self.ctx.GSSetShaderResources(slot, count, ptr);
            }
            if stages.contains(api::ShaderStages::PIXEL) {
                self.ctx.PSSetShaderResources(slot, count, ptr);
            }
            if stages.contains(api::ShaderStages::COMPUTE) {
                self.ctx.CSSetShaderResources(slot, count, ptr);
            }
        }
    }

    unsafe fn bind_unordered_access_views(
        &self,
        stages: api::ShaderStages,
        slot: u32,
        views: &[*mut d3d11::ID3D11UnorderedAccessView],
    ) {
        // Only the compute stage has freely indexable UAV slots.
        if stages.contains(api::ShaderStages::COMPUTE) {
            unsafe {
                self.ctx.CSSetUnorderedAccessViews(
                    slot,
                    views.len() as u32,
                    views.as_ptr(),
                    ptr::null(),
                )
            };
        }
    }

    /// Applies one descriptor range to the requested stages. `words` is
    /// the 64-bit payload encoding of `binding.rs`.
    unsafe fn apply_descriptors(
        &self,
        stages: api::ShaderStages,
        ty: api::DescriptorType,
        slot: u32,
        words: &[u64],
    ) {
        match ty {
            api::DescriptorType::Sampler => {
                let samplers: SmallVec<[_; 16]> = words
                    .iter()
                    .map(|&word| word as *mut d3d11::ID3D11SamplerState)
                    .collect();
                unsafe { self.bind_samplers(stages, slot, &samplers) };
            }
            api::DescriptorType::ShaderResourceView => {
                let views: SmallVec<[_; 16]> = words
                    .iter()
                    .map(|&word| word as *mut d3d11::ID3D11ShaderResourceView)
                    .collect();
                unsafe { self.bind_shader_resource_views(stages, slot, &views) };
            }
            api::DescriptorType::UnorderedAccessView => {
                let views: SmallVec<[_; 16]> = words
                    .iter()
                    .map(|&word| word as *mut d3d11::ID3D11UnorderedAccessView)
                    .collect();
                unsafe { self.bind_unordered_access_views(stages, slot, &views) };
            }
            api::DescriptorType::ConstantBuffer => {
                // Buffer range offsets require the 11.1 SetConstantBuffers1
                // path; the merged layouts this backend produces bind
                // whole buffers.
                debug_assert!(words.chunks_exact(3).all(|range| range[1] == 0));
                let buffers: SmallVec<[_; 16]> = words
                    .chunks_exact(3)
                    .map(|range| range[0] as *mut d3d11::ID3D11Buffer)
                    .collect();
                unsafe { self.bind_constant_buffers(stages, slot, &buffers) };
            }
            api::DescriptorType::SamplerWithResourceView => {
                let samplers: SmallVec<[_; 16]> = words
                    .chunks_exact(2)
                    .map(|pair| pair[0] as *mut d3d11::ID3D11SamplerState)
                    .collect();
                let views: SmallVec<[_; 16]> = words
                    .chunks_exact(2)
                    .map(|pair| pair[1] as *mut d3d11::ID3D11ShaderResourceView)
                    .collect();
                unsafe {
                    self.bind_samplers(stages, slot, &samplers);
                    self.bind_shader_resource_views(stages, slot, &views);
                }
            }
        }
    }
}

impl ApiObject for CommandContext {
    fn native(&self) -> u64 {
        self.ctx.as_mut_ptr() as u64
    }

    fn private_data(&self, key: &[u8; 16]) -> u64 {
        self.private.get(key)
    }

    fn set_private_data(&self, key: &[u8; 16], value: u64) {
        self.private.set(key, value)
    }
}

impl crate::CommandList for CommandContext {
    fn device(&self) -> &dyn crate::Device {
        &self.device
    }

    fn barrier(
        &mut self,
        resources: &[api::Resource],
        old_states: &[api::ResourceUsage],
        new_states: &[api::ResourceUsage],
    ) -> Result<(), CommandError> {
        if resources.len() != old_states.len() || resources.len() != new_states.len() {
            return Err(CommandError::InvalidArgument("state count mismatch"));
        }
        self.events()
            .barrier
            .notify(|cb| cb(self, resources, old_states, new_states));

        // D3D11 tracks hazards itself, but a view of a resource that is
        // being rebound as a render target or rewritten through UAVs
        // must not stay bound, so collect the transitions that matter
        // and scrub the bind points.
        let mut away_from_shader_resource: SmallVec<[u64; 8]> = SmallVec::new();
        let mut away_from_unordered_access: SmallVec<[u64; 8]> = SmallVec::new();
        for ((&resource, &old_state), &new_state) in
            resources.iter().zip(old_states).zip(new_states)
        {
            if old_state.intersects(api::ResourceUsage::SHADER_RESOURCE)
                && !new_state.intersects(api::ResourceUsage::SHADER_RESOURCE)
                // Copy states do not read through the bound SRVs.
                && new_state.intersects(
                    api::ResourceUsage::DEPTH_STENCIL | api::ResourceUsage::RENDER_TARGET,
                )
            {
                away_from_shader_resource.push(resource.0);
            }
            if old_state.intersects(api::ResourceUsage::UNORDERED_ACCESS)
                && !new_state.intersects(api::ResourceUsage::UNORDERED_ACCESS)
            {
                away_from_unordered_access.push(resource.0);
            }
        }

        if !away_from_shader_resource.is_empty() {
            const SLOTS: usize = d3d11::D3D11_COMMONSHADER_INPUT_RESOURCE_SLOT_COUNT as usize;

            macro_rules! unbind_shader_resource_views {
                ($get:ident, $set:ident) => {{
                    let mut views: [*mut d3d11::ID3D11ShaderResourceView; SLOTS] =
                        [ptr::null_mut(); SLOTS];
                    unsafe { self.ctx.$get(0, SLOTS as u32, views.as_mut_ptr()) };
                    let mut update = false;
                    for view in views.iter_mut() {
                        if view.is_null() {
                            continue;
                        }
                        let mut resource = ptr::null_mut::<d3d11::ID3D11Resource>();
                        unsafe { (**view).GetResource(&mut resource) };
                        let stale = away_from_shader_resource.contains(&(resource as u64));
                        unsafe { (*resource).Release() };
                        if stale {
                            unsafe { (**view).Release() };
                            *view = ptr::null_mut();
                            update = true;
                        }
                    }
                    if update {
                        unsafe { self.ctx.$set(0, SLOTS as u32, views.as_ptr()) };
                    }
                    for view in views {
                        if !view.is_null() {
                            unsafe { (*view).Release() };
                        }
                    }
                }};
            }

            unbind_shader_resource_views!(VSGetShaderResources, VSSetShaderResources);
            unbind_shader_resource_views!(HSGetShaderResources, HSSetShaderResources);
            unbind_shader_resource_views!(DSGetShaderResources, DSSetShaderResources);
            unbind_shader_resource_views!(GSGetShaderResources, GSSetShaderResources);
            unbind_shader_resource_views!(PSGetShaderResources, PSSetShaderResources);
            unbind_shader_resource_views!(CSGetShaderResources, CSSetShaderResources);
        }

        if !away_from_unordered_access.is_empty() {
            let max_slots = if self.device.shared.feature_level >= d3dcommon::D3D_FEATURE_LEVEL_11_1
            {
                d3d11::D3D11_1_UAV_SLOT_COUNT as usize
            } else if self.device.shared.feature_level == d3dcommon::D3D_FEATURE_LEVEL_11_0 {
                d3d11::D3D11_PS_CS_UAV_REGISTER_COUNT as usize
            } else {
                d3d11::D3D11_CS_4_X_UAV_REGISTER_COUNT as usize
            };

            let mut views: [*mut d3d11::ID3D11UnorderedAccessView;
                d3d11::D3D11_1_UAV_SLOT_COUNT as usize] =
                [ptr::null_mut(); d3d11::D3D11_1_UAV_SLOT_COUNT as usize];
            unsafe {
                self.ctx
                    .CSGetUnorderedAccessViews(0, max_slots as u32, views.as_mut_ptr())
            };
            let mut update = false;
            for view in views[..max_slots].iter_mut() {
                if view.is_null() {
                    continue;
                }
                let mut resource = ptr::null_mut::<d3d11::ID3D11Resource>();
                unsafe { (**view).GetResource(&mut resource) };
                let stale = away_from_unordered_access.contains(&(resource as u64));
                unsafe { (*resource).Release() };
                if stale {
                    unsafe { (**view).Release() };
                    *view = ptr::null_mut();
                    update = true;
                }
            }
            if update {
                unsafe {
                    self.ctx.CSSetUnorderedAccessViews(
                        0,
                        max_slots as u32,
                        views.as_ptr(),
                        ptr::null(),
                    )
                };
            }
            for view in &views[..max_slots] {
                if !view.is_null() {
                    unsafe { (**view).Release() };
                }
            }
        }

        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        render_targets: &[api::RenderPassRenderTargetDesc],
        depth_stencil: Option<&api::RenderPassDepthStencilDesc>,
    ) -> Result<(), CommandError> {
        if self.render_pass_open {
            return Err(CommandError::RenderPassActive);
        }
        if render_targets.len() > api::MAX_RENDER_TARGETS {
            return Err(CommandError::InvalidArgument("render target count"));
        }
        self.render_pass_open = true;

        let views: ArrayVec<_, { api::MAX_RENDER_TARGETS }> = render_targets
            .iter()
            .map(|rt| rt.view.0 as *mut d3d11::ID3D11RenderTargetView)
            .collect();
        let dsv = depth_stencil.map_or(ptr::null_mut(), |ds| {
            ds.view.0 as *mut d3d11::ID3D11DepthStencilView
        });
        unsafe {
            self.ctx
                .OMSetRenderTargets(views.len() as u32, views.as_ptr(), dsv)
        };

        // Render passes carry their load-op clears with them.
        for rt in render_targets {
            if let Some(color) = rt.load_clear {
                unsafe {
                    self.ctx.ClearRenderTargetView(
                        rt.view.0 as *mut d3d11::ID3D11RenderTargetView,
                        &color,
                    )
                };
            }
        }
        if let Some(ds) = depth_stencil {
            let mut flags = 0;
            if ds.clear_depth.is_some() {
                flags |= d3d11::D3D11_CLEAR_DEPTH;
            }
            if ds.clear_stencil.is_some() {
                flags |= d3d11::D3D11_CLEAR_STENCIL;
            }
            if flags != 0 {
                unsafe {
                    self.ctx.ClearDepthStencilView(
                        ds.view.0 as *mut d3d11::ID3D11DepthStencilView,
                        flags,
                        ds.clear_depth.unwrap_or(1.0),
                        ds.clear_stencil.unwrap_or(0),
                    )
                };
            }
        }

        self.events()
            .begin_render_pass
            .notify(|cb| cb(self, render_targets, depth_stencil));
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<(), CommandError> {
        if !self.render_pass_open {
            return Err(CommandError::RenderPassNotActive);
        }
        self.render_pass_open = false;
        self.events().end_render_pass.notify(|cb| cb(self));
        Ok(())
    }

    fn bind_render_targets_and_depth_stencil(
        &mut self,
        render_targets: &[api::ResourceView],
        depth_stencil: api::ResourceView,
    ) -> Result<(), CommandError> {
        if self.render_pass_open {
            return Err(CommandError::RenderPassActive);
        }
        if render_targets.len() > api::MAX_RENDER_TARGETS {
            return Err(CommandError::InvalidArgument("render target count"));
        }

        let views: ArrayVec<_, { api::MAX_RENDER_TARGETS }> = render_targets
            .iter()
            .map(|view| view.0 as *mut d3d11::ID3D11RenderTargetView)
            .collect();
        unsafe {
            self.ctx.OMSetRenderTargets(
                views.len() as u32,
                views.as_ptr(),
                depth_stencil.0 as *mut d3d11::ID3D11DepthStencilView,
            )
        };

        self.events()
            .bind_render_targets_and_depth_stencil
            .notify(|cb| cb(self, render_targets, depth_stencil));
        Ok(())
    }

    fn bind_pipeline(&mut self, stages: api::PipelineStages, pipeline: api::Pipeline) {
        match decode_pipeline(pipeline) {
            Some(DecodedPipeline::Owned { index, generation }) => {
                let arena = self.device.shared.pipelines.lock();
                match arena.get(index, generation) {
                    Some(bundle) => unsafe { bundle.apply(&self.ctx, stages) },
                    None => log::warn!("bind_pipeline called with a stale handle"),
                }
            }
            Some(DecodedPipeline::Native(raw)) => unsafe {
                if stages.contains(api::PipelineStages::VERTEX_SHADER) {
                    self.ctx
                        .VSSetShader(raw as *mut d3d11::ID3D11VertexShader, ptr::null(), 0);
                }
                if stages.contains(api::PipelineStages::HULL_SHADER) {
                    self.ctx
                        .HSSetShader(raw as *mut d3d11::ID3D11HullShader, ptr::null(), 0);
                }
                if stages.contains(api::PipelineStages::DOMAIN_SHADER) {
                    self.ctx
                        .DSSetShader(raw as *mut d3d11::ID3D11DomainShader, ptr::null(), 0);
                }
                if stages.contains(api::PipelineStages::GEOMETRY_SHADER) {
                    self.ctx
                        .GSSetShader(raw as *mut d3d11::ID3D11GeometryShader, ptr::null(), 0);
                }
                if stages.contains(api::PipelineStages::PIXEL_SHADER) {
                    self.ctx
                        .PSSetShader(raw as *mut d3d11::ID3D11PixelShader, ptr::null(), 0);
                }
                if stages.contains(api::PipelineStages::COMPUTE_SHADER) {
                    self.ctx
                        .CSSetShader(raw as *mut d3d11::ID3D11ComputeShader, ptr::null(), 0);
                }
                if stages.contains(api::PipelineStages::INPUT_ASSEMBLER) {
                    self.ctx.IASetInputLayout(raw as *mut d3d11::ID3D11InputLayout);
                }
                if stages.contains(api::PipelineStages::RASTERIZER) {
                    self.ctx.RSSetState(raw as *mut d3d11::ID3D11RasterizerState);
                }
                if stages.contains(api::PipelineStages::DEPTH_STENCIL) {
                    self.ctx
                        .OMSetDepthStencilState(raw as *mut d3d11::ID3D11DepthStencilState, 0);
                }
                if stages.contains(api::PipelineStages::OUTPUT_MERGER) {
                    self.ctx.OMSetBlendState(
                        raw as *mut d3d11::ID3D11BlendState,
                        &[1.0, 1.0, 1.0, 1.0],
                        !0,
                    );
                }
            },
            None => unsafe {
                // Null handle unbinds the requested stages.
                if stages.contains(api::PipelineStages::VERTEX_SHADER) {
                    self.ctx.VSSetShader(ptr::null_mut(), ptr::null(), 0);
                }
                if stages.contains(api::PipelineStages::HULL_SHADER) {
                    self.ctx.HSSetShader(ptr::null_mut(), ptr::null(), 0);
                }
                if stages.contains(api::PipelineStages::DOMAIN_SHADER) {
                    self.ctx.DSSetShader(ptr::null_mut(), ptr::null(), 0);
                }
                if stages.contains(api::PipelineStages::GEOMETRY_SHADER) {
                    self.ctx.GSSetShader(ptr::null_mut(), ptr::null(), 0);
                }
                if stages.contains(api::PipelineStages::PIXEL_SHADER) {
                    self.ctx.PSSetShader(ptr::null_mut(), ptr::null(), 0);
                }
                if stages.contains(api::PipelineStages::COMPUTE_SHADER) {
                    self.ctx.CSSetShader(ptr::null_mut(), ptr::null(), 0);
                }
            },
        }
        self.events()
            .bind_pipeline
            .notify(|cb| cb(self, stages, pipeline));
    }

    fn bind_pipeline_states(
        &mut self,
        states: &[api::DynamicState],
        values: &[u32],
    ) -> Result<(), CommandError> {
        if states.len() != values.len() {
            return Err(CommandError::InvalidArgument("state count mismatch"));
        }
        for (&state, &value) in states.iter().zip(values) {
            match state {
                api::DynamicState::PrimitiveTopology => unsafe {
                    self.ctx
                        .IASetPrimitiveTopology(conv::map_topology(
                            api::PrimitiveTopology::from_u32(value),
                        ));
                },
                api::DynamicState::StencilReference => unsafe {
                    let mut current = ptr::null_mut::<d3d11::ID3D11DepthStencilState>();
                    let mut old_reference = 0;
                    self.ctx.OMGetDepthStencilState(&mut current, &mut old_reference);
                    self.ctx.OMSetDepthStencilState(current, value);
                    if !current.is_null() {
                        (*current).Release();
                    }
                },
                api::DynamicState::BlendConstant => unsafe {
                    let mut current = ptr::null_mut::<d3d11::ID3D11BlendState>();
                    let mut constant = [0.0f32; 4];
                    let mut sample_mask = 0;
                    self.ctx
                        .OMGetBlendState(&mut current, &mut constant, &mut sample_mask);
                    let constant = [
                        (value & 0xff) as f32 / 255.0,
                        ((value >> 8) & 0xff) as f32 / 255.0,
                        ((value >> 16) & 0xff) as f32 / 255.0,
                        ((value >> 24) & 0xff) as f32 / 255.0,
                    ];
                    self.ctx.OMSetBlendState(current, &constant, sample_mask);
                    if !current.is_null() {
                        (*current).Release();
                    }
                },
                api::DynamicState::SampleMask => unsafe {
                    let mut current = ptr::null_mut::<d3d11::ID3D11BlendState>();
                    let mut constant = [0.0f32; 4];
                    let mut sample_mask = 0;
                    self.ctx
                        .OMGetBlendState(&mut current, &mut constant, &mut sample_mask);
                    self.ctx.OMSetBlendState(current, &constant, value);
                    if !current.is_null() {
                        (*current).Release();
                    }
                },
                _ => return Err(CommandError::InvalidArgument("dynamic state")),
            }
        }
        self.events()
            .bind_pipeline_states
            .notify(|cb| cb(self, states, values));
        Ok(())
    }

    fn bind_viewports(
        &mut self,
        first: u32,
        viewports: &[api::Viewport],
    ) -> Result<(), CommandError> {
        // Viewport arrays always start at slot zero in D3D11.
        if first != 0 {
            return Err(CommandError::InvalidArgument("viewport start index"));
        }
        let native: SmallVec<[_; 8]> = viewports.iter().map(conv::map_viewport).collect();
        unsafe { self.ctx.RSSetViewports(native.len() as u32, native.as_ptr()) };
        self.events()
            .bind_viewports
            .notify(|cb| cb(self, first, viewports));
        Ok(())
    }

    fn bind_scissor_rects(&mut self, first: u32, rects: &[api::Rect]) -> Result<(), CommandError> {
        if first != 0 {
            return Err(CommandError::InvalidArgument("scissor start index"));
        }
        let native: SmallVec<[_; 8]> = rects.iter().map(conv::map_rect).collect();
        unsafe { self.ctx.RSSetScissorRects(native.len() as u32, native.as_ptr()) };
        self.events()
            .bind_scissor_rects
            .notify(|cb| cb(self, first, rects));
        Ok(())
    }

    fn push_constants(
        &mut self,
        stages: api::ShaderStages,
        layout: api::PipelineLayout,
        param: u32,
        first: u32,
        values: &[u32],
    ) -> Result<(), CommandError> {
        if values.is_empty() {
            return Ok(());
        }
        let end = first as usize + values.len();

        // Grow-only high-water buffer. Shrinking would just churn
        // allocations the next time a larger update comes through.
        if end > self.push_constants_data.len() {
            self.push_constants_data.resize(end, 0);

            let desc = d3d11::D3D11_BUFFER_DESC {
                ByteWidth: ((end * std::mem::size_of::<u32>()) as u32 + 15) & !15,
                Usage: d3d11::D3D11_USAGE_DYNAMIC,
                BindFlags: d3d11::D3D11_BIND_CONSTANT_BUFFER,
                CPUAccessFlags: d3d11::D3D11_CPU_ACCESS_WRITE,
                MiscFlags: 0,
                StructureByteStride: 0,
            };
            let mut buffer = ComPtr::<d3d11::ID3D11Buffer>::null();
            if !SUCCEEDED(unsafe {
                self.device
                    .shared
                    .raw
                    .CreateBuffer(&desc, ptr::null(), buffer.mut_self())
            }) {
                self.push_constants_data.clear();
                log::error!("failed to grow the push constant buffer");
                return Err(CommandError::Device(crate::DeviceError::CreationFailed));
            }
            self.push_constants = buffer;
        }

        self.push_constants_data[first as usize..end].copy_from_slice(values);

        // Discard-map so the driver hands out fresh memory instead of
        // stalling on a region the GPU may still be reading.
        let mut mapped = unsafe { std::mem::zeroed::<d3d11::D3D11_MAPPED_SUBRESOURCE>() };
        if SUCCEEDED(unsafe {
            self.ctx.Map(
                self.push_constants.as_mut_ptr() as *mut d3d11::ID3D11Resource,
                0,
                d3d11::D3D11_MAP_WRITE_DISCARD,
                0,
                &mut mapped,
            )
        }) {
            unsafe {
                ptr::copy_nonoverlapping(
                    self.push_constants_data.as_ptr(),
                    mapped.pData as *mut u32,
                    self.push_constants_data.len(),
                );
                self.ctx
                    .Unmap(self.push_constants.as_mut_ptr() as *mut d3d11::ID3D11Resource, 0);
            }
        }

        let mut slot = 0;
        let mut stages = stages;
        if !layout.is_null() {
            let layout_data = unsafe { &*(layout.0 as *const PipelineLayoutData) };
            match layout_data.merged.get(param as usize) {
                Some(&MergedParam::Constants {
                    register,
                    visibility,
                    ..
                }) => {
                    slot = register;
                    stages &= visibility;
                }
                _ => return Err(CommandError::InvalidArgument("layout parameter index")),
            }
        }

        let buffer = self.push_constants.as_mut_ptr();
        unsafe { self.bind_constant_buffers(stages, slot, &[buffer]) };

        self.events()
            .push_constants
            .notify(|cb| cb(self, stages, layout, param, first, values));
        Ok(())
    }

    fn push_descriptors(
        &mut self,
        stages: api::ShaderStages,
        layout: api::PipelineLayout,
        param: u32,
        update: &api::DescriptorTableUpdate,
    ) -> Result<(), CommandError> {
        if layout.is_null() {
            return Err(CommandError::InvalidArgument("null pipeline layout"));
        }
        let layout_data = unsafe { &*(layout.0 as *const PipelineLayoutData) };
        let (ty, base_binding, register, visibility) = match layout_data.merged.get(param as usize)
        {
            Some(&MergedParam::Descriptors {
                ty,
                base_binding,
                register,
                visibility,
                ..
            }) => (ty, base_binding, register, visibility),
            _ => return Err(CommandError::InvalidArgument("layout parameter index")),
        };
        if ty != update.descriptors.ty() {
            return Err(CommandError::Device(
                crate::binding::DescriptorError::TypeMismatch.into(),
            ));
        }

        // Encode through the shared payload representation so push and
        // table binds agree on slot arithmetic.
        let mut scratch = crate::binding::DescriptorTableData::new(
            ty,
            update.descriptors.len() as u32,
            0,
        );
        scratch
            .write(0, 0, &update.descriptors)
            .map_err(crate::DeviceError::from)?;

        let slot = register + update.binding.wrapping_sub(base_binding) + update.array_offset;
        unsafe { self.apply_descriptors(stages & visibility, ty, slot, scratch.words()) };

        self.events()
            .push_descriptors
            .notify(|cb| cb(self, stages, layout, param, update));
        Ok(())
    }

    fn bind_descriptor_tables(
        &mut self,
        stages: api::ShaderStages,
        layout: api::PipelineLayout,
        first: u32,
        tables: &[api::DescriptorTable],
    ) -> Result<(), CommandError> {
        if layout.is_null() {
            return Err(CommandError::InvalidArgument("null pipeline layout"));
        }
        let layout_data = unsafe { &*(layout.0 as *const PipelineLayoutData) };

        for (i, table) in tables.iter().enumerate() {
            if table.is_null() {
                continue;
            }
            let (ty, register, visibility) =
                match layout_data.merged.get(first as usize + i) {
                    Some(&MergedParam::Descriptors {
                        ty,
                        register,
                        visibility,
                        ..
                    }) => (ty, register, visibility),
                    _ => return Err(CommandError::InvalidArgument("layout parameter index")),
                };

            let data = unsafe { &*(table.0 as *const TableData) };
            if data.data.ty != ty {
                return Err(CommandError::Device(
                    crate::binding::DescriptorError::TypeMismatch.into(),
                ));
            }
            unsafe {
                self.apply_descriptors(stages & visibility, ty, register, data.data.words())
            };
        }

        self.events()
            .bind_descriptor_tables
            .notify(|cb| cb(self, stages, layout, first, tables));
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: api::Resource, offset: u64, index_size: u32) {
        let format = match index_size {
            2 => winapi::shared::dxgiformat::DXGI_FORMAT_R16_UINT,
            _ => winapi::shared::dxgiformat::DXGI_FORMAT_R32_UINT,
        };
        unsafe {
            self.ctx.IASetIndexBuffer(
                buffer.0 as *mut d3d11::ID3D11Buffer,
                format,
                offset as u32,
            )
        };
        self.events()
            .bind_index_buffer
            .notify(|cb| cb(self, buffer, offset, index_size));
    }

    fn bind_vertex_buffers(
        &mut self,
        first: u32,
        buffers: &[api::Resource],
        offsets: &[u64],
        strides: &[u32],
    ) -> Result<(), CommandError> {
        if buffers.len() != offsets.len() || buffers.len() != strides.len() {
            return Err(CommandError::InvalidArgument("buffer count mismatch"));
        }
        let native: SmallVec<[_; 8]> = buffers
            .iter()
            .map(|buffer| buffer.0 as *mut d3d11::ID3D11Buffer)
            .collect();
        let native_offsets: SmallVec<[u32; 8]> =
            offsets.iter().map(|&offset| offset as u32).collect();
        unsafe {
            self.ctx.IASetVertexBuffers(
                first,
                native.len() as u32,
                native.as_ptr(),
                strides.as_ptr(),
                native_offsets.as_ptr(),
            )
        };
        self.events()
            .bind_vertex_buffers
            .notify(|cb| cb(self, first, buffers, offsets, strides));
        Ok(())
    }

    fn bind_stream_output_buffers(
        &mut self,
        first: u32,
        buffers: &[api::Resource],
        offsets: &[u64],
        max_sizes: Option<&[u64]>,
    ) -> Result<(), CommandError> {
        if buffers.len() != offsets.len() {
            return Err(CommandError::InvalidArgument("buffer count mismatch"));
        }
        // Stream output targets bind from slot zero as one batch.
        if first != 0 {
            return Err(CommandError::InvalidArgument("stream output start index"));
        }
        let native: SmallVec<[_; 4]> = buffers
            .iter()
            .map(|buffer| buffer.0 as *mut d3d11::ID3D11Buffer)
            .collect();
        let native_offsets: SmallVec<[u32; 4]> =
            offsets.iter().map(|&offset| offset as u32).collect();
        unsafe {
            self.ctx
                .SOSetTargets(native.len() as u32, native.as_ptr(), native_offsets.as_ptr())
        };
        self.events()
            .bind_stream_output_buffers
            .notify(|cb| cb(self, first, buffers, offsets, max_sizes));
        Ok(())
    }

    fn draw(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) {
        if self.events().draw.veto(|cb| {
            cb(self, vertex_count, instance_count, first_vertex, first_instance)
        }) {
            return;
        }
        unsafe {
            self.ctx
                .DrawInstanced(vertex_count, instance_count, first_vertex, first_instance)
        };
    }

    fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) {
        if self.events().draw_indexed.veto(|cb| {
            cb(
                self,
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance,
            )
        }) {
            return;
        }
        unsafe {
            self.ctx.DrawIndexedInstanced(
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance,
            )
        };
    }

    fn dispatch(
        &mut self,
        group_count_x: u32,
        group_count_y: u32,
        group_count_z: u32,
    ) -> Result<(), CommandError> {
        if !crate::Device::check_capability(&self.device, api::Capability::ComputeShader) {
            return Err(CommandError::MissingCapability(api::Capability::ComputeShader));
        }
        if self
            .events()
            .dispatch
            .veto(|cb| cb(self, group_count_x, group_count_y, group_count_z))
        {
            return Ok(());
        }
        unsafe { self.ctx.Dispatch(group_count_x, group_count_y, group_count_z) };
        Ok(())
    }

    fn draw_or_dispatch_indirect(
        &mut self,
        ty: api::IndirectCommand,
        buffer: api::Resource,
        offset: u64,
        draw_count: u32,
        stride: u32,
    ) -> Result<(), CommandError> {
        if !crate::Device::check_capability(&self.device, api::Capability::DrawOrDispatchIndirect) {
            return Err(CommandError::MissingCapability(
                api::Capability::DrawOrDispatchIndirect,
            ));
        }
        if self
            .events()
            .draw_or_dispatch_indirect
            .veto(|cb| cb(self, ty, buffer, offset, draw_count, stride))
        {
            return Ok(());
        }

        let raw = buffer.0 as *mut d3d11::ID3D11Buffer;
        for i in 0..draw_count as u64 {
            let args_offset = (offset + i * stride as u64) as u32;
            unsafe {
                match ty {
                    api::IndirectCommand::Draw => {
                        self.ctx.DrawInstancedIndirect(raw, args_offset)
                    }
                    api::IndirectCommand::DrawIndexed => {
                        self.ctx.DrawIndexedInstancedIndirect(raw, args_offset)
                    }
                    api::IndirectCommand::Dispatch => self.ctx.DispatchIndirect(raw, args_offset),
                    api::IndirectCommand::Unknown => {
                        return Err(CommandError::InvalidArgument("indirect command type"))
                    }
                }
            }
        }
        Ok(())
    }

    fn copy_resource(&mut self, source: api::Resource, dest: api::Resource) {
        if self
            .events()
            .copy_resource
            .veto(|cb| cb(self, source, dest))
        {
            return;
        }
        unsafe {
            self.ctx.CopyResource(
                dest.0 as *mut d3d11::ID3D11Resource,
                source.0 as *mut d3d11::ID3D11Resource,
            )
        };
    }

    fn copy_buffer_region(
        &mut self,
        source: api::Resource,
        source_offset: u64,
        dest: api::Resource,
        dest_offset: u64,
        size: u64,
    ) -> Result<(), CommandError> {
        if self.events().copy_buffer_region.veto(|cb| {
            cb(self, source, source_offset, dest, dest_offset, size)
        }) {
            return Ok(());
        }

        if size == api::WHOLE_SIZE {
            if source_offset != 0 || dest_offset != 0 {
                return Err(CommandError::InvalidArgument(
                    "whole-size copy with offsets",
                ));
            }
            unsafe {
                self.ctx.CopyResource(
                    dest.0 as *mut d3d11::ID3D11Resource,
                    source.0 as *mut d3d11::ID3D11Resource,
                )
            };
            return Ok(());
        }

        let source_box = d3d11::D3D11_BOX {
            left: source_offset as u32,
            top: 0,
            front: 0,
            right: (source_offset + size) as u32,
            bottom: 1,
            back: 1,
        };
        unsafe {
            self.ctx.CopySubresourceRegion(
                dest.0 as *mut d3d11::ID3D11Resource,
                0,
                dest_offset as u32,
                0,
                0,
                source.0 as *mut d3d11::ID3D11Resource,
                0,
                &source_box,
            )
        };
        Ok(())
    }

    fn copy_buffer_to_texture(
        &mut self,
        source: api::Resource,
        source_offset: u64,
        row_length: u32,
        slice_height: u32,
        dest: api::Resource,
        dest_subresource: u32,
        dest_box: Option<&api::SubresourceBox>,
    ) -> Result<(), CommandError> {
        if self.events().copy_buffer_to_texture.veto(|cb| {
            cb(
                self,
                source,
                source_offset,
                row_length,
                slice_height,
                dest,
                dest_subresource,
                dest_box,
            )
        }) {
            return Ok(());
        }
        // No direct buffer-to-texture copy exists in this API.
        Err(CommandError::MissingCapability(
            api::Capability::CopyBufferToTexture,
        ))
    }

    fn copy_texture_region(
        &mut self,
        source: api::Resource,
        source_subresource: u32,
        source_box: Option<&api::SubresourceBox>,
        dest: api::Resource,
        dest_subresource: u32,
        dest_box: Option<&api::SubresourceBox>,
        filter: api::FilterMode,
    ) -> Result<(), CommandError> {
        if let (Some(src), Some(dst)) = (source_box, dest_box) {
            if src.width() != dst.width()
                || src.height() != dst.height()
                || src.depth() != dst.depth()
            {
                // A dimension-changing copy is a scaling blit.
                return Err(CommandError::MissingCapability(api::Capability::Blit));
            }
        }
        if self.events().copy_texture_region.veto(|cb| {
            cb(
                self,
                source,
                source_subresource,
                source_box,
                dest,
                dest_subresource,
                dest_box,
                filter,
            )
        }) {
            return Ok(());
        }

        let native_box = source_box.map(conv::map_box);
        let (dest_x, dest_y, dest_z) =
            dest_box.map_or((0, 0, 0), |b| (b.left, b.top, b.front));
        unsafe {
            self.ctx.CopySubresourceRegion(
                dest.0 as *mut d3d11::ID3D11Resource,
                dest_subresource,
                dest_x,
                dest_y,
                dest_z,
                source.0 as *mut d3d11::ID3D11Resource,
                source_subresource,
                native_box.as_ref().map_or(ptr::null(), |b| b),
            )
        };
        Ok(())
    }

    fn copy_texture_to_buffer(
        &mut self,
        source: api::Resource,
        source_subresource: u32,
        source_box: Option<&api::SubresourceBox>,
        dest: api::Resource,
        dest_offset: u64,
        row_length: u32,
        slice_height: u32,
    ) -> Result<(), CommandError> {
        if self.events().copy_texture_to_buffer.veto(|cb| {
            cb(
                self,
                source,
                source_subresource,
                source_box,
                dest,
                dest_offset,
                row_length,
                slice_height,
            )
        }) {
            return Ok(());
        }
        Err(CommandError::MissingCapability(
            api::Capability::CopyBufferToTexture,
        ))
    }

    fn resolve_texture_region(
        &mut self,
        source: api::Resource,
        source_subresource: u32,
        source_box: Option<&api::SubresourceBox>,
        dest: api::Resource,
        dest_subresource: u32,
        dest_x: i32,
        dest_y: i32,
        dest_z: i32,
        format: api::Format,
    ) -> Result<(), CommandError> {
        // Only whole-subresource resolves exist here.
        if source_box.is_some() || dest_x != 0 || dest_y != 0 || dest_z != 0 {
            return Err(CommandError::MissingCapability(api::Capability::ResolveRegion));
        }
        if self.events().resolve_texture_region.veto(|cb| {
            cb(
                self,
                source,
                source_subresource,
                source_box,
                dest,
                dest_subresource,
                dest_x,
                dest_y,
                dest_z,
                format,
            )
        }) {
            return Ok(());
        }
        unsafe {
            self.ctx.ResolveSubresource(
                dest.0 as *mut d3d11::ID3D11Resource,
                dest_subresource,
                source.0 as *mut d3d11::ID3D11Resource,
                source_subresource,
                conv::map_format(format),
            )
        };
        Ok(())
    }

    fn clear_depth_stencil_view(
        &mut self,
        dsv: api::ResourceView,
        depth: Option<f32>,
        stencil: Option<u8>,
        rects: &[api::Rect],
    ) -> Result<(), CommandError> {
        // Clears always cover the whole view in this API.
        if !rects.is_empty() {
            return Err(CommandError::InvalidArgument("clear rectangles"));
        }
        if self
            .events()
            .clear_depth_stencil_view
            .veto(|cb| cb(self, dsv, depth, stencil, rects))
        {
            return Ok(());
        }
        let mut flags = 0;
        if depth.is_some() {
            flags |= d3d11::D3D11_CLEAR_DEPTH;
        }
        if stencil.is_some() {
            flags |= d3d11::D3D11_CLEAR_STENCIL;
        }
        unsafe {
            self.ctx.ClearDepthStencilView(
                dsv.0 as *mut d3d11::ID3D11DepthStencilView,
                flags,
                depth.unwrap_or(1.0),
                stencil.unwrap_or(0),
            )
        };
        Ok(())
    }

    fn clear_render_target_view(
        &mut self,
        rtv: api::ResourceView,
        color: &[f32; 4],
        rects: &[api::Rect],
    ) -> Result<(), CommandError> {
        if !rects.is_empty() {
            return Err(CommandError::InvalidArgument("clear rectangles"));
        }
        if self
            .events()
            .clear_render_target_view
            .veto(|cb| cb(self, rtv, color, rects))
        {
            return Ok(());
        }
        unsafe {
            self.ctx
                .ClearRenderTargetView(rtv.0 as *mut d3d11::ID3D11RenderTargetView, color)
        };
        Ok(())
    }

    fn clear_unordered_access_view_uint(
        &mut self,
        uav: api::ResourceView,
        values: &[u32; 4],
        rects: &[api::Rect],
    ) -> Result<(), CommandError> {
        if !rects.is_empty() {
            return Err(CommandError::InvalidArgument("clear rectangles"));
        }
        if self
            .events()
            .clear_unordered_access_view_uint
            .veto(|cb| cb(self, uav, values, rects))
        {
            return Ok(());
        }
        unsafe {
            self.ctx.ClearUnorderedAccessViewUint(
                uav.0 as *mut d3d11::ID3D11UnorderedAccessView,
                values,
            )
        };
        Ok(())
    }

    fn clear_unordered_access_view_float(
        &mut self,
        uav: api::ResourceView,
        values: &[f32; 4],
        rects: &[api::Rect],
    ) -> Result<(), CommandError> {
        if !rects.is_empty() {
            return Err(CommandError::InvalidArgument("clear rectangles"));
        }
        if self
            .events()
            .clear_unordered_access_view_float
            .veto(|cb| cb(self, uav, values, rects))
        {
            return Ok(());
        }
        unsafe {
            self.ctx.ClearUnorderedAccessViewFloat(
                uav.0 as *mut d3d11::ID3D11UnorderedAccessView,
                values,
            )
        };
        Ok(())
    }

    fn generate_mipmaps(&mut self, srv: api::ResourceView) -> Result<(), CommandError> {
        if srv.is_null() {
            return Err(CommandError::InvalidArgument("null shader resource view"));
        }
        if self.events().generate_mipmaps.veto(|cb| cb(self, srv)) {
            return Ok(());
        }
        unsafe {
            self.ctx
                .GenerateMips(srv.0 as *mut d3d11::ID3D11ShaderResourceView)
        };
        Ok(())
    }

    fn begin_query(
        &mut self,
        pool: api::QueryPool,
        ty: api::QueryType,
        index: u32,
    ) -> Result<(), CommandError> {
        if pool.is_null() {
            return Err(CommandError::InvalidArgument("null query pool"));
        }
        if ty == api::QueryType::Timestamp {
            return Err(CommandError::InvalidArgument("timestamp queries only end"));
        }
        if self
            .events()
            .begin_query
            .veto(|cb| cb(self, pool, ty, index))
        {
            return Ok(());
        }
        let data = unsafe { &*(pool.0 as *const QueryPoolData) };
        let query = data
            .queries
            .get(index as usize)
            .ok_or(CommandError::InvalidArgument("query index"))?;
        unsafe {
            self.ctx
                .Begin(query.as_mut_ptr() as *mut d3d11::ID3D11Asynchronous)
        };
        Ok(())
    }

    fn end_query(
        &mut self,
        pool: api::QueryPool,
        ty: api::QueryType,
        index: u32,
    ) -> Result<(), CommandError> {
        if pool.is_null() {
            return Err(CommandError::InvalidArgument("null query pool"));
        }
        if self.events().end_query.veto(|cb| cb(self, pool, ty, index)) {
            return Ok(());
        }
        let data = unsafe { &*(pool.0 as *const QueryPoolData) };
        let query = data
            .queries
            .get(index as usize)
            .ok_or(CommandError::InvalidArgument("query index"))?;
        unsafe {
            self.ctx
                .End(query.as_mut_ptr() as *mut d3d11::ID3D11Asynchronous)
        };
        Ok(())
    }

    fn copy_query_pool_results(
        &mut self,
        pool: api::QueryPool,
        ty: api::QueryType,
        first: u32,
        count: u32,
        dest: api::Resource,
        dest_offset: u64,
        stride: u32,
    ) -> Result<(), CommandError> {
        if self.events().copy_query_pool_results.veto(|cb| {
            cb(self, pool, ty, first, count, dest, dest_offset, stride)
        }) {
            return Ok(());
        }
        // Query results cannot resolve into a GPU buffer here; readback
        // goes through `Device::get_query_pool_results`.
        Err(CommandError::MissingCapability(
            api::Capability::CopyQueryPoolResults,
        ))
    }

    fn begin_debug_event(&mut self, label: &str, _color: [f32; 4]) {
        if !self.annotation.is_null() {
            let label = wide(label);
            unsafe { self.annotation.BeginEvent(label.as_ptr()) };
        }
    }

    fn end_debug_event(&mut self) {
        if !self.annotation.is_null() {
            unsafe { self.annotation.EndEvent() };
        }
    }

    fn insert_debug_marker(&mut self, label: &str, _color: [f32; 4]) {
        if !self.annotation.is_null() {
            let label = wide(label);
            unsafe { self.annotation.SetMarker(label.as_ptr()) };
        }
    }
}

impl crate::CommandQueue for CommandContext {
    fn device(&self) -> &dyn crate::Device {
        &self.device
    }

    fn queue_type(&self) -> api::QueueType {
        api::QueueType::GRAPHICS | api::QueueType::COMPUTE | api::QueueType::COPY
    }

    fn wait_idle(&self) {
        // There is no blocking wait primitive; issue an event query and
        // spin on it with a yielding sleep until the GPU drains.
        let desc = d3d11::D3D11_QUERY_DESC {
            Query: d3d11::D3D11_QUERY_EVENT,
            MiscFlags: 0,
        };
        let mut query = ComPtr::<d3d11::ID3D11Query>::null();
        if !SUCCEEDED(unsafe { self.device.shared.raw.CreateQuery(&desc, query.mut_self()) }) {
            return;
        }
        unsafe {
            self.ctx
                .End(query.as_mut_ptr() as *mut d3d11::ID3D11Asynchronous);
            self.ctx.Flush();
            let mut signaled: BOOL = 0;
            loop {
                let hr = self.ctx.GetData(
                    query.as_mut_ptr() as *mut d3d11::ID3D11Asynchronous,
                    &mut signaled as *mut BOOL as *mut c_void,
                    std::mem::size_of::<BOOL>() as u32,
                    0,
                );
                if hr != S_FALSE {
                    break;
                }
                synchapi::Sleep(0);
            }
        }
    }

    fn flush_immediate_command_list(&mut self) {
        unsafe { self.ctx.Flush() };
    }

    fn immediate_command_list(&mut self) -> Option<&mut dyn crate::CommandList> {
        Some(self)
    }

    fn signal_fence(&mut self, fence: api::Fence, value: u64) -> bool {
        if fence.is_null() {
            return false;
        }
        match unsafe { &*(fence.0 as *const FenceData) } {
            FenceData::Cpu(cpu) => {
                // Pending GPU work ordered before the signal must not be
                // observable after it, so push it to the driver first.
                unsafe { self.ctx.Flush() };
                cpu.signal(value);
                true
            }
            FenceData::KeyedMutex(mutex) => {
                SUCCEEDED(unsafe { mutex.ReleaseSync(value) })
            }
        }
    }

    fn wait_fence(&mut self, fence: api::Fence, value: u64) -> bool {
        if fence.is_null() {
            return false;
        }
        match unsafe { &*(fence.0 as *const FenceData) } {
            FenceData::Cpu(cpu) => {
                if cpu.completed_value() >= value {
                    return true;
                }
                // No native wait-on-fence entry point: fall back to a
                // full drain, then give the signaler a short grace
                // window.
                self.wait_idle();
                cpu.wait(value, Some(std::time::Duration::from_millis(100)), || {})
            }
            FenceData::KeyedMutex(mutex) => {
                SUCCEEDED(unsafe { mutex.AcquireSync(value, 5000) })
            }
        }
    }

    fn begin_debug_event(&mut self, label: &str, _color: [f32; 4]) {
        if !self.annotation.is_null() {
            let label = wide(label);
            unsafe { self.annotation.BeginEvent(label.as_ptr()) };
        }
    }

    fn end_debug_event(&mut self) {
        if !self.annotation.is_null() {
            unsafe { self.annotation.EndEvent() };
        }
    }

    fn insert_debug_marker(&mut self, label: &str, _color: [f32; 4]) {
        if !self.annotation.is_null() {
            let label = wide(label);
            unsafe { self.annotation.SetMarker(label.as_ptr()) };
        }
    }
}

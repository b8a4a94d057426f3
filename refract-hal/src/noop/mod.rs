//! An inert backend that records object state in host memory and issues
//! no GPU work at all.
//!
//! Exists for the same reason as a dummy backend in any layered graphics
//! stack: it exercises the full trait surface (event ordering, veto
//! semantics, lifecycle rules, descriptor arithmetic, fence emulation)
//! without a native driver, which is what the test-suite runs against on
//! every platform.

use std::sync::Arc;

use crate::binding::{self, DescriptorTableData, MergedParam};
use crate::events::EventRegistry;
use crate::fence::CpuFence;
use crate::Device as _;
use crate::{ApiObject, CommandError, DeviceError, PrivateDataStore, SharedHandle};

struct SamplerRecord {
    #[allow(dead_code)]
    desc: api::SamplerDesc,
}

struct ResourceRecord {
    desc: api::ResourceDesc,
    // Host-memory backing so map/update return real pointers.
    storage: Vec<u8>,
}

struct ViewRecord {
    resource: api::Resource,
    #[allow(dead_code)]
    usage: api::ResourceUsage,
    desc: api::ResourceViewDesc,
}

struct PipelineRecord {
    #[allow(dead_code)]
    compute: bool,
}

struct LayoutRecord {
    merged: Vec<MergedParam>,
}

struct TableRecord {
    data: DescriptorTableData,
}

struct QueryPoolRecord {
    #[allow(dead_code)]
    ty: api::QueryType,
    size: u32,
}

struct FenceRecord {
    fence: CpuFence,
}

fn box_handle<T>(record: T) -> u64 {
    Box::into_raw(Box::new(record)) as u64
}

unsafe fn drop_handle<T>(handle: u64) {
    if handle != 0 {
        drop(unsafe { Box::from_raw(handle as *mut T) });
    }
}

unsafe fn record<'a, T>(handle: u64) -> &'a T {
    unsafe { &*(handle as *const T) }
}

// The caller serializes mutation against concurrent reads, per the
// descriptor update contract.
#[allow(clippy::mut_from_ref)]
unsafe fn record_mut<'a, T>(handle: u64) -> &'a mut T {
    unsafe { &mut *(handle as *mut T) }
}

fn buffer_storage_len(desc: &api::ResourceDesc) -> usize {
    match desc.dim {
        api::ResourceDim::Buffer { size } => size as usize,
        api::ResourceDim::Texture {
            width,
            height,
            depth_or_layers,
            format,
            ..
        } => {
            width as usize
                * height as usize
                * depth_or_layers as usize
                * format.block_size_bytes().max(1) as usize
        }
    }
}

struct DeviceShared {
    events: Arc<EventRegistry>,
    private: PrivateDataStore,
    caps: u64,
}

/// The inert device. Cloning shares the underlying context.
#[derive(Clone)]
pub struct Device {
    shared: Arc<DeviceShared>,
}

impl Device {
    pub fn new(events: Arc<EventRegistry>) -> Self {
        // Everything is "supported" when nothing is executed.
        Self::with_capabilities(events, !0)
    }

    /// A device whose `check_capability` answers from the given bit mask
    /// (bit index = capability discriminant), for tests that need an
    /// impoverished backend.
    pub fn with_capabilities(events: Arc<EventRegistry>, caps: u64) -> Self {
        let device = Self {
            shared: Arc::new(DeviceShared {
                events,
                private: PrivateDataStore::default(),
                caps,
            }),
        };
        device.shared.events.init_device.notify(|cb| cb(&device));
        device
    }

    fn events(&self) -> &EventRegistry {
        &self.shared.events
    }
}

impl ApiObject for Device {
    fn native(&self) -> u64 {
        Arc::as_ptr(&self.shared) as u64
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
        api::Backend::Noop
    }

    fn check_capability(&self, capability: api::Capability) -> bool {
        self.shared.caps & (1 << (capability as u32)) != 0
    }

    fn check_format_support(&self, format: api::Format, _usage: api::ResourceUsage) -> bool {
        format != api::Format::Unknown
    }

    fn create_sampler(&self, desc: &api::SamplerDesc) -> Result<api::Sampler, DeviceError> {
        let mut desc = *desc;
        self.events()
            .create_sampler
            .modify(|cb| cb(self, &mut desc));

        let handle = api::Sampler(box_handle(SamplerRecord { desc }));
        self.events()
            .init_sampler
            .notify(|cb| cb(self, &desc, handle));
        Ok(handle)
    }

    fn destroy_sampler(&self, sampler: api::Sampler) {
        if sampler.is_null() {
            return;
        }
        self.events().destroy_sampler.notify(|cb| cb(self, sampler));
        unsafe { drop_handle::<SamplerRecord>(sampler.0) };
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

        if desc
            .flags
            .intersects(api::ResourceFlags::SHARED | api::ResourceFlags::SHARED_NT_HANDLE)
        {
            match shared {
                None => return Err(DeviceError::InvalidArgument("shared handle slot")),
                Some(slot) if slot.is_null() => {
                    // Export path: hand out a synthetic handle.
                    *slot = SharedHandle(1 as *mut _);
                }
                Some(_) => {
                    // Import path: the resource already has contents.
                    if !initial_data.is_empty() {
                        return Err(DeviceError::InvalidArgument(
                            "initial data on imported resource",
                        ));
                    }
                }
            }
        }

        let handle = api::Resource(box_handle(ResourceRecord {
            desc,
            storage: vec![0; buffer_storage_len(&desc)],
        }));
        self.events()
            .init_resource
            .notify(|cb| cb(self, &desc, initial_data, initial_state, handle));
        Ok(handle)
    }

    fn destroy_resource(&self, resource: api::Resource) {
        if resource.is_null() {
            return;
        }
        self.events()
            .destroy_resource
            .notify(|cb| cb(self, resource));
        unsafe { drop_handle::<ResourceRecord>(resource.0) };
    }

    fn resource_desc(&self, resource: api::Resource) -> api::ResourceDesc {
        debug_assert!(!resource.is_null());
        unsafe { record::<ResourceRecord>(resource.0) }.desc
    }

    fn create_resource_view(
        &self,
        resource: api::Resource,
        usage_type: api::ResourceUsage,
        desc: &api::ResourceViewDesc,
    ) -> Result<api::ResourceView, DeviceError> {
        let mut desc = *desc;
        self.events()
            .create_resource_view
            .modify(|cb| cb(self, resource, usage_type, &mut desc));

        if desc.format().is_typeless() {
            return Err(DeviceError::InvalidArgument("typeless view format"));
        }

        let handle = api::ResourceView(box_handle(ViewRecord {
            resource,
            usage: usage_type,
            desc,
        }));
        self.events()
            .init_resource_view
            .notify(|cb| cb(self, resource, usage_type, &desc, handle));
        Ok(handle)
    }

    fn destroy_resource_view(&self, view: api::ResourceView) {
        if view.is_null() {
            return;
        }
        self.events()
            .destroy_resource_view
            .notify(|cb| cb(self, view));
        unsafe { drop_handle::<ViewRecord>(view.0) };
    }

    fn resource_from_view(&self, view: api::ResourceView) -> api::Resource {
        if view.is_null() {
            return api::Resource::NULL;
        }
        unsafe { record::<ViewRecord>(view.0) }.resource
    }

    fn resource_view_desc(&self, view: api::ResourceView) -> api::ResourceViewDesc {
        debug_assert!(!view.is_null());
        unsafe { record::<ViewRecord>(view.0) }.desc
    }

    fn map_buffer_region(
        &self,
        resource: api::Resource,
        offset: u64,
        size: u64,
        access: api::MapAccess,
    ) -> Result<*mut u8, DeviceError> {
        let rec = unsafe { record::<ResourceRecord>(resource.0) };
        if !rec.desc.is_buffer() {
            return Err(DeviceError::InvalidArgument("not a buffer"));
        }
        let len = rec.storage.len() as u64;
        if offset > len || (size != api::WHOLE_SIZE && offset + size > len) {
            return Err(DeviceError::InvalidArgument("map range"));
        }

        let data = unsafe { rec.storage.as_ptr().add(offset as usize) as *mut u8 };
        self.events()
            .map_buffer_region
            .notify(|cb| cb(self, resource, offset, size, access, data));
        Ok(data)
    }

    fn unmap_buffer_region(&self, resource: api::Resource) {
        self.events()
            .unmap_buffer_region
            .notify(|cb| cb(self, resource));
    }

    fn map_texture_region(
        &self,
        resource: api::Resource,
        subresource: u32,
        sub_box: Option<&api::SubresourceBox>,
        access: api::MapAccess,
    ) -> Result<api::SubresourceData, DeviceError> {
        // Partial mapping is unsupported on every backend, uniformly.
        if sub_box.is_some() {
            return Err(DeviceError::InvalidArgument("texture sub-box mapping"));
        }
        let rec = unsafe { record::<ResourceRecord>(resource.0) };
        let (width, format) = match rec.desc.dim {
            api::ResourceDim::Texture { width, format, .. } => (width, format),
            api::ResourceDim::Buffer { .. } => {
                return Err(DeviceError::InvalidArgument("not a texture"))
            }
        };

        let row_pitch = width * format.block_size_bytes().max(1);
        let data = api::SubresourceData {
            data: rec.storage.as_ptr() as *mut u8,
            row_pitch,
            slice_pitch: rec.storage.len() as u32,
        };
        self.events()
            .map_texture_region
            .notify(|cb| cb(self, resource, subresource, access, &data));
        Ok(data)
    }

    fn unmap_texture_region(&self, resource: api::Resource, subresource: u32) {
        self.events()
            .unmap_texture_region
            .notify(|cb| cb(self, resource, subresource));
    }

    fn update_buffer_region(
        &self,
        data: &[u8],
        resource: api::Resource,
        offset: u64,
    ) -> Result<(), DeviceError> {
        if self
            .events()
            .update_buffer_region
            .veto(|cb| cb(self, data, resource, offset))
        {
            return Ok(());
        }

        let rec = unsafe { record_mut::<ResourceRecord>(resource.0) };
        let offset = offset as usize;
        if offset + data.len() > rec.storage.len() {
            return Err(DeviceError::InvalidArgument("update range"));
        }
        rec.storage[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn update_texture_region(
        &self,
        data: &api::SubresourceData,
        resource: api::Resource,
        subresource: u32,
        sub_box: Option<&api::SubresourceBox>,
    ) -> Result<(), DeviceError> {
        if self
            .events()
            .update_texture_region
            .veto(|cb| cb(self, data, resource, subresource, sub_box))
        {
            return Ok(());
        }
        Ok(())
    }

    fn create_pipeline(&self, desc: &api::PipelineDesc) -> Result<api::Pipeline, DeviceError> {
        let mut desc = desc.clone();
        self.events()
            .create_pipeline
            .modify(|cb| cb(self, &mut desc));

        let handle = api::Pipeline(box_handle(PipelineRecord {
            compute: desc.is_compute(),
        }));
        self.events()
            .init_pipeline
            .notify(|cb| cb(self, &desc, handle));
        Ok(handle)
    }

    fn destroy_pipeline(&self, pipeline: api::Pipeline) {
        if pipeline.is_null() {
            return;
        }
        self.events()
            .destroy_pipeline
            .notify(|cb| cb(self, pipeline));
        unsafe { drop_handle::<PipelineRecord>(pipeline.0) };
    }

    fn create_pipeline_layout(
        &self,
        params: &[api::PipelineLayoutParam],
    ) -> Result<api::PipelineLayout, DeviceError> {
        self.events()
            .create_pipeline_layout
            .modify(|cb| cb(self, params));

        let merged = binding::merge_layout_params(params)?;
        let handle = api::PipelineLayout(box_handle(LayoutRecord { merged }));
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
        unsafe { drop_handle::<LayoutRecord>(layout.0) };
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
        let layout_rec = unsafe { record::<LayoutRecord>(layout.0) };
        let merged = layout_rec
            .merged
            .get(param as usize)
            .ok_or(DeviceError::InvalidArgument("layout parameter index"))?;

        let mut tables = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let data = DescriptorTableData::for_param(merged)?;
            tables.push(api::DescriptorTable(box_handle(TableRecord { data })));
        }
        Ok(tables)
    }

    fn free_descriptor_tables(&self, tables: &[api::DescriptorTable]) {
        for table in tables {
            unsafe { drop_handle::<TableRecord>(table.0) };
        }
    }

    fn descriptor_table_layout(
        &self,
        table: api::DescriptorTable,
    ) -> Option<(api::DescriptorType, u32, u32)> {
        if table.is_null() {
            return None;
        }
        let rec = unsafe { record::<TableRecord>(table.0) };
        Some((rec.data.ty, rec.data.base_binding, rec.data.count))
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
            let rec = unsafe { record_mut::<TableRecord>(update.table.0) };
            rec.data
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
            let source = unsafe { record::<TableRecord>(copy.source_table.0) };
            let dest = unsafe { record_mut::<TableRecord>(copy.dest_table.0) };
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
        self.events()
            .create_query_pool
            .modify(|cb| cb(self, ty, &mut size));

        let handle = api::QueryPool(box_handle(QueryPoolRecord { ty, size }));
        self.events()
            .init_query_pool
            .notify(|cb| cb(self, ty, size, handle));
        Ok(handle)
    }

    fn destroy_query_pool(&self, pool: api::QueryPool) {
        if pool.is_null() {
            return;
        }
        self.events()
            .destroy_query_pool
            .notify(|cb| cb(self, pool));
        unsafe { drop_handle::<QueryPoolRecord>(pool.0) };
    }

    fn get_query_pool_results(
        &self,
        pool: api::QueryPool,
        first: u32,
        count: u32,
        results: &mut [u8],
        stride: u32,
    ) -> bool {
        if self
            .events()
            .get_query_pool_results
            .veto(|cb| cb(self, pool, first, count))
        {
            return true;
        }

        let rec = unsafe { record::<QueryPoolRecord>(pool.0) };
        if first + count > rec.size {
            return false;
        }
        // No GPU ran, so every query trivially completed with zero.
        for slot in results.chunks_mut(stride as usize).take(count as usize) {
            slot.fill(0);
        }
        true
    }

    fn create_fence(
        &self,
        initial_value: u64,
        _flags: api::FenceFlags,
        _shared: Option<&mut SharedHandle>,
    ) -> Result<api::Fence, DeviceError> {
        let handle = api::Fence(box_handle(FenceRecord {
            fence: CpuFence::new(initial_value),
        }));
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
        unsafe { drop_handle::<FenceRecord>(fence.0) };
    }

    fn set_resource_name(&self, _resource: api::Resource, _name: &str) {}
    fn set_resource_view_name(&self, _view: api::ResourceView, _name: &str) {}

    fn event_registry(&self) -> &EventRegistry {
        self.events()
    }
}

/// The immediate context of the inert backend: command list and command
/// queue in one object, since there is no deferred recording.
///
/// Counts the "native" commands it would have issued, so tests can
/// verify that a vetoed command issues none.
pub struct CommandContext {
    device: Device,
    private: PrivateDataStore,
    render_pass_open: bool,
    push_constants: Vec<u32>,
    pub commands_issued: u64,
}

impl CommandContext {
    pub fn new(device: Device) -> Self {
        let context = Self {
            device,
            private: PrivateDataStore::default(),
            render_pass_open: false,
            push_constants: Vec::new(),
            commands_issued: 0,
        };
        let events = Arc::clone(&context.device.shared.events);
        events.init_command_queue.notify(|cb| cb(&context));
        events.init_command_list.notify(|cb| cb(&context));
        context
    }

    /// High-water capacity of the emulated push-constant buffer, in
    /// 32-bit values.
    pub fn push_constant_capacity(&self) -> usize {
        self.push_constants.capacity().max(self.push_constants.len())
    }

    fn events(&self) -> &EventRegistry {
        &self.device.shared.events
    }
}

impl ApiObject for CommandContext {
    fn native(&self) -> u64 {
        self as *const _ as u64
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
        self.render_pass_open = true;
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
        if !self
            .device
            .check_capability(api::Capability::BindRenderTargetsAndDepthStencil)
        {
            return Err(CommandError::MissingCapability(
                api::Capability::BindRenderTargetsAndDepthStencil,
            ));
        }
        self.events()
            .bind_render_targets_and_depth_stencil
            .notify(|cb| cb(self, render_targets, depth_stencil));
        self.commands_issued += 1;
        Ok(())
    }

    fn bind_pipeline(&mut self, stages: api::PipelineStages, pipeline: api::Pipeline) {
        self.events()
            .bind_pipeline
            .notify(|cb| cb(self, stages, pipeline));
        self.commands_issued += 1;
    }

    fn bind_pipeline_states(
        &mut self,
        states: &[api::DynamicState],
        values: &[u32],
    ) -> Result<(), CommandError> {
        if states.len() != values.len() {
            return Err(CommandError::InvalidArgument("state count mismatch"));
        }
        self.events()
            .bind_pipeline_states
            .notify(|cb| cb(self, states, values));
        self.commands_issued += 1;
        Ok(())
    }

    fn bind_viewports(
        &mut self,
        first: u32,
        viewports: &[api::Viewport],
    ) -> Result<(), CommandError> {
        if first != 0 && !self.device.check_capability(api::Capability::MultiViewport) {
            return Err(CommandError::MissingCapability(api::Capability::MultiViewport));
        }
        self.events()
            .bind_viewports
            .notify(|cb| cb(self, first, viewports));
        self.commands_issued += 1;
        Ok(())
    }

    fn bind_scissor_rects(&mut self, first: u32, rects: &[api::Rect]) -> Result<(), CommandError> {
        if first != 0 && !self.device.check_capability(api::Capability::MultiViewport) {
            return Err(CommandError::MissingCapability(api::Capability::MultiViewport));
        }
        self.events()
            .bind_scissor_rects
            .notify(|cb| cb(self, first, rects));
        self.commands_issued += 1;
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
        if layout.is_null() {
            return Err(CommandError::InvalidArgument("null pipeline layout"));
        }
        let layout_rec = unsafe { record::<LayoutRecord>(layout.0) };
        match layout_rec.merged.get(param as usize) {
            Some(MergedParam::Constants { .. }) => {}
            _ => return Err(CommandError::InvalidArgument("layout parameter index")),
        }

        // Grow-only high-water storage, mirroring the emulated constant
        // buffer of backends without native push constants.
        let end = first as usize + values.len();
        if end > self.push_constants.len() {
            self.push_constants.resize(end, 0);
        }
        self.push_constants[first as usize..end].copy_from_slice(values);

        self.events()
            .push_constants
            .notify(|cb| cb(self, stages, layout, param, first, values));
        self.commands_issued += 1;
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
        let layout_rec = unsafe { record::<LayoutRecord>(layout.0) };
        match layout_rec.merged.get(param as usize) {
            Some(MergedParam::Descriptors { ty, .. }) if *ty == update.descriptors.ty() => {}
            Some(MergedParam::Descriptors { .. }) => {
                return Err(CommandError::Device(
                    crate::binding::DescriptorError::TypeMismatch.into(),
                ))
            }
            _ => return Err(CommandError::InvalidArgument("layout parameter index")),
        }
        self.events()
            .push_descriptors
            .notify(|cb| cb(self, stages, layout, param, update));
        self.commands_issued += 1;
        Ok(())
    }

    fn bind_descriptor_tables(
        &mut self,
        stages: api::ShaderStages,
        layout: api::PipelineLayout,
        first: u32,
        tables: &[api::DescriptorTable],
    ) -> Result<(), CommandError> {
        self.events()
            .bind_descriptor_tables
            .notify(|cb| cb(self, stages, layout, first, tables));
        self.commands_issued += 1;
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: api::Resource, offset: u64, index_size: u32) {
        self.events()
            .bind_index_buffer
            .notify(|cb| cb(self, buffer, offset, index_size));
        self.commands_issued += 1;
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
        self.events()
            .bind_vertex_buffers
            .notify(|cb| cb(self, first, buffers, offsets, strides));
        self.commands_issued += 1;
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
        self.events()
            .bind_stream_output_buffers
            .notify(|cb| cb(self, first, buffers, offsets, max_sizes));
        self.commands_issued += 1;
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
        self.commands_issued += 1;
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
        self.commands_issued += 1;
    }

    fn dispatch(
        &mut self,
        group_count_x: u32,
        group_count_y: u32,
        group_count_z: u32,
    ) -> Result<(), CommandError> {
        if !self.device.check_capability(api::Capability::ComputeShader) {
            return Err(CommandError::MissingCapability(api::Capability::ComputeShader));
        }
        if self
            .events()
            .dispatch
            .veto(|cb| cb(self, group_count_x, group_count_y, group_count_z))
        {
            return Ok(());
        }
        self.commands_issued += 1;
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
        if !self
            .device
            .check_capability(api::Capability::DrawOrDispatchIndirect)
        {
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
        self.commands_issued += 1;
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
        self.commands_issued += 1;
    }

    fn copy_buffer_region(
        &mut self,
        source: api::Resource,
        source_offset: u64,
        dest: api::Resource,
        dest_offset: u64,
        size: u64,
    ) -> Result<(), CommandError> {
        if self
            .events()
            .copy_buffer_region
            .veto(|cb| cb(self, source, source_offset, dest, dest_offset, size))
        {
            return Ok(());
        }
        self.commands_issued += 1;
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
        self.commands_issued += 1;
        Ok(())
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
            let scales = src.width() != dst.width()
                || src.height() != dst.height()
                || src.depth() != dst.depth();
            if scales && !self.device.check_capability(api::Capability::Blit) {
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
        self.commands_issued += 1;
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
        self.commands_issued += 1;
        Ok(())
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
        let partial = source_box.is_some() || dest_x != 0 || dest_y != 0 || dest_z != 0;
        if partial && !self.device.check_capability(api::Capability::ResolveRegion) {
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
        self.commands_issued += 1;
        Ok(())
    }

    fn clear_depth_stencil_view(
        &mut self,
        dsv: api::ResourceView,
        depth: Option<f32>,
        stencil: Option<u8>,
        rects: &[api::Rect],
    ) -> Result<(), CommandError> {
        if self
            .events()
            .clear_depth_stencil_view
            .veto(|cb| cb(self, dsv, depth, stencil, rects))
        {
            return Ok(());
        }
        self.commands_issued += 1;
        Ok(())
    }

    fn clear_render_target_view(
        &mut self,
        rtv: api::ResourceView,
        color: &[f32; 4],
        rects: &[api::Rect],
    ) -> Result<(), CommandError> {
        if self
            .events()
            .clear_render_target_view
            .veto(|cb| cb(self, rtv, color, rects))
        {
            return Ok(());
        }
        self.commands_issued += 1;
        Ok(())
    }

    fn clear_unordered_access_view_uint(
        &mut self,
        uav: api::ResourceView,
        values: &[u32; 4],
        rects: &[api::Rect],
    ) -> Result<(), CommandError> {
        if self
            .events()
            .clear_unordered_access_view_uint
            .veto(|cb| cb(self, uav, values, rects))
        {
            return Ok(());
        }
        self.commands_issued += 1;
        Ok(())
    }

    fn clear_unordered_access_view_float(
        &mut self,
        uav: api::ResourceView,
        values: &[f32; 4],
        rects: &[api::Rect],
    ) -> Result<(), CommandError> {
        if self
            .events()
            .clear_unordered_access_view_float
            .veto(|cb| cb(self, uav, values, rects))
        {
            return Ok(());
        }
        self.commands_issued += 1;
        Ok(())
    }

    fn generate_mipmaps(&mut self, srv: api::ResourceView) -> Result<(), CommandError> {
        if self.events().generate_mipmaps.veto(|cb| cb(self, srv)) {
            return Ok(());
        }
        self.commands_issued += 1;
        Ok(())
    }

    fn begin_query(
        &mut self,
        pool: api::QueryPool,
        ty: api::QueryType,
        index: u32,
    ) -> Result<(), CommandError> {
        if self
            .events()
            .begin_query
            .veto(|cb| cb(self, pool, ty, index))
        {
            return Ok(());
        }
        self.commands_issued += 1;
        Ok(())
    }

    fn end_query(
        &mut self,
        pool: api::QueryPool,
        ty: api::QueryType,
        index: u32,
    ) -> Result<(), CommandError> {
        if self.events().end_query.veto(|cb| cb(self, pool, ty, index)) {
            return Ok(());
        }
        self.commands_issued += 1;
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
        if !self
            .device
            .check_capability(api::Capability::CopyQueryPoolResults)
        {
            return Err(CommandError::MissingCapability(
                api::Capability::CopyQueryPoolResults,
            ));
        }
        if self.events().copy_query_pool_results.veto(|cb| {
            cb(self, pool, ty, first, count, dest, dest_offset, stride)
        }) {
            return Ok(());
        }
        self.commands_issued += 1;
        Ok(())
    }

    fn begin_debug_event(&mut self, _label: &str, _color: [f32; 4]) {}
    fn end_debug_event(&mut self) {}
    fn insert_debug_marker(&mut self, _label: &str, _color: [f32; 4]) {}
}

impl crate::CommandQueue for CommandContext {
    fn device(&self) -> &dyn crate::Device {
        &self.device
    }

    fn queue_type(&self) -> api::QueueType {
        api::QueueType::GRAPHICS | api::QueueType::COMPUTE | api::QueueType::COPY
    }

    fn wait_idle(&self) {}

    fn flush_immediate_command_list(&mut self) {}

    fn immediate_command_list(&mut self) -> Option<&mut dyn crate::CommandList> {
        Some(self)
    }

    fn signal_fence(&mut self, fence: api::Fence, value: u64) -> bool {
        if fence.is_null() {
            return false;
        }
        unsafe { record::<FenceRecord>(fence.0) }.fence.signal(value);
        true
    }

    fn wait_fence(&mut self, fence: api::Fence, value: u64) -> bool {
        if fence.is_null() {
            return false;
        }
        let rec = unsafe { record::<FenceRecord>(fence.0) };
        rec.fence
            .wait(value, Some(std::time::Duration::from_secs(5)), || {})
    }

    fn begin_debug_event(&mut self, _label: &str, _color: [f32; 4]) {}
    fn end_debug_event(&mut self) {}
    fn insert_debug_marker(&mut self, _label: &str, _color: [f32; 4]) {}
}

/// Swap chain of the inert backend: one host-memory back buffer.
pub struct Swapchain {
    device: Device,
    private: PrivateDataStore,
    desc: api::SwapchainDesc,
    back_buffer: api::Resource,
}

impl Swapchain {
    pub fn new(device: Device, desc: api::SwapchainDesc) -> Result<Self, crate::SwapchainError> {
        let mut desc = desc;
        device
            .events()
            .create_swapchain
            .modify(|cb| cb(&mut desc));

        let mut swapchain = Self {
            device,
            private: PrivateDataStore::default(),
            desc,
            back_buffer: api::Resource::NULL,
        };
        swapchain.on_init()?;
        Ok(swapchain)
    }

    pub fn on_init(&mut self) -> Result<(), crate::SwapchainError> {
        let back_buffer = self
            .device
            .create_resource(&self.desc.back_buffer, &[], api::ResourceUsage::PRESENT, None)
            .map_err(|_| crate::SwapchainError::BackBufferUnavailable)?;
        self.back_buffer = back_buffer;
        let events = Arc::clone(&self.device.shared.events);
        events.init_swapchain.notify(|cb| cb(self));
        Ok(())
    }

    pub fn on_reset(&mut self) {
        if self.back_buffer.is_null() {
            return;
        }
        let events = Arc::clone(&self.device.shared.events);
        events.destroy_swapchain.notify(|cb| cb(self));
        self.device.destroy_resource(self.back_buffer);
        self.back_buffer = api::Resource::NULL;
    }

    pub fn on_present(&mut self, queue: &CommandContext) {
        if self.back_buffer.is_null() {
            return;
        }
        let events = Arc::clone(&self.device.shared.events);
        events.present.notify(|cb| cb(queue, self));
    }

    pub fn is_initialized(&self) -> bool {
        !self.back_buffer.is_null()
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        self.on_reset();
    }
}

impl ApiObject for Swapchain {
    fn native(&self) -> u64 {
        self as *const _ as u64
    }

    fn private_data(&self, key: &[u8; 16]) -> u64 {
        self.private.get(key)
    }

    fn set_private_data(&self, key: &[u8; 16], value: u64) {
        self.private.set(key, value)
    }
}

impl crate::Swapchain for Swapchain {
    fn device(&self) -> &dyn crate::Device {
        &self.device
    }

    fn window(&self) -> u64 {
        0
    }

    fn back_buffer(&self, index: u32) -> api::Resource {
        debug_assert_eq!(index, 0);
        self.back_buffer
    }

    fn back_buffer_count(&self) -> u32 {
        1
    }

    fn current_back_buffer_index(&self) -> u32 {
        0
    }

    fn color_space(&self) -> api::ColorSpace {
        api::ColorSpace::SrgbNonLinear
    }
}

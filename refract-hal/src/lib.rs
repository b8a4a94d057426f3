/*! Device and command abstraction core of the refract graphics
 *  interception layer.
 *
 *  This library sits between a host application and its native graphics
 *  driver. The per-API hook shims (not part of this crate) forward every
 *  intercepted call into one of the backend implementations here, which
 *  translates between the unified object model of [`api`] and the native
 *  structures, and notifies registered extension callbacks before and
 *  after each operation. Observers can rewrite creation parameters or
 *  veto commands entirely.
 *
 *  Guiding rules, shared by every backend:
 *  - Objects are addressed by opaque 64-bit handles that alias the native
 *    pointer wherever the backend allows; there is no hidden global
 *    registry.
 *  - Nothing here blocks cooperatively; `wait_idle` is a true
 *    driver-level wait. Execution happens synchronously on whichever
 *    application thread called into the native API.
 *  - A device is safe to use from multiple threads; a single command list
 *    must only ever be recorded from one thread at a time.
 *  - Failures are returned as `Result` values, never thrown, and never
 *    retried internally.
 */

#![allow(
    // We don't use syntax sugar where it's not necessary.
    clippy::match_like_matches_macro,
    // Redundant matching is more explicit.
    clippy::redundant_pattern_matching,
)]
#![warn(trivial_casts, trivial_numeric_casts, unused_qualifications)]

use std::ffi::c_void;

use fxhash::FxHashMap;
use parking_lot::Mutex;
use thiserror::Error;

pub mod binding;
pub mod events;
pub mod fence;
pub mod noop;
pub mod output;
pub mod present;

pub(crate) mod auxil;

#[cfg(all(windows, feature = "d3d11"))]
pub mod d3d11;

pub use events::EventRegistry;

#[cfg(windows)]
pub use auxil::dxgi::output::DxgiOutputProvider;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("out of memory")]
    OutOfMemory,
    #[error("device is lost")]
    Lost,
    #[error("operation is not supported by this device")]
    Unsupported,
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("native object creation failed")]
    CreationFailed,
    #[error(transparent)]
    Layout(#[from] binding::PipelineLayoutError),
    #[error(transparent)]
    Descriptor(#[from] binding::DescriptorError),
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("a render pass is already active")]
    RenderPassActive,
    #[error("no render pass is active")]
    RenderPassNotActive,
    #[error("operation requires the {0:?} capability")]
    MissingCapability(api::Capability),
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error(transparent)]
    Device(#[from] DeviceError),
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SwapchainError {
    #[error("the back buffer could not be retrieved")]
    BackBufferUnavailable,
    #[error("swap chain is not initialized")]
    NotInitialized,
    #[error("{0}")]
    Other(&'static str),
    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// An OS-level sharing handle (a win32 `HANDLE` on Windows).
///
/// `create_resource` and `create_fence` use one slot for a two-direction
/// protocol: passing a slot holding a null handle *exports* a newly
/// created shared handle into it, passing a non-null handle *imports* the
/// object behind it (in which case no initial data is permitted).
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SharedHandle(pub *mut c_void);

impl SharedHandle {
    pub const NULL: Self = Self(std::ptr::null_mut());

    #[inline]
    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

unsafe impl Send for SharedHandle {}

/// User-defined data attached to an API object, keyed by a caller-chosen
/// 16-byte identifier. Lets extensions associate persistent state with
/// objects they do not own.
#[derive(Default)]
pub struct PrivateDataStore {
    slots: Mutex<FxHashMap<[u8; 16], u64>>,
}

impl PrivateDataStore {
    pub fn get(&self, key: &[u8; 16]) -> u64 {
        self.slots.lock().get(key).copied().unwrap_or(0)
    }

    pub fn set(&self, key: &[u8; 16], value: u64) {
        if value == 0 {
            self.slots.lock().remove(key);
        } else {
            self.slots.lock().insert(*key, value);
        }
    }
}

/// Base contract of every object exposed across the extension boundary.
pub trait ApiObject: Send + Sync {
    /// The underlying native object, as a raw 64-bit value.
    fn native(&self) -> u64;

    /// Reads back a user-defined value previously stored with
    /// [`set_private_data`](Self::set_private_data), or zero.
    fn private_data(&self, key: &[u8; 16]) -> u64;

    /// Stores a user-defined value on the object. Storing zero removes
    /// the entry.
    fn set_private_data(&self, key: &[u8; 16], value: u64);
}

/// A logical render device, the root object of one native GPU context.
///
/// Creation and destruction of child objects is explicit; the device does
/// not own their lifetime, but every child method requires a live device.
/// Implementations are safe for concurrent calls from multiple threads.
pub trait Device: ApiObject {
    fn backend(&self) -> api::Backend;

    /// Pure capability query; consistent for the lifetime of the device.
    fn check_capability(&self, capability: api::Capability) -> bool;

    /// Whether `format` may be used for every usage in `usage`. Returns
    /// false as soon as any requested usage bit is unsupported.
    fn check_format_support(&self, format: api::Format, usage: api::ResourceUsage) -> bool;

    fn create_sampler(&self, desc: &api::SamplerDesc) -> Result<api::Sampler, DeviceError>;
    /// Tolerates the null handle as a no-op, like every other `destroy_*`.
    fn destroy_sampler(&self, sampler: api::Sampler);

    /// Creates (or imports) a resource.
    ///
    /// `initial_data` carries one entry per subresource when present.
    /// See [`SharedHandle`] for the import/export protocol of `shared`;
    /// it is only consulted when `desc.flags` contains a sharing flag.
    fn create_resource(
        &self,
        desc: &api::ResourceDesc,
        initial_data: &[api::SubresourceData],
        initial_state: api::ResourceUsage,
        shared: Option<&mut SharedHandle>,
    ) -> Result<api::Resource, DeviceError>;
    /// The resource must not be referenced by any in-flight command list.
    fn destroy_resource(&self, resource: api::Resource);

    /// Reads the native description back and converts it to the unified
    /// model. Used to reconstruct metadata for resources this layer did
    /// not create itself (e.g. swap chain back buffers).
    fn resource_desc(&self, resource: api::Resource) -> api::ResourceDesc;

    /// `usage_type` selects the view flavor (render target, depth
    /// stencil, shader resource or unordered access). The view format
    /// must be a concrete typed format, never a typeless variant.
    fn create_resource_view(
        &self,
        resource: api::Resource,
        usage_type: api::ResourceUsage,
        desc: &api::ResourceViewDesc,
    ) -> Result<api::ResourceView, DeviceError>;
    fn destroy_resource_view(&self, view: api::ResourceView);

    /// The resource a view was created for. May be the null handle on
    /// backends that permit views of no resource (null descriptors).
    fn resource_from_view(&self, view: api::ResourceView) -> api::Resource;
    fn resource_view_desc(&self, view: api::ResourceView) -> api::ResourceViewDesc;

    /// Maps a byte range of a buffer into host address space.
    /// `size` may be [`api::WHOLE_SIZE`].
    fn map_buffer_region(
        &self,
        resource: api::Resource,
        offset: u64,
        size: u64,
        access: api::MapAccess,
    ) -> Result<*mut u8, DeviceError>;
    fn unmap_buffer_region(&self, resource: api::Resource);

    /// Maps one whole texture subresource. Partial-region mapping is not
    /// supported (not every backend can map less than a subresource), so
    /// a non-`None` box fails with `InvalidArgument`.
    fn map_texture_region(
        &self,
        resource: api::Resource,
        subresource: u32,
        sub_box: Option<&api::SubresourceBox>,
        access: api::MapAccess,
    ) -> Result<api::SubresourceData, DeviceError>;
    fn unmap_texture_region(&self, resource: api::Resource, subresource: u32);

    fn update_buffer_region(
        &self,
        data: &[u8],
        resource: api::Resource,
        offset: u64,
    ) -> Result<(), DeviceError>;
    fn update_texture_region(
        &self,
        data: &api::SubresourceData,
        resource: api::Resource,
        subresource: u32,
        sub_box: Option<&api::SubresourceBox>,
    ) -> Result<(), DeviceError>;

    fn create_pipeline(&self, desc: &api::PipelineDesc) -> Result<api::Pipeline, DeviceError>;
    fn destroy_pipeline(&self, pipeline: api::Pipeline);

    fn create_pipeline_layout(
        &self,
        params: &[api::PipelineLayoutParam],
    ) -> Result<api::PipelineLayout, DeviceError>;
    fn destroy_pipeline_layout(&self, layout: api::PipelineLayout);

    /// Allocates `count` descriptor tables shaped like parameter `param`
    /// of `layout`.
    fn allocate_descriptor_tables(
        &self,
        layout: api::PipelineLayout,
        param: u32,
        count: u32,
    ) -> Result<Vec<api::DescriptorTable>, DeviceError>;
    fn free_descriptor_tables(&self, tables: &[api::DescriptorTable]);

    /// The shape a descriptor table was allocated with: its descriptor
    /// type, base binding and descriptor count.
    fn descriptor_table_layout(
        &self,
        table: api::DescriptorTable,
    ) -> Option<(api::DescriptorType, u32, u32)>;

    /// Not safe to call concurrently with reads of the same table from an
    /// in-flight command list; the caller serializes against GPU
    /// completion.
    fn update_descriptor_tables(
        &self,
        updates: &[api::DescriptorTableUpdate],
    ) -> Result<(), DeviceError>;
    /// Same synchronization contract as `update_descriptor_tables`.
    /// Copies never cross descriptor-type boundaries.
    fn copy_descriptor_tables(
        &self,
        copies: &[api::DescriptorTableCopy],
    ) -> Result<(), DeviceError>;

    /// All member queries are constructed eagerly so that begin/end and
    /// result copies are allocation-free at record time.
    fn create_query_pool(
        &self,
        ty: api::QueryType,
        size: u32,
    ) -> Result<api::QueryPool, DeviceError>;
    fn destroy_query_pool(&self, pool: api::QueryPool);

    /// Copies finished query results into `results`, `stride` bytes
    /// apart. Returns false while any of the queried results is still
    /// pending on the GPU.
    fn get_query_pool_results(
        &self,
        pool: api::QueryPool,
        first: u32,
        count: u32,
        results: &mut [u8],
        stride: u32,
    ) -> bool;

    /// Creates a fence with the given initial counter value. `shared`
    /// follows the same protocol as in `create_resource`.
    fn create_fence(
        &self,
        initial_value: u64,
        flags: api::FenceFlags,
        shared: Option<&mut SharedHandle>,
    ) -> Result<api::Fence, DeviceError>;
    fn destroy_fence(&self, fence: api::Fence);

    fn set_resource_name(&self, resource: api::Resource, name: &str);
    fn set_resource_view_name(&self, view: api::ResourceView, name: &str);

    /// The registry this device notifies. Shared with every child object.
    fn event_registry(&self) -> &EventRegistry;
}

/// A linear, single-threaded-recording sequence of GPU commands.
///
/// On backends with no deferred/immediate distinction the immediate
/// command list doubles as the command queue.
pub trait CommandList: ApiObject {
    fn device(&self) -> &dyn Device;

    /// Marks state transitions for a batch of resources.
    ///
    /// Advisory on backends with automatic hazard tracking, but still
    /// performs any side effect the backend requires for correctness
    /// (e.g. unbinding stale shader-resource or unordered-access views).
    /// The three slices must have equal length.
    fn barrier(
        &mut self,
        resources: &[api::Resource],
        old_states: &[api::ResourceUsage],
        new_states: &[api::ResourceUsage],
    ) -> Result<(), CommandError>;

    /// Render passes must not nest.
    fn begin_render_pass(
        &mut self,
        render_targets: &[api::RenderPassRenderTargetDesc],
        depth_stencil: Option<&api::RenderPassDepthStencilDesc>,
    ) -> Result<(), CommandError>;
    fn end_render_pass(&mut self) -> Result<(), CommandError>;

    /// The individual-view binding path; gated behind
    /// [`api::Capability::BindRenderTargetsAndDepthStencil`] and illegal
    /// while a render pass is open.
    fn bind_render_targets_and_depth_stencil(
        &mut self,
        render_targets: &[api::ResourceView],
        depth_stencil: api::ResourceView,
    ) -> Result<(), CommandError>;

    fn bind_pipeline(&mut self, stages: api::PipelineStages, pipeline: api::Pipeline);
    /// Only legal for states listed in the bound pipeline's dynamic-state
    /// list. `states` and `values` must have equal length.
    fn bind_pipeline_states(
        &mut self,
        states: &[api::DynamicState],
        values: &[u32],
    ) -> Result<(), CommandError>;
    fn bind_viewports(&mut self, first: u32, viewports: &[api::Viewport])
        -> Result<(), CommandError>;
    fn bind_scissor_rects(&mut self, first: u32, rects: &[api::Rect]) -> Result<(), CommandError>;

    /// Updates a range of 32-bit constants addressed by layout parameter
    /// `param`. Backends without native push constants emulate this with
    /// an internal constant buffer.
    fn push_constants(
        &mut self,
        stages: api::ShaderStages,
        layout: api::PipelineLayout,
        param: u32,
        first: u32,
        values: &[u32],
    ) -> Result<(), CommandError>;
    /// Binds a transient descriptor range without allocating a table.
    fn push_descriptors(
        &mut self,
        stages: api::ShaderStages,
        layout: api::PipelineLayout,
        param: u32,
        update: &api::DescriptorTableUpdate,
    ) -> Result<(), CommandError>;
    fn bind_descriptor_tables(
        &mut self,
        stages: api::ShaderStages,
        layout: api::PipelineLayout,
        first: u32,
        tables: &[api::DescriptorTable],
    ) -> Result<(), CommandError>;

    /// `index_size` is the size of one index in bytes (2 or 4).
    fn bind_index_buffer(&mut self, buffer: api::Resource, offset: u64, index_size: u32);
    /// `buffers`, `offsets` and `strides` must have equal length.
    fn bind_vertex_buffers(
        &mut self,
        first: u32,
        buffers: &[api::Resource],
        offsets: &[u64],
        strides: &[u32],
    ) -> Result<(), CommandError>;
    fn bind_stream_output_buffers(
        &mut self,
        first: u32,
        buffers: &[api::Resource],
        offsets: &[u64],
        max_sizes: Option<&[u64]>,
    ) -> Result<(), CommandError>;

    fn draw(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    );
    fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    );
    fn dispatch(
        &mut self,
        group_count_x: u32,
        group_count_y: u32,
        group_count_z: u32,
    ) -> Result<(), CommandError>;
    fn draw_or_dispatch_indirect(
        &mut self,
        ty: api::IndirectCommand,
        buffer: api::Resource,
        offset: u64,
        draw_count: u32,
        stride: u32,
    ) -> Result<(), CommandError>;

    /// Whole-resource copy; dimensions of the two resources must match.
    fn copy_resource(&mut self, source: api::Resource, dest: api::Resource);
    fn copy_buffer_region(
        &mut self,
        source: api::Resource,
        source_offset: u64,
        dest: api::Resource,
        dest_offset: u64,
        size: u64,
    ) -> Result<(), CommandError>;
    fn copy_buffer_to_texture(
        &mut self,
        source: api::Resource,
        source_offset: u64,
        row_length: u32,
        slice_height: u32,
        dest: api::Resource,
        dest_subresource: u32,
        dest_box: Option<&api::SubresourceBox>,
    ) -> Result<(), CommandError>;
    /// A copy whose boxes change dimensions is a scaling blit and
    /// requires [`api::Capability::Blit`].
    fn copy_texture_region(
        &mut self,
        source: api::Resource,
        source_subresource: u32,
        source_box: Option<&api::SubresourceBox>,
        dest: api::Resource,
        dest_subresource: u32,
        dest_box: Option<&api::SubresourceBox>,
        filter: api::FilterMode,
    ) -> Result<(), CommandError>;
    fn copy_texture_to_buffer(
        &mut self,
        source: api::Resource,
        source_subresource: u32,
        source_box: Option<&api::SubresourceBox>,
        dest: api::Resource,
        dest_offset: u64,
        row_length: u32,
        slice_height: u32,
    ) -> Result<(), CommandError>;
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
    ) -> Result<(), CommandError>;

    fn clear_depth_stencil_view(
        &mut self,
        dsv: api::ResourceView,
        depth: Option<f32>,
        stencil: Option<u8>,
        rects: &[api::Rect],
    ) -> Result<(), CommandError>;
    fn clear_render_target_view(
        &mut self,
        rtv: api::ResourceView,
        color: &[f32; 4],
        rects: &[api::Rect],
    ) -> Result<(), CommandError>;
    fn clear_unordered_access_view_uint(
        &mut self,
        uav: api::ResourceView,
        values: &[u32; 4],
        rects: &[api::Rect],
    ) -> Result<(), CommandError>;
    fn clear_unordered_access_view_float(
        &mut self,
        uav: api::ResourceView,
        values: &[f32; 4],
        rects: &[api::Rect],
    ) -> Result<(), CommandError>;

    /// Generates the lower mip chain of the view's resource. Invalidates
    /// previously bound descriptors on some backends.
    fn generate_mipmaps(&mut self, srv: api::ResourceView) -> Result<(), CommandError>;

    fn begin_query(
        &mut self,
        pool: api::QueryPool,
        ty: api::QueryType,
        index: u32,
    ) -> Result<(), CommandError>;
    fn end_query(
        &mut self,
        pool: api::QueryPool,
        ty: api::QueryType,
        index: u32,
    ) -> Result<(), CommandError>;
    fn copy_query_pool_results(
        &mut self,
        pool: api::QueryPool,
        ty: api::QueryType,
        first: u32,
        count: u32,
        dest: api::Resource,
        dest_offset: u64,
        stride: u32,
    ) -> Result<(), CommandError>;

    // Debug regions are pass-through; no-ops when the backend lacks an
    // annotation interface.
    fn begin_debug_event(&mut self, label: &str, color: [f32; 4]);
    fn end_debug_event(&mut self);
    fn insert_debug_marker(&mut self, label: &str, color: [f32; 4]);
}

/// The submission point for recorded command lists.
pub trait CommandQueue: ApiObject {
    fn device(&self) -> &dyn Device;

    fn queue_type(&self) -> api::QueueType;

    /// Blocks the calling thread at the OS/driver level until all GPU
    /// work issued on this queue has completed.
    fn wait_idle(&self);

    /// Flushes the implicit immediate command list, forcing queued
    /// commands to execute now rather than at the next natural flush.
    fn flush_immediate_command_list(&mut self);

    /// The always-available immediate command list of graphics queues,
    /// or `None` on queues that only accept pre-recorded lists.
    fn immediate_command_list(&mut self) -> Option<&mut dyn CommandList>;

    /// Advances the fence counter to `value` once prior GPU work
    /// completes. Returns false if the fence cannot be signaled.
    fn signal_fence(&mut self, fence: api::Fence, value: u64) -> bool;
    /// Blocks the calling thread until the fence counter reaches `value`.
    /// Falls back to a full `wait_idle` on backends without a native
    /// wait-on-fence entry point.
    fn wait_fence(&mut self, fence: api::Fence, value: u64) -> bool;

    fn begin_debug_event(&mut self, label: &str, color: [f32; 4]);
    fn end_debug_event(&mut self);
    fn insert_debug_marker(&mut self, label: &str, color: [f32; 4]);
}

/// The presentation surface and its back buffers.
///
/// The lifecycle entry points (`on_init`/`on_reset`/`on_present` and the
/// VR `on_layer_submit`) live on the concrete backend types, since their
/// native parameters differ per API; this trait is the query surface
/// shared with extensions.
pub trait Swapchain: ApiObject {
    fn device(&self) -> &dyn Device;

    /// The native window this swap chain presents to, or zero for an
    /// offscreen swap chain.
    fn window(&self) -> u64;

    fn back_buffer(&self, index: u32) -> api::Resource;
    fn back_buffer_count(&self) -> u32;
    fn current_back_buffer_index(&self) -> u32;
    fn current_back_buffer(&self) -> api::Resource {
        self.back_buffer(self.current_back_buffer_index())
    }

    fn color_space(&self) -> api::ColorSpace;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_data_store_round_trips() {
        let store = PrivateDataStore::default();
        let key = *b"0123456789abcdef";
        assert_eq!(store.get(&key), 0);
        store.set(&key, 42);
        assert_eq!(store.get(&key), 42);
        store.set(&key, 0);
        assert_eq!(store.get(&key), 0);
    }

    #[test]
    fn shared_handle_null() {
        assert!(SharedHandle::NULL.is_null());
    }
}

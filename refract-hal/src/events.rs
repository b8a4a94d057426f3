//! The extension notification layer.
//!
//! One callback list per named event. Every mutating operation in the
//! device/command layer invokes the matching event before and/or after
//! performing the native call. Callbacks run in registration order;
//! "create" and "pre-command" callbacks return a `bool`, and returning
//! true short-circuits the remaining callbacks and the native operation
//! itself (creation events may instead modify the description they are
//! handed, to override parameters without skipping the call).
//!
//! Registration and unregistration may happen from any thread. Callbacks
//! must not register or unregister callbacks of the *same* event from
//! inside an invocation of that event.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::{CommandList, CommandQueue, Device, Swapchain};

/// Token returned from a registration, used to unregister the callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

static NEXT_CALLBACK_ID: AtomicU64 = AtomicU64::new(1);

/// The callbacks registered for one event, in registration order.
pub struct EventList<F: ?Sized> {
    callbacks: RwLock<Vec<(CallbackId, Box<F>)>>,
}

impl<F: ?Sized> Default for EventList<F> {
    fn default() -> Self {
        Self {
            callbacks: RwLock::new(Vec::new()),
        }
    }
}

impl<F: ?Sized> EventList<F> {
    pub fn register(&self, callback: Box<F>) -> CallbackId {
        let id = CallbackId(NEXT_CALLBACK_ID.fetch_add(1, Ordering::Relaxed));
        self.callbacks.write().push((id, callback));
        id
    }

    /// Removes a previously registered callback. Returns false if the id
    /// does not belong to this event.
    pub fn unregister(&self, id: CallbackId) -> bool {
        let mut callbacks = self.callbacks.write();
        match callbacks.iter().position(|(it, _)| *it == id) {
            Some(index) => {
                callbacks.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.read().is_empty()
    }

    /// Invokes every callback in registration order.
    pub fn notify(&self, mut invoke: impl FnMut(&F)) {
        for (_, callback) in self.callbacks.read().iter() {
            invoke(callback);
        }
    }

    /// Invokes callbacks in registration order until one returns true.
    /// Returns whether the operation was vetoed.
    pub fn veto(&self, mut invoke: impl FnMut(&F) -> bool) -> bool {
        for (_, callback) in self.callbacks.read().iter() {
            if invoke(callback) {
                return true;
            }
        }
        false
    }

    /// Invokes every callback in registration order, OR-ing the results.
    ///
    /// Used by the creation events, where a true return means "I rewrote
    /// the description" rather than "skip the operation" — so later
    /// callbacks still get their turn and creation proceeds with the
    /// final description.
    pub fn modify(&self, mut invoke: impl FnMut(&F) -> bool) -> bool {
        let mut modified = false;
        for (_, callback) in self.callbacks.read().iter() {
            modified |= invoke(callback);
        }
        modified
    }
}

// Shorthands for the recurring callback shapes. The concrete signatures
// are documented on the registry fields below.
type NotifyDevice = EventList<dyn Fn(&dyn Device) + Send + Sync>;
type NotifyList = EventList<dyn Fn(&dyn CommandList) + Send + Sync>;
type NotifyQueue = EventList<dyn Fn(&dyn CommandQueue) + Send + Sync>;
type NotifySwapchain = EventList<dyn Fn(&dyn Swapchain) + Send + Sync>;
type NotifyRuntime = EventList<dyn Fn(api::EffectRuntime) + Send + Sync>;

/// The registry of all extension event callback lists.
///
/// One instance is shared by a device and every object created from it;
/// the extension-loading collaborator registers its callbacks here.
#[derive(Default)]
pub struct EventRegistry {
    // Lifecycle notifications.
    pub init_device: NotifyDevice,
    pub destroy_device: NotifyDevice,
    pub init_command_list: NotifyList,
    pub destroy_command_list: NotifyList,
    pub init_command_queue: NotifyQueue,
    pub destroy_command_queue: NotifyQueue,
    pub init_swapchain: NotifySwapchain,
    pub destroy_swapchain: NotifySwapchain,
    pub init_effect_runtime: NotifyRuntime,
    pub destroy_effect_runtime: NotifyRuntime,

    /// `(swapchain_desc) -> veto`; a callback may rewrite the description
    /// before the swap chain is (re)created.
    pub create_swapchain:
        EventList<dyn Fn(&mut api::SwapchainDesc) -> bool + Send + Sync>,
    /// `(swapchain, width, height)`, before back buffers are resized.
    pub resize_swapchain:
        EventList<dyn Fn(&dyn Swapchain, u32, u32) + Send + Sync>,
    pub set_color_space: EventList<dyn Fn(&dyn Swapchain, api::ColorSpace) + Send + Sync>,

    // Object creation. The "create" flavor runs before the native call
    // and may rewrite the description or veto; the "init" flavor runs
    // after the object exists; "destroy" runs before it goes away.
    pub create_sampler:
        EventList<dyn Fn(&dyn Device, &mut api::SamplerDesc) -> bool + Send + Sync>,
    pub init_sampler:
        EventList<dyn Fn(&dyn Device, &api::SamplerDesc, api::Sampler) + Send + Sync>,
    pub destroy_sampler: EventList<dyn Fn(&dyn Device, api::Sampler) + Send + Sync>,

    pub create_resource: EventList<
        dyn Fn(
                &dyn Device,
                &mut api::ResourceDesc,
                &[api::SubresourceData],
                api::ResourceUsage,
            ) -> bool
            + Send
            + Sync,
    >,
    pub init_resource: EventList<
        dyn Fn(&dyn Device, &api::ResourceDesc, &[api::SubresourceData], api::ResourceUsage, api::Resource)
            + Send
            + Sync,
    >,
    pub destroy_resource: EventList<dyn Fn(&dyn Device, api::Resource) + Send + Sync>,

    pub create_resource_view: EventList<
        dyn Fn(&dyn Device, api::Resource, api::ResourceUsage, &mut api::ResourceViewDesc) -> bool
            + Send
            + Sync,
    >,
    pub init_resource_view: EventList<
        dyn Fn(&dyn Device, api::Resource, api::ResourceUsage, &api::ResourceViewDesc, api::ResourceView)
            + Send
            + Sync,
    >,
    pub destroy_resource_view: EventList<dyn Fn(&dyn Device, api::ResourceView) + Send + Sync>,

    pub create_pipeline:
        EventList<dyn Fn(&dyn Device, &mut api::PipelineDesc) -> bool + Send + Sync>,
    pub init_pipeline:
        EventList<dyn Fn(&dyn Device, &api::PipelineDesc, api::Pipeline) + Send + Sync>,
    pub destroy_pipeline: EventList<dyn Fn(&dyn Device, api::Pipeline) + Send + Sync>,

    pub create_pipeline_layout:
        EventList<dyn Fn(&dyn Device, &[api::PipelineLayoutParam]) -> bool + Send + Sync>,
    pub init_pipeline_layout: EventList<
        dyn Fn(&dyn Device, &[api::PipelineLayoutParam], api::PipelineLayout) + Send + Sync,
    >,
    pub destroy_pipeline_layout:
        EventList<dyn Fn(&dyn Device, api::PipelineLayout) + Send + Sync>,

    pub create_query_pool:
        EventList<dyn Fn(&dyn Device, api::QueryType, &mut u32) -> bool + Send + Sync>,
    pub init_query_pool:
        EventList<dyn Fn(&dyn Device, api::QueryType, u32, api::QueryPool) + Send + Sync>,
    pub destroy_query_pool: EventList<dyn Fn(&dyn Device, api::QueryPool) + Send + Sync>,
    /// `(pool, first, count) -> veto`.
    pub get_query_pool_results:
        EventList<dyn Fn(&dyn Device, api::QueryPool, u32, u32) -> bool + Send + Sync>,

    pub init_fence: EventList<dyn Fn(&dyn Device, u64, api::Fence) + Send + Sync>,
    pub destroy_fence: EventList<dyn Fn(&dyn Device, api::Fence) + Send + Sync>,

    // Descriptor maintenance on the device.
    pub update_descriptor_tables:
        EventList<dyn Fn(&dyn Device, &[api::DescriptorTableUpdate]) -> bool + Send + Sync>,
    pub copy_descriptor_tables:
        EventList<dyn Fn(&dyn Device, &[api::DescriptorTableCopy]) -> bool + Send + Sync>,

    // Memory access on the device.
    pub map_buffer_region: EventList<
        dyn Fn(&dyn Device, api::Resource, u64, u64, api::MapAccess, *mut u8) + Send + Sync,
    >,
    pub unmap_buffer_region: EventList<dyn Fn(&dyn Device, api::Resource) + Send + Sync>,
    pub map_texture_region: EventList<
        dyn Fn(&dyn Device, api::Resource, u32, api::MapAccess, &api::SubresourceData)
            + Send
            + Sync,
    >,
    pub unmap_texture_region: EventList<dyn Fn(&dyn Device, api::Resource, u32) + Send + Sync>,
    /// `(data, dest, dest_offset) -> veto`.
    pub update_buffer_region:
        EventList<dyn Fn(&dyn Device, &[u8], api::Resource, u64) -> bool + Send + Sync>,
    /// `(data, dest, dest_subresource, dest_box) -> veto`.
    pub update_texture_region: EventList<
        dyn Fn(
                &dyn Device,
                &api::SubresourceData,
                api::Resource,
                u32,
                Option<&api::SubresourceBox>,
            ) -> bool
            + Send
            + Sync,
    >,

    // Command recording notifications.
    pub barrier: EventList<
        dyn Fn(&dyn CommandList, &[api::Resource], &[api::ResourceUsage], &[api::ResourceUsage])
            + Send
            + Sync,
    >,
    pub begin_render_pass: EventList<
        dyn Fn(
                &dyn CommandList,
                &[api::RenderPassRenderTargetDesc],
                Option<&api::RenderPassDepthStencilDesc>,
            ) + Send
            + Sync,
    >,
    pub end_render_pass: NotifyList,
    pub bind_render_targets_and_depth_stencil: EventList<
        dyn Fn(&dyn CommandList, &[api::ResourceView], api::ResourceView) + Send + Sync,
    >,
    pub bind_pipeline:
        EventList<dyn Fn(&dyn CommandList, api::PipelineStages, api::Pipeline) + Send + Sync>,
    pub bind_pipeline_states:
        EventList<dyn Fn(&dyn CommandList, &[api::DynamicState], &[u32]) + Send + Sync>,
    pub bind_viewports:
        EventList<dyn Fn(&dyn CommandList, u32, &[api::Viewport]) + Send + Sync>,
    pub bind_scissor_rects:
        EventList<dyn Fn(&dyn CommandList, u32, &[api::Rect]) + Send + Sync>,
    pub push_constants: EventList<
        dyn Fn(&dyn CommandList, api::ShaderStages, api::PipelineLayout, u32, u32, &[u32])
            + Send
            + Sync,
    >,
    pub push_descriptors: EventList<
        dyn Fn(&dyn CommandList, api::ShaderStages, api::PipelineLayout, u32, &api::DescriptorTableUpdate)
            + Send
            + Sync,
    >,
    pub bind_descriptor_tables: EventList<
        dyn Fn(&dyn CommandList, api::ShaderStages, api::PipelineLayout, u32, &[api::DescriptorTable])
            + Send
            + Sync,
    >,
    pub bind_index_buffer:
        EventList<dyn Fn(&dyn CommandList, api::Resource, u64, u32) + Send + Sync>,
    pub bind_vertex_buffers: EventList<
        dyn Fn(&dyn CommandList, u32, &[api::Resource], &[u64], &[u32]) + Send + Sync,
    >,
    pub bind_stream_output_buffers: EventList<
        dyn Fn(&dyn CommandList, u32, &[api::Resource], &[u64], Option<&[u64]>) + Send + Sync,
    >,

    // Pre-command events; returning true skips the native command.
    pub draw: EventList<dyn Fn(&dyn CommandList, u32, u32, u32, u32) -> bool + Send + Sync>,
    pub draw_indexed:
        EventList<dyn Fn(&dyn CommandList, u32, u32, u32, i32, u32) -> bool + Send + Sync>,
    pub dispatch: EventList<dyn Fn(&dyn CommandList, u32, u32, u32) -> bool + Send + Sync>,
    pub draw_or_dispatch_indirect: EventList<
        dyn Fn(&dyn CommandList, api::IndirectCommand, api::Resource, u64, u32, u32) -> bool
            + Send
            + Sync,
    >,
    pub copy_resource:
        EventList<dyn Fn(&dyn CommandList, api::Resource, api::Resource) -> bool + Send + Sync>,
    pub copy_buffer_region: EventList<
        dyn Fn(&dyn CommandList, api::Resource, u64, api::Resource, u64, u64) -> bool
            + Send
            + Sync,
    >,
    pub copy_buffer_to_texture: EventList<
        dyn Fn(
                &dyn CommandList,
                api::Resource,
                u64,
                u32,
                u32,
                api::Resource,
                u32,
                Option<&api::SubresourceBox>,
            ) -> bool
            + Send
            + Sync,
    >,
    pub copy_texture_region: EventList<
        dyn Fn(
                &dyn CommandList,
                api::Resource,
                u32,
                Option<&api::SubresourceBox>,
                api::Resource,
                u32,
                Option<&api::SubresourceBox>,
                api::FilterMode,
            ) -> bool
            + Send
            + Sync,
    >,
    pub copy_texture_to_buffer: EventList<
        dyn Fn(
                &dyn CommandList,
                api::Resource,
                u32,
                Option<&api::SubresourceBox>,
                api::Resource,
                u64,
                u32,
                u32,
            ) -> bool
            + Send
            + Sync,
    >,
    pub resolve_texture_region: EventList<
        dyn Fn(
                &dyn CommandList,
                api::Resource,
                u32,
                Option<&api::SubresourceBox>,
                api::Resource,
                u32,
                i32,
                i32,
                i32,
                api::Format,
            ) -> bool
            + Send
            + Sync,
    >,
    pub clear_depth_stencil_view: EventList<
        dyn Fn(&dyn CommandList, api::ResourceView, Option<f32>, Option<u8>, &[api::Rect]) -> bool
            + Send
            + Sync,
    >,
    pub clear_render_target_view: EventList<
        dyn Fn(&dyn CommandList, api::ResourceView, &[f32; 4], &[api::Rect]) -> bool + Send + Sync,
    >,
    pub clear_unordered_access_view_uint: EventList<
        dyn Fn(&dyn CommandList, api::ResourceView, &[u32; 4], &[api::Rect]) -> bool + Send + Sync,
    >,
    pub clear_unordered_access_view_float: EventList<
        dyn Fn(&dyn CommandList, api::ResourceView, &[f32; 4], &[api::Rect]) -> bool + Send + Sync,
    >,
    pub generate_mipmaps:
        EventList<dyn Fn(&dyn CommandList, api::ResourceView) -> bool + Send + Sync>,
    pub begin_query: EventList<
        dyn Fn(&dyn CommandList, api::QueryPool, api::QueryType, u32) -> bool + Send + Sync,
    >,
    pub end_query: EventList<
        dyn Fn(&dyn CommandList, api::QueryPool, api::QueryType, u32) -> bool + Send + Sync,
    >,
    pub copy_query_pool_results: EventList<
        dyn Fn(&dyn CommandList, api::QueryPool, api::QueryType, u32, u32, api::Resource, u64, u32) -> bool
            + Send
            + Sync,
    >,

    // Command list / queue lifecycle.
    pub reset_command_list: NotifyList,
    pub close_command_list: NotifyList,
    pub execute_command_list:
        EventList<dyn Fn(&dyn CommandQueue, &dyn CommandList) + Send + Sync>,
    pub execute_secondary_command_list:
        EventList<dyn Fn(&dyn CommandList, &dyn CommandList) + Send + Sync>,

    /// `(queue, swapchain)`, right before the native present.
    pub present: EventList<dyn Fn(&dyn CommandQueue, &dyn Swapchain) + Send + Sync>,

    // Effect runtime family. The runtime itself lives outside this layer.
    pub begin_effects: EventList<dyn Fn(api::EffectRuntime, &dyn CommandList) + Send + Sync>,
    pub finish_effects: EventList<dyn Fn(api::EffectRuntime, &dyn CommandList) + Send + Sync>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn callbacks_run_in_registration_order() {
        let registry = EventRegistry::new();
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

        for tag in 0..3usize {
            let order = Arc::clone(&order);
            registry
                .init_effect_runtime
                .register(Box::new(move |_| order.lock().push(tag)));
        }

        registry.init_effect_runtime.notify(|cb| cb(api::EffectRuntime(1)));
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn veto_short_circuits_later_callbacks() {
        let registry = EventRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&calls);
        registry.draw.register(Box::new(move |_, _, _, _, _| {
            c.fetch_add(1, Ordering::SeqCst);
            true
        }));
        let c = Arc::clone(&calls);
        registry.draw.register(Box::new(move |_, _, _, _, _| {
            c.fetch_add(1, Ordering::SeqCst);
            false
        }));

        let device = crate::noop::Device::new(Arc::new(EventRegistry::new()));
        let list = crate::noop::CommandContext::new(device);
        let vetoed = registry.draw.veto(|cb| cb(&list, 3, 1, 0, 0));

        assert!(vetoed);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unregister_removes_callback() {
        let registry = EventRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&calls);
        let id = registry
            .destroy_device
            .register(Box::new(move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            }));

        assert!(registry.destroy_device.unregister(id));
        assert!(!registry.destroy_device.unregister(id));

        let device = crate::noop::Device::new(Arc::new(EventRegistry::new()));
        registry.destroy_device.notify(|cb| cb(&device));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}

//! End-to-end behavior of the abstraction core, driven through the
//! inert backend: event ordering and veto semantics, lifecycle rules,
//! descriptor arithmetic, the shared-handle protocol and fence
//! emulation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use refract_hal::noop::{CommandContext, Device, Swapchain};
use refract_hal::{
    CommandError, CommandList as _, CommandQueue as _, Device as _, DeviceError, EventRegistry,
    SharedHandle,
};

fn device() -> (Arc<EventRegistry>, Device) {
    let _ = env_logger::builder().is_test(true).try_init();
    let events = Arc::new(EventRegistry::new());
    let device = Device::new(Arc::clone(&events));
    (events, device)
}

#[test]
fn resource_creation_round_trips_through_get_desc() {
    let (_events, device) = device();

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
    let resource = device
        .create_resource(&desc, &[], api::ResourceUsage::SHADER_RESOURCE, None)
        .unwrap();

    let round = device.resource_desc(resource);
    assert_eq!(round.dim, desc.dim);
    assert_eq!(round.heap, desc.heap);
    assert!(round.usage.contains(desc.usage));

    device.destroy_resource(resource);
}

#[test]
fn create_events_can_rewrite_the_description() {
    let (events, device) = device();

    events.create_resource.register(Box::new(|_, desc, _, _| {
        if let api::ResourceDim::Texture { ref mut width, .. } = desc.dim {
            *width *= 2;
        }
        true
    }));

    let desc = api::ResourceDesc::tex_2d(
        128,
        128,
        1,
        1,
        api::Format::R8G8B8A8Unorm,
        1,
        api::MemoryHeap::GpuOnly,
        api::ResourceUsage::SHADER_RESOURCE,
    );
    let resource = device
        .create_resource(&desc, &[], api::ResourceUsage::SHADER_RESOURCE, None)
        .unwrap();

    match device.resource_desc(resource).dim {
        api::ResourceDim::Texture { width, .. } => assert_eq!(width, 256),
        api::ResourceDim::Buffer { .. } => panic!("expected a texture"),
    }
    device.destroy_resource(resource);
}

#[test]
fn vetoed_draw_issues_no_native_commands() {
    let (events, device) = device();
    let mut list = CommandContext::new(device);

    let fired = Arc::new(AtomicUsize::new(0));
    let observed = Arc::clone(&fired);
    events.draw.register(Box::new(move |_, vertices, _, _, _| {
        observed.fetch_add(1, Ordering::SeqCst);
        vertices == 3
    }));

    // Vetoed: callback returns true, nothing reaches the backend.
    list.draw(3, 1, 0, 0);
    assert_eq!(list.commands_issued, 0);

    // Not vetoed: the native command goes through.
    list.draw(6, 1, 0, 0);
    assert_eq!(list.commands_issued, 1);
    assert_eq!(fired.load(Ordering::SeqCst), 2);
}

#[test]
fn vetoed_clear_and_dispatch_are_skipped() {
    let (events, device) = device();
    let mut list = CommandContext::new(device);

    events
        .clear_render_target_view
        .register(Box::new(|_, _, _, _| true));
    events.dispatch.register(Box::new(|_, _, _, _| true));

    list.clear_render_target_view(api::ResourceView(0x10), &[0.0; 4], &[])
        .unwrap();
    list.dispatch(1, 1, 1).unwrap();
    assert_eq!(list.commands_issued, 0);
}

#[test]
fn render_passes_do_not_nest() {
    let (_events, device) = device();
    let mut list = CommandContext::new(device);

    list.begin_render_pass(&[], None).unwrap();
    assert_eq!(
        list.begin_render_pass(&[], None),
        Err(CommandError::RenderPassActive)
    );
    // The individual-view binding path is illegal inside a pass.
    assert_eq!(
        list.bind_render_targets_and_depth_stencil(&[], api::ResourceView::NULL),
        Err(CommandError::RenderPassActive)
    );
    list.end_render_pass().unwrap();
    assert_eq!(list.end_render_pass(), Err(CommandError::RenderPassNotActive));
}

#[test]
fn missing_capability_is_reported() {
    let events = Arc::new(EventRegistry::new());
    // A device with no capabilities at all.
    let device = Device::with_capabilities(events, 0);
    let mut list = CommandContext::new(device);

    assert_eq!(
        list.dispatch(1, 1, 1),
        Err(CommandError::MissingCapability(api::Capability::ComputeShader))
    );
    assert_eq!(
        list.bind_render_targets_and_depth_stencil(&[], api::ResourceView::NULL),
        Err(CommandError::MissingCapability(
            api::Capability::BindRenderTargetsAndDepthStencil
        ))
    );
}

#[test]
fn typeless_view_formats_are_rejected() {
    let (_events, device) = device();

    let desc = api::ResourceDesc::tex_2d(
        64,
        64,
        1,
        1,
        api::Format::R8G8B8A8Typeless,
        1,
        api::MemoryHeap::GpuOnly,
        api::ResourceUsage::SHADER_RESOURCE,
    );
    let resource = device
        .create_resource(&desc, &[], api::ResourceUsage::SHADER_RESOURCE, None)
        .unwrap();

    let err = device
        .create_resource_view(
            resource,
            api::ResourceUsage::SHADER_RESOURCE,
            &api::ResourceViewDesc::tex_2d(api::Format::R8G8B8A8Typeless),
        )
        .unwrap_err();
    assert!(matches!(err, DeviceError::InvalidArgument(_)));

    // The typed variant of the same family is fine.
    let view = device
        .create_resource_view(
            resource,
            api::ResourceUsage::SHADER_RESOURCE,
            &api::ResourceViewDesc::tex_2d(api::Format::R8G8B8A8Unorm),
        )
        .unwrap();
    assert_eq!(device.resource_from_view(view), resource);

    device.destroy_resource_view(view);
    device.destroy_resource(resource);
}

#[test]
fn shared_handle_slot_protocol() {
    let (_events, device) = device();

    let mut desc = api::ResourceDesc::buffer(
        1024,
        api::MemoryHeap::GpuOnly,
        api::ResourceUsage::SHADER_RESOURCE,
    );
    desc.flags |= api::ResourceFlags::SHARED;

    // A shared resource needs a handle slot.
    assert!(device
        .create_resource(&desc, &[], api::ResourceUsage::SHADER_RESOURCE, None)
        .is_err());

    // Null-valued slot: export. The slot comes back filled.
    let mut slot = SharedHandle::NULL;
    let exported = device
        .create_resource(
            &desc,
            &[],
            api::ResourceUsage::SHADER_RESOURCE,
            Some(&mut slot),
        )
        .unwrap();
    assert!(!slot.is_null());

    // Non-null slot: import, which forbids initial data.
    let data = [0u8; 4];
    let initial = [api::SubresourceData {
        data: data.as_ptr() as *mut u8,
        row_pitch: 0,
        slice_pitch: 0,
    }];
    assert!(device
        .create_resource(
            &desc,
            &initial,
            api::ResourceUsage::SHADER_RESOURCE,
            Some(&mut slot),
        )
        .is_err());
    let imported = device
        .create_resource(&desc, &[], api::ResourceUsage::SHADER_RESOURCE, Some(&mut slot))
        .unwrap();

    device.destroy_resource(exported);
    device.destroy_resource(imported);
}

#[test]
fn descriptor_tables_allocate_update_and_copy() {
    let (_events, device) = device();

    let layout = device
        .create_pipeline_layout(&[api::PipelineLayoutParam::DescriptorTable {
            ranges: vec![api::DescriptorRange {
                binding: 0,
                dx_register_index: 0,
                dx_register_space: 0,
                count: 4,
                array_size: 1,
                ty: api::DescriptorType::ShaderResourceView,
                visibility: api::ShaderStages::PIXEL,
            }],
        }])
        .unwrap();

    let tables = device.allocate_descriptor_tables(layout, 0, 2).unwrap();
    assert_eq!(tables.len(), 2);

    device
        .update_descriptor_tables(&[api::DescriptorTableUpdate {
            table: tables[0],
            binding: 1,
            array_offset: 0,
            descriptors: api::DescriptorData::ShaderResourceViews(vec![
                api::ResourceView(7),
                api::ResourceView(8),
            ]),
        }])
        .unwrap();

    device
        .copy_descriptor_tables(&[api::DescriptorTableCopy {
            source_table: tables[0],
            source_binding: 1,
            source_array_offset: 0,
            dest_table: tables[1],
            dest_binding: 2,
            dest_array_offset: 0,
            count: 2,
        }])
        .unwrap();

    // Writing mismatched descriptor data must fail without touching the
    // table.
    let err = device
        .update_descriptor_tables(&[api::DescriptorTableUpdate {
            table: tables[1],
            binding: 0,
            array_offset: 0,
            descriptors: api::DescriptorData::Samplers(vec![api::Sampler(1)]),
        }])
        .unwrap_err();
    assert!(matches!(err, DeviceError::Descriptor(_)));

    device.free_descriptor_tables(&tables);
    device.destroy_pipeline_layout(layout);
}

#[test]
fn non_contiguous_layout_fails_without_partial_result() {
    let (_events, device) = device();

    let err = device
        .create_pipeline_layout(&[api::PipelineLayoutParam::DescriptorTable {
            ranges: vec![
                api::DescriptorRange {
                    binding: 0,
                    dx_register_index: 0,
                    dx_register_space: 0,
                    count: 1,
                    array_size: 1,
                    ty: api::DescriptorType::Sampler,
                    visibility: api::ShaderStages::PIXEL,
                },
                api::DescriptorRange {
                    binding: 1,
                    dx_register_index: 5,
                    dx_register_space: 0,
                    count: 1,
                    array_size: 1,
                    ty: api::DescriptorType::Sampler,
                    visibility: api::ShaderStages::PIXEL,
                },
            ],
        }])
        .unwrap_err();
    assert!(matches!(err, DeviceError::Layout(_)));
}

#[test]
fn push_constants_grow_to_high_water_mark() {
    let (_events, device) = device();

    let layout = device
        .create_pipeline_layout(&[api::PipelineLayoutParam::PushConstants(
            api::ConstantRange {
                binding: 0,
                dx_register_index: 0,
                dx_register_space: 0,
                count: 64,
                visibility: api::ShaderStages::ALL_GRAPHICS,
            },
        )])
        .unwrap();

    let mut list = CommandContext::new(device.clone());
    list.push_constants(api::ShaderStages::VERTEX, layout, 0, 0, &[1, 2, 3, 4])
        .unwrap();
    assert!(list.push_constant_capacity() >= 4);

    list.push_constants(api::ShaderStages::VERTEX, layout, 0, 16, &[9; 16])
        .unwrap();
    let high_water = list.push_constant_capacity();
    assert!(high_water >= 32);

    // Smaller updates never shrink the buffer.
    list.push_constants(api::ShaderStages::VERTEX, layout, 0, 0, &[5])
        .unwrap();
    assert_eq!(list.push_constant_capacity(), high_water);

    device.destroy_pipeline_layout(layout);
}

#[test]
fn fence_signal_then_wait_completes_without_blocking() {
    let (_events, device) = device();
    let mut queue = CommandContext::new(device.clone());

    let fence = device
        .create_fence(0, api::FenceFlags::empty(), None)
        .unwrap();

    assert!(queue.signal_fence(fence, 5));
    // The counter already reached the value; this must return at once.
    assert!(queue.wait_fence(fence, 5));
    assert!(queue.wait_fence(fence, 3));

    device.destroy_fence(fence);
}

#[test]
fn query_pool_results_are_available_immediately() {
    let (_events, device) = device();

    let pool = device
        .create_query_pool(api::QueryType::Timestamp, 8)
        .unwrap();

    let mut results = [0xffu8; 64];
    assert!(device.get_query_pool_results(pool, 0, 8, &mut results, 8));
    assert!(results.iter().all(|&byte| byte == 0));

    // Out-of-range reads fail instead of clobbering memory.
    assert!(!device.get_query_pool_results(pool, 4, 8, &mut results, 8));

    device.destroy_query_pool(pool);
}

#[test]
fn lifecycle_events_fire_in_order() {
    let _ = env_logger::builder().is_test(true).try_init();
    let events = Arc::new(EventRegistry::new());
    let log = Arc::new(test_log::Log::default());

    {
        let log = Arc::clone(&log);
        events
            .init_device
            .register(Box::new(move |_| log.push("init_device")));
    }
    {
        let log = Arc::clone(&log);
        events
            .init_command_queue
            .register(Box::new(move |_| log.push("init_command_queue")));
    }
    {
        let log = Arc::clone(&log);
        events
            .init_swapchain
            .register(Box::new(move |_| log.push("init_swapchain")));
    }
    {
        let log = Arc::clone(&log);
        events
            .present
            .register(Box::new(move |_, _| log.push("present")));
    }
    {
        let log = Arc::clone(&log);
        events
            .destroy_swapchain
            .register(Box::new(move |_| log.push("destroy_swapchain")));
    }

    let device = Device::new(Arc::clone(&events));
    let queue = CommandContext::new(device.clone());
    let mut swapchain = Swapchain::new(
        device,
        api::SwapchainDesc {
            back_buffer: api::ResourceDesc::tex_2d(
                640,
                480,
                1,
                1,
                api::Format::B8G8R8A8Unorm,
                1,
                api::MemoryHeap::GpuOnly,
                api::ResourceUsage::RENDER_TARGET,
            ),
            buffer_count: 1,
            present_mode: 0,
            present_flags: 0,
            fullscreen: false,
            refresh_rate: api::Rational::default(),
        },
    )
    .unwrap();

    swapchain.on_present(&queue);
    swapchain.on_present(&queue);
    swapchain.on_reset();

    assert_eq!(
        log.entries(),
        vec![
            "init_device",
            "init_command_queue",
            "init_swapchain",
            "present",
            "present",
            "destroy_swapchain",
        ]
    );
}

// Tiny ordered log used by the lifecycle test.
mod test_log {
    #[derive(Default)]
    pub struct Log(parking_lot::Mutex<Vec<&'static str>>);

    impl Log {
        pub fn push(&self, entry: &'static str) {
            self.0.lock().push(entry);
        }

        pub fn entries(&self) -> Vec<&'static str> {
            self.0.lock().clone()
        }
    }
}

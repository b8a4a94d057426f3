use std::ptr;

use winapi::shared::dxgi;
use winapi::shared::winerror::SUCCEEDED;
use winapi::um::d3d11;
use winapi::Interface;

use super::command::CommandContext;
use super::state::StateBlock;
use super::{conv, Device};
use crate::auxil::dxgi::ComPtr;
use crate::present;
use crate::{ApiObject, PrivateDataStore, SwapchainError};

/// The presentation surface: wraps the application's DXGI swap chain and
/// owns the resolve machinery for multisampled presentation.
///
/// With MSAA active, rendering targets a separate single-sample resolve
/// texture. `on_present` resolves into it, lets observers draw, and
/// stretches the result back into the real multisampled back buffer
/// with the device's shared full-screen-triangle pipeline, capturing and
/// restoring all state that blit touches.
pub struct Swapchain {
    device: Device,
    orig: ComPtr<dxgi::IDXGISwapChain>,
    private: PrivateDataStore,
    width: u32,
    height: u32,
    back_buffer_format: api::Format,
    back_buffer: ComPtr<d3d11::ID3D11Texture2D>,
    back_buffer_resolved: ComPtr<d3d11::ID3D11Texture2D>,
    back_buffer_rtv: ComPtr<d3d11::ID3D11RenderTargetView>,
    back_buffer_resolved_srv: ComPtr<d3d11::ID3D11ShaderResourceView>,
    app_state: StateBlock,
    color_space: api::ColorSpace,
    is_vr: bool,
}

unsafe impl Send for Swapchain {}
unsafe impl Sync for Swapchain {}

impl Swapchain {
    /// Wraps a native swap chain and initializes the back buffer
    /// resources. Adds its own reference to `swapchain`.
    ///
    /// # Safety
    /// `swapchain` must be a valid `IDXGISwapChain` created on `device`.
    pub unsafe fn new(
        device: Device,
        swapchain: *mut dxgi::IDXGISwapChain,
    ) -> Result<Self, SwapchainError> {
        unsafe { (*swapchain).AddRef() };
        let mut this = Self {
            device,
            orig: unsafe { ComPtr::from_raw(swapchain) },
            private: PrivateDataStore::default(),
            width: 0,
            height: 0,
            back_buffer_format: api::Format::Unknown,
            back_buffer: ComPtr::null(),
            back_buffer_resolved: ComPtr::null(),
            back_buffer_rtv: ComPtr::null(),
            back_buffer_resolved_srv: ComPtr::null(),
            app_state: StateBlock::new(),
            color_space: api::ColorSpace::SrgbNonLinear,
            is_vr: false,
        };

        if let Err(err) = this.on_init() {
            log::error!("failed to initialize swap chain environment: {err}");
            return Err(err);
        }
        Ok(this)
    }

    pub fn is_initialized(&self) -> bool {
        !self.back_buffer.is_null()
    }

    /// Queries the native description and (re)creates the back buffer
    /// resources. Fails fast when the back buffer is unavailable.
    pub fn on_init(&mut self) -> Result<(), SwapchainError> {
        let mut swap_desc = unsafe { std::mem::zeroed::<dxgi::DXGI_SWAP_CHAIN_DESC>() };
        if !SUCCEEDED(unsafe { self.orig.GetDesc(&mut swap_desc) }) {
            return Err(SwapchainError::BackBufferUnavailable);
        }

        if self.width != 0
            && (self.width != swap_desc.BufferDesc.Width
                || self.height != swap_desc.BufferDesc.Height)
        {
            let events = std::sync::Arc::clone(&self.device.shared.events);
            events.resize_swapchain.notify(|cb| {
                cb(self, swap_desc.BufferDesc.Width, swap_desc.BufferDesc.Height)
            });
        }

        if !SUCCEEDED(unsafe {
            self.orig.GetBuffer(
                0,
                &d3d11::ID3D11Texture2D::uuidof(),
                self.back_buffer.mut_void(),
            )
        }) {
            return Err(SwapchainError::BackBufferUnavailable);
        }

        if swap_desc.SampleDesc.Count > 1 {
            let tex_desc = d3d11::D3D11_TEXTURE2D_DESC {
                Width: swap_desc.BufferDesc.Width,
                Height: swap_desc.BufferDesc.Height,
                MipLevels: 1,
                ArraySize: 1,
                Format: swap_desc.BufferDesc.Format,
                SampleDesc: winapi::shared::dxgitype::DXGI_SAMPLE_DESC {
                    Count: 1,
                    Quality: 0,
                },
                Usage: d3d11::D3D11_USAGE_DEFAULT,
                BindFlags: d3d11::D3D11_BIND_SHADER_RESOURCE | d3d11::D3D11_BIND_RENDER_TARGET,
                CPUAccessFlags: 0,
                MiscFlags: 0,
            };

            let raw = &self.device.shared.raw;
            unsafe {
                if !SUCCEEDED(raw.CreateTexture2D(
                    &tex_desc,
                    ptr::null(),
                    self.back_buffer_resolved.mut_self(),
                )) {
                    return Err(SwapchainError::Other("resolve texture creation"));
                }
                if !SUCCEEDED(raw.CreateRenderTargetView(
                    self.back_buffer.as_mut_ptr() as *mut d3d11::ID3D11Resource,
                    ptr::null(),
                    self.back_buffer_rtv.mut_self(),
                )) {
                    return Err(SwapchainError::Other("back buffer render target view"));
                }
                if !SUCCEEDED(raw.CreateShaderResourceView(
                    self.back_buffer_resolved.as_mut_ptr() as *mut d3d11::ID3D11Resource,
                    ptr::null(),
                    self.back_buffer_resolved_srv.mut_self(),
                )) {
                    return Err(SwapchainError::Other("resolve shader resource view"));
                }
            }
        } else {
            self.back_buffer_resolved = self.back_buffer.clone();

            // Some engines (notably Unreal) release one back buffer
            // reference they never added. Give it up here and put it
            // back in `on_reset`, so the application-visible count is
            // what those engines expect.
            unsafe { (*self.back_buffer.as_mut_ptr()).Release() };
        }

        self.width = swap_desc.BufferDesc.Width;
        self.height = swap_desc.BufferDesc.Height;
        self.back_buffer_format = conv::unmap_format(swap_desc.BufferDesc.Format);

        let events = std::sync::Arc::clone(&self.device.shared.events);
        events.init_swapchain.notify(|cb| cb(self));
        Ok(())
    }

    /// Releases all GPU objects, compensating for reference counts that
    /// the application may have externally decremented. After a
    /// successful sequence of init/reset cycles the back buffer count
    /// never drifts in either direction.
    pub fn on_reset(&mut self) {
        if self.back_buffer.is_null() {
            return;
        }

        let mut add_references = 0;
        let count = unsafe { self.back_buffer.ref_count() };
        if count == 0 {
            // The application released references it did not own (seen
            // before resize in some engines); letting our own releases
            // run now would drive the count negative and break DXGI
            // validation.
            add_references = if self.back_buffer == self.back_buffer_resolved {
                2
            } else {
                1
            };
        } else if self.back_buffer == self.back_buffer_resolved {
            // The reference given up in `on_init` comes back.
            add_references = 1;
        }
        for _ in 0..add_references {
            unsafe { (*(self.back_buffer.as_mut_ptr() as *mut winapi::um::unknwnbase::IUnknown)).AddRef() };
        }

        let events = std::sync::Arc::clone(&self.device.shared.events);
        events.destroy_swapchain.notify(|cb| cb(self));

        self.back_buffer = ComPtr::null();
        self.back_buffer_resolved = ComPtr::null();
        self.back_buffer_rtv = ComPtr::null();
        self.back_buffer_resolved_srv = ComPtr::null();
    }

    /// The per-frame presentation hook. Resolves the multisampled back
    /// buffer, notifies observers, and blits the result back if needed.
    pub fn on_present(&mut self, queue: &mut CommandContext) {
        queue.finish_open_render_pass();

        if !self.is_initialized() {
            return;
        }

        let ctx = &self.device.shared.immediate;
        unsafe { self.app_state.capture(ctx) };

        let msaa = self.back_buffer_resolved != self.back_buffer;
        if msaa {
            unsafe {
                ctx.ResolveSubresource(
                    self.back_buffer_resolved.as_mut_ptr() as *mut d3d11::ID3D11Resource,
                    0,
                    self.back_buffer.as_mut_ptr() as *mut d3d11::ID3D11Resource,
                    0,
                    conv::map_format(self.back_buffer_format),
                )
            };
        }

        {
            let events = std::sync::Arc::clone(&self.device.shared.events);
            events.present.notify(|cb| cb(queue, self));
        }

        if msaa {
            // Stretch the resolved image back into the multisampled back
            // buffer with the device's shared blit pipeline.
            let shared = &self.device.shared;
            unsafe {
                ctx.IASetInputLayout(ptr::null_mut());
                let null_buffer = ptr::null_mut::<d3d11::ID3D11Buffer>();
                let zero = 0u32;
                ctx.IASetVertexBuffers(0, 1, &null_buffer, &zero, &zero);
                ctx.IASetPrimitiveTopology(
                    winapi::um::d3dcommon::D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST,
                );
                ctx.VSSetShader(shared.copy_vs.as_mut_ptr(), ptr::null(), 0);
                ctx.HSSetShader(ptr::null_mut(), ptr::null(), 0);
                ctx.DSSetShader(ptr::null_mut(), ptr::null(), 0);
                ctx.GSSetShader(ptr::null_mut(), ptr::null(), 0);
                ctx.PSSetShader(shared.copy_ps.as_mut_ptr(), ptr::null(), 0);
                let sampler = shared.copy_sampler.as_mut_ptr();
                ctx.PSSetSamplers(0, 1, &sampler);
                let srv = self.back_buffer_resolved_srv.as_mut_ptr();
                ctx.PSSetShaderResources(0, 1, &srv);
                ctx.RSSetState(ptr::null_mut());
                let viewport = d3d11::D3D11_VIEWPORT {
                    TopLeftX: 0.0,
                    TopLeftY: 0.0,
                    Width: self.width as f32,
                    Height: self.height as f32,
                    MinDepth: 0.0,
                    MaxDepth: 1.0,
                };
                ctx.RSSetViewports(1, &viewport);
                ctx.OMSetBlendState(ptr::null_mut(), &[1.0; 4], !0);
                ctx.OMSetDepthStencilState(ptr::null_mut(), 0);
                let rtv = self.back_buffer_rtv.as_mut_ptr();
                ctx.OMSetRenderTargets(1, &rtv, ptr::null_mut());

                ctx.Draw(3, 0);
            }
        }

        unsafe { self.app_state.apply_and_release(ctx) };
    }

    /// The VR eye-compositing path: copies the bounded region of one
    /// eye's texture into the matching horizontal half of the internal
    /// back buffer, recreating it when the combined target outgrows the
    /// current dimensions (beyond the rounding tolerance) or changes
    /// format.
    ///
    /// Returns the composited target texture.
    ///
    /// # Safety
    /// `source` must be a valid 2D texture on this device.
    pub unsafe fn on_layer_submit(
        &mut self,
        eye: u32,
        source: *mut d3d11::ID3D11Texture2D,
        bounds: Option<[f32; 4]>,
    ) -> Result<*mut d3d11::ID3D11Texture2D, SwapchainError> {
        debug_assert!(eye < 2 && !source.is_null());

        let mut source_desc = unsafe { std::mem::zeroed::<d3d11::D3D11_TEXTURE2D_DESC>() };
        unsafe { (*source).GetDesc(&mut source_desc) };

        // A multisampled source cannot be region-copied.
        if source_desc.SampleDesc.Count > 1 {
            return Err(SwapchainError::Other("multisampled layer source"));
        }

        let region = present::eye_region(source_desc.Width, source_desc.Height, bounds);
        let region_width = region.width();
        let region_height = region.height();
        if region_width == 0 || region_height == 0 {
            return Err(SwapchainError::Other("empty layer bounds"));
        }
        let target_width = region_width * 2;

        let source_format = conv::unmap_format(source_desc.Format);
        if present::needs_recreate(
            (self.width, self.height, self.back_buffer_format),
            (target_width, region_height, source_format.into_typed()),
            present::RESIZE_TOLERANCE,
        ) {
            self.on_reset();

            let tex_desc = d3d11::D3D11_TEXTURE2D_DESC {
                Width: target_width,
                Height: region_height,
                MipLevels: 1,
                ArraySize: 1,
                Format: conv::map_format(source_format.into_typeless()),
                SampleDesc: winapi::shared::dxgitype::DXGI_SAMPLE_DESC {
                    Count: 1,
                    Quality: 0,
                },
                Usage: d3d11::D3D11_USAGE_DEFAULT,
                BindFlags: d3d11::D3D11_BIND_RENDER_TARGET | d3d11::D3D11_BIND_SHADER_RESOURCE,
                CPUAccessFlags: 0,
                MiscFlags: 0,
            };
            if !SUCCEEDED(unsafe {
                self.device
                    .shared
                    .raw
                    .CreateTexture2D(&tex_desc, ptr::null(), self.back_buffer.mut_self())
            }) {
                log::error!(
                    "failed to create layer target ({}x{}, {:?})",
                    target_width,
                    region_height,
                    source_format
                );
                return Err(SwapchainError::Other("layer target creation"));
            }
            self.back_buffer_resolved = self.back_buffer.clone();

            self.is_vr = true;
            self.width = target_width;
            self.height = region_height;
            self.back_buffer_format = source_format.into_typed();

            let events = std::sync::Arc::clone(&self.device.shared.events);
            events.init_swapchain.notify(|cb| cb(self));
        }

        // In case of an array texture, each eye comes from its own
        // layer.
        let source_subresource = if source_desc.ArraySize == 2 { eye } else { 0 };
        let native_region = conv::map_box(&region);
        unsafe {
            self.device.shared.immediate.CopySubresourceRegion(
                self.back_buffer.as_mut_ptr() as *mut d3d11::ID3D11Resource,
                0,
                eye * region_width,
                0,
                0,
                source as *mut d3d11::ID3D11Resource,
                source_subresource,
                &native_region,
            )
        };

        Ok(self.back_buffer.as_mut_ptr())
    }

    /// Updates the cached color space and notifies observers. Called by
    /// the hook layer when the application changes the output color
    /// space.
    pub fn on_set_color_space(&mut self, color_space: api::ColorSpace) {
        self.color_space = color_space;
        let events = std::sync::Arc::clone(&self.device.shared.events);
        events.set_color_space.notify(|cb| cb(self, color_space));
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        self.on_reset();
    }
}

impl ApiObject for Swapchain {
    fn native(&self) -> u64 {
        self.orig.as_mut_ptr() as u64
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
        if self.is_vr {
            return 0;
        }
        let mut swap_desc = unsafe { std::mem::zeroed::<dxgi::DXGI_SWAP_CHAIN_DESC>() };
        if SUCCEEDED(unsafe { self.orig.GetDesc(&mut swap_desc) }) {
            swap_desc.OutputWindow as u64
        } else {
            0
        }
    }

    fn back_buffer(&self, index: u32) -> api::Resource {
        debug_assert_eq!(index, 0);
        // Rendering always targets the resolved buffer; with MSAA off
        // the two are the same object.
        api::Resource(self.back_buffer_resolved.as_mut_ptr() as u64)
    }

    fn back_buffer_count(&self) -> u32 {
        1
    }

    fn current_back_buffer_index(&self) -> u32 {
        0
    }

    fn color_space(&self) -> api::ColorSpace {
        self.color_space
    }
}

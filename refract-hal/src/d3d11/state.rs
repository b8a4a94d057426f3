//! Capture and restore of the application pipeline state around the
//! internal swap chain blit, so the blit stays invisible to the host.
//!
//! Only the state the blit actually touches is captured: input
//! assembler, the first vertex buffer slot, the shader stages, the first
//! pixel-stage sampler and resource slots, rasterizer state, viewports,
//! and the output merger.

use std::ptr;

use winapi::shared::minwindef::UINT;
use winapi::um::{d3d11, d3dcommon};

unsafe fn release<T>(object: &mut *mut T) {
    if !object.is_null() {
        unsafe { (*(*object as *mut winapi::um::unknwnbase::IUnknown)).Release() };
        *object = ptr::null_mut();
    }
}

pub(crate) struct StateBlock {
    input_layout: *mut d3d11::ID3D11InputLayout,
    topology: d3dcommon::D3D_PRIMITIVE_TOPOLOGY,
    vertex_buffer: *mut d3d11::ID3D11Buffer,
    vertex_stride: UINT,
    vertex_offset: UINT,
    vs: *mut d3d11::ID3D11VertexShader,
    hs: *mut d3d11::ID3D11HullShader,
    ds: *mut d3d11::ID3D11DomainShader,
    gs: *mut d3d11::ID3D11GeometryShader,
    ps: *mut d3d11::ID3D11PixelShader,
    ps_sampler: *mut d3d11::ID3D11SamplerState,
    ps_srv: *mut d3d11::ID3D11ShaderResourceView,
    rasterizer_state: *mut d3d11::ID3D11RasterizerState,
    viewport_count: UINT,
    viewports: [d3d11::D3D11_VIEWPORT; d3d11::D3D11_VIEWPORT_AND_SCISSORRECT_OBJECT_COUNT_PER_PIPELINE as usize],
    blend_state: *mut d3d11::ID3D11BlendState,
    blend_constant: [f32; 4],
    sample_mask: UINT,
    depth_stencil_state: *mut d3d11::ID3D11DepthStencilState,
    stencil_reference: UINT,
    render_targets: [*mut d3d11::ID3D11RenderTargetView; d3d11::D3D11_SIMULTANEOUS_RENDER_TARGET_COUNT as usize],
    depth_stencil_view: *mut d3d11::ID3D11DepthStencilView,
}

impl StateBlock {
    pub fn new() -> Self {
        Self {
            input_layout: ptr::null_mut(),
            topology: 0,
            vertex_buffer: ptr::null_mut(),
            vertex_stride: 0,
            vertex_offset: 0,
            vs: ptr::null_mut(),
            hs: ptr::null_mut(),
            ds: ptr::null_mut(),
            gs: ptr::null_mut(),
            ps: ptr::null_mut(),
            ps_sampler: ptr::null_mut(),
            ps_srv: ptr::null_mut(),
            rasterizer_state: ptr::null_mut(),
            viewport_count: 0,
            viewports: [d3d11::D3D11_VIEWPORT {
                TopLeftX: 0.0,
                TopLeftY: 0.0,
                Width: 0.0,
                Height: 0.0,
                MinDepth: 0.0,
                MaxDepth: 0.0,
            };
                d3d11::D3D11_VIEWPORT_AND_SCISSORRECT_OBJECT_COUNT_PER_PIPELINE as usize],
            blend_state: ptr::null_mut(),
            blend_constant: [0.0; 4],
            sample_mask: !0,
            depth_stencil_state: ptr::null_mut(),
            stencil_reference: 0,
            render_targets: [ptr::null_mut();
                d3d11::D3D11_SIMULTANEOUS_RENDER_TARGET_COUNT as usize],
            depth_stencil_view: ptr::null_mut(),
        }
    }

    /// Captures the current state. Every captured COM pointer holds a
    /// reference until `apply_and_release`.
    pub unsafe fn capture(&mut self, ctx: &d3d11::ID3D11DeviceContext) {
        unsafe {
            ctx.IAGetInputLayout(&mut self.input_layout);
            ctx.IAGetPrimitiveTopology(&mut self.topology);
            ctx.IAGetVertexBuffers(
                0,
                1,
                &mut self.vertex_buffer,
                &mut self.vertex_stride,
                &mut self.vertex_offset,
            );

            ctx.VSGetShader(&mut self.vs, ptr::null_mut(), ptr::null_mut());
            ctx.HSGetShader(&mut self.hs, ptr::null_mut(), ptr::null_mut());
            ctx.DSGetShader(&mut self.ds, ptr::null_mut(), ptr::null_mut());
            ctx.GSGetShader(&mut self.gs, ptr::null_mut(), ptr::null_mut());
            ctx.PSGetShader(&mut self.ps, ptr::null_mut(), ptr::null_mut());

            ctx.PSGetSamplers(0, 1, &mut self.ps_sampler);
            ctx.PSGetShaderResources(0, 1, &mut self.ps_srv);

            ctx.RSGetState(&mut self.rasterizer_state);
            self.viewport_count = self.viewports.len() as UINT;
            ctx.RSGetViewports(&mut self.viewport_count, self.viewports.as_mut_ptr());

            ctx.OMGetBlendState(
                &mut self.blend_state,
                &mut self.blend_constant,
                &mut self.sample_mask,
            );
            ctx.OMGetDepthStencilState(&mut self.depth_stencil_state, &mut self.stencil_reference);
            ctx.OMGetRenderTargets(
                self.render_targets.len() as UINT,
                self.render_targets.as_mut_ptr(),
                &mut self.depth_stencil_view,
            );
        }
    }

    /// Puts the captured state back and drops the captured references.
    pub unsafe fn apply_and_release(&mut self, ctx: &d3d11::ID3D11DeviceContext) {
        unsafe {
            ctx.IASetInputLayout(self.input_layout);
            ctx.IASetPrimitiveTopology(self.topology);
            ctx.IASetVertexBuffers(
                0,
                1,
                &self.vertex_buffer,
                &self.vertex_stride,
                &self.vertex_offset,
            );

            ctx.VSSetShader(self.vs, ptr::null(), 0);
            ctx.HSSetShader(self.hs, ptr::null(), 0);
            ctx.DSSetShader(self.ds, ptr::null(), 0);
            ctx.GSSetShader(self.gs, ptr::null(), 0);
            ctx.PSSetShader(self.ps, ptr::null(), 0);

            ctx.PSSetSamplers(0, 1, &self.ps_sampler);
            ctx.PSSetShaderResources(0, 1, &self.ps_srv);

            ctx.RSSetState(self.rasterizer_state);
            ctx.RSSetViewports(self.viewport_count, self.viewports.as_ptr());

            ctx.OMSetBlendState(self.blend_state, &self.blend_constant, self.sample_mask);
            ctx.OMSetDepthStencilState(self.depth_stencil_state, self.stencil_reference);
            ctx.OMSetRenderTargets(
                self.render_targets.len() as UINT,
                self.render_targets.as_ptr(),
                self.depth_stencil_view,
            );

            release(&mut self.input_layout);
            release(&mut self.vertex_buffer);
            release(&mut self.vs);
            release(&mut self.hs);
            release(&mut self.ds);
            release(&mut self.gs);
            release(&mut self.ps);
            release(&mut self.ps_sampler);
            release(&mut self.ps_srv);
            release(&mut self.rasterizer_state);
            release(&mut self.blend_state);
            release(&mut self.depth_stencil_state);
            for target in self.render_targets.iter_mut() {
                release(target);
            }
            release(&mut self.depth_stencil_view);
        }
    }
}

impl Drop for StateBlock {
    fn drop(&mut self) {
        unsafe {
            release(&mut self.input_layout);
            release(&mut self.vertex_buffer);
            release(&mut self.vs);
            release(&mut self.hs);
            release(&mut self.ds);
            release(&mut self.gs);
            release(&mut self.ps);
            release(&mut self.ps_sampler);
            release(&mut self.ps_srv);
            release(&mut self.rasterizer_state);
            release(&mut self.blend_state);
            release(&mut self.depth_stencil_state);
            for target in self.render_targets.iter_mut() {
                release(target);
            }
            release(&mut self.depth_stencil_view);
        }
    }
}

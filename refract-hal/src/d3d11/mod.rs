/*!
# Direct3D 11 backend.

The unified model maps onto D3D11 with three quirks worth knowing about:

## Pipelines are bundles

D3D11 has no monolithic pipeline object; a full graphics pipeline is a
set of independently bindable shaders and state objects. A pipeline
handle therefore either aliases a single native object directly, or
carries a tag in its lowest bit and indexes a generation-checked arena
of [`PipelineBundle`] records owned by the device. Native COM pointers
are at least 8-byte aligned, which keeps the tag bit free.

## The immediate context is both list and queue

There is no separate submission object; [`CommandContext`] implements
both `CommandList` and `CommandQueue` over the immediate device context.

## Barriers are not free

D3D11 tracks hazards automatically, but leaving a stale shader-resource
or unordered-access view bound while the same resource is rewritten
violates its hazard rules, so `barrier` unbinds matching views across
all shader stages when resources transition away from those usages.
*/

mod command;
mod conv;
mod device;
mod state;
mod swapchain;

pub use command::CommandContext;
pub use device::Device;
pub use swapchain::Swapchain;

use std::sync::Arc;

use parking_lot::Mutex;
use winapi::shared::dxgi;
use winapi::um::{d3d11, d3dcommon};

use crate::auxil::dxgi::ComPtr;
use crate::binding::{DescriptorTableData, MergedParam};
use crate::events::EventRegistry;
use crate::fence::CpuFence;
use crate::PrivateDataStore;

/// Heap record behind a pipeline layout handle.
pub(crate) struct PipelineLayoutData {
    pub merged: Vec<MergedParam>,
}

/// Heap record behind a descriptor table handle.
pub(crate) struct TableData {
    pub data: DescriptorTableData,
}

/// Heap record behind a query pool handle. All member queries exist up
/// front so record-time operations never allocate.
pub(crate) struct QueryPoolData {
    pub ty: api::QueryType,
    pub queries: Vec<ComPtr<d3d11::ID3D11Query>>,
}

/// Heap record behind a fence handle.
///
/// D3D11 has no native fence object at the feature levels this backend
/// targets, so fences are either CPU-emulated counters or, when imported
/// from a shared handle, the legacy keyed mutex of the shared resource.
pub(crate) enum FenceData {
    Cpu(CpuFence),
    KeyedMutex(ComPtr<dxgi::IDXGIKeyedMutex>),
}

/// The state objects one graphics pipeline aggregates.
pub(crate) struct PipelineBundle {
    pub vs: ComPtr<d3d11::ID3D11VertexShader>,
    pub hs: ComPtr<d3d11::ID3D11HullShader>,
    pub ds: ComPtr<d3d11::ID3D11DomainShader>,
    pub gs: ComPtr<d3d11::ID3D11GeometryShader>,
    pub ps: ComPtr<d3d11::ID3D11PixelShader>,
    pub input_layout: ComPtr<d3d11::ID3D11InputLayout>,
    pub blend_state: ComPtr<d3d11::ID3D11BlendState>,
    pub rasterizer_state: ComPtr<d3d11::ID3D11RasterizerState>,
    pub depth_stencil_state: ComPtr<d3d11::ID3D11DepthStencilState>,
    pub topology: d3dcommon::D3D_PRIMITIVE_TOPOLOGY,
    pub sample_mask: u32,
    pub blend_constant: [f32; 4],
    pub stencil_reference: u32,
}

impl PipelineBundle {
    /// Binds the bundled state for the requested pipeline stages.
    pub unsafe fn apply(&self, ctx: &d3d11::ID3D11DeviceContext, stages: api::PipelineStages) {
        unsafe {
            if stages.contains(api::PipelineStages::VERTEX_SHADER) {
                ctx.VSSetShader(self.vs.as_mut_ptr(), std::ptr::null(), 0);
            }
            if stages.contains(api::PipelineStages::HULL_SHADER) {
                ctx.HSSetShader(self.hs.as_mut_ptr(), std::ptr::null(), 0);
            }
            if stages.contains(api::PipelineStages::DOMAIN_SHADER) {
                ctx.DSSetShader(self.ds.as_mut_ptr(), std::ptr::null(), 0);
            }
            if stages.contains(api::PipelineStages::GEOMETRY_SHADER) {
                ctx.GSSetShader(self.gs.as_mut_ptr(), std::ptr::null(), 0);
            }
            if stages.contains(api::PipelineStages::PIXEL_SHADER) {
                ctx.PSSetShader(self.ps.as_mut_ptr(), std::ptr::null(), 0);
            }
            if stages.contains(api::PipelineStages::INPUT_ASSEMBLER) {
                ctx.IASetInputLayout(self.input_layout.as_mut_ptr());
                if self.topology != d3dcommon::D3D_PRIMITIVE_TOPOLOGY_UNDEFINED {
                    ctx.IASetPrimitiveTopology(self.topology);
                }
            }
            if stages.contains(api::PipelineStages::RASTERIZER) {
                ctx.RSSetState(self.rasterizer_state.as_mut_ptr());
            }
            if stages.contains(api::PipelineStages::DEPTH_STENCIL) {
                ctx.OMSetDepthStencilState(
                    self.depth_stencil_state.as_mut_ptr(),
                    self.stencil_reference,
                );
            }
            if stages.contains(api::PipelineStages::OUTPUT_MERGER) {
                ctx.OMSetBlendState(
                    self.blend_state.as_mut_ptr(),
                    &self.blend_constant,
                    self.sample_mask,
                );
            }
        }
    }
}

const PIPELINE_TAG: u64 = 1;
const PIPELINE_INDEX_BITS: u64 = 32;

/// A decoded pipeline handle.
pub(crate) enum DecodedPipeline {
    /// The handle aliases a single native state object.
    Native(u64),
    /// The handle indexes the device's bundle arena.
    Owned { index: u32, generation: u32 },
}

/// Checked decode of the tagged handle representation.
pub(crate) fn decode_pipeline(handle: api::Pipeline) -> Option<DecodedPipeline> {
    if handle.is_null() {
        return None;
    }
    if handle.0 & PIPELINE_TAG == 0 {
        return Some(DecodedPipeline::Native(handle.0));
    }
    let index = ((handle.0 >> 1) & ((1 << PIPELINE_INDEX_BITS) - 1)) as u32;
    let generation = (handle.0 >> (1 + PIPELINE_INDEX_BITS)) as u32;
    Some(DecodedPipeline::Owned { index, generation })
}

fn encode_owned_pipeline(index: u32, generation: u32) -> api::Pipeline {
    api::Pipeline(
        PIPELINE_TAG | ((index as u64) << 1) | ((generation as u64) << (1 + PIPELINE_INDEX_BITS)),
    )
}

struct ArenaSlot {
    generation: u32,
    bundle: Option<PipelineBundle>,
}

/// Generation-checked storage for pipeline bundles. Stale handles decode
/// to `None` instead of aliasing a reused slot.
#[derive(Default)]
pub(crate) struct PipelineArena {
    slots: Vec<ArenaSlot>,
    free: Vec<u32>,
}

impl PipelineArena {
    pub fn insert(&mut self, bundle: PipelineBundle) -> api::Pipeline {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                debug_assert!(slot.bundle.is_none());
                slot.bundle = Some(bundle);
                encode_owned_pipeline(index, slot.generation)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(ArenaSlot {
                    generation: 0,
                    bundle: Some(bundle),
                });
                encode_owned_pipeline(index, 0)
            }
        }
    }

    pub fn get(&self, index: u32, generation: u32) -> Option<&PipelineBundle> {
        let slot = self.slots.get(index as usize)?;
        if slot.generation != generation {
            return None;
        }
        slot.bundle.as_ref()
    }

    pub fn remove(&mut self, index: u32, generation: u32) -> Option<PipelineBundle> {
        let slot = self.slots.get_mut(index as usize)?;
        if slot.generation != generation {
            return None;
        }
        let bundle = slot.bundle.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index);
        Some(bundle)
    }
}

/// State shared between the device wrapper, its contexts and swap
/// chains.
pub(crate) struct DeviceShared {
    pub raw: ComPtr<d3d11::ID3D11Device>,
    pub immediate: ComPtr<d3d11::ID3D11DeviceContext>,
    pub events: Arc<EventRegistry>,
    pub feature_level: d3dcommon::D3D_FEATURE_LEVEL,
    pub pipelines: Mutex<PipelineArena>,
    pub private: PrivateDataStore,
    // Fixed-function full-screen-triangle blit used by the swap chain
    // resolve path. Built once at device init, shared by every swap
    // chain on the device.
    pub copy_vs: ComPtr<d3d11::ID3D11VertexShader>,
    pub copy_ps: ComPtr<d3d11::ID3D11PixelShader>,
    pub copy_sampler: ComPtr<d3d11::ID3D11SamplerState>,
}

unsafe impl Send for DeviceShared {}
unsafe impl Sync for DeviceShared {}

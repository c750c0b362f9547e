//! Per-filter sampler cache.
//!
//! Samplers are created once per [`Filter`] and reused; the filter is
//! draw-call-wide GPU state, so the batcher rebinds (and flushes) when it
//! changes.

use ahash::HashMap;

use crate::drawing::Filter;

pub(crate) struct SamplerCache {
    samplers: HashMap<Filter, wgpu::Sampler>,
}

impl SamplerCache {
    pub fn new() -> Self {
        Self {
            samplers: HashMap::default(),
        }
    }

    /// Get or create the sampler for `filter`.
    ///
    /// The device has no cubic filter mode; `Filter::Cubic` samples
    /// linearly.
    pub fn get(&mut self, device: &wgpu::Device, filter: Filter) -> &wgpu::Sampler {
        self.samplers.entry(filter).or_insert_with(|| {
            let mode = match filter {
                Filter::Nearest => wgpu::FilterMode::Nearest,
                Filter::Linear | Filter::Cubic => wgpu::FilterMode::Linear,
            };
            device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("vexel sampler"),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: mode,
                min_filter: mode,
                mipmap_filter: wgpu::FilterMode::Nearest,
                ..Default::default()
            })
        })
    }
}

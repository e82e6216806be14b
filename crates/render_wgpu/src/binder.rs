//! Uniform upload and per-frame descriptor binding.
//!
//! The scene, velocity and max-velocity bind groups never change. The
//! reprojection and present bind groups depend on the ping-pong index and are
//! rebuilt for every frame from a `ReprojectionBindings` resolution.

use crate::history::{FrameParams, PingPong};
use crate::target::{OffscreenTargets, TargetId};
use crate::uniforms::{ReprojectionUniforms, SceneUniforms, TemporalSettings, VelocityUniforms};
use crate::wgpu;

/// Logical inputs of the reprojection pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputName {
    Depth,
    Color,
    PreviousColor,
    VelocityMax,
    Velocity,
}

impl InputName {
    pub const ALL: [InputName; 5] = [
        InputName::Depth,
        InputName::Color,
        InputName::PreviousColor,
        InputName::VelocityMax,
        InputName::Velocity,
    ];

    /// Binding slot in the reprojection bind group. Slot 0 is the uniform
    /// block, the sampler follows the textures.
    pub fn binding(self) -> u32 {
        match self {
            InputName::Depth => 1,
            InputName::Color => 2,
            InputName::PreviousColor => 3,
            InputName::VelocityMax => 4,
            InputName::Velocity => 5,
        }
    }
}

pub const REPROJECTION_UNIFORM_BINDING: u32 = 0;
pub const REPROJECTION_SAMPLER_BINDING: u32 = 6;

/// Logical to physical mapping for one frame's reprojection pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReprojectionBindings {
    pub depth: TargetId,
    pub color: TargetId,
    pub previous_color: TargetId,
    pub velocity_max: TargetId,
    pub velocity: TargetId,
    /// History slot this frame writes and the present pass samples
    pub output: TargetId,
}

impl ReprojectionBindings {
    /// Before any history exists the scene color stands in for it.
    pub fn resolve(ping_pong: PingPong, first_frame: bool) -> Self {
        let previous_color = if first_frame {
            TargetId::SceneColor
        } else {
            ping_pong.read_target()
        };
        Self {
            depth: TargetId::SceneDepth,
            color: TargetId::SceneColor,
            previous_color,
            velocity_max: TargetId::VelocityMax,
            velocity: TargetId::Velocity,
            output: ping_pong.write_target(),
        }
    }

    pub fn get(&self, name: InputName) -> TargetId {
        match name {
            InputName::Depth => self.depth,
            InputName::Color => self.color,
            InputName::PreviousColor => self.previous_color,
            InputName::VelocityMax => self.velocity_max,
            InputName::Velocity => self.velocity,
        }
    }

    pub fn inputs(&self) -> impl Iterator<Item = TargetId> + '_ {
        InputName::ALL.into_iter().map(|n| self.get(n))
    }
}

/// Bind groups that change every frame.
pub struct FrameBindGroups {
    pub reprojection: wgpu::BindGroup,
    pub present: wgpu::BindGroup,
}

/// Owns the uniform buffers and builds the per-frame bind groups.
pub struct Binder {
    pub(crate) scene_ubo: wgpu::Buffer,
    pub(crate) velocity_ubo: wgpu::Buffer,
    pub(crate) reprojection_ubo: wgpu::Buffer,
}

impl Binder {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            scene_ubo: uniform_buffer::<SceneUniforms>(device, "scene_ubo"),
            velocity_ubo: uniform_buffer::<VelocityUniforms>(device, "velocity_ubo"),
            reprojection_ubo: uniform_buffer::<ReprojectionUniforms>(device, "reprojection_ubo"),
        }
    }

    pub fn write_uniforms(&self, queue: &wgpu::Queue, params: &FrameParams, settings: &TemporalSettings) {
        queue.write_buffer(&self.scene_ubo, 0, bytemuck::bytes_of(&SceneUniforms::from_params(params)));
        queue.write_buffer(
            &self.velocity_ubo,
            0,
            bytemuck::bytes_of(&VelocityUniforms::from_params(params)),
        );
        queue.write_buffer(
            &self.reprojection_ubo,
            0,
            bytemuck::bytes_of(&ReprojectionUniforms::from_params(params, settings)),
        );
    }

    /// Build this frame's reprojection and present bind groups.
    pub fn update_bindings(
        &self,
        device: &wgpu::Device,
        targets: &OffscreenTargets,
        reprojection_layout: &wgpu::BindGroupLayout,
        present_layout: &wgpu::BindGroupLayout,
        bindings: &ReprojectionBindings,
    ) -> FrameBindGroups {
        let mut entries = vec![wgpu::BindGroupEntry {
            binding: REPROJECTION_UNIFORM_BINDING,
            resource: self.reprojection_ubo.as_entire_binding(),
        }];
        entries.extend(InputName::ALL.iter().map(|&name| wgpu::BindGroupEntry {
            binding: name.binding(),
            resource: wgpu::BindingResource::TextureView(targets.view(bindings.get(name))),
        }));
        entries.push(wgpu::BindGroupEntry {
            binding: REPROJECTION_SAMPLER_BINDING,
            resource: wgpu::BindingResource::Sampler(targets.sampler()),
        });

        let reprojection = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("reprojection_bg"),
            layout: reprojection_layout,
            entries: &entries,
        });

        let present = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("present_bg"),
            layout: present_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(targets.view(bindings.output)),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(targets.sampler()),
                },
            ],
        });

        FrameBindGroups { reprojection, present }
    }
}

fn uniform_buffer<T>(device: &wgpu::Device, label: &str) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: core::mem::size_of::<T>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Layout matching `ReprojectionBindings`: uniform, depth, four float
/// textures, sampler.
pub(crate) fn reprojection_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let mut entries = vec![uniform_entry::<ReprojectionUniforms>(
        REPROJECTION_UNIFORM_BINDING,
        wgpu::ShaderStages::FRAGMENT,
    )];
    entries.extend(InputName::ALL.iter().map(|&name| {
        let sample_type = match name {
            InputName::Depth => wgpu::TextureSampleType::Depth,
            _ => wgpu::TextureSampleType::Float { filterable: true },
        };
        texture_entry(name.binding(), sample_type)
    }));
    entries.push(wgpu::BindGroupLayoutEntry {
        binding: REPROJECTION_SAMPLER_BINDING,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    });

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("reprojection_bgl"),
        entries: &entries,
    })
}

pub(crate) fn present_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("present_bgl"),
        entries: &[
            texture_entry(0, wgpu::TextureSampleType::Float { filterable: true }),
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

pub(crate) fn texture_entry(binding: u32, sample_type: wgpu::TextureSampleType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type,
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

pub(crate) fn uniform_entry<T>(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: core::num::NonZeroU64::new(core::mem::size_of::<T>() as u64),
        },
        count: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_reads_scene_color_as_history() {
        let b = ReprojectionBindings::resolve(PingPong::new(), true);
        assert_eq!(b.previous_color, TargetId::SceneColor);
        assert_eq!(b.output, TargetId::History(0));
    }

    #[test]
    fn later_frames_read_the_other_slot() {
        let mut pp = PingPong::new();
        pp.flip();
        let b = ReprojectionBindings::resolve(pp, false);
        assert_eq!(b.previous_color, TargetId::History(0));
        assert_eq!(b.output, TargetId::History(1));
        assert_ne!(b.previous_color, b.output);

        pp.flip();
        let b = ReprojectionBindings::resolve(pp, false);
        assert_eq!(b.previous_color, TargetId::History(1));
        assert_eq!(b.output, TargetId::History(0));
    }

    #[test]
    fn fixed_inputs_do_not_move() {
        for first in [true, false] {
            let b = ReprojectionBindings::resolve(PingPong::new(), first);
            assert_eq!(b.get(InputName::Depth), TargetId::SceneDepth);
            assert_eq!(b.get(InputName::Color), TargetId::SceneColor);
            assert_eq!(b.get(InputName::VelocityMax), TargetId::VelocityMax);
            assert_eq!(b.get(InputName::Velocity), TargetId::Velocity);
            assert_eq!(b.inputs().count(), 5);
        }
    }

    #[test]
    fn binding_slots_are_unique() {
        let mut slots: Vec<u32> = InputName::ALL.iter().map(|n| n.binding()).collect();
        slots.push(REPROJECTION_UNIFORM_BINDING);
        slots.push(REPROJECTION_SAMPLER_BINDING);
        slots.sort_unstable();
        slots.dedup();
        assert_eq!(slots, vec![0, 1, 2, 3, 4, 5, 6]);
    }
}

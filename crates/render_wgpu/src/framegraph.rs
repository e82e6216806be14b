use std::collections::HashSet;

use crate::binder::ReprojectionBindings;
use crate::error::{RenderError, RenderResult};
use crate::pass::PassDesc;
use crate::target::TargetId;
use crate::wgpu;

const SCENE_CLEAR: wgpu::Color = wgpu::Color { r: 0.025, g: 0.025, b: 0.025, a: 1.0 };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    Scene,
    Velocity,
    VelocityMax,
    Reprojection,
    Present,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: PassKind,
    pub desc: PassDesc,
}

/// Ordered pass plan for one frame.
#[derive(Debug, Clone, Default)]
pub struct FrameGraph {
    pub(crate) nodes: Vec<Node>,
}

impl FrameGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full temporal chain for a frame with the given reprojection bindings.
    pub fn temporal(bindings: &ReprojectionBindings) -> Self {
        Self::new()
            .scene()
            .velocity()
            .velocity_max()
            .reprojection(bindings)
            .present(bindings.output)
    }

    pub fn scene(self) -> Self {
        let desc = PassDesc::offscreen("scene", TargetId::SceneColor, SCENE_CLEAR)
            .with_depth(TargetId::SceneDepth);
        self.push(PassKind::Scene, desc)
    }

    pub fn velocity(self) -> Self {
        let desc = PassDesc::offscreen("velocity", TargetId::Velocity, wgpu::Color::TRANSPARENT)
            .reading([TargetId::SceneDepth]);
        self.push(PassKind::Velocity, desc)
    }

    pub fn velocity_max(self) -> Self {
        let desc = PassDesc::offscreen("velocity_max", TargetId::VelocityMax, wgpu::Color::TRANSPARENT)
            .reading([TargetId::Velocity]);
        self.push(PassKind::VelocityMax, desc)
    }

    pub fn reprojection(self, bindings: &ReprojectionBindings) -> Self {
        let desc = PassDesc::offscreen("reprojection", bindings.output, wgpu::Color::BLACK)
            .reading(bindings.inputs());
        self.push(PassKind::Reprojection, desc)
    }

    pub fn present(self, source: TargetId) -> Self {
        let desc = PassDesc::present("present", wgpu::Color::BLACK).reading([source]);
        self.push(PassKind::Present, desc)
    }

    pub fn push(mut self, kind: PassKind, desc: PassDesc) -> Self {
        self.nodes.push(Node { kind, desc });
        self
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Check the read/write discipline of the plan.
    ///
    /// A pass may not read what it writes. A read must see a target written
    /// earlier in the frame, except history slots, which carry last frame's
    /// output and must then stay untouched for the rest of the frame. At most
    /// one history slot is written.
    pub fn validate(&self) -> RenderResult<()> {
        if self.nodes.is_empty() {
            return Err(RenderError::FrameGraph("no passes".into()));
        }

        let mut written: HashSet<TargetId> = HashSet::new();
        let mut carried: HashSet<TargetId> = HashSet::new();
        let mut history_writes = 0usize;

        for node in &self.nodes {
            let desc = &node.desc;
            if !desc.has_external_dependencies() {
                return Err(RenderError::FrameGraph(format!(
                    "pass '{}' is missing its external dependencies",
                    desc.label
                )));
            }

            let writes: Vec<TargetId> = desc.writes().collect();
            for read in &desc.reads {
                if writes.contains(read) {
                    return Err(RenderError::FrameGraph(format!(
                        "pass '{}' reads {} which it also writes",
                        desc.label, read
                    )));
                }
                if !written.contains(read) {
                    if read.is_history() {
                        carried.insert(*read);
                    } else {
                        return Err(RenderError::FrameGraph(format!(
                            "pass '{}' reads {} before any pass writes it",
                            desc.label, read
                        )));
                    }
                }
            }

            for w in writes {
                if carried.contains(&w) {
                    return Err(RenderError::FrameGraph(format!(
                        "pass '{}' overwrites {} which was read as history",
                        desc.label, w
                    )));
                }
                if w.is_history() {
                    history_writes += 1;
                }
                written.insert(w);
            }
        }

        if history_writes > 1 {
            return Err(RenderError::FrameGraph(format!(
                "{history_writes} history slots written in one frame"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::PingPong;

    fn kinds(fg: &FrameGraph) -> Vec<PassKind> {
        fg.nodes().iter().map(|n| n.kind).collect()
    }

    #[test]
    fn temporal_chain_runs_in_fixed_order() {
        let b = ReprojectionBindings::resolve(PingPong::new(), true);
        let fg = FrameGraph::temporal(&b);
        assert_eq!(
            kinds(&fg),
            vec![
                PassKind::Scene,
                PassKind::Velocity,
                PassKind::VelocityMax,
                PassKind::Reprojection,
                PassKind::Present,
            ]
        );
    }

    #[test]
    fn first_and_later_frames_validate() {
        let mut pp = PingPong::new();
        let first = FrameGraph::temporal(&ReprojectionBindings::resolve(pp, true));
        first.validate().expect("first frame");
        for _ in 0..4 {
            pp.flip();
            let fg = FrameGraph::temporal(&ReprojectionBindings::resolve(pp, false));
            fg.validate().expect("steady state");
        }
    }

    #[test]
    fn present_samples_the_slot_just_written() {
        let mut pp = PingPong::new();
        pp.flip();
        let b = ReprojectionBindings::resolve(pp, false);
        let fg = FrameGraph::temporal(&b);
        let present = &fg.nodes()[4].desc;
        assert_eq!(present.reads, vec![TargetId::History(1)]);
        let reproj = &fg.nodes()[3].desc;
        assert_eq!(reproj.writes().collect::<Vec<_>>(), vec![TargetId::History(1)]);
        assert!(reproj.reads.contains(&TargetId::History(0)));
    }

    #[test]
    fn reading_own_output_is_rejected() {
        let mut pp = PingPong::new();
        pp.flip();
        let mut b = ReprojectionBindings::resolve(pp, false);
        b.previous_color = b.output;
        let fg = FrameGraph::new().scene().velocity().velocity_max().reprojection(&b);
        let err = fg.validate().unwrap_err();
        assert!(matches!(err, RenderError::FrameGraph(_)));
        assert!(err.to_string().contains("also writes"));
    }

    #[test]
    fn reading_before_writing_is_rejected() {
        let fg = FrameGraph::new().scene().velocity_max();
        let err = fg.validate().unwrap_err();
        assert!(err.to_string().contains("before any pass writes it"));
    }

    #[test]
    fn overwriting_carried_history_is_rejected() {
        let mut pp = PingPong::new();
        pp.flip();
        let b = ReprojectionBindings::resolve(pp, false);
        let overwrite = PassDesc::offscreen("clobber", pp.read_target(), wgpu::Color::BLACK);
        let fg = FrameGraph::temporal(&b).push(PassKind::Reprojection, overwrite);
        assert!(fg.validate().is_err());
    }

    #[test]
    fn empty_plan_is_rejected() {
        assert!(FrameGraph::new().validate().is_err());
    }
}

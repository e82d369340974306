use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::content::SkeletonDef;

pub const ANIMATION_FRAME_RATE: f32 = 30.0;
pub const DEFAULT_BLENDING_SPEED: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationRange {
    pub from: f32,
    pub to: f32,
}

impl AnimationRange {
    pub fn frame_count(&self) -> f32 {
        self.to - self.from
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayingAnimation {
    pub range_name: String,
    pub range: AnimationRange,
    pub frame: f32,
    pub looped: bool,
    /// Blend weight ramping from 0 to 1 while the previous clip fades out.
    pub weight: f32,
}

/// Named frame ranges baked into one animation timeline, plus the clip
/// currently playing on it.
#[derive(Debug, Clone)]
pub struct Skeleton {
    name: String,
    ranges: BTreeMap<String, AnimationRange>,
    blending_speed: f32,
    playing: Option<PlayingAnimation>,
    fading_out: Option<PlayingAnimation>,
    begin_count: u32,
}

impl Skeleton {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ranges: BTreeMap::new(),
            blending_speed: DEFAULT_BLENDING_SPEED,
            playing: None,
            fading_out: None,
            begin_count: 0,
        }
    }

    pub fn from_def(def: &SkeletonDef) -> Self {
        def.ranges.iter().fold(Self::new(def.name.clone()), |skeleton, range| {
            skeleton.with_range(range.name.clone(), range.from, range.to)
        })
    }

    pub fn with_range(mut self, name: impl Into<String>, from: f32, to: f32) -> Self {
        self.ranges.insert(name.into(), AnimationRange { from, to });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn range(&self, name: &str) -> Option<AnimationRange> {
        self.ranges.get(name).copied()
    }

    pub fn has_range(&self, name: &str) -> bool {
        self.ranges.contains_key(name)
    }

    pub fn playing(&self) -> Option<&PlayingAnimation> {
        self.playing.as_ref()
    }

    pub fn is_blending(&self) -> bool {
        self.fading_out.is_some()
    }

    pub fn begin_count(&self) -> u32 {
        self.begin_count
    }

    /// Starts the named range from its first frame. Returns false when the
    /// range does not exist; playback is left untouched in that case.
    pub fn begin_animation(&mut self, range_name: &str, looped: bool) -> bool {
        let Some(range) = self.range(range_name) else {
            return false;
        };
        let previous = self.playing.take();
        let weight = if previous.is_some() { 0.0 } else { 1.0 };
        self.fading_out = previous;
        self.playing = Some(PlayingAnimation {
            range_name: range_name.to_string(),
            range,
            frame: range.from,
            looped,
            weight,
        });
        self.begin_count = self.begin_count.saturating_add(1);
        true
    }

    pub fn advance(&mut self, dt: f32) {
        let frames = dt.max(0.0) * ANIMATION_FRAME_RATE;
        if let Some(fading) = self.fading_out.as_mut() {
            step_frame(fading, frames);
        }
        let Some(playing) = self.playing.as_mut() else {
            return;
        };
        step_frame(playing, frames);
        if playing.weight < 1.0 {
            playing.weight = (playing.weight + self.blending_speed).min(1.0);
        }
        if playing.weight >= 1.0 {
            self.fading_out = None;
        }
    }
}

fn step_frame(animation: &mut PlayingAnimation, frames: f32) {
    let length = animation.range.frame_count();
    if length <= 0.0 {
        animation.frame = animation.range.from;
        return;
    }
    let next = animation.frame + frames;
    animation.frame = if next <= animation.range.to {
        next
    } else if animation.looped {
        animation.range.from + (next - animation.range.from) % length
    } else {
        animation.range.to
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipKind {
    Idle,
    Walk,
    Run,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipNames {
    pub idle: String,
    pub walk: String,
    pub run: String,
}

impl Default for ClipNames {
    fn default() -> Self {
        Self {
            idle: "YBot_Idle".to_string(),
            walk: "YBot_Walk".to_string(),
            run: "YBot_Run".to_string(),
        }
    }
}

impl ClipNames {
    pub fn name(&self, kind: ClipKind) -> &str {
        match kind {
            ClipKind::Idle => &self.idle,
            ClipKind::Walk => &self.walk,
            ClipKind::Run => &self.run,
        }
    }
}

/// Per-actor idle/walk/run state machine.
///
/// Starts in `Idle` without playing anything, then issues exactly one
/// `begin_animation` per state change.
#[derive(Debug, Clone)]
pub struct AnimationController {
    clips: ClipNames,
    current: ClipKind,
    enabled: bool,
    run_available: bool,
}

impl AnimationController {
    pub fn bind(clips: ClipNames, skeleton: Option<&Skeleton>, actor: &str) -> Self {
        let mut controller = Self {
            clips,
            current: ClipKind::Idle,
            enabled: false,
            run_available: false,
        };

        let Some(skeleton) = skeleton else {
            warn!(actor, "animation_disabled_no_skeleton");
            return controller;
        };
        let missing = [ClipKind::Idle, ClipKind::Walk]
            .into_iter()
            .map(|kind| controller.clips.name(kind))
            .filter(|name| !skeleton.has_range(name))
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            warn!(
                actor,
                skeleton = skeleton.name(),
                missing = ?missing,
                "animation_disabled_missing_range"
            );
            return controller;
        }

        controller.enabled = true;
        controller.run_available = skeleton.has_range(&controller.clips.run);
        if !controller.run_available {
            warn!(
                actor,
                run = %controller.clips.run,
                "run_range_missing_falling_back_to_walk"
            );
        }
        info!(actor, skeleton = skeleton.name(), "animation_bound");
        controller
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn current(&self) -> ClipKind {
        self.current
    }

    pub fn desired(&self, moving: bool, boosted: bool) -> ClipKind {
        match (moving, boosted) {
            (false, _) => ClipKind::Idle,
            (true, true) if self.run_available => ClipKind::Run,
            (true, _) => ClipKind::Walk,
        }
    }

    pub fn update(
        &mut self,
        moving: bool,
        boosted: bool,
        skeleton: &mut Skeleton,
    ) -> Option<ClipKind> {
        if !self.enabled {
            return None;
        }
        let desired = self.desired(moving, boosted);
        if desired == self.current {
            return None;
        }
        if !skeleton.begin_animation(self.clips.name(desired), true) {
            return None;
        }
        self.current = desired;
        Some(desired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::AnimationRangeDef;

    fn ybot() -> Skeleton {
        Skeleton::new("YBot")
            .with_range("YBot_Idle", 0.0, 89.0)
            .with_range("YBot_Walk", 90.0, 124.0)
            .with_range("YBot_Run", 125.0, 146.0)
    }

    #[test]
    fn from_def_copies_ranges() {
        let def = SkeletonDef {
            name: "s".to_string(),
            ranges: vec![AnimationRangeDef {
                name: "a".to_string(),
                from: 1.0,
                to: 5.0,
            }],
        };
        let skeleton = Skeleton::from_def(&def);
        assert_eq!(
            skeleton.range("a"),
            Some(AnimationRange { from: 1.0, to: 5.0 })
        );
    }

    #[test]
    fn begin_unknown_range_is_rejected() {
        let mut skeleton = ybot();
        assert!(!skeleton.begin_animation("YBot_Jump", true));
        assert!(skeleton.playing().is_none());
        assert_eq!(skeleton.begin_count(), 0);
    }

    #[test]
    fn looped_clip_wraps_inside_its_range() {
        let mut skeleton = Skeleton::new("s").with_range("a", 10.0, 20.0);
        skeleton.begin_animation("a", true);
        skeleton.advance(0.5);
        let playing = skeleton.playing().expect("playing");
        assert!((playing.frame - 15.0).abs() < 1e-4);

        skeleton.advance(0.5);
        let playing = skeleton.playing().expect("playing");
        assert!(playing.frame >= 10.0 && playing.frame <= 20.0);
        assert!((playing.frame - 10.0).abs() < 1e-3);
    }

    #[test]
    fn one_shot_clip_holds_last_frame() {
        let mut skeleton = Skeleton::new("s").with_range("a", 0.0, 3.0);
        skeleton.begin_animation("a", false);
        skeleton.advance(1.0);
        assert_eq!(skeleton.playing().expect("playing").frame, 3.0);
    }

    #[test]
    fn switching_clips_blends_in_over_ticks() {
        let mut skeleton = ybot();
        skeleton.begin_animation("YBot_Idle", true);
        assert_eq!(skeleton.playing().expect("idle").weight, 1.0);

        skeleton.begin_animation("YBot_Walk", true);
        assert!(skeleton.is_blending());
        skeleton.advance(1.0 / 60.0);
        let weight = skeleton.playing().expect("walk").weight;
        assert!((weight - DEFAULT_BLENDING_SPEED).abs() < 1e-6);

        for _ in 0..40 {
            skeleton.advance(1.0 / 60.0);
        }
        assert!(!skeleton.is_blending());
        assert_eq!(skeleton.playing().expect("walk").weight, 1.0);
    }

    #[test]
    fn controller_plays_once_per_state_change() {
        let mut skeleton = ybot();
        let mut controller = AnimationController::bind(ClipNames::default(), Some(&skeleton), "t");
        assert!(controller.is_enabled());
        assert_eq!(controller.current(), ClipKind::Idle);

        assert_eq!(controller.update(false, false, &mut skeleton), None);
        assert_eq!(skeleton.begin_count(), 0);

        assert_eq!(
            controller.update(true, false, &mut skeleton),
            Some(ClipKind::Walk)
        );
        assert_eq!(controller.update(true, false, &mut skeleton), None);
        assert_eq!(skeleton.begin_count(), 1);

        assert_eq!(
            controller.update(true, true, &mut skeleton),
            Some(ClipKind::Run)
        );
        assert_eq!(
            controller.update(false, true, &mut skeleton),
            Some(ClipKind::Idle)
        );
        assert_eq!(skeleton.begin_count(), 3);
        assert_eq!(
            skeleton.playing().expect("idle").range_name,
            "YBot_Idle".to_string()
        );
    }

    #[test]
    fn missing_skeleton_disables_animation() {
        let mut skeleton = ybot();
        let mut controller = AnimationController::bind(ClipNames::default(), None, "t");
        assert!(!controller.is_enabled());
        assert_eq!(controller.update(true, false, &mut skeleton), None);
        assert_eq!(skeleton.begin_count(), 0);
    }

    #[test]
    fn missing_walk_range_disables_animation() {
        let skeleton = Skeleton::new("s").with_range("YBot_Idle", 0.0, 1.0);
        let controller = AnimationController::bind(ClipNames::default(), Some(&skeleton), "t");
        assert!(!controller.is_enabled());
    }

    #[test]
    fn missing_run_range_falls_back_to_walk() {
        let mut skeleton = Skeleton::new("s")
            .with_range("YBot_Idle", 0.0, 1.0)
            .with_range("YBot_Walk", 2.0, 3.0);
        let mut controller = AnimationController::bind(ClipNames::default(), Some(&skeleton), "t");
        assert!(controller.is_enabled());
        assert_eq!(
            controller.update(true, true, &mut skeleton),
            Some(ClipKind::Walk)
        );
        assert_eq!(controller.update(true, false, &mut skeleton), None);
    }
}

//! Wellbore label placement: stacked under the root, or at the path end
//! rotated to follow the last segment.

use foundation::math::Vec2;
use geometry::PathInterpolator;
use gpu::{MeshStore, TextHandle};

use super::config::WellboreLabelConfig;

/// Extra clearance on the right-hand side of a path end.
const END_CLEARANCE: f64 = 0.075;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LabelLayout {
    pub scale: f64,
    pub config: WellboreLabelConfig,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LabelPlacement {
    pub position: Vec2,
    pub anchor: [f64; 2],
    /// Radians.
    pub rotation: f64,
}

impl LabelPlacement {
    /// Writes the placement and scale to a text item. Queues nothing when
    /// unchanged.
    pub fn apply(&self, store: &mut MeshStore, handle: TextHandle, scale: f64) -> bool {
        store.update_text(handle, |t| {
            t.position = self.position;
            t.anchor = self.anchor;
            t.rotation = self.rotation;
            t.scale = scale;
        })
    }
}

/// `index`-th label stacked below a root.
pub fn at_root(root: Vec2, index: usize, layout: &LabelLayout) -> LabelPlacement {
    let LabelLayout { scale, config } = *layout;
    let y = config.root_displacement
        + 5.0 * scale
        + index as f64 * (config.height + 5.0) * scale
        + root.y;
    LabelPlacement {
        position: Vec2::new(root.x, y),
        anchor: [0.5, 0.0],
        rotation: 0.0,
    }
}

/// Label beside the end of the path, reading away from it.
pub fn along_path(interp: &PathInterpolator, wellbore_width: f64) -> LabelPlacement {
    let end = interp.get_point(1.0);
    let tail = wellbore_width.min(interp.length());
    let start = interp.get_point_from_end(tail);
    let mut dir = end.position - start.position;
    if dir.length() == 0.0 {
        dir = end.direction;
    }
    if dir.length() == 0.0 {
        dir = Vec2::RIGHT;
    }

    if dir.x < 0.0 {
        LabelPlacement {
            position: end.position + dir.rotate270().with_length(wellbore_width * 0.5),
            anchor: [1.03, 0.7],
            rotation: Vec2::signed_angle(Vec2::LEFT, dir),
        }
    } else {
        LabelPlacement {
            position: end.position
                + dir
                    .rotate90()
                    .with_length(wellbore_width * 0.5 + END_CLEARANCE),
            anchor: [-0.03, 0.7],
            rotation: Vec2::signed_angle(Vec2::RIGHT, dir),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LabelLayout, along_path, at_root};
    use crate::wellbores::config::WellboreLabelConfig;
    use foundation::math::Vec2;
    use geometry::PathInterpolator;
    use pretty_assertions::assert_eq;

    fn layout() -> LabelLayout {
        LabelLayout {
            scale: 0.5,
            config: WellboreLabelConfig {
                height: 10.0,
                root_displacement: 1.0,
            },
        }
    }

    #[test]
    fn root_labels_stack_downwards() {
        let root = Vec2::new(3.0, 4.0);
        let first = at_root(root, 0, &layout());
        let second = at_root(root, 1, &layout());
        assert_eq!(first.position, Vec2::new(3.0, 7.5));
        assert_eq!(second.position, Vec2::new(3.0, 15.0));
        assert_eq!(first.anchor, [0.5, 0.0]);
    }

    #[test]
    fn rightward_path_labels_anchor_left() {
        let interp =
            PathInterpolator::new(&[Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)], 0.01).unwrap();
        let p = along_path(&interp, 0.2);
        assert_eq!(p.anchor, [-0.03, 0.7]);
        assert!(p.rotation.abs() < 1e-12);
        assert!((p.position.x - 10.0).abs() < 1e-12);
        assert!((p.position.y - 0.175).abs() < 1e-12);
    }

    #[test]
    fn leftward_path_labels_stay_upright() {
        let interp =
            PathInterpolator::new(&[Vec2::new(0.0, 0.0), Vec2::new(-10.0, 0.0)], 0.01).unwrap();
        let p = along_path(&interp, 0.2);
        assert_eq!(p.anchor, [1.03, 0.7]);
        assert!(p.rotation.abs() < 1e-12);
        assert!((p.position.y - 0.1).abs() < 1e-12);
    }
}

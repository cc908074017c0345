use glam::Vec3;
use ordered_float::OrderedFloat;

/// Draw order relative to the viewer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Sorting {
    /// Nearest first. An optimization for opaque geometry.
    FrontToBack,
    /// Furthest first. Required for alpha-blended geometry; blending is
    /// order dependent.
    BackToFront,
}

/// Sorts draw items by squared distance from the camera.
pub fn sort_by_distance<T>(
    items: &mut [T],
    camera_location: Vec3,
    location: impl Fn(&T) -> Vec3,
    sorting: Sorting,
) {
    profiling::scope!("sort_by_distance");

    match sorting {
        Sorting::FrontToBack => {
            items.sort_unstable_by_key(|item| OrderedFloat(location(item).distance_squared(camera_location)));
        }
        Sorting::BackToFront => {
            items.sort_unstable_by_key(|item| OrderedFloat(-location(item).distance_squared(camera_location)));
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::{sort_by_distance, Sorting};

    #[test]
    fn back_to_front_puts_furthest_first() {
        let mut items = vec![Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 0.0, -9.0), Vec3::new(0.0, 0.0, -4.0)];
        sort_by_distance(&mut items, Vec3::ZERO, |v| *v, Sorting::BackToFront);
        assert_eq!(
            items,
            [Vec3::new(0.0, 0.0, -9.0), Vec3::new(0.0, 0.0, -4.0), Vec3::new(0.0, 0.0, -1.0)]
        );
    }

    #[test]
    fn front_to_back_puts_nearest_first() {
        let mut items = vec![Vec3::splat(5.0), Vec3::splat(1.0), Vec3::splat(3.0)];
        sort_by_distance(&mut items, Vec3::ZERO, |v| *v, Sorting::FrontToBack);
        assert_eq!(items, [Vec3::splat(1.0), Vec3::splat(3.0), Vec3::splat(5.0)]);
    }

    #[test]
    fn distance_is_measured_from_the_camera() {
        let camera = Vec3::new(10.0, 0.0, 0.0);
        let mut items = vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(9.0, 0.0, 0.0)];
        sort_by_distance(&mut items, camera, |v| *v, Sorting::BackToFront);
        assert_eq!(items, [Vec3::new(0.0, 0.0, 0.0), Vec3::new(9.0, 0.0, 0.0)]);
    }
}

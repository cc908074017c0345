//! Movement controllers and the camera mode state machine.
//!
//! Exactly one [`Controller`] is active at a time, held in a
//! [`ControlState`] the scene driver owns and passes into its input
//! handling. Controllers are pure behaviors over the [`Camera`] and the
//! controlled [`Transform`]s; they keep no state of their own.
//!
//! Switching into or out of first-person is transactional: translate and
//! rotation are copied between the primary model and the first-person
//! proxy, the camera position is saved and restored, and the camera's
//! direction source flips between mouse-driven Euler angles and the
//! proxy-derived direction. Toggling in and out with no movement in
//! between leaves the primary transform and camera position exactly
//! where they started.

use glam::Vec3;
use rime_types::{Camera, DirectionSource, Transform};

/// Vertical displacement from the proxy model's feet to the first-person
/// eye position.
pub const DEFAULT_EYE_OFFSET: Vec3 = Vec3::new(0.0, 6.0, 0.0);
/// Radians per second the orbit mode revolves the camera at.
pub const ORBIT_ANGULAR_SPEED: f32 = 0.8;
/// Degrees of yaw/pitch per mouse count.
pub const DEFAULT_MOUSE_SENSITIVITY: f32 = 0.05;

/// The movement behavior currently receiving input.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Controller {
    /// Move the camera along its own forward/right vectors.
    #[default]
    FreeCamera,
    /// Move the primary model along its facing; the camera is driven
    /// separately.
    ThirdPerson,
    /// Move the first-person proxy model, with the camera glued to its
    /// eye position.
    FirstPerson,
}

/// A directional movement command, already decoupled from key bindings.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MoveCommand {
    Ahead,
    Back,
    Left,
    Right,
}

/// All mutable control state: the active controller, the orbit toggle,
/// and the saved camera position for the first-person round trip.
#[derive(Debug, Clone)]
pub struct ControlState {
    pub controller: Controller,
    /// Orbit mode runs concurrently with whichever controller is active.
    pub orbit: bool,
    pub eye_offset: Vec3,
    pub sensitivity: f32,
    saved_camera_position: Vec3,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            controller: Controller::default(),
            orbit: false,
            eye_offset: DEFAULT_EYE_OFFSET,
            sensitivity: DEFAULT_MOUSE_SENSITIVITY,
            saved_camera_position: Vec3::ZERO,
        }
    }
}

impl ControlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one movement command through the active controller.
    ///
    /// `primary` is the model third-person mode drives; `proxy` is the
    /// first-person stand-in body. The displacement magnitude is always
    /// `speed * dt`.
    pub fn apply_move(
        &self,
        command: MoveCommand,
        speed: f32,
        dt: f32,
        camera: &mut Camera,
        primary: &mut Transform,
        proxy: &mut Transform,
    ) {
        let step = speed * dt;
        match self.controller {
            Controller::FreeCamera => {
                let right = camera.direction.cross(camera.up).normalize();
                camera.position += step
                    * match command {
                        MoveCommand::Ahead => camera.direction,
                        MoveCommand::Back => -camera.direction,
                        MoveCommand::Left => -right,
                        MoveCommand::Right => right,
                    };
            }
            Controller::ThirdPerson => {
                let forward = primary.forward();
                let right = forward.cross(Vec3::Y).normalize();
                primary.translate += step
                    * match command {
                        MoveCommand::Ahead => forward,
                        MoveCommand::Back => -forward,
                        MoveCommand::Left => -right,
                        MoveCommand::Right => right,
                    };
            }
            Controller::FirstPerson => {
                let forward = proxy.forward();
                let right = forward.cross(Vec3::Y).normalize();
                proxy.translate += step
                    * match command {
                        MoveCommand::Ahead => forward,
                        MoveCommand::Back => -forward,
                        MoveCommand::Left => -right,
                        MoveCommand::Right => right,
                    };
                self.sync_first_person_camera(camera, proxy);
            }
        }
    }

    /// Repositions the camera at the proxy's eye point, looking along the
    /// proxy's facing. The camera must be in `External` direction mode,
    /// which [`ControlState::toggle_first_person`] arranges.
    pub fn sync_first_person_camera(&self, camera: &mut Camera, proxy: &Transform) {
        let forward = proxy.forward();
        camera.position = proxy.translate + self.eye_offset + forward;
        camera.direction = forward;
    }

    /// Switches into first-person from any other controller, or back out
    /// to third-person.
    ///
    /// Entering copies the primary model's translate/rotation onto the
    /// proxy, saves the camera position, and hands the camera's direction
    /// to the proxy. Leaving copies the proxy's translate/rotation back,
    /// restores the camera position, and returns the camera to
    /// mouse-driven Euler angles.
    pub fn toggle_first_person(&mut self, camera: &mut Camera, primary: &mut Transform, proxy: &mut Transform) {
        if self.controller == Controller::FirstPerson {
            primary.translate = proxy.translate;
            primary.rotate = proxy.rotate;
            camera.position = self.saved_camera_position;
            camera.direction_source = DirectionSource::EulerAngles;
            self.controller = Controller::ThirdPerson;
        } else {
            proxy.translate = primary.translate;
            proxy.rotate = primary.rotate;
            self.saved_camera_position = camera.position;
            camera.direction_source = DirectionSource::External;
            self.controller = Controller::FirstPerson;
            self.sync_first_person_camera(camera, proxy);
        }
    }

    /// Revolves the camera around the world origin when orbit mode is on.
    ///
    /// The step moves along the tangent of the camera's radius vector
    /// projected onto the XZ plane, then restores the horizontal radius,
    /// so the camera circles at constant height and distance regardless
    /// of frame time. Runs independently of the active controller.
    pub fn orbit_step(&self, camera: &mut Camera, dt: f32) {
        if !self.orbit {
            return;
        }

        let radius = Vec3::new(camera.position.x, 0.0, camera.position.z);
        let distance = radius.length();
        if distance < f32::EPSILON {
            return;
        }

        let tangent = Vec3::new(-radius.z, 0.0, radius.x) / distance;
        let moved = radius + tangent * (ORBIT_ANGULAR_SPEED * dt * distance);
        let horizontal = moved.normalize() * distance;
        camera.position = Vec3::new(horizontal.x, camera.position.y, horizontal.z);
    }

    /// Routes a mouse movement delta: camera yaw/pitch in free-camera
    /// mode, primary model yaw in third-person, proxy yaw (with the
    /// camera re-glued) in first-person.
    pub fn mouse_look(
        &self,
        dx: f32,
        dy: f32,
        camera: &mut Camera,
        primary: &mut Transform,
        proxy: &mut Transform,
    ) {
        match self.controller {
            Controller::FreeCamera => camera.apply_mouse_delta(dx, dy, self.sensitivity),
            Controller::ThirdPerson => primary.rotate.y -= dx * self.sensitivity,
            Controller::FirstPerson => {
                proxy.rotate.y -= dx * self.sensitivity;
                self.sync_first_person_camera(camera, proxy);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use rime_types::{Camera, DirectionSource, Transform};

    use super::{ControlState, Controller, MoveCommand};

    fn scene() -> (Camera, Transform, Transform) {
        (Camera::default(), Transform::default(), Transform::default())
    }

    #[test]
    fn third_person_ahead_moves_along_local_z() {
        let (mut camera, mut primary, mut proxy) = scene();
        let state = ControlState {
            controller: Controller::ThirdPerson,
            ..ControlState::new()
        };

        state.apply_move(MoveCommand::Ahead, 10.0, 0.5, &mut camera, &mut primary, &mut proxy);

        // Forward at zero rotation is local +Z; 10 * 0.5 = 5.
        assert_eq!(primary.translate, Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(camera.position, Vec3::ZERO);
        assert_eq!(proxy.translate, Vec3::ZERO);
    }

    #[test]
    fn free_camera_moves_itself_only() {
        let (mut camera, mut primary, mut proxy) = scene();
        let state = ControlState::new();

        state.apply_move(MoveCommand::Ahead, 2.0, 1.0, &mut camera, &mut primary, &mut proxy);
        assert_eq!(camera.position, Vec3::new(0.0, 0.0, -2.0));

        state.apply_move(MoveCommand::Right, 2.0, 1.0, &mut camera, &mut primary, &mut proxy);
        // Right of -Z facing is +X.
        assert_eq!(camera.position, Vec3::new(2.0, 0.0, -2.0));

        assert_eq!(primary.translate, Vec3::ZERO);
        assert_eq!(proxy.translate, Vec3::ZERO);
    }

    #[test]
    fn first_person_glues_camera_to_proxy_eye() {
        let (mut camera, mut primary, mut proxy) = scene();
        let mut state = ControlState {
            controller: Controller::ThirdPerson,
            ..ControlState::new()
        };
        state.toggle_first_person(&mut camera, &mut primary, &mut proxy);

        state.apply_move(MoveCommand::Ahead, 4.0, 0.25, &mut camera, &mut primary, &mut proxy);

        assert_eq!(proxy.translate, Vec3::new(0.0, 0.0, 1.0));
        // Eye = feet + eye offset + forward.
        assert_eq!(camera.position, Vec3::new(0.0, 6.0, 2.0));
        assert_eq!(camera.direction, Vec3::Z);
    }

    #[test]
    fn first_person_toggle_is_an_involution() {
        let (mut camera, mut primary, mut proxy) = scene();
        camera.position = Vec3::new(1.0, 3.0, 5.0);
        primary.translate = Vec3::new(-2.0, 0.0, 7.0);
        primary.rotate = Vec3::new(0.0, 30.0, 0.0);

        let mut state = ControlState {
            controller: Controller::ThirdPerson,
            ..ControlState::new()
        };

        state.toggle_first_person(&mut camera, &mut primary, &mut proxy);
        assert_eq!(state.controller, Controller::FirstPerson);
        assert_eq!(camera.direction_source, DirectionSource::External);
        assert_eq!(proxy.translate, Vec3::new(-2.0, 0.0, 7.0));

        state.toggle_first_person(&mut camera, &mut primary, &mut proxy);
        assert_eq!(state.controller, Controller::ThirdPerson);
        assert_eq!(camera.direction_source, DirectionSource::EulerAngles);
        assert_eq!(camera.position, Vec3::new(1.0, 3.0, 5.0));
        assert_eq!(primary.translate, Vec3::new(-2.0, 0.0, 7.0));
        assert_eq!(primary.rotate, Vec3::new(0.0, 30.0, 0.0));
    }

    #[test]
    fn orbit_preserves_radius_and_height() {
        let (mut camera, ..) = scene();
        camera.position = Vec3::new(3.0, 2.0, 4.0);
        let state = ControlState {
            orbit: true,
            ..ControlState::new()
        };

        let before = camera.position;
        state.orbit_step(&mut camera, 0.016);

        assert_ne!(camera.position, before);
        assert_eq!(camera.position.y, 2.0);
        let radius = |p: Vec3| Vec3::new(p.x, 0.0, p.z).length();
        assert!((radius(camera.position) - radius(before)).abs() < 1e-4);
    }

    #[test]
    fn orbit_off_is_a_no_op() {
        let (mut camera, ..) = scene();
        camera.position = Vec3::new(3.0, 2.0, 4.0);
        let state = ControlState::new();

        state.orbit_step(&mut camera, 0.016);
        assert_eq!(camera.position, Vec3::new(3.0, 2.0, 4.0));
    }

    #[test]
    fn mouse_look_targets_the_active_controller() {
        let (mut camera, mut primary, mut proxy) = scene();

        let free = ControlState::new();
        free.mouse_look(10.0, 0.0, &mut camera, &mut primary, &mut proxy);
        assert_eq!(camera.yaw, 0.5);
        assert_eq!(primary.rotate, Vec3::ZERO);

        let third = ControlState {
            controller: Controller::ThirdPerson,
            ..ControlState::new()
        };
        third.mouse_look(10.0, 0.0, &mut camera, &mut primary, &mut proxy);
        assert_eq!(primary.rotate.y, -0.5);
        assert_eq!(camera.yaw, 0.5);
    }
}

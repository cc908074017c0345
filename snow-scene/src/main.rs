//! Winter scene demo: a textured ground plane, a glTF character, ice
//! panes, a skybox, and one shadow-casting point light.
//!
//! Controls: WASD moves through the active controller (Tab switches
//! free camera / third person, right click enters or leaves first
//! person, middle click toggles orbit mode), the mouse looks, R/F move
//! the camera vertically, IJKL/U/H move the light, Escape quits.

use std::{path::PathBuf, sync::Arc, time::Instant};

use glam::Vec3;
use pico_args::Arguments;
use rustc_hash::FxHashMap;
use winit::{
    dpi::PhysicalSize,
    event::{DeviceEvent, Event, MouseButton, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, WindowBuilder},
};

use rime::{Mesh, Renderer, Shader, ShaderConfig, TextureResource, VertexInterface};
use rime_controls::{ControlState, Controller, MoveCommand};
use rime_routine::{
    shaders, sort_by_distance, ForwardRoutine, ShadowRoutine, SkyboxRoutine, Sorting, DEFAULT_SHADOW_RESOLUTION,
};
use rime_types::{plane, Camera, DirectionSource, Light, LightKind, Projection, TextureKind, Transform};

const MOVE_SPEED: f32 = 3.0;
const LIGHT_SPEED: f32 = 2.0;

struct DemoArgs {
    width: u32,
    height: u32,
    assets: PathBuf,
    model: Option<PathBuf>,
    no_vsync: bool,
}

fn parse_args() -> DemoArgs {
    let mut args = Arguments::from_env();
    DemoArgs {
        width: args.opt_value_from_str("--width").unwrap_or(None).unwrap_or(1024),
        height: args.opt_value_from_str("--height").unwrap_or(None).unwrap_or(720),
        assets: args
            .opt_value_from_str("--assets")
            .unwrap_or(None)
            .unwrap_or_else(|| PathBuf::from("assets")),
        model: args.opt_value_from_str("--model").unwrap_or(None),
        no_vsync: args.contains("--no-vsync"),
    }
}

#[derive(Default)]
struct KeyTable(FxHashMap<KeyCode, bool>);

impl KeyTable {
    fn set(&mut self, code: KeyCode, pressed: bool) {
        self.0.insert(code, pressed);
    }

    fn pressed(&self, code: KeyCode) -> bool {
        self.0.get(&code).copied().unwrap_or(false)
    }
}

fn load_skybox(renderer: &Renderer, dir: &std::path::Path) -> Option<Arc<TextureResource>> {
    const FACES: [&str; 6] = ["right.jpg", "left.jpg", "top.jpg", "bottom.jpg", "front.jpg", "back.jpg"];

    let mut faces = Vec::with_capacity(6);
    for name in FACES {
        match std::fs::read(dir.join(name)) {
            Ok(bytes) => faces.push(bytes),
            Err(error) => {
                log::warn!("No skybox: failed to read {}: {error}", dir.join(name).display());
                return None;
            }
        }
    }

    let faces: [Vec<u8>; 6] = faces.try_into().expect("exactly six faces were read");
    Some(TextureResource::cube_from_encoded(renderer, &faces, "skybox"))
}

fn ice_pane(tint: &Arc<TextureResource>, translate: Vec3) -> Mesh {
    let mut pane = Mesh::new(plane()).unwrap();
    pane.transform = Transform {
        translate,
        rotate: Vec3::new(90.0, 0.0, 0.0),
        scale: Vec3::new(2.0, 1.0, 2.0),
    };
    pane.add_texture(Arc::clone(tint));
    pane
}

fn main() {
    env_logger::init();
    let args = parse_args();

    let event_loop = EventLoop::new().expect("failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Snow")
            .with_inner_size(PhysicalSize::new(args.width, args.height))
            .build(&event_loop)
            .expect("failed to create window"),
    );
    window
        .set_cursor_grab(CursorGrabMode::Confined)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Locked))
        .ok();
    window.set_cursor_visible(false);

    let instance = wgpu::Instance::default();
    let surface = instance
        .create_surface(Arc::clone(&window))
        .expect("failed to create surface");
    let renderer = Renderer::new(&instance, Some(&surface)).expect("failed to initialize renderer");

    let caps = surface.get_capabilities(&renderer.adapter);
    let surface_format = caps
        .formats
        .iter()
        .copied()
        .find(|format| format.is_srgb())
        .unwrap_or(caps.formats[0]);
    let mut config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format: surface_format,
        width: args.width,
        height: args.height,
        present_mode: if args.no_vsync {
            wgpu::PresentMode::AutoNoVsync
        } else {
            wgpu::PresentMode::AutoVsync
        },
        desired_maximum_frame_latency: 2,
        alpha_mode: caps.alpha_modes[0],
        view_formats: Vec::new(),
    };
    surface.configure(&renderer.device, &config);

    // Passes and shaders.
    let mut shadow = ShadowRoutine::new(&renderer, DEFAULT_SHADOW_RESOLUTION);
    let mut forward = ForwardRoutine::new(&renderer, config.width, config.height);
    let mut skybox = SkyboxRoutine::new(&renderer, surface_format);
    skybox.set_background_texture(load_skybox(&renderer, &args.assets.join("skybox")));

    let lit = Shader::from_wgsl(
        &renderer,
        "default",
        shaders::DEFAULT,
        ShaderConfig::forward(surface_format),
        VertexInterface::LIT,
    );
    let translucent = Shader::from_wgsl(
        &renderer,
        "translucent",
        shaders::DEFAULT,
        ShaderConfig::transparent(surface_format),
        VertexInterface::LIT,
    );
    let emissive = Shader::from_wgsl(
        &renderer,
        "emissive",
        shaders::EMISSIVE,
        ShaderConfig::forward(surface_format),
        VertexInterface {
            normal: false,
            texcoord_layers: 1,
        },
    );

    // Scene content.
    let mut light = Light {
        kind: LightKind::Point,
        position: Vec3::new(2.2, 2.0, -4.0),
        diffuse: Vec3::new(218.0, 218.0, 192.0) / 255.0,
        ..Light::default()
    };

    let mut camera = Camera {
        position: Vec3::new(0.0, 3.0, 5.0),
        ..Camera::default()
    };
    camera.set_aspect_ratio(config.width as f32 / config.height as f32);

    let mut shadow_camera = Camera {
        direction_source: DirectionSource::External,
        projection: Projection::Orthographic {
            left: -25.0,
            right: 25.0,
            bottom: -25.0,
            top: 25.0,
            near: 0.01,
            far: 100.0,
        },
        ..Camera::default()
    };

    let mut ground = Mesh::new(plane()).unwrap();
    ground.transform.scale = Vec3::splat(50.0);
    ground.add_texture(TextureResource::from_file(
        &renderer,
        args.assets.join("wall.jpg"),
        TextureKind::Diffuse,
    ));
    ground.add_texture(Arc::clone(shadow.map()));

    let model_path = args.model.unwrap_or_else(|| args.assets.join("snowman.glb"));
    let mut character = rime_gltf::load_model_or_empty(&renderer, &model_path);
    character.add_texture(shadow.map());
    let mut proxy = rime_gltf::load_model_or_empty(&renderer, &model_path);
    proxy.add_texture(shadow.map());

    let mut light_cube = Mesh::new(rime_types::cube()).unwrap();
    light_cube.transform.scale = Vec3::splat(0.2);
    light_cube.add_texture(TextureResource::blank(&renderer, TextureKind::Diffuse));

    let ice_tint = TextureResource::from_rgba(&renderer, 1, 1, &[180, 220, 255, 120], TextureKind::Diffuse, "ice tint");
    let mut panes = vec![
        ice_pane(&ice_tint, Vec3::new(-1.5, 1.0, -2.0)),
        ice_pane(&ice_tint, Vec3::new(1.0, 1.0, -5.0)),
    ];
    for pane in &mut panes {
        pane.add_texture(Arc::clone(shadow.map()));
    }

    let mut controls = ControlState::new();
    let mut keys = KeyTable::default();
    let mut last_frame = Instant::now();

    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => elwt.exit(),
                WindowEvent::Resized(size) => {
                    config.width = size.width.max(1);
                    config.height = size.height.max(1);
                    surface.configure(&renderer.device, &config);
                    forward.resize(&renderer, config.width, config.height);
                    camera.set_aspect_ratio(config.width as f32 / config.height as f32);
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    let PhysicalKey::Code(code) = event.physical_key else {
                        return;
                    };
                    keys.set(code, event.state.is_pressed());

                    if event.state.is_pressed() && !event.repeat {
                        match code {
                            KeyCode::Escape => elwt.exit(),
                            KeyCode::Tab => {
                                controls.controller = match controls.controller {
                                    Controller::FreeCamera => Controller::ThirdPerson,
                                    Controller::ThirdPerson => Controller::FreeCamera,
                                    Controller::FirstPerson => Controller::FirstPerson,
                                };
                            }
                            _ => {}
                        }
                    }
                }
                WindowEvent::MouseInput { state, button, .. } if state.is_pressed() => match button {
                    MouseButton::Right => {
                        controls.toggle_first_person(&mut camera, &mut character.transform, &mut proxy.transform)
                    }
                    MouseButton::Middle => controls.orbit = !controls.orbit,
                    _ => {}
                },
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let dt = (now - last_frame).as_secs_f32();
                    last_frame = now;

                    // Movement and light input from the key table.
                    for (key, command) in [
                        (KeyCode::KeyW, MoveCommand::Ahead),
                        (KeyCode::KeyS, MoveCommand::Back),
                        (KeyCode::KeyA, MoveCommand::Left),
                        (KeyCode::KeyD, MoveCommand::Right),
                    ] {
                        if keys.pressed(key) {
                            controls.apply_move(
                                command,
                                MOVE_SPEED,
                                dt,
                                &mut camera,
                                &mut character.transform,
                                &mut proxy.transform,
                            );
                        }
                    }
                    if keys.pressed(KeyCode::KeyR) {
                        camera.position.y += MOVE_SPEED * dt;
                    }
                    if keys.pressed(KeyCode::KeyF) {
                        camera.position.y -= MOVE_SPEED * dt;
                    }
                    let light_step = LIGHT_SPEED * dt;
                    if keys.pressed(KeyCode::KeyI) {
                        light.position.z -= light_step;
                    }
                    if keys.pressed(KeyCode::KeyK) {
                        light.position.z += light_step;
                    }
                    if keys.pressed(KeyCode::KeyJ) {
                        light.position.x -= light_step;
                    }
                    if keys.pressed(KeyCode::KeyL) {
                        light.position.x += light_step;
                    }
                    if keys.pressed(KeyCode::KeyU) {
                        light.position.y += light_step;
                    }
                    if keys.pressed(KeyCode::KeyH) {
                        light.position.y -= light_step;
                    }

                    controls.orbit_step(&mut camera, dt);

                    let first_person = controls.controller == Controller::FirstPerson;
                    light_cube.transform.translate = light.position;

                    // The shadow projector sits at the light, aimed at
                    // the scene origin.
                    shadow_camera.position = light.position;
                    shadow_camera.direction = (-light.position).normalize_or_zero();
                    shadow.ready(&renderer, &mut shadow_camera, &light);

                    let frame = match surface.get_current_texture() {
                        Ok(frame) => frame,
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            surface.configure(&renderer.device, &config);
                            return;
                        }
                        Err(wgpu::SurfaceError::Timeout) => return,
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            log::error!("Surface out of memory");
                            elwt.exit();
                            return;
                        }
                    };
                    let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
                    let mut encoder = renderer
                        .device
                        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                            label: Some("frame encoder"),
                        });

                    // Shadow pass: all casters, opaque and translucent,
                    // from the light's camera.
                    {
                        let active = if first_person { &mut proxy } else { &mut character };
                        active.prepare_draw(&renderer, shadow.shader());
                        ground.prepare_draw(&renderer, shadow.shader(), None);
                        for pane in &mut panes {
                            pane.prepare_draw(&renderer, shadow.shader(), None);
                        }
                    }
                    {
                        let mut rpass = shadow.begin(&mut encoder);
                        if first_person {
                            proxy.encode(&mut rpass);
                        } else {
                            character.encode(&mut rpass);
                        }
                        ground.encode(&mut rpass);
                        for pane in &panes {
                            pane.encode(&mut rpass);
                        }
                    }

                    // Color pass: skybox, opaque, then translucent back
                    // to front.
                    forward.ready(&renderer, &mut camera, &light, &shadow);
                    skybox.ready(&renderer);
                    {
                        let active = if first_person { &mut proxy } else { &mut character };
                        active.prepare_draw(&renderer, &lit);
                        ground.prepare_draw(&renderer, &lit, None);
                        light_cube.prepare_draw(&renderer, &emissive, None);
                        sort_by_distance(&mut panes, camera.position, Mesh::location, Sorting::BackToFront);
                        for pane in &mut panes {
                            pane.prepare_draw(&renderer, &translucent, None);
                        }
                    }
                    {
                        let mut rpass = forward.begin(&mut encoder, &view);
                        skybox.encode(&mut rpass);
                        ground.encode(&mut rpass);
                        if first_person {
                            proxy.encode(&mut rpass);
                        } else {
                            character.encode(&mut rpass);
                        }
                        light_cube.encode(&mut rpass);
                        for pane in &panes {
                            pane.encode(&mut rpass);
                        }
                    }

                    renderer.queue.submit(Some(encoder.finish()));
                    frame.present();
                }
                _ => {}
            },
            Event::DeviceEvent {
                event: DeviceEvent::MouseMotion { delta },
                ..
            } => {
                controls.mouse_look(
                    delta.0 as f32,
                    -delta.1 as f32,
                    &mut camera,
                    &mut character.transform,
                    &mut proxy.transform,
                );
            }
            Event::AboutToWait => window.request_redraw(),
            _ => {}
        })
        .expect("event loop error");
}

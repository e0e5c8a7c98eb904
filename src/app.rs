//! Window, event loop and frame driver.
//!
//! [`CasaApp`] owns the house model and the viewport it lives in. winit
//! events are routed in a fixed order: imgui first, then pointer presses that
//! may start a curtain drag, then the orbit camera. Each redraw ticks the
//! animator, feeds finished events to the control bar and renders.

use std::sync::Arc;
use std::time::Instant;

use cgmath::Vector3;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::config::ViewerConfig;
use crate::error::ViewerError;
use crate::gfx::{
    camera::{CameraController, OrbitCamera},
    render_engine::RenderEngine,
    scene::{NodeId, SceneGraph},
};
use crate::house::{HouseModel, PointerButton, PointerEvent, Role, ToggleOutcome};
use crate::ui::{control_bar, ControlBarState, UiManager};
use crate::viewport::{SceneViewport, Viewport};

const INITIAL_WIDTH: u32 = 1200;
const INITIAL_HEIGHT: u32 = 800;
/// The mouse is the only pointer winit reports here.
const MOUSE_POINTER_ID: u64 = 0;

pub struct CasaApp {
    event_loop: EventLoop<()>,
    app_state: AppState,
}

struct AppState {
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    startup_error: Option<ViewerError>,

    viewport: SceneViewport,
    model: HouseModel,
    camera_controller: CameraController,
    bar_state: ControlBarState,
    pending_toggles: Vec<Role>,

    cursor: (f32, f32),
    shift_held: bool,
    pressed_button: Option<PointerButton>,
    clock: Instant,
}

impl CasaApp {
    /// Binds the house controls for the model under `model_root` and frames
    /// the camera on it. The window is created once the event loop starts.
    pub fn new(
        scene: SceneGraph,
        model_root: NodeId,
        config: ViewerConfig,
    ) -> Result<Self, ViewerError> {
        let event_loop = EventLoop::new()?;

        let mut camera = OrbitCamera::new(8.0, 0.4, 0.2, Vector3::new(0.0, 0.0, 0.0), 1.0);
        camera.bounds.min_distance = Some(0.5);
        let mut viewport = SceneViewport::new(scene, camera, INITIAL_WIDTH, INITIAL_HEIGHT);

        let model = HouseModel::bind(&mut viewport, model_root, config);
        if let Some(bounds) = viewport.bounding_box_world(model_root) {
            viewport.camera.frame(&bounds);
        }

        Ok(Self {
            event_loop,
            app_state: AppState {
                window: None,
                render_engine: None,
                ui_manager: None,
                startup_error: None,
                viewport,
                model,
                camera_controller: CameraController::new(0.005, 0.5),
                bar_state: ControlBarState::default(),
                pending_toggles: Vec::new(),
                cursor: (0.0, 0.0),
                shift_held: false,
                pressed_button: None,
                clock: Instant::now(),
            },
        })
    }

    pub fn model(&self) -> &HouseModel {
        &self.app_state.model
    }

    /// Runs until the window closes or Esc is pressed.
    pub fn run(mut self) -> Result<(), ViewerError> {
        self.event_loop.set_control_flow(ControlFlow::Poll);
        self.event_loop.run_app(&mut self.app_state)?;

        match self.app_state.startup_error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn pointer_event(&self, button: PointerButton) -> PointerEvent {
        PointerEvent {
            pointer_id: MOUSE_POINTER_ID,
            screen: self.cursor,
            button,
            shift: self.shift_held,
        }
    }

    fn on_mouse_input(&mut self, state: ElementState, button: MouseButton) {
        let button = match button {
            MouseButton::Left => PointerButton::Primary,
            MouseButton::Right => PointerButton::Secondary,
            _ => return,
        };

        match state {
            ElementState::Pressed => {
                self.pressed_button = Some(button);
                let event = self.pointer_event(button);
                if self.model.pointer_down(&self.viewport, event) {
                    self.camera_controller.set_enabled(false);
                }
            }
            ElementState::Released => {
                self.pressed_button = None;
                if self.model.pointer_up(&self.viewport, MOUSE_POINTER_ID) {
                    self.camera_controller.set_enabled(true);
                }
            }
        }
    }

    fn on_cursor_moved(&mut self, position: (f32, f32)) {
        self.cursor = position;
        let Some(button) = self.pressed_button else {
            return;
        };
        if self.model.is_dragging() {
            let event = self.pointer_event(button);
            self.model.pointer_move(&mut self.viewport, event);
        }
    }

    /// A release that happens outside the window never reaches us, so losing
    /// focus ends any drag and hands the mouse back to the camera.
    fn on_focus_lost(&mut self) {
        self.pressed_button = None;
        if self.model.cancel_drag(&self.viewport) {
            self.camera_controller.set_enabled(true);
        }
    }

    fn on_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        if event.physical_key == PhysicalKey::Code(KeyCode::Escape)
            && event.state == ElementState::Pressed
        {
            event_loop.exit();
            return;
        }
        self.camera_controller
            .process_keyed_events(event, &mut self.viewport.camera);
    }

    fn apply_pending_toggles(&mut self) {
        for role in std::mem::take(&mut self.pending_toggles) {
            match self.model.toggle(&mut self.viewport, role) {
                ToggleOutcome::Started(direction) => log::debug!("{role}: {direction:?}"),
                ToggleOutcome::InFlight => log::debug!("{role} is still moving"),
                ToggleOutcome::Rejected(reason) => log::info!("{role} toggle rejected: {reason}"),
                ToggleOutcome::Unavailable => {}
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now_ms = self.clock.elapsed().as_secs_f64() * 1000.0;
        self.model.tick(&mut self.viewport, now_ms);
        self.bar_state.apply_all(self.model.drain_events());

        self.viewport.camera.update_view_proj();

        let (Some(window), Some(render_engine), Some(ui_manager)) = (
            self.window.as_ref(),
            self.render_engine.as_mut(),
            self.ui_manager.as_mut(),
        ) else {
            return;
        };
        render_engine.update(self.viewport.camera.uniform);

        let controls = self.model.controls();
        let bar_state = &self.bar_state;
        let pending = &mut self.pending_toggles;
        let result = render_engine.render_frame_with_ui(
            &self.viewport.scene,
            |device, queue, encoder, color_attachment| {
                ui_manager.draw(device, queue, encoder, window, color_attachment, |ui| {
                    pending.extend(control_bar(ui, &controls, bar_state));
                });
            },
        );

        match result {
            Ok(()) => {}
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory, exiting");
                event_loop.exit();
            }
            Err(e) => log::warn!("Skipped frame: {e}"),
        }

        self.apply_pending_toggles();
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(
            WindowAttributes::default()
                .with_title("casaview")
                .with_inner_size(winit::dpi::LogicalSize::new(INITIAL_WIDTH, INITIAL_HEIGHT)),
        ) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let (width, height) = window.inner_size().into();
        let renderer = match pollster::block_on(RenderEngine::new(window.clone(), width, height)) {
            Ok(renderer) => renderer,
            Err(e) => {
                log::error!("Failed to start renderer: {e}");
                self.startup_error = Some(e);
                event_loop.exit();
                return;
            }
        };

        let mut ui_manager = UiManager::new(
            renderer.device(),
            renderer.queue(),
            renderer.surface_format(),
            &window,
        );
        ui_manager.update_display_size(width, height);
        self.viewport.resize(width, height);

        self.ui_manager = Some(ui_manager);
        self.render_engine = Some(renderer);
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };

        // A drag in progress keeps the mouse even when it passes over the bar.
        if !self.model.is_dragging() {
            if let Some(ui_manager) = self.ui_manager.as_mut() {
                let ui_event: winit::event::Event<()> = winit::event::Event::WindowEvent {
                    window_id,
                    event: event.clone(),
                };
                if ui_manager.handle_input(&window, &ui_event) {
                    window.request_redraw();
                    return;
                }
            }
        }

        match event {
            WindowEvent::ModifiersChanged(modifiers) => {
                self.shift_held = modifiers.state().shift_key();
            }
            WindowEvent::KeyboardInput { event, .. } => self.on_key(event_loop, &event),
            WindowEvent::MouseInput { state, button, .. } => self.on_mouse_input(state, button),
            WindowEvent::CursorMoved { position, .. } => {
                self.on_cursor_moved((position.x as f32, position.y as f32));
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.viewport.resize(width, height);
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
                if let Some(ui_manager) = self.ui_manager.as_mut() {
                    ui_manager.update_display_size(width, height);
                }
            }
            WindowEvent::Focused(false) => self.on_focus_lost(),
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => (),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let Some(window) = self.window.as_ref() else {
            return;
        };

        let ui_wants_input = self
            .ui_manager
            .as_ref()
            .is_some_and(UiManager::wants_input);
        if ui_wants_input && !self.model.is_dragging() {
            return;
        }

        self.camera_controller
            .process_events(&event, window, &mut self.viewport.camera);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }
}

//! Control bar for the house model
//!
//! One button per configured control, an indicator of its current state, and
//! a small readout of the curtain being dragged. The bar never touches the
//! model directly: clicks come back as a list of roles to toggle and the app
//! forwards them to [`HouseModel::toggle`](crate::house::HouseModel::toggle).

use cgmath::Vector3;

use crate::house::{ControlView, Role, ViewerEvent};

/// What the bar remembers between frames, fed from [`ViewerEvent`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlBarState {
    /// Most recent drag position and whether the drag is still going.
    pub drag: Option<DragReadout>,
    /// Last toggle that finished, for the status line.
    pub last_toggle: Option<(Role, bool)>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragReadout {
    pub role: Role,
    pub position: Vector3<f32>,
    pub active: bool,
}

impl ControlBarState {
    pub fn apply(&mut self, event: &ViewerEvent) {
        match *event {
            ViewerEvent::ToggleComplete { role, is_open } => {
                self.last_toggle = Some((role, is_open));
            }
            ViewerEvent::DragUpdate { role, position } => {
                self.drag = Some(DragReadout {
                    role,
                    position,
                    active: true,
                });
            }
            ViewerEvent::DragEnd { role, position } => {
                self.drag = Some(DragReadout {
                    role,
                    position,
                    active: false,
                });
            }
        }
    }

    pub fn apply_all(&mut self, events: impl IntoIterator<Item = ViewerEvent>) {
        for event in events {
            self.apply(&event);
        }
    }

    fn status_line(&self) -> Option<String> {
        self.last_toggle.map(|(role, is_open)| {
            let state = if is_open { "open" } else { "closed" };
            format!("{role} is now {state}")
        })
    }
}

fn state_text(view: &ControlView) -> &'static str {
    if !view.available {
        "n/a"
    } else if view.transitioning {
        "moving"
    } else if view.role.is_light() {
        if view.is_open { "on" } else { "off" }
    } else if view.is_open {
        "open"
    } else {
        "closed"
    }
}

/// Draws the bar along the bottom of the window and returns the roles whose
/// buttons were clicked this frame.
pub fn control_bar(ui: &imgui::Ui, controls: &[ControlView], state: &ControlBarState) -> Vec<Role> {
    let display_size = ui.io().display_size;
    if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
        return Vec::new();
    }

    let bar_height = 150.0_f32.min(display_size[1]);
    let mut clicked = Vec::new();

    ui.window("Controls")
        .position([0.0, display_size[1] - bar_height], imgui::Condition::Always)
        .size([display_size[0], bar_height], imgui::Condition::Always)
        .resizable(false)
        .movable(false)
        .collapsible(false)
        .title_bar(false)
        .build(|| {
            let mut first = true;
            for view in controls {
                if !first {
                    ui.same_line();
                }
                first = false;

                let _disabled = ui.begin_disabled(!view.available);
                ui.group(|| {
                    let label = format!("[{}] {}##{}", view.icon, view.label, view.role);
                    if ui.button(&label) {
                        clicked.push(view.role);
                    }
                    ui.text_disabled(state_text(view));
                });
            }

            ui.separator();
            if let Some(status) = state.status_line() {
                ui.text(status);
            }
            if let Some(drag) = state.drag {
                let verb = if drag.active { "Dragging" } else { "Dropped" };
                ui.text(format!(
                    "{verb} {} at ({:.3}, {:.3}, {:.3})",
                    drag.role, drag.position.x, drag.position.y, drag.position.z
                ));
            } else {
                ui.text_disabled("Shift+drag a curtain to move it");
            }
        });

    clicked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(role: Role, available: bool, is_open: bool, transitioning: bool) -> ControlView {
        ControlView {
            role,
            label: role.to_string(),
            icon: String::new(),
            available,
            is_open,
            transitioning,
        }
    }

    #[test]
    fn test_drag_events_update_readout() {
        let mut state = ControlBarState::default();
        state.apply_all([
            ViewerEvent::DragUpdate {
                role: Role::FrontCurtain,
                position: Vector3::new(1.0, 2.0, 3.0),
            },
            ViewerEvent::DragEnd {
                role: Role::FrontCurtain,
                position: Vector3::new(1.5, 2.0, 3.0),
            },
        ]);

        let drag = state.drag.unwrap();
        assert_eq!(drag.role, Role::FrontCurtain);
        assert_eq!(drag.position, Vector3::new(1.5, 2.0, 3.0));
        assert!(!drag.active);
        assert_eq!(state.last_toggle, None);
    }

    #[test]
    fn test_toggle_event_sets_status() {
        let mut state = ControlBarState::default();
        state.apply(&ViewerEvent::ToggleComplete {
            role: Role::FrontGate,
            is_open: true,
        });
        assert_eq!(state.last_toggle, Some((Role::FrontGate, true)));
        assert!(state.status_line().unwrap().ends_with("is now open"));
    }

    #[test]
    fn test_state_text() {
        assert_eq!(state_text(&view(Role::MainDoor, false, false, false)), "n/a");
        assert_eq!(state_text(&view(Role::MainDoor, true, false, true)), "moving");
        assert_eq!(state_text(&view(Role::MainDoor, true, true, false)), "open");
        assert_eq!(state_text(&view(Role::Light(0), true, true, false)), "on");
        assert_eq!(state_text(&view(Role::Light(0), true, false, false)), "off");
    }
}

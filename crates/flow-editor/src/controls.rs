//! Canvas controls and their keyboard bindings.
//!
//! `ControlMap` resolves key + modifier combos to `ControlAction`s, and
//! `Controls` applies an action to a store. Hosts wire both the on-screen
//! buttons and the keyboard through the same action set.

use crate::config::FitViewOptions;
use crate::store::FlowStore;

/// Actions the control panel and keyboard can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    ZoomIn,
    ZoomOut,
    FitView,
    /// Flip dragging, connecting and selecting together.
    ToggleInteractive,
    /// Delete selected nodes (with their edges) and selected edges.
    DeleteSelection,
    ClearSelection,
}

/// Resolves key events into control actions.
///
/// On macOS `meta` is ⌘; elsewhere `ctrl` serves the same role.
pub struct ControlMap;

impl ControlMap {
    /// `key` is the `KeyboardEvent.key` value. Returns `None` when the combo
    /// has no binding.
    pub fn resolve(
        key: &str,
        ctrl: bool,
        shift: bool,
        _alt: bool,
        meta: bool,
    ) -> Option<ControlAction> {
        let cmd = ctrl || meta;

        if cmd && shift {
            return match key {
                "l" | "L" => Some(ControlAction::ToggleInteractive),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "=" | "+" => Some(ControlAction::ZoomIn),
                "-" => Some(ControlAction::ZoomOut),
                "0" => Some(ControlAction::FitView),
                _ => None,
            };
        }

        match key {
            "Delete" | "Backspace" => Some(ControlAction::DeleteSelection),
            "Escape" => Some(ControlAction::ClearSelection),
            _ => None,
        }
    }
}

/// The control panel: which buttons are shown and how fit-view frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Controls {
    pub show_zoom: bool,
    pub show_fit_view: bool,
    pub show_interactive: bool,
    pub fit_view_options: FitViewOptions,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            show_zoom: true,
            show_fit_view: true,
            show_interactive: true,
            fit_view_options: FitViewOptions::default(),
        }
    }
}

impl Controls {
    /// The actions the visible buttons offer, in panel order.
    pub fn buttons(&self) -> Vec<ControlAction> {
        let mut buttons = Vec::with_capacity(4);
        if self.show_zoom {
            buttons.extend([ControlAction::ZoomIn, ControlAction::ZoomOut]);
        }
        if self.show_fit_view {
            buttons.push(ControlAction::FitView);
        }
        if self.show_interactive {
            buttons.push(ControlAction::ToggleInteractive);
        }
        buttons
    }

    pub fn trigger(&self, action: ControlAction, store: &mut FlowStore) {
        log::debug!("control {action:?}");
        match action {
            ControlAction::ZoomIn => store.zoom_in(),
            ControlAction::ZoomOut => store.zoom_out(),
            ControlAction::FitView => {
                store.fit_view(&self.fit_view_options);
            }
            ControlAction::ToggleInteractive => {
                let interactive = store.is_interactive();
                store.set_interactive(!interactive);
            }
            ControlAction::DeleteSelection => {
                let nodes = store.selected_nodes().to_vec();
                let edges = store.selected_edges().to_vec();
                store.delete_elements(&nodes, &edges);
            }
            ControlAction::ClearSelection => store.clear_selection(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FlowConfig;
    use flow_core::{Edge, EdgeId, Node, NodeId, Point};

    #[test]
    fn resolve_zoom() {
        assert_eq!(
            ControlMap::resolve("=", false, false, false, true),
            Some(ControlAction::ZoomIn)
        );
        assert_eq!(
            ControlMap::resolve("+", true, false, false, false),
            Some(ControlAction::ZoomIn)
        );
        assert_eq!(
            ControlMap::resolve("-", false, false, false, true),
            Some(ControlAction::ZoomOut)
        );
        assert_eq!(
            ControlMap::resolve("0", true, false, false, false),
            Some(ControlAction::FitView)
        );
    }

    #[test]
    fn resolve_selection_keys() {
        assert_eq!(
            ControlMap::resolve("Backspace", false, false, false, false),
            Some(ControlAction::DeleteSelection)
        );
        assert_eq!(
            ControlMap::resolve("Escape", false, false, false, false),
            Some(ControlAction::ClearSelection)
        );
        assert_eq!(
            ControlMap::resolve("L", false, true, false, true),
            Some(ControlAction::ToggleInteractive)
        );
    }

    #[test]
    fn resolve_unknown_key() {
        assert_eq!(ControlMap::resolve("q", false, false, false, false), None);
        // zoom keys need the command modifier
        assert_eq!(ControlMap::resolve("=", false, false, false, false), None);
    }

    #[test]
    fn hidden_buttons_are_not_offered() {
        let controls = Controls {
            show_zoom: false,
            ..Controls::default()
        };
        assert_eq!(
            controls.buttons(),
            vec![ControlAction::FitView, ControlAction::ToggleInteractive]
        );
    }

    #[test]
    fn toggle_interactive_flips_all_flags() {
        let mut store = FlowStore::new(Vec::new(), Vec::new(), FlowConfig::default());
        let controls = Controls::default();
        controls.trigger(ControlAction::ToggleInteractive, &mut store);
        assert!(!store.config().nodes_draggable);
        assert!(!store.config().nodes_connectable);
        assert!(!store.config().elements_selectable);
        controls.trigger(ControlAction::ToggleInteractive, &mut store);
        assert!(store.is_interactive());
    }

    #[test]
    fn delete_selection_cascades() {
        let (a, b) = (NodeId::intern("a"), NodeId::intern("b"));
        let mut store = FlowStore::new(
            vec![Node::new(a, Point::ZERO), Node::new(b, Point::new(200.0, 0.0))],
            vec![Edge::new(EdgeId::intern("ab"), a, b)],
            FlowConfig::default(),
        );
        store.select_node(a, false);
        Controls::default().trigger(ControlAction::DeleteSelection, &mut store);
        assert_eq!(store.nodes().len(), 1);
        assert!(store.edges().is_empty());
        assert!(store.selected_nodes().is_empty());
    }
}

//! Gesture abstraction layer.
//!
//! Normalizes touch, mouse and trackpad gestures into a unified
//! `GestureEvent` consumed by the interaction coordinators. Positions are in
//! container pixels; translations are cumulative since the gesture began.

use flow_core::{HandleElement, NodeId, Point, Vec2};
use serde::{Deserialize, Serialize};

/// A normalized gesture event from any pointing device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum GestureEvent {
    /// A drag started at `(x, y)`.
    PanBegin { x: f64, y: f64 },

    /// The drag moved. `translation_*` is the total offset from the start.
    PanUpdate {
        translation_x: f64,
        translation_y: f64,
        x: f64,
        y: f64,
    },

    /// The drag ended. Also delivered when another gesture won arbitration.
    PanEnd,

    PinchBegin,

    /// `scale` is the total factor since the pinch began.
    PinchUpdate { scale: f64 },

    PinchEnd,

    /// Press and release without movement.
    Tap { x: f64, y: f64 },
}

impl GestureEvent {
    /// Pointer position, for events that carry one.
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::PanBegin { x, y } | Self::PanUpdate { x, y, .. } | Self::Tap { x, y } => {
                Some(Point::new(*x, *y))
            }
            _ => None,
        }
    }

    pub fn translation(&self) -> Option<Vec2> {
        match self {
            Self::PanUpdate {
                translation_x,
                translation_y,
                ..
            } => Some(Vec2::new(*translation_x, *translation_y)),
            _ => None,
        }
    }

    /// All numeric payloads are finite.
    pub fn is_finite(&self) -> bool {
        match self {
            Self::PanBegin { x, y } | Self::Tap { x, y } => x.is_finite() && y.is_finite(),
            Self::PanUpdate {
                translation_x,
                translation_y,
                x,
                y,
            } => [translation_x, translation_y, x, y]
                .iter()
                .all(|v| v.is_finite()),
            Self::PinchUpdate { scale } => scale.is_finite(),
            Self::PanEnd | Self::PinchBegin | Self::PinchEnd => true,
        }
    }
}

/// A port resolved by the host's hit testing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleHit {
    pub node_id: NodeId,
    pub handle: HandleElement,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_host_events() {
        let event: GestureEvent = serde_json::from_str(
            r#"{"kind":"panUpdate","translationX":12,"translationY":-3,"x":100,"y":40}"#,
        )
        .unwrap();
        assert_eq!(event.translation(), Some(Vec2::new(12.0, -3.0)));
        assert_eq!(event.position(), Some(Point::new(100.0, 40.0)));

        let event: GestureEvent = serde_json::from_str(r#"{"kind":"pinchEnd"}"#).unwrap();
        assert_eq!(event, GestureEvent::PinchEnd);
    }

    #[test]
    fn non_finite_payload_detected() {
        assert!(!GestureEvent::PinchUpdate { scale: f64::NAN }.is_finite());
        assert!(
            !GestureEvent::PanUpdate {
                translation_x: f64::INFINITY,
                translation_y: 0.0,
                x: 0.0,
                y: 0.0
            }
            .is_finite()
        );
        assert!(GestureEvent::PanEnd.is_finite());
    }
}

//! Payload records carried inside protocol messages.
//!
//! Measurements are produced by the page-side measurement collaborator;
//! this crate only transports them. All field names are camelCase on the
//! wire.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::identifiers::StagedId;

// ============================================================================
// Geometry
// ============================================================================

/// Viewport-relative rectangle in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Rect {
    /// Creates a rectangle.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns `true` if the point lies inside the rectangle.
    #[inline]
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }
}

/// Four-sided edge sizes (margin, border, padding).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Edges {
    /// Top edge.
    pub top: f64,
    /// Right edge.
    pub right: f64,
    /// Bottom edge.
    pub bottom: f64,
    /// Left edge.
    pub left: f64,
}

/// Box model around a content rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxModel {
    /// Margin sizes.
    pub margin: Edges,
    /// Border widths.
    pub border: Edges,
    /// Padding sizes.
    pub padding: Edges,
}

// ============================================================================
// Component Metadata
// ============================================================================

/// Source location of a component definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Source file path as reported by the framework.
    pub file: String,
    /// 1-based line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// 1-based column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

/// Framework component that rendered an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentInfo {
    /// Component display name.
    pub name: String,
    /// Definition site, when the framework exposes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceLocation>,
}

impl ComponentInfo {
    /// Creates component info without a source location.
    #[inline]
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: None,
        }
    }
}

// ============================================================================
// Measurement
// ============================================================================

/// Measured state of one element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    /// Reproducible selector of the measured element.
    pub selector: String,
    /// Lowercase tag name.
    pub tag: String,
    /// `id` attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    /// Class list in document order.
    #[serde(default)]
    pub classes: Vec<String>,
    /// Border-box rectangle.
    pub rect: Rect,
    /// Box model.
    #[serde(default)]
    pub box_model: BoxModel,
    /// Selected computed styles.
    #[serde(default)]
    pub styles: BTreeMap<String, String>,
    /// Rendering component, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<ComponentInfo>,
}

// ============================================================================
// Staged Elements
// ============================================================================

/// Wire projection of a staged selection.
///
/// Never carries the live element handle; display numbering is derived by
/// the receiver from snapshot order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedElementWire {
    /// Staged selection id.
    pub id: StagedId,
    /// Reproducible selector.
    pub selector: String,
    /// Short human label.
    pub summary: String,
    /// Measurement captured when staged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement: Option<Measurement>,
    /// Rendering component, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<ComponentInfo>,
}

/// Payload of `element-unstaged`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnstagedPayload {
    /// Id of the removed entry.
    pub id: StagedId,
}

/// Payload of the client `error` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Human-readable error text.
    pub message: String,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains() {
        let rect = Rect::new(10.0, 10.0, 100.0, 50.0);
        assert!(rect.contains(10.0, 10.0));
        assert!(rect.contains(109.0, 59.0));
        assert!(!rect.contains(110.0, 20.0));
        assert!(!rect.contains(5.0, 20.0));
    }

    #[test]
    fn test_measurement_camel_case() {
        let measurement = Measurement {
            selector: "#app".into(),
            tag: "div".into(),
            element_id: Some("app".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&measurement).expect("serialize");
        assert_eq!(json["elementId"], "app");
        assert!(json.get("boxModel").is_some());
        assert!(json.get("component").is_none());
    }

    #[test]
    fn test_measurement_tolerates_missing_optionals() {
        let json = r#"{"selector":"main","tag":"main","rect":{"x":0,"y":0,"width":1,"height":1}}"#;
        let measurement: Measurement = serde_json::from_str(json).expect("parse");
        assert!(measurement.classes.is_empty());
        assert!(measurement.styles.is_empty());
        assert_eq!(measurement.box_model, BoxModel::default());
    }
}

//! Layout bridge - element bounds from a Taffy tree.
//!
//! Taffy reports each node's location relative to its parent. The boundary
//! watcher needs absolute rectangles, so the bridge walks up the parent chain
//! and sums the offsets.
//!
//! # Example
//!
//! ```ignore
//! tree.compute_layout(root, Size::MAX_CONTENT)?;
//! sync_element(&tree, node, &element)?;
//! spark_bound::notify();
//! ```

use taffy::{NodeId, TaffyTree};

use crate::element::Element;
use crate::error::BoundError;
use crate::types::BoundRect;

/// Absolute bounds of `node`, in the coordinate space of its root.
pub fn absolute_bounds<T>(tree: &TaffyTree<T>, node: NodeId) -> Result<BoundRect, BoundError> {
    let layout = tree
        .layout(node)
        .map_err(|e| BoundError::Layout(e.to_string()))?;

    let mut x = layout.location.x;
    let mut y = layout.location.y;

    let mut current = tree.parent(node);
    while let Some(parent) = current {
        let parent_layout = tree
            .layout(parent)
            .map_err(|e| BoundError::Layout(e.to_string()))?;
        x += parent_layout.location.x;
        y += parent_layout.location.y;
        current = tree.parent(parent);
    }

    Ok(BoundRect::new(x, y, layout.size.width, layout.size.height))
}

/// Copy the absolute bounds of `node` into `element`.
pub fn sync_element<T>(tree: &TaffyTree<T>, node: NodeId, element: &Element) -> Result<(), BoundError> {
    let bounds = absolute_bounds(tree, node)?;
    element.set_bounds(bounds);
    Ok(())
}

/// Shift an element's bounds by a scroll offset (content moves opposite to
/// the scroll direction).
pub fn apply_scroll(element: &Element, layout_bounds: BoundRect, scroll_x: f32, scroll_y: f32) {
    element.set_bounds(BoundRect::new(
        layout_bounds.x - scroll_x,
        layout_bounds.y - scroll_y,
        layout_bounds.width,
        layout_bounds.height,
    ));
}

// =============================================================================
// Tests
// =============================================================================

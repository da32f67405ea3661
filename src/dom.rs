//! DOM helpers
//!
//! Element builders, geometry, and [`ElementHost`], which lets the keyed
//! list reconciler move children of a real element.

use tierforge_core::layout::{Point, Rect};
use tierforge_core::reconcile::ChildHost;
use wasm_bindgen::JsCast;

pub fn document() -> Option<web_sys::Document> {
    web_sys::window()?.document()
}

/// `<tag class="class">`
pub fn element(tag: &str, class: &str) -> Option<web_sys::Element> {
    let el = document()?.create_element(tag).ok()?;
    if !class.is_empty() {
        el.set_class_name(class);
    }
    Some(el)
}

pub fn rect(el: &web_sys::Element) -> Rect {
    let r = el.get_bounding_client_rect();
    Rect::new(r.left(), r.top(), r.width(), r.height())
}

pub fn point(x: i32, y: i32) -> Point {
    Point::new(f64::from(x), f64::from(y))
}

/// Elements matching `selector` under `root`, in document order
pub fn query_all(root: &web_sys::Element, selector: &str) -> Vec<web_sys::Element> {
    let Ok(list) = root.query_selector_all(selector) else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<web_sys::Element>().ok())
        .collect()
}

pub fn element_at(point: Point) -> Option<web_sys::Element> {
    document()?.element_from_point(point.x as f32, point.y as f32)
}

/// Nearest ancestor (or self) matching `selector`
pub fn closest(el: &web_sys::Element, selector: &str) -> Option<web_sys::Element> {
    el.closest(selector).ok().flatten()
}

pub fn toggle_class(el: &web_sys::Element, class: &str, on: bool) {
    let _ = el.class_list().toggle_with_force(class, on);
}

/// Children of one container element
pub struct ElementHost {
    parent: web_sys::Element,
}

impl ElementHost {
    pub fn new(parent: web_sys::Element) -> Self {
        Self { parent }
    }
}

impl ChildHost for ElementHost {
    type Node = web_sys::Element;

    fn insert_before(&mut self, node: &web_sys::Element, anchor: Option<&web_sys::Element>) {
        let anchor: Option<&web_sys::Node> = anchor.map(|a| a.as_ref());
        if let Err(err) = self.parent.insert_before(node, anchor) {
            tracing::warn!(?err, "insertBefore failed");
        }
    }

    fn remove(&mut self, node: &web_sys::Element) {
        if node.parent_element().as_ref() == Some(&self.parent) {
            let _ = self.parent.remove_child(node);
        }
    }
}

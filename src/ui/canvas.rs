//! Template canvas: drawing, panning, zooming and fit-to-view.
//!
//! The canvas is a viewer, not an editor — drops are drawn where the
//! template's layout put them and the only interactions are navigation.

use eframe::egui;
use eframe::epaint::StrokeKind;

use super::state::PgtViewerApp;
use crate::constants;
use crate::types::DropCategory;

/// Fill and stroke colors for a drop category.
pub fn category_colors(category: DropCategory) -> (egui::Color32, egui::Color32) {
    match category {
        DropCategory::Data => (
            egui::Color32::from_rgb(0x90, 0xee, 0x90),
            egui::Color32::BLACK,
        ),
        DropCategory::Application => (
            egui::Color32::from_rgb(0xad, 0xd8, 0xe6),
            egui::Color32::BLACK,
        ),
        DropCategory::Service => (
            egui::Color32::from_rgb(0xff, 0xd7, 0x8c),
            egui::Color32::BLACK,
        ),
    }
}

impl PgtViewerApp {
    /// Converts screen coordinates to world coordinates accounting for zoom
    /// and pan.
    pub fn screen_to_world(&self, screen_pos: egui::Pos2) -> egui::Pos2 {
        (screen_pos - self.canvas.offset) / self.canvas.zoom_factor
    }

    /// Converts world coordinates to screen coordinates accounting for zoom
    /// and pan.
    pub fn world_to_screen(&self, world_pos: egui::Pos2) -> egui::Pos2 {
        world_pos * self.canvas.zoom_factor + self.canvas.offset
    }

    /// Fits the view to the template's content bounds.
    ///
    /// If the canvas has not been laid out yet the request is deferred to the
    /// next draw.
    pub fn zoom_to_fit(&mut self) {
        let Some(bounds) = self.template.as_ref().and_then(|t| t.bounds()) else {
            return;
        };
        let Some(rect) = self.canvas.rect else {
            self.canvas.pending_zoom_to_fit = true;
            return;
        };
        let ((min_x, min_y), (max_x, max_y)) = bounds;

        // Content extent includes the node rectangles around their centers.
        let content_w =
            (max_x - min_x) + constants::NODE_WIDTH + 2.0 * constants::CONTENT_MARGIN;
        let content_h =
            (max_y - min_y) + constants::NODE_HEIGHT + 2.0 * constants::CONTENT_MARGIN;

        let zoom = (rect.width() / content_w)
            .min(rect.height() / content_h)
            .clamp(0.25, 5.0);
        self.canvas.zoom_factor = zoom;

        let content_center = egui::pos2((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);
        self.canvas.offset = rect.center().to_vec2() - content_center.to_vec2() * zoom;
        self.canvas.pending_zoom_to_fit = false;
    }

    /// Handles scroll wheel zooming, keeping the world point under the
    /// cursor fixed.
    fn handle_canvas_zoom(&mut self, ui: &egui::Ui, response: &egui::Response) {
        let scroll_delta = ui.input(|i| i.smooth_scroll_delta.y);
        if scroll_delta == 0.0 {
            return;
        }
        let Some(mouse_pos) = response.hover_pos() else {
            return;
        };

        let world_pos_before_zoom = self.screen_to_world(mouse_pos);
        let zoom_delta = if scroll_delta > 0.0 { 0.1 } else { -0.1 };
        let old_zoom = self.canvas.zoom_factor;
        self.canvas.zoom_factor = (self.canvas.zoom_factor + zoom_delta).clamp(0.25, 5.0);

        if (self.canvas.zoom_factor - old_zoom).abs() > f32::EPSILON {
            // Keep the hovered world position stationary on screen.
            let world_pos_after_zoom = self.world_to_screen(world_pos_before_zoom);
            self.canvas.offset += mouse_pos - world_pos_after_zoom;
        }
    }

    /// Draws the template canvas and handles navigation input.
    pub fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let available = ui.available_size();
        let (response, painter) =
            ui.allocate_painter(available, egui::Sense::click_and_drag());
        self.canvas.rect = Some(response.rect);

        if self.canvas.pending_zoom_to_fit {
            self.zoom_to_fit();
        }

        // Drag pans, wheel zooms.
        if response.dragged() {
            self.canvas.offset += response.drag_delta();
        }
        self.handle_canvas_zoom(ui, &response);

        painter.rect_filled(
            response.rect,
            0.0,
            ui.visuals().extreme_bg_color,
        );

        if self.canvas.show_grid {
            self.draw_grid_dots(&painter, response.rect);
        }

        let Some(template) = &self.template else {
            painter.text(
                response.rect.center(),
                egui::Align2::CENTER_CENTER,
                "No template loaded",
                egui::FontId::proportional(16.0),
                ui.visuals().weak_text_color(),
            );
            return;
        };

        let zoom = self.canvas.zoom_factor;
        let node_size = egui::vec2(constants::NODE_WIDTH, constants::NODE_HEIGHT) * zoom;
        let link_stroke = egui::Stroke::new(1.5 * zoom, ui.visuals().text_color());

        // Links first so nodes draw over them.
        for link in &template.links {
            let (Some(from), Some(to)) = (
                template.drop_by_oid(&link.from),
                template.drop_by_oid(&link.to),
            ) else {
                continue;
            };
            let start = self.world_to_screen(egui::pos2(from.position.0, from.position.1));
            let end = self.world_to_screen(egui::pos2(to.position.0, to.position.1));
            painter.line_segment([start, end], link_stroke);
            draw_arrowhead(&painter, start, end, link_stroke.color, zoom);
        }

        for drop in &template.drops {
            let center = self.world_to_screen(egui::pos2(drop.position.0, drop.position.1));
            let rect = egui::Rect::from_center_size(center, node_size);
            let (fill, stroke) = category_colors(drop.category);
            let radius = constants::NODE_CORNER_RADIUS * zoom;
            painter.rect_filled(rect, radius, fill);
            painter.rect_stroke(
                rect,
                radius,
                egui::Stroke::new(1.5 * zoom, stroke),
                StrokeKind::Inside,
            );
            painter.text(
                center,
                egui::Align2::CENTER_CENTER,
                &drop.name,
                egui::FontId::proportional(12.0 * zoom),
                egui::Color32::BLACK,
            );
        }
    }

    fn draw_grid_dots(&self, painter: &egui::Painter, rect: egui::Rect) {
        let zoom = self.canvas.zoom_factor;
        let spacing = constants::DOT_SPACING * zoom;
        if spacing < 4.0 {
            return;
        }
        let color = egui::Color32::from_gray(110).linear_multiply(0.35);

        // Snap the first dot to the world grid so panning scrolls the dots.
        let world_min = self.screen_to_world(rect.min);
        let start_x = (world_min.x / constants::DOT_SPACING).floor() * constants::DOT_SPACING;
        let start_y = (world_min.y / constants::DOT_SPACING).floor() * constants::DOT_SPACING;

        let mut x = start_x;
        while self.world_to_screen(egui::pos2(x, 0.0)).x < rect.max.x {
            let mut y = start_y;
            while self.world_to_screen(egui::pos2(0.0, y)).y < rect.max.y {
                let pos = self.world_to_screen(egui::pos2(x, y));
                if rect.contains(pos) {
                    painter.circle_filled(pos, constants::DOT_RADIUS, color);
                }
                y += constants::DOT_SPACING;
            }
            x += constants::DOT_SPACING;
        }
    }
}

/// Draws a small triangle at the midpoint of a link, oriented along it.
fn draw_arrowhead(
    painter: &egui::Painter,
    start: egui::Pos2,
    end: egui::Pos2,
    color: egui::Color32,
    zoom: f32,
) {
    let delta = end - start;
    let dist = delta.length().max(1e-6);
    let dir = delta / dist;
    let perp = egui::vec2(-dir.y, dir.x);
    let len = 7.0 * zoom;
    let half_w = len * 0.6;

    let mid = start + delta * 0.5;
    let tip = mid + dir * len;
    let left = mid - dir * len + perp * half_w;
    let right = mid - dir * len - perp * half_w;
    painter.add(egui::Shape::convex_polygon(
        vec![tip, left, right],
        color,
        egui::Stroke::NONE,
    ));
}

//! UI theme constants: Journalkollen brand colours on a light background

use egui::{Color32, CornerRadius, Stroke, Vec2};

pub const BRAND: Color32 = Color32::from_rgb(0xc1, 0x20, 0x43);
pub const BG_PRIMARY: Color32 = Color32::WHITE;
pub const BG_RESPONSE: Color32 = Color32::from_rgb(0xfa, 0xee, 0xf0);
pub const BG_QUESTION: Color32 = Color32::from_rgb(0xe6, 0xf3, 0xff);
pub const BG_SURFACE: Color32 = Color32::from_rgb(0xf3, 0xf3, 0xf5);
pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(0x22, 0x22, 0x22);
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(0x6b, 0x6b, 0x72);
pub const LINK: Color32 = Color32::from_rgb(0x00, 0x66, 0xcc);
pub const ERROR: Color32 = Color32::from_rgb(0xb9, 0x1c, 0x1c);
pub const NOTICE_ERROR_BG: Color32 = Color32::from_rgb(0xfd, 0xe8, 0xe8);
pub const NOTICE_INFO_BG: Color32 = Color32::from_rgb(0xe8, 0xf5, 0xe9);

pub const BUBBLE_ROUNDING: CornerRadius = CornerRadius::same(10);
pub const PANEL_ROUNDING: CornerRadius = CornerRadius::same(6);
pub const PANEL_PADDING: Vec2 = Vec2::new(12.0, 8.0);

/// Apply the light brand theme to an egui context
pub fn apply_theme(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();

    style.visuals.dark_mode = false;
    style.visuals.panel_fill = BG_PRIMARY;
    style.visuals.window_fill = BG_PRIMARY;
    style.visuals.extreme_bg_color = BG_SURFACE;
    style.visuals.hyperlink_color = LINK;

    style.visuals.widgets.inactive.bg_fill = BG_SURFACE;
    style.visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, TEXT_PRIMARY);
    style.visuals.widgets.hovered.bg_fill = BG_RESPONSE;
    style.visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, BRAND);
    style.visuals.widgets.active.bg_fill = BRAND;
    style.visuals.widgets.active.fg_stroke = Stroke::new(1.0, Color32::WHITE);

    style.visuals.selection.bg_fill = BRAND.linear_multiply(0.3);
    style.visuals.selection.stroke = Stroke::new(1.0, BRAND);

    style.spacing.item_spacing = Vec2::new(8.0, 6.0);

    ctx.set_style(style);
}

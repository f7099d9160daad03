#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Pattern Recall.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.
//!
//! Every scene is drawn on the fixed design surface and projected into the
//! configured viewport, so pointer presses are mapped back through the same
//! projection before they reach the simulation.

mod textures;

pub use self::textures::AssetManifest;

use self::textures::ImageSet;
use anyhow::Result;
use glam::Vec2;
use macroquad::{
    input::{is_key_pressed, is_mouse_button_pressed, mouse_position, KeyCode, MouseButton},
    math::Vec2 as MacroquadVec2,
    texture::{draw_texture_ex, DrawTextureParams},
};
use pattern_recall_core::Cell;
use pattern_recall_rendering::{
    pointer_cell, CellPresentation, Color, FrameInput, GridLayout, HudPresentation, Overlay,
    OverlayTone, Palette, Presentation, Rect, RenderingBackend, Scene, Viewport, HUD_RECT,
    OVERLAY_LINE_OFFSETS, SURFACE_SIZE,
};
use std::time::Duration;

const TITLE_FONT_SIZE: f32 = 40.0;
const LABEL_FONT_SIZE: f32 = 26.0;
const CELL_OUTLINE_THICKNESS: f32 = 1.0;

/// Snapshot of edge-triggered keyboard shortcuts observed during a single frame.
#[derive(Clone, Copy, Debug, Default)]
struct KeyboardShortcuts {
    /// `Escape` to quit the game loop.
    quit_requested: bool,
    /// `Enter` submits the current picks.
    confirm: bool,
    /// `Space` starts a new session after it ended.
    restart: bool,
}

impl KeyboardShortcuts {
    fn poll() -> Self {
        Self {
            quit_requested: is_key_pressed(KeyCode::Escape),
            confirm: is_key_pressed(KeyCode::Enter) || is_key_pressed(KeyCode::KpEnter),
            restart: is_key_pressed(KeyCode::Space),
        }
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    window_size: (i32, i32),
    assets: AssetManifest,
}

impl Default for MacroquadBackend {
    fn default() -> Self {
        Self {
            swap_interval: None,
            window_size: (SURFACE_SIZE.x as i32, SURFACE_SIZE.y as i32),
            assets: AssetManifest::default(),
        }
    }
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures the initial window size in pixels.
    #[must_use]
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (
            i32::try_from(width).unwrap_or(i32::MAX),
            i32::try_from(height).unwrap_or(i32::MAX),
        );
        self
    }

    /// Configures the optional images drawn by the backend.
    #[must_use]
    pub fn with_assets(mut self, assets: AssetManifest) -> Self {
        self.assets = assets;
        self
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            window_size: (window_width, window_height),
            assets,
        } = self;

        let Presentation {
            window_title,
            palette,
            viewport,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width,
            window_height,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let images = ImageSet::load(&assets);
            let mut scene = scene;

            loop {
                let keyboard = KeyboardShortcuts::poll();
                if keyboard.quit_requested {
                    log::info!("quit requested");
                    break;
                }

                let projector = Projector::new(
                    viewport,
                    Vec2::new(
                        macroquad::window::screen_width(),
                        macroquad::window::screen_height(),
                    ),
                );
                let frame_input = gather_frame_input(&scene.layout, &projector, keyboard);
                let dt_seconds = macroquad::time::get_frame_time();
                update_scene(
                    Duration::from_secs_f32(dt_seconds.max(0.0)),
                    frame_input,
                    &mut scene,
                );

                draw_frame(&scene, &palette, &images, &projector);
                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

fn gather_frame_input(
    layout: &GridLayout,
    projector: &Projector,
    keyboard: KeyboardShortcuts,
) -> FrameInput {
    let pointer_cell = if is_mouse_button_pressed(MouseButton::Left) {
        let (x, y) = mouse_position();
        projector.pointer_cell(layout, Vec2::new(x, y))
    } else {
        None
    };

    FrameInput {
        pointer_cell,
        confirm: keyboard.confirm,
        restart: keyboard.restart,
    }
}

/// Projects design-surface coordinates into window pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Projector {
    viewport: Viewport,
    window: Vec2,
}

impl Projector {
    fn new(viewport: Viewport, window: Vec2) -> Self {
        Self { viewport, window }
    }

    fn point(&self, point: Vec2) -> Vec2 {
        self.viewport.to_screen(point, self.window)
    }

    fn rect(&self, rect: Rect) -> Rect {
        Rect {
            origin: self.point(rect.origin),
            size: rect.size * self.viewport.scale(self.window),
        }
    }

    fn font_size(&self, size: f32) -> f32 {
        (size * self.viewport.scale(self.window).y).max(1.0)
    }

    fn surface(&self) -> Rect {
        self.viewport.screen_rect(self.window)
    }

    fn pointer_cell(&self, layout: &GridLayout, pointer: Vec2) -> Option<Cell> {
        pointer_cell(&self.viewport, self.window, layout, pointer)
    }
}

fn draw_frame(scene: &Scene, palette: &Palette, images: &ImageSet, projector: &Projector) {
    macroquad::window::clear_background(to_macroquad_color(palette.letterbox));
    if let Some(backdrop) = images.backdrop {
        draw_texture_ex(
            backdrop,
            0.0,
            0.0,
            macroquad::color::WHITE,
            DrawTextureParams {
                dest_size: Some(MacroquadVec2::new(projector.window.x, projector.window.y)),
                ..DrawTextureParams::default()
            },
        );
    }

    fill_rect(projector.surface(), palette.background);
    draw_hud(&scene.hud, palette, projector);
    draw_board(scene, palette, images, projector);
    if let Some(overlay) = scene.overlay {
        draw_overlay(overlay, palette, projector);
    }
}

fn draw_hud(hud: &HudPresentation, palette: &Palette, projector: &Projector) {
    fill_rect(projector.rect(HUD_RECT), palette.panel);

    let origin = HUD_RECT.origin;
    let right = HUD_RECT.max().x;
    let lives_color = if hud.lives_positive {
        palette.positive
    } else {
        palette.negative
    };

    let counters = Vec2::new(right - 260.0, origin.y);
    let labels = [
        (&hud.level, counters + Vec2::new(0.0, 12.0), palette.accent),
        (&hud.score, counters + Vec2::new(0.0, 38.0), palette.text),
        (&hud.lives, counters + Vec2::new(140.0, 25.0), lives_color),
    ];

    let title_origin = origin + Vec2::new(12.0, 12.0);
    draw_text_from_top_left(&hud.title, title_origin, TITLE_FONT_SIZE, palette.text, projector);
    for (text, top_left, color) in labels {
        draw_text_from_top_left(text, top_left, LABEL_FONT_SIZE, color, projector);
    }
}

fn draw_board(scene: &Scene, palette: &Palette, images: &ImageSet, projector: &Projector) {
    for presentation in &scene.cells {
        let CellPresentation {
            cell,
            display,
            picked,
        } = *presentation;
        let rect = projector.rect(scene.layout.cell_rect(cell));

        fill_rect(rect, palette.cell(display));
        macroquad::shapes::draw_rectangle_lines(
            rect.origin.x,
            rect.origin.y,
            rect.size.x,
            rect.size.y,
            CELL_OUTLINE_THICKNESS,
            to_macroquad_color(palette.outline),
        );

        if !picked {
            continue;
        }
        match images.selection {
            Some(texture) => draw_texture_ex(
                texture,
                rect.origin.x,
                rect.origin.y,
                macroquad::color::WHITE,
                DrawTextureParams {
                    dest_size: Some(MacroquadVec2::new(rect.size.x, rect.size.y)),
                    ..DrawTextureParams::default()
                },
            ),
            None => fill_rect(rect, palette.pick),
        }
    }
}

fn draw_overlay(overlay: Overlay, palette: &Palette, projector: &Projector) {
    let center = SURFACE_SIZE * 0.5;
    for (index, ((text, tone), offset)) in overlay
        .lines()
        .into_iter()
        .zip(OVERLAY_LINE_OFFSETS)
        .enumerate()
    {
        let size = if index == 0 {
            TITLE_FONT_SIZE
        } else {
            LABEL_FONT_SIZE
        };
        let anchor = projector.point(center + Vec2::new(0.0, offset));
        let font_size = projector.font_size(size);
        let dimensions = macroquad::text::measure_text(&text, None, font_size as u16, 1.0);
        let _ = macroquad::text::draw_text(
            &text,
            anchor.x - dimensions.width * 0.5,
            anchor.y - dimensions.height * 0.5 + dimensions.offset_y,
            font_size,
            to_macroquad_color(tone_color(tone, palette)),
        );
    }
}

fn draw_text_from_top_left(
    text: &str,
    top_left: Vec2,
    size: f32,
    color: Color,
    projector: &Projector,
) {
    let position = projector.point(top_left);
    let font_size = projector.font_size(size);
    let dimensions = macroquad::text::measure_text(text, None, font_size as u16, 1.0);
    let _ = macroquad::text::draw_text(
        text,
        position.x,
        position.y + dimensions.offset_y,
        font_size,
        to_macroquad_color(color),
    );
}

fn fill_rect(rect: Rect, color: Color) {
    macroquad::shapes::draw_rectangle(
        rect.origin.x,
        rect.origin.y,
        rect.size.x,
        rect.size.y,
        to_macroquad_color(color),
    );
}

fn tone_color(tone: OverlayTone, palette: &Palette) -> Color {
    match tone {
        OverlayTone::Negative => palette.negative,
        OverlayTone::Positive => palette.positive,
        OverlayTone::Plain => palette.text,
        OverlayTone::Accent => palette.accent,
    }
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pattern_recall_core::GridShape;
    use pattern_recall_rendering::{BOARD_RECT, CELL_GAP};

    #[test]
    fn projector_scales_rectangles_into_viewport() {
        let viewport = Viewport::new(0.5, 0.0, 0.5, 1.0).expect("valid viewport");
        let projector = Projector::new(viewport, Vec2::new(1800.0, 700.0));

        assert_eq!(
            projector.rect(Rect::new(100.0, 50.0, 200.0, 100.0)),
            Rect::new(1000.0, 50.0, 200.0, 100.0)
        );
        assert_eq!(projector.surface(), Rect::new(900.0, 0.0, 900.0, 700.0));
        assert_eq!(projector.font_size(26.0), 26.0);
    }

    #[test]
    fn projector_maps_clicks_through_viewport() {
        let layout = GridLayout::fit(GridShape::new(2, 4), BOARD_RECT, CELL_GAP)
            .expect("board fits the grid");
        let projector = Projector::new(Viewport::default(), SURFACE_SIZE * 2.0);
        let cell = Cell::new(1, 2);
        let click = projector.point(layout.cell_rect(cell).center());

        assert_eq!(projector.pointer_cell(&layout, click), Some(cell));
        assert_eq!(projector.pointer_cell(&layout, Vec2::new(5.0, 5.0)), None);
    }

    #[test]
    fn overlay_tones_follow_palette() {
        let palette = Palette::default();

        assert_eq!(tone_color(OverlayTone::Negative, &palette), palette.negative);
        assert_eq!(tone_color(OverlayTone::Positive, &palette), palette.positive);
        assert_eq!(tone_color(OverlayTone::Accent, &palette), palette.accent);
        assert_eq!(tone_color(OverlayTone::Plain, &palette), palette.text);
    }

    #[test]
    fn backend_defaults_to_design_surface_window() {
        let backend = MacroquadBackend::new().with_window_size(1200, 900).with_vsync(false);

        assert_eq!(backend.window_size, (1200, 900));
        assert_eq!(backend.swap_interval, Some(0));
        assert_eq!(MacroquadBackend::default().window_size, (900, 700));
    }
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Pattern Recall adapters.
//!
//! Scenes are described on a fixed 900×700 design surface. Backends scale
//! that surface into a viewport of their window and use [`GridLayout`] and
//! [`Viewport`] to map pointer positions back into grid cells.

use std::time::Duration;

use anyhow::Result as AnyResult;
use glam::Vec2;
use pattern_recall_core::{
    Cell, CellDisplay, GridShape, Hud, RoundPhase, GAME_TITLE, LEVEL_COUNT,
};
use thiserror::Error;

/// Size of the design surface every scene is laid out on.
pub const SURFACE_SIZE: Vec2 = Vec2::new(900.0, 700.0);

/// Panel holding the title and the session counters.
pub const HUD_RECT: Rect = Rect::new(40.0, 30.0, 820.0, 70.0);

/// Area the grid is centred in.
pub const BOARD_RECT: Rect = Rect::new(50.0, 120.0, 800.0, 520.0);

/// Spacing between neighbouring cells.
pub const CELL_GAP: f32 = 8.0;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }
}

/// Colors used to draw every part of a scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    /// Fill of the design surface.
    pub background: Color,
    /// Fill of the HUD panel.
    pub panel: Color,
    /// Primary text color.
    pub text: Color,
    /// Highlight used for the level label and restart hints.
    pub accent: Color,
    /// Lives label while at least one life remains, and the congrats banner.
    pub positive: Color,
    /// Lives label once no life remains, and the game-over banner.
    pub negative: Color,
    /// Unlit cell.
    pub idle: Color,
    /// Cell lit by the reveal.
    pub lit: Color,
    /// Thin border drawn around every cell.
    pub outline: Color,
    /// Solid pick marker used when no selection image is available.
    pub pick: Color,
    /// Correctly picked target during feedback.
    pub correct: Color,
    /// Missed target or extra pick during feedback.
    pub wrong: Color,
    /// Color the window is cleared with outside the viewport.
    pub letterbox: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Color::from_rgb_u8(20, 22, 40),
            panel: Color::from_rgb_u8(28, 30, 55),
            text: Color::from_rgb_u8(235, 240, 255),
            accent: Color::from_rgb_u8(110, 231, 255),
            positive: Color::from_rgb_u8(80, 200, 120),
            negative: Color::from_rgb_u8(230, 90, 90),
            idle: Color::from_rgb_u8(22, 26, 48),
            lit: Color::from_rgb_u8(55, 90, 160),
            outline: Color::new(1.0, 1.0, 1.0, 40.0 / 255.0),
            pick: Color::from_rgb_u8(42, 108, 122),
            correct: Color::from_rgb_u8(40, 110, 70),
            wrong: Color::from_rgb_u8(225, 0, 0),
            letterbox: Color::from_rgb_u8(0, 0, 0),
        }
    }
}

impl Palette {
    /// Fill color of a cell with the provided display class.
    #[must_use]
    pub const fn cell(&self, display: CellDisplay) -> Color {
        match display {
            CellDisplay::Idle => self.idle,
            CellDisplay::Lit => self.lit,
            CellDisplay::Correct => self.correct,
            CellDisplay::Wrong => self.wrong,
        }
    }
}

/// Axis-aligned rectangle in surface or screen units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    /// Top-left corner.
    pub origin: Vec2,
    /// Width and height.
    pub size: Vec2,
}

impl Rect {
    /// Creates a rectangle from its corner and extent.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    /// Bottom-right corner.
    #[must_use]
    pub fn max(&self) -> Vec2 {
        self.origin + self.size
    }

    /// Centre point.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.origin + self.size * 0.5
    }

    /// Reports whether the point lies inside, counting the top and left edges only.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        let max = self.max();
        point.x >= self.origin.x && point.y >= self.origin.y && point.x < max.x && point.y < max.y
    }
}

/// Square cells of a grid centred within a board area.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridLayout {
    shape: GridShape,
    origin: Vec2,
    cell_size: f32,
    gap: f32,
}

impl GridLayout {
    /// Fits the grid into `area` using whole-pixel cells separated by `gap`.
    pub fn fit(shape: GridShape, area: Rect, gap: f32) -> Result<Self, RenderingError> {
        if shape.rows() == 0 || shape.columns() == 0 {
            return Err(RenderingError::EmptyGrid {
                rows: shape.rows(),
                columns: shape.columns(),
            });
        }

        let columns = shape.columns() as f32;
        let rows = shape.rows() as f32;
        let max_width = ((area.size.x - gap * (columns - 1.0)) / columns).floor();
        let max_height = ((area.size.y - gap * (rows - 1.0)) / rows).floor();
        let cell_size = max_width.min(max_height);
        if cell_size < 1.0 {
            return Err(RenderingError::AreaTooSmall {
                width: area.size.x,
                height: area.size.y,
            });
        }

        let total = Vec2::new(
            columns * cell_size + gap * (columns - 1.0),
            rows * cell_size + gap * (rows - 1.0),
        );
        let origin = area.origin + ((area.size - total) * 0.5).floor();

        Ok(Self {
            shape,
            origin,
            cell_size,
            gap,
        })
    }

    /// Grid the layout was computed for.
    #[must_use]
    pub const fn shape(&self) -> GridShape {
        self.shape
    }

    /// Side length of a single cell.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Top-left corner of the first cell.
    #[must_use]
    pub const fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Square occupied by the cell.
    #[must_use]
    pub fn cell_rect(&self, cell: Cell) -> Rect {
        let pitch = self.cell_size + self.gap;
        Rect::new(
            self.origin.x + cell.column() as f32 * pitch,
            self.origin.y + cell.row() as f32 * pitch,
            self.cell_size,
            self.cell_size,
        )
    }

    /// Cell whose square contains the point, if any.
    #[must_use]
    pub fn cell_at(&self, point: Vec2) -> Option<Cell> {
        let local = point - self.origin;
        if local.x < 0.0 || local.y < 0.0 {
            return None;
        }

        let pitch = self.cell_size + self.gap;
        let column = (local.x / pitch).floor();
        let row = (local.y / pitch).floor();
        if local.x - column * pitch >= self.cell_size || local.y - row * pitch >= self.cell_size {
            return None;
        }

        let cell = Cell::new(row as u32, column as u32);
        self.shape.contains(cell).then_some(cell)
    }
}

/// Placement of the design surface within the window, as fractions of the window size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    fractions: Rect,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::FULL
    }
}

impl Viewport {
    /// Viewport covering the entire window.
    pub const FULL: Viewport = Viewport {
        fractions: Rect::new(0.0, 0.0, 1.0, 1.0),
    };

    /// Creates a viewport from window fractions.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Result<Self, RenderingError> {
        let valid = [x, y, width, height].iter().all(|value| value.is_finite())
            && x >= 0.0
            && y >= 0.0
            && width > 0.0
            && height > 0.0
            && x + width <= 1.0
            && y + height <= 1.0;
        if !valid {
            return Err(RenderingError::InvalidViewport {
                x,
                y,
                width,
                height,
            });
        }

        Ok(Self {
            fractions: Rect::new(x, y, width, height),
        })
    }

    /// Window rectangle the surface is drawn into.
    #[must_use]
    pub fn screen_rect(&self, window: Vec2) -> Rect {
        Rect {
            origin: self.fractions.origin * window,
            size: self.fractions.size * window,
        }
    }

    /// Scale applied to surface coordinates on each axis.
    #[must_use]
    pub fn scale(&self, window: Vec2) -> Vec2 {
        self.screen_rect(window).size / SURFACE_SIZE
    }

    /// Maps a surface point onto the window.
    #[must_use]
    pub fn to_screen(&self, point: Vec2, window: Vec2) -> Vec2 {
        self.screen_rect(window).origin + point * self.scale(window)
    }

    /// Maps a window point back onto the surface, if it lies inside the viewport.
    #[must_use]
    pub fn to_surface(&self, point: Vec2, window: Vec2) -> Option<Vec2> {
        let rect = self.screen_rect(window);
        if !rect.contains(point) {
            return None;
        }
        Some((point - rect.origin) / self.scale(window))
    }
}

/// Maps a window-space pointer position to the grid cell beneath it.
#[must_use]
pub fn pointer_cell(
    viewport: &Viewport,
    window: Vec2,
    layout: &GridLayout,
    pointer: Vec2,
) -> Option<Cell> {
    viewport
        .to_surface(pointer, window)
        .and_then(|surface| layout.cell_at(surface))
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct FrameInput {
    /// Cell under a pointer press on this frame, if the press hit the grid.
    pub pointer_cell: Option<Cell>,
    /// Whether the confirm key was pressed on this frame.
    pub confirm: bool,
    /// Whether the restart key was pressed on this frame.
    pub restart: bool,
}

/// Drawing instructions for one grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellPresentation {
    /// Cell being drawn.
    pub cell: Cell,
    /// Fill class of the cell.
    pub display: CellDisplay,
    /// Whether the pick marker is drawn on top.
    pub picked: bool,
}

/// Text shown in the heads-up display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HudPresentation {
    /// Banner drawn on the left of the panel.
    pub title: String,
    /// `Level: n/5` label.
    pub level: String,
    /// `Score: s` label.
    pub score: String,
    /// `Lives: l` label.
    pub lives: String,
    /// Whether at least one life remains.
    pub lives_positive: bool,
}

impl HudPresentation {
    /// Formats the HUD labels.
    #[must_use]
    pub fn from_hud(hud: &Hud) -> Self {
        Self {
            title: GAME_TITLE.to_owned(),
            level: format!("Level: {}/{}", hud.level, hud.level_count),
            score: format!("Score: {}", hud.score),
            lives: format!("Lives: {}", hud.lives),
            lives_positive: hud.lives >= 1,
        }
    }
}

/// Emphasis applied to a line of overlay text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayTone {
    /// Game-over banner.
    Negative,
    /// Congrats banner.
    Positive,
    /// Plain information.
    Plain,
    /// Call to action.
    Accent,
}

/// Banner drawn over the board once the session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Overlay {
    /// The mistake limit was reached.
    GameOver {
        /// Score reached before the session ended.
        final_score: u32,
    },
    /// Every level was cleared.
    Congrats,
}

impl Overlay {
    /// Overlay matching the phase, if the phase ends the session.
    #[must_use]
    pub fn for_phase(phase: RoundPhase, score: u32) -> Option<Self> {
        match phase {
            RoundPhase::GameOver => Some(Self::GameOver { final_score: score }),
            RoundPhase::Congrats => Some(Self::Congrats),
            _ => None,
        }
    }

    /// Lines of the overlay from top to bottom; the first is the headline.
    #[must_use]
    pub fn lines(&self) -> [(String, OverlayTone); 3] {
        let restart = ("Press SPACE to restart".to_owned(), OverlayTone::Accent);
        match self {
            Self::GameOver { final_score } => [
                ("GAME OVER".to_owned(), OverlayTone::Negative),
                (format!("Final Score: {final_score}"), OverlayTone::Plain),
                restart,
            ],
            Self::Congrats => [
                ("Congratulations!".to_owned(), OverlayTone::Positive),
                (
                    format!("You completed all {LEVEL_COUNT} levels!"),
                    OverlayTone::Plain,
                ),
                restart,
            ],
        }
    }
}

/// Vertical offsets of the overlay lines relative to the surface centre.
pub const OVERLAY_LINE_OFFSETS: [f32; 3] = [-20.0, 15.0, 50.0];

/// Scene description combining the board, the HUD and the session overlay.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Phase the session is in.
    pub phase: RoundPhase,
    /// Placement of the grid cells on the surface.
    pub layout: GridLayout,
    /// Every cell of the grid in row-major order.
    pub cells: Vec<CellPresentation>,
    /// Heads-up display text.
    pub hud: HudPresentation,
    /// Banner shown in terminal phases.
    pub overlay: Option<Overlay>,
}

impl Scene {
    /// Creates a new scene descriptor.
    #[must_use]
    pub fn new(
        phase: RoundPhase,
        layout: GridLayout,
        cells: Vec<CellPresentation>,
        hud: HudPresentation,
        overlay: Option<Overlay>,
    ) -> Self {
        Self {
            phase,
            layout,
            cells,
            hud,
            overlay,
        }
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Colors used for every element.
    pub palette: Palette,
    /// Placement of the surface within the window.
    pub viewport: Viewport,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, palette: Palette, viewport: Viewport, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            palette,
            viewport,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Pattern Recall scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// input captured by the adapter, and rebuilds the scene before it is
    /// drawn.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum RenderingError {
    /// A grid needs at least one row and one column.
    #[error("grid must have at least one row and column (received {rows}x{columns})")]
    EmptyGrid {
        /// Provided row count.
        rows: u32,
        /// Provided column count.
        columns: u32,
    },
    /// The board area cannot hold a one-pixel cell per grid position.
    #[error("board area {width}x{height} is too small for the grid")]
    AreaTooSmall {
        /// Width of the area.
        width: f32,
        /// Height of the area.
        height: f32,
    },
    /// Viewport fractions must describe a non-empty rectangle inside the window.
    #[error("viewport ({x}, {y}, {width}, {height}) must lie within the unit square")]
    InvalidViewport {
        /// Left edge fraction.
        x: f32,
        /// Top edge fraction.
        y: f32,
        /// Width fraction.
        width: f32,
        /// Height fraction.
        height: f32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pattern_recall_core::Level;

    fn board_layout(rows: u32, columns: u32) -> GridLayout {
        GridLayout::fit(GridShape::new(rows, columns), BOARD_RECT, CELL_GAP)
            .expect("board fits the grid")
    }

    #[test]
    fn layout_uses_whole_pixel_cells_centred_in_area() {
        let layout = board_layout(2, 2);

        assert_eq!(layout.cell_size(), 256.0);
        assert_eq!(layout.origin(), Vec2::new(190.0, 120.0));
        assert_eq!(
            layout.cell_rect(Cell::new(1, 1)),
            Rect::new(454.0, 384.0, 256.0, 256.0)
        );
    }

    #[test]
    fn layout_fits_every_level() {
        for level in Level::all() {
            let layout = GridLayout::fit(level.shape(), BOARD_RECT, CELL_GAP)
                .expect("level grid fits the board");
            let last = Cell::new(level.shape().rows() - 1, level.shape().columns() - 1);
            let rect = layout.cell_rect(last);
            assert!(rect.max().x <= BOARD_RECT.max().x);
            assert!(rect.max().y <= BOARD_RECT.max().y);
        }
    }

    #[test]
    fn layout_rejects_empty_grid() {
        let error = GridLayout::fit(GridShape::new(0, 3), BOARD_RECT, CELL_GAP)
            .expect_err("empty grid must be rejected");

        assert_eq!(error, RenderingError::EmptyGrid { rows: 0, columns: 3 });
    }

    #[test]
    fn cell_at_inverts_cell_rect() {
        let layout = board_layout(4, 5);
        for cell in layout.shape().cells() {
            let rect = layout.cell_rect(cell);
            assert_eq!(layout.cell_at(rect.center()), Some(cell));
            assert_eq!(layout.cell_at(rect.origin), Some(cell));
        }
    }

    #[test]
    fn cell_at_ignores_gaps_and_outside_points() {
        let layout = board_layout(2, 2);
        let first = layout.cell_rect(Cell::new(0, 0));

        let in_gap = Vec2::new(first.max().x + CELL_GAP * 0.5, first.center().y);
        assert_eq!(layout.cell_at(in_gap), None);
        assert_eq!(layout.cell_at(Vec2::new(10.0, 10.0)), None);
        assert_eq!(layout.cell_at(Vec2::new(890.0, 690.0)), None);
    }

    #[test]
    fn full_viewport_maps_window_onto_surface() {
        let window = Vec2::new(1800.0, 1400.0);
        let viewport = Viewport::default();

        assert_eq!(viewport.scale(window), Vec2::splat(2.0));
        assert_eq!(
            viewport.to_surface(Vec2::new(900.0, 700.0), window),
            Some(Vec2::new(450.0, 350.0))
        );
        assert_eq!(
            viewport.to_screen(Vec2::new(450.0, 350.0), window),
            Vec2::new(900.0, 700.0)
        );
    }

    #[test]
    fn inset_viewport_drops_points_outside_it() {
        let window = Vec2::new(1000.0, 1000.0);
        let viewport = Viewport::new(0.25, 0.25, 0.5, 0.5).expect("valid viewport");

        assert_eq!(viewport.to_surface(Vec2::new(100.0, 500.0), window), None);
        assert_eq!(
            viewport.to_surface(Vec2::new(250.0, 250.0), window),
            Some(Vec2::ZERO)
        );
    }

    #[test]
    fn viewport_rejects_fractions_outside_window() {
        assert!(Viewport::new(0.5, 0.0, 0.6, 1.0).is_err());
        assert!(Viewport::new(0.0, 0.0, 0.0, 1.0).is_err());
        assert!(Viewport::new(-0.1, 0.0, 0.5, 0.5).is_err());
        assert!(Viewport::new(0.0, 0.0, f32::NAN, 0.5).is_err());
    }

    #[test]
    fn pointer_cell_composes_viewport_and_layout() {
        let window = SURFACE_SIZE;
        let layout = board_layout(2, 2);
        let target = layout.cell_rect(Cell::new(0, 1)).center();

        assert_eq!(
            pointer_cell(&Viewport::default(), window, &layout, target),
            Some(Cell::new(0, 1))
        );
    }

    #[test]
    fn hud_labels_match_counters() {
        let hud = Hud::from_counters(Level::new(2).expect("valid level"), 42, 3);
        let presentation = HudPresentation::from_hud(&hud);

        assert_eq!(presentation.title, "Pattern Recognition");
        assert_eq!(presentation.level, "Level: 3/5");
        assert_eq!(presentation.score, "Score: 42");
        assert_eq!(presentation.lives, "Lives: 0");
        assert!(!presentation.lives_positive);
    }

    #[test]
    fn overlays_only_exist_in_terminal_phases() {
        assert_eq!(Overlay::for_phase(RoundPhase::Input, 5), None);

        let over = Overlay::for_phase(RoundPhase::GameOver, 17).expect("game over overlay");
        let texts: Vec<String> = over.lines().into_iter().map(|(text, _)| text).collect();
        assert_eq!(
            texts,
            vec!["GAME OVER", "Final Score: 17", "Press SPACE to restart"]
        );

        let congrats = Overlay::for_phase(RoundPhase::Congrats, 17).expect("congrats overlay");
        assert_eq!(congrats.lines()[1].0, "You completed all 5 levels!");
        assert_eq!(congrats.lines()[0].1, OverlayTone::Positive);
    }
}

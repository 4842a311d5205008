//! The SVG render surface: document ownership, coordinate transforms,
//! rasterization, and hit-test entry points.
//!
//! `SvgSurface` owns the current document and a fixed-size raster buffer.
//! Every render pass re-derives the transform state (the document or the
//! window may have changed), rasterizes the canonical source through
//! `usvg`/`resvg`, and hands the buffer to a [`PresentTarget`] for the
//! actual blit + present.
//!
//! Coordinate spaces:
//!
//! ```text
//!  window pixels ──(− surface_position, − surface_offset)──► buffer pixels
//!  buffer pixels ──(÷ scaling_factor)─────────────────────► SVG units
//! ```

use simview_core::{Color, Point, SvgDocument, ValidationError};
use tiny_skia::Pixmap;

use crate::context::GpuError;

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("not supported: {0}")]
    NotSupported(String),
    #[error("malformed transform `{0}`")]
    MalformedTransform(String),
    #[error("failed to rasterize document: {0}")]
    Raster(String),
    #[error("hit test on <{tag}> (id: {id}) failed: missing attribute `{attr}`")]
    MissingAttribute {
        tag: String,
        id: String,
        attr: &'static str,
    },
    #[error("invalid raster buffer size {0}×{1}")]
    BufferSize(u32, u32),
    #[error(transparent)]
    Gpu(#[from] GpuError),
    #[error("failed to acquire window surface: {0}")]
    Present(#[from] wgpu::SurfaceError),
}

/// Anything the surface can present a finished frame to.
///
/// The desktop crate implements this over a window swap chain
/// ([`crate::WindowTarget`]); tests implement it with a stub.
pub trait PresentTarget {
    /// Current target size in pixels (the window inner size).
    fn size(&self) -> (u32, u32);

    /// Clear to `background`, draw `frame` with its top-left corner at
    /// `position` (window pixels), and present.
    fn present(
        &mut self,
        frame: &Pixmap,
        position: Point,
        background: Color,
    ) -> Result<(), SurfaceError>;
}

/// Owns the current document and the mapping between SVG space and the
/// raster buffer.
pub struct SvgSurface {
    /// None until the host's first update; rendering then clears to the
    /// background only.
    document: Option<SvgDocument>,
    /// Canonical serialized form, cached on update for the rasterizer.
    source: String,
    /// Declared root size in SVG units.
    svg_size: (f64, f64),
    /// Declared root position in SVG units (not pixels).
    svg_position: (f64, f64),
    /// Fixed-size raster buffer, recreated only on explicit resize.
    pixmap: Pixmap,
    /// Uniform scale fitting the SVG into the buffer (letterboxing).
    scaling_factor: f64,
    /// Centering padding of the scaled image inside the buffer.
    surface_offset: (f64, f64),
    /// Size of the window the buffer is blitted into.
    window_size: (f64, f64),
}

impl SvgSurface {
    pub fn new(surface_size: (u32, u32)) -> Result<Self, SurfaceError> {
        let pixmap = Pixmap::new(surface_size.0, surface_size.1)
            .ok_or(SurfaceError::BufferSize(surface_size.0, surface_size.1))?;
        Ok(Self {
            document: None,
            source: String::new(),
            svg_size: (0.0, 0.0),
            svg_position: (0.0, 0.0),
            pixmap,
            scaling_factor: 1.0,
            surface_offset: (0.0, 0.0),
            window_size: (0.0, 0.0),
        })
    }

    /// Replace the stored document wholesale.
    ///
    /// Validation lives on [`SvgDocument`] construction, so this cannot
    /// fail; [`SvgSurface::update_from_str`] surfaces validation errors
    /// for hosts handing over raw text.
    pub fn update(&mut self, document: SvgDocument) {
        self.svg_size = document.size();
        self.svg_position = document.position();
        self.source = document.to_svg_string();
        self.document = Some(document);
    }

    /// Parse, validate, and store a document from SVG text.
    pub fn update_from_str(&mut self, source: &str) -> Result<(), SurfaceError> {
        let document = SvgDocument::from_str(source)?;
        self.update(document);
        Ok(())
    }

    pub fn document(&self) -> Option<&SvgDocument> {
        self.document.as_ref()
    }

    /// Raster buffer size in pixels.
    pub fn surface_size(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    /// Resize the raster buffer.  No-op if the size is unchanged.
    pub fn set_surface_size(&mut self, size: (u32, u32)) -> Result<(), SurfaceError> {
        if size == self.surface_size() {
            return Ok(());
        }
        self.pixmap =
            Pixmap::new(size.0, size.1).ok_or(SurfaceError::BufferSize(size.0, size.1))?;
        Ok(())
    }

    /// Record the window size the next frame will be centered in.
    pub fn set_window_size(&mut self, size: (u32, u32)) {
        self.window_size = (f64::from(size.0), f64::from(size.1));
    }

    pub fn scaling_factor(&self) -> f64 {
        self.scaling_factor
    }

    pub fn surface_offset(&self) -> (f64, f64) {
        self.surface_offset
    }

    /// Placement of the raster buffer inside the window: the SVG root's
    /// declared (x, y) scaled into pixels, plus the window-centering
    /// offset.
    pub fn surface_position(&self) -> Point {
        let (buf_w, buf_h) = self.surface_size();
        let centering = (
            (self.window_size.0 - f64::from(buf_w)) / 2.0,
            (self.window_size.1 - f64::from(buf_h)) / 2.0,
        );
        Point::new(
            centering.0 + self.svg_position.0 * self.scaling_factor,
            centering.1 + self.svg_position.1 * self.scaling_factor,
        )
    }

    /// Re-derive `scaling_factor` and `surface_offset` from the current
    /// document and buffer.  Must run on every render pass — either side
    /// of the ratio may have changed since the last frame.
    fn derive_transform(&mut self) {
        let (buf_w, buf_h) = self.surface_size();
        let (svg_w, svg_h) = self.svg_size;
        if svg_w <= 0.0 || svg_h <= 0.0 {
            self.scaling_factor = 1.0;
            self.surface_offset = (0.0, 0.0);
            return;
        }
        let width_ratio = f64::from(buf_w) / svg_w;
        let height_ratio = f64::from(buf_h) / svg_h;
        // Letterbox: the smaller ratio wins, never stretch per-axis.
        self.scaling_factor = width_ratio.min(height_ratio);
        self.surface_offset = (
            (f64::from(buf_w) - svg_w * self.scaling_factor) / 2.0,
            (f64::from(buf_h) - svg_h * self.scaling_factor) / 2.0,
        );
    }

    /// Rasterize the stored document into the buffer over `background`.
    pub fn rasterize(&mut self, background: Color) -> Result<(), SurfaceError> {
        self.derive_transform();
        self.pixmap.fill(tiny_skia::Color::from_rgba8(
            background.r,
            background.g,
            background.b,
            0xff,
        ));
        if self.document.is_none() {
            return Ok(());
        }

        let options = usvg::Options::default();
        let tree = usvg::Tree::from_str(&self.source, &options)
            .map_err(|e| SurfaceError::Raster(e.to_string()))?;

        let transform = tiny_skia::Transform::from_scale(
            self.scaling_factor as f32,
            self.scaling_factor as f32,
        )
        .post_translate(self.surface_offset.0 as f32, self.surface_offset.1 as f32);
        resvg::render(&tree, transform, &mut self.pixmap.as_mut());
        Ok(())
    }

    /// Rasterize and present one frame.
    pub fn render<T: PresentTarget>(
        &mut self,
        target: &mut T,
        background: Color,
    ) -> Result<(), SurfaceError> {
        self.set_window_size(target.size());
        self.rasterize(background)?;
        let position = self.surface_position();
        target.present(&self.pixmap, position, background)
    }

    // ───────────────────── coordinate transforms ─────────────────────

    /// Map a window-pixel point into SVG space.
    pub fn pixel_to_svg(&self, point: Point) -> Point {
        let position = self.surface_position();
        Point::new(
            (point.x - self.surface_offset.0 - position.x) / self.scaling_factor,
            (point.y - self.surface_offset.1 - position.y) / self.scaling_factor,
        )
    }

    /// Scale a pixel-space displacement into SVG units (no translation).
    pub fn pixel_scale_to_svg_scale(&self, vector: Point) -> Point {
        Point::new(
            vector.x / self.scaling_factor,
            vector.y / self.scaling_factor,
        )
    }

    /// Inverse of [`SvgSurface::pixel_to_svg`].  Never needed by any
    /// host so far; declared for symmetry.
    pub fn svg_to_pixel(&self, _point: Point) -> Result<Point, SurfaceError> {
        Err(SurfaceError::NotSupported(
            "svg_to_pixel is not implemented".to_string(),
        ))
    }

    /// Inverse of [`SvgSurface::pixel_scale_to_svg_scale`].  Declared
    /// for symmetry, see [`SvgSurface::svg_to_pixel`].
    pub fn svg_scale_to_pixel_scale(&self, _vector: Point) -> Result<Point, SurfaceError> {
        Err(SurfaceError::NotSupported(
            "svg_scale_to_pixel_scale is not implemented".to_string(),
        ))
    }

    /// Ids of the elements under `point`, root-to-leaf.
    ///
    /// When `transform` is set the point is first mapped from window
    /// pixels into SVG space.
    pub fn elements_under(
        &self,
        point: Point,
        transform: bool,
    ) -> Result<Vec<String>, SurfaceError> {
        let point = if transform {
            self.pixel_to_svg(point)
        } else {
            point
        };
        match &self.document {
            Some(document) => crate::hittest::elements_under(document.root(), point),
            None => Ok(Vec::new()),
        }
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use simview_core::geometry::WHITE;

    const RED_RECT: &str = r##"
        <svg width="100" height="100">
            <rect id="r1" x="0" y="0" width="100" height="100" fill="#ff0000"/>
        </svg>"##;

    fn surface(buffer: (u32, u32), source: &str) -> SvgSurface {
        let mut surface = SvgSurface::new(buffer).unwrap();
        surface.update_from_str(source).unwrap();
        surface
    }

    #[test]
    fn test_zero_buffer_size_rejected() {
        assert!(matches!(
            SvgSurface::new((0, 100)),
            Err(SurfaceError::BufferSize(0, 100))
        ));
    }

    #[test]
    fn test_update_rejects_invalid_document() {
        let mut surface = SvgSurface::new((10, 10)).unwrap();
        let err = surface
            .update_from_str(r#"<svg width="100"></svg>"#)
            .unwrap_err();
        assert!(matches!(
            err,
            SurfaceError::Validation(ValidationError::MissingAttribute("height"))
        ));
    }

    #[test]
    fn test_scaling_factor_is_min_ratio() {
        // 200/100 = 2.0 on x, 100/100 = 1.0 on y → 1.0 wins.
        let mut surface = surface((200, 100), RED_RECT);
        surface.rasterize(WHITE).unwrap();
        assert_eq!(surface.scaling_factor(), 1.0);
        // Unused x space is split evenly.
        assert_eq!(surface.surface_offset(), (50.0, 0.0));
    }

    #[test]
    fn test_offset_centers_scaled_image() {
        // svg 200×100 into 100×100 buffer: s = 0.5, image 100×50.
        let source = r#"<svg width="200" height="100"/>"#;
        let mut surface = surface((100, 100), source);
        surface.rasterize(WHITE).unwrap();
        assert_eq!(surface.scaling_factor(), 0.5);
        assert_eq!(surface.surface_offset(), (0.0, 25.0));
    }

    #[test]
    fn test_surface_position_combines_svg_xy_and_centering() {
        let source = r#"<svg x="10" y="20" width="100" height="100"/>"#;
        let mut surface = surface((100, 100), source);
        surface.set_window_size((300, 200));
        surface.rasterize(WHITE).unwrap();
        // scaling 1.0: position = svg(x, y) + ((300−100)/2, (200−100)/2).
        assert_eq!(surface.surface_position(), Point::new(110.0, 70.0));
    }

    #[test]
    fn test_pixel_to_svg_inverts_placement() {
        let mut surface = surface((200, 100), RED_RECT);
        surface.set_window_size((200, 100));
        surface.rasterize(WHITE).unwrap();
        // s = 1.0, offset (50, 0); window == buffer so position = (0, 0).
        let p = surface.pixel_to_svg(Point::new(60.0, 10.0));
        assert_eq!(p, Point::new(10.0, 10.0));
    }

    #[test]
    fn test_pixel_to_svg_is_linear() {
        let mut surface = surface((100, 100), r#"<svg width="200" height="200"/>"#);
        surface.set_window_size((100, 100));
        surface.rasterize(WHITE).unwrap();
        assert_eq!(surface.scaling_factor(), 0.5);
        let a = surface.pixel_to_svg(Point::new(10.0, 10.0));
        let b = surface.pixel_to_svg(Point::new(30.0, 10.0));
        // Equal pixel steps map to equal SVG steps.
        assert_eq!(b.x - a.x, 40.0);
        assert_eq!(b.y, a.y);
    }

    #[test]
    fn test_pixel_scale_divides_by_scaling_factor() {
        let mut surface = surface((100, 100), r#"<svg width="200" height="200"/>"#);
        surface.rasterize(WHITE).unwrap();
        let v = surface.pixel_scale_to_svg_scale(Point::new(5.0, -2.0));
        assert_eq!(v, Point::new(10.0, -4.0));
    }

    #[test]
    fn test_svg_to_pixel_not_supported() {
        let surface = SvgSurface::new((10, 10)).unwrap();
        assert!(matches!(
            surface.svg_to_pixel(Point::new(0.0, 0.0)),
            Err(SurfaceError::NotSupported(_))
        ));
        assert!(matches!(
            surface.svg_scale_to_pixel_scale(Point::new(0.0, 0.0)),
            Err(SurfaceError::NotSupported(_))
        ));
    }

    #[test]
    fn test_rasterize_draws_document() {
        let mut surface = surface((200, 100), RED_RECT);
        surface.rasterize(WHITE).unwrap();
        // Center of the letterboxed image is the rect fill.
        let center = surface.pixmap.pixel(100, 50).unwrap();
        assert_eq!((center.red(), center.green(), center.blue()), (255, 0, 0));
        // Letterbox margin is the background.
        let margin = surface.pixmap.pixel(10, 50).unwrap();
        assert_eq!(
            (margin.red(), margin.green(), margin.blue()),
            (255, 255, 255)
        );
    }

    #[test]
    fn test_rasterize_without_document_only_clears() {
        let mut surface = SvgSurface::new((10, 10)).unwrap();
        surface
            .rasterize(Color::from_hex("#000000").unwrap())
            .unwrap();
        let pixel = surface.pixmap.pixel(5, 5).unwrap();
        assert_eq!((pixel.red(), pixel.green(), pixel.blue()), (0, 0, 0));
    }

    #[test]
    fn test_elements_under_with_pixel_transform() {
        let mut surface = surface((200, 100), RED_RECT);
        surface.set_window_size((200, 100));
        surface.rasterize(WHITE).unwrap();
        // Window pixel (60, 10) → SVG (10, 10), inside the rect.
        let hits = surface
            .elements_under(Point::new(60.0, 10.0), true)
            .unwrap();
        assert_eq!(hits, vec!["r1"]);
        // Same point untransformed is also inside (rect spans 100×100).
        let hits = surface
            .elements_under(Point::new(60.0, 10.0), false)
            .unwrap();
        assert_eq!(hits, vec!["r1"]);
        // A point in the letterbox margin maps outside the SVG.
        let hits = surface.elements_under(Point::new(10.0, 10.0), true).unwrap();
        assert!(hits.is_empty());
    }

    struct StubTarget {
        size: (u32, u32),
        presented_at: Option<Point>,
    }

    impl PresentTarget for StubTarget {
        fn size(&self) -> (u32, u32) {
            self.size
        }
        fn present(
            &mut self,
            frame: &Pixmap,
            position: Point,
            _background: Color,
        ) -> Result<(), SurfaceError> {
            assert_eq!((frame.width(), frame.height()), (200, 100));
            self.presented_at = Some(position);
            Ok(())
        }
    }

    #[test]
    fn test_render_feeds_window_size_and_position() {
        let mut surface = surface((200, 100), RED_RECT);
        let mut target = StubTarget {
            size: (400, 300),
            presented_at: None,
        };
        surface.render(&mut target, WHITE).unwrap();
        // Centering: ((400−200)/2, (300−100)/2); svg x/y are 0.
        assert_eq!(target.presented_at, Some(Point::new(100.0, 100.0)));
    }
}

//! The render loop: one [`Compositor::tick`] per display refresh.
//!
//! A tick drains the studio's command queue, resolves the transition, paints the program scene
//! onto the composite surface, hands the clean frame to the outputs and finally builds the
//! display copy with editing overlays.

use std::time::Instant;

use crate::assets::color::Color;
use crate::assets::media::{encode_png, screenshot_file_name};
use crate::effects::blur::{blur_rgba8_premul, kernel_radius_for};
use crate::effects::composite::over_in_place;
use crate::effects::pipeline::{FilterOutcome, apply_filters, draw_outcome};
use crate::foundation::core::{Affine, Canvas, Rect, SourceId, Vec2, unix_millis};
use crate::foundation::error::{OnAirError, OnAirResult};
use crate::render::buffer::PixelBuffer;
use crate::render::overlay::draw_overlays;
use crate::render::stats::{FpsCounter, FrameClock};
use crate::render::surface::{CompositeSurface, FramePainter, FrameRGBA, LayerDraw, LayerPaint};
use crate::render::transition::{TransitionFrame, TransitionKind};
use crate::scene::graph::Scene;
use crate::source::canvas::{Layer, RasterCache, SourceCanvas};
use crate::source::model::Source;
use crate::studio::state::Studio;

/// Whether the loop is still producing frames.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LoopState {
    #[default]
    Running,
    /// The composite surface failed; every tick is a no-op until [`Compositor::restart`].
    Stopped { reason: String },
}

/// A source that failed to draw this frame and was skipped.
#[derive(Debug)]
pub struct SourceFault {
    pub source: SourceId,
    pub error: OnAirError,
}

/// What one rendered tick did.
#[derive(Debug, Default)]
pub struct FrameReport {
    pub frame_index: u64,
    /// Frame slots missed before this one.
    pub dropped: u64,
    pub faults: Vec<SourceFault>,
    /// Queued commands that were rejected while draining.
    pub rejected: Vec<OnAirError>,
    /// Progress of the transition drawn this frame, if any.
    pub transition_progress: Option<f64>,
}

#[derive(Debug)]
pub enum TickOutcome {
    /// Not due yet; nothing happened.
    Skipped,
    Rendered(FrameReport),
    Stopped,
}

/// Owns the composite surfaces and frame pacing. All scene state lives in [`Studio`].
#[derive(Debug)]
pub struct Compositor {
    program: Option<CompositeSurface>,
    scratch: Option<CompositeSurface>,
    clock: FrameClock,
    fps: FpsCounter,
    rasters: RasterCache,
    state: LoopState,
    show_overlays: bool,
    frames: u64,
    program_frame: Option<FrameRGBA>,
    preview_frame: Option<FrameRGBA>,
    display_frame: Option<FrameRGBA>,
}

impl Default for Compositor {
    fn default() -> Self {
        Self {
            program: None,
            scratch: None,
            clock: FrameClock::new(30),
            fps: FpsCounter::default(),
            rasters: RasterCache::new(),
            state: LoopState::Running,
            show_overlays: true,
            frames: 0,
            program_frame: None,
            preview_frame: None,
            display_frame: None,
        }
    }
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn set_show_overlays(&mut self, show: bool) {
        self.show_overlays = show;
    }

    /// Clean program output of the last rendered tick.
    pub fn program_frame(&self) -> Option<&FrameRGBA> {
        self.program_frame.as_ref()
    }

    /// Preview scene output (studio mode only).
    pub fn preview_frame(&self) -> Option<&FrameRGBA> {
        self.preview_frame.as_ref()
    }

    /// Program output with overlays, for on-screen display.
    pub fn display_frame(&self) -> Option<&FrameRGBA> {
        self.display_frame.as_ref()
    }

    /// The rendering context went away. Surfaces are dropped and the loop stops.
    pub fn context_lost(&mut self, reason: impl Into<String>) {
        self.stop(reason.into());
    }

    /// Resume after a stop. Surfaces are reallocated on the next tick.
    pub fn restart(&mut self) {
        if self.is_running() {
            return;
        }
        tracing::info!("render loop restarted");
        self.state = LoopState::Running;
        self.clock.reset();
    }

    fn stop(&mut self, reason: String) {
        tracing::error!(%reason, "render loop stopped");
        self.program = None;
        self.scratch = None;
        self.state = LoopState::Stopped { reason };
    }

    /// PNG of the last program frame, named `screenshot-<unix ms>.png`.
    pub fn screenshot(&self) -> OnAirResult<(String, Vec<u8>)> {
        let frame = self
            .program_frame
            .as_ref()
            .ok_or_else(|| OnAirError::render("no frame has been rendered yet"))?;
        Ok((screenshot_file_name(unix_millis()), encode_png(frame)?))
    }

    fn ensure_surfaces(&mut self, canvas: Canvas) -> OnAirResult<()> {
        if self.program.as_ref().is_none_or(|s| s.canvas() != canvas) {
            tracing::debug!(%canvas, "allocating composite surfaces");
            self.program = Some(CompositeSurface::new(canvas)?);
            self.scratch = Some(CompositeSurface::new(canvas)?);
        }
        Ok(())
    }

    /// Run one frame at `now_ms` if it is due.
    #[tracing::instrument(skip(self, studio))]
    pub fn tick(&mut self, studio: &mut Studio, now_ms: f64) -> TickOutcome {
        if !self.is_running() {
            return TickOutcome::Stopped;
        }
        self.clock.set_fps(studio.settings().frame_rate);
        let Some(dropped) = self.clock.poll(now_ms) else {
            return TickOutcome::Skipped;
        };
        let started = Instant::now();
        let rejected = studio.drain_commands(now_ms);

        if let Err(e) = self.ensure_surfaces(studio.settings().resolution) {
            self.stop(e.to_string());
            return TickOutcome::Stopped;
        }

        let transition = studio.advance_transition(now_ms);
        let mut faults = Vec::new();
        if let Err(e) = self.render_program(studio, transition.as_ref(), &mut faults) {
            self.stop(e.to_string());
            return TickOutcome::Stopped;
        }
        if transition.as_ref().is_some_and(TransitionFrame::is_finished) {
            studio.commit_transition();
        }

        let Some(frame) = self.program.as_ref().map(CompositeSurface::to_frame) else {
            self.stop("composite surface missing".to_owned());
            return TickOutcome::Stopped;
        };
        studio.deliver_frame(&frame, now_ms);
        studio.pump_audio(now_ms);

        if let Err(e) = self.render_preview(studio, &mut faults) {
            self.stop(e.to_string());
            return TickOutcome::Stopped;
        }
        let display = match self.render_display(studio, &frame) {
            Ok(display) => display,
            Err(e) => {
                self.stop(e.to_string());
                return TickOutcome::Stopped;
            }
        };
        self.display_frame = Some(display);
        self.program_frame = Some(frame);

        let render_ms = started.elapsed().as_secs_f64() * 1000.0;
        let fps = self.fps.frame(now_ms);
        let stats = studio.stats_mut();
        stats.fps = fps;
        stats.record_frame(render_ms, dropped, faults.len() as u64);

        let frame_index = self.frames;
        self.frames += 1;
        TickOutcome::Rendered(FrameReport {
            frame_index,
            dropped,
            faults,
            rejected,
            transition_progress: transition.map(|t| t.progress),
        })
    }

    fn render_program(
        &mut self,
        studio: &Studio,
        transition: Option<&TransitionFrame>,
        faults: &mut Vec<SourceFault>,
    ) -> OnAirResult<()> {
        let (Some(program), Some(scratch)) = (self.program.as_mut(), self.scratch.as_mut()) else {
            return Err(OnAirError::render("composite surface missing"));
        };
        let canvas = program.canvas();
        let width = f64::from(canvas.width);

        let Some(t) = transition else {
            let mut painter = begin_frame(program);
            if let Some(scene) = studio.current_scene() {
                paint_scene(&mut painter, scene, canvas, Affine::IDENTITY, &mut self.rasters, faults);
            }
            painter.finish(program);
            return Ok(());
        };

        let from = studio.scene(&t.from);
        let to = studio.scene(&t.to);
        match t.kind {
            TransitionKind::Cut => {
                let mut painter = begin_frame(program);
                if let Some(scene) = to {
                    paint_scene(&mut painter, scene, canvas, Affine::IDENTITY, &mut self.rasters, faults);
                }
                painter.finish(program);
            }
            TransitionKind::Fade => {
                let mut painter = begin_frame(program);
                if let Some(scene) = from {
                    paint_scene(&mut painter, scene, canvas, Affine::IDENTITY, &mut self.rasters, faults);
                }
                painter.finish(program);

                let mut offscreen = begin_frame(scratch);
                if let Some(scene) = to {
                    paint_scene(&mut offscreen, scene, canvas, Affine::IDENTITY, &mut self.rasters, faults);
                }
                offscreen.finish(scratch);
                over_in_place(program.data_mut(), scratch.data(), t.progress as f32)?;
            }
            TransitionKind::Slide => {
                let mut painter = begin_frame(program);
                if let Some(scene) = from {
                    let offset = Affine::translate(Vec2::new(-width * t.progress, 0.0));
                    paint_scene(&mut painter, scene, canvas, offset, &mut self.rasters, faults);
                }
                if let Some(scene) = to {
                    let offset = Affine::translate(Vec2::new(width * (1.0 - t.progress), 0.0));
                    paint_scene(&mut painter, scene, canvas, offset, &mut self.rasters, faults);
                }
                painter.finish(program);
            }
        }
        Ok(())
    }

    fn render_preview(&mut self, studio: &Studio, faults: &mut Vec<SourceFault>) -> OnAirResult<()> {
        let scene = match studio.preview_scene_id() {
            Some(id) if studio.studio_mode() => studio.scene(id),
            _ => None,
        };
        let Some(scene) = scene else {
            self.preview_frame = None;
            return Ok(());
        };
        let scratch = self
            .scratch
            .as_mut()
            .ok_or_else(|| OnAirError::render("composite surface missing"))?;
        let canvas = scratch.canvas();
        let mut painter = begin_frame(scratch);
        paint_scene(&mut painter, scene, canvas, Affine::IDENTITY, &mut self.rasters, faults);
        painter.finish(scratch);
        self.preview_frame = Some(scratch.to_frame());
        Ok(())
    }

    fn render_display(&mut self, studio: &Studio, frame: &FrameRGBA) -> OnAirResult<FrameRGBA> {
        let options = studio.overlay_options();
        if !self.show_overlays || options.is_empty() {
            return Ok(frame.clone());
        }
        let scratch = self
            .scratch
            .as_mut()
            .ok_or_else(|| OnAirError::render("composite surface missing"))?;
        draw_overlays(scratch, frame, &options)
    }
}

fn begin_frame(surface: &CompositeSurface) -> FramePainter {
    let mut painter = surface.painter();
    painter.fill_canvas(Color::BLACK);
    painter
}

/// Background, then every source in list order. Source failures are recorded and skipped.
fn paint_scene(
    painter: &mut FramePainter,
    scene: &Scene,
    canvas: Canvas,
    offset: Affine,
    rasters: &mut RasterCache,
    faults: &mut Vec<SourceFault>,
) {
    let full = Rect::new(0.0, 0.0, f64::from(canvas.width), f64::from(canvas.height));
    painter.fill_rect(offset, full, scene.background);

    for source in scene.sources.iter().filter(|s| s.visible) {
        if let Err(error) = paint_source(painter, source, offset, rasters) {
            tracing::warn!(source = %source.id, name = %source.name, %error, "source skipped");
            faults.push(SourceFault {
                source: source.id.clone(),
                error,
            });
        }
    }
}

fn paint_source(
    painter: &mut FramePainter,
    source: &Source,
    offset: Affine,
    rasters: &mut RasterCache,
) -> OnAirResult<()> {
    let g = &source.geometry;
    let mut canvas = SourceCanvas::new(g.width, g.height)?;
    source.draw(&mut canvas, rasters)?;
    if canvas.is_empty() {
        return Ok(());
    }

    let pixel_filters = source
        .filters
        .iter()
        .any(|f| f.enabled && f.kind.needs_pixels());
    let outcome: FilterOutcome = if pixel_filters {
        apply_filters(canvas.pixels_mut(), &source.filters)
    } else {
        draw_outcome(&source.filters)
    };

    let (cw, ch) = (canvas.width(), canvas.height());
    let layer = canvas.into_layer();
    let blurred;
    let clip = (!source.crop.is_empty()).then(|| source.crop.visible_rect(g.width, g.height));
    let mut draw = LayerDraw {
        transform: offset * g.local_to_world(),
        width: g.width,
        height: g.height,
        clip,
        opacity: (source.opacity as f32) * outcome.alpha,
        paint: LayerPaint::Solid(Color::TRANSPARENT),
    };
    match (&layer, outcome.blur_radius) {
        (Layer::Empty, _) => return Ok(()),
        (Layer::Solid(color), None) => draw.paint = LayerPaint::Solid(*color),
        (Layer::Pixels(buf), None) => draw.paint = LayerPaint::Pixels(buf),
        (Layer::Solid(color), Some(radius)) => {
            let mut fill = PixelBuffer::new(cw, ch);
            fill.fill(color.to_premul());
            blurred = blur_layer(&fill, radius)?;
            blurred.spread(&mut draw);
            draw.paint = LayerPaint::Pixels(&blurred.pixels);
        }
        (Layer::Pixels(buf), Some(radius)) => {
            blurred = blur_layer(buf, radius)?;
            blurred.spread(&mut draw);
            draw.paint = LayerPaint::Pixels(&blurred.pixels);
        }
    }
    painter.draw_layer(&draw)
}

/// A blurred layer with a transparent margin of `pad` pixels on every side.
struct BlurredLayer {
    pixels: PixelBuffer,
    pad: u32,
}

impl BlurredLayer {
    /// Grow the draw box by the margin so the blur bleeds past the source bounds.
    fn spread(&self, draw: &mut LayerDraw<'_>) {
        let (iw, ih) = (
            self.pixels.width() - 2 * self.pad,
            self.pixels.height() - 2 * self.pad,
        );
        let px = f64::from(self.pad) * draw.width / f64::from(iw.max(1));
        let py = f64::from(self.pad) * draw.height / f64::from(ih.max(1));
        draw.transform = draw.transform * Affine::translate(Vec2::new(-px, -py));
        draw.width += 2.0 * px;
        draw.height += 2.0 * py;
        draw.clip = draw.clip.map(|r| r + Vec2::new(px, py));
    }
}

fn blur_layer(buf: &PixelBuffer, radius: f32) -> OnAirResult<BlurredLayer> {
    let pad = kernel_radius_for(radius);
    let mut padded = PixelBuffer::new(buf.width() + 2 * pad, buf.height() + 2 * pad);
    padded.draw_at(buf, i64::from(pad), i64::from(pad));
    let data = blur_rgba8_premul(
        padded.data(),
        padded.width(),
        padded.height(),
        pad,
        radius,
    )?;
    Ok(BlurredLayer {
        pixels: PixelBuffer::from_premul(padded.width(), padded.height(), data)?,
        pad,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;

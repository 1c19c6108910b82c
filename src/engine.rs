//! Stateful terrain engine: parameters, cave list, canvas and change hook.
//!
//! Every setter ignores writes of the current value. An accepted write
//! applies the value, keeps the cave list consistent with it, then fires the
//! update hook exactly once. Rendering never touches parameters or caves.

use std::time::Instant;

use tracing::{debug, trace};

use crate::canvas::Canvas;
use crate::cave::{Cave, CaveSet};
use crate::config::Params;
use crate::error::EngineError;
use crate::render::render_terrain;
use crate::rng::Rng;

type UpdateHook = Box<dyn FnMut()>;

/// Equality used to suppress redundant writes. NaN counts as equal to NaN so
/// repeating a NaN write stays silent.
trait SameValue: Copy {
    fn same_value(self, other: Self) -> bool;
}

impl SameValue for usize {
    fn same_value(self, other: Self) -> bool {
        self == other
    }
}

impl SameValue for u32 {
    fn same_value(self, other: Self) -> bool {
        self == other
    }
}

impl SameValue for f32 {
    fn same_value(self, other: Self) -> bool {
        self == other || (self.is_nan() && other.is_nan())
    }
}

pub struct Engine {
    /// `selected_cave` is never read here; the live selection is the cave set's.
    params: Params,
    caves: CaveSet,
    canvas: Canvas,
    on_update: Option<UpdateHook>,
}

/// Setter for a plain parameter: compare, store, log, notify.
macro_rules! plain_setter {
    ($(#[$doc:meta])* $set:ident, $get:ident, $field:ident: $ty:ty) => {
        $(#[$doc])*
        pub fn $set(&mut self, value: $ty) {
            if self.params.$field.same_value(value) {
                return;
            }
            self.params.$field = value;
            trace!(param = stringify!($field), ?value, "parameter changed");
            self.notify();
        }

        pub fn $get(&self) -> $ty {
            self.params.$field
        }
    };
}

impl Engine {
    /// Build an engine for a `width x height` canvas with an entropy-seeded
    /// cave RNG.
    pub fn new(width: u32, height: u32) -> Result<Self, EngineError> {
        Self::with_rng(width, height, Rng::from_entropy())
    }

    /// Same as [`Engine::new`] but cave placement replays from `seed`.
    pub fn with_seed(width: u32, height: u32, seed: u64) -> Result<Self, EngineError> {
        Self::with_rng(width, height, Rng::new(seed))
    }

    fn with_rng(width: u32, height: u32, rng: Rng) -> Result<Self, EngineError> {
        let canvas = Canvas::new(width, height)?;
        let mut engine = Self {
            params: Params::for_canvas(width, height),
            caves: CaveSet::new(width, height, rng),
            canvas,
            on_update: None,
        };
        engine.fill_caves_if_empty();
        debug!(width, height, base_radius = engine.params.base_radius, "engine created");
        Ok(engine)
    }

    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    /// Snapshot of every parameter, selection included.
    pub fn params(&self) -> Params {
        Params {
            selected_cave: self.caves.selected(),
            ..self.params.clone()
        }
    }

    pub fn caves(&self) -> &[Cave] {
        self.caves.caves()
    }

    /// Last rendered frame.
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Register the update sink, replacing any previous one.
    pub fn on_terrain_updated<F>(&mut self, callback: F)
    where
        F: FnMut() + 'static,
    {
        self.on_update = Some(Box::new(callback));
    }

    /// Restart the cave RNG. Existing caves are untouched.
    pub fn reseed(&mut self, seed: u64) {
        self.caves.reseed(seed);
    }

    fn notify(&mut self) {
        if let Some(cb) = self.on_update.as_mut() {
            cb();
        }
    }

    fn fill_caves_if_empty(&mut self) -> bool {
        self.params.caves_enabled && self.caves.fill_if_empty(self.params.cave_count)
    }

    plain_setter!(set_point_count, point_count, point_count: usize);
    plain_setter!(set_base_radius, base_radius, base_radius: u32);
    plain_setter!(set_horizontal_stretch, horizontal_stretch, horizontal_stretch: f32);
    plain_setter!(set_noise_frequency, noise_frequency, noise_frequency: f32);
    plain_setter!(set_noise_amplitude, noise_amplitude, noise_amplitude: f32);
    plain_setter!(set_blob_spacing, blob_spacing, blob_spacing: f32);
    plain_setter!(set_cave_scale, cave_scale, cave_scale: f32);
    plain_setter!(set_cave_noise_frequency, cave_noise_frequency, cave_noise_frequency: f32);
    plain_setter!(set_cave_noise_amplitude, cave_noise_amplitude, cave_noise_amplitude: f32);
    plain_setter!(set_cave_point_count, cave_point_count, cave_point_count: usize);

    pub fn blob_count(&self) -> i32 {
        self.params.blob_count
    }

    /// Also populates caves if they are enabled and the list is empty.
    pub fn set_blob_count(&mut self, count: i32) {
        if self.params.blob_count == count {
            return;
        }
        self.params.blob_count = count;
        trace!(param = "blob_count", value = count, "parameter changed");
        self.fill_caves_if_empty();
        self.notify();
    }

    pub fn caves_enabled(&self) -> bool {
        self.params.caves_enabled
    }

    /// Disabling empties the list. Enabling repopulates an empty list from
    /// the current cave count.
    pub fn set_caves_enabled(&mut self, enabled: bool) {
        if self.params.caves_enabled == enabled {
            return;
        }
        self.params.caves_enabled = enabled;
        if enabled {
            self.fill_caves_if_empty();
        } else {
            self.caves.clear();
        }
        debug!(enabled, caves = self.caves.len(), "caves toggled");
        self.notify();
    }

    pub fn cave_count(&self) -> usize {
        self.params.cave_count
    }

    /// Any change rebuilds the whole list with fresh random caves and clamps
    /// the selection to the new length.
    pub fn set_cave_count(&mut self, count: usize) {
        if self.params.cave_count == count {
            return;
        }
        self.params.cave_count = count;
        self.caves.regenerate(count);
        self.notify();
    }

    pub fn selected_cave_index(&self) -> Option<usize> {
        self.caves.selected()
    }

    /// Accepts `None` or an index into the current list; anything else is
    /// ignored without notification.
    pub fn set_selected_cave_index(&mut self, index: Option<usize>) {
        if !self.caves.select(index) {
            return;
        }
        trace!(selected = ?index, "cave selected");
        self.notify();
    }

    /// Copy of the selected cave, or a zeroed cave when nothing is selected.
    pub fn selected_cave_properties(&self) -> Cave {
        self.caves.selected_cave().copied().unwrap_or_default()
    }

    /// Overwrite the selected cave's pose. No-op without a selection.
    pub fn update_selected_cave(&mut self, scale_variant: f32, rotation: f32, noise_offset: f32) {
        if self.caves.update_selected(scale_variant, rotation, noise_offset) {
            self.notify();
        }
    }

    /// Populate the cave list from the cave count, but only when caves are
    /// enabled and the list is empty. An existing list is never refreshed.
    pub fn regenerate_cave_positions(&mut self) {
        if self.fill_caves_if_empty() {
            self.notify();
        }
    }

    /// New random position for the selected cave; the rest of its pose stays.
    pub fn regenerate_selected_cave_position(&mut self) {
        if self.caves.regenerate_selected_position() {
            self.notify();
        }
    }

    /// Route every field of `params` through its setter. Geometry goes first,
    /// then cave enablement, cave count and finally the selection.
    pub fn apply(&mut self, params: &Params) {
        self.set_point_count(params.point_count);
        self.set_base_radius(params.base_radius);
        self.set_horizontal_stretch(params.horizontal_stretch);
        self.set_noise_frequency(params.noise_frequency);
        self.set_noise_amplitude(params.noise_amplitude);
        self.set_blob_count(params.blob_count);
        self.set_blob_spacing(params.blob_spacing);
        self.set_cave_scale(params.cave_scale);
        self.set_cave_noise_frequency(params.cave_noise_frequency);
        self.set_cave_noise_amplitude(params.cave_noise_amplitude);
        self.set_cave_point_count(params.cave_point_count);
        self.set_caves_enabled(params.caves_enabled);
        self.set_cave_count(params.cave_count);
        self.set_selected_cave_index(params.selected_cave);
    }

    /// Redraw the canvas from the current parameters and caves.
    pub fn generate_terrain(&mut self) -> &Canvas {
        let t = Instant::now();
        render_terrain(&mut self.canvas, &self.params, self.caves.caves());
        debug!(
            ms = t.elapsed().as_secs_f64() * 1000.0,
            blobs = self.params.blob_count.max(1),
            caves = self.caves.len(),
            "terrain rendered"
        );
        &self.canvas
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("params", &self.params())
            .field("caves", &self.caves)
            .field("dimensions", &self.canvas.dimensions())
            .field("has_hook", &self.on_update.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counted(engine: &mut Engine) -> Rc<Cell<usize>> {
        let hits = Rc::new(Cell::new(0));
        let sink = hits.clone();
        engine.on_terrain_updated(move || sink.set(sink.get() + 1));
        hits
    }

    fn engine() -> Engine {
        Engine::with_seed(800, 600, 1234).unwrap()
    }

    #[test]
    fn test_construction_defaults() {
        let e = engine();
        assert_eq!((e.width(), e.height()), (800, 600));
        assert_eq!(e.base_radius(), 200);
        assert!(e.caves().is_empty());
        assert_eq!(e.selected_cave_index(), None);
        assert!(e.caves_enabled());
        assert!(e.canvas().pixels().iter().all(|v| *v == 0));
    }

    #[test]
    fn test_construction_rejects_empty_canvas() {
        assert!(matches!(
            Engine::new(0, 600),
            Err(EngineError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_equal_writes_do_not_notify() {
        let mut e = engine();
        let hits = counted(&mut e);
        e.set_point_count(20);
        e.set_base_radius(200);
        e.set_horizontal_stretch(1.0);
        e.set_noise_frequency(1.0);
        e.set_noise_amplitude(1.0);
        e.set_blob_count(1);
        e.set_blob_spacing(1.5);
        e.set_caves_enabled(true);
        e.set_cave_scale(0.3);
        e.set_cave_noise_frequency(2.0);
        e.set_cave_noise_amplitude(1.0);
        e.set_cave_count(0);
        e.set_cave_point_count(20);
        e.set_selected_cave_index(None);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_each_change_notifies_once() {
        let mut e = engine();
        let hits = counted(&mut e);
        let steps: Vec<Box<dyn Fn(&mut Engine)>> = vec![
            Box::new(|e: &mut Engine| e.set_point_count(33)),
            Box::new(|e: &mut Engine| e.set_base_radius(120)),
            Box::new(|e: &mut Engine| e.set_horizontal_stretch(2.0)),
            Box::new(|e: &mut Engine| e.set_noise_frequency(0.5)),
            Box::new(|e: &mut Engine| e.set_noise_amplitude(0.2)),
            Box::new(|e: &mut Engine| e.set_blob_count(4)),
            Box::new(|e: &mut Engine| e.set_blob_spacing(2.0)),
            Box::new(|e: &mut Engine| e.set_cave_scale(0.5)),
            Box::new(|e: &mut Engine| e.set_cave_noise_frequency(1.0)),
            Box::new(|e: &mut Engine| e.set_cave_noise_amplitude(0.5)),
            Box::new(|e: &mut Engine| e.set_cave_count(3)),
            Box::new(|e: &mut Engine| e.set_cave_point_count(12)),
            Box::new(|e: &mut Engine| e.set_selected_cave_index(Some(2))),
            Box::new(|e: &mut Engine| e.set_caves_enabled(false)),
        ];
        for (i, step) in steps.iter().enumerate() {
            step(&mut e);
            assert_eq!(hits.get(), i + 1, "step {i} should notify exactly once");
        }
    }

    #[test]
    fn test_repeated_nan_write_is_silent() {
        let mut e = engine();
        let hits = counted(&mut e);
        e.set_noise_amplitude(f32::NAN);
        e.set_noise_amplitude(f32::NAN);
        e.set_cave_scale(f32::NAN);
        e.set_cave_scale(f32::NAN);
        assert_eq!(hits.get(), 2);
        assert!(e.noise_amplitude().is_nan());
        e.set_noise_amplitude(0.5);
        assert_eq!(hits.get(), 3);
    }

    #[test]
    fn test_params_report_live_selection() {
        let mut e = engine();
        e.set_cave_count(3);
        e.set_selected_cave_index(Some(2));
        assert_eq!(e.params().selected_cave, Some(2));
        e.set_caves_enabled(false);
        assert_eq!(e.params().selected_cave, None);
        e.set_caves_enabled(true);
        e.set_selected_cave_index(Some(0));
        assert_eq!(e.params().selected_cave, Some(0));
    }

    #[test]
    fn test_invalid_selection_is_silent() {
        let mut e = engine();
        let hits = counted(&mut e);
        e.set_selected_cave_index(Some(0));
        assert_eq!(e.selected_cave_index(), None);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_cave_count_rebuilds_and_clamps_selection() {
        let mut e = engine();
        e.set_cave_count(5);
        assert_eq!(e.caves().len(), 5);
        e.set_selected_cave_index(Some(4));
        e.set_cave_count(2);
        assert_eq!(e.caves().len(), 2);
        assert_eq!(e.selected_cave_index(), Some(1));
        assert_eq!(e.params().selected_cave, Some(1));
        e.set_cave_count(0);
        assert!(e.caves().is_empty());
        assert_eq!(e.selected_cave_index(), None);
    }

    #[test]
    fn test_unrelated_writes_preserve_caves() {
        let mut e = engine();
        e.set_cave_count(4);
        let before = e.caves().to_vec();
        e.set_point_count(50);
        e.set_base_radius(90);
        e.set_horizontal_stretch(2.5);
        e.set_noise_frequency(3.0);
        e.set_noise_amplitude(0.4);
        e.set_blob_count(3);
        e.set_blob_spacing(0.7);
        e.set_cave_scale(0.9);
        e.set_cave_noise_frequency(4.0);
        e.set_cave_noise_amplitude(1.7);
        e.set_cave_point_count(7);
        e.set_selected_cave_index(Some(3));
        e.set_selected_cave_index(None);
        e.regenerate_cave_positions();
        e.generate_terrain();
        assert_eq!(e.caves(), before.as_slice());
    }

    #[test]
    fn test_cave_count_while_disabled() {
        let mut e = engine();
        e.set_caves_enabled(false);
        e.set_cave_count(3);
        // The count rebuilds the list even while disabled; rendering is gated.
        assert_eq!(e.caves().len(), 3);
        let with_list = e.generate_terrain().pixels().to_vec();
        e.set_cave_count(0);
        assert_eq!(e.generate_terrain().pixels(), with_list.as_slice());
    }

    #[test]
    fn test_minimum_blob_count_renders_one_blob() {
        let mut e = engine();
        e.set_blob_count(i32::MIN);
        assert_eq!(e.blob_count(), i32::MIN);
        let canvas = e.generate_terrain();
        assert_eq!(canvas.pixel(400, 300)[3], 255);
        assert_eq!(canvas.pixel(0, 0)[3], 0);
    }

    #[test]
    fn test_blob_count_keeps_disabled_list_empty() {
        let mut e = engine();
        e.set_cave_count(3);
        e.set_caves_enabled(false);
        assert_eq!(e.cave_count(), 3);
        assert!(e.caves().is_empty());

        let hits = counted(&mut e);
        e.set_blob_count(2);
        assert!(e.caves().is_empty(), "disabled caves stay empty");
        e.set_caves_enabled(true);
        assert_eq!(e.caves().len(), 3);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_regenerate_cave_positions_only_fills_empty() {
        let mut e = engine();
        let hits = counted(&mut e);
        e.regenerate_cave_positions();
        assert_eq!(hits.get(), 0, "nothing to populate with a zero count");

        e.set_cave_count(2);
        let before = e.caves().to_vec();
        e.regenerate_cave_positions();
        assert_eq!(e.caves(), before.as_slice());
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_disable_enable_round_trip() {
        let mut e = engine();
        e.set_cave_count(3);
        e.set_selected_cave_index(Some(1));
        e.set_caves_enabled(false);
        assert!(e.caves().is_empty());
        assert_eq!(e.selected_cave_index(), None);
        e.set_caves_enabled(true);
        assert_eq!(e.caves().len(), 3);
    }

    #[test]
    fn test_selected_cave_properties() {
        let mut e = engine();
        assert_eq!(e.selected_cave_properties(), Cave::default());
        e.set_cave_count(2);
        e.set_selected_cave_index(Some(1));
        assert_eq!(e.selected_cave_properties(), e.caves()[1]);
    }

    #[test]
    fn test_update_and_move_selected_cave() {
        let mut e = engine();
        e.set_cave_count(2);
        let hits = counted(&mut e);
        e.update_selected_cave(1.0, 1.0, 1.0);
        e.regenerate_selected_cave_position();
        assert_eq!(hits.get(), 0, "no selection means no-op");

        e.set_selected_cave_index(Some(0));
        let other = e.caves()[1];
        e.update_selected_cave(1.5, 0.25, 7.0);
        let pose = e.caves()[0];
        assert_eq!((pose.scale_variant, pose.rotation, pose.noise_offset), (1.5, 0.25, 7.0));
        e.regenerate_selected_cave_position();
        let moved = e.caves()[0];
        assert_eq!((moved.scale_variant, moved.rotation, moved.noise_offset), (1.5, 0.25, 7.0));
        assert_eq!(e.caves()[1], other);
        assert_eq!(hits.get(), 3);
    }

    #[test]
    fn test_hook_is_replaced() {
        let mut e = engine();
        let first = counted(&mut e);
        let second = counted(&mut e);
        e.set_point_count(40);
        assert_eq!(first.get(), 0);
        assert_eq!(second.get(), 1);
    }

    #[test]
    fn test_apply_routes_through_setters() {
        let mut e = engine();
        let hits = counted(&mut e);
        let mut target = e.params();
        target.blob_count = 2;
        target.cave_count = 3;
        target.selected_cave = Some(2);
        e.apply(&target);
        assert_eq!(e.params(), target);
        assert_eq!(e.caves().len(), 3);
        assert_eq!(hits.get(), 3);

        e.apply(&target);
        assert_eq!(hits.get(), 3, "reapplying the same params is silent");
    }

    #[test]
    fn test_render_is_pure() {
        let mut e = engine();
        e.set_cave_count(3);
        e.set_blob_count(2);
        let first = e.generate_terrain().pixels().to_vec();
        let params = e.params();
        let caves = e.caves().to_vec();
        let second = e.generate_terrain().pixels().to_vec();
        assert_eq!(first, second);
        assert_eq!(e.params(), params);
        assert_eq!(e.caves(), caves.as_slice());
    }
}

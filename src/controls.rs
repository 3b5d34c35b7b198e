//! Controls bound to bridge entities, and what they display.
//!
//! A control subscribes to one entity id. When the coalescer flushes, every
//! control whose entity (or, for combined group controls, any member of
//! whose entity) was touched gets a fresh [`ControlView`] through the
//! [`ControlSink`].

use std::collections::{BTreeMap, BTreeSet};

use hue::api::Category;
use hue::colors::Rgb;
use hue::state::ItemState;
use hue::store::StateStore;

/// Swatch color shown for anything that is off
pub const OFF_COLOR: Rgb = Rgb::new(0x2e, 0x2e, 0x2e);

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ControlId(u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    pub entity: String,
    pub category: Category,
    /// Display the combined state of the group's member lights
    pub combined: bool,
    /// Switch shows on only when every member light is on
    pub combined_all: bool,
}

impl Binding {
    pub fn light(id: impl Into<String>) -> Self {
        Self {
            entity: id.into(),
            category: Category::Light,
            combined: false,
            combined_all: false,
        }
    }

    pub fn group(id: impl Into<String>) -> Self {
        Self {
            entity: id.into(),
            category: Category::Group,
            combined: true,
            combined_all: false,
        }
    }

    pub fn group_all(id: impl Into<String>) -> Self {
        Self {
            combined_all: true,
            ..Self::group(id)
        }
    }

    pub fn scene(id: impl Into<String>) -> Self {
        Self {
            entity: id.into(),
            category: Category::Scene,
            combined: false,
            combined_all: false,
        }
    }

    /// Whether a flush of `pending` ids concerns this control
    fn affected_by(&self, pending: &BTreeSet<String>, store: &StateStore) -> bool {
        if pending.contains(&self.entity) {
            return true;
        }

        self.combined
            && store
                .get(self.category, &self.entity)
                .is_some_and(|state| state.services.keys().any(|rid| pending.contains(rid)))
    }
}

/// Display-ready projection of an entity state
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ControlView {
    pub label: String,
    pub switch: Option<bool>,
    pub slider: Option<f64>,
    pub swatch: Option<Rgb>,
    pub gradient: Vec<Rgb>,
}

impl ControlView {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Render `state`. `all_on` overrides the switch position for controls
    /// that show "all lights on".
    #[must_use]
    pub fn render(state: &ItemState, all_on: Option<bool>) -> Self {
        if state.dummy {
            return Self::empty();
        }

        let on = state.has_on && state.on;

        let swatch = if on && state.has_color {
            state.color
        } else if on && state.has_mirek {
            state.mirek_color
        } else {
            OFF_COLOR
        };

        let gradient = if state.has_gradient && state.gradient_points_capable > 0 {
            if on && !state.gradient_points.is_empty() {
                state.gradient_points.clone()
            } else {
                vec![OFF_COLOR; state.gradient_points_capable as usize]
            }
        } else {
            vec![]
        };

        Self {
            label: state.name.clone(),
            switch: state.has_on.then(|| all_on.unwrap_or(state.on)),
            slider: state
                .has_dimming
                .then_some(if on { state.brightness } else { 0.0 }),
            swatch: Some(swatch),
            gradient,
        }
    }

    /// One-line text rendering: switch, slider and swatch
    #[must_use]
    pub fn summary(&self) -> String {
        let switch = match self.switch {
            Some(true) => "on",
            Some(false) => "off",
            None => "-",
        };
        let slider = self
            .slider
            .map_or_else(|| String::from("-"), |bri| format!("{bri:.0}%"));
        let swatch = self.swatch.map_or_else(|| String::from("-"), Rgb::to_hex);

        format!("{switch:<3} {slider:>4} {swatch}")
    }
}

pub trait ControlSink {
    fn refresh(&mut self, control: ControlId, view: &ControlView);
}

impl<F: FnMut(ControlId, &ControlView)> ControlSink for F {
    fn refresh(&mut self, control: ControlId, view: &ControlView) {
        self(control, view);
    }
}

#[derive(Debug, Default)]
pub struct Controls {
    next_id: u64,
    bindings: BTreeMap<ControlId, Binding>,
}

impl Controls {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, binding: Binding) -> ControlId {
        let id = ControlId(self.next_id);
        self.next_id += 1;
        self.bindings.insert(id, binding);
        id
    }

    pub fn unregister(&mut self, id: ControlId) -> Option<Binding> {
        self.bindings.remove(&id)
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    #[must_use]
    pub fn get(&self, id: ControlId) -> Option<&Binding> {
        self.bindings.get(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bind one control per group and light in `store`.
    ///
    /// The bridge home shows whether all lights are on; rooms and zones
    /// show their combined state.
    pub fn bind_store(&mut self, store: &StateStore) {
        if let Some(home) = store.bridge_home_id() {
            self.register(Binding::group_all(home));
        }
        for group in store.rooms_and_zones() {
            self.register(Binding::group(group.id.as_str()));
        }
        for light in store.lights() {
            self.register(Binding::light(light.id.as_str()));
        }
    }

    /// Current view for a binding, or `None` if its entity is unknown
    #[must_use]
    pub fn view(binding: &Binding, store: &StateStore) -> Option<ControlView> {
        let state = if binding.combined {
            store.display_state(binding.category, &binding.entity)?
        } else {
            store.get(binding.category, &binding.entity)?.clone()
        };

        let all_on = binding.combined_all.then(|| {
            store
                .group(&binding.entity)
                .is_some_and(|group| store.all_lights_on(group))
        });

        Some(ControlView::render(&state, all_on))
    }

    /// Refresh every control affected by `pending`. Returns the number of
    /// controls refreshed.
    pub fn flush(
        &self,
        pending: &BTreeSet<String>,
        store: &StateStore,
        sink: &mut impl ControlSink,
    ) -> usize {
        self.refresh_where(store, sink, |binding| binding.affected_by(pending, store))
    }

    pub fn refresh_all(&self, store: &StateStore, sink: &mut impl ControlSink) -> usize {
        self.refresh_where(store, sink, |_| true)
    }

    fn refresh_where(
        &self,
        store: &StateStore,
        sink: &mut impl ControlSink,
        filter: impl Fn(&Binding) -> bool,
    ) -> usize {
        let mut count = 0;
        for (id, binding) in &self.bindings {
            if !filter(binding) {
                continue;
            }
            if let Some(view) = Self::view(binding, store) {
                sink.refresh(*id, &view);
                count += 1;
            }
        }
        count
    }
}

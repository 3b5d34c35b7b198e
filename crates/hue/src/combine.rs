//! Aggregate state of several lights shown through a single control.
//!
//! [`combine`] merges two states into one. Groups are folded member by
//! member, with the running aggregate passed as `base`, so the identity of
//! the group survives the fold while the light values accumulate.

use crate::colors::mirek_to_rgb;
use crate::state::ItemState;

fn mean(a: f64, b: f64) -> f64 {
    (a + b) / 2.0
}

/// Pick the value of whichever side qualifies, averaging when both do.
fn resolve(base: Option<f64>, joiner: Option<f64>) -> f64 {
    match (base, joiner) {
        (Some(a), Some(b)) => mean(a, b),
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => 0.0,
    }
}

/* Zero brightness and zero mirek are "not reported", never authoritative */

fn dimming_of(state: &ItemState) -> Option<f64> {
    (state.on && state.has_dimming && state.brightness != 0.0).then_some(state.brightness)
}

fn mirek_of(state: &ItemState) -> Option<f64> {
    (state.on && state.has_mirek && state.mirek_temperature != 0.0)
        .then_some(state.mirek_temperature)
}

const fn has_color(state: &ItemState) -> bool {
    state.on && state.has_color && !state.color.is_black()
}

const fn has_mirek_color(state: &ItemState) -> bool {
    state.on && state.has_mirek && !state.mirek_color.is_black()
}

/// Combine two states into the state of both treated as one unit.
#[must_use]
#[allow(clippy::similar_names)]
pub fn combine(base: &ItemState, joiner: &ItemState) -> ItemState {
    let mut state = ItemState {
        id: base.id.clone(),
        rtype: base.rtype,
        name: base.name.clone(),
        archetype: base.archetype.clone(),
        ..ItemState::default()
    };

    state.has_on = base.has_on || joiner.has_on;
    state.on = base.on || joiner.on;

    if !state.has_on {
        return state;
    }

    state.has_dimming = base.has_dimming || joiner.has_dimming;
    state.brightness = resolve(dimming_of(base), dimming_of(joiner));

    state.has_color = base.has_color || joiner.has_color;
    state.color = match (has_color(base), has_color(joiner)) {
        (true, true) => base.color.mix(joiner.color),
        (true, false) => base.color,
        (false, true) => joiner.color,
        (false, false) => state.color,
    };

    state.has_mirek = base.has_mirek || joiner.has_mirek;
    state.mirek_temperature = resolve(mirek_of(base), mirek_of(joiner));
    if state.mirek_temperature != 0.0 {
        state.mirek_color = mirek_to_rgb(state.mirek_temperature);
    }

    let base_schema = base.on && base.has_mirek;
    let joiner_schema = joiner.on && joiner.has_mirek;
    (state.mirek_min, state.mirek_max) = match (base_schema, joiner_schema) {
        (true, true) => (
            base.mirek_min.min(joiner.mirek_min),
            base.mirek_max.max(joiner.mirek_max),
        ),
        (true, false) => (base.mirek_min, base.mirek_max),
        (false, true) => (joiner.mirek_min, joiner.mirek_max),
        (false, false) => (0.0, 0.0),
    };

    reconcile_color_models(&mut state, base, joiner);

    state
}

/// Fill in the swatch color when members express color through different
/// models (xy color on one, color temperature on the other).
///
/// The order of the rules matters: later rules override earlier ones.
fn reconcile_color_models(state: &mut ItemState, base: &ItemState, joiner: &ItemState) {
    if !base.has_color && !joiner.has_color {
        let color = match (has_mirek_color(base), has_mirek_color(joiner)) {
            (true, true) => Some(base.mirek_color.mix(joiner.mirek_color)),
            (true, false) => Some(base.mirek_color),
            (false, true) => Some(joiner.mirek_color),
            (false, false) => None,
        };
        if let Some(color) = color {
            state.color = color;
            state.has_color = true;
        }
    }

    if base.on
        && base.has_color
        && joiner.on
        && !joiner.has_color
        && joiner.has_mirek
        && !base.color.is_black()
        && !joiner.mirek_color.is_black()
    {
        state.color = base.color.mix(joiner.mirek_color);
        state.has_color = true;
    }

    if joiner.on
        && joiner.has_color
        && base.on
        && !base.has_color
        && base.has_mirek
        && !base.mirek_color.is_black()
        && !joiner.color.is_black()
    {
        state.color = joiner.color.mix(base.mirek_color);
        state.has_color = true;
    }

    if base.on && !joiner.on && base.has_mirek && !base.has_color && !base.mirek_color.is_black() {
        state.color = base.mirek_color;
        state.has_color = true;
    }

    if joiner.on && !base.on && joiner.has_mirek && !joiner.has_color && !joiner.mirek_color.is_black()
    {
        state.color = joiner.mirek_color;
        state.has_color = true;
    }
}

/// Fold the states of `members` into `group`.
///
/// The result keeps the membership of the group itself, not whatever the
/// fold accumulated.
pub fn combine_all<'a>(group: &ItemState, members: impl IntoIterator<Item = &'a ItemState>) -> ItemState {
    let mut state = members
        .into_iter()
        .fold(group.clone(), |acc, member| combine(&acc, member));

    state.services.clone_from(&group.services);
    state.grouped_light_rid.clone_from(&group.grouped_light_rid);
    state
}

#[cfg(test)]
mod tests {
    use crate::api::RType;
    use crate::colors::{Rgb, mirek_to_rgb};
    use crate::combine::{combine, combine_all};
    use crate::state::ItemState;

    fn light(on: bool) -> ItemState {
        ItemState {
            id: String::from("light"),
            rtype: RType::Light,
            has_on: true,
            on,
            ..ItemState::default()
        }
    }

    fn dimmed(on: bool, brightness: f64) -> ItemState {
        ItemState {
            has_dimming: true,
            brightness,
            ..light(on)
        }
    }

    fn colored(on: bool, color: Rgb) -> ItemState {
        ItemState {
            has_color: true,
            color,
            ..light(on)
        }
    }

    fn warm(on: bool, mirek: f64) -> ItemState {
        ItemState {
            has_mirek: true,
            mirek_temperature: mirek,
            mirek_min: 153.0,
            mirek_max: 454.0,
            mirek_color: mirek_to_rgb(mirek),
            ..light(on)
        }
    }

    fn room() -> ItemState {
        ItemState {
            id: String::from("room"),
            rtype: RType::Room,
            name: String::from("Kitchen"),
            archetype: String::from("kitchen"),
            ..ItemState::default()
        }
    }

    const RED: Rgb = Rgb::new(200, 0, 0);
    const BLUE: Rgb = Rgb::new(0, 0, 100);

    #[test]
    fn identity_from_base() {
        let state = combine(&room(), &light(true));
        assert_eq!(state.id, "room");
        assert_eq!(state.rtype, RType::Room);
        assert_eq!(state.name, "Kitchen");
        assert_eq!(state.archetype, "kitchen");
    }

    #[test]
    fn without_on_nothing_combines() {
        let a = ItemState {
            has_dimming: true,
            brightness: 40.0,
            ..room()
        };
        let state = combine(&a, &a);
        assert!(!state.has_on);
        assert!(!state.has_dimming);
        assert_eq!(state.brightness, 0.0);
    }

    #[test]
    fn any_on() {
        assert!(combine(&light(true), &light(false)).on);
        assert!(combine(&light(false), &light(true)).on);
        assert!(!combine(&light(false), &light(false)).on);
        assert!(combine(&light(false), &light(false)).has_on);
    }

    #[test]
    fn brightness_zero_is_not_authoritative() {
        let state = combine(&dimmed(true, 0.0), &dimmed(true, 80.0));
        assert!(state.has_dimming);
        assert_eq!(state.brightness, 80.0);
    }

    #[test]
    fn brightness_average_and_single() {
        assert_eq!(combine(&dimmed(true, 20.0), &dimmed(true, 80.0)).brightness, 50.0);
        assert_eq!(combine(&dimmed(true, 20.0), &dimmed(false, 80.0)).brightness, 20.0);
        assert_eq!(combine(&dimmed(false, 20.0), &dimmed(true, 80.0)).brightness, 80.0);
        assert_eq!(combine(&dimmed(false, 20.0), &dimmed(false, 80.0)).brightness, 0.0);
    }

    #[test]
    fn color_qualification() {
        assert_eq!(combine(&colored(true, RED), &colored(true, BLUE)).color, Rgb::new(100, 0, 50));
        assert_eq!(combine(&colored(true, RED), &colored(false, BLUE)).color, RED);
        assert_eq!(combine(&colored(true, Rgb::WHITE), &colored(true, BLUE)).color, BLUE);
    }

    #[test]
    fn mirek_value_and_bounds() {
        let a = ItemState {
            mirek_min: 200.0,
            mirek_max: 400.0,
            ..warm(true, 200.0)
        };
        let b = ItemState {
            mirek_min: 153.0,
            mirek_max: 300.0,
            ..warm(true, 300.0)
        };

        let state = combine(&a, &b);
        assert!(state.has_mirek);
        assert_eq!(state.mirek_temperature, 250.0);
        assert_eq!(state.mirek_min, 153.0);
        assert_eq!(state.mirek_max, 400.0);
        assert_eq!(state.mirek_color, mirek_to_rgb(250.0));

        let state = combine(&a, &warm(false, 300.0));
        assert_eq!(state.mirek_temperature, 200.0);
        assert_eq!((state.mirek_min, state.mirek_max), (200.0, 400.0));

        let state = combine(&warm(true, 0.0), &b);
        assert_eq!(state.mirek_temperature, 300.0);
        assert_eq!((state.mirek_min, state.mirek_max), (153.0, 454.0));
    }

    #[test]
    fn mirek_only_members_get_a_swatch() {
        let state = combine(&warm(true, 153.0), &warm(true, 500.0));
        assert!(state.has_color);
        assert_eq!(state.color, mirek_to_rgb(153.0).mix(mirek_to_rgb(500.0)));

        let state = combine(&warm(true, 500.0), &warm(false, 153.0));
        assert!(state.has_color);
        assert_eq!(state.color, mirek_to_rgb(500.0));

        let state = combine(&warm(false, 500.0), &warm(true, 153.0));
        assert_eq!(state.color, mirek_to_rgb(153.0));
    }

    #[test]
    fn mixed_color_models_average() {
        let state = combine(&colored(true, RED), &warm(true, 500.0));
        assert!(state.has_color);
        assert_eq!(state.color, RED.mix(mirek_to_rgb(500.0)));

        let state = combine(&warm(true, 500.0), &colored(true, BLUE));
        assert_eq!(state.color, BLUE.mix(mirek_to_rgb(500.0)));
    }

    #[test]
    fn off_color_member_falls_back_to_own_mirek() {
        let state = combine(&warm(true, 500.0), &colored(false, BLUE));
        assert!(state.has_color);
        assert_eq!(state.color, mirek_to_rgb(500.0));
    }

    #[test]
    fn fold_keeps_group_membership() {
        let mut group = room();
        group.services.insert(String::from("l1"), RType::Light);
        group.services.insert(String::from("g1"), RType::GroupedLight);
        group.grouped_light_rid = Some(String::from("g1"));

        let members = [dimmed(true, 30.0), dimmed(false, 0.0)];
        let state = combine_all(&group, &members);

        assert_eq!(state.id, "room");
        assert!(state.on);
        assert_eq!(state.brightness, 30.0);
        assert_eq!(state.services, group.services);
        assert_eq!(state.grouped_light_rid.as_deref(), Some("g1"));
    }
}

//! Easing catalog: dotted names ("Family.Variant") to normalized-time curves.
//!
//! Polynomial curves delegate to the `keyframe` crate, the remaining
//! families are evaluated directly.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use keyframe::{ease, functions};

use crate::error::ViewpointError;

/// Name every lookup falls back to.
pub const DEFAULT_EASING: &str = "Linear.None";

/// Curve family (first half of the dotted name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EaseFamily {
    #[default]
    Linear,
    Quadratic,
    Cubic,
    Quartic,
    Quintic,
    Sinusoidal,
    Exponential,
    Circular,
}

/// Curve variant (second half of the dotted name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EaseVariant {
    /// Only valid for `Linear`
    #[default]
    None,
    /// Slow start, fast end
    In,
    /// Fast start, slow end
    Out,
    /// Slow start and end, fast middle
    InOut,
}

const FAMILIES: [(EaseFamily, &str); 8] = [
    (EaseFamily::Linear, "Linear"),
    (EaseFamily::Quadratic, "Quadratic"),
    (EaseFamily::Cubic, "Cubic"),
    (EaseFamily::Quartic, "Quartic"),
    (EaseFamily::Quintic, "Quintic"),
    (EaseFamily::Sinusoidal, "Sinusoidal"),
    (EaseFamily::Exponential, "Exponential"),
    (EaseFamily::Circular, "Circular"),
];

const VARIANTS: [(EaseVariant, &str); 4] = [
    (EaseVariant::None, "None"),
    (EaseVariant::In, "In"),
    (EaseVariant::Out, "Out"),
    (EaseVariant::InOut, "InOut"),
];

impl EaseFamily {
    fn name(self) -> &'static str {
        FAMILIES
            .iter()
            .find(|(family, _)| *family == self)
            .map(|(_, name)| *name)
            .unwrap_or("Linear")
    }

    fn accepts(self, variant: EaseVariant) -> bool {
        match self {
            EaseFamily::Linear => variant == EaseVariant::None,
            _ => variant != EaseVariant::None,
        }
    }
}

impl EaseVariant {
    fn name(self) -> &'static str {
        VARIANTS
            .iter()
            .find(|(variant, _)| *variant == self)
            .map(|(_, name)| *name)
            .unwrap_or("None")
    }
}

/// A resolved easing function.
///
/// Two names that resolve to the same curve compare equal, so
/// `resolve_easing("bogus") == resolve_easing("Linear.None")`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Easing {
    family: EaseFamily,
    variant: EaseVariant,
}

impl Easing {
    pub const LINEAR: Easing = Easing {
        family: EaseFamily::Linear,
        variant: EaseVariant::None,
    };

    /// Build an easing from its parts; `None` if the pair is not in the catalog.
    pub fn new(family: EaseFamily, variant: EaseVariant) -> Option<Self> {
        family.accepts(variant).then_some(Self { family, variant })
    }

    pub fn family(&self) -> EaseFamily {
        self.family
    }

    pub fn variant(&self) -> EaseVariant {
        self.variant
    }

    /// Canonical dotted name, e.g. `"Cubic.InOut"`.
    pub fn name(&self) -> String {
        format!("{}.{}", self.family.name(), self.variant.name())
    }

    /// Every entry of the catalog, in table order.
    pub fn catalog() -> Vec<Easing> {
        FAMILIES
            .iter()
            .flat_map(|(family, _)| {
                VARIANTS
                    .iter()
                    .filter_map(move |(variant, _)| Easing::new(*family, *variant))
            })
            .collect()
    }

    /// Remap normalized time. Input is clamped to `[0, 1]`.
    pub fn apply(&self, t: f32) -> f32 {
        let t = (t as f64).clamp(0.0, 1.0);
        let result = match (self.family, self.variant) {
            (EaseFamily::Linear, _) => ease(functions::Linear, 0.0, 1.0, t),
            (EaseFamily::Quadratic, EaseVariant::In) => ease(functions::EaseInQuad, 0.0, 1.0, t),
            (EaseFamily::Quadratic, EaseVariant::Out) => ease(functions::EaseOutQuad, 0.0, 1.0, t),
            (EaseFamily::Quadratic, _) => ease(functions::EaseInOutQuad, 0.0, 1.0, t),
            (EaseFamily::Cubic, EaseVariant::In) => ease(functions::EaseInCubic, 0.0, 1.0, t),
            (EaseFamily::Cubic, EaseVariant::Out) => ease(functions::EaseOutCubic, 0.0, 1.0, t),
            (EaseFamily::Cubic, _) => ease(functions::EaseInOutCubic, 0.0, 1.0, t),
            (EaseFamily::Quartic, EaseVariant::In) => ease(functions::EaseInQuart, 0.0, 1.0, t),
            (EaseFamily::Quartic, EaseVariant::Out) => ease(functions::EaseOutQuart, 0.0, 1.0, t),
            (EaseFamily::Quartic, _) => ease(functions::EaseInOutQuart, 0.0, 1.0, t),
            (EaseFamily::Quintic, EaseVariant::In) => ease(functions::EaseInQuint, 0.0, 1.0, t),
            (EaseFamily::Quintic, EaseVariant::Out) => ease(functions::EaseOutQuint, 0.0, 1.0, t),
            (EaseFamily::Quintic, _) => ease(functions::EaseInOutQuint, 0.0, 1.0, t),
            (EaseFamily::Sinusoidal, variant) => sinusoidal(variant, t),
            (EaseFamily::Exponential, variant) => exponential(variant, t),
            (EaseFamily::Circular, variant) => circular(variant, t),
        };
        result as f32
    }
}

fn sinusoidal(variant: EaseVariant, t: f64) -> f64 {
    match variant {
        EaseVariant::In => 1.0 - (t * PI / 2.0).cos(),
        EaseVariant::Out => (t * PI / 2.0).sin(),
        _ => 0.5 * (1.0 - (PI * t).cos()),
    }
}

fn exponential(variant: EaseVariant, t: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }
    match variant {
        EaseVariant::In => 1024f64.powf(t - 1.0),
        EaseVariant::Out => 1.0 - 2f64.powf(-10.0 * t),
        _ => {
            let t = t * 2.0;
            if t < 1.0 {
                0.5 * 1024f64.powf(t - 1.0)
            } else {
                0.5 * (2.0 - 2f64.powf(-10.0 * (t - 1.0)))
            }
        }
    }
}

fn circular(variant: EaseVariant, t: f64) -> f64 {
    match variant {
        EaseVariant::In => 1.0 - (1.0 - t * t).sqrt(),
        EaseVariant::Out => {
            let t = t - 1.0;
            (1.0 - t * t).sqrt()
        }
        _ => {
            let t = t * 2.0;
            if t < 1.0 {
                -0.5 * ((1.0 - t * t).sqrt() - 1.0)
            } else {
                let t = t - 2.0;
                0.5 * ((1.0 - t * t).sqrt() + 1.0)
            }
        }
    }
}

impl FromStr for Easing {
    type Err = ViewpointError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let invalid = || ViewpointError::InvalidEasingName(name.to_string());

        let mut parts = name.split('.');
        let (Some(family), Some(variant), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let family = FAMILIES
            .iter()
            .find(|(_, n)| *n == family)
            .map(|(f, _)| *f)
            .ok_or_else(invalid)?;
        let variant = VARIANTS
            .iter()
            .find(|(_, n)| *n == variant)
            .map(|(v, _)| *v)
            .ok_or_else(invalid)?;

        Easing::new(family, variant).ok_or_else(invalid)
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.family.name(), self.variant.name())
    }
}

/// Strict lookup: reports names that are not in the catalog.
pub fn try_resolve_easing(name: &str) -> Result<Easing, ViewpointError> {
    name.parse()
}

/// Lenient lookup: anything unknown becomes `Linear.None`.
pub fn resolve_easing(name: &str) -> Easing {
    match name.parse() {
        Ok(easing) => easing,
        Err(_) => {
            log::warn!("Unknown easing {:?}, falling back to {}", name, DEFAULT_EASING);
            Easing::LINEAR
        }
    }
}

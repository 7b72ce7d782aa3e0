//! Animation parameters
//!
//! The renderer is driven by a closed set of named, bounded scalars.
//! A [`ParameterMap`] always carries every one of them: there is no way to
//! build a partial map.

use std::ops::Index;

/// Animation parameter consumed by the avatar renderer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Parameter {
    /// Mouth openness [0.0 - 1.0]
    MouthOpenY = 0,
    /// Mouth form (-1.0 = open/round, 1.0 = closed/smile), derived from MouthOpenY
    MouthForm = 1,
    /// Left eye openness [0.0 - 1.0]
    EyeLOpen = 2,
    /// Right eye openness [0.0 - 1.0]
    EyeROpen = 3,
    /// Breathing cycle [0.0 - 1.0], time based
    Breath = 4,
}

impl Parameter {
    /// Number of parameters in the closed set
    pub const COUNT: usize = 5;

    /// All parameters, in map order
    pub const ALL: [Parameter; Parameter::COUNT] = [
        Parameter::MouthOpenY,
        Parameter::MouthForm,
        Parameter::EyeLOpen,
        Parameter::EyeROpen,
        Parameter::Breath,
    ];

    /// Parameters fed by sample producers through a channel.
    /// MOUTH_FORM and BREATH are derived inside the tick.
    pub const SAMPLED: [Parameter; 3] = [
        Parameter::MouthOpenY,
        Parameter::EyeLOpen,
        Parameter::EyeROpen,
    ];

    /// Is this parameter fed by a channel?
    pub fn is_sampled(self) -> bool {
        matches!(
            self,
            Parameter::MouthOpenY | Parameter::EyeLOpen | Parameter::EyeROpen
        )
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Renderer-facing identifier
    pub fn id(self) -> &'static str {
        match self {
            Parameter::MouthOpenY => "PARAM_MOUTH_OPEN_Y",
            Parameter::MouthForm => "PARAM_MOUTH_FORM",
            Parameter::EyeLOpen => "PARAM_EYE_L_OPEN",
            Parameter::EyeROpen => "PARAM_EYE_R_OPEN",
            Parameter::Breath => "PARAM_BREATH",
        }
    }

    /// Parse a renderer identifier
    pub fn from_id(id: &str) -> Option<Self> {
        Parameter::ALL.into_iter().find(|p| p.id() == id)
    }

    /// Documented value range (inclusive)
    pub fn bounds(self) -> (f32, f32) {
        match self {
            Parameter::MouthForm => (-1.0, 1.0),
            _ => (0.0, 1.0),
        }
    }

    /// Value used before any sample arrives in a session
    pub fn neutral(self) -> f32 {
        match self {
            Parameter::MouthOpenY => 0.0,
            // mouth_form(0.0)
            Parameter::MouthForm => 1.0,
            Parameter::EyeLOpen => 0.0,
            Parameter::EyeROpen => 0.0,
            // breath at t = 0
            Parameter::Breath => 0.5,
        }
    }

    /// Clamp a value into this parameter's range.
    /// Non-finite input collapses to the neutral value.
    pub fn clamp(self, value: f32) -> f32 {
        if !value.is_finite() {
            return self.neutral();
        }
        let (lo, hi) = self.bounds();
        value.clamp(lo, hi)
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// One complete set of parameter values, produced once per animation tick
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParameterMap {
    values: [f32; Parameter::COUNT],
}

impl ParameterMap {
    /// Map holding every parameter's neutral value
    pub fn neutral() -> Self {
        let mut values = [0.0; Parameter::COUNT];
        for p in Parameter::ALL {
            values[p.index()] = p.neutral();
        }
        ParameterMap { values }
    }

    #[inline]
    pub fn get(&self, parameter: Parameter) -> f32 {
        self.values[parameter.index()]
    }

    /// Set a value, clamped to the parameter's range
    pub fn set(&mut self, parameter: Parameter, value: f32) {
        self.values[parameter.index()] = parameter.clamp(value);
    }

    /// Builder-style [`ParameterMap::set`]
    pub fn with(mut self, parameter: Parameter, value: f32) -> Self {
        self.set(parameter, value);
        self
    }

    /// Always [`Parameter::COUNT`]
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = (Parameter, f32)> + '_ {
        Parameter::ALL.into_iter().map(move |p| (p, self.get(p)))
    }

    /// Every value inside its documented range
    pub fn in_range(&self) -> bool {
        self.iter().all(|(p, v)| {
            let (lo, hi) = p.bounds();
            v.is_finite() && v >= lo && v <= hi
        })
    }
}

impl Default for ParameterMap {
    fn default() -> Self {
        Self::neutral()
    }
}

impl Index<Parameter> for ParameterMap {
    type Output = f32;

    fn index(&self, parameter: Parameter) -> &f32 {
        &self.values[parameter.index()]
    }
}

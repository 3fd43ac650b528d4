//! Engine feature toggles.

/// Independently toggleable behaviors of the engine.
///
/// Each feature carries its own default; [`FeatureSet::default`] enables
/// exactly the features that default to on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineFeature {
    /// Report structural paths using the field's language-level identifier
    /// instead of its wire name.
    ReportFieldIdentPaths,
    /// Report a missing required field as a `NotNull` violation instead of
    /// a `Required` violation.
    ReportMissingRequiredAsNotNull,
    /// Report null input for a primitive-kind field as a `NotNull`
    /// violation instead of a `ValidInput` violation.
    ReportNullPrimitiveAsNotNull,
    /// Remap creator-argument violations onto property paths; disabled,
    /// they keep their constructor/parameter paths.
    MapCreatorViolationsToPropertyPaths,
    /// Run object-level constraints after a real object was produced and
    /// populated.
    ValidateObjectAfterConstruction,
}

impl EngineFeature {
    const ALL: [EngineFeature; 5] = [
        EngineFeature::ReportFieldIdentPaths,
        EngineFeature::ReportMissingRequiredAsNotNull,
        EngineFeature::ReportNullPrimitiveAsNotNull,
        EngineFeature::MapCreatorViolationsToPropertyPaths,
        EngineFeature::ValidateObjectAfterConstruction,
    ];

    /// Whether the feature is on in [`FeatureSet::default`].
    pub fn enabled_by_default(self) -> bool {
        match self {
            EngineFeature::ReportFieldIdentPaths => false,
            EngineFeature::ReportMissingRequiredAsNotNull => false,
            EngineFeature::ReportNullPrimitiveAsNotNull => true,
            EngineFeature::MapCreatorViolationsToPropertyPaths => true,
            EngineFeature::ValidateObjectAfterConstruction => true,
        }
    }

    fn mask(self) -> u8 {
        match self {
            EngineFeature::ReportFieldIdentPaths => 1 << 0,
            EngineFeature::ReportMissingRequiredAsNotNull => 1 << 1,
            EngineFeature::ReportNullPrimitiveAsNotNull => 1 << 2,
            EngineFeature::MapCreatorViolationsToPropertyPaths => 1 << 3,
            EngineFeature::ValidateObjectAfterConstruction => 1 << 4,
        }
    }
}

/// An immutable set of [`EngineFeature`] toggles.
///
/// Resolved once per registry and threaded through every component; never
/// mutated after the validating machinery for a type is built.
///
/// # Example
///
/// ```rust
/// use inquest::{EngineFeature, FeatureSet};
///
/// let features = FeatureSet::default()
///     .without(EngineFeature::MapCreatorViolationsToPropertyPaths);
/// assert!(features.disabled(EngineFeature::MapCreatorViolationsToPropertyPaths));
/// assert!(features.enabled(EngineFeature::ReportNullPrimitiveAsNotNull));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSet {
    bits: u8,
}

impl FeatureSet {
    /// An empty set with every feature off.
    pub fn none() -> Self {
        Self { bits: 0 }
    }

    /// Returns a copy with the feature enabled.
    pub fn with(self, feature: EngineFeature) -> Self {
        Self {
            bits: self.bits | feature.mask(),
        }
    }

    /// Returns a copy with the feature disabled.
    pub fn without(self, feature: EngineFeature) -> Self {
        Self {
            bits: self.bits & !feature.mask(),
        }
    }

    /// Returns true if the feature is enabled.
    pub fn enabled(self, feature: EngineFeature) -> bool {
        self.bits & feature.mask() != 0
    }

    /// Returns true if the feature is disabled.
    pub fn disabled(self, feature: EngineFeature) -> bool {
        !self.enabled(feature)
    }
}

impl Default for FeatureSet {
    fn default() -> Self {
        EngineFeature::ALL
            .into_iter()
            .filter(|f| f.enabled_by_default())
            .fold(Self::none(), Self::with)
    }
}

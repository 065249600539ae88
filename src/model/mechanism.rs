use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The five reasoning mechanisms the classifier assigns to worldviews
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Mechanism {
    /// Concluding without evidence or verification
    ImmediateAssertion,
    /// Projecting past events onto the present
    HistoricalProjection,
    /// Reading sequence as intentional causation
    InevitableCausation,
    /// Connecting isolated dots into a network or conspiracy
    NetworkInference,
    /// Rejecting the official explanation in search of a hidden motive
    SurfaceDenial,
}

impl Mechanism {
    /// Canonical display order
    pub const ALL: [Mechanism; 5] = [
        Mechanism::ImmediateAssertion,
        Mechanism::HistoricalProjection,
        Mechanism::InevitableCausation,
        Mechanism::NetworkInference,
        Mechanism::SurfaceDenial,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Mechanism::ImmediateAssertion => "immediate-assertion",
            Mechanism::HistoricalProjection => "historical-projection",
            Mechanism::InevitableCausation => "inevitable-causation",
            Mechanism::NetworkInference => "network-inference",
            Mechanism::SurfaceDenial => "surface-denial",
        }
    }

    /// Tag as written by the classifier into `core_attributes`
    pub fn native_tag(&self) -> &'static str {
        match self {
            Mechanism::ImmediateAssertion => "즉시_단정",
            Mechanism::HistoricalProjection => "역사_투사",
            Mechanism::InevitableCausation => "필연적_인과",
            Mechanism::NetworkInference => "네트워크_추론",
            Mechanism::SurfaceDenial => "표면_부정",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mechanism::ImmediateAssertion => "Immediate assertion",
            Mechanism::HistoricalProjection => "Historical projection",
            Mechanism::InevitableCausation => "Inevitable causation",
            Mechanism::NetworkInference => "Network inference",
            Mechanism::SurfaceDenial => "Surface denial",
        }
    }

    /// Resolve a tag in either slug or native form
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::ALL.into_iter().find(|m| {
            m.native_tag() == tag
                || m.slug() == tag
                || m.slug().replace('-', "_") == tag
        })
    }
}

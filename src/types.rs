// Label vocabulary and the decision types shared by `gate` and its callers.
//
// The encoder tags every fragment with one of these labels. The gate never
// looks at fragment contents to classify them; the label is the only signal.

/// Canonical fragment labels emitted by the protocol encoder.
pub mod labels {
    /// Cached numeric fields (packet ids, keep-alive, property values).
    pub const GENERIC_NUMBER: &str = "generic_number_cached";
    /// Length-prefixed string fields (topics, client ids, user names).
    pub const GENERIC_STRING: &str = "generic_string";
    /// The protocol level byte of a CONNECT packet.
    pub const PROTOCOL_VERSION: &str = "connect_protocol_version";

    /// Role suffix carried by every fixed-header label, e.g. `connect_header`.
    pub const HEADER_SUFFIX: &str = "header";
    /// Role suffix carried by every flags label, e.g. `connect_flags`.
    pub const FLAGS_SUFFIX: &str = "flags";
}

/// A fuzzing category selectable through `GateConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Category {
    Numbers,
    Strings,
    Headers,
    Flags,
    ProtocolVersion,
}

impl Category {
    /// All categories, in the priority order the gate evaluates them.
    pub const PRIORITY: [Category; 5] = [
        Category::Numbers,
        Category::Strings,
        Category::Headers,
        Category::Flags,
        Category::ProtocolVersion,
    ];

    /// Whether `label` belongs to this category.
    #[inline]
    pub fn matches(self, label: &str) -> bool {
        match self {
            Category::Numbers => label == labels::GENERIC_NUMBER,
            Category::Strings => label == labels::GENERIC_STRING,
            Category::Headers => label.ends_with(labels::HEADER_SUFFIX),
            Category::Flags => label.ends_with(labels::FLAGS_SUFFIX),
            Category::ProtocolVersion => label == labels::PROTOCOL_VERSION,
        }
    }

    /// The highest-priority category `label` belongs to, if any.
    pub fn of(label: &str) -> Option<Category> {
        Category::PRIORITY.into_iter().find(|c| c.matches(label))
    }
}

/// Why a fragment was passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassReason {
    /// The gate's master switch is off.
    Disabled,
    /// The fragment falls in the exempt prefix of the run.
    LeadingInput,
    /// The fragment contains the configured skip marker.
    ContainsSkipMarker,
    /// The label belongs to a category, but none of its categories are enabled.
    CategoryDisabled,
    /// The label belongs to no category.
    Unclassified,
}

/// Why a fragment was handed to the mutator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutateTrigger {
    /// A skip marker is configured and the fragment does not contain it.
    /// Category flags are not consulted in this case.
    SkipMarkerAbsent,
    /// The label matched an enabled category.
    Category(Category),
}

/// Outcome of evaluating one fragment against the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    PassThrough(PassReason),
    Mutate(MutateTrigger),
}

impl Decision {
    pub fn is_mutate(&self) -> bool {
        matches!(self, Decision::Mutate(_))
    }
}

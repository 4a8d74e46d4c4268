//! Filter operator table.
//!
//! Each operator is identified on the wire by its URL suffix
//! (`query.Age~gte=21`). The table also records whether the operator needs a
//! value, whether it takes a `;`-separated list, and its logical opposite.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterType {
    #[serde(rename = "")]
    HasAnyValue,
    #[default]
    #[serde(rename = "eq")]
    Equal,
    #[serde(rename = "dateeq")]
    DateEqual,
    #[serde(rename = "dateneq")]
    DateNotEqual,
    #[serde(rename = "neqornull")]
    NotEqualOrNull,
    #[serde(rename = "neq")]
    NotEqual,
    #[serde(rename = "isblank")]
    IsBlank,
    #[serde(rename = "isnonblank")]
    IsNonBlank,
    #[serde(rename = "gt")]
    GreaterThan,
    #[serde(rename = "dategt")]
    DateGreaterThan,
    #[serde(rename = "lt")]
    LessThan,
    #[serde(rename = "datelt")]
    DateLessThan,
    #[serde(rename = "gte")]
    GreaterThanOrEqual,
    #[serde(rename = "dategte")]
    DateGreaterThanOrEqual,
    #[serde(rename = "lte")]
    LessThanOrEqual,
    #[serde(rename = "datelte")]
    DateLessThanOrEqual,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "doesnotcontain")]
    DoesNotContain,
    #[serde(rename = "startswith")]
    StartsWith,
    #[serde(rename = "doesnotstartwith")]
    DoesNotStartWith,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "notin")]
    NotIn,
    #[serde(rename = "containsoneof")]
    ContainsOneOf,
    #[serde(rename = "containsnoneof")]
    ContainsNoneOf,
    #[serde(rename = "hasmvvalue")]
    HasMissingValue,
    #[serde(rename = "nomvvalue")]
    DoesNotHaveMissingValue,
}

impl FilterType {
    pub const ALL: [FilterType; 26] = [
        Self::HasAnyValue,
        Self::Equal,
        Self::DateEqual,
        Self::DateNotEqual,
        Self::NotEqualOrNull,
        Self::NotEqual,
        Self::IsBlank,
        Self::IsNonBlank,
        Self::GreaterThan,
        Self::DateGreaterThan,
        Self::LessThan,
        Self::DateLessThan,
        Self::GreaterThanOrEqual,
        Self::DateGreaterThanOrEqual,
        Self::LessThanOrEqual,
        Self::DateLessThanOrEqual,
        Self::Contains,
        Self::DoesNotContain,
        Self::StartsWith,
        Self::DoesNotStartWith,
        Self::In,
        Self::NotIn,
        Self::ContainsOneOf,
        Self::ContainsNoneOf,
        Self::HasMissingValue,
        Self::DoesNotHaveMissingValue,
    ];

    pub fn url_suffix(self) -> &'static str {
        match self {
            Self::HasAnyValue => "",
            Self::Equal => "eq",
            Self::DateEqual => "dateeq",
            Self::DateNotEqual => "dateneq",
            Self::NotEqualOrNull => "neqornull",
            Self::NotEqual => "neq",
            Self::IsBlank => "isblank",
            Self::IsNonBlank => "isnonblank",
            Self::GreaterThan => "gt",
            Self::DateGreaterThan => "dategt",
            Self::LessThan => "lt",
            Self::DateLessThan => "datelt",
            Self::GreaterThanOrEqual => "gte",
            Self::DateGreaterThanOrEqual => "dategte",
            Self::LessThanOrEqual => "lte",
            Self::DateLessThanOrEqual => "datelte",
            Self::Contains => "contains",
            Self::DoesNotContain => "doesnotcontain",
            Self::StartsWith => "startswith",
            Self::DoesNotStartWith => "doesnotstartwith",
            Self::In => "in",
            Self::NotIn => "notin",
            Self::ContainsOneOf => "containsoneof",
            Self::ContainsNoneOf => "containsnoneof",
            Self::HasMissingValue => "hasmvvalue",
            Self::DoesNotHaveMissingValue => "nomvvalue",
        }
    }

    pub fn from_url_suffix(suffix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.url_suffix() == suffix)
    }

    /// Human-readable label, as shown in filter descriptions.
    pub fn display_text(self) -> &'static str {
        match self {
            Self::HasAnyValue => "Has Any Value",
            Self::Equal | Self::DateEqual => "Equals",
            Self::DateNotEqual | Self::NotEqualOrNull | Self::NotEqual => "Does Not Equal",
            Self::IsBlank => "Is Blank",
            Self::IsNonBlank => "Is Not Blank",
            Self::GreaterThan | Self::DateGreaterThan => "Is Greater Than",
            Self::LessThan | Self::DateLessThan => "Is Less Than",
            Self::GreaterThanOrEqual | Self::DateGreaterThanOrEqual => {
                "Is Greater Than or Equal To"
            }
            Self::LessThanOrEqual | Self::DateLessThanOrEqual => "Is Less Than or Equal To",
            Self::Contains => "Contains",
            Self::DoesNotContain => "Does Not Contain",
            Self::StartsWith => "Starts With",
            Self::DoesNotStartWith => "Does Not Start With",
            Self::In => "Equals One Of",
            Self::NotIn => "Does Not Equal Any Of",
            Self::ContainsOneOf => "Contains One Of",
            Self::ContainsNoneOf => "Does Not Contain Any Of",
            Self::HasMissingValue => "Has a missing value indicator",
            Self::DoesNotHaveMissingValue => "Does not have a missing value indicator",
        }
    }

    pub fn is_data_value_required(self) -> bool {
        !matches!(
            self,
            Self::HasAnyValue
                | Self::IsBlank
                | Self::IsNonBlank
                | Self::HasMissingValue
                | Self::DoesNotHaveMissingValue
        )
    }

    /// Multi-valued operators take a `;`-separated list.
    pub fn is_multi_valued(self) -> bool {
        matches!(
            self,
            Self::In | Self::NotIn | Self::ContainsOneOf | Self::ContainsNoneOf
        )
    }

    pub fn opposite(self) -> Option<Self> {
        let opposite = match self {
            Self::HasAnyValue => return None,
            Self::Equal => Self::NotEqualOrNull,
            Self::DateEqual => Self::DateNotEqual,
            Self::DateNotEqual => Self::DateEqual,
            Self::NotEqualOrNull | Self::NotEqual => Self::Equal,
            Self::IsBlank => Self::IsNonBlank,
            Self::IsNonBlank => Self::IsBlank,
            Self::GreaterThan => Self::LessThanOrEqual,
            Self::DateGreaterThan => Self::DateLessThanOrEqual,
            Self::LessThan => Self::GreaterThanOrEqual,
            Self::DateLessThan => Self::DateGreaterThanOrEqual,
            Self::GreaterThanOrEqual => Self::LessThan,
            Self::DateGreaterThanOrEqual => Self::DateLessThan,
            Self::LessThanOrEqual => Self::GreaterThan,
            Self::DateLessThanOrEqual => Self::DateGreaterThan,
            Self::Contains => Self::DoesNotContain,
            Self::DoesNotContain => Self::Contains,
            Self::StartsWith => Self::DoesNotStartWith,
            Self::DoesNotStartWith => Self::StartsWith,
            Self::In => Self::NotIn,
            Self::NotIn => Self::In,
            Self::ContainsOneOf => Self::ContainsNoneOf,
            Self::ContainsNoneOf => Self::ContainsOneOf,
            Self::HasMissingValue => Self::DoesNotHaveMissingValue,
            Self::DoesNotHaveMissingValue => Self::HasMissingValue,
        };
        Some(opposite)
    }

    /// Single-valued counterpart. Single-valued operators return themselves;
    /// `notin` has no unambiguous counterpart because of nulls.
    pub fn single_value_filter(self) -> Option<Self> {
        if !self.is_multi_valued() {
            return Some(self);
        }
        match self {
            Self::In => Some(Self::Equal),
            Self::ContainsOneOf => Some(Self::Contains),
            Self::ContainsNoneOf => Some(Self::DoesNotContain),
            _ => None,
        }
    }

    pub fn multi_value_filter(self) -> Option<Self> {
        match self {
            Self::Equal => Some(Self::In),
            Self::NotEqual | Self::NotEqualOrNull => Some(Self::NotIn),
            Self::DoesNotContain => Some(Self::ContainsNoneOf),
            Self::Contains => Some(Self::ContainsOneOf),
            _ => None,
        }
    }
}

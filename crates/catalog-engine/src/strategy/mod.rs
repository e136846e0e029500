//! Pluggable validation and filter strategies.

pub mod filter;
pub mod validator;

pub use filter::{
    And, FilterExt, FilteringStrategy, GroupExists, GroupHasAtLeastNMembers, NotEqual, NotNull, Or,
};
pub use validator::{
    ChoiceValidator, RangeValidator, RegexValidator, UrlValidator, UuidValidator,
    ValidatorStrategy,
};

//! Resolution options and per-frame overrides.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// A set of resolution flags. Each flag disables one resolution branch.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ResolutionOptions(u8);

impl ResolutionOptions {
    pub const NONE: Self = Self(0);
    /// Return aliases unresolved instead of following their target.
    pub const DONT_RESOLVE_ALIASES: Self = Self(1 << 0);
    /// Skip resolving the types of variables and method return types.
    pub const DONT_RESOLVE_BASE_TYPES: Self = Self(1 << 1);
    /// Skip resolving base classes and interfaces of classes.
    pub const DONT_RESOLVE_BASE_CLASSES: Self = Self(1 << 2);
    /// Return overloads without running template deduction.
    pub const NO_TEMPLATE_PARAMETER_DEDUCTION: Self = Self(1 << 3);
    /// Return method symbols without resolving their return types.
    pub const RETURN_METHOD_REFERENCES_ONLY: Self = Self(1 << 4);

    const NAMED: [(Self, &'static str); 5] = [
        (Self::DONT_RESOLVE_ALIASES, "DontResolveAliases"),
        (Self::DONT_RESOLVE_BASE_TYPES, "DontResolveBaseTypes"),
        (Self::DONT_RESOLVE_BASE_CLASSES, "DontResolveBaseClasses"),
        (Self::NO_TEMPLATE_PARAMETER_DEDUCTION, "NoTemplateParameterDeduction"),
        (Self::RETURN_METHOD_REFERENCES_ONLY, "ReturnMethodReferencesOnly"),
    ];

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for ResolutionOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for ResolutionOptions {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl fmt::Debug for ResolutionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Self::NAMED
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "ResolutionOptions({})", names.join(" | "))
    }
}

/// A frame's explicit configuration on top of the context default.
///
/// `effective = (default | enabled) - disabled`: every flag the frame names
/// takes the frame's value, every other flag comes from the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct OptionOverrides {
    enabled: ResolutionOptions,
    disabled: ResolutionOptions,
}

impl OptionOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable(mut self, flags: ResolutionOptions) -> Self {
        self.enabled |= flags;
        self.disabled = self.disabled.difference(flags);
        self
    }

    pub fn disable(mut self, flags: ResolutionOptions) -> Self {
        self.disabled |= flags;
        self.enabled = self.enabled.difference(flags);
        self
    }

    /// Layer `inner` on top of `self`; `inner` wins where both speak.
    pub fn then(self, inner: OptionOverrides) -> Self {
        Self {
            enabled: self.enabled.difference(inner.disabled) | inner.enabled,
            disabled: self.disabled.difference(inner.enabled) | inner.disabled,
        }
    }

    pub fn apply(self, default: ResolutionOptions) -> ResolutionOptions {
        (default | self.enabled).difference(self.disabled)
    }

    pub fn is_empty(self) -> bool {
        self.enabled.is_empty() && self.disabled.is_empty()
    }
}

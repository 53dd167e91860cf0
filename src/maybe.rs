//! [`Maybe`] is the per-step operator return type distinguishing "no tick
//! this step" from "emit this value". It plays the role renoir's
//! `StreamElement::Item` / absence-of-item distinction plays at the
//! per-message level, but at the per-node-step level of this engine's
//! block-oriented scheduler.

/// Whether an operator step produced a tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Maybe<T> {
    Some(T),
    None,
}

impl<T> Maybe<T> {
    pub fn some(value: T) -> Self {
        Maybe::Some(value)
    }

    pub fn none() -> Self {
        Maybe::None
    }

    pub fn is_some(&self) -> bool {
        matches!(self, Maybe::Some(_))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Maybe::None)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Maybe<U> {
        match self {
            Maybe::Some(v) => Maybe::Some(f(v)),
            Maybe::None => Maybe::None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Maybe::Some(v) => Some(v),
            Maybe::None => None,
        }
    }
}

impl<T> From<Option<T>> for Maybe<T> {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => Maybe::Some(v),
            None => Maybe::None,
        }
    }
}

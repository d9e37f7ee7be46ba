//! Mail transport for the Mailjet Send API (v3.1).
//!
//! Generic mail descriptors ([`Mail`]) are translated into the provider's
//! message schema, submitted through a [`Client`], and the provider's
//! per-recipient results are normalized into a [`DeliveryReport`].
use serde::Deserialize;

pub mod address;
pub mod attachment;
pub mod client;
pub mod config;
pub mod email;
pub mod errors;
pub mod headers;
pub mod mailjet;
pub mod message;
pub mod response;
pub mod transport;

pub use client::{Client, RawResult};
pub use email::Mail;
pub use errors::{Error, Result, TransportError};
pub use response::DeliveryReport;
pub use transport::{SentMail, Transport};

/// A single value or a list of values.
///
/// Used wherever callers may pass either shape and expect the same shape
/// back.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    /// Wrap `items` in the given shape. A single shape only applies when
    /// there is exactly one item.
    pub fn from_vec(mut items: Vec<T>, single: bool) -> Self {
        if single && items.len() == 1 {
            if let Some(item) = items.pop() {
                return OneOrMany::One(item);
            }
        }
        OneOrMany::Many(items)
    }

    pub fn is_one(&self) -> bool {
        match *self {
            OneOrMany::One(_) => true,
            OneOrMany::Many(_) => false,
        }
    }

    pub fn as_slice(&self) -> &[T] {
        match *self {
            OneOrMany::One(ref item) => std::slice::from_ref(item),
            OneOrMany::Many(ref items) => items,
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

impl<T> From<T> for OneOrMany<T> {
    fn from(item: T) -> Self {
        OneOrMany::One(item)
    }
}

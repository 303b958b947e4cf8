//! Order legs and the identifiers that tie them to customers.
//!
//! A leg is one side of an order: the pickup or the delivery. Legs are stored
//! denormalised inside stops, so each leg carries the order-level fallbacks
//! it needs (customer id and contact details) in an [`OrderSummary`].

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Identifier of a customer order.
    OrderId
);

string_id!(
    /// Identifier of the customer a stop or leg belongs to.
    CustomerId
);

/// Which side of an order a leg represents.
///
/// # Examples
/// ```
/// use stopline_core::LegType;
///
/// assert_eq!(LegType::Pickup.counterpart(), LegType::Delivery);
/// assert_eq!("delivery".parse::<LegType>(), Ok(LegType::Delivery));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum LegType {
    /// Goods are collected at this stop.
    Pickup,
    /// Goods are dropped off at this stop.
    Delivery,
}

impl LegType {
    /// Return the opposite leg type of the same order.
    #[must_use]
    pub const fn counterpart(self) -> Self {
        match self {
            Self::Pickup => Self::Delivery,
            Self::Delivery => Self::Pickup,
        }
    }

    /// Return the leg type as a lowercase `&str`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pickup => "pickup",
            Self::Delivery => "delivery",
        }
    }
}

impl fmt::Display for LegType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a [`LegType`] from text fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown leg type {0:?} (expected \"pickup\" or \"delivery\")")]
pub struct ParseLegTypeError(String);

impl FromStr for LegType {
    type Err = ParseLegTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pickup" => Ok(Self::Pickup),
            "delivery" | "deliver" => Ok(Self::Delivery),
            _ => Err(ParseLegTypeError(s.to_owned())),
        }
    }
}

/// Identity of a leg: the order it belongs to and which side it is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LegKey {
    /// Owning order.
    pub order_id: OrderId,
    /// Pickup or delivery.
    pub leg_type: LegType,
}

impl LegKey {
    /// Build a key from its parts.
    pub fn new(order_id: impl Into<OrderId>, leg_type: LegType) -> Self {
        Self {
            order_id: order_id.into(),
            leg_type,
        }
    }
}

impl fmt::Display for LegKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.order_id, self.leg_type)
    }
}

/// Display fields shared by legs, orders and stops.
///
/// Every field is optional; missing leg-level values fall back to the
/// order-level ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct Contact {
    /// Customer or site name.
    pub name: Option<String>,
    /// Street address.
    pub address: Option<String>,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Free-form service window, e.g. `"09:00-12:00"`.
    pub timeframe: Option<String>,
}

impl Contact {
    /// Fill every missing field from `fallback`.
    ///
    /// # Examples
    /// ```
    /// use stopline_core::Contact;
    ///
    /// let leg = Contact { name: Some("Dock 4".into()), ..Contact::default() };
    /// let order = Contact {
    ///     name: Some("Acme".into()),
    ///     address: Some("1 High St".into()),
    ///     ..Contact::default()
    /// };
    /// let merged = leg.or(&order);
    /// assert_eq!(merged.name.as_deref(), Some("Dock 4"));
    /// assert_eq!(merged.address.as_deref(), Some("1 High St"));
    /// ```
    #[must_use]
    pub fn or(&self, fallback: &Self) -> Self {
        Self {
            name: self.name.clone().or_else(|| fallback.name.clone()),
            address: self.address.clone().or_else(|| fallback.address.clone()),
            phone: self.phone.clone().or_else(|| fallback.phone.clone()),
            timeframe: self.timeframe.clone().or_else(|| fallback.timeframe.clone()),
        }
    }
}

/// Order-level fields copied onto each leg.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct OrderSummary {
    /// Customer that placed the order.
    pub customer_id: Option<CustomerId>,
    /// Order-level display fields.
    pub contact: Contact,
}

/// One side of an order, placeable independently in the stop sequence.
///
/// # Examples
/// ```
/// use stopline_core::{Leg, LegType};
///
/// let leg = Leg::new("O1", LegType::Pickup).with_order_customer("C1");
/// assert_eq!(leg.effective_customer_id().map(|id| id.as_str()), Some("C1"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Leg {
    /// Owning order.
    pub order_id: OrderId,
    /// Pickup or delivery.
    pub leg_type: LegType,
    /// Leg-specific customer, when it differs from the ordering customer.
    #[cfg_attr(feature = "serde", serde(default))]
    pub customer_id: Option<CustomerId>,
    /// Leg-specific display fields.
    #[cfg_attr(feature = "serde", serde(default))]
    pub contact: Contact,
    /// Order-level fallbacks.
    #[cfg_attr(feature = "serde", serde(default))]
    pub order: OrderSummary,
}

impl Leg {
    /// Create a leg with no customer or display information.
    pub fn new(order_id: impl Into<OrderId>, leg_type: LegType) -> Self {
        Self {
            order_id: order_id.into(),
            leg_type,
            customer_id: None,
            contact: Contact::default(),
            order: OrderSummary::default(),
        }
    }

    /// Set the leg-specific customer.
    #[must_use]
    pub fn with_customer(mut self, customer_id: impl Into<CustomerId>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    /// Set the order-level customer.
    #[must_use]
    pub fn with_order_customer(mut self, customer_id: impl Into<CustomerId>) -> Self {
        self.order.customer_id = Some(customer_id.into());
        self
    }

    /// Set the leg-specific display fields.
    #[must_use]
    pub fn with_contact(mut self, contact: Contact) -> Self {
        self.contact = contact;
        self
    }

    /// Set the order-level display fields.
    #[must_use]
    pub fn with_order_contact(mut self, contact: Contact) -> Self {
        self.order.contact = contact;
        self
    }

    /// Identity of this leg.
    #[must_use]
    pub fn key(&self) -> LegKey {
        LegKey {
            order_id: self.order_id.clone(),
            leg_type: self.leg_type,
        }
    }

    /// Leg-specific customer, falling back to the ordering customer.
    #[must_use]
    pub fn effective_customer_id(&self) -> Option<&CustomerId> {
        self.customer_id
            .as_ref()
            .or(self.order.customer_id.as_ref())
    }

    /// Leg display fields with order-level fallbacks applied.
    #[must_use]
    pub fn effective_contact(&self) -> Contact {
        self.contact.or(&self.order.contact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("pickup", LegType::Pickup)]
    #[case("Delivery", LegType::Delivery)]
    #[case("deliver", LegType::Delivery)]
    fn parses_leg_types(#[case] text: &str, #[case] expected: LegType) {
        assert_eq!(text.parse::<LegType>(), Ok(expected));
    }

    #[rstest]
    fn rejects_unknown_leg_type() {
        let err = "dropoff".parse::<LegType>().expect_err("unknown leg type");
        assert!(err.to_string().contains("dropoff"));
    }

    #[rstest]
    fn leg_customer_overrides_order_customer() {
        let leg = Leg::new("O1", LegType::Delivery)
            .with_order_customer("C1")
            .with_customer("C9");
        assert_eq!(leg.effective_customer_id(), Some(&CustomerId::new("C9")));
    }

    #[rstest]
    fn missing_customer_stays_missing() {
        let leg = Leg::new("O1", LegType::Pickup);
        assert!(leg.effective_customer_id().is_none());
    }

    #[rstest]
    fn contact_falls_back_per_field() {
        let leg = Leg::new("O1", LegType::Pickup)
            .with_contact(Contact {
                phone: Some("555-0100".into()),
                ..Contact::default()
            })
            .with_order_contact(Contact {
                name: Some("Acme".into()),
                phone: Some("555-0199".into()),
                ..Contact::default()
            });
        let contact = leg.effective_contact();
        assert_eq!(contact.name.as_deref(), Some("Acme"));
        assert_eq!(contact.phone.as_deref(), Some("555-0100"));
        assert!(contact.address.is_none());
    }
}

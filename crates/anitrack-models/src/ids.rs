//! Strongly typed identifiers.
//!
//! Every id is a transparent newtype over an integer so it serializes as a
//! plain number while keeping subscriber ids, chat ids and title ids from
//! being mixed up at call sites.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident, $inner:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl $name {
            /// Returns the raw integer value.
            pub fn get(self) -> $inner {
                self.0
            }
        }

        impl From<$inner> for $name {
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Internal account id assigned by the user store.
    UserId,
    u64
);

numeric_id!(
    /// Stable platform identity of a subscriber (the Telegram user id).
    TelegramId,
    i64
);

numeric_id!(
    /// Delivery address of a subscriber (the Telegram chat id).
    ChatId,
    i64
);

numeric_id!(
    /// Id of a subscription row, assigned at creation.
    SubscriptionId,
    u64
);

numeric_id!(
    /// External catalog id of a title.
    TitleId,
    u64
);

impl std::str::FromStr for TitleId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(TitleId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_transparently() {
        assert_eq!(serde_json::to_string(&TitleId(52991)).unwrap(), "52991");
        let id: TelegramId = serde_json::from_str("-100123").unwrap();
        assert_eq!(id, TelegramId(-100123));
    }

    #[test]
    fn test_title_id_from_str() {
        assert_eq!(" 5081 ".parse::<TitleId>().unwrap(), TitleId(5081));
        assert!("abc".parse::<TitleId>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(SubscriptionId(7).to_string(), "7");
        assert_eq!(ChatId(-42).to_string(), "-42");
    }
}

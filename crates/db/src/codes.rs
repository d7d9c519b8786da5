//! Closed sets of text codes stored in `TEXT` columns.

use std::{fmt, str::FromStr};

use diesel::{
    backend::Backend,
    deserialize::{self, FromSql, FromSqlRow},
    expression::AsExpression,
    serialize::{self, IsNull, Output, ToSql},
    sql_types::Text,
    sqlite::Sqlite,
};
use serde::{Deserialize, Serialize};

/// A string that is not one of the codes of the enum it was parsed as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCode {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a valid {}", self.value, self.kind)
    }
}

impl std::error::Error for UnknownCode {}

macro_rules! text_code {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) { $($variant:ident => $code:tt),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            Serialize,
            Deserialize,
            AsExpression,
            FromSqlRow,
        )]
        #[diesel(sql_type = Text)]
        pub enum $name {
            $(
                #[serde(rename = $code)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $code,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownCode;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($code => Ok($name::$variant),)+
                    other => Err(UnknownCode {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl ToSql<Text, Sqlite> for $name {
            fn to_sql<'b>(
                &'b self,
                out: &mut Output<'b, '_, Sqlite>,
            ) -> serialize::Result {
                out.set_value(self.as_str());
                Ok(IsNull::No)
            }
        }

        impl FromSql<Text, Sqlite> for $name {
            fn from_sql(
                bytes: <Sqlite as Backend>::RawValue<'_>,
            ) -> deserialize::Result<Self> {
                let text = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
                Ok(text.parse::<$name>()?)
            }
        }
    };
}

text_code! {
    /// Athletes may be `X`; offerings only ever hold `M` or `F`.
    Gender ("gender") {
        M => "M",
        F => "F",
        X => "X",
    }
}

impl Gender {
    /// The genders a meet can offer an event to.
    pub const OFFERED: [Gender; 2] = [Gender::M, Gender::F];

    pub fn may_be_offered(&self) -> bool {
        matches!(self, Gender::M | Gender::F)
    }
}

text_code! {
    EventType ("event type") {
        Track => "track",
        Field => "field",
        Relay => "relay",
    }
}

text_code! {
    /// `Both` only appears on catalog events; a meet is either indoor or
    /// outdoor.
    VenueType ("venue type") {
        Indoor => "indoor",
        Outdoor => "outdoor",
        Both => "both",
    }
}

impl VenueType {
    /// Catalog venues an event must have to be offered at a meet held at
    /// `self`. Anything other than indoor is treated as outdoor.
    pub fn compatible_catalog_venues(&self) -> [VenueType; 2] {
        match self {
            VenueType::Indoor => [VenueType::Indoor, VenueType::Both],
            _ => [VenueType::Outdoor, VenueType::Both],
        }
    }
}

impl Default for VenueType {
    fn default() -> Self {
        VenueType::Outdoor
    }
}

text_code! {
    EntryStatus ("entry status") {
        Entered => "entered",
        Scratched => "scratched",
    }
}

impl Default for EntryStatus {
    fn default() -> Self {
        EntryStatus::Entered
    }
}

text_code! {
    Discipline ("discipline") {
        Outdoor => "outdoor",
        Indoor => "indoor",
        Xc => "xc",
    }
}

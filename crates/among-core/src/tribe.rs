//! Tribe — the fixed classification axis for tribal knowledge.
//!
//! The six Tao villages of Lanyu (Orchid Island). Each fish carries at most
//! one active [`TribalClassification`](crate::record::TribalClassification)
//! per tribe; the merge engine preserves that invariant.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Tribe {
  Imorod,
  Iratay,
  Yayo,
  Iraraley,
  Iranmeylek,
  Ivalino,
}

impl Tribe {
  pub const ALL: [Tribe; 6] = [
    Tribe::Imorod,
    Tribe::Iratay,
    Tribe::Yayo,
    Tribe::Iraraley,
    Tribe::Iranmeylek,
    Tribe::Ivalino,
  ];

  /// The lowercase code stored in the `tribe` column.
  /// Must match the `rename_all = "lowercase"` serde tags above.
  pub fn as_str(self) -> &'static str {
    match self {
      Tribe::Imorod => "imorod",
      Tribe::Iratay => "iratay",
      Tribe::Yayo => "yayo",
      Tribe::Iraraley => "iraraley",
      Tribe::Iranmeylek => "iranmeylek",
      Tribe::Ivalino => "ivalino",
    }
  }
}

impl fmt::Display for Tribe {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Tribe {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Error> {
    match s {
      "imorod" => Ok(Tribe::Imorod),
      "iratay" => Ok(Tribe::Iratay),
      "yayo" => Ok(Tribe::Yayo),
      "iraraley" => Ok(Tribe::Iraraley),
      "iranmeylek" => Ok(Tribe::Iranmeylek),
      "ivalino" => Ok(Tribe::Ivalino),
      other => Err(Error::UnknownTribe(other.to_string())),
    }
  }
}

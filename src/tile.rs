//! Two-character map tiles revealed by moves.

use crate::error::{ExplorerError, ExplorerResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// A two-character map cell.
///
/// Serializes as `{"str": "XY"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TileJson", into = "TileJson")]
pub struct Tile {
    left: char,
    right: char,
}

/// Wire shape of a tile.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TileJson {
    #[serde(default)]
    str: Option<String>,
}

impl Tile {
    /// Creates a tile from its two characters.
    pub fn new(left: char, right: char) -> Self {
        Self { left, right }
    }

    /// Left character.
    pub fn left(&self) -> char {
        self.left
    }

    /// Right character.
    pub fn right(&self) -> char {
        self.right
    }

    /// Serializes an optional tile, mapping `None` to JSON null.
    pub fn to_json(tile: Option<&Tile>) -> Value {
        match tile {
            Some(tile) => serde_json::json!({ "str": tile.to_string() }),
            None => Value::Null,
        }
    }

    /// Decodes an optional tile payload.
    ///
    /// Absent or null payloads decode to `None`; a record whose `str` is
    /// missing or not exactly two characters is a protocol error.
    pub fn from_json(value: Option<&Value>) -> ExplorerResult<Option<Tile>> {
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(value) => {
                let tile: Tile = serde_json::from_value(value.clone()).map_err(|e| {
                    ExplorerError::protocol(format!("Invalid tile JSON: {}", e))
                })?;
                Ok(Some(tile))
            }
        }
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.left, self.right)
    }
}

impl TryFrom<&str> for Tile {
    type Error = ExplorerError;

    #[track_caller]
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let mut chars = s.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(left), Some(right), None) => Ok(Self { left, right }),
            _ => Err(ExplorerError::validation(format!(
                "Tile string must have exactly 2 characters, got {:?}",
                s
            ))),
        }
    }
}

impl TryFrom<(&str, &str)> for Tile {
    type Error = ExplorerError;

    #[track_caller]
    fn try_from((left, right): (&str, &str)) -> Result<Self, Self::Error> {
        let single = |s: &str| {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(c),
                _ => None,
            }
        };
        match (single(left), single(right)) {
            (Some(left), Some(right)) => Ok(Self { left, right }),
            _ => Err(ExplorerError::validation("Tile pair must be (char, char)")),
        }
    }
}

impl From<(char, char)> for Tile {
    fn from((left, right): (char, char)) -> Self {
        Self { left, right }
    }
}

impl FromStr for Tile {
    type Err = ExplorerError;

    #[track_caller]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tile::try_from(s)
    }
}

impl TryFrom<TileJson> for Tile {
    type Error = String;

    fn try_from(json: TileJson) -> Result<Self, Self::Error> {
        let s = json.str.ok_or_else(|| "missing 'str'".to_string())?;
        let mut chars = s.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(left), Some(right), None) => Ok(Self { left, right }),
            _ => Err(format!("'str' must have exactly 2 characters, got {:?}", s)),
        }
    }
}

impl From<Tile> for TileJson {
    fn from(tile: Tile) -> Self {
        Self {
            str: Some(tile.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExplorerErrorKind;
    use serde_json::json;

    #[test]
    fn test_from_string_and_pair_agree() {
        let a = Tile::try_from("AB").unwrap();
        let b = Tile::try_from(("A", "B")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, Tile::from(('A', 'B')));
        assert_eq!(a.left(), 'A');
        assert_eq!(a.right(), 'B');
        assert_eq!(a.to_string(), "AB");
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert!(Tile::try_from("A").is_err());
        assert!(Tile::try_from("ABC").is_err());
        assert!(Tile::try_from(("AB", "C")).is_err());
        assert!("".parse::<Tile>().is_err());
    }

    #[test]
    fn test_multibyte_characters_count_once() {
        let tile: Tile = "é#".parse().unwrap();
        assert_eq!(tile.left(), 'é');
    }

    #[test]
    fn test_json_round_trip() {
        let tile = Tile::new('#', '.');
        let json = Tile::to_json(Some(&tile));
        assert_eq!(json, json!({ "str": "#." }));
        assert_eq!(Tile::from_json(Some(&json)).unwrap(), Some(tile));
    }

    #[test]
    fn test_null_decodes_to_none() {
        assert_eq!(Tile::to_json(None), Value::Null);
        assert_eq!(Tile::from_json(None).unwrap(), None);
        assert_eq!(Tile::from_json(Some(&Value::Null)).unwrap(), None);
    }

    #[test]
    fn test_invalid_json_is_protocol_error() {
        for bad in [json!({ "str": "ABC" }), json!({}), json!({ "str": "" })] {
            let err = Tile::from_json(Some(&bad)).unwrap_err();
            assert!(matches!(err.kind, ExplorerErrorKind::Protocol(_)));
        }
    }
}

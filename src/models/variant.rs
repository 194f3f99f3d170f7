use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Garment size of a product variant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Size {
    Xs,
    S,
    M,
    L,
    Xl,
    Xxl,
}

/// Colorway of a product variant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Color {
    Black,
    White,
    Grey,
    Red,
    Blue,
    Green,
    Yellow,
    Navy,
    Beige,
    Brown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn size_parses_case_insensitively() {
        assert_eq!(Size::from_str("XL").unwrap(), Size::Xl);
        assert_eq!(Size::from_str("xl").unwrap(), Size::Xl);
        assert!(Size::from_str("gigantic").is_err());
    }

    #[test]
    fn color_round_trips_through_serde() {
        let json = serde_json::to_string(&Color::Navy).unwrap();
        assert_eq!(json, "\"navy\"");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Color::Navy);
    }
}

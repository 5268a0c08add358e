use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Side {
    #[default]
    Top,
    Bottom,
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Align {
    Start,
    #[default]
    Center,
    End,
}

/// Anchor placement of floating content (`"top"`, `"bottom end"`, ...).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Placement {
    pub side: Side,
    pub align: Align,
}

impl Placement {
    pub const TOP: Placement = Placement::new(Side::Top, Align::Center);
    pub const BOTTOM: Placement = Placement::new(Side::Bottom, Align::Center);
    pub const LEFT: Placement = Placement::new(Side::Left, Align::Center);
    pub const RIGHT: Placement = Placement::new(Side::Right, Align::Center);

    pub const fn new(side: Side, align: Align) -> Self {
        Self { side, align }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = match self.side {
            Side::Top => "top",
            Side::Bottom => "bottom",
            Side::Left => "left",
            Side::Right => "right",
        };
        match self.align {
            Align::Center => f.write_str(side),
            Align::Start => write!(f, "{side} start"),
            Align::End => write!(f, "{side} end"),
        }
    }
}

impl FromStr for Placement {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidProp {
            prop: "placement".into(),
            reason: format!("`{s}` is not a placement"),
        };
        let mut parts = s.split_whitespace();
        let side = match parts.next() {
            Some("top") => Side::Top,
            Some("bottom") => Side::Bottom,
            Some("left") => Side::Left,
            Some("right") => Side::Right,
            _ => return Err(invalid()),
        };
        let align = match parts.next() {
            None | Some("center") => Align::Center,
            Some("start") => Align::Start,
            Some("end") => Align::End,
            Some(_) => return Err(invalid()),
        };
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Placement { side, align })
    }
}

//! Console palette used to render agents on the server.

use serde::{Deserialize, Serialize};

/// Console color for rendering an agent's visual identifier.
///
/// The variant name is the wire string, case preserved.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
pub enum Color {
    /// Black.
    Black,
    /// Dark blue.
    DarkBlue,
    /// Dark green.
    DarkGreen,
    /// Dark cyan.
    DarkCyan,
    /// Dark red.
    DarkRed,
    /// Dark magenta.
    DarkMagenta,
    /// Dark yellow.
    DarkYellow,
    /// Gray.
    Gray,
    /// Dark gray.
    DarkGray,
    /// Blue.
    Blue,
    /// Green.
    Green,
    /// Cyan.
    Cyan,
    /// Red.
    Red,
    /// Magenta.
    Magenta,
    /// Yellow.
    Yellow,
    /// White.
    #[default]
    White,
}

impl Color {
    /// Wire string sent to the server.
    pub fn as_wire_str(self) -> &'static str {
        self.into()
    }
}

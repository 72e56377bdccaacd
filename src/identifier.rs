//! Session identifiers: the server-assigned id plus an optional render hint.

use crate::color::Color;
use crate::error::{ExplorerError, ExplorerResult};
use serde::Serialize;
use tracing::{debug, instrument};

/// Longest label the server renders, in characters.
pub const MAX_LABEL_CHARS: usize = 2;

#[track_caller]
fn check_label(label: &str) -> ExplorerResult<()> {
    if label.chars().count() > MAX_LABEL_CHARS {
        return Err(ExplorerError::validation(format!(
            "Identifier string can be {} characters at most, got {:?}",
            MAX_LABEL_CHARS, label
        )));
    }
    Ok(())
}

/// Visual identifier used by the server to render an agent.
///
/// Only the label length is checked client-side; everything else is left
/// to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualSessionIdentifier {
    label: String,
    color: Color,
}

impl VisualSessionIdentifier {
    /// Creates a visual identifier, rejecting labels longer than two characters.
    #[track_caller]
    #[instrument(skip(label), fields(label = %label.as_ref()))]
    pub fn new(label: impl AsRef<str>, color: Color) -> ExplorerResult<Self> {
        let label = label.as_ref();
        check_label(label)?;
        Ok(Self {
            label: label.to_string(),
            color,
        })
    }

    /// Label rendered for the agent.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Replaces the label. A rejected label leaves the previous one in place.
    #[track_caller]
    pub fn set_label(&mut self, label: impl AsRef<str>) -> ExplorerResult<()> {
        let label = label.as_ref();
        check_label(label)?;
        self.label = label.to_string();
        Ok(())
    }

    /// Render color.
    pub fn color(&self) -> Color {
        self.color
    }

    /// Replaces the render color.
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub(crate) fn to_payload(&self) -> VisualPayload {
        VisualPayload {
            identifier_str: self.label.clone(),
            color: self.color,
        }
    }
}

/// Wire form of a visual identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VisualPayload {
    pub(crate) identifier_str: String,
    pub(crate) color: Color,
}

/// Identifies a session: server id (once connected) plus optional visual identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionIdentifier {
    sid: Option<String>,
    visual: Option<VisualSessionIdentifier>,
}

impl SessionIdentifier {
    /// Creates an identifier that has not been connected yet.
    pub fn new(visual: Option<VisualSessionIdentifier>) -> Self {
        Self { sid: None, visual }
    }

    /// Creates an identifier from a label and color.
    #[track_caller]
    pub fn from_visual(label: impl AsRef<str>, color: Color) -> ExplorerResult<Self> {
        Ok(Self::new(Some(VisualSessionIdentifier::new(label, color)?)))
    }

    /// Server-assigned session id, once connected.
    pub fn sid(&self) -> Option<&str> {
        self.sid.as_deref()
    }

    pub(crate) fn assign_sid(&mut self, sid: String) {
        debug!(sid = %sid, "Assigning session id to identifier");
        self.sid = Some(sid);
    }

    /// Visual identifier, if any.
    pub fn visual(&self) -> Option<&VisualSessionIdentifier> {
        self.visual.as_ref()
    }

    /// Replaces the visual identifier.
    pub fn set_visual(&mut self, visual: Option<VisualSessionIdentifier>) {
        self.visual = visual;
    }

    /// True once the server has assigned an id.
    pub fn connection_ready(&self) -> bool {
        self.sid.is_some()
    }

    /// True if a visual identifier is attached.
    pub fn has_visual(&self) -> bool {
        self.visual.is_some()
    }

    #[track_caller]
    fn visual_or_err(&self) -> ExplorerResult<&VisualSessionIdentifier> {
        self.visual
            .as_ref()
            .ok_or_else(|| ExplorerError::validation("No visual identifier associated with this session identifier"))
    }

    #[track_caller]
    fn visual_mut_or_err(&mut self) -> ExplorerResult<&mut VisualSessionIdentifier> {
        self.visual
            .as_mut()
            .ok_or_else(|| ExplorerError::validation("No visual identifier associated with this session identifier"))
    }

    /// Label of the attached visual identifier.
    #[track_caller]
    pub fn label(&self) -> ExplorerResult<&str> {
        Ok(self.visual_or_err()?.label())
    }

    /// Sets the label of the attached visual identifier.
    #[track_caller]
    pub fn set_label(&mut self, label: impl AsRef<str>) -> ExplorerResult<()> {
        self.visual_mut_or_err()?.set_label(label)
    }

    /// Color of the attached visual identifier.
    #[track_caller]
    pub fn color(&self) -> ExplorerResult<Color> {
        Ok(self.visual_or_err()?.color())
    }

    /// Sets the color of the attached visual identifier.
    #[track_caller]
    pub fn set_color(&mut self, color: Color) -> ExplorerResult<()> {
        self.visual_mut_or_err()?.set_color(color);
        Ok(())
    }
}

/// Any of the identifier shapes accepted when creating a session.
#[derive(Debug, Default)]
pub enum IdentifierInput<'a> {
    /// No identifier; the server picks how to render the agent.
    #[default]
    None,
    /// Caller-owned identifier; receives the new session id on success.
    Session(&'a mut SessionIdentifier),
    /// A visual identifier only.
    Visual(VisualSessionIdentifier),
    /// Label and color, validated on resolution.
    LabelColor(String, Color),
    /// Label only, rendered white.
    Label(String),
}

impl<'a> IdentifierInput<'a> {
    /// Resolves the input into one canonical identifier.
    ///
    /// Returns `None` when no identifier was given; the borrowed variant
    /// hands back the caller's own identifier so the session id can be written to it.
    #[track_caller]
    pub(crate) fn resolve(self) -> ExplorerResult<Resolved<'a>> {
        Ok(match self {
            IdentifierInput::None => Resolved::None,
            IdentifierInput::Session(ident) => Resolved::Borrowed(ident),
            IdentifierInput::Visual(visual) => Resolved::Owned(SessionIdentifier::new(Some(visual))),
            IdentifierInput::LabelColor(label, color) => {
                Resolved::Owned(SessionIdentifier::from_visual(label, color)?)
            }
            IdentifierInput::Label(label) => {
                Resolved::Owned(SessionIdentifier::from_visual(label, Color::White)?)
            }
        })
    }
}

/// Canonical identifier produced by [`IdentifierInput::resolve`].
#[derive(Debug)]
pub(crate) enum Resolved<'a> {
    None,
    Borrowed(&'a mut SessionIdentifier),
    Owned(SessionIdentifier),
}

impl Resolved<'_> {
    pub(crate) fn visual(&self) -> Option<&VisualSessionIdentifier> {
        match self {
            Resolved::None => None,
            Resolved::Borrowed(ident) => ident.visual(),
            Resolved::Owned(ident) => ident.visual(),
        }
    }

    pub(crate) fn assign_sid(&mut self, sid: &str) {
        match self {
            Resolved::None => {}
            Resolved::Borrowed(ident) => ident.assign_sid(sid.to_string()),
            Resolved::Owned(ident) => ident.assign_sid(sid.to_string()),
        }
    }
}

impl From<()> for IdentifierInput<'_> {
    fn from(_: ()) -> Self {
        IdentifierInput::None
    }
}

impl<'a> From<&'a mut SessionIdentifier> for IdentifierInput<'a> {
    fn from(ident: &'a mut SessionIdentifier) -> Self {
        IdentifierInput::Session(ident)
    }
}

impl From<VisualSessionIdentifier> for IdentifierInput<'_> {
    fn from(visual: VisualSessionIdentifier) -> Self {
        IdentifierInput::Visual(visual)
    }
}

impl From<(&str, Color)> for IdentifierInput<'_> {
    fn from((label, color): (&str, Color)) -> Self {
        IdentifierInput::LabelColor(label.to_string(), color)
    }
}

impl From<&str> for IdentifierInput<'_> {
    fn from(label: &str) -> Self {
        IdentifierInput::Label(label.to_string())
    }
}

use crate::page::NodeId;
use watchmark_core::MouseButton;
use watchmark_store::Toggled;

/// A pointer action as reported by the host, already reduced to the parts
/// the toggle handler needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerAction {
    pub button: MouseButton,
    pub alt_held: bool,
    pub target: NodeId,
}

/// What a pointer action did to the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Wrong button or modifier not held.
    Ignored,
    /// No anchor at or above the target.
    NoAnchor,
    /// Anchor found but its href carries no video id.
    NoVideoId,
    Toggled(Toggled),
}

/// An action qualifies when the modifier is held and the button is one of
/// the configured toggle buttons.
pub fn qualifies(action: &PointerAction, buttons: &[MouseButton]) -> bool {
    action.alt_held && buttons.contains(&action.button)
}

/// Hosts must intercept the context-menu action only when the secondary
/// button is configured; intercepting it suppresses the native menu for
/// that interaction.
pub fn intercepts_context_menu(buttons: &[MouseButton]) -> bool {
    buttons.contains(&MouseButton::Secondary)
}

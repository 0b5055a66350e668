//! Key and mouse button names used in scenario files

use bevy::prelude::*;

/// Resolve a scenario key name to a keyboard key (case-insensitive).
///
/// Letters and digits as one character (`"W"`, `"w"`, `"7"`); arrows as `Up`
/// or `ArrowUp`; plus `Space`, `Enter`, `Escape`, `Tab` and `Shift`.
pub fn parse_key(name: &str) -> Option<KeyCode> {
    let name = name.trim().to_ascii_lowercase();
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return letter_or_digit(c);
    }

    let key = match name.as_str() {
        "up" | "arrowup" => KeyCode::ArrowUp,
        "down" | "arrowdown" => KeyCode::ArrowDown,
        "left" | "arrowleft" => KeyCode::ArrowLeft,
        "right" | "arrowright" => KeyCode::ArrowRight,
        "space" => KeyCode::Space,
        "enter" => KeyCode::Enter,
        "escape" => KeyCode::Escape,
        "tab" => KeyCode::Tab,
        "shift" => KeyCode::ShiftLeft,
        _ => return None,
    };
    Some(key)
}

fn letter_or_digit(c: char) -> Option<KeyCode> {
    let key = match c.to_ascii_uppercase() {
        'A' => KeyCode::KeyA,
        'B' => KeyCode::KeyB,
        'C' => KeyCode::KeyC,
        'D' => KeyCode::KeyD,
        'E' => KeyCode::KeyE,
        'F' => KeyCode::KeyF,
        'G' => KeyCode::KeyG,
        'H' => KeyCode::KeyH,
        'I' => KeyCode::KeyI,
        'J' => KeyCode::KeyJ,
        'K' => KeyCode::KeyK,
        'L' => KeyCode::KeyL,
        'M' => KeyCode::KeyM,
        'N' => KeyCode::KeyN,
        'O' => KeyCode::KeyO,
        'P' => KeyCode::KeyP,
        'Q' => KeyCode::KeyQ,
        'R' => KeyCode::KeyR,
        'S' => KeyCode::KeyS,
        'T' => KeyCode::KeyT,
        'U' => KeyCode::KeyU,
        'V' => KeyCode::KeyV,
        'W' => KeyCode::KeyW,
        'X' => KeyCode::KeyX,
        'Y' => KeyCode::KeyY,
        'Z' => KeyCode::KeyZ,
        '0' => KeyCode::Digit0,
        '1' => KeyCode::Digit1,
        '2' => KeyCode::Digit2,
        '3' => KeyCode::Digit3,
        '4' => KeyCode::Digit4,
        '5' => KeyCode::Digit5,
        '6' => KeyCode::Digit6,
        '7' => KeyCode::Digit7,
        '8' => KeyCode::Digit8,
        '9' => KeyCode::Digit9,
        _ => return None,
    };
    Some(key)
}

/// Resolve a scenario mouse button name (case-insensitive)
pub fn parse_button(name: &str) -> Option<MouseButton> {
    match name.trim().to_ascii_lowercase().as_str() {
        "left" => Some(MouseButton::Left),
        "right" => Some(MouseButton::Right),
        "middle" => Some(MouseButton::Middle),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters_and_arrows() {
        assert_eq!(parse_key("W"), Some(KeyCode::KeyW));
        assert_eq!(parse_key("w"), Some(KeyCode::KeyW));
        assert_eq!(parse_key("Up"), Some(KeyCode::ArrowUp));
        assert_eq!(parse_key("ArrowLeft"), Some(KeyCode::ArrowLeft));
        assert_eq!(parse_key("7"), Some(KeyCode::Digit7));
    }

    #[test]
    fn test_names_ignore_case() {
        assert_eq!(parse_key("up"), Some(KeyCode::ArrowUp));
        assert_eq!(parse_key("arrowleft"), Some(KeyCode::ArrowLeft));
        assert_eq!(parse_key("ARROWRIGHT"), Some(KeyCode::ArrowRight));
        assert_eq!(parse_key("space"), Some(KeyCode::Space));
        assert_eq!(parse_key("ESCAPE"), Some(KeyCode::Escape));
    }

    #[test]
    fn test_arrow_prefix_only_for_arrows() {
        assert_eq!(parse_key("ArrowSpace"), None);
        assert_eq!(parse_key("ArrowShift"), None);
        assert_eq!(parse_key("ArrowW"), None);
    }

    #[test]
    fn test_unknown_names() {
        assert_eq!(parse_key(""), None);
        assert_eq!(parse_key("Arrow"), None);
        assert_eq!(parse_key("F13"), None);
        assert_eq!(parse_key("?"), None);
        assert_eq!(parse_button("thumb"), None);
        assert_eq!(parse_button("Left"), Some(MouseButton::Left));
    }
}

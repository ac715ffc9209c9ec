use control_protocol::ControlMessage;
use winit::keyboard::Key;

/// Control message bound to a typed character, if any.
pub fn message_for_text(text: &str) -> Option<ControlMessage> {
    let message = match text {
        "p" | "P" => ControlMessage::TogglePresentMode,
        "v" | "V" => ControlMessage::ToggleVsync,
        "t" | "T" => ControlMessage::ToggleBufferDepth,
        "s" | "S" => ControlMessage::ToggleScroll,
        "=" | "+" => ControlMessage::ZoomIn,
        "-" | "_" => ControlMessage::ZoomOut,
        _ => return None,
    };
    Some(message)
}

pub fn message_for_key(key: &Key) -> Option<ControlMessage> {
    match key {
        Key::Character(text) => message_for_text(text.as_str()),
        _ => None,
    }
}

use control_protocol::{ControlMessage, LoopControl};
use graph_model::{PresentMode, PresentationConfig};

use crate::FrameRenderer;

/// Applies one drained message. Toggles log the state they switched to.
pub fn apply_message<R: FrameRenderer>(
    config: &mut PresentationConfig,
    renderer: &mut R,
    message: ControlMessage,
) -> LoopControl {
    match message {
        ControlMessage::Stop => return LoopControl::Stop,
        ControlMessage::SetVsync(vsync) => config.vsync = vsync,
        ControlMessage::SetPresentMode(present_mode) => config.present_mode = present_mode,
        ControlMessage::SetBufferDepth(buffer_depth) => config.buffer_depth = buffer_depth,
        ControlMessage::SetScroll(scroll) => config.scroll = scroll,
        ControlMessage::SetWindowSize(window_size) => {
            let applied = config.set_window_size(window_size);
            if applied != window_size {
                log::debug!(
                    "[render_loop] window size {window_size} clamped to {applied} (max {})",
                    config.max_window_size()
                );
            }
        }
        ControlMessage::ToggleVsync
        | ControlMessage::TogglePresentMode
        | ControlMessage::ToggleBufferDepth
        | ControlMessage::ToggleScroll
        | ControlMessage::ZoomIn
        | ControlMessage::ZoomOut => {
            let notice = apply_toggle(config, message);
            log::info!("{notice}");
        }
        ControlMessage::ResizeSurface { width, height } => {
            renderer.resize_surface(width, height);
        }
    }
    LoopControl::Continue
}

/// Flips the setting `message` names and describes its new state.
fn apply_toggle(config: &mut PresentationConfig, message: ControlMessage) -> String {
    match message {
        ControlMessage::ToggleVsync => format!("[render_loop] vsync: {}", config.toggle_vsync()),
        ControlMessage::TogglePresentMode => match config.toggle_present_mode() {
            PresentMode::Synchronous => "[render_loop] present mode: Synchronous".to_owned(),
            PresentMode::Scheduled => "[render_loop] present mode: Scheduled, latencies exclude \
                 waiting for the previous frame's present"
                .to_owned(),
        },
        ControlMessage::ToggleBufferDepth => {
            format!("[render_loop] buffer depth: {:?}", config.toggle_buffer_depth())
        }
        ControlMessage::ToggleScroll => format!("[render_loop] scroll: {}", config.toggle_scroll()),
        ControlMessage::ZoomIn => format!("[render_loop] window: {}", config.zoom_in()),
        ControlMessage::ZoomOut => format!("[render_loop] window: {}", config.zoom_out()),
        other => unreachable!("{other:?} is not a toggle"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_notices_carry_the_loop_tag() {
        let mut config = PresentationConfig::new(1024);
        for message in [
            ControlMessage::ToggleVsync,
            ControlMessage::TogglePresentMode,
            ControlMessage::ToggleBufferDepth,
            ControlMessage::ToggleScroll,
            ControlMessage::ZoomIn,
            ControlMessage::ZoomOut,
        ] {
            let notice = apply_toggle(&mut config, message);
            assert!(notice.starts_with("[render_loop] "), "{notice}");
        }
    }

    #[test]
    fn scheduled_notice_mentions_excluded_wait() {
        let mut config = PresentationConfig::new(1024);
        config.present_mode = PresentMode::Synchronous;
        let notice = apply_toggle(&mut config, ControlMessage::TogglePresentMode);
        assert_eq!(config.present_mode, PresentMode::Scheduled);
        assert!(notice.contains("exclude waiting"), "{notice}");

        let notice = apply_toggle(&mut config, ControlMessage::TogglePresentMode);
        assert_eq!(notice, "[render_loop] present mode: Synchronous");
    }
}

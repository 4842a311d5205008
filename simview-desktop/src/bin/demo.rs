//! Minimal interactive host: renders a small scene and logs every input
//! event until the window is closed.
//!
//! Run with: RUST_LOG=info cargo run -p simview-desktop --bin demo

use std::time::Duration;

use log::info;
use simview_core::{geometry::WHITE, InputEvent, WindowConfig};
use simview_desktop::WindowView;

const SCENE: &str = r##"
<svg width="320" height="240">
    <rect id="floor" x="0" y="200" width="320" height="40" fill="#888888"/>
    <g id="agents">
        <circle id="agent-1" cx="80" cy="180" r="20" fill="#cc3333"/>
        <circle id="agent-2" cx="200" cy="180" r="20" fill="#3333cc"/>
    </g>
</svg>"##;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = WindowConfig {
        title: "simview demo".to_string(),
        ..WindowConfig::default()
    };
    let mut view = WindowView::new(config, None)?;
    view.update_from_str(SCENE)?;

    while view.is_open() {
        for event in view.poll_events() {
            info!("{event:?}");
            if matches!(event, InputEvent::WindowClose(_)) {
                view.close();
            }
        }
        if view.is_open() {
            view.render(WHITE)?;
        }
        // ~30 cycles per second, pacing is up to the host.
        std::thread::sleep(Duration::from_millis(33));
    }
    Ok(())
}

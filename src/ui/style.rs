use gtk4::gdk::Display;
use gtk4::{CssProvider, STYLE_PROVIDER_PRIORITY_APPLICATION};

const GALLERY_CSS: &str = r#"
.menu-button {
    min-width: 220px;
    padding: 10px 16px;
}

.gallery-grid {
    background-color: #000000;
}

.gallery-thumb {
    transition: transform 300ms ease-out, border-radius 300ms ease-out;
}

.gallery-thumb picture {
    background-color: #1a1a1a;
}

.gallery-thumb.selected {
    border-radius: 20px;
    transform: scale(0.9);
}

.gallery-thumb.selected picture {
    border-radius: 20px;
}

.gallery-thumb.pulse {
    transform: scale(0.85);
}

.gallery-thumb.pulse-out {
    transform: scale(1.1);
}

.duration-label {
    color: #ffffff;
    font-size: 11px;
    font-weight: bold;
    text-shadow: 0 0 2px rgba(0, 0, 0, 0.8);
}

.rank-badge {
    min-width: 22px;
    min-height: 22px;
    border-radius: 11px;
    background-color: #0a84ff;
    color: #ffffff;
    font-size: 12px;
    font-weight: bold;
}

.load-error {
    color: #ff6b6b;
    padding: 8px;
}
"#;

/// Install the gallery stylesheet on the default display.
pub fn load_css() {
    let provider = CssProvider::new();
    provider.load_from_string(GALLERY_CSS);

    if let Some(display) = Display::default() {
        gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    }
}

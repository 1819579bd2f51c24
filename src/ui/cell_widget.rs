// Gallery cell: square thumbnail with duration label and selection badge.
// One widget per GridView list item; the widget is recycled across positions.

use gdk4::Texture;
use glib::Object;
use gtk4::prelude::*;
use gtk4::subclass::prelude::*;
use gtk4::{gdk, glib, Align, Box as GtkBox, ContentFit, Label, Orientation, Overlay, Picture};
use std::cell::Cell;
use std::sync::OnceLock;
use std::time::Duration;

use crate::grid::{CellContent, CellId};
use crate::thumbnails::Thumbnail;

/// Pixels per layout unit; one gutter becomes three pixels.
const PIXELS_PER_UNIT: f32 = 3.0;
const PULSE: Duration = Duration::from_millis(300);

fn placeholder_texture() -> &'static Texture {
    static PLACEHOLDER: OnceLock<Texture> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        let edge = 64;
        let pixels: Vec<u8> = [0x1a, 0x1a, 0x1a, 0xff].repeat(edge * edge);
        let bytes = glib::Bytes::from_owned(pixels);
        gdk::MemoryTexture::new(
            edge as i32,
            edge as i32,
            gdk::MemoryFormat::R8g8b8a8,
            &bytes,
            edge * 4,
        )
        .upcast()
    })
}

fn texture_from_thumbnail(thumbnail: &Thumbnail) -> Option<Texture> {
    if thumbnail.width == 0 || thumbnail.height == 0 {
        return None;
    }
    if thumbnail.rgba.len() < thumbnail.stride() * thumbnail.height as usize {
        return None;
    }
    let bytes = glib::Bytes::from(&thumbnail.rgba[..]);
    let texture = gdk::MemoryTexture::new(
        thumbnail.width as i32,
        thumbnail.height as i32,
        gdk::MemoryFormat::R8g8b8a8,
        &bytes,
        thumbnail.stride(),
    );
    Some(texture.upcast())
}

fn pulse_class(rank: Option<usize>) -> &'static str {
    match rank {
        Some(_) => "pulse",
        None => "pulse-out",
    }
}

fn pixels(units: f32) -> i32 {
    (units * PIXELS_PER_UNIT).round() as i32
}

mod imp {
    use super::*;

    #[derive(Default)]
    pub struct CellWidgetInner {
        pub cell: Cell<u64>,
        pub overlay: Overlay,
        pub picture: Picture,
        pub duration: Label,
        pub badge: Label,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for CellWidgetInner {
        const NAME: &'static str = "PhotopickCellWidget";
        type Type = super::CellWidget;
        type ParentType = GtkBox;
    }

    impl ObjectImpl for CellWidgetInner {
        fn constructed(&self) {
            self.parent_constructed();

            let obj = self.obj();
            obj.set_orientation(Orientation::Vertical);
            obj.add_css_class("gallery-cell");

            self.picture.set_can_shrink(true);
            self.picture.set_content_fit(ContentFit::Cover);
            self.picture.set_paintable(Some(placeholder_texture()));
            self.overlay.set_child(Some(&self.picture));
            self.overlay.add_css_class("gallery-thumb");

            self.duration.set_halign(Align::End);
            self.duration.set_valign(Align::End);
            self.duration.set_margin_end(6);
            self.duration.set_margin_bottom(4);
            self.duration.add_css_class("duration-label");
            self.duration.set_visible(false);
            self.overlay.add_overlay(&self.duration);

            self.badge.set_halign(Align::End);
            self.badge.set_valign(Align::Start);
            self.badge.set_margin_end(6);
            self.badge.set_margin_top(6);
            self.badge.add_css_class("rank-badge");
            self.badge.set_visible(false);
            self.overlay.add_overlay(&self.badge);

            obj.append(&self.overlay);
        }
    }

    impl WidgetImpl for CellWidgetInner {}
    impl BoxImpl for CellWidgetInner {}
}

glib::wrapper! {
    pub struct CellWidget(ObjectSubclass<imp::CellWidgetInner>)
        @extends GtkBox, gtk4::Widget,
        @implements gtk4::Accessible, gtk4::Buildable, gtk4::ConstraintTarget, gtk4::Orientable;
}

impl CellWidget {
    pub fn new(cell: CellId) -> Self {
        let obj: Self = Object::builder().build();
        obj.imp().cell.set(cell.0);
        obj
    }

    pub fn cell_id(&self) -> CellId {
        CellId(self.imp().cell.get())
    }

    /// Square edge of the thumbnail in pixels.
    pub fn set_edge(&self, edge: i32) {
        self.imp().overlay.set_size_request(-1, edge.max(1));
    }

    /// Show a freshly bound asset with the placeholder image.
    pub fn show_content(&self, content: &CellContent) {
        let imp = self.imp();
        self.set_margin_bottom(pixels(content.insets.bottom));
        self.set_margin_start(pixels(content.insets.leading));
        self.set_margin_end(pixels(content.insets.trailing));

        imp.picture.set_paintable(Some(placeholder_texture()));
        match content.duration_label.as_deref() {
            Some(label) => {
                imp.duration.set_text(label);
                imp.duration.set_visible(true);
            }
            None => imp.duration.set_visible(false),
        }
        self.show_rank(content.rank);
    }

    pub fn set_thumbnail(&self, thumbnail: &Thumbnail) {
        if let Some(texture) = texture_from_thumbnail(thumbnail) {
            self.imp().picture.set_paintable(Some(&texture));
        }
    }

    pub fn set_badge(&self, rank: Option<usize>, animate: bool) {
        self.show_rank(rank);
        if !animate {
            return;
        }

        // Selecting shrinks past the resting scale, deselecting overshoots to 1.1.
        let class = pulse_class(rank);
        let overlay = &self.imp().overlay;
        overlay.add_css_class(class);
        let weak = overlay.downgrade();
        glib::timeout_add_local_once(PULSE, move || {
            if let Some(overlay) = weak.upgrade() {
                overlay.remove_css_class(class);
            }
        });
    }

    fn show_rank(&self, rank: Option<usize>) {
        let imp = self.imp();
        match rank {
            Some(rank) => {
                imp.badge.set_text(&rank.to_string());
                imp.badge.set_visible(true);
                imp.overlay.add_css_class("selected");
            }
            None => {
                imp.badge.set_visible(false);
                imp.overlay.remove_css_class("selected");
            }
        }
    }

    /// Back to the empty state.
    pub fn reset(&self) {
        let imp = self.imp();
        imp.picture.set_paintable(Some(placeholder_texture()));
        imp.duration.set_visible(false);
        self.show_rank(None);
    }
}

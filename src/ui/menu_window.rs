// Entry window with one button per gallery mode.

use gtk4::prelude::*;
use gtk4::{Align, Application, ApplicationWindow, Box as GtkBox, Button, HeaderBar, Orientation};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use tokio::runtime::Handle;

use super::gallery_window::GalleryWindow;
use super::style::load_css;
use crate::grid::GridMode;
use crate::library::AssetSource;

pub struct MenuWindow {
    self_weak: RefCell<Weak<MenuWindow>>,
    window: ApplicationWindow,
    source: Arc<dyn AssetSource>,
    runtime: Handle,
    thumb_size: u32,
    gallery: RefCell<Option<Rc<GalleryWindow>>>,
}

impl MenuWindow {
    pub fn new(
        app: &Application,
        source: Arc<dyn AssetSource>,
        runtime: Handle,
        thumb_size: u32,
    ) -> Rc<Self> {
        load_css();

        let window = ApplicationWindow::builder()
            .application(app)
            .title("photopick")
            .default_width(360)
            .default_height(240)
            .build();
        window.set_titlebar(Some(&HeaderBar::new()));

        let content = GtkBox::new(Orientation::Vertical, 12);
        content.set_halign(Align::Center);
        content.set_valign(Align::Center);

        let single = Button::with_label("Gallery");
        let multi = Button::with_label("Multiselection Gallery");
        for button in [&single, &multi] {
            button.add_css_class("menu-button");
            content.append(button);
        }
        window.set_child(Some(&content));

        let menu = Rc::new(Self {
            self_weak: RefCell::new(Weak::new()),
            window,
            source,
            runtime,
            thumb_size,
            gallery: RefCell::new(None),
        });
        *menu.self_weak.borrow_mut() = Rc::downgrade(&menu);

        for (button, mode) in [(single, GridMode::Single), (multi, GridMode::Multi)] {
            let weak = Rc::downgrade(&menu);
            button.connect_clicked(move |_| {
                if let Some(menu) = weak.upgrade() {
                    menu.open_gallery(mode);
                }
            });
        }

        menu
    }

    pub fn present(&self) {
        self.window.present();
    }

    fn open_gallery(&self, mode: GridMode) {
        if self.gallery.borrow().is_some() {
            return;
        }
        tracing::info!(?mode, "Opening gallery");

        let gallery = GalleryWindow::new(
            &self.window,
            Arc::clone(&self.source),
            mode,
            self.runtime.clone(),
            self.thumb_size,
        );
        let weak = self.self_weak.borrow().clone();
        gallery.connect_closed(move || {
            if let Some(menu) = weak.upgrade() {
                menu.gallery.replace(None);
            }
        });
        gallery.present();
        self.gallery.replace(Some(gallery));
    }
}

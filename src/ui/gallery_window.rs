// Modal gallery screen: a three-column GridView driven by AssetGridController.

use gtk4::prelude::*;
use gtk4::{
    gio, glib, AlertDialog, Box as GtkBox, GridView, HeaderBar, Label, ListItem,
    ListScrollFlags, NoSelection, Orientation, PolicyType, ScrolledWindow, SignalListItemFactory,
    Window,
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::Path;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use tokio::runtime::Handle;

use super::asset_object::{resize_model, AssetObject};
use super::cell_widget::CellWidget;
use crate::grid::layout::{cell_edge, COLUMNS};
use crate::grid::{AssetGridController, CellId, GridMode, ViewUpdate};
use crate::library::AssetSource;

const DEFAULT_WIDTH: i32 = 420;
const DEFAULT_HEIGHT: i32 = 760;

pub struct GalleryWindow {
    self_weak: RefCell<Weak<GalleryWindow>>,
    window: Window,
    scrolled: ScrolledWindow,
    grid_view: GridView,
    model: gio::ListStore,
    error_label: Label,
    controller: RefCell<AssetGridController>,
    cells: RefCell<HashMap<CellId, CellWidget>>,
    next_cell: Cell<u64>,
}

impl GalleryWindow {
    pub fn new(
        parent: &impl IsA<gtk4::Window>,
        source: Arc<dyn AssetSource>,
        mode: GridMode,
        runtime: Handle,
        thumb_size: u32,
    ) -> Rc<Self> {
        let window = Window::builder()
            .title(mode.title())
            .transient_for(parent)
            .modal(true)
            .default_width(DEFAULT_WIDTH)
            .default_height(DEFAULT_HEIGHT)
            .build();
        window.set_titlebar(Some(&HeaderBar::new()));

        let model = gio::ListStore::new::<AssetObject>();
        let factory = SignalListItemFactory::new();
        let grid_view = GridView::new(Some(NoSelection::new(Some(model.clone()))), Some(factory.clone()));
        grid_view.set_min_columns(COLUMNS as u32);
        grid_view.set_max_columns(COLUMNS as u32);
        grid_view.set_single_click_activate(true);
        grid_view.set_enable_rubberband(false);
        grid_view.add_css_class("gallery-grid");

        let scrolled = ScrolledWindow::builder()
            .hscrollbar_policy(PolicyType::Never)
            .vscrollbar_policy(PolicyType::Automatic)
            .kinetic_scrolling(true)
            .vexpand(true)
            .child(&grid_view)
            .build();

        let error_label = Label::new(None);
        error_label.add_css_class("load-error");
        error_label.set_wrap(true);
        error_label.set_visible(false);

        let content = GtkBox::new(Orientation::Vertical, 0);
        content.append(&error_label);
        content.append(&scrolled);
        window.set_child(Some(&content));

        let controller = AssetGridController::new(source, mode, runtime, thumb_size);
        let gallery = Rc::new(Self {
            self_weak: RefCell::new(Weak::new()),
            window,
            scrolled,
            grid_view,
            model,
            error_label,
            controller: RefCell::new(controller),
            cells: RefCell::new(HashMap::new()),
            next_cell: Cell::new(1),
        });
        *gallery.self_weak.borrow_mut() = Rc::downgrade(&gallery);

        gallery.setup_factory(&factory);
        gallery.setup_signals();
        gallery.spawn_event_loop();
        gallery
    }

    fn setup_factory(&self, factory: &SignalListItemFactory) {
        let weak = self.self_weak.borrow().clone();
        factory.connect_setup(move |_factory, list_item| {
            let Some(gallery) = weak.upgrade() else {
                return;
            };
            let Some(list_item) = list_item.downcast_ref::<ListItem>() else {
                return;
            };
            let cell = CellId(gallery.next_cell.get());
            gallery.next_cell.set(cell.0 + 1);

            let widget = CellWidget::new(cell);
            widget.set_edge(gallery.cell_edge_px());
            gallery.cells.borrow_mut().insert(cell, widget.clone());
            list_item.set_child(Some(&widget));
        });

        let weak = self.self_weak.borrow().clone();
        factory.connect_bind(move |_factory, list_item| {
            let Some(gallery) = weak.upgrade() else {
                return;
            };
            let Some((widget, item)) = cell_parts(list_item) else {
                return;
            };
            let updates = gallery
                .controller
                .borrow_mut()
                .bind_cell(widget.cell_id(), item.position());
            gallery.apply(updates);
        });

        let weak = self.self_weak.borrow().clone();
        factory.connect_unbind(move |_factory, list_item| {
            let Some(gallery) = weak.upgrade() else {
                return;
            };
            if let Some((widget, _)) = cell_parts(list_item) {
                gallery.controller.borrow_mut().unbind_cell(widget.cell_id());
                widget.reset();
            }
        });

        let weak = self.self_weak.borrow().clone();
        factory.connect_teardown(move |_factory, list_item| {
            let Some(list_item) = list_item.downcast_ref::<ListItem>() else {
                return;
            };
            if let Some(widget) = list_item.child().and_downcast::<CellWidget>() {
                if let Some(gallery) = weak.upgrade() {
                    gallery.cells.borrow_mut().remove(&widget.cell_id());
                }
            }
            list_item.set_child(Option::<&gtk4::Widget>::None);
        });
    }

    fn setup_signals(&self) {
        let weak = self.self_weak.borrow().clone();
        self.grid_view.connect_activate(move |_view, position| {
            if let Some(gallery) = weak.upgrade() {
                let updates = gallery
                    .controller
                    .borrow_mut()
                    .activate_cell(position as usize);
                gallery.apply(updates);
            }
        });

        let weak = self.self_weak.borrow().clone();
        self.window.connect_default_width_notify(move |_| {
            if let Some(gallery) = weak.upgrade() {
                let edge = gallery.cell_edge_px();
                for widget in gallery.cells.borrow().values() {
                    widget.set_edge(edge);
                }
            }
        });

        let weak = self.self_weak.borrow().clone();
        self.window.connect_close_request(move |_| {
            if let Some(gallery) = weak.upgrade() {
                gallery.controller.borrow_mut().deactivate();
            }
            glib::Propagation::Proceed
        });
    }

    fn spawn_event_loop(&self) {
        let receiver = self.controller.borrow().events();
        let weak = self.self_weak.borrow().clone();
        glib::spawn_future_local(async move {
            while let Ok(event) = receiver.recv().await {
                let Some(gallery) = weak.upgrade() else {
                    break;
                };
                let updates = gallery.controller.borrow_mut().handle_event(event);
                gallery.apply(updates);
            }
        });
    }

    /// Show the window and ask for library access.
    pub fn present(&self) {
        self.window.present();
        let updates = self.controller.borrow_mut().activate();
        self.apply(updates);
    }

    pub fn connect_closed<F: Fn() + 'static>(&self, callback: F) {
        self.window.connect_destroy(move |_| callback());
    }

    fn cell_edge_px(&self) -> i32 {
        let width = match self.scrolled.width() {
            w if w > 0 => w,
            _ => self.window.default_width().max(DEFAULT_WIDTH),
        };
        cell_edge(width as f32).round() as i32
    }

    fn cell(&self, cell: CellId) -> Option<CellWidget> {
        self.cells.borrow().get(&cell).cloned()
    }

    // Updates may re-enter the controller through the factory (model splices
    // bind new items), so no borrow is held while applying them.
    fn apply(&self, updates: Vec<ViewUpdate>) {
        for update in updates {
            match update {
                ViewUpdate::PermissionDenied => self.show_permission_alert(),
                ViewUpdate::LoadFailed(message) => {
                    self.error_label.set_text(&format!("Unable to load photos: {message}"));
                    self.error_label.set_visible(true);
                }
                ViewUpdate::Reload { count } => {
                    self.error_label.set_visible(false);
                    resize_model(&self.model, count);
                }
                ViewUpdate::ScrollTo(position) => {
                    // Wait for the grid to pick up the new item count.
                    let grid_view = self.grid_view.clone();
                    glib::idle_add_local_once(move || {
                        grid_view.scroll_to(position as u32, ListScrollFlags::NONE, None);
                    });
                }
                ViewUpdate::Cell { cell, content } => {
                    if let Some(widget) = self.cell(cell) {
                        widget.show_content(&content);
                    }
                }
                ViewUpdate::Thumbnail { cell, image } => {
                    if let Some(widget) = self.cell(cell) {
                        widget.set_thumbnail(&image);
                    }
                }
                ViewUpdate::Badge { cell, rank, animate } => {
                    if let Some(widget) = self.cell(cell) {
                        widget.set_badge(rank, animate);
                    }
                }
                ViewUpdate::Clear { cell } => {
                    if let Some(widget) = self.cell(cell) {
                        widget.reset();
                    }
                }
            }
        }
    }

    fn show_permission_alert(&self) {
        let dialog = AlertDialog::builder()
            .message("Unable to access photos")
            .detail("Please update permissions from Settings")
            .buttons(["Open Settings", "OK"])
            .default_button(0)
            .cancel_button(1)
            .modal(true)
            .build();

        let weak = self.self_weak.borrow().clone();
        dialog.choose(Some(&self.window), gio::Cancellable::NONE, move |choice| {
            if !matches!(choice, Ok(0)) {
                return;
            }
            if let Some(gallery) = weak.upgrade() {
                gallery.open_settings();
                let updates = gallery.controller.borrow_mut().retry();
                gallery.apply(updates);
            }
        });
    }

    /// Open the library location in the file manager so its permissions can be fixed.
    fn open_settings(&self) {
        let location = self.controller.borrow().source().location().map(Path::to_path_buf);
        let Some(target) = location
            .as_deref()
            .and_then(|path| path.ancestors().find(|p| p.exists()))
        else {
            tracing::warn!("Media library has no location to open");
            return;
        };

        let uri = gio::File::for_path(target).uri();
        if let Err(err) = gio::AppInfo::launch_default_for_uri(&uri, gio::AppLaunchContext::NONE) {
            tracing::warn!(error = %err, %uri, "Failed to open library location");
        }
    }
}

fn cell_parts(list_item: &glib::Object) -> Option<(CellWidget, AssetObject)> {
    let list_item = list_item.downcast_ref::<ListItem>()?;
    let widget = list_item.child().and_downcast::<CellWidget>()?;
    let item = list_item.item().and_downcast::<AssetObject>()?;
    Some((widget, item))
}

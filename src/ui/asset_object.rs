// GObject item for the gallery ListStore.
// Items carry only their grid position; what a position shows is decided by
// the controller's current snapshot.

use glib::Object;
use gtk4::prelude::*;
use gtk4::subclass::prelude::*;
use gtk4::{gio, glib};

mod imp {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    pub struct AssetObjectInner {
        pub position: Cell<u32>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for AssetObjectInner {
        const NAME: &'static str = "PhotopickAssetObject";
        type Type = super::AssetObject;
        type ParentType = glib::Object;
    }

    impl ObjectImpl for AssetObjectInner {}
}

glib::wrapper! {
    pub struct AssetObject(ObjectSubclass<imp::AssetObjectInner>);
}

impl AssetObject {
    pub fn new(position: u32) -> Self {
        let obj: Self = Object::builder().build();
        obj.imp().position.set(position);
        obj
    }

    pub fn position(&self) -> usize {
        self.imp().position.get() as usize
    }
}

impl Default for AssetObject {
    fn default() -> Self {
        Object::builder().build()
    }
}

/// Grow or shrink `model` to `count` items, leaving the head untouched so
/// bound cells and the scroll offset survive.
pub fn resize_model(model: &gio::ListStore, count: usize) {
    let current = model.n_items();
    let count = count as u32;
    if count > current {
        let added: Vec<AssetObject> = (current..count).map(AssetObject::new).collect();
        model.splice(current, 0, &added);
    } else if count < current {
        model.splice(count, current - count, &[] as &[AssetObject]);
    }
}

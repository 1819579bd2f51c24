mod asset_object;
mod cell_widget;
mod gallery_window;
mod menu_window;
mod style;

pub use gallery_window::GalleryWindow;
pub use menu_window::MenuWindow;

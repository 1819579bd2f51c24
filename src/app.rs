use gtk4::prelude::*;
use gtk4::Application;
use std::sync::Arc;
use tokio::runtime::Handle;

use crate::config::GalleryConfig;
use crate::library::{AssetSource, FolderLibrary};
use crate::ui::MenuWindow;

const APP_ID: &str = "com.photopick.Gallery";

pub struct PhotopickApp {
    app: Application,
}

impl PhotopickApp {
    pub fn new(config: GalleryConfig, runtime: Handle) -> Self {
        let app = Application::builder().application_id(APP_ID).build();

        app.connect_activate(move |app| {
            tracing::info!(
                library = %config.library_root.display(),
                album = %config.primary_album,
                "Starting gallery"
            );
            let source: Arc<dyn AssetSource> = Arc::new(FolderLibrary::new(&config));
            let window = MenuWindow::new(app, source, runtime.clone(), config.thumb_size);
            window.present();
            // Keep the window alive by storing it on the Application.
            unsafe {
                app.set_data("menu-window", window);
            }
        });

        Self { app }
    }

    /// Run the GTK main loop. Command-line arguments were already consumed
    /// by configuration loading, so GTK sees none.
    pub fn run(&self) -> i32 {
        let argv0 = std::env::args().next().unwrap_or_else(|| "photopick".to_string());
        self.app.run_with_args(&[argv0]).into()
    }
}

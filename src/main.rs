use std::sync::Mutex;

use eframe::egui;
use once_cell::sync::Lazy;

mod api;
mod gui;
mod models;
mod session;
mod stats;

use gui::state::AppState;
use session::SessionStore;

pub static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState::new()));
pub static SESSION: Lazy<SessionStore> =
    Lazy::new(|| SessionStore::new(session::default_store_dir()));

fn main() -> eframe::Result {
    env_logger::init();

    let builder = egui::ViewportBuilder::default()
        .with_title("Poll Admin")
        .with_inner_size(egui::vec2(1100.0, 720.0));

    let options = eframe::NativeOptions {
        viewport: builder,
        ..Default::default()
    };

    APP_STATE.lock().unwrap().restore_profile();

    eframe::run_simple_native("Poll Admin", options, move |ctx, _frame| {
        gui::ui_main(ctx);
    })
}

use engine::{resolve_app_paths, LoopConfig, Scene, StartupError};
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::assets::DiskAssets;
use super::menu::MenuScene;
use super::overworld::OverworldScene;
use super::settings::GameSettings;

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) menu: Box<dyn Scene>,
    pub(crate) overworld: Box<dyn Scene>,
}

pub(crate) fn build_app() -> Result<AppWiring, StartupError> {
    init_tracing();
    info!("=== Quimera Startup ===");

    let paths = resolve_app_paths()?;
    let settings = GameSettings::from_env();
    info!(
        root = %paths.root.display(),
        assets = %paths.assets_dir.display(),
        start_map = %settings.start_map,
        "paths_resolved"
    );

    let config = LoopConfig {
        assets_dir: paths.assets_dir.clone(),
        ..LoopConfig::default()
    };
    let menu = MenuScene::new(
        Box::new(DiskAssets::new(&paths)),
        (config.window_width, config.window_height),
    );
    let overworld = OverworldScene::new(settings, Box::new(DiskAssets::new(&paths)));

    Ok(AppWiring {
        config,
        menu: Box::new(menu),
        overworld: Box::new(overworld),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

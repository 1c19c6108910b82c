use std::path::PathBuf;

use cavegen::Engine;
use cavegen::logging::init_logging;
use tracing::{error, info};

fn main() {
    init_logging(None);

    let args: Vec<String> = std::env::args().collect();

    let width: u32 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(1280);
    let height: u32 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(720);
    let blob_count: i32 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(1);
    let cave_count: usize = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0);
    let seed: Option<u64> = args.get(5).and_then(|s| s.parse().ok());
    let out: PathBuf = args
        .get(6)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("terrain.png"));

    let engine = match seed {
        Some(seed) => Engine::with_seed(width, height, seed),
        None => Engine::new(width, height),
    };
    let mut engine = match engine {
        Ok(engine) => engine,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    info!(width, height, blob_count, cave_count, ?seed, "generating terrain");

    engine.set_blob_count(blob_count);
    engine.set_cave_count(cave_count);
    for (i, cave) in engine.caves().iter().enumerate() {
        info!(
            index = i,
            x = cave.position[0],
            y = cave.position[1],
            rotation = cave.rotation,
            scale = cave.scale_variant,
            "cave"
        );
    }

    let canvas = engine.generate_terrain();
    info!(opaque = canvas.opaque_pixel_count(), "rendered");

    if let Err(e) = canvas.to_image().save(&out) {
        error!("failed to save {}: {e}", out.display());
        std::process::exit(1);
    }
    info!("saved {}", out.display());
}

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use base64::Engine as _;
use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{error, info};

use cavegen::logging::init_logging;
use cavegen::{Canvas, Cave, Engine, Params};

const MAX_SIDE: u32 = 4096;

#[derive(Deserialize)]
struct GenerateRequest {
    seed: Option<u64>,
    width: Option<u32>,
    height: Option<u32>,
    // Terrain
    point_count: Option<usize>,
    base_radius: Option<u32>,
    horizontal_stretch: Option<f32>,
    noise_frequency: Option<f32>,
    noise_amplitude: Option<f32>,
    blob_count: Option<i32>,
    blob_spacing: Option<f32>,
    // Caves
    caves_enabled: Option<bool>,
    cave_scale: Option<f32>,
    cave_noise_frequency: Option<f32>,
    cave_noise_amplitude: Option<f32>,
    cave_count: Option<usize>,
    cave_point_count: Option<usize>,
    selected_cave: Option<usize>,
    /// Pose for the selected cave: `[scale_variant, rotation, noise_offset]`.
    selected_pose: Option<[f32; 3]>,
}

impl GenerateRequest {
    fn params(&self, defaults: Params) -> Params {
        Params {
            point_count: self.point_count.unwrap_or(defaults.point_count),
            base_radius: self.base_radius.unwrap_or(defaults.base_radius),
            horizontal_stretch: self.horizontal_stretch.unwrap_or(defaults.horizontal_stretch),
            noise_frequency: self.noise_frequency.unwrap_or(defaults.noise_frequency),
            noise_amplitude: self.noise_amplitude.unwrap_or(defaults.noise_amplitude),
            blob_count: self.blob_count.unwrap_or(defaults.blob_count),
            blob_spacing: self.blob_spacing.unwrap_or(defaults.blob_spacing),
            caves_enabled: self.caves_enabled.unwrap_or(defaults.caves_enabled),
            cave_scale: self.cave_scale.unwrap_or(defaults.cave_scale),
            cave_noise_frequency: self.cave_noise_frequency.unwrap_or(defaults.cave_noise_frequency),
            cave_noise_amplitude: self.cave_noise_amplitude.unwrap_or(defaults.cave_noise_amplitude),
            cave_count: self.cave_count.unwrap_or(defaults.cave_count),
            cave_point_count: self.cave_point_count.unwrap_or(defaults.cave_point_count),
            selected_cave: self.selected_cave.or(defaults.selected_cave),
        }
        .clamped()
    }
}

#[derive(Serialize)]
struct GenerateResponse {
    data_url: String,
    caves: Vec<Cave>,
    selected_cave: Option<usize>,
    params: Params,
    width: u32,
    height: u32,
    ms: f64,
}

fn encode_png(canvas: &Canvas) -> Result<String, image::ImageError> {
    let mut buf = Vec::new();
    let (w, h) = canvas.dimensions();
    PngEncoder::new(&mut buf).write_image(canvas.pixels(), w, h, image::ExtendedColorType::Rgba8)?;
    let b64 = base64::engine::general_purpose::STANDARD.encode(&buf);
    Ok(format!("data:image/png;base64,{}", b64))
}

fn generate(req: GenerateRequest) -> Result<GenerateResponse, (StatusCode, String)> {
    let width = req.width.unwrap_or(800).clamp(1, MAX_SIDE);
    let height = req.height.unwrap_or(600).clamp(1, MAX_SIDE);
    let seed = req.seed.unwrap_or(42);

    let mut engine = Engine::with_seed(width, height, seed)
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;
    engine.apply(&req.params(Params::for_canvas(width, height)));
    if let Some([scale, rotation, offset]) = req.selected_pose {
        engine.update_selected_cave(scale, rotation, offset);
    }

    let t = Instant::now();
    let canvas = engine.generate_terrain();
    let ms = t.elapsed().as_secs_f64() * 1000.0;
    let data_url =
        encode_png(canvas).map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(GenerateResponse {
        data_url,
        caves: engine.caves().to_vec(),
        selected_cave: engine.selected_cave_index(),
        params: engine.params(),
        width,
        height,
        ms,
    })
}

async fn generate_handler(
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, (StatusCode, String)> {
    let response = tokio::task::spawn_blocking(move || generate(req))
        .await
        .map_err(|e| {
            error!("generate task failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })??;
    Ok(Json(response))
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_logging(None);

    let frontend = ServeDir::new("frontend");

    let app = Router::new()
        .route("/api/generate", post(generate_handler))
        .fallback_service(frontend)
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("cavegen server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

use aur::{
    cli,
    config::{AppConfig, Backend},
    engine,
    graphics::{DeviceContext, GpuDevice, HeadlessDevice, RenderSystem, Renderer, WgpuDevice},
    scene::{
        AttachContext, MaterialAsset, MaterialRef, MeshComponent, Scene, SceneSystem,
        TransformComponent, World,
    },
    screen::{VideoScreen, VIDEO_TEXTURE_PARAMETER},
    video::{TestPatternDriver, VideoDriver},
    LOG_TARGET, VERSION,
};
use aur_utils::AnyResult;
use clap::Parser;
use glam::Vec3;
use log::*;
use std::sync::Arc;

fn main() -> AnyResult<()> {
    pretty_env_logger::formatted_builder()
        .format_indent(None)
        .format_timestamp(None)
        .filter_level(LevelFilter::Info)
        .filter_module(LOG_TARGET, LevelFilter::Trace)
        .filter_module("wgpu_hal", LevelFilter::Off)
        .filter_module("wgpu_core", LevelFilter::Error)
        .filter_module("naga", LevelFilter::Off)
        .parse_default_env()
        .init();

    let args = cli::Args::parse();
    info!("Welcome to AUR {VERSION}");

    let mut config = AppConfig::load(&args.config)?;
    if let Some(frames) = args.frames {
        config.engine.frames = frames;
    }
    if args.headless {
        config.engine.backend = Backend::Headless;
    }

    let device = create_device(config.engine.backend);
    let driver = Arc::new(TestPatternDriver::start(&config.driver));

    let limiter = engine::FrameLimiter::new(config.engine.frames, config.engine.frame_rate);
    let (engine_context, engine_thread_handle) = engine::start(move |builder| {
        builder
            .with_system(RenderSystem::new(device))
            .with_system(SceneSystem::new())
            .with_system(limiter);
    });

    {
        let gs = engine_context.globals.read();
        let renderer = gs.get::<Renderer>();
        let mut world = gs.write::<World>();

        let material = MaterialAsset::new("Video Screen")
            .with_texture_parameter(VIDEO_TEXTURE_PARAMETER, None)
            .build();
        let mesh = MeshComponent::new("Screen Quad").with_material(MaterialRef::Shared(material));
        let screen = VideoScreen::new("Main Screen", mesh, config.screen.clone()).with_transform(
            TransformComponent::from_translation(Vec3::new(0.0, 0.0, config.placement.distance)),
        );

        let mut scene = Scene::new("Stage");
        let handle = scene.add(screen);
        if let Some((screen, scene_handle)) = scene.get_with_handle(handle) {
            let driver: Arc<dyn VideoDriver> = driver.clone();
            screen.attach(
                Some(driver),
                &AttachContext {
                    scene: Some(scene_handle),
                    renderer,
                },
            );
        }
        world.add_scene(scene);
    }

    if engine_thread_handle.join().is_err() {
        error!("The engine thread panicked");
    }
    info!("Ran {} frames, shutting down", engine_context.frame_count());

    driver.shutdown();
    Ok(())
}

fn create_device(backend: Backend) -> Arc<dyn GpuDevice> {
    if backend == Backend::Wgpu {
        match DeviceContext::create_headless() {
            Ok(dc) => return Arc::new(WgpuDevice::new(dc)),
            Err(err) => warn!("{err}, falling back to the headless renderer"),
        }
    }
    Arc::new(HeadlessDevice::new())
}

use std::any::Any;
use std::env;
use std::ffi::CString;
use std::fmt;
use std::num::NonZeroU32;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use glutin::config::ConfigTemplateBuilder;
use glutin::context::{ContextApi, ContextAttributesBuilder, Version};
use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin::surface::{SurfaceAttributesBuilder, WindowSurface};
use glutin_winit::DisplayBuilder;
use log::error;
use raw_window_handle::HasRawWindowHandle;
use winit::dpi::LogicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use schematic_gl::{cube_outline, layout_text, Scene, DEFAULT_TEXT_SCALE};

const CUBE_SIZE: (f32, f32, f32) = (2.0, 2.0, 2.0);
const LABEL_TEXT: &str = "schematic-gl";
const LABEL_ANCHOR: Vec3 = Vec3::new(-1.5, 1.25, 0.0);
const ORBIT_RADIUS: f32 = 3.2;

#[rustfmt::skip]
const AXIS_POINTS: [f32; 18] = [
    0.0, 0.0, 0.0,  1.5, 0.0, 0.0,
    0.0, 0.0, 0.0,  0.0, 1.5, 0.0,
    0.0, 0.0, 0.0,  0.0, 0.0, 1.5,
];

#[rustfmt::skip]
const AXIS_COLORS: [u8; 24] = [
    255, 0, 0, 255,  255, 0, 0, 255,
    0, 255, 0, 255,  0, 255, 0, 255,
    0, 0, 255, 255,  0, 0, 255, 255,
];

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    if options.summary_only {
        return run_summary();
    }
    match run_windowed(options.frames) {
        Ok(()) => Ok(()),
        Err(err) => {
            if err.downcast_ref::<WindowInitError>().is_some() {
                eprintln!(
                    "{err}. Falling back to --summary-only mode (set DISPLAY or install GL \
                     libraries to enable rendering)."
                );
                run_summary()
            } else {
                Err(err)
            }
        }
    }
}

fn run_summary() -> Result<()> {
    print_scene_summary();
    Ok(())
}

fn print_scene_summary() {
    let cube = cube_outline(CUBE_SIZE.0, CUBE_SIZE.1, CUBE_SIZE.2);
    let label = layout_text(LABEL_ANCHOR, LABEL_TEXT, DEFAULT_TEXT_SCALE);
    println!("Demo scene drawables:");
    println!(
        " - cube outline {:.1}x{:.1}x{:.1}: {} corners, {} edges",
        CUBE_SIZE.0,
        CUBE_SIZE.1,
        CUBE_SIZE.2,
        cube.positions.len() / 3,
        cube.indices.len() / 2,
    );
    println!(" - axis lines: {} segments", AXIS_POINTS.len() / 6);
    println!(
        " - label {:?}: {} glyphs, {} vertices",
        LABEL_TEXT,
        LABEL_TEXT.chars().count(),
        label.vertex_count(),
    );
}

fn build_demo_scene(gl: Rc<glow::Context>) -> Result<Scene> {
    let mut scene = Scene::new(gl);
    scene.set_background([0.05, 0.05, 0.08, 1.0]);
    scene
        .add_line_cube(CUBE_SIZE.0, CUBE_SIZE.1, CUBE_SIZE.2)
        .context("failed to build cube drawable")?;
    scene
        .add_lines(&AXIS_POINTS, &AXIS_COLORS, 2.0)
        .context("failed to build axis drawable")?;
    scene
        .add_text(LABEL_ANCHOR, LABEL_TEXT)
        .context("failed to build label drawable")?;
    Ok(scene)
}

fn run_windowed(frame_limit: Option<u64>) -> Result<()> {
    let event_loop =
        EventLoop::new().map_err(|err| WindowInitError::from_error("event loop", err))?;
    let window_builder = WindowBuilder::new()
        .with_title("schematic-gl demo")
        .with_inner_size(LogicalSize::new(960.0, 720.0));
    let template = ConfigTemplateBuilder::new();
    let display_builder = DisplayBuilder::new().with_window_builder(Some(window_builder));

    // The config picker must return a value, so an empty candidate list can
    // only panic; catch it so this stage fails like every other init stage.
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let built = panic::catch_unwind(AssertUnwindSafe(|| {
        display_builder.build(&event_loop, template, |configs| {
            configs
                .reduce(|best, config| {
                    if config.num_samples() > best.num_samples() {
                        config
                    } else {
                        best
                    }
                })
                .expect("no GL configs matched the template")
        })
    }));
    panic::set_hook(default_hook);
    let (window, gl_config) = built
        .map_err(|panic| WindowInitError::from_panic("GL config selection", panic))?
        .map_err(|err| WindowInitError::from_error("GL display", err))?;
    let window =
        window.ok_or_else(|| WindowInitError::from_error("window", "no window was created"))?;

    let raw_window_handle = window.raw_window_handle();
    let context_attributes = ContextAttributesBuilder::new()
        .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
        .build(Some(raw_window_handle));
    let gl_display = gl_config.display();
    let not_current_context = unsafe { gl_display.create_context(&gl_config, &context_attributes) }
        .map_err(|err| WindowInitError::from_error("GL context", err))?;

    let size = window.inner_size();
    let surface_attributes = SurfaceAttributesBuilder::<WindowSurface>::new().build(
        raw_window_handle,
        NonZeroU32::new(size.width.max(1)).unwrap_or(NonZeroU32::MIN),
        NonZeroU32::new(size.height.max(1)).unwrap_or(NonZeroU32::MIN),
    );
    let surface = unsafe { gl_display.create_window_surface(&gl_config, &surface_attributes) }
        .map_err(|err| WindowInitError::from_error("GL surface", err))?;
    let gl_context = not_current_context
        .make_current(&surface)
        .map_err(|err| WindowInitError::from_error("current GL context", err))?;

    let gl = unsafe {
        glow::Context::from_loader_function(|symbol| {
            let symbol = CString::new(symbol).unwrap_or_default();
            gl_display.get_proc_address(&symbol) as *const _
        })
    };

    let mut scene = build_demo_scene(Rc::new(gl))?;
    print_scene_summary();

    let started = Instant::now();
    let mut frames_rendered: u64 = 0;
    let mut render_error = None;

    event_loop
        .run(|event, elwt| {
            elwt.set_control_flow(ControlFlow::Poll);
            match event {
                Event::WindowEvent {
                    event: WindowEvent::CloseRequested,
                    ..
                } => elwt.exit(),
                Event::WindowEvent {
                    event: WindowEvent::Resized(new_size),
                    ..
                } => {
                    if new_size.width > 0 && new_size.height > 0 {
                        surface.resize(
                            &gl_context,
                            NonZeroU32::new(new_size.width).unwrap_or(NonZeroU32::MIN),
                            NonZeroU32::new(new_size.height).unwrap_or(NonZeroU32::MIN),
                        );
                    }
                }
                Event::WindowEvent {
                    event: WindowEvent::RedrawRequested,
                    ..
                } => {
                    let angle = started.elapsed().as_secs_f32() * 0.5;
                    scene.camera_mut().set_eye(Vec3::new(
                        ORBIT_RADIUS * angle.sin(),
                        1.2,
                        ORBIT_RADIUS * angle.cos(),
                    ));
                    let size = window.inner_size();
                    if let Err(err) = scene.render(size.width, size.height) {
                        render_error = Some(err);
                        elwt.exit();
                        return;
                    }
                    if let Err(err) = surface.swap_buffers(&gl_context) {
                        error!("failed to swap buffers: {err}");
                    }
                    frames_rendered += 1;
                    if frame_limit.is_some_and(|limit| frames_rendered >= limit) {
                        elwt.exit();
                    }
                }
                Event::AboutToWait => window.request_redraw(),
                _ => {}
            }
        })
        .context("event loop terminated abnormally")?;

    if let Some(err) = render_error {
        return Err(err.into());
    }
    println!("Rendered {frames_rendered} frame(s)");
    Ok(())
}

struct CliOptions {
    summary_only: bool,
    frames: Option<u64>,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut summary_only = false;
        let mut frames = None;
        let mut args = env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--summary-only" => summary_only = true,
                "--frames" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--frames expects a number"))?;
                    frames = Some(
                        value
                            .parse::<u64>()
                            .with_context(|| format!("invalid frame count: {value}"))?,
                    );
                }
                other => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Expected --summary-only or --frames <n>"
                    ));
                }
            }
        }
        Ok(Self {
            summary_only,
            frames,
        })
    }
}

#[derive(Debug)]
struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {}", panic_message(panic)),
        }
    }

    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

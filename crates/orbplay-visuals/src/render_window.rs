//! Low-level resources for window creation and rendering.

use std::sync::Arc;

use web_time::Instant;
use winit::{
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use crate::{
    animation::{Animation, FrameRenderer, Tick},
    figure::Figure,
    pipelines as pl,
    playback::Surface,
};

//
// user-facing API
//

/// Parameters for the creation of a [`RenderWindow`].
#[derive(Clone, Copy, Debug)]
pub struct WindowParams {
    /// Text in the title bar. Default: "orbplay".
    pub title: &'static str,
    /// Initial width of the window in logical pixels. Default: 760.
    pub width: u32,
    /// Initial height of the window in logical pixels. Default: 760.
    pub height: u32,
    /// Position of the top left corner of the window on screen
    /// in physical pixels. Default: `None`, chosen by the system.
    ///
    /// Some platforms (notably Wayland) don't let applications
    /// position their windows, in which case this is ignored.
    pub position: Option<(i32, i32)>,
    /// Whether the user can resize the window. Default: false.
    pub resizable: bool,
    /// Samples used for anti-aliasing. Default: 4.
    pub msaa_samples: u32,
}

impl Default for WindowParams {
    fn default() -> Self {
        Self {
            title: "orbplay",
            width: 760,
            height: 760,
            position: None,
            resizable: false,
            msaa_samples: 4,
        }
    }
}

/// Errors that can occur when creating or running a [`RenderWindow`].
#[derive(thiserror::Error, Debug)]
pub enum WindowError {
    /// The event loop could not be created or failed while running.
    #[error("Window event loop failed")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// The operating system refused to create a window.
    #[error("Failed to create a window")]
    Os(#[from] winit::error::OsError),
    /// No rendering surface could be created for the window.
    #[error("Failed to create a rendering surface")]
    Surface(#[from] wgpu::CreateSurfaceError),
    /// No graphics adapter can draw to the window.
    #[error("No suitable graphics adapter found")]
    NoAdapter,
    /// The graphics adapter refused to give us a device.
    #[error("Failed to get a graphics device")]
    Device(#[from] wgpu::RequestDeviceError),
    /// The surface doesn't support any texture format.
    #[error("The rendering surface supports no texture formats")]
    NoSurfaceFormat,
}

/// A window for watching an animation in real time.
///
/// Only one window can exist per process,
/// since it owns the process's event loop.
/// To show several animations at once, run each in its own process.
pub struct RenderWindow {
    // RenderWindow is just a wrapper holding the event loop,
    // all the actual resources are created on application resume
    // and stored in `ActiveRenderWindow`
    params: WindowParams,
    event_loop: EventLoop<()>,
}

impl RenderWindow {
    /// Create a new render window.
    ///
    /// The window itself only appears once an animation is run in it.
    pub fn new(params: WindowParams) -> Result<Self, WindowError> {
        Ok(Self {
            params,
            event_loop: EventLoop::new()?,
        })
    }
}

impl Surface for RenderWindow {
    type Error = WindowError;

    /// Play an [`Animation`] in the window.
    ///
    /// Returns after the window is closed,
    /// leaving the animation stopped.
    ///
    /// # Controls
    /// - `Q` or `Esc`: close the window
    fn run_animation<R: FrameRenderer>(
        &mut self,
        anim: &mut Animation<R>,
    ) -> Result<(), WindowError> {
        use winit::platform::run_on_demand::EventLoopExtRunOnDemand;

        let mut app = PlaybackApp {
            window_params: self.params,
            window: None,
            anim,
            next_tick: Instant::now(),
            error: None,
        };
        self.event_loop.run_app_on_demand(&mut app)?;
        app.anim.stop();
        match app.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

//
// actual window and wgpu context
//

// An active window (created after the event loop is started)
// and wgpu rendering context.
#[derive(Debug)]
pub(crate) struct ActiveRenderWindow {
    window: Arc<Window>,
    pub(crate) device: wgpu::Device,
    pub(crate) queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    swapchain_format: wgpu::TextureFormat,
    msaa_samples: u32,
    // msaa texture is only created if multisampling is used
    msaa_tex: Option<wgpu::Texture>,
}

impl ActiveRenderWindow {
    /// Create the window separately from the wgpu context
    /// so that the async part doesn't need the event loop.
    fn create_window(
        event_loop: &ActiveEventLoop,
        params: WindowParams,
    ) -> Result<Arc<Window>, WindowError> {
        let mut window_attrs = Window::default_attributes()
            .with_title(params.title)
            .with_resizable(params.resizable)
            .with_inner_size(winit::dpi::LogicalSize {
                width: params.width as f64,
                height: params.height as f64,
            });
        if let Some((x, y)) = params.position {
            window_attrs = window_attrs.with_position(winit::dpi::PhysicalPosition::new(x, y));
        }
        Ok(Arc::new(event_loop.create_window(window_attrs)?))
    }

    /// Create the rest of the contexts besides the window.
    async fn create_rest(window: Arc<Window>, params: WindowParams) -> Result<Self, WindowError> {
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(Arc::clone(&window))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                force_fallback_adapter: false,
                compatible_surface: Some(&surface),
            })
            .await
            .ok_or(WindowError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    label: None,
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await?;

        let window_size = window.inner_size();

        // colors are blended in linear space, so prefer an sRGB target
        let capabilities = surface.get_capabilities(&adapter);
        let swapchain_format = capabilities
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| capabilities.formats.first().copied())
            .ok_or(WindowError::NoSurfaceFormat)?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: swapchain_format,
            width: window_size.width.max(1),
            height: window_size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let msaa_samples = params.msaa_samples.max(1);
        let msaa_tex = (msaa_samples > 1).then(|| {
            Self::create_msaa_texture(
                &device,
                swapchain_format,
                msaa_samples,
                winit::dpi::PhysicalSize::new(surface_config.width, surface_config.height),
            )
        });

        log::debug!(
            "Created window \"{}\" using {} ({:?})",
            params.title,
            adapter.get_info().name,
            swapchain_format,
        );

        Ok(Self {
            window,
            device,
            queue,
            surface,
            surface_config,
            swapchain_format,
            msaa_samples,
            msaa_tex,
        })
    }

    /// Create a multisampled texture to render to.
    fn create_msaa_texture(
        device: &wgpu::Device,
        swapchain_format: wgpu::TextureFormat,
        msaa_samples: u32,
        window_size: winit::dpi::PhysicalSize<u32>,
    ) -> wgpu::Texture {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some("screen multisample"),
            size: wgpu::Extent3d {
                width: window_size.width,
                height: window_size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: msaa_samples,
            dimension: wgpu::TextureDimension::D2,
            format: swapchain_format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
    }

    /// Reconfigure the swapchain and recreate the MSAA texture when the window size has changed.
    fn resize_swapchain(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        // minimized windows report a zero size, which can't be configured
        if new_size == self.window_size() || new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.surface_config.width = new_size.width;
        self.surface_config.height = new_size.height;
        self.reconfigure();
    }

    /// Configure the surface again with the current settings,
    /// e.g. after it was lost.
    fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.surface_config);
        if self.msaa_samples > 1 {
            self.msaa_tex = Some(Self::create_msaa_texture(
                &self.device,
                self.swapchain_format,
                self.msaa_samples,
                self.window_size(),
            ));
        }
    }

    /// Get the format of the swapchain texture being rendered to.
    #[inline]
    pub(crate) fn swapchain_format(&self) -> wgpu::TextureFormat {
        self.swapchain_format
    }

    /// Get the size of the render window in physical pixels.
    #[inline]
    pub(crate) fn window_size(&self) -> winit::dpi::PhysicalSize<u32> {
        winit::dpi::PhysicalSize::new(self.surface_config.width, self.surface_config.height)
    }

    /// Get the multisample state used by the window.
    #[inline]
    pub(crate) fn multisample_state(&self) -> wgpu::MultisampleState {
        wgpu::MultisampleState {
            count: self.msaa_samples,
            mask: !0,
            alpha_to_coverage_enabled: false,
        }
    }

    /// Grab the next swapchain texture and start drawing on it.
    fn begin_frame(&mut self) -> Result<RenderContext<'_>, wgpu::SurfaceError> {
        let surface_tex = self.surface.get_current_texture()?;
        let surface_view = surface_tex
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let (target, resolve_target) = if let Some(msaa_tex) = &self.msaa_tex {
            let msaa_view = msaa_tex.create_view(&wgpu::TextureViewDescriptor::default());
            (msaa_view, Some(surface_view))
        } else {
            (surface_view, None)
        };
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor::default());

        Ok(RenderContext {
            clear_color: Some(wgpu::Color::WHITE),
            surface_tex,
            target,
            resolve_target,
            encoder,
            device: &self.device,
            queue: &self.queue,
            viewport_size: (self.surface_config.width, self.surface_config.height),
        })
    }
}

/// An active surface and other context required to draw a frame.
pub(crate) struct RenderContext<'a> {
    // if this is set, first pass automatically clears the framebuffer
    clear_color: Option<wgpu::Color>,
    surface_tex: wgpu::SurfaceTexture,
    pub target: wgpu::TextureView,
    pub resolve_target: Option<wgpu::TextureView>,
    pub encoder: wgpu::CommandEncoder,
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub viewport_size: (u32, u32),
}

impl<'a> RenderContext<'a> {
    /// Start a render pass with default parameters.
    pub fn pass(&mut self, label: &str) -> wgpu::RenderPass {
        self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.target,
                resolve_target: self.resolve_target.as_ref(),
                ops: wgpu::Operations {
                    load: if let Some(c) = self.clear_color.take() {
                        wgpu::LoadOp::Clear(c)
                    } else {
                        wgpu::LoadOp::Load
                    },
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        })
    }

    /// Submit the recorded commands and show the result on screen.
    pub fn finish(self) {
        self.queue.submit(Some(self.encoder.finish()));
        self.surface_tex.present();
    }
}

/// Draw a figure into the window, skipping the frame if the surface isn't available.
fn draw_figure(window: &mut ActiveRenderWindow, renderer: &mut pl::Renderer, figure: &Figure) {
    let scale = window.window.scale_factor() as f32;
    let err = match window.begin_frame() {
        Ok(mut ctx) => {
            renderer.draw_figure(&mut ctx, figure, scale);
            ctx.finish();
            return;
        }
        Err(err) => err,
    };
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
            log::warn!("Rendering surface {err}, reconfiguring and skipping the frame");
            window.reconfigure();
        }
        wgpu::SurfaceError::Timeout => {
            log::warn!("Timed out waiting for the next frame, skipping it");
        }
        wgpu::SurfaceError::OutOfMemory => {
            log::error!("Failed to acquire the next frame: {err}");
        }
    }
}

//
// animation control
//

/// A `winit` app controlling the playback of an animation.
struct PlaybackApp<'a, R: FrameRenderer> {
    window_params: WindowParams,
    window: Option<(ActiveRenderWindow, pl::Renderer)>,
    anim: &'a mut Animation<R>,
    // time of the next tick; set after each render so a slow frame delays the next one
    next_tick: Instant,
    // an error that ended the event loop early, returned after the loop exits
    error: Option<WindowError>,
}

impl<R: FrameRenderer> winit::application::ApplicationHandler for PlaybackApp<'_, R> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let params = self.window_params;
        let created = ActiveRenderWindow::create_window(event_loop, params).and_then(|window| {
            futures::executor::block_on(ActiveRenderWindow::create_rest(window, params))
        });
        match created {
            Ok(active_win) => {
                let renderer = pl::Renderer::new(&active_win);
                self.window = Some((active_win, renderer));
                self.anim.start();
                self.next_tick = Instant::now();
                event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_tick));
            }
            Err(err) => {
                self.error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some((window, renderer)) = self.window.as_mut() else {
            return;
        };
        if Instant::now() < self.next_tick {
            event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_tick));
            return;
        }

        match self.anim.tick() {
            Tick::Rendered { .. } => {
                draw_figure(window, renderer, self.anim.figure());
                self.next_tick = Instant::now() + self.anim.params().interval;
                event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_tick));
            }
            // nothing changes anymore until the window is closed
            Tick::Holding | Tick::Inactive => {
                event_loop.set_control_flow(ControlFlow::Wait);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some((window, renderer)) = self.window.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                self.anim.stop();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                window.resize_swapchain(new_size);
                window.window.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                draw_figure(window, renderer, self.anim.figure());
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let (ElementState::Pressed, PhysicalKey::Code(KeyCode::KeyQ | KeyCode::Escape)) =
                    (event.state, event.physical_key)
                {
                    self.anim.stop();
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }
}

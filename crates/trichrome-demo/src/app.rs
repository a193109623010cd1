use trichrome_engine::core::{App, AppControl, FrameCtx};
use trichrome_engine::device::SurfaceErrorAction;
use trichrome_engine::color::{ClearColor, Rgb};
use trichrome_engine::triangle::{ContextState, TriangleContext};
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::PhysicalKey;
use winit::window::WindowId;

use crate::actions::{key_action, ColorAction, KeyAction, Palette};
use crate::config::DemoConfig;

/// Host window logic: owns the triangle context and feeds it actions.
pub struct ColorDemo {
    title: String,
    context: TriangleContext,
    backgrounds: Palette<ClearColor>,
    fills: Palette<Rgb>,
    /// Queued from window events; applied at the next frame.
    pending: Vec<ColorAction>,
}

impl ColorDemo {
    pub fn new(config: DemoConfig) -> Self {
        let mut context = TriangleContext::new();

        let backgrounds = Palette::new(config.backgrounds);
        let fills = Palette::new(config.fills);
        let mut pending = Vec::new();

        if let Some(bg) = backgrounds.current() {
            context.set_clear_color(bg);
        }
        // Fill goes through the backend, so it waits for the first frame.
        if let Some(fill) = fills.current() {
            pending.push(ColorAction::Fill(fill));
        }

        Self {
            title: config.title,
            context,
            backgrounds,
            fills,
            pending,
        }
    }

    fn handle_key(&mut self, action: KeyAction) -> AppControl {
        let queued = match action {
            KeyAction::Quit => return AppControl::Exit,
            KeyAction::CycleBackground => self.backgrounds.advance().map(ColorAction::Background),
            KeyAction::CycleFill => self.fills.advance().map(ColorAction::Fill),
        };

        match queued {
            Some(action) => {
                log::debug!("queued {action:?}");
                self.pending.push(action);
                AppControl::Redraw
            }
            None => AppControl::Continue,
        }
    }
}

impl App for ColorDemo {
    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        let WindowEvent::KeyboardInput { event, .. } = event else {
            return AppControl::Continue;
        };
        if event.state != ElementState::Pressed || event.repeat {
            return AppControl::Continue;
        }
        let PhysicalKey::Code(code) = event.physical_key else {
            return AppControl::Continue;
        };

        match key_action(code) {
            Some(action) => self.handle_key(action),
            None => AppControl::Continue,
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.context.state() == ContextState::Uninitialized {
            let result = self.context.initialize(&mut ctx.backend());
            if let Err(e) = result {
                log::error!("graphics initialization failed: {e}");
                ctx.window.set_title(&format!("{} - {}", self.title, e.summary()));
            }
        }

        let (width, height) = ctx.surface_size();
        ctx.window.window.pre_present_notify();

        let mut backend = ctx.backend();
        for action in self.pending.drain(..) {
            match action {
                ColorAction::Background(color) => self.context.set_clear_color(color),
                ColorAction::Fill(color) => self.context.set_fill_color(&mut backend, color),
            }
        }

        self.context.render(&mut backend, width, height);

        match backend.surface_error() {
            Some(SurfaceErrorAction::Fatal) => {
                log::error!("surface lost beyond recovery; exiting");
                AppControl::Exit
            }
            Some(SurfaceErrorAction::Reconfigured) => AppControl::Redraw,
            Some(SurfaceErrorAction::SkipFrame) | None => AppControl::Continue,
        }
    }
}
